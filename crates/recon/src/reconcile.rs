use std::collections::HashSet;

use log::{debug, info};

use crate::config::MatchPolicy;
use crate::matcher::{CandidateMatcher, MatchMode, MatchTarget};
use crate::model::{
    Identity, Link, MatchTier, ReconMeta, ReconResult, ReconSummary, Reconciliation,
    SecondaryCandidate,
};

/// How far an identity set is linked to system B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Nobody is linked yet.
    Fresh,
    /// Some identities are still unlinked.
    Partial { unlinked: usize },
    Complete,
}

pub fn link_status(identities: &[Identity]) -> LinkStatus {
    let unlinked = identities.iter().filter(|i| !i.is_linked()).count();
    if unlinked == 0 {
        LinkStatus::Complete
    } else if unlinked == identities.len() {
        LinkStatus::Fresh
    } else {
        LinkStatus::Partial { unlinked }
    }
}

/// Build the two reconciliation pools.
///
/// Candidates already linked to some identity are dropped; unlinked
/// identities are sorted by email (stable, so equal emails keep roster order).
pub fn pending_pools(
    identities: &[Identity],
    candidates: Vec<SecondaryCandidate>,
) -> (Vec<Identity>, Vec<SecondaryCandidate>) {
    let known: HashSet<&str> = identities
        .iter()
        .filter_map(|i| i.secondary().map(|s| s.id.as_str()))
        .collect();

    let candidates: Vec<SecondaryCandidate> = candidates
        .into_iter()
        .filter(|c| !known.contains(c.id.as_str()))
        .collect();

    let mut unlinked: Vec<Identity> = identities.iter().filter(|i| !i.is_linked()).cloned().collect();
    unlinked.sort_by(|a, b| a.email().cmp(b.email()));

    debug!(
        "{} already linked, {} candidates available, {} identities to match",
        known.len(),
        candidates.len(),
        unlinked.len()
    );

    (unlinked, candidates)
}

/// Drives the matcher over two unordered pools.
#[derive(Debug, Clone, Default)]
pub struct RosterReconciler {
    matcher: CandidateMatcher,
}

impl RosterReconciler {
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            matcher: CandidateMatcher::new(policy),
        }
    }

    /// Link as many identities as possible: one normal pass, then a single
    /// complex pass over whatever the normal pass left unlinked.
    pub fn reconcile(
        &self,
        mut unlinked: Vec<Identity>,
        mut candidates: Vec<SecondaryCandidate>,
    ) -> Reconciliation {
        let mut links = self.reconcile_pools(&mut unlinked, &mut candidates, MatchMode::Normal);

        let complex_pass = !unlinked.is_empty() && self.matcher.policy().complex_pass;
        if complex_pass {
            debug!("complex pass over {} remaining identities", unlinked.len());
            links.extend(self.reconcile_pools(&mut unlinked, &mut candidates, MatchMode::Complex));
        }

        let audit = links.iter().map(Link::audit_line).collect();

        Reconciliation {
            links,
            still_unlinked: unlinked,
            leftover_candidates: candidates,
            audit,
            complex_pass,
        }
    }

    /// One traversal with two cursors, mutating both pools in place.
    ///
    /// On a match both elements are removed and the inner cursor restarts at
    /// 0 while the outer cursor stays put (the outer list shrank under it).
    /// Links are returned in commit order.
    pub fn reconcile_pools(
        &self,
        unlinked: &mut Vec<Identity>,
        candidates: &mut Vec<SecondaryCandidate>,
        mode: MatchMode,
    ) -> Vec<Link> {
        let mut links = Vec::new();
        let (mut i, mut j) = (0, 0);

        loop {
            if j >= candidates.len() {
                j = 0;
                i += 1;
            }
            if i >= unlinked.len() {
                break;
            }

            let tier = self
                .matcher
                .pair_tier(mode, &MatchTarget::from(&unlinked[i]), &candidates[j]);

            match tier {
                Some(tier) => {
                    let mut identity = unlinked.remove(i);
                    let candidate = candidates.remove(j);
                    identity.link(&candidate);
                    let link = Link { identity, candidate, tier };
                    info!("{} [{}]", link.audit_line(), tier);
                    links.push(link);
                    j = 0;
                }
                None => j += 1,
            }
        }

        links
    }
}

impl Reconciliation {
    pub fn summary(&self) -> ReconSummary {
        ReconSummary {
            linked: self.links.len(),
            still_unlinked: self.still_unlinked.len(),
            leftover_candidates: self.leftover_candidates.len(),
            linked_by_complex: self
                .links
                .iter()
                .filter(|l| l.tier == MatchTier::Complex)
                .count(),
        }
    }

    /// JSON report with run metadata.
    pub fn to_result(&self) -> ReconResult {
        ReconResult {
            meta: ReconMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            summary: self.summary(),
            links: self.links.clone(),
            still_unlinked: self.still_unlinked.clone(),
            leftover_candidates: self.leftover_candidates.clone(),
        }
    }
}
