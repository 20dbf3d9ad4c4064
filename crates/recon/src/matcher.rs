use log::debug;

use crate::config::MatchPolicy;
use crate::model::{Identity, MatchOutcome, MatchTier, SecondaryCandidate, TierHit};
use crate::normalize::{normalize, strip_trailing_punctuation};

/// The person being looked up: a display name and, if known, an email.
#[derive(Debug, Clone, Copy)]
pub struct MatchTarget<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
}

impl<'a> MatchTarget<'a> {
    pub fn name(name: &'a str) -> Self {
        Self { name, email: None }
    }

    /// Blank emails are treated as absent.
    pub fn with_email(name: &'a str, email: &'a str) -> Self {
        let email = Some(email.trim()).filter(|e| !e.is_empty());
        Self { name, email }
    }
}

impl<'a> From<&'a Identity> for MatchTarget<'a> {
    fn from(identity: &'a Identity) -> Self {
        Self::with_email(identity.name(), identity.email())
    }
}

/// Which tiers a pairwise check may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Tiers 1–3.
    Normal,
    /// Tier 4 only.
    Complex,
}

// ---------------------------------------------------------------------------
// Tier predicates
// ---------------------------------------------------------------------------

/// Tier 1: normalized full names are equal.
pub fn exact_same_name(target: &str, candidate: &str) -> bool {
    let target = normalize(target);
    !target.is_empty() && target == normalize(candidate)
}

/// Tier 2: emails are equal (ASCII case-insensitive). Never matches without a target email.
pub fn same_email(target: Option<&str>, candidate: &str) -> bool {
    match target {
        Some(email) => {
            let candidate = candidate.trim();
            !candidate.is_empty() && email.trim().eq_ignore_ascii_case(candidate)
        }
        None => false,
    }
}

/// Tier 3: first and last normalized tokens are equal.
pub fn same_first_and_last(target: &str, candidate: &str) -> bool {
    let target = normalize(target);
    let candidate = normalize(candidate);
    match (target.first(), target.last(), candidate.first(), candidate.last()) {
        (Some(tf), Some(tl), Some(cf), Some(cl)) => tf == cf && tl == cl,
        _ => false,
    }
}

/// Tier 4: the shorter name's tokens appear, in order, inside the longer one.
///
/// Two cursors walk both token lists; on a mismatch the cursor of the longer
/// list advances (the candidate's when both have the same length). Tokens
/// shorter than `min_token_len` are walked but not counted.
pub fn complex_part_matching(target: &str, candidate: &str, min_token_len: usize) -> bool {
    let a = complex_tokens(target);
    let b = complex_tokens(candidate);
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let (mut i, mut j) = (0, 0);
    let mut same_ordered_parts = 0;
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            if a[i].chars().count() >= min_token_len {
                same_ordered_parts += 1;
            }
            i += 1;
            j += 1;
        } else if a.len() > b.len() {
            i += 1;
        } else {
            j += 1;
        }
    }

    same_ordered_parts >= a.len().min(b.len())
}

fn complex_tokens(name: &str) -> Vec<String> {
    normalize(name)
        .iter()
        .map(|t| strip_trailing_punctuation(t))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Tiered matcher between one target and a pool of system-B candidates.
///
/// Ties inside a tier go to the earliest pool element. There is no scoring.
#[derive(Debug, Clone, Default)]
pub struct CandidateMatcher {
    policy: MatchPolicy,
}

impl CandidateMatcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Check one pair with the tiers allowed by `mode`, cheapest first.
    pub fn pair_tier(
        &self,
        mode: MatchMode,
        target: &MatchTarget<'_>,
        candidate: &SecondaryCandidate,
    ) -> Option<MatchTier> {
        match mode {
            MatchMode::Normal => {
                if exact_same_name(target.name, &candidate.name) {
                    Some(MatchTier::ExactName)
                } else if same_email(target.email, &candidate.email) {
                    Some(MatchTier::Email)
                } else if same_first_and_last(target.name, &candidate.name) {
                    Some(MatchTier::FirstLast)
                } else {
                    None
                }
            }
            MatchMode::Complex => complex_part_matching(
                target.name,
                &candidate.name,
                self.policy.complex_min_token_len,
            )
            .then_some(MatchTier::Complex),
        }
    }

    /// Find the candidate for `target`, evaluating each tier over the whole
    /// pool before falling through to the next one.
    pub fn find(&self, target: &MatchTarget<'_>, pool: &[SecondaryCandidate]) -> MatchOutcome<TierHit> {
        let tiers: [(MatchTier, &dyn Fn(&SecondaryCandidate) -> bool); 3] = [
            (MatchTier::ExactName, &|c: &SecondaryCandidate| exact_same_name(target.name, &c.name)),
            (MatchTier::Email, &|c: &SecondaryCandidate| same_email(target.email, &c.email)),
            (MatchTier::FirstLast, &|c: &SecondaryCandidate| same_first_and_last(target.name, &c.name)),
        ];

        for (tier, accepts) in tiers {
            if let Some(index) = pool.iter().position(accepts) {
                debug!("'{}' matched pool[{index}] via {tier}", target.name);
                return MatchOutcome::Matched(TierHit { index, tier });
            }
        }

        if self.policy.complex_pass {
            let min_len = self.policy.complex_min_token_len;
            if let Some(index) = pool
                .iter()
                .position(|c| complex_part_matching(target.name, &c.name, min_len))
            {
                debug!("'{}' matched pool[{index}] via complex", target.name);
                return MatchOutcome::Matched(TierHit {
                    index,
                    tier: MatchTier::Complex,
                });
            }
        }

        MatchOutcome::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(id: &str, name: &str, email: &str) -> SecondaryCandidate {
        SecondaryCandidate::new(id, name, email)
    }

    #[test]
    fn exact_name_is_diacritic_insensitive() {
        assert!(exact_same_name("Anna Müller", "anna mueller"));
        assert!(exact_same_name("José  Pérez", "JOSE PEREZ"));
        assert!(!exact_same_name("Anna Müller", "Anna Maria Müller"));
        assert!(!exact_same_name("", ""));
    }

    #[test]
    fn email_requires_target_email() {
        assert!(same_email(Some("A@Uni.de"), "a@uni.de"));
        assert!(!same_email(None, "a@uni.de"));
        assert!(!same_email(Some("a@uni.de"), ""));
    }

    #[test]
    fn first_and_last() {
        assert!(same_first_and_last("Anna Lena Müller", "Anna Mueller"));
        assert!(!same_first_and_last("Anna Müller", "Lena Müller"));
        assert!(!same_first_and_last("", "Anna"));
    }

    #[test]
    fn complex_subsequence() {
        // Shorter name's tokens appear in order inside the longer one
        assert!(complex_part_matching("Maria Schmidt", "Dr. Maria Anna Schmidt", 0));
        assert!(complex_part_matching("Jean-Luc Picard Sr.", "Jean-Luc Picard", 0));
        // Wrong order
        assert!(!complex_part_matching("Schmidt Maria", "Maria Anna Schmidt", 0));
        // Nothing in common
        assert!(!complex_part_matching("Boris Becker", "Steffi Graf", 0));
        // Empty never matches
        assert!(!complex_part_matching("", "Steffi Graf", 0));
    }

    #[test]
    fn complex_short_token_guard() {
        assert!(complex_part_matching("Li", "Li Wei Zhang", 0));
        assert!(!complex_part_matching("Li", "Li Wei Zhang", 3));
        assert!(complex_part_matching("Wei Zhang", "Li Wei Zhang", 3));
    }

    #[test]
    fn pair_tier_normal_order() {
        let m = CandidateMatcher::default();
        let target = MatchTarget::with_email("Anna Müller", "anna@uni.de");
        assert_eq!(
            m.pair_tier(MatchMode::Normal, &target, &cand("1", "Anna Mueller", "anna@uni.de")),
            Some(MatchTier::ExactName)
        );
        assert_eq!(
            m.pair_tier(MatchMode::Normal, &target, &cand("2", "A. Mueller", "anna@uni.de")),
            Some(MatchTier::Email)
        );
        assert_eq!(
            m.pair_tier(MatchMode::Normal, &target, &cand("3", "Anna Maria Mueller", "x@y.z")),
            Some(MatchTier::FirstLast)
        );
        assert_eq!(
            m.pair_tier(MatchMode::Normal, &target, &cand("4", "Dr. Anna Müller", "x@y.z")),
            None
        );
    }

    #[test]
    fn pair_tier_complex_only_uses_tier_four() {
        let m = CandidateMatcher::default();
        let target = MatchTarget::with_email("Anna Müller", "anna@uni.de");
        // Email would match, but complex mode does not look at it
        assert_eq!(
            m.pair_tier(MatchMode::Complex, &target, &cand("1", "Zoe Kim", "anna@uni.de")),
            None
        );
        assert_eq!(
            m.pair_tier(MatchMode::Complex, &target, &cand("2", "Dr. Anna Müller", "")),
            Some(MatchTier::Complex)
        );
    }

    #[test]
    fn find_exact_copy_hits_tier_one() {
        let m = CandidateMatcher::default();
        let pool = vec![
            cand("1", "Boris Schmidt", "b@uni.de"),
            cand("2", "Anna Müller", "a@uni.de"),
        ];
        let out = m.find(&MatchTarget::with_email("Anna Müller", "a@uni.de"), &pool);
        assert_eq!(out, MatchOutcome::Matched(TierHit { index: 1, tier: MatchTier::ExactName }));
    }

    #[test]
    fn find_checks_name_over_whole_pool_before_email() {
        let m = CandidateMatcher::default();
        // pool[0] shares the email, pool[1] shares the exact name
        let pool = vec![
            cand("1", "Somebody Else", "anna@uni.de"),
            cand("2", "Anna Mueller", "other@uni.de"),
        ];
        let out = m.find(&MatchTarget::with_email("Anna Müller", "anna@uni.de"), &pool);
        assert_eq!(out, MatchOutcome::Matched(TierHit { index: 1, tier: MatchTier::ExactName }));
    }

    #[test]
    fn find_first_exact_duplicate_wins() {
        let m = CandidateMatcher::default();
        let pool = vec![
            cand("1", "Anna Müller", "a1@uni.de"),
            cand("2", "ANNA MUELLER", "a2@uni.de"),
        ];
        let out = m.find(&MatchTarget::name("anna mueller"), &pool);
        assert_eq!(out, MatchOutcome::Matched(TierHit { index: 0, tier: MatchTier::ExactName }));
    }

    #[test]
    fn find_falls_back_to_complex() {
        let m = CandidateMatcher::default();
        let pool = vec![cand("1", "Steffi Graf", ""), cand("2", "Prof. Dr. Maria Schmidt", "")];
        let out = m.find(&MatchTarget::name("Maria Schmidt"), &pool);
        assert_eq!(out, MatchOutcome::Matched(TierHit { index: 1, tier: MatchTier::Complex }));
    }

    #[test]
    fn find_without_complex_pass() {
        let m = CandidateMatcher::new(MatchPolicy {
            complex_pass: false,
            complex_min_token_len: 0,
        });
        let pool = vec![cand("2", "Prof. Dr. Maria Schmidt", "")];
        assert_eq!(m.find(&MatchTarget::name("Maria Schmidt"), &pool), MatchOutcome::NotFound);
    }

    #[test]
    fn find_empty_pool() {
        let m = CandidateMatcher::default();
        assert_eq!(m.find(&MatchTarget::name("Anna"), &[]), MatchOutcome::NotFound);
    }
}
