use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::{Identity, Link};
use crate::normalize::normalize;

/// Which part of the roster a lookup searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Students of my tutorials, plus imported ones, minus exported ones.
    Mine,
    /// Everyone who is not in [`Scope::Mine`].
    Others,
    All,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mine => write!(f, "mine"),
            Self::Others => write!(f, "others"),
            Self::All => write!(f, "all"),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mine" | "my" => Ok(Self::Mine),
            "others" | "other" => Ok(Self::Others),
            "all" => Ok(Self::All),
            other => Err(format!("unknown scope '{other}' (expected mine, others or all)")),
        }
    }
}

/// System-A identities grouped by tutorial.
///
/// Tutorials iterate in id order and identities in insertion order; that is
/// the "roster order" every lookup reports hits in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    tutorials: BTreeMap<String, Vec<Identity>>,
    #[serde(default)]
    my_tutorials: BTreeSet<String>,
    /// Students of other tutorials that I handle anyway.
    #[serde(default)]
    imported: BTreeSet<String>,
    /// Students of my tutorials that someone else handles.
    #[serde(default)]
    exported: BTreeSet<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) one tutorial's identities.
    ///
    /// Every identity is re-homed under `tutorial_id`; links already known for
    /// a primary id survive the replacement.
    pub fn add_tutorial(&mut self, tutorial_id: &str, identities: Vec<Identity>, mine: bool) {
        let previous = self.tutorials.remove(tutorial_id).unwrap_or_default();
        let identities: Vec<Identity> = identities
            .into_iter()
            .map(|identity| {
                let mut fresh = Identity::new(
                    tutorial_id,
                    identity.primary_id(),
                    identity.name(),
                    identity.email(),
                    identity.subject(),
                );
                let known = identity.secondary().or_else(|| {
                    previous
                        .iter()
                        .find(|p| p.primary_id() == identity.primary_id())
                        .and_then(Identity::secondary)
                });
                if let Some(secondary) = known {
                    fresh.relink(secondary.clone());
                }
                fresh
            })
            .collect();

        debug!("tutorial {tutorial_id}: {} identities (mine: {mine})", identities.len());
        self.tutorials.insert(tutorial_id.to_string(), identities);
        if mine {
            self.my_tutorials.insert(tutorial_id.to_string());
        } else {
            self.my_tutorials.remove(tutorial_id);
        }
    }

    pub fn tutorial_ids(&self) -> impl Iterator<Item = &str> {
        self.tutorials.keys().map(String::as_str)
    }

    pub fn is_my_tutorial(&self, tutorial_id: &str) -> bool {
        self.my_tutorials.contains(tutorial_id)
    }

    pub fn tutorial(&self, tutorial_id: &str) -> Option<&[Identity]> {
        self.tutorials.get(tutorial_id).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.tutorials.values().all(Vec::is_empty)
    }

    pub fn imported(&self) -> impl Iterator<Item = &str> {
        self.imported.iter().map(String::as_str)
    }

    pub fn exported(&self) -> impl Iterator<Item = &str> {
        self.exported.iter().map(String::as_str)
    }

    /// Whether `identity` currently belongs to me.
    pub fn is_mine(&self, identity: &Identity) -> bool {
        let id = identity.primary_id();
        if self.my_tutorials.contains(identity.tutorial_id()) {
            !self.exported.contains(id)
        } else {
            self.imported.contains(id)
        }
    }

    fn in_scope(&self, identity: &Identity, scope: Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Mine => self.is_mine(identity),
            Scope::Others => !self.is_mine(identity),
        }
    }

    /// All identities in `scope`, in roster order.
    pub fn students(&self, scope: Scope) -> Vec<&Identity> {
        self.tutorials
            .values()
            .flatten()
            .filter(|i| self.in_scope(i, scope))
            .collect()
    }

    pub fn find_by_id(&self, primary_id: &str) -> Option<&Identity> {
        self.tutorials
            .values()
            .flatten()
            .find(|i| i.primary_id() == primary_id)
    }

    /// Scoped name lookup.
    ///
    /// Exact normalized-name hits take precedence. Otherwise an identity hits
    /// when every query token is a substring of one of its name tokens.
    pub fn find_by_name(&self, query: &str, scope: Scope) -> Vec<&Identity> {
        let query = normalize(query);
        if query.is_empty() {
            return Vec::new();
        }

        let pool = self.students(scope);

        let exact: Vec<&Identity> = pool
            .iter()
            .copied()
            .filter(|i| normalize(i.name()) == query)
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        pool.into_iter()
            .filter(|i| {
                let name = normalize(i.name());
                query
                    .iter()
                    .all(|q| name.iter().any(|token| token.contains(q.as_str())))
            })
            .collect()
    }

    /// Take over a student of another tutorial.
    pub fn import(&mut self, primary_id: &str) -> Result<&Identity, ReconError> {
        let identity = self
            .find_by_id(primary_id)
            .ok_or_else(|| ReconError::UnknownIdentity(primary_id.to_string()))?;
        if self.my_tutorials.contains(identity.tutorial_id()) {
            self.exported.remove(primary_id);
        } else {
            self.imported.insert(primary_id.to_string());
        }
        info!("imported {primary_id}");
        self.find_by_id(primary_id)
            .ok_or_else(|| ReconError::UnknownIdentity(primary_id.to_string()))
    }

    /// Hand one of my students over to another tutor.
    pub fn export(&mut self, primary_id: &str) -> Result<&Identity, ReconError> {
        let identity = self
            .find_by_id(primary_id)
            .ok_or_else(|| ReconError::UnknownIdentity(primary_id.to_string()))?;
        if self.my_tutorials.contains(identity.tutorial_id()) {
            self.exported.insert(primary_id.to_string());
        } else {
            self.imported.remove(primary_id);
        }
        info!("exported {primary_id}");
        self.find_by_id(primary_id)
            .ok_or_else(|| ReconError::UnknownIdentity(primary_id.to_string()))
    }

    /// Identities without a secondary identity, in roster order.
    pub fn unlinked(&self) -> Vec<Identity> {
        self.tutorials
            .values()
            .flatten()
            .filter(|i| !i.is_linked())
            .cloned()
            .collect()
    }

    pub fn identities(&self) -> Vec<&Identity> {
        self.students(Scope::All)
    }

    /// Write committed links back into the stored identities.
    ///
    /// Returns how many stored identities were updated.
    pub fn apply_links(&mut self, links: &[Link]) -> usize {
        let mut updated = 0;
        for link in links {
            let stored = self
                .tutorials
                .get_mut(link.identity.tutorial_id())
                .and_then(|ids| {
                    ids.iter_mut()
                        .find(|i| i.primary_id() == link.identity.primary_id())
                });
            if let Some(stored) = stored {
                stored.link(&link.candidate);
                updated += 1;
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchTier, SecondaryCandidate};

    fn roster() -> Roster {
        let mut roster = Roster::new();
        roster.add_tutorial(
            "t1",
            vec![
                Identity::new("", "1", "Anna Müller", "anna@uni.de", "Math"),
                Identity::new("", "2", "Boris Schmidt", "boris@uni.de", "CS"),
            ],
            true,
        );
        roster.add_tutorial(
            "t2",
            vec![
                Identity::new("", "3", "Anna Maria Müller", "am@uni.de", "Physics"),
                Identity::new("", "4", "Carla Diaz", "carla@uni.de", "Math"),
            ],
            false,
        );
        roster
    }

    fn ids(hits: &[&Identity]) -> Vec<String> {
        hits.iter().map(|i| i.primary_id().to_string()).collect()
    }

    #[test]
    fn add_tutorial_rehomes_identities() {
        let r = roster();
        assert_eq!(r.find_by_id("3").unwrap().tutorial_id(), "t2");
        assert!(r.is_my_tutorial("t1"));
        assert!(!r.is_my_tutorial("t2"));
    }

    #[test]
    fn scopes() {
        let r = roster();
        assert_eq!(ids(&r.students(Scope::Mine)), vec!["1", "2"]);
        assert_eq!(ids(&r.students(Scope::Others)), vec!["3", "4"]);
        assert_eq!(ids(&r.students(Scope::All)), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn exact_name_takes_precedence() {
        let r = roster();
        assert_eq!(ids(&r.find_by_name("anna mueller", Scope::All)), vec!["1"]);
    }

    #[test]
    fn token_substring_lookup() {
        let r = roster();
        assert_eq!(ids(&r.find_by_name("Müll", Scope::All)), vec!["1", "3"]);
        assert_eq!(ids(&r.find_by_name("Müll", Scope::Others)), vec!["3"]);
        assert_eq!(ids(&r.find_by_name("anna mar", Scope::All)), vec!["3"]);
        assert!(r.find_by_name("Zed", Scope::All).is_empty());
        assert!(r.find_by_name("   ", Scope::All).is_empty());
    }

    #[test]
    fn import_and_export_move_between_scopes() {
        let mut r = roster();
        r.import("4").unwrap();
        assert_eq!(ids(&r.students(Scope::Mine)), vec!["1", "2", "4"]);

        r.export("1").unwrap();
        assert_eq!(ids(&r.students(Scope::Mine)), vec!["2", "4"]);
        assert_eq!(ids(&r.students(Scope::Others)), vec!["1", "3"]);

        // Undo both
        r.import("1").unwrap();
        r.export("4").unwrap();
        assert_eq!(ids(&r.students(Scope::Mine)), vec!["1", "2"]);
        assert_eq!(r.imported().count(), 0);
        assert_eq!(r.exported().count(), 0);
    }

    #[test]
    fn import_unknown_id() {
        let mut r = roster();
        assert!(matches!(r.import("99"), Err(ReconError::UnknownIdentity(_))));
    }

    #[test]
    fn apply_links_and_keep_them_on_refresh() {
        let mut r = roster();
        let identity = r.find_by_id("2").unwrap().clone();
        let candidate = SecondaryCandidate::new("m2", "Boris Schmidt", "b@lms.de");
        let link = Link { identity, candidate, tier: MatchTier::ExactName };
        assert_eq!(r.apply_links(&[link]), 1);
        assert!(r.find_by_id("2").unwrap().is_linked());
        assert_eq!(r.unlinked().len(), 3);

        // Re-synchronizing the tutorial keeps the known link
        r.add_tutorial(
            "t1",
            vec![
                Identity::new("", "1", "Anna Müller", "anna@uni.de", "Math"),
                Identity::new("", "2", "Boris Schmidt", "boris@uni.de", "CS"),
            ],
            true,
        );
        assert_eq!(r.find_by_id("2").unwrap().secondary().unwrap().id, "m2");
    }

    #[test]
    fn scope_parse() {
        assert_eq!("mine".parse::<Scope>().unwrap(), Scope::Mine);
        assert_eq!("OTHER".parse::<Scope>().unwrap(), Scope::Others);
        assert!("some".parse::<Scope>().is_err());
    }

    #[test]
    fn json_round_trip() {
        let r = roster();
        let json = serde_json::to_string(&r).unwrap();
        let back: Roster = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
