use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identities (system A) and candidates (system B)
// ---------------------------------------------------------------------------

/// The system-B identity attached to a linked [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A student record of the authoritative roster (system A).
///
/// Everything except the linked secondary identity is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    tutorial_id: String,
    primary_id: String,
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    secondary: Option<SecondaryIdentity>,
}

impl Identity {
    pub fn new(
        tutorial_id: impl Into<String>,
        primary_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let alias = name.split_whitespace().next().unwrap_or_default().to_string();
        Self {
            tutorial_id: tutorial_id.into(),
            primary_id: primary_id.into(),
            name,
            email: email.into(),
            subject: subject.into(),
            alias,
            secondary: None,
        }
    }

    pub fn tutorial_id(&self) -> &str {
        &self.tutorial_id
    }

    pub fn primary_id(&self) -> &str {
        &self.primary_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Canonical alias: first token of the display name.
    pub fn alias(&self) -> &str {
        if self.alias.is_empty() {
            self.name.split_whitespace().next().unwrap_or_default()
        } else {
            &self.alias
        }
    }

    pub fn secondary(&self) -> Option<&SecondaryIdentity> {
        self.secondary.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.secondary.is_some()
    }

    /// Attach the system-B identity of `candidate`.
    pub fn link(&mut self, candidate: &SecondaryCandidate) {
        self.secondary = Some(SecondaryIdentity {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            email: candidate.email.clone(),
        });
    }

    /// Restore a link that was committed earlier.
    pub fn relink(&mut self, secondary: SecondaryIdentity) {
        self.secondary = Some(secondary);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.primary_id)
    }
}

/// An unlinked person record from system B, consumed by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryCandidate {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl SecondaryCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for SecondaryCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// One stage of the matcher's ladder, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    ExactName,
    Email,
    FirstLast,
    Complex,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactName => write!(f, "exact_name"),
            Self::Email => write!(f, "email"),
            Self::FirstLast => write!(f, "first_last"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

/// Result of every matching or lookup operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<T> {
    Matched(T),
    Ambiguous(Vec<T>),
    NotFound,
    /// The operator explicitly canceled a choice.
    Canceled,
}

impl<T> MatchOutcome<T> {
    pub fn matched(self) -> Option<T> {
        match self {
            Self::Matched(value) => Some(value),
            _ => None,
        }
    }
}

/// Position of the winning candidate in the pool plus the tier that accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierHit {
    pub index: usize,
    pub tier: MatchTier,
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// A committed system-A ↔ system-B link.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub identity: Identity,
    pub candidate: SecondaryCandidate,
    pub tier: MatchTier,
}

impl Link {
    /// `"<identity> <-> <candidate-name> (<candidate-id>)"`
    pub fn audit_line(&self) -> String {
        format!("{} <-> {} ({})", self.identity, self.candidate.name, self.candidate.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub links: Vec<Link>,
    pub still_unlinked: Vec<Identity>,
    pub leftover_candidates: Vec<SecondaryCandidate>,
    pub audit: Vec<String>,
    /// Whether the degraded complex pass ran.
    pub complex_pass: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub linked: usize,
    pub still_unlinked: usize,
    pub leftover_candidates: usize,
    pub linked_by_complex: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
}

/// JSON report of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub links: Vec<Link>,
    pub still_unlinked: Vec<Identity>,
    pub leftover_candidates: Vec<SecondaryCandidate>,
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// The students inferred to have jointly authored one uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionGroup {
    pub members: Vec<Identity>,
}

impl SubmissionGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, primary_id: &str) -> bool {
        self.members.iter().any(|m| m.primary_id() == primary_id)
    }
}

/// Per-submission metadata persisted as `meta.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionMeta {
    pub original_name: String,
    pub problems: Vec<String>,
}
