//! `rostersync-recon`: cross-system student identity reconciliation.
//!
//! Pure engine crate: receives rosters, candidate pools and file names, returns
//! links, groups and recorded problems. Operator input goes through the
//! [`Interactive`] trait; the crate does no terminal IO of its own.

pub mod config;
pub mod error;
pub mod group;
pub mod interact;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod roster;
pub mod select;
pub mod source;
pub mod submission;

pub use config::ReconConfig;
pub use error::ReconError;
pub use group::{GroupNameParser, ParseRoute, ParsedSubmission};
pub use interact::{Interactive, ScriptedConsole};
pub use matcher::{CandidateMatcher, MatchMode, MatchTarget};
pub use model::{
    Identity, Link, MatchOutcome, MatchTier, ReconResult, Reconciliation, SecondaryCandidate,
    SubmissionGroup, SubmissionMeta,
};
pub use normalize::normalize;
pub use reconcile::{pending_pools, RosterReconciler};
pub use roster::{Roster, Scope};
pub use select::{lookup_identity, select_identity};
pub use source::{CsvCandidates, RosterSource};
pub use submission::{inspect_submission, InspectedSubmission};
