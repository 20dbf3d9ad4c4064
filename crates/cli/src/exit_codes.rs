//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args, missing input file)            |
//! | 3    | `reconcile` left identities or candidates unmatched       |
//! | 4    | `parse` / `workflow prepare` recorded submission problems |
//! | 5    | Settings file missing, unreadable or invalid              |
//! | 6    | Roster store unreadable or unwritable                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use rostersync_config::ConfigError;
use rostersync_recon::ReconError;

use crate::store::StoreError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing input files, nothing to work on.
pub const EXIT_USAGE: u8 = 2;

/// Reconciliation finished but left something unmatched.
/// Links that were found are still saved.
pub const EXIT_UNMATCHED: u8 = 3;

/// At least one submission carries a recorded problem.
pub const EXIT_PROBLEMS: u8 = 4;

/// Settings could not be loaded or failed validation.
pub const EXIT_CONFIG: u8 = 5;

/// Roster store or submission metadata could not be read or written.
pub const EXIT_STORE: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
        ReconError::MissingColumn { .. } | ReconError::Csv(_) | ReconError::Io(_) => EXIT_USAGE,
        ReconError::UnknownIdentity(_) => EXIT_ERROR,
    }
}

pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_CONFIG
}

pub fn store_exit_code(_err: &StoreError) -> u8 {
    EXIT_STORE
}
