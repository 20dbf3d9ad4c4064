use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine policy, usually embedded in the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub matching: MatchPolicy,
    #[serde(default)]
    pub submissions: GroupPolicy,
    #[serde(default)]
    pub candidates: CandidateSource,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Run the degraded subsequence pass over what the normal pass left over.
    #[serde(default = "default_true")]
    pub complex_pass: bool,
    /// Tokens shorter than this do not count towards a complex match.
    /// 0 counts every token.
    #[serde(default)]
    pub complex_min_token_len: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            complex_pass: true,
            complex_min_token_len: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPolicy {
    #[serde(default = "default_min_group")]
    pub min_group_size: usize,
    #[serde(default = "default_max_group")]
    pub max_group_size: usize,
    /// Expected archive extension, without the dot.
    #[serde(default = "default_extension")]
    pub archive_extension: String,
    /// Above this many lookup hits the operator is asked before listing them.
    #[serde(default = "default_choice_limit")]
    pub choice_limit: usize,
    /// Empty answers before a manual resolution gives up on a name.
    #[serde(default = "default_manual_attempts")]
    pub manual_attempts: usize,
}

impl Default for GroupPolicy {
    fn default() -> Self {
        Self {
            min_group_size: default_min_group(),
            max_group_size: default_max_group(),
            archive_extension: default_extension(),
            choice_limit: default_choice_limit(),
            manual_attempts: default_manual_attempts(),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate export (system B)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateSource {
    #[serde(default)]
    pub columns: CandidateColumns,
}

/// Column names of the system-B roster export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateColumns {
    #[serde(default = "default_id_column")]
    pub id: String,
    #[serde(default = "default_name_column")]
    pub name: String,
    #[serde(default = "default_email_column")]
    pub email: String,
}

impl Default for CandidateColumns {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            name: default_name_column(),
            email: default_email_column(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_group() -> usize {
    2
}

fn default_max_group() -> usize {
    3
}

fn default_extension() -> String {
    "zip".into()
}

fn default_choice_limit() -> usize {
    11
}

fn default_manual_attempts() -> usize {
    1
}

fn default_id_column() -> String {
    "id".into()
}

fn default_name_column() -> String {
    "name".into()
}

fn default_email_column() -> String {
    "email".into()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let s = &self.submissions;

        if s.min_group_size == 0 {
            return Err(ReconError::ConfigValidation(
                "min_group_size must be at least 1".into(),
            ));
        }

        if s.min_group_size > s.max_group_size {
            return Err(ReconError::ConfigValidation(format!(
                "min_group_size ({}) exceeds max_group_size ({})",
                s.min_group_size, s.max_group_size
            )));
        }

        if s.choice_limit == 0 {
            return Err(ReconError::ConfigValidation(
                "choice_limit must be at least 1".into(),
            ));
        }

        if s.manual_attempts == 0 {
            return Err(ReconError::ConfigValidation(
                "manual_attempts must be at least 1".into(),
            ));
        }

        if s.archive_extension.trim().is_empty() || s.archive_extension.starts_with('.') {
            return Err(ReconError::ConfigValidation(format!(
                "archive_extension must be a bare extension like \"zip\", got \"{}\"",
                s.archive_extension
            )));
        }

        let cols = &self.candidates.columns;
        for (field, value) in [("id", &cols.id), ("name", &cols.name), ("email", &cols.email)] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "candidates.columns.{field} must not be empty"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
