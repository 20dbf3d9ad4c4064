// Application settings
// Loaded from ~/.config/rostersync/settings.toml

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use rostersync_recon::ReconConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },
    #[error("{path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{path}: {message}")]
    Invalid { path: PathBuf, message: String },
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Where the roster store and submission metadata live.
    /// None = the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorSettings {
    /// Display name of the operator, shown in reports.
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub tutor: TutorSettings,
    /// `[matching]`, `[submissions]` and `[candidates.columns]`.
    #[serde(flatten)]
    pub recon: ReconConfig,
}

const DEFAULT_FILE: &str = r#"# rostersync settings

[storage]
# root = "/path/to/rostersync-data"

[tutor]
name = ""

[matching]
# Retry leftovers with the looser in-order token match
complex_pass = true
# Tokens shorter than this do not count in that retry (0 = all count)
complex_min_token_len = 0

[submissions]
min_group_size = 2
max_group_size = 3
archive_extension = "zip"
# Ask before listing this many lookup hits
choice_limit = 11
# Empty answers before a manual lookup gives up on a name
manual_attempts = 1

[candidates.columns]
id = "id"
name = "name"
email = "email"
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rostersync")
            .join("settings.toml")
    }

    /// Default storage root when none is configured.
    pub fn default_storage_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rostersync")
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage
            .root
            .clone()
            .unwrap_or_else(Self::default_storage_root)
    }

    /// Load from `explicit` if given (must exist), else from the default
    /// location, falling back to defaults when that file does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!("no settings at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings = Self::from_toml(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        settings.recon.validate().map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Save current settings to disk
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e: String| ConfigError::Write {
            path: path.to_path_buf(),
            message: e,
        };

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let text = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        fs::write(path, text).map_err(|e| write_err(e.to_string()))
    }

    /// Write the commented default file, unless one already exists.
    /// Returns whether a file was written.
    pub fn create_default_file(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        fs::write(path, DEFAULT_FILE).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_parses_to_defaults() {
        let settings = Settings::from_toml(DEFAULT_FILE).unwrap();
        assert_eq!(settings.storage.root, None);
        assert!(settings.recon.matching.complex_pass);
        assert_eq!(settings.recon.submissions.max_group_size, 3);
        assert_eq!(settings.recon.submissions.manual_attempts, 1);
        assert_eq!(settings.recon.candidates.columns.id, "id");
        settings.recon.validate().unwrap();
    }

    #[test]
    fn empty_file_is_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.tutor.name, "");
        assert_eq!(settings.recon.submissions.min_group_size, 2);
        assert_eq!(settings.recon.submissions.choice_limit, 11);
    }

    #[test]
    fn sections_are_read() {
        let settings = Settings::from_toml(
            r#"
[storage]
root = "/tmp/rs"

[tutor]
name = "Jane Tutor"

[matching]
complex_min_token_len = 3

[candidates.columns]
email = "mail"
"#,
        )
        .unwrap();
        assert_eq!(settings.storage_root(), PathBuf::from("/tmp/rs"));
        assert_eq!(settings.tutor.name, "Jane Tutor");
        assert_eq!(settings.recon.matching.complex_min_token_len, 3);
        assert!(settings.recon.matching.complex_pass);
        assert_eq!(settings.recon.candidates.columns.email, "mail");
        assert_eq!(settings.recon.candidates.columns.name, "name");
    }

    #[test]
    fn load_from_rejects_invalid_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[submissions]\nmin_group_size = 5\nmax_group_size = 3\n").unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("exceeds max_group_size"));
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[submissions\n").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(Settings::load(Some(&path)), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let mut settings = Settings::default();
        settings.tutor.name = "Jane".into();
        settings.recon.submissions.max_group_size = 4;
        settings.save_to(&path).unwrap();

        let back = Settings::load_from(&path).unwrap();
        assert_eq!(back.tutor.name, "Jane");
        assert_eq!(back.recon.submissions.max_group_size, 4);
    }

    #[test]
    fn create_default_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        assert!(Settings::create_default_file(&path).unwrap());
        assert!(!Settings::create_default_file(&path).unwrap());
        Settings::load_from(&path).unwrap();
    }
}
