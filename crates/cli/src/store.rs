//! JSON store under the storage root.
//!
//! Layout:
//! ```text
//! <root>/__meta__/roster.json        identities, tutorial partition, links
//! <out>/<submission>/meta.json       one per processed submission
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use rostersync_recon::{Roster, SubmissionMeta};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },
    #[error("{path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root.join("__meta__")
    }

    pub fn roster_path(&self) -> PathBuf {
        self.meta_dir().join("roster.json")
    }

    /// Default output directory of `workflow prepare` for one exercise.
    pub fn exercise_dir(&self, exercise: u32) -> PathBuf {
        self.root.join("exercises").join(format!("ex{exercise:02}"))
    }

    /// Load the roster; a store that was never written is an empty roster.
    pub fn load_roster(&self) -> Result<Roster, StoreError> {
        let path = self.roster_path();
        if !path.exists() {
            debug!("no roster at {}, starting empty", path.display());
            return Ok(Roster::new());
        }
        let text = fs::read_to_string(&path).map_err(|e| StoreError::Read {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
            path,
            message: e.to_string(),
        })
    }

    pub fn save_roster(&self, roster: &Roster) -> Result<(), StoreError> {
        let path = self.roster_path();
        write_json(&path, roster)?;
        debug!("saved roster to {}", path.display());
        Ok(())
    }
}

/// Write `<dir>/meta.json`, creating `dir` as needed.
pub fn write_submission_meta(dir: &Path, meta: &SubmissionMeta) -> Result<PathBuf, StoreError> {
    let path = dir.join("meta.json");
    write_json(&path, meta)?;
    Ok(path)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let write_err = |message: String| StoreError::Write {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| write_err(e.to_string()))?;
    fs::write(path, json + "\n").map_err(|e| write_err(e.to_string()))
}
