use std::path::Path;

use crate::config::CandidateColumns;
use crate::error::ReconError;
use crate::model::{Identity, SecondaryCandidate};

/// Anything that can hand over the two reconciliation pools.
pub trait RosterSource {
    /// System-B candidates, sorted by email.
    fn list_candidates(&self) -> Result<Vec<SecondaryCandidate>, ReconError>;

    /// System-A identities that have no secondary identity yet.
    fn list_identities_missing_link(&self) -> Vec<Identity>;
}

/// Parse a system-B roster export into candidates, sorted by email.
///
/// Empty cells are kept as empty strings. Rows without an id are skipped.
pub fn load_candidates_csv(
    source_name: &str,
    csv_data: &str,
    columns: &CandidateColumns,
) -> Result<Vec<SecondaryCandidate>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReconError::MissingColumn {
                source_name: source_name.into(),
                column: name.into(),
            })
    };

    let id_idx = idx(&columns.id)?;
    let name_idx = idx(&columns.name)?;
    let email_idx = idx(&columns.email)?;

    let mut candidates = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = record.get(id_idx).unwrap_or("");
        if id.is_empty() {
            continue;
        }
        candidates.push(SecondaryCandidate::new(
            id,
            record.get(name_idx).unwrap_or(""),
            record.get(email_idx).unwrap_or(""),
        ));
    }

    candidates.sort_by(|a, b| a.email.cmp(&b.email));
    Ok(candidates)
}

/// A system-B export on disk, paired with the identities it should be
/// reconciled against.
pub struct CsvCandidates<'a> {
    path: &'a Path,
    columns: &'a CandidateColumns,
    identities: &'a [Identity],
}

impl<'a> CsvCandidates<'a> {
    pub fn new(path: &'a Path, columns: &'a CandidateColumns, identities: &'a [Identity]) -> Self {
        Self {
            path,
            columns,
            identities,
        }
    }
}

impl RosterSource for CsvCandidates<'_> {
    fn list_candidates(&self) -> Result<Vec<SecondaryCandidate>, ReconError> {
        let data = std::fs::read_to_string(self.path)
            .map_err(|e| ReconError::Io(format!("{}: {e}", self.path.display())))?;
        load_candidates_csv(&self.path.display().to_string(), &data, self.columns)
    }

    fn list_identities_missing_link(&self) -> Vec<Identity> {
        self.identities
            .iter()
            .filter(|i| !i.is_linked())
            .cloned()
            .collect()
    }
}
