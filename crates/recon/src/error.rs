use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Policy validation error (bad group bounds, empty column name, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Missing required column in a candidate export.
    #[error("source '{source_name}': missing column '{column}'")]
    MissingColumn { source_name: String, column: String },
    /// Malformed CSV record.
    #[error("CSV error: {0}")]
    Csv(String),
    /// No identity with the given primary id.
    #[error("unknown identity: {0}")]
    UnknownIdentity(String),
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl From<csv::Error> for ReconError {
    fn from(error: csv::Error) -> Self {
        ReconError::Csv(error.to_string())
    }
}

impl From<std::io::Error> for ReconError {
    fn from(error: std::io::Error) -> Self {
        ReconError::Io(error.to_string())
    }
}
