use thiserror::Error;

#[derive(Error, Debug)]
pub enum FiscalError {
    #[error("Failed to read file {file}: {source}")]
    FileRead {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "No valid fiscal data found{}",
        .files.map(|n| format!(" in {n} file(s)")).unwrap_or_default()
    )]
    NoValidData { files: Option<usize> },

    #[error("Invalid period key '{0}': expected '<Month> <Year>'")]
    InvalidPeriod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid share {share} for partner {partner}: must be between 0 and 100")]
    InvalidShare { partner: String, share: f64 },

    #[error("Active partner shares sum to {total}%, which exceeds 100%")]
    OwnershipExceeded { total: f64 },

    #[error("Unknown company: {0}")]
    UnknownCompany(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FiscalError>;
