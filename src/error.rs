use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaixaError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "Cannot open the ledger at {path}: {reason}\n\
         Check that the data directory exists and is writable, or run `caixa init`."
    )]
    StoreUnavailable { path: String, reason: String },

    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Bill already paid this month: {0}")]
    DuplicatePayment(String),

    #[error(
        "The ledger changed since it was exported (expected checksum {expected}, found {actual}).\n\
         Export the period again and reapply your edits."
    )]
    StaleLedger { expected: String, actual: String },

    #[error("Invalid period: {0} (expected YYYY-MM)")]
    InvalidPeriod(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CaixaError>;
