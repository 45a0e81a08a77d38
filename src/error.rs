use thiserror::Error;

/// Failures raised by the audit store. Each step has its own variant so a
/// caller can tell a broken schema apart from a failed write.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot open audit database: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("Cannot create audit schema: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("Failed to persist run '{run_id}': {source}")]
    Persist {
        run_id: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to read audit history: {0}")]
    History(#[source] rusqlite::Error),

    #[error("Backup failed: {0}")]
    Backup(#[source] rusqlite::Error),
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required columns in {dataset}: {}", .columns.join(", "))]
    MissingColumns {
        dataset: &'static str,
        columns: Vec<String>,
    },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0} high severity check(s) failed")]
    ChecksFailed(usize),
}

impl AuditError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ChecksFailed(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
