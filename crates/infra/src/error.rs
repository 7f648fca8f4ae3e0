use thiserror::Error;

/// Persistence failure.
///
/// These are infrastructure errors; callers never substitute a default value
/// (for example a fallback role) when they see one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A row could not be decoded into its domain type.
    #[error("corrupt row: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Map a sqlx error raised during `operation`.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            StoreError::Unavailable(format!("database error in {operation} ({code}): {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable(format!("connection pool closed in {operation}")),
        sqlx::Error::PoolTimedOut => StoreError::Unavailable(format!("connection pool timed out in {operation}")),
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Decode(format!("column {index} in {operation}: {source}"))
        }
        other => StoreError::Unavailable(format!("{operation}: {other}")),
    }
}
