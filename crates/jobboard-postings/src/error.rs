use thiserror::Error;

/// Errors that can occur while reading or writing job postings.
#[derive(Debug, Error)]
pub enum PostingError {
    /// No posting matched the province filter.
    ///
    /// Carries the province exactly as the caller supplied it.
    #[error("No job postings found for province: {province}")]
    ProvinceNotFound { province: String },

    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An import payload could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PostingError>;
