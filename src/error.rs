use crate::database::DatabaseError;
use crate::services::extractor::ExtractionError;
use crate::services::fetcher::FetchError;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database setup errors (pool, migrations)
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Storage errors from the observation store
    #[error("Storage error: {0}")]
    Repository(RepositoryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Fetching or extracting a product page failed
    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Validation(_) => 422,
            AppError::Ingestion(_) => 502,
            AppError::Config(_) => 500,
            AppError::Database(_) | AppError::Repository(_) => 500,
            AppError::Message(_) => 500,
        }
    }
}

/// Failure of one fetch + extract cycle. The store is never touched when
/// this is returned.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl IngestionError {
    /// Short tag naming the failed stage, used as a log field
    pub fn cause_tag(&self) -> &'static str {
        match self {
            IngestionError::Fetch(_) => "fetch",
            IngestionError::Extraction(_) => "extraction",
        }
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A stored value could not be turned back into a model field
    #[error("Invalid stored value: {0}")]
    Decode(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Repository(other),
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::ColumnDecode { index, source } => {
                RepositoryError::Decode(format!("column {}: {}", index, source))
            }
            _ => RepositoryError::Query(err),
        }
    }
}
