use sqlx::error::ErrorKind;
use warp::{http::StatusCode, reject::Rejection};

/// Error taxonomy for every operation in the crate.
///
/// Storage-level constraint violations are translated into the matching
/// variant so callers never see raw driver errors: the unique constraints on
/// the relation tables act as the concurrency arbiter for toggles, and a
/// violated one surfaces as `Conflict`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{field}: {info}")]
    Validation { field: &'static str, info: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("transaction aborted: {0}")]
    Transaction(String),

    #[error("query failed: {0}")]
    Query(String),
}

impl ApiError {
    pub fn validation(field: &'static str, info: impl Into<String>) -> Self {
        Self::Validation {
            field,
            info: info.into(),
        }
    }

    pub fn conflict(info: impl Into<String>) -> Self {
        Self::Conflict(info.into())
    }

    pub fn not_found(info: impl Into<String>) -> Self {
        Self::NotFound(info.into())
    }

    pub fn invalid_operation(info: impl Into<String>) -> Self {
        Self::InvalidOperation(info.into())
    }

    pub fn permission_denied(info: impl Into<String>) -> Self {
        Self::PermissionDenied(info.into())
    }

    /// Wraps a storage failure that happened inside the recipe write
    /// transaction. Every in-transaction step failure is reported as
    /// `Transaction`; the transaction itself is rolled back on drop, so the
    /// prior tag/ingredient state stays intact.
    pub fn transaction(value: sqlx::Error) -> Self {
        match Self::from(value) {
            Self::Query(info) => Self::Transaction(info),
            e => Self::Transaction(e.to_string()),
        }
    }

    pub fn rejection(self) -> Rejection {
        warp::reject::custom(self)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Transaction(_) | Self::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::NotFound(String::from("Row not found")),
            sqlx::Error::Database(e) => match e.kind() {
                ErrorKind::UniqueViolation => Self::Conflict(format!("{e}")),
                ErrorKind::ForeignKeyViolation => Self::NotFound(format!("{e}")),
                ErrorKind::CheckViolation => Self::InvalidOperation(format!("{e}")),
                _ => Self::Query(format!("{e}")),
            },
            sqlx::Error::Configuration(e) => Self::Query(format!("{e}")),
            sqlx::Error::Io(e) => Self::Query(format!("{e}")),
            sqlx::Error::Tls(e) => Self::Query(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::Query(format!("{e}")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::Query(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::Query(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::Query(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::Query(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::Query(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::Query(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::Query(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::Query(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::Query(format!("{e}")),
            _ => Self::Query(String::from("Unknown error")),
        }
    }
}

impl warp::reject::Reject for ApiError {}
