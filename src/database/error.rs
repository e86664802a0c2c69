use thiserror::Error;
use warp::reject::Reject;

/// Error surface of every database action. Variants map 1:1 onto the
/// status codes the consuming API answers with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Shopping cart is empty")]
    EmptyCart,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::NotFound(_) => 404,
            Self::Unauthorized(_) => 401,
            Self::EmptyCart => 204,
            Self::Database(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    // One shared message for unknown email and wrong password, so the
    // response does not leak which accounts exist.
    pub fn invalid_credentials() -> Self {
        Self::Validation("Invalid credentials".to_string())
    }
}

impl Reject for ApiError {}

pub struct QueryError {
    info: String,
    code: Option<String>,
    constraint: Option<String>,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            code: None,
            constraint: None,
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self {
                info: e.message().to_string(),
                code: e.code().map(|c| c.to_string()),
                constraint: e.constraint().map(|c| c.to_string()),
            },
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

// Integrity violations are the caller's fault, not the server's:
// 23505 races a duplicate insert, 23503 catches references to rows
// deleted mid-flight, 23514 backs up the payload range checks.
impl Into<ApiError> for QueryError {
    fn into(self) -> ApiError {
        match self.code.as_deref() {
            Some("23505") => ApiError::Conflict(match self.constraint {
                Some(c) => format!("Duplicate value rejected by constraint {c}"),
                None => self.info,
            }),
            Some("23503") | Some("23514") => ApiError::Validation(match self.constraint {
                Some(c) => format!("Value rejected by constraint {c}"),
                None => self.info,
            }),
            _ => ApiError::Database(self.info),
        }
    }
}

pub struct CacheError {
    info: String,
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl CacheError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl Into<ApiError> for CacheError {
    fn into(self) -> ApiError {
        ApiError::Internal(self.info)
    }
}
