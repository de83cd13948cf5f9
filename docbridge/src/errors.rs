use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for docbridge operations.
///
/// The first five variants form the taxonomy callers branch on when choosing
/// between retry and fail-fast handling. The rest describe boundary validation
/// failures raised before any store round-trip happens.
///
/// # Examples
///
/// ```rust,ignore
/// use docbridge::errors::{DbError, ErrorKind, DbResult};
///
/// fn example() -> DbResult<()> {
///     Err(DbError::new("connection reset", ErrorKind::StoreUnavailable))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Transport or network failure, including transport timeouts
    StoreUnavailable,
    /// The targeted document does not exist where existence was required
    NotFound,
    /// The store refused the write (validation, permission)
    WriteRejected,
    /// The query description asks for an unsupported combination
    InvalidQuery,
    /// A bulk write exceeds the backend batch limit
    BatchTooLarge,

    /// The document id is missing, empty or not a string
    InvalidId,
    /// The endpoint name is empty or malformed
    InvalidEndpoint,
    /// Error mapping a record to or from a document
    ObjectMappingError,
    /// The subscription was already released
    SubscriptionClosed,
    /// The client or store was configured inconsistently
    InvalidConfiguration,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl ErrorKind {
    /// Returns `true` when the caller may retry the same call with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::StoreUnavailable)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::StoreUnavailable => write!(f, "Store unavailable"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::WriteRejected => write!(f, "Write rejected"),
            ErrorKind::InvalidQuery => write!(f, "Invalid query"),
            ErrorKind::BatchTooLarge => write!(f, "Batch too large"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidEndpoint => write!(f, "Invalid endpoint"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::SubscriptionClosed => write!(f, "Subscription closed"),
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type returned by every fallible docbridge operation.
///
/// `DbError` carries a message, an [ErrorKind], an optional cause and a
/// backtrace captured at construction time.
///
/// # Examples
///
/// ```rust,ignore
/// use docbridge::errors::{DbError, ErrorKind};
///
/// let cause = DbError::new("socket closed", ErrorKind::StoreUnavailable);
/// let err = DbError::new_with_cause("get failed", ErrorKind::StoreUnavailable, cause);
/// ```
#[derive(Clone)]
pub struct DbError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DbError>>,
    backtrace: Atomic<Backtrace>,
}

impl DbError {
    /// Creates a new `DbError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DbError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `DbError` wrapping the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DbError) -> Self {
        DbError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DbError> {
        self.cause.as_deref()
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docbridge operations.
pub type DbResult<T> = Result<T, DbError>;

impl de::Error for DbError {
    fn custom<T: Display>(msg: T) -> Self {
        DbError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for DbError {
    fn custom<T: Display>(msg: T) -> Self {
        DbError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::new(
            &format!("Record mapping error: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

impl From<tokio::time::error::Elapsed> for DbError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        DbError::new(
            &format!("Store transport timed out: {}", err),
            ErrorKind::StoreUnavailable,
        )
    }
}
