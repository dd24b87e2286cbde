use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for docwarden operations.
///
/// Each kind names one category of failure so callers can branch on
/// [`WardenError::kind`] instead of parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use docwarden::errors::{WardenError, ErrorKind, WardenResult};
///
/// fn reject() -> WardenResult<()> {
///     Err(WardenError::new("document is locked", ErrorKind::ValidationError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Pipeline Errors
    /// A before-phase hook rejected a document before persistence
    ValidationError,
    /// An after-phase hook failed after the document was already persisted
    HookError,

    // Lookup Errors
    /// A singular operation matched zero documents
    NotFound,
    /// The document carries no usable identifier
    InvalidId,

    // Store Errors
    /// The store binding failed a round trip
    StoreError,

    // Read-path Errors
    /// A virtual field's compute function failed
    VirtualEvaluationError,
    /// A query filter could not be evaluated
    FilterError,

    // Data Encoding Errors
    /// Error mapping an entity to or from a document
    ObjectMappingError,

    // Operation Errors
    /// The operation is not valid in the current context
    InvalidOperation,

    // Event Errors
    /// Error in event processing
    EventError,

    // Generic/Internal Errors
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::HookError => write!(f, "Hook error"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::VirtualEvaluationError => write!(f, "Virtual evaluation error"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// The error type of every fallible docwarden operation.
///
/// Carries a message, an [`ErrorKind`], an optional cause and the backtrace
/// captured at construction time.
///
/// # Examples
///
/// ```rust,ignore
/// use docwarden::errors::{WardenError, ErrorKind};
///
/// let cause = WardenError::new("connection reset", ErrorKind::StoreError);
/// let err = WardenError::new_with_cause("Failed to persist document", ErrorKind::StoreError, cause);
/// ```
#[derive(Clone)]
pub struct WardenError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<WardenError>>,
    backtrace: Atomic<Backtrace>,
}

impl WardenError {
    /// Creates a new `WardenError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        WardenError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `WardenError` that wraps `cause`.
    ///
    /// The cause is preserved and reachable through [`WardenError::cause`] and
    /// [`std::error::Error::source`].
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: WardenError) -> Self {
        WardenError {
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

    pub fn cause(&self) -> Option<&WardenError> {
        self.cause.as_deref()
    }

    /// Returns the innermost error of the cause chain.
    pub fn root_cause(&self) -> &WardenError {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }

    pub fn is_validation(&self) -> bool {
        self.error_kind == ErrorKind::ValidationError
    }

    pub fn is_not_found(&self) -> bool {
        self.error_kind == ErrorKind::NotFound
    }

    pub fn is_store(&self) -> bool {
        self.error_kind == ErrorKind::StoreError
    }
}

impl Display for WardenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for WardenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => write!(f, "{} ({})\n{:?}", self.message, self.error_kind, self.backtrace.read()),
        }
    }
}

impl Error for WardenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docwarden operations.
pub type WardenResult<T> = Result<T, WardenError>;

impl de::Error for WardenError {
    fn custom<T: Display>(msg: T) -> Self {
        WardenError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for WardenError {
    fn custom<T: Display>(msg: T) -> Self {
        WardenError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(err: serde_json::Error) -> Self {
        WardenError::new(
            &format!("Object mapping error: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

impl From<regex::Error> for WardenError {
    fn from(err: regex::Error) -> Self {
        WardenError::new(
            &format!("Invalid regular expression: {}", err),
            ErrorKind::FilterError,
        )
    }
}

impl From<String> for WardenError {
    fn from(msg: String) -> Self {
        WardenError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for WardenError {
    fn from(msg: &str) -> Self {
        WardenError::new(msg, ErrorKind::InternalError)
    }
}
