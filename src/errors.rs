use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for entimap operations.
///
/// This enum represents all possible error types that can occur while mapping
/// objects to communication entities or while building and binding queries.
/// Each error kind describes a specific category of failure, enabling precise
/// error handling.
///
/// # Examples
///
/// ```rust,ignore
/// use entimap::errors::{EntimapError, ErrorKind, EntimapResult};
///
/// fn example() -> EntimapResult<()> {
///     Err(EntimapError::new("Entity not found", ErrorKind::EntityNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Mapping errors - raised by the entity converter and the value adapters
    /// Generic error mapping an object to/from a communication entity
    ObjectMappingError,
    /// An inheritance root entity arrived without its discriminator element
    MissingDiscriminator,
    /// A discriminator value is not registered in the inheritance group
    UnknownDiscriminator,
    /// An attribute converter is registered on a structural (non-scalar) field
    ConverterMismatch,
    /// A value has a different shape than the field metadata declares
    TypeMismatch,

    // Query errors - raised by the parser, binder and pagination assembler
    /// The leading command token of a text query is not supported
    UnsupportedCommand,
    /// The text query does not conform to the grammar
    MalformedQuery,
    /// A prepared query still has unbound parameters
    UnboundParameters,
    /// Cursor pagination was requested on a query without sort keys
    MissingSortKeyForCursor,

    // Usage and configuration errors
    /// The operation is not valid in the current builder or statement state
    InvalidOperation,
    /// Generic validation error on user supplied input
    ValidationError,
    /// No entity metadata is registered for the requested type or name
    EntityNotFound,
    /// No attribute converter is registered under the requested id
    ConverterNotFound,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::MissingDiscriminator => write!(f, "Missing discriminator"),
            ErrorKind::UnknownDiscriminator => write!(f, "Unknown discriminator"),
            ErrorKind::ConverterMismatch => write!(f, "Converter mismatch"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::UnsupportedCommand => write!(f, "Unsupported command"),
            ErrorKind::MalformedQuery => write!(f, "Malformed query"),
            ErrorKind::UnboundParameters => write!(f, "Unbound parameters"),
            ErrorKind::MissingSortKeyForCursor => write!(f, "Missing sort key for cursor"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::EntityNotFound => write!(f, "Entity not found"),
            ErrorKind::ConverterNotFound => write!(f, "Converter not found"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom entimap error type.
///
/// `EntimapError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining and backtraces for
/// debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use entimap::errors::{EntimapError, ErrorKind};
///
/// // Create a simple error
/// let err = EntimapError::new("Unknown discriminator value", ErrorKind::UnknownDiscriminator);
///
/// // Create an error with a cause
/// let cause = EntimapError::new("Value is not a string", ErrorKind::TypeMismatch);
/// let err = EntimapError::new_with_cause("Conversion failed", ErrorKind::ObjectMappingError, cause);
/// ```
///
/// # Type alias
///
/// The `EntimapResult<T>` type alias is equivalent to `Result<T, EntimapError>`
/// and is used throughout the codebase for operations that can fail.
#[derive(Clone)]
pub struct EntimapError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<EntimapError>>,
    backtrace: Backtrace,
}

impl EntimapError {
    /// Creates a new `EntimapError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    ///
    /// # Returns
    ///
    /// A new `EntimapError` instance.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        EntimapError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new(),
        }
    }

    /// Creates a new `EntimapError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    ///
    /// # Returns
    ///
    /// A new `EntimapError` instance with the cause error attached.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: EntimapError) -> Self {
        EntimapError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&Box<EntimapError>> {
        self.cause.as_ref()
    }
}

impl Display for EntimapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for EntimapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for EntimapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for entimap operations.
///
/// `EntimapResult<T>` is shorthand for `Result<T, EntimapError>`.
/// All fallible entimap operations return this type.
pub type EntimapResult<T> = Result<T, EntimapError>;

// From trait implementations for automatic error conversion
impl From<std::num::ParseIntError> for EntimapError {
    fn from(err: std::num::ParseIntError) -> Self {
        EntimapError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::MalformedQuery,
        )
    }
}

impl From<std::num::ParseFloatError> for EntimapError {
    fn from(err: std::num::ParseFloatError) -> Self {
        EntimapError::new(
            &format!("Float parsing error: {}", err),
            ErrorKind::MalformedQuery,
        )
    }
}

impl From<String> for EntimapError {
    fn from(msg: String) -> Self {
        EntimapError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for EntimapError {
    fn from(msg: &str) -> Self {
        EntimapError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entimap_error_new_creates_error() {
        let error = EntimapError::new("An error occurred", ErrorKind::ObjectMappingError);
        assert_eq!(error.message, "An error occurred");
        assert_eq!(error.error_kind, ErrorKind::ObjectMappingError);
        assert!(error.cause.is_none());
    }

    #[test]
    fn entimap_error_new_with_cause_creates_error() {
        let cause = EntimapError::new("Value is not a string", ErrorKind::TypeMismatch);
        let error = EntimapError::new_with_cause(
            "Conversion failed",
            ErrorKind::ObjectMappingError,
            cause,
        );
        assert_eq!(error.message(), "Conversion failed");
        assert_eq!(error.kind(), &ErrorKind::ObjectMappingError);
        assert!(error.cause().is_some());
    }

    #[test]
    fn entimap_error_display_formats_correctly() {
        let error = EntimapError::new("An error occurred", ErrorKind::MalformedQuery);
        assert_eq!(format!("{}", error), "An error occurred");
    }

    #[test]
    fn entimap_error_debug_formats_with_cause() {
        let cause = EntimapError::new("root", ErrorKind::TypeMismatch);
        let error =
            EntimapError::new_with_cause("outer", ErrorKind::ObjectMappingError, cause);
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("outer"));
        assert!(formatted.contains("Caused by:"));
    }

    #[test]
    fn entimap_error_source_returns_cause() {
        let cause = EntimapError::new("root", ErrorKind::TypeMismatch);
        let error =
            EntimapError::new_with_cause("outer", ErrorKind::ObjectMappingError, cause);
        assert!(error.source().is_some());

        let error = EntimapError::new("no cause", ErrorKind::TypeMismatch);
        assert!(error.source().is_none());
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(
            format!("{}", ErrorKind::MissingDiscriminator),
            "Missing discriminator"
        );
        assert_eq!(
            format!("{}", ErrorKind::UnboundParameters),
            "Unbound parameters"
        );
        assert_eq!(
            format!("{}", ErrorKind::MissingSortKeyForCursor),
            "Missing sort key for cursor"
        );
    }

    #[test]
    fn test_mapping_error_kinds() {
        let missing = EntimapError::new("no discriminator", ErrorKind::MissingDiscriminator);
        assert_eq!(missing.kind(), &ErrorKind::MissingDiscriminator);

        let unknown = EntimapError::new("bad discriminator", ErrorKind::UnknownDiscriminator);
        assert_eq!(unknown.kind(), &ErrorKind::UnknownDiscriminator);

        let mismatch = EntimapError::new("converter on embedded", ErrorKind::ConverterMismatch);
        assert_eq!(mismatch.kind(), &ErrorKind::ConverterMismatch);
    }

    #[test]
    fn test_query_error_kinds() {
        let unsupported = EntimapError::new("insert", ErrorKind::UnsupportedCommand);
        assert_eq!(unsupported.kind(), &ErrorKind::UnsupportedCommand);

        let malformed = EntimapError::new("sel", ErrorKind::MalformedQuery);
        assert_eq!(malformed.kind(), &ErrorKind::MalformedQuery);

        let unbound = EntimapError::new("missing: id", ErrorKind::UnboundParameters);
        assert_eq!(unbound.kind(), &ErrorKind::UnboundParameters);
    }

    #[test]
    fn test_from_parse_int_error() {
        let parse_err = "not_a_number".parse::<i64>().unwrap_err();
        let error: EntimapError = parse_err.into();
        assert_eq!(error.kind(), &ErrorKind::MalformedQuery);
        assert!(error.message().contains("Integer parsing"));
    }

    #[test]
    fn test_from_str_and_string() {
        let error: EntimapError = "plain message".into();
        assert_eq!(error.kind(), &ErrorKind::InternalError);
        assert_eq!(error.message(), "plain message");

        let error: EntimapError = String::from("owned message").into();
        assert_eq!(error.message(), "owned message");
    }

    #[test]
    fn test_error_chain_with_different_kinds() {
        let root = EntimapError::new("value is not an i64", ErrorKind::TypeMismatch);
        let mid = EntimapError::new_with_cause(
            "failed to read field age",
            ErrorKind::ObjectMappingError,
            root,
        );
        assert_eq!(mid.kind(), &ErrorKind::ObjectMappingError);
        if let Some(cause) = mid.cause() {
            assert_eq!(cause.kind(), &ErrorKind::TypeMismatch);
        }
    }
}
