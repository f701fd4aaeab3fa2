//! Error types for VFC

use thiserror::Error;

/// Result type alias for VFC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for VFC
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required buffer or argument was missing
    #[error("Null pointer: {0}")]
    NullPointer(String),

    /// Internal buffer growth failed
    #[error("Memory allocation failed: requested {requested} bytes (limit {limit:?})")]
    MemoryAlloc {
        requested: usize,
        limit: Option<usize>,
    },

    /// Caller bug or unexpected input that has no better classification
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// Invalid state transition
    #[error("Undefined behavior: {0}")]
    UndefinedBehavior(String),

    /// Lookup miss that should not happen in correct usage
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed codec syntax (SPS, SEI, frame headers)
    #[error("Bitstream error: {0}")]
    Bitstream(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Flat status code reported to the owning component
///
/// The component translates these into its own error enumeration; the
/// constructor never reports anything richer than this across its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    None,
    NullPointer,
    MemoryAlloc,
    Unknown,
    UndefinedBehavior,
    NotFound,
}

impl Status {
    /// Status of an operation result; `Ok` maps to `Status::None`
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Status::None,
            Err(e) => e.status(),
        }
    }

    /// Whether this status denotes success
    pub fn is_ok(&self) -> bool {
        *self == Status::None
    }
}

impl Error {
    /// Create a null pointer error
    pub fn null_pointer<S: Into<String>>(msg: S) -> Self {
        Error::NullPointer(msg.into())
    }

    /// Create a memory allocation error
    pub fn memory_alloc(requested: usize, limit: Option<usize>) -> Self {
        Error::MemoryAlloc { requested, limit }
    }

    /// Create an unknown error
    pub fn unknown<S: Into<String>>(msg: S) -> Self {
        Error::Unknown(msg.into())
    }

    /// Create an undefined behavior error
    pub fn undefined_behavior<S: Into<String>>(msg: S) -> Self {
        Error::UndefinedBehavior(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a bitstream syntax error
    pub fn bitstream<S: Into<String>>(msg: S) -> Self {
        Error::Bitstream(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Map this error onto the flat status taxonomy
    pub fn status(&self) -> Status {
        match self {
            Error::NullPointer(_) => Status::NullPointer,
            Error::MemoryAlloc { .. } => Status::MemoryAlloc,
            Error::UndefinedBehavior(_) => Status::UndefinedBehavior,
            Error::NotFound(_) => Status::NotFound,
            Error::Io(_)
            | Error::Unknown(_)
            | Error::InvalidInput(_)
            | Error::Bitstream(_)
            | Error::Config(_) => Status::Unknown,
        }
    }
}
