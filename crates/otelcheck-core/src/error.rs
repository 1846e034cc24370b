//! Shared error type across otelcheck crates.

use thiserror::Error;

/// Stable error category, used in log fields and operator messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Listening socket could not be bound.
    Bind,
    /// Metrics endpoint returned non-success or was unreachable.
    Fetch,
    /// A single metric line could not be parsed.
    MalformedLine,
    /// One relay connection failed.
    Connection,
    /// CMDB upsert call failed.
    Upsert,
    /// Configuration file or CLI value rejected.
    Config,
    /// Check-result batch could not be read or decoded.
    Input,
}

impl ErrorKind {
    /// String representation used in structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Bind => "BIND",
            ErrorKind::Fetch => "FETCH",
            ErrorKind::MalformedLine => "MALFORMED_LINE",
            ErrorKind::Connection => "CONNECTION",
            ErrorKind::Upsert => "UPSERT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Input => "INPUT",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CheckError>;

/// Unified error type used by core and the check programs.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch metrics: {0}")]
    Fetch(String),
    #[error("malformed metric line: {0}")]
    MalformedLine(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("cmdb upsert failed: {0}")]
    Upsert(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("invalid check batch: {0}")]
    Input(String),
}

impl CheckError {
    /// Map the error to its stable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::Bind { .. } => ErrorKind::Bind,
            CheckError::Fetch(_) => ErrorKind::Fetch,
            CheckError::MalformedLine(_) => ErrorKind::MalformedLine,
            CheckError::Connection(_) => ErrorKind::Connection,
            CheckError::Upsert(_) => ErrorKind::Upsert,
            CheckError::Config(_) => ErrorKind::Config,
            CheckError::Input(_) => ErrorKind::Input,
        }
    }

    /// Whether the error ends the whole check run (exit 2) rather than one
    /// line or one connection.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CheckError::MalformedLine(_) | CheckError::Connection(_)
        )
    }
}

impl From<std::io::Error> for CheckError {
    fn from(e: std::io::Error) -> Self {
        CheckError::Connection(e.to_string())
    }
}
