use std::fmt;

/// Error raised while resolving stacks into a routing table
///
/// Resolution is best-effort for missing or malformed optional data, which is
/// skipped with a log line. Only invalid declarations (bad CORS quoting,
/// invalid authorizer payload versions, malformed API references) and failures
/// of the document reader surface as errors.
#[derive(Debug)]
pub enum ResolveError {
    /// A template or API document declares something that cannot be honoured
    ///
    /// The message names the offending resource, authorizer or field.
    InvalidDocument {
        /// Human-readable description of the invalid declaration
        message: String,
    },
    /// The document reader failed to produce an API document
    ///
    /// The reader's error is carried unmodified.
    DocumentRead(anyhow::Error),
}

impl ResolveError {
    /// Build an [`ResolveError::InvalidDocument`] from any message
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        ResolveError::InvalidDocument {
            message: message.into(),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::InvalidDocument { message } => write!(f, "{message}"),
            ResolveError::DocumentRead(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::InvalidDocument { .. } => None,
            ResolveError::DocumentRead(err) => Some(err.as_ref()),
        }
    }
}

impl From<anyhow::Error> for ResolveError {
    fn from(err: anyhow::Error) -> Self {
        ResolveError::DocumentRead(err)
    }
}

/// Result alias used throughout resolution
pub type ResolveResult<T> = Result<T, ResolveError>;
