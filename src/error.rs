use std::error::Error;
use std::fmt;

/// Errors surfaced across CheckMerge's public API. Kept as a plain enum with a
/// hand-written `Display` impl, following the teacher's own preference for this over
/// a derive macro in its own internal error types.
#[derive(Debug)]
pub enum CheckMergeError {
    /// A front-end failed to produce a well-formed tree from its input.
    ParseFailure { message: String, path: String },
    /// A CLI argument named a plugin (parser or analysis) that isn't registered.
    UnknownPlugin(String),
    /// An invariant that the implementation is supposed to guarantee was violated.
    /// Indicates a bug in CheckMerge itself, not a problem with the input.
    InternalInconsistency(String),
    Io(std::io::Error),
}

impl fmt::Display for CheckMergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailure { message, path } => {
                write!(f, "failed to parse '{path}': {message}")
            }
            Self::UnknownPlugin(name) => write!(f, "no plugin named '{name}' is registered"),
            Self::InternalInconsistency(detail) => {
                write!(f, "internal inconsistency: {detail}")
            }
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl Error for CheckMergeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CheckMergeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub(crate) trait InternalError {
    fn debug_panic(self) -> Self;
}

impl<V, E: Error> InternalError for Result<V, E> {
    /// Panic if this result is an error and we are in debug mode.
    /// This is useful for internal errors that are meant to be never reached,
    /// but that we want to be able to gracefully recover from in release mode.
    #[track_caller]
    #[inline]
    fn debug_panic(self) -> Self {
        if cfg!(debug_assertions) {
            Ok(self.unwrap())
        } else {
            self
        }
    }
}
