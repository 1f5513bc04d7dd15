//! Unified error type.

use std::fmt;

/// The error type returned by sable's fallible operations.
///
/// Routing conditions (404, 405, a failed binding) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures — binding a port, compiling a route pattern,
/// rendering a template — and genuinely unexpected handler failures, which
/// propagate to the transport as [`Outcome::Failed`](crate::Outcome::Failed).
#[derive(Debug)]
pub enum Error {
    /// Socket / filesystem failure.
    Io(std::io::Error),
    /// A route pattern that the regex engine rejected. Fatal at registration.
    Pattern(regex::Error),
    /// Template lookup or rendering failure.
    Template(minijinja::Error),
    /// A failure raised by application code inside a handler or session.
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an application-level failure. Accepts anything convertible into
    /// a boxed error, message strings included: `Error::handler("boom")`.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(err.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)       => write!(f, "io: {e}"),
            Self::Pattern(e)  => write!(f, "pattern: {e}"),
            Self::Template(e) => write!(f, "template: {e}"),
            Self::Handler(e)  => write!(f, "handler: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e)       => Some(e),
            Self::Pattern(e)  => Some(e),
            Self::Template(e) => Some(e),
            Self::Handler(e)  => Some(e.as_ref()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Self::Pattern(e)
    }
}

impl From<minijinja::Error> for Error {
    fn from(e: minijinja::Error) -> Self {
        Self::Template(e)
    }
}
