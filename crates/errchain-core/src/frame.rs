//! A single annotated step in an error chain.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::capture::Location;
use crate::code::Code;

/// Shared, thread-safe handle to an underlying error.
pub type DynError = Arc<dyn Error + Send + Sync + 'static>;

/// The error built from a resolved message template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MessageError(pub String);

/// One causal step: underlying error, call site, code and message.
///
/// Immutable once built; [`Frame::with_code`] returns a modified copy.
#[derive(Debug, Clone)]
pub struct Frame {
    cause: DynError,
    location: Location,
    code: Code,
    message: String,
    backtrace: Option<Arc<[Location]>>,
}

impl Frame {
    /// A frame over an existing error.
    pub fn new(cause: DynError, location: Location, code: Code, message: impl Into<String>) -> Self {
        Self {
            cause,
            location,
            code,
            message: message.into(),
            backtrace: None,
        }
    }

    /// A frame whose cause is its own message.
    pub fn from_message(location: Location, code: Code, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(Arc::new(MessageError(message.clone())), location, code, message)
    }

    /// A code-0 frame standing in for a foreign error, messaged with its text.
    pub fn synthetic(cause: DynError, location: Location) -> Self {
        let message = cause.to_string();
        Self::new(cause, location, Code::SUCCESS, message)
    }

    /// Attach the full call chain captured with this frame.
    pub fn with_backtrace(mut self, chain: Vec<Location>) -> Self {
        self.backtrace = Some(chain.into());
        self
    }

    /// Copy of this frame carrying `code`.
    pub fn with_code(mut self, code: Code) -> Self {
        self.code = code;
        self
    }

    /// The underlying error this frame annotates.
    ///
    /// Not named `cause`: through an `Arc<Frame>` that name would resolve
    /// to the deprecated `Error::cause` and return `None`.
    pub fn inner(&self) -> &DynError {
        &self.cause
    }

    /// Where the frame was created.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Classification of this frame.
    pub fn code(&self) -> Code {
        self.code
    }

    /// The resolved message given when the frame was created.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The frame's error text: the cause's rendering.
    pub fn text(&self) -> String {
        self.cause.to_string()
    }

    /// Call chain captured at creation; only root frames carry one.
    pub fn backtrace(&self) -> &[Location] {
        self.backtrace.as_deref().unwrap_or(&[])
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.cause, f)
    }
}

impl Error for Frame {}
