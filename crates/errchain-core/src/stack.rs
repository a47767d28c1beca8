//! `ErrorStack`, the ordered and lock-guarded chain of frames, and the
//! `new` / `wrap` / `from` / `with` composition operations.
//!
//! Frame 0 is the root cause, the last frame is the most recent
//! annotation. `code()`, `detail()` and the rendered text follow the last
//! frame; `root_cause()` always reaches frame 0.

use std::borrow::Cow;
use std::error::Error;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;

use crate::capture::{BacktraceCapture, FrameCapture, Location};
use crate::code::Code;
use crate::frame::{DynError, Frame};
use crate::registry::{self, Coder, DEFAULT_HTTP_STATUS};

// ─── Source ──────────────────────────────────────────────────────────────────

/// The shape of an error handed to `wrap`, `from` or `with`, decided once at
/// the boundary.
#[derive(Debug, Clone)]
pub enum Source {
    /// Nothing to wrap.
    Nil,
    /// An existing chain; its frames are kept verbatim.
    Stack(ErrorStack),
    /// A single frame taken from another chain.
    Frame(Frame),
    /// Any other error; becomes a synthetic code-0 frame.
    Foreign(DynError),
}

impl Source {
    /// Classify an arbitrary error, recognising stacks and frames.
    pub fn foreign<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::from(Box::new(err) as Box<dyn Error + Send + Sync>)
    }

    /// `true` for [`Source::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    fn into_dyn(self) -> Option<DynError> {
        match self {
            Self::Nil => None,
            Self::Stack(s) => Some(Arc::new(s)),
            Self::Frame(f) => Some(Arc::new(f)),
            Self::Foreign(e) => Some(e),
        }
    }
}

impl From<ErrorStack> for Source {
    fn from(stack: ErrorStack) -> Self {
        Self::Stack(stack)
    }
}

impl From<Frame> for Source {
    fn from(frame: Frame) -> Self {
        Self::Frame(frame)
    }
}

impl From<Box<dyn Error + Send + Sync>> for Source {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        let err = match err.downcast::<ErrorStack>() {
            Ok(stack) => return Self::Stack(*stack),
            Err(other) => other,
        };
        match err.downcast::<Frame>() {
            Ok(frame) => Self::Frame(*frame),
            Err(other) => Self::Foreign(Arc::from(other)),
        }
    }
}

impl From<DynError> for Source {
    fn from(err: DynError) -> Self {
        if let Some(stack) = err.downcast_ref::<ErrorStack>() {
            return Self::Stack(stack.clone());
        }
        if let Some(frame) = err.downcast_ref::<Frame>() {
            return Self::Frame(frame.clone());
        }
        Self::Foreign(err)
    }
}

impl From<io::Error> for Source {
    fn from(err: io::Error) -> Self {
        Self::Foreign(Arc::new(err))
    }
}

impl<T: Into<Source>> From<Option<T>> for Source {
    fn from(err: Option<T>) -> Self {
        err.map_or(Self::Nil, Into::into)
    }
}

// ─── ErrorStack ──────────────────────────────────────────────────────────────

/// An ordered causal chain of [`Frame`]s, safe to share between threads.
///
/// Every method takes the stack's lock for its own duration only; a
/// sequence of calls is not atomic as a whole.
#[derive(Default)]
pub struct ErrorStack {
    frames: Mutex<Vec<Frame>>,
}

impl ErrorStack {
    /// A stack with no frames. Valid, but only as a transient state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A stack holding `frames` as given, root first.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames: Mutex::new(frames),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append frames on top of the stack.
    pub fn push(&self, frames: impl IntoIterator<Item = Frame>) -> &Self {
        self.lock().extend(frames);
        self
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the stack has no frames.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The most recent frame.
    pub fn last(&self) -> Option<Frame> {
        self.lock().last().cloned()
    }

    /// Snapshot of all frames, root first.
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().clone()
    }

    /// Take the frames out of the stack, root first.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Code of the most recent frame; [`Code::SUCCESS`] when empty.
    pub fn code(&self) -> Code {
        self.lock().last().map_or(Code::SUCCESS, Frame::code)
    }

    /// Underlying error of the root frame.
    ///
    /// Named apart from the deprecated `Error::cause`, which an
    /// `Arc<ErrorStack>` also implements and which always returns `None`.
    pub fn root_cause(&self) -> Option<DynError> {
        self.lock().first().map(|f| Arc::clone(f.inner()))
    }

    /// Message of the most recent frame.
    pub fn msg(&self) -> String {
        self.lock()
            .last()
            .map(|f| f.message().to_owned())
            .unwrap_or_default()
    }

    /// Location of the most recent frame.
    pub fn caller(&self) -> Option<Location> {
        self.lock().last().map(|f| f.location().clone())
    }

    /// Internal text for the current code, falling back to the most recent
    /// frame's error text when the code has none.
    pub fn detail(&self) -> String {
        let Some(top) = self.last() else {
            return String::new();
        };
        match registry::lookup(top.code()) {
            Some(meta) if !meta.internal.is_empty() => meta.internal,
            _ => top.text(),
        }
    }

    /// Status registered for the current code; 200 when unset or unregistered.
    pub fn http_status(&self) -> u16 {
        match self.last() {
            Some(top) => registry::status(top.code()),
            None => DEFAULT_HTTP_STATUS,
        }
    }

    /// Location of every frame, root first.
    pub fn trace(&self) -> Vec<Location> {
        self.lock().iter().map(|f| f.location().clone()).collect()
    }

    /// Overwrite the code of the most recent frame. No-op when empty.
    pub fn set_code(&self, code: Code) -> &Self {
        let mut frames = self.lock();
        if let Some(top) = frames.pop() {
            frames.push(top.with_code(code));
        }
        self
    }

    /// Attach `extra` beneath the most recent frame, leaving the current
    /// classification on top. A nil `extra` changes nothing.
    pub fn attach(&self, extra: impl Into<Source>, msg: impl Into<String>) -> &Self {
        self.splice(DEFAULT.capture.as_ref(), extra.into(), msg.into());
        self
    }

    /// Consuming form of [`ErrorStack::attach`].
    pub fn with(self, extra: impl Into<Source>, msg: impl Into<String>) -> Self {
        self.attach(extra, msg);
        self
    }

    fn splice(&self, capture: &dyn FrameCapture, extra: Source, msg: String) {
        if extra.is_nil() {
            return;
        }
        let location = capture.locate(0);

        let mut frames = self.lock();
        let Some(top) = frames.pop() else {
            if let Some(cause) = extra.into_dyn() {
                frames.push(Frame::new(cause, location, Code::SUCCESS, msg));
            }
            return;
        };

        frames.push(Frame::from_message(location.clone(), Code::SUCCESS, msg));
        match extra {
            Source::Stack(stack) => frames.extend(stack.into_frames()),
            Source::Frame(frame) => frames.push(frame),
            Source::Foreign(err) => frames.push(Frame::synthetic(err, location)),
            Source::Nil => {}
        }
        frames.push(top);
    }
}

impl Clone for ErrorStack {
    fn clone(&self) -> Self {
        Self::from_frames(self.frames())
    }
}

impl Error for ErrorStack {}

impl Coder for ErrorStack {
    fn detail(&self) -> Cow<'_, str> {
        Cow::Owned(ErrorStack::detail(self))
    }

    fn http_status(&self) -> u16 {
        ErrorStack::http_status(self)
    }

    fn external(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

// ─── Annotator ───────────────────────────────────────────────────────────────

static DEFAULT: Lazy<Annotator> = Lazy::new(Annotator::default);

/// Builds and extends stacks using a chosen [`FrameCapture`].
///
/// The free functions [`new`], [`wrap`] and [`from`] use a process-wide
/// annotator backed by [`BacktraceCapture`].
#[derive(Clone)]
pub struct Annotator {
    capture: Arc<dyn FrameCapture>,
}

impl Annotator {
    /// An annotator that locates frames with `capture`.
    pub fn with_capture(capture: impl FrameCapture + 'static) -> Self {
        Self {
            capture: Arc::new(capture),
        }
    }

    /// A one-frame stack. The frame carries the full call chain.
    pub fn error(&self, code: Code, msg: impl Into<String>) -> ErrorStack {
        let frame = Frame::from_message(self.capture.locate(0), code, msg)
            .with_backtrace(self.capture.chain());
        ErrorStack::from_frames(vec![frame])
    }

    /// `err`'s frames with one new frame on top.
    pub fn wrap(&self, err: impl Into<Source>, code: Code, msg: impl Into<String>) -> ErrorStack {
        let stack = match err.into() {
            Source::Nil => return self.error(code, msg),
            Source::Stack(stack) => stack,
            Source::Frame(frame) => ErrorStack::from_frames(vec![frame]),
            Source::Foreign(err) => {
                ErrorStack::from_frames(vec![Frame::synthetic(err, self.capture.locate(0))])
            }
        };
        stack.push([Frame::from_message(self.capture.locate(0), code, msg)]);
        stack
    }

    /// Convert `err` into a stack without adding a textual layer.
    ///
    /// A stack only has its top code overwritten. Anything else becomes a
    /// one-frame stack carrying its own text. Nil yields an empty stack.
    pub fn from(&self, code: Code, err: impl Into<Source>) -> ErrorStack {
        let cause = match err.into() {
            Source::Stack(stack) => {
                stack.set_code(code);
                return stack;
            }
            other => match other.into_dyn() {
                Some(cause) => cause,
                None => return ErrorStack::empty(),
            },
        };
        let message = cause.to_string();
        ErrorStack::from_frames(vec![Frame::new(cause, self.capture.locate(0), code, message)])
    }

    /// [`ErrorStack::attach`] with this annotator's capture.
    pub fn attach<'s>(
        &self,
        stack: &'s ErrorStack,
        extra: impl Into<Source>,
        msg: impl Into<String>,
    ) -> &'s ErrorStack {
        stack.splice(self.capture.as_ref(), extra.into(), msg.into());
        stack
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::with_capture(BacktraceCapture::new())
    }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// New one-frame stack located at the caller.
pub fn new(code: Code, msg: impl Into<String>) -> ErrorStack {
    DEFAULT.error(code, msg)
}

/// Wrap `err` with a new frame. Wrapping nil is [`new`].
pub fn wrap(err: impl Into<Source>, code: Code, msg: impl Into<String>) -> ErrorStack {
    DEFAULT.wrap(err, code, msg)
}

/// Convert `err` into a stack classified as `code`.
pub fn from(code: Code, err: impl Into<Source>) -> ErrorStack {
    DEFAULT.from(code, err)
}
