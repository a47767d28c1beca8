//! errchain-core — structured error chains with stable codes.
//!
//! Each layer that handles an error wraps it instead of discarding it. The
//! resulting [`ErrorStack`] keeps:
//! - the root cause ([`ErrorStack::cause`]) at frame 0
//! - the most specific classification ([`ErrorStack::code`]) on top
//! - the call site of every annotation ([`ErrorStack::trace`])
//!
//! Codes map to an external (user-safe) text, an internal (log) text and an
//! HTTP status through the [`registry`].
//!
//! # Quick Start
//!
//! ```rust
//! use errchain_core::{register, wrap, Code, CodeMeta, RenderMode};
//!
//! const CONFIG_NOT_VALID: Code = Code(1000);
//! register(CONFIG_NOT_VALID, CodeMeta::new("Configuration not valid", "the configuration is invalid", 500));
//!
//! let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "read: end of input");
//! let err = wrap(io, Code::UNKNOWN, "could not read configuration file");
//! let err = wrap(err, CONFIG_NOT_VALID, "service configuration could not be loaded");
//!
//! assert_eq!(err.to_string(), "Configuration not valid (code:1000)");
//! assert_eq!(err.http_status(), 500);
//! assert_eq!(err.root_cause().unwrap().to_string(), "read: end of input");
//! println!("{}", err.render(RenderMode::Condensed));
//! ```

pub mod capture;
pub mod code;
pub mod decode;
pub mod frame;
#[macro_use]
mod macros;
pub mod registry;
pub mod render;
pub mod report;
pub mod stack;

pub use capture::{BacktraceCapture, CaptureFilter, FrameCapture, Location, StaticCapture};
pub use code::Code;
pub use decode::{decode_err, ResultExt};
pub use frame::{DynError, Frame, MessageError};
pub use registry::{codes, lookup, register, status, CodeMeta, CodeRegistry, Coder, RegistryError};
pub use render::RenderMode;
pub use report::{FrameReport, StackReport};
pub use stack::{from, new, wrap, Annotator, ErrorStack, Source};
