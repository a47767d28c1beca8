//! Boundary helpers that turn an arbitrary error into a response-ready
//! `(code, message)` pair, and attach codes while propagating results.

use std::error::Error;

use crate::code::Code;
use crate::registry;
use crate::stack::{self, ErrorStack, Source};

/// Fallback text for errors that are not stacks.
pub const UNKNOWN_ERROR_TEXT: &str = "an unknown error occurred";

/// Translate `err` into a code and a user-safe message.
///
/// - `None` → `(SUCCESS, "ok")`
/// - an [`ErrorStack`] → its code and external rendering
/// - anything else → `(UNKNOWN, "an unknown error occurred")`
pub fn decode_err(err: Option<&(dyn Error + 'static)>) -> (Code, String) {
    let Some(err) = err else {
        return (Code::SUCCESS, registered_text(Code::SUCCESS, "ok"));
    };
    match err.downcast_ref::<ErrorStack>() {
        Some(stack) => (stack.code(), stack.to_string()),
        None => (Code::UNKNOWN, registered_text(Code::UNKNOWN, UNKNOWN_ERROR_TEXT)),
    }
}

fn registered_text(code: Code, fallback: &str) -> String {
    registry::lookup(code)
        .map(|meta| meta.external)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}

/// Code-attaching conversions for any `Result`.
pub trait ResultExt<T> {
    /// Wrap the error with a new frame classified as `code`.
    fn wrap_err(self, code: Code, msg: impl Into<String>) -> Result<T, ErrorStack>;

    /// Convert the error into a stack classified as `code`, adding no frame
    /// to an existing stack.
    fn from_err(self, code: Code) -> Result<T, ErrorStack>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    // no `map_err`: its std frame would be captured as the call site
    fn wrap_err(self, code: Code, msg: impl Into<String>) -> Result<T, ErrorStack> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(stack::wrap(Source::foreign(e), code, msg)),
        }
    }

    fn from_err(self, code: Code) -> Result<T, ErrorStack> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(stack::from(code, Source::foreign(e))),
        }
    }
}
