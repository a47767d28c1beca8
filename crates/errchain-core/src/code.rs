//! Error codes: stable integer classifications for an error chain.
//!
//! Reserved ranges:
//!
//! | Range      | Owner                                  |
//! |------------|----------------------------------------|
//! | `0`        | Success                                |
//! | `1..=99`   | Internal / generic errors              |
//! | `100..=999`| Reserved for this library (encoding…)  |
//! | `1000+`    | Free for applications                  |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stack::{ErrorStack, Source};

/// An integer error classification.
///
/// Codes do not have to be registered: an unregistered code renders with
/// the frame's own message as both internal and external text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(pub i32);

impl Code {
    // ─── Success ──────────────────────────────────────────────────────────────

    /// No error occurred.
    pub const SUCCESS: Code = Code(0);

    // ─── Internal errors ──────────────────────────────────────────────────────

    /// An unknown error occurred.
    pub const UNKNOWN: Code = Code(1);
    /// A fatal error occurred.
    pub const FATAL: Code = Code(2);
    /// The requested code is not registered.
    pub const CODE_NOT_FOUND: Code = Code(3);

    // ─── Encoding errors ──────────────────────────────────────────────────────

    /// Decoding failed due to an error with the data.
    pub const DECODING_FAILED: Code = Code(100);
    /// JSON data could not be decoded.
    pub const DECODING_JSON: Code = Code(101);
    /// TOML data could not be decoded.
    pub const DECODING_TOML: Code = Code(102);
    /// YAML data could not be decoded.
    pub const DECODING_YAML: Code = Code(103);
    /// Encoding failed due to an error with the data.
    pub const ENCODING_FAILED: Code = Code(104);
    /// JSON data could not be encoded.
    pub const ENCODING_JSON: Code = Code(105);
    /// TOML data could not be encoded.
    pub const ENCODING_TOML: Code = Code(106);
    /// YAML data could not be encoded.
    pub const ENCODING_YAML: Code = Code(107);
    /// Data is not valid JSON.
    pub const INVALID_JSON: Code = Code(108);
    /// Data is not valid TOML.
    pub const INVALID_TOML: Code = Code(109);
    /// Data is not valid YAML.
    pub const INVALID_YAML: Code = Code(110);
    /// Data type conversion failed.
    pub const TYPE_CONVERSION_FAILED: Code = Code(111);

    /// First code of the range free for applications.
    pub const USER_RANGE_START: Code = Code(1000);

    /// Raw integer value.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Returns `true` for [`Code::SUCCESS`].
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// A one-frame stack whose message is this code's registered external
    /// text (empty when the code is unregistered).
    pub fn as_error(self) -> ErrorStack {
        let text = crate::registry::lookup(self)
            .map(|meta| meta.external)
            .unwrap_or_default();
        crate::stack::new(self, text)
    }

    /// Shorthand for [`crate::new`] with this code.
    pub fn new(self, msg: impl Into<String>) -> ErrorStack {
        crate::stack::new(self, msg)
    }

    /// Shorthand for [`crate::wrap`] with this code.
    pub fn wrap(self, err: impl Into<Source>, msg: impl Into<String>) -> ErrorStack {
        crate::stack::wrap(err, self, msg)
    }
}

impl From<i32> for Code {
    fn from(v: i32) -> Self {
        Code(v)
    }
}

impl From<Code> for i32 {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_values() {
        assert_eq!(Code::SUCCESS.value(), 0);
        assert_eq!(Code::CODE_NOT_FOUND.value(), 3);
        assert_eq!(Code::DECODING_FAILED.value(), 100);
        assert_eq!(Code::INVALID_JSON.value(), 108);
        assert_eq!(Code::TYPE_CONVERSION_FAILED.value(), 111);
        assert!(Code::default().is_success());
    }

    #[test]
    fn display_is_bare_integer() {
        assert_eq!(Code(1000).to_string(), "1000");
        assert_eq!(serde_json::to_string(&Code(42)).unwrap(), "42");
    }

    #[test]
    fn display_honours_width() {
        assert_eq!(format!("{:>6}|", Code(108)), "   108|");
        assert_eq!(format!("{:<4}|", Code(1)), "1   |");
    }

    #[test]
    fn as_error_uses_external_text() {
        let err = Code::FATAL.as_error();
        assert_eq!(err.code(), Code::FATAL);
        assert_eq!(err.msg(), "a fatal error occurred");
    }
}
