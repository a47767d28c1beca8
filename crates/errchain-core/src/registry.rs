//! Code registry. Maps a [`Code`] to its external text, internal text and
//! transport status.
//!
//! The process-wide registry behind [`codes()`] is seeded with the built-in
//! codes on first use. Collaborators add their own entries (conventionally
//! `1000+`) with [`register`] or by loading a JSON code table. Entries are
//! add-only; registering an existing code overwrites it, last writer wins.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::code::Code;

/// HTTP status reported for a code without an explicit status.
pub const DEFAULT_HTTP_STATUS: u16 = 200;

/// Errors raised while loading a code table.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The table is not a JSON array of code entries.
    #[error("code table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A row carries an HTTP status outside `100..=599`.
    #[error("code {code}: HTTP status {status} is outside 100..=599")]
    InvalidStatus {
        /// The offending row's code.
        code: Code,
        /// The rejected status.
        status: u16,
    },
}

/// Metadata capability of an error code.
///
/// Implemented by [`CodeMeta`] and by [`crate::ErrorStack`], so a
/// collaborator can pull a status and a safe message out of either.
pub trait Coder {
    /// Internal only (logs) error text.
    fn detail(&self) -> Cow<'_, str>;

    /// HTTP status to use for the associated code. Never `0`.
    fn http_status(&self) -> u16;

    /// External (user facing) error text.
    fn external(&self) -> Cow<'_, str>;
}

/// Immutable metadata registered for a code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMeta {
    /// External (user facing) error text.
    pub external: String,
    /// Internal only (logs) error text. Empty means "use the frame message".
    #[serde(default)]
    pub internal: String,
    /// HTTP status. `0` means unset and reads back as 200.
    #[serde(default)]
    pub http: u16,
}

impl CodeMeta {
    /// Metadata with the given texts; pass `0` for an unset status.
    pub fn new(external: impl Into<String>, internal: impl Into<String>, http: u16) -> Self {
        Self {
            external: external.into(),
            internal: internal.into(),
            http,
        }
    }
}

impl Coder for CodeMeta {
    fn detail(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.internal)
    }

    fn http_status(&self) -> u16 {
        if self.http == 0 {
            DEFAULT_HTTP_STATUS
        } else {
            self.http
        }
    }

    fn external(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.external)
    }
}

impl fmt::Display for CodeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.external)
    }
}

/// One row of a JSON code table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntry {
    /// The code being registered.
    pub code: Code,
    /// Texts and status, flattened into the same JSON object.
    #[serde(flatten)]
    pub meta: CodeMeta,
}

/// A concurrency-safe `Code → CodeMeta` map.
pub struct CodeRegistry {
    entries: RwLock<HashMap<Code, CodeMeta>>,
}

impl CodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry holding the built-in internal and encoding codes.
    pub fn with_builtins() -> Self {
        let reg = Self::new();
        let builtins: &[(Code, &str, &str)] = &[
            // ─── Success ──────────────────────────────────────────────────────
            (Code::SUCCESS, "ok", "ok"),
            // ─── Internal ─────────────────────────────────────────────────────
            (Code::UNKNOWN, "an unknown error occurred", ""),
            (Code::FATAL, "a fatal error occurred", "a fatal error occurred"),
            (Code::CODE_NOT_FOUND, "code not found", "code not found"),
            // ─── Encoding ─────────────────────────────────────────────────────
            (Code::DECODING_JSON, "JSON data could not be decoded", "JSON data could not be decoded"),
            (Code::DECODING_TOML, "TOML data could not be decoded", "TOML data could not be decoded"),
            (Code::DECODING_YAML, "YAML data could not be decoded", "YAML data could not be decoded"),
            (Code::ENCODING_JSON, "JSON data could not be encoded", "JSON data could not be encoded"),
            (Code::ENCODING_TOML, "TOML data could not be encoded", "TOML data could not be encoded"),
            (Code::ENCODING_YAML, "YAML data could not be encoded", "YAML data could not be encoded"),
            (Code::TYPE_CONVERSION_FAILED, "data type conversion failed", "data type conversion failed"),
        ];
        {
            let mut entries = reg.entries.write().unwrap_or_else(PoisonError::into_inner);
            for (code, ext, int) in builtins {
                entries.insert(*code, CodeMeta::new(*ext, *int, 0));
            }
        }
        reg
    }

    /// Insert or overwrite the entry for `code`.
    pub fn register(&self, code: Code, meta: CodeMeta) {
        let replaced = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code, meta)
            .is_some();
        tracing::debug!(code = code.value(), replaced, "registered error code");
    }

    /// Metadata for `code`, if registered.
    pub fn lookup(&self, code: Code) -> Option<CodeMeta> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&code)
            .cloned()
    }

    /// HTTP status for `code`; 200 when unregistered or unset.
    pub fn status(&self, code: Code) -> u16 {
        self.lookup(code)
            .map(|meta| meta.http_status())
            .unwrap_or(DEFAULT_HTTP_STATUS)
    }

    /// Number of registered codes.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no code is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all entries, sorted by code.
    pub fn codes(&self) -> Vec<CodeEntry> {
        let mut out: Vec<CodeEntry> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(code, meta)| CodeEntry { code: *code, meta: meta.clone() })
            .collect();
        out.sort_by_key(|e| e.code);
        out
    }

    /// Load entries from a JSON array string.
    ///
    /// Expected format: `[{ "code": 1000, "external": "...", "internal": "...", "http": 500 }, ...]`.
    /// The table is validated as a whole; nothing is registered if any row is rejected.
    pub fn load_json(&self, json: &str) -> Result<usize, RegistryError> {
        let rows: Vec<CodeEntry> = serde_json::from_str(json)?;
        if let Some(bad) = rows
            .iter()
            .find(|row| row.meta.http != 0 && !(100..=599).contains(&row.meta.http))
        {
            return Err(RegistryError::InvalidStatus {
                code: bad.code,
                status: bad.meta.http,
            });
        }
        let count = rows.len();
        for row in rows {
            self.register(row.code, row.meta);
        }
        tracing::debug!(count, "loaded code table");
        Ok(count)
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeRegistry").field("len", &self.len()).finish()
    }
}

// ─── Process-wide registry ───────────────────────────────────────────────────

static CODES: Lazy<CodeRegistry> = Lazy::new(CodeRegistry::with_builtins);

/// The process-wide registry used by error stacks.
pub fn codes() -> &'static CodeRegistry {
    &CODES
}

/// Register `code` in the process-wide registry.
pub fn register(code: Code, meta: CodeMeta) {
    CODES.register(code, meta);
}

/// Look up `code` in the process-wide registry.
pub fn lookup(code: Code) -> Option<CodeMeta> {
    CODES.lookup(code)
}

/// HTTP status of `code` in the process-wide registry.
pub fn status(code: Code) -> u16 {
    CODES.status(code)
}
