//! Call-site capture: where an error frame was created.
//!
//! [`FrameCapture`] is the seam: [`BacktraceCapture`] walks the live call
//! stack with the `backtrace` crate, tests substitute a fixed capture so
//! rendered output is deterministic.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// A captured call site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    file: String,
    line: u32,
    function: String,
    ip: usize,
    ok: bool,
}

impl Location {
    /// A resolved location.
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>, ip: usize) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
            ip,
            ok: true,
        }
    }

    /// The location reported when no frame could be resolved.
    pub fn unknown() -> Self {
        Self::default()
    }

    fn from_symbol(ip: usize, symbol: &backtrace::Symbol) -> Self {
        let file = symbol
            .filename()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        // `{:#}` drops the trailing `::h<hash>`
        let function = symbol.name().map(|n| format!("{n:#}")).unwrap_or_default();
        let ok = symbol.filename().is_some() && symbol.lineno().is_some();
        Self {
            file,
            line: symbol.lineno().unwrap_or(0),
            function,
            ip,
            ok,
        }
    }

    /// Full source path as recorded by the debug info.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Final component of [`Location::file`].
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.file)
    }

    /// Source line; `0` when unknown.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Demangled function path, without the symbol hash.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Instruction pointer of the frame.
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Whether file and line were recovered. Function and ip may be set
    /// even when this is `false`.
    pub fn ok(&self) -> bool {
        self.ok
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.file, self.line, self.function)
    }
}

/// Source of call-site information for new frames.
pub trait FrameCapture: Send + Sync {
    /// Location of the first frame outside the library, skipping `skip`
    /// further frames outward.
    fn locate(&self, skip: usize) -> Location;

    /// The full call chain at this point, innermost first.
    fn chain(&self) -> Vec<Location>;
}

/// Decides which frames belong to the library itself.
#[derive(Debug, Clone)]
pub struct CaptureFilter {
    /// Symbol path prefixes of library frames.
    pub internal_prefixes: Vec<String>,
    /// Markers that re-admit an otherwise internal frame (the library's tests).
    pub keep_markers: Vec<String>,
}

impl CaptureFilter {
    /// Whether `loc` is a library frame that capture should step over.
    pub fn is_internal(&self, loc: &Location) -> bool {
        // trait impls demangle as `<Type as Trait>::method`; either side may be ours
        let owned = loc.function.split(" as ").any(|part| {
            let part = part.trim_start_matches('<');
            self.internal_prefixes.iter().any(|p| part.starts_with(p.as_str()))
        });
        owned && !self.keep_markers.iter().any(|m| loc.function.contains(m.as_str()))
    }

    /// Whether `loc` may be reported as a call site: it names something
    /// and is not a library frame. File and line are not required.
    pub fn admits(&self, loc: &Location) -> bool {
        let blank = loc.function.is_empty() && loc.file.is_empty();
        !blank && !self.is_internal(loc)
    }
}

impl Default for CaptureFilter {
    fn default() -> Self {
        Self {
            internal_prefixes: vec!["errchain_core::".into(), "backtrace::".into()],
            keep_markers: vec!["::tests::".into()],
        }
    }
}

/// Captures locations by walking the native call stack.
#[derive(Debug, Clone, Default)]
pub struct BacktraceCapture {
    filter: CaptureFilter,
}

impl BacktraceCapture {
    /// Capture with the default [`CaptureFilter`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture that skips the frames `filter` marks as internal.
    pub fn with_filter(filter: CaptureFilter) -> Self {
        Self { filter }
    }
}

impl FrameCapture for BacktraceCapture {
    fn locate(&self, skip: usize) -> Location {
        let mut remaining = skip;
        let mut found: Option<Location> = None;

        backtrace::trace(|frame| {
            let ip = frame.ip() as usize;
            // one physical frame may resolve to several inlined symbols
            backtrace::resolve_frame(frame, |symbol| {
                if found.is_some() {
                    return;
                }
                let loc = Location::from_symbol(ip, symbol);
                if !self.filter.admits(&loc) {
                    return;
                }
                if remaining > 0 {
                    remaining -= 1;
                    return;
                }
                found = Some(loc);
            });
            found.is_none()
        });

        found.unwrap_or_else(|| {
            tracing::trace!(skip, "no frame outside the library could be resolved");
            Location::unknown()
        })
    }

    fn chain(&self) -> Vec<Location> {
        let mut out = Vec::new();
        backtrace::trace(|frame| {
            let ip = frame.ip() as usize;
            let mut resolved = false;
            backtrace::resolve_frame(frame, |symbol| {
                resolved = true;
                out.push(Location::from_symbol(ip, symbol));
            });
            if !resolved {
                out.push(Location {
                    ip,
                    ..Location::unknown()
                });
            }
            true
        });
        out
    }
}

/// Reports the same location for every frame.
///
/// Lets callers pin locations so rendered chains are reproducible.
#[derive(Debug, Clone)]
pub struct StaticCapture {
    location: Location,
}

impl StaticCapture {
    /// Always report `location`.
    pub fn new(location: Location) -> Self {
        Self { location }
    }

    /// Shorthand for a resolved location with a zero instruction pointer.
    pub fn at(file: &str, line: u32, function: &str) -> Self {
        Self::new(Location::new(file, line, function, 0))
    }
}

impl FrameCapture for StaticCapture {
    fn locate(&self, _skip: usize) -> Location {
        self.location.clone()
    }

    fn chain(&self) -> Vec<Location> {
        vec![self.location.clone()]
    }
}
