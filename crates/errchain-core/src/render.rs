//! Rendering an [`ErrorStack`] as text.
//!
//! Four modes, always walking frames from the most recent (top) down to
//! the root:
//!
//! | Mode        | Formatter | Output                                            |
//! |-------------|-----------|---------------------------------------------------|
//! | `External`  | `{}`      | top frame's user-safe text and code               |
//! | `Inline`    | `{:-}`    | every frame on one line, for logs                 |
//! | `Condensed` | `{:#}`    | one line per frame                                |
//! | `Verbose`   | `{:+}`    | five lines per frame, for humans                  |
//!
//! Registered texts that are empty fall back to the frame's own error
//! text, so no rendered field is ever blank unless the message was.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::Frame;
use crate::registry::{self, CodeRegistry};
use crate::stack::ErrorStack;

/// Selects how a stack is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// User-safe message of the top frame. Never includes internal text.
    #[default]
    External,
    /// All frames on a single line.
    Inline,
    /// One line per frame.
    Condensed,
    /// Multi-line block per frame.
    Verbose,
}

/// A render mode name that is not one of the four modes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown render mode `{0}` (expected external, inline, condensed or verbose)")]
pub struct UnknownRenderMode(pub String);

impl FromStr for RenderMode {
    type Err = UnknownRenderMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "external" | "default" => Ok(Self::External),
            "inline" => Ok(Self::Inline),
            "condensed" => Ok(Self::Condensed),
            "verbose" => Ok(Self::Verbose),
            _ => Err(UnknownRenderMode(s.to_owned())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::External => "external",
            Self::Inline => "inline",
            Self::Condensed => "condensed",
            Self::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

/// `"<internal text or frame text> (code:N)"`
pub(crate) fn internal_text(frame: &Frame, reg: &CodeRegistry) -> String {
    let text = match reg.lookup(frame.code()) {
        Some(meta) if !meta.internal.is_empty() => meta.internal,
        _ => frame.text(),
    };
    format!("{text} (code:{})", frame.code())
}

/// `"<external text or frame text> (code:N)"`
pub(crate) fn external_text(frame: &Frame, reg: &CodeRegistry) -> String {
    let text = match reg.lookup(frame.code()) {
        Some(meta) if !meta.external.is_empty() => meta.external,
        _ => frame.text(),
    };
    format!("{text} (code:{})", frame.code())
}

pub(crate) fn render_frames(frames: &[Frame], mode: RenderMode, reg: &CodeRegistry) -> String {
    let Some(top) = frames.last() else {
        return String::new();
    };
    if mode == RenderMode::External {
        return external_text(top, reg);
    }

    let mut out = String::new();
    for (k, frame) in frames.iter().enumerate().rev() {
        let loc = frame.location();
        let block = match mode {
            RenderMode::Verbose => format!(
                "#{k}: `{}`\n\terror:   {}\n\tline:    {}:{}\n\tdetail:  {}\n\tmessage: {}\n",
                loc.function(),
                frame.message(),
                loc.file_name(),
                loc.line(),
                internal_text(frame, reg),
                external_text(frame, reg),
            ),
            _ => format!(
                "#{k} - caller: \"{}:{}:{}\" error: \"{}\" detail: \"{}\"{}",
                loc.file_name(),
                loc.line(),
                loc.function(),
                frame.message(),
                internal_text(frame, reg),
                if mode == RenderMode::Inline { " " } else { "\n" },
            ),
        };
        out.push_str(&block);
    }
    out.trim_matches(|c: char| c == ' ' || c == '\n' || c == '\t')
        .to_owned()
}

impl ErrorStack {
    /// Render with the process-wide code registry.
    pub fn render(&self, mode: RenderMode) -> String {
        self.render_with(mode, registry::codes())
    }

    /// Render against a specific registry.
    pub fn render_with(&self, mode: RenderMode, reg: &CodeRegistry) -> String {
        render_frames(&self.frames(), mode, reg)
    }
}

impl fmt::Display for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if f.sign_plus() {
            RenderMode::Verbose
        } else if f.alternate() {
            RenderMode::Condensed
        } else if f.sign_minus() {
            RenderMode::Inline
        } else {
            RenderMode::External
        };
        f.write_str(&self.render(mode))
    }
}

impl fmt::Debug for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(RenderMode::Verbose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StaticCapture;
    use crate::code::Code;
    use crate::frame::MessageError;
    use crate::registry::CodeMeta;
    use crate::stack::{Annotator, Source};

    fn registry() -> CodeRegistry {
        let reg = CodeRegistry::with_builtins();
        reg.register(Code(1000), CodeMeta::new("Configuration not valid", "the configuration is invalid", 500));
        reg
    }

    fn at(file: &str, line: u32, function: &str) -> Annotator {
        Annotator::with_capture(StaticCapture::at(file, line, function))
    }

    fn config_chain() -> ErrorStack {
        let read = at("src/config/read.rs", 40, "app::config::read_config").wrap(
            Source::foreign(MessageError("read: end of input".into())),
            Code::UNKNOWN,
            "could not read configuration file",
        );
        let decoded = at("src/config/decode.rs", 35, "app::config::decode_config").wrap(
            read,
            Code::INVALID_JSON,
            "could not decode configuration data",
        );
        at("src/config/mod.rs", 30, "app::config::load_config").wrap(
            decoded,
            Code(1000),
            "service configuration could not be loaded",
        )
    }

    #[test]
    fn external_uses_top_code() {
        let reg = registry();
        assert_eq!(
            config_chain().render_with(RenderMode::External, &reg),
            "Configuration not valid (code:1000)"
        );
    }

    #[test]
    fn external_falls_back_to_frame_text() {
        let reg = registry();
        let err = at("src/a.rs", 1, "app::a").error(Code(424_242), "raw message");
        assert_eq!(err.render_with(RenderMode::External, &reg), "raw message (code:424242)");
        let err = at("src/a.rs", 1, "app::a").error(Code::UNKNOWN, "hidden");
        assert_eq!(err.render_with(RenderMode::External, &reg), "an unknown error occurred (code:1)");
    }

    #[test]
    fn condensed_one_line_per_frame() {
        let reg = registry();
        let out = config_chain().render_with(RenderMode::Condensed, &reg);
        let expected = [
            r#"#3 - caller: "mod.rs:30:app::config::load_config" error: "service configuration could not be loaded" detail: "the configuration is invalid (code:1000)""#,
            r#"#2 - caller: "decode.rs:35:app::config::decode_config" error: "could not decode configuration data" detail: "could not decode configuration data (code:108)""#,
            r#"#1 - caller: "read.rs:40:app::config::read_config" error: "could not read configuration file" detail: "could not read configuration file (code:1)""#,
            r#"#0 - caller: "read.rs:40:app::config::read_config" error: "read: end of input" detail: "ok (code:0)""#,
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn inline_is_single_line() {
        let reg = registry();
        let out = config_chain().render_with(RenderMode::Inline, &reg);
        assert!(!out.contains('\n'));
        assert!(out.starts_with("#3 - caller: \"mod.rs:30:app::config::load_config\""));
        assert!(out.ends_with("error: \"read: end of input\" detail: \"ok (code:0)\""));
        assert_eq!(out.matches(" - caller: ").count(), 4);
        assert!(out.contains("(code:1000)\" #2 - caller:"));
    }

    #[test]
    fn verbose_block_per_frame() {
        let reg = registry();
        let out = config_chain().render_with(RenderMode::Verbose, &reg);
        let top = "#3: `app::config::load_config`\n\
                   \terror:   service configuration could not be loaded\n\
                   \tline:    mod.rs:30\n\
                   \tdetail:  the configuration is invalid (code:1000)\n\
                   \tmessage: Configuration not valid (code:1000)\n";
        assert!(out.starts_with(top), "got:\n{out}");
        assert!(out.contains("\tmessage: an unknown error occurred (code:1)\n"));
        assert!(out.ends_with("\terror:   read: end of input\n\tline:    read.rs:40\n\tdetail:  ok (code:0)\n\tmessage: ok (code:0)"));
        assert_eq!(out.lines().count(), 4 * 5);
    }

    #[test]
    fn empty_stack_renders_nothing() {
        let err = ErrorStack::empty();
        for mode in [RenderMode::External, RenderMode::Inline, RenderMode::Condensed, RenderMode::Verbose] {
            assert_eq!(err.render(mode), "");
        }
    }

    #[test]
    fn rendering_is_repeatable() {
        let reg = registry();
        let err = config_chain();
        for mode in [RenderMode::External, RenderMode::Inline, RenderMode::Condensed, RenderMode::Verbose] {
            assert_eq!(err.render_with(mode, &reg), err.render_with(mode, &reg));
        }
    }

    #[test]
    fn formatter_flags_select_mode() {
        let err = at("src/a.rs", 3, "app::a").error(Code::FATAL, "kaput");
        assert_eq!(format!("{err}"), err.render(RenderMode::External));
        assert_eq!(format!("{err:-}"), err.render(RenderMode::Inline));
        assert_eq!(format!("{err:#}"), err.render(RenderMode::Condensed));
        assert_eq!(format!("{err:+}"), err.render(RenderMode::Verbose));
        assert_eq!(format!("{err:?}"), err.render(RenderMode::Verbose));
        assert_eq!(err.to_string(), "a fatal error occurred (code:2)");
    }

    #[test]
    fn parse_mode_names() {
        assert_eq!("Verbose".parse::<RenderMode>().unwrap(), RenderMode::Verbose);
        assert_eq!("default".parse::<RenderMode>().unwrap(), RenderMode::External);
        assert!("json".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::Condensed.to_string(), "condensed");
    }
}
