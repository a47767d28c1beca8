//! Serializable snapshot of a stack, for collaborators that report errors
//! as structured data. The stack itself picks no wire format.

use serde::Serialize;

use crate::code::Code;
use crate::registry::{self, CodeRegistry};
use crate::render::{external_text, internal_text};
use crate::stack::ErrorStack;

/// One frame of a [`StackReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    /// Storage index; 0 is the root cause.
    pub index: usize,
    /// `file:line:function` of the frame.
    pub caller: String,
    /// The frame's own message.
    pub error: String,
    /// Internal text with the code suffix.
    pub detail: String,
    /// External text with the code suffix.
    pub message: String,
    pub code: Code,
}

/// A point-in-time view of an [`ErrorStack`], frames top → root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackReport {
    /// Code of the top frame.
    pub code: Code,
    /// User-safe message, as rendered by `{}`.
    pub message: String,
    /// Internal text for logs, as returned by [`ErrorStack::detail`].
    pub detail: String,
    pub http_status: u16,
    /// Every frame, top first.
    pub frames: Vec<FrameReport>,
}

impl ErrorStack {
    /// Snapshot against the process-wide registry.
    pub fn report(&self) -> StackReport {
        self.report_with(registry::codes())
    }

    /// Snapshot against a specific registry.
    pub fn report_with(&self, reg: &CodeRegistry) -> StackReport {
        let frames = self.frames();
        let Some(top) = frames.last() else {
            return StackReport {
                code: Code::SUCCESS,
                message: String::new(),
                detail: String::new(),
                http_status: registry::DEFAULT_HTTP_STATUS,
                frames: Vec::new(),
            };
        };

        let detail = match reg.lookup(top.code()) {
            Some(meta) if !meta.internal.is_empty() => meta.internal,
            _ => top.text(),
        };

        StackReport {
            code: top.code(),
            message: external_text(top, reg),
            detail,
            http_status: reg.status(top.code()),
            frames: frames
                .iter()
                .enumerate()
                .rev()
                .map(|(index, frame)| {
                    let loc = frame.location();
                    FrameReport {
                        index,
                        caller: format!("{}:{}:{}", loc.file_name(), loc.line(), loc.function()),
                        error: frame.message().to_owned(),
                        detail: internal_text(frame, reg),
                        message: external_text(frame, reg),
                        code: frame.code(),
                    }
                })
                .collect(),
        }
    }
}
