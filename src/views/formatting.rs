//! Whole-document formatting through `heph fmt`

use crate::context::Context;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Zero-based line and UTF-16 column, the way editors count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextPosition {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRange {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl TextRange {
    /// Range covering all of `text`
    pub fn whole(text: &str) -> Self {
        let mut lines = 0u32;
        let mut last_line = text;
        for (idx, _) in text.match_indices('\n') {
            lines += 1;
            last_line = &text[idx + 1..];
        }
        let character = last_line.encode_utf16().count() as u32;

        Self {
            start: TextPosition {
                line: 0,
                character: 0,
            },
            end: TextPosition {
                line: lines,
                character,
            },
        }
    }
}

/// Replace `range` with `new_text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub range: TextRange,
    pub new_text: String,
}

pub struct DocumentFormatter {
    ctx: Arc<Context>,
}

impl DocumentFormatter {
    pub fn new(ctx: &Arc<Context>) -> Self {
        Self {
            ctx: Arc::clone(ctx),
        }
    }

    /// One edit replacing the whole document, or `None` if formatting failed
    pub async fn format(&self, file: &Path, text: &str) -> Option<TextEdit> {
        self.format_until(file, text, CancellationToken::new()).await
    }

    /// Like [`format`](Self::format), interrupting the formatter once `cancel` fires
    pub async fn format_until(
        &self,
        file: &Path,
        text: &str,
        cancel: CancellationToken,
    ) -> Option<TextEdit> {
        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        debug!("fmt {}", file.display());

        let tool = self.ctx.tool();
        match self.ctx.inflight().watch(tool.format(dir, text, cancel)).await {
            Ok(formatted) => Some(TextEdit {
                range: TextRange::whole(text),
                new_text: formatted,
            }),
            Err(err) => {
                error!("fmt {} failed: {}", file.display(), err);
                self.ctx.notifier().error(&format!("fmt failed: {err}"));
                None
            }
        }
    }
}
