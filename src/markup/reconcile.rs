//! Raw-to-display coordinate reconciliation.
//!
//! Tags are scanned in the author's raw text, but every resolved span has to index into the text
//! the host actually lays out. The host strips its own markup independently, so the pipeline
//! walks both strings once and keeps two running offsets:
//!
//! - `host_offset`: raw index to host display index, used to check whether the host kept a tag.
//! - `out_offset`: raw index to output index, used for span coordinates.
//!
//! Tags resolved here (and escape tags) are removed from the output whether or not the host kept
//! them. Tags nobody resolves stay as literal text if the host kept them; otherwise the host
//! consumed them and both offsets shrink by the tag length.

use std::collections::BTreeMap;

use crate::markup::escape::EscapeTracker;
use crate::markup::processor::{ResolvedSpan, SpanFamily, TagProcessor};
use crate::markup::scanner::{Tag, TagKind, next_tag};
use crate::settings::PipelineSettings;

/// Author-facing warning produced while compiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A `<noparse>` region was still open at document end.
    UnterminatedEscape,
}

/// A recoverable authoring problem.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Raw character index the problem points at.
    pub raw_index: usize,
    /// Human-readable description.
    pub message: String,
}

/// Output of one pipeline run.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompiledText {
    /// Display text with every tag this system consumed removed.
    pub text: String,
    /// Number of characters in `text`.
    pub char_count: usize,
    /// Resolved spans per family, in opening order.
    pub spans: BTreeMap<SpanFamily, Vec<ResolvedSpan>>,
    /// Recoverable authoring problems.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledText {
    /// Spans of one family.
    pub fn spans(&self, family: SpanFamily) -> &[ResolvedSpan] {
        self.spans.get(&family).map_or(&[], Vec::as_slice)
    }

    /// Total number of resolved spans across families.
    pub fn span_count(&self) -> usize {
        self.spans.values().map(Vec::len).sum()
    }
}

/// Scanner + processors + escape tracker + reconciler.
#[derive(Debug)]
pub struct MarkupPipeline {
    processors: Vec<Box<dyn TagProcessor>>,
    escape: EscapeTracker,
    placeholder: char,
}

impl MarkupPipeline {
    /// Pipeline without processors; every tag except the escape tag stays literal.
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            processors: Vec::new(),
            escape: EscapeTracker::new(&settings.escape_tag),
            placeholder: settings.placeholder,
        }
    }

    /// Install a processor, replacing any existing one for the same family.
    pub fn add_processor(&mut self, processor: impl TagProcessor + 'static) -> &mut Self {
        let family = processor.family();
        self.processors.retain(|p| p.family() != family);
        self.processors.push(Box::new(processor));
        self
    }

    /// Builder form of [`Self::add_processor`].
    pub fn with_processor(mut self, processor: impl TagProcessor + 'static) -> Self {
        self.add_processor(processor);
        self
    }

    /// Families that currently have a processor.
    pub fn families(&self) -> Vec<SpanFamily> {
        self.processors.iter().map(|p| p.family()).collect()
    }

    /// Compile when the host applies no markup of its own.
    pub fn compile_raw(&mut self, raw: &str) -> CompiledText {
        self.compile(raw, raw)
    }

    /// Resolve every tag in `raw` into display coordinates of `display`.
    ///
    /// State from any earlier run is discarded first.
    #[tracing::instrument(skip_all, fields(raw_len = raw.len(), display_len = display_text.len()))]
    pub fn compile(&mut self, raw: &str, display_text: &str) -> CompiledText {
        for p in &mut self.processors {
            p.reset();
        }
        self.escape.reset();

        let raw: Vec<char> = raw.chars().collect();
        let display: Vec<char> = display_text.chars().collect();

        let mut out = String::with_capacity(display.len());
        let mut out_len = 0usize;
        let mut cursor = 0usize;
        let mut host_offset = 0isize;
        let mut out_offset = 0isize;
        let mut tail = false;
        let mut from = 0usize;

        while let Some(tag) = next_tag(&raw, from) {
            from = tag.raw_end;
            let len = tag.char_len() as isize;

            let host_pos = (tag.raw_start as isize + host_offset).max(0) as usize;
            if !tail && host_pos >= display.len() {
                // The host kept nothing past this point; later tags all land at the end.
                tail = true;
                copy_chars(&display, cursor, display.len(), &mut out, &mut out_len);
                cursor = display.len();
            }

            let present = if tail {
                false
            } else {
                if host_pos > cursor {
                    copy_chars(&display, cursor, host_pos, &mut out, &mut out_len);
                    cursor = host_pos;
                }
                host_pos == cursor
                    && display[host_pos..].starts_with(&raw[tag.raw_start..tag.raw_end])
            };

            let display_index = if tail {
                out_len
            } else {
                (tag.raw_start as isize + out_offset).max(0) as usize
            };

            let consumed = if self.escape.is_escape_tag(&tag) {
                self.escape.apply(&tag);
                true
            } else if self.escape.is_active() {
                false
            } else {
                self.resolve(&tag, display_index)
            };

            if consumed {
                out_offset -= len;
                if present {
                    cursor += tag.char_len();
                } else if !tail {
                    host_offset -= len;
                }
            } else if present {
                let end = cursor + tag.char_len();
                copy_chars(&display, cursor, end, &mut out, &mut out_len);
                cursor = end;
            } else if !tail {
                host_offset -= len;
                out_offset -= len;
            }
        }

        copy_chars(&display, cursor, display.len(), &mut out, &mut out_len);

        let mut diagnostics = Vec::new();
        if let Some(raw_index) = self.escape.unterminated_at() {
            let depth = self.escape.depth();
            tracing::warn!(
                raw_index,
                depth,
                "escape region is never closed; treating it as closed at document end"
            );
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::UnterminatedEscape,
                raw_index,
                message: format!("escape region is never closed ({depth} still open)"),
            });
        }

        let mut spans = BTreeMap::new();
        for p in &mut self.processors {
            spans.insert(p.family(), p.finish(out_len));
        }

        if out_len == 0 {
            out.push(self.placeholder);
            out_len = 1;
        }

        CompiledText {
            text: out,
            char_count: out_len,
            spans,
            diagnostics,
        }
    }

    fn resolve(&mut self, tag: &Tag, display_index: usize) -> bool {
        let Some(family) = SpanFamily::from_prefix(tag.prefix) else {
            return false;
        };
        let Some(processor) = self.processors.iter_mut().find(|p| p.family() == family) else {
            return false;
        };
        let ok = match tag.kind {
            TagKind::Open => processor.try_resolve_open(tag, display_index),
            TagKind::Close => processor.try_resolve_close(tag, display_index),
        };
        if !ok {
            tracing::debug!(
                name = %tag.name,
                raw_start = tag.raw_start,
                "tag rejected; kept as literal text"
            );
        }
        ok
    }
}

fn copy_chars(src: &[char], from: usize, to: usize, out: &mut String, out_len: &mut usize) {
    if from >= to {
        return;
    }
    out.extend(&src[from..to]);
    *out_len += to - from;
}

#[cfg(test)]
#[path = "../../tests/unit/markup/reconcile.rs"]
mod tests;
