use crate::markup::scanner::{Tag, TagKind};

/// Default name of the tag that suspends markup interpretation.
pub const DEFAULT_ESCAPE_TAG: &str = "noparse";

/// Depth counter for `<noparse>` regions.
#[derive(Clone, Debug)]
pub struct EscapeTracker {
    name: String,
    depth: u32,
    first_open: Option<usize>,
}

impl EscapeTracker {
    /// Tracker for the escape tag `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            depth: 0,
            first_open: None,
        }
    }

    /// Whether `tag` is the (unprefixed) escape tag.
    pub fn is_escape_tag(&self, tag: &Tag) -> bool {
        tag.prefix.is_none() && tag.name == self.name && tag.parameter_text.trim().is_empty()
    }

    /// Apply an escape tag. The caller must check [`Self::is_escape_tag`] first.
    pub fn apply(&mut self, tag: &Tag) {
        match tag.kind {
            TagKind::Open => {
                if self.depth == 0 {
                    self.first_open = Some(tag.raw_start);
                }
                self.depth += 1;
            }
            TagKind::Close => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.first_open = None;
                }
            }
        }
    }

    /// Whether tag interpretation is currently suspended.
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Current nesting depth.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Raw index of the outermost still-open escape tag.
    pub fn unterminated_at(&self) -> Option<usize> {
        self.first_open
    }

    /// Back to depth zero.
    pub fn reset(&mut self) {
        self.depth = 0;
        self.first_open = None;
    }
}

impl Default for EscapeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ESCAPE_TAG)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markup/escape.rs"]
mod tests;
