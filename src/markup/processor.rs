use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::markup::params::{TagParams, parse_params};
use crate::markup::registry::{EffectRegistry, InvokePolicy, TagArity};
use crate::markup::scanner::{Tag, TagKind};

/// Which processor family a span belongs to, selected by tag prefix.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SpanFamily {
    /// Unprefixed: continuous behaviour animations (`<wave>`).
    Behavior,
    /// `+`: played while a character is being shown (`<+fade>`).
    Appearance,
    /// `-`: played while a character is being hidden (`<-fade>`).
    Disappearance,
    /// `?`: author events delivered to the host (`<?ping>`).
    Event,
    /// `@`: commands for the writer (`<@wait=0.5>`).
    Command,
}

impl SpanFamily {
    /// All families, in processing order.
    pub const ALL: [SpanFamily; 5] = [
        Self::Behavior,
        Self::Appearance,
        Self::Disappearance,
        Self::Event,
        Self::Command,
    ];

    /// Tag prefix selecting this family.
    pub fn prefix(self) -> Option<char> {
        match self {
            Self::Behavior => None,
            Self::Appearance => Some('+'),
            Self::Disappearance => Some('-'),
            Self::Event => Some('?'),
            Self::Command => Some('@'),
        }
    }

    /// Family selected by `prefix`.
    pub fn from_prefix(prefix: Option<char>) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.prefix() == prefix)
    }

    /// Whether spans of this family become invocables.
    pub fn is_invocable(self) -> bool {
        matches!(self, Self::Event | Self::Command)
    }
}

/// A tag's effective character range in display coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedSpan {
    /// Tag name without prefix.
    pub name: String,
    /// First covered display index.
    pub start_index: usize,
    /// One past the last covered display index.
    pub end_index: usize,
    /// How many spans of the same processor opened earlier at `start_index`.
    pub order_at_index: usize,
    /// Parsed parameters.
    pub parameters: TagParams,
    /// Span arity declared by the effect.
    pub arity: TagArity,
    /// Invocation policy with per-instance overrides applied.
    pub policy: InvokePolicy,
}

impl ResolvedSpan {
    /// Return `true` when `index` lies in `[start_index, end_index)`.
    pub fn contains(&self, index: usize) -> bool {
        self.start_index <= index && index < self.end_index
    }

    /// Number of covered characters.
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    /// Return `true` when the span covers nothing (e.g. a block closed where it opened).
    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }
}

/// A pluggable handler for one tag prefix.
///
/// Rejected tags are not consumed: the caller keeps their bracket text as literal content.
pub trait TagProcessor: std::fmt::Debug {
    /// Family (and therefore prefix) handled by this processor.
    fn family(&self) -> SpanFamily;

    /// Try to open a span at `display_index`.
    fn try_resolve_open(&mut self, tag: &Tag, display_index: usize) -> bool;

    /// Try to close the innermost open span named like `tag` at `display_index`.
    fn try_resolve_close(&mut self, tag: &Tag, display_index: usize) -> bool;

    /// Auto-close every open span at `document_end` and hand out the resolved spans.
    fn finish(&mut self, document_end: usize) -> Vec<ResolvedSpan>;

    /// Drop all state from a previous document.
    fn reset(&mut self);
}

#[derive(Debug)]
struct PendingSpan {
    name: String,
    start_index: usize,
    end_index: Option<usize>,
    order_at_index: usize,
    parameters: TagParams,
    arity: TagArity,
    policy: InvokePolicy,
}

/// Registry-backed processor with name-scoped open-span stacks.
#[derive(Debug)]
pub struct SpanProcessor {
    family: SpanFamily,
    registry: Arc<dyn EffectRegistry>,
    spans: Vec<PendingSpan>,
    open: HashMap<String, SmallVec<[usize; 4]>>,
    last_start: Option<usize>,
    order_at_last_start: usize,
}

impl SpanProcessor {
    /// Processor for `family` resolving names through `registry`.
    pub fn new(family: SpanFamily, registry: Arc<dyn EffectRegistry>) -> Self {
        Self {
            family,
            registry,
            spans: Vec::new(),
            open: HashMap::new(),
            last_start: None,
            order_at_last_start: 0,
        }
    }

    /// Number of spans currently open.
    pub fn open_count(&self) -> usize {
        self.open.values().map(|s| s.len()).sum()
    }

    fn next_order(&mut self, start: usize) -> usize {
        if self.last_start == Some(start) {
            self.order_at_last_start += 1;
        } else {
            self.last_start = Some(start);
            self.order_at_last_start = 0;
        }
        self.order_at_last_start
    }
}

impl TagProcessor for SpanProcessor {
    fn family(&self) -> SpanFamily {
        self.family
    }

    fn try_resolve_open(&mut self, tag: &Tag, display_index: usize) -> bool {
        if tag.kind != TagKind::Open || tag.prefix != self.family.prefix() {
            return false;
        }
        let Some(effect) = self.registry.get_effect(&tag.name) else {
            return false;
        };
        let Ok(parameters) = parse_params(&tag.parameter_text) else {
            return false;
        };
        if !effect.validate_parameters(&parameters) {
            return false;
        }

        let arity = effect.arity();
        let policy = effect.invoke_policy().with_overrides(&parameters);
        let order_at_index = self.next_order(display_index);
        let end_index = match arity {
            TagArity::Index => Some(display_index + 1),
            TagArity::Block => None,
        };

        let idx = self.spans.len();
        self.spans.push(PendingSpan {
            name: tag.name.clone(),
            start_index: display_index,
            end_index,
            order_at_index,
            parameters,
            arity,
            policy,
        });
        self.open.entry(tag.name.clone()).or_default().push(idx);
        true
    }

    fn try_resolve_close(&mut self, tag: &Tag, display_index: usize) -> bool {
        if tag.kind != TagKind::Close || tag.prefix != self.family.prefix() {
            return false;
        }
        let Some(stack) = self.open.get_mut(&tag.name) else {
            return false;
        };
        let Some(idx) = stack.pop() else {
            return false;
        };
        if stack.is_empty() {
            self.open.remove(&tag.name);
        }

        let span = &mut self.spans[idx];
        if span.arity == TagArity::Block {
            span.end_index = Some(display_index.max(span.start_index));
        }
        true
    }

    fn finish(&mut self, document_end: usize) -> Vec<ResolvedSpan> {
        self.open.clear();
        self.last_start = None;
        self.order_at_last_start = 0;
        self.spans
            .drain(..)
            .map(|p| ResolvedSpan {
                end_index: p.end_index.unwrap_or(document_end.max(p.start_index)),
                name: p.name,
                start_index: p.start_index,
                order_at_index: p.order_at_index,
                parameters: p.parameters,
                arity: p.arity,
                policy: p.policy,
            })
            .collect()
    }

    fn reset(&mut self) {
        self.spans.clear();
        self.open.clear();
        self.last_start = None;
        self.order_at_last_start = 0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markup/processor.rs"]
mod tests;
