//! Trigger/reset bookkeeping for event and command spans.

use crate::markup::processor::{ResolvedSpan, SpanFamily};
use crate::markup::reconcile::CompiledText;

/// Receives the side effects of triggered tags.
pub trait TagInvoker {
    /// Called exactly once per successful trigger.
    fn invoke(&mut self, family: SpanFamily, span: &ResolvedSpan);
}

impl<F> TagInvoker for F
where
    F: FnMut(SpanFamily, &ResolvedSpan),
{
    fn invoke(&mut self, family: SpanFamily, span: &ResolvedSpan) {
        self(family, span)
    }
}

/// A resolved event/command with trigger state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InvocableTag {
    span: ResolvedSpan,
    family: SpanFamily,
    triggered: bool,
}

impl InvocableTag {
    /// Wrap `span`. Timing flags come from the span's resolved policy.
    pub fn new(family: SpanFamily, span: ResolvedSpan) -> Self {
        Self {
            span,
            family,
            triggered: false,
        }
    }

    /// Underlying span.
    pub fn span(&self) -> &ResolvedSpan {
        &self.span
    }

    /// Event or command.
    pub fn family(&self) -> SpanFamily {
        self.family
    }

    /// Display index the tag is attached to.
    pub fn index(&self) -> usize {
        self.span.start_index
    }

    /// Whether the side effect already ran.
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Fire as soon as processing starts.
    pub fn execute_instantly(&self) -> bool {
        self.span.policy.execute_instantly
    }

    /// Fire even when the writer skips past.
    pub fn execute_on_skip(&self) -> bool {
        self.span.policy.execute_on_skip
    }

    /// May fire again after [`Self::reset`].
    pub fn repeatable(&self) -> bool {
        self.span.policy.repeatable
    }

    /// Run the side effect unless already triggered. Returns whether it ran.
    pub fn trigger(&mut self, invoker: &mut dyn TagInvoker) -> bool {
        if self.triggered {
            return false;
        }
        self.triggered = true;
        invoker.invoke(self.family, &self.span);
        true
    }

    /// Clear the triggered flag, only for repeatable tags.
    pub fn reset(&mut self) {
        if self.repeatable() {
            self.triggered = false;
        }
    }
}

/// All invocables of one compiled document, ordered by index.
#[derive(Clone, Debug, Default)]
pub struct TagCache {
    tags: Vec<InvocableTag>,
}

impl TagCache {
    /// Wrap every event and command span of `doc` once.
    pub fn from_document(doc: &CompiledText) -> Self {
        let mut tags: Vec<InvocableTag> = SpanFamily::ALL
            .into_iter()
            .filter(|f| f.is_invocable())
            .flat_map(|f| {
                doc.spans(f)
                    .iter()
                    .cloned()
                    .map(move |s| InvocableTag::new(f, s))
            })
            .collect();
        // Stable: same-index tags keep family order, then opening order.
        tags.sort_by_key(|t| (t.span.start_index, t.span.order_at_index));
        Self { tags }
    }

    /// Number of invocables.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Return `true` when the document has no events or commands.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// All invocables in trigger order.
    pub fn tags(&self) -> &[InvocableTag] {
        &self.tags
    }

    /// Invocable by position.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn tag(&self, id: usize) -> &InvocableTag {
        &self.tags[id]
    }

    /// Trigger one invocable by position.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn trigger(&mut self, id: usize, invoker: &mut dyn TagInvoker) -> bool {
        self.tags[id].trigger(invoker)
    }

    /// Fire every `execute_instantly` tag. Returns how many ran.
    pub fn trigger_instant(&mut self, invoker: &mut dyn TagInvoker) -> usize {
        self.tags
            .iter_mut()
            .filter(|t| t.execute_instantly())
            .map(|t| usize::from(t.trigger(invoker)))
            .sum()
    }

    /// Fire tags whose index lies in `[from, to)`.
    ///
    /// When `skipped` is set the writer jumped over the range, so only `execute_on_skip` tags run.
    pub fn process_range(
        &mut self,
        from: usize,
        to: usize,
        skipped: bool,
        invoker: &mut dyn TagInvoker,
    ) -> usize {
        let lo = self.tags.partition_point(|t| t.index() < from);
        let hi = self.tags.partition_point(|t| t.index() < to);
        self.tags[lo..hi.max(lo)]
            .iter_mut()
            .filter(|t| !skipped || t.execute_on_skip())
            .map(|t| usize::from(t.trigger(invoker)))
            .sum()
    }

    /// The writer moved back to `index`: reset every tag at or after it.
    pub fn rewind_to(&mut self, index: usize) {
        let lo = self.tags.partition_point(|t| t.index() < index);
        for t in &mut self.tags[lo..] {
            t.reset();
        }
    }

    /// Reset every tag (repeatable ones only, per [`InvocableTag::reset`]).
    pub fn reset_all(&mut self) {
        self.rewind_to(0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/invoke/invoke.rs"]
mod tests;
