use crate::animation::effects::{EffectKind, EffectLibrary, EffectState};
use crate::foundation::core::{CharDelta, CharInfo};
use crate::invoke::{TagCache, TagInvoker};
use crate::markup::processor::SpanFamily;
use crate::markup::reconcile::{CompiledText, MarkupPipeline};
use crate::settings::{AnimatorSettings, Settings};
use crate::timeline::{CharacterTimeline, VisibilityState};

/// A bounce span crossed a crest (`direction = 1`) or landed (`direction = -1`) during a tick.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExtremaHit {
    /// Display index of the character.
    pub char_index: usize,
    /// Tag name of the span that produced the hit.
    pub span_name: String,
    /// Net extremum crossed.
    pub direction: i8,
}

#[derive(Clone, Debug)]
struct ActiveEffect {
    family: SpanFamily,
    name: String,
    start: usize,
    end: usize,
    state: EffectState,
}

/// Per-tick driver: owns a compiled document, its timeline and invocables, and turns them
/// into one batch of [`CharDelta`]s per tick.
///
/// All timestamps are in animator time, which advances by the wall-clock delta between ticks
/// multiplied by [`AnimatorSettings::time_scale`].
#[derive(Debug)]
pub struct TextAnimator {
    settings: AnimatorSettings,
    library: EffectLibrary,
    pipeline: MarkupPipeline,
    document: CompiledText,
    timeline: CharacterTimeline,
    cache: TagCache,
    effects: Vec<ActiveEffect>,
    deltas: Vec<CharDelta>,
    settled: Vec<bool>,
    hits: Vec<ExtremaHit>,
    clock: f64,
    last_now: Option<f64>,
    revealed: usize,
}

impl TextAnimator {
    /// Animator over the built-in effect library.
    pub fn new(settings: &Settings) -> Self {
        Self::with_library(settings, EffectLibrary::builtin())
    }

    /// Animator over a custom effect library.
    pub fn with_library(settings: &Settings, library: EffectLibrary) -> Self {
        let pipeline = library.pipeline(&settings.pipeline);
        Self {
            settings: settings.animator.clone(),
            library,
            pipeline,
            document: CompiledText::default(),
            timeline: CharacterTimeline::default(),
            cache: TagCache::default(),
            effects: Vec::new(),
            deltas: Vec::new(),
            settled: Vec::new(),
            hits: Vec::new(),
            clock: 0.0,
            last_now: None,
            revealed: 0,
        }
    }

    /// Compile new text and discard every timeline entry, invocable and effect of the old one.
    ///
    /// All characters start `Hidden`. Effects whose parameters cannot be turned into state
    /// (zero frequency, unknown ease) are dropped with a warning; their text is unaffected.
    #[tracing::instrument(skip_all, fields(raw_len = raw.len()))]
    pub fn set_text(&mut self, raw: &str, display: &str) -> &CompiledText {
        self.document = self.pipeline.compile(raw, display);
        let n = self.document.char_count;

        self.effects.clear();
        for family in [
            SpanFamily::Behavior,
            SpanFamily::Appearance,
            SpanFamily::Disappearance,
        ] {
            for span in self.document.spans(family) {
                let Some(kind) = self.library.kind(family, &span.name) else {
                    continue;
                };
                match EffectState::build(kind, family, span, &self.settings) {
                    Ok(state) => self.effects.push(ActiveEffect {
                        family,
                        name: span.name.clone(),
                        start: span.start_index,
                        end: span.end_index.min(n),
                        state,
                    }),
                    Err(err) => tracing::warn!(
                        name = %span.name,
                        start = span.start_index,
                        %err,
                        "effect dropped"
                    ),
                }
            }
        }

        self.timeline.reset(n, VisibilityState::Hidden, self.clock);
        self.cache = TagCache::from_document(&self.document);
        self.revealed = 0;
        self.hits.clear();
        tracing::debug!(
            chars = n,
            effects = self.effects.len(),
            invocables = self.cache.len(),
            "text compiled"
        );
        &self.document
    }

    /// Current compiled document.
    pub fn document(&self) -> &CompiledText {
        &self.document
    }

    /// Per-character visibility record.
    pub fn timeline(&self) -> &CharacterTimeline {
        &self.timeline
    }

    /// Events and commands of the current document.
    pub fn cache(&self) -> &TagCache {
        &self.cache
    }

    /// Animator settings in effect.
    pub fn settings(&self) -> &AnimatorSettings {
        &self.settings
    }

    /// Animator time in seconds.
    pub fn time(&self) -> f64 {
        self.clock
    }

    /// Number of characters handed to [`Self::reveal_to`] or [`Self::skip_to`] so far.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Deltas computed by the last tick.
    pub fn deltas(&self) -> &[CharDelta] {
        &self.deltas
    }

    /// Extrema crossed during the last tick.
    pub fn extrema_hits(&self) -> &[ExtremaHit] {
        &self.hits
    }

    /// Fire every `execute_instantly` invocable. Returns how many ran.
    pub fn start(&mut self, invoker: &mut dyn TagInvoker) -> usize {
        self.cache.trigger_instant(invoker)
    }

    /// Show characters up to (excluding) `count` and fire the invocables attached to them.
    ///
    /// Reaching the last character also fires tags placed after it.
    pub fn reveal_to(&mut self, count: usize, invoker: &mut dyn TagInvoker) -> usize {
        let count = count.min(self.document.char_count);
        if count <= self.revealed {
            return 0;
        }
        for i in self.revealed..count {
            self.show(i);
        }
        let fired = self
            .cache
            .process_range(self.revealed, self.tag_bound(count), false, invoker);
        self.revealed = count;
        fired
    }

    /// Jump to `count`: characters appear at once and only `execute_on_skip` invocables fire.
    pub fn skip_to(&mut self, count: usize, invoker: &mut dyn TagInvoker) -> usize {
        let count = count.min(self.document.char_count);
        if count <= self.revealed {
            return 0;
        }
        for i in self.revealed..count {
            self.timeline.set_visibility_state(i, VisibilityState::Shown, self.clock);
        }
        let fired = self
            .cache
            .process_range(self.revealed, self.tag_bound(count), true, invoker);
        self.revealed = count;
        fired
    }

    /// Move the reveal point back to `count`, hiding everything after it and re-arming
    /// repeatable invocables there.
    pub fn rewind_to(&mut self, count: usize) {
        let count = count.min(self.revealed);
        for i in count..self.document.char_count {
            self.timeline.set_visibility_state(i, VisibilityState::Hidden, self.clock);
        }
        self.cache.rewind_to(count);
        self.revealed = count;
    }

    /// Show every character immediately without firing invocables.
    pub fn show_all(&mut self) {
        for i in 0..self.document.char_count {
            self.timeline.set_visibility_state(i, VisibilityState::Shown, self.clock);
        }
        self.revealed = self.document.char_count;
    }

    /// Start showing `index`, through its appearance effects if it has any.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn show(&mut self, index: usize) {
        let current = self.state_of(index);
        if matches!(current, VisibilityState::Shown | VisibilityState::ShowAnimation) {
            return;
        }
        let next = if self.covered(SpanFamily::Appearance, index) {
            VisibilityState::ShowAnimation
        } else {
            VisibilityState::Shown
        };
        self.timeline.set_visibility_state(index, next, self.clock);
    }

    /// Start hiding `index`, through its disappearance effects if it has any.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn hide(&mut self, index: usize) {
        let current = self.state_of(index);
        if matches!(current, VisibilityState::Hidden | VisibilityState::HideAnimation) {
            return;
        }
        let next = if self.covered(SpanFamily::Disappearance, index) {
            VisibilityState::HideAnimation
        } else {
            VisibilityState::Hidden
        };
        self.timeline.set_visibility_state(index, next, self.clock);
    }

    /// Advance to wall-clock `now` and compute every character's delta.
    ///
    /// `chars` is indexed by display index; characters the host has no info for are treated as
    /// visible unit-sized glyphs. Finished show/hide animations are promoted to `Shown`/`Hidden`.
    pub fn tick(&mut self, now: f64, chars: &[CharInfo]) -> &[CharDelta] {
        let dt = self.last_now.map_or(0.0, |prev| (now - prev).max(0.0)) * self.settings.time_scale;
        self.last_now = Some(now);
        self.clock += dt;
        let t = self.clock;
        let n = self.document.char_count;

        self.hits.clear();
        self.deltas.clear();
        self.deltas.resize(n, CharDelta::IDENTITY);
        self.settled.clear();
        self.settled.resize(n, true);

        let info = |i: usize| chars.get(i).copied().unwrap_or_else(|| CharInfo::at(i));

        for eff in &self.effects {
            for i in eff.start..eff.end {
                let Some(entry) = self.timeline.get(i) else {
                    break;
                };
                let state = entry.visibility_state();
                let ch = info(i);
                match eff.family {
                    SpanFamily::Behavior => {
                        if !state.is_visible() || !ch.visible {
                            continue;
                        }
                        self.deltas[i].combine(eff.state.behavior_delta(t, &ch));
                        if eff.state.kind() == EffectKind::Bounce
                            && let Some((wave, spacing)) = eff.state.wave()
                        {
                            let direction = wave.passed_extrema(t, dt, ch.index as f64 * spacing);
                            if direction != 0 {
                                self.hits.push(ExtremaHit {
                                    char_index: i,
                                    span_name: eff.name.clone(),
                                    direction,
                                });
                            }
                        }
                    }
                    SpanFamily::Appearance | SpanFamily::Disappearance => {
                        let active = match eff.family {
                            SpanFamily::Appearance => VisibilityState::ShowAnimation,
                            _ => VisibilityState::HideAnimation,
                        };
                        if state != active {
                            continue;
                        }
                        let duration = eff.state.duration().unwrap_or(f64::EPSILON);
                        let progress = (entry.time_in_state(t) / duration).min(1.0);
                        if progress < 1.0 {
                            self.settled[i] = false;
                        }
                        let visibility = if active == VisibilityState::ShowAnimation {
                            progress
                        } else {
                            1.0 - progress
                        };
                        self.deltas[i].combine(eff.state.transition_delta(visibility, &ch));
                    }
                    SpanFamily::Event | SpanFamily::Command => {}
                }
            }
        }

        for i in 0..n {
            let state = self.state_of(i);
            let next = match state {
                VisibilityState::ShowAnimation if self.settled[i] => VisibilityState::Shown,
                VisibilityState::HideAnimation if self.settled[i] => VisibilityState::Hidden,
                _ => state,
            };
            if next != state {
                self.timeline.set_visibility_state(i, next, t);
            }
            if next == VisibilityState::Hidden {
                self.deltas[i] = CharDelta {
                    alpha: 0.0,
                    ..CharDelta::IDENTITY
                };
            }
        }

        &self.deltas
    }

    /// Tags sit at `char_count` when they follow the last character; reaching the end reaches them.
    fn tag_bound(&self, count: usize) -> usize {
        if count >= self.document.char_count {
            usize::MAX
        } else {
            count
        }
    }

    fn state_of(&self, index: usize) -> VisibilityState {
        self.timeline.entries()[index].visibility_state()
    }

    fn covered(&self, family: SpanFamily, index: usize) -> bool {
        self.effects
            .iter()
            .any(|e| e.family == family && e.start <= index && index < e.end)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/animator.rs"]
mod tests;
