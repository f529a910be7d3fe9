//! Built-in effects and the name → effect table that wires them into a markup pipeline.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::sync::Arc;

use kurbo::Vec2;

use crate::animation::ease::Ease;
use crate::animation::wave::{Wave, WaveCurve, WaveParams};
use crate::foundation::core::{CharDelta, CharInfo};
use crate::foundation::error::{TagweaveError, TagweaveResult};
use crate::foundation::math::{noise_signed, span_seed};
use crate::markup::params::TagParams;
use crate::markup::processor::{ResolvedSpan, SpanFamily, SpanProcessor};
use crate::markup::reconcile::MarkupPipeline;
use crate::markup::registry::{
    EffectDef, InvokePolicy, OpenRegistry, ParamSchema, ParamSpec, ParamType, Registry,
    Strictness,
};
use crate::settings::{AnimatorSettings, PipelineSettings};

const AMPLITUDE: &[&str] = &["a", "amp", "amplitude"];
const FREQUENCY: &[&str] = &["f", "freq", "frequency"];
const WAVE_SIZE: &[&str] = &["w", "wavesize"];
const DURATION: &[&str] = &["d", "duration"];

/// A built-in animation effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Vertical sine oscillation travelling along the text.
    Wave,
    /// Hop up and land, pausing on the ground.
    Bounce,
    /// Per-character positional jitter.
    Shake,
    /// Rotation back and forth.
    Swing,
    /// Periodic swelling of the glyph scale.
    Pulse,
    /// Opacity transition.
    Fade,
    /// Scale transition from zero.
    Size,
    /// Slide in from (or out to) a vertical offset.
    Offset,
}

impl EffectKind {
    /// Continuous effects, applied while a character is visible.
    pub const BEHAVIORS: [Self; 5] = [Self::Wave, Self::Bounce, Self::Shake, Self::Swing, Self::Pulse];

    /// Effects driven by show/hide progress.
    pub const TRANSITIONS: [Self; 3] = [Self::Fade, Self::Size, Self::Offset];

    /// Canonical tag name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Wave => "wave",
            Self::Bounce => "bounce",
            Self::Shake => "shake",
            Self::Swing => "swing",
            Self::Pulse => "pulse",
            Self::Fade => "fade",
            Self::Size => "size",
            Self::Offset => "offset",
        }
    }

    /// Whether this effect runs continuously rather than over a show/hide transition.
    pub fn is_behavior(self) -> bool {
        Self::BEHAVIORS.contains(&self)
    }

    /// Parameters accepted by tags of this kind.
    pub fn schema(self) -> ParamSchema {
        let float = |key: &str, aliases: &[&str]| ParamSpec::new(key, ParamType::Float).alias(aliases);
        let base = ParamSchema::none().with_default(ParamType::Float);
        match self {
            Self::Wave | Self::Bounce | Self::Swing | Self::Pulse => base
                .param(float("a", &AMPLITUDE[1..]))
                .param(float("f", &FREQUENCY[1..]))
                .param(float("w", &WAVE_SIZE[1..])),
            Self::Shake => base
                .param(float("a", &AMPLITUDE[1..]))
                .param(float("f", &FREQUENCY[1..])),
            Self::Fade | Self::Size => base
                .param(float("d", &DURATION[1..]))
                .param(ParamSpec::new("ease", ParamType::Text)),
            Self::Offset => base
                .param(float("d", &DURATION[1..]))
                .param(float("a", &AMPLITUDE[1..]))
                .param(ParamSpec::new("ease", ParamType::Text)),
        }
    }
}

/// Per-span effect state, built once when the text is compiled.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectState {
    /// Vertical travelling wave; amplitude is in glyph heights.
    Wave {
        /// Driving wave.
        wave: Wave,
        /// Phase delay in seconds per character index.
        spacing: f64,
    },
    /// Gravity-like hop; amplitude is in glyph heights.
    Bounce {
        /// Driving wave (`Pulse` mode).
        wave: Wave,
        /// Phase delay in seconds per character index.
        spacing: f64,
    },
    /// Random jitter re-sampled `frequency` times per second.
    Shake {
        /// Jitter radius in glyph heights.
        amplitude: f64,
        /// Samples per second.
        frequency: f64,
        /// Span-stable noise seed.
        seed: u64,
    },
    /// Rotation; the wave's amplitude is in radians.
    Swing {
        /// Driving wave.
        wave: Wave,
        /// Phase delay in seconds per character index.
        spacing: f64,
    },
    /// Scale pulse; the wave's amplitude is added to a scale of 1.
    Pulse {
        /// Driving wave (`OneDirectionalPulse` mode).
        wave: Wave,
        /// Phase delay in seconds per character index.
        spacing: f64,
    },
    /// Opacity follows transition progress.
    Fade {
        /// Seconds.
        duration: f64,
        /// Progress shaping.
        ease: Ease,
    },
    /// Scale follows transition progress.
    Size {
        /// Seconds.
        duration: f64,
        /// Progress shaping.
        ease: Ease,
    },
    /// Vertical offset shrinking to zero as the transition completes.
    Offset {
        /// Seconds.
        duration: f64,
        /// Progress shaping.
        ease: Ease,
        /// Starting offset in glyph heights.
        distance: f64,
    },
}

impl EffectState {
    /// Build the state for `span`, resolved as `kind` in `family`.
    ///
    /// The anonymous default value stands for amplitude on behaviours and duration on
    /// transitions.
    pub fn build(
        kind: EffectKind,
        family: SpanFamily,
        span: &ResolvedSpan,
        settings: &AnimatorSettings,
    ) -> TagweaveResult<Self> {
        let p = &span.parameters;
        let spacing = |default_w: f64| {
            let w = p.get_f64(WAVE_SIZE).unwrap_or(default_w);
            w * settings.wave_spacing
        };
        let state = match kind {
            EffectKind::Wave => {
                let (a, f) = amplitude_frequency(p, 0.25, 1.0)?;
                Self::Wave {
                    wave: Wave::new(WaveParams {
                        up_period: 0.5 / f,
                        down_period: 0.5 / f,
                        amplitude: a,
                        ..WaveParams::default()
                    })?,
                    spacing: spacing(0.1),
                }
            }
            EffectKind::Bounce => {
                let (a, f) = amplitude_frequency(p, 0.3, 1.0)?;
                Self::Bounce {
                    wave: Wave::new(WaveParams {
                        up_curve: WaveCurve::Ease(Ease::OutQuad),
                        down_curve: WaveCurve::Ease(Ease::InQuad),
                        up_period: 0.3 / f,
                        down_period: 0.3 / f,
                        trough_wait: 0.4 / f,
                        amplitude: a,
                        ..WaveParams::default()
                    })?,
                    spacing: spacing(0.1),
                }
            }
            EffectKind::Swing => {
                let (degrees, f) = amplitude_frequency(p, 10.0, 1.0)?;
                Self::Swing {
                    wave: Wave::oscillation(1.0 / f, degrees * PI / 180.0)?,
                    spacing: spacing(0.1),
                }
            }
            EffectKind::Pulse => {
                let (a, f) = amplitude_frequency(p, 0.15, 1.5)?;
                Self::Pulse {
                    wave: Wave::new(WaveParams {
                        up_period: 0.25 / f,
                        crest_wait: 0.1 / f,
                        down_period: 0.25 / f,
                        trough_wait: 0.4 / f,
                        amplitude: a,
                        ..WaveParams::default()
                    })?,
                    spacing: spacing(0.0),
                }
            }
            EffectKind::Shake => {
                let (amplitude, frequency) = amplitude_frequency(p, 0.05, 20.0)?;
                Self::Shake {
                    amplitude,
                    frequency,
                    seed: span_seed(&span.name, span.start_index, span.order_at_index),
                }
            }
            EffectKind::Fade | EffectKind::Size | EffectKind::Offset => {
                let fallback = if family == SpanFamily::Disappearance {
                    settings.disappearance_duration
                } else {
                    settings.appearance_duration
                };
                let duration = p
                    .get_f64(DURATION)
                    .or_else(|| p.default_f64())
                    .unwrap_or(fallback);
                if duration.is_nan() || duration <= 0.0 {
                    return Err(TagweaveError::markup(format!(
                        "<{}> duration must be > 0",
                        span.name
                    )));
                }
                let ease = match p.get("ease") {
                    Some(name) => Ease::from_name(name).ok_or_else(|| {
                        TagweaveError::markup(format!("<{}> unknown ease '{name}'", span.name))
                    })?,
                    None => Ease::OutCubic,
                };
                match kind {
                    EffectKind::Fade => Self::Fade { duration, ease },
                    EffectKind::Size => Self::Size { duration, ease },
                    _ => Self::Offset {
                        duration,
                        ease,
                        distance: p.get_f64(AMPLITUDE).unwrap_or(0.5),
                    },
                }
            }
        };
        Ok(state)
    }

    /// Which effect this state belongs to.
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Wave { .. } => EffectKind::Wave,
            Self::Bounce { .. } => EffectKind::Bounce,
            Self::Shake { .. } => EffectKind::Shake,
            Self::Swing { .. } => EffectKind::Swing,
            Self::Pulse { .. } => EffectKind::Pulse,
            Self::Fade { .. } => EffectKind::Fade,
            Self::Size { .. } => EffectKind::Size,
            Self::Offset { .. } => EffectKind::Offset,
        }
    }

    /// Driving wave and per-index phase delay, for wave-based behaviours.
    pub fn wave(&self) -> Option<(&Wave, f64)> {
        match self {
            Self::Wave { wave, spacing }
            | Self::Bounce { wave, spacing }
            | Self::Swing { wave, spacing }
            | Self::Pulse { wave, spacing } => Some((wave, *spacing)),
            _ => None,
        }
    }

    /// Transition length in seconds, for show/hide effects.
    pub fn duration(&self) -> Option<f64> {
        match self {
            Self::Fade { duration, .. }
            | Self::Size { duration, .. }
            | Self::Offset { duration, .. } => Some(*duration),
            _ => None,
        }
    }

    /// Behaviour delta for `ch` at animator time `time`. Transitions return identity.
    pub fn behavior_delta(&self, time: f64, ch: &CharInfo) -> CharDelta {
        let height = ch.size.y;
        let mut delta = CharDelta::IDENTITY;
        match self {
            Self::Wave { wave, spacing } | Self::Bounce { wave, spacing } => {
                let (v, _) = wave.evaluate(time, ch.index as f64 * spacing);
                delta.offset = Vec2::new(0.0, v * height);
            }
            Self::Swing { wave, spacing } => {
                delta.rotation = wave.evaluate(time, ch.index as f64 * spacing).0;
            }
            Self::Pulse { wave, spacing } => {
                delta.scale = 1.0 + wave.evaluate(time, ch.index as f64 * spacing).0;
            }
            Self::Shake {
                amplitude,
                frequency,
                seed,
            } => {
                let step = (time * frequency).floor().max(0.0) as u64;
                let char_seed = seed ^ (ch.index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                let x = noise_signed(char_seed, step.wrapping_mul(2));
                let y = noise_signed(char_seed, step.wrapping_mul(2).wrapping_add(1));
                delta.offset = Vec2::new(x, y) * (amplitude * height);
            }
            Self::Fade { .. } | Self::Size { .. } | Self::Offset { .. } => {}
        }
        delta
    }

    /// Transition delta at `visibility` in `[0, 1]`, where 1 means fully shown.
    pub fn transition_delta(&self, visibility: f64, ch: &CharInfo) -> CharDelta {
        let mut delta = CharDelta::IDENTITY;
        match self {
            Self::Fade { ease, .. } => delta.alpha = ease.apply(visibility),
            Self::Size { ease, .. } => delta.scale = ease.apply(visibility),
            Self::Offset { ease, distance, .. } => {
                delta.offset = Vec2::new(0.0, (1.0 - ease.apply(visibility)) * distance * ch.size.y);
            }
            _ => {}
        }
        delta
    }
}

fn amplitude_frequency(p: &TagParams, a: f64, f: f64) -> TagweaveResult<(f64, f64)> {
    let a = p.get_f64(AMPLITUDE).or_else(|| p.default_f64()).unwrap_or(a);
    let f = p.get_f64(FREQUENCY).unwrap_or(f);
    if f.is_nan() || f <= 0.0 {
        return Err(TagweaveError::markup("frequency must be > 0"));
    }
    Ok((a, f))
}

/// Name tables for the built-in effects, plus the writer commands.
///
/// Names map to an [`EffectKind`] per family, so the same kind can be exposed under several
/// tag names (`<jump>` as a bounce, say).
#[derive(Clone, Debug)]
pub struct EffectLibrary {
    kinds: BTreeMap<(SpanFamily, String), EffectKind>,
    commands: BTreeMap<String, EffectDef>,
}

impl EffectLibrary {
    /// Library with every built-in effect under its canonical name, and the `wait` and
    /// `speed` commands.
    pub fn builtin() -> Self {
        let mut lib = Self {
            kinds: BTreeMap::new(),
            commands: BTreeMap::new(),
        };
        for kind in EffectKind::BEHAVIORS {
            lib.register(SpanFamily::Behavior, kind.name(), kind);
        }
        for kind in EffectKind::TRANSITIONS {
            lib.register(SpanFamily::Appearance, kind.name(), kind);
            lib.register(SpanFamily::Disappearance, kind.name(), kind);
        }
        let delay = ParamSchema::none()
            .with_default(ParamType::Float)
            .with_invoke_flags();
        lib.register_command("wait", EffectDef::index(delay.clone()));
        lib.register_command(
            "speed",
            EffectDef::index(delay).policy(InvokePolicy {
                execute_on_skip: true,
                ..InvokePolicy::default()
            }),
        );
        lib
    }

    /// Expose `kind` as `name` in `family`. Behaviours only make sense unprefixed and
    /// transitions only under `+`/`-`; other combinations are ignored.
    pub fn register(&mut self, family: SpanFamily, name: &str, kind: EffectKind) -> &mut Self {
        let fits = match family {
            SpanFamily::Behavior => kind.is_behavior(),
            SpanFamily::Appearance | SpanFamily::Disappearance => !kind.is_behavior(),
            SpanFamily::Event | SpanFamily::Command => false,
        };
        if fits {
            self.kinds.insert((family, name.to_owned()), kind);
        } else {
            tracing::debug!(?family, name, ?kind, "effect kind does not fit family");
        }
        self
    }

    /// Add (or replace) a writer command.
    pub fn register_command(&mut self, name: &str, def: EffectDef) -> &mut Self {
        self.commands.insert(name.to_owned(), def);
        self
    }

    /// Kind registered for `name` in `family`.
    pub fn kind(&self, family: SpanFamily, name: &str) -> Option<EffectKind> {
        self.kinds.get(&(family, name.to_owned())).copied()
    }

    /// Registry for one family's processor.
    pub fn registry(&self, family: SpanFamily, strictness: Strictness) -> Registry {
        let mut reg = Registry::new();
        if family == SpanFamily::Command {
            for (name, def) in &self.commands {
                let mut def = def.clone();
                def.schema = def.schema.strictness(strictness);
                reg.register(name, def);
            }
            return reg;
        }
        for ((f, name), kind) in &self.kinds {
            if *f == family {
                reg.register(name, EffectDef::block(kind.schema().strictness(strictness)));
            }
        }
        reg
    }

    /// Pipeline with a processor for every family; events accept any name.
    pub fn pipeline(&self, settings: &PipelineSettings) -> MarkupPipeline {
        let mut pipeline = MarkupPipeline::new(settings);
        for family in SpanFamily::ALL {
            let processor = if family == SpanFamily::Event {
                SpanProcessor::new(family, Arc::new(OpenRegistry::default()))
            } else {
                SpanProcessor::new(family, Arc::new(self.registry(family, settings.strictness)))
            };
            pipeline.add_processor(processor);
        }
        pipeline
    }
}

impl Default for EffectLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/effects.rs"]
mod tests;
