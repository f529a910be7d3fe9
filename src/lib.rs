//! Tagweave compiles inline text markup into per-character effect spans and animates them.
//!
//! Authors write `<wave>hello</wave>`, `<+fade d=0.5>`, `<?ping>` or `<@wait=1>` in their
//! text. The surface is split in two halves:
//!
//! - A [`MarkupPipeline`] strips the tags it recognizes and reports where each one applies in
//!   the text the host actually displays ([`CompiledText`]).
//! - A [`TextAnimator`] owns the compiled text, tracks each character's visibility and fires
//!   events and commands as characters appear. Every tick yields one batch of [`CharDelta`]s.
//!
//! Markup is tolerant: unknown, malformed or unmatched tags stay in the text verbatim.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod foundation;
mod invoke;
mod markup;
mod settings;
mod timeline;

pub use crate::animation::animator::{ExtremaHit, TextAnimator};
pub use crate::animation::curve::{AnimationCurve, Keyframe, fit_cubic_beziers};
pub use crate::animation::ease::Ease;
pub use crate::animation::effects::{EffectKind, EffectLibrary, EffectState};
pub use crate::animation::wave::{Wave, WaveCurve, WaveMode, WaveParams};
pub use crate::foundation::core::{CharDelta, CharInfo, Point, Vec2};
pub use crate::foundation::error::{TagweaveError, TagweaveResult};
pub use crate::invoke::{InvocableTag, TagCache, TagInvoker};
pub use crate::markup::escape::DEFAULT_ESCAPE_TAG;
pub use crate::markup::params::{ParamError, TagParams, parse_params};
pub use crate::markup::processor::{ResolvedSpan, SpanFamily, SpanProcessor, TagProcessor};
pub use crate::markup::reconcile::{CompiledText, Diagnostic, DiagnosticKind, MarkupPipeline};
pub use crate::markup::registry::{
    EffectDef, EffectRegistry, InvokePolicy, OpenRegistry, ParamSchema, ParamSpec, ParamType,
    Registry, Strictness, TagArity, TagEffect,
};
pub use crate::markup::scanner::{Tag, TagKind, next_tag};
pub use crate::settings::{AnimatorSettings, PipelineSettings, Settings};
pub use crate::timeline::{CharacterTimeline, CharacterTimelineEntry, VisibilityState};
