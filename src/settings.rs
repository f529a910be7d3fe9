use crate::foundation::error::{TagweaveError, TagweaveResult};
use crate::markup::escape::DEFAULT_ESCAPE_TAG;
use crate::markup::registry::Strictness;

/// Top-level configuration, loadable from JSON.
///
/// Every field has a default, so `{}` is a valid settings document.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Markup compilation settings.
    pub pipeline: PipelineSettings,
    /// Runtime animation settings.
    pub animator: AnimatorSettings,
}

impl Settings {
    /// Parse and validate a JSON settings document.
    pub fn from_json_str(s: &str) -> TagweaveResult<Self> {
        let settings: Settings = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> TagweaveResult<()> {
        self.pipeline.validate()?;
        self.animator.validate()
    }
}

/// Settings for [`crate::MarkupPipeline`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Name of the tag that suspends markup interpretation.
    pub escape_tag: String,
    /// Unknown-parameter policy for the built-in effect registries.
    pub strictness: Strictness,
    /// Text emitted when the compiled document would otherwise be empty.
    pub placeholder: char,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            escape_tag: DEFAULT_ESCAPE_TAG.to_owned(),
            strictness: Strictness::Strict,
            placeholder: ' ',
        }
    }
}

impl PipelineSettings {
    fn validate(&self) -> TagweaveResult<()> {
        let tag = self.escape_tag.as_str();
        if tag.is_empty() || tag.chars().any(|c| c.is_whitespace() || "<>=/".contains(c)) {
            return Err(TagweaveError::validation(format!(
                "escape_tag '{tag}' is not a valid tag name"
            )));
        }
        if tag.starts_with(crate::markup::scanner::TAG_PREFIXES) {
            return Err(TagweaveError::validation(
                "escape_tag must not start with a family prefix",
            ));
        }
        Ok(())
    }
}

/// Settings for [`crate::TextAnimator`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimatorSettings {
    /// Multiplier applied to the time passed into each tick.
    pub time_scale: f64,
    /// Default duration in seconds for appearance effects without `d=`.
    pub appearance_duration: f64,
    /// Default duration in seconds for disappearance effects without `d=`.
    pub disappearance_duration: f64,
    /// Phase offset between neighbouring characters for wave-driven behaviours.
    pub wave_spacing: f64,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            appearance_duration: 0.3,
            disappearance_duration: 0.3,
            wave_spacing: 1.0,
        }
    }
}

impl AnimatorSettings {
    fn validate(&self) -> TagweaveResult<()> {
        for (name, v) in [
            ("time_scale", self.time_scale),
            ("appearance_duration", self.appearance_duration),
            ("disappearance_duration", self.disappearance_duration),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(TagweaveError::validation(format!(
                    "animator.{name} must be finite and > 0"
                )));
            }
        }
        if !self.wave_spacing.is_finite() || self.wave_spacing < 0.0 {
            return Err(TagweaveError::validation(
                "animator.wave_spacing must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/settings.rs"]
mod tests;
