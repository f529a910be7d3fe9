/// Convenience result type used across tagweave.
pub type TagweaveResult<T> = Result<T, TagweaveError>;

/// Top-level error taxonomy for fallible constructors and loaders.
///
/// Markup parsing itself is tolerant and never returns these: malformed or unknown tags become
/// literal text. Errors are reserved for invalid configuration and invalid numeric input.
#[derive(thiserror::Error, Debug)]
pub enum TagweaveError {
    /// Invalid user-provided settings or parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while building effect state from resolved markup.
    #[error("markup error: {0}")]
    Markup(String),

    /// Errors while constructing waves or curves.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TagweaveError {
    /// Build a [`TagweaveError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TagweaveError::Markup`] value.
    pub fn markup(msg: impl Into<String>) -> Self {
        Self::Markup(msg.into())
    }

    /// Build a [`TagweaveError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`TagweaveError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for TagweaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
