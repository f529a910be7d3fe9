pub use kurbo::{Point, Vec2};

/// Per-character layout facts provided by the host text engine.
///
/// The core only reads these; it never mutates host geometry directly.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CharInfo {
    /// 0-based character index in display coordinates.
    pub index: usize,
    /// Whether the host renders this character at all (whitespace is often `false`).
    pub visible: bool,
    /// 0-based line number.
    pub line: u32,
    /// 0-based word number.
    pub word: u32,
    /// 0-based page number.
    pub page: u32,
    /// Glyph origin in host units.
    pub origin: Point,
    /// Glyph advance/height in host units.
    pub size: Vec2,
}

impl CharInfo {
    /// Visible character at `index` with zeroed geometry.
    pub fn at(index: usize) -> Self {
        Self {
            index,
            visible: true,
            line: 0,
            word: 0,
            page: 0,
            origin: Point::ZERO,
            size: Vec2::new(1.0, 1.0),
        }
    }
}

/// Visual delta for one character, applied by the host in a single batched update per tick.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CharDelta {
    /// Positional offset in host units.
    pub offset: Vec2,
    /// Rotation in radians around the glyph center.
    pub rotation: f64,
    /// Uniform scale multiplier.
    pub scale: f64,
    /// Opacity multiplier in `[0, 1]`.
    pub alpha: f64,
}

impl CharDelta {
    /// Delta that leaves the glyph untouched.
    pub const IDENTITY: Self = Self {
        offset: Vec2::ZERO,
        rotation: 0.0,
        scale: 1.0,
        alpha: 1.0,
    };

    /// Fold another delta into this one (offsets and rotations add, scale and alpha multiply).
    pub fn combine(&mut self, other: CharDelta) {
        self.offset += other.offset;
        self.rotation += other.rotation;
        self.scale *= other.scale;
        self.alpha *= other.alpha;
    }

    /// Return `true` when applying this delta would be a no-op.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for CharDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
