//! # Types
//!
//! Shared identifiers and value types used across the player.

use std::fmt;

pub use flashback_data::model::CharacterId;
pub use kurbo::Affine;

/// Stacking slot within a timeline. Lower depths are drawn first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Depth(pub u32);

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generational handle into the timeline arena.
///
/// A handle outlives the timeline it names; once the slot is freed the
/// generation moves on and the handle stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimelineId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timeline {}v{}", self.index, self.generation)
    }
}

/// Opaque handle to a container owned by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerHandle(pub u64);

impl fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Which definition a timeline instance was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DefinitionKey {
    Root,
    Sprite(CharacterId),
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKey::Root => write!(f, "root"),
            DefinitionKey::Sprite(id) => write!(f, "sprite {}", id),
        }
    }
}

/// Color effect applied to a placed object.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorTransform {
    /// Per-channel multipliers `[r, g, b, a]`.
    Multiply([f64; 4]),
    /// Row-major 4x5 color matrix.
    Matrix([f64; 20]),
}

impl ColorTransform {
    /// Builds a color transform from its flat form. Only 4 and 20 values are valid.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        match values.len() {
            4 => {
                let mut out = [0.0; 4];
                out.copy_from_slice(values);
                Some(ColorTransform::Multiply(out))
            }
            20 => {
                let mut out = [0.0; 20];
                out.copy_from_slice(values);
                Some(ColorTransform::Matrix(out))
            }
            _ => None,
        }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            ColorTransform::Multiply(v) => v,
            ColorTransform::Matrix(v) => v,
        }
    }
}

/// Destination of a `goto`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTarget {
    Frame(u32),
    Label(String),
}

impl fmt::Display for FrameTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameTarget::Frame(frame) => write!(f, "frame {}", frame),
            FrameTarget::Label(label) => write!(f, "label {:?}", label),
        }
    }
}
