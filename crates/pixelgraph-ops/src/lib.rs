//! # pixelgraph-ops
//!
//! The built-in operation set for pixelgraph graphs, plus the node
//! builders that assemble common subgraphs.
//!
//! # Modules
//!
//! - [`source`] - Buffer and solid-color sources, translation, the sink
//! - [`composite`] - The 26 blend-mode composite operations
//! - [`opacity`] - Opacity scaling with optional per-pixel mask
//! - [`point`] - Invert, threshold, set-alpha
//! - [`blur`] - Separable gaussian blur
//! - [`geometry`] - Scale and arbitrary 3x3 transforms
//! - [`reduction`] - Per-channel bit-depth reduction with dithering
//! - [`nodes`] - Subgraph builders consumed by the executor's callers
//!
//! # Registry
//!
//! [`builtin_registry`] assembles the closed operation table;
//! [`builtin_context`] wraps it in a ready-to-use
//! [`GraphContext`](pixelgraph_graph::GraphContext).
//!
//! ```rust
//! use pixelgraph_ops::builtin_context;
//!
//! let ctx = builtin_context();
//! assert!(ctx.registry().contains("gaussian-blur"));
//! assert!(ctx.registry().contains("composite-multiply"));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod blur;
pub mod composite;
pub mod geometry;
mod hash;
pub mod nodes;
pub mod opacity;
pub mod point;
pub mod reduction;
pub mod source;

pub use composite::BlendMode;
pub use geometry::Interpolation;
pub use reduction::DitherMode;

use pixelgraph_graph::{GraphContext, OpRegistry};

/// Operation ids of the built-in set.
pub mod ids {
    /// Reads a rectangular region out of a shared buffer.
    pub const BUFFER_SOURCE: &str = "buffer-source";
    /// Produces an infinite plane of one solid color.
    pub const COLOR_SOURCE: &str = "color-source";
    /// Shifts its input by an integer offset.
    pub const TRANSLATE: &str = "translate";
    /// Terminal identity node the executor targets.
    pub const WRITE_BUFFER: &str = "write-buffer";
    /// Opacity scaling with optional mask.
    pub const OPACITY: &str = "opacity";
    /// Channel inversion.
    pub const INVERT: &str = "invert";
    /// Luminance threshold to black/white.
    pub const THRESHOLD: &str = "threshold";
    /// Constant alpha replacement.
    pub const SET_ALPHA: &str = "set-alpha";
    /// Separable gaussian blur.
    pub const GAUSSIAN_BLUR: &str = "gaussian-blur";
    /// Axis-aligned scaling.
    pub const SCALE: &str = "scale";
    /// Arbitrary 3x3 matrix transform.
    pub const TRANSFORM: &str = "transform";
    /// Per-channel bit-depth reduction.
    pub const COLOR_REDUCTION: &str = "color-reduction";
}

/// Builds the registry holding every built-in operation.
pub fn builtin_registry() -> OpRegistry {
    let mut reg = OpRegistry::new();
    source::register(&mut reg);
    composite::register(&mut reg);
    opacity::register(&mut reg);
    point::register(&mut reg);
    blur::register(&mut reg);
    geometry::register(&mut reg);
    reduction::register(&mut reg);
    reg
}

/// Creates a [`GraphContext`] over [`builtin_registry`].
pub fn builtin_context() -> GraphContext {
    GraphContext::new(builtin_registry())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_core_set() {
        let reg = builtin_registry();
        for id in [
            ids::BUFFER_SOURCE,
            ids::COLOR_SOURCE,
            ids::TRANSLATE,
            ids::WRITE_BUFFER,
            ids::OPACITY,
            ids::INVERT,
            ids::THRESHOLD,
            ids::SET_ALPHA,
            ids::GAUSSIAN_BLUR,
            ids::SCALE,
            ids::TRANSFORM,
            ids::COLOR_REDUCTION,
        ] {
            assert!(reg.contains(id), "missing {id}");
        }
    }

    #[test]
    fn test_all_blend_modes_registered() {
        let reg = builtin_registry();
        for mode in BlendMode::ALL {
            assert!(reg.contains(mode.op_id()), "missing {}", mode.op_id());
        }
    }
}
