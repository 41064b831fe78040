//! # pixelgraph-engine
//!
//! The executor that evaluates operation graphs against buffers.
//!
//! [`apply_operation`] wires one root operation between an optional source
//! buffer and a mandatory destination buffer, then drives incremental
//! pull-based evaluation over a region. With a progress sink attached the
//! region is processed tile by tile, reporting fractional completion
//! after each tile; without one the whole region is evaluated in a single
//! blit.
//!
//! Evaluation is single-threaded, deterministic (row-major tile order),
//! and cooperative: [`apply_operation_cancellable`] checks a
//! [`CancellationToken`] at every tile boundary and trips to the distinct
//! [`EngineError::Cancelled`]. Tiles written before cancellation or a
//! mid-evaluation failure remain written; the engine has no rollback.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pixelgraph_core::{Buffer, PixelFormat, Rgba};
//! use pixelgraph_engine::apply_flatten;
//! use pixelgraph_ops::builtin_context;
//!
//! let ctx = builtin_context();
//! let mut src = Buffer::new(16, 16, PixelFormat::RGBA_U8);
//! src.fill(Rgba::new(1.0, 0.0, 0.0, 1.0));
//! let src = Arc::new(src);
//! let mut dest = Buffer::new(16, 16, PixelFormat::RGBA_U8);
//!
//! apply_flatten(&ctx, &src, None, "Flatten", &mut dest,
//!               Rgba::new(0.0, 0.0, 1.0, 1.0)).unwrap();
//! assert_eq!(dest.pixel(0, 0).r, 1.0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod apply;
mod cancel;
mod error;
mod evaluator;
mod processor;
mod progress;

pub use apply::{
    apply_color_reduction, apply_feather, apply_flatten, apply_gaussian_blur, apply_invert,
    apply_opacity, apply_operation, apply_operation_cancellable, apply_scale, apply_set_alpha,
    apply_threshold, apply_transform,
};
pub use cancel::CancellationToken;
pub use error::{EngineError, EngineResult};
pub use processor::{TILE_HEIGHT, TILE_WIDTH};
pub use progress::ProgressSink;
