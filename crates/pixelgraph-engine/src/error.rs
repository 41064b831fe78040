//! Executor error taxonomy.

use pixelgraph_core::Rect;
use pixelgraph_graph::{GraphError, OpError};
use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by [`apply_operation`](crate::apply_operation).
///
/// Structural and precondition failures (`Region`, `Graph`, `NoSourcePort`)
/// are raised before any tile is processed, leaving the destination
/// untouched. `Op` and `Core` failures can occur mid-evaluation; tiles
/// already written stay written. `Cancelled` is distinct from failure so
/// callers can tell an aborted call from a broken one.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested region does not lie within the destination buffer.
    #[error("region {region} exceeds destination bounds {width}x{height}")]
    Region {
        /// The offending region
        region: Rect,
        /// Destination width
        width: u32,
        /// Destination height
        height: u32,
    },

    /// The root operation has no unconnected input port left for the
    /// source buffer.
    #[error("operation `{op}` has no free input port for the source buffer")]
    NoSourcePort {
        /// Root operation id
        op: String,
    },

    /// Graph construction or validation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A leaf operation failed while rendering.
    #[error("operation failed: {0}")]
    Op(#[from] OpError),

    /// A buffer access failed.
    #[error(transparent)]
    Core(#[from] pixelgraph_core::Error),

    /// Evaluation was cancelled at a tile boundary.
    #[error("evaluation cancelled")]
    Cancelled,
}
