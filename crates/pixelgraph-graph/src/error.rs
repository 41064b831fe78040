//! Error types for graph construction and validation.

use crate::{NodeId, OpError};
use thiserror::Error;

/// Result type alias using [`GraphError`].
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Errors raised while building or validating a graph.
///
/// All of these are structural precondition violations: they surface before
/// evaluation touches a single tile, and nothing is written to the
/// destination buffer.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The operation id is not present in the registry.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    /// A node handle does not belong to this graph.
    #[error("invalid node id {0:?}")]
    InvalidNode(NodeId),

    /// The named port does not exist on the operation.
    #[error("operation `{op}` has no port `{port}`")]
    UnknownPort {
        /// Operation id
        op: String,
        /// Offending port name
        port: String,
    },

    /// An input port already has an incoming connection.
    ///
    /// Every input port accepts exactly zero or one producers.
    #[error("port `{port}` of `{op}` is already connected")]
    PortOccupied {
        /// Operation id of the consumer
        op: String,
        /// Occupied port name
        port: String,
    },

    /// The connection would create a cycle.
    #[error("connecting `{from}` to `{to}` would create a cycle")]
    CycleDetected {
        /// Producer operation id
        from: String,
        /// Consumer operation id
        to: String,
    },

    /// A required input port has nothing connected.
    #[error("required port `{port}` of `{op}` is not connected")]
    MissingInput {
        /// Operation id
        op: String,
        /// Unconnected required port
        port: String,
    },

    /// Operation construction failed (bad parameters).
    #[error(transparent)]
    Op(#[from] OpError),
}
