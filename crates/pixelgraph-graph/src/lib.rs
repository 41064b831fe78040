//! # pixelgraph-graph
//!
//! Graph machinery for composable pixel operations.
//!
//! A [`Graph`] is a small directed acyclic graph of named operations
//! ("nodes") connected through ports. Each node carries an operation id
//! resolved against an [`OpRegistry`] plus a [`ParamMap`] of typed
//! parameters. Graphs are built per evaluation, consumed by the executor,
//! and dropped - they are never cached across calls.
//!
//! This crate is deliberately ignorant of any concrete operation; the
//! built-in operation set lives in `pixelgraph-ops` and the evaluation
//! engine in `pixelgraph-engine`.
//!
//! # Example
//!
//! ```rust
//! use pixelgraph_graph::{GraphContext, OpRegistry};
//!
//! // An empty registry still allows graph construction machinery to be
//! // exercised; real callers use pixelgraph_ops::builtin_registry().
//! let ctx = GraphContext::new(OpRegistry::new());
//! let graph = ctx.new_graph();
//! assert_eq!(graph.node_count(), 0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod context;
mod error;
mod graph;
mod op;
mod param;
mod registry;

pub use context::GraphContext;
pub use error::{GraphError, GraphResult};
pub use graph::{Graph, NodeId};
pub use op::{OpError, PixelOp, PortDef, RenderInputs, PORT_AUX, PORT_INPUT, PORT_OUTPUT};
pub use param::{Param, ParamMap};
pub use registry::{OpConstructor, OpRegistry, OpSpec};
