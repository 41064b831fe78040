//! Explicit graph construction context.

use crate::{Graph, OpRegistry};
use std::sync::Arc;

/// An explicit context from which graphs are created.
///
/// The context owns the operation registry; its lifetime is controlled by
/// the caller rather than by process-wide library initialization. Cloning
/// is cheap (the registry is shared).
///
/// # Example
///
/// ```rust
/// use pixelgraph_graph::{GraphContext, OpRegistry};
///
/// let ctx = GraphContext::new(OpRegistry::new());
/// let _graph = ctx.new_graph();
/// ```
#[derive(Debug, Clone)]
pub struct GraphContext {
    registry: Arc<OpRegistry>,
}

impl GraphContext {
    /// Creates a context owning the given registry.
    pub fn new(registry: OpRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<OpRegistry> {
        &self.registry
    }

    /// Creates an empty graph bound to this context's registry.
    pub fn new_graph(&self) -> Graph {
        Graph::new(Arc::clone(&self.registry))
    }
}
