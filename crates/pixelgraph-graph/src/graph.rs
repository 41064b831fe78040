//! The operation DAG.
//!
//! Nodes live in an arena owned by the [`Graph`]; [`NodeId`] handles index
//! into it. Connections are validated as they are made - known ports, at
//! most one producer per input port, no cycles - so an assembled graph is
//! structurally sound by construction. What connect-time validation cannot
//! see (required ports left unconnected) is caught by [`Graph::validate`]
//! during executor preflight.

use crate::{GraphError, GraphResult, OpRegistry, Param, ParamMap, PORT_OUTPUT};
use std::sync::Arc;
use tracing::debug;

/// Handle to a node inside one [`Graph`].
///
/// Handles are only meaningful for the graph that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug)]
struct NodeData {
    op_id: &'static str,
    params: ParamMap,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: NodeId,
    to: NodeId,
    /// Index into the consumer op's static port table.
    to_port: usize,
}

/// A directed acyclic graph of parameterized pixel operations.
///
/// Built per evaluation via [`GraphContext::new_graph`](crate::GraphContext::new_graph),
/// consumed by the executor, and dropped afterwards.
#[derive(Debug)]
pub struct Graph {
    registry: Arc<OpRegistry>,
    nodes: Vec<NodeData>,
    edges: Vec<Edge>,
}

impl Graph {
    pub(crate) fn new(registry: Arc<OpRegistry>) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// The registry this graph resolves operation ids against.
    pub fn registry(&self) -> &Arc<OpRegistry> {
        &self.registry
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a node for a registered operation.
    pub fn add(&mut self, op_id: &'static str, params: ParamMap) -> GraphResult<NodeId> {
        if !self.registry.contains(op_id) {
            return Err(GraphError::UnknownOperation(op_id.to_owned()));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData { op_id, params });
        debug!(op = op_id, node = id.0, "added node");
        Ok(id)
    }

    /// The operation id of a node.
    pub fn op_id(&self, node: NodeId) -> GraphResult<&'static str> {
        Ok(self.data(node)?.op_id)
    }

    /// The parameters of a node.
    pub fn params(&self, node: NodeId) -> GraphResult<&ParamMap> {
        Ok(&self.data(node)?.params)
    }

    /// Updates one parameter on a node.
    ///
    /// Parameter updates are only meaningful before evaluation begins; the
    /// executor consumes the graph, so this cannot race a running
    /// evaluation.
    pub fn set_param(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<Param>,
    ) -> GraphResult<()> {
        let data = self.data_mut(node)?;
        data.params.set(name, value);
        Ok(())
    }

    /// Connects a producer's output to a consumer's input port.
    ///
    /// `from_port` must be `"output"`; `to_port` must exist on the
    /// consumer, be unoccupied, and the new edge must not close a cycle.
    pub fn connect(
        &mut self,
        from: NodeId,
        from_port: &str,
        to: NodeId,
        to_port: &str,
    ) -> GraphResult<()> {
        let from_op = self.op_id(from)?;
        let to_op = self.op_id(to)?;

        if from_port != PORT_OUTPUT {
            return Err(GraphError::UnknownPort {
                op: from_op.to_owned(),
                port: from_port.to_owned(),
            });
        }

        let spec = self.registry.spec(to_op)?;
        let port_index = spec
            .input_ports
            .iter()
            .position(|p| p.name == to_port)
            .ok_or_else(|| GraphError::UnknownPort {
                op: to_op.to_owned(),
                port: to_port.to_owned(),
            })?;

        if self
            .edges
            .iter()
            .any(|e| e.to == to && e.to_port == port_index)
        {
            return Err(GraphError::PortOccupied {
                op: to_op.to_owned(),
                port: to_port.to_owned(),
            });
        }

        // from must not be reachable downstream-to-upstream from itself
        // through to, or the edge closes a cycle
        if from == to || self.reaches(to, from) {
            return Err(GraphError::CycleDetected {
                from: from_op.to_owned(),
                to: to_op.to_owned(),
            });
        }

        self.edges.push(Edge {
            from,
            to,
            to_port: port_index,
        });
        debug!(from = from_op, to = to_op, port = to_port, "connected");
        Ok(())
    }

    /// The producer feeding `port` of `node`, if any.
    pub fn producer(&self, node: NodeId, port: &str) -> GraphResult<Option<NodeId>> {
        let op = self.op_id(node)?;
        let spec = self.registry.spec(op)?;
        let port_index = spec
            .input_ports
            .iter()
            .position(|p| p.name == port)
            .ok_or_else(|| GraphError::UnknownPort {
                op: op.to_owned(),
                port: port.to_owned(),
            })?;
        Ok(self
            .edges
            .iter()
            .find(|e| e.to == node && e.to_port == port_index)
            .map(|e| e.from))
    }

    /// Validates every node reachable upstream from `sink`.
    ///
    /// Fails with [`GraphError::MissingInput`] when a reachable node has a
    /// required port with no producer. Called by the executor before any
    /// tile is processed.
    pub fn validate(&self, sink: NodeId) -> GraphResult<()> {
        let mut stack = vec![sink];
        let mut seen = vec![false; self.nodes.len()];

        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut seen[node.0 as usize], true) {
                continue;
            }
            let op = self.op_id(node)?;
            let spec = self.registry.spec(op)?;
            for (index, port) in spec.input_ports.iter().enumerate() {
                let producer = self
                    .edges
                    .iter()
                    .find(|e| e.to == node && e.to_port == index)
                    .map(|e| e.from);
                match producer {
                    Some(p) => stack.push(p),
                    None if port.required => {
                        return Err(GraphError::MissingInput {
                            op: op.to_owned(),
                            port: port.name.to_owned(),
                        });
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }

    /// Whether `to` is reachable by walking downstream edges from `from`.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if std::mem::replace(&mut seen[node.0 as usize], true) {
                continue;
            }
            stack.extend(self.edges.iter().filter(|e| e.from == node).map(|e| e.to));
        }
        false
    }

    fn data(&self, node: NodeId) -> GraphResult<&NodeData> {
        self.nodes
            .get(node.0 as usize)
            .ok_or(GraphError::InvalidNode(node))
    }

    fn data_mut(&mut self, node: NodeId) -> GraphResult<&mut NodeData> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(GraphError::InvalidNode(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OpError, OpSpec, PixelOp, PortDef, RenderInputs, PORT_AUX, PORT_INPUT};
    use pixelgraph_core::Tile;

    struct Noop;

    impl PixelOp for Noop {
        fn render(&self, _inputs: &RenderInputs<'_>, _out: &mut Tile) -> Result<(), OpError> {
            Ok(())
        }
    }

    fn build(_: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
        Ok(Box::new(Noop))
    }

    fn test_registry() -> Arc<OpRegistry> {
        let mut reg = OpRegistry::new();
        reg.register(
            "source",
            OpSpec {
                input_ports: &[],
                build,
            },
        );
        reg.register(
            "filter",
            OpSpec {
                input_ports: const { &[PortDef::required(PORT_INPUT), PortDef::optional(PORT_AUX)] },
                build,
            },
        );
        Arc::new(reg)
    }

    fn test_graph() -> Graph {
        Graph::new(test_registry())
    }

    #[test]
    fn test_add_unknown_op() {
        let mut g = test_graph();
        assert!(matches!(
            g.add("nope", ParamMap::new()),
            Err(GraphError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_connect_and_producer() {
        let mut g = test_graph();
        let src = g.add("source", ParamMap::new()).unwrap();
        let flt = g.add("filter", ParamMap::new()).unwrap();
        g.connect(src, PORT_OUTPUT, flt, PORT_INPUT).unwrap();
        assert_eq!(g.producer(flt, PORT_INPUT).unwrap(), Some(src));
        assert_eq!(g.producer(flt, PORT_AUX).unwrap(), None);
    }

    #[test]
    fn test_port_occupied() {
        let mut g = test_graph();
        let a = g.add("source", ParamMap::new()).unwrap();
        let b = g.add("source", ParamMap::new()).unwrap();
        let flt = g.add("filter", ParamMap::new()).unwrap();
        g.connect(a, PORT_OUTPUT, flt, PORT_INPUT).unwrap();
        assert!(matches!(
            g.connect(b, PORT_OUTPUT, flt, PORT_INPUT),
            Err(GraphError::PortOccupied { .. })
        ));
    }

    #[test]
    fn test_unknown_port() {
        let mut g = test_graph();
        let src = g.add("source", ParamMap::new()).unwrap();
        let flt = g.add("filter", ParamMap::new()).unwrap();
        assert!(matches!(
            g.connect(src, PORT_OUTPUT, flt, "sideband"),
            Err(GraphError::UnknownPort { .. })
        ));
        assert!(matches!(
            g.connect(src, "result", flt, PORT_INPUT),
            Err(GraphError::UnknownPort { .. })
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut g = test_graph();
        let a = g.add("filter", ParamMap::new()).unwrap();
        let b = g.add("filter", ParamMap::new()).unwrap();
        g.connect(a, PORT_OUTPUT, b, PORT_INPUT).unwrap();
        assert!(matches!(
            g.connect(b, PORT_OUTPUT, a, PORT_INPUT),
            Err(GraphError::CycleDetected { .. })
        ));
        // self-loop
        assert!(matches!(
            g.connect(a, PORT_OUTPUT, a, PORT_AUX),
            Err(GraphError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_validate_missing_required() {
        let mut g = test_graph();
        let flt = g.add("filter", ParamMap::new()).unwrap();
        assert!(matches!(
            g.validate(flt),
            Err(GraphError::MissingInput { .. })
        ));
    }

    #[test]
    fn test_validate_ok_with_optional_unconnected() {
        let mut g = test_graph();
        let src = g.add("source", ParamMap::new()).unwrap();
        let flt = g.add("filter", ParamMap::new()).unwrap();
        g.connect(src, PORT_OUTPUT, flt, PORT_INPUT).unwrap();
        g.validate(flt).unwrap();
    }

    #[test]
    fn test_set_param_before_evaluation() {
        let mut g = test_graph();
        let src = g.add("source", ParamMap::new()).unwrap();
        g.set_param(src, "value", 0.25).unwrap();
        assert!(matches!(
            g.params(src).unwrap().get("value"),
            Some(crate::Param::Float(_))
        ));
        assert!(g.set_param(NodeId(99), "value", 1.0).is_err());
    }

    #[test]
    fn test_validate_walks_upstream() {
        let mut g = test_graph();
        let bare = g.add("filter", ParamMap::new()).unwrap();
        let tail = g.add("filter", ParamMap::new()).unwrap();
        g.connect(bare, PORT_OUTPUT, tail, PORT_INPUT).unwrap();
        // tail's input is connected, but its producer is missing one
        assert!(matches!(
            g.validate(tail),
            Err(GraphError::MissingInput { .. })
        ));
    }
}
