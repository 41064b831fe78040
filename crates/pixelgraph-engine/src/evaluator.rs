//! Pull-based graph evaluation.
//!
//! The evaluator instantiates every operation reachable upstream from the
//! evaluation target during construction - so unknown operations, bad
//! parameters, and unconnected required ports all fail before a single
//! tile is rendered - then recursively pulls input tiles on demand:
//! each node asks its producers for the regions it needs
//! ([`PixelOp::required_rect`]) and renders its own output from them.

use crate::{EngineError, EngineResult};
use pixelgraph_core::{Rect, Tile};
use pixelgraph_graph::{Graph, GraphError, NodeId, PixelOp, RenderInputs};
use std::collections::HashMap;

pub(crate) struct Evaluator<'g> {
    graph: &'g Graph,
    ops: HashMap<NodeId, Box<dyn PixelOp>>,
}

impl<'g> Evaluator<'g> {
    /// Validates the graph and instantiates every reachable operation.
    pub(crate) fn new(graph: &'g Graph, target: NodeId) -> EngineResult<Self> {
        graph.validate(target)?;

        let mut ops = HashMap::new();
        let mut stack = vec![target];
        while let Some(node) = stack.pop() {
            if ops.contains_key(&node) {
                continue;
            }
            let op_id = graph.op_id(node)?;
            let op = graph.registry().instantiate(op_id, graph.params(node)?)?;
            ops.insert(node, op);

            let spec = graph.registry().spec(op_id)?;
            for port in spec.input_ports {
                if let Some(producer) = graph.producer(node, port.name)? {
                    stack.push(producer);
                }
            }
        }
        Ok(Self { graph, ops })
    }

    /// Renders `node`'s output over `rect`.
    pub(crate) fn evaluate(&self, node: NodeId, rect: Rect) -> EngineResult<Tile> {
        let op = self
            .ops
            .get(&node)
            .ok_or(GraphError::InvalidNode(node))?;
        let op_id = self.graph.op_id(node)?;
        let spec = self.graph.registry().spec(op_id)?;

        let mut input_tiles: Vec<(&'static str, Tile)> = Vec::new();
        for port in spec.input_ports {
            if let Some(producer) = self.graph.producer(node, port.name)? {
                let needed = op.required_rect(port.name, rect);
                input_tiles.push((port.name, self.evaluate(producer, needed)?));
            }
        }

        let refs: Vec<(&str, &Tile)> = input_tiles
            .iter()
            .map(|(name, tile)| (*name, tile))
            .collect();
        let mut out = Tile::new(rect);
        op.render(&RenderInputs::new(refs), &mut out)?;
        Ok(out)
    }
}
