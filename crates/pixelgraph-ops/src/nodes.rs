//! Reusable subgraph builders.
//!
//! These assemble the small node arrangements callers plug into the
//! executor as root operations: a buffer exposed as a graph input, a
//! flatten-onto-background compositor, a masked opacity scaler, and the
//! blend-mode selector.
//!
//! Builders return the node whose output represents the subgraph result;
//! its first unconnected input port is where the executor attaches the
//! source buffer.

use crate::composite::BlendMode;
use crate::ids;
use pixelgraph_core::{Buffer, Rgba};
use pixelgraph_graph::{Graph, GraphResult, NodeId, ParamMap, PORT_AUX, PORT_INPUT, PORT_OUTPUT};
use std::sync::Arc;

/// Wraps a buffer as a graph input, optionally shifted by (x, y).
///
/// With a zero offset this is a bare `"buffer-source"`; otherwise the
/// source is composed with a `"translate"` node so downstream coordinates
/// are buffer-local.
pub fn buffer_source_node(
    graph: &mut Graph,
    buffer: Arc<Buffer>,
    offset_x: i32,
    offset_y: i32,
) -> GraphResult<NodeId> {
    let source = graph.add(
        ids::BUFFER_SOURCE,
        ParamMap::new().with("buffer", buffer),
    )?;
    if offset_x == 0 && offset_y == 0 {
        return Ok(source);
    }
    let translate = graph.add(
        ids::TRANSLATE,
        ParamMap::new().with("x", offset_x).with("y", offset_y),
    )?;
    graph.connect(source, PORT_OUTPUT, translate, PORT_INPUT)?;
    Ok(translate)
}

/// Composites the implicit input over a solid background, producing an
/// opaque result.
///
/// The background color feeds the composite's backdrop port, so the
/// executor's source lands on the free layer port and ends up on top.
pub fn flatten_node(graph: &mut Graph, background: Rgba) -> GraphResult<NodeId> {
    let color = graph.add(
        ids::COLOR_SOURCE,
        ParamMap::new().with("color", Rgba::new(background.r, background.g, background.b, 1.0)),
    )?;
    let composite = graph.add(
        BlendMode::Normal.op_id(),
        ParamMap::new().with("discard-alpha", true),
    )?;
    graph.connect(color, PORT_OUTPUT, composite, PORT_INPUT)?;
    Ok(composite)
}

/// Scales the implicit input's alpha by `opacity`, modulated per pixel by
/// an optional mask read through [`buffer_source_node`].
///
/// `opacity` is expected in [0, 1] and is deliberately not clamped here;
/// out-of-range values are the caller's responsibility and produce
/// undefined visual results.
pub fn apply_opacity_node(
    graph: &mut Graph,
    mask: Option<Arc<Buffer>>,
    mask_offset_x: i32,
    mask_offset_y: i32,
    opacity: f64,
) -> GraphResult<NodeId> {
    let node = graph.add(ids::OPACITY, ParamMap::new().with("value", opacity))?;
    if let Some(mask) = mask {
        let mask_source = buffer_source_node(graph, mask, mask_offset_x, mask_offset_y)?;
        graph.connect(mask_source, PORT_OUTPUT, node, PORT_AUX)?;
    }
    Ok(node)
}

/// Creates the composite node for a blend mode.
///
/// The mode-to-operation mapping is a total, pure lookup
/// ([`BlendMode::op_id`]); `linear` selects linear-light arithmetic over
/// the stored perceptual encoding.
pub fn blend_mode_node(graph: &mut Graph, mode: BlendMode, linear: bool) -> GraphResult<NodeId> {
    graph.add(mode.op_id(), ParamMap::new().with("linear", linear))
}
