//! The executor entry points.
//!
//! [`apply_operation`] is the single mechanism every filter goes through:
//! it wraps the caller's root operation with a buffer source and a sink,
//! validates the resulting graph, and evaluates it over the requested
//! region. The `apply_*` convenience functions below build the node for
//! one common operation and delegate.

use crate::cancel::CancellationToken;
use crate::evaluator::Evaluator;
use crate::processor::TileProcessor;
use crate::progress::{ProgressBridge, ProgressSink};
use crate::{EngineError, EngineResult};
use glam::Mat3;
use pixelgraph_core::{Buffer, Rect, Rgba};
use pixelgraph_graph::{Graph, GraphContext, NodeId, ParamMap, PORT_INPUT, PORT_OUTPUT};
use pixelgraph_ops::nodes::{apply_opacity_node, flatten_node};
use pixelgraph_ops::{ids, DitherMode, Interpolation};
use std::sync::Arc;
use tracing::debug;

/// Evaluates `operation` into `dest_buffer` over `region`.
///
/// The graph is consumed: executor wiring (source and sink adapters) is
/// added to it, it is evaluated once, and dropped. When `src_buffer` is
/// given it is attached to the root operation's first unconnected input
/// port, so pre-built subgraphs that already feed some ports (a flatten
/// node's backdrop, an opacity node's mask) receive the source on the
/// port they left free.
///
/// `region` defaults to the destination's full extent. A zero-area region
/// is a no-op success. Precondition violations - region out of bounds,
/// unknown operations, bad parameters, unconnected required ports - fail
/// before any tile is processed and leave the destination untouched.
///
/// With a progress sink the region is processed in row-major tiles and
/// `completed_area / total_area` is reported after each; the final report
/// is exactly 1.0. Without one the region is evaluated in a single blit.
///
/// Source and destination may only be the same underlying allocation for
/// operations documented as in-place safe; the engine does not check
/// aliasing.
#[allow(clippy::too_many_arguments)]
pub fn apply_operation(
    src_buffer: Option<&Arc<Buffer>>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    graph: Graph,
    operation: NodeId,
    dest_buffer: &mut Buffer,
    region: Option<Rect>,
) -> EngineResult<()> {
    apply_operation_cancellable(
        src_buffer,
        progress,
        label,
        graph,
        operation,
        dest_buffer,
        region,
        &CancellationToken::new(),
    )
}

/// [`apply_operation`] with cooperative cancellation.
///
/// The token is checked at every tile boundary; a tripped token stops
/// evaluation with [`EngineError::Cancelled`]. Tiles already written
/// remain written.
#[allow(clippy::too_many_arguments)]
pub fn apply_operation_cancellable(
    src_buffer: Option<&Arc<Buffer>>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    mut graph: Graph,
    operation: NodeId,
    dest_buffer: &mut Buffer,
    region: Option<Rect>,
    cancel: &CancellationToken,
) -> EngineResult<()> {
    let region = match region {
        Some(rect) => {
            if !dest_buffer.extent().contains_rect(&rect) {
                return Err(EngineError::Region {
                    region: rect,
                    width: dest_buffer.width(),
                    height: dest_buffer.height(),
                });
            }
            rect
        }
        None => dest_buffer.extent(),
    };
    if region.is_empty() {
        return Ok(());
    }

    if let Some(src) = src_buffer {
        let op_id = graph.op_id(operation)?;
        let registry = Arc::clone(graph.registry());
        let spec = registry.spec(op_id)?;
        let mut free_port = None;
        for port in spec.input_ports {
            if graph.producer(operation, port.name)?.is_none() {
                free_port = Some(port.name);
                break;
            }
        }
        let Some(port) = free_port else {
            return Err(EngineError::NoSourcePort {
                op: op_id.to_owned(),
            });
        };
        let src_node = graph.add(
            ids::BUFFER_SOURCE,
            ParamMap::new().with("buffer", Arc::clone(src)),
        )?;
        graph.connect(src_node, PORT_OUTPUT, operation, port)?;
    }

    let sink = graph.add(ids::WRITE_BUFFER, ParamMap::new())?;
    graph.connect(operation, PORT_OUTPUT, sink, PORT_INPUT)?;

    // Preflight: validation plus instantiation of every reachable op
    let evaluator = Evaluator::new(&graph, sink)?;
    debug!(%region, label, "applying operation graph");

    match progress {
        Some(progress) => {
            let mut processor = TileProcessor::new(evaluator, sink, region);
            let mut bridge = ProgressBridge::begin(progress, label);
            loop {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                match processor.work(dest_buffer)? {
                    Some(fraction) => bridge.set_value(fraction),
                    None => break,
                }
            }
        }
        None => {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let tile = evaluator.evaluate(sink, region)?;
            dest_buffer.write_rect(region, tile.pixels())?;
        }
    }
    Ok(())
}

/// Reduces each channel of `src_buffer` to `bits` bits into `dest_buffer`.
pub fn apply_color_reduction(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    bits: i64,
    dither: DitherMode,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = graph.add(
        ids::COLOR_REDUCTION,
        ParamMap::new()
            .with("red-bits", bits)
            .with("green-bits", bits)
            .with("blue-bits", bits)
            .with("alpha-bits", bits)
            .with("dither", dither.name()),
    )?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}

/// Flattens `src_buffer` over a background color into `dest_buffer`.
pub fn apply_flatten(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    background: Rgba,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = flatten_node(&mut graph, background)?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}

/// Feathers by a selection radius.
pub fn apply_feather(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    radius_x: f64,
    radius_y: f64,
) -> EngineResult<()> {
    // radius/3.5 visually matches the legacy region feather
    apply_gaussian_blur(
        ctx,
        src_buffer,
        progress,
        label,
        dest_buffer,
        radius_x / 3.5,
        radius_y / 3.5,
    )
}

/// Gaussian-blurs `src_buffer` into `dest_buffer`.
pub fn apply_gaussian_blur(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    std_dev_x: f64,
    std_dev_y: f64,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = graph.add(
        ids::GAUSSIAN_BLUR,
        ParamMap::new()
            .with("std-dev-x", std_dev_x)
            .with("std-dev-y", std_dev_y),
    )?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}

/// Inverts the colors of `src_buffer` into `dest_buffer`.
pub fn apply_invert(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = graph.add(ids::INVERT, ParamMap::new())?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}

/// Scales `src_buffer`'s opacity into `dest_buffer`, optionally through a
/// mask.
#[allow(clippy::too_many_arguments)]
pub fn apply_opacity(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    mask: Option<&Arc<Buffer>>,
    mask_offset_x: i32,
    mask_offset_y: i32,
    opacity: f64,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = apply_opacity_node(
        &mut graph,
        mask.map(Arc::clone),
        mask_offset_x,
        mask_offset_y,
        opacity,
    )?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}

/// Scales `src_buffer` by (x, y) into `dest_buffer`.
#[allow(clippy::too_many_arguments)]
pub fn apply_scale(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    interpolation: Interpolation,
    x: f64,
    y: f64,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = graph.add(
        ids::SCALE,
        ParamMap::new()
            .with("x", x)
            .with("y", y)
            .with("filter", interpolation.name()),
    )?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}

/// Replaces the alpha channel of `src_buffer` with `value` into
/// `dest_buffer`.
pub fn apply_set_alpha(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    value: f64,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = graph.add(ids::SET_ALPHA, ParamMap::new().with("value", value))?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}

/// Thresholds `src_buffer` to black/white into `dest_buffer`.
pub fn apply_threshold(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    value: f64,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = graph.add(ids::THRESHOLD, ParamMap::new().with("value", value))?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}

/// Transforms `src_buffer` by a 3x3 matrix into `dest_buffer`.
pub fn apply_transform(
    ctx: &GraphContext,
    src_buffer: &Arc<Buffer>,
    progress: Option<&mut dyn ProgressSink>,
    label: &str,
    dest_buffer: &mut Buffer,
    interpolation: Interpolation,
    transform: Mat3,
) -> EngineResult<()> {
    let mut graph = ctx.new_graph();
    let node = graph.add(
        ids::TRANSFORM,
        ParamMap::new()
            .with("matrix", transform)
            .with("filter", interpolation.name()),
    )?;
    apply_operation(Some(src_buffer), progress, label, graph, node, dest_buffer, None)
}
