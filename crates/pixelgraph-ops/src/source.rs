//! Source and sink operations.
//!
//! - `"buffer-source"` reads a region out of a caller-supplied buffer,
//!   decoding to the working format; pixels outside the buffer extent are
//!   transparent black.
//! - `"color-source"` produces an unbounded plane of one solid color.
//! - `"translate"` shifts its input by an integer offset.
//! - `"write-buffer"` is the identity node the executor appends as the
//!   evaluation target; the tile processor writes its output into the
//!   destination buffer.

use crate::ids;
use pixelgraph_core::{Buffer, Rect, Rgba, Tile};
use pixelgraph_graph::{
    OpError, OpRegistry, OpSpec, ParamMap, PixelOp, PortDef, RenderInputs, PORT_INPUT,
};
use std::sync::Arc;

/// Reads tiles out of a shared read-only buffer.
pub struct BufferSourceOp {
    buffer: Arc<Buffer>,
}

impl PixelOp for BufferSourceOp {
    fn render(&self, _inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let rect = out.rect();
        self.buffer.read_rect(rect, out.pixels_mut())?;
        Ok(())
    }
}

fn build_buffer_source(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(BufferSourceOp {
        buffer: params.buffer("buffer")?,
    }))
}

/// Produces a solid color everywhere.
pub struct ColorSourceOp {
    color: Rgba,
}

impl PixelOp for ColorSourceOp {
    fn render(&self, _inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let px = self.color.to_array();
        for chunk in out.pixels_mut().chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        Ok(())
    }
}

fn build_color_source(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(ColorSourceOp {
        color: params.color_or("color", Rgba::TRANSPARENT)?,
    }))
}

/// Shifts the input by (x, y) pixels.
pub struct TranslateOp {
    x: i32,
    y: i32,
}

impl PixelOp for TranslateOp {
    fn required_rect(&self, _port: &str, out: Rect) -> Rect {
        out.translate(-self.x, -self.y)
    }

    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        // Input covers exactly the back-translated output rect, so the
        // payloads line up one to one.
        out.pixels_mut().copy_from_slice(input.pixels());
        Ok(())
    }
}

fn build_translate(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(TranslateOp {
        x: params.int_or("x", 0)? as i32,
        y: params.int_or("y", 0)? as i32,
    }))
}

/// Identity node appended by the executor as the evaluation target.
pub struct WriteBufferOp;

impl PixelOp for WriteBufferOp {
    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        if let Some(input) = inputs.get(PORT_INPUT) {
            out.pixels_mut().copy_from_slice(input.pixels());
        }
        Ok(())
    }
}

fn build_write_buffer(_params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(WriteBufferOp))
}

pub(crate) fn register(reg: &mut OpRegistry) {
    reg.register(
        ids::BUFFER_SOURCE,
        OpSpec {
            input_ports: &[],
            build: build_buffer_source,
        },
    );
    reg.register(
        ids::COLOR_SOURCE,
        OpSpec {
            input_ports: &[],
            build: build_color_source,
        },
    );
    reg.register(
        ids::TRANSLATE,
        OpSpec {
            input_ports: const { &[PortDef::required(PORT_INPUT)] },
            build: build_translate,
        },
    );
    reg.register(
        ids::WRITE_BUFFER,
        OpSpec {
            input_ports: const { &[PortDef::required(PORT_INPUT)] },
            build: build_write_buffer,
        },
    );
}
