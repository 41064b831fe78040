//! Simple point operations: invert, threshold, set-alpha.

use crate::ids;
use pixelgraph_core::Tile;
use pixelgraph_graph::{
    OpError, OpRegistry, OpSpec, ParamMap, PixelOp, PortDef, RenderInputs, PORT_INPUT,
};

/// Inverts the color channels, leaving alpha untouched.
pub struct InvertOp;

impl PixelOp for InvertOp {
    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        out.pixels_mut().copy_from_slice(input.pixels());
        for px in out.pixels_mut().chunks_exact_mut(4) {
            px[0] = 1.0 - px[0];
            px[1] = 1.0 - px[1];
            px[2] = 1.0 - px[2];
        }
        Ok(())
    }
}

fn build_invert(_params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(InvertOp))
}

/// Maps pixels to black or white by comparing luma against a threshold.
pub struct ThresholdOp {
    value: f32,
}

impl PixelOp for ThresholdOp {
    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        out.pixels_mut().copy_from_slice(input.pixels());
        for px in out.pixels_mut().chunks_exact_mut(4) {
            let luma = 0.2126 * px[0] + 0.7152 * px[1] + 0.0722 * px[2];
            let v = if luma >= self.value { 1.0 } else { 0.0 };
            px[0] = v;
            px[1] = v;
            px[2] = v;
        }
        Ok(())
    }
}

fn build_threshold(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(ThresholdOp {
        value: params.float_or("value", 0.5)? as f32,
    }))
}

/// Replaces alpha with a constant.
pub struct SetAlphaOp {
    value: f32,
}

impl PixelOp for SetAlphaOp {
    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        out.pixels_mut().copy_from_slice(input.pixels());
        for px in out.pixels_mut().chunks_exact_mut(4) {
            px[3] = self.value;
        }
        Ok(())
    }
}

fn build_set_alpha(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(SetAlphaOp {
        value: params.float_or("value", 1.0)? as f32,
    }))
}

const POINT_PORTS: &[PortDef] = &[PortDef::required(PORT_INPUT)];

pub(crate) fn register(reg: &mut OpRegistry) {
    reg.register(
        ids::INVERT,
        OpSpec {
            input_ports: POINT_PORTS,
            build: build_invert,
        },
    );
    reg.register(
        ids::THRESHOLD,
        OpSpec {
            input_ports: POINT_PORTS,
            build: build_threshold,
        },
    );
    reg.register(
        ids::SET_ALPHA,
        OpSpec {
            input_ports: POINT_PORTS,
            build: build_set_alpha,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pixelgraph_core::Rect;

    fn tile_of(px: [f32; 4]) -> Tile {
        let mut t = Tile::new(Rect::from_size(1, 1));
        t.pixels_mut().copy_from_slice(&px);
        t
    }

    #[test]
    fn test_invert() {
        let input = tile_of([0.25, 0.5, 1.0, 0.8]);
        let mut out = Tile::new(Rect::from_size(1, 1));
        InvertOp
            .render(&RenderInputs::new(vec![(PORT_INPUT, &input)]), &mut out)
            .unwrap();
        let px = out.pixel(0, 0);
        assert_relative_eq!(px[0], 0.75);
        assert_relative_eq!(px[1], 0.5);
        assert_relative_eq!(px[2], 0.0);
        assert_relative_eq!(px[3], 0.8);
    }

    #[test]
    fn test_threshold() {
        let dark = tile_of([0.1, 0.1, 0.1, 1.0]);
        let light = tile_of([0.9, 0.9, 0.9, 1.0]);
        let op = ThresholdOp { value: 0.5 };
        let mut out = Tile::new(Rect::from_size(1, 1));
        op.render(&RenderInputs::new(vec![(PORT_INPUT, &dark)]), &mut out)
            .unwrap();
        assert_relative_eq!(out.pixel(0, 0)[0], 0.0);
        op.render(&RenderInputs::new(vec![(PORT_INPUT, &light)]), &mut out)
            .unwrap();
        assert_relative_eq!(out.pixel(0, 0)[0], 1.0);
    }

    #[test]
    fn test_set_alpha() {
        let input = tile_of([0.3, 0.4, 0.5, 0.1]);
        let op = SetAlphaOp { value: 0.9 };
        let mut out = Tile::new(Rect::from_size(1, 1));
        op.render(&RenderInputs::new(vec![(PORT_INPUT, &input)]), &mut out)
            .unwrap();
        assert_relative_eq!(out.pixel(0, 0)[3], 0.9);
        assert_relative_eq!(out.pixel(0, 0)[0], 0.3);
    }
}
