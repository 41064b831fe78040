//! Opacity scaling with an optional per-pixel mask.
//!
//! Registered as `"opacity"`. The input's alpha is multiplied by a
//! constant `value`; when a mask is connected on `aux`, each pixel is
//! further modulated by the mask's gray level. The opacity value is taken
//! as-is - range validity is the caller's contract.

use crate::ids;
use pixelgraph_core::Tile;
use pixelgraph_graph::{
    OpError, OpRegistry, OpSpec, ParamMap, PixelOp, PortDef, RenderInputs, PORT_AUX, PORT_INPUT,
};

/// Scales input alpha by `value`, modulated by an optional mask.
pub struct OpacityOp {
    value: f32,
}

impl PixelOp for OpacityOp {
    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        let mask = inputs.get(PORT_AUX);
        let rect = out.rect();

        out.pixels_mut().copy_from_slice(input.pixels());
        for row in 0..rect.height {
            let y = rect.y + row;
            for col in 0..rect.width {
                let x = rect.x + col;
                let mut factor = self.value;
                if let Some(mask) = mask {
                    // Gray masks decode with equal channels; red carries
                    // the coverage value
                    factor *= mask.pixel(x, y)[0];
                }
                let off = (row as usize * rect.width as usize + col as usize) * 4 + 3;
                out.pixels_mut()[off] *= factor;
            }
        }
        Ok(())
    }
}

fn build_opacity(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(OpacityOp {
        value: params.float_or("value", 1.0)? as f32,
    }))
}

pub(crate) fn register(reg: &mut OpRegistry) {
    reg.register(
        ids::OPACITY,
        OpSpec {
            input_ports: const { &[PortDef::required(PORT_INPUT), PortDef::optional(PORT_AUX)] },
            build: build_opacity,
        },
    );
}
