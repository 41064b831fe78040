//! Separable gaussian blur.
//!
//! Registered as `"gaussian-blur"` with `std-dev-x` / `std-dev-y`
//! parameters. The input apron extends ceil(3 sigma) past the output
//! region on each axis; beyond the source extent the abyss contributes
//! transparent black, matching what an unbounded convolution over a
//! finite image does.
//!
//! Blurring happens on premultiplied pixels so fully transparent
//! neighborhoods cannot bleed their (meaningless) color values into
//! visible ones.

use crate::ids;
use pixelgraph_core::{Rect, Tile};
use pixelgraph_graph::{
    OpError, OpRegistry, OpSpec, ParamMap, PixelOp, PortDef, RenderInputs, PORT_INPUT,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

/// Two-pass gaussian blur with independent std deviations per axis.
pub struct GaussianBlurOp {
    weights_x: Vec<f32>,
    weights_y: Vec<f32>,
}

impl GaussianBlurOp {
    fn new(std_dev_x: f64, std_dev_y: f64) -> Result<Self, OpError> {
        if !std_dev_x.is_finite() || !std_dev_y.is_finite() || std_dev_x < 0.0 || std_dev_y < 0.0 {
            return Err(OpError::InvalidParameter(format!(
                "std-dev must be finite and non-negative, got ({std_dev_x}, {std_dev_y})"
            )));
        }
        let op = Self {
            weights_x: gaussian_weights(std_dev_x),
            weights_y: gaussian_weights(std_dev_y),
        };
        debug!(
            radius_x = op.radius_x(),
            radius_y = op.radius_y(),
            "gaussian kernel built"
        );
        Ok(op)
    }

    fn radius_x(&self) -> i32 {
        (self.weights_x.len() / 2) as i32
    }

    fn radius_y(&self) -> i32 {
        (self.weights_y.len() / 2) as i32
    }
}

/// Normalized gaussian taps for offsets -r..=r with r = ceil(3 sigma).
fn gaussian_weights(std_dev: f64) -> Vec<f32> {
    if std_dev <= 0.0 {
        return vec![1.0];
    }
    let radius = (std_dev * 3.0).ceil() as i32;
    let denom = 2.0 * std_dev * std_dev;
    let mut weights: Vec<f32> = (-radius..=radius)
        .map(|k| (-(k as f64 * k as f64) / denom).exp() as f32)
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

impl PixelOp for GaussianBlurOp {
    fn required_rect(&self, _port: &str, out: Rect) -> Rect {
        out.grow_xy(self.radius_x(), self.radius_y())
    }

    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        let out_rect = out.rect();
        let in_rect = input.rect();
        let rx = self.radius_x();
        let ry = self.radius_y();

        // premultiplied copy of the input
        let mut pre = input.pixels().to_vec();
        for px in pre.chunks_exact_mut(4) {
            px[0] *= px[3];
            px[1] *= px[3];
            px[2] *= px[3];
        }

        // Horizontal pass: output width, input height
        let temp_w = out_rect.width as usize;
        let temp_h = in_rect.height as usize;
        let in_w = in_rect.width as usize;
        let mut temp = vec![0.0f32; temp_w * temp_h * 4];

        let hrow = |row: usize, out_row: &mut [f32]| {
            let in_row = &pre[row * in_w * 4..(row + 1) * in_w * 4];
            for col in 0..temp_w {
                // out column col maps to input column col + rx
                let center = col + rx as usize;
                let mut acc = [0.0f32; 4];
                for (k, w) in self.weights_x.iter().enumerate() {
                    let src = (center + k - rx as usize) * 4;
                    for c in 0..4 {
                        acc[c] += in_row[src + c] * w;
                    }
                }
                out_row[col * 4..col * 4 + 4].copy_from_slice(&acc);
            }
        };

        #[cfg(feature = "parallel")]
        temp.par_chunks_exact_mut(temp_w * 4)
            .enumerate()
            .for_each(|(row, out_row)| hrow(row, out_row));
        #[cfg(not(feature = "parallel"))]
        temp.chunks_exact_mut(temp_w * 4)
            .enumerate()
            .for_each(|(row, out_row)| hrow(row, out_row));

        // Vertical pass into the output, then unpremultiply
        let out_w = out_rect.width as usize;
        let vrow = |row: usize, out_row: &mut [f32]| {
            let center = row + ry as usize;
            for col in 0..out_w {
                let mut acc = [0.0f32; 4];
                for (k, w) in self.weights_y.iter().enumerate() {
                    let src = ((center + k - ry as usize) * temp_w + col) * 4;
                    for c in 0..4 {
                        acc[c] += temp[src + c] * w;
                    }
                }
                if acc[3] > f32::EPSILON {
                    acc[0] /= acc[3];
                    acc[1] /= acc[3];
                    acc[2] /= acc[3];
                } else {
                    acc = [0.0; 4];
                }
                out_row[col * 4..col * 4 + 4].copy_from_slice(&acc);
            }
        };

        #[cfg(feature = "parallel")]
        out.pixels_mut()
            .par_chunks_exact_mut(out_w * 4)
            .enumerate()
            .for_each(|(row, out_row)| vrow(row, out_row));
        #[cfg(not(feature = "parallel"))]
        out.pixels_mut()
            .chunks_exact_mut(out_w * 4)
            .enumerate()
            .for_each(|(row, out_row)| vrow(row, out_row));

        Ok(())
    }
}

fn build_gaussian_blur(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(GaussianBlurOp::new(
        params.float_or("std-dev-x", 1.0)?,
        params.float_or("std-dev-y", 1.0)?,
    )?))
}

pub(crate) fn register(reg: &mut OpRegistry) {
    reg.register(
        ids::GAUSSIAN_BLUR,
        OpSpec {
            input_ports: const { &[PortDef::required(PORT_INPUT)] },
            build: build_gaussian_blur,
        },
    );
}
