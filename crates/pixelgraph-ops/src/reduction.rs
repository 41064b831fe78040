//! Per-channel bit-depth reduction with optional dithering.
//!
//! Registered as `"color-reduction"`. Each channel is quantized to
//! `2^bits` levels; the dither strategy decides how quantization error is
//! distributed. Both position-based strategies hash the absolute pixel
//! coordinate, so results do not depend on how the region was tiled.

use crate::hash::coord_hash;
use crate::ids;
use pixelgraph_core::Tile;
use pixelgraph_graph::{
    OpError, OpRegistry, OpSpec, ParamMap, PixelOp, PortDef, RenderInputs, PORT_INPUT,
};

/// How quantization error is distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// Plain rounding to the nearest level.
    #[default]
    None,
    /// Ordered dithering against an 8x8 Bayer matrix.
    Bayer,
    /// Blue-ish noise from a coordinate hash.
    Random,
}

impl DitherMode {
    /// Parameter-string name of the mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bayer => "bayer",
            Self::Random => "random",
        }
    }

    /// Parses a mode name, defaulting unknown names to `None`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "bayer" => Self::Bayer,
            "random" => Self::Random,
            _ => Self::None,
        }
    }
}

/// 8x8 Bayer threshold matrix, values 0..64.
const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Quantizes channels to the configured bit depths.
pub struct ColorReductionOp {
    levels: [f32; 4],
    dither: DitherMode,
    seed: u32,
}

impl ColorReductionOp {
    fn new(bits: [i64; 4], dither: DitherMode, seed: u32) -> Result<Self, OpError> {
        let mut levels = [0.0f32; 4];
        for (i, b) in bits.iter().enumerate() {
            if !(1..=8).contains(b) {
                return Err(OpError::InvalidParameter(format!(
                    "bit depth must be in 1..=8, got {b}"
                )));
            }
            levels[i] = ((1u32 << b) - 1) as f32;
        }
        Ok(Self {
            levels,
            dither,
            seed,
        })
    }

    #[inline]
    fn quantize(&self, v: f32, channel: usize, x: i32, y: i32) -> f32 {
        let levels = self.levels[channel];
        let offset = match self.dither {
            DitherMode::None => 0.5,
            DitherMode::Bayer => {
                let cell =
                    BAYER_8X8[y.rem_euclid(8) as usize][x.rem_euclid(8) as usize] as f32;
                (cell + 0.5) / 64.0
            }
            DitherMode::Random => {
                coord_hash(x, y, self.seed.wrapping_add(channel as u32))
            }
        };
        ((v.clamp(0.0, 1.0) * levels + offset).floor() / levels).clamp(0.0, 1.0)
    }
}

impl PixelOp for ColorReductionOp {
    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        let rect = out.rect();
        for row in 0..rect.height {
            let y = rect.y + row;
            for col in 0..rect.width {
                let x = rect.x + col;
                let px = input.pixel(x, y);
                let off = (row as usize * rect.width as usize + col as usize) * 4;
                for c in 0..4 {
                    out.pixels_mut()[off + c] = self.quantize(px[c], c, x, y);
                }
            }
        }
        Ok(())
    }
}

fn build_color_reduction(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    Ok(Box::new(ColorReductionOp::new(
        [
            params.int_or("red-bits", 8)?,
            params.int_or("green-bits", 8)?,
            params.int_or("blue-bits", 8)?,
            params.int_or("alpha-bits", 8)?,
        ],
        DitherMode::from_name(params.str_or("dither", "none")?),
        params.int_or("seed", 0)? as u32,
    )?))
}

pub(crate) fn register(reg: &mut OpRegistry) {
    reg.register(
        ids::COLOR_REDUCTION,
        OpSpec {
            input_ports: const { &[PortDef::required(PORT_INPUT)] },
            build: build_color_reduction,
        },
    );
}
