//! Geometric operations: axis-aligned scale and 3x3 matrix transform.
//!
//! Both sample the input through an inverse mapping: each output pixel
//! center is mapped back into source space and interpolated there. The
//! required input region is the mapped bounding box of the output region,
//! padded by the interpolation support.

use crate::ids;
use glam::{Mat3, Vec3};
use pixelgraph_core::{Rect, Tile};
use pixelgraph_graph::{
    OpError, OpRegistry, OpSpec, ParamMap, PixelOp, PortDef, RenderInputs, PORT_INPUT,
};

/// Interpolation filter used when resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Nearest neighbor, hard edges.
    Nearest,
    /// Bilinear.
    #[default]
    Linear,
    /// Catmull-Rom bicubic.
    Cubic,
}

impl Interpolation {
    /// Parameter-string name of the filter.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Cubic => "cubic",
        }
    }

    /// Parses a filter name, defaulting unknown names to `Linear`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "nearest" => Self::Nearest,
            "cubic" => Self::Cubic,
            _ => Self::Linear,
        }
    }

    /// Taps reach this many pixels from the sample point.
    const fn support(self) -> i32 {
        match self {
            Self::Nearest => 0,
            Self::Linear => 1,
            Self::Cubic => 2,
        }
    }
}

/// Samples the tile at a continuous source coordinate.
///
/// Pixel (i, j) is taken to cover [i, i+1) x [j, j+1) with its center at
/// (i+0.5, j+0.5). Linear and cubic filtering accumulate premultiplied so
/// transparent neighbors cannot tint the result.
fn sample(tile: &Tile, fx: f32, fy: f32, filter: Interpolation) -> [f32; 4] {
    match filter {
        Interpolation::Nearest => tile.pixel(fx.floor() as i32, fy.floor() as i32),
        Interpolation::Linear => {
            let u = fx - 0.5;
            let v = fy - 0.5;
            let x0 = u.floor();
            let y0 = v.floor();
            let du = u - x0;
            let dv = v - y0;
            let mut acc = [0.0f32; 4];
            for (dy, wy) in [(0, 1.0 - dv), (1, dv)] {
                for (dx, wx) in [(0, 1.0 - du), (1, du)] {
                    let px = tile.pixel(x0 as i32 + dx, y0 as i32 + dy);
                    let w = wx * wy;
                    acc[0] += px[0] * px[3] * w;
                    acc[1] += px[1] * px[3] * w;
                    acc[2] += px[2] * px[3] * w;
                    acc[3] += px[3] * w;
                }
            }
            unpremultiply(acc)
        }
        Interpolation::Cubic => {
            let u = fx - 0.5;
            let v = fy - 0.5;
            let x0 = u.floor();
            let y0 = v.floor();
            let du = u - x0;
            let dv = v - y0;
            let wx = catmull_rom_weights(du);
            let wy = catmull_rom_weights(dv);
            let mut acc = [0.0f32; 4];
            for (j, wyj) in wy.iter().enumerate() {
                for (i, wxi) in wx.iter().enumerate() {
                    let px = tile.pixel(x0 as i32 + i as i32 - 1, y0 as i32 + j as i32 - 1);
                    let w = wxi * wyj;
                    acc[0] += px[0] * px[3] * w;
                    acc[1] += px[1] * px[3] * w;
                    acc[2] += px[2] * px[3] * w;
                    acc[3] += px[3] * w;
                }
            }
            acc[3] = acc[3].clamp(0.0, 1.0);
            unpremultiply(acc)
        }
    }
}

#[inline]
fn unpremultiply(mut px: [f32; 4]) -> [f32; 4] {
    if px[3] > f32::EPSILON {
        px[0] = (px[0] / px[3]).clamp(0.0, 1.0);
        px[1] = (px[1] / px[3]).clamp(0.0, 1.0);
        px[2] = (px[2] / px[3]).clamp(0.0, 1.0);
    } else {
        px = [0.0; 4];
    }
    px
}

/// Catmull-Rom weights for the four taps around fractional offset `t`.
fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

/// Bounding rect of a set of continuous points, padded by `support`.
fn source_bounds(points: &[(f32, f32)], support: i32) -> Rect {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for (x, y) in points {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(*x);
        max_y = max_y.max(*y);
    }
    let x0 = min_x.floor() as i32 - support - 1;
    let y0 = min_y.floor() as i32 - support - 1;
    let x1 = max_x.ceil() as i32 + support + 1;
    let y1 = max_y.ceil() as i32 + support + 1;
    Rect::new(x0, y0, x1 - x0, y1 - y0)
}

/// Axis-aligned scaling by independent x/y factors about the origin.
pub struct ScaleOp {
    x: f32,
    y: f32,
    filter: Interpolation,
}

impl ScaleOp {
    #[inline]
    fn to_source(&self, ox: f32, oy: f32) -> (f32, f32) {
        (ox / self.x, oy / self.y)
    }
}

impl PixelOp for ScaleOp {
    fn required_rect(&self, _port: &str, out: Rect) -> Rect {
        let corners = [
            self.to_source(out.x as f32, out.y as f32),
            self.to_source(out.right() as f32, out.y as f32),
            self.to_source(out.x as f32, out.bottom() as f32),
            self.to_source(out.right() as f32, out.bottom() as f32),
        ];
        source_bounds(&corners, self.filter.support())
    }

    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        let rect = out.rect();
        for row in 0..rect.height {
            for col in 0..rect.width {
                let (sx, sy) = self.to_source(
                    (rect.x + col) as f32 + 0.5,
                    (rect.y + row) as f32 + 0.5,
                );
                let px = sample(input, sx, sy, self.filter);
                let off = (row as usize * rect.width as usize + col as usize) * 4;
                out.pixels_mut()[off..off + 4].copy_from_slice(&px);
            }
        }
        Ok(())
    }
}

fn build_scale(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    let x = params.float_or("x", 1.0)? as f32;
    let y = params.float_or("y", 1.0)? as f32;
    if !(x.is_finite() && y.is_finite()) || x <= 0.0 || y <= 0.0 {
        return Err(OpError::InvalidParameter(format!(
            "scale factors must be positive and finite, got ({x}, {y})"
        )));
    }
    Ok(Box::new(ScaleOp {
        x,
        y,
        filter: Interpolation::from_name(params.str_or("filter", "linear")?),
    }))
}

/// Projective transform by a 3x3 matrix mapping source to destination.
pub struct TransformOp {
    inverse: Mat3,
    filter: Interpolation,
}

impl TransformOp {
    #[inline]
    fn to_source(&self, ox: f32, oy: f32) -> (f32, f32) {
        let v = self.inverse * Vec3::new(ox, oy, 1.0);
        if v.z.abs() <= f32::EPSILON {
            (f32::NAN, f32::NAN)
        } else {
            (v.x / v.z, v.y / v.z)
        }
    }
}

impl PixelOp for TransformOp {
    fn required_rect(&self, _port: &str, out: Rect) -> Rect {
        let corners = [
            self.to_source(out.x as f32, out.y as f32),
            self.to_source(out.right() as f32, out.y as f32),
            self.to_source(out.x as f32, out.bottom() as f32),
            self.to_source(out.right() as f32, out.bottom() as f32),
        ];
        if corners.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            // Degenerate mapping for this region; nothing sensible to pull
            return Rect::default();
        }
        source_bounds(&corners, self.filter.support())
    }

    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let Some(input) = inputs.get(PORT_INPUT) else {
            return Ok(());
        };
        let rect = out.rect();
        for row in 0..rect.height {
            for col in 0..rect.width {
                let (sx, sy) = self.to_source(
                    (rect.x + col) as f32 + 0.5,
                    (rect.y + row) as f32 + 0.5,
                );
                let px = if sx.is_finite() && sy.is_finite() {
                    sample(input, sx, sy, self.filter)
                } else {
                    [0.0; 4]
                };
                let off = (row as usize * rect.width as usize + col as usize) * 4;
                out.pixels_mut()[off..off + 4].copy_from_slice(&px);
            }
        }
        Ok(())
    }
}

fn build_transform(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
    let matrix = params.matrix("matrix")?;
    if matrix.determinant().abs() <= f32::EPSILON {
        return Err(OpError::InvalidParameter(
            "transform matrix is not invertible".into(),
        ));
    }
    Ok(Box::new(TransformOp {
        inverse: matrix.inverse(),
        filter: Interpolation::from_name(params.str_or("filter", "linear")?),
    }))
}

pub(crate) fn register(reg: &mut OpRegistry) {
    reg.register(
        ids::SCALE,
        OpSpec {
            input_ports: const { &[PortDef::required(PORT_INPUT)] },
            build: build_scale,
        },
    );
    reg.register(
        ids::TRANSFORM,
        OpSpec {
            input_ports: const { &[PortDef::required(PORT_INPUT)] },
            build: build_transform,
        },
    );
}
