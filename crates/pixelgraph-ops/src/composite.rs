//! Blend-mode composite operations.
//!
//! One composite operation exists per blend mode, registered under
//! `"composite-<mode>"`. Each composites its `aux` input (the layer) over
//! its `input` (the backdrop); a missing layer passes the backdrop
//! through, a missing backdrop composites over transparency.
//!
//! The closed [`BlendMode`] enumeration mirrors the classic layer-mode
//! set: arithmetic modes (multiply, screen, addition, ...), HSV/HSL
//! channel swaps (hue, saturation, color, value), the grain pair, and the
//! alpha-manipulating family (dissolve, behind, erase, anti-erase,
//! color-erase, replace).
//!
//! Every mode accepts:
//! - `linear` (bool): blend in linear light instead of the stored
//!   perceptual encoding
//! - `discard-alpha` (bool): force the result opaque (flattening)
//! - `seed` (int): noise seed for dissolve

use crate::hash::coord_hash;
use pixelgraph_core::{linear_to_srgb, srgb_to_linear, Tile};
use pixelgraph_graph::{
    OpConstructor, OpError, OpRegistry, OpSpec, ParamMap, PixelOp, PortDef, RenderInputs,
    PORT_AUX, PORT_INPUT,
};

/// The closed set of blend modes.
///
/// Discriminants match the classic layer-mode enumeration so raw values
/// stored by callers round-trip through [`from_raw`](Self::from_raw).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum BlendMode {
    /// Standard over compositing.
    #[default]
    Normal = 0,
    /// Stochastic per-pixel all-or-nothing coverage.
    Dissolve,
    /// Paints the layer only where the backdrop is transparent.
    Behind,
    /// Darkens by multiplication.
    Multiply,
    /// Lightens by inverse multiplication.
    Screen,
    /// Contrast boost, multiply in shadows and screen in highlights.
    Overlay,
    /// Absolute channel difference.
    Difference,
    /// Clamped channel sum.
    Addition,
    /// Clamped channel difference.
    Subtract,
    /// Channel-wise minimum.
    DarkenOnly,
    /// Channel-wise maximum.
    LightenOnly,
    /// Layer hue with backdrop saturation and value.
    Hue,
    /// Layer saturation with backdrop hue and value.
    Saturation,
    /// Layer hue and saturation with backdrop lightness.
    Color,
    /// Layer value with backdrop hue and saturation.
    Value,
    /// Channel quotient.
    Divide,
    /// Brightens the backdrop toward the layer.
    Dodge,
    /// Darkens the backdrop toward the layer.
    Burn,
    /// Overlay with the roles reversed.
    HardLight,
    /// Gentle dodge/burn.
    SoftLight,
    /// Subtracts the layer around mid-gray.
    GrainExtract,
    /// Adds the layer around mid-gray.
    GrainMerge,
    /// Turns the layer color into transparency in the backdrop.
    ColorErase,
    /// Removes backdrop coverage where the layer covers.
    Erase,
    /// Replaces the backdrop wholesale.
    Replace,
    /// Restores backdrop coverage where the layer covers.
    AntiErase,
}

impl BlendMode {
    /// Every mode, in enumeration order.
    pub const ALL: [BlendMode; 26] = [
        Self::Normal,
        Self::Dissolve,
        Self::Behind,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Difference,
        Self::Addition,
        Self::Subtract,
        Self::DarkenOnly,
        Self::LightenOnly,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Value,
        Self::Divide,
        Self::Dodge,
        Self::Burn,
        Self::HardLight,
        Self::SoftLight,
        Self::GrainExtract,
        Self::GrainMerge,
        Self::ColorErase,
        Self::Erase,
        Self::Replace,
        Self::AntiErase,
    ];

    /// Maps a raw discriminant to a mode, falling back to `Normal` for
    /// anything out of range. Total: never fails.
    pub fn from_raw(raw: i32) -> Self {
        Self::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(Self::Normal)
    }

    /// The registered operation id implementing this mode.
    pub const fn op_id(self) -> &'static str {
        match self {
            Self::Normal => "composite-normal",
            Self::Dissolve => "composite-dissolve",
            Self::Behind => "composite-behind",
            Self::Multiply => "composite-multiply",
            Self::Screen => "composite-screen",
            Self::Overlay => "composite-overlay",
            Self::Difference => "composite-difference",
            Self::Addition => "composite-addition",
            Self::Subtract => "composite-subtract",
            Self::DarkenOnly => "composite-darken-only",
            Self::LightenOnly => "composite-lighten-only",
            Self::Hue => "composite-hue",
            Self::Saturation => "composite-saturation",
            Self::Color => "composite-color",
            Self::Value => "composite-value",
            Self::Divide => "composite-divide",
            Self::Dodge => "composite-dodge",
            Self::Burn => "composite-burn",
            Self::HardLight => "composite-hard-light",
            Self::SoftLight => "composite-soft-light",
            Self::GrainExtract => "composite-grain-extract",
            Self::GrainMerge => "composite-grain-merge",
            Self::ColorErase => "composite-color-erase",
            Self::Erase => "composite-erase",
            Self::Replace => "composite-replace",
            Self::AntiErase => "composite-anti-erase",
        }
    }
}

/// One blend-mode composite, parameterized at construction.
pub struct CompositeOp {
    mode: BlendMode,
    linear: bool,
    discard_alpha: bool,
    seed: u32,
}

impl CompositeOp {
    fn from_params(mode: BlendMode, params: &ParamMap) -> Result<Self, OpError> {
        Ok(Self {
            mode,
            linear: params.bool_or("linear", false)?,
            discard_alpha: params.bool_or("discard-alpha", false)?,
            seed: params.int_or("seed", 0)? as u32,
        })
    }
}

impl PixelOp for CompositeOp {
    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError> {
        let rect = out.rect();
        let backdrop = inputs.get(PORT_INPUT);
        let layer = inputs.get(PORT_AUX);

        for row in 0..rect.height {
            let y = rect.y + row;
            for col in 0..rect.width {
                let x = rect.x + col;
                let mut cb = backdrop.map_or([0.0; 4], |t| t.pixel(x, y));
                let mut cl = layer.map_or([0.0; 4], |t| t.pixel(x, y));

                if self.linear {
                    for c in &mut cb[..3] {
                        *c = srgb_to_linear(*c);
                    }
                    for c in &mut cl[..3] {
                        *c = srgb_to_linear(*c);
                    }
                }

                let mut px = composite_pixel(self.mode, cb, cl, x, y, self.seed);

                if self.linear {
                    for c in &mut px[..3] {
                        *c = linear_to_srgb(*c);
                    }
                }
                if self.discard_alpha {
                    px[3] = 1.0;
                }

                let off = (row as usize * rect.width as usize + col as usize) * 4;
                out.pixels_mut()[off..off + 4].copy_from_slice(&px);
            }
        }
        Ok(())
    }
}

/// Composites one layer pixel over one backdrop pixel.
///
/// Both are straight (unassociated) RGBA; so is the result.
pub fn composite_pixel(
    mode: BlendMode,
    cb: [f32; 4],
    cl: [f32; 4],
    x: i32,
    y: i32,
    seed: u32,
) -> [f32; 4] {
    match mode {
        BlendMode::Dissolve => {
            if coord_hash(x, y, seed) < cl[3] {
                [cl[0], cl[1], cl[2], 1.0]
            } else {
                cb
            }
        }
        BlendMode::Behind => over(cb, cl),
        BlendMode::Erase => [cb[0], cb[1], cb[2], cb[3] * (1.0 - cl[3])],
        BlendMode::AntiErase => [cb[0], cb[1], cb[2], cb[3] + cl[3] * (1.0 - cb[3])],
        BlendMode::Replace => cl,
        BlendMode::ColorErase => color_erase(cb, cl),
        _ => {
            let ab = cb[3];
            let al = cl[3];
            let blended = blend_rgb(mode, [cb[0], cb[1], cb[2]], [cl[0], cl[1], cl[2]]);
            // The blended color only shows where layer and backdrop
            // overlap; elsewhere the respective source shows through.
            let ao = al + ab * (1.0 - al);
            if ao <= f32::EPSILON {
                return [0.0; 4];
            }
            let mut px = [0.0f32; 4];
            for i in 0..3 {
                let cs = (1.0 - ab) * cl[i] + ab * blended[i];
                px[i] = (al * cs + (1.0 - al) * ab * cb[i]) / ao;
            }
            px[3] = ao;
            px
        }
    }
}

/// Straight-alpha Porter-Duff over.
fn over(fg: [f32; 4], bg: [f32; 4]) -> [f32; 4] {
    let ao = fg[3] + bg[3] * (1.0 - fg[3]);
    if ao <= f32::EPSILON {
        return [0.0; 4];
    }
    let mut px = [0.0f32; 4];
    for i in 0..3 {
        px[i] = (fg[i] * fg[3] + bg[i] * bg[3] * (1.0 - fg[3])) / ao;
    }
    px[3] = ao;
    px
}

/// Turns the layer color into transparency in the backdrop.
fn color_erase(cb: [f32; 4], cl: [f32; 4]) -> [f32; 4] {
    let mut alpha = 0.0f32;
    for i in 0..3 {
        let a = if cb[i] > cl[i] {
            (cb[i] - cl[i]) / (1.0 - cl[i]).max(f32::EPSILON)
        } else if cb[i] < cl[i] {
            (cl[i] - cb[i]) / cl[i].max(f32::EPSILON)
        } else {
            0.0
        };
        alpha = alpha.max(a);
    }
    if alpha <= f32::EPSILON {
        return [cb[0], cb[1], cb[2], 0.0];
    }
    let mut px = [0.0f32; 4];
    for i in 0..3 {
        px[i] = ((cb[i] - cl[i]) / alpha + cl[i]).clamp(0.0, 1.0);
    }
    px[3] = cb[3] * alpha;
    px
}

/// Blends opaque color triples according to the mode.
fn blend_rgb(mode: BlendMode, cb: [f32; 3], cl: [f32; 3]) -> [f32; 3] {
    match mode {
        BlendMode::Hue => {
            let (_, sb, vb) = rgb_to_hsv(cb);
            let (hl, sl, _) = rgb_to_hsv(cl);
            if sl <= f32::EPSILON {
                // An achromatic layer has no hue to contribute
                return cb;
            }
            hsv_to_rgb(hl, sb, vb)
        }
        BlendMode::Saturation => {
            let (hb, _, vb) = rgb_to_hsv(cb);
            let (_, sl, _) = rgb_to_hsv(cl);
            hsv_to_rgb(hb, sl, vb)
        }
        BlendMode::Value => {
            let (hb, sb, _) = rgb_to_hsv(cb);
            let (_, _, vl) = rgb_to_hsv(cl);
            hsv_to_rgb(hb, sb, vl)
        }
        BlendMode::Color => {
            let (_, _, lb) = rgb_to_hsl(cb);
            let (hl, sl, _) = rgb_to_hsl(cl);
            hsl_to_rgb(hl, sl, lb)
        }
        _ => {
            let mut px = [0.0f32; 3];
            for i in 0..3 {
                px[i] = blend_channel(mode, cb[i], cl[i]);
            }
            px
        }
    }
}

#[inline]
fn blend_channel(mode: BlendMode, b: f32, l: f32) -> f32 {
    match mode {
        BlendMode::Normal => l,
        BlendMode::Multiply => b * l,
        BlendMode::Screen => 1.0 - (1.0 - b) * (1.0 - l),
        BlendMode::Overlay => {
            if b < 0.5 {
                2.0 * b * l
            } else {
                1.0 - 2.0 * (1.0 - b) * (1.0 - l)
            }
        }
        BlendMode::Difference => (b - l).abs(),
        BlendMode::Addition => (b + l).min(1.0),
        BlendMode::Subtract => (b - l).max(0.0),
        BlendMode::DarkenOnly => b.min(l),
        BlendMode::LightenOnly => b.max(l),
        BlendMode::Divide => (b / l.max(1e-6)).min(1.0),
        BlendMode::Dodge => (b / (1.0 - l).max(1e-6)).min(1.0),
        BlendMode::Burn => (1.0 - (1.0 - b) / l.max(1e-6)).max(0.0),
        BlendMode::HardLight => {
            if l < 0.5 {
                2.0 * b * l
            } else {
                1.0 - 2.0 * (1.0 - b) * (1.0 - l)
            }
        }
        BlendMode::SoftLight => {
            if l < 0.5 {
                b - (1.0 - 2.0 * l) * b * (1.0 - b)
            } else {
                let d = if b < 0.25 {
                    ((16.0 * b - 12.0) * b + 4.0) * b
                } else {
                    b.sqrt()
                };
                b + (2.0 * l - 1.0) * (d - b)
            }
        }
        BlendMode::GrainExtract => (b - l + 0.5).clamp(0.0, 1.0),
        BlendMode::GrainMerge => (b + l - 0.5).clamp(0.0, 1.0),
        // Alpha-family and HSV modes never reach the per-channel path
        _ => l,
    }
}

fn rgb_to_hsv([r, g, b]: [f32; 3]) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let v = max;
    let s = if max <= f32::EPSILON { 0.0 } else { delta / max };
    let h = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    } / 6.0;
    (h, s, v)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let h = (h.rem_euclid(1.0)) * 6.0;
    let i = h.floor();
    let f = h - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i as i32 % 6 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

fn rgb_to_hsl([r, g, b]: [f32; 3]) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;
    if delta <= f32::EPSILON {
        return (0.0, 0.0, l);
    }
    let s = if l < 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };
    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    } / 6.0;
    (h, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s <= f32::EPSILON {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = |t: f32| -> f32 {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0)]
}

macro_rules! composite_ctor {
    ($name:ident, $mode:expr) => {
        fn $name(params: &ParamMap) -> Result<Box<dyn PixelOp>, OpError> {
            Ok(Box::new(CompositeOp::from_params($mode, params)?))
        }
    };
}

composite_ctor!(build_normal, BlendMode::Normal);
composite_ctor!(build_dissolve, BlendMode::Dissolve);
composite_ctor!(build_behind, BlendMode::Behind);
composite_ctor!(build_multiply, BlendMode::Multiply);
composite_ctor!(build_screen, BlendMode::Screen);
composite_ctor!(build_overlay, BlendMode::Overlay);
composite_ctor!(build_difference, BlendMode::Difference);
composite_ctor!(build_addition, BlendMode::Addition);
composite_ctor!(build_subtract, BlendMode::Subtract);
composite_ctor!(build_darken_only, BlendMode::DarkenOnly);
composite_ctor!(build_lighten_only, BlendMode::LightenOnly);
composite_ctor!(build_hue, BlendMode::Hue);
composite_ctor!(build_saturation, BlendMode::Saturation);
composite_ctor!(build_color, BlendMode::Color);
composite_ctor!(build_value, BlendMode::Value);
composite_ctor!(build_divide, BlendMode::Divide);
composite_ctor!(build_dodge, BlendMode::Dodge);
composite_ctor!(build_burn, BlendMode::Burn);
composite_ctor!(build_hard_light, BlendMode::HardLight);
composite_ctor!(build_soft_light, BlendMode::SoftLight);
composite_ctor!(build_grain_extract, BlendMode::GrainExtract);
composite_ctor!(build_grain_merge, BlendMode::GrainMerge);
composite_ctor!(build_color_erase, BlendMode::ColorErase);
composite_ctor!(build_erase, BlendMode::Erase);
composite_ctor!(build_replace, BlendMode::Replace);
composite_ctor!(build_anti_erase, BlendMode::AntiErase);

const COMPOSITE_PORTS: &[PortDef] = &[PortDef::optional(PORT_INPUT), PortDef::optional(PORT_AUX)];

pub(crate) fn register(reg: &mut OpRegistry) {
    let ctors: [(BlendMode, OpConstructor); 26] = [
        (BlendMode::Normal, build_normal),
        (BlendMode::Dissolve, build_dissolve),
        (BlendMode::Behind, build_behind),
        (BlendMode::Multiply, build_multiply),
        (BlendMode::Screen, build_screen),
        (BlendMode::Overlay, build_overlay),
        (BlendMode::Difference, build_difference),
        (BlendMode::Addition, build_addition),
        (BlendMode::Subtract, build_subtract),
        (BlendMode::DarkenOnly, build_darken_only),
        (BlendMode::LightenOnly, build_lighten_only),
        (BlendMode::Hue, build_hue),
        (BlendMode::Saturation, build_saturation),
        (BlendMode::Color, build_color),
        (BlendMode::Value, build_value),
        (BlendMode::Divide, build_divide),
        (BlendMode::Dodge, build_dodge),
        (BlendMode::Burn, build_burn),
        (BlendMode::HardLight, build_hard_light),
        (BlendMode::SoftLight, build_soft_light),
        (BlendMode::GrainExtract, build_grain_extract),
        (BlendMode::GrainMerge, build_grain_merge),
        (BlendMode::ColorErase, build_color_erase),
        (BlendMode::Erase, build_erase),
        (BlendMode::Replace, build_replace),
        (BlendMode::AntiErase, build_anti_erase),
    ];
    for (mode, build) in ctors {
        reg.register(
            mode.op_id(),
            OpSpec {
                input_ports: COMPOSITE_PORTS,
                build,
            },
        );
    }
}
