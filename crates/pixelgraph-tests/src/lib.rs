//! Integration tests for the pixelgraph crates.
//!
//! This crate contains end-to-end tests that exercise the executor,
//! builders, and built-in operations together, covering the engine's
//! observable contract: identity copies, determinism, progress reporting,
//! nested-progress sharing, cancellation, and the flatten/opacity
//! compositing scenarios.

pub mod progress;

use pixelgraph_core::{Buffer, PixelFormat, Rgba};
use std::sync::Arc;

/// Builds a solid-color RGBA buffer.
pub fn solid(width: u32, height: u32, color: Rgba) -> Arc<Buffer> {
    let mut buf = Buffer::new(width, height, PixelFormat::RGBA_U8);
    buf.fill(color);
    Arc::new(buf)
}

/// Builds a gradient RGBA buffer with per-pixel distinct values.
pub fn gradient(width: u32, height: u32) -> Arc<Buffer> {
    let mut buf = Buffer::new(width, height, PixelFormat::RGBA_U8);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let r = (x as f32 + 0.5) / width as f32;
            let g = (y as f32 + 0.5) / height as f32;
            let b = ((x ^ y) & 0xff) as f32 / 255.0;
            buf.set_pixel(x, y, Rgba::new(r, g, b, 1.0)).unwrap();
        }
    }
    Arc::new(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingProgress;
    use approx::assert_relative_eq;
    use pixelgraph_core::Rect;
    use pixelgraph_engine::{
        apply_flatten, apply_gaussian_blur, apply_opacity, apply_operation, EngineError,
    };
    use pixelgraph_graph::ParamMap;
    use pixelgraph_ops::nodes::{blend_mode_node, buffer_source_node};
    use pixelgraph_ops::{builtin_context, ids, BlendMode};

    /// A normal composite with only the source attached passes the source
    /// through untouched: pixel-identical inside the region, untouched
    /// outside it.
    #[test]
    fn test_identity_copy_respects_region() {
        let ctx = builtin_context();
        let src = gradient(16, 16);
        let sentinel = Rgba::new(0.0, 1.0, 0.0, 1.0);
        let mut dest = Buffer::new(16, 16, PixelFormat::RGBA_U8);
        dest.fill(sentinel);

        let region = Rect::new(4, 4, 8, 8);
        let mut graph = ctx.new_graph();
        let node = blend_mode_node(&mut graph, BlendMode::Normal, false).unwrap();
        apply_operation(Some(&src), None, "Copy", graph, node, &mut dest, Some(region)).unwrap();

        for y in 0..16 {
            for x in 0..16 {
                if region.contains(x, y) {
                    assert_eq!(dest.pixel(x, y), src.pixel(x, y), "inside at ({x},{y})");
                } else {
                    assert_eq!(dest.pixel(x, y), sentinel, "outside at ({x},{y})");
                }
            }
        }
    }

    /// Flattening an already-opaque buffer twice equals flattening it
    /// once.
    #[test]
    fn test_flatten_idempotent_on_opaque() {
        let ctx = builtin_context();
        let background = Rgba::new(0.2, 0.4, 0.6, 1.0);
        let src = gradient(12, 12);

        let mut once = Buffer::new(12, 12, PixelFormat::RGBA_U8);
        apply_flatten(&ctx, &src, None, "Flatten", &mut once, background).unwrap();

        let mut twice = Buffer::new(12, 12, PixelFormat::RGBA_U8);
        apply_flatten(&ctx, &Arc::new(once.clone()), None, "Flatten", &mut twice, background)
            .unwrap();

        assert_eq!(once.bytes(), twice.bytes());
    }

    /// Two runs with identical inputs and no progress sink are
    /// byte-identical.
    #[test]
    fn test_determinism() {
        let ctx = builtin_context();
        let src = gradient(20, 20);

        let mut a = Buffer::new(20, 20, PixelFormat::RGBA_U8);
        let mut b = Buffer::new(20, 20, PixelFormat::RGBA_U8);
        apply_gaussian_blur(&ctx, &src, None, "Blur", &mut a, 2.0, 2.0).unwrap();
        apply_gaussian_blur(&ctx, &src, None, "Blur", &mut b, 2.0, 2.0).unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    /// Tiled and single-blit evaluation agree: progress reporting changes
    /// the partitioning, never the pixels.
    #[test]
    fn test_tiling_invisible_in_output() {
        let ctx = builtin_context();
        let src = gradient(300, 130);

        let mut blit = Buffer::new(300, 130, PixelFormat::RGBA_U8);
        apply_gaussian_blur(&ctx, &src, None, "Blur", &mut blit, 1.5, 1.5).unwrap();

        let mut progress = RecordingProgress::default();
        let mut tiled = Buffer::new(300, 130, PixelFormat::RGBA_U8);
        apply_gaussian_blur(&ctx, &src, Some(&mut progress), "Blur", &mut tiled, 1.5, 1.5)
            .unwrap();

        assert_eq!(blit.bytes(), tiled.bytes());
    }

    /// Zero-area region succeeds without touching the destination.
    #[test]
    fn test_zero_area_region() {
        let ctx = builtin_context();
        let src = solid(8, 8, Rgba::WHITE);
        let mut dest = Buffer::new(8, 8, PixelFormat::RGBA_U8);
        let before = dest.bytes().to_vec();

        let mut graph = ctx.new_graph();
        let node = graph.add(ids::INVERT, ParamMap::new()).unwrap();
        apply_operation(
            Some(&src),
            None,
            "Invert",
            graph,
            node,
            &mut dest,
            Some(Rect::new(3, 3, 0, 0)),
        )
        .unwrap();
        assert_eq!(dest.bytes(), &before[..]);
    }

    /// Every enumerated blend mode - and the fallback for out-of-range
    /// raw values - builds a node that evaluates successfully.
    #[test]
    fn test_blend_mode_totality_through_engine() {
        let ctx = builtin_context();
        let src = solid(2, 2, Rgba::new(0.6, 0.3, 0.1, 0.8));
        for raw in -1..30 {
            let mode = BlendMode::from_raw(raw);
            let mut dest = Buffer::new(2, 2, PixelFormat::RGBA_U8);
            let mut graph = ctx.new_graph();
            let node = blend_mode_node(&mut graph, mode, raw % 2 == 0).unwrap();
            apply_operation(Some(&src), None, mode.op_id(), graph, node, &mut dest, None)
                .unwrap_or_else(|e| panic!("{} failed: {e}", mode.op_id()));
        }
    }

    /// Fully opaque red flattened over a blue background stays red.
    #[test]
    fn test_flatten_scenario_red_over_blue() {
        let ctx = builtin_context();
        let src = solid(4, 4, Rgba::new(1.0, 0.0, 0.0, 1.0));
        let mut dest = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        apply_flatten(&ctx, &src, None, "Flatten", &mut dest, Rgba::new(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let px = dest.pixel(x, y);
                assert_eq!((px.r, px.g, px.b, px.a), (1.0, 0.0, 0.0, 1.0));
            }
        }
    }

    /// Half-transparent flattens blend: half-covered white over black is
    /// mid-gray.
    #[test]
    fn test_flatten_blends_partial_alpha() {
        let ctx = builtin_context();
        let src = solid(4, 4, Rgba::new(1.0, 1.0, 1.0, 0.5));
        let mut dest = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        apply_flatten(&ctx, &src, None, "Flatten", &mut dest, Rgba::BLACK).unwrap();
        let px = dest.pixel(2, 2);
        assert_relative_eq!(px.r, 0.5, epsilon = 0.01);
        assert_relative_eq!(px.a, 1.0);
    }

    /// Masked half opacity over a full mask yields mid-gray once the
    /// result lands on a black backdrop; a zero mask leaves the backdrop
    /// black.
    #[test]
    fn test_masked_opacity_scenario() {
        let ctx = builtin_context();
        let white = solid(4, 4, Rgba::WHITE);

        // full-coverage mask
        let full_mask = solid(4, 4, Rgba::WHITE);
        let mut faded = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        apply_opacity(&ctx, &white, None, "Opacity", &mut faded, Some(&full_mask), 0, 0, 0.5)
            .unwrap();
        let mut over_black = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        apply_flatten(&ctx, &Arc::new(faded), None, "Flatten", &mut over_black, Rgba::BLACK)
            .unwrap();
        assert_relative_eq!(over_black.pixel(1, 1).r, 0.5, epsilon = 0.01);

        // zero mask removes all coverage
        let zero_mask = solid(4, 4, Rgba::new(0.0, 0.0, 0.0, 1.0));
        let mut erased = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        apply_opacity(&ctx, &white, None, "Opacity", &mut erased, Some(&zero_mask), 0, 0, 1.0)
            .unwrap();
        let mut still_black = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        apply_flatten(&ctx, &Arc::new(erased), None, "Flatten", &mut still_black, Rgba::BLACK)
            .unwrap();
        let px = still_black.pixel(1, 1);
        assert_relative_eq!(px.r, 0.0);
        assert_relative_eq!(px.g, 0.0);
        assert_relative_eq!(px.b, 0.0);
    }

    /// A buffer source with an offset shifts its content in the output.
    #[test]
    fn test_offset_buffer_source() {
        let ctx = builtin_context();
        let mut stamp = Buffer::new(8, 8, PixelFormat::RGBA_U8);
        stamp.set_pixel(0, 0, Rgba::new(1.0, 0.0, 0.0, 1.0)).unwrap();

        let mut graph = ctx.new_graph();
        let node = buffer_source_node(&mut graph, Arc::new(stamp), 3, 2).unwrap();
        let mut dest = Buffer::new(8, 8, PixelFormat::RGBA_U8);
        apply_operation(None, None, "Offset", graph, node, &mut dest, None).unwrap();

        assert_eq!(dest.pixel(3, 2).r, 1.0);
        assert_eq!(dest.pixel(0, 0), Rgba::TRANSPARENT);
    }

    /// An integer-translation transform moves content exactly.
    #[test]
    fn test_transform_translation() {
        use glam::{Mat3, Vec2};
        use pixelgraph_engine::apply_transform;
        use pixelgraph_ops::Interpolation;

        let ctx = builtin_context();
        let mut stamp = Buffer::new(8, 8, PixelFormat::RGBA_U8);
        stamp.set_pixel(1, 1, Rgba::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        let mut dest = Buffer::new(8, 8, PixelFormat::RGBA_U8);
        apply_transform(
            &ctx,
            &Arc::new(stamp),
            None,
            "Transform",
            &mut dest,
            Interpolation::Nearest,
            Mat3::from_translation(Vec2::new(4.0, 3.0)),
        )
        .unwrap();

        assert_eq!(dest.pixel(5, 4).b, 1.0);
        assert_eq!(dest.pixel(1, 1), Rgba::TRANSPARENT);
    }

    /// Upscaling a solid buffer keeps it solid over the scaled extent.
    #[test]
    fn test_scale_solid() {
        use pixelgraph_engine::apply_scale;
        use pixelgraph_ops::Interpolation;

        let ctx = builtin_context();
        let src = solid(4, 4, Rgba::new(0.8, 0.2, 0.4, 1.0));
        let mut dest = Buffer::new(8, 8, PixelFormat::RGBA_U8);
        apply_scale(&ctx, &src, None, "Scale", &mut dest, Interpolation::Nearest, 2.0, 2.0)
            .unwrap();
        assert_eq!(dest.pixel(7, 7), src.pixel(3, 3));
        assert_eq!(dest.pixel(0, 0), src.pixel(0, 0));
    }

    /// A malformed region fails fast without writing anything.
    #[test]
    fn test_bad_region_fails_before_tiles() {
        let ctx = builtin_context();
        let src = solid(8, 8, Rgba::WHITE);
        let sentinel = Rgba::new(0.0, 1.0, 0.0, 1.0);
        let mut dest = Buffer::new(8, 8, PixelFormat::RGBA_U8);
        dest.fill(sentinel);

        let mut graph = ctx.new_graph();
        let node = graph.add(ids::INVERT, ParamMap::new()).unwrap();
        let err = apply_operation(
            Some(&src),
            None,
            "Invert",
            graph,
            node,
            &mut dest,
            Some(Rect::new(-1, 0, 4, 4)),
        );
        assert!(matches!(err, Err(EngineError::Region { .. })));
        assert_eq!(dest.pixel(0, 0), sentinel);
    }
}
