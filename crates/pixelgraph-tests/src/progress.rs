//! Progress and cancellation plumbing shared by the integration tests.

use pixelgraph_engine::{CancellationToken, ProgressSink};

/// A [`ProgressSink`] that records every call it receives.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    /// Whether a scope is currently open.
    pub active: bool,
    /// Number of `start` calls.
    pub starts: u32,
    /// Number of `end` calls.
    pub ends: u32,
    /// Labels seen via `start` and `set_message`.
    pub messages: Vec<String>,
    /// Every reported fraction, in order.
    pub values: Vec<f64>,
    /// When set, trips the token after this many `set_value` calls.
    pub cancel_after: Option<(u32, CancellationToken)>,
}

impl RecordingProgress {
    /// A recorder that trips `token` after `calls` value reports.
    pub fn cancelling_after(calls: u32, token: CancellationToken) -> Self {
        Self {
            cancel_after: Some((calls, token)),
            ..Self::default()
        }
    }
}

impl ProgressSink for RecordingProgress {
    fn is_active(&self) -> bool {
        self.active
    }

    fn start(&mut self, message: &str) {
        self.active = true;
        self.starts += 1;
        self.messages.push(message.to_owned());
    }

    fn set_message(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }

    fn set_value(&mut self, fraction: f64) {
        self.values.push(fraction);
        if let Some((after, token)) = &self.cancel_after {
            if self.values.len() as u32 >= *after {
                token.cancel();
            }
        }
    }

    fn end(&mut self) {
        self.active = false;
        self.ends += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient;
    use pixelgraph_core::{Buffer, PixelFormat, Rect, Rgba};
    use pixelgraph_engine::{
        apply_gaussian_blur, apply_invert, apply_operation_cancellable, EngineError, TILE_HEIGHT,
        TILE_WIDTH,
    };
    use pixelgraph_graph::ParamMap;
    use pixelgraph_ops::{builtin_context, ids};

    fn expected_tiles(width: i32, height: i32) -> usize {
        let across = (width + TILE_WIDTH - 1) / TILE_WIDTH;
        let down = (height + TILE_HEIGHT - 1) / TILE_HEIGHT;
        (across * down) as usize
    }

    /// Fractions are non-decreasing, end at exactly 1.0, and arrive once
    /// per tile.
    #[test]
    fn test_progress_monotonic_and_complete() {
        let ctx = builtin_context();
        let src = gradient(300, 150);
        let mut dest = Buffer::new(300, 150, PixelFormat::RGBA_U8);
        let mut progress = RecordingProgress::default();

        apply_invert(&ctx, &src, Some(&mut progress), "Invert", &mut dest).unwrap();

        assert_eq!(progress.values.len(), expected_tiles(300, 150));
        assert!(progress.values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*progress.values.last().unwrap(), 1.0);
        assert_eq!(progress.starts, 1);
        assert_eq!(progress.ends, 1);
        assert!(!progress.active);
        assert_eq!(progress.messages, vec!["Invert".to_owned()]);
    }

    /// A single-tile region still reports once.
    #[test]
    fn test_progress_single_tile() {
        let ctx = builtin_context();
        let src = gradient(16, 16);
        let mut dest = Buffer::new(16, 16, PixelFormat::RGBA_U8);
        let mut progress = RecordingProgress::default();

        apply_invert(&ctx, &src, Some(&mut progress), "Invert", &mut dest).unwrap();
        assert_eq!(progress.values, vec![1.0]);
    }

    /// An already-active sink is reused: no extra start/end pair, label
    /// forwarded as a message.
    #[test]
    fn test_nested_progress_shares_scope() {
        let ctx = builtin_context();
        let src = gradient(64, 64);
        let mut dest = Buffer::new(64, 64, PixelFormat::RGBA_U8);
        let mut progress = RecordingProgress::default();
        progress.start("Composite filter");

        apply_gaussian_blur(&ctx, &src, Some(&mut progress), "Blur", &mut dest, 1.0, 1.0)
            .unwrap();

        assert_eq!(progress.starts, 1);
        assert_eq!(progress.ends, 0);
        assert!(progress.active);
        assert_eq!(
            progress.messages,
            vec!["Composite filter".to_owned(), "Blur".to_owned()]
        );
        assert!(!progress.values.is_empty());
    }

    /// Cancellation at a tile boundary yields the distinct `Cancelled`
    /// result, leaves the already-written tile in place, and still closes
    /// the progress scope.
    #[test]
    fn test_cancellation_mid_evaluation() {
        let ctx = builtin_context();
        let width = TILE_WIDTH * 2;
        let height = TILE_HEIGHT * 2;
        let src = crate::solid(width as u32, height as u32, Rgba::WHITE);
        let mut dest = Buffer::new(width as u32, height as u32, PixelFormat::RGBA_U8);

        let token = CancellationToken::new();
        let mut progress = RecordingProgress::cancelling_after(1, token.clone());

        let mut graph = ctx.new_graph();
        let node = graph.add(ids::INVERT, ParamMap::new()).unwrap();
        let result = apply_operation_cancellable(
            Some(&src),
            Some(&mut progress),
            "Invert",
            graph,
            node,
            &mut dest,
            None,
            &token,
        );

        assert!(matches!(result, Err(EngineError::Cancelled)));
        // first tile written (white inverted to black, alpha kept)
        let first = dest.pixel(0, 0);
        assert_eq!((first.r, first.g, first.b, first.a), (0.0, 0.0, 0.0, 1.0));
        // last tile untouched
        let last = dest.pixel(width - 1, height - 1);
        assert_eq!(last, Rgba::TRANSPARENT);
        // scope closed despite the error
        assert_eq!(progress.ends, 1);
        assert!(!progress.active);
        assert_eq!(progress.values.len(), 1);
    }

    /// Cancelling inside an already-active outer scope must not close it.
    #[test]
    fn test_cancellation_preserves_outer_scope() {
        let ctx = builtin_context();
        let src = crate::solid(256, 128, Rgba::WHITE);
        let mut dest = Buffer::new(256, 128, PixelFormat::RGBA_U8);

        let token = CancellationToken::new();
        let mut progress = RecordingProgress::cancelling_after(1, token.clone());
        progress.start("Outer");

        let mut graph = ctx.new_graph();
        let node = graph.add(ids::INVERT, ParamMap::new()).unwrap();
        let result = apply_operation_cancellable(
            Some(&src),
            Some(&mut progress),
            "Inner",
            graph,
            node,
            &mut dest,
            Some(Rect::new(0, 0, 256, 128)),
            &token,
        );

        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert_eq!(progress.ends, 0);
        assert!(progress.active);
    }
}
