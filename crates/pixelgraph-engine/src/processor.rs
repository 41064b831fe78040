//! Tile-at-a-time region processing.
//!
//! The with-progress path of the executor partitions the evaluation
//! region into working tiles traversed in a fixed row-major order, so
//! re-running the same operation always touches pixels in the same
//! sequence and progress fractions are reproducible.

use crate::evaluator::Evaluator;
use crate::EngineResult;
use pixelgraph_core::{Buffer, Rect};
use pixelgraph_graph::NodeId;
use tracing::trace;

/// Width of one working tile.
pub const TILE_WIDTH: i32 = 128;
/// Height of one working tile.
pub const TILE_HEIGHT: i32 = 64;

/// Partitions a region into row-major working tiles.
///
/// Edge tiles are clipped to the region; every pixel of the region is
/// covered exactly once. An empty region yields no tiles.
pub(crate) fn tile_rects(region: Rect) -> Vec<Rect> {
    let mut tiles = Vec::new();
    let mut y = region.y;
    while y < region.bottom() {
        let h = TILE_HEIGHT.min(region.bottom() - y);
        let mut x = region.x;
        while x < region.right() {
            let w = TILE_WIDTH.min(region.right() - x);
            tiles.push(Rect::new(x, y, w, h));
            x += w;
        }
        y += h;
    }
    tiles
}

/// Steps an evaluation over a region one tile at a time.
pub(crate) struct TileProcessor<'g> {
    evaluator: Evaluator<'g>,
    target: NodeId,
    tiles: std::vec::IntoIter<Rect>,
    total_area: u64,
    done_area: u64,
}

impl<'g> TileProcessor<'g> {
    pub(crate) fn new(evaluator: Evaluator<'g>, target: NodeId, region: Rect) -> Self {
        Self {
            evaluator,
            target,
            tiles: tile_rects(region).into_iter(),
            total_area: region.area(),
            done_area: 0,
        }
    }

    /// Renders and writes the next tile.
    ///
    /// Returns the completed fraction after the tile, or `None` once the
    /// region is exhausted. The final fraction before `None` is exactly
    /// 1.0.
    pub(crate) fn work(&mut self, dest: &mut Buffer) -> EngineResult<Option<f64>> {
        let Some(tile_rect) = self.tiles.next() else {
            return Ok(None);
        };
        let tile = self.evaluator.evaluate(self.target, tile_rect)?;
        dest.write_rect(tile_rect, tile.pixels())?;
        self.done_area += tile_rect.area();
        let fraction = self.done_area as f64 / self.total_area as f64;
        trace!(%tile_rect, fraction, "tile done");
        Ok(Some(fraction))
    }
}
