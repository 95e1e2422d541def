//! Synthetic downtown street grid for the demo.

use tsim_core::Point;
use tsim_graph::{RoadGraph, RoadGraphBuilder};

pub const GRID_ROWS: usize = 4;
pub const GRID_COLS: usize = 5;

/// Build a `GRID_ROWS × GRID_COLS` grid of two-way streets.
///
/// Node names follow the `"<row><col>"` scheme of downtown avenues, e.g.
/// `"a3"` is row `a`, 4th intersection.  Horizontal blocks are slightly
/// longer than vertical ones, like a real downtown.
pub fn build_network() -> RoadGraph {
    let mut builder = RoadGraphBuilder::new();
    let mut ids = Vec::with_capacity(GRID_ROWS * GRID_COLS);

    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let name = format!("{}{col}", (b'a' + row as u8) as char);
            let pos = Point::new(col as f32 * 1.4, row as f32);
            ids.push(builder.add_node(name, Some(pos)));
        }
    }

    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let here = ids[row * GRID_COLS + col];
            if col + 1 < GRID_COLS {
                builder.add_road(here, ids[row * GRID_COLS + col + 1], 1.4);
            }
            if row + 1 < GRID_ROWS {
                builder.add_road(here, ids[(row + 1) * GRID_COLS + col], 1.0);
            }
        }
    }

    builder.build()
}
