//! Multi-layer cell compositor
//!
//! Folds the visible drawable layers bottom-to-top into one display grid.
//! Per cell, starting from [`DEFAULT_CELL`]:
//!
//! - nothing there: no change
//! - half block: `fg` is the top half, `bg` the bottom half; each opaque
//!   half overwrites that half of the result, transparent halves keep it
//! - ordinary glyph over [`Color::TransparentBg`]: take glyph and `fg`,
//!   keep the background accumulated so far
//! - anything else: replace the result outright
//!
//! A stack of only opaque ordinary cells therefore yields the top cell.

use crate::color::{Cell, Color, ANSI_COLS, ANSI_ROWS, DEFAULT_CELL, HALF_BLOCK};
use crate::grid::Grid;
use crate::layer::Layer;
use crate::visibility::visible_drawable_layers;

/// Composite one coordinate.
///
/// `layers` is bottom-to-top. `get_cell` returns the layer's cell at the
/// coordinate being composited, or `None` when the layer has nothing there.
pub fn composite_cell_core<L, F>(layers: &[L], mut get_cell: F) -> Cell
where
    F: FnMut(&L) -> Option<Cell>,
{
    let mut out = DEFAULT_CELL;

    for layer in layers {
        let Some(cell) = get_cell(layer) else {
            continue;
        };

        if cell.glyph == HALF_BLOCK {
            let top = cell.fg;
            let bottom = cell.bg;
            if !top.is_opaque() && !bottom.is_opaque() {
                continue;
            }
            if out.glyph != HALF_BLOCK {
                // An ordinary cell shows its background in both halves
                out = Cell::half(out.bg, out.bg);
            }
            if top.is_opaque() {
                out.fg = top;
            }
            if bottom.is_opaque() {
                out.bg = bottom;
            }
        } else if cell.bg == Color::TransparentBg {
            out.glyph = cell.glyph;
            out.fg = cell.fg;
        } else {
            out = cell;
        }
    }

    out
}

/// Composite a layer list into a full-size display grid.
///
/// Layers larger than the screen are clipped; smaller ones read as
/// transparent outside their extent. Inputs are not modified.
pub fn composite_grid(layers: &[Layer]) -> Grid {
    let visible = visible_drawable_layers(layers);
    let mut out = Grid::screen();

    for row in 0..ANSI_ROWS {
        for col in 0..ANSI_COLS {
            let cell = composite_cell_core(&visible, |d| d.grid().get(row, col).copied());
            out.set(row, col, cell);
        }
    }

    out
}
