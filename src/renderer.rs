//! ANSI renderer
//!
//! Serializes a grid as a full repaint or as a minimal diff against the
//! previously sent grid. Only the top-left `ANSI_ROWS × ANSI_COLS` region
//! of any input is considered.
//!
//! Color escapes are elided while the color matches the last one emitted in
//! the same call. Comparison is exact per component.

use crossterm::cursor::MoveTo;
use crossterm::style::{ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::Command;

use crate::color::{Cell, Color, ANSI_COLS, ANSI_ROWS, DEFAULT_BG, DEFAULT_FG};
use crate::grid::Grid;

/// Cursor to the top-left corner
pub const CURSOR_HOME: &str = "\x1b[H";

/// Tracks the colors last written within one render call
#[derive(Default)]
struct SgrState {
    fg: Option<Color>,
    bg: Option<Color>,
}

impl SgrState {
    /// Write color escapes as needed, then the glyph
    fn write_cell(&mut self, out: &mut String, cell: &Cell) {
        let fg = cell.fg.or(DEFAULT_FG);
        let bg = cell.bg.or(DEFAULT_BG);

        if self.fg != Some(fg) {
            if let Some(color) = fg.to_crossterm() {
                let _ = SetForegroundColor(color).write_ansi(out);
            }
            self.fg = Some(fg);
        }

        if self.bg != Some(bg) {
            if let Some(color) = bg.to_crossterm() {
                let _ = SetBackgroundColor(color).write_ansi(out);
            }
            self.bg = Some(bg);
        }

        out.push(if cell.glyph == '\0' { ' ' } else { cell.glyph });
    }
}

/// Move to a 0-based position (escape is 1-based)
fn move_to(out: &mut String, row: usize, col: usize) {
    let _ = MoveTo(col as u16, row as u16).write_ansi(out);
}

fn reset(out: &mut String) {
    let _ = ResetColor.write_ansi(out);
}

/// Full repaint of a grid
pub fn render_grid_to_ansi_string(grid: &Grid) -> String {
    let rows = grid.rows().min(ANSI_ROWS);
    let cols = grid.cols().min(ANSI_COLS);

    // ~20 bytes per cell when every color changes
    let mut output = String::with_capacity(16 + rows * (8 + cols * 20));
    output.push_str(CURSOR_HOME);
    reset(&mut output);

    let mut sgr = SgrState::default();
    for row in 0..rows {
        move_to(&mut output, row, 0);
        for col in 0..cols {
            if let Some(cell) = grid.get(row, col) {
                sgr.write_cell(&mut output, cell);
            }
        }
    }

    reset(&mut output);
    output
}

/// Update string for the cells that changed between two grids.
///
/// Returns `None` when nothing in the clamped region changed. A cell that
/// exists only in `new` counts as changed; one that exists only in `old`
/// has nothing to draw and is skipped.
pub fn render_diff_ansi_string(old: &Grid, new: &Grid) -> Option<String> {
    let rows = new.rows().min(ANSI_ROWS);
    let cols = new.cols().min(ANSI_COLS);

    let mut output = String::new();
    let mut sgr = SgrState::default();
    let mut changed = false;

    for row in 0..rows {
        for col in 0..cols {
            let Some(cell) = new.get(row, col) else {
                continue;
            };
            if old.get(row, col) == Some(cell) {
                continue;
            }
            changed = true;
            move_to(&mut output, row, col);
            sgr.write_cell(&mut output, cell);
        }
    }

    if !changed {
        return None;
    }
    reset(&mut output);
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DEFAULT_CELL;

    const RED: Color = Color::Rgb(255, 0, 0);
    const GREEN: Color = Color::Rgb(0, 255, 0);
    const BLUE: Color = Color::Rgb(0, 0, 255);

    const PREAMBLE: &str = "\x1b[H\x1b[0m";
    const RESET: &str = "\x1b[0m";

    /// Number of cursor-position escapes in a rendered string
    fn count_positions(ansi: &str) -> usize {
        let mut count = 0;
        let mut rest = ansi;
        while let Some(start) = rest.find("\x1b[") {
            rest = &rest[start + 2..];
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == ';'))
                .unwrap_or(rest.len());
            if rest[end..].starts_with('H') && end > 0 {
                count += 1;
            }
            rest = &rest[end..];
        }
        count
    }

    fn position_escape(row: usize, col: usize) -> String {
        format!("\x1b[{};{}H", row, col)
    }

    #[test]
    fn test_single_cell_full_render() {
        let grid = Grid::filled(1, 1, Cell::new('A', RED, GREEN));
        let ansi = render_grid_to_ansi_string(&grid);

        assert!(ansi.starts_with(PREAMBLE));
        assert!(ansi.contains("\x1b[1;1H"), "row 1 col 1 position");
        assert!(ansi.contains("\x1b[38;2;255;0;0m"), "red fg");
        assert!(ansi.contains("\x1b[48;2;0;255;0m"), "green bg");
        assert!(ansi.contains('A'));
        assert!(ansi.ends_with(RESET));
        assert_eq!(
            ansi,
            "\x1b[H\x1b[0m\x1b[1;1H\x1b[38;2;255;0;0m\x1b[48;2;0;255;0mA\x1b[0m"
        );
    }

    #[test]
    fn test_empty_grid_full_render() {
        let ansi = render_grid_to_ansi_string(&Grid::new(0, 0));
        assert_eq!(ansi, format!("{}{}", PREAMBLE, RESET));
    }

    #[test]
    fn test_same_colors_emitted_once() {
        let grid = Grid::filled(3, 10, Cell::new('x', RED, BLUE));
        let ansi = render_grid_to_ansi_string(&grid);

        // Color state survives row changes
        assert_eq!(ansi.matches("\x1b[38;2;255;0;0m").count(), 1);
        assert_eq!(ansi.matches("\x1b[48;2;0;0;255m").count(), 1);
        assert_eq!(ansi.matches('x').count(), 30);
        assert_eq!(count_positions(&ansi), 3);
    }

    #[test]
    fn test_color_change_reemits() {
        let mut grid = Grid::filled(1, 3, Cell::new('x', RED, BLUE));
        grid.set(0, 1, Cell::new('y', GREEN, BLUE));
        let ansi = render_grid_to_ansi_string(&grid);

        assert_eq!(ansi.matches("\x1b[38;2;255;0;0m").count(), 2);
        assert_eq!(ansi.matches("\x1b[38;2;0;255;0m").count(), 1);
        assert_eq!(ansi.matches("\x1b[48;2;0;0;255m").count(), 1);
    }

    #[test]
    fn test_full_render_clamps_oversized() {
        let grid = Grid::filled(ANSI_ROWS + 3, ANSI_COLS + 7, DEFAULT_CELL);
        let ansi = render_grid_to_ansi_string(&grid);

        assert_eq!(count_positions(&ansi), ANSI_ROWS);
        assert!(ansi.contains(&position_escape(ANSI_ROWS, 1)));
        assert!(!ansi.contains(&position_escape(ANSI_ROWS + 1, 1)));
        assert_eq!(ansi.matches(' ').count(), ANSI_ROWS * ANSI_COLS);
    }

    #[test]
    fn test_sentinel_colors_render_as_defaults() {
        let grid = Grid::filled(1, 1, Cell::text('t', Color::TransparentHalf));
        let ansi = render_grid_to_ansi_string(&grid);
        assert!(ansi.contains("\x1b[38;2;255;255;255m"));
        assert!(ansi.contains("\x1b[48;2;0;0;0m"));
    }

    #[test]
    fn test_diff_identical_is_none() {
        let grid = Grid::filled(4, 4, Cell::new('q', RED, GREEN));
        assert_eq!(render_diff_ansi_string(&grid, &grid), None);

        let copy = grid.clone();
        assert_eq!(render_diff_ansi_string(&grid, &copy), None);

        let screen = Grid::screen();
        assert_eq!(render_diff_ansi_string(&screen, &Grid::screen()), None);
    }

    #[test]
    fn test_diff_single_change() {
        let old = Grid::screen();
        let mut new = old.clone();
        new.set(4, 9, Cell::new('Z', RED, GREEN));

        let ansi = render_diff_ansi_string(&old, &new).unwrap();
        assert_eq!(
            ansi,
            "\x1b[5;10H\x1b[38;2;255;0;0m\x1b[48;2;0;255;0mZ\x1b[0m"
        );
    }

    #[test]
    fn test_diff_positions_each_change() {
        let old = Grid::screen();
        let mut new = old.clone();
        new.set(0, 0, Cell::new('a', RED, GREEN));
        new.set(0, 1, Cell::new('b', RED, GREEN));
        new.set(10, 40, Cell::new('c', RED, GREEN));

        let ansi = render_diff_ansi_string(&old, &new).unwrap();
        assert_eq!(count_positions(&ansi), 3);
        assert!(ansi.contains(&position_escape(1, 1)));
        assert!(ansi.contains(&position_escape(1, 2)));
        assert!(ansi.contains(&position_escape(11, 41)));
        // Colors only tracked across changed cells
        assert_eq!(ansi.matches("\x1b[38;2;255;0;0m").count(), 1);
        assert_eq!(ansi.matches("\x1b[48;2;0;255;0m").count(), 1);
        assert!(ansi.ends_with(RESET));
    }

    #[test]
    fn test_diff_color_state_ignores_unchanged_cells() {
        let old = Grid::filled(1, 3, Cell::new('x', RED, GREEN));
        let mut new = old.clone();
        new.set(0, 0, Cell::new('y', BLUE, GREEN));
        new.set(0, 2, Cell::new('z', BLUE, GREEN));

        let ansi = render_diff_ansi_string(&old, &new).unwrap();
        assert_eq!(ansi.matches("\x1b[38;2;0;0;255m").count(), 1);
        assert!(!ansi.contains("\x1b[38;2;255;0;0m"));
    }

    #[test]
    fn test_diff_ignores_out_of_bounds_changes() {
        let old = Grid::new(ANSI_ROWS + 2, ANSI_COLS + 2);
        let mut new = old.clone();
        new.set(ANSI_ROWS, 0, Cell::new('!', RED, GREEN));
        new.set(0, ANSI_COLS + 1, Cell::new('!', RED, GREEN));

        assert_eq!(render_diff_ansi_string(&old, &new), None);

        new.set(0, 0, Cell::new('k', RED, GREEN));
        let ansi = render_diff_ansi_string(&old, &new).unwrap();
        assert_eq!(count_positions(&ansi), 1);
        assert!(!ansi.contains('!'));
    }

    #[test]
    fn test_diff_against_smaller_old_grid() {
        let old = Grid::new(1, 1);
        let new = Grid::new(1, 2);
        let ansi = render_diff_ansi_string(&old, &new).unwrap();
        assert_eq!(count_positions(&ansi), 1);
        assert!(ansi.starts_with(&position_escape(1, 2)));
    }
}
