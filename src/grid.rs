//! Dense cell grid
//!
//! Row-major, 0-based storage. Screens and layers keep their cells here;
//! the compositor and renderer read it with [`Grid::get`], which returns
//! `None` outside the grid so undersized grids read as transparent.

use crate::color::{Cell, Color, ANSI_COLS, ANSI_ROWS, CLEAR_CELL, DEFAULT_CELL};

/// A 2D buffer of cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Grid of default cells
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, DEFAULT_CELL)
    }

    pub fn filled(rows: usize, cols: usize, cell: Cell) -> Self {
        Self {
            rows,
            cols,
            cells: vec![cell; rows * cols],
        }
    }

    /// Full-size grid of default cells
    pub fn screen() -> Self {
        Self::new(ANSI_ROWS, ANSI_COLS)
    }

    /// Full-size grid that composites as empty
    pub fn transparent() -> Self {
        Self::filled(ANSI_ROWS, ANSI_COLS, CLEAR_CELL)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    /// Get a cell (returns None if out of bounds)
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// Get a mutable cell (returns None if out of bounds)
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.index(row, col).map(|i| &mut self.cells[i])
    }

    /// Set a cell; writes outside the grid are dropped
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(slot) = self.get_mut(row, col) {
            *slot = cell;
        }
    }

    /// Overwrite every cell
    pub fn clear(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Fill a region with a cell
    pub fn fill(&mut self, row: usize, col: usize, height: usize, width: usize, cell: Cell) {
        let row_end = row.saturating_add(height).min(self.rows);
        let col_end = col.saturating_add(width).min(self.cols);
        for r in row..row_end {
            for c in col..col_end {
                self.set(r, c, cell);
            }
        }
    }

    /// Print text starting at a position, clipped at the right edge
    pub fn print(&mut self, row: usize, col: usize, text: &str, fg: Color, bg: Color) {
        for (i, ch) in text.chars().enumerate() {
            let c = col + i;
            if c >= self.cols {
                break;
            }
            self.set(row, c, Cell::new(ch, fg, bg));
        }
    }

    /// Draw a box (single line, rounded corners)
    pub fn draw_box(&mut self, row: usize, col: usize, height: usize, width: usize, fg: Color, bg: Color) {
        if width < 2 || height < 2 {
            return;
        }
        let bottom = row + height - 1;
        let right = col + width - 1;

        self.set(row, col, Cell::new('╭', fg, bg));
        self.set(row, right, Cell::new('╮', fg, bg));
        self.set(bottom, col, Cell::new('╰', fg, bg));
        self.set(bottom, right, Cell::new('╯', fg, bg));

        for c in col + 1..right {
            self.set(row, c, Cell::new('─', fg, bg));
            self.set(bottom, c, Cell::new('─', fg, bg));
        }
        for r in row + 1..bottom {
            self.set(r, col, Cell::new('│', fg, bg));
            self.set(r, right, Cell::new('│', fg, bg));
        }
    }

    /// Iterate cells in row-major order with their coordinates
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / cols, i % cols, cell))
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::screen()
    }
}
