//! Versioned screen snapshots
//!
//! The snapshot is the serializable form a screen is created from:
//!
//! ```text
//! { "version": 1, "width": 80, "height": 25,
//!   "grid": { "1": { "1": { "char": "A", "fg": [255,0,0], "bg": [0,0,0] } } } }
//! ```
//!
//! Rows and columns are 1-based and sparse; missing cells are default
//! cells. The grid maps may also arrive as arrays (a Lua sequence table
//! or a JSON array), in which case position 1 is the first element.
//! Conversion to the dense 0-based [`Grid`] happens once, at creation.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::color::{Cell, Color, DEFAULT_BG, DEFAULT_CELL, DEFAULT_FG};
use crate::error::{Result, ScreenError};
use crate::grid::Grid;

/// The only snapshot version this crate reads and writes
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable screen state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub version: u32,
    pub width: u16,
    pub height: u16,
    #[serde(default)]
    pub grid: SparseGrid,
}

/// One snapshot cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    #[serde(rename = "char", default = "default_glyph")]
    pub glyph: String,
    #[serde(default = "default_fg")]
    pub fg: Color,
    #[serde(default = "default_bg")]
    pub bg: Color,
}

fn default_glyph() -> String {
    " ".to_string()
}

fn default_fg() -> Color {
    DEFAULT_FG
}

fn default_bg() -> Color {
    DEFAULT_BG
}

impl CellSnapshot {
    /// First character of `char`; empty strings become a space
    pub fn to_cell(&self) -> Cell {
        let glyph = self.glyph.chars().next().unwrap_or(' ');
        Cell::new(glyph, self.fg, self.bg)
    }
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        Self {
            glyph: cell.glyph.to_string(),
            fg: cell.fg,
            bg: cell.bg,
        }
    }
}

/// Sparse 1-based rows of sparse 1-based cells
pub type SparseGrid = Sparse<Sparse<CellSnapshot>>;

/// Write sparse cells onto `grid`. Cells past its bounds are dropped.
pub fn paint_cells(cells: &SparseGrid, grid: &mut Grid) -> Result<()> {
    for (&row, cols) in &cells.0 {
        if row == 0 {
            return Err(ScreenError::InvalidCoordinate("row 0".to_string()));
        }
        for (&col, cell) in &cols.0 {
            if col == 0 {
                return Err(ScreenError::InvalidCoordinate(format!("row {} col 0", row)));
            }
            grid.set(row as usize - 1, col as usize - 1, cell.to_cell());
        }
    }
    Ok(())
}

impl ScreenSnapshot {
    /// Empty version-1 snapshot
    pub fn blank(width: u16, height: u16) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            width,
            height,
            grid: Sparse::default(),
        }
    }

    /// Convert the sparse 1-based grid into a dense full-size grid.
    ///
    /// Cells past the screen bounds are dropped. Index 0 is rejected.
    pub fn to_grid(&self) -> Result<Grid> {
        if self.version != SNAPSHOT_VERSION {
            return Err(ScreenError::UnsupportedVersion(self.version));
        }

        let mut grid = Grid::screen();
        paint_cells(&self.grid, &mut grid)?;
        Ok(grid)
    }

    /// Sparse snapshot of a grid, omitting default cells
    pub fn from_grid(width: u16, height: u16, grid: &Grid) -> Self {
        let mut rows: BTreeMap<u32, Sparse<CellSnapshot>> = BTreeMap::new();
        for (row, col, cell) in grid.iter() {
            if *cell == DEFAULT_CELL {
                continue;
            }
            rows.entry(row as u32 + 1)
                .or_default()
                .0
                .insert(col as u32 + 1, CellSnapshot::from(cell));
        }

        Self {
            version: SNAPSHOT_VERSION,
            width,
            height,
            grid: Sparse(rows),
        }
    }
}

/// Map from 1-based index to value.
///
/// Serializes as a map. Deserializes from a map keyed by integers or
/// numeric strings, or from a sequence (null entries skipped).
#[derive(Debug, Clone, PartialEq)]
pub struct Sparse<T>(pub BTreeMap<u32, T>);

impl<T> Default for Sparse<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: Serialize> Serialize for Sparse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sparse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(SparseVisitor(PhantomData))
    }
}

struct SparseVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for SparseVisitor<T> {
    type Value = Sparse<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map keyed by 1-based index, or an array")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut out = BTreeMap::new();
        while let Some((Index(key), value)) = map.next_entry::<Index, T>()? {
            out.insert(key, value);
        }
        Ok(Sparse(out))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut out = BTreeMap::new();
        let mut index = 1u32;
        while let Some(value) = seq.next_element::<Option<T>>()? {
            if let Some(value) = value {
                out.insert(index, value);
            }
            index += 1;
        }
        Ok(Sparse(out))
    }
}

/// Map key accepting integers, integral floats, and numeric strings
struct Index(u32);

impl<'de> Deserialize<'de> for Index {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct IndexVisitor;

        impl Visitor<'_> for IndexVisitor {
            type Value = Index;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative integer index")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Index, E> {
                u32::try_from(v)
                    .map(Index)
                    .map_err(|_| E::custom(format!("index out of range: {}", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Index, E> {
                u32::try_from(v)
                    .map(Index)
                    .map_err(|_| E::custom(format!("index out of range: {}", v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Index, E> {
                if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                    Ok(Index(v as u32))
                } else {
                    Err(E::custom(format!("invalid index: {}", v)))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Index, E> {
                v.trim()
                    .parse::<u32>()
                    .map(Index)
                    .map_err(|_| E::custom(format!("invalid index: {:?}", v)))
            }
        }

        deserializer.deserialize_any(IndexVisitor)
    }
}
