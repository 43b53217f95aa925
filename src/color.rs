//! Color and cell value types
//!
//! Shared by every other module. Transparency is carried as tagged
//! variants of [`Color`] so no real RGB triple can ever be mistaken
//! for "show what's underneath".

use serde::{Deserialize, Serialize};

/// Logical screen height in cells
pub const ANSI_ROWS: usize = 25;

/// Logical screen width in cells
pub const ANSI_COLS: usize = 80;

/// Upper half block. Foreground paints the top half, background the bottom.
pub const HALF_BLOCK: char = '▀';

pub const DEFAULT_FG: Color = Color::Rgb(255, 255, 255);
pub const DEFAULT_BG: Color = Color::Rgb(0, 0, 0);

/// A blank, fully opaque cell
pub const DEFAULT_CELL: Cell = Cell::new(' ', DEFAULT_FG, DEFAULT_BG);

/// A half block with both halves transparent.
///
/// Composites as a no-op, so freshly created layers use it as "nothing here".
pub const CLEAR_CELL: Cell = Cell::new(HALF_BLOCK, Color::TransparentHalf, Color::TransparentHalf);

/// A 24-bit color or one of the transparency sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "ColorRepr")]
pub enum Color {
    Rgb(u8, u8, u8),
    /// Background shows through from the layers below
    TransparentBg,
    /// One half of a half-block glyph shows through
    TransparentHalf,
}

impl Color {
    pub fn is_opaque(&self) -> bool {
        matches!(self, Color::Rgb(..))
    }

    /// Replace a sentinel with `fallback`
    pub fn or(self, fallback: Color) -> Color {
        if self.is_opaque() {
            self
        } else {
            fallback
        }
    }

    /// Convert to a crossterm color for escape generation.
    ///
    /// Sentinels have no terminal representation and return `None`.
    pub fn to_crossterm(self) -> Option<crossterm::style::Color> {
        match self {
            Color::Rgb(r, g, b) => Some(crossterm::style::Color::Rgb { r, g, b }),
            _ => None,
        }
    }

    /// Parse a color from string
    /// Supports: hex (#rrggbb), named colors (red, blue, etc.), sentinel names
    pub fn parse(s: &str) -> Option<Color> {
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Color::Rgb(r, g, b));
        }

        Some(match s.to_lowercase().as_str() {
            "transparent" | "transparent_bg" => Color::TransparentBg,
            "transparent_half" => Color::TransparentHalf,

            // Tokyo Night palette
            "dim" => Color::Rgb(86, 95, 137),
            "cyan" => Color::Rgb(125, 207, 255),
            "blue" => Color::Rgb(122, 162, 247),
            "green" => Color::Rgb(158, 206, 106),
            "yellow" => Color::Rgb(224, 175, 104),
            "red" => Color::Rgb(247, 118, 142),
            "orange" => Color::Rgb(255, 158, 100),
            "magenta" => Color::Rgb(187, 154, 247),

            // Basic colors
            "black" => Color::Rgb(0, 0, 0),
            "white" => Color::Rgb(255, 255, 255),
            "grey" | "gray" => Color::Rgb(192, 192, 192),
            "darkgrey" | "darkgray" => Color::Rgb(128, 128, 128),

            _ => return None,
        })
    }
}

/// Wire form: `[r, g, b]` or a name understood by [`Color::parse`]
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Rgb([u8; 3]),
    Name(String),
}

impl TryFrom<ColorRepr> for Color {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Rgb([r, g, b]) => Ok(Color::Rgb(r, g, b)),
            ColorRepr::Name(name) => {
                Color::parse(&name).ok_or_else(|| format!("unknown color: {}", name))
            }
        }
    }
}

impl From<Color> for ColorRepr {
    fn from(color: Color) -> Self {
        match color {
            Color::Rgb(r, g, b) => ColorRepr::Rgb([r, g, b]),
            Color::TransparentBg => ColorRepr::Name("transparent".to_string()),
            Color::TransparentHalf => ColorRepr::Name("transparent_half".to_string()),
        }
    }
}

/// One character position: glyph plus foreground and background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    pub const fn new(glyph: char, fg: Color, bg: Color) -> Self {
        Self { glyph, fg, bg }
    }

    /// Text with a transparent background
    pub const fn text(glyph: char, fg: Color) -> Self {
        Self::new(glyph, fg, Color::TransparentBg)
    }

    /// Half block with independent top and bottom colors
    pub const fn half(top: Color, bottom: Color) -> Self {
        Self::new(HALF_BLOCK, top, bottom)
    }

    pub fn is_half_block(&self) -> bool {
        self.glyph == HALF_BLOCK
    }
}

impl Default for Cell {
    fn default() -> Self {
        DEFAULT_CELL
    }
}
