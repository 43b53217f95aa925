//! vtscreens - layered virtual terminal screens
//!
//! Screens are stacks of drawable layers and groups over a fixed 80x25
//! cell grid. The compositor flattens the visible layers (transparency and
//! half-block rules), the renderer turns the result into ANSI escapes, and
//! a [`session::Session`] pushes full or diffed frames to a terminal.
//! The binary in `main.rs` drives screens from a Luau script.

pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod grid;
pub mod layer;
pub mod lua;
pub mod registry;
pub mod renderer;
pub mod screen;
pub mod session;
pub mod snapshot;
pub mod terminal;
pub mod visibility;

pub use color::{Cell, Color};
pub use error::ScreenError;
pub use grid::Grid;
pub use layer::{Layer, LayerId};
pub use registry::{ScreenId, ScreenRegistry};
pub use screen::Screen;
pub use session::Session;
pub use snapshot::ScreenSnapshot;
