//! Layers: visibility groups and drawable grids
//!
//! Layers live in a flat list on a screen. List order is z-order (later is
//! on top) and `parent_id` back-references form an implicit forest that
//! may appear in any order.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Layer identifier, unique within one screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A visibility container. Contributes no cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub parent_id: Option<LayerId>,
}

/// Frame sequence backing an animated drawable
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frames: Vec<Grid>,
    frame_duration: Duration,
    current: usize,
    elapsed: Duration,
}

impl Animation {
    /// Returns `None` for an empty frame list
    pub fn new(frames: Vec<Grid>, frame_duration: Duration) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Self {
            frames,
            frame_duration,
            current: 0,
            elapsed: Duration::ZERO,
        })
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> &Grid {
        &self.frames[self.current]
    }

    pub fn current_frame_mut(&mut self) -> &mut Grid {
        &mut self.frames[self.current]
    }

    /// Accumulate elapsed time and step whole frames, wrapping at the end.
    ///
    /// A zero frame duration never advances.
    pub fn advance(&mut self, elapsed: Duration) {
        if self.frame_duration.is_zero() {
            return;
        }
        self.elapsed += elapsed;
        while self.elapsed >= self.frame_duration {
            self.elapsed -= self.frame_duration;
            self.current = (self.current + 1) % self.frames.len();
        }
    }
}

/// A layer that owns cells
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub parent_id: Option<LayerId>,
    grid: Grid,
    animation: Option<Animation>,
}

impl Drawable {
    pub fn new(id: LayerId, name: impl Into<String>, grid: Grid) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            parent_id: None,
            grid,
            animation: None,
        }
    }

    pub fn with_parent(mut self, parent_id: Option<LayerId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// The grid the compositor reads: the current animation frame if
    /// animated, otherwise the static grid.
    pub fn grid(&self) -> &Grid {
        match &self.animation {
            Some(anim) => anim.current_frame(),
            None => &self.grid,
        }
    }

    /// Mutable access to whatever [`Drawable::grid`] returns
    pub fn grid_mut(&mut self) -> &mut Grid {
        match &mut self.animation {
            Some(anim) => anim.current_frame_mut(),
            None => &mut self.grid,
        }
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn set_animation(&mut self, animation: Option<Animation>) {
        self.animation = animation;
    }

    pub fn advance(&mut self, elapsed: Duration) {
        if let Some(anim) = &mut self.animation {
            anim.advance(elapsed);
        }
    }
}

/// A screen layer
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Group(Group),
    Drawable(Drawable),
}

impl Layer {
    pub fn id(&self) -> LayerId {
        match self {
            Layer::Group(g) => g.id,
            Layer::Drawable(d) => d.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Layer::Group(g) => &g.name,
            Layer::Drawable(d) => &d.name,
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            Layer::Group(g) => g.visible,
            Layer::Drawable(d) => d.visible,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        match self {
            Layer::Group(g) => g.visible = visible,
            Layer::Drawable(d) => d.visible = visible,
        }
    }

    pub fn parent_id(&self) -> Option<LayerId> {
        match self {
            Layer::Group(g) => g.parent_id,
            Layer::Drawable(d) => d.parent_id,
        }
    }

    pub fn set_parent_id(&mut self, parent_id: Option<LayerId>) {
        match self {
            Layer::Group(g) => g.parent_id = parent_id,
            Layer::Drawable(d) => d.parent_id = parent_id,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Layer::Group(g) => Some(g),
            Layer::Drawable(_) => None,
        }
    }

    pub fn as_drawable(&self) -> Option<&Drawable> {
        match self {
            Layer::Drawable(d) => Some(d),
            Layer::Group(_) => None,
        }
    }

    pub fn as_drawable_mut(&mut self) -> Option<&mut Drawable> {
        match self {
            Layer::Drawable(d) => Some(d),
            Layer::Group(_) => None,
        }
    }
}
