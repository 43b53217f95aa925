//! Screen instances and layer management

use std::time::Duration;

use tracing::debug;

use crate::compositor::composite_grid;
use crate::error::{Result, ScreenError};
use crate::grid::Grid;
use crate::layer::{Animation, Drawable, Group, Layer, LayerId};
use crate::registry::ScreenId;
use crate::snapshot::ScreenSnapshot;

/// Name of the layer holding the snapshot contents
pub const BASE_LAYER: &str = "base";

/// A virtual terminal screen: an ordered layer stack (bottom first)
#[derive(Debug, Clone)]
pub struct Screen {
    id: ScreenId,
    width: u16,
    height: u16,
    layers: Vec<Layer>,
    next_layer_id: u32,
}

impl Screen {
    /// Build a screen whose single visible drawable holds the snapshot grid
    pub fn from_snapshot(id: ScreenId, snapshot: &ScreenSnapshot) -> Result<Self> {
        let grid = snapshot.to_grid()?;
        let base = Drawable::new(LayerId(1), BASE_LAYER, grid);
        Ok(Self {
            id,
            width: snapshot.width,
            height: snapshot.height,
            layers: vec![Layer::Drawable(base)],
            next_layer_id: 2,
        })
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Layers in z-order, bottom first
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn allocate_layer_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        id
    }

    fn position(&self, id: LayerId) -> Result<usize> {
        self.layers
            .iter()
            .position(|l| l.id() == id)
            .ok_or(ScreenError::LayerNotFound(id))
    }

    fn check_parent(&self, parent: Option<LayerId>) -> Result<()> {
        match parent {
            None => Ok(()),
            Some(pid) => match self.layer(pid) {
                Some(Layer::Group(_)) => Ok(()),
                Some(Layer::Drawable(_)) => Err(ScreenError::NotAGroup(pid)),
                None => Err(ScreenError::LayerNotFound(pid)),
            },
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    pub fn drawable_mut(&mut self, id: LayerId) -> Result<&mut Drawable> {
        self.layer_mut(id)
            .ok_or(ScreenError::LayerNotFound(id))?
            .as_drawable_mut()
            .ok_or(ScreenError::NotDrawable(id))
    }

    /// Append a visibility group on top
    pub fn add_group(&mut self, name: impl Into<String>, parent: Option<LayerId>) -> Result<LayerId> {
        self.check_parent(parent)?;
        let id = self.allocate_layer_id();
        self.layers.push(Layer::Group(Group {
            id,
            name: name.into(),
            visible: true,
            parent_id: parent,
        }));
        debug!(screen_id = %self.id, layer_id = %id, "added group");
        Ok(id)
    }

    /// Append an empty (fully transparent) drawable on top
    pub fn add_drawable(&mut self, name: impl Into<String>, parent: Option<LayerId>) -> Result<LayerId> {
        self.check_parent(parent)?;
        let id = self.allocate_layer_id();
        let layer = Drawable::new(id, name, Grid::transparent()).with_parent(parent);
        self.layers.push(Layer::Drawable(layer));
        debug!(screen_id = %self.id, layer_id = %id, "added drawable");
        Ok(id)
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<()> {
        self.layer_mut(id)
            .ok_or(ScreenError::LayerNotFound(id))?
            .set_visible(visible);
        Ok(())
    }

    /// Reparent a layer. The new parent must be an existing group.
    pub fn set_parent(&mut self, id: LayerId, parent: Option<LayerId>) -> Result<()> {
        self.check_parent(parent)?;
        self.layer_mut(id)
            .ok_or(ScreenError::LayerNotFound(id))?
            .set_parent_id(parent);
        Ok(())
    }

    /// Remove a layer. Children keep their now-dangling parent reference
    /// and so are no longer gated by it.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer> {
        let pos = self.position(id)?;
        Ok(self.layers.remove(pos))
    }

    /// Move a layer to a z-order index, clamped to the top
    pub fn move_layer(&mut self, id: LayerId, index: usize) -> Result<()> {
        let pos = self.position(id)?;
        let layer = self.layers.remove(pos);
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        Ok(())
    }

    /// Replace a drawable's frames with an animation, or clear it with an
    /// empty frame list
    pub fn set_animation(&mut self, id: LayerId, frames: Vec<Grid>, frame_duration: Duration) -> Result<()> {
        let layer = self.drawable_mut(id)?;
        layer.set_animation(Animation::new(frames, frame_duration));
        Ok(())
    }

    /// Step every animated drawable
    pub fn advance_animations(&mut self, elapsed: Duration) {
        for layer in self.layers.iter_mut().filter_map(Layer::as_drawable_mut) {
            layer.advance(elapsed);
        }
    }

    /// Composite the visible layers into a display grid
    pub fn composite(&self) -> Grid {
        composite_grid(&self.layers)
    }

    /// Snapshot of what the screen currently shows
    pub fn to_snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot::from_grid(self.width, self.height, &self.composite())
    }
}
