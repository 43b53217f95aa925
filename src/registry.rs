//! Screen registry
//!
//! Owns the screens of one session, hands out sequential ids starting at 1,
//! and tracks which screen is active. A reset (session stop) clears
//! everything and restarts numbering, so old ids become invalid even if
//! the same number is later issued again.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScreenError};
use crate::screen::Screen;
use crate::snapshot::ScreenSnapshot;

/// Screen identifier, unique until the registry is reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(pub u32);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct ScreenRegistry {
    screens: HashMap<ScreenId, Screen>,
    next_id: u32,
    active_id: Option<ScreenId>,
}

impl ScreenRegistry {
    pub fn new() -> Self {
        Self {
            screens: HashMap::new(),
            next_id: 1,
            active_id: None,
        }
    }

    /// Parse a snapshot into a new screen and return its id.
    ///
    /// A snapshot that fails to parse consumes no id.
    pub fn create_screen(&mut self, snapshot: &ScreenSnapshot) -> Result<ScreenId> {
        let id = ScreenId(self.next_id);
        let screen = Screen::from_snapshot(id, snapshot)?;
        self.screens.insert(id, screen);
        self.next_id += 1;
        info!(screen_id = %id, width = snapshot.width, height = snapshot.height, "created screen");
        Ok(id)
    }

    /// Set or clear the active screen. An unknown id leaves it unchanged.
    pub fn set_screen(&mut self, id: Option<ScreenId>) -> Result<()> {
        if let Some(id) = id {
            if !self.screens.contains_key(&id) {
                return Err(ScreenError::ScreenNotFound(id));
            }
        }
        debug!(screen_id = ?id.map(|i| i.0), "active screen changed");
        self.active_id = id;
        Ok(())
    }

    pub fn active_screen_id(&self) -> Option<ScreenId> {
        self.active_id
    }

    pub fn active_screen(&self) -> Option<&Screen> {
        self.active_id.and_then(|id| self.screens.get(&id))
    }

    pub fn active_screen_mut(&mut self) -> Option<&mut Screen> {
        self.active_id.and_then(|id| self.screens.get_mut(&id))
    }

    pub fn get(&self, id: ScreenId) -> Result<&Screen> {
        self.screens.get(&id).ok_or(ScreenError::ScreenNotFound(id))
    }

    pub fn get_mut(&mut self, id: ScreenId) -> Result<&mut Screen> {
        self.screens.get_mut(&id).ok_or(ScreenError::ScreenNotFound(id))
    }

    pub fn screen_ids(&self) -> Vec<ScreenId> {
        let mut ids: Vec<_> = self.screens.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Drop all screens, restart ids at 1, clear the active screen
    pub fn reset(&mut self) {
        let dropped = self.screens.len();
        self.screens.clear();
        self.next_id = 1;
        self.active_id = None;
        info!(dropped, "screen registry reset");
    }
}

impl Default for ScreenRegistry {
    fn default() -> Self {
        Self::new()
    }
}
