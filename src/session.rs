//! Running session
//!
//! Ties the registry to a terminal. `start()` acquires a terminal from the
//! provider and then stays pending until `stop()`; `stop()` releases the
//! terminal and hard-resets the registry. `present()` composites the active
//! screen and writes either a full repaint or a diff against the last
//! grid sent.
//!
//! Registry access is serialized through one mutex so script callbacks and
//! host actions can share a session across threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tokio::sync::Mutex as TokioMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ScreenError;
use crate::grid::Grid;
use crate::registry::{ScreenId, ScreenRegistry};
use crate::renderer::{render_diff_ansi_string, render_grid_to_ansi_string};
use crate::snapshot::ScreenSnapshot;
use crate::terminal::{TerminalHandle, TerminalProvider};

/// Registry shared between the session and scripts
pub type SharedRegistry = Arc<Mutex<ScreenRegistry>>;

/// Lock a shared registry. Registry operations never leave it half-updated,
/// so a poisoned lock is still usable.
pub fn lock_registry(registry: &SharedRegistry) -> MutexGuard<'_, ScreenRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Terminal plus what was last written to it
#[derive(Default)]
struct Output {
    terminal: Option<Box<dyn TerminalHandle>>,
    last_sent: Option<(ScreenId, Grid)>,
}

pub struct Session {
    provider: Arc<dyn TerminalProvider>,
    registry: SharedRegistry,
    output: TokioMutex<Output>,
    running: Mutex<Option<CancellationToken>>,
}

impl Session {
    pub fn new(provider: Arc<dyn TerminalProvider>) -> Self {
        Self::with_registry(provider, Arc::new(Mutex::new(ScreenRegistry::new())))
    }

    pub fn with_registry(provider: Arc<dyn TerminalProvider>, registry: SharedRegistry) -> Self {
        Self {
            provider,
            registry,
            output: TokioMutex::new(Output::default()),
            running: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    fn running_slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.running_slot().is_some()
    }

    /// Whether a terminal is currently held (start() got past acquisition)
    pub async fn is_attached(&self) -> bool {
        self.output.lock().await.terminal.is_some()
    }

    pub fn create_screen(&self, snapshot: &ScreenSnapshot) -> Result<ScreenId, ScreenError> {
        lock_registry(&self.registry).create_screen(snapshot)
    }

    pub fn set_screen(&self, id: Option<ScreenId>) -> Result<(), ScreenError> {
        lock_registry(&self.registry).set_screen(id)
    }

    pub fn active_screen_id(&self) -> Option<ScreenId> {
        lock_registry(&self.registry).active_screen_id()
    }

    /// Acquire the terminal and run until [`Session::stop`].
    ///
    /// Acquisition failure is returned as-is and leaves the registry alone.
    pub async fn start(&self) -> Result<()> {
        let token = {
            let mut slot = self.running_slot();
            if slot.is_some() {
                return Err(ScreenError::SessionAlreadyRunning.into());
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };

        info!("acquiring terminal");
        let mut terminal = match self.provider.request().await {
            Ok(terminal) => terminal,
            Err(e) => {
                self.running_slot().take();
                warn!("terminal acquisition failed: {:#}", e);
                return Err(e.context("failed to acquire terminal"));
            }
        };

        {
            // Checked under the output lock so a concurrent stop() either
            // sees the stored terminal or is seen here
            let mut output = self.output.lock().await;
            if token.is_cancelled() {
                debug!("stopped during acquisition, releasing terminal");
                terminal.dispose().await?;
                return Ok(());
            }
            output.terminal = Some(terminal);
        }
        info!("session running");

        token.cancelled().await;
        debug!("session start() unwound");
        Ok(())
    }

    /// Release the terminal, then reset the registry.
    ///
    /// Returns once the terminal is disposed. Safe to call when not running.
    pub async fn stop(&self) -> Result<()> {
        if let Some(token) = self.running_slot().take() {
            token.cancel();
        }

        let released = {
            let mut output = self.output.lock().await;
            output.last_sent = None;
            match output.terminal.take() {
                Some(mut terminal) => terminal.dispose().await.context("failed to release terminal"),
                None => Ok(()),
            }
        };

        lock_registry(&self.registry).reset();
        info!("session stopped");
        released
    }

    /// Composite the active screen and write it out.
    ///
    /// The first frame for a screen, or any frame with `force_full`, is a
    /// full repaint; otherwise only changed cells are sent. Returns whether
    /// anything was written. No active screen writes nothing.
    pub async fn present(&self, force_full: bool) -> Result<bool> {
        let frame = {
            let registry = lock_registry(&self.registry);
            registry.active_screen().map(|s| (s.id(), s.composite()))
        };
        let Some((screen_id, grid)) = frame else {
            return Ok(false);
        };

        let mut output = self.output.lock().await;
        let Output {
            terminal,
            last_sent,
        } = &mut *output;
        let terminal = terminal.as_mut().ok_or(ScreenError::SessionNotRunning)?;

        let ansi = match last_sent {
            Some((last_id, last_grid)) if *last_id == screen_id && !force_full => {
                render_diff_ansi_string(last_grid, &grid)
            }
            _ => Some(render_grid_to_ansi_string(&grid)),
        };

        if let Some(ansi) = &ansi {
            terminal.write(ansi).await.context("failed to write frame")?;
            debug!(screen_id = %screen_id, bytes = ansi.len(), "frame written");
        }
        *last_sent = Some((screen_id, grid));

        Ok(ansi.is_some())
    }
}
