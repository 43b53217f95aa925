//! Session integration tests
//!
//! Drives a Session against an in-memory terminal that records every
//! write, so frame output and the stop/reset contract can be checked
//! without a real tty.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use vtscreens::color::{Cell, Color};
use vtscreens::error::ScreenError;
use vtscreens::registry::ScreenId;
use vtscreens::renderer::CURSOR_HOME;
use vtscreens::session::{lock_registry, Session};
use vtscreens::snapshot::{CellSnapshot, ScreenSnapshot};
use vtscreens::terminal::{TerminalHandle, TerminalProvider};

// ============================================================================
// Recording terminal
// ============================================================================

#[derive(Default)]
struct Recorded {
    writes: Mutex<Vec<String>>,
    disposed: AtomicBool,
    requests: AtomicUsize,
}

impl Recorded {
    fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

struct RecordingTerminal {
    recorded: Arc<Recorded>,
}

#[async_trait]
impl TerminalHandle for RecordingTerminal {
    async fn write(&mut self, ansi: &str) -> Result<()> {
        if self.recorded.disposed.load(Ordering::SeqCst) {
            anyhow::bail!("write after dispose");
        }
        self.recorded.writes.lock().unwrap().push(ansi.to_string());
        Ok(())
    }

    async fn dispose(&mut self) -> Result<()> {
        self.recorded.disposed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct RecordingProvider {
    recorded: Arc<Recorded>,
}

#[async_trait]
impl TerminalProvider for RecordingProvider {
    async fn request(&self) -> Result<Box<dyn TerminalHandle>> {
        self.recorded.requests.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingTerminal {
            recorded: self.recorded.clone(),
        }))
    }
}

/// Hands out a terminal only after `release` is notified
struct GatedProvider {
    recorded: Arc<Recorded>,
    release: Arc<Notify>,
}

#[async_trait]
impl TerminalProvider for GatedProvider {
    async fn request(&self) -> Result<Box<dyn TerminalHandle>> {
        self.recorded.requests.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Ok(Box::new(RecordingTerminal {
            recorded: self.recorded.clone(),
        }))
    }
}

struct FailingProvider;

#[async_trait]
impl TerminalProvider for FailingProvider {
    async fn request(&self) -> Result<Box<dyn TerminalHandle>> {
        anyhow::bail!("no terminal available")
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn recording_session() -> (Arc<Session>, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let provider = Arc::new(RecordingProvider {
        recorded: recorded.clone(),
    });
    (Arc::new(Session::new(provider)), recorded)
}

fn snapshot_with(row: u32, col: u32, ch: &str) -> ScreenSnapshot {
    let mut snap = ScreenSnapshot::blank(80, 25);
    snap.grid.0.entry(row).or_default().0.insert(
        col,
        CellSnapshot {
            glyph: ch.to_string(),
            fg: Color::Rgb(255, 0, 0),
            bg: Color::Rgb(0, 0, 255),
        },
    );
    snap
}

/// Spawn start() and wait until the terminal is attached
async fn start(session: &Arc<Session>) -> tokio::task::JoinHandle<Result<()>> {
    let handle = {
        let session = session.clone();
        tokio::spawn(async move { session.start().await })
    };
    for _ in 0..100 {
        if session.is_attached().await {
            return handle;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session never attached a terminal");
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_present_full_then_diff() -> Result<()> {
    let (session, recorded) = recording_session();
    let runner = start(&session).await;

    let id = session.create_screen(&ScreenSnapshot::blank(80, 25))?;
    session.set_screen(Some(id))?;

    assert!(session.present(false).await?, "first frame is a full repaint");
    let writes = recorded.writes();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].starts_with(CURSOR_HOME));
    assert_eq!(writes[0].matches(' ').count(), 80 * 25);

    // Nothing changed: nothing written
    assert!(!session.present(false).await?);
    assert_eq!(recorded.writes().len(), 1);

    {
        let registry = session.registry();
        let mut registry = lock_registry(&registry);
        let screen = registry.get_mut(id)?;
        let base = screen.layers()[0].id();
        screen
            .drawable_mut(base)?
            .grid_mut()
            .set(3, 4, Cell::new('Z', Color::Rgb(1, 2, 3), Color::Rgb(4, 5, 6)));
    }

    assert!(session.present(false).await?);
    let writes = recorded.writes();
    assert_eq!(writes.len(), 2);
    let diff = &writes[1];
    assert!(diff.contains("\x1b[4;5H"), "diff positions the cursor 1-based: {:?}", diff);
    assert!(diff.contains('Z'));
    assert!(!diff.starts_with(CURSOR_HOME));

    // Forced full repaint even without changes
    assert!(session.present(true).await?);
    assert!(recorded.writes()[2].starts_with(CURSOR_HOME));

    session.stop().await?;
    runner.await??;
    Ok(())
}

#[tokio::test]
async fn test_switching_screens_repaints_fully() -> Result<()> {
    let (session, recorded) = recording_session();
    let runner = start(&session).await;

    let a = session.create_screen(&ScreenSnapshot::blank(80, 25))?;
    let b = session.create_screen(&snapshot_with(1, 1, "B"))?;

    session.set_screen(Some(a))?;
    session.present(false).await?;
    session.set_screen(Some(b))?;
    assert!(session.present(false).await?);

    let writes = recorded.writes();
    assert!(writes[1].starts_with(CURSOR_HOME));
    assert!(writes[1].contains('B'));

    session.stop().await?;
    runner.await??;
    Ok(())
}

#[tokio::test]
async fn test_no_active_screen_writes_nothing() -> Result<()> {
    let (session, recorded) = recording_session();
    let runner = start(&session).await;

    session.create_screen(&ScreenSnapshot::blank(80, 25))?;
    assert!(!session.present(false).await?);

    let id = session.create_screen(&ScreenSnapshot::blank(80, 25))?;
    session.set_screen(Some(id))?;
    session.present(false).await?;
    session.set_screen(None)?;
    assert!(!session.present(true).await?);
    assert_eq!(recorded.writes().len(), 1);

    session.stop().await?;
    runner.await??;
    Ok(())
}

#[tokio::test]
async fn test_stop_disposes_and_resets() -> Result<()> {
    let (session, recorded) = recording_session();
    let runner = start(&session).await;
    assert!(session.is_running());

    let first = session.create_screen(&ScreenSnapshot::blank(80, 25))?;
    let second = session.create_screen(&ScreenSnapshot::blank(80, 25))?;
    assert_eq!((first, second), (ScreenId(1), ScreenId(2)));
    session.set_screen(Some(second))?;

    session.stop().await?;
    assert!(recorded.disposed.load(Ordering::SeqCst), "stop() waits for dispose");
    assert!(!session.is_running());
    runner.await??;

    assert_eq!(session.active_screen_id(), None);
    let err = session.set_screen(Some(second)).unwrap_err();
    assert_eq!(err, ScreenError::ScreenNotFound(ScreenId(2)));
    assert_eq!(err.to_string(), "Screen ID 2 not found");

    // Ids restart after a stop/start cycle
    let runner = start(&session).await;
    assert_eq!(session.create_screen(&ScreenSnapshot::blank(80, 25))?, ScreenId(1));
    assert_eq!(recorded.requests.load(Ordering::SeqCst), 2);

    session.stop().await?;
    runner.await??;
    Ok(())
}

#[tokio::test]
async fn test_start_completes_only_after_stop() -> Result<()> {
    let (session, _recorded) = recording_session();
    let runner = start(&session).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!runner.is_finished(), "start() stays pending while running");

    session.stop().await?;
    tokio::time::timeout(Duration::from_secs(1), runner).await???;
    Ok(())
}

#[tokio::test]
async fn test_stop_during_acquisition_releases_terminal() -> Result<()> {
    let recorded = Arc::new(Recorded::default());
    let release = Arc::new(Notify::new());
    let session = Arc::new(Session::new(Arc::new(GatedProvider {
        recorded: recorded.clone(),
        release: release.clone(),
    })));

    let runner = {
        let session = session.clone();
        tokio::spawn(async move { session.start().await })
    };
    while recorded.requests.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    // stop() lands while the provider is still handing out the terminal
    session.stop().await?;
    release.notify_one();

    tokio::time::timeout(Duration::from_secs(1), runner).await???;
    assert!(recorded.disposed.load(Ordering::SeqCst), "late terminal is released");
    assert!(!session.is_attached().await);
    assert!(!session.is_running());
    Ok(())
}

#[tokio::test]
async fn test_acquisition_failure_leaves_registry() -> Result<()> {
    let session = Session::new(Arc::new(FailingProvider));
    let id = session.create_screen(&ScreenSnapshot::blank(80, 25))?;
    session.set_screen(Some(id))?;

    let err = session.start().await.unwrap_err();
    assert!(format!("{:#}", err).contains("no terminal available"));
    assert!(!session.is_running());

    assert_eq!(session.active_screen_id(), Some(id));
    assert_eq!(lock_registry(&session.registry()).len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_start_twice_is_error() -> Result<()> {
    let (session, _recorded) = recording_session();
    let runner = start(&session).await;

    let err = session.start().await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ScreenError>(),
        Some(&ScreenError::SessionAlreadyRunning)
    );

    session.stop().await?;
    runner.await??;
    Ok(())
}

#[tokio::test]
async fn test_present_without_terminal_is_error() -> Result<()> {
    let (session, recorded) = recording_session();
    let id = session.create_screen(&ScreenSnapshot::blank(80, 25))?;
    session.set_screen(Some(id))?;

    let err = session.present(false).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ScreenError>(),
        Some(&ScreenError::SessionNotRunning)
    );
    assert!(recorded.writes().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stop_when_idle_still_resets() -> Result<()> {
    let (session, recorded) = recording_session();
    session.create_screen(&ScreenSnapshot::blank(80, 25))?;

    session.stop().await?;
    assert!(!recorded.disposed.load(Ordering::SeqCst));
    assert_eq!(session.create_screen(&ScreenSnapshot::blank(80, 25))?, ScreenId(1));
    Ok(())
}
