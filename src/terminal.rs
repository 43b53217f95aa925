//! Terminal handles
//!
//! The session writes escape strings through a [`TerminalHandle`] that a
//! host-supplied [`TerminalProvider`] hands out when the session starts.
//! [`StdoutProvider`] is the real-terminal implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use crossterm::cursor;
use crossterm::style::ResetColor;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::Command;
use tokio::io::{AsyncWriteExt, Stdout};
use tracing::debug;

/// Output side of a terminal
#[async_trait]
pub trait TerminalHandle: Send {
    async fn write(&mut self, ansi: &str) -> Result<()>;

    /// Release the terminal. Nothing is written after this.
    async fn dispose(&mut self) -> Result<()>;
}

/// Acquires a terminal handle for a session
#[async_trait]
pub trait TerminalProvider: Send + Sync {
    async fn request(&self) -> Result<Box<dyn TerminalHandle>>;
}

/// Render a crossterm command to its escape string
fn ansi<C: Command>(command: C) -> String {
    let mut buf = String::new();
    let _ = command.write_ansi(&mut buf);
    buf
}

/// Sequence that prepares a terminal for full-screen drawing
pub fn setup_sequence(alternate_screen: bool) -> String {
    let mut out = String::new();
    if alternate_screen {
        out.push_str(&ansi(EnterAlternateScreen));
    }
    out.push_str(&ansi(cursor::Hide));
    out.push_str(&ansi(Clear(ClearType::All)));
    out
}

/// Sequence that undoes [`setup_sequence`]
pub fn teardown_sequence(alternate_screen: bool) -> String {
    let mut out = ansi(ResetColor);
    out.push_str(&ansi(cursor::Show));
    if alternate_screen {
        out.push_str(&ansi(LeaveAlternateScreen));
    }
    out
}

/// Terminal on the process's stdout
pub struct StdoutTerminal {
    out: Stdout,
    alternate_screen: bool,
    disposed: bool,
}

#[async_trait]
impl TerminalHandle for StdoutTerminal {
    async fn write(&mut self, ansi: &str) -> Result<()> {
        if self.disposed {
            anyhow::bail!("terminal already disposed");
        }
        self.out
            .write_all(ansi.as_bytes())
            .await
            .context("failed to write to stdout")?;
        self.out.flush().await.context("failed to flush stdout")?;
        Ok(())
    }

    async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        let teardown = teardown_sequence(self.alternate_screen);
        self.out.write_all(teardown.as_bytes()).await?;
        self.out.flush().await?;
        debug!("stdout terminal released");
        Ok(())
    }
}

/// Hands out [`StdoutTerminal`]s
pub struct StdoutProvider {
    pub alternate_screen: bool,
}

#[async_trait]
impl TerminalProvider for StdoutProvider {
    async fn request(&self) -> Result<Box<dyn TerminalHandle>> {
        let mut out = tokio::io::stdout();
        out.write_all(setup_sequence(self.alternate_screen).as_bytes())
            .await
            .context("failed to prepare stdout terminal")?;
        out.flush().await?;
        debug!(alternate_screen = self.alternate_screen, "stdout terminal acquired");
        Ok(Box::new(StdoutTerminal {
            out,
            alternate_screen: self.alternate_screen,
            disposed: false,
        }))
    }
}
