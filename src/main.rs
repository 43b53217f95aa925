//! vtscreens - run a Luau screen script on this terminal
//!
//! Usage: `vtscreens [config.toml]`. The script builds screens through the
//! `screens` table; each frame calls its `on_frame(frame)`, steps layer
//! animations on the active screen, and presents the result. Ctrl-C stops
//! the session and restores the terminal.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use vtscreens::config::Config;
use vtscreens::lua::LuaRuntime;
use vtscreens::registry::ScreenRegistry;
use vtscreens::session::{lock_registry, Session};
use vtscreens::terminal::StdoutProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is the screen
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vtscreens=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("vtscreens.toml"));
    let config = Config::load(&config_path).context("failed to load config")?;
    info!(script = %config.script_path.display(), "starting vtscreens");

    let registry = Arc::new(Mutex::new(ScreenRegistry::new()));
    let lua = LuaRuntime::new(registry.clone()).context("failed to create Lua runtime")?;
    lua.load_script(&config.script_path)?;
    if !lua.has_on_frame() {
        info!("script has no on_frame hook, presenting static screens");
    }

    let provider = Arc::new(StdoutProvider {
        alternate_screen: config.alternate_screen,
    });
    let session = Arc::new(Session::with_registry(provider, registry.clone()));

    let runner = {
        let session = session.clone();
        tokio::spawn(async move { session.start().await })
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(config.frame_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut frame: u64 = 0;
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, stopping");
                break;
            }
            _ = ticker.tick() => {}
        }

        if runner.is_finished() {
            // start() only returns early when acquisition failed
            break;
        }
        if !session.is_attached().await {
            continue;
        }

        if let Err(e) = lua.call_on_frame(frame) {
            warn!("on_frame failed: {:#}", e);
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_tick);
        last_tick = now;
        if let Some(screen) = lock_registry(&registry).active_screen_mut() {
            screen.advance_animations(elapsed);
        }

        if let Err(e) = session.present(config.is_full_repaint_frame(frame)).await {
            error!("present failed: {:#}", e);
            break;
        }
        frame += 1;
    }

    let stopped = session.stop().await;
    match runner.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(e) => return Err(e).context("session task panicked"),
    }
    stopped?;

    info!(frames = frame, "vtscreens exited");
    Ok(())
}
