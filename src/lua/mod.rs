//! Lua integration
//!
//! Scripts run in a sandboxed Luau state and drive screens through the
//! `screens` table. A script may define `on_frame(frame)`, which the host
//! calls once per frame before presenting.

pub mod screens;

pub use screens::register_screens_api;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mlua::{Lua, Value};
use tracing::{debug, info, warn};

use crate::session::SharedRegistry;

/// Classify Lua errors for log grouping
fn classify_lua_error(msg: &str) -> &'static str {
    if msg.contains("attempt to index") || msg.contains("attempt to call") {
        "nil_access"
    } else if msg.contains("stack overflow") {
        "stack_overflow"
    } else if msg.contains("syntax error") || msg.contains("unexpected") {
        "syntax"
    } else if msg.contains("not found") {
        "unknown_id"
    } else {
        "runtime"
    }
}

/// Log a Lua error with context
fn record_lua_error(error_type: &str, error_msg: &str) {
    tracing::error!(
        error_type = error_type,
        error_class = classify_lua_error(error_msg),
        "Lua error: {}",
        error_msg
    );
}

/// Sandboxed Lua runtime bound to a screen registry
pub struct LuaRuntime {
    lua: Lua,
}

impl LuaRuntime {
    /// Create a runtime whose `screens` API operates on `registry`
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let lua = Lua::new();

        register_screens_api(&lua, registry)
            .map_err(|e| anyhow::anyhow!("failed to register screens API: {}", e))?;

        // Freeze globals and libraries; script writes go to a local environment
        lua.sandbox(true)
            .map_err(|e| anyhow::anyhow!("failed to enable Lua sandbox: {}", e))?;

        info!("Lua runtime initialized");

        Ok(Self { lua })
    }

    /// Run a chunk of Lua source
    pub fn exec(&self, code: &str, name: &str) -> Result<()> {
        self.lua.load(code).set_name(name).exec().map_err(|e| {
            let msg = format!("{} failed: {}", name, e);
            record_lua_error("exec", &msg);
            anyhow::anyhow!("{}", msg)
        })
    }

    /// Load and run a script file
    pub fn load_script(&self, path: &Path) -> Result<()> {
        let script = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {:?}", path))?;

        self.lua
            .load(&script)
            .set_name(path.to_string_lossy())
            .exec()
            .map_err(|e| {
                let msg = format!("failed to execute script {:?}: {}", path, e);
                record_lua_error("load", &msg);
                anyhow::anyhow!("{}", msg)
            })?;

        if !self.has_on_frame() {
            debug!("script {:?} does not define on_frame", path);
        }

        info!("loaded script from {:?}", path);
        Ok(())
    }

    /// Check if the script defines an on_frame() function
    pub fn has_on_frame(&self) -> bool {
        self.lua
            .globals()
            .get::<Value>("on_frame")
            .map(|v| v.is_function())
            .unwrap_or(false)
    }

    /// Call on_frame(frame) if it exists. Missing hook is a no-op.
    pub fn call_on_frame(&self, frame: u64) -> Result<()> {
        let on_frame: Value = self
            .lua
            .globals()
            .get("on_frame")
            .map_err(|e| anyhow::anyhow!("failed to get on_frame: {}", e))?;

        let func = match on_frame {
            Value::Nil => return Ok(()),
            Value::Function(f) => f,
            _ => {
                warn!("on_frame is not a function");
                anyhow::bail!("on_frame is not a function");
            }
        };

        func.call::<()>(frame).map_err(|e| {
            let msg = format!("on_frame() call failed: {}", e);
            record_lua_error("on_frame", &msg);
            anyhow::anyhow!("{}", msg)
        })
    }
}
