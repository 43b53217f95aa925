//! `screens` table exposed to scripts
//!
//! Scripts address screens by the integer id `screens.create()` returns and
//! layers by the id the layer constructors return. Rows and columns are
//! 1-based, matching the snapshot format; positions before row/col 1 are
//! dropped like any other out-of-bounds write.
//!
//! Colors accept `"#rrggbb"`, palette names, `{r, g, b}`, `"transparent"`
//! and `"transparent_half"`. Foreground defaults to white, background to
//! transparent so text drawn on a layer overlays what's below.

use std::time::Duration;

use mlua::{Lua, LuaSerdeExt, Result as LuaResult, Value};

use crate::color::{Cell, Color, CLEAR_CELL, DEFAULT_FG};
use crate::grid::Grid;
use crate::layer::LayerId;
use crate::registry::ScreenId;
use crate::session::{lock_registry, SharedRegistry};
use crate::snapshot::{paint_cells, ScreenSnapshot, SparseGrid};

/// Convert a 1-based script coordinate to 0-based
fn zero_based(v: i64) -> Option<usize> {
    if v >= 1 {
        usize::try_from(v - 1).ok()
    } else {
        None
    }
}

/// Parse an optional color argument
fn color_arg(value: Option<Value>, default: Color) -> LuaResult<Color> {
    match value {
        None | Some(Value::Nil) => Ok(default),
        Some(Value::String(s)) => {
            let s = s.to_str()?;
            Color::parse(&s).ok_or_else(|| mlua::Error::runtime(format!("unknown color: {}", &*s)))
        }
        Some(Value::Table(t)) => {
            let r: u8 = t.get(1)?;
            let g: u8 = t.get(2)?;
            let b: u8 = t.get(3)?;
            Ok(Color::Rgb(r, g, b))
        }
        Some(other) => Err(mlua::Error::runtime(format!(
            "expected color, got {}",
            other.type_name()
        ))),
    }
}

fn glyph_arg(s: &str) -> char {
    s.chars().next().unwrap_or(' ')
}

/// Run `f` against a drawable layer's current grid
fn with_grid<R>(
    registry: &SharedRegistry,
    screen: u32,
    layer: u32,
    f: impl FnOnce(&mut Grid) -> R,
) -> LuaResult<R> {
    let mut registry = lock_registry(registry);
    let drawable = registry
        .get_mut(ScreenId(screen))
        .and_then(|s| s.drawable_mut(LayerId(layer)))
        .map_err(mlua::Error::external)?;
    Ok(f(drawable.grid_mut()))
}

/// Register the `screens` global table
pub fn register_screens_api(lua: &Lua, registry: SharedRegistry) -> LuaResult<()> {
    let screens = lua.create_table()?;

    // screens.create(snapshot) -> id
    let create_fn = {
        let registry = registry.clone();
        lua.create_function(move |lua, snapshot: Value| {
            let snapshot: ScreenSnapshot = lua.from_value(snapshot)?;
            let id = lock_registry(&registry)
                .create_screen(&snapshot)
                .map_err(mlua::Error::external)?;
            Ok(id.0)
        })?
    };
    screens.set("create", create_fn)?;

    // screens.set(id | nil)
    let set_fn = {
        let registry = registry.clone();
        lua.create_function(move |_lua, id: Option<u32>| {
            lock_registry(&registry)
                .set_screen(id.map(ScreenId))
                .map_err(mlua::Error::external)
        })?
    };
    screens.set("set", set_fn)?;

    // screens.active() -> id or nil
    let active_fn = {
        let registry = registry.clone();
        lua.create_function(move |_lua, ()| {
            Ok(lock_registry(&registry).active_screen_id().map(|id| id.0))
        })?
    };
    screens.set("active", active_fn)?;

    // screens.add_group(screen, name, parent?) -> layer id
    let add_group_fn = {
        let registry = registry.clone();
        lua.create_function(
            move |_lua, (screen, name, parent): (u32, String, Option<u32>)| {
                let mut registry = lock_registry(&registry);
                let id = registry
                    .get_mut(ScreenId(screen))
                    .and_then(|s| s.add_group(name, parent.map(LayerId)))
                    .map_err(mlua::Error::external)?;
                Ok(id.0)
            },
        )?
    };
    screens.set("add_group", add_group_fn)?;

    // screens.add_layer(screen, name, parent?) -> layer id
    let add_layer_fn = {
        let registry = registry.clone();
        lua.create_function(
            move |_lua, (screen, name, parent): (u32, String, Option<u32>)| {
                let mut registry = lock_registry(&registry);
                let id = registry
                    .get_mut(ScreenId(screen))
                    .and_then(|s| s.add_drawable(name, parent.map(LayerId)))
                    .map_err(mlua::Error::external)?;
                Ok(id.0)
            },
        )?
    };
    screens.set("add_layer", add_layer_fn)?;

    // screens.set_visible(screen, layer, visible)
    let set_visible_fn = {
        let registry = registry.clone();
        lua.create_function(move |_lua, (screen, layer, visible): (u32, u32, bool)| {
            lock_registry(&registry)
                .get_mut(ScreenId(screen))
                .and_then(|s| s.set_visible(LayerId(layer), visible))
                .map_err(mlua::Error::external)
        })?
    };
    screens.set("set_visible", set_visible_fn)?;

    // screens.set_parent(screen, layer, group | nil)
    let set_parent_fn = {
        let registry = registry.clone();
        lua.create_function(move |_lua, (screen, layer, parent): (u32, u32, Option<u32>)| {
            lock_registry(&registry)
                .get_mut(ScreenId(screen))
                .and_then(|s| s.set_parent(LayerId(layer), parent.map(LayerId)))
                .map_err(mlua::Error::external)
        })?
    };
    screens.set("set_parent", set_parent_fn)?;

    // screens.move_layer(screen, layer, position) -- position is 1-based, 1 = bottom
    let move_layer_fn = {
        let registry = registry.clone();
        lua.create_function(move |_lua, (screen, layer, position): (u32, u32, i64)| {
            let index = zero_based(position).unwrap_or(0);
            lock_registry(&registry)
                .get_mut(ScreenId(screen))
                .and_then(|s| s.move_layer(LayerId(layer), index))
                .map_err(mlua::Error::external)
        })?
    };
    screens.set("move_layer", move_layer_fn)?;

    // screens.remove_layer(screen, layer)
    let remove_layer_fn = {
        let registry = registry.clone();
        lua.create_function(move |_lua, (screen, layer): (u32, u32)| {
            lock_registry(&registry)
                .get_mut(ScreenId(screen))
                .and_then(|s| s.remove_layer(LayerId(layer)))
                .map(|_| ())
                .map_err(mlua::Error::external)
        })?
    };
    screens.set("remove_layer", remove_layer_fn)?;

    // screens.set_cell(screen, layer, row, col, char, fg?, bg?)
    let set_cell_fn = {
        let registry = registry.clone();
        lua.create_function(
            move |_lua,
                  (screen, layer, row, col, ch, fg, bg): (
                u32,
                u32,
                i64,
                i64,
                String,
                Option<Value>,
                Option<Value>,
            )| {
                let cell = Cell::new(
                    glyph_arg(&ch),
                    color_arg(fg, DEFAULT_FG)?,
                    color_arg(bg, Color::TransparentBg)?,
                );
                with_grid(&registry, screen, layer, |grid| {
                    if let (Some(r), Some(c)) = (zero_based(row), zero_based(col)) {
                        grid.set(r, c, cell);
                    }
                })
            },
        )?
    };
    screens.set("set_cell", set_cell_fn)?;

    // screens.print(screen, layer, row, col, text, fg?, bg?)
    let print_fn = {
        let registry = registry.clone();
        lua.create_function(
            move |_lua,
                  (screen, layer, row, col, text, fg, bg): (
                u32,
                u32,
                i64,
                i64,
                String,
                Option<Value>,
                Option<Value>,
            )| {
                let fg = color_arg(fg, DEFAULT_FG)?;
                let bg = color_arg(bg, Color::TransparentBg)?;
                with_grid(&registry, screen, layer, |grid| {
                    if let (Some(r), Some(c)) = (zero_based(row), zero_based(col)) {
                        grid.print(r, c, &text, fg, bg);
                    }
                })
            },
        )?
    };
    screens.set("print", print_fn)?;

    // screens.fill(screen, layer, row, col, height, width, char?, fg?, bg?)
    let fill_fn = {
        let registry = registry.clone();
        lua.create_function(
            move |_lua,
                  (screen, layer, row, col, height, width, ch, fg, bg): (
                u32,
                u32,
                i64,
                i64,
                i64,
                i64,
                Option<String>,
                Option<Value>,
                Option<Value>,
            )| {
                let cell = Cell::new(
                    ch.as_deref().map(glyph_arg).unwrap_or(' '),
                    color_arg(fg, DEFAULT_FG)?,
                    color_arg(bg, Color::TransparentBg)?,
                );
                let height = usize::try_from(height).unwrap_or(0);
                let width = usize::try_from(width).unwrap_or(0);
                with_grid(&registry, screen, layer, |grid| {
                    if let (Some(r), Some(c)) = (zero_based(row), zero_based(col)) {
                        grid.fill(r, c, height, width, cell);
                    }
                })
            },
        )?
    };
    screens.set("fill", fill_fn)?;

    // screens.draw_box(screen, layer, row, col, height, width, fg?, bg?)
    let draw_box_fn = {
        let registry = registry.clone();
        lua.create_function(
            move |_lua,
                  (screen, layer, row, col, height, width, fg, bg): (
                u32,
                u32,
                i64,
                i64,
                i64,
                i64,
                Option<Value>,
                Option<Value>,
            )| {
                let fg = color_arg(fg, DEFAULT_FG)?;
                let bg = color_arg(bg, Color::TransparentBg)?;
                let height = usize::try_from(height).unwrap_or(0);
                let width = usize::try_from(width).unwrap_or(0);
                with_grid(&registry, screen, layer, |grid| {
                    if let (Some(r), Some(c)) = (zero_based(row), zero_based(col)) {
                        grid.draw_box(r, c, height, width, fg, bg);
                    }
                })
            },
        )?
    };
    screens.set("draw_box", draw_box_fn)?;

    // screens.clear(screen, layer) -- layer becomes fully transparent
    let clear_fn = {
        let registry = registry.clone();
        lua.create_function(move |_lua, (screen, layer): (u32, u32)| {
            with_grid(&registry, screen, layer, |grid| {
                grid.clear(CLEAR_CELL)
            })
        })?
    };
    screens.set("clear", clear_fn)?;

    // screens.animate(screen, layer, frames, frame_ms) -- frames are sparse
    // grids like a snapshot's; an empty list stops the animation
    let animate_fn = {
        let registry = registry.clone();
        lua.create_function(
            move |lua, (screen, layer, frames, frame_ms): (u32, u32, Value, u64)| {
                let frames: Vec<SparseGrid> = lua.from_value(frames)?;
                let grids = frames
                    .iter()
                    .map(|cells| {
                        let mut grid = Grid::transparent();
                        paint_cells(cells, &mut grid).map(|_| grid)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(mlua::Error::external)?;
                lock_registry(&registry)
                    .get_mut(ScreenId(screen))
                    .and_then(|s| {
                        s.set_animation(LayerId(layer), grids, Duration::from_millis(frame_ms))
                    })
                    .map_err(mlua::Error::external)
            },
        )?
    };
    screens.set("animate", animate_fn)?;

    // screens.snapshot(screen) -> snapshot table of the composited screen
    let snapshot_fn = {
        let registry = registry.clone();
        lua.create_function(move |lua, screen: u32| {
            let snapshot = lock_registry(&registry)
                .get(ScreenId(screen))
                .map(|s| s.to_snapshot())
                .map_err(mlua::Error::external)?;
            lua.to_value(&snapshot)
        })?
    };
    screens.set("snapshot", snapshot_fn)?;

    lua.globals().set("screens", screens)?;
    Ok(())
}
