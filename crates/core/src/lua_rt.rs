use std::path::Path;

use anyhow::{Result, anyhow};
use mlua::prelude::*;

use crate::logger;
use crate::sleep;

/// Text-transformation backend as seen by the capture/replace cycle.
pub trait Transform {
    fn name(&self) -> &str;
    fn transform(&self, text: &str) -> Result<String>;
}

/// A transform implemented by a Lua script. The script returns a table:
///
/// ```lua
/// return {
///   name = "tidy",
///   transform = function(text) return text end,
/// }
/// ```
pub struct LuaTransform {
    lua: Lua,
    table_key: LuaRegistryKey,
    name: String,
}

/// Helper to convert mlua::Error -> anyhow::Error
fn lua_err(e: mlua::Error) -> anyhow::Error {
    anyhow!("{}", e)
}

impl LuaTransform {
    /// Load a script from disk. `require()` resolves next to the script.
    pub fn load(path: &Path) -> Result<Self> {
        let code = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {}", path.display(), e))?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transform".to_string());
        Self::from_source(&code, &path.to_string_lossy(), &fallback, path.parent())
    }

    /// Load a script from a string.
    pub fn from_source(
        code: &str,
        chunk_name: &str,
        fallback_name: &str,
        script_dir: Option<&Path>,
    ) -> Result<Self> {
        let lua = Lua::new();
        register_globals(&lua).map_err(lua_err)?;

        if let Some(dir) = script_dir {
            let dir_str = dir.to_string_lossy();
            let pkg: LuaTable = lua.globals().get("package").map_err(lua_err)?;
            pkg.set("path", format!("{}/?.lua;{}/?/init.lua", dir_str, dir_str)).map_err(lua_err)?;
        }

        let table: LuaTable = lua
            .load(code)
            .set_name(chunk_name)
            .eval()
            .map_err(lua_err)?;

        // Validate transform exists
        let _: LuaFunction = table
            .get("transform")
            .map_err(|e| anyhow!("{}: missing transform(text): {}", chunk_name, e))?;

        let name = match table.get::<Option<String>>("name").map_err(lua_err)? {
            Some(n) if !n.is_empty() => n,
            _ => fallback_name.to_string(),
        };

        let table_key = lua.create_registry_value(table).map_err(lua_err)?;
        Ok(Self { lua, table_key, name })
    }
}

impl Transform for LuaTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, text: &str) -> Result<String> {
        let table: LuaTable = self.lua.registry_value(&self.table_key).map_err(lua_err)?;
        let transform_fn: LuaFunction = table.get("transform").map_err(lua_err)?;
        match transform_fn.call::<LuaValue>(text).map_err(lua_err)? {
            LuaValue::String(s) => Ok(s.to_str().map_err(lua_err)?.to_string()),
            other => Err(anyhow!(
                "{}: transform returned {} instead of a string",
                self.name,
                other.type_name()
            )),
        }
    }
}

/// Register the F.* global table into a Lua state.
fn register_globals(lua: &Lua) -> mlua::Result<()> {
    let f_table = lua.create_table()?;

    // F.sleep(seconds)
    let sleep_fn = lua.create_function(|_, secs: f64| {
        sleep::sleep_secs(secs);
        Ok(())
    })?;
    f_table.set("sleep", sleep_fn)?;

    // F.log(msg)
    logger::register_prefix("lua", logger::COLOR_BLUE);
    let log_fn = lua.create_function(|_, msg: String| {
        logger::info_p("lua", &msg);
        Ok(())
    })?;
    f_table.set("log", log_fn)?;

    lua.globals().set("F", f_table)?;
    Ok(())
}
