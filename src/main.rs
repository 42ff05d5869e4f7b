use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};

use rewrite_core::engine::SelectionEngine;
use rewrite_core::lua_rt::{LuaTransform, Transform};
use rewrite_core::platform::{create_platform, hotkey};
use rewrite_core::settings::Settings;
use rewrite_core::{logger, types::ReplaceOutcome};

fn main() -> Result<()> {
    let force_stub = std::env::args().any(|a| a == "--stub");
    let once = std::env::args().any(|a| a == "--once");

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    logger::init(&cwd.join("logs"))?;
    logger::set_echo(true);

    let settings = Settings::load(&cwd.join("settings.json"));
    let platform = create_platform(force_stub);

    let script = settings.script_path(&cwd);
    let transform = LuaTransform::load(&script)
        .with_context(|| format!("loading transform script {}", script.display()))?;
    logger::info(&format!("transform '{}' loaded from {}", transform.name(), script.display()));

    let mut engine = SelectionEngine::new(platform, &settings);
    if !engine.is_trusted(true) {
        logger::warn(
            "accessibility permission not granted, selections will be read via the clipboard only",
        );
    }

    if once {
        run_cycle(&mut engine, &transform);
        return Ok(());
    }

    let hotkey_flag = Arc::new(AtomicBool::new(false));
    hotkey::start_hotkey_listener(settings.hotkey, Arc::clone(&hotkey_flag));
    logger::info("rewrite started, waiting for hotkey");

    // The engine is single-threaded, so cycles run here rather than on the tap thread
    loop {
        if hotkey_flag.swap(false, Ordering::Acquire) {
            run_cycle(&mut engine, &transform);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// capture -> locate -> transform -> replace
fn run_cycle(engine: &mut SelectionEngine, transform: &dyn Transform) {
    let Some(selection) = engine.capture_selection() else {
        logger::info("nothing selected");
        return;
    };

    let rect = engine.locate_selection_rect();
    logger::info(&format!(
        "selection at ({:.0}, {:.0}) {:.0}x{:.0} in pid {}",
        rect.x,
        rect.y,
        rect.w,
        rect.h,
        selection.pid.map(|p| p.to_string()).unwrap_or_else(|| "?".into()),
    ));

    let replacement = match transform.transform(&selection.text) {
        Ok(text) => text,
        Err(e) => {
            logger::error(&format!("{} failed: {}", transform.name(), e));
            return;
        }
    };
    if replacement == selection.text {
        logger::info("transform left the text unchanged");
        return;
    }

    match engine.replace_selection(&replacement) {
        ReplaceOutcome::Direct => logger::info("replaced in place"),
        ReplaceOutcome::Pasted => logger::info("replaced via paste"),
    }
}
