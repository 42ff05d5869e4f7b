use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::Modifiers;

/// Settle waits around synthetic input. The OS gives no completion signal,
/// so these are fixed delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Wait after the copy chord before checking the change counter
    pub copy_settle_ms: u64,
    /// Wait after reactivating the source app
    pub activate_settle_ms: u64,
    /// Wait after the paste chord before restoring the clipboard
    pub paste_settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            copy_settle_ms: 150,
            activate_settle_ms: 100,
            paste_settle_ms: 200,
        }
    }
}

/// Global shortcut that triggers one capture/replace cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkey {
    pub keycode: u16,
    pub modifiers: Modifiers,
}

impl Default for Hotkey {
    fn default() -> Self {
        // Ctrl+Shift+T
        Self {
            keycode: 17,
            modifiers: Modifiers::CONTROL | Modifiers::SHIFT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timing: Timing,
    pub max_ancestor_depth: usize,
    pub hotkey: Hotkey,
    pub script: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            max_ancestor_depth: 10,
            hotkey: Hotkey::default(),
            script: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = std::fs::write(path, json);
        }
    }

    /// Transform script path, relative paths resolved against `base`.
    pub fn script_path(&self, base: &Path) -> PathBuf {
        match &self.script {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => base.join(p),
            None => base.join("transform.lua"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{ "timing": { "copy_settle_ms": 400 } }"#).unwrap();
        assert_eq!(s.timing.copy_settle_ms, 400);
        assert_eq!(s.timing.paste_settle_ms, 200);
        assert_eq!(s.max_ancestor_depth, 10);
        assert_eq!(s.hotkey, Hotkey::default());
    }

    #[test]
    fn test_missing_file_defaults() {
        let s = Settings::load(Path::new("/nonexistent/rewrite/settings.json"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("rewrite-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        let mut s = Settings::default();
        s.max_ancestor_depth = 4;
        s.script = Some(PathBuf::from("tidy.lua"));
        s.save(&path);

        assert_eq!(Settings::load(&path), s);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_script_path_resolution() {
        let base = Path::new("/work");
        assert_eq!(Settings::default().script_path(base), PathBuf::from("/work/transform.lua"));

        let s = Settings { script: Some(PathBuf::from("/abs/x.lua")), ..Settings::default() };
        assert_eq!(s.script_path(base), PathBuf::from("/abs/x.lua"));
    }
}
