pub mod stub;
pub mod hotkey;

#[cfg(target_os = "macos")]
pub mod darwin;

use crate::types::*;
use crate::logger;

/// Handle to one introspectable UI element. Dropping it releases the
/// underlying native reference.
pub trait Element {
    /// Pid of the process owning the element.
    fn pid(&self) -> Option<Pid>;
    fn parent(&self) -> Option<Box<dyn Element>>;
    fn selected_text(&self) -> Option<String>;
    /// Overwrite the selection in place. Returns false if the element refused.
    fn set_selected_text(&self, text: &str) -> bool;
    fn selected_range(&self) -> Option<TextRange>;
    /// Top-left origin bounds of `range`.
    fn bounds_for_range(&self, range: TextRange) -> Option<Rect>;
    fn selected_text_marker_range(&self) -> Option<TextMarkerRange>;
    /// Top-left origin bounds of a marker range read from this element.
    fn bounds_for_text_marker_range(&self, range: &TextMarkerRange) -> Option<Rect>;
}

/// OS-wide accessibility tree.
pub trait Accessibility {
    /// Whether this process may use accessibility APIs. `prompt` asks the OS
    /// to show its permission dialog when not yet trusted.
    fn is_trusted(&self, prompt: bool) -> bool;
    fn focused_element(&self) -> Option<Box<dyn Element>>;
    /// Element under a top-left origin screen point.
    fn element_at(&self, point: Point) -> Option<Box<dyn Element>>;
    /// Ask a process to expose its full accessibility tree.
    fn enable_enhanced_ui(&self, pid: Pid);
    fn frontmost_pid(&self) -> Option<Pid>;
}

/// Shared system clipboard.
pub trait Pasteboard {
    fn items(&self) -> Vec<PasteboardItem>;
    fn clear(&mut self);
    fn write_items(&mut self, items: &[PasteboardItem]) -> bool;
    /// Monotonic modification counter.
    fn change_count(&self) -> i64;
    fn string(&self) -> Option<String>;
    /// Replace the whole clipboard with one plain-text item.
    fn set_string(&mut self, text: &str) -> bool;
}

/// OS input pipeline and screen geometry.
pub trait Input {
    fn post_key_chord(&mut self, chord: KeyChord);
    /// Bring the process to the foreground.
    fn activate(&mut self, pid: Pid) -> bool;
    /// Pointer position, bottom-left origin.
    fn pointer_location(&self) -> Point;
    fn primary_display_height(&self) -> Option<f64>;
}

/// The three OS surfaces the engine talks to.
pub struct Platform {
    pub ax: Box<dyn Accessibility>,
    pub pasteboard: Box<dyn Pasteboard>,
    pub input: Box<dyn Input>,
}

/// Create the platform appropriate for the current OS.
pub fn create_platform(force_stub: bool) -> Platform {
    logger::register_prefix("engine", logger::COLOR_CYAN);
    logger::register_prefix("pasteboard", logger::COLOR_GRAY);
    logger::register_prefix("input", logger::COLOR_GRAY);
    logger::register_prefix("locator", logger::COLOR_GRAY);
    if force_stub {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        return stub::Stub::new(stub::StubWorld::demo()).platform();
    }
    #[cfg(target_os = "macos")]
    {
        logger::register_prefix("darwin", logger::COLOR_GRAY);
        return darwin::create();
    }
    #[cfg(not(target_os = "macos"))]
    {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        logger::warn("no native backend for this OS, using stub platform");
        return stub::Stub::new(stub::StubWorld::demo()).platform();
    }
}
