use crate::input;
use crate::locator;
use crate::logger;
use crate::pasteboard::PasteboardGuard;
use crate::platform::{Element, Platform};
use crate::settings::{Settings, Timing};
use crate::sleep;
use crate::types::*;
use crate::walker::EnhancedUiRegistry;

/// One way of reading the current selection. Tried in order, first hit wins.
type CaptureStrategy = fn(&mut SelectionEngine) -> Option<String>;

const CAPTURE_STRATEGIES: [(&str, CaptureStrategy); 2] = [
    ("accessibility", SelectionEngine::read_focused_selection),
    ("clipboard", SelectionEngine::copy_via_clipboard),
];

/// Reads the user's selection out of the frontmost app and writes text back
/// into it. Holds the per-cycle focused element and the enhanced-UI registry.
///
/// Single-threaded: call it from one thread and run one capture/replace
/// cycle at a time.
pub struct SelectionEngine {
    platform: Platform,
    timing: Timing,
    max_ancestor_depth: usize,
    focused: Option<Box<dyn Element>>,
    source_pid: Option<Pid>,
    enhanced_ui: EnhancedUiRegistry,
}

impl SelectionEngine {
    pub fn new(platform: Platform, settings: &Settings) -> Self {
        Self {
            platform,
            timing: settings.timing,
            max_ancestor_depth: settings.max_ancestor_depth,
            focused: None,
            source_pid: None,
            enhanced_ui: EnhancedUiRegistry::new(),
        }
    }

    pub fn is_trusted(&self, prompt: bool) -> bool {
        self.platform.ax.is_trusted(prompt)
    }

    /// Pid of the app the last capture read from.
    pub fn source_pid(&self) -> Option<Pid> {
        self.source_pid
    }

    pub fn enhanced_ui(&self) -> &EnhancedUiRegistry {
        &self.enhanced_ui
    }

    /// Current selection in the frontmost app, or `None` if nothing is
    /// selected or nothing could be read.
    pub fn capture_selection(&mut self) -> Option<SelectionSnapshot> {
        self.focused = None;

        for (name, strategy) in CAPTURE_STRATEGIES {
            if let Some(text) = strategy(self) {
                logger::info_p(
                    "engine",
                    &format!("captured {} chars via {}", text.chars().count(), name),
                );
                return Some(SelectionSnapshot { text, pid: self.source_pid });
            }
        }
        logger::info_p("engine", "no selection");
        None
    }

    /// Where the selection is on screen, bottom-left origin. Falls back to a
    /// zero-size rect at the pointer, so it always has an answer.
    pub fn locate_selection_rect(&self) -> Rect {
        let display_height = self.platform.input.primary_display_height();
        let pointer = self.platform.input.pointer_location();

        let bounds = self
            .focused
            .as_deref()
            .and_then(|el| locator::find_selection_bounds(el, self.max_ancestor_depth))
            .or_else(|| {
                locator::bounds_at_pointer(
                    self.platform.ax.as_ref(),
                    pointer,
                    display_height,
                    self.max_ancestor_depth,
                )
            });

        match bounds {
            Some(rect) => locator::flip_to_bottom_left(rect, display_height),
            None => {
                logger::info_p("locator", "no selection bounds, anchoring at pointer");
                Rect::zero_at(pointer)
            }
        }
    }

    /// Put `text` in place of the selection captured last. Tries a direct
    /// write first; otherwise pastes through the clipboard and restores it.
    pub fn replace_selection(&mut self, text: &str) -> ReplaceOutcome {
        if let Some(el) = &self.focused {
            if el.set_selected_text(text) {
                logger::info_p("engine", "replaced selection via accessibility");
                return ReplaceOutcome::Direct;
            }
        }

        let mut clipboard = PasteboardGuard::save(self.platform.pasteboard.as_mut());
        if !clipboard.set_string(text) {
            logger::warn_p("pasteboard", "failed to put replacement on clipboard");
        }

        let events = self.platform.input.as_mut();
        if let Some(pid) = self.source_pid {
            if events.activate(pid) {
                sleep::sleep_ms(self.timing.activate_settle_ms);
            } else {
                logger::warn_p("engine", &format!("could not reactivate pid {}", pid));
            }
        }
        input::paste(events, self.timing.paste_settle_ms);

        drop(clipboard);
        logger::info_p("engine", "replaced selection via paste");
        ReplaceOutcome::Pasted
    }

    fn read_focused_selection(&mut self) -> Option<String> {
        let focused = self.platform.ax.focused_element()?;
        let pid = focused.pid();
        self.source_pid = pid;
        if let Some(pid) = pid {
            self.enhanced_ui.enroll(self.platform.ax.as_ref(), pid);
        }

        let text = focused.selected_text().filter(|t| !t.is_empty());
        self.focused = Some(focused);
        text
    }

    fn copy_via_clipboard(&mut self) -> Option<String> {
        if let Some(pid) = self.platform.ax.frontmost_pid() {
            self.source_pid = Some(pid);
        }

        let clipboard = PasteboardGuard::save(self.platform.pasteboard.as_mut());
        input::copy_selection(
            self.platform.input.as_mut(),
            &*clipboard,
            self.timing.copy_settle_ms,
        )
    }
}
