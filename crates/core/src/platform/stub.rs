//! In-memory platform. Drives `--stub` runs, unit tests and the scenario
//! harness: every OS surface reads and writes one shared `StubWorld`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::input::{COPY, PASTE};
use crate::logger;
use crate::types::*;
use super::{Accessibility, Element, Input, Pasteboard, Platform};

pub type ElementId = usize;

/// One fake UI element. `marker_bounds` doubles as the presence of a
/// selected text-marker range.
#[derive(Debug, Clone, Default)]
pub struct StubElement {
    pub pid: Option<Pid>,
    pub parent: Option<ElementId>,
    pub selected_text: Option<String>,
    pub writable: bool,
    pub selected_range: Option<TextRange>,
    pub range_bounds: Option<Rect>,
    pub marker_bounds: Option<Rect>,
}

#[derive(Debug, Default)]
pub struct StubWorld {
    pub elements: Vec<StubElement>,
    pub focused: Option<ElementId>,
    pub under_pointer: Option<ElementId>,
    pub frontmost: Option<Pid>,
    pub trusted: bool,
    /// Bottom-left origin
    pub pointer: Point,
    pub display_height: Option<f64>,
    pub pasteboard: Vec<PasteboardItem>,
    pub change_count: i64,
    /// What the frontmost app puts on the clipboard when it sees the copy
    /// chord. `None` means it ignores the chord.
    pub copy_responds_with: Option<String>,

    // Recorded side effects
    pub enhanced_ui_calls: Vec<Pid>,
    pub chords: Vec<KeyChord>,
    pub activations: Vec<Pid>,
    pub direct_writes: Vec<String>,
    pub pasted: Vec<String>,
    pub pointer_probes: Vec<Point>,
}

impl StubWorld {
    pub fn new() -> Self {
        Self {
            trusted: true,
            display_height: Some(1000.0),
            ..Self::default()
        }
    }

    /// A text editor with a selection and a two-format clipboard.
    pub fn demo() -> Self {
        let mut world = Self::new();
        let window = world.add(StubElement { pid: Some(4242), ..Default::default() });
        let field = world.add(StubElement {
            pid: Some(4242),
            parent: Some(window),
            selected_text: Some("teh quick  brown fox".into()),
            writable: true,
            selected_range: Some(TextRange::new(0, 20)),
            range_bounds: Some(Rect::new(120.0, 340.0, 160.0, 18.0)),
            ..Default::default()
        });
        world.focused = Some(field);
        world.frontmost = Some(4242);
        world.pointer = Point::new(200.0, 650.0);
        world.pasteboard = vec![PasteboardItem::new(vec![
            (PLAIN_TEXT.into(), b"previous clipboard".to_vec()),
            ("public.html".into(), b"<p>previous clipboard</p>".to_vec()),
        ])];
        world
    }

    pub fn add(&mut self, element: StubElement) -> ElementId {
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn clipboard_text(&self) -> Option<String> {
        self.pasteboard
            .first()
            .and_then(|item| item.data(PLAIN_TEXT))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    fn clear_pasteboard(&mut self) {
        self.pasteboard.clear();
        self.change_count += 1;
    }

    fn receive_chord(&mut self, chord: KeyChord) {
        self.chords.push(chord);
        if chord == COPY {
            if let Some(text) = self.copy_responds_with.clone() {
                self.clear_pasteboard();
                self.pasteboard.push(PasteboardItem::text(&text));
            }
        } else if chord == PASTE {
            if let Some(text) = self.clipboard_text() {
                if let Some(el) = self.focused.and_then(|id| self.elements.get_mut(id)) {
                    el.selected_text = Some(text.clone());
                }
                self.pasted.push(text);
            }
        }
    }
}

/// Shared handle to a `StubWorld`.
#[derive(Clone)]
pub struct Stub {
    world: Rc<RefCell<StubWorld>>,
}

impl Stub {
    pub fn new(world: StubWorld) -> Self {
        Self { world: Rc::new(RefCell::new(world)) }
    }

    /// Build a platform whose surfaces all act on this world.
    pub fn platform(&self) -> Platform {
        Platform {
            ax: Box::new(StubAccessibility { world: Rc::clone(&self.world) }),
            pasteboard: Box::new(StubPasteboard { world: Rc::clone(&self.world) }),
            input: Box::new(StubInput { world: Rc::clone(&self.world) }),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut StubWorld) -> R) -> R {
        f(&mut self.world.borrow_mut())
    }
}

struct StubAccessibility {
    world: Rc<RefCell<StubWorld>>,
}

impl StubAccessibility {
    fn handle(&self, id: ElementId) -> Box<dyn Element> {
        Box::new(StubHandle { world: Rc::clone(&self.world), id })
    }
}

impl Accessibility for StubAccessibility {
    fn is_trusted(&self, _prompt: bool) -> bool {
        self.world.borrow().trusted
    }

    fn focused_element(&self) -> Option<Box<dyn Element>> {
        let id = self.world.borrow().focused?;
        Some(self.handle(id))
    }

    fn element_at(&self, point: Point) -> Option<Box<dyn Element>> {
        let id = {
            let mut w = self.world.borrow_mut();
            w.pointer_probes.push(point);
            w.under_pointer?
        };
        Some(self.handle(id))
    }

    fn enable_enhanced_ui(&self, pid: Pid) {
        logger::info_p("stub", &format!("enable_enhanced_ui({})", pid));
        self.world.borrow_mut().enhanced_ui_calls.push(pid);
    }

    fn frontmost_pid(&self) -> Option<Pid> {
        self.world.borrow().frontmost
    }
}

struct StubHandle {
    world: Rc<RefCell<StubWorld>>,
    id: ElementId,
}

impl StubHandle {
    fn get<R>(&self, f: impl FnOnce(&StubElement) -> Option<R>) -> Option<R> {
        self.world.borrow().elements.get(self.id).and_then(f)
    }
}

impl Element for StubHandle {
    fn pid(&self) -> Option<Pid> {
        self.get(|e| e.pid)
    }

    fn parent(&self) -> Option<Box<dyn Element>> {
        let id = self.get(|e| e.parent)?;
        Some(Box::new(StubHandle { world: Rc::clone(&self.world), id }))
    }

    fn selected_text(&self) -> Option<String> {
        self.get(|e| e.selected_text.clone())
    }

    fn set_selected_text(&self, text: &str) -> bool {
        let mut w = self.world.borrow_mut();
        let Some(el) = w.elements.get_mut(self.id) else { return false };
        if !el.writable {
            return false;
        }
        el.selected_text = Some(text.to_string());
        w.direct_writes.push(text.to_string());
        true
    }

    fn selected_range(&self) -> Option<TextRange> {
        self.get(|e| e.selected_range)
    }

    fn bounds_for_range(&self, range: TextRange) -> Option<Rect> {
        self.get(|e| match e.selected_range {
            Some(r) if r == range => e.range_bounds,
            _ => None,
        })
    }

    fn selected_text_marker_range(&self) -> Option<TextMarkerRange> {
        self.get(|e| e.marker_bounds.map(|_| TextMarkerRange::new(self.id)))
    }

    fn bounds_for_text_marker_range(&self, range: &TextMarkerRange) -> Option<Rect> {
        let owner = *range.downcast_ref::<ElementId>()?;
        if owner != self.id {
            return None;
        }
        self.get(|e| e.marker_bounds)
    }
}

struct StubPasteboard {
    world: Rc<RefCell<StubWorld>>,
}

impl Pasteboard for StubPasteboard {
    fn items(&self) -> Vec<PasteboardItem> {
        self.world.borrow().pasteboard.clone()
    }

    fn clear(&mut self) {
        self.world.borrow_mut().clear_pasteboard();
    }

    fn write_items(&mut self, items: &[PasteboardItem]) -> bool {
        self.world.borrow_mut().pasteboard.extend_from_slice(items);
        true
    }

    fn change_count(&self) -> i64 {
        self.world.borrow().change_count
    }

    fn string(&self) -> Option<String> {
        self.world.borrow().clipboard_text()
    }

    fn set_string(&mut self, text: &str) -> bool {
        let mut w = self.world.borrow_mut();
        w.clear_pasteboard();
        w.pasteboard.push(PasteboardItem::text(text));
        true
    }
}

struct StubInput {
    world: Rc<RefCell<StubWorld>>,
}

impl Input for StubInput {
    fn post_key_chord(&mut self, chord: KeyChord) {
        logger::info_p("stub", &format!("post_key_chord({:?})", chord));
        self.world.borrow_mut().receive_chord(chord);
    }

    fn activate(&mut self, pid: Pid) -> bool {
        let mut w = self.world.borrow_mut();
        w.activations.push(pid);
        w.frontmost = Some(pid);
        true
    }

    fn pointer_location(&self) -> Point {
        self.world.borrow().pointer
    }

    fn primary_display_height(&self) -> Option<f64> {
        self.world.borrow().display_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_chord_only_changes_clipboard_when_app_responds() {
        let stub = Stub::new(StubWorld::new());
        let mut platform = stub.platform();

        platform.input.post_key_chord(COPY);
        assert_eq!(platform.pasteboard.change_count(), 0);

        stub.with(|w| w.copy_responds_with = Some("hello".into()));
        platform.input.post_key_chord(COPY);
        assert_eq!(platform.pasteboard.change_count(), 1);
        assert_eq!(platform.pasteboard.string().as_deref(), Some("hello"));
    }

    #[test]
    fn test_marker_range_is_bound_to_its_element() {
        let stub = Stub::new(StubWorld::new());
        let (a, b) = stub.with(|w| {
            let rect = Some(Rect::new(1.0, 2.0, 3.0, 4.0));
            let a = w.add(StubElement { marker_bounds: rect, ..Default::default() });
            let b = w.add(StubElement { marker_bounds: rect, ..Default::default() });
            (a, b)
        });
        let ha = StubHandle { world: Rc::clone(&stub.world), id: a };
        let hb = StubHandle { world: Rc::clone(&stub.world), id: b };

        let range = ha.selected_text_marker_range().unwrap();
        assert!(ha.bounds_for_text_marker_range(&range).is_some());
        assert!(hb.bounds_for_text_marker_range(&range).is_none());
    }
}
