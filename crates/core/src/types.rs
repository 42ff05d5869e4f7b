use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Process identifier (pid_t on macOS)
pub type Pid = i32;

/// Uniform type identifier for plain UTF-8 text on the pasteboard
pub const PLAIN_TEXT: &str = "public.utf8-plain-text";

/// Screen point. The coordinate space depends on the caller; see `Rect`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned screen rectangle. Platform queries produce top-left origin
/// rects; everything the engine hands out is bottom-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Zero-size rect anchored at `p`
    pub fn zero_at(p: Point) -> Self {
        Self { x: p.x, y: p.y, w: 0.0, h: 0.0 }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// Character range of a text selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextRange {
    pub location: usize,
    pub length: usize,
}

impl TextRange {
    pub fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }
}

/// Opaque handle to a platform text-marker range. Only the backend that
/// created it can turn it back into bounds.
pub struct TextMarkerRange(Box<dyn Any>);

impl TextMarkerRange {
    pub fn new<T: Any>(raw: T) -> Self {
        Self(Box::new(raw))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for TextMarkerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TextMarkerRange(..)")
    }
}

/// One pasteboard item: every (format, bytes) pair it offered, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteboardItem {
    pub formats: Vec<(String, Vec<u8>)>,
}

impl PasteboardItem {
    pub fn new(formats: Vec<(String, Vec<u8>)>) -> Self {
        Self { formats }
    }

    pub fn text(text: &str) -> Self {
        Self { formats: vec![(PLAIN_TEXT.to_string(), text.as_bytes().to_vec())] }
    }

    pub fn data(&self, format: &str) -> Option<&[u8]> {
        self.formats
            .iter()
            .find(|(f, _)| f == format)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

/// Full clipboard contents at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteboardSnapshot {
    pub items: Vec<PasteboardItem>,
}

impl PasteboardSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn format_count(&self) -> usize {
        self.items.iter().map(|i| i.formats.len()).sum()
    }
}

/// Result of one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub text: String,
    pub pid: Option<Pid>,
}

/// Modifier mask. Bit values match CGEventFlags so they can be posted and
/// compared against tapped events without translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(pub u64);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(0x0002_0000);
    pub const CONTROL: Modifiers = Modifiers(0x0004_0000);
    pub const ALTERNATE: Modifiers = Modifiers(0x0008_0000);
    pub const COMMAND: Modifiers = Modifiers(0x0010_0000);
    pub const ALL: Modifiers = Modifiers(0x001E_0000);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// Virtual key plus modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub keycode: u16,
    pub modifiers: Modifiers,
}

/// How `replace_selection` delivered the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Written straight into the focused element; clipboard untouched
    Direct,
    /// Pasted through the clipboard, which was restored afterwards
    Pasted,
}
