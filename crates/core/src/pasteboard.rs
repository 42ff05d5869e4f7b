use std::ops::{Deref, DerefMut};

use crate::logger;
use crate::platform::Pasteboard;
use crate::types::PasteboardSnapshot;

/// Capture every item and every format currently on the clipboard.
pub fn save(pasteboard: &dyn Pasteboard) -> PasteboardSnapshot {
    let snapshot = PasteboardSnapshot { items: pasteboard.items() };
    logger::info_p(
        "pasteboard",
        &format!("saved {} item(s), {} format(s)", snapshot.items.len(), snapshot.format_count()),
    );
    snapshot
}

/// Clear the clipboard and rewrite `snapshot` in its original order.
/// Failures are logged and otherwise ignored.
pub fn restore(pasteboard: &mut dyn Pasteboard, snapshot: &PasteboardSnapshot) {
    pasteboard.clear();
    if snapshot.is_empty() {
        return;
    }
    if !pasteboard.write_items(&snapshot.items) {
        logger::warn_p("pasteboard", "failed to restore clipboard contents");
    }
}

/// Clipboard save/restore bracket. Saves on construction and restores on
/// drop, so every exit path (early return, panic unwind) puts the user's
/// clipboard back.
pub struct PasteboardGuard<'a> {
    pasteboard: &'a mut dyn Pasteboard,
    snapshot: PasteboardSnapshot,
}

impl<'a> PasteboardGuard<'a> {
    pub fn save(pasteboard: &'a mut dyn Pasteboard) -> Self {
        let snapshot = save(&*pasteboard);
        Self { pasteboard, snapshot }
    }

    pub fn snapshot(&self) -> &PasteboardSnapshot {
        &self.snapshot
    }
}

impl<'a> Deref for PasteboardGuard<'a> {
    type Target = dyn Pasteboard + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.pasteboard
    }
}

impl<'a> DerefMut for PasteboardGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.pasteboard
    }
}

impl Drop for PasteboardGuard<'_> {
    fn drop(&mut self) {
        restore(&mut *self.pasteboard, &self.snapshot);
        logger::info_p("pasteboard", "restored clipboard");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::stub::{Stub, StubWorld};
    use crate::types::{PasteboardItem, PLAIN_TEXT};

    fn rich_clipboard() -> Vec<PasteboardItem> {
        vec![
            PasteboardItem::new(vec![
                (PLAIN_TEXT.into(), b"first".to_vec()),
                ("public.rtf".into(), b"{\\rtf1 first}".to_vec()),
                ("com.example.private".into(), vec![0, 159, 146, 150]),
            ]),
            PasteboardItem::new(vec![("public.png".into(), vec![0x89, b'P', b'N', b'G'])]),
            PasteboardItem::text("third"),
        ]
    }

    #[test]
    fn test_save_restore_reproduces_every_item_and_format() {
        let stub = Stub::new(StubWorld::new());
        stub.with(|w| w.pasteboard = rich_clipboard());
        let mut platform = stub.platform();
        let pb = platform.pasteboard.as_mut();

        let snapshot = save(&*pb);
        pb.set_string("clobbered");
        restore(pb, &snapshot);

        assert_eq!(pb.items(), rich_clipboard());
    }

    #[test]
    fn test_restore_on_unchanged_clipboard_is_noop() {
        let stub = Stub::new(StubWorld::new());
        stub.with(|w| w.pasteboard = rich_clipboard());
        let mut platform = stub.platform();
        let pb = platform.pasteboard.as_mut();

        let snapshot = save(&*pb);
        restore(pb, &snapshot);
        assert_eq!(pb.items(), rich_clipboard());
    }

    #[test]
    fn test_empty_clipboard_round_trip() {
        let stub = Stub::new(StubWorld::new());
        let mut platform = stub.platform();
        let pb = platform.pasteboard.as_mut();

        let snapshot = save(&*pb);
        pb.set_string("temp");
        restore(pb, &snapshot);
        assert!(pb.items().is_empty());
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let stub = Stub::new(StubWorld::new());
        stub.with(|w| w.pasteboard = rich_clipboard());
        let mut platform = stub.platform();

        {
            let mut guard = PasteboardGuard::save(platform.pasteboard.as_mut());
            assert_eq!(guard.snapshot().items.len(), 3);
            guard.set_string("transformed");
            assert_eq!(guard.string().as_deref(), Some("transformed"));
        }

        assert_eq!(stub.with(|w| w.pasteboard.clone()), rich_clipboard());
    }

    #[test]
    fn test_guard_restores_on_panic() {
        let stub = Stub::new(StubWorld::new());
        stub.with(|w| w.pasteboard = rich_clipboard());
        let mut platform = stub.platform();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut guard = PasteboardGuard::save(platform.pasteboard.as_mut());
            guard.set_string("transformed");
            panic!("target app went away");
        }));

        assert!(result.is_err());
        assert_eq!(stub.with(|w| w.pasteboard.clone()), rich_clipboard());
    }
}
