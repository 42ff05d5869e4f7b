//! End-to-end capture/locate/replace cycles against the in-memory platform.
//!
//! Usage: cargo run -p rewrite-test --bin scenarios [-- <filter>]

use libtest_mimic::{Arguments, Failed, Trial};

use rewrite_core::engine::SelectionEngine;
use rewrite_core::lua_rt::{LuaTransform, Transform};
use rewrite_core::pasteboard;
use rewrite_core::platform::stub::{Stub, StubElement, StubWorld};
use rewrite_core::settings::{Settings, Timing};
use rewrite_core::types::*;

fn main() {
    let args = Arguments::from_args();

    let tests = vec![
        Trial::test("direct_selection_skips_clipboard", direct_selection_skips_clipboard),
        Trial::test("copy_fallback_keeps_clipboard", copy_fallback_keeps_clipboard),
        Trial::test("failed_copy_is_absent", failed_copy_is_absent),
        Trial::test("save_restore_is_exact", save_restore_is_exact),
        Trial::test("paste_never_leaves_replacement", paste_never_leaves_replacement),
        Trial::test("rect_from_range_is_flipped", rect_from_range_is_flipped),
        Trial::test("rect_defaults_to_pointer", rect_defaults_to_pointer),
        Trial::test("rect_from_ancestor_marker", rect_from_ancestor_marker),
        Trial::test("enhanced_ui_once_per_pid", enhanced_ui_once_per_pid),
        Trial::test("tidy_cycle_on_demo_world", tidy_cycle_on_demo_world),
    ];

    libtest_mimic::run(&args, tests).exit();
}

fn instant() -> Settings {
    Settings {
        timing: Timing { copy_settle_ms: 0, activate_settle_ms: 0, paste_settle_ms: 0 },
        ..Settings::default()
    }
}

fn rich_clipboard() -> Vec<PasteboardItem> {
    vec![
        PasteboardItem::new(vec![
            (PLAIN_TEXT.into(), b"notes".to_vec()),
            ("public.rtf".into(), b"{\\rtf1 notes}".to_vec()),
        ]),
        PasteboardItem::new(vec![("public.png".into(), vec![0x89, 0x50, 0x4e, 0x47])]),
    ]
}

/// Focused element owned by pid 42 on top of a two-item clipboard.
fn editor(selected: Option<&str>, writable: bool) -> Stub {
    let stub = Stub::new(StubWorld::new());
    stub.with(|w| {
        let window = w.add(StubElement { pid: Some(42), ..Default::default() });
        let field = w.add(StubElement {
            pid: Some(42),
            parent: Some(window),
            selected_text: selected.map(String::from),
            writable,
            ..Default::default()
        });
        w.focused = Some(field);
        w.frontmost = Some(42);
        w.pasteboard = rich_clipboard();
    });
    stub
}

fn check(cond: bool, msg: &str) -> Result<(), Failed> {
    if cond {
        Ok(())
    } else {
        Err(msg.into())
    }
}

fn direct_selection_skips_clipboard() -> Result<(), Failed> {
    let stub = editor(Some("hello world"), true);
    let mut engine = SelectionEngine::new(stub.platform(), &instant());

    let snap = engine.capture_selection().ok_or("expected a selection")?;
    check(snap.text == "hello world", "wrong text")?;
    check(snap.pid == Some(42), "wrong pid")?;
    stub.with(|w| {
        check(w.chords.is_empty(), "copy chord was sent")?;
        check(w.change_count == 0, "clipboard was touched")
    })
}

fn copy_fallback_keeps_clipboard() -> Result<(), Failed> {
    let stub = editor(None, false);
    stub.with(|w| w.copy_responds_with = Some("from the web view".into()));
    let mut engine = SelectionEngine::new(stub.platform(), &instant());

    let snap = engine.capture_selection().ok_or("expected a selection")?;
    check(snap.text == "from the web view", "wrong text")?;
    stub.with(|w| check(w.pasteboard == rich_clipboard(), "clipboard not restored"))
}

fn failed_copy_is_absent() -> Result<(), Failed> {
    let stub = editor(None, false);
    let mut engine = SelectionEngine::new(stub.platform(), &instant());

    check(engine.capture_selection().is_none(), "expected no selection")?;
    stub.with(|w| check(w.pasteboard == rich_clipboard(), "clipboard not intact"))
}

fn save_restore_is_exact() -> Result<(), Failed> {
    let stub = editor(None, false);
    let mut platform = stub.platform();

    let snapshot = pasteboard::save(platform.pasteboard.as_ref());
    check(snapshot.format_count() == 3, "expected three formats")?;
    platform.pasteboard.set_string("scratch");
    pasteboard::restore(platform.pasteboard.as_mut(), &snapshot);
    stub.with(|w| check(w.pasteboard == rich_clipboard(), "restore differs"))
}

fn paste_never_leaves_replacement() -> Result<(), Failed> {
    let stub = editor(Some("old"), false);
    let mut engine = SelectionEngine::new(stub.platform(), &instant());
    engine.capture_selection().ok_or("expected a selection")?;

    let outcome = engine.replace_selection("new");
    check(outcome == ReplaceOutcome::Pasted, "expected paste path")?;
    stub.with(|w| {
        check(w.pasted == vec!["new".to_string()], "replacement not pasted")?;
        check(w.activations == vec![42], "source app not reactivated")?;
        check(w.clipboard_text().as_deref() == Some("notes"), "clipboard not restored")
    })
}

fn rect_from_range_is_flipped() -> Result<(), Failed> {
    let stub = editor(Some("hello"), false);
    stub.with(|w| {
        if let Some(id) = w.focused {
            w.elements[id].selected_range = Some(TextRange::new(0, 5));
            w.elements[id].range_bounds = Some(Rect::new(100.0, 200.0, 50.0, 20.0));
        }
    });
    let mut engine = SelectionEngine::new(stub.platform(), &instant());
    engine.capture_selection();

    let rect = engine.locate_selection_rect();
    check(rect == Rect::new(100.0, 780.0, 50.0, 20.0), &format!("got {:?}", rect))
}

fn rect_defaults_to_pointer() -> Result<(), Failed> {
    let stub = Stub::new(StubWorld::new());
    stub.with(|w| w.pointer = Point::new(400.0, 300.0));
    let mut engine = SelectionEngine::new(stub.platform(), &instant());
    engine.capture_selection();

    let rect = engine.locate_selection_rect();
    check(rect == Rect::new(400.0, 300.0, 0.0, 0.0), &format!("got {:?}", rect))?;
    // probe uses top-left coordinates
    stub.with(|w| check(w.pointer_probes == vec![Point::new(400.0, 700.0)], "wrong probe point"))
}

fn rect_from_ancestor_marker() -> Result<(), Failed> {
    let stub = editor(Some("cell text"), false);
    stub.with(|w| {
        // the window above the field exposes the marker range
        w.elements[0].marker_bounds = Some(Rect::new(10.0, 40.0, 200.0, 30.0));
    });
    let mut engine = SelectionEngine::new(stub.platform(), &instant());
    engine.capture_selection();

    let rect = engine.locate_selection_rect();
    check(rect == Rect::new(10.0, 930.0, 200.0, 30.0), &format!("got {:?}", rect))
}

fn enhanced_ui_once_per_pid() -> Result<(), Failed> {
    let stub = editor(Some("x"), false);
    let mut engine = SelectionEngine::new(stub.platform(), &instant());
    for _ in 0..3 {
        engine.capture_selection();
    }
    stub.with(|w| {
        if let Some(id) = w.focused {
            w.elements[id].pid = Some(43);
        }
    });
    engine.capture_selection();

    let calls = stub.with(|w| w.enhanced_ui_calls.clone());
    check(calls == vec![42, 43], &format!("got {:?}", calls))
}

fn tidy_cycle_on_demo_world() -> Result<(), Failed> {
    let stub = Stub::new(StubWorld::demo());
    let mut engine = SelectionEngine::new(stub.platform(), &instant());
    let tidy = LuaTransform::from_source(
        r#"return {
            name = "tidy",
            transform = function(s)
              return (s:gsub("teh", "the"):gsub(" +", " "))
            end,
        }"#,
        "tidy.lua",
        "tidy",
        None,
    )
    .map_err(|e| e.to_string())?;

    let snap = engine.capture_selection().ok_or("expected a selection")?;
    let replacement = tidy.transform(&snap.text).map_err(|e| e.to_string())?;
    check(replacement == "the quick brown fox", &format!("got {:?}", replacement))?;

    let outcome = engine.replace_selection(&replacement);
    check(outcome == ReplaceOutcome::Direct, "expected direct write")?;
    stub.with(|w| {
        check(w.direct_writes == vec![replacement.clone()], "write not recorded")?;
        check(w.clipboard_text().as_deref() == Some("previous clipboard"), "clipboard touched")
    })
}
