use crate::logger;
use crate::platform::{Input, Pasteboard};
use crate::sleep;
use crate::types::{KeyChord, Modifiers};

// macOS virtual key codes (kVK_ANSI_C / kVK_ANSI_V)
const KEYCODE_C: u16 = 0x08;
const KEYCODE_V: u16 = 0x09;

pub const COPY: KeyChord = KeyChord { keycode: KEYCODE_C, modifiers: Modifiers::COMMAND };
pub const PASTE: KeyChord = KeyChord { keycode: KEYCODE_V, modifiers: Modifiers::COMMAND };

/// Post a chord to whatever app is frontmost. Delivery is not observable.
pub fn emit(input: &mut dyn Input, chord: KeyChord) {
    logger::info_p(
        "input",
        &format!("emit keycode {:#04x} modifiers {:#x}", chord.keycode, chord.modifiers.bits()),
    );
    input.post_key_chord(chord);
}

/// Send the copy chord, wait `settle_ms`, and read the plain text the app
/// copied. The change counter is the only completion signal: if it did not
/// move, nothing was copied. The caller owns the clipboard bracket.
pub fn copy_selection(
    input: &mut dyn Input,
    pasteboard: &dyn Pasteboard,
    settle_ms: u64,
) -> Option<String> {
    let before = pasteboard.change_count();
    emit(input, COPY);
    sleep::sleep_ms(settle_ms);

    if pasteboard.change_count() == before {
        logger::info_p("input", "clipboard unchanged after copy chord");
        return None;
    }
    pasteboard.string().filter(|text| !text.is_empty())
}

/// Send the paste chord and give the target app `settle_ms` to read the
/// clipboard.
pub fn paste(input: &mut dyn Input, settle_ms: u64) {
    emit(input, PASTE);
    sleep::sleep_ms(settle_ms);
}
