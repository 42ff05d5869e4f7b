use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::settings::Hotkey;
use crate::types::Modifiers;

/// True when the event's keycode and exact modifier set match `hotkey`.
pub fn matches(hotkey: &Hotkey, keycode: i64, flags: u64) -> bool {
    keycode == hotkey.keycode as i64 && (flags & Modifiers::ALL.bits()) == hotkey.modifiers.bits()
}

/// Start a background thread that listens for the global `hotkey`.
/// Sets `flag` to `true` when the hotkey is pressed.
#[cfg(target_os = "macos")]
pub fn start_hotkey_listener(hotkey: Hotkey, flag: Arc<AtomicBool>) {
    use std::ffi::c_void;

    // CGEventTap FFI types and functions
    type CGEventTapProxy = *mut c_void;
    type CGEventRef = *mut c_void;
    type CFMachPortRef = *mut c_void;
    type CFRunLoopSourceRef = *mut c_void;
    type CFRunLoopRef = *mut c_void;
    type CFStringRef = *const c_void;
    type CGEventMask = u64;
    type CGEventType = u32;
    type CGEventFlags = u64;

    type CGEventTapCallBack = unsafe extern "C" fn(
        CGEventTapProxy,
        CGEventType,
        CGEventRef,
        *mut c_void,
    ) -> CGEventRef;

    const K_CG_HID_EVENT_TAP: u32 = 0; // kCGHIDEventTap
    const K_CG_HEAD_INSERT_EVENT_TAP: u32 = 0;
    const K_CG_EVENT_TAP_OPTION_LISTEN_ONLY: u32 = 1;
    const CG_EVENT_KEY_DOWN: u32 = 10;
    const CG_EVENT_FLAGS_CHANGED: u32 = 12;
    const CG_EVENT_TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFFFFFE;

    // Keyboard event keycode field
    const K_CG_KEYBOARD_EVENT_KEYCODE: u32 = 9;

    extern "C" {
        fn CGEventTapCreate(
            tap: u32,
            place: u32,
            options: u32,
            events_of_interest: CGEventMask,
            callback: CGEventTapCallBack,
            user_info: *mut c_void,
        ) -> CFMachPortRef;

        fn CFMachPortCreateRunLoopSource(
            allocator: *const c_void,
            port: CFMachPortRef,
            order: i64,
        ) -> CFRunLoopSourceRef;

        fn CFRunLoopGetCurrent() -> CFRunLoopRef;

        fn CFRunLoopAddSource(
            rl: CFRunLoopRef,
            source: CFRunLoopSourceRef,
            mode: CFStringRef,
        );

        fn CFRunLoopRun();

        fn CGEventGetFlags(event: CGEventRef) -> CGEventFlags;
        fn CGEventGetIntegerValueField(event: CGEventRef, field: u32) -> i64;
        fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);

        static kCFRunLoopCommonModes: CFStringRef;
    }

    struct TapState {
        hotkey: Hotkey,
        flag: Arc<AtomicBool>,
    }

    unsafe extern "C" fn hotkey_callback(
        _proxy: CGEventTapProxy,
        event_type: CGEventType,
        event: CGEventRef,
        user_info: *mut c_void,
    ) -> CGEventRef {
        unsafe {
            // A listen-only tap that timed out is re-enabled by the system
            if event_type == CG_EVENT_TAP_DISABLED_BY_TIMEOUT || event_type != CG_EVENT_KEY_DOWN {
                return event;
            }

            let flags = CGEventGetFlags(event);
            let keycode = CGEventGetIntegerValueField(event, K_CG_KEYBOARD_EVENT_KEYCODE);

            let state = &*(user_info as *const TapState);
            if matches(&state.hotkey, keycode, flags) {
                state.flag.store(true, Ordering::Release);
            }

            event
        }
    }

    std::thread::spawn(move || {
        unsafe {
            let mask: CGEventMask = (1 << CG_EVENT_KEY_DOWN) | (1 << CG_EVENT_FLAGS_CHANGED);
            let state_ptr = Box::into_raw(Box::new(TapState { hotkey, flag })) as *mut c_void;

            let tap = CGEventTapCreate(
                K_CG_HID_EVENT_TAP,
                K_CG_HEAD_INSERT_EVENT_TAP,
                K_CG_EVENT_TAP_OPTION_LISTEN_ONLY,
                mask,
                hotkey_callback,
                state_ptr,
            );

            if tap.is_null() {
                crate::logger::error(
                    "failed to create event tap for global hotkey, \
                     grant Accessibility permission to this binary",
                );
                // Reclaim the state so we don't leak
                drop(Box::from_raw(state_ptr as *mut TapState));
                return;
            }

            crate::logger::info(&format!(
                "global hotkey registered (keycode {}, modifiers {:#x})",
                hotkey.keycode,
                hotkey.modifiers.bits()
            ));

            let source = CFMachPortCreateRunLoopSource(std::ptr::null(), tap, 0);
            let run_loop = CFRunLoopGetCurrent();
            CFRunLoopAddSource(run_loop, source, kCFRunLoopCommonModes);
            CGEventTapEnable(tap, true);

            CFRunLoopRun(); // blocks forever
        }
    });
}

#[cfg(not(target_os = "macos"))]
pub fn start_hotkey_listener(_hotkey: Hotkey, _flag: Arc<AtomicBool>) {
    crate::logger::warn("global hotkeys not supported on this platform");
}
