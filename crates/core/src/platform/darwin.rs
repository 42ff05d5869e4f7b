use std::ffi::{c_void, CStr, CString};
use std::process::Command as ProcessCommand;

use core_foundation::base::{CFRange, CFType, CFTypeID, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::display::CGDisplay;
use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use objc::rc::autoreleasepool;
use objc::runtime::{Object, BOOL, NO};
use objc::{class, msg_send, sel, sel_impl};

use crate::logger;
use crate::types::*;
use super::{Accessibility, Element, Input, Pasteboard, Platform};

// --- ApplicationServices FFI ---

type AXUIElementRef = CFTypeRef;
type AXValueRef = CFTypeRef;
type AXError = i32;
type AXValueType = u32;

const K_AX_ERROR_SUCCESS: AXError = 0;
const K_AX_VALUE_CGRECT_TYPE: AXValueType = 3;
const K_AX_VALUE_CFRANGE_TYPE: AXValueType = 4;

const AX_FOCUSED_UI_ELEMENT: &str = "AXFocusedUIElement";
const AX_PARENT: &str = "AXParent";
const AX_SELECTED_TEXT: &str = "AXSelectedText";
const AX_SELECTED_TEXT_RANGE: &str = "AXSelectedTextRange";
const AX_BOUNDS_FOR_RANGE: &str = "AXBoundsForRange";
const AX_SELECTED_TEXT_MARKER_RANGE: &str = "AXSelectedTextMarkerRange";
const AX_BOUNDS_FOR_TEXT_MARKER_RANGE: &str = "AXBoundsForTextMarkerRange";
const AX_ENHANCED_USER_INTERFACE: &str = "AXEnhancedUserInterface";
const AX_MANUAL_ACCESSIBILITY: &str = "AXManualAccessibility";
const AX_TRUSTED_CHECK_OPTION_PROMPT: &str = "AXTrustedCheckOptionPrompt";

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: CFTypeRef) -> bool;
    fn AXUIElementGetTypeID() -> CFTypeID;
    fn AXUIElementCreateSystemWide() -> AXUIElementRef;
    fn AXUIElementCreateApplication(pid: libc::pid_t) -> AXUIElementRef;
    fn AXUIElementCopyAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *mut CFTypeRef,
    ) -> AXError;
    fn AXUIElementSetAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: CFTypeRef,
    ) -> AXError;
    fn AXUIElementCopyParameterizedAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        parameter: CFTypeRef,
        result: *mut CFTypeRef,
    ) -> AXError;
    fn AXUIElementCopyElementAtPosition(
        application: AXUIElementRef,
        x: f32,
        y: f32,
        element: *mut AXUIElementRef,
    ) -> AXError;
    fn AXUIElementGetPid(element: AXUIElementRef, pid: *mut libc::pid_t) -> AXError;
    fn AXValueCreate(value_type: AXValueType, value: *const c_void) -> AXValueRef;
    fn AXValueGetValue(value: AXValueRef, value_type: AXValueType, out: *mut c_void) -> bool;
}

// Class lookups below need AppKit loaded
#[link(name = "AppKit", kind = "framework")]
extern "C" {}

type Id = *mut Object;

/// Wire up the macOS backend.
pub fn create() -> Platform {
    Platform {
        ax: Box::new(DarwinAccessibility),
        pasteboard: Box::new(DarwinPasteboard),
        input: Box::new(DarwinInput),
    }
}

// --- Accessibility ---

struct DarwinAccessibility;

impl DarwinAccessibility {
    fn system_wide() -> Option<CFType> {
        let raw = unsafe { AXUIElementCreateSystemWide() };
        if raw.is_null() {
            return None;
        }
        Some(unsafe { CFType::wrap_under_create_rule(raw) })
    }
}

impl Accessibility for DarwinAccessibility {
    fn is_trusted(&self, prompt: bool) -> bool {
        if !prompt {
            return unsafe { AXIsProcessTrusted() };
        }
        let options = CFDictionary::from_CFType_pairs(&[(
            CFString::new(AX_TRUSTED_CHECK_OPTION_PROMPT).as_CFType(),
            CFBoolean::true_value().as_CFType(),
        )]);
        unsafe { AXIsProcessTrustedWithOptions(options.as_CFTypeRef()) }
    }

    fn focused_element(&self) -> Option<Box<dyn Element>> {
        let system = Self::system_wide()?;
        let focused = copy_attribute(system.as_CFTypeRef(), AX_FOCUSED_UI_ELEMENT)?;
        AxElement::from_value(focused).map(|el| Box::new(el) as Box<dyn Element>)
    }

    fn element_at(&self, point: Point) -> Option<Box<dyn Element>> {
        let system = Self::system_wide()?;
        let mut raw: AXUIElementRef = std::ptr::null();
        let err = unsafe {
            AXUIElementCopyElementAtPosition(
                system.as_CFTypeRef(),
                point.x as f32,
                point.y as f32,
                &mut raw,
            )
        };
        if err != K_AX_ERROR_SUCCESS || raw.is_null() {
            return None;
        }
        let value = unsafe { CFType::wrap_under_create_rule(raw) };
        AxElement::from_value(value).map(|el| Box::new(el) as Box<dyn Element>)
    }

    fn enable_enhanced_ui(&self, pid: Pid) {
        let raw = unsafe { AXUIElementCreateApplication(pid) };
        if raw.is_null() {
            return;
        }
        let app = unsafe { CFType::wrap_under_create_rule(raw) };
        let yes = CFBoolean::true_value();
        for attr in [AX_ENHANCED_USER_INTERFACE, AX_MANUAL_ACCESSIBILITY] {
            let name = CFString::new(attr);
            let err = unsafe {
                AXUIElementSetAttributeValue(
                    app.as_CFTypeRef(),
                    name.as_concrete_TypeRef(),
                    yes.as_CFTypeRef(),
                )
            };
            if err != K_AX_ERROR_SUCCESS {
                logger::info_p("darwin", &format!("{} not accepted by pid {} ({})", attr, pid, err));
            }
        }
    }

    fn frontmost_pid(&self) -> Option<Pid> {
        autoreleasepool(|| unsafe {
            let workspace: Id = msg_send![class!(NSWorkspace), sharedWorkspace];
            if workspace.is_null() {
                return None;
            }
            let app: Id = msg_send![workspace, frontmostApplication];
            if app.is_null() {
                return None;
            }
            let pid: libc::pid_t = msg_send![app, processIdentifier];
            Some(pid)
        })
    }
}

/// Retained AXUIElementRef
struct AxElement {
    raw: CFType,
}

impl AxElement {
    fn from_value(value: CFType) -> Option<Self> {
        if value.type_of() != unsafe { AXUIElementGetTypeID() } {
            return None;
        }
        Some(Self { raw: value })
    }

    fn attribute(&self, name: &str) -> Option<CFType> {
        copy_attribute(self.raw.as_CFTypeRef(), name)
    }

    fn parameterized(&self, name: &str, parameter: CFTypeRef) -> Option<CFType> {
        let attr = CFString::new(name);
        let mut value: CFTypeRef = std::ptr::null();
        let err = unsafe {
            AXUIElementCopyParameterizedAttributeValue(
                self.raw.as_CFTypeRef(),
                attr.as_concrete_TypeRef(),
                parameter,
                &mut value,
            )
        };
        if err != K_AX_ERROR_SUCCESS || value.is_null() {
            return None;
        }
        Some(unsafe { CFType::wrap_under_create_rule(value) })
    }
}

impl Element for AxElement {
    fn pid(&self) -> Option<Pid> {
        let mut pid: libc::pid_t = 0;
        let err = unsafe { AXUIElementGetPid(self.raw.as_CFTypeRef(), &mut pid) };
        (err == K_AX_ERROR_SUCCESS && pid > 0).then_some(pid)
    }

    fn parent(&self) -> Option<Box<dyn Element>> {
        let value = self.attribute(AX_PARENT)?;
        AxElement::from_value(value).map(|el| Box::new(el) as Box<dyn Element>)
    }

    fn selected_text(&self) -> Option<String> {
        self.attribute(AX_SELECTED_TEXT)?
            .downcast::<CFString>()
            .map(|s| s.to_string())
    }

    fn set_selected_text(&self, text: &str) -> bool {
        let name = CFString::new(AX_SELECTED_TEXT);
        let value = CFString::new(text);
        let err = unsafe {
            AXUIElementSetAttributeValue(
                self.raw.as_CFTypeRef(),
                name.as_concrete_TypeRef(),
                value.as_CFTypeRef(),
            )
        };
        err == K_AX_ERROR_SUCCESS
    }

    fn selected_range(&self) -> Option<TextRange> {
        let value = self.attribute(AX_SELECTED_TEXT_RANGE)?;
        let mut range = CFRange { location: 0, length: 0 };
        let ok = unsafe {
            AXValueGetValue(
                value.as_CFTypeRef(),
                K_AX_VALUE_CFRANGE_TYPE,
                &mut range as *mut CFRange as *mut c_void,
            )
        };
        if !ok || range.location < 0 || range.length < 0 {
            return None;
        }
        Some(TextRange::new(range.location as usize, range.length as usize))
    }

    fn bounds_for_range(&self, range: TextRange) -> Option<Rect> {
        let cf_range = CFRange {
            location: range.location as _,
            length: range.length as _,
        };
        let raw = unsafe {
            AXValueCreate(K_AX_VALUE_CFRANGE_TYPE, &cf_range as *const CFRange as *const c_void)
        };
        if raw.is_null() {
            return None;
        }
        let param = unsafe { CFType::wrap_under_create_rule(raw) };
        let bounds = self.parameterized(AX_BOUNDS_FOR_RANGE, param.as_CFTypeRef())?;
        rect_from_value(&bounds)
    }

    fn selected_text_marker_range(&self) -> Option<TextMarkerRange> {
        self.attribute(AX_SELECTED_TEXT_MARKER_RANGE).map(TextMarkerRange::new)
    }

    fn bounds_for_text_marker_range(&self, range: &TextMarkerRange) -> Option<Rect> {
        let marker = range.downcast_ref::<CFType>()?;
        let bounds = self.parameterized(AX_BOUNDS_FOR_TEXT_MARKER_RANGE, marker.as_CFTypeRef())?;
        rect_from_value(&bounds)
    }
}

fn copy_attribute(element: AXUIElementRef, name: &str) -> Option<CFType> {
    let attr = CFString::new(name);
    let mut value: CFTypeRef = std::ptr::null();
    let err = unsafe { AXUIElementCopyAttributeValue(element, attr.as_concrete_TypeRef(), &mut value) };
    if err != K_AX_ERROR_SUCCESS || value.is_null() {
        return None;
    }
    Some(unsafe { CFType::wrap_under_create_rule(value) })
}

fn rect_from_value(value: &CFType) -> Option<Rect> {
    let mut rect = CGRect::new(&CGPoint::new(0.0, 0.0), &CGSize::new(0.0, 0.0));
    let ok = unsafe {
        AXValueGetValue(
            value.as_CFTypeRef(),
            K_AX_VALUE_CGRECT_TYPE,
            &mut rect as *mut CGRect as *mut c_void,
        )
    };
    ok.then(|| Rect::new(rect.origin.x, rect.origin.y, rect.size.width, rect.size.height))
}

// --- Pasteboard ---

struct DarwinPasteboard;

fn general_pasteboard() -> Id {
    unsafe { msg_send![class!(NSPasteboard), generalPasteboard] }
}

unsafe fn ns_string(s: &str) -> Option<Id> {
    let c = CString::new(s).ok()?;
    let ns: Id = msg_send![class!(NSString), stringWithUTF8String: c.as_ptr()];
    (!ns.is_null()).then_some(ns)
}

unsafe fn rust_string(ns: Id) -> Option<String> {
    if ns.is_null() {
        return None;
    }
    let c_str: *const libc::c_char = msg_send![ns, UTF8String];
    if c_str.is_null() {
        return None;
    }
    Some(CStr::from_ptr(c_str).to_string_lossy().into_owned())
}

unsafe fn data_bytes(data: Id) -> Vec<u8> {
    let length: usize = msg_send![data, length];
    let bytes: *const u8 = msg_send![data, bytes];
    if length == 0 || bytes.is_null() {
        return Vec::new();
    }
    std::slice::from_raw_parts(bytes, length).to_vec()
}

impl Pasteboard for DarwinPasteboard {
    fn items(&self) -> Vec<PasteboardItem> {
        autoreleasepool(|| unsafe {
            let mut snapshot = Vec::new();
            let items: Id = msg_send![general_pasteboard(), pasteboardItems];
            if items.is_null() {
                return snapshot;
            }
            let count: usize = msg_send![items, count];
            for i in 0..count {
                let item: Id = msg_send![items, objectAtIndex: i];
                let types: Id = msg_send![item, types];
                let type_count: usize = if types.is_null() { 0 } else { msg_send![types, count] };

                let mut formats = Vec::with_capacity(type_count);
                for t in 0..type_count {
                    let ty: Id = msg_send![types, objectAtIndex: t];
                    let data: Id = msg_send![item, dataForType: ty];
                    if data.is_null() {
                        continue;
                    }
                    if let Some(name) = rust_string(ty) {
                        formats.push((name, data_bytes(data)));
                    }
                }
                snapshot.push(PasteboardItem::new(formats));
            }
            snapshot
        })
    }

    fn clear(&mut self) {
        unsafe {
            let _: isize = msg_send![general_pasteboard(), clearContents];
        }
    }

    fn write_items(&mut self, items: &[PasteboardItem]) -> bool {
        autoreleasepool(|| unsafe {
            let mut objects: Vec<Id> = Vec::with_capacity(items.len());
            for item in items {
                let pb_item: Id = msg_send![class!(NSPasteboardItem), new];
                for (format, bytes) in &item.formats {
                    let Some(ty) = ns_string(format) else { continue };
                    let data: Id = msg_send![class!(NSData),
                        dataWithBytes: bytes.as_ptr() as *const c_void
                        length: bytes.len()];
                    let _: BOOL = msg_send![pb_item, setData: data forType: ty];
                }
                objects.push(pb_item);
            }

            let array: Id = msg_send![class!(NSArray),
                arrayWithObjects: objects.as_ptr()
                count: objects.len()];
            let ok: BOOL = msg_send![general_pasteboard(), writeObjects: array];

            // The array holds its own references
            for obj in objects {
                let _: () = msg_send![obj, release];
            }
            ok != NO
        })
    }

    fn change_count(&self) -> i64 {
        unsafe {
            let count: isize = msg_send![general_pasteboard(), changeCount];
            count as i64
        }
    }

    fn string(&self) -> Option<String> {
        autoreleasepool(|| unsafe {
            let ty = ns_string(PLAIN_TEXT)?;
            let s: Id = msg_send![general_pasteboard(), stringForType: ty];
            rust_string(s)
        })
    }

    fn set_string(&mut self, text: &str) -> bool {
        autoreleasepool(|| unsafe {
            let pb = general_pasteboard();
            let _: isize = msg_send![pb, clearContents];
            let (Some(value), Some(ty)) = (ns_string(text), ns_string(PLAIN_TEXT)) else {
                return false;
            };
            let ok: BOOL = msg_send![pb, setString: value forType: ty];
            ok != NO
        })
    }
}

// --- Input ---

struct DarwinInput;

impl Input for DarwinInput {
    fn post_key_chord(&mut self, chord: KeyChord) {
        let source = match CGEventSource::new(CGEventSourceStateID::HIDSystemState) {
            Ok(s) => s,
            Err(_) => {
                logger::warn_p("darwin", "failed to create event source");
                return;
            }
        };
        let flags = CGEventFlags::from_bits_truncate(chord.modifiers.bits());

        for key_down in [true, false] {
            match CGEvent::new_keyboard_event(source.clone(), chord.keycode, key_down) {
                Ok(event) => {
                    event.set_flags(flags);
                    event.post(CGEventTapLocation::HID);
                }
                Err(_) => {
                    logger::warn_p("darwin", "failed to create keyboard event");
                    return;
                }
            }
        }
    }

    fn activate(&mut self, pid: Pid) -> bool {
        let script = format!(
            "tell application \"System Events\" to set frontmost of first process whose unix id is {} to true",
            pid
        );
        ProcessCommand::new("osascript")
            .arg("-e")
            .arg(&script)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn pointer_location(&self) -> Point {
        // CGEvent locations are top-left origin
        let top_left = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .ok()
            .and_then(|source| CGEvent::new(source).ok())
            .map(|event| event.location());
        match (top_left, self.primary_display_height()) {
            (Some(p), Some(height)) => Point::new(p.x, height - p.y),
            (Some(p), None) => Point::new(p.x, p.y),
            (None, _) => Point::default(),
        }
    }

    fn primary_display_height(&self) -> Option<f64> {
        let height = CGDisplay::main().bounds().size.height;
        (height > 0.0).then_some(height)
    }
}
