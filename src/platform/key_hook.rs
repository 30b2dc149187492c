//! `rdev` keyboard hook feeding shortcut capture.
//!
//! On macOS and Windows the hook grabs events, so a captured key is
//! swallowed. On Linux `rdev` can only listen, so the key still reaches
//! the focused application.

use crate::capture::{CaptureSlot, CaptureSubscription, CapturedKey, KeyCaptureSource};
use global_hotkey::hotkey::{Code, Modifiers};
use rdev::{Event, EventType, Key};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Held modifier keys, tracked per side so releasing one Shift does not
/// drop the other.
#[derive(Debug, Default)]
struct HeldModifiers {
    bits: u8,
}

impl HeldModifiers {
    fn bit(key: Key) -> Option<u8> {
        let bit = match key {
            Key::ShiftLeft => 0,
            Key::ShiftRight => 1,
            Key::ControlLeft => 2,
            Key::ControlRight => 3,
            Key::Alt => 4,
            Key::AltGr => 5,
            Key::MetaLeft => 6,
            Key::MetaRight => 7,
            _ => return None,
        };
        Some(1 << bit)
    }

    /// Returns true if `key` is a modifier.
    fn update(&mut self, key: Key, pressed: bool) -> bool {
        match Self::bit(key) {
            Some(bit) if pressed => self.bits |= bit,
            Some(bit) => self.bits &= !bit,
            None => return false,
        }
        true
    }

    fn modifiers(&self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        if self.bits & 0b0000_0011 != 0 {
            modifiers |= Modifiers::SHIFT;
        }
        if self.bits & 0b0000_1100 != 0 {
            modifiers |= Modifiers::CONTROL;
        }
        if self.bits & 0b0011_0000 != 0 {
            modifiers |= Modifiers::ALT;
        }
        if self.bits & 0b1100_0000 != 0 {
            modifiers |= Modifiers::SUPER;
        }
        modifiers
    }
}

/// Process-wide keyboard hook. Create one and share it.
pub struct RdevKeyHook {
    slot: Arc<CaptureSlot>,
}

impl RdevKeyHook {
    /// Starts the hook thread. The OS hook cannot be removed again, so the
    /// thread lives for the rest of the process.
    pub fn start() -> Self {
        let slot = CaptureSlot::new();
        let held = Arc::new(Mutex::new(HeldModifiers::default()));
        let hook_slot = slot.clone();

        thread::spawn(move || {
            info!("keyboard hook thread started");
            run_hook(hook_slot, held);
            info!("keyboard hook thread exiting");
        });

        Self { slot }
    }
}

impl KeyCaptureSource for RdevKeyHook {
    fn subscribe(&self, deliver: oneshot::Sender<CapturedKey>) -> CaptureSubscription {
        self.slot.arm(deliver)
    }
}

/// Returns true when the event was taken by a capture.
fn handle_event(slot: &CaptureSlot, held: &Mutex<HeldModifiers>, event: &Event) -> bool {
    let Ok(mut held) = held.lock() else {
        return false;
    };
    match event.event_type {
        EventType::KeyPress(key) => {
            if held.update(key, true) {
                return false;
            }
            match hotkey_code(key) {
                Some(code) => slot.offer(CapturedKey::new(code, held.modifiers())),
                None => false,
            }
        }
        EventType::KeyRelease(key) => {
            held.update(key, false);
            false
        }
        _ => false,
    }
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
fn run_hook(slot: Arc<CaptureSlot>, held: Arc<Mutex<HeldModifiers>>) {
    let callback = move |event: Event| {
        if handle_event(&slot, &held, &event) {
            None
        } else {
            Some(event)
        }
    };
    if let Err(error) = rdev::grab(callback) {
        error!(?error, "keyboard hook grab failed");
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn run_hook(slot: Arc<CaptureSlot>, held: Arc<Mutex<HeldModifiers>>) {
    let callback = move |event: Event| {
        handle_event(&slot, &held, &event);
    };
    if let Err(error) = rdev::listen(callback) {
        error!(?error, "keyboard hook listen failed");
    }
}

/// Maps an `rdev` key to the code used for shortcut registration.
/// Modifiers and keys without a registrable code map to `None`.
fn hotkey_code(key: Key) -> Option<Code> {
    let code = match key {
        Key::KeyA => Code::KeyA,
        Key::KeyB => Code::KeyB,
        Key::KeyC => Code::KeyC,
        Key::KeyD => Code::KeyD,
        Key::KeyE => Code::KeyE,
        Key::KeyF => Code::KeyF,
        Key::KeyG => Code::KeyG,
        Key::KeyH => Code::KeyH,
        Key::KeyI => Code::KeyI,
        Key::KeyJ => Code::KeyJ,
        Key::KeyK => Code::KeyK,
        Key::KeyL => Code::KeyL,
        Key::KeyM => Code::KeyM,
        Key::KeyN => Code::KeyN,
        Key::KeyO => Code::KeyO,
        Key::KeyP => Code::KeyP,
        Key::KeyQ => Code::KeyQ,
        Key::KeyR => Code::KeyR,
        Key::KeyS => Code::KeyS,
        Key::KeyT => Code::KeyT,
        Key::KeyU => Code::KeyU,
        Key::KeyV => Code::KeyV,
        Key::KeyW => Code::KeyW,
        Key::KeyX => Code::KeyX,
        Key::KeyY => Code::KeyY,
        Key::KeyZ => Code::KeyZ,
        Key::Num0 => Code::Digit0,
        Key::Num1 => Code::Digit1,
        Key::Num2 => Code::Digit2,
        Key::Num3 => Code::Digit3,
        Key::Num4 => Code::Digit4,
        Key::Num5 => Code::Digit5,
        Key::Num6 => Code::Digit6,
        Key::Num7 => Code::Digit7,
        Key::Num8 => Code::Digit8,
        Key::Num9 => Code::Digit9,
        Key::F1 => Code::F1,
        Key::F2 => Code::F2,
        Key::F3 => Code::F3,
        Key::F4 => Code::F4,
        Key::F5 => Code::F5,
        Key::F6 => Code::F6,
        Key::F7 => Code::F7,
        Key::F8 => Code::F8,
        Key::F9 => Code::F9,
        Key::F10 => Code::F10,
        Key::F11 => Code::F11,
        Key::F12 => Code::F12,
        Key::Space => Code::Space,
        Key::Return => Code::Enter,
        Key::Tab => Code::Tab,
        Key::Escape => Code::Escape,
        Key::Backspace => Code::Backspace,
        Key::Delete => Code::Delete,
        Key::Insert => Code::Insert,
        Key::Home => Code::Home,
        Key::End => Code::End,
        Key::PageUp => Code::PageUp,
        Key::PageDown => Code::PageDown,
        Key::UpArrow => Code::ArrowUp,
        Key::DownArrow => Code::ArrowDown,
        Key::LeftArrow => Code::ArrowLeft,
        Key::RightArrow => Code::ArrowRight,
        Key::Minus => Code::Minus,
        Key::Equal => Code::Equal,
        Key::LeftBracket => Code::BracketLeft,
        Key::RightBracket => Code::BracketRight,
        Key::SemiColon => Code::Semicolon,
        Key::Quote => Code::Quote,
        Key::BackSlash => Code::Backslash,
        Key::Comma => Code::Comma,
        Key::Dot => Code::Period,
        Key::Slash => Code::Slash,
        Key::BackQuote => Code::Backquote,
        _ => return None,
    };
    Some(code)
}
