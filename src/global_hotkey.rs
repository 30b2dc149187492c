//! System-wide start/stop shortcut: capture, registration and trigger delivery.

use crate::capture::{CaptureSubscription, CapturedKey, KeyCaptureSource};
use crate::error::{ClickerError, Result};
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

/// Registers and unregisters shortcuts with the OS.
pub trait HotkeyRegistrar: Send + Sync {
    fn register(&self, hotkey: HotKey) -> Result<()>;
    fn unregister(&self, hotkey: HotKey) -> Result<()>;
}

impl HotkeyRegistrar for GlobalHotKeyManager {
    fn register(&self, hotkey: HotKey) -> Result<()> {
        GlobalHotKeyManager::register(self, hotkey)
            .map_err(|e| ClickerError::platform(e.to_string()))
    }

    fn unregister(&self, hotkey: HotKey) -> Result<()> {
        GlobalHotKeyManager::unregister(self, hotkey)
            .map_err(|e| ClickerError::platform(e.to_string()))
    }
}

/// A bound shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotKeyBinding {
    pub code: Code,
    pub modifiers: Modifiers,
}

impl HotKeyBinding {
    pub fn new(code: Code, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    fn hotkey(&self) -> HotKey {
        let modifiers = (!self.modifiers.is_empty()).then_some(self.modifiers);
        HotKey::new(modifiers, self.code)
    }

    /// Short display label: modifier symbols then the key, e.g. `⌘⇧K`.
    pub fn label(&self) -> String {
        let symbols = [
            (Modifiers::SUPER, "⌘"),
            (Modifiers::ALT, "⌥"),
            (Modifiers::SHIFT, "⇧"),
            (Modifiers::CONTROL, "⌃"),
        ];
        let mut label: String = symbols
            .iter()
            .filter(|(flag, _)| self.modifiers.contains(*flag))
            .map(|(_, symbol)| *symbol)
            .collect();
        match key_name(self.code) {
            Some(name) => label.push_str(&name.to_uppercase()),
            None => label.push_str("<?>"),
        }
        label
    }

    /// Text form accepted by [`parse_hotkey`], e.g. `ctrl+shift+k`.
    pub fn combo(&self) -> String {
        let mut parts: Vec<&str> = [
            (Modifiers::CONTROL, "ctrl"),
            (Modifiers::ALT, "alt"),
            (Modifiers::SHIFT, "shift"),
            (Modifiers::SUPER, "cmd"),
        ]
        .iter()
        .filter(|(flag, _)| self.modifiers.contains(*flag))
        .map(|(_, name)| *name)
        .collect();
        parts.push(key_name(self.code).unwrap_or("?"));
        parts.join("+")
    }
}

impl From<CapturedKey> for HotKeyBinding {
    fn from(key: CapturedKey) -> Self {
        Self::new(key.code, key.modifiers)
    }
}

impl fmt::Display for HotKeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Callback run once per physical press of the bound shortcut.
pub type Trigger = Arc<dyn Fn() + Send + Sync>;

struct Registration {
    binding: HotKeyBinding,
    hotkey: HotKey,
}

#[derive(Default)]
struct HotkeyState {
    registered: Option<Registration>,
    capture: Option<(u64, CaptureSubscription)>,
    captures_started: u64,
}

/// Owns the single registered shortcut and the capture in progress, if any.
pub struct HotkeyManager {
    registrar: Box<dyn HotkeyRegistrar>,
    capture: Box<dyn KeyCaptureSource>,
    trigger: Trigger,
    state: Mutex<HotkeyState>,
    binding_tx: watch::Sender<Option<HotKeyBinding>>,
}

impl HotkeyManager {
    pub fn new(
        registrar: Box<dyn HotkeyRegistrar>,
        capture: Box<dyn KeyCaptureSource>,
        trigger: Trigger,
    ) -> Self {
        let (binding_tx, _) = watch::channel(None);
        Self {
            registrar,
            capture,
            trigger,
            state: Mutex::new(HotkeyState::default()),
            binding_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HotkeyState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn binding(&self) -> Option<HotKeyBinding> {
        self.lock().registered.as_ref().map(|r| r.binding)
    }

    /// Watch the current binding, for display.
    pub fn watch_binding(&self) -> watch::Receiver<Option<HotKeyBinding>> {
        self.binding_tx.subscribe()
    }

    pub fn is_capturing(&self) -> bool {
        self.lock().capture.is_some()
    }

    /// Waits for the next key-down, then binds it.
    ///
    /// Registration failure leaves no shortcut bound. Dropping the future
    /// or calling [`cancel_capture`](Self::cancel_capture) abandons the
    /// capture and keeps the current binding.
    pub async fn begin_capture(&self) -> Result<HotKeyBinding> {
        let (tx, rx) = oneshot::channel();
        let seq = {
            let mut state = self.lock();
            if state.capture.is_some() {
                return Err(ClickerError::CaptureInProgress);
            }
            state.captures_started += 1;
            let seq = state.captures_started;
            state.capture = Some((seq, self.capture.subscribe(tx)));
            seq
        };
        info!("waiting for shortcut key");

        let capturing = CaptureGuard { manager: self, seq };
        let key = rx.await.map_err(|_| ClickerError::CaptureCancelled)?;
        drop(capturing);

        self.bind(key.into())
    }

    pub fn cancel_capture(&self) {
        if self.lock().capture.take().is_some() {
            debug!("shortcut capture cancelled");
        }
    }

    /// Binds a combination given in text form, e.g. from saved settings.
    pub fn bind_combo(&self, combo: &str) -> Result<HotKeyBinding> {
        self.bind(parse_hotkey(combo)?)
    }

    /// Replaces the registered shortcut. The old one is always released
    /// first, so a registration failure leaves nothing bound. Keys without
    /// a combo name are refused up front and keep the current binding.
    pub fn bind(&self, binding: HotKeyBinding) -> Result<HotKeyBinding> {
        if key_name(binding.code).is_none() {
            return Err(ClickerError::invalid_key(
                format!("{:?}", binding.code),
                "cannot be used as a shortcut",
            ));
        }
        let hotkey = binding.hotkey();
        let mut state = self.lock();
        self.release(&mut state);

        if let Err(e) = self.registrar.register(hotkey) {
            warn!(combo = %binding.combo(), error = %e, "shortcut registration failed");
            self.binding_tx.send_replace(None);
            return Err(ClickerError::hotkey_registration(binding.combo(), e.to_string()));
        }

        state.registered = Some(Registration { binding, hotkey });
        self.binding_tx.send_replace(Some(binding));
        info!(shortcut = %binding.label(), "shortcut registered");
        Ok(binding)
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        if self.release(&mut state) {
            self.binding_tx.send_replace(None);
            info!("shortcut cleared");
        }
    }

    fn release(&self, state: &mut HotkeyState) -> bool {
        let Some(old) = state.registered.take() else {
            return false;
        };
        if let Err(e) = self.registrar.unregister(old.hotkey) {
            warn!(combo = %old.binding.combo(), error = %e, "failed to unregister shortcut");
        }
        true
    }

    /// Handles one OS shortcut event. Only presses of the current shortcut
    /// reach the trigger, and none while a capture is in progress.
    pub fn deliver(&self, id: u32, state: HotKeyState) {
        if state != HotKeyState::Pressed {
            return;
        }
        let fire = {
            let current = self.lock();
            current.capture.is_none()
                && current.registered.as_ref().is_some_and(|r| r.hotkey.id() == id)
        };
        if fire {
            debug!(id, "shortcut pressed");
            (self.trigger)();
        }
    }

    /// Forwards OS shortcut events to [`deliver`](Self::deliver) until the
    /// manager is dropped.
    pub fn start_trigger_listener(self: &Arc<Self>) {
        let receiver = GlobalHotKeyEvent::receiver();
        let manager: Weak<Self> = Arc::downgrade(self);

        tokio::task::spawn_blocking(move || loop {
            match receiver.recv_timeout(Duration::from_millis(200)) {
                Ok(event) => match manager.upgrade() {
                    Some(manager) => manager.deliver(event.id, event.state),
                    None => break,
                },
                Err(e) if e.is_timeout() => {
                    if manager.strong_count() == 0 {
                        break;
                    }
                }
                Err(_) => break,
            }
        });
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        let mut state = self.lock();
        self.release(&mut state);
    }
}

/// Ends the capture it started, and only that one.
struct CaptureGuard<'a> {
    manager: &'a HotkeyManager,
    seq: u64,
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.manager.lock();
        if state.capture.as_ref().is_some_and(|(seq, _)| *seq == self.seq) {
            state.capture = None;
        }
    }
}

/// Parses `ctrl+alt+r` style combinations.
pub fn parse_hotkey(hotkey_str: &str) -> Result<HotKeyBinding> {
    let binding = hotkey_str.to_lowercase();
    let parts: Vec<&str> = binding.split('+').map(|s| s.trim()).collect();

    let mut modifiers = Modifiers::empty();
    let mut key_code = None;

    for part in &parts {
        match *part {
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" | "option" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            "meta" | "cmd" | "super" => modifiers |= Modifiers::SUPER,
            "" => {
                return Err(ClickerError::invalid_key_combination(
                    hotkey_str,
                    "empty key name",
                ))
            }
            key => {
                if key_code.is_some() {
                    return Err(ClickerError::invalid_key_combination(
                        hotkey_str,
                        "multiple keys specified",
                    ));
                }
                key_code = Some(parse_key_code(key)?);
            }
        }
    }

    let code = key_code
        .ok_or_else(|| ClickerError::invalid_key_combination(hotkey_str, "no key specified"))?;
    Ok(HotKeyBinding::new(code, modifiers))
}

const KEY_NAMES: &[(&str, Code)] = &[
    ("a", Code::KeyA),
    ("b", Code::KeyB),
    ("c", Code::KeyC),
    ("d", Code::KeyD),
    ("e", Code::KeyE),
    ("f", Code::KeyF),
    ("g", Code::KeyG),
    ("h", Code::KeyH),
    ("i", Code::KeyI),
    ("j", Code::KeyJ),
    ("k", Code::KeyK),
    ("l", Code::KeyL),
    ("m", Code::KeyM),
    ("n", Code::KeyN),
    ("o", Code::KeyO),
    ("p", Code::KeyP),
    ("q", Code::KeyQ),
    ("r", Code::KeyR),
    ("s", Code::KeyS),
    ("t", Code::KeyT),
    ("u", Code::KeyU),
    ("v", Code::KeyV),
    ("w", Code::KeyW),
    ("x", Code::KeyX),
    ("y", Code::KeyY),
    ("z", Code::KeyZ),
    ("0", Code::Digit0),
    ("1", Code::Digit1),
    ("2", Code::Digit2),
    ("3", Code::Digit3),
    ("4", Code::Digit4),
    ("5", Code::Digit5),
    ("6", Code::Digit6),
    ("7", Code::Digit7),
    ("8", Code::Digit8),
    ("9", Code::Digit9),
    ("f1", Code::F1),
    ("f2", Code::F2),
    ("f3", Code::F3),
    ("f4", Code::F4),
    ("f5", Code::F5),
    ("f6", Code::F6),
    ("f7", Code::F7),
    ("f8", Code::F8),
    ("f9", Code::F9),
    ("f10", Code::F10),
    ("f11", Code::F11),
    ("f12", Code::F12),
    ("space", Code::Space),
    ("enter", Code::Enter),
    ("tab", Code::Tab),
    ("escape", Code::Escape),
    ("backspace", Code::Backspace),
    ("delete", Code::Delete),
    ("insert", Code::Insert),
    ("home", Code::Home),
    ("end", Code::End),
    ("pageup", Code::PageUp),
    ("pagedown", Code::PageDown),
    ("up", Code::ArrowUp),
    ("down", Code::ArrowDown),
    ("left", Code::ArrowLeft),
    ("right", Code::ArrowRight),
    ("-", Code::Minus),
    ("=", Code::Equal),
    ("[", Code::BracketLeft),
    ("]", Code::BracketRight),
    (";", Code::Semicolon),
    ("'", Code::Quote),
    ("\\", Code::Backslash),
    (",", Code::Comma),
    (".", Code::Period),
    ("/", Code::Slash),
    ("`", Code::Backquote),
];

/// Canonical lower-case name of a key, as used in combo strings.
pub fn key_name(code: Code) -> Option<&'static str> {
    KEY_NAMES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

fn parse_key_code(key: &str) -> Result<Code> {
    let key = match key {
        "return" => "enter",
        "esc" => "escape",
        "arrowup" => "up",
        "arrowdown" => "down",
        "arrowleft" => "left",
        "arrowright" => "right",
        other => other,
    };
    KEY_NAMES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, code)| *code)
        .ok_or_else(|| ClickerError::invalid_key(key, "unsupported key"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hotkey() {
        let binding = parse_hotkey("Ctrl+Alt+R").unwrap();
        assert_eq!(binding.code, Code::KeyR);
        assert_eq!(binding.modifiers, Modifiers::CONTROL | Modifiers::ALT);

        let binding = parse_hotkey("f9").unwrap();
        assert_eq!(binding.code, Code::F9);
        assert!(binding.modifiers.is_empty());

        assert_eq!(parse_hotkey("cmd + esc").unwrap().code, Code::Escape);
    }

    #[test]
    fn test_every_named_key_round_trips_through_combo() {
        for (_, code) in KEY_NAMES {
            let binding = HotKeyBinding::new(*code, Modifiers::CONTROL | Modifiers::SUPER);
            assert_eq!(parse_hotkey(&binding.combo()).unwrap(), binding);
        }
    }

    #[test]
    fn test_parse_hotkey_errors() {
        assert!(parse_hotkey("").is_err());
        assert!(parse_hotkey("ctrl+alt").is_err());
        assert!(parse_hotkey("ctrl+a+b").is_err());
        assert!(parse_hotkey("ctrl+nope").is_err());
        assert!(parse_hotkey("ctrl++a").is_err());
    }

    #[test]
    fn test_label_orders_symbols() {
        let binding = HotKeyBinding::new(
            Code::KeyK,
            Modifiers::CONTROL | Modifiers::SHIFT | Modifiers::SUPER | Modifiers::ALT,
        );
        assert_eq!(binding.label(), "⌘⌥⇧⌃K");
        assert_eq!(HotKeyBinding::new(Code::F5, Modifiers::empty()).label(), "F5");
    }

    #[test]
    fn test_combo_parses_back() {
        for combo in ["ctrl+shift+k", "alt+f12", "cmd+space", "/"] {
            let binding = parse_hotkey(combo).unwrap();
            assert_eq!(binding.combo(), combo);
        }
    }

    #[test]
    fn test_unnamed_key_label() {
        let binding = HotKeyBinding::new(Code::NumpadAdd, Modifiers::SHIFT);
        assert_eq!(binding.label(), "⇧<?>");
    }
}
