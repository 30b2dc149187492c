//! The clicker service: one engine, one shortcut manager, and the settings
//! they are driven from. The presentation layer owns one of these and calls
//! into it; nothing here is global.

use crate::action::{ActionKind, Coordinate, Interval, RepeatPolicy};
use crate::capture::KeyCaptureSource;
use crate::config::Settings;
use crate::dispatcher::InputDispatcher;
use crate::engine::{Engine, EngineHandle};
use crate::error::{ClickerError, Result};
use crate::global_hotkey::{HotKeyBinding, HotkeyManager, HotkeyRegistrar, Trigger};
use crate::platform::{EnigoBackend, InputBackend, RdevKeyHook};
use crate::resolver::CoordinateResolver;
use crate::state::RunningWatcher;
use global_hotkey::GlobalHotKeyManager;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Shortcuts only drive pointer clicks: moving to key taps drops the
/// current shortcut.
pub fn switching_action_kind_clears_shortcut(from: ActionKind, to: ActionKind) -> bool {
    from != to && to == ActionKind::KeyTap
}

type SharedSettings = Arc<Mutex<Settings>>;

fn lock(settings: &SharedSettings) -> MutexGuard<'_, Settings> {
    settings.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shortcut presses toggle a run built from the settings at press time.
fn toggle_trigger(engine: EngineHandle, settings: SharedSettings) -> Trigger {
    Arc::new(move || {
        let request = lock(&settings).run_request();
        match request {
            Ok(request) => engine.toggle(request),
            Err(e) => {
                warn!(error = %e, "shortcut ignored, settings are invalid");
                engine.stop();
            }
        }
    })
}

pub struct Autoclicker {
    engine: EngineHandle,
    hotkeys: Arc<HotkeyManager>,
    resolver: CoordinateResolver,
    settings: SharedSettings,
}

impl Autoclicker {
    /// Wires the service from explicit platform parts. Must be called from
    /// within a tokio runtime.
    pub fn new(
        backend: Arc<dyn InputBackend>,
        registrar: Box<dyn HotkeyRegistrar>,
        capture: Box<dyn KeyCaptureSource>,
        settings: Settings,
    ) -> Result<Self> {
        settings.validate()?;
        let hotkey = settings.hotkey.clone();

        let engine = Engine::spawn(
            InputDispatcher::new(backend.clone()),
            CoordinateResolver::new(backend.clone()),
        );
        let settings = Arc::new(Mutex::new(settings));
        let trigger = toggle_trigger(engine.clone(), settings.clone());
        let hotkeys = Arc::new(HotkeyManager::new(registrar, capture, trigger));

        if let Some(combo) = hotkey {
            hotkeys.bind_combo(&combo)?;
        }

        Ok(Self {
            engine,
            hotkeys,
            resolver: CoordinateResolver::new(backend),
            settings,
        })
    }

    /// Wires the service to the real OS: `enigo` for input, the
    /// `global-hotkey` manager for shortcuts and the `rdev` hook for capture.
    pub fn with_platform(settings: Settings) -> Result<Self> {
        let backend = Arc::new(EnigoBackend::new()?);
        let registrar = GlobalHotKeyManager::new().map_err(|e| {
            ClickerError::platform(format!("failed to create GlobalHotKeyManager: {e}"))
        })?;
        let app = Self::new(
            backend,
            Box::new(registrar),
            Box::new(RdevKeyHook::start()),
            settings,
        )?;
        app.hotkeys.start_trigger_listener();
        Ok(app)
    }

    fn settings(&self) -> MutexGuard<'_, Settings> {
        lock(&self.settings)
    }

    /// Copy of the current settings, e.g. for saving.
    pub fn snapshot(&self) -> Settings {
        self.settings().clone()
    }

    pub fn start(&self) -> Result<()> {
        let request = self.settings().run_request()?;
        self.engine.start(request);
        Ok(())
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn toggle(&self) -> Result<()> {
        let request = self.settings().run_request()?;
        self.engine.toggle(request);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn watch_running(&self) -> RunningWatcher {
        self.engine.watch()
    }

    pub fn action(&self) -> ActionKind {
        self.settings().action
    }

    pub fn set_action(&self, action: ActionKind) {
        let previous = mem::replace(&mut self.settings().action, action);
        if switching_action_kind_clears_shortcut(previous, action) {
            self.settings().hotkey = None;
            self.hotkeys.cancel_capture();
            self.hotkeys.clear();
            info!(?action, "shortcut cleared by action change");
        }
    }

    pub fn set_interval(&self, interval: Interval) -> Result<()> {
        interval.normalize()?;
        self.settings().interval = interval;
        Ok(())
    }

    pub fn set_repeat(&self, policy: RepeatPolicy) {
        self.settings().set_policy(policy);
    }

    pub fn target(&self) -> Option<Coordinate> {
        self.settings().target
    }

    pub fn set_target(&self, target: Option<Coordinate>) {
        self.settings().target = target;
    }

    pub fn clear_target(&self) {
        self.set_target(None);
    }

    /// Fixes the click position to wherever the cursor is now.
    pub fn pin_target_to_cursor(&self) -> Result<Coordinate> {
        let point = self.resolver.resolve(None)?;
        self.set_target(Some(point));
        info!(%point, "click position pinned");
        Ok(point)
    }

    pub fn target_label(&self) -> String {
        match self.target() {
            Some(point) => point.to_string(),
            None => "Automatic".to_string(),
        }
    }

    /// Records the next key combination as the start/stop shortcut.
    pub async fn begin_capture(&self) -> Result<HotKeyBinding> {
        if self.action() != ActionKind::PointerClick {
            return Err(ClickerError::ShortcutUnavailable);
        }
        let result = self.hotkeys.begin_capture().await;
        match &result {
            Ok(binding) => {
                let mut settings = self.settings();
                // The action may have moved to key taps while we waited.
                if settings.action != ActionKind::PointerClick {
                    settings.hotkey = None;
                    drop(settings);
                    self.hotkeys.clear();
                    info!("captured shortcut dropped, action is no longer a click");
                    return Err(ClickerError::ShortcutUnavailable);
                }
                settings.hotkey = Some(binding.combo());
            }
            Err(ClickerError::HotkeyRegistration { .. }) => self.settings().hotkey = None,
            Err(_) => {}
        }
        result
    }

    pub fn cancel_capture(&self) {
        self.hotkeys.cancel_capture();
    }

    pub fn clear_hotkey(&self) {
        self.hotkeys.clear();
        self.settings().hotkey = None;
    }

    pub fn hotkey(&self) -> Option<HotKeyBinding> {
        self.hotkeys.binding()
    }

    pub fn hotkey_label(&self) -> Option<String> {
        self.hotkey().map(|binding| binding.label())
    }

    pub fn hotkeys(&self) -> &Arc<HotkeyManager> {
        &self.hotkeys
    }
}
