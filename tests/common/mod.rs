#![allow(dead_code)]

use global_hotkey::hotkey::{Code, HotKey};
use repeat_clicker::error::{ClickerError, Result};
use repeat_clicker::global_hotkey::HotkeyRegistrar;
use repeat_clicker::platform::{CursorReport, Edge, InputBackend, Origin};
use repeat_clicker::Coordinate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Injected {
    Pointer(Edge, Coordinate),
    Key(Code, Edge),
}

/// Records every synthetic event instead of posting it.
pub struct RecordingBackend {
    events: Mutex<Vec<(Instant, Injected)>>,
    cursor: Mutex<Option<CursorReport>>,
    display_height: f64,
    refuse: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Self::with_cursor(Some(CursorReport {
            x: 0.0,
            y: 0.0,
            origin: Origin::TopLeft,
        }))
    }

    pub fn with_cursor(cursor: Option<CursorReport>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            cursor: Mutex::new(cursor),
            display_height: 1080.0,
            refuse: AtomicBool::new(false),
        })
    }

    pub fn set_cursor(&self, cursor: Option<CursorReport>) {
        *self.cursor.lock().unwrap() = cursor;
    }

    pub fn refuse_events(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Injected> {
        self.events.lock().unwrap().iter().map(|(_, e)| *e).collect()
    }

    /// Positions and times of completed pointer presses.
    pub fn clicks(&self) -> Vec<(Instant, Coordinate)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(at, e)| match e {
                Injected::Pointer(Edge::Down, point) => Some((*at, *point)),
                _ => None,
            })
            .collect()
    }

    pub fn click_count(&self) -> usize {
        self.clicks().len()
    }

    fn record(&self, event: Injected) -> Result<()> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ClickerError::injection("refused by test"));
        }
        self.events.lock().unwrap().push((Instant::now(), event));
        Ok(())
    }
}

impl InputBackend for RecordingBackend {
    fn pointer_button(&self, edge: Edge, at: Coordinate) -> Result<()> {
        self.record(Injected::Pointer(edge, at))
    }

    fn key(&self, code: Code, edge: Edge) -> Result<()> {
        self.record(Injected::Key(code, edge))
    }

    fn cursor_position(&self) -> Result<CursorReport> {
        self.cursor
            .lock()
            .unwrap()
            .ok_or_else(|| ClickerError::platform("no cursor"))
    }

    fn primary_display_height(&self) -> Result<f64> {
        Ok(self.display_height)
    }
}

#[derive(Default)]
struct RegistrarState {
    active: Mutex<Vec<HotKey>>,
    registered: AtomicUsize,
    unregistered: AtomicUsize,
    fail: AtomicBool,
}

/// Counts OS registrations; clones share the same counters.
#[derive(Clone, Default)]
pub struct CountingRegistrar {
    state: Arc<RegistrarState>,
}

impl CountingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    pub fn active(&self) -> Vec<HotKey> {
        self.state.active.lock().unwrap().clone()
    }

    pub fn registered(&self) -> usize {
        self.state.registered.load(Ordering::SeqCst)
    }

    pub fn unregistered(&self) -> usize {
        self.state.unregistered.load(Ordering::SeqCst)
    }

    /// Id the OS would report for the active shortcut.
    pub fn active_id(&self) -> u32 {
        let active = self.active();
        assert_eq!(active.len(), 1, "expected exactly one registered shortcut");
        active[0].id()
    }
}

impl HotkeyRegistrar for CountingRegistrar {
    fn register(&self, hotkey: HotKey) -> Result<()> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(ClickerError::platform("combination already claimed"));
        }
        self.state.registered.fetch_add(1, Ordering::SeqCst);
        self.state.active.lock().unwrap().push(hotkey);
        Ok(())
    }

    fn unregister(&self, hotkey: HotKey) -> Result<()> {
        self.state.unregistered.fetch_add(1, Ordering::SeqCst);
        self.state
            .active
            .lock()
            .unwrap()
            .retain(|h| h.id() != hotkey.id());
        Ok(())
    }
}

/// Yields until `condition` holds.
pub async fn settle(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
