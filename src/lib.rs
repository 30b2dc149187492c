//! # Repeat Clicker
//!
//! Repeats a pointer click or a key tap at a fixed cadence, started and
//! stopped from anywhere on the system with a recorded shortcut.
//!
//! ## Features
//!
//! - Left clicks at a fixed position or wherever the cursor is
//! - Space-bar taps as an alternative action
//! - Interval in seconds or minutes
//! - Repeat until stopped, or a fixed number of times
//! - Record any key combination as a global start/stop shortcut
//! - JSON settings file support
//!
//! ## Example
//!
//! ```no_run
//! use repeat_clicker::{Autoclicker, RepeatPolicy, Settings};
//!
//! # async fn run() -> repeat_clicker::Result<()> {
//! let clicker = Autoclicker::with_platform(Settings::default())?;
//! clicker.set_repeat(RepeatPolicy::times(3)?);
//! clicker.start()?;
//!
//! let mut running = clicker.watch_running();
//! running.wait_until_finished(1).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```json
//! {
//!   "action": "pointer_click",
//!   "interval": {"value": 1.5, "unit": "seconds"},
//!   "repeat": "times",
//!   "repeat_times": 20,
//!   "target": {"x": 100, "y": 200},
//!   "hotkey": "ctrl+alt+r"
//! }
//! ```

pub mod action;
pub mod app;
pub mod capture;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod global_hotkey;
pub mod platform;
pub mod resolver;
pub mod state;

pub use crate::action::{ActionKind, Coordinate, Interval, RepeatPolicy, RunRequest, TimeUnit};
pub use crate::app::Autoclicker;
pub use crate::config::Settings;
pub use crate::engine::{Engine, EngineHandle};
pub use crate::error::{ClickerError, Result};
pub use crate::global_hotkey::{HotKeyBinding, HotkeyManager};
pub use crate::state::{RunStatus, RunningWatcher};
