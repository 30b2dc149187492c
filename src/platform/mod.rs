//! OS boundary: input synthesis, cursor and display queries, keyboard hook.
//!
//! - `enigo_backend` - synthesis and queries via `enigo`
//! - `key_hook` - process keyboard hook via `rdev`, feeding shortcut capture
//! - `event_loop` - main-thread native event pump for shortcut delivery

mod enigo_backend;
mod event_loop;
mod key_hook;

pub use enigo_backend::EnigoBackend;
pub use event_loop::block_on_pumping;
pub use key_hook::RdevKeyHook;

use crate::action::Coordinate;
use crate::error::Result;
use global_hotkey::hotkey::Code;

/// Half of a press-then-release pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Down,
    Up,
}

/// Where the OS puts the origin when it reports the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    TopLeft,
    BottomLeft,
}

/// A raw cursor sample, in whatever space the OS reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorReport {
    pub x: f64,
    pub y: f64,
    pub origin: Origin,
}

/// The OS operations the clicker consumes.
pub trait InputBackend: Send + Sync {
    /// Posts a left-button edge at an absolute top-left-origin position.
    fn pointer_button(&self, edge: Edge, at: Coordinate) -> Result<()>;

    fn key(&self, code: Code, edge: Edge) -> Result<()>;

    fn cursor_position(&self) -> Result<CursorReport>;

    fn primary_display_height(&self) -> Result<f64>;
}
