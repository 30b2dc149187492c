//! `enigo`-backed synthesis and queries.

use super::{CursorReport, Edge, InputBackend, Origin};
use crate::action::Coordinate;
use crate::error::{ClickerError, Result};
use crate::global_hotkey::key_name;
use enigo::{Button, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use global_hotkey::hotkey::Code;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub struct EnigoBackend {
    enigo: Mutex<Enigo>,
}

impl EnigoBackend {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ClickerError::platform(format!("failed to create Enigo: {e}")))?;
        Ok(Self {
            enigo: Mutex::new(enigo),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Enigo>> {
        self.enigo
            .lock()
            .map_err(|_| ClickerError::platform("input backend lock poisoned"))
    }
}

fn direction(edge: Edge) -> Direction {
    match edge {
        Edge::Down => Direction::Press,
        Edge::Up => Direction::Release,
    }
}

fn enigo_key(code: Code) -> Result<Key> {
    let key = match code {
        Code::Space => Key::Space,
        Code::Enter => Key::Return,
        Code::Tab => Key::Tab,
        Code::Escape => Key::Escape,
        Code::Backspace => Key::Backspace,
        other => match key_name(other).map(|name| name.chars().collect::<Vec<_>>()) {
            Some(chars) if chars.len() == 1 => Key::Unicode(chars[0]),
            _ => {
                return Err(ClickerError::invalid_key(
                    format!("{code:?}"),
                    "cannot be synthesized",
                ))
            }
        },
    };
    Ok(key)
}

impl InputBackend for EnigoBackend {
    fn pointer_button(&self, edge: Edge, at: Coordinate) -> Result<()> {
        let mut enigo = self.lock()?;
        let (x, y) = (at.x.round() as i32, at.y.round() as i32);
        debug!(x, y, ?edge, "injecting pointer edge");
        enigo
            .move_mouse(x, y, enigo::Coordinate::Abs)
            .map_err(|e| ClickerError::injection(e.to_string()))?;
        enigo
            .button(Button::Left, direction(edge))
            .map_err(|e| ClickerError::injection(e.to_string()))
    }

    fn key(&self, code: Code, edge: Edge) -> Result<()> {
        let key = enigo_key(code)?;
        debug!(?code, ?edge, "injecting key edge");
        self.lock()?
            .key(key, direction(edge))
            .map_err(|e| ClickerError::injection(e.to_string()))
    }

    fn cursor_position(&self) -> Result<CursorReport> {
        let (x, y) = self
            .lock()?
            .location()
            .map_err(|e| ClickerError::platform(e.to_string()))?;
        // enigo already reports in the top-left-origin space on every platform.
        Ok(CursorReport {
            x: f64::from(x),
            y: f64::from(y),
            origin: Origin::TopLeft,
        })
    }

    fn primary_display_height(&self) -> Result<f64> {
        let (_, height) = self
            .lock()?
            .main_display()
            .map_err(|e| ClickerError::platform(e.to_string()))?;
        Ok(f64::from(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enigo_key_mapping() {
        assert!(matches!(enigo_key(Code::Space).unwrap(), Key::Space));
        assert!(matches!(enigo_key(Code::Enter).unwrap(), Key::Return));
        assert!(matches!(enigo_key(Code::KeyQ).unwrap(), Key::Unicode('q')));
        assert!(matches!(enigo_key(Code::Digit7).unwrap(), Key::Unicode('7')));
        assert!(enigo_key(Code::F5).is_err());
    }
}
