//! Coordinate resolver: the fixed target if there is one, otherwise the live
//! cursor in the top-left-origin space.

use crate::action::Coordinate;
use crate::error::Result;
use crate::platform::{InputBackend, Origin};
use std::sync::Arc;

#[derive(Clone)]
pub struct CoordinateResolver {
    backend: Arc<dyn InputBackend>,
}

impl CoordinateResolver {
    pub fn new(backend: Arc<dyn InputBackend>) -> Self {
        Self { backend }
    }

    pub fn resolve(&self, fixed: Option<Coordinate>) -> Result<Coordinate> {
        match fixed {
            Some(point) => Ok(point),
            None => self.cursor(),
        }
    }

    fn cursor(&self) -> Result<Coordinate> {
        let raw = self.backend.cursor_position()?;
        let y = match raw.origin {
            Origin::TopLeft => raw.y,
            Origin::BottomLeft => self.backend.primary_display_height()? - raw.y,
        };
        Ok(Coordinate::new(raw.x, y))
    }
}
