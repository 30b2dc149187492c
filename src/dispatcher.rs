//! Input dispatcher: turns one fire into one synthetic click or key tap.

use crate::action::{ActionKind, Coordinate};
use crate::error::Result;
use crate::platform::{Edge, InputBackend};
use global_hotkey::hotkey::Code;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Key pressed by [`ActionKind::KeyTap`].
pub const ACTIVATION_KEY: Code = Code::Space;

#[derive(Clone)]
pub struct InputDispatcher {
    backend: Arc<dyn InputBackend>,
}

impl InputDispatcher {
    pub fn new(backend: Arc<dyn InputBackend>) -> Self {
        Self { backend }
    }

    /// Fires one action. A refused event skips this fire only; nothing is
    /// retried or reported to the caller.
    pub fn dispatch(&self, kind: ActionKind, point: Option<Coordinate>) {
        let result = match (kind, point) {
            (ActionKind::PointerClick, Some(at)) => self.click(at),
            (ActionKind::PointerClick, None) => {
                warn!("pointer click without a coordinate, skipping");
                return;
            }
            (ActionKind::KeyTap, _) => self.tap(ACTIVATION_KEY),
        };
        match result {
            Ok(()) => debug!(?kind, ?point, "dispatched"),
            Err(e) => warn!(?kind, error = %e, "dispatch skipped"),
        }
    }

    fn click(&self, at: Coordinate) -> Result<()> {
        press_release(|edge| self.backend.pointer_button(edge, at))
    }

    fn tap(&self, code: Code) -> Result<()> {
        press_release(|edge| self.backend.key(code, edge))
    }
}

/// Posts a press then its release. Once the press is out the release is
/// retried once, so a refusal never leaves the input held.
fn press_release(post: impl Fn(Edge) -> Result<()>) -> Result<()> {
    post(Edge::Down)?;
    if let Err(e) = post(Edge::Up) {
        warn!(error = %e, "release refused, retrying");
        if let Err(retry) = post(Edge::Up) {
            error!(error = %retry, "release refused twice, input may be left held");
            return Err(retry);
        }
    }
    Ok(())
}
