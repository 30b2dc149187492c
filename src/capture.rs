//! One-shot key capture subscriptions.
//!
//! A capture source delivers at most one [`CapturedKey`] per subscription.
//! The keyboard hook offers every qualifying key-down to a [`CaptureSlot`];
//! the slot hands it to the armed subscriber, if any, and reports whether
//! the key was consumed so the hook can swallow it.

use global_hotkey::hotkey::{Code, Modifiers};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::oneshot;
use tracing::debug;

/// A key-down observed while capturing: the key plus the held modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedKey {
    pub code: Code,
    pub modifiers: Modifiers,
}

impl CapturedKey {
    pub fn new(code: Code, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }
}

/// Anything that can intercept the next local key-down for a subscriber.
pub trait KeyCaptureSource: Send + Sync {
    /// Arms a one-shot capture. The key is sent to `deliver` at most once;
    /// dropping the returned subscription disarms it.
    fn subscribe(&self, deliver: oneshot::Sender<CapturedKey>) -> CaptureSubscription;
}

struct Armed {
    id: u64,
    deliver: oneshot::Sender<CapturedKey>,
}

/// Holds the single pending capture, shared between the hook and subscribers.
#[derive(Default)]
pub struct CaptureSlot {
    armed: Mutex<Option<Armed>>,
    next_id: AtomicU64,
}

impl CaptureSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Arms the slot, replacing any earlier subscriber.
    pub fn arm(self: &Arc<Self>, deliver: oneshot::Sender<CapturedKey>) -> CaptureSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut armed) = self.armed.lock() {
            if armed.replace(Armed { id, deliver }).is_some() {
                debug!("replaced an earlier capture subscription");
            }
        }
        CaptureSubscription {
            id,
            slot: Arc::downgrade(self),
        }
    }

    /// Offers a key-down. Returns true when a subscriber took it.
    pub fn offer(&self, key: CapturedKey) -> bool {
        let armed = match self.armed.lock() {
            Ok(mut armed) => armed.take(),
            Err(_) => None,
        };
        match armed {
            Some(armed) => {
                debug!(code = ?key.code, modifiers = ?key.modifiers, "capture delivered");
                // The receiver may already be gone; the key is still consumed.
                let _ = armed.deliver.send(key);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.lock().map(|a| a.is_some()).unwrap_or(false)
    }

    fn disarm(&self, id: u64) {
        if let Ok(mut armed) = self.armed.lock() {
            if armed.as_ref().is_some_and(|a| a.id == id) {
                *armed = None;
            }
        }
    }
}

impl KeyCaptureSource for Arc<CaptureSlot> {
    fn subscribe(&self, deliver: oneshot::Sender<CapturedKey>) -> CaptureSubscription {
        self.arm(deliver)
    }
}

/// Cancellation handle for an armed capture.
pub struct CaptureSubscription {
    id: u64,
    slot: Weak<CaptureSlot>,
}

impl CaptureSubscription {
    pub fn cancel(self) {}
}

impl Drop for CaptureSubscription {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.upgrade() {
            slot.disarm(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_a() -> CapturedKey {
        CapturedKey::new(Code::KeyA, Modifiers::SHIFT)
    }

    #[test]
    fn test_offer_without_subscriber_passes_through() {
        let slot = CaptureSlot::new();
        assert!(!slot.offer(key_a()));
    }

    #[test]
    fn test_delivers_once() {
        let slot = CaptureSlot::new();
        let (tx, mut rx) = oneshot::channel();
        let _sub = slot.arm(tx);

        assert!(slot.offer(key_a()));
        assert!(!slot.offer(key_a()));
        assert_eq!(rx.try_recv().unwrap(), key_a());
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_dropping_subscription_disarms() {
        let slot = CaptureSlot::new();
        let (tx, mut rx) = oneshot::channel();
        let sub = slot.arm(tx);
        sub.cancel();

        assert!(!slot.is_armed());
        assert!(!slot.offer(key_a()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stale_subscription_does_not_disarm_newer_one() {
        let slot = CaptureSlot::new();
        let (old_tx, _old_rx) = oneshot::channel();
        let old = slot.arm(old_tx);
        let (new_tx, mut new_rx) = oneshot::channel();
        let _new = slot.arm(new_tx);

        drop(old);
        assert!(slot.offer(key_a()));
        assert_eq!(new_rx.try_recv().unwrap(), key_a());
    }
}
