//! Running-state publisher.
//!
//! The engine publishes on every transition; readers see a copy that may lag
//! the engine briefly but never out of order.

use tokio::sync::watch;

/// What observers can see of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStatus {
    pub running: bool,
    /// Number of runs started since the engine was spawned.
    pub runs_started: u64,
}

/// Producer side, held only by the engine.
#[derive(Debug)]
pub struct RunningState {
    tx: watch::Sender<RunStatus>,
}

impl Default for RunningState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RunStatus::default());
        Self { tx }
    }

    pub fn publish_started(&self) {
        self.tx.send_modify(|status| {
            status.running = true;
            status.runs_started += 1;
        });
    }

    /// Publishes idle. Readers are only woken if they could have seen
    /// `running` before.
    pub fn publish_idle(&self) {
        self.tx.send_if_modified(|status| std::mem::replace(&mut status.running, false));
    }

    pub fn subscribe(&self) -> RunningWatcher {
        RunningWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only, eventually consistent view of the running flag.
#[derive(Debug, Clone)]
pub struct RunningWatcher {
    rx: watch::Receiver<RunStatus>,
}

impl RunningWatcher {
    pub fn is_running(&self) -> bool {
        self.rx.borrow().running
    }

    pub fn status(&self) -> RunStatus {
        *self.rx.borrow()
    }

    /// Waits for the next published change. Returns `false` once the
    /// engine is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until at least `run` runs have started and the engine is idle.
    pub async fn wait_until_finished(&mut self, run: u64) -> RunStatus {
        let result = self
            .rx
            .wait_for(|status| status.runs_started >= run && !status.running)
            .await
            .map(|status| *status);
        match result {
            Ok(status) => status,
            Err(_) => *self.rx.borrow(),
        }
    }
}
