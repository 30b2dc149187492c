//! Automation engine: the repeating-timer state machine.
//!
//! One actor task owns the run state and the only timer. `Start`, `Stop`
//! and `Toggle` are queued to it and handled in order, so fires never
//! overlap and a new start always replaces the previous schedule.

use crate::action::{ActionKind, RepeatPolicy, RunRequest};
use crate::dispatcher::InputDispatcher;
use crate::resolver::CoordinateResolver;
use crate::state::{RunningState, RunningWatcher};
use std::mem;
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
enum Command {
    Start(RunRequest),
    Stop,
    Toggle(RunRequest),
}

enum Wake {
    Command(Option<Command>),
    Fire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Unbounded,
    Bounded { bound: u32, fired: u32 },
}

impl From<RepeatPolicy> for Progress {
    fn from(policy: RepeatPolicy) -> Self {
        match policy {
            RepeatPolicy::Unbounded => Self::Unbounded,
            RepeatPolicy::Bounded(n) => Self::Bounded {
                bound: n.get(),
                fired: 0,
            },
        }
    }
}

struct ActiveRun {
    request: RunRequest,
    progress: Progress,
    ticker: Interval,
}

/// The fired counter only exists while running.
enum RunState {
    Idle,
    Running(ActiveRun),
}

pub struct Engine {
    dispatcher: InputDispatcher,
    resolver: CoordinateResolver,
    published: RunningState,
    commands: mpsc::UnboundedReceiver<Command>,
    run: RunState,
}

impl Engine {
    /// Spawns the engine on the current tokio runtime. The engine lives
    /// until every handle is dropped.
    pub fn spawn(dispatcher: InputDispatcher, resolver: CoordinateResolver) -> EngineHandle {
        let (tx, commands) = mpsc::unbounded_channel();
        let published = RunningState::new();
        let watcher = published.subscribe();

        let engine = Engine {
            dispatcher,
            resolver,
            published,
            commands,
            run: RunState::Idle,
        };
        tokio::spawn(engine.run_loop());

        EngineHandle {
            commands: tx,
            watcher,
        }
    }

    async fn run_loop(mut self) {
        debug!("engine started");
        loop {
            let wake = match &mut self.run {
                RunState::Idle => Wake::Command(self.commands.recv().await),
                RunState::Running(active) => tokio::select! {
                    biased;
                    command = self.commands.recv() => Wake::Command(command),
                    _ = active.ticker.tick() => Wake::Fire,
                },
            };

            match wake {
                Wake::Command(Some(command)) => self.handle(command),
                Wake::Command(None) => break,
                Wake::Fire => self.fire(),
            }
        }
        self.stop();
        debug!("engine exiting");
    }

    fn handle(&mut self, command: Command) {
        debug!(?command, "engine command");
        match command {
            Command::Start(request) => self.start(request),
            Command::Stop => self.stop(),
            Command::Toggle(request) => match self.run {
                RunState::Idle => self.start(request),
                RunState::Running(_) => self.stop(),
            },
        }
    }

    fn start(&mut self, request: RunRequest) {
        self.stop();

        // First tick completes immediately.
        let mut ticker = time::interval(request.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.run = RunState::Running(ActiveRun {
            request,
            progress: request.policy().into(),
            ticker,
        });
        self.published.publish_started();
        info!(
            action = ?request.action(),
            period = ?request.period(),
            bound = ?request.policy().bound(),
            target = ?request.target(),
            "automation started"
        );
    }

    fn stop(&mut self) {
        if let RunState::Running(active) = mem::replace(&mut self.run, RunState::Idle) {
            info!(progress = ?active.progress, "automation stopped");
        }
        self.published.publish_idle();
    }

    fn fire(&mut self) {
        let (request, progress) = match &self.run {
            RunState::Running(active) => (active.request, active.progress),
            RunState::Idle => return,
        };

        if let Progress::Bounded { bound, fired } = progress {
            if fired > bound {
                error!(fired, bound, "fired count exceeded its bound, stopping");
                self.stop();
                return;
            }
            if fired >= bound {
                self.stop();
                return;
            }
        }

        match request.action() {
            ActionKind::PointerClick => match self.resolver.resolve(request.target()) {
                Ok(point) => self.dispatcher.dispatch(ActionKind::PointerClick, Some(point)),
                Err(e) => warn!(error = %e, "could not resolve click position, skipping"),
            },
            ActionKind::KeyTap => self.dispatcher.dispatch(ActionKind::KeyTap, None),
        }

        let mut finished = false;
        if let RunState::Running(active) = &mut self.run {
            if let Progress::Bounded { bound, fired } = &mut active.progress {
                *fired += 1;
                debug!(fired = *fired, bound = *bound, "fired");
                finished = *fired >= *bound;
            }
        }
        if finished {
            self.stop();
        }
    }
}

/// Cheap, cloneable handle to the engine. Every call returns immediately;
/// the running flag catches up asynchronously.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    watcher: RunningWatcher,
}

impl EngineHandle {
    /// Starts a run, replacing the current one if any.
    pub fn start(&self, request: RunRequest) {
        self.send(Command::Start(request));
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Stops when running, otherwise starts `request`. Decided against the
    /// engine's own state, not the published flag.
    pub fn toggle(&self, request: RunRequest) {
        self.send(Command::Toggle(request));
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_running()
    }

    pub fn watch(&self) -> RunningWatcher {
        self.watcher.clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("engine is no longer running");
        }
    }
}
