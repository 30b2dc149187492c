//! Clicker settings, held in memory and optionally saved as JSON.

use crate::action::{ActionKind, Coordinate, Interval, RepeatPolicy, RunRequest};
use crate::error::{ClickerError, Result};
use crate::global_hotkey::parse_hotkey;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    UntilStopped,
    Times,
}

/// Everything the presentation layer lets the user edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub action: ActionKind,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default)]
    pub repeat: RepeatMode,
    /// Kept while repeating until stopped so switching back restores it.
    #[serde(default = "default_repeat_times")]
    pub repeat_times: u32,
    /// Fixed click position; `None` clicks wherever the cursor is.
    #[serde(default)]
    pub target: Option<Coordinate>,
    #[serde(default)]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}

fn default_repeat_times() -> u32 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            action: ActionKind::default(),
            interval: Interval::default(),
            repeat: RepeatMode::default(),
            repeat_times: default_repeat_times(),
            target: None,
            hotkey: None,
            verbose: false,
        }
    }
}

impl Settings {
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| ClickerError::config_load(path, e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ClickerError::config_load(path, e.to_string()))
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ClickerError::config_save(path, e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.interval.normalize()?;
        self.policy()?;

        if let Some(hotkey) = &self.hotkey {
            parse_hotkey(hotkey)?;
            if self.action == ActionKind::KeyTap {
                return Err(ClickerError::config_validation(
                    "a hotkey can only be used with pointer clicks",
                ));
            }
        }
        Ok(())
    }

    pub fn policy(&self) -> Result<RepeatPolicy> {
        match self.repeat {
            RepeatMode::UntilStopped => Ok(RepeatPolicy::Unbounded),
            RepeatMode::Times => RepeatPolicy::times(self.repeat_times),
        }
    }

    pub fn set_policy(&mut self, policy: RepeatPolicy) {
        match policy {
            RepeatPolicy::Unbounded => self.repeat = RepeatMode::UntilStopped,
            RepeatPolicy::Bounded(n) => {
                self.repeat = RepeatMode::Times;
                self.repeat_times = n.get();
            }
        }
    }

    pub fn run_request(&self) -> Result<RunRequest> {
        RunRequest::new(self.action, self.interval, self.policy()?, self.target)
    }
}
