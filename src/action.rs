//! Values describing what to fire, where, how often, and how many times.

use crate::error::{ClickerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

/// The synthetic input produced on every fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Left-button press and release at the resolved coordinate.
    #[default]
    PointerClick,
    /// Press and release of the activation key (space).
    KeyTap,
}

/// An absolute screen position in a top-left-origin space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Truncated like the settings panel shows it.
        write!(f, "{}, {}", self.x as i64, self.y as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Minutes,
}

/// A user-entered cadence: a number plus the unit it was typed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub value: f64,
    #[serde(default)]
    pub unit: TimeUnit,
}

impl Default for Interval {
    fn default() -> Self {
        Self::seconds(1.0)
    }
}

impl Interval {
    pub fn new(value: f64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub fn seconds(value: f64) -> Self {
        Self::new(value, TimeUnit::Seconds)
    }

    pub fn minutes(value: f64) -> Self {
        Self::new(value, TimeUnit::Minutes)
    }

    /// The interval expressed in seconds, before validation.
    pub fn as_secs_f64(&self) -> f64 {
        match self.unit {
            TimeUnit::Seconds => self.value,
            TimeUnit::Minutes => self.value * 60.0,
        }
    }

    /// Converts to seconds, then rejects anything that would not produce a
    /// positive, representable timer period.
    pub fn normalize(&self) -> Result<Duration> {
        let secs = self.as_secs_f64();
        if !secs.is_finite() {
            return Err(ClickerError::invalid_interval(secs, "must be a finite number"));
        }
        if secs <= 0.0 {
            return Err(ClickerError::invalid_interval(secs, "must be greater than zero"));
        }

        let period = Duration::try_from_secs_f64(secs)
            .map_err(|e| ClickerError::invalid_interval(secs, e.to_string()))?;
        if period.is_zero() {
            return Err(ClickerError::invalid_interval(secs, "too small to schedule"));
        }
        Ok(period)
    }
}

/// Whether a run stops on its own after a number of fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatPolicy {
    #[default]
    Unbounded,
    Bounded(NonZeroU32),
}

impl RepeatPolicy {
    /// Bounded policy, rejecting a count of zero.
    pub fn times(count: u32) -> Result<Self> {
        NonZeroU32::new(count)
            .map(Self::Bounded)
            .ok_or(ClickerError::InvalidRepeatCount(count))
    }

    pub fn bound(&self) -> Option<u32> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(n) => Some(n.get()),
        }
    }
}

/// A validated request to start automation. The period is always positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunRequest {
    action: ActionKind,
    period: Duration,
    policy: RepeatPolicy,
    target: Option<Coordinate>,
}

impl RunRequest {
    pub fn new(
        action: ActionKind,
        interval: Interval,
        policy: RepeatPolicy,
        target: Option<Coordinate>,
    ) -> Result<Self> {
        Ok(Self {
            action,
            period: interval.normalize()?,
            policy,
            target,
        })
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn policy(&self) -> RepeatPolicy {
        self.policy
    }

    pub fn target(&self) -> Option<Coordinate> {
        self.target
    }
}
