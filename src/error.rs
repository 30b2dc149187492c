//! Custom error types for repeat-clicker.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for repeat-clicker operations.
#[derive(Error, Debug)]
pub enum ClickerError {
    /// The click interval is zero, negative, or not a number.
    #[error("invalid interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },

    /// A bounded repeat policy needs at least one repetition.
    #[error("invalid repeat count {0}: must be at least 1")]
    InvalidRepeatCount(u32),

    /// The specified key is invalid or unsupported.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Error parsing a key combination.
    #[error("invalid key combination '{combo}': {reason}")]
    InvalidKeyCombination { combo: String, reason: String },

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// The OS declined to register the shortcut.
    #[error("failed to register shortcut '{combo}': {reason}")]
    HotkeyRegistration { combo: String, reason: String },

    /// A shortcut capture is already waiting for a key.
    #[error("a shortcut capture is already in progress")]
    CaptureInProgress,

    /// The capture ended before any key was pressed.
    #[error("shortcut capture was cancelled")]
    CaptureCancelled,

    /// Shortcuts can only be bound while the action is a pointer click.
    #[error("shortcuts are only available for pointer clicks")]
    ShortcutUnavailable,

    /// The OS refused to synthesize an input event.
    #[error("input injection failed: {0}")]
    Injection(String),

    /// Platform query or setup failure.
    #[error("platform error: {0}")]
    Platform(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for repeat-clicker operations.
pub type Result<T> = std::result::Result<T, ClickerError>;

impl ClickerError {
    /// Create a new InvalidInterval error.
    pub fn invalid_interval(value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidKey error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidKeyCombination error.
    pub fn invalid_key_combination(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKeyCombination {
            combo: combo.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new HotkeyRegistration error.
    pub fn hotkey_registration(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HotkeyRegistration {
            combo: combo.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Injection error.
    pub fn injection(message: impl Into<String>) -> Self {
        Self::Injection(message.into())
    }

    /// Create a new Platform error.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }
}
