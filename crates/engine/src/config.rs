use serde::{Deserialize, Serialize};

use crate::detector::DEFAULT_JUMP_THRESHOLD_SECS;
use crate::error::{EngineError, Result};
use crate::time::Millis;

/// Tunables for detection, gating and navigation polling.
///
/// Every field has a default, so a partial JSON object is a valid config.
///
/// # Example
/// ```
/// use engine::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{ "gate_timeout_ms": 5000 }"#)
///     .expect("valid config");
/// assert_eq!(config.gate_timeout_ms, 5_000);
/// assert_eq!(config.sample_interval_ms, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub jump_threshold_secs: f64,
    pub sample_interval_ms: Millis,
    pub gate_timeout_ms: Millis,
    pub navigation_poll_ms: Millis,
    pub navigation_settle_ms: Millis,
    pub bootstrap_min_ready_state: u8,
    pub shortcuts: ShortcutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            jump_threshold_secs: DEFAULT_JUMP_THRESHOLD_SECS,
            sample_interval_ms: 500,
            gate_timeout_ms: 15_000,
            navigation_poll_ms: 1_000,
            navigation_settle_ms: 0,
            bootstrap_min_ready_state: 3,
            shortcuts: ShortcutConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|source| EngineError::ConfigParse { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.jump_threshold_secs.is_finite() || self.jump_threshold_secs < 0.0 {
            return Err(invalid(format!(
                "jump_threshold_secs must be finite and non-negative, got {}",
                self.jump_threshold_secs
            )));
        }
        if self.sample_interval_ms == 0 {
            return Err(invalid("sample_interval_ms must be positive".to_owned()));
        }
        if self.navigation_poll_ms == 0 {
            return Err(invalid("navigation_poll_ms must be positive".to_owned()));
        }
        if self.bootstrap_min_ready_state > 4 {
            return Err(invalid(format!(
                "bootstrap_min_ready_state must be at most 4, got {}",
                self.bootstrap_min_ready_state
            )));
        }
        self.shortcuts.validate()
    }
}

fn invalid(reason: String) -> EngineError {
    EngineError::InvalidConfig { reason }
}

/// Modifier that must be held for a shortcut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    #[default]
    Ctrl,
    Meta,
    CtrlOrMeta,
}

impl Modifier {
    fn is_held(self, key: &KeyInput) -> bool {
        match self {
            Self::Ctrl => key.ctrl,
            Self::Meta => key.meta,
            Self::CtrlOrMeta => key.ctrl || key.meta,
        }
    }
}

/// Undo/redo key bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShortcutConfig {
    pub undo: String,
    pub redo: String,
    pub modifier: Modifier,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            undo: String::from("z"),
            redo: String::from("y"),
            modifier: Modifier::Ctrl,
        }
    }
}

/// What a key-down resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
}

impl ShortcutConfig {
    /// Resolves a key-down. Keys compare case-insensitively.
    pub fn resolve(&self, key: &KeyInput) -> Option<Shortcut> {
        if !self.modifier.is_held(key) {
            return None;
        }
        if key.key.eq_ignore_ascii_case(&self.undo) {
            Some(Shortcut::Undo)
        } else if key.key.eq_ignore_ascii_case(&self.redo) {
            Some(Shortcut::Redo)
        } else {
            None
        }
    }

    fn validate(&self) -> Result<()> {
        if self.undo.is_empty() || self.redo.is_empty() {
            return Err(invalid("shortcut keys must not be empty".to_owned()));
        }
        if self.undo.eq_ignore_ascii_case(&self.redo) {
            return Err(invalid(format!(
                "undo and redo share the key {:?}",
                self.undo
            )));
        }
        Ok(())
    }
}

/// One key-down with its modifier state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyInput {
    /// Key pressed together with Ctrl.
    pub fn ctrl(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            ctrl: true,
            ..Self::default()
        }
    }

    /// Key pressed together with Meta (Cmd on macOS).
    pub fn meta(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            meta: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, KeyInput, Modifier, Shortcut, ShortcutConfig};
    use crate::error::EngineError;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default()
            .validate()
            .expect("defaults must validate");
    }

    #[test]
    fn zero_sample_interval_is_rejected() {
        let config = EngineConfig {
            sample_interval_ms: 0,
            ..EngineConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let result = EngineConfig::from_json_str(r#"{ "threshold": 3 }"#);

        assert!(matches!(result, Err(EngineError::ConfigParse { .. })));
    }

    #[test]
    fn shortcut_ignores_case_but_requires_modifier() {
        let shortcuts = ShortcutConfig::default();

        assert_eq!(shortcuts.resolve(&KeyInput::ctrl("Z")), Some(Shortcut::Undo));
        assert_eq!(shortcuts.resolve(&KeyInput::ctrl("y")), Some(Shortcut::Redo));
        assert_eq!(shortcuts.resolve(&KeyInput::meta("z")), None);
        assert_eq!(
            shortcuts.resolve(&KeyInput {
                key: "z".to_owned(),
                ..KeyInput::default()
            }),
            None
        );
    }

    #[test]
    fn ctrl_or_meta_accepts_either_modifier() {
        let shortcuts = ShortcutConfig {
            modifier: Modifier::CtrlOrMeta,
            ..ShortcutConfig::default()
        };

        assert_eq!(shortcuts.resolve(&KeyInput::meta("z")), Some(Shortcut::Undo));
        assert_eq!(shortcuts.resolve(&KeyInput::ctrl("z")), Some(Shortcut::Undo));
    }

    #[test]
    fn identical_undo_and_redo_keys_are_rejected() {
        let config = EngineConfig {
            shortcuts: ShortcutConfig {
                undo: "z".to_owned(),
                redo: "Z".to_owned(),
                modifier: Modifier::Ctrl,
            },
            ..EngineConfig::default()
        };

        assert!(config.validate().is_err());
    }
}
