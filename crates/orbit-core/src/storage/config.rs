//! TOML-based application configuration.
//!
//! Stores cluster tuning including:
//! - Force constants (attraction, repulsion, friction, bounce)
//! - Viewport size and margin
//! - Spawn jitter, RNG seed and default capture radius
//! - Drag behaviour
//!
//! Configuration is stored at `~/.config/orbit/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::cluster::{ClusterSettings, DragPolicy, PhysicsParams, SpawnConfig, Viewport};
use crate::error::{ConfigError, ValidationError};

/// Force constants. Defaults are the distance-scaled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_attraction")]
    pub attraction: f64,
    #[serde(default = "default_distance_scale")]
    pub distance_scale: f64,
    #[serde(default = "default_repulsion_force")]
    pub repulsion_force: f64,
    #[serde(default = "default_node_radius")]
    pub node_radius: f64,
    #[serde(default = "default_padding")]
    pub padding: f64,
    #[serde(default = "default_min_separation")]
    pub min_separation: f64,
    #[serde(default = "default_friction")]
    pub friction: f64,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_bounce_damping")]
    pub bounce_damping: f64,
}

/// Drag behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default)]
    pub drag_policy: DragPolicy,
    #[serde(default = "default_true")]
    pub reset_velocity_on_release: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/orbit/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub spawn: SpawnConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
}

// Default functions
fn default_attraction() -> f64 {
    0.02
}
fn default_distance_scale() -> f64 {
    100.0
}
fn default_repulsion_force() -> f64 {
    1.5
}
fn default_node_radius() -> f64 {
    28.0
}
fn default_padding() -> f64 {
    8.0
}
fn default_min_separation() -> f64 {
    4.0
}
fn default_friction() -> f64 {
    0.92
}
fn default_dt() -> f64 {
    1.0
}
fn default_bounce_damping() -> f64 {
    0.4
}
fn default_true() -> bool {
    true
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            attraction: default_attraction(),
            distance_scale: default_distance_scale(),
            repulsion_force: default_repulsion_force(),
            node_radius: default_node_radius(),
            padding: default_padding(),
            min_separation: default_min_separation(),
            friction: default_friction(),
            dt: default_dt(),
            bounce_damping: default_bounce_damping(),
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_policy: DragPolicy::default(),
            reset_velocity_on_release: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    // Unset optional: accept any JSON literal, else a bare string.
                    serde_json::Value::Null => serde_json::from_str(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The result must still form
    /// a valid cluster configuration; nothing is written to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated
            .cluster_settings()
            .map_err(|e| invalid(e.to_string()))?;
        *self = updated;
        Ok(())
    }

    pub fn physics_params(&self) -> PhysicsParams {
        let p = &self.physics;
        PhysicsParams {
            attraction: p.attraction,
            distance_scale: p.distance_scale,
            repulsion_force: p.repulsion_force,
            node_radius: p.node_radius,
            padding: p.padding,
            min_separation: p.min_separation,
            friction: p.friction,
            dt: p.dt,
            bounce_damping: p.bounce_damping,
            viewport: self.viewport,
        }
    }

    /// Validated engine settings.
    pub fn cluster_settings(&self) -> Result<ClusterSettings, ValidationError> {
        let physics = self.physics_params();
        physics.validate()?;
        for (field, value) in [
            ("spawn.jitter", self.spawn.jitter),
            ("spawn.anchor_radius", self.spawn.anchor_radius),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ValidationError::Negative {
                    field: field.into(),
                    value,
                });
            }
        }
        let max_jitter = physics.viewport.width.max(physics.viewport.height);
        if self.spawn.jitter > max_jitter {
            return Err(ValidationError::TooLarge {
                field: "spawn.jitter".into(),
                max: max_jitter,
                value: self.spawn.jitter,
            });
        }
        Ok(ClusterSettings {
            physics,
            spawn: self.spawn.clone(),
            drag_policy: self.interaction.drag_policy,
            reset_velocity_on_release: self.interaction.reset_velocity_on_release,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [physics]
            friction = 0.85

            [viewport]
            width = 1024.0

            [interaction]
            drag_policy = "freeze_dragged"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.physics.friction, 0.85);
        assert_eq!(parsed.physics.attraction, 0.02);
        assert_eq!(parsed.viewport.width, 1024.0);
        assert_eq!(parsed.viewport.height, 600.0);
        assert_eq!(parsed.interaction.drag_policy, DragPolicy::FreezeDragged);
        assert!(parsed.interaction.reset_velocity_on_release);
        assert_eq!(parsed.spawn.jitter, 45.0);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("physics.friction").as_deref(), Some("0.92"));
        assert_eq!(cfg.get("interaction.drag_policy").as_deref(), Some("pause_all"));
        assert_eq!(
            cfg.get("interaction.reset_velocity_on_release").as_deref(),
            Some("true")
        );
        assert_eq!(cfg.get("spawn.seed").as_deref(), Some("null"));
        assert!(cfg.get("physics.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("physics.friction", "0.8").unwrap();
        cfg.set("viewport.width", "1200").unwrap();
        cfg.set("interaction.reset_velocity_on_release", "false").unwrap();
        cfg.set("interaction.drag_policy", "freeze_dragged").unwrap();
        assert_eq!(cfg.physics.friction, 0.8);
        assert_eq!(cfg.viewport.width, 1200.0);
        assert!(!cfg.interaction.reset_velocity_on_release);
        assert_eq!(cfg.interaction.drag_policy, DragPolicy::FreezeDragged);
    }

    #[test]
    fn set_optional_seed() {
        let mut cfg = Config::default();
        cfg.set("spawn.seed", "42").unwrap();
        assert_eq!(cfg.spawn.seed, Some(42));
        cfg.set("spawn.seed", "null").unwrap();
        assert_eq!(cfg.spawn.seed, None);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("physics.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        let result = cfg.set("interaction.reset_velocity_on_release", "not_a_bool");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        let result = cfg.set("interaction.drag_policy", "sideways");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn set_rejects_invalid_physics_and_keeps_old_value() {
        let mut cfg = Config::default();
        assert!(cfg.set("physics.friction", "1.2").is_err());
        assert!(cfg.set("viewport.margin", "500").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_to_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.set("spawn.seed", "9").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[physics\nfriction = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn set_rejects_jitter_larger_than_viewport() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("spawn.jitter", "1e308"),
            Err(ConfigError::InvalidValue { .. })
        ));
        cfg.spawn.jitter = 1e308;
        assert!(matches!(
            cfg.cluster_settings(),
            Err(ValidationError::TooLarge { .. })
        ));
        cfg.spawn.jitter = 800.0;
        assert!(cfg.cluster_settings().is_ok());
    }

    #[test]
    fn cluster_settings_carry_config() {
        let mut cfg = Config::default();
        cfg.set("spawn.seed", "5").unwrap();
        let settings = cfg.cluster_settings().unwrap();
        assert_eq!(settings.physics, PhysicsParams::default());
        assert_eq!(settings.spawn.seed, Some(5));
        assert_eq!(settings.drag_policy, DragPolicy::PauseAll);
        assert!(settings.reset_velocity_on_release);
    }
}
