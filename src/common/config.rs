use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap().join(".config").join("dragline").join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

/// Tunables for the drag engine and the settle animation.
///
/// Speeds are in pixels per millisecond; the effective settle speed is
/// `settle_speed` scaled by the commit or cancel multiplier, so a cancelled
/// drag glides back noticeably slower than a committed drop snaps in.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "yes")]
    pub animate: bool,
    #[serde(default = "default_animation_fps")]
    pub animation_fps: f64,
    /// Pointer displacement (px) required before a press becomes a drag.
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,
    /// Rotation applied to the dragged item at full grip offset, in degrees.
    #[serde(default = "default_tilt_degrees")]
    pub tilt_degrees: f64,
    #[serde(default = "default_settle_speed")]
    pub settle_speed: f64,
    #[serde(default = "default_commit_speed_multiplier")]
    pub commit_speed_multiplier: f64,
    #[serde(default = "default_cancel_speed_multiplier")]
    pub cancel_speed_multiplier: f64,
    /// Floor for the settle duration so short moves still read as motion.
    #[serde(default = "default_min_settle_ms")]
    pub min_settle_ms: f64,
}

fn yes() -> bool { true }

fn default_animation_fps() -> f64 { 60.0 }
fn default_drag_threshold() -> f64 { 7.0 }
fn default_tilt_degrees() -> f64 { 4.0 }
fn default_settle_speed() -> f64 { 2.5 }
fn default_commit_speed_multiplier() -> f64 { 2.0 }
fn default_cancel_speed_multiplier() -> f64 { 0.8 }
fn default_min_settle_ms() -> f64 { 90.0 }

impl Default for Settings {
    fn default() -> Self {
        Self {
            animate: true,
            animation_fps: default_animation_fps(),
            drag_threshold: default_drag_threshold(),
            tilt_degrees: default_tilt_degrees(),
            settle_speed: default_settle_speed(),
            commit_speed_multiplier: default_commit_speed_multiplier(),
            cancel_speed_multiplier: default_cancel_speed_multiplier(),
            min_settle_ms: default_min_settle_ms(),
        }
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)?;
        Config::parse(&contents)
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let s = &self.settings;

        if s.animation_fps <= 0.0 {
            issues.push("animation_fps must be positive".to_string());
        }
        if s.drag_threshold < 0.0 {
            issues.push("drag_threshold must not be negative".to_string());
        }
        if s.settle_speed <= 0.0 {
            issues.push("settle_speed must be positive".to_string());
        }
        if s.commit_speed_multiplier <= 0.0 || s.cancel_speed_multiplier <= 0.0 {
            issues.push("speed multipliers must be positive".to_string());
        }
        if s.min_settle_ms < 0.0 {
            issues.push("min_settle_ms must not be negative".to_string());
        }

        issues
    }
}
