//! Configuration primitives for the synergy engine.
//!
//! Stored in a machine-readable TOML file located at:
//!   `$SYNERGIZER_HOME/config.toml` when the variable is set, otherwise
//!   `<OS config dir>/synergizer/config.toml` (via `directories::BaseDirs`).
//!
//! Every tuning constant of a matching run lives here. The literal values are
//! defaults; what the engine relies on is their ordering (see
//! [`EngineConfig::validate`]).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::SynergyError;
use crate::models::Level;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    /// Pair scoring weights and level multipliers.
    #[serde(default)]
    pub scoring: ScoringSettings,
    /// Triad composition knobs.
    #[serde(default)]
    pub triads: TriadSettings,
    /// Priority classification weights and thresholds.
    #[serde(default)]
    pub priority: PrioritySettings,
    /// Report rendering defaults.
    #[serde(default)]
    pub reporting: ReportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringSettings {
    /// Weight of each shared tag/capability term between a need and an offer.
    #[serde(default = "default_tag_weight")]
    pub tag_weight: f64,
    /// Weight of each shared mission keyword between the two companies.
    #[serde(default = "default_mission_weight")]
    pub mission_weight: f64,
    #[serde(default = "default_urgency_multipliers")]
    pub urgency: LevelMultipliers,
    #[serde(default = "default_capacity_multipliers")]
    pub capacity: LevelMultipliers,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            tag_weight: default_tag_weight(),
            mission_weight: default_mission_weight(),
            urgency: default_urgency_multipliers(),
            capacity: default_capacity_multipliers(),
        }
    }
}

const fn default_tag_weight() -> f64 {
    1.0
}

const fn default_mission_weight() -> f64 {
    0.5
}

fn default_urgency_multipliers() -> LevelMultipliers {
    LevelMultipliers {
        low: 0.7,
        med: 1.0,
        high: 1.3,
    }
}

fn default_capacity_multipliers() -> LevelMultipliers {
    LevelMultipliers {
        low: 0.8,
        med: 1.0,
        high: 1.2,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LevelMultipliers {
    pub low: f64,
    pub med: f64,
    pub high: f64,
}

impl LevelMultipliers {
    pub fn for_level(&self, level: Level) -> f64 {
        match level {
            Level::Low => self.low,
            Level::Med => self.med,
            Level::High => self.high,
        }
    }

    fn is_monotonic(&self) -> bool {
        0.0 < self.low && self.low <= self.med && self.med <= self.high
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriadSettings {
    #[serde(default = "default_triads_enabled")]
    pub enabled: bool,
    /// Subtracted from the mean of the two constituent pair scores.
    #[serde(default = "default_coordination_penalty")]
    pub coordination_penalty: f64,
}

impl Default for TriadSettings {
    fn default() -> Self {
        Self {
            enabled: default_triads_enabled(),
            coordination_penalty: default_coordination_penalty(),
        }
    }
}

const fn default_triads_enabled() -> bool {
    true
}

const fn default_coordination_penalty() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrioritySettings {
    #[serde(default = "default_score_weight")]
    pub score_weight: f64,
    #[serde(default = "default_impact_weight")]
    pub impact_weight: f64,
    #[serde(default = "default_confidence_weight")]
    pub confidence_weight: f64,
    /// Composite at or above this is HIGH.
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
    /// Composite at or above this (and below `high_threshold`) is MEDIUM.
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
}

impl Default for PrioritySettings {
    fn default() -> Self {
        Self {
            score_weight: default_score_weight(),
            impact_weight: default_impact_weight(),
            confidence_weight: default_confidence_weight(),
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
        }
    }
}

const fn default_score_weight() -> f64 {
    0.5
}

const fn default_impact_weight() -> f64 {
    0.3
}

const fn default_confidence_weight() -> f64 {
    0.2
}

const fn default_high_threshold() -> f64 {
    0.6
}

const fn default_medium_threshold() -> f64 {
    0.35
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSettings {
    /// Number of opportunities listed in the executive summary.
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            summary_limit: default_summary_limit(),
        }
    }
}

const fn default_summary_limit() -> usize {
    5
}

impl EngineConfig {
    /// Rejects settings that would break score monotonicity or priority
    /// ordering.
    pub fn validate(&self) -> crate::error::Result<()> {
        let scoring = &self.scoring;
        if !scoring.urgency.is_monotonic() {
            return Err(SynergyError::validation(
                "urgency multipliers must satisfy 0 < low <= med <= high",
            ));
        }
        if !scoring.capacity.is_monotonic() {
            return Err(SynergyError::validation(
                "capacity multipliers must satisfy 0 < low <= med <= high",
            ));
        }
        if scoring.tag_weight <= 0.0 || scoring.mission_weight < 0.0 {
            return Err(SynergyError::validation(
                "tag_weight must be positive and mission_weight non-negative",
            ));
        }
        if self.triads.coordination_penalty < 0.0 {
            return Err(SynergyError::validation(
                "coordination_penalty must not be negative",
            ));
        }
        let priority = &self.priority;
        let weights = [
            priority.score_weight,
            priority.impact_weight,
            priority.confidence_weight,
        ];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(SynergyError::validation(
                "priority weights must be non-negative with a positive sum",
            ));
        }
        if !(0.0..=1.0).contains(&priority.medium_threshold)
            || !(0.0..=1.0).contains(&priority.high_threshold)
            || priority.medium_threshold > priority.high_threshold
        {
            return Err(SynergyError::validation(
                "priority thresholds must satisfy 0 <= medium <= high <= 1",
            ));
        }
        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: EngineConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid settings in {:?}", path))?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(self)?;
        fs::write(path, data).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }
}

/// Standard file name of the config inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the directory holding the engine configuration.
///
/// Order of precedence:
/// 1. `SYNERGIZER_HOME` environment variable.
/// 2. OS-specific config directory via `directories::BaseDirs`.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(path) = env::var("SYNERGIZER_HOME") {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS config directory")?;
    Ok(base_dirs.config_dir().join("synergizer"))
}

pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from disk or returns defaults.
pub fn load_or_default() -> Result<EngineConfig> {
    let path = config_file_path()?;
    if path.exists() {
        EngineConfig::load_from_path(&path)
    } else {
        Ok(EngineConfig::default())
    }
}
