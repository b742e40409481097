//! Game balance and level configuration
//!
//! Everything here is plain data with serde derives. `Default` holds the
//! shipped balance; JSON overrides only need to name the fields they change.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::buffs::BuffKind;

/// Spawn cadence, difficulty ramp and launch ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Seconds between target spawns at the start of a run
    pub start_interval: f32,
    /// Spawn interval never shrinks below this
    pub min_interval: f32,
    /// Interval reduction per elapsed second
    pub interval_decay: f32,
    /// Seconds between power-up spawns
    pub powerup_interval: f32,

    /// Villager probability at t = 0
    pub villager_base_chance: f32,
    /// Villager probability gained per elapsed second
    pub villager_chance_ramp: f32,
    /// Villager probability cap
    pub villager_max_chance: f32,

    /// Difficulty scale range and ramp (scale multiplies launch speed)
    pub difficulty_min: f32,
    pub difficulty_max: f32,
    pub difficulty_ramp: f32,

    /// Random launch speed factor range
    pub speed_factor_min: f32,
    pub speed_factor_max: f32,

    /// Horizontal inset for launch points
    pub spawn_margin_x: f32,
    /// Apex heights are drawn from this band (screen y)
    pub apex_min_y: f32,
    pub apex_max_y: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            start_interval: 1.5,
            min_interval: 0.45,
            interval_decay: 0.01,
            powerup_interval: 12.0,

            villager_base_chance: 0.05,
            villager_chance_ramp: 1.0 / 120.0,
            villager_max_chance: 0.15,

            difficulty_min: 1.0,
            difficulty_max: 1.25,
            difficulty_ramp: 0.002,

            speed_factor_min: 0.9,
            speed_factor_max: 1.05,

            spawn_margin_x: 100.0,
            apex_min_y: GAME_HEIGHT * 0.15,
            apex_max_y: GAME_HEIGHT * 0.45,
        }
    }
}

/// Slash gesture and charge tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Pointer speed (pixels/s) above which the slash is live
    pub velocity_threshold: f32,
    /// Maximum trail points kept
    pub trail_capacity: usize,
    /// Seconds of holding per charge tier
    pub charge_time_per_tier: f32,
    /// Highest reachable charge tier
    pub max_charge_tier: u32,
    /// Trail width gained per tier (1.0 = baseline)
    pub width_per_tier: f32,
    /// Hit radius (pixels) added per tier of slash power
    pub radius_per_tier: f32,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            velocity_threshold: 600.0,
            trail_capacity: 12,
            charge_time_per_tier: 0.4,
            max_charge_tier: 3,
            width_per_tier: 0.5,
            radius_per_tier: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    /// Multiplier gained per combo step
    pub rate: f32,
    /// Seconds without a kill before the combo drops
    pub timeout: f32,
    /// Counts that fire a one-shot milestone notification
    pub milestones: Vec<u32>,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            rate: 0.1,
            timeout: 2.0,
            milestones: vec![5, 10, 25, 50, 100],
        }
    }
}

/// One row of the multi-kill table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiKillTier {
    pub count: u32,
    pub multiplier: f32,
    pub label: String,
}

impl MultiKillTier {
    fn new(count: u32, multiplier: f32, label: &str) -> Self {
        Self {
            count,
            multiplier,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Score lost when a villager is sliced
    pub villager_penalty: u64,
    /// Soul multiplier while Soul Magnet is active
    pub soul_magnet_factor: f32,
    /// Score multiplier while Frenzy is active
    pub frenzy_multiplier: f32,
    /// Multi-kill tiers, ascending by count
    pub multi_kill_tiers: Vec<MultiKillTier>,
    /// Label for counts beyond the highest tier (multiplier plateaus)
    pub multi_kill_overflow_label: String,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            villager_penalty: 50,
            soul_magnet_factor: 1.5,
            frenzy_multiplier: 2.0,
            multi_kill_tiers: vec![
                MultiKillTier::new(2, 1.5, "DOUBLE"),
                MultiKillTier::new(3, 2.0, "TRIPLE"),
                MultiKillTier::new(4, 2.5, "QUAD"),
                MultiKillTier::new(5, 3.0, "PENTA"),
            ],
            multi_kill_overflow_label: "MEGA".to_string(),
        }
    }
}

impl ScoringTuning {
    /// Bonus multiplier and label for `count` kills in one pass.
    ///
    /// Returns `None` below the lowest tier. Counts beyond the highest tier
    /// keep its multiplier but get the overflow label.
    pub fn multi_kill_tier(&self, count: u32) -> Option<(f32, &str)> {
        let highest = self.multi_kill_tiers.iter().max_by_key(|t| t.count)?;
        if count > highest.count {
            return Some((highest.multiplier, self.multi_kill_overflow_label.as_str()));
        }
        self.multi_kill_tiers
            .iter()
            .filter(|t| t.count <= count)
            .max_by_key(|t| t.count)
            .map(|t| (t.multiplier, t.label.as_str()))
    }
}

/// Buff durations (seconds) and strengths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffTuning {
    pub frenzy_duration: f32,
    pub shield_duration: f32,
    pub soul_magnet_duration: f32,
    pub slow_time_duration: f32,
    /// Target time scale while Slow Time is active
    pub slow_time_scale: f32,
}

impl Default for BuffTuning {
    fn default() -> Self {
        Self {
            frenzy_duration: 8.0,
            shield_duration: 10.0,
            soul_magnet_duration: 10.0,
            slow_time_duration: 6.0,
            slow_time_scale: 0.5,
        }
    }
}

impl BuffTuning {
    pub fn duration(&self, kind: BuffKind) -> f32 {
        match kind {
            BuffKind::Frenzy => self.frenzy_duration,
            BuffKind::Shield => self.shield_duration,
            BuffKind::SoulMagnet => self.soul_magnet_duration,
            BuffKind::SlowTime => self.slow_time_duration,
        }
    }
}

/// Per-target timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetTuning {
    /// Burn deals its damage once per interval, not every tick
    pub burn_tick_interval: f32,
    /// After a non-lethal hit the target ignores further hits this long
    pub hit_cooldown: f32,
    /// Ghost visibility cycle
    pub ghost_visible_secs: f32,
    pub ghost_invisible_secs: f32,
    pub ghost_fade_secs: f32,
}

impl Default for TargetTuning {
    fn default() -> Self {
        Self {
            burn_tick_interval: 0.5,
            hit_cooldown: 0.25,
            ghost_visible_secs: 2.0,
            ghost_invisible_secs: 1.5,
            ghost_fade_secs: 0.3,
        }
    }
}

/// Endless mode ramps difficulty in discrete steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndlessTuning {
    pub step_secs: f32,
    pub max_steps: u32,
    pub spawn_rate_step: f32,
    pub speed_step: f32,
    pub villager_chance_step: f32,
    pub villager_chance_max: f32,
}

impl Default for EndlessTuning {
    fn default() -> Self {
        Self {
            step_secs: 30.0,
            max_steps: 10,
            spawn_rate_step: 0.1,
            speed_step: 0.03,
            villager_chance_step: 0.01,
            villager_chance_max: 0.25,
        }
    }
}

/// Complete gameplay balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub spawn: SpawnTuning,
    pub gesture: GestureTuning,
    pub combo: ComboTuning,
    pub scoring: ScoringTuning,
    pub buffs: BuffTuning,
    pub targets: TargetTuning,
    pub endless: EndlessTuning,
    /// Lives at the start of a run (upgrades may override)
    pub starting_lives: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            spawn: SpawnTuning::default(),
            gesture: GestureTuning::default(),
            combo: ComboTuning::default(),
            scoring: ScoringTuning::default(),
            buffs: BuffTuning::default(),
            targets: TargetTuning::default(),
            endless: EndlessTuning::default(),
            starting_lives: DEFAULT_STARTING_LIVES,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let s = &self.spawn;
        if s.start_interval <= 0.0 || s.min_interval <= 0.0 {
            return Err(ConfigError::invalid("spawn.interval", "must be positive"));
        }
        if s.min_interval > s.start_interval {
            return Err(ConfigError::invalid(
                "spawn.min_interval",
                "exceeds start_interval",
            ));
        }
        if s.powerup_interval <= 0.0 {
            return Err(ConfigError::invalid("spawn.powerup_interval", "must be positive"));
        }
        if s.difficulty_min > s.difficulty_max {
            return Err(ConfigError::invalid("spawn.difficulty", "min exceeds max"));
        }
        if s.speed_factor_min > s.speed_factor_max {
            return Err(ConfigError::invalid("spawn.speed_factor", "min exceeds max"));
        }
        if s.apex_min_y > s.apex_max_y {
            return Err(ConfigError::invalid("spawn.apex", "min exceeds max"));
        }
        if self.gesture.trail_capacity < 2 {
            return Err(ConfigError::invalid(
                "gesture.trail_capacity",
                "a slash needs at least two points",
            ));
        }
        if self.gesture.charge_time_per_tier <= 0.0 {
            return Err(ConfigError::invalid(
                "gesture.charge_time_per_tier",
                "must be positive",
            ));
        }
        if self.combo.timeout <= 0.0 {
            return Err(ConfigError::invalid("combo.timeout", "must be positive"));
        }
        if self.combo.rate < 0.0 {
            return Err(ConfigError::invalid("combo.rate", "must not be negative"));
        }
        if self.scoring.multi_kill_tiers.iter().any(|t| t.multiplier < 1.0) {
            return Err(ConfigError::invalid(
                "scoring.multi_kill_tiers",
                "multipliers below 1.0 would subtract score",
            ));
        }
        self.scoring.multi_kill_tiers.sort_by_key(|t| t.count);
        Ok(())
    }
}

/// Starting lives when nothing else says otherwise
pub const DEFAULT_STARTING_LIVES: u32 = 3;

/// Per-level (or per-mode) overrides supplied by the host.
///
/// Any field left `None` falls back to the time-based defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub name: String,
    /// Fixed seconds between target spawns
    pub spawn_interval: Option<f32>,
    /// Fixed hostile weights keyed by kind name ("zombie", "vampire", ...)
    pub hostile_weights: Option<BTreeMap<String, f32>>,
    /// Fixed villager probability
    pub villager_chance: Option<f32>,
    /// Fixed seconds between power-ups
    pub powerup_interval: Option<f32>,
    /// Restrict which power-ups may appear
    pub powerup_kinds: Option<Vec<BuffKind>>,
    /// Timed level length; `None` runs until lives are gone
    pub duration_secs: Option<f32>,
    /// Launch speed multiplier
    pub speed_multiplier: Option<f32>,
}

impl LevelConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let level: LevelConfig = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spawn_interval.is_some_and(|v| v <= 0.0) {
            return Err(ConfigError::invalid("level.spawn_interval", "must be positive"));
        }
        if self.powerup_interval.is_some_and(|v| v <= 0.0) {
            return Err(ConfigError::invalid(
                "level.powerup_interval",
                "must be positive",
            ));
        }
        if self
            .villager_chance
            .is_some_and(|v| !(0.0..=1.0).contains(&v))
        {
            return Err(ConfigError::invalid(
                "level.villager_chance",
                "must be within [0, 1]",
            ));
        }
        if let Some(weights) = &self.hostile_weights
            && weights.values().any(|w| *w < 0.0)
        {
            return Err(ConfigError::invalid(
                "level.hostile_weights",
                "weights must not be negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_kill_tiers_plateau() {
        let scoring = ScoringTuning::default();
        assert_eq!(scoring.multi_kill_tier(1), None);
        assert_eq!(scoring.multi_kill_tier(2), Some((1.5, "DOUBLE")));
        assert_eq!(scoring.multi_kill_tier(3), Some((2.0, "TRIPLE")));
        assert_eq!(scoring.multi_kill_tier(5), Some((3.0, "PENTA")));
        // Beyond the table: same multiplier, distinct label
        assert_eq!(scoring.multi_kill_tier(6), Some((3.0, "MEGA")));
        assert_eq!(scoring.multi_kill_tier(40), Some((3.0, "MEGA")));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "combo": { "timeout": 3.5 } }"#).unwrap();
        assert_eq!(tuning.combo.timeout, 3.5);
        assert_eq!(tuning.combo.rate, ComboTuning::default().rate);
        assert_eq!(tuning.starting_lives, DEFAULT_STARTING_LIVES);
        assert_eq!(tuning.gesture.trail_capacity, 12);
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let err = Tuning::from_json(r#"{ "gesture": { "trail_capacity": 1 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "gesture.trail_capacity",
                ..
            }
        ));

        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_tiers_sorted_on_validate() {
        let json = r#"{ "scoring": { "multi_kill_tiers": [
            { "count": 3, "multiplier": 2.0, "label": "TRIPLE" },
            { "count": 2, "multiplier": 1.5, "label": "DOUBLE" }
        ] } }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert_eq!(tuning.scoring.multi_kill_tiers[0].count, 2);
        assert_eq!(tuning.scoring.multi_kill_tier(4), Some((2.0, "MEGA")));
    }

    #[test]
    fn test_level_config_parse() {
        let json = r#"{
            "name": "Graveyard 1-2",
            "spawn_interval": 0.9,
            "hostile_weights": { "zombie": 3.0, "ghost": 1.0 },
            "villager_chance": 0.1,
            "powerup_kinds": ["Shield", "Frenzy"],
            "duration_secs": 60.0
        }"#;
        let level = LevelConfig::from_json(json).unwrap();
        assert_eq!(level.spawn_interval, Some(0.9));
        assert_eq!(level.powerup_kinds.as_deref(), Some(&[BuffKind::Shield, BuffKind::Frenzy][..]));
        assert!(level.powerup_interval.is_none());

        let bad = LevelConfig::from_json(r#"{ "villager_chance": 1.5 }"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = LevelConfig::from_path("/nonexistent/level.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
