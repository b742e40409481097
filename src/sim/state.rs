//! Game state and run bookkeeping
//!
//! Everything a run needs lives in one context object: components, counters,
//! the seeded RNG and the event bus. There are no globals.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::buffs::BuffManager;
use super::combo::ComboTracker;
use super::events::{EventBus, GameEvent};
use super::gesture::GestureTracker;
use super::spawn::{DifficultyModifiers, SpawnSystem};
use super::upgrades::Loadout;
use crate::error::ConfigError;
use crate::tuning::{LevelConfig, Tuning};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

/// Final statistics handed to the host when a run ends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub score: u64,
    pub souls: f32,
    pub kills: u32,
    pub max_combo: u32,
    pub elapsed_secs: f32,
    pub villagers_hit: u32,
    pub targets_missed: u32,
    pub best_multi_kill: u32,
}

#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,

    pub score: u64,
    pub souls: f32,
    pub lives: u32,
    pub kills: u32,
    pub villagers_hit: u32,
    pub targets_missed: u32,
    pub best_multi_kill: u32,
    /// Seconds of unpaused play
    pub elapsed: f32,
    /// Simulation time in ticks
    pub time_ticks: u64,

    pub spawner: SpawnSystem,
    pub gesture: GestureTracker,
    pub combo: ComboTracker,
    pub buffs: BuffManager,
    pub loadout: Loadout,
    pub bus: EventBus,

    /// Endless mode ramps difficulty in steps
    pub endless: bool,
    pub endless_step: u32,
    /// Pointer state last tick, for press/release edges
    pub pointer_was_down: bool,

    result: Option<RunResult>,
}

impl GameState {
    /// Create a new run with the shipped balance
    pub fn new(seed: u64) -> Self {
        Self::build(seed, Tuning::default())
    }

    /// Create a run with host-supplied balance. Values the simulation
    /// cannot run with (inverted ranges, zero intervals) are rejected.
    pub fn with_tuning(seed: u64, mut tuning: Tuning) -> Result<Self, ConfigError> {
        tuning.validate()?;
        Ok(Self::build(seed, tuning))
    }

    fn build(seed: u64, tuning: Tuning) -> Self {
        log::info!("New run, seed {}", seed);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            score: 0,
            souls: 0.0,
            lives: tuning.starting_lives,
            kills: 0,
            villagers_hit: 0,
            targets_missed: 0,
            best_multi_kill: 0,
            elapsed: 0.0,
            time_ticks: 0,
            spawner: SpawnSystem::new(&tuning),
            gesture: GestureTracker::new(&tuning.gesture),
            combo: ComboTracker::new(&tuning.combo),
            buffs: BuffManager::new(),
            loadout: Loadout::new(),
            bus: EventBus::new(),
            endless: false,
            endless_step: 0,
            pointer_was_down: false,
            result: None,
            tuning,
        }
    }

    pub fn with_level(mut self, level: LevelConfig) -> Result<Self, ConfigError> {
        level.validate()?;
        log::info!("Level '{}'", level.name);
        self.spawner.set_level(Some(level));
        Ok(self)
    }

    /// Install weapon and upgrade providers for this run
    pub fn with_loadout(mut self, loadout: Loadout) -> Self {
        if let Some(lives) = loadout.starting_lives() {
            self.lives = lives;
        }
        self.spawner
            .set_ghost_vision(loadout.ghost_vision() || loadout.reveals_hidden());
        self.loadout = loadout;
        self
    }

    pub fn set_endless(&mut self, endless: bool) {
        self.endless = endless;
        if endless {
            log::info!("Endless mode");
        } else {
            self.endless_step = 0;
            self.spawner.set_difficulty_modifiers(None);
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Add (or, for negative deltas, take away) score. Never drops below zero.
    pub fn apply_score(&mut self, delta: i64) {
        if delta == 0 {
            return;
        }
        self.score = if delta >= 0 {
            self.score.saturating_add(delta as u64)
        } else {
            self.score.saturating_sub(delta.unsigned_abs())
        };
        self.bus.publish(GameEvent::ScoreUpdated {
            score: self.score,
            delta,
        });
    }

    pub fn add_souls(&mut self, delta: f32) {
        if delta == 0.0 {
            return;
        }
        self.souls += delta;
        self.bus.publish(GameEvent::SoulsUpdated {
            souls: self.souls,
            delta,
        });
    }

    /// Returns true when that was the last life
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.bus.publish(GameEvent::LivesChanged { lives: self.lives });
        self.lives == 0
    }

    /// Endless modifiers for a given step
    pub fn endless_modifiers(&self, step: u32) -> DifficultyModifiers {
        let e = &self.tuning.endless;
        let step = step.min(e.max_steps) as f32;
        DifficultyModifiers {
            spawn_rate_multiplier: 1.0 + step * e.spawn_rate_step,
            speed_multiplier: 1.0 + step * e.speed_step,
            villager_chance: (self.tuning.spawn.villager_base_chance
                + step * e.villager_chance_step)
                .min(e.villager_chance_max),
        }
    }

    /// Snapshot of the run so far
    pub fn run_result(&self) -> RunResult {
        if let Some(result) = &self.result {
            return result.clone();
        }
        RunResult {
            score: self.score,
            souls: self.souls,
            kills: self.kills,
            max_combo: self.combo.max_combo(),
            elapsed_secs: self.elapsed,
            villagers_hit: self.villagers_hit,
            targets_missed: self.targets_missed,
            best_multi_kill: self.best_multi_kill,
        }
    }

    /// End the run. Publishes `RunEnded` once; later calls return the same result.
    pub fn finish(&mut self) -> RunResult {
        if let Some(result) = &self.result {
            return result.clone();
        }
        let result = self.run_result();
        self.phase = GamePhase::GameOver;
        self.combo.set_paused(true);
        self.buffs.set_paused(true);
        log::info!(
            "Run over: score {}, kills {}, max combo {}, {:.1}s",
            result.score,
            result.kills,
            result.max_combo,
            result.elapsed_secs
        );
        self.bus.publish(GameEvent::RunEnded {
            result: result.clone(),
        });
        self.result = Some(result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::tick::{TickInput, tick};
    use crate::sim::upgrades::UpgradeLevels;

    #[test]
    fn test_new_state() {
        let state = GameState::new(12345);
        assert_eq!(state.seed, 12345);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.lives, Tuning::default().starting_lives);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let mut tuning = Tuning::default();
        tuning.spawn.apex_min_y = 500.0;
        tuning.spawn.apex_max_y = 100.0;
        assert!(matches!(
            GameState::with_tuning(1, tuning),
            Err(ConfigError::Invalid { field: "spawn.apex", .. })
        ));

        let mut tuning = Tuning::default();
        tuning.spawn.speed_factor_min = 2.0;
        tuning.spawn.speed_factor_max = 0.5;
        assert!(GameState::with_tuning(1, tuning).is_err());

        let level = LevelConfig {
            villager_chance: Some(1.5),
            ..LevelConfig::default()
        };
        assert!(GameState::new(1).with_level(level).is_err());
    }

    #[test]
    fn test_validated_tuning_runs() {
        let mut tuning = Tuning::default();
        tuning.spawn.start_interval = 0.1;
        tuning.spawn.min_interval = 0.1;
        let mut state = GameState::with_tuning(9, tuning).unwrap();
        // Long enough for several launches to roll apex and speed
        for _ in 0..240 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.spawner.live_count() > 0);
    }

    #[test]
    fn test_score_never_negative() {
        let mut state = GameState::new(1);
        let log = state.bus.record();
        state.apply_score(30);
        state.apply_score(-50);
        assert_eq!(state.score, 0);
        assert_eq!(
            log.borrow().last(),
            Some(&GameEvent::ScoreUpdated {
                score: 0,
                delta: -50
            })
        );
    }

    #[test]
    fn test_loadout_overrides_lives() {
        let state = GameState::new(1).with_loadout(Loadout::new().with_upgrades(UpgradeLevels {
            extra_lives: 2,
            ..UpgradeLevels::default()
        }));
        assert_eq!(state.lives, 5);
    }

    #[test]
    fn test_finish_publishes_once() {
        let mut state = GameState::new(1);
        let log = state.bus.record();
        state.apply_score(100);
        let first = state.finish();
        state.apply_score(100);
        let second = state.finish();
        assert_eq!(first, second);
        assert_eq!(first.score, 100);
        assert!(state.is_over());
        let ended = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, GameEvent::RunEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_endless_modifiers_cap() {
        let state = GameState::new(1);
        let base = state.endless_modifiers(0);
        assert_eq!(base.spawn_rate_multiplier, 1.0);
        let capped = state.endless_modifiers(1000);
        assert_eq!(capped, state.endless_modifiers(state.tuning.endless.max_steps));
        assert!(capped.villager_chance <= state.tuning.endless.villager_chance_max);
    }

    #[test]
    fn test_run_result_json() {
        let result = RunResult {
            score: 420,
            souls: 12.5,
            kills: 30,
            max_combo: 9,
            elapsed_secs: 61.0,
            villagers_hit: 1,
            targets_missed: 2,
            best_multi_kill: 3,
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
