//! Spawn system: what to launch, when, and on which arc.
//!
//! Owns every live target. Two independent countdowns drive spawning (targets
//! and power-ups); difficulty ramps with elapsed time unless a level config
//! pins the numbers.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::buffs::BuffKind;
use super::events::{EventBus, GameEvent};
use super::target::{DeathHook, HostileKind, Target, TargetKind, TargetUpdate};
use super::trajectory::solve_launch;
use crate::consts::*;
use crate::tuning::{LevelConfig, SpawnTuning, TargetTuning, Tuning};

/// Endless-mode overrides, swapped in as the run goes on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyModifiers {
    /// Divides the spawn interval (still floored at the minimum)
    pub spawn_rate_multiplier: f32,
    /// Multiplies launch speed
    pub speed_multiplier: f32,
    /// Replaces the time-based villager chance
    pub villager_chance: f32,
}

impl Default for DifficultyModifiers {
    fn default() -> Self {
        Self {
            spawn_rate_multiplier: 1.0,
            speed_multiplier: 1.0,
            villager_chance: 0.05,
        }
    }
}

/// Targets that left play this tick without being sliced
#[derive(Debug, Default)]
pub struct SpawnReport {
    /// Hostiles that fell off the bottom
    pub escaped: Vec<(u32, TargetKind)>,
    /// Hostiles killed by damage-over-time
    pub burned: Vec<BurnKill>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnKill {
    pub id: u32,
    pub kind: TargetKind,
    pub pos: Vec2,
    pub score_value: u32,
    pub soul_value: f32,
    pub hook: DeathHook,
}

/// Default hostile weights, shifting toward harder kinds over time
fn timed_weights(elapsed: f32) -> [(HostileKind, f32); 4] {
    use HostileKind::*;
    if elapsed < 30.0 {
        [(Zombie, 70.0), (Vampire, 20.0), (Ghost, 10.0), (Brute, 0.0)]
    } else if elapsed < 90.0 {
        [(Zombie, 50.0), (Vampire, 25.0), (Ghost, 15.0), (Brute, 10.0)]
    } else {
        [(Zombie, 35.0), (Vampire, 30.0), (Ghost, 20.0), (Brute, 15.0)]
    }
}

/// Weighted pick; an empty or all-zero table yields the zombie
pub fn weighted_pick(weights: &[(HostileKind, f32)], roll: f32) -> HostileKind {
    let total: f32 = weights.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        log::warn!("Hostile weight table is empty, falling back to zombie");
        return HostileKind::Zombie;
    }
    let mut threshold = roll.clamp(0.0, 1.0) * total;
    let mut last = HostileKind::Zombie;
    for (kind, weight) in weights {
        let weight = weight.max(0.0);
        if weight <= 0.0 {
            continue;
        }
        last = *kind;
        if threshold < weight {
            return *kind;
        }
        threshold -= weight;
    }
    last
}

/// Turn a level's name-keyed weights into typed ones
fn parse_level_weights(level: &LevelConfig) -> Option<Vec<(HostileKind, f32)>> {
    let weights = level.hostile_weights.as_ref()?;
    let mut parsed = Vec::with_capacity(weights.len());
    for (name, weight) in weights {
        let kind = HostileKind::from_name(name).unwrap_or_else(|| {
            log::warn!("Unknown hostile kind '{}' in level '{}', using zombie", name, level.name);
            HostileKind::Zombie
        });
        parsed.push((kind, *weight));
    }
    Some(parsed)
}

#[derive(Debug, Clone)]
pub struct SpawnSystem {
    tuning: SpawnTuning,
    target_tuning: TargetTuning,
    level: Option<LevelConfig>,
    level_weights: Option<Vec<(HostileKind, f32)>>,
    modifiers: Option<DifficultyModifiers>,
    ghost_vision: bool,

    elapsed: f32,
    target_timer: f32,
    powerup_timer: f32,
    next_id: u32,

    /// Live hostiles (ascending id)
    pub hostiles: Vec<Target>,
    /// Live villagers (ascending id)
    pub villagers: Vec<Target>,
    /// Live power-up pickups (ascending id)
    pub pickups: Vec<Target>,
}

impl SpawnSystem {
    pub fn new(tuning: &Tuning) -> Self {
        let mut system = Self {
            tuning: tuning.spawn.clone(),
            target_tuning: tuning.targets.clone(),
            level: None,
            level_weights: None,
            modifiers: None,
            ghost_vision: false,
            elapsed: 0.0,
            target_timer: 0.0,
            powerup_timer: 0.0,
            next_id: 1,
            hostiles: Vec::new(),
            villagers: Vec::new(),
            pickups: Vec::new(),
        };
        system.target_timer = system.spawn_interval();
        system.powerup_timer = system.powerup_interval();
        system
    }

    /// Install or clear a level config. Takes effect from the next spawn.
    pub fn set_level(&mut self, level: Option<LevelConfig>) {
        self.level_weights = level.as_ref().and_then(parse_level_weights);
        if let Some(level) = &level {
            log::info!("Level config '{}' applied", level.name);
        }
        self.level = level;
    }

    pub fn level(&self) -> Option<&LevelConfig> {
        self.level.as_ref()
    }

    pub fn set_difficulty_modifiers(&mut self, modifiers: Option<DifficultyModifiers>) {
        self.modifiers = modifiers;
    }

    pub fn difficulty_modifiers(&self) -> Option<DifficultyModifiers> {
        self.modifiers
    }

    /// Upgrade: ghosts stay visible. Applies to live ghosts too.
    pub fn set_ghost_vision(&mut self, enabled: bool) {
        self.ghost_vision = enabled;
        if enabled {
            for target in &mut self.hostiles {
                target.force_visible();
            }
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds between target spawns right now
    pub fn spawn_interval(&self) -> f32 {
        if let Some(interval) = self.level.as_ref().and_then(|l| l.spawn_interval) {
            return interval;
        }
        let t = &self.tuning;
        let mut interval = (t.start_interval - self.elapsed * t.interval_decay).max(t.min_interval);
        if let Some(m) = self.modifiers
            && m.spawn_rate_multiplier > 0.0
        {
            interval = (interval / m.spawn_rate_multiplier).max(t.min_interval);
        }
        interval
    }

    pub fn powerup_interval(&self) -> f32 {
        self.level
            .as_ref()
            .and_then(|l| l.powerup_interval)
            .unwrap_or(self.tuning.powerup_interval)
    }

    /// Probability that the next spawn is a villager
    pub fn villager_chance(&self) -> f32 {
        if let Some(chance) = self.level.as_ref().and_then(|l| l.villager_chance) {
            return chance;
        }
        if let Some(m) = self.modifiers {
            return m.villager_chance.clamp(0.0, 1.0);
        }
        let t = &self.tuning;
        (t.villager_base_chance + self.elapsed * t.villager_chance_ramp).min(t.villager_max_chance)
    }

    /// Launch speed scale, clamped to the configured range
    pub fn difficulty_scale(&self) -> f32 {
        let t = &self.tuning;
        (t.difficulty_min + self.elapsed * t.difficulty_ramp).clamp(t.difficulty_min, t.difficulty_max)
    }

    pub fn hostile_weights(&self) -> Vec<(HostileKind, f32)> {
        match &self.level_weights {
            Some(weights) => weights.clone(),
            None => timed_weights(self.elapsed).to_vec(),
        }
    }

    /// Villager trial first, then the hostile sub-type
    pub fn choose_kind(&self, rng: &mut Pcg32) -> TargetKind {
        if rng.random_bool(self.villager_chance().clamp(0.0, 1.0) as f64) {
            return TargetKind::Villager;
        }
        let roll: f32 = rng.random();
        TargetKind::Hostile(weighted_pick(&self.hostile_weights(), roll))
    }

    fn choose_powerup(&self, rng: &mut Pcg32) -> Option<BuffKind> {
        let kinds: &[BuffKind] = match self.level.as_ref().and_then(|l| l.powerup_kinds.as_deref()) {
            Some(kinds) => kinds,
            None => &BuffKind::ALL,
        };
        if kinds.is_empty() {
            return None;
        }
        Some(kinds[rng.random_range(0..kinds.len())])
    }

    /// Random launch point below the screen plus a velocity that peaks at a
    /// random apex, scaled by a random speed factor
    pub fn random_launch(&self, rng: &mut Pcg32) -> (Vec2, Vec2) {
        let t = &self.tuning;
        let margin = t.spawn_margin_x.clamp(0.0, GAME_WIDTH / 2.0);
        let from = Vec2::new(rng.random_range(margin..=GAME_WIDTH - margin), SPAWN_Y);
        let apex = Vec2::new(
            rng.random_range(GAME_WIDTH * 0.2..=GAME_WIDTH * 0.8),
            rng.random_range(t.apex_min_y..=t.apex_max_y),
        );

        let mut speed = rng.random_range(t.speed_factor_min..=t.speed_factor_max);
        speed *= self.difficulty_scale();
        if let Some(m) = self.modifiers {
            speed *= m.speed_multiplier;
        }
        if let Some(level_speed) = self.level.as_ref().and_then(|l| l.speed_multiplier) {
            speed *= level_speed;
        }

        let launch = solve_launch(from, apex, GRAVITY).scaled(speed);
        (from, launch.velocity)
    }

    /// Put a target of `kind` into play at a given position/velocity
    pub fn spawn_at(&mut self, kind: TargetKind, pos: Vec2, vel: Vec2, bus: &mut EventBus) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        let mut target = Target::new(id, kind, &self.target_tuning);
        if self.ghost_vision {
            target.force_visible();
        }
        target.spawn(pos, vel);

        match kind {
            TargetKind::Hostile(_) => self.hostiles.push(target),
            TargetKind::Villager => self.villagers.push(target),
            TargetKind::PowerUp(_) => self.pickups.push(target),
        }
        log::debug!("Spawned {:?} #{} at ({:.0}, {:.0})", kind, id, pos.x, pos.y);
        bus.publish(GameEvent::TargetSpawned { id, kind, pos });
        id
    }

    /// Spawn a randomly launched target of `kind`
    pub fn spawn_kind(&mut self, kind: TargetKind, rng: &mut Pcg32, bus: &mut EventBus) -> u32 {
        let (pos, vel) = self.random_launch(rng);
        self.spawn_at(kind, pos, vel, bus)
    }

    /// Advance live targets, then run the spawn timers.
    ///
    /// Targets created this tick are not advanced until the next one.
    pub fn update(&mut self, dt: f32, rng: &mut Pcg32, bus: &mut EventBus) -> SpawnReport {
        let mut report = SpawnReport::default();
        if dt <= 0.0 {
            return report;
        }
        self.elapsed += dt;

        for target in &mut self.hostiles {
            match target.update(dt) {
                TargetUpdate::Escaped => report.escaped.push((target.id, target.kind)),
                TargetUpdate::Burned(hook) => report.burned.push(BurnKill {
                    id: target.id,
                    kind: target.kind,
                    pos: target.pos,
                    score_value: target.score_value,
                    soul_value: target.soul_value,
                    hook,
                }),
                TargetUpdate::Alive | TargetUpdate::Inactive => {}
            }
        }
        for target in self.villagers.iter_mut().chain(self.pickups.iter_mut()) {
            if target.update(dt) == TargetUpdate::Escaped {
                log::trace!("{:?} #{} left the screen", target.kind, target.id);
            }
        }
        self.compact();

        // Timers reset on firing; overshoot past zero is dropped
        self.target_timer -= dt;
        if self.target_timer <= 0.0 {
            let kind = self.choose_kind(rng);
            self.spawn_kind(kind, rng, bus);
            self.target_timer = self.spawn_interval();
        }

        self.powerup_timer -= dt;
        if self.powerup_timer <= 0.0 {
            match self.choose_powerup(rng) {
                Some(buff) => {
                    self.spawn_kind(TargetKind::PowerUp(buff), rng, bus);
                }
                None => log::debug!("No power-up kinds allowed, skipping spawn"),
            }
            self.powerup_timer = self.powerup_interval();
        }

        report
    }

    /// Drop targets that are no longer in play
    pub fn compact(&mut self) {
        self.hostiles.retain(|t| t.is_alive());
        self.villagers.retain(|t| t.is_alive());
        self.pickups.retain(|t| t.is_alive());
    }

    pub fn live_count(&self) -> usize {
        self.hostiles.len() + self.villagers.len() + self.pickups.len()
    }

    /// Look up any live target by id
    pub fn find(&self, id: u32) -> Option<&Target> {
        self.hostiles
            .iter()
            .chain(&self.villagers)
            .chain(&self.pickups)
            .find(|t| t.id == id)
    }

    pub fn find_mut(&mut self, id: u32) -> Option<&mut Target> {
        self.hostiles
            .iter_mut()
            .chain(self.villagers.iter_mut())
            .chain(self.pickups.iter_mut())
            .find(|t| t.id == id)
    }
}
