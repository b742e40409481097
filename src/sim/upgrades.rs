//! Weapon and upgrade hooks
//!
//! The core asks these providers questions at hit time and never owns
//! progression. Missing providers behave like a bare blade with no upgrades.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::target::{HostileKind, Target, TargetKind};

/// Per-hit weapon behaviour
pub trait WeaponEffects {
    /// Extra slash damage against this kind
    fn bonus_damage(&self, _kind: TargetKind) -> u32 {
        0
    }

    /// Apply status effects to a target about to take the hit
    fn apply_effects(&self, _target: &mut Target, _rng: &mut Pcg32) {}

    /// Whether this weapon makes hidden targets permanently visible
    fn reveals_hidden(&self) -> bool {
        false
    }
}

/// Pure accessors over the player's persistent upgrades
pub trait UpgradeProvider {
    fn hitbox_radius_multiplier(&self) -> f32 {
        1.0
    }

    fn score_multiplier(&self) -> f32 {
        1.0
    }

    /// Probability in `[0, 1]` that a kill is critical
    fn crit_chance(&self) -> f32 {
        0.0
    }

    fn crit_multiplier(&self) -> f32 {
        1.0
    }

    /// Overrides the tuned starting lives when set
    fn starting_lives(&self) -> Option<u32> {
        None
    }

    fn ghost_vision(&self) -> bool {
        false
    }
}

/// Optional weapon and upgrade providers for a run
#[derive(Default)]
pub struct Loadout {
    pub weapon: Option<Box<dyn WeaponEffects>>,
    pub upgrades: Option<Box<dyn UpgradeProvider>>,
}

impl Loadout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weapon(mut self, weapon: impl WeaponEffects + 'static) -> Self {
        self.weapon = Some(Box::new(weapon));
        self
    }

    pub fn with_upgrades(mut self, upgrades: impl UpgradeProvider + 'static) -> Self {
        self.upgrades = Some(Box::new(upgrades));
        self
    }

    pub fn bonus_damage(&self, kind: TargetKind) -> u32 {
        self.weapon.as_ref().map_or(0, |w| w.bonus_damage(kind))
    }

    pub fn apply_effects(&self, target: &mut Target, rng: &mut Pcg32) {
        if let Some(weapon) = &self.weapon {
            weapon.apply_effects(target, rng);
        }
    }

    pub fn reveals_hidden(&self) -> bool {
        self.weapon.as_ref().is_some_and(|w| w.reveals_hidden())
    }

    pub fn hitbox_radius_multiplier(&self) -> f32 {
        self.upgrades
            .as_ref()
            .map_or(1.0, |u| u.hitbox_radius_multiplier())
            .max(0.0)
    }

    pub fn score_multiplier(&self) -> f32 {
        self.upgrades
            .as_ref()
            .map_or(1.0, |u| u.score_multiplier())
            .max(0.0)
    }

    pub fn crit_chance(&self) -> f32 {
        self.upgrades
            .as_ref()
            .map_or(0.0, |u| u.crit_chance())
            .clamp(0.0, 1.0)
    }

    pub fn crit_multiplier(&self) -> f32 {
        self.upgrades.as_ref().map_or(1.0, |u| u.crit_multiplier())
    }

    pub fn starting_lives(&self) -> Option<u32> {
        self.upgrades.as_ref().and_then(|u| u.starting_lives())
    }

    pub fn ghost_vision(&self) -> bool {
        self.upgrades.as_ref().is_some_and(|u| u.ghost_vision())
    }
}

impl fmt::Debug for Loadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loadout")
            .field("weapon", &self.weapon.is_some())
            .field("upgrades", &self.upgrades.is_some())
            .finish()
    }
}

/// Burn applied on hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurnSpec {
    pub damage: u32,
    pub duration: f32,
}

/// Slow applied on hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowSpec {
    pub factor: f32,
    pub duration: f32,
}

/// Data-driven weapon, loadable from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponProfile {
    pub name: String,
    pub bonus_damage: BTreeMap<HostileKind, u32>,
    pub burn: Option<BurnSpec>,
    pub slow: Option<SlowSpec>,
    pub stun_secs: f32,
    /// Chance that the status effects land on a given hit
    pub effect_chance: f32,
    pub reveals_hidden: bool,
}

impl Default for WeaponProfile {
    fn default() -> Self {
        Self {
            name: "Blade".to_string(),
            bonus_damage: BTreeMap::new(),
            burn: None,
            slow: None,
            stun_secs: 0.0,
            effect_chance: 1.0,
            reveals_hidden: false,
        }
    }
}

impl WeaponEffects for WeaponProfile {
    fn bonus_damage(&self, kind: TargetKind) -> u32 {
        match kind {
            TargetKind::Hostile(h) => self.bonus_damage.get(&h).copied().unwrap_or(0),
            _ => 0,
        }
    }

    fn apply_effects(&self, target: &mut Target, rng: &mut Pcg32) {
        if !target.kind.is_hostile() {
            return;
        }
        let chance = self.effect_chance.clamp(0.0, 1.0);
        if chance < 1.0 && !rng.random_bool(chance as f64) {
            return;
        }
        if let Some(burn) = self.burn {
            target.apply_burn(burn.damage, burn.duration);
        }
        if let Some(slow) = self.slow {
            target.apply_slow(slow.factor, slow.duration);
        }
        if self.stun_secs > 0.0 {
            target.apply_stun(self.stun_secs);
        }
    }

    fn reveals_hidden(&self) -> bool {
        self.reveals_hidden
    }
}

/// Upgrade levels bought between runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeLevels {
    pub hitbox: u32,
    pub score: u32,
    pub crit: u32,
    pub extra_lives: u32,
    pub ghost_vision: bool,
}

impl UpgradeLevels {
    const HITBOX_PER_LEVEL: f32 = 0.1;
    const SCORE_PER_LEVEL: f32 = 0.1;
    const CRIT_PER_LEVEL: f32 = 0.05;
    const CRIT_CAP: f32 = 0.5;
    const CRIT_MULTIPLIER: f32 = 2.0;
}

impl UpgradeProvider for UpgradeLevels {
    fn hitbox_radius_multiplier(&self) -> f32 {
        1.0 + self.hitbox as f32 * Self::HITBOX_PER_LEVEL
    }

    fn score_multiplier(&self) -> f32 {
        1.0 + self.score as f32 * Self::SCORE_PER_LEVEL
    }

    fn crit_chance(&self) -> f32 {
        (self.crit as f32 * Self::CRIT_PER_LEVEL).min(Self::CRIT_CAP)
    }

    fn crit_multiplier(&self) -> f32 {
        if self.crit > 0 { Self::CRIT_MULTIPLIER } else { 1.0 }
    }

    fn starting_lives(&self) -> Option<u32> {
        (self.extra_lives > 0)
            .then_some(crate::tuning::DEFAULT_STARTING_LIVES + self.extra_lives)
    }

    fn ghost_vision(&self) -> bool {
        self.ghost_vision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::TargetTuning;
    use glam::Vec2;
    use rand::SeedableRng;

    fn zombie() -> Target {
        let mut t = Target::new(
            1,
            TargetKind::Hostile(HostileKind::Zombie),
            &TargetTuning::default(),
        );
        t.spawn(Vec2::new(300.0, 300.0), Vec2::new(50.0, -100.0));
        t
    }

    #[test]
    fn test_empty_loadout_is_neutral() {
        let loadout = Loadout::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut t = zombie();
        loadout.apply_effects(&mut t, &mut rng);
        assert!(t.effects.burn.is_none());
        assert_eq!(loadout.bonus_damage(t.kind), 0);
        assert_eq!(loadout.hitbox_radius_multiplier(), 1.0);
        assert_eq!(loadout.score_multiplier(), 1.0);
        assert_eq!(loadout.crit_chance(), 0.0);
        assert_eq!(loadout.starting_lives(), None);
        assert!(!loadout.ghost_vision());
        assert!(!loadout.reveals_hidden());
    }

    #[test]
    fn test_weapon_profile_effects() {
        let weapon = WeaponProfile {
            burn: Some(BurnSpec {
                damage: 1,
                duration: 2.0,
            }),
            slow: Some(SlowSpec {
                factor: 0.5,
                duration: 1.0,
            }),
            stun_secs: 0.5,
            bonus_damage: BTreeMap::from([(HostileKind::Brute, 2)]),
            ..WeaponProfile::default()
        };
        let loadout = Loadout::new().with_weapon(weapon);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut t = zombie();
        loadout.apply_effects(&mut t, &mut rng);

        assert!(t.effects.burn.is_some());
        assert_eq!(t.effects.slow.map(|s| s.factor), Some(0.5));
        assert!(t.is_stunned());
        assert_eq!(loadout.bonus_damage(TargetKind::Hostile(HostileKind::Brute)), 2);
        assert_eq!(loadout.bonus_damage(TargetKind::Villager), 0);
    }

    #[test]
    fn test_weapon_spares_villagers() {
        let weapon = WeaponProfile {
            stun_secs: 1.0,
            ..WeaponProfile::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let mut villager = Target::new(2, TargetKind::Villager, &TargetTuning::default());
        villager.spawn(Vec2::new(300.0, 300.0), Vec2::ZERO);
        weapon.apply_effects(&mut villager, &mut rng);
        assert!(!villager.is_stunned());
    }

    #[test]
    fn test_upgrade_levels() {
        let levels = UpgradeLevels {
            hitbox: 2,
            score: 5,
            crit: 20,
            extra_lives: 1,
            ghost_vision: true,
        };
        let loadout = Loadout::new().with_upgrades(levels);
        assert!((loadout.hitbox_radius_multiplier() - 1.2).abs() < 1e-6);
        assert!((loadout.score_multiplier() - 1.5).abs() < 1e-6);
        // Capped
        assert_eq!(loadout.crit_chance(), 0.5);
        assert_eq!(loadout.crit_multiplier(), 2.0);
        assert_eq!(loadout.starting_lives(), Some(4));
        assert!(loadout.ghost_vision());
    }

    #[test]
    fn test_weapon_profile_json() {
        let json = r#"{
            "name": "Frost Edge",
            "slow": { "factor": 0.4, "duration": 2.0 },
            "bonus_damage": { "Brute": 1 },
            "reveals_hidden": true
        }"#;
        let weapon: WeaponProfile = serde_json::from_str(json).unwrap();
        assert_eq!(weapon.name, "Frost Edge");
        assert!(weapon.reveals_hidden());
        assert_eq!(weapon.effect_chance, 1.0);
        assert_eq!(weapon.bonus_damage(TargetKind::Hostile(HostileKind::Brute)), 1);
    }
}
