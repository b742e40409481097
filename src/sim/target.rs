//! Falling/arcing targets
//!
//! One record type covers every kind. Per-kind differences (stats, death
//! effect, special update) come from the [`KindProfile`] table instead of
//! per-type code.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::buffs::BuffKind;
use crate::consts::*;
use crate::tuning::TargetTuning;

/// Hostile sub-types, roughly in order of difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HostileKind {
    Zombie,
    Vampire,
    /// Fades in and out; only sliceable while visible
    Ghost,
    /// Takes several hits
    Brute,
}

impl HostileKind {
    pub const ALL: [HostileKind; 4] = [
        HostileKind::Zombie,
        HostileKind::Vampire,
        HostileKind::Ghost,
        HostileKind::Brute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HostileKind::Zombie => "zombie",
            HostileKind::Vampire => "vampire",
            HostileKind::Ghost => "ghost",
            HostileKind::Brute => "brute",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "zombie" => Some(HostileKind::Zombie),
            "vampire" => Some(HostileKind::Vampire),
            "ghost" => Some(HostileKind::Ghost),
            "brute" => Some(HostileKind::Brute),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Hostile(HostileKind),
    /// Non-hostile; slicing one costs score and the combo
    Villager,
    /// Pickup that grants a buff
    PowerUp(BuffKind),
}

impl TargetKind {
    pub fn is_hostile(&self) -> bool {
        matches!(self, TargetKind::Hostile(_))
    }

    pub fn profile(&self) -> KindProfile {
        profile(*self)
    }
}

/// Kind-specific effect fired right before a killed target is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathHook {
    None,
    /// Falls apart into two halves (vampire)
    Split,
    /// Breaks into debris (brute)
    Shatter,
}

/// Extra per-tick behaviour on top of ballistic motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialHook {
    None,
    VisibilityCycle,
}

/// Base stats per kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindProfile {
    pub score: u32,
    pub souls: f32,
    pub health: u32,
    pub radius: f32,
    pub death: DeathHook,
    pub special: SpecialHook,
}

pub const fn profile(kind: TargetKind) -> KindProfile {
    match kind {
        TargetKind::Hostile(HostileKind::Zombie) => KindProfile {
            score: 10,
            souls: 1.0,
            health: 1,
            radius: 40.0,
            death: DeathHook::None,
            special: SpecialHook::None,
        },
        TargetKind::Hostile(HostileKind::Vampire) => KindProfile {
            score: 30,
            souls: 3.0,
            health: 1,
            radius: 40.0,
            death: DeathHook::Split,
            special: SpecialHook::None,
        },
        TargetKind::Hostile(HostileKind::Ghost) => KindProfile {
            score: 20,
            souls: 2.0,
            health: 1,
            radius: 36.0,
            death: DeathHook::None,
            special: SpecialHook::VisibilityCycle,
        },
        TargetKind::Hostile(HostileKind::Brute) => KindProfile {
            score: 50,
            souls: 5.0,
            health: 3,
            radius: 48.0,
            death: DeathHook::Shatter,
            special: SpecialHook::None,
        },
        TargetKind::Villager => KindProfile {
            score: 0,
            souls: 0.0,
            health: 1,
            radius: VILLAGER_HITBOX_RADIUS,
            death: DeathHook::None,
            special: SpecialHook::None,
        },
        TargetKind::PowerUp(_) => KindProfile {
            score: 0,
            souls: 0.0,
            health: 1,
            radius: POWERUP_HITBOX_RADIUS,
            death: DeathHook::None,
            special: SpecialHook::None,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Visible,
    Invisible,
}

/// Fade cycle for ghost-type targets.
///
/// Opacity ramps down over the last `fade_secs` of the visible phase and back
/// up over the last `fade_secs` of the invisible phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityCycle {
    pub state: Visibility,
    /// Time spent in the current state
    pub timer: f32,
    pub visible_secs: f32,
    pub invisible_secs: f32,
    pub fade_secs: f32,
    /// Upgrade override: stays fully visible, cycle frozen
    pub always_visible: bool,
}

impl VisibilityCycle {
    pub fn new(tuning: &TargetTuning) -> Self {
        Self {
            state: Visibility::Visible,
            timer: 0.0,
            visible_secs: tuning.ghost_visible_secs,
            invisible_secs: tuning.ghost_invisible_secs,
            fade_secs: tuning.ghost_fade_secs,
            always_visible: false,
        }
    }

    fn state_duration(&self) -> f32 {
        match self.state {
            Visibility::Visible => self.visible_secs,
            Visibility::Invisible => self.invisible_secs,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.always_visible {
            return;
        }
        self.timer += dt;
        loop {
            let duration = self.state_duration();
            if duration <= 0.0 || self.timer < duration {
                break;
            }
            self.timer -= duration;
            self.state = match self.state {
                Visibility::Visible => Visibility::Invisible,
                Visibility::Invisible => Visibility::Visible,
            };
        }
    }

    pub fn opacity(&self) -> f32 {
        if self.always_visible {
            return 1.0;
        }
        let duration = self.state_duration();
        let fade = self.fade_secs.clamp(0.0, duration.max(0.0));
        let fade_start = duration - fade;
        // 0 before the fade window, 1 at the end of it
        let progress = if fade <= 0.0 || self.timer < fade_start {
            0.0
        } else {
            ((self.timer - fade_start) / fade).clamp(0.0, 1.0)
        };
        match self.state {
            Visibility::Visible => 1.0 - progress,
            Visibility::Invisible => progress,
        }
    }

    pub fn is_sliceable(&self) -> bool {
        self.opacity() > 0.5
    }

    pub fn force_visible(&mut self) {
        self.always_visible = true;
        self.state = Visibility::Visible;
        self.timer = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Burn {
    pub remaining: f32,
    pub damage: u32,
    /// Time since the last burn tick
    pub tick_timer: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slow {
    pub remaining: f32,
    /// Horizontal speed factor while slowed
    pub factor: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effects {
    pub burn: Option<Burn>,
    pub slow: Option<Slow>,
    pub stun_remaining: f32,
    pub visibility: Option<VisibilityCycle>,
}

/// Result of a hit or slice attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    /// Already dead, not sliceable, or on hit cooldown
    Ignored,
    Damaged { health_left: u32 },
    Killed(DeathHook),
}

/// What happened to a target during `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetUpdate {
    Alive,
    /// Not in play (already resolved or destroyed)
    Inactive,
    /// Fell past the bottom of the screen
    Escaped,
    /// Killed by damage-over-time
    Burned(DeathHook),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub kind: TargetKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub score_value: u32,
    pub soul_value: f32,
    pub health: u32,
    /// Killed by the player (resolved)
    pub sliced: bool,
    /// Still in the world
    pub active: bool,
    pub effects: Effects,
    hit_cooldown: f32,
    hit_cooldown_secs: f32,
    burn_tick_interval: f32,
}

impl Target {
    pub fn new(id: u32, kind: TargetKind, tuning: &TargetTuning) -> Self {
        let profile = kind.profile();
        let mut target = Self {
            id,
            kind,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: profile.radius,
            score_value: profile.score,
            soul_value: profile.souls,
            health: profile.health,
            sliced: false,
            active: false,
            effects: Effects::default(),
            hit_cooldown: 0.0,
            hit_cooldown_secs: tuning.hit_cooldown,
            burn_tick_interval: tuning.burn_tick_interval,
        };
        if profile.special == SpecialHook::VisibilityCycle {
            target.effects.visibility = Some(VisibilityCycle::new(tuning));
        }
        target
    }

    /// Put the target in play with fresh kinematics and no lingering effects
    pub fn spawn(&mut self, pos: Vec2, vel: Vec2) {
        self.pos = pos;
        self.vel = vel;
        self.health = self.kind.profile().health;
        self.sliced = false;
        self.active = true;
        self.hit_cooldown = 0.0;
        self.effects.burn = None;
        self.effects.slow = None;
        self.effects.stun_remaining = 0.0;
        // The cycle restarts; an always-visible override survives respawn
        if let Some(vis) = &mut self.effects.visibility {
            vis.state = Visibility::Visible;
            vis.timer = 0.0;
        }
    }

    pub fn is_alive(&self) -> bool {
        self.active && !self.sliced
    }

    /// Alive, off hit cooldown and (for ghosts) visible enough
    pub fn is_sliceable(&self) -> bool {
        self.is_alive()
            && self.hit_cooldown <= 0.0
            && self
                .effects
                .visibility
                .as_ref()
                .is_none_or(|v| v.is_sliceable())
    }

    pub fn opacity(&self) -> f32 {
        self.effects
            .visibility
            .as_ref()
            .map(|v| v.opacity())
            .unwrap_or(1.0)
    }

    pub fn is_stunned(&self) -> bool {
        self.effects.stun_remaining > 0.0
    }

    /// Advance one step: gravity, effects, visibility, escape check
    pub fn update(&mut self, dt: f32) -> TargetUpdate {
        if !self.is_alive() {
            return TargetUpdate::Inactive;
        }
        if dt <= 0.0 {
            return TargetUpdate::Alive;
        }

        self.hit_cooldown = (self.hit_cooldown - dt).max(0.0);

        if let Some(vis) = &mut self.effects.visibility {
            vis.update(dt);
        }

        let frozen = self.effects.stun_remaining > 0.0;
        if frozen {
            self.effects.stun_remaining = (self.effects.stun_remaining - dt).max(0.0);
        }

        let slow_factor = match &mut self.effects.slow {
            Some(slow) => {
                let factor = slow.factor;
                slow.remaining -= dt;
                if slow.remaining <= 0.0 {
                    self.effects.slow = None;
                }
                factor
            }
            None => 1.0,
        };

        if !frozen {
            // Exact for constant acceleration, so the arc does not depend on dt
            self.pos.x += self.vel.x * slow_factor * dt;
            self.pos.y += self.vel.y * dt + 0.5 * GRAVITY * dt * dt;
            self.vel.y += GRAVITY * dt;
        }

        if let Some(burn) = self.effects.burn {
            let mut burn = burn;
            burn.tick_timer += dt;
            burn.remaining -= dt;
            let mut ticks = 0;
            if self.burn_tick_interval > 0.0 {
                while burn.tick_timer >= self.burn_tick_interval {
                    burn.tick_timer -= self.burn_tick_interval;
                    ticks += 1;
                }
            }
            self.effects.burn = if burn.remaining > 0.0 { Some(burn) } else { None };
            if ticks > 0
                && let HitResult::Killed(hook) = self.apply_damage(burn.damage * ticks)
            {
                return TargetUpdate::Burned(hook);
            }
        }

        if self.pos.y > SCREEN_BOTTOM_Y && self.vel.y > 0.0 {
            self.active = false;
            return TargetUpdate::Escaped;
        }

        TargetUpdate::Alive
    }

    /// Raw damage from any source. Ignores visibility and hit cooldown.
    pub fn apply_damage(&mut self, amount: u32) -> HitResult {
        if !self.is_alive() || amount == 0 {
            return HitResult::Ignored;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.kill()
        } else {
            HitResult::Damaged {
                health_left: self.health,
            }
        }
    }

    /// Damage over time; replaces any burn already running
    pub fn apply_burn(&mut self, damage: u32, duration: f32) {
        self.effects.burn = (duration > 0.0).then_some(Burn {
            remaining: duration,
            damage,
            tick_timer: 0.0,
        });
    }

    /// Horizontal slow; replaces any slow already running
    pub fn apply_slow(&mut self, factor: f32, duration: f32) {
        self.effects.slow = (duration > 0.0).then_some(Slow {
            remaining: duration,
            factor: factor.clamp(0.0, 1.0),
        });
    }

    /// Freeze in place; replaces any stun already running
    pub fn apply_stun(&mut self, duration: f32) {
        self.effects.stun_remaining = duration.max(0.0);
    }

    /// Permanent visibility override (no-op for kinds without a cycle)
    pub fn force_visible(&mut self) {
        if let Some(vis) = &mut self.effects.visibility {
            vis.force_visible();
        }
    }

    /// A plain one-damage slash.
    ///
    /// Same rules as [`Target::take_hit`]: after a non-lethal hit a
    /// multi-health target ignores slices until its hit cooldown runs out,
    /// and a resolved target ignores every later slice.
    pub fn slice(&mut self) -> HitResult {
        self.take_hit(1)
    }

    /// Slash hit for `damage`. Only the lethal hit resolves the target;
    /// every later call is ignored. A non-lethal hit starts the hit cooldown,
    /// during which the target is not sliceable and hits return `Ignored`.
    pub fn take_hit(&mut self, damage: u32) -> HitResult {
        if !self.is_sliceable() {
            return HitResult::Ignored;
        }
        let result = self.apply_damage(damage.max(1));
        if matches!(result, HitResult::Damaged { .. }) {
            self.hit_cooldown = self.hit_cooldown_secs;
        }
        result
    }

    fn kill(&mut self) -> HitResult {
        self.sliced = true;
        let hook = self.kind.profile().death;
        // Hook is reported to the caller before the target leaves play
        self.active = false;
        HitResult::Killed(hook)
    }
}
