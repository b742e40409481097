//! Slash-vs-target resolution
//!
//! Every trail segment is tested against every live target's hit circle.
//! The first segment that touches a target resolves it, and a target is
//! resolved at most once per tick. Hostiles are scored first so the
//! multi-kill count only sees this pass's kills; villagers and pickups follow.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::buffs::{BuffKind, BuffManager};
use super::combo::ComboTracker;
use super::events::{EventBus, GameEvent};
use super::gesture::SlashTrail;
use super::spawn::SpawnSystem;
use super::target::{DeathHook, HitResult, Target, TargetKind};
use super::upgrades::Loadout;
use crate::tuning::{BuffTuning, ScoringTuning};
use crate::{on_screen, point_segment_distance};

/// Whether the segment `a`-`b` touches the circle at `center`
#[inline]
pub fn segment_hits_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    point_segment_distance(center, a, b) <= radius
}

/// Index of the oldest trail segment touching the circle
pub fn first_hit_segment(trail: &SlashTrail, center: Vec2, radius: f32) -> Option<usize> {
    trail
        .segments()
        .position(|(a, b)| segment_hits_circle(a, b, center, radius))
}

/// Everything the resolver reads or mutates besides the targets
pub struct ResolveContext<'a> {
    pub scoring: &'a ScoringTuning,
    pub buff_tuning: &'a BuffTuning,
    pub combo: &'a mut ComboTracker,
    pub buffs: &'a mut BuffManager,
    pub loadout: &'a Loadout,
    pub rng: &'a mut Pcg32,
    pub bus: &'a mut EventBus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiKill {
    pub count: u32,
    pub bonus: u64,
    pub label: String,
}

/// What one resolution pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlashOutcome {
    /// Score earned, multi-kill bonus included
    pub score_delta: u64,
    pub souls_delta: f32,
    /// Hostiles killed
    pub kills: u32,
    /// Score to take away for unshielded villager hits
    pub penalty: u64,
    pub villagers_hit: u32,
    pub pickups: Vec<BuffKind>,
    pub multi_kill: Option<MultiKill>,
}

impl SlashOutcome {
    pub fn is_empty(&self) -> bool {
        self.kills == 0 && self.villagers_hit == 0 && self.pickups.is_empty()
    }
}

/// Resolve the live slash against every target in play.
///
/// `power_tier` adds damage and `radius_bonus` widens every hit circle.
pub fn resolve_slash(
    trail: &SlashTrail,
    power_tier: u32,
    radius_bonus: f32,
    spawner: &mut SpawnSystem,
    ctx: &mut ResolveContext<'_>,
) -> SlashOutcome {
    let mut outcome = SlashOutcome::default();
    if trail.len() < 2 {
        return outcome;
    }

    let radius_scale = ctx.loadout.hitbox_radius_multiplier();
    let hit_radius = |radius: f32| radius * radius_scale + radius_bonus;

    // Hostiles
    let mut kill_sum: u64 = 0;
    for target in &mut spawner.hostiles {
        if !target.is_sliceable() || !on_screen(target.pos, target.radius) {
            continue;
        }
        if first_hit_segment(trail, target.pos, hit_radius(target.radius)).is_none() {
            continue;
        }

        let damage = 1 + power_tier + ctx.loadout.bonus_damage(target.kind);
        ctx.loadout.apply_effects(target, ctx.rng);

        match target.take_hit(damage) {
            HitResult::Ignored => {}
            HitResult::Damaged { health_left } => {
                log::debug!("{:?} #{} hit, {} health left", target.kind, target.id, health_left);
                ctx.bus.publish(GameEvent::TargetHit {
                    id: target.id,
                    kind: target.kind,
                    health_left,
                });
            }
            HitResult::Killed(hook) => {
                let (score, souls, critical) = score_hostile_kill(target, ctx);
                kill_sum += score;
                outcome.score_delta += score;
                outcome.souls_delta += souls;
                outcome.kills += 1;
                publish_kill(ctx.bus, target, hook, score, souls, critical);
            }
        }
    }

    if let Some((multiplier, label)) = ctx.scoring.multi_kill_tier(outcome.kills) {
        let bonus = (kill_sum as f32 * (multiplier - 1.0)).round() as u64;
        outcome.score_delta += bonus;
        log::info!("{} kill ({} hostiles, +{})", label, outcome.kills, bonus);
        ctx.bus.publish(GameEvent::MultiKill {
            count: outcome.kills,
            bonus,
            label: label.to_string(),
        });
        outcome.multi_kill = Some(MultiKill {
            count: outcome.kills,
            bonus,
            label: label.to_string(),
        });
    }

    // Villagers
    for villager in &mut spawner.villagers {
        if !villager.is_sliceable() || !on_screen(villager.pos, villager.radius) {
            continue;
        }
        if first_hit_segment(trail, villager.pos, hit_radius(villager.radius)).is_none() {
            continue;
        }
        if !matches!(villager.take_hit(1), HitResult::Killed(_)) {
            continue;
        }

        outcome.villagers_hit += 1;
        let shielded = ctx.buffs.consume(BuffKind::Shield, ctx.bus);
        let penalty = if shielded {
            log::info!("Shield absorbed villager #{}", villager.id);
            ctx.bus.publish(GameEvent::ShieldConsumed);
            0
        } else {
            log::info!("Villager #{} sliced, -{}", villager.id, ctx.scoring.villager_penalty);
            ctx.combo.reset(ctx.bus);
            ctx.scoring.villager_penalty
        };
        outcome.penalty += penalty;
        ctx.bus.publish(GameEvent::VillagerSliced {
            id: villager.id,
            pos: villager.pos,
            penalty,
            shielded,
        });
    }

    // Pickups
    for pickup in &mut spawner.pickups {
        let TargetKind::PowerUp(kind) = pickup.kind else {
            continue;
        };
        if !pickup.is_sliceable() || !on_screen(pickup.pos, pickup.radius) {
            continue;
        }
        if first_hit_segment(trail, pickup.pos, hit_radius(pickup.radius)).is_none() {
            continue;
        }
        if !matches!(pickup.take_hit(1), HitResult::Killed(_)) {
            continue;
        }
        ctx.bus.publish(GameEvent::PowerUpCollected {
            id: pickup.id,
            kind,
        });
        ctx.buffs.activate(kind, ctx.buff_tuning.duration(kind), ctx.bus);
        outcome.pickups.push(kind);
    }

    outcome
}

/// Score and souls for a hostile the slash just killed.
///
/// The combo multiplier is sampled before this kill increments it.
fn score_hostile_kill(target: &Target, ctx: &mut ResolveContext<'_>) -> (u64, f32, bool) {
    let combo = ctx.combo.multiplier();
    ctx.combo.increment(ctx.bus);

    let frenzy = if ctx.buffs.is_active(BuffKind::Frenzy) {
        ctx.scoring.frenzy_multiplier
    } else {
        1.0
    };
    let crit_chance = ctx.loadout.crit_chance();
    let critical = crit_chance > 0.0 && ctx.rng.random::<f32>() < crit_chance;
    let crit = if critical {
        ctx.loadout.crit_multiplier()
    } else {
        1.0
    };

    let score = (target.score_value as f32 * combo * frenzy * ctx.loadout.score_multiplier() * crit)
        .round()
        .max(0.0) as u64;

    let souls = target.soul_value
        * if ctx.buffs.is_active(BuffKind::SoulMagnet) {
            ctx.scoring.soul_magnet_factor
        } else {
            1.0
        };

    (score, souls, critical)
}

fn publish_kill(
    bus: &mut EventBus,
    target: &Target,
    hook: DeathHook,
    score: u64,
    souls: f32,
    critical: bool,
) {
    log::debug!("{:?} #{} sliced for {}", target.kind, target.id, score);
    bus.publish(GameEvent::TargetSliced {
        id: target.id,
        kind: target.kind,
        pos: target.pos,
        score,
        souls,
        critical,
    });
    if hook != DeathHook::None {
        bus.publish(GameEvent::TargetDied {
            id: target.id,
            kind: target.kind,
            pos: target.pos,
            hook,
        });
    }
}
