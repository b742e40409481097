//! Fixed timestep simulation tick
//!
//! Core game loop that advances the run deterministically. Order per tick:
//! spawn and move targets, gesture and charge, combo and buff decay, then
//! slash resolution.

use glam::Vec2;

use super::buffs::BuffKind;
use super::collision::{ResolveContext, SlashOutcome, resolve_slash};
use super::events::GameEvent;
use super::spawn::{BurnKill, SpawnReport};
use super::state::{GamePhase, GameState};
use super::target::DeathHook;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position while pressed, `None` while released
    pub pointer: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                state.combo.set_paused(true);
                state.buffs.set_paused(true);
                log::info!("Paused");
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                state.combo.set_paused(false);
                state.buffs.set_paused(false);
                log::info!("Resumed");
            }
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if state.phase != GamePhase::Playing || dt <= 0.0 {
        return;
    }

    state.time_ticks += 1;
    state.elapsed += dt;

    // Targets run on scaled time while Slow Time is up
    let target_dt = if state.buffs.is_active(BuffKind::SlowTime) {
        dt * state.tuning.buffs.slow_time_scale
    } else {
        dt
    };
    let report = state
        .spawner
        .update(target_dt, &mut state.rng, &mut state.bus);
    if handle_spawn_report(state, report) {
        return;
    }

    // Gesture and charge
    let pointer_down = input.pointer.is_some();
    if pointer_down && !state.pointer_was_down {
        state.gesture.start_charging();
    } else if !pointer_down && state.pointer_was_down {
        state.gesture.cancel_charging(&mut state.bus);
    }
    state.pointer_was_down = pointer_down;
    state.gesture.update_charging(dt, &mut state.bus);
    state.gesture.update(input.pointer, dt, &mut state.bus);

    // Decay
    state.combo.update(dt, &mut state.bus);
    state.buffs.update(dt, &mut state.bus);

    // Slash resolution
    if state.gesture.is_active() {
        let outcome = {
            let GameState {
                tuning,
                spawner,
                gesture,
                combo,
                buffs,
                loadout,
                rng,
                bus,
                ..
            } = state;
            let mut ctx = ResolveContext {
                scoring: &tuning.scoring,
                buff_tuning: &tuning.buffs,
                combo,
                buffs,
                loadout,
                rng,
                bus,
            };
            resolve_slash(
                gesture.trail(),
                gesture.power_tier(),
                gesture.hit_radius_bonus(),
                spawner,
                &mut ctx,
            )
        };
        apply_outcome(state, &outcome);
    }

    update_progression(state);
}

/// Book misses and burn kills. Returns true if the run just ended.
fn handle_spawn_report(state: &mut GameState, report: SpawnReport) -> bool {
    for kill in &report.burned {
        score_burn_kill(state, kill);
    }

    for (id, kind) in report.escaped {
        state.targets_missed += 1;
        log::debug!("{:?} #{} escaped", kind, id);
        state.bus.publish(GameEvent::TargetMissed { id, kind });
        if state.lose_life() {
            log::info!("Out of lives");
            state.finish();
            return true;
        }
    }
    false
}

/// Damage-over-time kills score with global buffs but leave the combo alone
fn score_burn_kill(state: &mut GameState, kill: &BurnKill) {
    let frenzy = if state.buffs.is_active(BuffKind::Frenzy) {
        state.tuning.scoring.frenzy_multiplier
    } else {
        1.0
    };
    let score = (kill.score_value as f32 * frenzy * state.loadout.score_multiplier())
        .round()
        .max(0.0) as u64;
    let souls = if state.buffs.is_active(BuffKind::SoulMagnet) {
        kill.soul_value * state.tuning.scoring.soul_magnet_factor
    } else {
        kill.soul_value
    };

    state.kills += 1;
    state.bus.publish(GameEvent::TargetSliced {
        id: kill.id,
        kind: kill.kind,
        pos: kill.pos,
        score,
        souls,
        critical: false,
    });
    if kill.hook != DeathHook::None {
        state.bus.publish(GameEvent::TargetDied {
            id: kill.id,
            kind: kill.kind,
            pos: kill.pos,
            hook: kill.hook,
        });
    }
    state.apply_score(score as i64);
    state.add_souls(souls);
}

fn apply_outcome(state: &mut GameState, outcome: &SlashOutcome) {
    state.kills += outcome.kills;
    state.villagers_hit += outcome.villagers_hit;
    if let Some(multi) = &outcome.multi_kill {
        state.best_multi_kill = state.best_multi_kill.max(multi.count);
    }
    let net = outcome.score_delta as i64 - outcome.penalty as i64;
    state.apply_score(net);
    state.add_souls(outcome.souls_delta);
}

/// Endless difficulty steps and timed level end
fn update_progression(state: &mut GameState) {
    if state.endless && state.tuning.endless.step_secs > 0.0 {
        let step = ((state.elapsed / state.tuning.endless.step_secs) as u32)
            .min(state.tuning.endless.max_steps);
        if step > state.endless_step {
            state.endless_step = step;
            let modifiers = state.endless_modifiers(step);
            state.spawner.set_difficulty_modifiers(Some(modifiers));
            log::info!("Endless difficulty step {}", step);
            state
                .bus
                .publish(GameEvent::DifficultyChanged { step, modifiers });
        }
    }

    if let Some(duration) = state.spawner.level().and_then(|l| l.duration_secs)
        && state.elapsed >= duration
    {
        log::info!("Level time is up");
        state.finish();
    }
}

/// Fixed-step accumulator for hosts that render at a variable rate
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many fixed ticks as `frame_dt` covers, up to `MAX_SUBSTEPS`.
    /// One-shot inputs (pause) apply to the first substep only.
    pub fn advance(&mut self, state: &mut GameState, input: &TickInput, frame_dt: f32) -> u32 {
        let frame_dt = frame_dt.clamp(0.0, 0.1);
        self.accumulator += frame_dt;

        let mut input = input.clone();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            input.pause = false;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog instead of spiralling
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
