//! Slash gesture tracking
//!
//! The pointer is sampled once per tick. While it moves faster than the
//! velocity threshold the slash is live and each sample extends the trail;
//! otherwise the trail retracts one point per tick from its tail.
//!
//! Holding the pointer down charges a power tier that the next slash uses.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{EventBus, GameEvent};
use crate::tuning::GestureTuning;

/// Trail colours by charge tier (0xRRGGBB); higher tiers reuse the last
pub const TIER_COLORS: [u32; 4] = [0xFFFFFF, 0x7FD4FF, 0xFFB347, 0xFF4D4D];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureState {
    Inactive,
    Active,
}

/// Pointer speed between two samples; zero for non-positive `dt`
#[inline]
pub fn pointer_speed(from: Vec2, to: Vec2, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    from.distance(to) / dt
}

/// Fixed-capacity polyline, oldest point first
#[derive(Debug, Clone)]
pub struct SlashTrail {
    points: VecDeque<Vec2>,
    capacity: usize,
}

impl SlashTrail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest point when full
    pub fn push(&mut self, point: Vec2) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn evict_oldest(&mut self) -> Option<Vec2> {
        self.points.pop_front()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points.iter().copied()
    }

    /// Consecutive point pairs, oldest segment first
    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.points.iter().zip(self.points.iter().skip(1)).map(|(a, b)| (*a, *b))
    }

    pub fn newest(&self) -> Option<Vec2> {
        self.points.back().copied()
    }
}

#[derive(Debug, Clone)]
pub struct GestureTracker {
    tuning: GestureTuning,
    state: GestureState,
    trail: SlashTrail,
    last_sample: Option<Vec2>,
    speed: f32,

    charging: bool,
    charge_elapsed: f32,
    charge_tier: u32,
    /// Tier latched into the slash in progress
    power_tier: u32,
    width_multiplier: f32,
    color: u32,
    slash_in_progress: bool,
}

impl GestureTracker {
    pub fn new(tuning: &GestureTuning) -> Self {
        Self {
            tuning: tuning.clone(),
            state: GestureState::Inactive,
            trail: SlashTrail::new(tuning.trail_capacity),
            last_sample: None,
            speed: 0.0,
            charging: false,
            charge_elapsed: 0.0,
            charge_tier: 0,
            power_tier: 0,
            width_multiplier: 1.0,
            color: TIER_COLORS[0],
            slash_in_progress: false,
        }
    }

    /// Feed this tick's pointer sample (`None` while the pointer is up)
    pub fn update(&mut self, pointer: Option<Vec2>, dt: f32, bus: &mut EventBus) {
        match pointer {
            Some(point) => {
                self.speed = self
                    .last_sample
                    .map(|prev| pointer_speed(prev, point, dt))
                    .unwrap_or(0.0);

                if self.speed > self.tuning.velocity_threshold {
                    if self.state == GestureState::Inactive {
                        self.begin_slash();
                    }
                    // Seed the previous sample so the first segment exists now
                    if self.trail.is_empty()
                        && let Some(prev) = self.last_sample
                    {
                        self.trail.push(prev);
                    }
                    self.trail.push(point);
                    self.state = GestureState::Active;
                } else {
                    self.state = GestureState::Inactive;
                    self.trail.evict_oldest();
                }
                self.last_sample = Some(point);
            }
            None => {
                self.state = GestureState::Inactive;
                self.speed = 0.0;
                self.last_sample = None;
                self.trail.evict_oldest();
            }
        }

        if self.state == GestureState::Inactive && self.trail.is_empty() && self.slash_in_progress {
            self.slash_in_progress = false;
            self.reset_power(bus);
        }
    }

    fn begin_slash(&mut self) {
        self.slash_in_progress = true;
        if self.charging {
            self.power_tier = self.stop_charging();
        }
    }

    /// Live slash: active state with at least one segment
    pub fn is_active(&self) -> bool {
        self.state == GestureState::Active && self.trail.len() >= 2
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn trail(&self) -> &SlashTrail {
        &self.trail
    }

    /// Pointer speed measured on the last sample
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Begin accumulating charge (pointer down)
    pub fn start_charging(&mut self) {
        self.charging = true;
        self.charge_elapsed = 0.0;
        self.charge_tier = 0;
    }

    /// Accumulate hold time; emits when a tier boundary is crossed
    pub fn update_charging(&mut self, dt: f32, bus: &mut EventBus) {
        if !self.charging || dt <= 0.0 {
            return;
        }
        self.charge_elapsed += dt;
        let tier = ((self.charge_elapsed / self.tuning.charge_time_per_tier).floor() as u32)
            .min(self.tuning.max_charge_tier);
        if tier != self.charge_tier {
            self.charge_tier = tier;
            self.set_visual_tier(tier);
            log::debug!("Charge tier {}", tier);
            bus.publish(GameEvent::ChargeLevelChanged {
                level: tier,
                width_multiplier: self.width_multiplier,
                color: self.color,
            });
        }
    }

    /// End charging and hand back the tier reached
    pub fn stop_charging(&mut self) -> u32 {
        let tier = self.charge_tier;
        self.charging = false;
        self.charge_elapsed = 0.0;
        self.charge_tier = 0;
        tier
    }

    /// Pointer let go without slashing: the charge is lost and the trail
    /// drops back to the look of whatever slash is still in flight
    pub fn cancel_charging(&mut self, bus: &mut EventBus) {
        if !self.charging {
            return;
        }
        let charged = self.stop_charging();
        let before = (self.width_multiplier, self.color);
        self.set_visual_tier(self.power_tier);
        if before != (self.width_multiplier, self.color) {
            log::debug!("Charge tier {} discarded", charged);
            bus.publish(GameEvent::ChargeLevelChanged {
                level: self.power_tier,
                width_multiplier: self.width_multiplier,
                color: self.color,
            });
        }
    }

    /// Back to baseline width/colour once a slash is over
    pub fn reset_power(&mut self, bus: &mut EventBus) {
        let changed = self.power_tier != 0 || self.width_multiplier != 1.0;
        self.power_tier = 0;
        self.set_visual_tier(0);
        if changed {
            bus.publish(GameEvent::ChargeLevelChanged {
                level: 0,
                width_multiplier: self.width_multiplier,
                color: self.color,
            });
        }
    }

    fn set_visual_tier(&mut self, tier: u32) {
        self.width_multiplier = 1.0 + tier as f32 * self.tuning.width_per_tier;
        let idx = (tier as usize).min(TIER_COLORS.len() - 1);
        self.color = TIER_COLORS[idx];
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    pub fn charge_tier(&self) -> u32 {
        self.charge_tier
    }

    /// Tier the current slash was launched with
    pub fn power_tier(&self) -> u32 {
        self.power_tier
    }

    pub fn width_multiplier(&self) -> f32 {
        self.width_multiplier
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    /// Extra hit radius granted by slash power
    pub fn hit_radius_bonus(&self) -> f32 {
        self.power_tier as f32 * self.tuning.radius_per_tier
    }
}
