//! Consecutive-kill combo with a decay window

use std::collections::BTreeSet;

use super::events::{EventBus, GameEvent};
use crate::consts::TIMER_EPSILON;
use crate::tuning::ComboTuning;

#[derive(Debug, Clone)]
pub struct ComboTracker {
    rate: f32,
    timeout: f32,
    milestones: Vec<u32>,

    count: u32,
    multiplier: f32,
    /// Seconds left before the combo drops
    timer: f32,
    max_combo: u32,
    /// Milestones already announced this run
    fired: BTreeSet<u32>,
    paused: bool,
}

impl ComboTracker {
    pub fn new(tuning: &ComboTuning) -> Self {
        Self {
            rate: tuning.rate,
            timeout: tuning.timeout,
            milestones: tuning.milestones.clone(),
            count: 0,
            multiplier: 1.0,
            timer: 0.0,
            max_combo: 0,
            fired: BTreeSet::new(),
            paused: false,
        }
    }

    /// Register a kill: bump the count and refresh the window
    pub fn increment(&mut self, bus: &mut EventBus) {
        self.count += 1;
        self.multiplier = 1.0 + self.count as f32 * self.rate;
        self.timer = self.timeout;
        self.max_combo = self.max_combo.max(self.count);

        bus.publish(GameEvent::ComboUpdated {
            count: self.count,
            multiplier: self.multiplier,
        });

        if self.milestones.contains(&self.count) && self.fired.insert(self.count) {
            log::info!("Combo milestone {}", self.count);
            bus.publish(GameEvent::ComboMilestone { count: self.count });
        }
    }

    pub fn update(&mut self, dt: f32, bus: &mut EventBus) {
        if self.paused || self.count == 0 {
            return;
        }
        self.timer -= dt;
        if self.timer <= TIMER_EPSILON {
            self.reset(bus);
        }
    }

    /// Drop the combo now (villager hit, decay, run end)
    pub fn reset(&mut self, bus: &mut EventBus) {
        let previous = self.count;
        self.count = 0;
        self.multiplier = 1.0;
        self.timer = 0.0;
        if previous > 0 {
            log::debug!("Combo of {} dropped", previous);
            bus.publish(GameEvent::ComboReset { previous });
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Seconds until the combo drops (0 with no combo running)
    pub fn time_left(&self) -> f32 {
        self.timer.max(0.0)
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use proptest::prelude::*;

    fn combo_events(log: &[GameEvent]) -> (usize, usize, usize) {
        let updated = log
            .iter()
            .filter(|e| matches!(e, GameEvent::ComboUpdated { .. }))
            .count();
        let milestones = log
            .iter()
            .filter(|e| matches!(e, GameEvent::ComboMilestone { .. }))
            .count();
        let resets = log
            .iter()
            .filter(|e| matches!(e, GameEvent::ComboReset { .. }))
            .count();
        (updated, milestones, resets)
    }

    #[test]
    fn test_multiplier_tracks_count() {
        let mut combo = ComboTracker::new(&ComboTuning::default());
        let mut bus = EventBus::new();
        for _ in 0..4 {
            combo.increment(&mut bus);
        }
        assert_eq!(combo.count(), 4);
        assert!((combo.multiplier() - 1.4).abs() < 1e-6);
    }

    #[test]
    fn test_decays_exactly_once() {
        let mut combo = ComboTracker::new(&ComboTuning::default());
        let mut bus = EventBus::new();
        let log = bus.record();

        combo.increment(&mut bus);
        combo.increment(&mut bus);
        // Well past the timeout, one tick at a time
        for _ in 0..500 {
            combo.update(0.01, &mut bus);
        }
        assert_eq!(combo.count(), 0);
        assert_eq!(combo.multiplier(), 1.0);
        assert_eq!(combo.max_combo(), 2);

        let (_, _, resets) = combo_events(&log.borrow());
        assert_eq!(resets, 1);
        assert_eq!(
            log.borrow().last(),
            Some(&GameEvent::ComboReset { previous: 2 })
        );
    }

    #[test]
    fn test_drops_on_the_tick_the_window_closes() {
        let tuning = ComboTuning::default();
        let mut combo = ComboTracker::new(&tuning);
        let mut bus = EventBus::new();
        let log = bus.record();

        combo.increment(&mut bus);
        let ticks = (tuning.timeout / SIM_DT).round() as usize;
        for _ in 0..ticks - 1 {
            combo.update(SIM_DT, &mut bus);
        }
        assert_eq!(combo.count(), 1);
        assert!(combo.time_left() > 0.0);

        combo.update(SIM_DT, &mut bus);
        assert_eq!(combo.count(), 0);
        assert_eq!(combo.time_left(), 0.0);
        let (_, _, resets) = combo_events(&log.borrow());
        assert_eq!(resets, 1);
    }

    #[test]
    fn test_hundredth_steps_close_the_window() {
        let mut combo = ComboTracker::new(&ComboTuning::default());
        let mut bus = EventBus::new();
        combo.increment(&mut bus);
        // 200 x 0.01 sums to slightly more than 2.0 in f32
        for _ in 0..199 {
            combo.update(0.01, &mut bus);
        }
        assert_eq!(combo.count(), 1);
        combo.update(0.01, &mut bus);
        assert_eq!(combo.count(), 0);
    }

    #[test]
    fn test_kill_refreshes_window() {
        let mut combo = ComboTracker::new(&ComboTuning::default());
        let mut bus = EventBus::new();
        combo.increment(&mut bus);
        combo.update(1.5, &mut bus);
        combo.increment(&mut bus);
        assert!((combo.time_left() - 2.0).abs() < 1e-6);
        combo.update(1.5, &mut bus);
        assert_eq!(combo.count(), 2);
        combo.update(0.6, &mut bus);
        assert_eq!(combo.count(), 0);
    }

    #[test]
    fn test_paused_does_not_decay() {
        let mut combo = ComboTracker::new(&ComboTuning::default());
        let mut bus = EventBus::new();
        combo.increment(&mut bus);
        combo.set_paused(true);
        combo.update(100.0, &mut bus);
        assert_eq!(combo.count(), 1);
        combo.set_paused(false);
        combo.update(100.0, &mut bus);
        assert_eq!(combo.count(), 0);
    }

    #[test]
    fn test_milestones_fire_once() {
        let mut combo = ComboTracker::new(&ComboTuning::default());
        let mut bus = EventBus::new();
        let log = bus.record();

        for _ in 0..10 {
            combo.increment(&mut bus);
        }
        combo.reset(&mut bus);
        for _ in 0..10 {
            combo.increment(&mut bus);
        }
        // 5 and 10, each announced only the first time
        let (updated, milestones, resets) = combo_events(&log.borrow());
        assert_eq!(updated, 20);
        assert_eq!(milestones, 2);
        assert_eq!(resets, 1);
    }

    #[test]
    fn test_reset_when_empty_is_silent() {
        let mut combo = ComboTracker::new(&ComboTuning::default());
        let mut bus = EventBus::new();
        combo.reset(&mut bus);
        assert_eq!(bus.published(), 0);
    }

    proptest! {
        #[test]
        fn prop_multiplier_monotonic_in_count(kills in 1usize..200, rate in 0.0f32..1.0) {
            let tuning = ComboTuning { rate, ..ComboTuning::default() };
            let mut combo = ComboTracker::new(&tuning);
            let mut bus = EventBus::new();
            let mut last = combo.multiplier();
            for _ in 0..kills {
                combo.increment(&mut bus);
                prop_assert!(combo.multiplier() >= last);
                prop_assert!(combo.multiplier() >= 1.0);
                last = combo.multiplier();
            }
            prop_assert_eq!(combo.max_combo() as usize, kills);
        }
    }
}
