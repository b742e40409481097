//! Timed global power-up effects
//!
//! Each buff kind maps to a countdown of seconds left. A kind is active iff
//! its countdown has not run out yet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::events::{EventBus, GameEvent};
use crate::consts::TIMER_EPSILON;

/// Power-up effects a pickup can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuffKind {
    /// Score multiplier
    Frenzy,
    /// Absorbs one villager hit
    Shield,
    /// Extra souls per kill
    SoulMagnet,
    /// Targets move at reduced time scale
    SlowTime,
}

impl BuffKind {
    pub const ALL: [BuffKind; 4] = [
        BuffKind::Frenzy,
        BuffKind::Shield,
        BuffKind::SoulMagnet,
        BuffKind::SlowTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuffKind::Frenzy => "frenzy",
            BuffKind::Shield => "shield",
            BuffKind::SoulMagnet => "soul_magnet",
            BuffKind::SlowTime => "slow_time",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuffManager {
    /// Seconds left per running buff
    timers: BTreeMap<BuffKind, f32>,
    paused: bool,
}

impl BuffManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or refresh a buff. A refresh overwrites the old timer.
    pub fn activate(&mut self, kind: BuffKind, duration: f32, bus: &mut EventBus) {
        let duration = duration.max(0.0);
        self.timers.insert(kind, duration);
        log::debug!("Buff {} active for {:.1}s", kind.as_str(), duration);
        bus.publish(GameEvent::PowerUpActivated { kind, duration });
    }

    pub fn is_active(&self, kind: BuffKind) -> bool {
        self.timers.get(&kind).is_some_and(|left| running(*left))
    }

    /// Seconds left on a buff (0 when inactive)
    pub fn remaining(&self, kind: BuffKind) -> f32 {
        self.timers
            .get(&kind)
            .filter(|left| running(**left))
            .copied()
            .unwrap_or(0.0)
    }

    /// Remove a buff before it expires. Returns whether it was active.
    pub fn consume(&mut self, kind: BuffKind, bus: &mut EventBus) -> bool {
        let was_active = self.is_active(kind);
        if self.timers.remove(&kind).is_some() && was_active {
            bus.publish(GameEvent::PowerUpEnded { kind });
        }
        was_active
    }

    /// Count every timer down and drop the ones that ran out
    pub fn update(&mut self, dt: f32, bus: &mut EventBus) {
        if self.paused || dt <= 0.0 {
            return;
        }
        for left in self.timers.values_mut() {
            *left -= dt;
        }

        let expired: Vec<BuffKind> = self
            .timers
            .iter()
            .filter(|(_, left)| !running(**left))
            .map(|(kind, _)| *kind)
            .collect();
        for kind in expired {
            self.timers.remove(&kind);
            log::debug!("Buff {} expired", kind.as_str());
            bus.publish(GameEvent::PowerUpEnded { kind });
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Active kinds in stable order
    pub fn active(&self) -> impl Iterator<Item = BuffKind> + '_ {
        self.timers
            .iter()
            .filter(|(_, left)| running(**left))
            .map(|(kind, _)| *kind)
    }
}

fn running(left: f32) -> bool {
    left > TIMER_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    #[test]
    fn test_buff_expires_after_duration() {
        let mut bus = EventBus::new();
        let log = bus.record();
        let mut buffs = BuffManager::new();

        buffs.activate(BuffKind::Frenzy, 1.0, &mut bus);
        assert!(buffs.is_active(BuffKind::Frenzy));

        buffs.update(0.6, &mut bus);
        assert!(buffs.is_active(BuffKind::Frenzy));
        assert!((buffs.remaining(BuffKind::Frenzy) - 0.4).abs() < 1e-5);

        buffs.update(0.6, &mut bus);
        assert!(!buffs.is_active(BuffKind::Frenzy));
        assert_eq!(buffs.remaining(BuffKind::Frenzy), 0.0);

        let ended = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, GameEvent::PowerUpEnded { kind: BuffKind::Frenzy }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_expires_on_the_last_fixed_step() {
        let mut bus = EventBus::new();
        let log = bus.record();
        let mut buffs = BuffManager::new();

        buffs.activate(BuffKind::Frenzy, 2.0, &mut bus);
        let ticks = (2.0 / SIM_DT).round() as usize;
        for _ in 0..ticks - 1 {
            buffs.update(SIM_DT, &mut bus);
        }
        assert!(buffs.is_active(BuffKind::Frenzy));

        buffs.update(SIM_DT, &mut bus);
        assert!(!buffs.is_active(BuffKind::Frenzy));
        assert_eq!(buffs.active().count(), 0);
        assert_eq!(
            log.borrow().last(),
            Some(&GameEvent::PowerUpEnded {
                kind: BuffKind::Frenzy
            })
        );
    }

    #[test]
    fn test_refresh_overwrites_timer() {
        let mut bus = EventBus::new();
        let mut buffs = BuffManager::new();

        buffs.activate(BuffKind::Shield, 5.0, &mut bus);
        buffs.update(4.0, &mut bus);
        buffs.activate(BuffKind::Shield, 2.0, &mut bus);
        // Refresh replaces, it does not add
        assert!((buffs.remaining(BuffKind::Shield) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_consume_removes_early() {
        let mut bus = EventBus::new();
        let mut buffs = BuffManager::new();

        assert!(!buffs.consume(BuffKind::Shield, &mut bus));
        buffs.activate(BuffKind::Shield, 10.0, &mut bus);
        assert!(buffs.consume(BuffKind::Shield, &mut bus));
        assert!(!buffs.is_active(BuffKind::Shield));
        assert!(!buffs.consume(BuffKind::Shield, &mut bus));
    }

    #[test]
    fn test_paused_timers_stand_still() {
        let mut bus = EventBus::new();
        let mut buffs = BuffManager::new();

        buffs.activate(BuffKind::SlowTime, 1.0, &mut bus);
        buffs.set_paused(true);
        buffs.update(5.0, &mut bus);
        assert!(buffs.is_active(BuffKind::SlowTime));

        buffs.set_paused(false);
        buffs.update(1.0, &mut bus);
        assert!(!buffs.is_active(BuffKind::SlowTime));
    }

    #[test]
    fn test_active_iterates_in_order() {
        let mut bus = EventBus::new();
        let mut buffs = BuffManager::new();
        buffs.activate(BuffKind::SlowTime, 1.0, &mut bus);
        buffs.activate(BuffKind::Frenzy, 1.0, &mut bus);
        let active: Vec<_> = buffs.active().collect();
        assert_eq!(active, vec![BuffKind::Frenzy, BuffKind::SlowTime]);
    }
}
