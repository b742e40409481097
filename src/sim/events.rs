//! Typed gameplay events and the synchronous bus that carries them.
//!
//! The core never draws or plays sounds; it publishes these events and the
//! host's presentation layer reacts. Delivery happens inside `publish`, in
//! subscription order, within the same tick.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::buffs::BuffKind;
use super::spawn::DifficultyModifiers;
use super::state::RunResult;
use super::target::{DeathHook, TargetKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    TargetSpawned {
        id: u32,
        kind: TargetKind,
        pos: Vec2,
    },
    /// Non-lethal hit
    TargetHit {
        id: u32,
        kind: TargetKind,
        health_left: u32,
    },
    TargetSliced {
        id: u32,
        kind: TargetKind,
        pos: Vec2,
        score: u64,
        souls: f32,
        critical: bool,
    },
    /// A kind-specific death effect fired (cosmetic)
    TargetDied {
        id: u32,
        kind: TargetKind,
        pos: Vec2,
        hook: DeathHook,
    },
    ScoreUpdated {
        score: u64,
        delta: i64,
    },
    SoulsUpdated {
        souls: f32,
        delta: f32,
    },
    ComboUpdated {
        count: u32,
        multiplier: f32,
    },
    ComboMilestone {
        count: u32,
    },
    ComboReset {
        previous: u32,
    },
    MultiKill {
        count: u32,
        bonus: u64,
        label: String,
    },
    PowerUpCollected {
        id: u32,
        kind: BuffKind,
    },
    PowerUpActivated {
        kind: BuffKind,
        duration: f32,
    },
    PowerUpEnded {
        kind: BuffKind,
    },
    ShieldConsumed,
    VillagerSliced {
        id: u32,
        pos: Vec2,
        penalty: u64,
        shielded: bool,
    },
    TargetMissed {
        id: u32,
        kind: TargetKind,
    },
    LivesChanged {
        lives: u32,
    },
    ChargeLevelChanged {
        level: u32,
        width_multiplier: f32,
        color: u32,
    },
    DifficultyChanged {
        step: u32,
        modifiers: DifficultyModifiers,
    },
    RunEnded {
        result: RunResult,
    },
}

pub type SubscriptionId = u32;

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Fire-and-forget publish/subscribe bus.
///
/// Listeners only see `&GameEvent` and cannot publish back into the bus,
/// so no listener can defer work into a later tick through it.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: SubscriptionId,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn publish(&mut self, event: GameEvent) {
        self.published += 1;
        log::trace!("event: {:?}", event);
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    /// Subscribe a listener that appends every event to a shared log
    pub fn record(&mut self) -> Rc<RefCell<Vec<GameEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        self.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        log
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Total events published since creation
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("published", &self.published)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_is_synchronous_and_ordered() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&order);
        bus.subscribe(move |_| first.borrow_mut().push("first"));
        let second = Rc::clone(&order);
        bus.subscribe(move |_| second.borrow_mut().push("second"));

        bus.publish(GameEvent::ShieldConsumed);
        // Delivered before publish returns
        assert_eq!(*order.borrow(), vec!["first", "second"]);
        assert_eq!(bus.published(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let log = bus.record();
        let counter = Rc::new(RefCell::new(0));
        let c = Rc::clone(&counter);
        let id = bus.subscribe(move |_| *c.borrow_mut() += 1);

        bus.publish(GameEvent::LivesChanged { lives: 2 });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(GameEvent::LivesChanged { lives: 1 });

        assert_eq!(*counter.borrow(), 1);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_events_serialize() {
        let event = GameEvent::MultiKill {
            count: 3,
            bonus: 60,
            label: "TRIPLE".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("MultiKill"));
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
