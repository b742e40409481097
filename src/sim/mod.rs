//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod buffs;
pub mod collision;
pub mod combo;
pub mod events;
pub mod gesture;
pub mod spawn;
pub mod state;
pub mod target;
pub mod tick;
pub mod trajectory;
pub mod upgrades;

pub use buffs::{BuffKind, BuffManager};
pub use collision::{ResolveContext, SlashOutcome, first_hit_segment, resolve_slash, segment_hits_circle};
pub use combo::ComboTracker;
pub use events::{EventBus, GameEvent, SubscriptionId};
pub use gesture::{GestureState, GestureTracker, SlashTrail};
pub use spawn::{DifficultyModifiers, SpawnSystem};
pub use state::{GamePhase, GameState, RunResult};
pub use target::{DeathHook, HitResult, HostileKind, Target, TargetKind};
pub use tick::{FrameClock, TickInput, tick};
pub use trajectory::{Launch, solve_launch};
pub use upgrades::{Loadout, UpgradeLevels, UpgradeProvider, WeaponEffects, WeaponProfile};
