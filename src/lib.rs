//! Soul Slash - gameplay core of an arcade monster-slicing game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (targets, spawning, slash gesture, scoring)
//! - `tuning`: Data-driven game balance and level configuration
//! - `error`: Configuration loading errors

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::ConfigError;
pub use tuning::{LevelConfig, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Countdowns this close to zero have run out. Absorbs the rounding
    /// left over from summing many `SIM_DT` steps.
    pub const TIMER_EPSILON: f32 = 1e-3;

    /// Playfield dimensions (screen space, y grows downward)
    pub const GAME_WIDTH: f32 = 1280.0;
    pub const GAME_HEIGHT: f32 = 720.0;

    /// Targets launch from just below the visible area
    pub const SPAWN_Y: f32 = GAME_HEIGHT + 30.0;
    /// Falling targets past this line are gone for good
    pub const SCREEN_BOTTOM_Y: f32 = GAME_HEIGHT + 100.0;

    /// Downward acceleration applied to every target (pixels/s²)
    pub const GRAVITY: f32 = 300.0;

    /// Hitbox radius for villagers (also the default hostile hitbox)
    pub const VILLAGER_HITBOX_RADIUS: f32 = 40.0;
    /// Hitbox radius for power-up pickups
    pub const POWERUP_HITBOX_RADIUS: f32 = 30.0;
}

/// Distance from point `p` to the segment `a`-`b`.
///
/// A zero-length segment degrades to point distance.
#[inline]
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Whether `p` lies inside the playfield grown by `margin` on every side
#[inline]
pub fn on_screen(p: Vec2, margin: f32) -> bool {
    use consts::{GAME_HEIGHT, GAME_WIDTH};
    p.x >= -margin && p.x <= GAME_WIDTH + margin && p.y >= -margin && p.y <= GAME_HEIGHT + margin
}
