//! Launch trajectory math
//!
//! Targets fly on plain parabolas: constant downward gravity, no drag.
//! Screen space, so "up" is negative y.

use glam::Vec2;

/// Smallest rise we solve for; flatter requests are lifted to this
pub const MIN_RISE: f32 = 1.0;

/// Solved launch for one target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub velocity: Vec2,
    /// Time from launch to the apex
    pub flight_time: f32,
}

impl Launch {
    /// Same flight path shape with every velocity component scaled.
    ///
    /// The apex moves (height scales with `factor²`), which is what the
    /// spawn system wants for speed variety.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            velocity: self.velocity * factor,
            flight_time: self.flight_time * factor,
        }
    }
}

/// Solve the launch velocity that puts the apex of the arc at `apex`.
///
/// At the apex vertical speed is zero, so `vy = -sqrt(2·g·rise)` and the
/// time to get there is `sqrt(2·rise/g)`; `vx` covers the horizontal gap in
/// that time. An apex at or below the start is lifted to `MIN_RISE`.
/// Non-positive gravity falls back to a straight one-second flight.
pub fn solve_launch(from: Vec2, apex: Vec2, gravity: f32) -> Launch {
    if gravity <= 0.0 {
        return Launch {
            velocity: apex - from,
            flight_time: 1.0,
        };
    }
    let rise = (from.y - apex.y).max(MIN_RISE);
    let flight_time = (2.0 * rise / gravity).sqrt();
    let vy = -(2.0 * gravity * rise).sqrt();
    let vx = (apex.x - from.x) / flight_time;
    Launch {
        velocity: Vec2::new(vx, vy),
        flight_time,
    }
}

/// Analytic position after `t` seconds
#[inline]
pub fn position_at(from: Vec2, velocity: Vec2, gravity: f32, t: f32) -> Vec2 {
    Vec2::new(
        from.x + velocity.x * t,
        from.y + velocity.y * t + 0.5 * gravity * t * t,
    )
}

/// Highest point (smallest y) reached by a launch
pub fn apex_of(from: Vec2, velocity: Vec2, gravity: f32) -> Vec2 {
    if gravity <= 0.0 || velocity.y >= 0.0 {
        return from;
    }
    let t = -velocity.y / gravity;
    position_at(from, velocity, gravity, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GRAVITY, SIM_DT};
    use crate::sim::target::{HostileKind, Target, TargetKind};
    use crate::tuning::TargetTuning;

    #[test]
    fn test_solved_launch_reaches_apex_analytically() {
        let from = Vec2::new(100.0, 750.0);
        let apex = Vec2::new(500.0, 200.0);
        let launch = solve_launch(from, apex, GRAVITY);

        let landed = position_at(from, launch.velocity, GRAVITY, launch.flight_time);
        assert!((landed - apex).length() < 1e-2, "landed at {landed:?}");
        assert!((apex_of(from, launch.velocity, GRAVITY) - apex).length() < 1e-2);
    }

    #[test]
    fn test_target_integration_hits_apex() {
        let from = Vec2::new(100.0, 750.0);
        let apex = Vec2::new(500.0, 200.0);
        let launch = solve_launch(from, apex, GRAVITY);

        let mut target = Target::new(
            1,
            TargetKind::Hostile(HostileKind::Zombie),
            &TargetTuning::default(),
        );
        target.spawn(from, launch.velocity);

        // Whole fixed steps, then the fractional remainder
        let mut remaining = launch.flight_time;
        while remaining >= SIM_DT {
            target.update(SIM_DT);
            remaining -= SIM_DT;
        }
        target.update(remaining);

        assert!(
            (target.pos - apex).length() < 0.5,
            "expected {apex:?}, got {:?}",
            target.pos
        );
        assert!(target.vel.y.abs() < 0.5);
    }

    #[test]
    fn test_apex_below_start_is_lifted() {
        let from = Vec2::new(0.0, 100.0);
        let launch = solve_launch(from, Vec2::new(50.0, 300.0), GRAVITY);
        assert!(launch.velocity.y < 0.0);
        let apex = apex_of(from, launch.velocity, GRAVITY);
        assert!((from.y - apex.y - MIN_RISE).abs() < 1e-3);
        assert!(launch.velocity.is_finite());
    }

    #[test]
    fn test_zero_gravity_guard() {
        let launch = solve_launch(Vec2::ZERO, Vec2::new(10.0, -10.0), 0.0);
        assert!(launch.velocity.is_finite());
        assert_eq!(launch.flight_time, 1.0);
    }

    #[test]
    fn test_scaled_launch() {
        let launch = solve_launch(Vec2::new(0.0, 700.0), Vec2::new(300.0, 300.0), GRAVITY);
        let faster = launch.scaled(1.1);
        assert!((faster.velocity - launch.velocity * 1.1).length() < 1e-4);
        let apex = apex_of(Vec2::new(0.0, 700.0), faster.velocity, GRAVITY);
        // Rise grows with the square of the factor
        assert!((700.0 - apex.y - 400.0 * 1.21).abs() < 0.1);
    }
}
