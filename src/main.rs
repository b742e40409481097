//! Soul Slash headless runner
//!
//! Plays a seeded run with a scripted pointer and prints the run result as
//! JSON. Useful for balance checks and for reproducing a run from its seed.
//!
//! Usage: `soul-slash [--seed N] [--secs N] [--endless] [--tuning FILE] [--level FILE]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::cell::Cell;
    use std::error::Error;
    use std::rc::Rc;

    use glam::Vec2;

    use soul_slash::on_screen;
    use soul_slash::sim::{
        FrameClock, GameEvent, GameState, Loadout, TickInput, UpgradeLevels, WeaponProfile,
    };
    #[cfg(test)]
    use soul_slash::sim::{HostileKind, TargetKind};
    use soul_slash::{LevelConfig, Tuning};

    /// Run options from the command line
    pub struct Options {
        pub seed: u64,
        pub max_secs: f32,
        pub endless: bool,
        pub tuning: Option<String>,
        pub level: Option<String>,
    }

    impl Default for Options {
        fn default() -> Self {
            Self {
                seed: 0x5EED,
                max_secs: 180.0,
                endless: false,
                tuning: None,
                level: None,
            }
        }
    }

    impl Options {
        pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self, Box<dyn Error>> {
            let mut options = Options::default();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--seed" => options.seed = next_value(&mut args, "--seed")?.parse()?,
                    "--secs" => options.max_secs = next_value(&mut args, "--secs")?.parse()?,
                    "--endless" => options.endless = true,
                    "--tuning" => options.tuning = Some(next_value(&mut args, "--tuning")?),
                    "--level" => options.level = Some(next_value(&mut args, "--level")?),
                    other => log::warn!("Ignoring unknown argument '{}'", other),
                }
            }
            Ok(options)
        }
    }

    fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
        args.next().ok_or_else(|| format!("{flag} needs a value"))
    }

    /// Scripted player: saws back and forth across the lowest target on
    /// screen, lets go when there is nothing to cut
    struct Autopilot {
        side: f32,
    }

    impl Autopilot {
        const REACH: f32 = 90.0;

        fn pointer(&mut self, state: &GameState) -> Option<Vec2> {
            let target = state
                .spawner
                .hostiles
                .iter()
                .chain(&state.spawner.pickups)
                .filter(|t| t.is_sliceable() && on_screen(t.pos, 0.0))
                .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))?;
            self.side = -self.side;
            Some(target.pos + Vec2::new(self.side * Self::REACH, 0.0))
        }
    }

    pub fn run(options: Options) -> Result<(), Box<dyn Error>> {
        let tuning = match &options.tuning {
            Some(path) => Tuning::from_path(path)?,
            None => Tuning::default(),
        };

        let loadout = Loadout::new()
            .with_weapon(WeaponProfile::default())
            .with_upgrades(UpgradeLevels {
                hitbox: 1,
                crit: 2,
                ..UpgradeLevels::default()
            });

        let mut state = GameState::with_tuning(options.seed, tuning)?;
        if let Some(path) = &options.level {
            state = state.with_level(LevelConfig::from_path(path)?)?;
        }
        let mut state = state.with_loadout(loadout);
        state.set_endless(options.endless);

        let milestones = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&milestones);
        state.bus.subscribe(move |event| match event {
            GameEvent::ComboMilestone { count } => {
                counter.set(counter.get() + 1);
                log::info!("Combo x{}!", count);
            }
            GameEvent::MultiKill { label, bonus, .. } => log::info!("{} +{}", label, bonus),
            GameEvent::LivesChanged { lives } => log::info!("Lives left: {}", lives),
            _ => {}
        });

        // Render-rate frames drive the fixed-step clock, as a real host would
        let frame_dt = 1.0 / 60.0;
        let mut clock = FrameClock::new();
        let mut pilot = Autopilot { side: 1.0 };
        while !state.is_over() && state.elapsed < options.max_secs {
            let input = TickInput {
                pointer: pilot.pointer(&state),
                pause: false,
            };
            clock.advance(&mut state, &input, frame_dt);
        }

        let result = state.finish();
        log::info!("{} combo milestones reached", milestones.get());
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_args() {
            let args = ["--seed", "42", "--endless", "--secs", "30"].map(String::from);
            let options = Options::from_args(args.into_iter()).unwrap();
            assert_eq!(options.seed, 42);
            assert!(options.endless);
            assert_eq!(options.max_secs, 30.0);
            assert!(options.level.is_none());

            let missing = ["--seed"].map(String::from);
            assert!(Options::from_args(missing.into_iter()).is_err());
        }

        #[test]
        fn test_autopilot_tracks_lowest_target() {
            let mut state = GameState::new(1);
            let mut pilot = Autopilot { side: 1.0 };
            assert_eq!(pilot.pointer(&state), None);

            for (x, y) in [(300.0, 200.0), (900.0, 500.0)] {
                state.spawner.spawn_at(
                    TargetKind::Hostile(HostileKind::Zombie),
                    Vec2::new(x, y),
                    Vec2::ZERO,
                    &mut state.bus,
                );
            }
            let a = pilot.pointer(&state);
            let b = pilot.pointer(&state);
            assert_eq!(a, Some(Vec2::new(900.0 - Autopilot::REACH, 500.0)));
            assert_eq!(b, Some(Vec2::new(900.0 + Autopilot::REACH, 500.0)));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Soul Slash (headless) starting...");

    let result = native::Options::from_args(std::env::args().skip(1)).and_then(native::run);
    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on the web
}
