//! Rolling Chain headless driver
//!
//! Loads a level, then plays it with a simple aim-at-matching-color autopilot
//! through the same fixed-step accumulator a windowed front end would use.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;
    use glam::Vec2;

    use rolling_chain::consts::*;
    use rolling_chain::persistence::{FileStore, MemoryStore, ScoreStore};
    use rolling_chain::sim::{GameEvent, GameState, TickInput, tick};
    use rolling_chain::{HighScore, LevelConfig, Tuning};

    #[derive(Parser, Debug)]
    #[command(name = "rolling-chain")]
    #[command(about = "Headless match-3 chain shooter simulation")]
    struct Cli {
        /// Level JSON file (built-in demo level when omitted)
        #[arg(long)]
        level: Option<PathBuf>,
        /// Tuning JSON file (defaults when omitted)
        #[arg(long)]
        tuning: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Simulated seconds to play
        #[arg(long, default_value_t = 120.0)]
        seconds: f32,
        /// Frame rate of the simulated display
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
        /// Where the best score is kept (memory only when omitted)
        #[arg(long)]
        store: Option<PathBuf>,
    }

    /// Fixed-step driver state
    struct Game {
        state: GameState,
        accumulator: f32,
        high: HighScore,
        played: u32,
    }

    impl Game {
        fn new(state: GameState, high: HighScore) -> Self {
            Self {
                state,
                accumulator: 0.0,
                high,
                played: 0,
            }
        }

        /// Run simulation ticks for one display frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(MAX_FRAME_DT);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = autopilot(&self.state);
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
                self.handle_events();

                if self.state.is_over() {
                    self.accumulator = 0.0;
                    self.played += 1;
                    self.state.restart();
                    break;
                }
            }
        }

        fn handle_events(&mut self) {
            for event in &self.state.events {
                match event {
                    GameEvent::RunCleared {
                        size,
                        points,
                        multiplier,
                    } => log::info!("Cleared {size} for {points} (x{multiplier})"),
                    GameEvent::Cascade { multiplier } => log::info!("Cascade! x{multiplier}"),
                    GameEvent::LevelWon { score, new_best } => {
                        log::info!("Won with {score}");
                        if let Some(best) = new_best {
                            self.high.submit(*best);
                        }
                    }
                    GameEvent::LevelLost { score } => log::info!("Lost with {score}"),
                    other => log::trace!("{other:?}"),
                }
            }
        }
    }

    /// Aim at the matching marker nearest the sink; swap when only the reserve matches
    fn autopilot(state: &GameState) -> TickInput {
        let shooter = &state.shooter;
        let target_of = |color| {
            state
                .chain_view()
                .into_iter()
                .find(|m| m.color == color)
                .map(|m| m.pos)
        };

        if let Some(pos) = target_of(shooter.current) {
            return TickInput {
                aim: Some(pos - shooter.pos),
                fire: shooter.ready() && state.projectiles.is_empty(),
                swap: false,
            };
        }
        let swap = target_of(shooter.reserve).is_some();
        TickInput {
            aim: Some(Vec2::NEG_Y),
            fire: false,
            swap,
        }
    }

    fn load_level(cli: &Cli) -> Result<LevelConfig> {
        match &cli.level {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading level {}", path.display()))?;
                Ok(LevelConfig::from_json(&json)?)
            }
            None => Ok(LevelConfig::demo()),
        }
    }

    fn load_tuning(cli: &Cli) -> Result<Tuning> {
        match &cli.tuning {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading tuning {}", path.display()))?;
                Ok(serde_json::from_str(&json)?)
            }
            None => Ok(Tuning::default()),
        }
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        let level = load_level(&cli)?;
        let tuning = load_tuning(&cli)?;

        let store: Box<dyn ScoreStore> = match &cli.store {
            Some(path) => Box::new(FileStore::new(path)),
            None => Box::new(MemoryStore::new()),
        };
        let high = HighScore::load(store);
        let state = GameState::new(level, tuning, cli.seed)
            .context("building level")?
            .with_best(high.best());

        let mut game = Game::new(state, high);

        let frame = 1.0 / cli.fps.max(1.0);
        let frames = (cli.seconds / frame).ceil() as u64;
        for _ in 0..frames {
            game.update(frame);
        }

        let hud = game.state.hud();
        println!(
            "{} rounds finished; current round score {}, total {}, best {}",
            game.played,
            hud.score,
            hud.total,
            game.high.best().max(hud.best)
        );
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Rolling Chain (native) starting...");
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web front end drives `rolling_chain::sim::tick` directly
}
