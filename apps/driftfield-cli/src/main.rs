use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use driftfield_assets::{AssetStore, ModelTemplate};
use driftfield_common::RandomSource;
use driftfield_input::{ControlState, KeyBindings};
use driftfield_kernel::{GameConfig, Session, SessionEvent, SessionPhase};
use driftfield_persist::SessionStore;
use driftfield_render::{DebugTextScene, HandleTable};
use driftfield_tools::{FrameTimer, SessionInspector};

#[derive(Parser)]
#[command(name = "driftfield-cli", about = "Headless driftfield runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Print the default game config as YAML
    Config,
    /// Run a seeded headless session with scripted input
    Simulate {
        /// Maximum ticks to run; stops early when time runs out
        #[arg(short, long, default_value = "4000")]
        ticks: u64,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// YAML config overriding the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Where the session store lives
        #[arg(long, default_value = ".driftfield")]
        data_dir: PathBuf,
        /// glTF model for rescue targets; a placeholder is used otherwise
        #[arg(long)]
        template: Option<PathBuf>,
        /// Hold boost for two seconds every N ticks (0 disables)
        #[arg(long, default_value = "600")]
        boost_every: u64,
        /// Press shockwave every N ticks (0 disables)
        #[arg(long, default_value = "240")]
        shockwave_every: u64,
        /// Print an inspector summary every N ticks (0 disables)
        #[arg(long, default_value = "600")]
        report_every: u64,
        /// Print the final scene listing
        #[arg(long)]
        scene: bool,
        /// Ticks spent on the start screen before the scripted pilot presses
        /// start; skipped when a restart was requested
        #[arg(long, default_value = "60")]
        menu_ticks: u64,
    },
    /// Ask the next run to skip the start screen
    Restart {
        #[arg(long, default_value = ".driftfield")]
        data_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("driftfield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", driftfield_common::crate_info());
            println!("assets: {}", driftfield_assets::crate_info());
            println!("stream: {}", driftfield_stream::crate_info());
            println!("collision: {}", driftfield_collision::crate_info());
            println!("abilities: {}", driftfield_abilities::crate_info());
            println!("input: {}", driftfield_input::crate_info());
            println!("kernel: {}", driftfield_kernel::crate_info());
            println!("render: {}", driftfield_render::crate_info());
            println!("persist: {}", driftfield_persist::crate_info());
            println!("tools: {}", driftfield_tools::crate_info());
        }
        Commands::Config => {
            print!("{}", GameConfig::default().to_yaml_string()?);
        }
        Commands::Simulate {
            ticks,
            seed,
            dt,
            config,
            data_dir,
            template,
            boost_every,
            shockwave_every,
            report_every,
            scene,
            menu_ticks,
        } => {
            let script = Script {
                boost_every,
                shockwave_every,
            };
            simulate(SimulateArgs {
                ticks,
                seed,
                dt,
                config,
                data_dir,
                template,
                script,
                report_every,
                show_scene: scene,
                menu_ticks,
            })?;
        }
        Commands::Restart { data_dir } => {
            let mut store = SessionStore::open(&data_dir)
                .with_context(|| format!("opening store in {}", data_dir.display()))?;
            store.request_restart()?;
            println!("Restart requested; the next run skips the start screen.");
        }
    }

    Ok(())
}

struct SimulateArgs {
    ticks: u64,
    seed: u64,
    dt: f32,
    config: Option<PathBuf>,
    data_dir: PathBuf,
    template: Option<PathBuf>,
    script: Script,
    report_every: u64,
    show_scene: bool,
    menu_ticks: u64,
}

/// Start screen. A pending restart goes straight into the run; otherwise the
/// session idles in the menu until the pilot presses start.
struct StartGate {
    wait: u64,
}

impl StartGate {
    fn new(restart_requested: bool, menu_ticks: u64) -> Self {
        Self {
            wait: if restart_requested { 0 } else { menu_ticks },
        }
    }

    /// Called once per tick before the session steps.
    fn poll<R: RandomSource>(&mut self, session: &mut Session<R>) {
        if session.phase() != SessionPhase::Menu {
            return;
        }
        if self.wait == 0 {
            session.start();
        } else {
            self.wait -= 1;
        }
    }
}

/// Scripted pilot: weaves left and right, boosts and fires periodically.
struct Script {
    boost_every: u64,
    shockwave_every: u64,
}

impl Script {
    const BOOST_HOLD: u64 = 120;
    const WEAVE_PERIOD: u64 = 180;

    fn held_keys(&self, tick: u64) -> Vec<&'static str> {
        let mut keys = Vec::new();
        match (tick / Self::WEAVE_PERIOD) % 4 {
            1 => keys.push("a"),
            3 => keys.push("arrowright"),
            _ => {}
        }
        if tick % 97 < 10 {
            keys.push("w");
        }
        if self.boost_every > 0 && tick % self.boost_every < Self::BOOST_HOLD {
            keys.push("shift");
        }
        if self.shockwave_every > 0 && tick % self.shockwave_every == 0 {
            keys.push("e");
        }
        keys
    }
}

fn simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };

    let mut store = SessionStore::open(&args.data_dir)
        .with_context(|| format!("opening store in {}", args.data_dir.display()))?;
    let restart = store.take_restart()?;
    if restart {
        tracing::info!("restart requested, skipping start screen");
    } else {
        tracing::info!(menu_ticks = args.menu_ticks, "waiting on the start screen");
    }
    let mut gate = StartGate::new(restart, args.menu_ticks);

    let mut session = Session::with_seed(config, args.seed);
    match &args.template {
        Some(path) => {
            let mut assets = AssetStore::new();
            session
                .load_rescue_template(&mut assets, path)
                .with_context(|| format!("loading rescue model {}", path.display()))?;
        }
        None => session.set_rescue_template(ModelTemplate::placeholder("astronaut", None)),
    }

    println!(
        "Simulating: seed={}, dt={:.4}, up to {} ticks",
        args.seed, args.dt, args.ticks
    );

    let bindings = KeyBindings::default();
    let mut scene = DebugTextScene::new();
    let mut handles = HandleTable::new();
    let mut timer = FrameTimer::new(600);

    for tick in 0..args.ticks {
        gate.poll(&mut session);
        let controls = ControlState::from_keys(&bindings, args.script.held_keys(tick));

        let started = Instant::now();
        session.tick(&controls, args.dt);
        timer.record(started.elapsed());

        handles.apply(&mut scene, &session.drain_scene_events());
        handles.place_all(
            &mut scene,
            session
                .asteroids()
                .asteroids()
                .iter()
                .map(|a| (a.id, a.transform()))
                .chain(session.rescues().targets().iter().map(|t| (t.id, t.transform()))),
        );

        for event in session.drain_events() {
            match event {
                SessionEvent::Rescued { total, .. } => {
                    tracing::info!(total, remaining = session.clock().remaining(), "rescued")
                }
                SessionEvent::AsteroidHit { total, .. } => tracing::info!(total, "asteroid hit"),
                SessionEvent::TimeUp { .. } => {}
                other => tracing::debug!(event = ?other, "session event"),
            }
        }

        if args.report_every > 0 && (tick + 1) % args.report_every == 0 {
            println!("{}", SessionInspector::summary(&session));
        }
        if session.phase() == SessionPhase::TimeUp {
            break;
        }
    }

    println!("{}", SessionInspector::summary(&session));
    println!("Timing: {}", timer.summary());
    if let Some(nearest) = SessionInspector::nearest_rescue(&session) {
        println!("Nearest rescue: {nearest}");
    }
    if args.show_scene {
        print!("{}", scene.render(10));
    }

    let score = session.score();
    let new_best = store.record_run(score, session.rescued())?;
    println!(
        "Final score: {} ({} rescued, {} asteroid hits){}",
        score,
        session.rescued(),
        session.asteroid_hits(),
        if new_best { " - new best!" } else { "" }
    );
    println!("Best score: {}", store.best_score());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_session() -> Session {
        Session::with_seed(GameConfig::default(), 1)
    }

    #[test]
    fn restart_request_skips_the_start_screen() {
        let dir = tempfile::tempdir().unwrap();
        SessionStore::open(dir.path()).unwrap().request_restart().unwrap();

        let mut store = SessionStore::open(dir.path()).unwrap();
        let mut gate = StartGate::new(store.take_restart().unwrap(), 30);
        let mut session = menu_session();
        gate.poll(&mut session);
        assert_eq!(session.phase(), SessionPhase::Running);
    }

    #[test]
    fn without_restart_the_menu_waits() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        let mut gate = StartGate::new(store.take_restart().unwrap(), 3);
        let mut session = menu_session();

        for _ in 0..3 {
            gate.poll(&mut session);
            session.tick(&ControlState::default(), 0.1);
            assert_eq!(session.phase(), SessionPhase::Menu);
        }
        assert_eq!(session.tick_count(), 0);

        gate.poll(&mut session);
        assert_eq!(session.phase(), SessionPhase::Running);
    }

    #[test]
    fn restart_is_consumed_by_one_run() {
        let dir = tempfile::tempdir().unwrap();
        SessionStore::open(dir.path()).unwrap().request_restart().unwrap();
        assert!(SessionStore::open(dir.path()).unwrap().take_restart().unwrap());

        let mut store = SessionStore::open(dir.path()).unwrap();
        let mut gate = StartGate::new(store.take_restart().unwrap(), 1);
        let mut session = menu_session();
        gate.poll(&mut session);
        assert_eq!(session.phase(), SessionPhase::Menu);
    }
}
