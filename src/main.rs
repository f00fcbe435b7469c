//! Chaos City - Entry Point
//!
//! Headless driver for the game core. It sets up the async runtime for AI
//! provider calls and runs a command loop driving level loads, simulation
//! ticks, and the impactor, printing the events and cues that rendering and
//! audio collaborators would consume.

use chaos_city::core::error::Result;
use chaos_city::physics::PhysicsWorld;
use chaos_city::provider::AiProvider;
use chaos_city::session::{route_events, swing_cue, Cue, GameStatus, Session};

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};
use tokio::runtime::Runtime;

/// Fixed simulation step, matching a 60 Hz host loop
const TICK_DT: f64 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "chaos-city", about = "Smash the city, feed the chaos meter")]
struct Args {
    /// Skip the remote architect even if LLM_API_KEY is set
    #[arg(long)]
    offline: bool,

    /// Starting level
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Seed for the procedural generator (entropy if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("chaos_city=info")
        .init();

    let args = Args::parse();
    tracing::info!("Chaos City starting...");

    // Async runtime for AI provider calls
    let rt = Runtime::new()?;

    let provider = if args.offline {
        AiProvider::offline()
    } else {
        AiProvider::from_env()
    };

    let mut rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut session = Session::starting_at(args.level);
    let mut world = PhysicsWorld::new();

    println!("\n=== CHAOS CITY ===");
    println!("A monster, a city, and a chaos meter. Knock it all down.");
    println!();
    println!("Commands:");
    println!("  start           - Load the current level and start playing");
    println!("  tick / t        - Advance simulation by one tick");
    println!("  run <n>         - Run n simulation ticks");
    println!("  aim <x> <z>     - Move the impactor over (x, z)");
    println!("  smash           - Drive the impactor down");
    println!("  raise           - Lift the impactor back up");
    println!("  status / s      - Show session status");
    println!("  news            - Fetch a breaking-news ticker line");
    println!("  next / n        - Advance to the next level");
    println!("  quit / q        - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "q" {
            break;
        }

        if input == "start" {
            if session.state().game_status == GameStatus::Playing {
                println!("Level already running. Smash away.");
                continue;
            }
            load_level(&mut session, &mut world, &provider, &rt, &mut rng);
            continue;
        }

        if input == "next" || input == "n" {
            let request = session.advance_level();
            fulfil_request(request, &mut session, &mut world, &provider, &rt, &mut rng);
            continue;
        }

        if input == "tick" || input == "t" {
            run_ticks(1, &mut session, &mut world);
            continue;
        }

        if let Some(rest) = input.strip_prefix("run ") {
            match rest.parse::<u32>() {
                Ok(n) => run_ticks(n, &mut session, &mut world),
                Err(_) => println!("Usage: run <number>"),
            }
            continue;
        }

        if let Some(rest) = input.strip_prefix("aim ") {
            let coords: Vec<_> = rest.split_whitespace().collect();
            match (
                coords.first().and_then(|s| s.parse::<f64>().ok()),
                coords.get(1).and_then(|s| s.parse::<f64>().ok()),
            ) {
                (Some(x), Some(z)) => {
                    world.set_impactor_target(x, z);
                    println!("Impactor over ({x:.1}, {z:.1}).");
                }
                _ => println!("Usage: aim <x> <z>"),
            }
            continue;
        }

        if input == "smash" {
            world.set_smashing(true);
            print_cue(&swing_cue());
            continue;
        }

        if input == "raise" {
            world.set_smashing(false);
            println!("Impactor raised.");
            continue;
        }

        if input == "status" || input == "s" {
            display_status(&session, &world);
            continue;
        }

        if input == "news" {
            let flash = rt.block_on(provider.fetch_news(session.state().chaos_score, &mut rng));
            println!("[NEWS] {}", flash.message);
            continue;
        }

        println!("Unknown command: {input}");
    }

    Ok(())
}

/// Load the session's current level: request, fetch (AI or local), install,
/// repopulate the physics world.
fn load_level(
    session: &mut Session,
    world: &mut PhysicsWorld,
    provider: &AiProvider,
    rt: &Runtime,
    rng: &mut ChaCha8Rng,
) {
    let request = session.begin_level();
    fulfil_request(request, session, world, provider, rt, rng);
}

fn fulfil_request(
    request: chaos_city::session::LevelRequest,
    session: &mut Session,
    world: &mut PhysicsWorld,
    provider: &AiProvider,
    rt: &Runtime,
    rng: &mut ChaCha8Rng,
) {
    println!("Loading level {}...", request.level);
    let layout = rt.block_on(provider.fetch_city(request.level, rng));
    println!("{} - \"{}\"", layout.name, layout.architect_note);

    if session.install_layout(request.token, layout) {
        let installed = session.layout().expect("layout installed above");
        world.populate(installed);
        println!(
            "Level {} started: {} blocks, target {} chaos.",
            session.state().level,
            world.block_count(),
            session.target_score()
        );
    }
}

fn run_ticks(n: u32, session: &mut Session, world: &mut PhysicsWorld) {
    if !session.state().is_level_active {
        println!("No active level. Use 'start' (or 'next' after a clear).");
        return;
    }
    for _ in 0..n {
        // Simulation only advances while the level is active; a clear
        // mid-run freezes the tableau immediately.
        if !session.state().is_level_active {
            break;
        }
        let events = world.step(TICK_DT);
        for cue in route_events(session, &events) {
            print_cue(&cue);
        }
    }
    let target = session.target_score();
    let state = session.state();
    println!(
        "Tick {} | chaos {}/{} ({:.0}%)",
        world.current_tick(),
        state.chaos_score,
        target,
        state.chaos_level
    );
    if state.game_status == GameStatus::LevelCleared {
        println!(
            "LEVEL {} CLEARED! Type 'next' to keep the rampage going.",
            state.level
        );
    }
}

fn print_cue(cue: &Cue) {
    match cue {
        Cue::Swing => println!("* whoosh *"),
        Cue::Smash { intensity } => println!("* smash ({:.2}) *", intensity),
        Cue::Explosion => println!("* BOOM *"),
        Cue::Win => println!("* fanfare *"),
    }
}

fn display_status(session: &Session, world: &PhysicsWorld) {
    let state = session.state();
    println!("Level {} [{:?}]", state.level, state.game_status);
    println!(
        "  Chaos: {}/{} ({:.0}%)",
        state.chaos_score,
        session.target_score(),
        state.chaos_level
    );
    if let Some(layout) = session.layout() {
        println!(
            "  City: {} ({} blocks, {} fallen)",
            layout.name,
            world.block_count(),
            world.fallen_count()
        );
    } else {
        println!("  City: none loaded");
    }
    println!(
        "  Impactor: {}",
        if world.is_smashing() { "SMASHING" } else { "idle" }
    );
}
