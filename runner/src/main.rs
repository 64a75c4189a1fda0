// ═══════════════════════════════════════════════════════════════════════
// Runner: CLI entry point for resolving scenarios and batches
// ═══════════════════════════════════════════════════════════════════════

use anyhow::Context;
use autoresolve_batch::{make_commanders, resolve, run_batch, Database, ResolutionResult};
use autoresolve_engine::setup::ScenarioConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MAX_DECISIONS: usize = 200_000;

#[derive(Parser)]
#[command(name = "autoresolve", about = "Headless battle autoresolver")]
struct Cli {
    /// Log turn and action detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a scenario once
    Resolve {
        #[arg(short, long, default_value = "scenarios/skirmish.json")]
        scenario: PathBuf,
        /// Overrides the scenario's seed
        #[arg(long)]
        seed: Option<u64>,
        /// Commander type: "random", "aggressive", or "mixed"
        #[arg(short, long, default_value = "aggressive")]
        commander: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a scenario over many seeds and store the outcomes
    Batch {
        #[arg(short, long, default_value = "scenarios/skirmish.json")]
        scenario: PathBuf,
        #[arg(short, long, default_value_t = 100)]
        runs: u32,
        /// First seed; run i uses seed + i
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value = "mixed")]
        commander: String,
        #[arg(short, long, default_value = "results.db")]
        db: PathBuf,
    },
    /// Show stored outcome statistics
    Report {
        #[arg(short, long, default_value = "results.db")]
        db: PathBuf,
        /// Also break down outcomes for this scenario name
        #[arg(short, long)]
        scenario: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Resolve { scenario, seed, commander, json } => cmd_resolve(&scenario, seed, &commander, json),
        Commands::Batch { scenario, runs, seed, commander, db } => cmd_batch(&scenario, runs, seed, &commander, &db),
        Commands::Report { db, scenario } => cmd_report(&db, scenario.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(path: &Path) -> anyhow::Result<ScenarioConfig> {
    ScenarioConfig::from_path(path).with_context(|| format!("loading scenario {}", path.display()))
}

fn cmd_resolve(path: &Path, seed: Option<u64>, kind: &str, json: bool) -> anyhow::Result<()> {
    let mut config = load(path)?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let mut commanders = make_commanders(&config, kind)?;
    let result = resolve(&config, &mut commanders, MAX_DECISIONS)
        .with_context(|| format!("resolving {} (seed {})", config.name, config.seed))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &ResolutionResult) {
    println!("=== {} (seed {}) ===\n", result.scenario, result.seed);
    match (result.victory_team, result.victory_player) {
        (Some(team), Some(player)) => println!("  Victory: {team} ({player})"),
        (Some(team), None) => println!("  Victory: {team}"),
        _ => println!("  Draw"),
    }
    println!("  Rounds: {}{}", result.rounds, if result.timed_out { " (round limit)" } else { "" });
    println!("  Decisions: {}", result.decisions);
    println!("  Local team won: {}", result.local_team_won);
    println!();
    println!("  {:<12} {:<8} {:<12} {:>9} {:>6} {:>7}", "Player", "Team", "Commander", "Survivors", "HP", "Losses");
    for side in &result.sides {
        println!(
            "  {:<12} {:<8} {:<12} {:>9} {:>6} {:>7}",
            side.player.to_string(), side.team.to_string(), side.commander,
            side.survivors, side.remaining_hit_points, side.losses,
        );
    }
    if !result.removed.is_empty() {
        println!("\n  Recoverable losses:");
        for r in &result.removed {
            println!("    {} {:<20} {} ({:?})", r.id, r.name, r.owner, r.reason);
        }
    }
}

fn cmd_batch(path: &Path, runs: u32, first_seed: u64, kind: &str, db_path: &Path) -> anyhow::Result<()> {
    let config = load(path)?;
    // Fail on a bad commander type before touching the database
    make_commanders(&config, kind)?;
    let mut db = Database::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;

    let seeds: Vec<u64> = (0..u64::from(runs)).map(|i| first_seed.wrapping_add(i)).collect();
    println!("=== Batch: {} x {}, commander={} ===\n", runs, config.name, kind);

    let results = run_batch(&config, &seeds, MAX_DECISIONS, |c| make_commanders(c, kind));

    let mut errors = 0u32;
    let mut local_wins = 0u32;
    for (seed, outcome) in seeds.iter().zip(results) {
        match outcome {
            Ok(result) => {
                local_wins += u32::from(result.local_team_won);
                db.store_resolution(&result)?;
            }
            Err(e) => {
                errors += 1;
                warn!(seed, error = %e, "resolution failed");
            }
        }
    }

    let pct = if runs > 0 { f64::from(local_wins) / f64::from(runs) * 100.0 } else { 0.0 };
    println!("--- Summary ({} runs, {} errors) ---", runs, errors);
    println!("  Local team wins: {} ({:.1}%)", local_wins, pct);
    println!("\nResults saved to: {}", db_path.display());
    println!("Total resolutions in DB: {}", db.resolution_count()?);
    info!(runs, errors, local_wins, "batch finished");
    Ok(())
}

fn cmd_report(db_path: &Path, scenario: Option<&str>) -> anyhow::Result<()> {
    let db = Database::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    let board = db.leaderboard()?;
    if board.is_empty() {
        println!("No resolutions found. Run a batch first.");
        return Ok(());
    }

    println!("=== Commanders ===\n");
    println!("{:<16} {:>8} {:>8} {:>8} {:>8}", "Commander", "Sides", "Wins", "Draws", "Win %");
    println!("{}", "-".repeat(52));
    for r in &board {
        println!("{:<16} {:>8} {:>8} {:>8} {:>7.1}%", r.name, r.sides, r.wins, r.draws, r.win_rate() * 100.0);
    }

    if let Some(name) = scenario {
        println!("\n=== {} ===\n", name);
        for (team, count) in db.team_outcomes(name)? {
            match team {
                Some(team) => println!("  team {:<6} {:>6} wins", team, count),
                None => println!("  {:<11} {:>6}", "draws", count),
            }
        }
        if let Some(avg) = db.average_rounds(name)? {
            println!("  Average rounds: {:.1}", avg);
        }
    }
    Ok(())
}
