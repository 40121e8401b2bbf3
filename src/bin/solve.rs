//! Analyse a two-player extensive-form game.
//!
//! Usage:
//!   cargo run --release --bin solve -- <GAME> [OPTIONS]
//!
//! `GAME` is a game description file or a bundled name (`kuhn`, `rps`).
//! Set `RUST_LOG` to change the log level (default `info`).

use std::collections::BTreeMap;
use std::error::Error;
use std::ops::ControlFlow;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use efg_solver::cfr::{
    best_response, estimate_payoffs, expected_value, CFRConfig, CFRSolver, CfrMode, NashGapPoint,
    Strategy,
};
use efg_solver::games::{self, Game};

#[derive(Parser)]
#[command(name = "solve")]
#[command(about = "Best-response and CFR analysis of two-player extensive-form games")]
struct Cli {
    /// Game description file, or a bundled game name (kuhn, rps)
    game: String,

    /// What to compute
    #[arg(short, long, value_enum, default_value = "nash")]
    analysis: Analysis,

    /// Learning player for `learn`
    #[arg(short, long, default_value = "1")]
    player: String,

    /// Number of CFR iterations (overrides config)
    #[arg(short, long)]
    iterations: Option<u64>,

    /// Record the Nash gap every N iterations (overrides config)
    #[arg(long)]
    nash_gap_every: Option<u64>,

    /// JSON solver configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Estimate payoffs of the result from N sampled playouts
    #[arg(long)]
    simulate: Option<usize>,

    /// Random seed for sampled playouts (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the report as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Analysis {
    /// Each player's best response against a uniformly random opponent
    BestResponse,
    /// CFR for one player against a uniformly random opponent
    Learn,
    /// Simultaneous CFR for both players
    Nash,
}

#[derive(Debug, Serialize)]
struct PlayerBestResponse {
    value: f64,
    actions: BTreeMap<String, String>,
}

#[derive(Debug, Default, Serialize)]
struct Report {
    game: String,
    analysis: String,
    players: Vec<String>,
    best_responses: BTreeMap<String, PlayerBestResponse>,
    nash_gap: Option<f64>,
    iterations: u64,
    utility_players: Vec<String>,
    utilities: Vec<Vec<f64>>,
    nash_gap_history: Vec<NashGapPoint>,
    average_strategy: BTreeMap<String, BTreeMap<String, f64>>,
    expected_values: BTreeMap<String, f64>,
    simulated_payoffs: Option<BTreeMap<String, f64>>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let game = games::resolve(&cli.game)?;
    let mut report = Report {
        game: game.name.clone(),
        analysis: format!("{:?}", cli.analysis),
        players: game.tree.players().to_vec(),
        ..Default::default()
    };

    // Best responses are taken against the learned strategy, or against
    // uniform play when nothing is learned.
    let (strategy, seed) = match cli.analysis {
        Analysis::BestResponse => (Strategy::new(), cli.seed),
        Analysis::Learn | Analysis::Nash => {
            let config = solver_config(&cli)?;
            let seed = config.seed;
            let strategy = learn(&game, config, &mut report)?;
            report.average_strategy = strategy.named(&game.info_sets);
            (strategy, seed)
        }
    };

    best_responses(&game, &strategy, &mut report)?;
    for player in game.tree.players() {
        let value = expected_value(&game.tree, &strategy, player)?;
        report.expected_values.insert(player.clone(), value);
    }
    if let Some(samples) = cli.simulate {
        let estimate = estimate_payoffs(&game.tree, &strategy, samples, seed)?;
        report.simulated_payoffs = Some(estimate.into_iter().collect());
    }

    print_report(&report);

    if let Some(path) = &cli.output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}

/// Configuration file (or defaults) with the command-line overrides applied.
fn solver_config(cli: &Cli) -> Result<CFRConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => CFRConfig::from_json_file(path)?,
        None => CFRConfig::default(),
    };
    config.mode = match cli.analysis {
        Analysis::Learn => CfrMode::Single {
            player: cli.player.clone(),
        },
        _ => CfrMode::Dual,
    };
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    if let Some(every) = cli.nash_gap_every {
        config.nash_gap_interval = Some(every);
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

/// Run CFR with a progress bar and return the average strategy.
fn learn(game: &Game, config: CFRConfig, report: &mut Report) -> Result<Strategy, Box<dyn Error>> {
    let iterations = config.iterations;
    let mut solver = CFRSolver::new(&game.tree, &game.info_sets, config)?;

    let pb = ProgressBar::new(iterations);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let chunk = std::cmp::max(iterations / 100, 1);
    let stats = solver.train_with_callback(iterations, chunk, |stats| {
        pb.set_position(stats.iterations);
        ControlFlow::Continue(())
    })?;
    pb.finish_and_clear();

    report.iterations = stats.iterations;
    report.nash_gap = stats.nash_gap;
    report.nash_gap_history = stats.nash_gap_history.clone();
    report.utility_players = stats.players.clone();
    report.utilities = stats.utilities.clone();

    Ok(solver.average_strategy())
}

fn best_responses(
    game: &Game,
    strategy: &Strategy,
    report: &mut Report,
) -> Result<(), Box<dyn Error>> {
    let opponent = if strategy.is_empty() { None } else { Some(strategy) };
    let mut total = 0.0;
    for player in game.tree.players() {
        let br = best_response(&game.tree, &game.info_sets, player, opponent)?;
        total += br.value;
        report.best_responses.insert(
            player.clone(),
            PlayerBestResponse {
                value: br.value,
                actions: br.actions,
            },
        );
    }
    if report.nash_gap.is_none() && game.tree.players().len() == 2 {
        report.nash_gap = Some(total);
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!("=================================================");
    println!("  {} ({})", report.game, report.analysis);
    println!("=================================================");
    println!();

    if report.iterations > 0 {
        println!("Iterations: {}", report.iterations);
        if let Some(last) = report.utilities.last() {
            for (player, utility) in report.utility_players.iter().zip(last) {
                println!("Final utility of player {}: {:.6}", player, utility);
            }
        }
        println!();
    }

    for (player, br) in &report.best_responses {
        println!("Player {} best response value: {:.6}", player, br.value);
        for (label, action) in &br.actions {
            println!("  {:<12} {}", label, action);
        }
    }
    if let Some(gap) = report.nash_gap {
        println!("Nash gap: {:.6}", gap);
    }

    if !report.average_strategy.is_empty() {
        println!();
        println!("Average strategy:");
        for (label, row) in &report.average_strategy {
            let probs: Vec<String> = row.iter().map(|(a, p)| format!("{}={:.3}", a, p)).collect();
            println!("  {:<12} {}", label, probs.join(" "));
        }
    }

    if !report.expected_values.is_empty() {
        println!();
        for (player, value) in &report.expected_values {
            println!("Expected value of player {}: {:.6}", player, value);
        }
    }
    if let Some(simulated) = &report.simulated_payoffs {
        for (player, value) in simulated {
            println!("Simulated payoff of player {}: {:.6}", player, value);
        }
    }
}
