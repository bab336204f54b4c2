use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use bracket_engine::config::{AppConfig, OutputFormat};
use bracket_engine::engine::{
    normalize_matches, process_matches_with_results, process_schedule, process_stats,
};
use bracket_engine::models::{Diagnostic, Match, MatchStatsSummary, RoundGroup, Side};
use bracket_engine::schedule::Schedule;
use bracket_engine::storage::{load_document, load_records, load_results, JsonlWriter};

#[derive(Parser)]
#[command(name = "bracket-engine")]
#[command(about = "Single-elimination bracket and match stats from FACEIT data")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Output format (json or table); overrides the config file
    #[arg(long)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the bracket tree
    Bracket {
        /// Match records (JSON array, {"items": [...]} or JSONL)
        #[arg(long)]
        input: PathBuf,

        /// Separate results listing merged into matches without results
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Show matches grouped by round
    Rounds {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Aggregate a match statistics document
    Stats {
        #[arg(long)]
        input: PathBuf,
    },

    /// Split matches into live, upcoming and past
    Schedule {
        #[arg(long)]
        input: PathBuf,

        /// Reference time (RFC 3339), defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Write normalized matches as JSONL
    Export {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        #[arg(long)]
        results: Option<PathBuf>,

        /// Append instead of replacing the output file
        #[arg(long)]
        append: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let format = cli.format.unwrap_or(config.output.format);

    // Initialize tracing; stdout is reserved for command output
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            cli.json_logs
                .then(|| fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.json_logs).then(|| fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    tracing::debug!("Starting bracket-engine v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Bracket { input, results } => {
            let report = process_matches_with_results(
                &load_records(&input)?,
                &optional_results(results.as_deref())?,
            );

            match format {
                OutputFormat::Json => print_json(&report, config.output.pretty)?,
                OutputFormat::Table => {
                    println!("=== Bracket ===");
                    println!("Strategy:    {}", report.tree.strategy);
                    println!("Matches:     {}", report.tree.len());
                    println!("Teams:       {}", report.teams.len());
                    println!(
                        "Final:       {}",
                        report
                            .tree
                            .root_match()
                            .map(describe_match)
                            .unwrap_or_else(|| "-".to_string())
                    );
                    println!("Valid:       {}", report.is_valid());
                    println!();
                    print_rounds(&report.rounds);
                    print_diagnostics(&report.diagnostics);
                }
            }

            if config.bracket.strict && !report.is_valid() {
                bail!(
                    "Bracket is invalid ({} diagnostics) and strict mode is on",
                    report.diagnostics.len()
                );
            }
        }

        Commands::Rounds { input, results } => {
            let report = process_matches_with_results(
                &load_records(&input)?,
                &optional_results(results.as_deref())?,
            );

            match format {
                OutputFormat::Json => print_json(&report.rounds, config.output.pretty)?,
                OutputFormat::Table => {
                    print_rounds(&report.rounds);
                    print_diagnostics(&report.diagnostics);
                }
            }
        }

        Commands::Stats { input } => {
            let summary = process_stats(&load_document(&input)?);

            match format {
                OutputFormat::Json => print_json(&summary, config.output.pretty)?,
                OutputFormat::Table => {
                    print_stats(&summary.data, config.stats.precision);
                    print_diagnostics(&summary.diagnostics);
                }
            }
        }

        Commands::Schedule { input, now } => {
            let now = match now {
                Some(s) => DateTime::parse_from_rfc3339(&s)
                    .with_context(|| format!("Invalid --now (expected RFC 3339): {}", s))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let schedule = process_schedule(&load_records(&input)?, now);

            match format {
                OutputFormat::Json => print_json(&schedule, config.output.pretty)?,
                OutputFormat::Table => {
                    print_schedule(&schedule.data);
                    print_diagnostics(&schedule.diagnostics);
                }
            }
        }

        Commands::Export {
            input,
            output,
            results,
            append,
        } => {
            let normalized = normalize_matches(
                &load_records(&input)?,
                &optional_results(results.as_deref())?,
            );

            let writer: JsonlWriter<Match> = JsonlWriter::new(output);
            let count = if append {
                writer.append_batch(&normalized.data)?
            } else {
                writer.write_all(&normalized.data)?
            };

            println!("Exported {} matches to {:?}", count, writer.path());
            print_diagnostics(&normalized.diagnostics);
        }
    }

    Ok(())
}

fn optional_results(path: Option<&Path>) -> Result<Vec<bracket_engine::raw::RawResult>> {
    match path {
        Some(path) => load_results(path)
            .with_context(|| format!("Failed to load results from {:?}", path)),
        None => Ok(Vec::new()),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn describe_side(side: &Side) -> String {
    let name = side.participant.display_name();
    match side.score {
        Some(score) => format!("{} {}", name, score),
        None => name.to_string(),
    }
}

fn describe_match(m: &Match) -> String {
    let winner = m
        .winner()
        .map(|w| format!(", winner {}", w.participant.display_name()))
        .unwrap_or_default();
    format!(
        "{}: {} vs {} [{}{}]",
        m.id,
        describe_side(&m.home),
        describe_side(&m.away),
        m.state,
        winner
    )
}

fn print_rounds(rounds: &[RoundGroup]) {
    if rounds.is_empty() {
        println!("No rounds.");
        return;
    }
    for round in rounds {
        println!("=== {} ===", round.label);
        for m in &round.matches {
            println!("  {}", describe_match(m));
        }
        println!();
    }
}

fn print_stats(summary: &MatchStatsSummary, precision: usize) {
    for (i, map) in summary.maps.iter().enumerate() {
        let score = map
            .teams
            .iter()
            .map(|t| format!("{} {}", t.team_name, t.final_score))
            .collect::<Vec<_>>()
            .join(" - ");
        println!(
            "Map {}: {}  {}",
            i + 1,
            map.map_name.as_deref().unwrap_or("unknown"),
            score
        );
    }
    println!();

    for team in &summary.overall {
        println!(
            "=== {} (rounds {}, maps won {}) ===",
            team.team_name, team.final_score, team.maps_won
        );
        println!(
            "{:<20} {:>5} {:>5} {:>5} {:>8} {:>6}",
            "Player", "K", "D", "A", "HS%", "K/D"
        );
        let mut players: Vec<_> = team.players.iter().collect();
        players.sort_by(|a, b| b.kills.cmp(&a.kills));
        for p in players {
            println!(
                "{:<20} {:>5} {:>5} {:>5} {:>8.prec$} {:>6.prec$}",
                p.name,
                p.kills,
                p.deaths,
                p.assists,
                p.headshot_pct,
                p.kd_ratio(),
                prec = precision
            );
        }
        println!();
    }
}

fn print_schedule(schedule: &Schedule) {
    for (title, matches) in [
        ("Live", &schedule.live),
        ("Upcoming", &schedule.upcoming),
        ("Past", &schedule.past),
    ] {
        println!("=== {} ({}) ===", title, matches.len());
        for m in matches {
            let when = m
                .scheduled_at
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "TBD".to_string());
            println!("  {}  {}", when, describe_match(m));
        }
        println!();
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("Diagnostics:");
    for d in diagnostics {
        match &d.record {
            Some(record) => println!("  - [{}] {}: {}", d.kind, record, d.message),
            None => println!("  - [{}] {}", d.kind, d.message),
        }
    }
}
