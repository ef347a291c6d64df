//! timewindow - evaluate recurring time-window rules
//!
//! Reads a rule program from a file or stdin and reports whether the window
//! is open at an instant, when it next changes, or the program's normalized
//! form.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use window_engine::{
    parse_with_options, upcoming_transitions, window_status, BoundaryPinning, DurationPolicy,
    ParseOptions, Predicate, Transition,
};

/// timewindow - evaluate recurring time-window rules
#[derive(Parser, Debug)]
#[command(name = "timewindow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report whether the window is open and when that next changes
    Check {
        #[command(flatten)]
        rule: RuleArgs,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// List the upcoming transitions of the window
    Next {
        #[command(flatten)]
        rule: RuleArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// Number of transitions to list
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Print the parsed window in normalized rule syntax
    Fmt {
        #[command(flatten)]
        rule: RuleArgs,
    },
}

#[derive(Args, Debug)]
struct RuleArgs {
    /// Rule program file, or `-` to read stdin
    file: PathBuf,

    /// Value of a flag imported with `from context import` (repeatable)
    #[arg(long = "context", value_name = "NAME=BOOL", value_parser = parse_context_flag)]
    context: Vec<(String, bool)>,

    /// Boundary kept when a clock change splits an hour range (start, end)
    #[arg(long, default_value_t = BoundaryPinning::PinStart)]
    pin: BoundaryPinning,

    /// What an hour range keeps across a clock change (civil, duration)
    #[arg(long, default_value_t = DurationPolicy::PreserveCivilTime)]
    preserve: DurationPolicy,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Instant to evaluate at, RFC 3339 (defaults to now)
    #[arg(long)]
    at: Option<String>,

    /// IANA time zone the window is read in
    #[arg(long, default_value = "UTC")]
    tz: String,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

impl QueryArgs {
    fn instant(&self) -> String {
        self.at.clone().unwrap_or_else(|| Utc::now().to_rfc3339())
    }
}

#[derive(Serialize)]
struct TransitionReport<'a> {
    from: String,
    timezone: &'a str,
    transitions: Vec<Transition>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Check { rule, query } => check(&rule, &query),
        Commands::Next { rule, query, count } => next(&rule, &query, count),
        Commands::Fmt { rule } => {
            let window = load_window(&rule)?;
            println!("{window}");
            Ok(())
        }
    }
}

fn check(rule: &RuleArgs, query: &QueryArgs) -> Result<()> {
    let window = load_window(rule)?;
    let status = window_status(&window, &query.instant(), &query.tz)
        .context("failed to evaluate window")?;

    if query.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let state = if status.active { "active" } else { "inactive" };
    match &status.next_transition {
        Some(next) => println!("{state} until {next}"),
        None => println!("{state} (no further transitions)"),
    }
    Ok(())
}

fn next(rule: &RuleArgs, query: &QueryArgs, count: usize) -> Result<()> {
    let window = load_window(rule)?;
    let from = query.instant();
    let transitions = upcoming_transitions(&window, &from, &query.tz, count)
        .context("failed to search transitions")?;

    if query.json {
        let report = TransitionReport {
            from,
            timezone: &query.tz,
            transitions,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if transitions.is_empty() {
        println!("no further transitions");
    }
    for transition in &transitions {
        let state = if transition.active { "active" } else { "inactive" };
        println!("{} {state}", transition.at);
    }
    Ok(())
}

fn load_window(rule: &RuleArgs) -> Result<Predicate> {
    let source = read_source(&rule.file)?;
    let context: HashMap<String, bool> = rule.context.iter().cloned().collect();
    let options = ParseOptions {
        pinning: rule.pin,
        duration: rule.preserve,
    };
    tracing::info!(
        file = %rule.file.display(),
        flags = context.len(),
        pinning = %rule.pin,
        duration = %rule.preserve,
        "loading rule program"
    );
    parse_with_options(&source, &context, &options)
        .with_context(|| format!("failed to parse rule program {}", rule.file.display()))
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read rule program from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rule program {}", path.display()))
}

fn parse_context_flag(s: &str) -> std::result::Result<(String, bool), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=BOOL, got '{s}'"))?;
    let value = value
        .parse::<bool>()
        .map_err(|_| format!("expected true or false for '{name}', got '{value}'"))?;
    Ok((name.to_string(), value))
}

// ── Tests ───────────────────────────────────────────────────────────────────
