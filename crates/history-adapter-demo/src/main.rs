use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use history_adapter::{
    HistoryAdapter, HistoryAdapterConfig, HistoryState, HistoryStrategy, Outcome,
};

/// Drives a counter through an undoable history from the command line.
#[derive(Parser, Debug)]
#[command(name = "history-adapter-demo", version, about)]
struct Cli {
    /// JSON adapter config file, e.g. `{"limit": 10}`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of undo steps kept (overrides the config file).
    #[arg(long)]
    limit: Option<usize>,

    /// Record whole snapshots instead of JSON patches.
    #[arg(long)]
    snapshots: bool,

    /// Starting counter value.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    start: i64,

    /// Steps to run in order: inc, dec, add:N, set:N, quiet-add:N (not
    /// undoable), undo, redo, jump:N, pause, resume, clear.
    #[arg(allow_hyphen_values = true)]
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Counter {
    value: i64,
}

/// Arguments to the counter recipe.
#[derive(Debug, Clone, Copy)]
struct Change {
    kind: ChangeKind,
    undoable: bool,
}

#[derive(Debug, Clone, Copy)]
enum ChangeKind {
    Add(i64),
    Set(i64),
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Change(Change),
    Undo,
    Redo,
    Jump(isize),
    Pause,
    Resume,
    Clear,
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let number = || -> Result<i64> {
            let arg = arg.with_context(|| format!("`{name}` needs a value, e.g. `{name}:3`"))?;
            arg.parse()
                .with_context(|| format!("invalid number `{arg}` in `{s}`"))
        };
        let change = |kind, undoable| Step::Change(Change { kind, undoable });

        let step = match name {
            "inc" => change(ChangeKind::Add(1), true),
            "dec" => change(ChangeKind::Add(-1), true),
            "add" => change(ChangeKind::Add(number()?), true),
            "set" => change(ChangeKind::Set(number()?), true),
            "quiet-add" => change(ChangeKind::Add(number()?), false),
            "undo" => Step::Undo,
            "redo" => Step::Redo,
            "jump" => Step::Jump(
                isize::try_from(number()?).context("jump distance out of range")?,
            ),
            "pause" => Step::Pause,
            "resume" => Step::Resume,
            "clear" => Step::Clear,
            other => bail!("unknown step `{other}`"),
        };
        Ok(step)
    }
}

fn apply_change(counter: &mut Counter, change: &Change) -> Result<Outcome<Counter>> {
    match change.kind {
        ChangeKind::Add(by) => {
            counter.value = counter
                .value
                .checked_add(by)
                .context("counter overflowed")?;
            Ok(Outcome::Mutated)
        }
        ChangeKind::Set(value) => Ok(Outcome::Replace(Counter { value })),
    }
}

fn run<S: HistoryStrategy<Counter>>(
    adapter: &HistoryAdapter<Counter, S>,
    start: i64,
    steps: &[Step],
) -> Result<HistoryState<Counter, S::Entry>> {
    let change = adapter.undoable_if(apply_change, |change: &Change| Some(change.undoable));
    let mut state = adapter.get_initial_state(Counter { value: start });

    for step in steps {
        match *step {
            Step::Change(args) => {
                change.apply(&mut state, args)?;
            }
            Step::Undo => {
                adapter.undo(&mut state)?;
            }
            Step::Redo => {
                adapter.redo(&mut state)?;
            }
            Step::Jump(n) => {
                adapter.jump(&mut state, n)?;
            }
            Step::Pause => {
                adapter.pause(&mut state);
            }
            Step::Resume => {
                adapter.resume(&mut state);
            }
            Step::Clear => {
                adapter.clear_history(&mut state);
            }
        }
        tracing::info!(
            ?step,
            present = state.present.value,
            past = state.past.len(),
            future = state.future.len(),
            paused = state.paused,
            "applied step"
        );
    }
    Ok(state)
}

fn load_config(cli: &Cli) -> Result<HistoryAdapterConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            HistoryAdapterConfig::from_json(&json)?
        }
        None => HistoryAdapterConfig::default(),
    };
    if let Some(limit) = cli.limit {
        config = config.with_limit(limit);
    }
    Ok(config)
}

fn report<E>(state: &HistoryState<Counter, E>) {
    println!("present: {}", state.present.value);
    println!("past:    {} step(s)", state.past.len());
    println!("future:  {} step(s)", state.future.len());
    println!("paused:  {}", state.paused);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(&cli)?;
    tracing::info!(limit = ?config.limit, snapshots = cli.snapshots, "Starting history-adapter-demo");

    if cli.snapshots {
        let adapter = HistoryAdapter::with_snapshots(config)?;
        report(&run(&adapter, cli.start, &cli.steps)?);
    } else {
        let adapter = HistoryAdapter::with_patches(config)?;
        report(&run(&adapter, cli.start, &cli.steps)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(script: &str) -> Vec<Step> {
        script
            .split_whitespace()
            .map(|s| s.parse().expect("step"))
            .collect()
    }

    #[test]
    fn test_parse_steps() {
        assert!(matches!("inc".parse::<Step>(), Ok(Step::Change(_))));
        assert!(matches!("jump:-2".parse::<Step>(), Ok(Step::Jump(-2))));
        assert!("add".parse::<Step>().is_err());
        assert!("add:x".parse::<Step>().is_err());
        assert!("launch".parse::<Step>().is_err());
    }

    #[test]
    fn test_run_with_patches() {
        let adapter = HistoryAdapter::with_patches(HistoryAdapterConfig::default().with_limit(2))
            .expect("adapter");
        let state = run(&adapter, 0, &steps("inc inc inc inc inc jump:-5")).expect("run");
        assert_eq!(state.present.value, 3);
        assert!(state.past.is_empty());
        assert_eq!(state.future.len(), 2);
    }

    #[test]
    fn test_run_with_snapshots() {
        let adapter =
            HistoryAdapter::with_snapshots(HistoryAdapterConfig::default()).expect("adapter");
        let state = run(
            &adapter,
            10,
            &steps("set:1 quiet-add:5 pause inc resume add:2 undo"),
        )
        .expect("run");
        assert_eq!(state.present.value, 7);
        assert_eq!(state.past.len(), 1);
        assert_eq!(state.future.len(), 1);
    }

    #[test]
    fn test_overflow_error_surfaces() {
        let adapter =
            HistoryAdapter::with_snapshots(HistoryAdapterConfig::default()).expect("adapter");
        let err = run(&adapter, i64::MAX, &steps("inc")).unwrap_err();
        assert_eq!(err.to_string(), "counter overflowed");
    }
}
