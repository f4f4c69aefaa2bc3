//! match3: line-oriented harness for the match-3 rules engine.
//!
//! Reads one command per line from stdin and prints results to stdout:
//!
//! ```text
//! init W H              new empty board
//! populate [true|false] fill empty slots (true allows initial matches)
//! swap X1 Y1 X2 Y2      try a swap
//! stabilize             resolve any matches already on the board
//! reset                 clear board and score
//! set X Y COLOUR        force a token's colour
//! show | json           print the board
//! moves | hint | score  inspect move availability and score
//! events                print and clear recorded events
//! quit
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rust_match3::{Cascade, Collaborators, EngineConfig, EventLog, Position, SwapOutcome, TimedMotion};

/// Drive the match-3 engine from stdin.
#[derive(Debug, Parser)]
#[command(name = "match3", version, about)]
struct Args {
    /// JSON engine config; flags below override its fields.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Board width.
    #[arg(long)]
    width: Option<usize>,

    /// Board height.
    #[arg(long)]
    height: Option<usize>,

    /// Number of token colours (at least 3).
    #[arg(short, long)]
    types: Option<u8>,

    /// RNG seed for colours and hints.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Clear the board when no moves remain.
    #[arg(long)]
    clear_on_deadlock: bool,

    /// Duration of every motion in milliseconds (0 completes instantly).
    #[arg(long, default_value_t = 0)]
    motion_ms: u64,
}

impl Args {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                EngineConfig::from_json(&json)?
            }
            None => EngineConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(types) = self.types {
            config.type_count = types;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.clear_on_deadlock {
            config.clear_on_deadlock = true;
        }
        Ok(config)
    }
}

struct Session {
    args: Args,
    config: EngineConfig,
    log: EventLog,
    game: Cascade,
}

impl Session {
    fn new(args: Args) -> Result<Self> {
        let config = args.engine_config()?;
        let log = EventLog::new();
        let game = Self::build(&args, config.clone(), &log)?;
        Ok(Self { args, config, log, game })
    }

    fn build(args: &Args, config: EngineConfig, log: &EventLog) -> Result<Cascade> {
        let mut collaborators = Collaborators::default()
            .with_effects(log.clone())
            .with_events(log.clone());
        if args.motion_ms > 0 {
            collaborators = collaborators.with_motion(TimedMotion::new(Duration::from_millis(args.motion_ms)));
        }
        Ok(Cascade::new(config, collaborators)?)
    }

    /// Run one command; returns `false` on quit.
    async fn execute(&mut self, line: &str, out: &mut impl Write) -> Result<bool> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            return Ok(true);
        };

        match command {
            "init" => {
                let [width, height] = numbers::<usize, 2>(rest)?;
                let config = EngineConfig {
                    width,
                    height,
                    ..self.config.clone()
                };
                self.game = Self::build(&self.args, config.clone(), &self.log)?;
                self.config = config;
                writeln!(out, "ok {}", self.game.dimensions())?;
            }
            "populate" => {
                let allow = match rest.first() {
                    Some(word) => word.parse::<bool>().context("expected true or false")?,
                    None => false,
                };
                let report = self.game.populate(allow).await?;
                writeln!(out, "{}", serde_json::to_string(&report)?)?;
            }
            "swap" => {
                let [x1, y1, x2, y2] = numbers::<i32, 4>(rest)?;
                let outcome = self.game.try_swap(Position::new(x1, y1), Position::new(x2, y2)).await?;
                match &outcome {
                    SwapOutcome::Rejected(reason) => writeln!(out, "rejected {reason:?}")?,
                    SwapOutcome::Reverted { cascaded } => writeln!(out, "reverted cascaded={cascaded}")?,
                    SwapOutcome::Matched(report) => writeln!(out, "matched {}", serde_json::to_string(report)?)?,
                }
            }
            "stabilize" => {
                let report = self.game.stabilize().await?;
                writeln!(out, "{}", serde_json::to_string(&report)?)?;
            }
            "reset" => {
                self.game.reset()?;
                writeln!(out, "ok")?;
            }
            "set" => {
                let [x, y, colour] = numbers::<i32, 3>(rest)?;
                let colour = u8::try_from(colour).context("colour out of range")?;
                self.game.set_colour(Position::new(x, y), colour)?;
                writeln!(out, "ok")?;
            }
            "show" => write!(out, "{}", self.game.board())?,
            "json" => writeln!(out, "{}", serde_json::to_string(&self.game.board().snapshot())?)?,
            "moves" => writeln!(out, "{}", serde_json::to_string(&self.game.available_moves())?)?,
            "hint" => match self.game.hint().and_then(|id| self.game.board().token(id)) {
                Some(token) => writeln!(out, "{} at {}", token.id(), token.position())?,
                None => writeln!(out, "none")?,
            },
            "score" => writeln!(
                out,
                "{} x{}",
                self.game.score(),
                self.game.scoring().multiplier()
            )?,
            "events" => writeln!(out, "{}", serde_json::to_string(&self.log.drain())?)?,
            "quit" | "exit" => return Ok(false),
            other => bail!("unknown command '{other}'"),
        }
        Ok(true)
    }
}

fn numbers<T: std::str::FromStr, const N: usize>(words: &[&str]) -> Result<[T; N]> {
    if words.len() != N {
        bail!("expected {N} numbers, got {}", words.len());
    }
    let mut parsed = Vec::with_capacity(N);
    for word in words {
        match word.parse::<T>() {
            Ok(value) => parsed.push(value),
            Err(_) => bail!("'{word}' is not a number"),
        }
    }
    parsed
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected {N} numbers"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut session = Session::new(Args::parse())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in io::stdin().lock().lines() {
        let line = line?;
        match session.execute(&line, &mut out).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => writeln!(out, "error: {err:#}")?,
        }
        out.flush()?;
    }
    Ok(())
}
