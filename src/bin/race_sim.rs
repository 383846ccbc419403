use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use grand_prix::race_engine::StopReason;
use grand_prix::{
    default_roster, EntrantSpec, RaceConfig, RaceEngine, RaceEvent, RaceResult, RaceStatus,
};
use serde::{Deserialize, Serialize};

/// Run a race headlessly at a fixed frame rate and print the outcome.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON file with `config` and `entrants`
    #[arg(long)]
    config: Option<PathBuf>,
    /// Generated roster size when the file has no entrants
    #[arg(long, default_value_t = 6)]
    entrants: usize,
    #[arg(long)]
    duration: Option<f32>,
    #[arg(long)]
    chaos: Option<f32>,
    #[arg(long)]
    catch_up: Option<f32>,
    #[arg(long)]
    lead_phases: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    /// Print every engine event as it is drained
    #[arg(long)]
    events: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RaceFile {
    #[serde(default)]
    config: RaceConfig,
    #[serde(default)]
    entrants: Vec<EntrantSpec>,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    seed: Option<u64>,
    frames: u64,
    scheduled_frames: u32,
    winner: Option<String>,
    podium: Vec<String>,
    stop_reason: Option<StopReason>,
    lead_changes: usize,
    results: Vec<RaceResult>,
}

fn load_race_file(cli: &Cli) -> Result<RaceFile> {
    let mut file = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(raw.trim_start_matches('\u{feff}'))
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => RaceFile::default(),
    };

    if let Some(duration) = cli.duration {
        file.config.duration_seconds = duration;
    }
    if let Some(chaos) = cli.chaos {
        file.config.chaos = chaos;
    }
    if let Some(catch_up) = cli.catch_up {
        file.config.catch_up = catch_up;
    }
    if let Some(k) = cli.lead_phases {
        file.config.lead_phase_count = Some(k);
    }
    if file.entrants.is_empty() {
        file.entrants = default_roster(cli.entrants);
    }
    file.config = file.config.sanitized();
    Ok(file)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let file = load_race_file(&cli)?;

    let mut engine = match cli.seed {
        Some(seed) => RaceEngine::with_seed(seed),
        None => RaceEngine::new(),
    };
    let delta = 1.0 / file.config.fps;
    let scheduled_frames = file.config.total_frames();
    engine.start(file.config, &file.entrants)?;

    let mut lead_changes = 0;
    loop {
        engine.tick(delta);
        for event in engine.drain_events() {
            if matches!(event, RaceEvent::LeaderChanged { .. }) {
                lead_changes += 1;
            }
            if cli.events {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        if engine.status() == RaceStatus::Finished {
            break;
        }
    }

    let race = engine.race().context("race vanished before finishing")?;
    let summary = RunSummary {
        seed: cli.seed,
        frames: race.frame,
        scheduled_frames,
        winner: race.winner().map(str::to_owned),
        podium: race.podium(),
        stop_reason: race.stop_reason,
        lead_changes,
        results: race.results(),
    };
    log::info!(
        "Finished in {} of {} scheduled frames",
        summary.frames,
        summary.scheduled_frames
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
