use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use dragline::common::config::{config_file, Config};
use dragline::common::log;
use dragline::engine::geometry::{Point, Size};
use dragline::replay::{self, Record, ReplayOutcome, Scene, SceneZone, TraceEvent};

#[derive(Parser)]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable the settle animation.
    #[arg(long)]
    no_animate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded interaction trace and report the drops.
    Replay {
        trace: PathBuf,

        /// Print drop reports as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run a built-in scripted drag scenario.
    Demo {
        /// Use horizontal lists instead of vertical ones.
        #[arg(long)]
        horizontal: bool,

        /// Also write the scenario to a trace file.
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,
    },
    /// Validate the configuration file.
    Validate,
}

fn main() -> anyhow::Result<()> {
    log::init_logging();
    let opt = Cli::parse();

    let config_path = opt.config.clone().unwrap_or_else(config_file);
    let mut config = if config_path.exists() {
        Config::read(&config_path)?
    } else {
        Config::default()
    };
    config.settings.animate &= !opt.no_animate;

    match opt.command {
        Commands::Validate => {
            let issues = config.validate();
            if issues.is_empty() {
                println!("Config validation passed");
            } else {
                for issue in issues {
                    eprintln!("{issue}");
                }
                process::exit(1);
            }
        }
        Commands::Replay { trace, json } => {
            let (scene, events) = replay::load(&trace)?;
            let outcome = replay::run(&scene, &events, &config.settings)?;
            report(&outcome, json)?;
        }
        Commands::Demo { horizontal, save } => {
            let (scene, events) = demo_trace(!horizontal);
            if let Some(path) = save {
                let mut record = Record::create(&path, &scene)?;
                for event in &events {
                    record.on_event(event)?;
                }
            }
            let outcome = replay::run(&scene, &events, &config.settings)?;
            report(&outcome, false)?;
        }
    }
    Ok(())
}

fn report(outcome: &ReplayOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.reports)?);
        return Ok(());
    }
    if outcome.reports.is_empty() {
        println!("no drops committed");
    }
    for drop in &outcome.reports {
        println!("item {} dropped into zone {} at index {}", drop.item, drop.zone, drop.idx);
    }
    for (idx, zone) in outcome.final_order.iter().enumerate() {
        println!("zone {idx}: [{}]", zone.join(", "));
    }
    Ok(())
}

/// Two lists, two drags: first a reorder within the first list, then a
/// transfer into the second one.
fn demo_trace(vertical: bool) -> (Scene, Vec<TraceEvent>) {
    let item = if vertical { Size::new(100.0, 20.0) } else { Size::new(20.0, 100.0) };
    let scene = Scene {
        vertical,
        scroll: Point::ZERO,
        zones: vec![
            SceneZone { items: vec![item; 3], text_gaps: false },
            SceneZone { items: vec![item], text_gaps: false },
        ],
    };

    let (grab, reorder_to, transfer_to) = if vertical {
        (Point::new(50.0, 10.0), Point::new(50.0, 45.0), Point::new(150.0, 5.0))
    } else {
        (Point::new(10.0, 50.0), Point::new(45.0, 50.0), Point::new(5.0, 150.0))
    };

    let events = vec![
        TraceEvent::Down { zone: 0, item: 0, grab },
        TraceEvent::Move { pos: reorder_to },
        TraceEvent::Up { pos: reorder_to },
        TraceEvent::Advance { ms: 1000 },
        TraceEvent::Down { zone: 0, item: 0, grab },
        TraceEvent::Move { pos: transfer_to },
        TraceEvent::Up { pos: transfer_to },
        TraceEvent::Advance { ms: 1000 },
    ];
    (scene, events)
}
