//! Headless cluster commands for CLI.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use orbit_core::{resolve_category, ClusterEngine, Config, Point, Scenario, ScenarioError};
use serde::Serialize;

/// Kinetic energy below which `run --until-settled` stops early.
const SETTLE_THRESHOLD: f64 = 1e-3;

#[derive(Subcommand)]
pub enum ClusterAction {
    /// Reconcile a scenario, step the simulation and print the snapshot
    Run {
        /// Scenario file
        scenario: PathBuf,
        /// Number of frames to simulate
        #[arg(long, default_value_t = 300)]
        frames: u64,
        /// Seed for spawn jitter
        #[arg(long)]
        seed: Option<u64>,
        /// Stop as soon as the cluster comes to rest
        #[arg(long)]
        until_settled: bool,
    },
    /// Print which category a drop at (x, y) would resolve to
    Resolve {
        /// Scenario file
        scenario: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },
    /// Drag a project's node to (x, y) and report the reassignment
    Drop {
        /// Scenario file
        scenario: PathBuf,
        /// Project id to drag
        #[arg(long)]
        project: String,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        /// Frames to settle before the drag
        #[arg(long, default_value_t = 120)]
        frames: u64,
        /// Seed for spawn jitter
        #[arg(long)]
        seed: Option<u64>,
        /// Persist the new category back to the scenario file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Serialize)]
struct DropReport {
    project_id: String,
    x: f64,
    y: f64,
    from: Option<String>,
    to: Option<String>,
    changed: bool,
    written: bool,
}

pub fn run(action: ClusterAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ClusterAction::Run {
            scenario,
            frames,
            seed,
            until_settled,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let mut engine = build_engine(&scenario, seed)?;
            for _ in 0..frames {
                let report = engine.tick();
                if until_settled && report.is_settled(SETTLE_THRESHOLD) {
                    break;
                }
            }
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        ClusterAction::Resolve { scenario, x, y } => {
            let scenario = Scenario::load(&scenario)?;
            let mut engine = ClusterEngine::new(Config::load_or_default().cluster_settings()?)?;
            engine.reconcile(&scenario.categories, &[]);
            let category = resolve_category(Point::new(x, y), engine.anchors());
            println!("{}", serde_json::to_string(&category)?);
        }
        ClusterAction::Drop {
            scenario: path,
            project,
            x,
            y,
            frames,
            seed,
            write,
        } => {
            let report = drop_project(&path, &project, Point::new(x, y), frames, seed, write)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn build_engine(
    scenario: &Scenario,
    seed: Option<u64>,
) -> Result<ClusterEngine, Box<dyn std::error::Error>> {
    let mut settings = Config::load_or_default().cluster_settings()?;
    if let Some(seed) = seed {
        settings = settings.with_seed(seed);
    }
    let mut engine = ClusterEngine::new(settings)?;
    let report = engine.reconcile(&scenario.categories, &scenario.projects);
    if !report.duplicates.is_empty() {
        tracing::warn!(duplicates = ?report.duplicates, "scenario has duplicate project ids");
    }
    Ok(engine)
}

fn drop_project(
    path: &Path,
    project_id: &str,
    target: Point,
    frames: u64,
    seed: Option<u64>,
    write: bool,
) -> Result<DropReport, Box<dyn std::error::Error>> {
    let mut scenario = Scenario::load(path)?;
    let mut engine = build_engine(&scenario, seed)?;
    for _ in 0..frames {
        engine.tick();
    }

    if engine.begin_drag(project_id).is_none() {
        return Err(ScenarioError::UnknownProject(project_id.to_string()).into());
    }
    let grab = engine
        .node(project_id)
        .map(|n| n.position())
        .ok_or_else(|| ScenarioError::UnknownProject(project_id.to_string()))?;
    engine.update_drag(Point::new(target.x - grab.x, target.y - grab.y));

    let mut reassigned: Option<Option<String>> = None;
    let release = engine
        .end_drag(&mut |_: &str, category_id: Option<&str>| {
            reassigned = Some(category_id.map(String::from));
        })
        .ok_or("drag did not complete")?;

    let written = match (&reassigned, write) {
        (Some(category_id), true) => {
            scenario.assign(project_id, category_id.as_deref())?;
            scenario.save(path)?;
            true
        }
        _ => false,
    };

    Ok(DropReport {
        project_id: release.node_id.clone(),
        x: release.position.x,
        y: release.position.y,
        changed: release.changed(),
        from: release.from,
        to: release.to,
        written,
    })
}
