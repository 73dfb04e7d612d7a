//! Scenario file commands for CLI.

use std::path::PathBuf;

use clap::Subcommand;
use orbit_core::Scenario;

#[derive(Subcommand)]
pub enum ScenarioAction {
    /// Write a sample scenario (three categories, six projects)
    Init {
        /// Destination file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print a scenario file as normalized JSON
    Show {
        /// Scenario file
        path: PathBuf,
    },
}

pub fn run(action: ScenarioAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScenarioAction::Init { path, force } => {
            if path.exists() && !force {
                return Err(format!("{} already exists (use --force)", path.display()).into());
            }
            let scenario = Scenario::sample();
            scenario.save(&path)?;
            println!(
                "Scenario written: {} ({} categories, {} projects)",
                path.display(),
                scenario.categories.len(),
                scenario.projects.len()
            );
        }
        ScenarioAction::Show { path } => {
            let scenario = Scenario::load(&path)?;
            println!("{}", serde_json::to_string_pretty(&scenario)?);
        }
    }
    Ok(())
}
