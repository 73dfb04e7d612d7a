//! Category/project lists stored as JSON.
//!
//! A scenario is the host data the cluster consumes: it lets the CLI (or a
//! test) stand in for the project-management side, including persisting a
//! category reassignment after a drop.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::{Category, Point, ProjectInput};
use crate::error::ScenarioError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub projects: Vec<ProjectInput>,
}

impl Scenario {
    /// Import scenario from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Export scenario to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ScenarioError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ScenarioError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Record a category change for `project_id`.
    pub fn assign(
        &mut self,
        project_id: &str,
        category_id: Option<&str>,
    ) -> Result<(), ScenarioError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| ScenarioError::UnknownProject(project_id.to_string()))?;
        project.category_id = category_id.map(String::from);
        Ok(())
    }

    /// A small board: three categories across an 800x600 viewport.
    pub fn sample() -> Self {
        let category = |id: &str, name: &str, color: &str, x: f64, y: f64| Category {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            center: Point::new(x, y),
            radius: None,
        };
        let project = |id: &str, name: &str, percent: f64, category_id: Option<&str>| ProjectInput {
            id: id.into(),
            name: name.into(),
            percent,
            category_id: category_id.map(String::from),
        };
        Self {
            categories: vec![
                category("work", "Work", "#3b82f6", 200.0, 200.0),
                category("study", "Study", "#22c55e", 600.0, 200.0),
                category("health", "Health", "#f97316", 400.0, 450.0),
            ],
            projects: vec![
                project("thesis", "Thesis draft", 35.0, Some("study")),
                project("reading", "Reading list", 80.0, Some("study")),
                project("launch", "Product launch", 100.0, Some("work")),
                project("reviews", "Code reviews", 10.0, Some("work")),
                project("running", "Half marathon", 55.0, Some("health")),
                project("inbox", "Inbox zero", 0.0, None),
            ],
        }
    }
}
