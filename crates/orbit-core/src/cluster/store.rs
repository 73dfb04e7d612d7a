//! Canonical node list, reconciled against the host's project list.
//!
//! Reconciliation refreshes host-owned fields (name, percent, category) and
//! never touches position or velocity of a node that already exists. New
//! projects spawn near their anchor with a little jitter so freshly added
//! nodes never sit exactly on top of one another.

use std::collections::{HashMap, HashSet};

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use super::anchor::AnchorRegistry;
use super::geometry::Point;
use super::node::{sanitize_percent, Node, ProjectInput};
use super::physics::Viewport;

/// Hard ceiling on spawn jitter, whatever the viewport.
const MAX_JITTER: f64 = 1.0e6;

/// How new nodes are placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Max offset from the anchor centre on each axis.
    pub jitter: f64,
    /// Seed for the jitter RNG (None = random)
    pub seed: Option<u64>,
    /// Capture radius for categories that do not carry one.
    pub anchor_radius: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            jitter: 45.0,
            seed: None,
            anchor_radius: 120.0,
        }
    }
}

/// What a reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub spawned: Vec<String>,
    pub updated: usize,
    pub removed: Vec<String>,
    /// Project ids that appeared more than once; later copies were ignored.
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SimulationStore {
    nodes: Vec<Node>,
    anchors: AnchorRegistry,
    viewport: Viewport,
    jitter: f64,
    rng: Mcg128Xsl64,
}

impl SimulationStore {
    pub fn new(spawn: &SpawnConfig, viewport: Viewport) -> Self {
        let rng = match spawn.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        let limit = viewport.width.max(viewport.height).min(MAX_JITTER).max(0.0);
        let jitter = if spawn.jitter.is_finite() {
            spawn.jitter.abs()
        } else {
            0.0
        };
        if jitter > limit {
            tracing::warn!(jitter, limit, "spawn jitter clamped");
        }
        Self {
            nodes: Vec::new(),
            anchors: AnchorRegistry::default(),
            viewport,
            jitter: jitter.min(limit),
            rng,
        }
    }

    /// Current nodes, in project-list order.
    pub fn snapshot(&self) -> &[Node] {
        &self.nodes
    }

    pub fn anchors(&self) -> &AnchorRegistry {
        &self.anchors
    }

    pub fn default_center(&self) -> Point {
        self.viewport.center()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub(crate) fn split_mut(&mut self) -> (&mut [Node], &AnchorRegistry) {
        (&mut self.nodes, &self.anchors)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Merge `projects` into the node list and adopt `anchors`.
    pub fn reconcile(&mut self, projects: &[ProjectInput], anchors: AnchorRegistry) -> ReconcileReport {
        self.anchors = anchors;

        let mut existing: HashMap<String, Node> = self
            .nodes
            .drain(..)
            .map(|node| (node.id.clone(), node))
            .collect();
        let mut seen: HashSet<&str> = HashSet::with_capacity(projects.len());
        let mut report = ReconcileReport::default();

        for project in projects {
            if !seen.insert(project.id.as_str()) {
                tracing::warn!(project_id = %project.id, "duplicate project id ignored");
                report.duplicates.push(project.id.clone());
                continue;
            }
            let node = match existing.remove(&project.id) {
                Some(mut node) => {
                    node.name.clone_from(&project.name);
                    node.percent = sanitize_percent(&project.id, project.percent);
                    node.category_id.clone_from(&project.category_id);
                    report.updated += 1;
                    node
                }
                None => {
                    let node = self.spawn(project);
                    tracing::debug!(node_id = %node.id, x = node.x, y = node.y, "node spawned");
                    report.spawned.push(node.id.clone());
                    node
                }
            };
            self.nodes.push(node);
        }

        report.removed = existing.into_keys().collect();
        report.removed.sort();
        for id in &report.removed {
            tracing::debug!(node_id = %id, "node removed");
        }
        report
    }

    fn spawn(&mut self, project: &ProjectInput) -> Node {
        let center = self
            .anchors
            .lookup(project.category_id.as_deref())
            .map(|a| a.center)
            .unwrap_or_else(|| self.viewport.center());
        let jitter = self.jitter_offset();
        let position = self.confine(center.offset(jitter));
        Node {
            id: project.id.clone(),
            name: project.name.clone(),
            x: position.x,
            y: position.y,
            vx: 0.0,
            vy: 0.0,
            percent: sanitize_percent(&project.id, project.percent),
            category_id: project.category_id.clone(),
        }
    }

    /// Spawn positions start inside the margins, like stepped positions.
    fn confine(&self, p: Point) -> Point {
        let v = &self.viewport;
        Point::new(
            p.x.max(v.min_x()).min(v.max_x()),
            p.y.max(v.min_y()).min(v.max_y()),
        )
    }

    fn jitter_offset(&mut self) -> Point {
        if self.jitter == 0.0 {
            return Point::default();
        }
        Point::new(
            self.rng.gen_range(-self.jitter..=self.jitter),
            self.rng.gen_range(-self.jitter..=self.jitter),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::anchor::Anchor;

    fn store() -> SimulationStore {
        SimulationStore::new(
            &SpawnConfig {
                seed: Some(7),
                ..SpawnConfig::default()
            },
            Viewport::default(),
        )
    }

    fn anchors() -> AnchorRegistry {
        AnchorRegistry::new(vec![Anchor {
            id: "work".into(),
            name: "Work".into(),
            color: "#3b82f6".into(),
            center: Point::new(200.0, 150.0),
            radius: 120.0,
        }])
    }

    fn project(id: &str, percent: f64, category_id: Option<&str>) -> ProjectInput {
        ProjectInput {
            id: id.into(),
            name: format!("Project {id}"),
            percent,
            category_id: category_id.map(String::from),
        }
    }

    #[test]
    fn spawns_near_anchor_or_default_center() {
        let mut store = store();
        let report = store.reconcile(
            &[project("a", 10.0, Some("work")), project("b", 0.0, None)],
            anchors(),
        );
        assert_eq!(report.spawned, vec!["a".to_string(), "b".to_string()]);

        let a = store.get("a").unwrap();
        assert!((a.x - 200.0).abs() <= 45.0 && (a.y - 150.0).abs() <= 45.0);
        let b = store.get("b").unwrap();
        assert!((b.x - 400.0).abs() <= 45.0 && (b.y - 300.0).abs() <= 45.0);
        assert_eq!((a.vx, a.vy), (0.0, 0.0));
    }

    #[test]
    fn dangling_category_spawns_at_default_center() {
        let mut store = store();
        store.reconcile(&[project("a", 0.0, Some("deleted"))], anchors());
        let a = store.get("a").unwrap();
        assert!((a.x - 400.0).abs() <= 45.0 && (a.y - 300.0).abs() <= 45.0);
        assert_eq!(a.category_id.as_deref(), Some("deleted"));
    }

    #[test]
    fn retained_nodes_keep_physics_state() {
        let mut store = store();
        store.reconcile(&[project("a", 10.0, Some("work"))], anchors());
        {
            let node = store.get_mut("a").unwrap();
            node.x = 321.0;
            node.vy = -2.5;
        }
        let report = store.reconcile(&[project("a", 55.0, None)], anchors());
        assert!(report.spawned.is_empty());
        assert_eq!(report.updated, 1);

        let a = store.get("a").unwrap();
        assert_eq!(a.x, 321.0);
        assert_eq!(a.vy, -2.5);
        assert_eq!(a.percent, 55.0);
        assert_eq!(a.category_id, None);
    }

    #[test]
    fn removes_missing_projects() {
        let mut store = store();
        store.reconcile(&[project("a", 0.0, None), project("b", 0.0, None)], anchors());
        let report = store.reconcile(&[project("b", 0.0, None)], anchors());
        assert_eq!(report.removed, vec!["a".to_string()]);
        assert_eq!(store.len(), 1);
        assert!(store.get("a").is_none());
    }

    #[test]
    fn duplicate_ids_never_duplicate_nodes() {
        let mut store = store();
        let report = store.reconcile(
            &[project("a", 10.0, None), project("a", 90.0, None)],
            anchors(),
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().percent, 10.0);
        assert_eq!(report.duplicates, vec!["a".to_string()]);
    }

    #[test]
    fn order_follows_project_list() {
        let mut store = store();
        store.reconcile(&[project("a", 0.0, None), project("b", 0.0, None)], anchors());
        store.reconcile(&[project("b", 0.0, None), project("a", 0.0, None)], anchors());
        let ids: Vec<_> = store.snapshot().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn seeded_spawn_is_reproducible() {
        let mut first = store();
        let mut second = store();
        first.reconcile(&[project("a", 0.0, None)], anchors());
        second.reconcile(&[project("a", 0.0, None)], anchors());
        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn zero_jitter_spawns_on_center() {
        let mut store = SimulationStore::new(
            &SpawnConfig {
                jitter: 0.0,
                ..SpawnConfig::default()
            },
            Viewport::default(),
        );
        store.reconcile(&[project("a", 0.0, Some("work"))], anchors());
        assert_eq!(store.get("a").unwrap().position(), Point::new(200.0, 150.0));
    }

    #[test]
    fn huge_jitter_is_clamped_instead_of_panicking() {
        let mut store = SimulationStore::new(
            &SpawnConfig {
                jitter: 1e308,
                seed: Some(1),
                ..SpawnConfig::default()
            },
            Viewport::default(),
        );
        store.reconcile(
            &[project("a", 0.0, Some("work")), project("b", 0.0, None)],
            anchors(),
        );
        assert_eq!(store.len(), 2);
        for node in store.snapshot() {
            assert!(Viewport::default().contains(node.position()));
        }
    }

    #[test]
    fn spawns_near_the_edge_start_inside_margins() {
        let edge = AnchorRegistry::new(vec![Anchor {
            id: "edge".into(),
            name: "Edge".into(),
            color: "#000".into(),
            center: Point::new(0.0, 600.0),
            radius: 120.0,
        }]);
        let mut store = store();
        store.reconcile(
            &(0..10)
                .map(|i| project(&format!("p{i}"), 0.0, Some("edge")))
                .collect::<Vec<_>>(),
            edge,
        );
        let viewport = Viewport::default();
        for node in store.snapshot() {
            assert!(node.x >= viewport.min_x() && node.x <= viewport.max_x());
            assert!(node.y >= viewport.min_y() && node.y <= viewport.max_y());
        }
    }
}
