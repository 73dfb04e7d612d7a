//! Cluster engine.
//!
//! The single owner of the simulation. Frame ticks and gesture handlers
//! both go through `&mut ClusterEngine`, so their writes to the node list
//! are serialized by construction. There is no internal thread: the caller
//! invokes `tick()` once per animation frame.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = ClusterEngine::new(ClusterSettings::default())?;
//! engine.submit(categories, projects);
//! // Each frame:
//! engine.tick();
//! draw(engine.snapshot());
//! // Gestures:
//! engine.begin_drag("project-1");
//! engine.update_drag(translation);
//! engine.end_drag(&mut |project_id, category_id| save(project_id, category_id));
//! ```

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::anchor::{AnchorRegistry, Category};
use super::geometry::Point;
use super::interaction::{DragController, DragPolicy, DragRelease, DragState};
use super::node::{AnchorView, ClusterSnapshot, Node, NodeView, ProjectInput};
use super::physics::{self, PhysicsParams, StepReport};
use super::store::{ReconcileReport, SimulationStore, SpawnConfig};
use crate::error::ValidationError;
use crate::events::Event;

/// Undrained events beyond this are dropped, oldest first.
const MAX_QUEUED_EVENTS: usize = 1024;

/// Receives category reassignments produced by drag-and-drop.
pub trait CategoryChangeListener {
    fn on_project_category_change(&mut self, project_id: &str, category_id: Option<&str>);
}

impl<F> CategoryChangeListener for F
where
    F: FnMut(&str, Option<&str>),
{
    fn on_project_category_change(&mut self, project_id: &str, category_id: Option<&str>) {
        self(project_id, category_id)
    }
}

/// Everything needed to build an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSettings {
    pub physics: PhysicsParams,
    pub spawn: SpawnConfig,
    pub drag_policy: DragPolicy,
    /// Zero the node's velocity when a drag ends so it does not fling.
    pub reset_velocity_on_release: bool,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            physics: PhysicsParams::default(),
            spawn: SpawnConfig::default(),
            drag_policy: DragPolicy::default(),
            reset_velocity_on_release: true,
        }
    }
}

impl ClusterSettings {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.spawn.seed = Some(seed);
        self
    }

    pub fn with_drag_policy(mut self, policy: DragPolicy) -> Self {
        self.drag_policy = policy;
        self
    }
}

#[derive(Debug, Clone)]
struct PendingInputs {
    categories: Vec<Category>,
    projects: Vec<ProjectInput>,
}

#[derive(Debug, Clone)]
pub struct ClusterEngine {
    params: PhysicsParams,
    drag_policy: DragPolicy,
    default_anchor_radius: f64,
    store: SimulationStore,
    drag: DragController,
    pending: Option<PendingInputs>,
    events: VecDeque<Event>,
    frame: u64,
    torn_down: bool,
}

impl ClusterEngine {
    /// Build an engine, rejecting an unusable parameter table.
    pub fn new(settings: ClusterSettings) -> Result<Self, ValidationError> {
        settings.physics.validate()?;
        let store = SimulationStore::new(&settings.spawn, settings.physics.viewport);
        Ok(Self {
            params: settings.physics,
            drag_policy: settings.drag_policy,
            default_anchor_radius: settings.spawn.anchor_radius,
            store,
            drag: DragController::new(settings.reset_velocity_on_release),
            pending: None,
            events: VecDeque::new(),
            frame: 0,
            torn_down: false,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn drag_policy(&self) -> DragPolicy {
        self.drag_policy
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn nodes(&self) -> &[Node] {
        self.store.snapshot()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.store.get(id)
    }

    pub fn anchors(&self) -> &AnchorRegistry {
        self.store.anchors()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn dragged_id(&self) -> Option<&str> {
        self.drag.dragged_id()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn has_pending_inputs(&self) -> bool {
        self.pending.is_some()
    }

    /// Topmost node whose disc contains `point`; the nearest centre wins,
    /// later (drawn-on-top) nodes win ties.
    pub fn node_at(&self, point: Point) -> Option<&Node> {
        if !point.is_finite() {
            return None;
        }
        let radius = self.params.node_radius;
        let mut best: Option<(&Node, f64)> = None;
        for node in self.store.snapshot() {
            let distance = node.position().distance(point);
            if distance > radius {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance > best_distance => {}
                _ => best = Some((node, distance)),
            }
        }
        best.map(|(node, _)| node)
    }

    /// Plain-data view for the renderer.
    pub fn snapshot(&self) -> ClusterSnapshot {
        let anchors = self.store.anchors();
        let dragged = self.drag.dragged_id();
        ClusterSnapshot {
            frame: self.frame,
            anchors: anchors.anchors().iter().map(AnchorView::from).collect(),
            nodes: self
                .store
                .snapshot()
                .iter()
                .map(|node| {
                    NodeView::new(
                        node,
                        anchors,
                        self.params.node_radius,
                        dragged == Some(node.id.as_str()),
                    )
                })
                .collect(),
            dragging: dragged.map(String::from),
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    fn emit(&mut self, event: Event) {
        if self.events.len() == MAX_QUEUED_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    // ── Inputs ───────────────────────────────────────────────────────

    /// Queue new host data. It is merged at the start of the next `tick()`,
    /// before that frame's physics reads the node list.
    pub fn submit(&mut self, categories: Vec<Category>, projects: Vec<ProjectInput>) {
        if self.torn_down {
            return;
        }
        self.pending = Some(PendingInputs {
            categories,
            projects,
        });
    }

    /// Merge host data immediately.
    pub fn reconcile(&mut self, categories: &[Category], projects: &[ProjectInput]) -> ReconcileReport {
        if self.torn_down {
            return ReconcileReport::default();
        }
        let anchors = AnchorRegistry::from_categories(
            categories,
            self.default_anchor_radius,
            self.store.default_center(),
        );
        let report = self.store.reconcile(projects, anchors);

        let at = Utc::now();
        for id in &report.spawned {
            let Some(position) = self.store.get(id).map(Node::position) else {
                continue;
            };
            self.emit(Event::NodeSpawned {
                node_id: id.clone(),
                x: position.x,
                y: position.y,
                at,
            });
        }
        for id in &report.removed {
            self.emit(Event::NodeRemoved {
                node_id: id.clone(),
                at,
            });
        }
        if let Some(node_id) = self.drag.forget_missing(&self.store) {
            tracing::debug!(%node_id, "dragged node removed, drag cancelled");
            self.emit(Event::DragCancelled { node_id, at });
        }
        report
    }

    // ── Frame ────────────────────────────────────────────────────────

    /// Run one animation frame: apply queued inputs, then step physics.
    pub fn tick(&mut self) -> StepReport {
        if self.torn_down {
            return StepReport::skipped();
        }
        if let Some(pending) = self.pending.take() {
            self.reconcile(&pending.categories, &pending.projects);
        }
        self.frame += 1;

        let held = self.drag.dragged_id().map(String::from);
        if held.is_some() && self.drag_policy == DragPolicy::PauseAll {
            return StepReport::skipped();
        }
        let (nodes, anchors) = self.store.split_mut();
        physics::step(nodes, anchors, &self.params, held.as_deref())
    }

    // ── Gestures ─────────────────────────────────────────────────────

    /// Idle -> Dragging on `node_id`.
    pub fn begin_drag(&mut self, node_id: &str) -> Option<Event> {
        if self.torn_down {
            return None;
        }
        let session = self.drag.begin(&self.store, node_id)?;
        tracing::debug!(node_id, "drag started");
        let event = Event::DragStarted {
            node_id: session.node_id.clone(),
            x: session.grab_offset.x,
            y: session.grab_offset.y,
            at: Utc::now(),
        };
        self.emit(event.clone());
        Some(event)
    }

    /// Start dragging whatever node is under `point`.
    pub fn begin_drag_at(&mut self, point: Point) -> Option<Event> {
        let node_id = self.node_at(point)?.id.clone();
        self.begin_drag(&node_id)
    }

    /// Position the dragged node at its grab point plus `translation`.
    pub fn update_drag(&mut self, translation: Point) -> Option<Point> {
        if self.torn_down {
            return None;
        }
        self.drag.update(&mut self.store, translation)
    }

    /// Dragging -> Idle. Resolves the drop and notifies `listener` exactly
    /// once if the category changed.
    pub fn end_drag<L>(&mut self, listener: &mut L) -> Option<DragRelease>
    where
        L: CategoryChangeListener + ?Sized,
    {
        if self.torn_down {
            return None;
        }
        let release = self.drag.end(&mut self.store)?;
        let at = Utc::now();
        tracing::debug!(node_id = %release.node_id, to = ?release.to, "drag ended");
        self.emit(Event::DragEnded {
            node_id: release.node_id.clone(),
            x: release.position.x,
            y: release.position.y,
            category_id: release.to.clone(),
            at,
        });
        if release.changed() {
            tracing::info!(
                project_id = %release.node_id,
                from = ?release.from,
                to = ?release.to,
                "project category changed"
            );
            listener.on_project_category_change(&release.node_id, release.to.as_deref());
            self.emit(Event::CategoryChanged {
                project_id: release.node_id.clone(),
                from: release.from.clone(),
                to: release.to.clone(),
                at,
            });
        }
        Some(release)
    }

    /// Abort the drag without reassigning.
    pub fn cancel_drag(&mut self) -> Option<Event> {
        let node_id = self.drag.cancel(&mut self.store)?;
        tracing::debug!(%node_id, "drag cancelled");
        let event = Event::DragCancelled {
            node_id,
            at: Utc::now(),
        };
        self.emit(event.clone());
        Some(event)
    }

    /// Stop the simulation for good. Pending inputs and any drag are abandoned.
    pub fn teardown(&mut self) -> Option<Event> {
        if self.torn_down {
            return None;
        }
        self.pending = None;
        self.drag.cancel(&mut self.store);
        self.torn_down = true;
        tracing::info!(frame = self.frame, "cluster torn down");
        let event = Event::TornDown { at: Utc::now() };
        self.emit(event.clone());
        Some(event)
    }
}
