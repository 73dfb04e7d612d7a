//! Drag interaction state machine.
//!
//! ```text
//! Idle -> Dragging -> Idle
//! ```
//!
//! While a session is active the controller alone writes the dragged node's
//! position. Ending the session resolves the drop point to a category and
//! hands the node back to the physics stepper. Invalid transitions (begin
//! while dragging, update or end while idle) return `None` and change nothing.

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use super::resolver::resolve_category;
use super::store::SimulationStore;

/// What the stepper does while a drag is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPolicy {
    /// Skip the whole step so the cluster holds still under the pointer.
    #[default]
    PauseAll,
    /// Keep simulating every node except the dragged one.
    FreezeDragged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragState {
    Idle,
    Dragging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    pub node_id: String,
    /// Node position when the gesture started; translations are relative to it.
    pub grab_offset: Point,
}

/// Result of a finished drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragRelease {
    pub node_id: String,
    pub position: Point,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DragRelease {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone)]
pub struct DragController {
    session: Option<DragSession>,
    reset_velocity_on_release: bool,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DragController {
    pub fn new(reset_velocity_on_release: bool) -> Self {
        Self {
            session: None,
            reset_velocity_on_release,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> DragState {
        if self.session.is_some() {
            DragState::Dragging
        } else {
            DragState::Idle
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn dragged_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.node_id.as_str())
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Idle -> Dragging. Takes ownership of `node_id`.
    pub fn begin(&mut self, store: &SimulationStore, node_id: &str) -> Option<&DragSession> {
        if self.session.is_some() {
            return None;
        }
        let node = store.get(node_id)?;
        self.session = Some(DragSession {
            node_id: node.id.clone(),
            grab_offset: node.position(),
        });
        self.session.as_ref()
    }

    /// Move the dragged node to `grab_offset + translation`. Velocity is left alone.
    pub fn update(&mut self, store: &mut SimulationStore, translation: Point) -> Option<Point> {
        let session = self.session.as_ref()?;
        if !translation.is_finite() {
            tracing::warn!(node_id = %session.node_id, "non-finite drag translation ignored");
            return None;
        }
        let position = session.grab_offset.offset(translation);
        let node = store.get_mut(&session.node_id)?;
        node.set_position(position);
        Some(position)
    }

    /// Dragging -> Idle, resolving the drop point to a category.
    ///
    /// The node's category is updated in place when the resolved category
    /// differs from the one it had.
    pub fn end(&mut self, store: &mut SimulationStore) -> Option<DragRelease> {
        let session = self.session.take()?;
        let position = store.get(&session.node_id)?.position();
        let to = resolve_category(position, store.anchors());
        let reset = self.reset_velocity_on_release;

        let node = store.get_mut(&session.node_id)?;
        let from = node.category_id.clone();
        if from != to {
            node.category_id.clone_from(&to);
        }
        if reset {
            node.vx = 0.0;
            node.vy = 0.0;
        }
        Some(DragRelease {
            node_id: session.node_id,
            position,
            from,
            to,
        })
    }

    /// Dragging -> Idle without resolving a category.
    pub fn cancel(&mut self, store: &mut SimulationStore) -> Option<String> {
        let session = self.session.take()?;
        if self.reset_velocity_on_release {
            if let Some(node) = store.get_mut(&session.node_id) {
                node.vx = 0.0;
                node.vy = 0.0;
            }
        }
        Some(session.node_id)
    }

    /// Drop the session if its node no longer exists.
    pub(crate) fn forget_missing(&mut self, store: &SimulationStore) -> Option<String> {
        let missing = self
            .session
            .as_ref()
            .is_some_and(|s| store.get(&s.node_id).is_none());
        if missing {
            self.session.take().map(|s| s.node_id)
        } else {
            None
        }
    }
}
