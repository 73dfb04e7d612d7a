use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in the cluster produces an Event.
/// Hosts drain them after each frame or gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A project appeared and got a node.
    NodeSpawned {
        node_id: String,
        x: f64,
        y: f64,
        at: DateTime<Utc>,
    },
    /// A project disappeared from the host list.
    NodeRemoved {
        node_id: String,
        at: DateTime<Utc>,
    },
    DragStarted {
        node_id: String,
        x: f64,
        y: f64,
        at: DateTime<Utc>,
    },
    /// Drag released; `category_id` is the category the drop resolved to.
    DragEnded {
        node_id: String,
        x: f64,
        y: f64,
        category_id: Option<String>,
        at: DateTime<Utc>,
    },
    /// Gesture cancelled, or the dragged project was removed mid-drag.
    DragCancelled {
        node_id: String,
        at: DateTime<Utc>,
    },
    /// A drop moved a project to a different category.
    CategoryChanged {
        project_id: String,
        from: Option<String>,
        to: Option<String>,
        at: DateTime<Utc>,
    },
    /// The visualization was torn down; no further frames run.
    TornDown {
        at: DateTime<Utc>,
    },
}
