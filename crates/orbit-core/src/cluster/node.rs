//! Simulated nodes and the read-only views handed to renderers.

use serde::{Deserialize, Serialize};

use super::anchor::{Anchor, AnchorRegistry};
use super::geometry::Point;

/// Percent at or above which a project counts as complete.
pub const COMPLETE_PERCENT: f64 = 100.0;

/// A project as supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub percent: f64,
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<String>,
}

/// Physical representation of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// 0..=100
    pub percent: f64,
    pub category_id: Option<String>,
}

impl Node {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= COMPLETE_PERCENT
    }

    pub fn speed_sq(&self) -> f64 {
        self.vx * self.vx + self.vy * self.vy
    }
}

/// Clamp a host-supplied percent into 0..=100; non-finite becomes 0.
pub(crate) fn sanitize_percent(project_id: &str, percent: f64) -> f64 {
    if percent.is_finite() {
        percent.clamp(0.0, COMPLETE_PERCENT)
    } else {
        tracing::warn!(project_id, "non-finite project percent, using 0");
        0.0
    }
}

/// Everything a renderer needs to draw one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Fixed display radius; independent of physics.
    pub radius: f64,
    pub percent: f64,
    pub is_complete: bool,
    pub color: String,
    /// The category as the cluster sees it: `None` when unassigned or dangling.
    pub category_id: Option<String>,
    pub dragging: bool,
}

impl NodeView {
    pub fn new(node: &Node, anchors: &AnchorRegistry, radius: f64, dragging: bool) -> Self {
        let anchor = anchors.lookup(node.category_id.as_deref());
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            x: node.x,
            y: node.y,
            radius,
            percent: node.percent,
            is_complete: node.is_complete(),
            color: anchors.color_for(node.category_id.as_deref()).to_string(),
            category_id: anchor.map(|a| a.id.clone()),
            dragging,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorView {
    pub id: String,
    pub name: String,
    pub color: String,
    pub center: Point,
    pub radius: f64,
}

impl From<&Anchor> for AnchorView {
    fn from(anchor: &Anchor) -> Self {
        Self {
            id: anchor.id.clone(),
            name: anchor.name.clone(),
            color: anchor.color.clone(),
            center: anchor.center,
            radius: anchor.radius,
        }
    }
}

/// Plain-data picture of the cluster for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub frame: u64,
    pub anchors: Vec<AnchorView>,
    pub nodes: Vec<NodeView>,
    pub dragging: Option<String>,
}
