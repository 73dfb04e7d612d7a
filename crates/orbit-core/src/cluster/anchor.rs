//! Category anchors.
//!
//! Categories arrive from the host each render pass; the registry turns them
//! into anchors with a sanitized centre and a capture radius. Anchors are
//! immutable between reconciliations.

use serde::{Deserialize, Serialize};

use super::geometry::Point;

/// Colour used for nodes with no (or a dangling) category.
pub const NEUTRAL_COLOR: &str = "#9ca3af";

/// A category as supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Opaque colour token, passed through to the renderer untouched.
    pub color: String,
    pub center: Point,
    /// Capture radius. Falls back to the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// A fixed attraction point representing one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: String,
    pub name: String,
    pub color: String,
    pub center: Point,
    pub radius: f64,
}

/// Ordered list of anchors. Order matters: it breaks resolver ties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorRegistry {
    anchors: Vec<Anchor>,
}

impl AnchorRegistry {
    pub fn new(anchors: Vec<Anchor>) -> Self {
        Self { anchors }
    }

    /// Build anchors from host categories.
    ///
    /// A non-finite centre is replaced by `fallback_center`; a missing,
    /// negative or non-finite radius by `default_radius`.
    pub fn from_categories(
        categories: &[Category],
        default_radius: f64,
        fallback_center: Point,
    ) -> Self {
        let anchors = categories
            .iter()
            .map(|category| {
                if !category.center.is_finite() {
                    tracing::warn!(
                        category_id = %category.id,
                        "non-finite anchor center, using default center"
                    );
                }
                let radius = category
                    .radius
                    .filter(|r| r.is_finite() && *r >= 0.0)
                    .unwrap_or(default_radius);
                Anchor {
                    id: category.id.clone(),
                    name: category.name.clone(),
                    color: category.color.clone(),
                    center: category.center.or_if_non_finite(fallback_center),
                    radius,
                }
            })
            .collect();
        Self { anchors }
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// First anchor with the given id.
    pub fn get(&self, id: &str) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.id == id)
    }

    /// Resolve an optional category reference. Dangling ids resolve to `None`.
    pub fn lookup(&self, category_id: Option<&str>) -> Option<&Anchor> {
        category_id.and_then(|id| self.get(id))
    }

    /// Anchor colour, or [`NEUTRAL_COLOR`] for unassigned/dangling references.
    pub fn color_for(&self, category_id: Option<&str>) -> &str {
        self.lookup(category_id)
            .map(|a| a.color.as_str())
            .unwrap_or(NEUTRAL_COLOR)
    }
}
