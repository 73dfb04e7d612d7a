//! Maps a drop point to the category it lands in.

use super::anchor::{Anchor, AnchorRegistry};
use super::geometry::Point;

/// Nearest anchor whose capture radius strictly contains `point`.
///
/// Ties go to the anchor listed first: only a strictly smaller distance
/// replaces the current best.
pub fn resolve_anchor(point: Point, anchors: &AnchorRegistry) -> Option<&Anchor> {
    if !point.is_finite() {
        return None;
    }
    let mut best: Option<(&Anchor, f64)> = None;
    for anchor in anchors.anchors() {
        let distance = point.distance(anchor.center);
        if distance >= anchor.radius {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((anchor, distance)),
        }
    }
    best.map(|(anchor, _)| anchor)
}

/// Category id for a drop at `point`, or `None` for unassigned.
pub fn resolve_category(point: Point, anchors: &AnchorRegistry) -> Option<String> {
    resolve_anchor(point, anchors).map(|a| a.id.clone())
}
