//! Per-frame force integrator.
//!
//! Each step accumulates, for every node the stepper owns:
//!
//! 1. attraction towards the node's anchor, scaled by `1 + distance / distance_scale`
//!    so far-away nodes are pulled back harder;
//! 2. pairwise repulsion from every node closer than `2 * node_radius + padding`;
//!
//! then integrates velocity with friction and clamps the result into the
//! viewport with an inelastic bounce.
//!
//! Forces are computed from the positions at the start of the step, so the
//! result does not depend on node order. Repulsion is O(n²), which is fine
//! for the few dozen nodes a cluster shows.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::anchor::AnchorRegistry;
use super::geometry::Point;
use super::node::Node;
use crate::error::ValidationError;

const GOLDEN_RATIO_FRACTION: f64 = 0.618_033_988_749_895;

/// Drawable area nodes are confined to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Viewport {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_x(&self) -> f64 {
        self.margin
    }

    pub fn max_x(&self) -> f64 {
        self.width - self.margin
    }

    pub fn min_y(&self) -> f64 {
        self.margin
    }

    pub fn max_y(&self) -> f64 {
        self.height - self.margin
    }

    pub fn contains(&self, p: Point) -> bool {
        (self.min_x()..=self.max_x()).contains(&p.x) && (self.min_y()..=self.max_y()).contains(&p.y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 40.0,
        }
    }
}

/// Force constants. One canonical table; hosts override individual values
/// through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Base spring constant towards the anchor centre.
    pub attraction: f64,
    /// Distance at which attraction doubles. `0` disables distance scaling.
    pub distance_scale: f64,
    pub repulsion_force: f64,
    pub node_radius: f64,
    pub padding: f64,
    /// Floor for the inverse-distance weight; also bounds the push for
    /// perfectly overlapping nodes.
    pub min_separation: f64,
    /// Per-frame velocity decay, in (0, 1).
    pub friction: f64,
    pub dt: f64,
    /// Fraction of velocity kept (and reversed) when hitting the viewport edge.
    pub bounce_damping: f64,
    pub viewport: Viewport,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            attraction: 0.02,
            distance_scale: 100.0,
            repulsion_force: 1.5,
            node_radius: 28.0,
            padding: 8.0,
            min_separation: 4.0,
            friction: 0.92,
            dt: 1.0,
            bounce_damping: 0.4,
            viewport: Viewport::default(),
        }
    }
}

impl PhysicsParams {
    /// Distance below which two nodes push each other apart.
    pub fn collision_distance(&self) -> f64 {
        2.0 * self.node_radius + self.padding
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("attraction", self.attraction)?;
        non_negative("distance_scale", self.distance_scale)?;
        non_negative("repulsion_force", self.repulsion_force)?;
        non_negative("node_radius", self.node_radius)?;
        non_negative("padding", self.padding)?;
        non_negative("margin", self.viewport.margin)?;
        open_range("min_separation", self.min_separation, 0.0, f64::INFINITY)?;
        open_range("dt", self.dt, 0.0, f64::INFINITY)?;
        open_range("friction", self.friction, 0.0, 1.0)?;
        if !(0.0..=1.0).contains(&self.bounce_damping) {
            return Err(ValidationError::OutOfRange {
                field: "bounce_damping".into(),
                min: 0.0,
                max: 1.0,
                value: self.bounce_damping,
            });
        }
        let Viewport {
            width,
            height,
            margin,
        } = self.viewport;
        if !(width.is_finite() && height.is_finite())
            || width <= 2.0 * margin
            || height <= 2.0 * margin
        {
            return Err(ValidationError::ViewportTooSmall {
                width,
                height,
                margin,
            });
        }
        Ok(())
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Negative {
            field: field.into(),
            value,
        })
    }
}

fn open_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > min && value < max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            value,
        })
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Number of nodes the stepper integrated.
    pub moved: usize,
    /// Sum of ½|v|² over integrated nodes.
    pub kinetic_energy: f64,
    /// The whole step was skipped (drag in progress or torn down).
    pub skipped: bool,
}

impl StepReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn is_settled(&self, threshold: f64) -> bool {
        !self.skipped && self.kinetic_energy < threshold
    }
}

/// Advance every node except `held` by one step.
///
/// `held` still repels its neighbours but its own state is left untouched.
pub fn step(
    nodes: &mut [Node],
    anchors: &AnchorRegistry,
    params: &PhysicsParams,
    held: Option<&str>,
) -> StepReport {
    let is_held = |node: &Node| held == Some(node.id.as_str());

    let forces: Vec<(f64, f64)> = (0..nodes.len())
        .map(|i| {
            if is_held(&nodes[i]) {
                return (0.0, 0.0);
            }
            let (mut fx, mut fy) = attraction(&nodes[i], anchors, params);
            for j in 0..nodes.len() {
                if i == j {
                    continue;
                }
                let (rx, ry) = repulsion(nodes, i, j, params);
                fx += rx;
                fy += ry;
            }
            (fx, fy)
        })
        .collect();

    let mut report = StepReport::default();
    for (node, (fx, fy)) in nodes.iter_mut().zip(forces) {
        if is_held(node) {
            continue;
        }
        integrate(node, fx, fy, params);
        report.moved += 1;
        report.kinetic_energy += 0.5 * node.speed_sq();
    }
    report
}

fn attraction(node: &Node, anchors: &AnchorRegistry, params: &PhysicsParams) -> (f64, f64) {
    let Some(anchor) = anchors.lookup(node.category_id.as_deref()) else {
        return (0.0, 0.0);
    };
    let dx = anchor.center.x - node.x;
    let dy = anchor.center.y - node.y;
    let k = if params.distance_scale > 0.0 {
        params.attraction * (1.0 + dx.hypot(dy) / params.distance_scale)
    } else {
        params.attraction
    };
    (dx * k, dy * k)
}

/// Push on node `i` away from node `j`.
fn repulsion(nodes: &[Node], i: usize, j: usize, params: &PhysicsParams) -> (f64, f64) {
    let dx = nodes[i].x - nodes[j].x;
    let dy = nodes[i].y - nodes[j].y;
    let distance = dx.hypot(dy);
    let reach = params.collision_distance();
    if !distance.is_finite() || distance >= reach {
        return (0.0, 0.0);
    }

    let (ux, uy) = if distance > f64::EPSILON {
        (dx / distance, dy / distance)
    } else {
        separation_direction(i, j)
    };
    let strength = params.repulsion_force * (reach - distance) / distance.max(params.min_separation);
    (ux * strength, uy * strength)
}

/// Deterministic unit vector for a perfectly overlapping pair.
/// Antisymmetric in `(i, j)` so the two nodes move apart.
fn separation_direction(i: usize, j: usize) -> (f64, f64) {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let seed = (lo as f64) * GOLDEN_RATIO_FRACTION + (hi as f64) * 0.37 + 0.125;
    let angle = seed.fract() * TAU;
    let (sin, cos) = angle.sin_cos();
    if i == lo {
        (cos, sin)
    } else {
        (-cos, -sin)
    }
}

fn integrate(node: &mut Node, fx: f64, fy: f64, params: &PhysicsParams) {
    let mut vx = (node.vx + fx * params.dt) * params.friction;
    let mut vy = (node.vy + fy * params.dt) * params.friction;
    if !vx.is_finite() || !vy.is_finite() {
        tracing::warn!(node_id = %node.id, "non-finite velocity, stopping node");
        vx = 0.0;
        vy = 0.0;
    }

    let x = node.x + vx;
    let y = node.y + vy;
    let viewport = &params.viewport;
    (node.x, node.vx) = bounce(x, vx, viewport.min_x(), viewport.max_x(), params.bounce_damping);
    (node.y, node.vy) = bounce(y, vy, viewport.min_y(), viewport.max_y(), params.bounce_damping);
}

fn bounce(pos: f64, vel: f64, min: f64, max: f64, damping: f64) -> (f64, f64) {
    if pos < min {
        (min, -vel * damping)
    } else if pos > max {
        (max, -vel * damping)
    } else {
        (pos, vel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::anchor::Anchor;

    fn node(id: &str, x: f64, y: f64, category_id: Option<&str>) -> Node {
        Node {
            id: id.into(),
            name: id.into(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            percent: 0.0,
            category_id: category_id.map(String::from),
        }
    }

    fn anchors() -> AnchorRegistry {
        AnchorRegistry::new(vec![Anchor {
            id: "work".into(),
            name: "Work".into(),
            color: "#3b82f6".into(),
            center: Point::new(400.0, 300.0),
            radius: 120.0,
        }])
    }

    #[test]
    fn default_params_are_valid() {
        assert!(PhysicsParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_friction_outside_unit_interval() {
        let params = PhysicsParams {
            friction: 1.0,
            ..PhysicsParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_viewport_smaller_than_margins() {
        let params = PhysicsParams {
            viewport: Viewport {
                width: 60.0,
                height: 600.0,
                margin: 40.0,
            },
            ..PhysicsParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ValidationError::ViewportTooSmall { .. })
        ));
    }

    #[test]
    fn attraction_pulls_towards_anchor() {
        let mut nodes = vec![node("a", 600.0, 300.0, Some("work"))];
        step(&mut nodes, &anchors(), &PhysicsParams::default(), None);
        assert!(nodes[0].x < 600.0);
        assert!(nodes[0].vx < 0.0);
        assert_eq!(nodes[0].y, 300.0);
    }

    #[test]
    fn distance_scaling_pulls_harder_from_afar() {
        let params = PhysicsParams::default();
        let near = attraction(&node("a", 450.0, 300.0, Some("work")), &anchors(), &params);
        let far = attraction(&node("a", 650.0, 300.0, Some("work")), &anchors(), &params);
        // 5x the offset yields more than 5x the force
        assert!(far.0.abs() > 5.0 * near.0.abs());
    }

    #[test]
    fn unassigned_and_dangling_nodes_feel_no_attraction() {
        let params = PhysicsParams::default();
        let unassigned = attraction(&node("a", 600.0, 300.0, None), &anchors(), &params);
        let dangling = attraction(&node("a", 600.0, 300.0, Some("gone")), &anchors(), &params);
        assert_eq!(unassigned, (0.0, 0.0));
        assert_eq!(dangling, unassigned);
    }

    #[test]
    fn repulsion_is_symmetric() {
        let nodes = vec![node("a", 300.0, 300.0, None), node("b", 330.0, 300.0, None)];
        let params = PhysicsParams::default();
        let on_a = repulsion(&nodes, 0, 1, &params);
        let on_b = repulsion(&nodes, 1, 0, &params);
        assert!(on_a.0 < 0.0);
        assert_eq!(on_a.0, -on_b.0);
    }

    #[test]
    fn repulsion_ignores_distant_pairs() {
        let nodes = vec![node("a", 100.0, 300.0, None), node("b", 300.0, 300.0, None)];
        assert_eq!(repulsion(&nodes, 0, 1, &PhysicsParams::default()), (0.0, 0.0));
    }

    #[test]
    fn separation_direction_is_antisymmetric_unit() {
        for (i, j) in [(0, 1), (2, 5), (7, 3)] {
            let a = separation_direction(i, j);
            let b = separation_direction(j, i);
            assert!((a.0.hypot(a.1) - 1.0).abs() < 1e-12);
            assert_eq!(a, (-b.0, -b.1));
        }
    }

    #[test]
    fn held_node_is_untouched() {
        let mut nodes = vec![
            node("a", 600.0, 300.0, Some("work")),
            node("b", 610.0, 300.0, Some("work")),
        ];
        let mut alone = vec![nodes[1].clone()];
        let before = nodes[0].clone();
        let report = step(&mut nodes, &anchors(), &PhysicsParams::default(), Some("a"));
        step(&mut alone, &anchors(), &PhysicsParams::default(), None);
        assert_eq!(nodes[0], before);
        assert_eq!(report.moved, 1);
        // b still feels a's push
        assert!(nodes[1].vx > alone[0].vx);
    }

    #[test]
    fn bounce_reverses_and_damps() {
        assert_eq!(bounce(10.0, -20.0, 40.0, 760.0, 0.4), (40.0, 8.0));
        assert_eq!(bounce(800.0, 20.0, 40.0, 760.0, 0.4), (760.0, -8.0));
        assert_eq!(bounce(400.0, 5.0, 40.0, 760.0, 0.4), (400.0, 5.0));
    }

    #[test]
    fn infinite_velocity_is_discarded() {
        let mut nodes = vec![node("a", 400.0, 300.0, None)];
        nodes[0].vx = f64::INFINITY;
        nodes[0].vy = f64::NEG_INFINITY;
        step(&mut nodes, &anchors(), &PhysicsParams::default(), None);
        assert_eq!((nodes[0].x, nodes[0].y), (400.0, 300.0));
        assert_eq!((nodes[0].vx, nodes[0].vy), (0.0, 0.0));
    }

    #[test]
    fn step_report_settles() {
        let mut nodes = vec![node("a", 400.0, 300.0, Some("work"))];
        let report = step(&mut nodes, &anchors(), &PhysicsParams::default(), None);
        assert!(report.is_settled(1e-9));
        assert!(!StepReport::skipped().is_settled(1.0));
    }
}
