//! Gravity-cluster simulation.
//!
//! Projects are simulated as nodes pulled towards the anchor of their
//! category, pushed apart when they overlap, and confined to the viewport.
//! Dragging a node onto another anchor reassigns its category.

pub mod anchor;
pub mod engine;
pub mod geometry;
pub mod interaction;
pub mod node;
pub mod physics;
pub mod resolver;
pub mod shared;
pub mod store;

pub use anchor::{Anchor, AnchorRegistry, Category, NEUTRAL_COLOR};
pub use engine::{CategoryChangeListener, ClusterEngine, ClusterSettings};
pub use geometry::Point;
pub use interaction::{DragController, DragPolicy, DragRelease, DragSession, DragState};
pub use node::{AnchorView, ClusterSnapshot, Node, NodeView, ProjectInput};
pub use physics::{step, PhysicsParams, StepReport, Viewport};
pub use resolver::{resolve_anchor, resolve_category};
pub use shared::{FrameDriver, SharedCluster};
pub use store::{ReconcileReport, SimulationStore, SpawnConfig};
