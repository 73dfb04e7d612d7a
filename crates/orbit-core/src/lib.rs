//! # Orbit Core Library
//!
//! This library provides the gravity-cluster engine behind Orbit's project
//! overview: every project is a node drawn towards the anchor of its
//! category, and dropping a node near another anchor moves the project to
//! that category. The CLI binary and any GUI host are thin layers over the
//! same core.
//!
//! ## Architecture
//!
//! - **Cluster Engine**: A frame-driven state machine; the caller invokes
//!   `tick()` once per animation frame and forwards drag gestures
//! - **Physics**: Distance-scaled anchor attraction, pairwise repulsion,
//!   friction and an inelastic viewport bounce
//! - **Interaction**: Single-pointer drag sessions that suspend physics
//!   ownership of a node and resolve its category on release
//! - **Storage**: TOML-based configuration and JSON scenario files
//!
//! ## Key Components
//!
//! - [`ClusterEngine`]: Owns the node list, anchors and drag session
//! - [`SharedCluster`]: Mutex-serialized engine handle for threaded hosts
//! - [`Config`]: Application configuration management
//! - [`Scenario`]: Category/project lists loaded from disk

pub mod cluster;
pub mod error;
pub mod events;
pub mod scenario;
pub mod storage;

pub use cluster::{
    resolve_category, Category, CategoryChangeListener, ClusterEngine, ClusterSettings,
    ClusterSnapshot, DragPolicy, FrameDriver, Node, NodeView, PhysicsParams, Point,
    ProjectInput, SharedCluster,
};
pub use error::{ConfigError, CoreError, ScenarioError, ValidationError};
pub use events::Event;
pub use scenario::Scenario;
pub use storage::Config;
