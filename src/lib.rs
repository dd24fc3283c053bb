//! Diffusion-Limited Aggregation on a bounded lattice.
//!
//! A [`Field`] owns a set of agents: one stuck root and many wandering
//! particles. Each call to [`Field::next_state`] random-walks the wanderers
//! one lattice step and sticks those touching the aggregate, recording the
//! cell they bonded to as a [`StickyNeighbor`]. The links form a tree rooted
//! at the root agent, queried through [`Field::get_distance_from_root`] and
//! the [`topology`] helpers. Fields export to and rebuild from
//! [`PointRecord`] lists without replaying diffusion.

pub mod agent;
pub mod color;
pub mod error;
pub mod field;
pub mod settings;
pub mod snapshot;
pub mod topology;

pub use agent::{Agent, AgentState, Position, StickyNeighbor};
pub use color::Color;
pub use error::FieldError;
pub use field::{CellState, Field};
pub use settings::{FieldSettings, NeighborhoodType, RootAnchor};
pub use snapshot::{FieldSnapshot, PointRecord, SnapshotError};
