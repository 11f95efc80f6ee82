//! Motion engine for n-legged walking machines.
//!
//! Given a [`body::BodyDefinition`], [`pod::Pod`] computes per-leg joint
//! trajectories that realize a chosen [`gait::Gait`] and direction, solving
//! inverse kinematics so end effectors track a lifted swing arc over a
//! planned ground path. [`network`] packs the resulting joint angles into a
//! servo frame for a physical robot bridge; [`recorder`] can capture the same
//! angles to a binary motion primitive for later playback.

pub mod body;
pub mod config;
pub mod error;
pub mod gait;
pub mod geometry;
pub mod kinematics;
pub mod leg;
pub mod logging;
pub mod network;
pub mod pod;
pub mod recorder;
pub mod wire;

pub use error::{PodError, PodResult};
pub use pod::Pod;
