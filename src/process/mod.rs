//! Process supervisor: direct spawn and restricted-runner modes behind a
//! common [`supervisor::Supervised`] handle.

pub mod runner;
pub mod supervisor;

pub use runner::{MockRunner, RestrictedRunner, RunnerHandles};
pub use supervisor::{spawn_direct, spawn_restricted, Supervised};
