#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! The snapshot pipeline: one background run per project
//!
//! Sequences convergence wait, folder status fetch, inventory collection,
//! manifest serialization and the retried upload, pushing a state transition
//! into the tracker after every step. Terminal outcomes are three-valued:
//! published, local-only (inventory fine, publish failed), or failed.

mod pipeline;

pub use pipeline::{PipelineConfig, SnapshotPipeline};
