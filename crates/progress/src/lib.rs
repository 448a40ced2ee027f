#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Snapshot operation tracking and progress fan-out
//!
//! One `SnapshotTracker` holds the live `OperationState` per project and a
//! list of subscribers per project. The pipeline is the single writer for a
//! key; any number of observers read via point queries or subscriptions.
//!
//! Delivery is lossy for intermediate updates (every delta carries the full
//! state, so a dropped stale update is harmless) but terminal updates are
//! guaranteed: a full subscriber buffer gets a bounded blocking send instead
//! of a drop, so completion is never silently lost while the writer can
//! never hang on a stuck consumer.

mod subscription;
mod tracker;

pub use subscription::Subscription;
pub use tracker::SnapshotTracker;
