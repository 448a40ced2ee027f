//! Integration tests for snapshot progress fan-out
//!
//! These cover the delivery guarantees observers rely on: per-subscriber
//! ordering, terminal delivery under back-pressure, and stream termination
//! on cleanup.

use folio_progress::SnapshotTracker;
use folio_types::{SnapshotStep, TOTAL_STEPS};
use std::time::Duration;

async fn drive_pipeline(tracker: &SnapshotTracker, key: &str) {
    tracker
        .update(key, SnapshotStep::Waiting, 1, 0, 0, "waiting for scan")
        .await;
    tracker
        .update(key, SnapshotStep::Browsing, 2, 0, 0, "getting folder status")
        .await;
    tracker
        .update(key, SnapshotStep::Browsing, 3, 0, 0, "browsing files")
        .await;
    tracker
        .update(key, SnapshotStep::Compressing, 4, 42, 1024, "processing files")
        .await;
    tracker
        .update(key, SnapshotStep::Uploading, 5, 42, 1024, "uploading")
        .await;
    tracker.complete(key, "https://cloud.example/s/42").await;
}

#[tokio::test]
async fn subscriber_observes_monotonic_steps_and_terminal() {
    let tracker = SnapshotTracker::new();
    tracker.start("p").unwrap();
    let mut sub = tracker.subscribe("p");

    drive_pipeline(&tracker, "p").await;

    let mut last_step_number = 0;
    let mut saw_terminal = false;
    while let Ok(state) = sub.try_recv() {
        assert!(
            state.step_number >= last_step_number,
            "step number regressed: {} -> {}",
            last_step_number,
            state.step_number
        );
        last_step_number = state.step_number;
        if state.is_terminal() {
            saw_terminal = true;
            assert_eq!(state.step, SnapshotStep::Completed);
            assert_eq!(state.step_number, TOTAL_STEPS);
            break;
        }
    }
    assert!(saw_terminal, "terminal delta was never delivered");
}

#[tokio::test]
async fn early_and_late_subscribers_both_see_terminal() {
    let tracker = SnapshotTracker::new();

    // Subscribes before the operation even starts.
    let mut early = tracker.subscribe("p");

    tracker.start("p").unwrap();
    tracker
        .update("p", SnapshotStep::Waiting, 1, 0, 0, "waiting")
        .await;
    tracker
        .update("p", SnapshotStep::Browsing, 3, 0, 0, "browsing")
        .await;

    // Joins mid-run.
    let mut late = tracker.subscribe("p");

    tracker
        .update("p", SnapshotStep::Uploading, 5, 7, 512, "uploading")
        .await;
    tracker.complete("p", "https://cloud.example/s/7").await;

    for sub in [&mut early, &mut late] {
        let mut saw_terminal = false;
        while let Ok(state) = sub.try_recv() {
            if state.is_terminal() {
                saw_terminal = true;
                break;
            }
        }
        assert!(saw_terminal);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_consumer_still_observes_terminal() {
    // Buffer of 1 with a consumer far slower than the writer: intermediate
    // deltas are coalesced away, but the terminal delta must arrive.
    let tracker = SnapshotTracker::with_buffer(1);
    tracker.start("p").unwrap();
    let mut sub = tracker.subscribe("p");

    let consumer = tokio::spawn(async move {
        let mut last = None;
        while let Some(state) = sub.recv().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let terminal = state.is_terminal();
            last = Some(state);
            if terminal {
                break;
            }
        }
        last
    });

    for round in 0..20u64 {
        tracker
            .update("p", SnapshotStep::Compressing, 4, round, round * 10, "processing")
            .await;
    }
    tracker.complete("p", "https://cloud.example/s/1").await;
    tracker.cleanup("p");

    let last = consumer.await.unwrap().expect("stream ended without data");
    assert!(last.is_terminal(), "slow consumer missed the terminal delta");
    assert_eq!(last.step, SnapshotStep::Completed);
}

#[tokio::test(start_paused = true)]
async fn stuck_consumer_never_hangs_the_writer() {
    // A consumer that never drains: the terminal send must give up after its
    // bounded wait instead of blocking the pipeline forever.
    let tracker = SnapshotTracker::with_buffer(1);
    tracker.start("p").unwrap();
    let _sub = tracker.subscribe("p");

    tracker
        .update("p", SnapshotStep::Uploading, 5, 1, 1, "uploading")
        .await;
    // Buffer now full; this must return despite the stuck consumer.
    tracker.complete("p", "https://cloud.example/s/1").await;

    let state = tracker.state("p").unwrap();
    assert!(state.is_terminal());
}

#[tokio::test]
async fn cleanup_ends_all_subscriptions() {
    let tracker = SnapshotTracker::new();
    tracker.start("p").unwrap();
    let mut one = tracker.subscribe("p");
    let mut two = tracker.subscribe("p");

    tracker.complete("p", "https://cloud.example/s/9").await;
    tracker.cleanup("p");

    // Drain whatever was buffered; afterwards the stream must end rather
    // than block forever.
    for sub in [&mut one, &mut two] {
        let mut saw_terminal = false;
        while let Some(state) = sub.recv().await {
            if state.is_terminal() {
                saw_terminal = true;
            }
        }
        assert!(saw_terminal, "terminal delta lost before cleanup");
    }
}

#[tokio::test]
async fn two_subscribers_see_the_same_order() {
    let tracker = SnapshotTracker::new();
    tracker.start("p").unwrap();
    let mut one = tracker.subscribe("p");
    let mut two = tracker.subscribe("p");

    drive_pipeline(&tracker, "p").await;

    let drain = |sub: &mut folio_progress::Subscription| {
        let mut steps = Vec::new();
        while let Ok(state) = sub.try_recv() {
            steps.push(state.step_number);
        }
        steps
    };

    let first = drain(&mut one);
    let second = drain(&mut two);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}
