use std::time::{Duration, Instant};

use proptest::prelude::*;
use watchcmd::engine::ExecutionGate;

#[test]
fn zero_interval_never_blocks() {
    let mut gate = ExecutionGate::new(Duration::ZERO);
    let now = Instant::now();
    assert!(gate.permits(now));
    gate.record(now);
    assert!(gate.permits(now));
}

#[test]
fn first_batch_always_permitted() {
    let gate = ExecutionGate::new(Duration::from_secs(3600));
    assert!(gate.permits(Instant::now()));
    assert_eq!(gate.last_execution(), None);
}

#[test]
fn window_blocks_until_interval_elapsed() {
    let interval = Duration::from_millis(100);
    let mut gate = ExecutionGate::new(interval);
    let start = Instant::now();

    gate.record(start);
    assert!(!gate.permits(start + Duration::from_millis(99)));
    assert!(gate.permits(start + interval));
    assert!(gate.permits(start + Duration::from_millis(250)));
}

proptest! {
    /// Feeding arbitrary arrival times through permit/record never lets two
    /// batches start less than one interval apart, and every refusal falls
    /// inside the window of the last permitted batch.
    #[test]
    fn at_most_one_batch_per_window(
        interval_ms in 1u64..500,
        mut arrivals in proptest::collection::vec(0u64..5_000, 1..60),
    ) {
        arrivals.sort_unstable();
        let interval = Duration::from_millis(interval_ms);
        let mut gate = ExecutionGate::new(interval);
        let start = Instant::now();

        let mut last_accepted: Option<u64> = None;
        for t in arrivals {
            let now = start + Duration::from_millis(t);
            if gate.permits(now) {
                if let Some(prev) = last_accepted {
                    prop_assert!(t - prev >= interval_ms);
                }
                gate.record(now);
                last_accepted = Some(t);
            } else {
                let prev = last_accepted.expect("a refusal needs an earlier batch");
                prop_assert!(t - prev < interval_ms);
            }
        }
    }
}

#[test]
fn huge_interval_blocks_without_overflow() {
    let mut gate = ExecutionGate::new(Duration::MAX);
    let start = Instant::now();
    gate.record(start);
    assert!(!gate.permits(start + Duration::from_secs(3600)));
}
