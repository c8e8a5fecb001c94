use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use weft_common::types::tid::{TID_LEN, Tid, TidGenerator};

#[test]
fn tight_loop_is_strictly_increasing() {
    let generator = TidGenerator::new();
    let mut last = generator.next_tid();
    for _ in 0..10_000 {
        let next = generator.next_tid();
        assert!(next > last, "{next} <= {last}");
        assert_eq!(next.len(), TID_LEN);
        last = next;
    }
}

#[test]
fn concurrent_generation_is_unique_and_ordered_per_thread() {
    let generator = Arc::new(TidGenerator::new().with_clock_id(7).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || {
                let tids: Vec<Tid> = (0..2_000).map(|_| generator.next_tid()).collect();
                assert!(tids.windows(2).all(|pair| pair[0] < pair[1]));
                tids
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for tid in handle.join().unwrap() {
            assert_eq!(tid.clock_id(), 7);
            assert!(seen.insert(tid.clone()), "duplicate {tid}");
        }
    }
    assert_eq!(seen.len(), 16_000);
}

#[test]
fn process_wide_generator() {
    let a = Tid::now();
    let b = Tid::now();
    assert!(a < b);
    assert_eq!(a.clock_id(), b.clock_id());
    assert!(a.clock_id() < 32);
}
