//! Property-based tests for keyboard tab cycling.
//!
//! Cycling wraps at both ends, forward and backward undo each other, and a
//! full lap returns to the starting tab.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use tabweave::coordinator::{cycle_index, Coordinator};
use tabweave::gateway::memory::InMemoryGateway;
use tabweave::host::headless::HeadlessHost;
use tabweave::services::clock::ManualClock;
use tabweave::types::navigation::CycleDirection;
use tabweave::types::settings::CoordinatorSettings;

fn arb_direction() -> impl Strategy<Value = CycleDirection> {
    prop_oneof![Just(CycleDirection::Forward), Just(CycleDirection::Backward)]
}

fn opposite(direction: CycleDirection) -> CycleDirection {
    match direction {
        CycleDirection::Forward => CycleDirection::Backward,
        CycleDirection::Backward => CycleDirection::Forward,
    }
}

proptest! {
    #[test]
    fn cycle_stays_in_bounds(
        len in 1usize..50,
        current in proptest::option::of(0usize..50),
        direction in arb_direction(),
    ) {
        let current = current.map(|c| c % len);
        let next = cycle_index(len, current, direction).unwrap();
        prop_assert!(next < len);
    }

    #[test]
    fn opposite_directions_cancel(len in 1usize..50, start in 0usize..50, direction in arb_direction()) {
        let start = start % len;
        let there = cycle_index(len, Some(start), direction).unwrap();
        let back = cycle_index(len, Some(there), opposite(direction)).unwrap();
        prop_assert_eq!(back, start);
    }

    #[test]
    fn full_lap_visits_every_tab(len in 1usize..30, start in 0usize..30, direction in arb_direction()) {
        let start = start % len;
        let mut seen = HashSet::new();
        let mut at = start;
        for _ in 0..len {
            at = cycle_index(len, Some(at), direction).unwrap();
            seen.insert(at);
        }
        prop_assert_eq!(at, start);
        prop_assert_eq!(seen.len(), len);
    }

    #[test]
    fn no_current_tab_starts_at_an_end(len in 1usize..50) {
        prop_assert_eq!(cycle_index(len, None, CycleDirection::Forward), Some(0));
        prop_assert_eq!(cycle_index(len, None, CycleDirection::Backward), Some(len - 1));
    }
}

#[test]
fn test_empty_strip_has_nowhere_to_go() {
    assert_eq!(cycle_index(0, None, CycleDirection::Forward), None);
    assert_eq!(cycle_index(0, Some(3), CycleDirection::Backward), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn coordinator_cycle_follows_strip_order(len in 1usize..8, direction in arb_direction()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let urls: Vec<String> = (0..len).map(|i| format!("https://t{}.test/", i)).collect();
            let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
            let gateway = Arc::new(InMemoryGateway::with_tabs(&refs));
            let mut coordinator = Coordinator::new(
                gateway,
                Arc::new(HeadlessHost::new()),
                Arc::new(ManualClock::new()),
                CoordinatorSettings::default(),
            );
            coordinator.refresh().await;
            let order: Vec<String> = coordinator.snapshot().tabs.iter().map(|t| t.id.clone()).collect();

            let mut expected = 0usize;
            for _ in 0..len {
                expected = cycle_index(len, Some(expected), direction).unwrap();
                let tab = coordinator.cycle(direction).await.unwrap().unwrap();
                prop_assert_eq!(&tab.id, &order[expected]);
                prop_assert_eq!(coordinator.snapshot().active_id.as_deref(), Some(order[expected].as_str()));
            }
            Ok(())
        })?;
    }
}
