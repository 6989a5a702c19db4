//! Property-based tests for reconciler invariants.
//!
//! Whatever the backend reports, after every pass the snapshot shows at most
//! one active tab, released tabs hold no surface, and idle bookkeeping covers
//! exactly the listed tabs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tabweave::coordinator::Coordinator;
use tabweave::gateway::memory::InMemoryGateway;
use tabweave::gateway::RemoteStateGateway;
use tabweave::host::headless::HeadlessHost;
use tabweave::managers::idle_tracker::IdleTrackerTrait;
use tabweave::services::clock::ManualClock;
use tabweave::types::settings::CoordinatorSettings;
use tabweave::types::tab::TabState;

#[derive(Debug, Clone)]
enum Op {
    Activate(usize),
    Close(usize),
    NewTab,
    /// The backend changes a tab's state on its own, then pushes "tabs changed".
    Backend(usize, TabState),
    /// Time passes, then housekeeping runs.
    Idle(u64),
}

fn arb_state() -> impl Strategy<Value = TabState> {
    prop_oneof![
        Just(TabState::Active),
        Just(TabState::Background),
        Just(TabState::Frozen),
        Just(TabState::Discarded),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            3 => (0..10usize).prop_map(Op::Activate),
            1 => (0..10usize).prop_map(Op::Close),
            1 => Just(Op::NewTab),
            2 => (0..10usize, arb_state()).prop_map(|(i, s)| Op::Backend(i, s)),
            2 => (0..3_600u64).prop_map(Op::Idle),
        ],
        1..25,
    )
}

async fn apply(
    gateway: &InMemoryGateway,
    clock: &ManualClock,
    coordinator: &mut Coordinator,
    op: &Op,
) {
    let tabs = gateway.get_tabs().await.unwrap_or_default();
    let pick = |i: usize| (!tabs.is_empty()).then(|| tabs[i % tabs.len()].id.clone());
    match op {
        Op::Activate(i) => {
            if let Some(id) = pick(*i) {
                let _ = coordinator.activate(&id).await;
            }
        }
        Op::Close(i) => {
            if let Some(id) = pick(*i) {
                let _ = coordinator.close_tab(&id).await;
            }
        }
        Op::NewTab => {
            let _ = coordinator.new_tab().await;
        }
        Op::Backend(i, state) => {
            if let Some(id) = pick(*i) {
                let active = gateway.get_active_tab().await.ok().flatten();
                let is_active = active.is_some_and(|t| t.id == id);
                // A real backend never freezes its active tab.
                if !(is_active && *state == TabState::Frozen) {
                    gateway.set_state(&id, *state);
                }
            }
            coordinator.refresh().await;
        }
        Op::Idle(secs) => {
            clock.advance(Duration::from_secs(*secs));
            coordinator.run_housekeeping().await;
        }
    }
}

fn check(
    coordinator: &Coordinator,
    host: &HeadlessHost,
    retain: bool,
) -> Result<(), TestCaseError> {
    let snapshot = coordinator.snapshot();

    let active_count = snapshot
        .tabs
        .iter()
        .filter(|t| t.state == TabState::Active)
        .count();
    prop_assert!(active_count <= 1, "{} active tabs", active_count);
    for tab in &snapshot.tabs {
        if tab.state == TabState::Active {
            prop_assert_eq!(snapshot.active_id.as_deref(), Some(tab.id.as_str()));
        }
    }
    prop_assert_eq!(snapshot.is_empty, snapshot.tabs.is_empty());

    for id in host.surface_ids() {
        let tab = snapshot.tabs.iter().find(|t| t.id == id);
        prop_assert!(tab.is_some(), "surface {} outlived its tab", id);
        let tab = tab.unwrap();
        prop_assert!(tab.state != TabState::Discarded, "discarded tab {} has a surface", id);
        if snapshot.active_id.as_deref() != Some(id.as_str()) {
            prop_assert!(retain, "background tab {} kept a surface", id);
            prop_assert!(!tab.state.releases_surface(), "{} tab {} has a surface", tab.state, id);
        }
    }

    if let Some(placeholder) = &snapshot.placeholder {
        prop_assert_eq!(snapshot.active_id.as_deref(), Some(placeholder.tab_id.as_str()));
    }

    let listed: HashSet<&str> = snapshot.tabs.iter().map(|t| t.id.as_str()).collect();
    let tracked: HashSet<&str> = coordinator
        .idle()
        .entries()
        .keys()
        .map(String::as_str)
        .collect();
    prop_assert_eq!(listed, tracked);
    Ok(())
}

fn run_ops(initial: usize, ops: &[Op], retain: bool) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        let urls: Vec<String> = (0..initial).map(|i| format!("https://t{}.test/", i)).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let gateway = Arc::new(InMemoryGateway::with_tabs(&refs));
        let host = Arc::new(HeadlessHost::new());
        let clock = Arc::new(ManualClock::new());
        let mut settings = CoordinatorSettings::default();
        settings.surfaces.retain_background_surfaces = retain;
        let mut coordinator =
            Coordinator::new(gateway.clone(), host.clone(), clock.clone(), settings);

        coordinator.refresh().await;
        check(&coordinator, &host, retain)?;
        for op in ops {
            apply(&gateway, &clock, &mut coordinator, op).await;
            check(&coordinator, &host, retain)?;
        }
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn single_surface_invariants_hold(initial in 0usize..6, ops in arb_ops()) {
        run_ops(initial, &ops, false)?;
    }

    #[test]
    fn retained_surface_invariants_hold(initial in 0usize..6, ops in arb_ops()) {
        run_ops(initial, &ops, true)?;
    }
}
