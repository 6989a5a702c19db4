//! Housekeeping: the pure planner and passes driven by a manual clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rstest::rstest;
use tabweave::coordinator::housekeeping::{plan_housekeeping, HousekeepingAction};
use tabweave::coordinator::Coordinator;
use tabweave::gateway::memory::InMemoryGateway;
use tabweave::gateway::RemoteStateGateway;
use tabweave::host::headless::HeadlessHost;
use tabweave::managers::idle_tracker::IdleTrackerTrait;
use tabweave::services::clock::{Clock, ManualClock};
use tabweave::types::errors::{ErrorClass, GatewayError};
use tabweave::types::settings::{CoordinatorSettings, HousekeepingSettings};
use tabweave::types::tab::{Tab, TabState};

const FREEZE: Duration = Duration::from_secs(5 * 60);
const DISCARD: Duration = Duration::from_secs(30 * 60);

fn tab(id: &str, state: TabState) -> Tab {
    Tab {
        id: id.to_string(),
        url: format!("https://{}.test/", id),
        title: String::new(),
        favicon_url: None,
        is_loading: false,
        state,
        index: 0,
    }
}

// === Planner ===

#[rstest]
#[case(TabState::Background, FREEZE, Some("freeze"))]
#[case(TabState::Background, FREEZE - Duration::from_secs(1), None)]
#[case(TabState::Frozen, DISCARD, Some("discard"))]
#[case(TabState::Frozen, DISCARD - Duration::from_secs(1), None)]
#[case(TabState::Frozen, FREEZE, None)]
#[case(TabState::Discarded, DISCARD * 4, None)]
fn test_plan_thresholds(
    #[case] state: TabState,
    #[case] idle: Duration,
    #[case] expected: Option<&str>,
) {
    let start = Instant::now();
    let tabs = vec![tab("a", TabState::Active), tab("b", state)];
    let idle_map = HashMap::from([("a".to_string(), start), ("b".to_string(), start)]);

    let plan = plan_housekeeping(
        &tabs,
        Some("a"),
        &idle_map,
        start + idle,
        &HousekeepingSettings::default(),
    );

    let expected = match expected {
        Some("freeze") => vec![HousekeepingAction::Freeze("b".to_string())],
        Some(_) => vec![HousekeepingAction::Discard("b".to_string())],
        None => vec![],
    };
    assert_eq!(plan, expected);
}

#[test]
fn test_plan_never_touches_active() {
    let start = Instant::now();
    // Stale backend reply: the active id points at a tab still reported as background.
    let active = tab("a", TabState::Background);
    let idle_map = HashMap::from([("a".to_string(), start)]);

    let plan = plan_housekeeping(
        &[active],
        Some("a"),
        &idle_map,
        start + DISCARD * 2,
        &HousekeepingSettings::default(),
    );
    assert!(plan.is_empty());
}

#[test]
fn test_plan_skips_unstamped_tabs() {
    let start = Instant::now();
    let tabs = vec![tab("b", TabState::Background)];

    let plan = plan_housekeeping(
        &tabs,
        None,
        &HashMap::new(),
        start + DISCARD,
        &HousekeepingSettings::default(),
    );
    assert!(plan.is_empty());
}

#[test]
fn test_plan_uses_configured_thresholds() {
    let start = Instant::now();
    let settings = HousekeepingSettings {
        freeze_after_secs: 10,
        discard_after_secs: 20,
        ..HousekeepingSettings::default()
    };
    let tabs = vec![tab("b", TabState::Background), tab("c", TabState::Frozen)];
    let idle_map = HashMap::from([("b".to_string(), start), ("c".to_string(), start)]);

    let plan = plan_housekeeping(&tabs, None, &idle_map, start + Duration::from_secs(20), &settings);

    assert_eq!(
        plan,
        vec![
            HousekeepingAction::Freeze("b".to_string()),
            HousekeepingAction::Discard("c".to_string()),
        ]
    );
}

// === Passes ===

struct Harness {
    gateway: Arc<InMemoryGateway>,
    host: Arc<HeadlessHost>,
    clock: Arc<ManualClock>,
    coordinator: Coordinator,
}

async fn started(settings: CoordinatorSettings) -> Harness {
    let gateway = Arc::new(InMemoryGateway::with_tabs(&[
        "https://a.test/",
        "https://b.test/",
    ]));
    let host = Arc::new(HeadlessHost::new());
    let clock = Arc::new(ManualClock::new());
    let mut coordinator = Coordinator::new(gateway.clone(), host.clone(), clock.clone(), settings);
    coordinator.refresh().await;
    Harness {
        gateway,
        host,
        clock,
        coordinator,
    }
}

#[tokio::test]
async fn test_nothing_due_means_no_refresh() {
    let mut h = started(CoordinatorSettings::default()).await;
    let reads = h.gateway.call_count("get_tabs");

    let report = h.coordinator.run_housekeeping().await;

    assert!(report.planned.is_empty());
    assert!(report.refresh.is_none());
    assert_eq!(h.gateway.call_count("get_tabs"), reads);
}

#[tokio::test]
async fn test_background_tab_is_frozen_then_discarded_from_freeze_point() {
    let mut h = started(CoordinatorSettings::default()).await;
    let background = h.coordinator.snapshot().tabs[1].id.clone();

    h.clock.advance(FREEZE);
    let report = h.coordinator.run_housekeeping().await;

    assert_eq!(report.applied, vec![HousekeepingAction::Freeze(background.clone())]);
    assert!(report.refresh.is_some());
    assert_eq!(h.coordinator.snapshot().tabs[1].state, TabState::Frozen);
    let frozen_at = h.clock.now();
    assert_eq!(h.coordinator.idle().last_interaction(&background), Some(frozen_at));

    h.clock.advance(DISCARD - Duration::from_secs(1));
    let report = h.coordinator.run_housekeeping().await;
    assert!(report.planned.is_empty(), "discard is measured from the freeze");

    h.clock.advance(Duration::from_secs(1));
    let report = h.coordinator.run_housekeeping().await;
    assert_eq!(report.applied, vec![HousekeepingAction::Discard(background.clone())]);
    assert_eq!(h.coordinator.snapshot().tabs[1].state, TabState::Discarded);
}

#[tokio::test]
async fn test_active_tab_survives_any_idle_time() {
    let mut h = started(CoordinatorSettings::default()).await;
    let active = h.coordinator.snapshot().active_id.clone().unwrap();

    h.clock.advance(DISCARD * 3);
    h.coordinator.run_housekeeping().await;
    h.clock.advance(DISCARD * 3);
    h.coordinator.run_housekeeping().await;

    let tab = h.gateway.get_active_tab().await.unwrap().unwrap();
    assert_eq!(tab.id, active);
    assert_eq!(tab.state, TabState::Active);
    assert_eq!(h.gateway.call_count("freeze_tab"), 1);
    assert!(h.host.surface(&active).is_some());
}

#[tokio::test]
async fn test_retained_surface_closed_before_freeze() {
    let mut settings = CoordinatorSettings::default();
    settings.surfaces.retain_background_surfaces = true;
    let mut h = started(settings).await;
    let tabs = h.coordinator.snapshot().tabs.clone();
    h.coordinator.activate(&tabs[1].id).await.unwrap();
    assert!(h.host.surface(&tabs[0].id).is_some());

    h.clock.advance(FREEZE);
    h.coordinator.run_housekeeping().await;

    assert!(h.host.surface(&tabs[0].id).is_none());
    assert_eq!(h.coordinator.snapshot().tabs[0].state, TabState::Frozen);
}

#[tokio::test]
async fn test_rejected_freeze_keeps_timestamp() {
    let mut h = started(CoordinatorSettings::default()).await;
    let background = h.coordinator.snapshot().tabs[1].id.clone();
    let stamped = h.coordinator.idle().last_interaction(&background);
    h.gateway.fail_next(
        "freeze_tab",
        GatewayError::rejected("freeze_tab", "media playing"),
    );

    h.clock.advance(FREEZE);
    let report = h.coordinator.run_housekeeping().await;

    assert!(report.applied.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].class, ErrorClass::OperationRejected);
    assert!(report.refresh.is_some(), "a requested transition always ends with a refresh");
    assert_eq!(h.coordinator.idle().last_interaction(&background), stamped);
    assert_eq!(h.coordinator.snapshot().tabs[1].state, TabState::Background);

    let retry = h.coordinator.run_housekeeping().await;
    assert_eq!(retry.applied, vec![HousekeepingAction::Freeze(background)]);
}

#[tokio::test]
async fn test_stale_snapshot_state_is_rejected_by_backend() {
    let mut h = started(CoordinatorSettings::default()).await;
    let background = h.coordinator.snapshot().tabs[1].id.clone();
    // The backend discarded the tab on its own; the cached snapshot still says background.
    h.gateway.set_state(&background, TabState::Discarded);

    h.clock.advance(FREEZE);
    let report = h.coordinator.run_housekeeping().await;

    assert_eq!(report.planned, vec![HousekeepingAction::Freeze(background.clone())]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].class, ErrorClass::OperationRejected);
    assert_eq!(h.coordinator.snapshot().tabs[1].state, TabState::Discarded);
}
