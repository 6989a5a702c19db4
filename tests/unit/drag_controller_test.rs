//! Drag gesture state machine, and the single backend request a finished drag makes.

use std::sync::Arc;

use rstest::rstest;
use tabweave::coordinator::Coordinator;
use tabweave::gateway::memory::InMemoryGateway;
use tabweave::gateway::RemoteStateGateway;
use tabweave::host::headless::HeadlessHost;
use tabweave::managers::drag_controller::{
    DragController, DragControllerTrait, DragOutcome, DropTarget,
};
use tabweave::managers::idle_tracker::IdleTrackerTrait;
use tabweave::services::clock::ManualClock;
use tabweave::types::errors::CoordinatorError;
use tabweave::types::geometry::{Point, Region};
use tabweave::types::settings::CoordinatorSettings;

fn window() -> Region {
    Region::new(0.0, 0.0, 1280.0, 800.0)
}

// === Controller ===

#[test]
fn test_begin_tracks_dragged_tab() {
    let mut drag = DragController::new();
    assert!(!drag.is_dragging());

    drag.begin("t1");

    assert!(drag.is_dragging());
    assert_eq!(drag.dragging_id(), Some("t1"));
    assert_eq!(drag.hover_target(), None);
}

#[test]
fn test_hover_updates_target() {
    let mut drag = DragController::new();
    drag.begin("t1");

    drag.hover(Some(DropTarget::Tab(2))).unwrap();
    assert_eq!(drag.hover_target(), Some(DropTarget::Tab(2)));

    drag.hover(None).unwrap();
    assert_eq!(drag.hover_target(), None);
}

#[test]
fn test_hover_without_drag_fails() {
    let mut drag = DragController::new();
    assert_eq!(
        drag.hover(Some(DropTarget::ListEnd)),
        Err(CoordinatorError::NoDragInProgress)
    );
}

#[rstest]
#[case(DropTarget::Tab(0), 4, 0)]
#[case(DropTarget::Tab(2), 4, 2)]
#[case(DropTarget::Tab(9), 4, 3)]
#[case(DropTarget::ListEnd, 4, 3)]
#[case(DropTarget::ListEnd, 1, 0)]
fn test_drop_resolves_index(
    #[case] target: DropTarget,
    #[case] tab_count: usize,
    #[case] expected: usize,
) {
    let mut drag = DragController::new();
    drag.begin("t1");

    let outcome = drag.drop_on(target, tab_count).unwrap();

    assert_eq!(
        outcome,
        DragOutcome::Reorder {
            tab_id: "t1".to_string(),
            new_index: expected
        }
    );
    assert!(!drag.is_dragging());
}

#[test]
fn test_drop_without_drag_fails() {
    let mut drag = DragController::new();
    assert_eq!(
        drag.drop_on(DropTarget::ListEnd, 3),
        Err(CoordinatorError::NoDragInProgress)
    );
}

#[test]
fn test_end_outside_window_detaches() {
    let mut drag = DragController::new();
    drag.begin("t1");

    let outcome = drag.end(Point::new(1500.0, 300.0), window());

    assert_eq!(
        outcome,
        DragOutcome::Detach {
            tab_id: "t1".to_string()
        }
    );
    assert!(!drag.is_dragging());
}

#[test]
fn test_end_inside_window_cancels() {
    let mut drag = DragController::new();
    drag.begin("t1");
    assert_eq!(drag.end(Point::new(640.0, 10.0), window()), DragOutcome::Cancelled);
}

#[test]
fn test_end_after_drop_is_noop() {
    let mut drag = DragController::new();
    drag.begin("t1");
    drag.drop_on(DropTarget::Tab(0), 3).unwrap();

    assert_eq!(drag.end(Point::new(-50.0, -50.0), window()), DragOutcome::Cancelled);
}

#[test]
fn test_cancel_returns_to_idle() {
    let mut drag = DragController::new();
    drag.begin("t1");
    drag.cancel();
    assert!(!drag.is_dragging());
}

// === Coordinator ===

async fn coordinator(urls: &[&str]) -> (Arc<InMemoryGateway>, Arc<HeadlessHost>, Coordinator) {
    let gateway = Arc::new(InMemoryGateway::with_tabs(urls));
    let host = Arc::new(HeadlessHost::new());
    let mut c = Coordinator::new(
        gateway.clone(),
        host.clone(),
        Arc::new(ManualClock::new()),
        CoordinatorSettings::default(),
    );
    c.refresh().await;
    (gateway, host, c)
}

#[tokio::test]
async fn test_drop_issues_single_reorder() {
    let (gateway, _host, mut c) = coordinator(&["https://a.test", "https://b.test", "https://c.test"]).await;
    let first = c.snapshot().tabs[0].id.clone();

    c.begin_drag(&first);
    c.hover_drag(Some(DropTarget::Tab(1))).unwrap();
    let result = c.drop_drag(DropTarget::ListEnd).await.unwrap();

    assert_eq!(
        result.outcome,
        DragOutcome::Reorder {
            tab_id: first.clone(),
            new_index: 2
        }
    );
    assert_eq!(gateway.call_count("reorder_tab"), 1);
    assert_eq!(c.snapshot().tabs[2].id, first);
    assert!(!c.drag().is_dragging());
}

#[tokio::test]
async fn test_drop_onto_own_slot_still_reorders() {
    let (gateway, _host, mut c) = coordinator(&["https://a.test", "https://b.test"]).await;
    let first = c.snapshot().tabs[0].id.clone();

    c.begin_drag(&first);
    c.drop_drag(DropTarget::Tab(0)).await.unwrap();

    assert_eq!(gateway.call_count("reorder_tab"), 1);
    assert_eq!(c.snapshot().tabs[0].id, first);
}

#[tokio::test]
async fn test_detach_closes_surface_and_opens_window() {
    let (gateway, host, mut c) = coordinator(&["https://a.test", "https://b.test"]).await;
    let active = c.snapshot().active_id.clone().unwrap();
    assert!(host.surface(&active).is_some());

    c.begin_drag(&active);
    let result = c.end_drag(Point::new(-20.0, 400.0), window()).await.unwrap();

    assert_eq!(result.outcome, DragOutcome::Detach { tab_id: active.clone() });
    let info = result.window.unwrap();
    assert_eq!(info.tab.unwrap().id, active);
    assert_eq!(gateway.windows().len(), 1);
    assert!(host.surface(&active).is_none());
    assert_eq!(c.snapshot().tabs.len(), 1);
    assert!(c.snapshot().position_of(&active).is_none());
    assert!(c.idle().entries().get(&active).is_none());
}

#[tokio::test]
async fn test_cancelled_drag_makes_no_request() {
    let (gateway, _host, mut c) = coordinator(&["https://a.test", "https://b.test"]).await;
    let id = c.snapshot().tabs[1].id.clone();
    let before = gateway.calls().len();

    c.begin_drag(&id);
    let result = c.end_drag(Point::new(100.0, 100.0), window()).await.unwrap();

    assert_eq!(result.outcome, DragOutcome::Cancelled);
    assert!(result.window.is_none());
    assert_eq!(gateway.calls().len(), before);
}

#[tokio::test]
async fn test_rejected_detach_still_refreshes() {
    let (gateway, _host, mut c) = coordinator(&["https://a.test", "https://b.test"]).await;
    let id = c.snapshot().tabs[1].id.clone();
    gateway.fail_next(
        "detach_tab_to_new_window",
        tabweave::types::errors::GatewayError::rejected("detach_tab_to_new_window", "pinned"),
    );
    let reads = gateway.call_count("get_tabs");

    c.begin_drag(&id);
    let err = c.end_drag(Point::new(5000.0, 0.0), window()).await.unwrap_err();

    assert!(matches!(err, CoordinatorError::Gateway(_)));
    assert_eq!(gateway.call_count("get_tabs"), reads + 1);
    assert_eq!(gateway.get_tabs().await.unwrap().len(), 2);
}
