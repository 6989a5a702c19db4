// Coordinator-local state managers.
// Surfaces, idle timestamps, drag gestures, notifications. None of them talk to the backend.

pub mod drag_controller;
pub mod idle_tracker;
pub mod notification_center;
pub mod surface_manager;
