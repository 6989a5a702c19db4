// Shared type definitions
// Each submodule defines types used across the coordinator.

pub mod errors;
pub mod event;
pub mod geometry;
pub mod navigation;
pub mod notification;
pub mod settings;
pub mod snapshot;
pub mod tab;
