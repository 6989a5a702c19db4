//! Drag/Reorder Controller.
//!
//! Turns a pointer drag on the tab strip into at most one structural request.
//! The controller never touches the tab list itself; it only decides.
//!
//! ```text
//! idle ──begin──▶ dragging ──drop_on──▶ Reorder
//!                    │
//!                    └──────end──────▶ Detach (pointer outside window) | Cancelled
//! ```

use serde::{Deserialize, Serialize};

use crate::types::errors::CoordinatorError;
use crate::types::geometry::{Point, Region};
use crate::types::tab::TabId;

/// Where a dragged tab is currently over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum DropTarget {
    /// The tab at this position in the strip.
    Tab(usize),
    /// Empty space after the last tab.
    ListEnd,
}

/// What a finished drag asks the backend to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DragOutcome {
    Reorder { tab_id: TabId, new_index: usize },
    Detach { tab_id: TabId },
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum DragState {
    #[default]
    Idle,
    Dragging {
        tab_id: TabId,
        hover: Option<DropTarget>,
    },
}

/// Trait defining the drag gesture protocol.
pub trait DragControllerTrait {
    fn begin(&mut self, tab_id: &str);
    fn hover(&mut self, target: Option<DropTarget>) -> Result<(), CoordinatorError>;
    fn drop_on(
        &mut self,
        target: DropTarget,
        tab_count: usize,
    ) -> Result<DragOutcome, CoordinatorError>;
    fn end(&mut self, pointer: Point, window: Region) -> DragOutcome;
    fn cancel(&mut self);
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { tab_id, .. } => Some(tab_id),
            DragState::Idle => None,
        }
    }

    /// Drop target to highlight while dragging.
    pub fn hover_target(&self) -> Option<DropTarget> {
        match &self.state {
            DragState::Dragging { hover, .. } => *hover,
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }
}

impl DragControllerTrait for DragController {
    /// Starts a drag, replacing any unfinished one.
    fn begin(&mut self, tab_id: &str) {
        self.state = DragState::Dragging {
            tab_id: tab_id.to_string(),
            hover: None,
        };
    }

    fn hover(&mut self, target: Option<DropTarget>) -> Result<(), CoordinatorError> {
        match &mut self.state {
            DragState::Dragging { hover, .. } => {
                *hover = target;
                Ok(())
            }
            DragState::Idle => Err(CoordinatorError::NoDragInProgress),
        }
    }

    /// A drop target accepted the tab. Dropping on the list end targets the last slot.
    fn drop_on(
        &mut self,
        target: DropTarget,
        tab_count: usize,
    ) -> Result<DragOutcome, CoordinatorError> {
        let DragState::Dragging { tab_id, .. } = std::mem::take(&mut self.state) else {
            return Err(CoordinatorError::NoDragInProgress);
        };
        let last = tab_count.saturating_sub(1);
        let new_index = match target {
            DropTarget::Tab(i) => i.min(last),
            DropTarget::ListEnd => last,
        };
        Ok(DragOutcome::Reorder { tab_id, new_index })
    }

    /// The drag gesture finished without a drop target taking it.
    ///
    /// Released outside `window` detaches the tab; anything else cancels.
    /// Calling this after [`Self::drop_on`] already finished the drag is a no-op.
    fn end(&mut self, pointer: Point, window: Region) -> DragOutcome {
        let DragState::Dragging { tab_id, .. } = std::mem::take(&mut self.state) else {
            return DragOutcome::Cancelled;
        };
        if window.contains(pointer) {
            DragOutcome::Cancelled
        } else {
            DragOutcome::Detach { tab_id }
        }
    }

    fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}
