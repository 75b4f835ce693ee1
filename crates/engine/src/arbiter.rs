use tracing::info;

use crate::page::ElementId;

/// Picks the single element that receives undo/redo shortcuts.
///
/// Last writer wins over playback starts; pausing never clears the choice.
#[derive(Debug, Default)]
pub struct ActiveElementArbiter {
    active: Option<ElementId>,
}

impl ActiveElementArbiter {
    pub fn active(&self) -> Option<ElementId> {
        self.active
    }

    pub fn is_active(&self, element: ElementId) -> bool {
        self.active == Some(element)
    }

    /// Called when tracking attaches. Returns true if `element` became active.
    pub fn on_attach(&mut self, element: ElementId, playing: bool) -> bool {
        if !playing {
            return false;
        }
        self.switch_to(element)
    }

    /// Called when a tracked element starts playing.
    pub fn on_playback_started(&mut self, element: ElementId) -> bool {
        self.switch_to(element)
    }

    /// Drops `element` if it is the active one.
    pub fn forget(&mut self, element: ElementId) -> bool {
        if self.active == Some(element) {
            self.active = None;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    fn switch_to(&mut self, element: ElementId) -> bool {
        if self.active == Some(element) {
            return false;
        }
        let previous = self.active.replace(element);
        info!(%element, ?previous, "active element switched");
        true
    }
}
