use std::collections::HashMap;

use tracing::debug;

use crate::api::Timer;
use crate::page::{ElementId, MediaState};
use crate::scheduler::{TimerId, TimerQueue};
use crate::time::Millis;

/// Outcome of offering one element to the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateOutcome {
    /// Seekable now; tracking should attach with this state.
    Ready(MediaState),
    /// Not seekable yet; the element waits for readiness signals.
    Waiting,
    /// Already waiting, or unreachable.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct WaitingEntry {
    timeout_timer: TimerId,
}

/// Holds elements that were discovered before they became seekable.
///
/// Each waiting entry owns exactly one timeout timer, released when the
/// entry leaves the gate by any path.
#[derive(Debug, Default)]
pub struct SeekabilityGate {
    waiting: HashMap<ElementId, WaitingEntry>,
}

impl SeekabilityGate {
    /// Offers `element` to the gate; `state` is `None` for unreachable nodes.
    pub fn offer(
        &mut self,
        element: ElementId,
        state: Option<MediaState>,
        timers: &mut TimerQueue<Timer>,
        timeout_at: Millis,
        epoch: u64,
    ) -> GateOutcome {
        if self.waiting.contains_key(&element) {
            return GateOutcome::Ignored;
        }
        let Some(state) = state else {
            return GateOutcome::Ignored;
        };
        if state.is_seekable() {
            return GateOutcome::Ready(state);
        }

        let timeout_timer = timers.schedule_once(timeout_at, Timer::GateTimeout { element, epoch });
        self.waiting.insert(element, WaitingEntry { timeout_timer });
        debug!(%element, timeout_at, "element not seekable yet, waiting");
        GateOutcome::Waiting
    }

    /// Re-checks a waiting element after a readiness signal.
    ///
    /// Returns the state to attach with once the element is seekable. An
    /// unreachable element is released.
    pub fn recheck(
        &mut self,
        element: ElementId,
        state: Option<MediaState>,
        timers: &mut TimerQueue<Timer>,
    ) -> Option<MediaState> {
        if !self.waiting.contains_key(&element) {
            return None;
        }
        let Some(state) = state else {
            self.release(element, timers);
            return None;
        };
        if !state.is_seekable() {
            return None;
        }
        self.release(element, timers);
        Some(state)
    }

    /// Removes an entry whose timeout timer has just fired.
    pub fn expire(&mut self, element: ElementId) -> bool {
        self.waiting.remove(&element).is_some()
    }

    /// Removes an entry and cancels its timeout.
    pub fn release(&mut self, element: ElementId, timers: &mut TimerQueue<Timer>) -> bool {
        let Some(entry) = self.waiting.remove(&element) else {
            return false;
        };
        timers.cancel(entry.timeout_timer);
        true
    }

    /// Releases every entry. Returns how many were waiting.
    pub fn release_all(&mut self, timers: &mut TimerQueue<Timer>) -> usize {
        let count = self.waiting.len();
        for (_, entry) in self.waiting.drain() {
            timers.cancel(entry.timeout_timer);
        }
        count
    }

    pub fn is_waiting(&self, element: ElementId) -> bool {
        self.waiting.contains_key(&element)
    }

    pub fn waiting(&self) -> Vec<ElementId> {
        let mut elements: Vec<ElementId> = self.waiting.keys().copied().collect();
        elements.sort();
        elements
    }
}
