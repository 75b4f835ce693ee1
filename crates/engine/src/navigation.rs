use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::Timer;
use crate::scheduler::{TimerId, TimerQueue};
use crate::time::Millis;

/// Raw signals that may indicate an SPA navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationSignal {
    /// `history.pushState` / `history.replaceState` was called.
    HistoryApi,
    PopState,
    HashChange,
}

/// Session window between two navigation resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEpoch {
    pub index: u64,
    pub location: String,
}

/// Coalesces raw navigation signals into one location check.
///
/// Every raw signal (re)arms a single pending check; the check itself only
/// reports a change when the location differs from the current epoch's.
#[derive(Debug)]
pub struct NavigationWatcher {
    epoch: NavigationEpoch,
    pending_check: Option<TimerId>,
    poll_timer: Option<TimerId>,
}

impl NavigationWatcher {
    pub fn new(location: String) -> Self {
        Self {
            epoch: NavigationEpoch { index: 0, location },
            pending_check: None,
            poll_timer: None,
        }
    }

    pub fn epoch(&self) -> &NavigationEpoch {
        &self.epoch
    }

    pub fn has_pending_check(&self) -> bool {
        self.pending_check.is_some()
    }

    /// Starts the fallback poll.
    pub fn start_polling(&mut self, timers: &mut TimerQueue<Timer>, now: Millis, interval: Millis) {
        if let Some(previous) = self.poll_timer.take() {
            timers.cancel(previous);
        }
        self.poll_timer =
            Some(timers.schedule_every(now.saturating_add(interval), interval, Timer::NavigationPoll));
    }

    /// Cancels any pending check and schedules a fresh one at `due`.
    pub fn request_check(&mut self, timers: &mut TimerQueue<Timer>, due: Millis) {
        if let Some(previous) = self.pending_check.take() {
            timers.cancel(previous);
            debug!(due, "navigation check rescheduled");
        }
        self.pending_check = Some(timers.schedule_once(due, Timer::NavigationCheck));
    }

    /// Runs the pending check against `location`.
    ///
    /// Returns the new epoch when the location changed.
    pub fn check(&mut self, location: String) -> Option<&NavigationEpoch> {
        self.pending_check = None;
        if location == self.epoch.location {
            return None;
        }
        self.epoch = NavigationEpoch {
            index: self.epoch.index + 1,
            location,
        };
        Some(&self.epoch)
    }

    /// Cancels the poll and any pending check.
    pub fn stop(&mut self, timers: &mut TimerQueue<Timer>) {
        for timer in [self.pending_check.take(), self.poll_timer.take()]
            .into_iter()
            .flatten()
        {
            timers.cancel(timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NavigationWatcher;
    use crate::api::Timer;
    use crate::scheduler::TimerQueue;

    #[test]
    fn repeated_requests_keep_a_single_pending_check() {
        let mut timers = TimerQueue::<Timer>::new();
        let mut watcher = NavigationWatcher::new("https://example.test/a".to_owned());

        watcher.request_check(&mut timers, 0);
        watcher.request_check(&mut timers, 0);
        watcher.request_check(&mut timers, 0);

        assert_eq!(timers.len(), 1);
        assert!(watcher.has_pending_check());
    }

    #[test]
    fn unchanged_location_is_discarded() {
        let mut watcher = NavigationWatcher::new("https://example.test/a".to_owned());

        assert!(watcher.check("https://example.test/a".to_owned()).is_none());
        assert_eq!(watcher.epoch().index, 0);
    }

    #[test]
    fn changed_location_advances_epoch() {
        let mut watcher = NavigationWatcher::new("https://example.test/a".to_owned());

        let epoch = watcher
            .check("https://example.test/b".to_owned())
            .expect("location changed")
            .clone();

        assert_eq!(epoch.index, 1);
        assert_eq!(epoch.location, "https://example.test/b");
        assert!(!watcher.has_pending_check());
    }

    #[test]
    fn stop_cancels_poll_and_pending_check() {
        let mut timers = TimerQueue::<Timer>::new();
        let mut watcher = NavigationWatcher::new("https://example.test/a".to_owned());
        watcher.start_polling(&mut timers, 0, 1_000);
        watcher.request_check(&mut timers, 0);

        watcher.stop(&mut timers);

        assert!(timers.is_empty());
    }
}
