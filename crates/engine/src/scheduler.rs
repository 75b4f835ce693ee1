use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::time::Millis;

/// Handle returned when scheduling a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct TimerEntry<T> {
    due: Millis,
    seq: u64,
    interval: Option<Millis>,
    payload: T,
}

/// Virtual-time timer queue with one-shot and repeating timers.
///
/// Timers fire in `(due, scheduling order)` order. A repeating timer keeps
/// its id across firings until it is canceled.
///
/// # Example
/// ```
/// use engine::scheduler::TimerQueue;
///
/// let mut timers = TimerQueue::new();
/// let tick = timers.schedule_every(500, 500, "tick");
/// timers.schedule_once(200, "once");
///
/// assert_eq!(timers.pop_due(1_000).map(|(_, p, due)| (p, due)), Some(("once", 200)));
/// assert_eq!(timers.pop_due(1_000).map(|(id, _, due)| (id, due)), Some((tick, 500)));
/// assert_eq!(timers.pop_due(1_000).map(|(_, _, due)| due), Some(1_000));
/// assert!(timers.pop_due(1_000).is_none());
/// ```
#[derive(Debug)]
pub struct TimerQueue<T> {
    order: BTreeMap<(Millis, u64), TimerId>,
    entries: HashMap<TimerId, TimerEntry<T>>,
    next_id: u64,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            entries: HashMap::new(),
            next_id: 1,
            next_seq: 0,
        }
    }

    /// Schedules `payload` to fire once at `due`.
    pub fn schedule_once(&mut self, due: Millis, payload: T) -> TimerId {
        self.insert(due, None, payload)
    }

    /// Schedules `payload` at `first_due` and then every `interval`.
    ///
    /// `interval` must be positive.
    pub fn schedule_every(&mut self, first_due: Millis, interval: Millis, payload: T) -> TimerId {
        assert!(interval > 0, "repeating timer interval must be positive");
        self.insert(first_due, Some(interval), payload)
    }

    /// Cancels a timer. Returns false when it already fired or was canceled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        let _ = self.order.remove(&(entry.due, entry.seq));
        true
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of scheduled timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Due time of the earliest timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.order.keys().next().map(|(due, _)| *due)
    }

    fn insert(&mut self, due: Millis, interval: Option<Millis>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.allocate_seq();
        self.order.insert((due, seq), id);
        self.entries.insert(
            id,
            TimerEntry {
                due,
                seq,
                interval,
                payload,
            },
        );
        id
    }

    fn allocate_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Removes the earliest timer due at or before `now`.
    ///
    /// Repeating timers are re-armed at `due + interval` before returning.
    pub fn pop_due(&mut self, now: Millis) -> Option<(TimerId, T, Millis)> {
        let (&(due, seq), &id) = self.order.iter().next()?;
        if due > now {
            return None;
        }
        let _ = self.order.remove(&(due, seq));

        let interval = self.entries.get(&id)?.interval;
        match interval {
            Some(interval) => {
                let next_seq = self.allocate_seq();
                let entry = self.entries.get_mut(&id)?;
                entry.due = due.saturating_add(interval);
                entry.seq = next_seq;
                let payload = entry.payload.clone();
                self.order.insert((entry.due, entry.seq), id);
                Some((id, payload, due))
            }
            None => {
                let entry = self.entries.remove(&id)?;
                Some((id, entry.payload, due))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TimerQueue;

    #[test]
    fn timers_with_equal_due_fire_in_scheduling_order() {
        let mut timers = TimerQueue::new();
        timers.schedule_once(100, 'a');
        timers.schedule_once(100, 'b');
        timers.schedule_once(50, 'c');

        let fired: Vec<char> = std::iter::from_fn(|| timers.pop_due(100))
            .map(|(_, payload, _)| payload)
            .collect();

        assert_eq!(fired, vec!['c', 'a', 'b']);
    }

    #[test]
    fn canceled_timer_never_fires_and_cancel_is_reported_once() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_once(10, ());

        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.pop_due(100).is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn one_shot_timer_is_gone_after_firing() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_once(10, ());

        assert!(timers.pop_due(10).is_some());
        assert!(!timers.is_scheduled(id));
        assert!(!timers.cancel(id));
    }

    #[test]
    fn repeating_timer_rearms_until_canceled() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_every(500, 500, ());

        let dues: Vec<u64> = std::iter::from_fn(|| timers.pop_due(1_600))
            .map(|(_, _, due)| due)
            .collect();

        assert_eq!(dues, vec![500, 1_000, 1_500]);
        assert_eq!(timers.next_due(), Some(2_000));
        assert!(timers.cancel(id));
        assert_eq!(timers.next_due(), None);
    }
}
