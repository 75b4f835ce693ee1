use crate::history::{JumpRecord, SeekHistory};
use crate::scheduler::TimerId;

/// Default minimum position change classified as a jump, in seconds.
pub const DEFAULT_JUMP_THRESHOLD_SECS: f64 = 5.0;

/// Tracking record for one media element that passed the seekability gate.
#[derive(Debug, Clone)]
pub struct TrackedElement {
    last_position: f64,
    ignore_next_sample: bool,
    history: SeekHistory,
    epoch: u64,
    sample_timer: TimerId,
}

impl TrackedElement {
    pub fn new(position: f64, epoch: u64, sample_timer: TimerId) -> Self {
        Self {
            last_position: position,
            ignore_next_sample: false,
            history: SeekHistory::default(),
            epoch,
            sample_timer,
        }
    }

    pub fn last_position(&self) -> f64 {
        self.last_position
    }

    pub fn ignores_next_sample(&self) -> bool {
        self.ignore_next_sample
    }

    pub fn history(&self) -> &SeekHistory {
        &self.history
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn sample_timer(&self) -> TimerId {
        self.sample_timer
    }

    /// Processes one sampling tick and returns the jump it recorded, if any.
    ///
    /// The suppression flag and the last position are updated on every
    /// tick, after classification.
    pub fn observe(&mut self, current: f64, is_active: bool, threshold: f64) -> Option<JumpRecord> {
        let diff = (current - self.last_position).abs();
        let jump = if diff > threshold && is_active && !self.ignore_next_sample {
            let jump = JumpRecord {
                from: self.last_position,
                to: current,
            };
            self.history.push(jump);
            Some(jump)
        } else {
            None
        };

        self.ignore_next_sample = false;
        self.last_position = current;
        jump
    }

    /// Pops the latest jump for an undo and suppresses the next sample.
    pub fn undo(&mut self) -> Option<JumpRecord> {
        let jump = self.history.undo()?;
        self.ignore_next_sample = true;
        Some(jump)
    }

    /// Re-applies the latest undone jump and suppresses the next sample.
    pub fn redo(&mut self) -> Option<JumpRecord> {
        let jump = self.history.redo()?;
        self.ignore_next_sample = true;
        Some(jump)
    }
}
