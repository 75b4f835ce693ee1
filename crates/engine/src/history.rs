use serde::{Deserialize, Serialize};

/// One recorded seek: playback moved from `from` to `to` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpRecord {
    pub from: f64,
    pub to: f64,
}

/// Linear undo/redo stacks of jumps for one media element.
///
/// Pushing a new jump clears the redo stack, so history never branches.
///
/// # Example
/// ```
/// use engine::history::{JumpRecord, SeekHistory};
///
/// let mut history = SeekHistory::default();
/// history.push(JumpRecord { from: 10.9, to: 120.0 });
///
/// let undone = history.undo().expect("one jump recorded");
/// assert_eq!(undone.from, 10.9);
/// assert_eq!(history.redo_len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeekHistory {
    undo: Vec<JumpRecord>,
    redo: Vec<JumpRecord>,
}

impl SeekHistory {
    pub fn push(&mut self, jump: JumpRecord) {
        self.undo.push(jump);
        self.redo.clear();
    }

    /// Moves the most recent jump to the redo stack and returns it.
    pub fn undo(&mut self) -> Option<JumpRecord> {
        let jump = self.undo.pop()?;
        self.redo.push(jump);
        Some(jump)
    }

    /// Moves the most recently undone jump back to the undo stack.
    pub fn redo(&mut self) -> Option<JumpRecord> {
        let jump = self.redo.pop()?;
        self.undo.push(jump);
        Some(jump)
    }

    pub fn undo_stack(&self) -> &[JumpRecord] {
        &self.undo
    }

    pub fn redo_stack(&self) -> &[JumpRecord] {
        &self.redo
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}
