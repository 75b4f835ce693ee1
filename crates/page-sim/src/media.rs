use crate::error::{Result, SimError};

/// `HTMLMediaElement.readyState` levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    /// Numeric level as exposed by the DOM.
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// One seekable time range in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// Playback state of one simulated media element.
///
/// A fresh element has no metadata: its duration is NaN and it exposes no
/// seekable range, mirroring a `<video>` whose source is still loading.
#[derive(Debug, Clone, PartialEq)]
pub struct SimMedia {
    position: f64,
    duration: f64,
    seekable: Vec<TimeRange>,
    paused: bool,
    ended: bool,
    ready_state: ReadyState,
}

impl Default for SimMedia {
    fn default() -> Self {
        Self::unloaded()
    }
}

impl SimMedia {
    /// Element whose metadata has not loaded yet.
    pub fn unloaded() -> Self {
        Self {
            position: 0.0,
            duration: f64::NAN,
            seekable: Vec::new(),
            paused: true,
            ended: false,
            ready_state: ReadyState::HaveNothing,
        }
    }

    /// Fully buffered, paused element of `duration` seconds.
    ///
    /// # Example
    /// ```
    /// use page_sim::SimMedia;
    ///
    /// let media = SimMedia::loaded(600.0).expect("valid duration");
    /// assert!(media.paused());
    /// assert_eq!(media.seekable().len(), 1);
    /// ```
    pub fn loaded(duration: f64) -> Result<Self> {
        let mut media = Self::unloaded();
        media.load_metadata(duration)?;
        media.ready_state = ReadyState::HaveEnoughData;
        Ok(media)
    }

    /// Live stream: infinite duration and nothing seekable.
    pub fn live() -> Self {
        Self {
            duration: f64::INFINITY,
            ready_state: ReadyState::HaveEnoughData,
            ..Self::unloaded()
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn seekable(&self) -> &[TimeRange] {
        &self.seekable
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Applies loaded metadata. A finite duration makes `[0, duration]`
    /// seekable; an infinite one leaves the element unseekable.
    pub fn load_metadata(&mut self, duration: f64) -> Result<()> {
        if duration.is_nan() || duration < 0.0 {
            return Err(SimError::InvalidDuration(duration));
        }
        self.duration = duration;
        self.seekable.clear();
        if duration.is_finite() && duration > 0.0 {
            self.seekable.push(TimeRange {
                start: 0.0,
                end: duration,
            });
        }
        if self.ready_state < ReadyState::HaveMetadata {
            self.ready_state = ReadyState::HaveMetadata;
        }
        self.position = self.clamp(self.position);
        Ok(())
    }

    pub fn set_ready_state(&mut self, ready_state: ReadyState) {
        self.ready_state = ready_state;
    }

    pub fn play(&mut self) {
        if self.ended {
            self.position = 0.0;
            self.ended = false;
        }
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Moves the playback position, clamped to the known duration.
    pub fn seek(&mut self, to: f64) -> Result<()> {
        if !to.is_finite() {
            return Err(SimError::InvalidPosition(to));
        }
        self.position = self.clamp(to);
        if self.ended && self.position < self.duration {
            self.ended = false;
        }
        Ok(())
    }

    /// Advances a playing element by `ms` of wall-clock time at 1x rate.
    ///
    /// Playback moves on a millisecond grid, so repeated small steps land
    /// on the same position as one large step.
    pub fn advance(&mut self, ms: u64) {
        if self.paused || self.ended {
            return;
        }
        let position_ms = (self.position * 1_000.0).round() + ms as f64;
        self.position = position_ms / 1_000.0;
        if self.duration.is_finite() && self.position >= self.duration {
            self.position = self.duration;
            self.ended = true;
            self.paused = true;
        }
    }

    fn clamp(&self, position: f64) -> f64 {
        let lower = position.max(0.0);
        if self.duration.is_finite() {
            lower.min(self.duration)
        } else {
            lower
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadyState, SimMedia};

    #[test]
    fn unloaded_media_has_no_seekable_range() {
        let media = SimMedia::unloaded();

        assert!(media.duration().is_nan());
        assert!(media.seekable().is_empty());
        assert_eq!(media.ready_state(), ReadyState::HaveNothing);
    }

    #[test]
    fn load_metadata_with_infinite_duration_keeps_media_unseekable() {
        let mut media = SimMedia::unloaded();

        media
            .load_metadata(f64::INFINITY)
            .expect("infinite duration is accepted");

        assert!(media.seekable().is_empty());
        assert_eq!(media.ready_state(), ReadyState::HaveMetadata);
    }

    #[test]
    fn seek_clamps_to_duration() {
        let mut media = SimMedia::loaded(30.0).expect("valid duration");

        media.seek(45.0).expect("finite seek");
        assert_eq!(media.position(), 30.0);

        media.seek(-3.0).expect("finite seek");
        assert_eq!(media.position(), 0.0);
    }

    #[test]
    fn advance_stops_at_duration_and_marks_ended() {
        let mut media = SimMedia::loaded(1.0).expect("valid duration");
        media.play();

        media.advance(1_500);

        assert_eq!(media.position(), 1.0);
        assert!(media.ended());
        assert!(media.paused());
    }

    #[test]
    fn sliced_advance_matches_a_single_step() {
        let mut sliced = SimMedia::loaded(60.0).expect("valid duration");
        sliced.play();
        let mut whole = sliced.clone();

        for _ in 0..10 {
            sliced.advance(100);
        }
        whole.advance(1_000);

        assert_eq!(sliced.position(), 1.0);
        assert_eq!(sliced.position(), whole.position());
    }

    #[test]
    fn paused_media_does_not_advance() {
        let mut media = SimMedia::loaded(10.0).expect("valid duration");

        media.advance(2_000);

        assert_eq!(media.position(), 0.0);
    }
}
