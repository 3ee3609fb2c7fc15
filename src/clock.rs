/// Converts wall-clock time into a count of frames due.
///
/// The host samples its clock at whatever rate it likes; each sample yields the
/// frames that became due since the previous one, so a late sample catches up
/// in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    frame_rate: f64,
    start: Option<f64>,
    delivered: u64,
}

impl FrameClock {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            frame_rate,
            start: None,
            delivered: 0,
        }
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Frames due at `now` (seconds) that have not been delivered yet.
    ///
    /// The first sample starts the clock and yields nothing.
    pub fn elapsed_frames(&mut self, now: f64) -> u64 {
        let start = *self.start.get_or_insert(now);
        let due = ((now - start) * self.frame_rate).floor();
        if !due.is_finite() || due <= 0.0 {
            return 0;
        }
        let due = due as u64;
        let elapsed = due.saturating_sub(self.delivered);
        self.delivered = self.delivered.max(due);
        elapsed
    }

    pub fn reset(&mut self) {
        self.start = None;
        self.delivered = 0;
    }
}
