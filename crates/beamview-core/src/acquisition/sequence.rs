use tracing::warn;

/// Counts frames the driver dropped, from the camera's embedded counter.
///
/// The counter wraps at `2^bit_width`, so all differences are taken modulo
/// that. A step of exactly one is a clean hand-off; anything else means
/// `delta - 1` frames never reached us.
#[derive(Clone, Debug)]
pub struct FrameSequenceTracker {
    modulus: u64,
    last: Option<u64>,
    dropped: u64,
    gap_events: u64,
    observed: u64,
}

impl FrameSequenceTracker {
    /// `bit_width` is clamped to 1..=32.
    pub fn new(bit_width: u32) -> Self {
        let bits = bit_width.clamp(1, 32);
        Self {
            modulus: 1u64 << bits,
            last: None,
            dropped: 0,
            gap_events: 0,
            observed: 0,
        }
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Record the next counter value; returns the frames dropped since the
    /// previous one.
    pub fn observe(&mut self, seq: u32) -> u64 {
        let seq = seq as u64 % self.modulus;
        self.observed += 1;

        let Some(last) = self.last.replace(seq) else {
            return 0;
        };

        let delta = (seq + self.modulus - last) % self.modulus;
        if delta == 1 {
            return 0;
        }

        // delta == 0 (repeated counter) wraps all the way around.
        let lost = (delta + self.modulus - 1) % self.modulus;
        self.dropped += lost;
        self.gap_events += 1;
        warn!(last, current = seq, lost, total = self.dropped, "Frame gap detected");
        lost
    }

    /// Forget the last counter value (e.g. after a reconnect). The running
    /// total is kept.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped
    }

    pub fn gap_events(&self) -> u64 {
        self.gap_events
    }

    pub fn frames_observed(&self) -> u64 {
        self.observed
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

impl Default for FrameSequenceTracker {
    fn default() -> Self {
        Self::new(crate::consts::SEQUENCE_BIT_WIDTH)
    }
}
