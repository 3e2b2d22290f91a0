use crate::consts::DEFAULT_SERIES_CAPACITY;

/// Fixed-size scrolling time series of one scalar per frame.
///
/// New values overwrite the oldest in place; the slot just after the write
/// position is kept NaN so a plot of the raw buffer shows a gap where the
/// newest data meets the oldest.
#[derive(Clone, Debug)]
pub struct ScrollingSeries {
    values: Vec<f64>,
    pos: usize,
    pushed: u64,
}

impl ScrollingSeries {
    /// `capacity` is clamped to at least 2 so the gap never hides the
    /// newest value.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![f64::NAN; capacity.max(2)],
            pos: 0,
            pushed: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn push(&mut self, value: f64) {
        let n = self.values.len();
        self.values[self.pos] = value;
        self.pos = (self.pos + 1) % n;
        self.values[self.pos] = f64::NAN;
        self.pushed += 1;
    }

    /// Raw ring buffer, including the NaN gap.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Index the next value will be written to.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total values ever pushed.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    pub fn latest(&self) -> Option<f64> {
        if self.pushed == 0 {
            return None;
        }
        let n = self.values.len();
        Some(self.values[(self.pos + n - 1) % n])
    }

    /// Stored values oldest first, without the gap.
    pub fn chronological(&self) -> Vec<f64> {
        let n = self.values.len();
        (1..=n)
            .map(|i| self.values[(self.pos + i) % n])
            .filter(|v| !v.is_nan())
            .collect()
    }

    pub fn clear(&mut self) {
        self.values.fill(f64::NAN);
        self.pos = 0;
        self.pushed = 0;
    }
}

impl Default for ScrollingSeries {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_CAPACITY)
    }
}
