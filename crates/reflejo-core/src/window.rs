//! Time-bounded rolling windows for mean and quantile statistics.
//!
//! [`TimedWindow`] keeps the last `window_ms` of `(time, value)` samples in a
//! ring and answers windowed means; [`QuantileWindow`] layers quantile
//! queries on top for adaptive normalization. Windows are keyed by the
//! frame clock, not by sample count, so a variable tick rate still covers
//! the same wall-clock span.

#[cfg(not(feature = "std"))]
use alloc::{collections::VecDeque, vec::Vec};
#[cfg(feature = "std")]
use std::collections::VecDeque;

/// Rolling window of `(time, value)` samples bounded by a wall-clock span.
#[derive(Debug, Clone)]
pub struct TimedWindow {
    window_ms: f64,
    samples: VecDeque<(f64, f64)>,
}

impl TimedWindow {
    /// Creates a window spanning `window_ms` milliseconds.
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms: window_ms.max(0.0),
            samples: VecDeque::new(),
        }
    }

    /// Updates the span. A shrunken span evicts on the next push.
    pub fn set_window_ms(&mut self, window_ms: f64) {
        self.window_ms = window_ms.max(0.0);
    }

    /// Pushes a sample at `time` (seconds) and evicts everything older than
    /// the span.
    ///
    /// Time running backwards (a seek) clears the window: stale future
    /// samples would otherwise poison the statistics until they age out.
    pub fn push(&mut self, value: f64, time: f64) {
        if let Some(&(last_time, _)) = self.samples.back()
            && time < last_time
        {
            self.samples.clear();
        }
        self.samples.push_back((time, value));
        let horizon = time - self.window_ms / 1000.0;
        while let Some(&(t, _)) = self.samples.front() {
            if t < horizon {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Arithmetic mean of the live window, 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|&(_, v)| v).sum();
        sum / self.samples.len() as f64
    }

    /// Number of live samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copies the live values out, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|&(_, v)| v).collect()
    }

    /// Drops all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Rolling window with quantile queries, for adaptive normalization.
///
/// Quantiles are computed exactly by sorted selection over the live window.
/// At render tick rates the window holds a few hundred samples, so the sort
/// is cheaper than maintaining an approximate histogram.
#[derive(Debug, Clone)]
pub struct QuantileWindow {
    window: TimedWindow,
    scratch: Vec<f64>,
}

impl QuantileWindow {
    /// Creates a quantile window spanning `window_ms` milliseconds.
    pub fn new(window_ms: f64) -> Self {
        Self {
            window: TimedWindow::new(window_ms),
            scratch: Vec::new(),
        }
    }

    /// Updates the span.
    pub fn set_window_ms(&mut self, window_ms: f64) {
        self.window.set_window_ms(window_ms);
    }

    /// Pushes a sample at `time` (seconds).
    pub fn push(&mut self, value: f64, time: f64) {
        self.window.push(value, time);
    }

    /// The `q`-quantile of the live window (`q` clamped to [0, 1]), 0 when
    /// empty. Nearest-rank selection.
    pub fn quantile(&mut self, q: f64) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.scratch.clear();
        self.scratch.extend(self.window.samples.iter().map(|&(_, v)| v));
        self.scratch
            .sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
        let q = q.clamp(0.0, 1.0);
        let idx = ((self.scratch.len() - 1) as f64 * q + 0.5) as usize;
        self.scratch[idx.min(self.scratch.len() - 1)]
    }

    /// Maps `value` through the rolling `[q_low, q_high]` quantile band to
    /// [0, 1], clamped. A degenerate band (empty window, flat signal) maps
    /// to 0.
    pub fn normalize(&mut self, value: f64, q_low: f64, q_high: f64) -> f64 {
        let lo = self.quantile(q_low);
        let hi = self.quantile(q_high);
        if hi - lo <= f64::EPSILON {
            return 0.0;
        }
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    }

    /// Number of live samples.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Drops all samples.
    pub fn clear(&mut self) {
        self.window.clear();
        self.scratch.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_over_live_span_only() {
        let mut win = TimedWindow::new(1000.0);
        win.push(10.0, 0.0);
        win.push(20.0, 0.5);
        assert_eq!(win.mean(), 15.0);
        // Pushing at t=1.6 evicts the t=0.0 sample (horizon 0.6).
        win.push(30.0, 1.6);
        assert_eq!(win.len(), 2);
        assert_eq!(win.mean(), 25.0);
    }

    #[test]
    fn empty_window_means_zero() {
        let win = TimedWindow::new(500.0);
        assert_eq!(win.mean(), 0.0);
        assert!(win.is_empty());
    }

    #[test]
    fn seek_backwards_clears_window() {
        let mut win = TimedWindow::new(1000.0);
        win.push(1.0, 5.0);
        win.push(2.0, 5.5);
        win.push(3.0, 1.0);
        assert_eq!(win.len(), 1);
        assert_eq!(win.mean(), 3.0);
    }

    #[test]
    fn quantiles_of_uniform_ramp() {
        let mut win = QuantileWindow::new(10_000.0);
        for i in 0..=100 {
            win.push(f64::from(i), f64::from(i) * 0.01);
        }
        assert_eq!(win.quantile(0.0), 0.0);
        assert_eq!(win.quantile(1.0), 100.0);
        let median = win.quantile(0.5);
        assert!((median - 50.0).abs() <= 1.0, "got {median}");
    }

    #[test]
    fn normalize_clamps_to_unit_interval() {
        let mut win = QuantileWindow::new(10_000.0);
        for i in 0..=100 {
            win.push(f64::from(i), f64::from(i) * 0.01);
        }
        assert_eq!(win.normalize(1000.0, 0.01, 0.99), 1.0);
        assert_eq!(win.normalize(-1000.0, 0.01, 0.99), 0.0);
        let mid = win.normalize(50.0, 0.01, 0.99);
        assert!(mid > 0.4 && mid < 0.6, "got {mid}");
    }

    #[test]
    fn degenerate_band_normalizes_to_zero() {
        let mut win = QuantileWindow::new(1000.0);
        for i in 0..10 {
            win.push(7.0, f64::from(i) * 0.01);
        }
        assert_eq!(win.normalize(7.0, 0.01, 0.99), 0.0);
    }

    #[test]
    fn high_percentile_input_normalizes_near_one() {
        // Uniform noise over [0, 255] for 4 seconds of 60 Hz ticks.
        let mut win = QuantileWindow::new(4000.0);
        let mut state = 0x2545_f491_4f6c_dd1du64;
        for i in 0..240 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let v = (state % 256) as f64;
            win.push(v, f64::from(i) / 60.0);
        }
        let p99 = win.quantile(0.99);
        assert!(win.normalize(p99, 0.01, 0.99) >= 0.98);
    }
}
