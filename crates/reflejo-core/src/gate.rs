//! Threshold gates with memory.
//!
//! [`HysteresisGate`] opens above a high threshold and closes below a low
//! one, holding its previous output in between so a noisy signal near one
//! threshold does not chatter. [`RefractoryGate`] adds a re-open lockout,
//! turning a continuous level into discrete beat-like triggers.

/// Two-threshold gate. Opens strictly above `high`, closes strictly below
/// `low`, holds in `[low, high]`.
///
/// Thresholds given with `low > high` are swapped so `low <= high` always
/// holds.
#[derive(Debug, Clone)]
pub struct HysteresisGate {
    low: f64,
    high: f64,
    open: bool,
}

impl HysteresisGate {
    /// Creates a closed gate with the given thresholds.
    pub fn new(low: f64, high: f64) -> Self {
        let (low, high) = ordered(low, high);
        Self {
            low,
            high,
            open: false,
        }
    }

    /// Replaces both thresholds, swapping if given out of order.
    pub fn set_thresholds(&mut self, low: f64, high: f64) {
        let (low, high) = ordered(low, high);
        self.low = low;
        self.high = high;
    }

    /// Feeds one input sample; returns 1.0 while open, 0.0 while closed.
    pub fn process(&mut self, value: f64) -> f64 {
        if value > self.high {
            self.open = true;
        } else if value < self.low {
            self.open = false;
        }
        if self.open { 1.0 } else { 0.0 }
    }

    /// Whether the gate is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Closes the gate.
    pub fn reset(&mut self) {
        self.open = false;
    }
}

/// Hysteresis gate with a minimum re-open interval.
///
/// After opening, the gate refuses to open again until `min_interval_ms`
/// has elapsed since that opening, even if the input crosses the high
/// threshold. Closing is never delayed.
#[derive(Debug, Clone)]
pub struct RefractoryGate {
    gate: HysteresisGate,
    min_interval_ms: f64,
    last_open_time: Option<f64>,
}

impl RefractoryGate {
    /// Creates a closed gate with thresholds and a re-open lockout.
    pub fn new(low: f64, high: f64, min_interval_ms: f64) -> Self {
        Self {
            gate: HysteresisGate::new(low, high),
            min_interval_ms: min_interval_ms.max(0.0),
            last_open_time: None,
        }
    }

    /// Replaces both thresholds, swapping if given out of order.
    pub fn set_thresholds(&mut self, low: f64, high: f64) {
        self.gate.set_thresholds(low, high);
    }

    /// Sets the re-open lockout in milliseconds.
    pub fn set_min_interval_ms(&mut self, min_interval_ms: f64) {
        self.min_interval_ms = min_interval_ms.max(0.0);
    }

    /// Feeds one input sample at `time` (seconds); returns 1.0 while open,
    /// 0.0 while closed.
    pub fn process(&mut self, value: f64, time: f64) -> f64 {
        let was_open = self.gate.is_open();
        let out = self.gate.process(value);
        if !was_open && self.gate.is_open() {
            let locked = self
                .last_open_time
                .is_some_and(|t| (time - t) * 1000.0 < self.min_interval_ms);
            if locked {
                // Veto this opening; the hysteresis state goes back to
                // closed so a later crossing can retry.
                self.gate.reset();
                return 0.0;
            }
            self.last_open_time = Some(time);
        }
        out
    }

    /// Whether the gate is currently open.
    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }

    /// Closes the gate and clears the lockout.
    pub fn reset(&mut self) {
        self.gate.reset();
        self.last_open_time = None;
    }
}

fn ordered(low: f64, high: f64) -> (f64, f64) {
    if low > high { (high, low) } else { (low, high) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hysteresis_sequence() {
        let mut gate = HysteresisGate::new(0.3, 0.5);
        let outputs: [f64; 5] = [
            gate.process(0.2),
            gate.process(0.4),
            gate.process(0.6),
            gate.process(0.4),
            gate.process(0.2),
        ];
        assert_eq!(outputs, [0.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn swapped_thresholds_are_reordered() {
        let mut gate = HysteresisGate::new(0.5, 0.3);
        assert_eq!(gate.process(0.6), 1.0);
        assert_eq!(gate.process(0.2), 0.0);
    }

    #[test]
    fn boundary_values_hold_state() {
        let mut gate = HysteresisGate::new(0.3, 0.5);
        assert_eq!(gate.process(0.5), 0.0);
        gate.process(0.6);
        assert_eq!(gate.process(0.3), 1.0);
    }

    #[test]
    fn refractory_blocks_rapid_reopen() {
        let mut gate = RefractoryGate::new(0.3, 0.5, 100.0);
        assert_eq!(gate.process(0.6, 0.000), 1.0);
        assert_eq!(gate.process(0.2, 0.010), 0.0);
        // 50 ms after the first opening: locked out.
        assert_eq!(gate.process(0.6, 0.050), 0.0);
        // 150 ms after: allowed again.
        assert_eq!(gate.process(0.2, 0.100), 0.0);
        assert_eq!(gate.process(0.6, 0.150), 1.0);
    }

    #[test]
    fn refractory_does_not_delay_closing() {
        let mut gate = RefractoryGate::new(0.3, 0.5, 1000.0);
        gate.process(0.6, 0.0);
        assert_eq!(gate.process(0.1, 0.001), 0.0);
    }

    #[test]
    fn first_opening_is_never_locked() {
        let mut gate = RefractoryGate::new(0.3, 0.5, 10_000.0);
        assert_eq!(gate.process(0.9, 42.0), 1.0);
    }
}
