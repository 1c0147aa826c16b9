//! Envelope follower for smoothing control signals.
//!
//! The render loop ticks at a variable rate, so unlike a sample-clocked
//! follower this one advances on wall-clock timestamps: each call supplies
//! `(value, time_seconds)` and the coefficient is derived from the elapsed
//! interval, `alpha = 1 - exp(-dt / tau)`, with separate attack and release
//! time constants. Convergence is therefore step-size independent.

use libm::exp;

/// First-order IIR envelope follower driven by wall-clock time.
///
/// # Example
///
/// ```rust
/// use reflejo_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::new(10.0, 100.0);
/// env.process(1.0, 0.0);
/// let level = env.process(1.0, 0.010); // 10 ms later
/// assert!(level > 0.55 && level < 0.70); // one attack time constant
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f64,
    attack_ms: f64,
    release_ms: f64,
    prev_time: Option<f64>,
}

impl EnvelopeFollower {
    /// Creates a follower with the given attack and release time constants
    /// in milliseconds. Non-positive constants respond instantly.
    pub fn new(attack_ms: f64, release_ms: f64) -> Self {
        Self {
            envelope: 0.0,
            attack_ms: attack_ms.max(0.0),
            release_ms: release_ms.max(0.0),
            prev_time: None,
        }
    }

    /// Sets the attack time constant in milliseconds.
    pub fn set_attack_ms(&mut self, attack_ms: f64) {
        self.attack_ms = attack_ms.max(0.0);
    }

    /// Sets the release time constant in milliseconds.
    pub fn set_release_ms(&mut self, release_ms: f64) {
        self.release_ms = release_ms.max(0.0);
    }

    /// Advances the follower to `time` (seconds) with the given input and
    /// returns the new envelope level.
    ///
    /// Time running backwards (a seek) re-anchors the follower without
    /// moving the envelope.
    pub fn process(&mut self, value: f64, time: f64) -> f64 {
        let dt_ms = match self.prev_time {
            Some(prev) if time > prev => (time - prev) * 1000.0,
            _ => 0.0,
        };
        self.prev_time = Some(time);

        let tau = if value > self.envelope {
            self.attack_ms
        } else {
            self.release_ms
        };
        let alpha = if tau <= 0.0 {
            1.0
        } else {
            1.0 - exp(-dt_ms / tau)
        };
        self.envelope += alpha * (value - self.envelope);
        self.envelope
    }

    /// Current envelope level without advancing.
    pub fn level(&self) -> f64 {
        self.envelope
    }

    /// Resets the envelope to zero and forgets the previous timestamp.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.prev_time = None;
    }
}
