//! Per-tick audio snapshot.
//!
//! An [`AudioFrame`] is the single record every consumer sees for one render
//! tick: frequency-domain byte magnitudes, time-domain byte samples, the
//! analyzer geometry they were captured with, and the project clock. Frames
//! are produced by [`FrameSource`](crate::FrameSource) into pre-allocated
//! buffers; consumers borrow them and must not retain references past the
//! tick. The only sanctioned copy is the per-layer freeze frame.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Sample rate reported when no analyzer has ever been seen.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// FFT size reported when no analyzer has ever been seen.
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Immutable per-tick audio record.
///
/// `frequency_bins` holds `fft_size / 2` byte magnitudes; `time_domain` holds
/// `fft_size` byte samples centered at 128. `time` is seconds since project
/// start, monotonic non-decreasing while playback runs.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Frequency-domain magnitudes, one byte per bin.
    pub frequency_bins: Vec<u8>,
    /// Time-domain samples, bytes centered at 128.
    pub time_domain: Vec<u8>,
    /// Sample rate of the underlying analyzer in Hz.
    pub sample_rate: u32,
    /// FFT size the bins were computed with (power of two, >= 512).
    pub fft_size: usize,
    /// Seconds since project start.
    pub time: f64,
}

impl AudioFrame {
    /// Creates a silent frame for the given analyzer geometry.
    ///
    /// Buffers are zero-filled at their proper lengths so downstream nodes
    /// see well-formed (if quiet) data.
    pub fn silent(sample_rate: u32, fft_size: usize) -> Self {
        Self {
            frequency_bins: alloc_zeroed(fft_size / 2),
            time_domain: alloc_zeroed(fft_size),
            sample_rate,
            fft_size,
            time: 0.0,
        }
    }

    /// Width of one frequency bin in Hz: `(sample_rate / 2) / (fft_size / 2)`.
    ///
    /// Returns 0.0 for degenerate geometry rather than dividing by zero.
    pub fn bin_width_hz(&self) -> f64 {
        let half_bins = self.fft_size / 2;
        if half_bins == 0 {
            return 0.0;
        }
        (f64::from(self.sample_rate) / 2.0) / half_bins as f64
    }

    /// Returns true when both buffers are empty (analyzer never attached).
    pub fn is_empty(&self) -> bool {
        self.frequency_bins.is_empty() && self.time_domain.is_empty()
    }

    /// Bundles the spectral fields into a [`FrequencyAnalysis`] composite.
    ///
    /// This is what the `Input` node's `frequencyAnalysis` port carries, so
    /// band-splitting nodes get bins and geometry in one value.
    pub fn analysis(&self) -> FrequencyAnalysis {
        FrequencyAnalysis {
            bins: self.frequency_bins.clone(),
            sample_rate: self.sample_rate,
            fft_size: self.fft_size,
        }
    }
}

impl Default for AudioFrame {
    fn default() -> Self {
        Self::silent(DEFAULT_SAMPLE_RATE, DEFAULT_FFT_SIZE)
    }
}

/// Spectral composite: frequency bins plus the geometry needed to interpret
/// them. Carried on the wire as a single value so a band-split node cannot
/// pair bins with the wrong sample rate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrequencyAnalysis {
    /// Frequency-domain magnitudes, one byte per bin.
    pub bins: Vec<u8>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// FFT size the bins were computed with.
    pub fft_size: usize,
}

impl FrequencyAnalysis {
    /// Width of one frequency bin in Hz.
    pub fn bin_width_hz(&self) -> f64 {
        let half_bins = self.fft_size / 2;
        if half_bins == 0 {
            return 0.0;
        }
        (f64::from(self.sample_rate) / 2.0) / half_bins as f64
    }
}

fn alloc_zeroed(len: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.resize(len, 0);
    buf
}
