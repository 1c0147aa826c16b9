//! Byte-oriented spectrum analysis over a decoded sample buffer.

use reflejo_core::SpectrumAnalyzer;

use crate::fft::{Fft, Window};

/// Default temporal smoothing factor, matching the live analyzer.
const DEFAULT_SMOOTHING: f32 = 0.8;

/// dB floor mapped to byte 0.
const MIN_DECIBELS: f32 = -100.0;

/// dB ceiling mapped to byte 255.
const MAX_DECIBELS: f32 = -30.0;

/// A [`SpectrumAnalyzer`] over in-memory mono samples.
///
/// The analysis block always ends at the playhead, so advancing the
/// position and pulling a frame reproduces what a live analyzer would have
/// reported at that moment: Hann-windowed magnitudes, temporal smoothing
/// in the linear domain (`0.8 * prev + 0.2 * current`), then a linear map
/// from `[-100, -30]` dB onto `[0, 255]`. Time-domain bytes are the raw
/// samples recentered at 128.
///
/// # Example
///
/// ```rust
/// use reflejo_analysis::OfflineAnalyzer;
/// use reflejo_core::SpectrumAnalyzer;
///
/// let samples: Vec<f32> = (0..48000)
///     .map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / 48000.0).sin())
///     .collect();
/// let mut analyzer = OfflineAnalyzer::new(samples, 48000, 2048);
/// analyzer.set_position_seconds(0.5);
///
/// let mut bins = Vec::new();
/// analyzer.fill_frequency(&mut bins);
/// assert_eq!(bins.len(), 1024);
/// ```
pub struct OfflineAnalyzer {
    samples: Vec<f32>,
    sample_rate: u32,
    fft_size: usize,
    window: Window,
    fft: Fft,
    position_seconds: f64,
    smoothing: f32,
    smoothed: Vec<f32>,
    magnitudes: Vec<f32>,
    block: Vec<f32>,
}

impl OfflineAnalyzer {
    /// Creates an analyzer over decoded mono samples.
    ///
    /// `fft_size` is rounded up to a power of two and floored at 512.
    pub fn new(samples: Vec<f32>, sample_rate: u32, fft_size: usize) -> Self {
        let fft_size = fft_size.next_power_of_two().max(512);
        Self {
            samples,
            sample_rate,
            fft_size,
            window: Window::Hann,
            fft: Fft::new(fft_size),
            position_seconds: 0.0,
            smoothing: DEFAULT_SMOOTHING,
            smoothed: vec![0.0; fft_size / 2],
            magnitudes: Vec::with_capacity(fft_size / 2),
            block: vec![0.0; fft_size],
        }
    }

    /// Selects the analysis window.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Sets the temporal smoothing factor, clamped to `[0, 1)`.
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 0.999);
    }

    /// Moves the playhead.
    pub fn set_position_seconds(&mut self, seconds: f64) {
        self.position_seconds = seconds;
    }

    /// Current playhead position.
    pub fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    /// Advances the playhead.
    pub fn advance(&mut self, dt_seconds: f64) {
        self.position_seconds += dt_seconds;
    }

    /// Total duration of the sample buffer.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Copies the block ending at the playhead into the scratch buffer,
    /// zero-filling outside the sample range.
    fn gather_block(&mut self) {
        let end = (self.position_seconds * f64::from(self.sample_rate)) as i64;
        let start = end - self.fft_size as i64;
        for (i, slot) in self.block.iter_mut().enumerate() {
            let index = start + i as i64;
            *slot = if index >= 0 && (index as usize) < self.samples.len() {
                self.samples[index as usize]
            } else {
                0.0
            };
        }
    }
}

impl SpectrumAnalyzer for OfflineAnalyzer {
    fn is_ready(&self) -> bool {
        !self.samples.is_empty()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn fill_frequency(&mut self, out: &mut Vec<u8>) {
        let half = self.fft_size / 2;
        out.clear();
        if !self.is_ready() {
            out.resize(half, 0);
            return;
        }

        self.gather_block();
        self.window.apply(&mut self.block);
        let mut magnitudes = std::mem::take(&mut self.magnitudes);
        self.fft.magnitudes(&self.block, &mut magnitudes);

        let s = self.smoothing;
        out.reserve(half);
        for (prev, &mag) in self.smoothed.iter_mut().zip(magnitudes.iter()) {
            *prev = s * *prev + (1.0 - s) * mag;
            out.push(db_to_byte(*prev));
        }
        self.magnitudes = magnitudes;
    }

    fn fill_time_domain(&mut self, out: &mut Vec<u8>) {
        out.clear();
        if !self.is_ready() {
            out.resize(self.fft_size, 128);
            return;
        }
        self.gather_block();
        out.reserve(self.fft_size);
        out.extend(
            self.block
                .iter()
                .map(|&s| (128.0 + s * 127.0).clamp(0.0, 255.0) as u8),
        );
    }
}

/// Maps a linear magnitude to the byte scale through dB space.
fn db_to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 * (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    scaled.clamp(0.0, 255.0) as u8
}
