//! Windowed forward FFT with magnitude output.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analysis window function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// Rectangular (no windowing).
    Rectangular,
    /// Hann window (raised cosine). The default; matches the live
    /// analyzer.
    #[default]
    Hann,
    /// Hamming window.
    Hamming,
    /// Blackman window.
    Blackman,
}

impl Window {
    /// Applies the window to a buffer in place.
    pub fn apply(self, buffer: &mut [f32]) {
        let n = buffer.len();
        if n == 0 {
            return;
        }
        match self {
            Window::Rectangular => {}
            Window::Hann => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos());
                    *sample *= w;
                }
            }
            Window::Hamming => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.54 - 0.46 * (2.0 * PI * i as f32 / n as f32).cos();
                    *sample *= w;
                }
            }
            Window::Blackman => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let x = 2.0 * PI * i as f32 / n as f32;
                    let w = 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos();
                    *sample *= w;
                }
            }
        }
    }
}

/// Forward FFT with a cached plan and magnitude extraction.
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
    buffer: Vec<Complex<f32>>,
}

impl Fft {
    /// Creates a processor for the given size.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            fft,
            size,
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// FFT size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Computes `size / 2` normalized magnitudes of the real input.
    ///
    /// Input shorter than the FFT size is zero-padded; longer input is
    /// truncated. Magnitudes are scaled by `1 / size`, matching the
    /// normalization the byte-mapping expects.
    pub fn magnitudes(&mut self, input: &[f32], out: &mut Vec<f32>) {
        for (slot, sample) in self.buffer.iter_mut().zip(input.iter().chain([0.0f32].iter().cycle())) {
            *slot = Complex::new(*sample, 0.0);
        }
        self.fft.process(&mut self.buffer);

        let scale = 1.0 / self.size as f32;
        out.clear();
        out.extend(self.buffer.iter().take(self.size / 2).map(|c| c.norm() * scale));
    }
}
