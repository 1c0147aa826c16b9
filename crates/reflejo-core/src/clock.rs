//! Consumed environment contracts: the audio analyzer and the playback clock.
//!
//! The engine never owns audio capture or decoding. It pulls byte buffers
//! from whatever [`SpectrumAnalyzer`] the host wires in (a live FFT over a
//! capture stream, or the offline analyzer in `reflejo-analysis` for export)
//! and reads time from a [`PlaybackClock`]. Both are object-safe so hosts can
//! swap implementations at runtime.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Pull-based source of spectral and time-domain byte buffers.
///
/// Implementations overwrite the caller's buffers in place, resizing them to
/// the analyzer's current geometry (`fft_size / 2` frequency bins,
/// `fft_size` time-domain samples). The fill methods are called once per
/// render tick and must not block.
pub trait SpectrumAnalyzer {
    /// Returns true when the analyzer can currently produce data.
    ///
    /// A not-ready analyzer (no media attached yet, device lost) makes the
    /// frame source fall back to silence; it is not an error.
    fn is_ready(&self) -> bool;

    /// Sample rate of the analyzed signal in Hz.
    fn sample_rate(&self) -> u32;

    /// FFT size in samples. Power of two, at least 512.
    fn fft_size(&self) -> usize;

    /// Overwrites `out` with `fft_size / 2` frequency-domain byte magnitudes.
    fn fill_frequency(&mut self, out: &mut Vec<u8>);

    /// Overwrites `out` with `fft_size` time-domain byte samples centered
    /// at 128.
    fn fill_time_domain(&mut self, out: &mut Vec<u8>);
}

/// Source of project time and transport state.
///
/// The frame source consults up to two clocks: a transport clock (frame
/// number divided by fps, authoritative during export) and a media clock
/// (the playing element's own position). Either may be absent.
pub trait PlaybackClock {
    /// Current position in seconds, or `None` when the clock cannot report
    /// one (no media loaded, transport detached).
    fn time_seconds(&self) -> Option<f64>;

    /// Whether playback is currently running.
    fn is_playing(&self) -> bool;
}
