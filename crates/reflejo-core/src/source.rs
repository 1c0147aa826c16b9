//! Frame acquisition with freeze/fallback semantics.
//!
//! [`FrameSource`] produces exactly one [`AudioFrame`] per render tick. Its
//! buffers are pre-allocated and reused; `acquire` hands out a shared borrow
//! so consumers cannot retain the frame past the tick. Failure never crosses
//! this boundary: a missing or not-ready analyzer yields zero-filled buffers
//! and the last valid geometry.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

use crate::clock::{PlaybackClock, SpectrumAnalyzer};
use crate::frame::{AudioFrame, DEFAULT_FFT_SIZE, DEFAULT_SAMPLE_RATE};

/// Produces one [`AudioFrame`] per render tick.
///
/// Time preference: transport clock, then media clock, then `0.0`. While the
/// transport reports playing, published time is clamped non-decreasing so
/// stateful nodes never observe time running backwards mid-playback; a seek
/// while paused may jump anywhere.
pub struct FrameSource {
    analyzer: Option<Box<dyn SpectrumAnalyzer>>,
    transport: Option<Box<dyn PlaybackClock>>,
    media: Option<Box<dyn PlaybackClock>>,
    frame: AudioFrame,
    last_sample_rate: u32,
    last_fft_size: usize,
    last_time: f64,
    analyzer_was_live: bool,
}

impl FrameSource {
    /// Creates a source with no analyzer and no clocks.
    ///
    /// Every acquired frame is silent with default geometry until
    /// [`attach_analyzer`](Self::attach_analyzer) is called.
    pub fn new() -> Self {
        Self {
            analyzer: None,
            transport: None,
            media: None,
            frame: AudioFrame::silent(DEFAULT_SAMPLE_RATE, DEFAULT_FFT_SIZE),
            last_sample_rate: DEFAULT_SAMPLE_RATE,
            last_fft_size: DEFAULT_FFT_SIZE,
            last_time: 0.0,
            analyzer_was_live: false,
        }
    }

    /// Attaches (or replaces) the analyzer.
    pub fn attach_analyzer(&mut self, analyzer: Box<dyn SpectrumAnalyzer>) {
        self.analyzer = Some(analyzer);
    }

    /// Detaches the analyzer. Subsequent frames are silent but keep the last
    /// valid geometry.
    pub fn detach_analyzer(&mut self) {
        self.analyzer = None;
    }

    /// Attaches the transport clock (frame number / fps style). Preferred
    /// time source.
    pub fn attach_transport(&mut self, clock: Box<dyn PlaybackClock>) {
        self.transport = Some(clock);
    }

    /// Attaches the media clock (audio element position). Fallback time
    /// source.
    pub fn attach_media_clock(&mut self, clock: Box<dyn PlaybackClock>) {
        self.media = Some(clock);
    }

    /// Whether either attached clock reports playback running.
    pub fn is_playing(&self) -> bool {
        self.transport.as_deref().is_some_and(PlaybackClock::is_playing)
            || self.media.as_deref().is_some_and(PlaybackClock::is_playing)
    }

    /// Acquires the frame for this tick.
    ///
    /// Called exactly once per render tick, before any network evaluation or
    /// draw. Never fails: analyzer problems degrade to zero-filled buffers
    /// with the last valid `sample_rate`/`fft_size`.
    pub fn acquire(&mut self) -> &AudioFrame {
        let playing = self.is_playing();

        match self.analyzer.as_mut() {
            Some(analyzer) if analyzer.is_ready() => {
                self.last_sample_rate = analyzer.sample_rate();
                self.last_fft_size = analyzer.fft_size();
                analyzer.fill_frequency(&mut self.frame.frequency_bins);
                analyzer.fill_time_domain(&mut self.frame.time_domain);
                self.analyzer_was_live = true;
            }
            _ => {
                let went_silent = core::mem::take(&mut self.analyzer_was_live);
                #[cfg(feature = "tracing")]
                if went_silent {
                    tracing::debug!("analyzer unavailable; emitting silent frames");
                }
                #[cfg(not(feature = "tracing"))]
                let _ = went_silent;
                let half = self.last_fft_size / 2;
                self.frame.frequency_bins.clear();
                self.frame.frequency_bins.resize(half, 0);
                self.frame.time_domain.clear();
                self.frame.time_domain.resize(self.last_fft_size, 0);
            }
        }
        self.frame.sample_rate = self.last_sample_rate;
        self.frame.fft_size = self.last_fft_size;

        let mut time = self
            .transport
            .as_deref()
            .and_then(PlaybackClock::time_seconds)
            .or_else(|| self.media.as_deref().and_then(PlaybackClock::time_seconds))
            .unwrap_or(0.0);
        if playing && time < self.last_time {
            time = self.last_time;
        }
        self.last_time = time;
        self.frame.time = time;

        &self.frame
    }
}

impl Default for FrameSource {
    fn default() -> Self {
        Self::new()
    }
}
