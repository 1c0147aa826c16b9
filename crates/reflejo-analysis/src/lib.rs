//! Offline spectrum analysis for the reflejo engine.
//!
//! The live system analyzes a playing media element; export and headless
//! rendering need the same byte-oriented view over a decoded sample buffer
//! instead. [`OfflineAnalyzer`] implements the engine's
//! [`SpectrumAnalyzer`](reflejo_core::SpectrumAnalyzer) contract over
//! in-memory mono samples: a windowed FFT at the playhead, linear-domain
//! temporal smoothing, and the dB-to-byte mapping the live analyzer
//! produces, so networks see identical data in both modes.

pub mod fft;
pub mod offline;

pub use fft::{Fft, Window};
pub use offline::OfflineAnalyzer;
