//! Reflejo Core - audio frame acquisition and reactive DSP primitives
//!
//! This crate provides the foundational building blocks for the reflejo
//! audio-reactive visualization engine: the per-tick [`AudioFrame`] snapshot,
//! the [`FrameSource`] that produces it with freeze/fallback semantics, the
//! closed [`PortType`]/[`Value`] taxonomy used across dataflow networks, and
//! the wall-clock stateful DSP primitives that back the networks' stateful
//! node kinds.
//!
//! # Core Abstractions
//!
//! ## Audio Frames
//!
//! - [`AudioFrame`] - Immutable per-tick record of spectral + time-domain bytes
//! - [`FrameSource`] - Acquires one frame per render tick, never fails
//! - [`SpectrumAnalyzer`] / [`PlaybackClock`] - Consumed environment contracts
//!
//! ## Value Taxonomy
//!
//! - [`PortType`] - Closed set of dataflow port types
//! - [`Value`] - Matching data enum with coercion and type zeros
//!
//! ## Reactive DSP Primitives
//!
//! Unlike sample-clocked DSP, these primitives advance on wall-clock
//! timestamps because the render loop ticks at a variable rate:
//!
//! - [`EnvelopeFollower`] - Attack/release smoothing of control signals
//! - [`TimedWindow`] - Windowed mean over the last N milliseconds
//! - [`QuantileWindow`] - Rolling quantile estimation for adaptive normalization
//! - [`HysteresisGate`] / [`RefractoryGate`] - Threshold gates with memory
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! reflejo-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Never fail on the tick path**: missing analyzers degrade to silence
//! - **Read-only frames**: consumers borrow the frame, only freeze clones it
//! - **Explicit time**: stateful primitives take `(value, time)` pairs and own
//!   their previous-timestamp bookkeeping

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod clock;
pub mod follower;
pub mod frame;
pub mod gate;
pub mod math;
pub mod source;
pub mod value;
pub mod window;

pub use clock::{PlaybackClock, SpectrumAnalyzer};
pub use follower::EnvelopeFollower;
pub use frame::{AudioFrame, FrequencyAnalysis, DEFAULT_FFT_SIZE, DEFAULT_SAMPLE_RATE};
pub use gate::{HysteresisGate, RefractoryGate};
pub use math::{lerp, normalize_linear};
pub use source::FrameSource;
pub use value::{MathOp, PortType, Rgba, Value};
pub use window::{QuantileWindow, TimedWindow};
