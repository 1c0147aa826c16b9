//! Layer composition runtime for the reflejo visualization engine.
//!
//! This crate ties the audio frame and the node networks to the visual
//! surface: an ordered stack of [`Layer`]s, each owning a typed
//! configuration tree whose leaves read either a stored static value or the
//! value of the parameter's network, a per-tick draw loop with failure
//! containment, and the undo/redo [`HistoryService`] with its debounce and
//! bypass rules.
//!
//! # Per-tick flow
//!
//! ```text
//! FrameSource::acquire
//!   -> for each visible layer, in order:
//!        LayerConfig::resolve (each parameter read exactly once;
//!                              animated reads publish to LiveValues)
//!        LayerVisual::draw    (panics and errors skip the layer, not the tick)
//!        mirror blits
//! ```
//!
//! # Edit flow
//!
//! Every mutation funnels through [`VizEngine`], which owns the stores and
//! wires each edit to the right history semantics: structural edits push a
//! layer snapshot immediately, parameter-value edits coalesce through a
//! 300 ms debounce, node-editor edits push per-network snapshots, and node
//! drags suppress pushes until release.

pub mod component;
pub mod config;
pub mod engine;
pub mod history;
pub mod layer;
pub mod live;
pub mod param;
pub mod runtime;
pub mod snapshot;

pub use component::{
    ComponentDescriptor, ComponentRegistry, DefaultNetwork, DrawCtx, DrawError, LayerVisual,
    RenderTarget,
};
pub use config::{ConfigEntry, ConfigTemplate, ConfigValues, LayerConfig, ParameterGroup, TemplateEntry};
pub use engine::{EditorPreferences, EngineError, VizEngine};
pub use history::{HistoryService, HistoryStack, UndoAction, MAX_HISTORY, PARAM_DEBOUNCE_MS};
pub use layer::{BlendMode, Layer, LayerSettings};
pub use live::LiveValues;
pub use param::{ParamConstraint, ParamTemplate, Parameter, ResolveCtx};
pub use snapshot::{LayerRecord, LayerSnapshot, NetworkSnapshot, SnapshotNode};
