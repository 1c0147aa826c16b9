//! Dataflow node networks for the reflejo visualization engine.
//!
//! A **network** is a directed acyclic dataflow graph bound to a single
//! animated parameter: its `Input` leaf exposes the current
//! [`AudioFrame`](reflejo_core::AudioFrame), interior nodes transform values,
//! and the unique `Output` node produces the parameter's animated value for
//! the tick.
//!
//! # Architecture
//!
//! The system splits into four pieces:
//!
//! - [`NodeRegistry`] — the catalogue of [`NodeKind`]s. A kind is a
//!   tagged-variant entry with declared input/output ports and a uniform
//!   `compute` function pointer; there is no subclassing. Stateful kinds
//!   carry their persistent state in the node instance's
//!   [`NodeScratch`](node::NodeScratch), the only mutation surface `compute`
//!   is handed.
//! - [`NetworkGraph`] — an arena of nodes keyed by [`NodeId`] plus flat edge
//!   tuples. No cross-references by pointer.
//! - [`NetworkStore`] — owns one graph per [`ParameterId`], validates
//!   candidate connections (type match, self-loops, cycles), and applies
//!   preset instantiation atomically.
//! - [`evaluate`] — the demand-driven memoized traversal producing the
//!   `Output` value. Each node computes at most once per call, which is also
//!   what guarantees a stateful node observes each tick exactly once.
//!
//! Errors on the evaluation path never propagate: malformed graphs evaluate
//! to `None` (the parameter then falls back to its static value) and emit a
//! `tracing` warning. Structural errors are rejected at the store boundary
//! with [`GraphError`].

pub mod error;
pub mod evaluator;
pub mod graph;
pub mod id;
pub mod kind;
pub mod kinds;
pub mod node;
pub mod port;
pub mod preset;
pub mod registry;
pub mod store;

pub use error::{GraphError, PresetError};
pub use evaluator::evaluate;
pub use graph::{Edge, NetworkGraph};
pub use id::{NodeId, ParameterId};
pub use kind::{ComputeFn, NodeKind, INPUT_KIND, OUTPUT_KIND};
pub use node::{GraphNode, NodeScratch};
pub use port::{Inputs, Outputs, PortSpec};
pub use preset::{factory_presets, GraphPreset, PresetEdge, PresetNode, INPUT_KEY, OUTPUT_KEY};
pub use registry::NodeRegistry;
pub use store::NetworkStore;
