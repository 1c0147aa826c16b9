//! Error types for graph operations.

use reflejo_core::PortType;
use thiserror::Error;

use crate::id::NodeId;

/// Errors rejected at the store boundary during graph mutation or
/// validation.
///
/// Evaluation-path conditions (cycles encountered mid-walk, missing output
/// node) are deliberately not errors: the evaluator degrades to `None` and
/// warns, so the tick never fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// An edge endpoint references a node that is not in the graph.
    #[error("node '{0}' not found in graph")]
    MissingNode(NodeId),

    /// An edge endpoint references a port the node's kind does not declare.
    #[error("node '{node}' has no port '{port}'")]
    MissingPort {
        /// Node whose kind lacks the port.
        node: NodeId,
        /// The missing port id.
        port: String,
    },

    /// Source and target port types differ.
    #[error("type mismatch: source port is {source_type}, target port is {target}")]
    TypeMismatch {
        /// Source port type.
        source_type: PortType,
        /// Target port type.
        target: PortType,
    },

    /// An edge from a node to itself.
    #[error("connection from '{0}' to itself is not allowed")]
    SelfLoop(NodeId),

    /// Accepting the edge would make the graph cyclic.
    #[error("adding this edge would create a cycle")]
    CycleDetected,

    /// A node references a kind label missing from the registry.
    #[error("unknown node kind: {0}")]
    UnknownKind(String),

    /// A kind label is already registered.
    #[error("kind label '{0}' already registered")]
    DuplicateKind(String),

    /// The graph must have exactly one `Input` node.
    #[error("expected exactly 1 Input node, found {0}")]
    InvalidInputCount(usize),

    /// The graph must have exactly one `Output` node.
    #[error("expected exactly 1 Output node, found {0}")]
    InvalidOutputCount(usize),

    /// The network the operation targets does not exist in the store.
    #[error("no network for parameter '{0}'")]
    NetworkNotFound(String),
}

/// Errors from preset instantiation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresetError {
    /// The preset produces a different type than the parameter needs.
    #[error("preset outputs {preset} but the parameter needs {requested}")]
    OutputTypeMismatch {
        /// Type the preset template produces.
        preset: PortType,
        /// Type the requesting parameter requires.
        requested: PortType,
    },

    /// A preset node references a kind label missing from the registry.
    #[error("preset references unknown node kind: {0}")]
    UnknownKind(String),

    /// A preset edge references a node key that is not in the template.
    #[error("preset edge references unknown node key: {0}")]
    UnknownNodeKey(String),

    /// The expanded graph failed structural validation.
    #[error("preset expansion produced an invalid graph: {0}")]
    InvalidGraph(#[from] GraphError),
}
