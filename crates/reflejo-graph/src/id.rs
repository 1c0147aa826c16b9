//! Identifier newtypes for nodes and animated parameters.
//!
//! Both identifiers are textual: node ids are minted by the store and the
//! preset instantiator, parameter ids are derived deterministically from a
//! layer's config tree (`<layerId>:<dotted.group.path>:<leaf>`) so clones of
//! the same component keep their networks attached.

use std::fmt;

/// Unique identifier of a node within one network graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Wraps a textual node id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw textual id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Stable textual identifier of an animatable parameter:
/// `<layerId>:<dotted.group.path>:<leaf>`.
///
/// The id is the key of a parameter's network and the subscription key for
/// live-value observers. It survives label renames: only the structural
/// path participates, never display labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(String);

impl ParameterId {
    /// Wraps a full textual parameter id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds an id from its three segments. `path` is the dotted group
    /// path, empty for parameters directly under the config root.
    pub fn from_parts(layer_id: &str, path: &str, leaf: &str) -> Self {
        Self(format!("{layer_id}:{path}:{leaf}"))
    }

    /// The raw textual id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The owning layer's id (segment before the first `:`).
    pub fn layer_id(&self) -> &str {
        self.0.split(':').next().unwrap_or("")
    }

    /// Whether this parameter belongs to the given layer.
    ///
    /// Compares the full layer segment, so layer `"a"` never claims
    /// `"a2:..."` parameters.
    pub fn belongs_to(&self, layer_id: &str) -> bool {
        self.layer_id() == layer_id
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParameterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
