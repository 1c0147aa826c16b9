//! The live-value observer map.
//!
//! A single bounded mapping from [`ParameterId`] to the value its network
//! last produced. The parameter read path writes it (overwriting the same
//! key), the GUI reads it to display animated values next to their
//! controls. No callbacks cross components.

use std::collections::HashMap;

use reflejo_core::Value;
use reflejo_graph::ParameterId;

/// Last-evaluated value per animated parameter.
#[derive(Debug, Default)]
pub struct LiveValues {
    values: HashMap<ParameterId, Value>,
}

impl LiveValues {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a value, overwriting any previous one for the key. The
    /// map is bounded by construction: one entry per animated parameter.
    pub fn publish(&mut self, id: ParameterId, value: Value) {
        self.values.insert(id, value);
    }

    /// The last published value for a parameter.
    pub fn get(&self, id: &ParameterId) -> Option<&Value> {
        self.values.get(id)
    }

    /// Iterates all current entries.
    pub fn iter(&self) -> impl Iterator<Item = (&ParameterId, &Value)> {
        self.values.iter()
    }

    /// Drops every entry belonging to a layer. Called on layer removal so
    /// the map never outgrows the live parameter set.
    pub fn remove_layer(&mut self, layer_id: &str) {
        self.values.retain(|id, _| !id.belongs_to(layer_id));
    }

    /// Drops the entry for one parameter.
    pub fn remove(&mut self, id: &ParameterId) {
        self.values.remove(id);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
