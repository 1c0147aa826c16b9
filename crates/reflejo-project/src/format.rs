//! The serialized project shape.
//!
//! DTO structs mirror the on-disk JSON exactly; runtime types never carry
//! serde derives. Field names are camelCase on the wire.
//!
//! # JSON Shape
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "layers": [{
//!     "layerId": "layer-0", "kindName": "spectrum-bars",
//!     "settings": { "visible": true, "opacity": 1.0, "blendMode": "normal",
//!                   "background": "#00000000", "freeze": false },
//!     "configValues": { "bars": { "count": 32.0, "color": "#ffffffff" } },
//!     "expanded": true, "debug": false
//!   }],
//!   "networks": {
//!     "layer-0:bars:count": {
//!       "enabled": true,
//!       "nodes": [{ "nodeId": "...", "kindLabel": "Math",
//!                   "inputValues": { "a": 1.0 }, "position": [80.0, 80.0] }],
//!       "edges": [{ "sourceNodeId": "...", "sourcePortId": "output",
//!                   "targetNodeId": "...", "targetPortId": "value" }]
//!     }
//!   },
//!   "editorPreferences": { "ambientMode": false,
//!                          "resolutionMultiplier": 1.0, "playerFps": 60 }
//! }
//! ```

use std::collections::BTreeMap;

use reflejo_core::{Rgba, Value};
use serde::{Deserialize, Serialize};

/// The version this build writes.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Top-level project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    /// Format version, `MAJOR.MINOR.PATCH`. Required: files without a
    /// version are rejected.
    pub version: String,

    /// Layers in composition order.
    #[serde(default)]
    pub layers: Vec<LayerRecord>,

    /// Networks keyed by parameter id.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkRecord>,

    /// Editor preferences.
    #[serde(default)]
    pub editor_preferences: PreferencesRecord,
}

/// One persisted layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    /// Layer id; the prefix of every owned parameter id.
    pub layer_id: String,
    /// Component kind name.
    pub kind_name: String,
    /// Compositor settings.
    pub settings: SettingsRecord,
    /// Static values as a tree of primitives mirroring the config shape.
    #[serde(default)]
    pub config_values: BTreeMap<String, StoredTree>,
    /// Editor expansion state.
    #[serde(default = "default_true")]
    pub expanded: bool,
    /// Debug overlay state.
    #[serde(default)]
    pub debug: bool,
}

/// Persisted compositor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    /// Visibility flag.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Opacity in [0, 1].
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Blend mode wire name.
    #[serde(default = "default_blend")]
    pub blend_mode: String,
    /// Background color as `#rrggbbaa`.
    #[serde(default = "default_background")]
    pub background: String,
    /// Freeze flag.
    #[serde(default)]
    pub freeze: bool,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 1.0,
            blend_mode: default_blend(),
            background: default_background(),
            freeze: false,
        }
    }
}

/// One persisted network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    /// Whether the network drives its parameter.
    pub enabled: bool,
    /// Display name (usually the preset the graph came from).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Node instances.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Edges.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// One persisted node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node id, unique within the network.
    pub node_id: String,
    /// Kind label.
    pub kind_label: String,
    /// Literal input overrides.
    #[serde(default)]
    pub input_values: BTreeMap<String, StoredValue>,
    /// Editor position.
    #[serde(default)]
    pub position: (f32, f32),
}

/// One persisted edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    /// Source node id.
    pub source_node_id: String,
    /// Output port on the source.
    pub source_port_id: String,
    /// Target node id.
    pub target_node_id: String,
    /// Input port on the target.
    pub target_port_id: String,
}

/// Persisted editor preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRecord {
    /// Dim the editor chrome while the visualization runs.
    #[serde(default)]
    pub ambient_mode: bool,
    /// Render resolution multiplier.
    #[serde(default = "default_multiplier")]
    pub resolution_multiplier: f32,
    /// Player frame rate.
    #[serde(default = "default_fps")]
    pub player_fps: u32,
}

impl Default for PreferencesRecord {
    fn default() -> Self {
        Self {
            ambient_mode: false,
            resolution_multiplier: 1.0,
            player_fps: 60,
        }
    }
}

/// A stored primitive: number, bool, text (colors and operators as
/// strings), or a numeric array (vectors, byte buffers).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StoredValue {
    /// Boolean toggle.
    Bool(bool),
    /// Scalar number.
    Number(f64),
    /// Text; colors serialize as `#rrggbbaa`, operators by name.
    Text(String),
    /// Numeric array; length 3 reads back as a vector.
    Array(Vec<f64>),
}

impl StoredValue {
    /// Converts a runtime value to its stored form.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => StoredValue::Number(*n),
            Value::Toggle(b) => StoredValue::Bool(*b),
            Value::Text(s) => StoredValue::Text(s.clone()),
            Value::Color(c) => StoredValue::Text(c.to_hex()),
            Value::Vector3(v) => StoredValue::Array(v.to_vec()),
            Value::Bytes(b) => StoredValue::Array(b.iter().map(|&x| f64::from(x)).collect()),
            Value::Analysis(a) => {
                StoredValue::Array(a.bins.iter().map(|&x| f64::from(x)).collect())
            }
            Value::MathOp(op) => StoredValue::Text(op.name().to_string()),
        }
    }

    /// Converts back to a best-guess runtime value. The receiving
    /// parameter or port coerces it to the exact type.
    pub fn to_value(&self) -> Value {
        match self {
            StoredValue::Bool(b) => Value::Toggle(*b),
            StoredValue::Number(n) => Value::Number(*n),
            StoredValue::Text(s) => match s.strip_prefix('#').and(Rgba::from_hex(s)) {
                Some(color) => Value::Color(color),
                None => Value::Text(s.clone()),
            },
            StoredValue::Array(values) => {
                if values.len() == 3 {
                    Value::Vector3([values[0], values[1], values[2]])
                } else {
                    Value::Bytes(
                        values
                            .iter()
                            .map(|&v| v.clamp(0.0, 255.0).round() as u8)
                            .collect(),
                    )
                }
            }
        }
    }
}

/// A tree of stored primitives mirroring a layer's config shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StoredTree {
    /// A nested group.
    Group(BTreeMap<String, StoredTree>),
    /// A leaf value.
    Leaf(StoredValue),
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

fn default_multiplier() -> f32 {
    1.0
}

fn default_fps() -> u32 {
    60
}

fn default_blend() -> String {
    "normal".to_string()
}

fn default_background() -> String {
    "#00000000".to_string()
}
