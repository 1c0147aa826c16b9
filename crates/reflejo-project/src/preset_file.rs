//! Graph preset template files.
//!
//! Presets travel as TOML so users can author and share them by hand.
//! Factory presets stay compiled in (see
//! [`factory_presets`](reflejo_graph::factory_presets)); these files add
//! to that catalogue.
//!
//! # TOML Format
//!
//! ```toml
//! name = "Bass Pulse"
//! description = "Low-band energy, normalized and smoothed"
//! outputType = "number"
//! autoPlace = true
//!
//! [[nodes]]
//! key = "band"
//! kind = "Frequency Band"
//! [nodes.values]
//! startHz = 20.0
//! endHz = 150.0
//!
//! [[edges]]
//! source = "INPUT"
//! sourcePort = "frequencyAnalysis"
//! target = "band"
//! targetPort = "analysis"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use reflejo_core::PortType;
use reflejo_graph::{GraphPreset, PresetEdge, PresetNode};
use serde::{Deserialize, Serialize};

use crate::error::ProjectError;
use crate::format::StoredValue;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresetRecord {
    name: String,
    #[serde(default)]
    description: String,
    output_type: String,
    #[serde(default = "default_true")]
    auto_place: bool,
    #[serde(default)]
    nodes: Vec<PresetNodeRecord>,
    #[serde(default)]
    edges: Vec<PresetEdgeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresetNodeRecord {
    key: String,
    kind: String,
    // The position array must precede the values table in TOML output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<(f32, f32)>,
    #[serde(default)]
    values: BTreeMap<String, StoredValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresetEdgeRecord {
    source: String,
    source_port: String,
    target: String,
    target_port: String,
}

fn default_true() -> bool {
    true
}

fn record_to_preset(record: PresetRecord) -> Result<GraphPreset, ProjectError> {
    let output_type = PortType::from_wire_name(&record.output_type)
        .ok_or_else(|| ProjectError::UnknownPortType(record.output_type.clone()))?;
    Ok(GraphPreset {
        name: record.name,
        description: record.description,
        output_type,
        auto_place: record.auto_place,
        nodes: record
            .nodes
            .into_iter()
            .map(|node| {
                let mut preset_node = PresetNode::new(node.key, node.kind);
                preset_node.position = node.position;
                preset_node.input_values = node
                    .values
                    .iter()
                    .map(|(port, value)| (port.clone(), value.to_value()))
                    .collect();
                preset_node
            })
            .collect(),
        edges: record
            .edges
            .into_iter()
            .map(|edge| PresetEdge::new(edge.source, edge.source_port, edge.target, edge.target_port))
            .collect(),
    })
}

fn preset_to_record(preset: &GraphPreset) -> PresetRecord {
    PresetRecord {
        name: preset.name.clone(),
        description: preset.description.clone(),
        output_type: preset.output_type.wire_name().to_string(),
        auto_place: preset.auto_place,
        nodes: preset
            .nodes
            .iter()
            .map(|node| PresetNodeRecord {
                key: node.key.clone(),
                kind: node.kind_label.clone(),
                values: node
                    .input_values
                    .iter()
                    .map(|(port, value)| (port.clone(), StoredValue::from_value(value)))
                    .collect(),
                position: node.position,
            })
            .collect(),
        edges: preset
            .edges
            .iter()
            .map(|edge| PresetEdgeRecord {
                source: edge.source.clone(),
                source_port: edge.source_port.clone(),
                target: edge.target.clone(),
                target_port: edge.target_port.clone(),
            })
            .collect(),
    }
}

/// Loads one preset template from a TOML file.
pub fn load_preset_file(path: impl AsRef<Path>) -> Result<GraphPreset, ProjectError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ProjectError::read_file(path, e))?;
    let record: PresetRecord = toml::from_str(&content)?;
    record_to_preset(record)
}

/// Saves a preset template to a TOML file, creating parent directories.
pub fn save_preset_file(preset: &GraphPreset, path: impl AsRef<Path>) -> Result<(), ProjectError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ProjectError::create_dir(parent, e))?;
    }
    let content = toml::to_string_pretty(&preset_to_record(preset))?;
    std::fs::write(path, content).map_err(|e| ProjectError::write_file(path, e))?;
    Ok(())
}

/// Loads every `.toml` preset in a directory. Unreadable or invalid files
/// are skipped with a warning so one bad file cannot hide the rest.
pub fn load_presets_from_dir(dir: impl AsRef<Path>) -> Vec<GraphPreset> {
    let dir = dir.as_ref();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut presets = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        match load_preset_file(&path) {
            Ok(preset) => presets.push(preset),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable preset file");
            }
        }
    }
    presets.sort_by(|a, b| a.name.cmp(&b.name));
    presets
}
