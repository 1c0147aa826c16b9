//! Saving and loading whole projects.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use reflejo_core::{Rgba, Value};
use reflejo_engine::{
    BlendMode, ConfigEntry, Layer, LayerSettings, ParameterGroup, VizEngine,
};
use reflejo_graph::{Edge, GraphNode, NetworkGraph, NodeId, ParameterId};

use crate::error::ProjectError;
use crate::format::{
    EdgeRecord, LayerRecord, NetworkRecord, NodeRecord, PreferencesRecord, ProjectFile,
    SettingsRecord, StoredTree, StoredValue, FORMAT_VERSION,
};

// --- Saving ---

/// Projects the engine's stores into the serializable file shape.
pub fn save_project(engine: &VizEngine) -> ProjectFile {
    let layers = engine.layers().iter().map(layer_record).collect();

    let mut networks = BTreeMap::new();
    for (id, graph) in engine.networks().iter() {
        networks.insert(id.as_str().to_string(), network_record(graph));
    }

    let prefs = engine.preferences();
    ProjectFile {
        version: FORMAT_VERSION.to_string(),
        layers,
        networks,
        editor_preferences: PreferencesRecord {
            ambient_mode: prefs.ambient_mode,
            resolution_multiplier: prefs.resolution_multiplier,
            player_fps: prefs.player_fps,
        },
    }
}

/// Serializes the project to pretty JSON.
pub fn save_project_to_string(engine: &VizEngine) -> Result<String, ProjectError> {
    Ok(serde_json::to_string_pretty(&save_project(engine))?)
}

/// Writes the project to a JSON file, creating parent directories.
pub fn save_project_to_file(engine: &VizEngine, path: impl AsRef<Path>) -> Result<(), ProjectError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ProjectError::create_dir(parent, e))?;
    }
    let content = save_project_to_string(engine)?;
    std::fs::write(path, content).map_err(|e| ProjectError::write_file(path, e))?;
    Ok(())
}

fn layer_record(layer: &Layer) -> LayerRecord {
    let config_values = if layer.broken {
        tree_from_preserved(&layer.preserved_values)
    } else {
        tree_from_group(&layer.config.root)
    };
    LayerRecord {
        layer_id: layer.id.clone(),
        kind_name: layer.kind_name.clone(),
        settings: SettingsRecord {
            visible: layer.settings.visible,
            opacity: layer.settings.opacity,
            blend_mode: layer.settings.blend_mode.wire_name().to_string(),
            background: layer.settings.background.to_hex(),
            freeze: layer.settings.freeze,
        },
        config_values,
        expanded: layer.expanded,
        debug: layer.debug,
    }
}

fn tree_from_group(group: &ParameterGroup) -> BTreeMap<String, StoredTree> {
    let mut out = BTreeMap::new();
    for entry in &group.entries {
        match entry {
            ConfigEntry::Param(param) => {
                out.insert(
                    param.key.clone(),
                    StoredTree::Leaf(StoredValue::from_value(&param.static_value)),
                );
            }
            ConfigEntry::Group(child) => {
                out.insert(child.key.clone(), StoredTree::Group(tree_from_group(child)));
            }
        }
    }
    out
}

/// Rebuilds a value tree from flat preserved ids
/// (`layer:<dotted.path>:<leaf>`), so broken layers save what they loaded.
fn tree_from_preserved(values: &HashMap<ParameterId, Value>) -> BTreeMap<String, StoredTree> {
    let mut root = BTreeMap::new();
    for (id, value) in values {
        let mut segments: Vec<&str> = id.as_str().splitn(3, ':').collect();
        if segments.len() != 3 {
            continue;
        }
        let leaf = segments.pop().unwrap_or_default();
        let path = segments.pop().unwrap_or_default();
        let segments = path.split('.').filter(|s| !path.is_empty() || !s.is_empty());
        insert_into_group(
            &mut root,
            segments,
            leaf,
            StoredTree::Leaf(StoredValue::from_value(value)),
        );
    }
    root
}

/// Walks `segments` from `map`, creating `Group` nodes as needed, then
/// inserts `leaf_value` under `leaf_key` at the deepest point reached.
/// Stops early (inserting one level up) if a segment already names a
/// `Leaf`.
fn insert_into_group<'s>(
    map: &mut BTreeMap<String, StoredTree>,
    mut segments: impl Iterator<Item = &'s str>,
    leaf_key: &str,
    leaf_value: StoredTree,
) {
    let Some(segment) = segments.next() else {
        map.insert(leaf_key.to_string(), leaf_value);
        return;
    };
    let entry = map
        .entry(segment.to_string())
        .or_insert_with(|| StoredTree::Group(BTreeMap::new()));
    match entry {
        StoredTree::Group(children) => insert_into_group(children, segments, leaf_key, leaf_value),
        StoredTree::Leaf(_) => {
            map.insert(leaf_key.to_string(), leaf_value);
        }
    }
}

fn network_record(graph: &NetworkGraph) -> NetworkRecord {
    let mut nodes: Vec<NodeRecord> = graph
        .nodes
        .values()
        .map(|node| NodeRecord {
            node_id: node.id.as_str().to_string(),
            kind_label: node.kind_label.clone(),
            input_values: node
                .input_values
                .iter()
                .map(|(port, value)| (port.clone(), StoredValue::from_value(value)))
                .collect(),
            position: node.position,
        })
        .collect();
    nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));

    NetworkRecord {
        enabled: graph.enabled,
        name: Some(graph.name.clone()),
        nodes,
        edges: graph
            .edges
            .iter()
            .map(|edge| EdgeRecord {
                source_node_id: edge.source.as_str().to_string(),
                source_port_id: edge.source_port.clone(),
                target_node_id: edge.target.as_str().to_string(),
                target_port_id: edge.target_port.clone(),
            })
            .collect(),
    }
}

// --- Loading ---

/// Rehydrates a project into the engine.
///
/// The engine should carry the component registry the project was written
/// against; any existing layers are removed first and history restarts at
/// the loaded state.
pub fn load_project(engine: &mut VizEngine, file: &ProjectFile) -> Result<(), ProjectError> {
    check_version(&file.version)?;

    // Clear whatever the engine held.
    let existing: Vec<String> = engine.layers().iter().map(|l| l.id.clone()).collect();
    for layer_id in existing {
        let _ = engine.remove_layer(&layer_id);
    }

    for record in &file.layers {
        let static_values = flatten_tree(&record.layer_id, &record.config_values);
        engine.rehydrate_layer(
            &record.layer_id,
            &record.kind_name,
            settings_from_record(&record.settings),
            record.expanded,
            record.debug,
            &static_values,
        );
    }

    for (key, record) in &file.networks {
        let id = ParameterId::new(key.clone());
        let graph = graph_from_record(engine, &id, record);
        engine.rehydrate_network(&id, graph);
    }

    let prefs = engine.preferences_mut();
    prefs.ambient_mode = file.editor_preferences.ambient_mode;
    prefs.resolution_multiplier = file.editor_preferences.resolution_multiplier;
    prefs.player_fps = file.editor_preferences.player_fps;

    engine.reset_history();
    Ok(())
}

/// Parses and rehydrates a project from a JSON string.
pub fn load_project_from_str(engine: &mut VizEngine, json: &str) -> Result<(), ProjectError> {
    let file: ProjectFile = serde_json::from_str(json)?;
    load_project(engine, &file)
}

/// Reads and rehydrates a project from a JSON file.
pub fn load_project_from_file(
    engine: &mut VizEngine,
    path: impl AsRef<Path>,
) -> Result<(), ProjectError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ProjectError::read_file(path, e))?;
    load_project_from_str(engine, &content)
}

fn check_version(version: &str) -> Result<(), ProjectError> {
    let parse = |v: &str| -> Option<(u32, u32, u32)> {
        let mut parts = v.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((major, minor, patch))
    };
    let found = parse(version).ok_or_else(|| ProjectError::InvalidVersion(version.to_string()))?;
    let supported = parse(FORMAT_VERSION).unwrap_or((0, 0, 0));
    if found.0 != supported.0 {
        return Err(ProjectError::UnsupportedVersion {
            found: version.to_string(),
            supported: FORMAT_VERSION.to_string(),
        });
    }
    if found.1 != supported.1 {
        tracing::warn!(
            found = version,
            supported = FORMAT_VERSION,
            "minor version mismatch; loading anyway"
        );
    }
    Ok(())
}

fn settings_from_record(record: &SettingsRecord) -> LayerSettings {
    let mut settings = LayerSettings {
        visible: record.visible,
        opacity: 1.0,
        blend_mode: BlendMode::from_wire_name(&record.blend_mode).unwrap_or_else(|| {
            tracing::warn!(mode = %record.blend_mode, "unknown blend mode; using normal");
            BlendMode::Normal
        }),
        background: Rgba::from_hex(&record.background).unwrap_or(Rgba::TRANSPARENT),
        freeze: record.freeze,
    };
    settings.set_opacity(record.opacity);
    settings
}

fn flatten_tree(
    layer_id: &str,
    tree: &BTreeMap<String, StoredTree>,
) -> HashMap<ParameterId, Value> {
    let mut out = HashMap::new();
    flatten_into(layer_id, "", tree, &mut out);
    out
}

fn flatten_into(
    layer_id: &str,
    path: &str,
    tree: &BTreeMap<String, StoredTree>,
    out: &mut HashMap<ParameterId, Value>,
) {
    for (key, entry) in tree {
        match entry {
            StoredTree::Leaf(value) => {
                out.insert(
                    ParameterId::from_parts(layer_id, path, key),
                    value.to_value(),
                );
            }
            StoredTree::Group(children) => {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                flatten_into(layer_id, &child_path, children, out);
            }
        }
    }
}

/// Builds a graph from its record. The output type comes from the owning
/// parameter; a network whose parameter no longer resolves comes back
/// disabled.
fn graph_from_record(engine: &VizEngine, id: &ParameterId, record: &NetworkRecord) -> NetworkGraph {
    let port_type = engine
        .layer(id.layer_id())
        .and_then(|layer| layer.config.param(id))
        .map(|param| param.port_type);

    let mut graph = NetworkGraph::new(
        record.name.clone().unwrap_or_else(|| id.as_str().to_string()),
        port_type.unwrap_or(reflejo_core::PortType::Number),
    );
    if port_type.is_none() {
        tracing::warn!(network = %id, "network's parameter no longer exists; keeping disabled");
    }

    for node in &record.nodes {
        let mut instance = GraphNode::new(
            NodeId::new(node.node_id.clone()),
            node.kind_label.clone(),
            engine.node_registry().init_scratch(&node.kind_label),
        );
        instance.input_values = node
            .input_values
            .iter()
            .map(|(port, value)| (port.clone(), value.to_value()))
            .collect();
        instance.position = node.position;
        graph.insert_node(instance);
    }

    for edge in &record.edges {
        let source = NodeId::new(edge.source_node_id.clone());
        let target = NodeId::new(edge.target_node_id.clone());
        if !graph.nodes.contains_key(&source) || !graph.nodes.contains_key(&target) {
            tracing::warn!(
                network = %id,
                source = %edge.source_node_id,
                target = %edge.target_node_id,
                "edge references a missing node; dropped"
            );
            continue;
        }
        graph.add_edge(Edge::new(
            source,
            edge.source_port_id.clone(),
            target,
            edge.target_port_id.clone(),
        ));
    }

    graph.enabled = record.enabled && port_type.is_some();
    graph
}
