//! The engine facade: stores, tick loop, and the history-wired edit
//! surface.

use std::collections::HashMap;
use std::time::Instant;

use reflejo_core::{AudioFrame, FrameSource, PortType, Value};
use reflejo_graph::{
    factory_presets, Edge, GraphError, GraphPreset, NetworkGraph, NetworkStore, NodeId,
    NodeRegistry, ParameterId, PresetError,
};
use thiserror::Error;

use crate::component::ComponentRegistry;
use crate::config::{ConfigTemplate, LayerConfig};
use crate::history::{HistoryService, UndoAction};
use crate::layer::{Layer, LayerSettings};
use crate::live::LiveValues;
use crate::runtime;
use crate::snapshot::{LayerSnapshot, NetworkSnapshot};

/// Errors from the engine's edit surface. The tick path never returns
/// these; per-frame failures recover locally.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No component registered under this kind name.
    #[error("unknown component kind: {0}")]
    UnknownComponent(String),

    /// No layer with this id.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    /// No parameter with this id in any layer.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// No preset with this name.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// A graph operation was rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Preset instantiation failed.
    #[error(transparent)]
    Preset(#[from] PresetError),
}

/// Editor-level preferences carried with the project.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorPreferences {
    /// Dim the editor chrome while the visualization runs.
    pub ambient_mode: bool,
    /// Render resolution multiplier.
    pub resolution_multiplier: f32,
    /// Player frame rate used by the transport clock.
    pub player_fps: u32,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            ambient_mode: false,
            resolution_multiplier: 1.0,
            player_fps: 60,
        }
    }
}

/// The core runtime: audio frames in, parameter values through networks,
/// ordered layer draws out, with undo/redo across the whole edit surface.
pub struct VizEngine {
    frame_source: FrameSource,
    node_registry: NodeRegistry,
    components: ComponentRegistry,
    networks: NetworkStore,
    layers: Vec<Layer>,
    live: LiveValues,
    history: HistoryService,
    presets: Vec<GraphPreset>,
    preferences: EditorPreferences,
    frame: AudioFrame,
    next_layer_serial: u64,
    epoch: Instant,
}

impl VizEngine {
    /// Creates an engine with the built-in node kinds and factory presets.
    /// The component registry comes from the host.
    pub fn new(components: ComponentRegistry) -> Self {
        Self {
            frame_source: FrameSource::new(),
            node_registry: NodeRegistry::new(),
            components,
            networks: NetworkStore::new(),
            layers: Vec::new(),
            live: LiveValues::new(),
            history: HistoryService::new(LayerSnapshot::default()),
            presets: factory_presets(),
            preferences: EditorPreferences::default(),
            frame: AudioFrame::default(),
            next_layer_serial: 0,
            epoch: Instant::now(),
        }
    }

    // --- Accessors ---

    /// The frame source, for attaching analyzers and clocks.
    pub fn frame_source_mut(&mut self) -> &mut FrameSource {
        &mut self.frame_source
    }

    /// The node kind catalogue.
    pub fn node_registry(&self) -> &NodeRegistry {
        &self.node_registry
    }

    /// The component catalogue.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The network store (read-only; mutate through the edit surface).
    pub fn networks(&self) -> &NetworkStore {
        &self.networks
    }

    /// The live-value observer map.
    pub fn live_values(&self) -> &LiveValues {
        &self.live
    }

    /// Layers in composition order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// A layer by id.
    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }

    /// A layer by id, mutably (for attaching render targets and mirrors).
    pub fn layer_mut(&mut self, layer_id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == layer_id)
    }

    /// Editor preferences.
    pub fn preferences(&self) -> &EditorPreferences {
        &self.preferences
    }

    /// Editor preferences, mutably.
    pub fn preferences_mut(&mut self) -> &mut EditorPreferences {
        &mut self.preferences
    }

    /// The history service state (for GUI undo/redo affordances).
    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    /// Registered graph presets.
    pub fn presets(&self) -> &[GraphPreset] {
        &self.presets
    }

    /// Registers (or replaces, by name) a graph preset.
    pub fn register_preset(&mut self, preset: GraphPreset) {
        self.presets.retain(|p| p.name != preset.name);
        self.presets.push(preset);
    }

    // --- Tick ---

    /// Runs one frame: acquire audio, settle due history debounce, then
    /// resolve + draw each visible layer in order.
    pub fn tick(&mut self) {
        let playing = self.frame_source.is_playing();
        {
            let acquired = self.frame_source.acquire();
            // clone_from reuses the engine copy's buffers.
            self.frame.clone_from(acquired);
        }

        let now = self.now_seconds();
        if self.history.layer_push_due(now) {
            let snapshot = LayerSnapshot::capture(&self.layers, &self.networks);
            self.history.flush_layer(snapshot);
        }

        for layer in &mut self.layers {
            runtime::tick_layer(
                layer,
                &self.frame,
                playing,
                now,
                &mut self.networks,
                &self.node_registry,
                &mut self.live,
            );
        }
    }

    // --- Layer edits (layer history domain) ---

    /// Adds a layer of the given component kind at the top of the stack;
    /// returns its id. Default networks declared by the component are
    /// instantiated and enabled.
    pub fn add_layer(&mut self, kind_name: &str) -> Result<String, EngineError> {
        if !self.components.contains(kind_name) {
            return Err(EngineError::UnknownComponent(kind_name.to_string()));
        }
        let layer_id = self.mint_layer_id();
        let layer = self.build_layer(&layer_id, kind_name);
        self.layers.push(layer);
        self.apply_default_networks(&layer_id, kind_name);
        self.push_layer_history();
        Ok(layer_id)
    }

    /// Removes a layer: destroys its visual, cascades deletion of its
    /// networks, and cleans the live-value map.
    pub fn remove_layer(&mut self, layer_id: &str) -> Result<(), EngineError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == layer_id)
            .ok_or_else(|| EngineError::UnknownLayer(layer_id.to_string()))?;
        let mut layer = self.layers.remove(index);
        if let Some(visual) = layer.visual.as_mut() {
            visual.destroy();
        }
        self.networks.remove_layer_networks(layer_id);
        self.live.remove_layer(layer_id);
        self.push_layer_history();
        Ok(())
    }

    /// Moves a layer to a new position in the composition order.
    pub fn move_layer(&mut self, layer_id: &str, new_index: usize) -> Result<(), EngineError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == layer_id)
            .ok_or_else(|| EngineError::UnknownLayer(layer_id.to_string()))?;
        let layer = self.layers.remove(index);
        let new_index = new_index.min(self.layers.len());
        self.layers.insert(new_index, layer);
        self.push_layer_history();
        Ok(())
    }

    /// Replaces a layer's settings. Structural: pushes immediately.
    pub fn set_layer_settings(
        &mut self,
        layer_id: &str,
        mut settings: LayerSettings,
    ) -> Result<(), EngineError> {
        settings.set_opacity(settings.opacity);
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == layer_id)
            .ok_or_else(|| EngineError::UnknownLayer(layer_id.to_string()))?;
        layer.settings = settings;
        self.push_layer_history();
        Ok(())
    }

    /// Sets a layer's expansion flag (view state; pushed with the layer
    /// snapshot but debounced like a value edit would be overkill).
    pub fn set_layer_expanded(&mut self, layer_id: &str, expanded: bool) -> Result<(), EngineError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == layer_id)
            .ok_or_else(|| EngineError::UnknownLayer(layer_id.to_string()))?;
        layer.expanded = expanded;
        self.push_layer_history();
        Ok(())
    }

    /// Writes a parameter's static value. Debounced: rapid slider motion
    /// coalesces into one history entry.
    pub fn set_static_value(
        &mut self,
        id: &ParameterId,
        value: Value,
    ) -> Result<(), EngineError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == id.layer_id())
            .ok_or_else(|| EngineError::UnknownParameter(id.as_str().to_string()))?;
        let param = layer
            .config
            .param_mut(id)
            .ok_or_else(|| EngineError::UnknownParameter(id.as_str().to_string()))?;
        param.set_static(value);
        let now = self.now_seconds();
        self.history.note_layer_param_edit(now);
        Ok(())
    }

    /// Enables a parameter's network (creating the minimal graph if
    /// absent). Structural: pushes the layer snapshot immediately.
    pub fn enable_network(&mut self, id: &ParameterId) -> Result<(), EngineError> {
        let port_type = self.param_port_type(id)?;
        self.networks.enable(id, port_type, &self.node_registry);
        self.prime_network_history(id);
        self.push_layer_history();
        Ok(())
    }

    /// Disables a parameter's network; the graph is retained.
    pub fn disable_network(&mut self, id: &ParameterId) -> Result<(), EngineError> {
        self.param_port_type(id)?;
        self.networks.disable(id);
        self.push_layer_history();
        Ok(())
    }

    /// Replaces a parameter's network with an instantiated preset,
    /// enabled.
    pub fn apply_preset(&mut self, id: &ParameterId, preset_name: &str) -> Result<(), EngineError> {
        let port_type = self.param_port_type(id)?;
        let preset = self
            .presets
            .iter()
            .find(|p| p.name == preset_name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownPreset(preset_name.to_string()))?;
        if let Some(graph) = self.networks.graph(id) {
            self.history.prime_network(id, NetworkSnapshot::capture(graph));
        }
        preset.apply(&mut self.networks, id, port_type, &self.node_registry)?;
        self.push_network_history(id);
        self.push_layer_history();
        Ok(())
    }

    // --- Node editor edits (network history domain) ---

    /// Adds a node to a parameter's network.
    pub fn add_network_node(
        &mut self,
        id: &ParameterId,
        kind_label: &str,
        position: (f32, f32),
    ) -> Result<NodeId, EngineError> {
        self.prime_network_history(id);
        let node = self
            .networks
            .add_node(id, kind_label, position, &self.node_registry)?;
        self.push_network_history(id);
        Ok(node)
    }

    /// Removes a node from a parameter's network.
    pub fn remove_network_node(&mut self, id: &ParameterId, node: &NodeId) -> Result<(), EngineError> {
        self.prime_network_history(id);
        self.networks.remove_node(id, node)?;
        self.push_network_history(id);
        Ok(())
    }

    /// Connects two ports in a parameter's network, after validation.
    pub fn connect_network(&mut self, id: &ParameterId, edge: Edge) -> Result<(), EngineError> {
        self.prime_network_history(id);
        self.networks.connect(id, edge, &self.node_registry)?;
        self.push_network_history(id);
        Ok(())
    }

    /// Removes the edge terminating at `(target, port)`.
    pub fn disconnect_network(
        &mut self,
        id: &ParameterId,
        target: &NodeId,
        port: &str,
    ) -> Result<(), EngineError> {
        self.prime_network_history(id);
        self.networks.disconnect(id, target, port)?;
        self.push_network_history(id);
        Ok(())
    }

    /// Sets a literal input override on a node.
    pub fn set_node_input(
        &mut self,
        id: &ParameterId,
        node: &NodeId,
        port: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        self.prime_network_history(id);
        let graph = self
            .networks
            .graph_mut(id)
            .ok_or_else(|| GraphError::NetworkNotFound(id.as_str().to_string()))?;
        let node = graph
            .nodes
            .get_mut(node)
            .ok_or_else(|| GraphError::MissingNode(node.clone()))?;
        node.set_input_value(port, value);
        self.push_network_history(id);
        Ok(())
    }

    /// Moves a node in the editor. Inside a drag window this does not push
    /// history; the settle push happens at [`end_node_drag`](Self::end_node_drag).
    pub fn set_node_position(
        &mut self,
        id: &ParameterId,
        node: &NodeId,
        position: (f32, f32),
    ) -> Result<(), EngineError> {
        self.prime_network_history(id);
        let graph = self
            .networks
            .graph_mut(id)
            .ok_or_else(|| GraphError::NetworkNotFound(id.as_str().to_string()))?;
        let node = graph
            .nodes
            .get_mut(node)
            .ok_or_else(|| GraphError::MissingNode(node.clone()))?;
        node.position = position;
        self.push_network_history(id);
        Ok(())
    }

    /// Opens a drag bypass window for a network.
    pub fn begin_node_drag(&mut self, id: &ParameterId) {
        self.prime_network_history(id);
        self.history.begin_node_drag(id);
    }

    /// Closes a drag bypass window; the settled state pushes once.
    pub fn end_node_drag(&mut self, id: &ParameterId) {
        let settled = self
            .networks
            .graph(id)
            .map(NetworkSnapshot::capture)
            .unwrap_or_default();
        self.history.end_node_drag(id, settled);
    }

    /// Clears all node scratch in a parameter's network.
    pub fn reset_network(&mut self, id: &ParameterId) {
        self.networks.reset_graph(id);
    }

    // --- Undo / redo ---

    /// Updates the editor context used for undo arbitration.
    pub fn set_editor_context(&mut self, open_network: Option<ParameterId>, focused: bool) {
        self.history.set_context(open_network, focused);
    }

    /// Routes a user undo to the focused node editor's network when it has
    /// history, otherwise to the layer stack. Pending debounced pushes are
    /// flushed first.
    pub fn undo(&mut self) {
        let flush = LayerSnapshot::capture(&self.layers, &self.networks);
        match self.history.undo(flush) {
            UndoAction::None => {}
            UndoAction::Layer(snapshot) => self.apply_layer_snapshot(&snapshot),
            UndoAction::Network(id, snapshot) => self.apply_network_snapshot(&id, &snapshot),
        }
    }

    /// Symmetric to [`undo`](Self::undo).
    pub fn redo(&mut self) {
        let flush = LayerSnapshot::capture(&self.layers, &self.networks);
        match self.history.redo(flush) {
            UndoAction::None => {}
            UndoAction::Layer(snapshot) => self.apply_layer_snapshot(&snapshot),
            UndoAction::Network(id, snapshot) => self.apply_network_snapshot(&id, &snapshot),
        }
    }

    // --- Rehydration (used by the persistence adapter) ---

    /// Installs a layer from persisted state without touching history.
    ///
    /// Unknown component kinds preserve the layer as a broken placeholder
    /// that the draw loop skips.
    pub fn rehydrate_layer(
        &mut self,
        layer_id: &str,
        kind_name: &str,
        settings: LayerSettings,
        expanded: bool,
        debug: bool,
        static_values: &HashMap<ParameterId, Value>,
    ) {
        self.history.begin_bypass();
        let mut layer = self.build_layer(layer_id, kind_name);
        layer.settings = settings;
        layer.expanded = expanded;
        layer.debug = debug;
        for (pid, value) in static_values {
            if let Some(param) = layer.config.param_mut(pid) {
                param.set_static(value.clone());
            } else if layer.broken {
                layer.preserved_values.insert(pid.clone(), value.clone());
            } else {
                tracing::warn!(parameter = %pid, "persisted value for unknown parameter; dropped");
            }
        }
        self.layers.push(layer);
        self.history.end_bypass();
    }

    /// Installs a network from persisted state without touching history.
    ///
    /// A network referencing unknown node kinds is kept but disabled, with
    /// a warning, rather than dropped.
    pub fn rehydrate_network(&mut self, id: &ParameterId, mut graph: NetworkGraph) {
        let unknown: Vec<String> = graph
            .nodes
            .values()
            .map(|n| n.kind_label.clone())
            .filter(|label| !self.node_registry.contains(label))
            .collect();
        if !unknown.is_empty() {
            tracing::warn!(
                network = %id,
                kinds = ?unknown,
                "network references unknown node kinds; disabling"
            );
            graph.enabled = false;
        }
        self.networks.install_unchecked(id, graph);
    }

    /// Re-seeds history with the current state as the initial present.
    /// Called after a project load so undo cannot cross the load boundary.
    pub fn reset_history(&mut self) {
        let initial = LayerSnapshot::capture(&self.layers, &self.networks);
        self.history = HistoryService::new(initial);
    }

    // --- Internals ---

    fn now_seconds(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn mint_layer_id(&mut self) -> String {
        loop {
            let id = format!("layer-{}", self.next_layer_serial);
            self.next_layer_serial += 1;
            if !self.layers.iter().any(|l| l.id == id) {
                return id;
            }
        }
    }

    fn build_layer(&self, layer_id: &str, kind_name: &str) -> Layer {
        match self.components.get(kind_name) {
            Some(descriptor) => {
                let template = (descriptor.config_template)();
                Layer::new(
                    layer_id,
                    kind_name,
                    LayerConfig::from_template(layer_id, &template),
                    Some((descriptor.create)()),
                )
            }
            None => {
                tracing::warn!(layer = layer_id, kind = kind_name, "unknown component kind; layer preserved as broken");
                let mut layer = Layer::new(
                    layer_id,
                    kind_name,
                    LayerConfig::from_template(layer_id, &ConfigTemplate::root()),
                    None,
                );
                layer.broken = true;
                layer
            }
        }
    }

    fn apply_default_networks(&mut self, layer_id: &str, kind_name: &str) {
        let Some(descriptor) = self.components.get(kind_name) else {
            return;
        };
        let defaults = (descriptor.default_networks)();
        let Some(layer) = self.layers.iter().find(|l| l.id == layer_id) else {
            return;
        };
        let targets: Vec<(ParameterId, PortType, &'static str)> = defaults
            .iter()
            .filter_map(|dn| {
                layer
                    .config
                    .param_by_path(dn.path)
                    .map(|p| (p.id.clone(), p.port_type, dn.preset))
            })
            .collect();
        for (pid, port_type, preset_name) in targets {
            let applied = self
                .presets
                .iter()
                .find(|p| p.name == preset_name)
                .cloned()
                .map(|preset| preset.apply(&mut self.networks, &pid, port_type, &self.node_registry));
            match applied {
                Some(Ok(())) => self.prime_network_history(&pid),
                Some(Err(error)) => {
                    tracing::warn!(parameter = %pid, preset = preset_name, %error, "default network failed; enabling minimal graph");
                    self.networks.enable(&pid, port_type, &self.node_registry);
                }
                None => {
                    tracing::warn!(parameter = %pid, preset = preset_name, "default network preset not found; enabling minimal graph");
                    self.networks.enable(&pid, port_type, &self.node_registry);
                }
            }
        }
    }

    fn param_port_type(&self, id: &ParameterId) -> Result<PortType, EngineError> {
        self.layers
            .iter()
            .find(|l| l.id == id.layer_id())
            .and_then(|l| l.config.param(id))
            .map(|p| p.port_type)
            .ok_or_else(|| EngineError::UnknownParameter(id.as_str().to_string()))
    }

    fn push_layer_history(&mut self) {
        let snapshot = LayerSnapshot::capture(&self.layers, &self.networks);
        self.history.push_layer(snapshot);
    }

    fn prime_network_history(&mut self, id: &ParameterId) {
        if let Some(graph) = self.networks.graph(id) {
            self.history.prime_network(id, NetworkSnapshot::capture(graph));
        }
    }

    fn push_network_history(&mut self, id: &ParameterId) {
        if let Some(graph) = self.networks.graph(id) {
            self.history.push_network(id, NetworkSnapshot::capture(graph));
        }
    }

    fn apply_layer_snapshot(&mut self, snapshot: &LayerSnapshot) {
        self.history.begin_bypass();

        let mut old: HashMap<String, Layer> = self
            .layers
            .drain(..)
            .map(|l| (l.id.clone(), l))
            .collect();
        for record in &snapshot.layers {
            let mut layer = old
                .remove(&record.layer_id)
                .unwrap_or_else(|| self.build_layer(&record.layer_id, &record.kind_name));
            layer.settings = record.settings.clone();
            layer.expanded = record.expanded;
            layer.debug = record.debug;
            for (pid, value) in &record.static_values {
                if let Some(param) = layer.config.param_mut(pid) {
                    param.set_static(value.clone());
                }
            }
            self.layers.push(layer);
        }
        // Layers absent from the snapshot go away with their networks.
        for (_, mut layer) in old {
            if let Some(visual) = layer.visual.as_mut() {
                visual.destroy();
            }
            self.networks.remove_layer_networks(&layer.id);
            self.live.remove_layer(&layer.id);
        }

        for (pid, enabled) in &snapshot.network_enabled {
            if *enabled {
                let Ok(port_type) = self.param_port_type(pid) else {
                    continue;
                };
                let existed = self.networks.graph(pid).is_some();
                self.networks.enable(pid, port_type, &self.node_registry);
                if !existed
                    && let Some(stack) = self.history.network_stack(pid)
                {
                    // A layer re-added by undo gets its graph content back
                    // from the network history's present.
                    let present = stack.present().clone();
                    if let Some(graph) = self.networks.graph_mut(pid) {
                        present.apply(graph, &self.node_registry);
                    }
                }
            } else {
                self.networks.disable(pid);
            }
        }

        self.history.end_bypass();
    }

    fn apply_network_snapshot(&mut self, id: &ParameterId, snapshot: &NetworkSnapshot) {
        self.history.begin_bypass();
        if let Some(graph) = self.networks.graph_mut(id) {
            snapshot.apply(graph, &self.node_registry);
        }
        self.history.end_bypass();
    }
}
