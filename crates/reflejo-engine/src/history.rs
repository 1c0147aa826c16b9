//! Undo/redo with debounce, coalescing, bypass windows, and context
//! arbitration.
//!
//! Two independent history domains: one stack for the layer editor and one
//! stack per network for the node editor. Parameter-value edits coalesce
//! through a single-slot 300 ms debounce timer (rapid slider motion becomes
//! one entry); structural edits push immediately. A node drag suppresses
//! that network's pushes until release (the settled state pushes once).
//! While a snapshot is being re-applied, [`HistoryService::bypass`] blocks
//! the trackers so the application cannot push itself.
//!
//! Time is passed in explicitly as seconds on a monotonic clock; the engine
//! supplies its host clock, tests supply literals.

use std::collections::{HashMap, HashSet, VecDeque};

use reflejo_graph::ParameterId;

use crate::snapshot::{LayerSnapshot, NetworkSnapshot};

/// Maximum entries per history stack. Oldest past entries drop first.
pub const MAX_HISTORY: usize = 50;

/// Debounce window for parameter-value edits, in milliseconds.
pub const PARAM_DEBOUNCE_MS: f64 = 300.0;

/// A bounded past/present/future stack.
#[derive(Debug, Clone)]
pub struct HistoryStack<T: Clone + PartialEq> {
    past: VecDeque<T>,
    present: T,
    future: Vec<T>,
}

impl<T: Clone + PartialEq> HistoryStack<T> {
    /// Creates a stack whose present is the given state.
    pub fn new(present: T) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: Vec::new(),
        }
    }

    /// The current present.
    pub fn present(&self) -> &T {
        &self.present
    }

    /// Pushes a new present. Identical snapshots are a no-op; otherwise
    /// the old present moves to the past, the future clears, and the
    /// oldest past entry drops beyond [`MAX_HISTORY`].
    pub fn push(&mut self, snapshot: T) {
        if snapshot == self.present {
            return;
        }
        let old = std::mem::replace(&mut self.present, snapshot);
        self.past.push_back(old);
        if self.past.len() > MAX_HISTORY {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Steps back; returns the new present.
    pub fn undo(&mut self) -> Option<&T> {
        let previous = self.past.pop_back()?;
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        Some(&self.present)
    }

    /// Steps forward; returns the new present.
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.future.pop()?;
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        Some(&self.present)
    }

    /// Whether undo is possible.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether redo is possible.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of past entries.
    pub fn past_len(&self) -> usize {
        self.past.len()
    }
}

/// What an undo/redo resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    /// Nothing to do in either domain.
    None,
    /// Apply this layer snapshot.
    Layer(LayerSnapshot),
    /// Apply this snapshot to the named network.
    Network(ParameterId, NetworkSnapshot),
}

/// The two-domain history service.
pub struct HistoryService {
    layer: HistoryStack<LayerSnapshot>,
    networks: HashMap<ParameterId, HistoryStack<NetworkSnapshot>>,
    pending_layer_since: Option<f64>,
    dragging: HashSet<ParameterId>,
    bypassing: bool,
    open_network: Option<ParameterId>,
    node_editor_focused: bool,
}

impl HistoryService {
    /// Creates a service whose layer present is the given initial state.
    pub fn new(initial: LayerSnapshot) -> Self {
        Self {
            layer: HistoryStack::new(initial),
            networks: HashMap::new(),
            pending_layer_since: None,
            dragging: HashSet::new(),
            bypassing: false,
            open_network: None,
            node_editor_focused: false,
        }
    }

    /// Updates the editor context used for undo arbitration.
    pub fn set_context(&mut self, open_network: Option<ParameterId>, node_editor_focused: bool) {
        self.open_network = open_network;
        self.node_editor_focused = node_editor_focused;
    }

    /// Opens the global bypass window: while active, trackers ignore
    /// pushes so re-applying a snapshot does not itself push history.
    pub fn begin_bypass(&mut self) {
        self.bypassing = true;
    }

    /// Closes the global bypass window.
    pub fn end_bypass(&mut self) {
        self.bypassing = false;
    }

    /// Whether the bypass window is active.
    pub fn is_bypassing(&self) -> bool {
        self.bypassing
    }

    /// Notes a parameter-value edit at `now` seconds, (re)arming the
    /// debounce slot. The snapshot is captured at flush time, so rapid
    /// edits coalesce into their final state.
    pub fn note_layer_param_edit(&mut self, now: f64) {
        if self.bypassing {
            return;
        }
        self.pending_layer_since = Some(now);
    }

    /// Whether the debounce slot is due at `now`.
    pub fn layer_push_due(&self, now: f64) -> bool {
        self.pending_layer_since
            .is_some_and(|since| (now - since) * 1000.0 >= PARAM_DEBOUNCE_MS)
    }

    /// Whether a debounced push is pending.
    pub fn layer_push_pending(&self) -> bool {
        self.pending_layer_since.is_some()
    }

    /// Pushes a layer snapshot immediately (structural edits). Cancels any
    /// pending debounced push: the snapshot already reflects that edit.
    pub fn push_layer(&mut self, snapshot: LayerSnapshot) {
        if self.bypassing {
            return;
        }
        self.pending_layer_since = None;
        self.layer.push(snapshot);
    }

    /// Flushes the pending debounced push, if any, using the caller's
    /// freshly captured state. Called on tick when due and unconditionally
    /// before undo/redo.
    pub fn flush_layer(&mut self, snapshot: LayerSnapshot) {
        if self.pending_layer_since.take().is_some() {
            self.layer.push(snapshot);
        }
    }

    /// Ensures a network stack exists, seeding its present. No-op when the
    /// stack already exists. Callers seed with the pre-mutation state.
    pub fn prime_network(&mut self, id: &ParameterId, present: NetworkSnapshot) {
        self.networks
            .entry(id.clone())
            .or_insert_with(|| HistoryStack::new(present));
    }

    /// Pushes a network snapshot. Suppressed during that network's drag
    /// bypass window and while applying history.
    pub fn push_network(&mut self, id: &ParameterId, snapshot: NetworkSnapshot) {
        if self.bypassing || self.dragging.contains(id) {
            return;
        }
        match self.networks.get_mut(id) {
            Some(stack) => stack.push(snapshot),
            None => self.prime_network(id, snapshot),
        }
    }

    /// Opens a drag bypass window for a network: position churn during the
    /// drag must not flood the stack.
    pub fn begin_node_drag(&mut self, id: &ParameterId) {
        self.dragging.insert(id.clone());
    }

    /// Closes the drag bypass window and pushes the settled state once.
    pub fn end_node_drag(&mut self, id: &ParameterId, settled: NetworkSnapshot) {
        self.dragging.remove(id);
        self.push_network(id, settled);
    }

    /// Drops a network's stack (the network itself was removed).
    pub fn forget_network(&mut self, id: &ParameterId) {
        self.networks.remove(id);
        self.dragging.remove(id);
    }

    /// Read access to a network stack.
    pub fn network_stack(&self, id: &ParameterId) -> Option<&HistoryStack<NetworkSnapshot>> {
        self.networks.get(id)
    }

    /// Read access to the layer stack.
    pub fn layer_stack(&self) -> &HistoryStack<LayerSnapshot> {
        &self.layer
    }

    /// Resolves an undo. `flush_snapshot` is the freshly captured layer
    /// state, used to settle any pending debounced push first.
    ///
    /// Arbitration: a focused node editor with undoable history on its open
    /// network wins; otherwise the layer stack.
    pub fn undo(&mut self, flush_snapshot: LayerSnapshot) -> UndoAction {
        self.flush_layer(flush_snapshot);
        if self.node_editor_focused
            && let Some(open) = self.open_network.clone()
            && let Some(stack) = self.networks.get_mut(&open)
            && let Some(snapshot) = stack.undo()
        {
            return UndoAction::Network(open, snapshot.clone());
        }
        if let Some(snapshot) = self.layer.undo() {
            return UndoAction::Layer(snapshot.clone());
        }
        UndoAction::None
    }

    /// Resolves a redo, symmetric to [`undo`](Self::undo).
    pub fn redo(&mut self, flush_snapshot: LayerSnapshot) -> UndoAction {
        self.flush_layer(flush_snapshot);
        if self.node_editor_focused
            && let Some(open) = self.open_network.clone()
            && let Some(stack) = self.networks.get_mut(&open)
            && let Some(snapshot) = stack.redo()
        {
            return UndoAction::Network(open, snapshot.clone());
        }
        if let Some(snapshot) = self.layer.redo() {
            return UndoAction::Layer(snapshot.clone());
        }
        UndoAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{LayerRecord, SnapshotNode};
    use reflejo_core::Value;
    use reflejo_graph::NodeId;
    use std::collections::BTreeMap;

    fn layer_snap(marker: f64) -> LayerSnapshot {
        let mut static_values = BTreeMap::new();
        static_values.insert(ParameterId::new("l::v"), Value::Number(marker));
        LayerSnapshot {
            layers: vec![LayerRecord {
                layer_id: "l".into(),
                kind_name: "k".into(),
                settings: crate::layer::LayerSettings::default(),
                expanded: true,
                debug: false,
                static_values,
            }],
            network_enabled: BTreeMap::new(),
        }
    }

    fn net_snap(marker: f64) -> NetworkSnapshot {
        NetworkSnapshot {
            nodes: vec![SnapshotNode {
                id: NodeId::new("n"),
                kind_label: "Math".into(),
                input_values: [("a".to_string(), Value::Number(marker))].into(),
                position: (0.0, 0.0),
            }],
            edges: Vec::new(),
        }
    }

    #[test]
    fn push_is_noop_on_identical_state() {
        let mut stack = HistoryStack::new(layer_snap(0.0));
        stack.push(layer_snap(0.0));
        assert!(!stack.can_undo());
        stack.push(layer_snap(1.0));
        assert!(stack.can_undo());
    }

    #[test]
    fn undo_redo_round_trip_is_identity() {
        let mut stack = HistoryStack::new(layer_snap(0.0));
        stack.push(layer_snap(1.0));
        let before = stack.present().clone();
        stack.undo();
        stack.redo();
        assert_eq!(stack.present(), &before);
    }

    #[test]
    fn history_is_bounded() {
        let mut stack = HistoryStack::new(layer_snap(0.0));
        for i in 1..=(MAX_HISTORY * 2) {
            stack.push(layer_snap(i as f64));
        }
        assert_eq!(stack.past_len(), MAX_HISTORY);
        // Oldest surviving entry is the one MAX_HISTORY steps back.
        for _ in 0..MAX_HISTORY {
            stack.undo();
        }
        assert_eq!(stack.present(), &layer_snap(MAX_HISTORY as f64));
        assert!(!stack.can_undo());
    }

    #[test]
    fn push_clears_future() {
        let mut stack = HistoryStack::new(layer_snap(0.0));
        stack.push(layer_snap(1.0));
        stack.undo();
        assert!(stack.can_redo());
        stack.push(layer_snap(2.0));
        assert!(!stack.can_redo());
    }

    #[test]
    fn debounced_edits_coalesce_to_final_state() {
        let mut history = HistoryService::new(layer_snap(0.0));
        // Ten rapid slider values inside the window.
        for i in 0..10 {
            history.note_layer_param_edit(f64::from(i) * 0.02);
        }
        assert!(history.layer_push_pending());
        assert!(!history.layer_push_due(0.18 + 0.1));
        // 500 ms after the last edit the slot is due; the flush captures
        // only the final state.
        assert!(history.layer_push_due(0.18 + 0.5));
        history.flush_layer(layer_snap(10.0));
        assert_eq!(history.layer_stack().past_len(), 1);

        // Undo restores the pre-change state, not an intermediate.
        let action = history.undo(layer_snap(10.0));
        assert_eq!(action, UndoAction::Layer(layer_snap(0.0)));
    }

    #[test]
    fn undo_flushes_pending_debounce_first() {
        let mut history = HistoryService::new(layer_snap(0.0));
        history.note_layer_param_edit(0.0);
        // Undo before the timer fires: the pending edit must land first so
        // redo can restore it.
        let action = history.undo(layer_snap(5.0));
        assert_eq!(action, UndoAction::Layer(layer_snap(0.0)));
        let action = history.redo(layer_snap(0.0));
        assert_eq!(action, UndoAction::Layer(layer_snap(5.0)));
    }

    #[test]
    fn structural_push_cancels_pending_debounce() {
        let mut history = HistoryService::new(layer_snap(0.0));
        history.note_layer_param_edit(0.0);
        history.push_layer(layer_snap(1.0));
        assert!(!history.layer_push_pending());
        assert_eq!(history.layer_stack().past_len(), 1);
    }

    #[test]
    fn drag_bypass_caps_growth_at_one_entry() {
        let mut history = HistoryService::new(layer_snap(0.0));
        let id = ParameterId::new("l:n:v");
        history.prime_network(&id, net_snap(0.0));
        history.begin_node_drag(&id);
        // Fifty position-change events during the drag.
        for i in 1..=50 {
            history.push_network(&id, net_snap(f64::from(i)));
        }
        history.end_node_drag(&id, net_snap(50.0));
        assert_eq!(history.network_stack(&id).unwrap().past_len(), 1);
    }

    #[test]
    fn bypass_blocks_layer_pushes() {
        let mut history = HistoryService::new(layer_snap(0.0));
        history.begin_bypass();
        history.push_layer(layer_snap(1.0));
        history.note_layer_param_edit(0.0);
        history.end_bypass();
        assert!(!history.layer_stack().can_undo());
        assert!(!history.layer_push_pending());
    }

    #[test]
    fn undo_prefers_focused_open_network() {
        let mut history = HistoryService::new(layer_snap(0.0));
        history.push_layer(layer_snap(1.0));
        let id = ParameterId::new("l:n:v");
        history.prime_network(&id, net_snap(0.0));
        history.push_network(&id, net_snap(1.0));

        history.set_context(Some(id.clone()), true);
        let action = history.undo(layer_snap(1.0));
        assert_eq!(action, UndoAction::Network(id.clone(), net_snap(0.0)));

        // Unfocused editor routes to the layer stack instead.
        history.set_context(Some(id.clone()), false);
        let action = history.undo(layer_snap(1.0));
        assert_eq!(action, UndoAction::Layer(layer_snap(0.0)));
    }

    #[test]
    fn undo_falls_back_when_network_history_is_empty() {
        let mut history = HistoryService::new(layer_snap(0.0));
        history.push_layer(layer_snap(1.0));
        let id = ParameterId::new("l:n:v");
        history.prime_network(&id, net_snap(0.0));
        history.set_context(Some(id), true);
        let action = history.undo(layer_snap(1.0));
        assert_eq!(action, UndoAction::Layer(layer_snap(0.0)));
    }

    #[test]
    fn exhausted_stacks_yield_none() {
        let mut history = HistoryService::new(layer_snap(0.0));
        assert_eq!(history.undo(layer_snap(0.0)), UndoAction::None);
        assert_eq!(history.redo(layer_snap(0.0)), UndoAction::None);
    }
}
