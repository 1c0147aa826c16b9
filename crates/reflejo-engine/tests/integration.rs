//! End-to-end tests for the engine facade: layer lifecycle, history
//! routing, and the tick loop.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use reflejo_core::{PortType, Value};
use reflejo_engine::{
    ComponentDescriptor, ComponentRegistry, ConfigTemplate, DrawCtx, DrawError, LayerVisual,
    ParamTemplate, RenderTarget, VizEngine,
};
use reflejo_graph::ParameterId;

thread_local! {
    static DRAWN: RefCell<Vec<(String, f64)>> = RefCell::new(Vec::new());
    static DESTROYED: RefCell<usize> = const { RefCell::new(0) };
}

struct BarsVisual;

impl LayerVisual for BarsVisual {
    fn draw(&mut self, ctx: &mut DrawCtx<'_>) -> Result<(), DrawError> {
        DRAWN.with(|d| {
            d.borrow_mut()
                .push(("bars".to_string(), ctx.values.number("bars.height")));
        });
        Ok(())
    }

    fn destroy(&mut self) {
        DESTROYED.with(|d| *d.borrow_mut() += 1);
    }
}

struct Canvas;

impl RenderTarget for Canvas {
    fn width(&self) -> u32 {
        640
    }
    fn height(&self) -> u32 {
        360
    }
    fn blit_letterboxed(&mut self, _source: &dyn RenderTarget) {}
}

fn bars_template() -> ConfigTemplate {
    ConfigTemplate::root()
        .with_param(ParamTemplate::number("opacity", "Opacity", 1.0, 0.0, 1.0, 0.01))
        .with_group(
            ConfigTemplate::group("bars", "Bars").with_param(ParamTemplate::number(
                "height", "Height", 0.5, 0.0, 1.0, 0.01,
            )),
        )
}

fn components() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor {
        kind_name: "spectrum-bars",
        display_name: "Spectrum Bars",
        description: "Vertical bars driven by the spectrum",
        config_template: bars_template,
        default_networks: Vec::new,
        create: || Box::new(BarsVisual),
    });
    registry
}

fn engine_with_layer() -> (VizEngine, String) {
    let mut engine = VizEngine::new(components());
    let layer_id = engine.add_layer("spectrum-bars").unwrap();
    (engine, layer_id)
}

#[test]
fn add_layer_builds_config_with_stable_ids() {
    let (engine, layer_id) = engine_with_layer();
    let layer = engine.layer(&layer_id).unwrap();
    let param = layer.config.param_by_path("bars.height").unwrap();
    assert_eq!(param.id.as_str(), format!("{layer_id}:bars:height"));
    assert_eq!(param.static_value, Value::Number(0.5));
}

#[test]
fn unknown_component_kind_is_rejected() {
    let mut engine = VizEngine::new(components());
    assert!(engine.add_layer("nope").is_err());
}

#[test]
fn removing_a_layer_cascades_network_deletion() {
    let (mut engine, layer_id) = engine_with_layer();
    let other_id = engine.add_layer("spectrum-bars").unwrap();

    let height = ParameterId::from_parts(&layer_id, "bars", "height");
    let other_height = ParameterId::from_parts(&other_id, "bars", "height");
    engine.enable_network(&height).unwrap();
    engine.enable_network(&other_height).unwrap();
    assert_eq!(engine.networks().len(), 2);

    engine.remove_layer(&layer_id).unwrap();
    assert!(engine.networks().graph(&height).is_none());
    assert!(engine.networks().graph(&other_height).is_some());
    assert!(DESTROYED.with(|d| *d.borrow()) >= 1);
}

#[test]
fn tick_draws_visible_layers_in_order_with_resolved_values() {
    DRAWN.with(|d| d.borrow_mut().clear());
    let (mut engine, layer_id) = engine_with_layer();
    engine.layer_mut(&layer_id).unwrap().set_target(Box::new(Canvas));

    let height = ParameterId::from_parts(&layer_id, "bars", "height");
    engine.set_static_value(&height, Value::Number(0.75)).unwrap();
    engine.tick();

    let drawn = DRAWN.with(|d| d.borrow().clone());
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].1, 0.75);
}

#[test]
fn invisible_and_broken_layers_are_skipped() {
    DRAWN.with(|d| d.borrow_mut().clear());
    let (mut engine, layer_id) = engine_with_layer();
    engine.layer_mut(&layer_id).unwrap().set_target(Box::new(Canvas));
    let mut settings = engine.layer(&layer_id).unwrap().settings.clone();
    settings.visible = false;
    engine.set_layer_settings(&layer_id, settings).unwrap();
    engine.tick();
    assert!(DRAWN.with(|d| d.borrow().is_empty()));
}

#[test]
fn animated_parameter_publishes_live_value_on_tick() {
    let (mut engine, layer_id) = engine_with_layer();
    engine.layer_mut(&layer_id).unwrap().set_target(Box::new(Canvas));
    let height = ParameterId::from_parts(&layer_id, "bars", "height");
    engine.enable_network(&height).unwrap();
    engine.tick();
    assert!(engine.live_values().get(&height).is_some());
}

#[test]
fn parameter_fallback_when_network_disabled() {
    DRAWN.with(|d| d.borrow_mut().clear());
    let (mut engine, layer_id) = engine_with_layer();
    engine.layer_mut(&layer_id).unwrap().set_target(Box::new(Canvas));
    let height = ParameterId::from_parts(&layer_id, "bars", "height");
    engine.set_static_value(&height, Value::Number(0.9)).unwrap();

    // Enabled: the minimal unconnected graph animates the value to 0.
    engine.enable_network(&height).unwrap();
    engine.tick();
    // Disabled again: the static value returns.
    engine.disable_network(&height).unwrap();
    engine.tick();

    let drawn = DRAWN.with(|d| d.borrow().clone());
    assert_eq!(drawn[0].1, 0.0);
    assert_eq!(drawn[1].1, 0.9);
}

#[test]
fn undo_restores_pre_change_value_after_coalesced_edits() {
    let (mut engine, layer_id) = engine_with_layer();
    let height = ParameterId::from_parts(&layer_id, "bars", "height");

    // Ten rapid slider values; all inside one debounce window.
    for i in 1..=10 {
        engine
            .set_static_value(&height, Value::Number(f64::from(i) / 10.0))
            .unwrap();
    }
    // Undo flushes the pending coalesced push, then restores the
    // pre-change value, not an intermediate.
    engine.undo();
    let layer = engine.layer(&layer_id).unwrap();
    assert_eq!(
        layer.config.param(&height).unwrap().static_value,
        Value::Number(0.5)
    );

    engine.redo();
    let layer = engine.layer(&layer_id).unwrap();
    assert_eq!(
        layer.config.param(&height).unwrap().static_value,
        Value::Number(1.0)
    );
}

#[test]
fn undo_restores_removed_layer() {
    let (mut engine, layer_id) = engine_with_layer();
    engine.remove_layer(&layer_id).unwrap();
    assert!(engine.layers().is_empty());

    engine.undo();
    assert_eq!(engine.layers().len(), 1);
    assert_eq!(engine.layers()[0].id, layer_id);
    assert!(!engine.layers()[0].broken);
}

#[test]
fn node_drag_adds_at_most_one_history_entry() {
    let (mut engine, layer_id) = engine_with_layer();
    let height = ParameterId::from_parts(&layer_id, "bars", "height");
    engine.enable_network(&height).unwrap();
    let node = engine
        .add_network_node(&height, "Math", (0.0, 0.0))
        .unwrap();
    let before = engine
        .history()
        .network_stack(&height)
        .unwrap()
        .past_len();

    engine.begin_node_drag(&height);
    for i in 0..50u16 {
        engine
            .set_node_position(&height, &node, (f32::from(i), 0.0))
            .unwrap();
    }
    engine.end_node_drag(&height);

    let after = engine
        .history()
        .network_stack(&height)
        .unwrap()
        .past_len();
    assert!(after - before <= 1, "drag grew history by {}", after - before);
}

#[test]
fn undo_routes_to_focused_node_editor() {
    let (mut engine, layer_id) = engine_with_layer();
    let height = ParameterId::from_parts(&layer_id, "bars", "height");
    engine.enable_network(&height).unwrap();
    let node = engine
        .add_network_node(&height, "Math", (0.0, 0.0))
        .unwrap();
    let node_count = engine.networks().graph(&height).unwrap().nodes.len();

    engine.set_editor_context(Some(height.clone()), true);
    engine.undo();
    assert_eq!(
        engine.networks().graph(&height).unwrap().nodes.len(),
        node_count - 1
    );
    assert!(!engine.networks().graph(&height).unwrap().nodes.contains_key(&node));

    // Redo in the same context brings the node back.
    engine.redo();
    assert!(engine.networks().graph(&height).unwrap().nodes.contains_key(&node));
}

#[test]
fn preset_application_is_undoable() {
    let (mut engine, layer_id) = engine_with_layer();
    let height = ParameterId::from_parts(&layer_id, "bars", "height");
    engine.enable_network(&height).unwrap();
    let minimal_nodes = engine.networks().graph(&height).unwrap().nodes.len();

    engine.apply_preset(&height, "Bass Pulse").unwrap();
    assert!(engine.networks().graph(&height).unwrap().nodes.len() > minimal_nodes);

    engine.set_editor_context(Some(height.clone()), true);
    engine.undo();
    assert_eq!(
        engine.networks().graph(&height).unwrap().nodes.len(),
        minimal_nodes
    );
}

#[test]
fn rehydrated_unknown_component_is_broken_but_preserved() {
    DRAWN.with(|d| d.borrow_mut().clear());
    let mut engine = VizEngine::new(components());
    engine.rehydrate_layer(
        "layer-9",
        "plasma",
        Default::default(),
        true,
        false,
        &HashMap::new(),
    );
    assert_eq!(engine.layers().len(), 1);
    assert!(engine.layers()[0].broken);
    engine.tick();
    assert!(DRAWN.with(|d| d.borrow().is_empty()));
}

#[test]
fn history_reset_clears_undo_across_load_boundary() {
    let (mut engine, _layer_id) = engine_with_layer();
    engine.reset_history();
    engine.undo();
    // The layer added before the reset survives the no-op undo.
    assert_eq!(engine.layers().len(), 1);
}

#[test]
fn moving_layers_reorders_composition() {
    let (mut engine, first) = engine_with_layer();
    let second = engine.add_layer("spectrum-bars").unwrap();
    engine.move_layer(&second, 0).unwrap();
    assert_eq!(engine.layers()[0].id, second);
    assert_eq!(engine.layers()[1].id, first);
}

#[test]
fn layer_mirror_registration_survives_edits() {
    let (mut engine, layer_id) = engine_with_layer();
    let layer = engine.layer_mut(&layer_id).unwrap();
    layer.set_target(Box::new(Canvas));
    layer.add_mirror(Box::new(Canvas));
    assert_eq!(engine.layer(&layer_id).unwrap().mirrors.len(), 1);
}

#[test]
fn default_networks_are_applied_on_add() {
    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescriptor {
        kind_name: "pulse-circle",
        display_name: "Pulse Circle",
        description: "Circle scaled by bass energy",
        config_template: || {
            ConfigTemplate::root().with_param(ParamTemplate::number(
                "radius", "Radius", 0.5, 0.0, 1.0, 0.01,
            ))
        },
        default_networks: || {
            vec![reflejo_engine::DefaultNetwork {
                path: "radius",
                preset: "Bass Pulse",
                port_type: PortType::Number,
            }]
        },
        create: || Box::new(BarsVisual),
    });
    let mut engine = VizEngine::new(registry);
    let layer_id = engine.add_layer("pulse-circle").unwrap();
    let radius = ParameterId::from_parts(&layer_id, "", "radius");
    assert!(engine.networks().is_enabled(&radius));
    // The instantiated preset is a real chain, not the minimal pair.
    assert!(engine.networks().graph(&radius).unwrap().nodes.len() > 2);
}
