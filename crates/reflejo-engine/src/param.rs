//! Typed parameter leaves with static-or-animated reads.
//!
//! A [`Parameter`] is one leaf in a layer's configuration tree. Reads
//! dispatch transparently: when the network keyed by the parameter's id is
//! enabled and evaluates to a value, that value (conformed to the
//! parameter's type and constraint) wins and is published to the live-value
//! observer map; otherwise the stored static value is returned. Evaluation
//! failure is invisible to the caller, it just means fallback.

use reflejo_core::{AudioFrame, PortType, Value};
use reflejo_graph::{evaluate, NetworkStore, NodeRegistry, ParameterId};

use crate::live::LiveValues;

/// Type-specific constraints applied to static writes and animated reads.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamConstraint {
    /// No constraint beyond the port type.
    None,
    /// Numeric range with a UI step hint. Values clamp to `[min, max]`;
    /// `step` is display metadata and never quantizes animation.
    Number {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
        /// UI increment hint.
        step: f64,
    },
    /// Vector components clamp to `[min, max]`.
    Vector3 {
        /// Per-component lower bound.
        min: f64,
        /// Per-component upper bound.
        max: f64,
    },
}

impl ParamConstraint {
    fn conform(&self, value: Value) -> Value {
        match (self, value) {
            (ParamConstraint::Number { min, max, .. }, Value::Number(n)) => {
                Value::Number(n.clamp(*min, *max))
            }
            (ParamConstraint::Vector3 { min, max }, Value::Vector3(v)) => {
                Value::Vector3([v[0].clamp(*min, *max), v[1].clamp(*min, *max), v[2].clamp(*min, *max)])
            }
            (_, value) => value,
        }
    }
}

/// Declaration of one parameter inside a component's config template.
#[derive(Debug, Clone)]
pub struct ParamTemplate {
    /// Structural key; becomes the id's leaf segment.
    pub key: &'static str,
    /// Display label. Renaming never changes ids.
    pub label: &'static str,
    /// One-line description for editors.
    pub description: &'static str,
    /// The value type.
    pub port_type: PortType,
    /// Initial static value.
    pub default: Value,
    /// Whether a network may drive this parameter.
    pub animatable: bool,
    /// Type-specific constraint.
    pub constraint: ParamConstraint,
}

impl ParamTemplate {
    /// Declares a numeric parameter with a range constraint.
    pub fn number(
        key: &'static str,
        label: &'static str,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
    ) -> Self {
        Self {
            key,
            label,
            description: "",
            port_type: PortType::Number,
            default: Value::Number(default),
            animatable: true,
            constraint: ParamConstraint::Number { min, max, step },
        }
    }

    /// Declares a parameter of any type without a range constraint.
    pub fn of(key: &'static str, label: &'static str, default: Value) -> Self {
        Self {
            key,
            label,
            description: "",
            port_type: default.port_type(),
            default,
            animatable: true,
            constraint: ParamConstraint::None,
        }
    }

    /// Attaches a description.
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Marks the parameter static-only.
    pub fn not_animatable(mut self) -> Self {
        self.animatable = false;
        self
    }
}

/// Everything a parameter read needs from the engine for one tick.
pub struct ResolveCtx<'a> {
    /// Network store; evaluation mutates node scratch.
    pub networks: &'a mut NetworkStore,
    /// Node kind catalogue.
    pub registry: &'a NodeRegistry,
    /// Live-value observer map, written on animated reads.
    pub live: &'a mut LiveValues,
    /// The frame this tick runs against.
    pub frame: &'a AudioFrame,
}

/// One typed leaf in a layer's configuration tree.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Stable id, also the network key. Derived from the structural path,
    /// never from labels.
    pub id: ParameterId,
    /// Structural key within the parent group.
    pub key: String,
    /// Display label.
    pub label: String,
    /// One-line description.
    pub description: String,
    /// The value type.
    pub port_type: PortType,
    /// The stored static value.
    pub static_value: Value,
    /// Whether a network may drive this parameter.
    pub animatable: bool,
    /// Type-specific constraint.
    pub constraint: ParamConstraint,
}

impl Parameter {
    /// Builds a parameter from its template with a concrete id.
    pub fn from_template(id: ParameterId, template: &ParamTemplate) -> Self {
        Self {
            id,
            key: template.key.to_string(),
            label: template.label.to_string(),
            description: template.description.to_string(),
            port_type: template.port_type,
            static_value: template.default.clone(),
            animatable: template.animatable,
            constraint: template.constraint.clone(),
        }
    }

    /// Stores a new static value, conformed to the parameter's type and
    /// constraint.
    pub fn set_static(&mut self, value: Value) {
        self.static_value = self.conform(value);
    }

    /// Reads the parameter for this tick: the enabled network's value if it
    /// produces one, else the static value. Animated reads publish to the
    /// live-value map as a side effect.
    pub fn read(&self, ctx: &mut ResolveCtx<'_>) -> Value {
        if self.animatable && ctx.networks.is_enabled(&self.id) {
            if let Some(graph) = ctx.networks.graph_mut(&self.id) {
                if let Some(value) = evaluate(graph, ctx.registry, ctx.frame) {
                    let value = self.conform(value);
                    ctx.live.publish(self.id.clone(), value.clone());
                    return value;
                }
            }
        }
        self.static_value.clone()
    }

    fn conform(&self, value: Value) -> Value {
        self.constraint.conform(value.coerce(self.port_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflejo_graph::Edge;

    fn number_param(id: &str) -> Parameter {
        Parameter::from_template(
            ParameterId::new(id),
            &ParamTemplate::number("gain", "Gain", 0.5, 0.0, 1.0, 0.01),
        )
    }

    #[test]
    fn static_write_clamps_to_constraint() {
        let mut param = number_param("l:fx:gain");
        param.set_static(Value::Number(7.0));
        assert_eq!(param.static_value, Value::Number(1.0));
        param.set_static(Value::Text("0.25".into()));
        assert_eq!(param.static_value, Value::Number(0.25));
    }

    #[test]
    fn read_without_network_returns_static() {
        let param = number_param("l:fx:gain");
        let registry = NodeRegistry::new();
        let mut networks = NetworkStore::new();
        let mut live = LiveValues::new();
        let frame = AudioFrame::default();
        let mut ctx = ResolveCtx {
            networks: &mut networks,
            registry: &registry,
            live: &mut live,
            frame: &frame,
        };
        assert_eq!(param.read(&mut ctx), Value::Number(0.5));
        assert!(live.get(&param.id).is_none());
    }

    #[test]
    fn read_with_enabled_network_publishes_live_value() {
        let param = number_param("l:fx:gain");
        let registry = NodeRegistry::new();
        let mut networks = NetworkStore::new();
        networks.enable(&param.id, PortType::Number, &registry);
        // time -> value so the network yields the frame clock.
        let input_id = networks.graph(&param.id).unwrap().input_node().unwrap().id.clone();
        let output_id = networks.graph(&param.id).unwrap().output_node().unwrap().id.clone();
        networks
            .connect(&param.id, Edge::new(input_id, "time", output_id, "value"), &registry)
            .unwrap();

        let mut live = LiveValues::new();
        let mut frame = AudioFrame::default();
        frame.time = 0.75;
        let mut ctx = ResolveCtx {
            networks: &mut networks,
            registry: &registry,
            live: &mut live,
            frame: &frame,
        };
        assert_eq!(param.read(&mut ctx), Value::Number(0.75));
        assert_eq!(live.get(&param.id), Some(&Value::Number(0.75)));
    }

    #[test]
    fn disabled_network_falls_back_to_static() {
        let param = number_param("l:fx:gain");
        let registry = NodeRegistry::new();
        let mut networks = NetworkStore::new();
        networks.enable(&param.id, PortType::Number, &registry);
        networks.disable(&param.id);

        let mut live = LiveValues::new();
        let frame = AudioFrame::default();
        let mut ctx = ResolveCtx {
            networks: &mut networks,
            registry: &registry,
            live: &mut live,
            frame: &frame,
        };
        assert_eq!(param.read(&mut ctx), Value::Number(0.5));
    }

    #[test]
    fn animated_value_is_clamped_by_constraint() {
        // The unconnected minimal graph evaluates to 0.0; widen the check
        // with a constraint whose minimum is above that.
        let mut param = number_param("l:fx:gain");
        param.constraint = ParamConstraint::Number {
            min: 0.2,
            max: 1.0,
            step: 0.01,
        };
        let registry = NodeRegistry::new();
        let mut networks = NetworkStore::new();
        networks.enable(&param.id, PortType::Number, &registry);

        let mut live = LiveValues::new();
        let frame = AudioFrame::default();
        let mut ctx = ResolveCtx {
            networks: &mut networks,
            registry: &registry,
            live: &mut live,
            frame: &frame,
        };
        assert_eq!(param.read(&mut ctx), Value::Number(0.2));
    }

    #[test]
    fn non_animatable_parameter_ignores_networks() {
        let mut param = number_param("l:fx:gain");
        param.animatable = false;
        let registry = NodeRegistry::new();
        let mut networks = NetworkStore::new();
        networks.enable(&param.id, PortType::Number, &registry);

        let mut live = LiveValues::new();
        let frame = AudioFrame::default();
        let mut ctx = ResolveCtx {
            networks: &mut networks,
            registry: &registry,
            live: &mut live,
            frame: &frame,
        };
        assert_eq!(param.read(&mut ctx), Value::Number(0.5));
    }
}
