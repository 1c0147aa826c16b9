//! Hierarchical layer configuration with stable parameter ids.
//!
//! A component ships a [`ConfigTemplate`] describing its parameter tree;
//! every layer instantiated from it builds a [`LayerConfig`] whose leaf ids
//! derive deterministically from the structural path
//! (`<layerId>:<dotted.group.path>:<leaf>`). Labels are display-only, so a
//! rename never detaches a network. [`LayerConfig::resolve`] performs the
//! per-tick pre-order walk, reading each parameter exactly once.

use std::collections::BTreeMap;

use reflejo_core::{Rgba, Value};
use reflejo_graph::ParameterId;

use crate::param::{ParamTemplate, Parameter, ResolveCtx};

/// One entry in a config template: a leaf or a nested group.
#[derive(Debug, Clone)]
pub enum TemplateEntry {
    /// A parameter leaf.
    Param(ParamTemplate),
    /// A nested group.
    Group(ConfigTemplate),
}

/// Declaration of a parameter group, the shape every layer of a component
/// clones.
#[derive(Debug, Clone)]
pub struct ConfigTemplate {
    /// Structural key (id segment). Empty only for the root.
    pub key: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Ordered members.
    pub entries: Vec<TemplateEntry>,
}

impl ConfigTemplate {
    /// Creates a root template.
    pub fn root() -> Self {
        Self {
            key: "",
            label: "",
            entries: Vec::new(),
        }
    }

    /// Creates a named group template.
    pub fn group(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            entries: Vec::new(),
        }
    }

    /// Appends a parameter leaf.
    pub fn with_param(mut self, param: ParamTemplate) -> Self {
        self.entries.push(TemplateEntry::Param(param));
        self
    }

    /// Appends a nested group.
    pub fn with_group(mut self, group: ConfigTemplate) -> Self {
        self.entries.push(TemplateEntry::Group(group));
        self
    }
}

/// An instantiated group of parameters and subgroups.
#[derive(Debug, Clone)]
pub struct ParameterGroup {
    /// Structural key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Ordered members.
    pub entries: Vec<ConfigEntry>,
}

/// One member of an instantiated group.
#[derive(Debug, Clone)]
pub enum ConfigEntry {
    /// A parameter leaf.
    Param(Parameter),
    /// A nested group.
    Group(ParameterGroup),
}

/// A layer's full configuration tree.
#[derive(Debug, Clone)]
pub struct LayerConfig {
    /// The root group.
    pub root: ParameterGroup,
}

impl LayerConfig {
    /// Instantiates a template for a layer, deriving every leaf id from its
    /// structural path.
    pub fn from_template(layer_id: &str, template: &ConfigTemplate) -> Self {
        Self {
            root: build_group(layer_id, "", template),
        }
    }

    /// Finds a parameter by id.
    pub fn param(&self, id: &ParameterId) -> Option<&Parameter> {
        self.params().find(|p| &p.id == id)
    }

    /// Finds a parameter by id, mutably.
    pub fn param_mut(&mut self, id: &ParameterId) -> Option<&mut Parameter> {
        find_param_mut(&mut self.root, id)
    }

    /// Iterates every parameter leaf in pre-order.
    pub fn params(&self) -> impl Iterator<Item = &Parameter> {
        let mut out = Vec::new();
        collect_params(&self.root, &mut out);
        out.into_iter()
    }

    /// Finds a parameter by dotted structural path (`"bars.height"`).
    pub fn param_by_path(&self, path: &str) -> Option<&Parameter> {
        let mut group = &self.root;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return group.entries.iter().find_map(|e| match e {
                    ConfigEntry::Param(p) if p.key == segment => Some(p),
                    _ => None,
                });
            }
            group = group.entries.iter().find_map(|e| match e {
                ConfigEntry::Group(g) if g.key == segment => Some(g),
                _ => None,
            })?;
        }
        None
    }

    /// Resolves the whole tree against one frame. Each parameter is read
    /// exactly once; animated reads publish to the live-value map.
    pub fn resolve(&self, ctx: &mut ResolveCtx<'_>) -> ConfigValues {
        resolve_group(&self.root, ctx)
    }
}

fn build_group(layer_id: &str, path: &str, template: &ConfigTemplate) -> ParameterGroup {
    let mut entries = Vec::with_capacity(template.entries.len());
    for entry in &template.entries {
        match entry {
            TemplateEntry::Param(param) => {
                let id = ParameterId::from_parts(layer_id, path, param.key);
                entries.push(ConfigEntry::Param(Parameter::from_template(id, param)));
            }
            TemplateEntry::Group(group) => {
                let child_path = if path.is_empty() {
                    group.key.to_string()
                } else {
                    format!("{path}.{}", group.key)
                };
                entries.push(ConfigEntry::Group(build_group(layer_id, &child_path, group)));
            }
        }
    }
    ParameterGroup {
        key: template.key.to_string(),
        label: template.label.to_string(),
        entries,
    }
}

fn collect_params<'a>(group: &'a ParameterGroup, out: &mut Vec<&'a Parameter>) {
    for entry in &group.entries {
        match entry {
            ConfigEntry::Param(p) => out.push(p),
            ConfigEntry::Group(g) => collect_params(g, out),
        }
    }
}

fn find_param_mut<'a>(group: &'a mut ParameterGroup, id: &ParameterId) -> Option<&'a mut Parameter> {
    for entry in &mut group.entries {
        match entry {
            ConfigEntry::Param(p) => {
                if &p.id == id {
                    return Some(p);
                }
            }
            ConfigEntry::Group(g) => {
                if let Some(p) = find_param_mut(g, id) {
                    return Some(p);
                }
            }
        }
    }
    None
}

fn resolve_group(group: &ParameterGroup, ctx: &mut ResolveCtx<'_>) -> ConfigValues {
    let mut entries = BTreeMap::new();
    for entry in &group.entries {
        match entry {
            ConfigEntry::Param(p) => {
                entries.insert(p.key.clone(), ConfigValues::Leaf(p.read(ctx)));
            }
            ConfigEntry::Group(g) => {
                entries.insert(g.key.clone(), resolve_group(g, ctx));
            }
        }
    }
    ConfigValues::Group(entries)
}

/// A resolved value tree, mirroring the config shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValues {
    /// A resolved leaf.
    Leaf(Value),
    /// A resolved group.
    Group(BTreeMap<String, ConfigValues>),
}

impl ConfigValues {
    /// Looks up a leaf by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            match current {
                ConfigValues::Group(map) => current = map.get(segment)?,
                ConfigValues::Leaf(_) => return None,
            }
        }
        match current {
            ConfigValues::Leaf(value) => Some(value),
            ConfigValues::Group(_) => None,
        }
    }

    /// Number at `path`, 0.0 when missing.
    pub fn number(&self, path: &str) -> f64 {
        self.get(path).map_or(0.0, Value::as_number)
    }

    /// Toggle at `path`, false when missing.
    pub fn toggle(&self, path: &str) -> bool {
        self.get(path).is_some_and(Value::as_toggle)
    }

    /// Color at `path`, transparent when missing.
    pub fn color(&self, path: &str) -> Rgba {
        match self.get(path) {
            Some(Value::Color(c)) => *c,
            _ => Rgba::TRANSPARENT,
        }
    }

    /// Bytes at `path`, empty when missing.
    pub fn bytes(&self, path: &str) -> Vec<u8> {
        self.get(path).map_or_else(Vec::new, Value::as_bytes)
    }
}
