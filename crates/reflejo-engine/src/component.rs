//! Component contracts and the component registry.
//!
//! Components are the engine's external collaborators: each layer kind
//! supplies a config template, an optional set of default networks, and a
//! factory for its [`LayerVisual`]. The engine calls visuals as opaque draw
//! procedures against an opaque [`RenderTarget`]; it never interprets
//! pixels.

use reflejo_core::{AudioFrame, PortType};
use thiserror::Error;

use crate::config::{ConfigTemplate, ConfigValues};
use crate::layer::LayerSettings;

/// An opaque per-layer drawing surface supplied by the host.
///
/// Target handles are owned by their layer and treated as idempotent to
/// re-query; the engine never re-derives a context mid-tick.
pub trait RenderTarget {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Whether this is a 3D-capable surface.
    fn is_3d(&self) -> bool {
        false
    }

    /// Copies another target's output onto this one as an
    /// aspect-preserving letterboxed image. Used for mirror targets.
    fn blit_letterboxed(&mut self, source: &dyn RenderTarget);
}

/// A draw failure. The runtime logs it and skips the rest of that layer
/// for the tick; the next tick retries.
#[derive(Debug, Error)]
pub enum DrawError {
    /// The target surface is unusable (lost context, zero size).
    #[error("render target unavailable: {0}")]
    TargetUnavailable(String),

    /// Any other component-reported failure.
    #[error("draw failed: {0}")]
    Failed(String),
}

/// Everything a visual gets for one draw call.
pub struct DrawCtx<'a> {
    /// The frame driving this tick (the layer's frozen frame when freeze
    /// is active and playback is paused).
    pub frame: &'a AudioFrame,
    /// The layer's resolved configuration values.
    pub values: &'a ConfigValues,
    /// Seconds since this layer last drew, clamped to [0, 0.25].
    pub dt: f64,
    /// The layer's settings (opacity and blend are applied by the external
    /// compositor; components may still want them).
    pub settings: &'a LayerSettings,
    /// The layer's drawing surface.
    pub target: &'a mut dyn RenderTarget,
}

/// The draw procedure a component supplies per layer.
///
/// The instance owns whatever scratch the component needs between frames;
/// [`destroy`](Self::destroy) is the release hook for GPU-ish resources
/// when the layer goes away.
pub trait LayerVisual {
    /// Whether the component draws through the 3D path.
    fn wants_3d(&self) -> bool {
        false
    }

    /// One-time 3D initialization. The runtime calls this lazily, exactly
    /// once, before the first 3D draw.
    fn init_3d(&mut self, _target: &mut dyn RenderTarget) {}

    /// Draws one tick.
    fn draw(&mut self, ctx: &mut DrawCtx<'_>) -> Result<(), DrawError>;

    /// Releases per-layer resources. Called when the layer is removed.
    fn destroy(&mut self) {}
}

/// A network a component wants enabled on fresh layers.
#[derive(Debug, Clone)]
pub struct DefaultNetwork {
    /// Dotted structural path of the parameter (`"bars.height"`).
    pub path: &'static str,
    /// Factory preset name to instantiate.
    pub preset: &'static str,
    /// The parameter's port type; must match the preset output type.
    pub port_type: PortType,
}

/// Registry entry describing one layer component kind.
pub struct ComponentDescriptor {
    /// Unique kind name, the persistence key.
    pub kind_name: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// Builds the component's config template.
    pub config_template: fn() -> ConfigTemplate,
    /// Networks to enable on fresh layers.
    pub default_networks: fn() -> Vec<DefaultNetwork>,
    /// Creates the per-layer visual.
    pub create: fn() -> Box<dyn LayerVisual>,
}

impl core::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("kind_name", &self.kind_name)
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Process-wide mapping from component kind name to descriptor.
#[derive(Default)]
pub struct ComponentRegistry {
    entries: Vec<ComponentDescriptor>,
}

impl ComponentRegistry {
    /// Creates an empty registry; the host registers its component kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component kind. Kind names must be unique.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> bool {
        if self.get(descriptor.kind_name).is_some() {
            return false;
        }
        self.entries.push(descriptor);
        true
    }

    /// Looks up a descriptor by kind name.
    pub fn get(&self, kind_name: &str) -> Option<&ComponentDescriptor> {
        self.entries.iter().find(|e| e.kind_name == kind_name)
    }

    /// Whether a kind name is registered.
    pub fn contains(&self, kind_name: &str) -> bool {
        self.get(kind_name).is_some()
    }

    /// Iterates descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.entries.iter()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
