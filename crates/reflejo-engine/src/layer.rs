//! Visual layers and their settings.

use std::collections::HashMap;

use reflejo_core::{AudioFrame, Rgba, Value};
use reflejo_graph::ParameterId;

use crate::component::{LayerVisual, RenderTarget};
use crate::config::LayerConfig;

/// Compositor blend mode for a layer. Actual blending happens in the
/// external compositor; the engine just carries the setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// Additive.
    Add,
    /// Multiplicative.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
}

impl BlendMode {
    /// Stable wire name for persistence.
    pub const fn wire_name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Add => "add",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
        }
    }

    /// Parses a wire name.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Some(match name {
            "normal" => BlendMode::Normal,
            "add" => BlendMode::Add,
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "overlay" => BlendMode::Overlay,
            "darken" => BlendMode::Darken,
            "lighten" => BlendMode::Lighten,
            _ => return None,
        })
    }
}

/// Per-layer compositor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSettings {
    /// Invisible layers are skipped by the draw loop.
    pub visible: bool,
    /// Layer opacity in [0, 1].
    pub opacity: f32,
    /// Compositor blend mode.
    pub blend_mode: BlendMode,
    /// Background fill behind the layer's own drawing.
    pub background: Rgba,
    /// While paused, a frozen layer keeps drawing its last live frame.
    pub freeze: bool,
}

impl LayerSettings {
    /// Sets opacity, clamped to [0, 1].
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            background: Rgba::TRANSPARENT,
            freeze: false,
        }
    }
}

/// One visual layer: configuration, component instance, and surfaces.
///
/// Layers form an ordered list; position determines composition order
/// (later draws on top).
pub struct Layer {
    /// Unique layer id, the prefix of every owned [`ParameterId`].
    pub id: String,
    /// Component kind name.
    pub kind_name: String,
    /// The configuration tree.
    pub config: LayerConfig,
    /// Compositor settings.
    pub settings: LayerSettings,
    /// Whether the editor shows this layer expanded.
    pub expanded: bool,
    /// Whether the layer renders debug overlays.
    pub debug: bool,
    /// Set when the component kind was unknown at rehydration; broken
    /// layers are preserved but skipped by the draw loop.
    pub broken: bool,
    /// The component's draw procedure. `None` for broken layers.
    pub visual: Option<Box<dyn LayerVisual>>,
    /// The layer's drawing surface, supplied by the host.
    pub target: Option<Box<dyn RenderTarget>>,
    /// Registered mirror surfaces, blitted after each successful draw.
    pub mirrors: Vec<Box<dyn RenderTarget>>,
    /// Static values persisted for an unknown component kind. Broken
    /// layers carry them so a later save loses nothing.
    pub preserved_values: HashMap<ParameterId, Value>,
    /// Retained frame while freeze is active.
    pub(crate) frozen_frame: Option<AudioFrame>,
    /// Host-clock timestamp of the previous draw, for dt.
    pub(crate) last_tick_time: Option<f64>,
    /// Whether the lazy 3D initialization ran.
    pub(crate) init3d_done: bool,
}

impl Layer {
    /// Creates a layer with default settings and no surfaces attached.
    pub fn new(
        id: impl Into<String>,
        kind_name: impl Into<String>,
        config: LayerConfig,
        visual: Option<Box<dyn LayerVisual>>,
    ) -> Self {
        Self {
            id: id.into(),
            kind_name: kind_name.into(),
            config,
            settings: LayerSettings::default(),
            expanded: true,
            debug: false,
            broken: false,
            visual,
            target: None,
            mirrors: Vec::new(),
            preserved_values: HashMap::new(),
            frozen_frame: None,
            last_tick_time: None,
            init3d_done: false,
        }
    }

    /// Attaches (or replaces) the layer's drawing surface.
    pub fn set_target(&mut self, target: Box<dyn RenderTarget>) {
        self.target = Some(target);
        self.init3d_done = false;
    }

    /// Registers an additional mirror surface.
    pub fn add_mirror(&mut self, mirror: Box<dyn RenderTarget>) {
        self.mirrors.push(mirror);
    }
}

impl core::fmt::Debug for Layer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("kind_name", &self.kind_name)
            .field("visible", &self.settings.visible)
            .field("broken", &self.broken)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_mode_wire_names_round_trip() {
        for mode in [
            BlendMode::Normal,
            BlendMode::Add,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Darken,
            BlendMode::Lighten,
        ] {
            assert_eq!(BlendMode::from_wire_name(mode.wire_name()), Some(mode));
        }
        assert_eq!(BlendMode::from_wire_name("difference"), None);
    }

    #[test]
    fn opacity_clamps() {
        let mut settings = LayerSettings::default();
        settings.set_opacity(1.7);
        assert_eq!(settings.opacity, 1.0);
        settings.set_opacity(-0.5);
        assert_eq!(settings.opacity, 0.0);
    }
}
