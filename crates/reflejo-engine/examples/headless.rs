//! Headless render loop over a synthesized tone.
//!
//! Wires an offline analyzer and a scripted transport into the engine,
//! registers one console-printing component, enables a factory network on
//! its level parameter, and runs 120 ticks.
//!
//! Run with: cargo run -p reflejo-engine --example headless
#![allow(missing_docs)]

use std::cell::Cell;
use std::rc::Rc;

use reflejo_analysis::OfflineAnalyzer;
use reflejo_core::{PlaybackClock, SpectrumAnalyzer};
use reflejo_engine::{
    ComponentDescriptor, ComponentRegistry, ConfigTemplate, DrawCtx, DrawError, LayerVisual,
    ParamTemplate, RenderTarget, VizEngine,
};
use reflejo_graph::ParameterId;

const SAMPLE_RATE: u32 = 48000;
const FPS: f64 = 60.0;

struct ScriptedTransport {
    frame: Rc<Cell<u64>>,
}

impl PlaybackClock for ScriptedTransport {
    fn time_seconds(&self) -> Option<f64> {
        Some(self.frame.get() as f64 / FPS)
    }
    fn is_playing(&self) -> bool {
        true
    }
}

/// Keeps the analyzer playhead glued to the scripted transport.
struct DrivenAnalyzer {
    inner: OfflineAnalyzer,
    frame: Rc<Cell<u64>>,
}

impl SpectrumAnalyzer for DrivenAnalyzer {
    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }
    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }
    fn fft_size(&self) -> usize {
        self.inner.fft_size()
    }
    fn fill_frequency(&mut self, out: &mut Vec<u8>) {
        self.inner
            .set_position_seconds(self.frame.get() as f64 / FPS);
        self.inner.fill_frequency(out);
    }
    fn fill_time_domain(&mut self, out: &mut Vec<u8>) {
        self.inner.fill_time_domain(out);
    }
}

struct ConsoleMeter;

impl LayerVisual for ConsoleMeter {
    fn draw(&mut self, ctx: &mut DrawCtx<'_>) -> Result<(), DrawError> {
        let level = ctx.values.number("level");
        let width = (level * 50.0) as usize;
        println!("t={:6.3}s |{:<50}|", ctx.frame.time, "#".repeat(width));
        Ok(())
    }
}

struct NullTarget;

impl RenderTarget for NullTarget {
    fn width(&self) -> u32 {
        50
    }
    fn height(&self) -> u32 {
        1
    }
    fn blit_letterboxed(&mut self, _source: &dyn RenderTarget) {}
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Two seconds of a 60 Hz tone with a beat every half second.
    let samples: Vec<f32> = (0..SAMPLE_RATE * 2)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let pulse = if (t * 2.0).fract() < 0.15 { 1.0 } else { 0.15 };
            (std::f32::consts::TAU * 60.0 * t).sin() * pulse
        })
        .collect();

    let mut components = ComponentRegistry::new();
    components.register(ComponentDescriptor {
        kind_name: "console-meter",
        display_name: "Console Meter",
        description: "Prints a level bar per frame",
        config_template: || {
            ConfigTemplate::root().with_param(ParamTemplate::number(
                "level", "Level", 0.0, 0.0, 1.0, 0.01,
            ))
        },
        default_networks: Vec::new,
        create: || Box::new(ConsoleMeter),
    });

    let mut engine = VizEngine::new(components);
    let frame = Rc::new(Cell::new(0u64));

    let analyzer = DrivenAnalyzer {
        inner: OfflineAnalyzer::new(samples, SAMPLE_RATE, 2048),
        frame: frame.clone(),
    };
    engine.frame_source_mut().attach_analyzer(Box::new(analyzer));
    engine.frame_source_mut().attach_transport(Box::new(ScriptedTransport {
        frame: frame.clone(),
    }));

    let layer_id = engine.add_layer("console-meter").expect("register component");
    engine
        .layer_mut(&layer_id)
        .expect("layer exists")
        .set_target(Box::new(NullTarget));

    let level = ParameterId::from_parts(&layer_id, "", "level");
    engine.apply_preset(&level, "Bass Pulse").expect("factory preset");

    for tick in 0..120u64 {
        frame.set(tick);
        engine.tick();
    }
}
