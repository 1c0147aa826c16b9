//! The per-layer tick: resolve, draw, mirror.
//!
//! Layer `i` completes before layer `i + 1` begins. A draw failure, panic
//! included, skips the remainder of that layer for that tick only; the
//! next tick retries. Blend composition itself is delegated to the
//! external compositor.

use std::panic::{catch_unwind, AssertUnwindSafe};

use reflejo_core::AudioFrame;
use reflejo_graph::{NetworkStore, NodeRegistry};

use crate::component::DrawCtx;
use crate::layer::Layer;
use crate::live::LiveValues;
use crate::param::ResolveCtx;

/// Maximum dt handed to draw functions, in seconds. A long stall (tab in
/// background, debugger pause) resumes with one bounded step instead of a
/// catch-up jump.
const MAX_DT_SECONDS: f64 = 0.25;

/// What one layer tick did, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The layer was skipped (invisible, broken, or no surface).
    Skipped,
    /// Drawing completed and mirrors were blitted.
    Drew,
    /// Drawing failed or panicked; the layer was abandoned for this tick.
    Failed,
}

/// Runs one layer through one tick.
pub(crate) fn tick_layer(
    layer: &mut Layer,
    shared_frame: &AudioFrame,
    playing: bool,
    now: f64,
    networks: &mut NetworkStore,
    registry: &NodeRegistry,
    live: &mut LiveValues,
) -> TickOutcome {
    if !layer.settings.visible || layer.broken {
        return TickOutcome::Skipped;
    }
    if layer.visual.is_none() || layer.target.is_none() {
        return TickOutcome::Skipped;
    }

    let dt = layer
        .last_tick_time
        .map_or(0.0, |last| (now - last).clamp(0.0, MAX_DT_SECONDS));
    layer.last_tick_time = Some(now);

    // Freeze substitutes the last retained frame while playback is paused;
    // resuming drops the retained copy.
    let use_frozen = layer.settings.freeze && !playing;
    let frame: &AudioFrame = if use_frozen {
        layer
            .frozen_frame
            .get_or_insert_with(|| shared_frame.clone())
    } else {
        layer.frozen_frame = None;
        shared_frame
    };

    let values = {
        let mut ctx = ResolveCtx {
            networks,
            registry,
            live,
            frame,
        };
        layer.config.resolve(&mut ctx)
    };

    let Some(visual) = layer.visual.as_mut() else {
        return TickOutcome::Skipped;
    };
    let Some(target) = layer.target.as_mut() else {
        return TickOutcome::Skipped;
    };

    if visual.wants_3d() && !layer.init3d_done {
        visual.init_3d(target.as_mut());
        layer.init3d_done = true;
    }

    let draw_result = catch_unwind(AssertUnwindSafe(|| {
        let mut ctx = DrawCtx {
            frame,
            values: &values,
            dt,
            settings: &layer.settings,
            target: target.as_mut(),
        };
        visual.draw(&mut ctx)
    }));

    match draw_result {
        Ok(Ok(())) => {
            for mirror in &mut layer.mirrors {
                mirror.blit_letterboxed(&**target);
            }
            TickOutcome::Drew
        }
        Ok(Err(error)) => {
            tracing::warn!(layer = %layer.id, %error, "layer draw failed; skipping this tick");
            TickOutcome::Failed
        }
        Err(_panic) => {
            tracing::warn!(layer = %layer.id, "layer draw panicked; skipping this tick");
            TickOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{DrawError, LayerVisual, RenderTarget};
    use crate::config::{ConfigTemplate, LayerConfig};
    use crate::param::ParamTemplate;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct CanvasLog {
        draws: Vec<f64>,
        blits: usize,
        init3d: usize,
    }

    struct TestCanvas {
        log: Rc<RefCell<CanvasLog>>,
    }

    impl RenderTarget for TestCanvas {
        fn width(&self) -> u32 {
            640
        }
        fn height(&self) -> u32 {
            360
        }
        fn blit_letterboxed(&mut self, _source: &dyn RenderTarget) {
            self.log.borrow_mut().blits += 1;
        }
    }

    enum Behavior {
        Ok,
        Error,
        Panic,
    }

    struct TestVisual {
        log: Rc<RefCell<CanvasLog>>,
        behavior: Behavior,
        three_d: bool,
    }

    impl LayerVisual for TestVisual {
        fn wants_3d(&self) -> bool {
            self.three_d
        }
        fn init_3d(&mut self, _target: &mut dyn RenderTarget) {
            self.log.borrow_mut().init3d += 1;
        }
        fn draw(&mut self, ctx: &mut DrawCtx<'_>) -> Result<(), DrawError> {
            self.log.borrow_mut().draws.push(ctx.dt);
            match self.behavior {
                Behavior::Ok => Ok(()),
                Behavior::Error => Err(DrawError::Failed("nope".into())),
                Behavior::Panic => panic!("component bug"),
            }
        }
    }

    fn test_layer(log: &Rc<RefCell<CanvasLog>>, behavior: Behavior, three_d: bool) -> Layer {
        let template = ConfigTemplate::root()
            .with_param(ParamTemplate::number("x", "X", 0.0, 0.0, 1.0, 0.1));
        let mut layer = Layer::new(
            "layer-1",
            "test",
            LayerConfig::from_template("layer-1", &template),
            Some(Box::new(TestVisual {
                log: log.clone(),
                behavior,
                three_d,
            })),
        );
        layer.set_target(Box::new(TestCanvas { log: log.clone() }));
        layer
    }

    fn run(layer: &mut Layer, now: f64, playing: bool) -> TickOutcome {
        let registry = NodeRegistry::new();
        let mut networks = NetworkStore::new();
        let mut live = LiveValues::new();
        tick_layer(
            layer,
            &AudioFrame::default(),
            playing,
            now,
            &mut networks,
            &registry,
            &mut live,
        )
    }

    #[test]
    fn dt_is_clamped_and_zero_on_first_draw() {
        let log = Rc::new(RefCell::new(CanvasLog::default()));
        let mut layer = test_layer(&log, Behavior::Ok, false);
        assert_eq!(run(&mut layer, 10.0, true), TickOutcome::Drew);
        assert_eq!(run(&mut layer, 10.016, true), TickOutcome::Drew);
        assert_eq!(run(&mut layer, 20.0, true), TickOutcome::Drew);
        let draws = log.borrow().draws.clone();
        assert_eq!(draws[0], 0.0);
        assert!((draws[1] - 0.016).abs() < 1e-9);
        assert_eq!(draws[2], MAX_DT_SECONDS);
    }

    #[test]
    fn invisible_layers_are_skipped() {
        let log = Rc::new(RefCell::new(CanvasLog::default()));
        let mut layer = test_layer(&log, Behavior::Ok, false);
        layer.settings.visible = false;
        assert_eq!(run(&mut layer, 0.0, true), TickOutcome::Skipped);
        assert!(log.borrow().draws.is_empty());
    }

    #[test]
    fn draw_error_is_contained() {
        let log = Rc::new(RefCell::new(CanvasLog::default()));
        let mut layer = test_layer(&log, Behavior::Error, false);
        assert_eq!(run(&mut layer, 0.0, true), TickOutcome::Failed);
        assert_eq!(log.borrow().blits, 0);
        // The next tick retries.
        assert_eq!(run(&mut layer, 0.016, true), TickOutcome::Failed);
    }

    #[test]
    fn draw_panic_is_contained() {
        let log = Rc::new(RefCell::new(CanvasLog::default()));
        let mut layer = test_layer(&log, Behavior::Panic, false);
        assert_eq!(run(&mut layer, 0.0, true), TickOutcome::Failed);
    }

    #[test]
    fn mirrors_blit_after_successful_draw_only() {
        let log = Rc::new(RefCell::new(CanvasLog::default()));
        let mut layer = test_layer(&log, Behavior::Ok, false);
        layer.add_mirror(Box::new(TestCanvas { log: log.clone() }));
        layer.add_mirror(Box::new(TestCanvas { log: log.clone() }));
        run(&mut layer, 0.0, true);
        assert_eq!(log.borrow().blits, 2);
    }

    #[test]
    fn init_3d_runs_lazily_exactly_once() {
        let log = Rc::new(RefCell::new(CanvasLog::default()));
        let mut layer = test_layer(&log, Behavior::Ok, true);
        run(&mut layer, 0.0, true);
        run(&mut layer, 0.016, true);
        assert_eq!(log.borrow().init3d, 1);
    }

    #[test]
    fn freeze_retains_frame_while_paused() {
        let log = Rc::new(RefCell::new(CanvasLog::default()));
        let mut layer = test_layer(&log, Behavior::Ok, false);
        layer.settings.freeze = true;
        let registry = NodeRegistry::new();
        let mut networks = NetworkStore::new();
        let mut live = LiveValues::new();

        let mut frame = AudioFrame::default();
        frame.time = 1.0;
        tick_layer(&mut layer, &frame, false, 0.0, &mut networks, &registry, &mut live);
        assert!(layer.frozen_frame.is_some());
        assert_eq!(layer.frozen_frame.as_ref().unwrap().time, 1.0);

        // Still paused: the retained frame sticks even as live time moves.
        frame.time = 2.0;
        tick_layer(&mut layer, &frame, false, 0.016, &mut networks, &registry, &mut live);
        assert_eq!(layer.frozen_frame.as_ref().unwrap().time, 1.0);

        // Playing again: the retained copy is dropped.
        tick_layer(&mut layer, &frame, true, 0.032, &mut networks, &registry, &mut live);
        assert!(layer.frozen_frame.is_none());
    }
}
