use crate::camera::Camera;
use crate::config::{ExitPolicy, RunMode, VisualizerKind, WorkerArgs};
use crate::decoder::rgb_to_luma;
use crate::exit::ExitCheck;
use crate::handlers::SpellHandler;
use crate::visualize::PathVisualizer;
use anyhow::Result;
use channel::DEFAULT_FRAME_SHAPE;
use std::ops::ControlFlow;
use tracker::{BrightBlobDetector, PointDetector, WandTracker};

/// One worker process: camera in, gestures out.
///
/// Per-frame pipeline: decode to RGB, find bright blobs in the luma plane,
/// feed candidates to the wand tracker, hand completed gestures to the mode's
/// handler, then render the in-flight path for whoever is watching.
pub struct Spellcaster {
    camera: Camera,
    detector: BrightBlobDetector,
    tracker: WandTracker,
    handler: SpellHandler,
    visualizer: PathVisualizer,
    exit: ExitCheck,
}

impl Spellcaster {
    pub fn build(args: &WorkerArgs) -> Result<Self> {
        let shape = DEFAULT_FRAME_SHAPE;
        let camera = Camera::build(args.device, shape)?;

        let handler = match args.mode {
            RunMode::Inference | RunMode::Debug => SpellHandler::inference(None),
            RunMode::Training => {
                let spell = args.spell.as_deref().unwrap_or_default();
                SpellHandler::training(&args.samples_dir, spell)?
            }
        };

        let visualizer = match args.visualizer {
            VisualizerKind::None => PathVisualizer::disabled(),
            VisualizerKind::Window => PathVisualizer::window(shape)?,
            VisualizerKind::Channel => PathVisualizer::channel(shape)?,
        };

        let exit = match args.exit {
            ExitPolicy::Signal => ExitCheck::signal()?,
            ExitPolicy::Keypress => ExitCheck::keypress(),
        };

        Ok(Self {
            camera,
            detector: BrightBlobDetector::default(),
            tracker: WandTracker::default(),
            handler,
            visualizer,
            exit,
        })
    }

    pub fn run(self) -> Result<()> {
        let Self {
            mut camera,
            mut detector,
            mut tracker,
            mut handler,
            mut visualizer,
            exit,
        } = self;

        let mut luma = Vec::new();

        camera.run(|frame, width, height| {
            rgb_to_luma(frame, &mut luma);
            let candidates = detector.detect(&luma, width, height);

            if let Some(gesture) = tracker.advance(&candidates) {
                handler.handle_gesture(&gesture, width, height)?;
            }

            let path: Vec<_> = tracker.path().collect();
            visualizer.render(frame, width, height, &path)?;

            if exit.should_stop(&visualizer) {
                tracing::info!("Shutdown requested, stopping capture");
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        })
    }
}
