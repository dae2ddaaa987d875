use crate::draw::draw_path_luma;
use anyhow::{Context, Result, anyhow};
use image::{GrayImage, imageops};
use std::path::PathBuf;
use tracker::Point;

/// Side of the square grayscale image a gesture path gets rasterized into.
pub const SAMPLE_SIZE: u32 = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Pluggable gesture classifier. The worker draws the completed path into a
/// [`SAMPLE_SIZE`] square image and hands it here.
pub trait GestureClassifier: Send {
    fn classify(&self, sample: &GrayImage) -> Result<Prediction>;
}

/// Renders a completed gesture path as white strokes on black, downscaled to
/// the classifier's input size.
pub fn rasterize_path(path: &[Point], width: u32, height: u32) -> Result<GrayImage> {
    let mut canvas = vec![0u8; (width * height) as usize];
    draw_path_luma(&mut canvas, width, height, path, 255);

    let full = GrayImage::from_raw(width, height, canvas)
        .ok_or_else(|| anyhow!("canvas buffer does not match {}x{}", width, height))?;

    Ok(imageops::resize(
        &full,
        SAMPLE_SIZE,
        SAMPLE_SIZE,
        imageops::FilterType::Triangle,
    ))
}

/// What the worker does with a completed gesture.
pub enum SpellHandler {
    /// Classify the gesture. With no classifier wired in, just log that a
    /// gesture completed; the rest of the pipeline is unaffected.
    Inference {
        classifier: Option<Box<dyn GestureClassifier>>,
    },
    /// Save the gesture as a labeled training sample.
    Training { sample_dir: PathBuf },
}

impl SpellHandler {
    pub fn inference(classifier: Option<Box<dyn GestureClassifier>>) -> Self {
        Self::Inference { classifier }
    }

    /// Creates the spell's sample directory up front so a bad path fails at
    /// startup instead of on the first completed gesture.
    pub fn training(samples_dir: &std::path::Path, spell: &str) -> Result<Self> {
        let sample_dir = samples_dir.join(spell);
        std::fs::create_dir_all(&sample_dir)
            .with_context(|| format!("Failed to create sample dir {}", sample_dir.display()))?;
        Ok(Self::Training { sample_dir })
    }

    pub fn handle_gesture(&mut self, path: &[Point], width: u32, height: u32) -> Result<()> {
        let sample = rasterize_path(path, width, height)?;

        match self {
            Self::Inference { classifier } => match classifier {
                Some(model) => {
                    let prediction = model.classify(&sample)?;
                    tracing::info!(
                        spell = %prediction.label,
                        confidence = prediction.confidence,
                        "spell detected"
                    );
                }
                None => {
                    tracing::info!(points = path.len(), "spell detected (no classifier loaded)");
                }
            },
            Self::Training { sample_dir } => {
                let name = format!("{}.png", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
                let dest = sample_dir.join(name);
                sample
                    .save(&dest)
                    .with_context(|| format!("Failed to save sample {}", dest.display()))?;
                tracing::info!(sample = %dest.display(), points = path.len(), "training sample saved");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal_path() -> Vec<Point> {
        (0..20).map(|i| Point::new(i * 30, i * 20)).collect()
    }

    #[test]
    fn rasterized_sample_has_classifier_dimensions() {
        let sample = rasterize_path(&diagonal_path(), 640, 480).unwrap();
        assert_eq!((sample.width(), sample.height()), (SAMPLE_SIZE, SAMPLE_SIZE));
        assert!(sample.pixels().any(|p| p.0[0] > 0), "strokes should survive the downscale");
    }

    #[test]
    fn empty_path_rasterizes_to_black() {
        let sample = rasterize_path(&[], 640, 480).unwrap();
        assert!(sample.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn training_writes_one_png_per_gesture() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = SpellHandler::training(dir.path(), "fireball").unwrap();
        handler.handle_gesture(&diagonal_path(), 640, 480).unwrap();

        let spell_dir = dir.path().join("fireball");
        let entries: Vec<_> = std::fs::read_dir(&spell_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let path = entries[0].as_ref().unwrap().path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

        let saved = image::open(&path).unwrap().into_luma8();
        assert_eq!((saved.width(), saved.height()), (SAMPLE_SIZE, SAMPLE_SIZE));
    }

    #[test]
    fn inference_without_classifier_is_a_no_op() {
        let mut handler = SpellHandler::inference(None);
        handler.handle_gesture(&diagonal_path(), 640, 480).unwrap();
    }

    struct FixedClassifier;

    impl GestureClassifier for FixedClassifier {
        fn classify(&self, _sample: &GrayImage) -> Result<Prediction> {
            Ok(Prediction {
                label: "lumos".into(),
                confidence: 0.9,
            })
        }
    }

    #[test]
    fn inference_consults_the_classifier() {
        let mut handler = SpellHandler::inference(Some(Box::new(FixedClassifier)));
        handler.handle_gesture(&diagonal_path(), 640, 480).unwrap();
    }
}
