use crate::viewer::FrameProducer;
use anyhow::{Result, anyhow};
use channel::{FrameChannelReader, FrameShape};
use image::{ImageBuffer, RgbImage};
use std::io::Cursor;
use std::path::PathBuf;

/// Polls this many times with no fresh frame before dropping the mapping and
/// re-attaching. Covers worker restarts, where the old region is unlinked
/// and a new one appears under the same path.
const STALE_POLLS_BEFORE_REATTACH: u32 = 120;

/// Reads annotated frames from the worker's shared channel and encodes them
/// as JPEG for the stream.
///
/// The worker may not exist yet (or be between restarts), so attachment is
/// lazy and failure to attach just means "no frame this tick".
pub struct ChannelFrameProducer {
    path: PathBuf,
    shape: FrameShape,
    reader: Option<FrameChannelReader>,
    stale_polls: u32,
}

impl ChannelFrameProducer {
    pub fn new(path: impl Into<PathBuf>, shape: FrameShape) -> Self {
        Self {
            path: path.into(),
            shape,
            reader: None,
            stale_polls: 0,
        }
    }

    fn reader(&mut self) -> Option<&mut FrameChannelReader> {
        if self.reader.is_none() {
            match FrameChannelReader::attach(&self.path, self.shape) {
                Ok(reader) => {
                    tracing::info!(path = %self.path.display(), "Frame channel attached");
                    self.reader = Some(reader);
                    self.stale_polls = 0;
                }
                Err(e) => {
                    tracing::trace!("Frame channel not available: {e}");
                    return None;
                }
            }
        }
        self.reader.as_mut()
    }
}

impl FrameProducer for ChannelFrameProducer {
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        let shape = self.shape;
        let has_new = self.reader()?.has_new_data().is_some();

        if !has_new {
            self.stale_polls += 1;
            // A long quiet spell usually means the writer went away.
            if self.stale_polls >= STALE_POLLS_BEFORE_REATTACH {
                tracing::debug!("Frame channel stale, re-attaching");
                self.reader = None;
                self.stale_polls = 0;
            }
            return None;
        }
        self.stale_polls = 0;

        let reader = self.reader.as_mut()?;
        let jpeg = match encode_jpeg(reader.frame(), shape) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Frame encoding error: {e}");
                return None;
            }
        };
        reader.mark_read();
        Some(jpeg)
    }
}

fn encode_jpeg(frame: &[u8], shape: FrameShape) -> Result<Vec<u8>> {
    let img: RgbImage = ImageBuffer::from_raw(shape.width, shape.height, frame.to_vec())
        .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", shape.width, shape.height))?;

    let mut jpeg = Cursor::new(Vec::new());
    img.write_to(&mut jpeg, image::ImageFormat::Jpeg)?;
    Ok(jpeg.into_inner())
}
