use crate::draw::draw_path_rgb;
use anyhow::{Context, Result, anyhow};
use channel::{FRAME_CHANNEL_PATH, FrameChannelWriter, FrameShape};
use minifb::{Key, Window, WindowOptions};
use tracker::Point;

const PATH_COLOR: [u8; 3] = [255, 0, 0];

/// Where annotated frames go. Every worker carries one of these; `Disabled`
/// keeps the call sites uniform for headless inference runs.
pub enum PathVisualizer {
    Disabled,
    Window(WindowPreview),
    Channel(ChannelPreview),
}

impl PathVisualizer {
    pub fn disabled() -> Self {
        Self::Disabled
    }

    pub fn window(shape: FrameShape) -> Result<Self> {
        Ok(Self::Window(WindowPreview::open(shape)?))
    }

    pub fn channel(shape: FrameShape) -> Result<Self> {
        Ok(Self::Channel(ChannelPreview::create(shape)?))
    }

    /// Draws the in-flight path over the frame and shows/publishes the result.
    pub fn render(&mut self, frame: &[u8], width: u32, height: u32, path: &[Point]) -> Result<()> {
        match self {
            Self::Disabled => Ok(()),
            Self::Window(preview) => preview.render(frame, width, height, path),
            Self::Channel(preview) => preview.render(frame, width, height, path),
        }
    }

    /// True once the preview window was closed or `q` pressed. Always false
    /// for the headless variants; those workers stop on signals.
    pub fn quit_requested(&self) -> bool {
        match self {
            Self::Window(preview) => preview.quit_requested(),
            _ => false,
        }
    }
}

/// Local preview window for debugging without the gateway.
pub struct WindowPreview {
    window: Window,
    buf: Vec<u32>,
}

impl WindowPreview {
    fn open(shape: FrameShape) -> Result<Self> {
        let window = Window::new(
            "spellcaster",
            shape.width as usize,
            shape.height as usize,
            WindowOptions::default(),
        )
        .map_err(|e| anyhow!("Failed to open preview window: {e}"))?;

        Ok(Self {
            window,
            buf: vec![0; (shape.width * shape.height) as usize],
        })
    }

    fn render(&mut self, frame: &[u8], width: u32, height: u32, path: &[Point]) -> Result<()> {
        let mut rgb = frame.to_vec();
        draw_path_rgb(&mut rgb, width, height, path, PATH_COLOR);

        for (slot, px) in self.buf.iter_mut().zip(rgb.chunks_exact(3)) {
            *slot = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
        }

        self.window
            .update_with_buffer(&self.buf, width as usize, height as usize)
            .map_err(|e| anyhow!("Preview window update failed: {e}"))
    }

    fn quit_requested(&self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Q)
    }
}

/// Publishes annotated frames to the shared frame channel for the gateway's
/// stream. Dropping the preview (worker exit) unlinks the channel.
pub struct ChannelPreview {
    writer: FrameChannelWriter,
    scratch: Vec<u8>,
}

impl ChannelPreview {
    fn create(shape: FrameShape) -> Result<Self> {
        let writer = FrameChannelWriter::create(FRAME_CHANNEL_PATH, shape)
            .context("Failed to create frame channel")?;
        Ok(Self {
            writer,
            scratch: vec![0; shape.byte_len()],
        })
    }

    fn render(&mut self, frame: &[u8], width: u32, height: u32, path: &[Point]) -> Result<()> {
        self.scratch.clear();
        self.scratch.extend_from_slice(frame);
        draw_path_rgb(&mut self.scratch, width, height, path, PATH_COLOR);
        self.writer.publish(&self.scratch)?;
        Ok(())
    }
}
