use crate::decoder::{FrameDecoder, MjpegDecoder, YuyvDecoder};
use anyhow::{Context, Result, anyhow};
use channel::FrameShape;
use common::retry::retry_with_backoff;
use std::ops::ControlFlow;
use v4l::{
    FourCC,
    buffer::Type,
    io::{mmap::Stream, traits::CaptureStream},
    prelude::*,
    video::Capture,
};

const BUFFER_COUNT: u32 = 4;

const FOURCC_YUYV: FourCC = FourCC { repr: *b"YUYV" };
const FOURCC_MJPG: FourCC = FourCC { repr: *b"MJPG" };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    Yuyv,
    Mjpeg,
}

fn find_usable_camera() -> Option<u32> {
    v4l::context::enum_devices()
        .into_iter()
        .find(|dev| {
            Device::with_path(dev.path())
                .and_then(|d| d.query_caps())
                .map(|caps| {
                    caps.capabilities
                        .contains(v4l::capability::Flags::VIDEO_CAPTURE)
                })
                .unwrap_or(false)
        })
        .map(|dev| dev.index() as u32)
}

fn open_device(index: u32) -> Result<Device> {
    if let Ok(dev) = Device::new(index as usize)
        && dev.query_caps().is_ok()
    {
        return Ok(dev);
    }

    tracing::debug!(
        "Camera index {} busy or missing, scanning alternatives...",
        index
    );

    let best_idx = find_usable_camera().ok_or_else(|| anyhow!("No usable video devices found"))?;
    Device::new(best_idx as usize).context("Failed to open fallback camera device")
}

/// Prefer YUYV (cheap decode), fall back to MJPEG.
fn select_format(device: &Device) -> Result<PixelFormat> {
    let formats = device.enum_formats()?;

    tracing::debug!("Available formats:");
    for fmt in &formats {
        tracing::debug!("  {:?}: {}", fmt.fourcc, fmt.description);
    }

    if formats.iter().any(|f| f.fourcc == FOURCC_YUYV) {
        return Ok(PixelFormat::Yuyv);
    }

    if formats.iter().any(|f| f.fourcc == FOURCC_MJPG) {
        return Ok(PixelFormat::Mjpeg);
    }

    Err(anyhow!(
        "Camera supports neither YUYV nor MJPEG - available: {:?}",
        formats.iter().map(|f| f.fourcc).collect::<Vec<_>>()
    ))
}

pub struct Camera {
    device: Device,
    width: u32,
    height: u32,
    decoder: Box<dyn FrameDecoder>,
}

impl Camera {
    /// Opens the device and negotiates the exact shape the frame channel
    /// carries. A camera that cannot deliver that resolution is an error,
    /// not something to paper over with a resize.
    pub fn build(device_index: u32, shape: FrameShape) -> Result<Self> {
        let device = retry_with_backoff(|| open_device(device_index), 10, 200, "Camera Init")?;

        let caps = device.query_caps()?;
        tracing::info!("Camera opened: {} ({})", caps.card, caps.driver);

        let pixel_format = select_format(&device)?;
        let fourcc = match pixel_format {
            PixelFormat::Yuyv => FOURCC_YUYV,
            PixelFormat::Mjpeg => FOURCC_MJPG,
        };

        let mut format = device.format()?;
        format.fourcc = fourcc;
        format.width = shape.width;
        format.height = shape.height;
        let format = device.set_format(&format)?;

        if (format.width, format.height) != (shape.width, shape.height) {
            return Err(anyhow!(
                "Camera negotiated {}x{}, need {}x{}",
                format.width,
                format.height,
                shape.width,
                shape.height
            ));
        }

        tracing::info!(
            "Capture format: {}x{} {:?} ({:?})",
            format.width,
            format.height,
            format.fourcc,
            pixel_format
        );

        let decoder: Box<dyn FrameDecoder> = match pixel_format {
            PixelFormat::Yuyv => Box::new(YuyvDecoder::new()),
            PixelFormat::Mjpeg => Box::new(MjpegDecoder::new()),
        };

        Ok(Self {
            device,
            width: format.width,
            height: format.height,
            decoder,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Capture loop. Calls `on_frame` with each decoded RGB frame until the
    /// callback asks to stop or an error surfaces.
    ///
    /// A failed dequeue is fatal: a worker with a dead camera is useless and
    /// the supervisor restarts it, so there is no point limping along.
    pub fn run(
        &mut self,
        mut on_frame: impl FnMut(&[u8], u32, u32) -> Result<ControlFlow<()>>,
    ) -> Result<()> {
        tracing::info!("Starting camera stream at {}x{}...", self.width, self.height);

        let mut stream = Stream::with_buffers(&self.device, Type::VideoCapture, BUFFER_COUNT)
            .context("Failed to create capture stream")?;

        let mut frame_count = 0u64;
        let mut dropped_frames = 0u64;

        loop {
            let (buf, _meta) = stream.next().context("Camera stream failed")?;

            let rgb = match self.decoder.decode(buf, self.width, self.height) {
                Ok(data) => data,
                Err(e) => {
                    dropped_frames += 1;
                    tracing::warn!("Frame #{} decode error: {}", frame_count, e);
                    continue;
                }
            };
            frame_count += 1;

            if frame_count.is_multiple_of(300) {
                tracing::debug!(
                    "Status: [Frames: {}] [Dropped: {}]",
                    frame_count,
                    dropped_frames
                );
            }

            if let ControlFlow::Break(()) = on_frame(rgb, self.width, self.height)? {
                break;
            }
        }

        tracing::info!(
            "Capture stopped: {} frames, {} dropped.",
            frame_count,
            dropped_frames
        );
        Ok(())
    }
}
