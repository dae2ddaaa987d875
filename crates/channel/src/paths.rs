//! Centralized IPC configuration.
//!
//! The region path and frame shape are part of the deployment contract
//! between the worker process (writer) and the gateway process (reader).
//! Keeping them in one place avoids mismatches between the two sides.

use crate::shape::FrameShape;

/// Preview frame region - written by the worker, read by the gateway.
pub const FRAME_CHANNEL_PATH: &str = "/dev/shm/spellcaster_frame_buffer";

/// Fixed preview frame shape: 480x640 RGB, one byte per sample.
pub const DEFAULT_FRAME_SHAPE: FrameShape = FrameShape::new(480, 640, 3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_path_is_absolute() {
        assert!(FRAME_CHANNEL_PATH.starts_with('/'));
    }

    #[test]
    fn default_shape_is_rgb() {
        assert_eq!(DEFAULT_FRAME_SHAPE.channels, 3);
        assert_eq!(DEFAULT_FRAME_SHAPE.byte_len(), 480 * 640 * 3);
    }
}
