/// Fixed frame geometry shared out of band between the writer and every
/// reader of a channel region. There is no negotiation protocol: both sides
/// must agree on the exact shape before attaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
    pub height: u32,
    pub width: u32,
    pub channels: u32,
}

impl FrameShape {
    pub const fn new(height: u32, width: u32, channels: u32) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Total payload size in bytes (one byte per sample).
    pub const fn byte_len(&self) -> usize {
        self.height as usize * self.width as usize * self.channels as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_len_is_product_of_dimensions() {
        assert_eq!(FrameShape::new(480, 640, 3).byte_len(), 480 * 640 * 3);
        assert_eq!(FrameShape::new(1, 1, 1).byte_len(), 1);
    }
}
