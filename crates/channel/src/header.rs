use crate::shape::FrameShape;
use std::sync::atomic::AtomicU64;

/// Shared memory region layout: this header followed by the raw frame bytes.
///
/// Writer protocol:
/// 1. Copy the frame bytes into the data region
/// 2. Publish the sequence with `Ordering::Release`
///
/// Reader protocol:
/// 1. Load the sequence with `Ordering::Acquire`
/// 2. A nonzero sequence means at least one full frame has been published
///
/// The Release-Acquire pair only orders the *first* frame: a reader that
/// observes sequence N may still see pixel bytes of frame N+1 mid-overwrite.
/// The channel carries preview frames, never gesture state, so readers
/// tolerate that torn read.
///
/// `#[repr(C, align(8))]` keeps the AtomicU64 8-byte aligned regardless of
/// where the mapping starts.
#[repr(C, align(8))]
pub struct Header {
    /// Monotonically increasing publish counter. 0 means "no frame yet".
    pub sequence: AtomicU64,
    /// Frame shape, written once at create time and immutable afterwards.
    /// Readers validate it against their expected shape on attach.
    pub height: u32,
    pub width: u32,
    pub channels: u32,
    pub reserved: u32,
}

impl Header {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn shape(&self) -> FrameShape {
        FrameShape::new(self.height, self.width, self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_alignment() {
        assert_eq!(
            std::mem::align_of::<Header>(),
            8,
            "Header must be 8-byte aligned for AtomicU64"
        );
    }

    #[test]
    fn header_size() {
        assert_eq!(
            Header::SIZE,
            24,
            "Header is the sequence plus four u32 shape/padding words"
        );
    }
}
