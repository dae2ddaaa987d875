use crate::errors::ChannelError;
use crate::header::Header;
use crate::shape::FrameShape;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::atomic::Ordering;

/// Reader role of the shared frame channel.
///
/// Any number of processes may attach to an existing region by name. A
/// reader never destroys the region - dropping it only releases the local
/// mapping, which is safe to do independently in every reader.
#[derive(Debug)]
pub struct FrameChannelReader {
    mmap: Mmap,
    shape: FrameShape,
    last_read: u64,
}

impl FrameChannelReader {
    /// Attach to an existing region.
    ///
    /// Fails with `NotFound` if no writer has created the region yet (a
    /// reader must surface that immediately rather than hang), and with
    /// `ShapeMismatch` if the region was created with a different shape.
    pub fn attach(path: impl AsRef<Path>, shape: FrameShape) -> Result<Self, ChannelError> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ChannelError::NotFound(path.display().to_string()),
            _ => ChannelError::Io(e),
        })?;

        let needed = (Header::SIZE + shape.byte_len()) as u64;
        if file.metadata()?.len() < needed {
            return Err(ChannelError::SizeMismatch);
        }

        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let header = unsafe { &*(mmap.as_ptr() as *const Header) };
        let found = header.shape();
        if found != shape {
            return Err(ChannelError::ShapeMismatch {
                expected: shape,
                found,
            });
        }

        Ok(Self {
            mmap,
            shape,
            last_read: 0,
        })
    }

    /// Latest published sequence number. 0 means no frame has been written.
    pub fn sequence(&self) -> u64 {
        let header = unsafe { &*(self.mmap.as_ptr() as *const Header) };
        header.sequence.load(Ordering::Acquire)
    }

    /// Returns the current sequence if it advanced past the last `mark_read`.
    pub fn has_new_data(&self) -> Option<u64> {
        let seq = self.sequence();
        (seq > 0 && seq != self.last_read).then_some(seq)
    }

    pub fn mark_read(&mut self) {
        self.last_read = self.sequence();
    }

    /// The bytes currently resident in the region.
    ///
    /// May observe a frame mid-overwrite (a torn read); the slice is always
    /// in bounds and exactly one frame long regardless.
    pub fn frame(&self) -> &[u8] {
        &self.mmap[Header::SIZE..Header::SIZE + self.shape.byte_len()]
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Release the local mapping without touching the region itself.
    pub fn close(self) {
        drop(self);
    }
}
