use crate::errors::ChannelError;
use crate::header::Header;
use crate::shape::FrameShape;
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

/// Writer role of the shared frame channel.
///
/// Exactly one process holds this role per region: `create` fails if the
/// region file already exists. The writer owns the region's lifetime - it
/// is unlinked on `destroy` or, failing that, when the writer is dropped,
/// so abnormal worker exits do not leak the OS-level resource.
#[derive(Debug)]
pub struct FrameChannelWriter {
    mmap: MmapMut,
    path: PathBuf,
    shape: FrameShape,
    sequence: u64,
}

impl FrameChannelWriter {
    /// Create the named region and initialize its header.
    ///
    /// Fails with `AlreadyExists` if a region of that name is still held -
    /// there is never more than one writer per region.
    pub fn create(path: impl AsRef<Path>, shape: FrameShape) -> Result<Self, ChannelError> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    ChannelError::AlreadyExists(path.display().to_string())
                }
                _ => ChannelError::Io(e),
            })?;

        let total = Header::SIZE + shape.byte_len();
        file.set_len(total as u64)?;

        let mut mmap = unsafe { MmapOptions::new().map_mut(&file)? };

        // Shape is written once here, before any reader can attach.
        let header = unsafe { &mut *(mmap.as_mut_ptr() as *mut Header) };
        header.height = shape.height;
        header.width = shape.width;
        header.channels = shape.channels;
        header.reserved = 0;
        header.sequence.store(0, Ordering::Release);

        tracing::debug!(path = %path.display(), ?shape, "frame channel region created");

        Ok(Self {
            mmap,
            path,
            shape,
            sequence: 0,
        })
    }

    /// Overwrite the whole region with a new frame and publish it.
    ///
    /// Latest wins: no queue, no backpressure, no partial updates. The frame
    /// must match the region's shape exactly.
    pub fn publish(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        if frame.len() != self.shape.byte_len() {
            return Err(ChannelError::SizeMismatch);
        }

        self.mmap[Header::SIZE..Header::SIZE + frame.len()].copy_from_slice(frame);

        // Publish after the payload copy so a first reader never observes
        // a nonzero sequence with uninitialized pixels.
        self.sequence += 1;
        let header = unsafe { &*(self.mmap.as_ptr() as *const Header) };
        header.sequence.store(self.sequence, Ordering::Release);

        Ok(())
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Explicit teardown: release the mapping and remove the named region.
    ///
    /// Consuming `self` makes a double destroy unrepresentable. Dropping the
    /// writer without calling this performs the same cleanup.
    pub fn destroy(self) {
        drop(self);
    }

    fn unlink(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to unlink channel region");
        }
    }
}

impl Drop for FrameChannelWriter {
    fn drop(&mut self) {
        self.unlink();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::FrameChannelReader;
    use tempfile::tempdir;

    const SHAPE: FrameShape = FrameShape::new(4, 4, 3);

    #[test]
    fn create_initializes_sequence_to_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("region");

        let writer = FrameChannelWriter::create(&path, SHAPE).unwrap();
        assert_eq!(writer.sequence(), 0);

        let reader = FrameChannelReader::attach(&path, SHAPE).unwrap();
        assert_eq!(reader.sequence(), 0, "no frame published yet");
    }

    #[test]
    fn second_create_fails_while_region_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("region");

        let _writer = FrameChannelWriter::create(&path, SHAPE).unwrap();
        match FrameChannelWriter::create(&path, SHAPE) {
            Err(ChannelError::AlreadyExists(_)) => {}
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[test]
    fn publish_increments_sequence_and_copies_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("region");

        let mut writer = FrameChannelWriter::create(&path, SHAPE).unwrap();
        let frame = vec![7u8; SHAPE.byte_len()];
        writer.publish(&frame).unwrap();
        assert_eq!(writer.sequence(), 1);

        let reader = FrameChannelReader::attach(&path, SHAPE).unwrap();
        assert_eq!(reader.sequence(), 1);
        assert_eq!(reader.frame(), frame.as_slice());

        writer.publish(&vec![9u8; SHAPE.byte_len()]).unwrap();
        assert_eq!(reader.sequence(), 2);
        assert_eq!(reader.frame()[0], 9);
    }

    #[test]
    fn publish_rejects_wrong_frame_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("region");

        let mut writer = FrameChannelWriter::create(&path, SHAPE).unwrap();
        let short = vec![0u8; SHAPE.byte_len() - 1];
        assert!(matches!(
            writer.publish(&short),
            Err(ChannelError::SizeMismatch)
        ));
        let long = vec![0u8; SHAPE.byte_len() + 1];
        assert!(matches!(
            writer.publish(&long),
            Err(ChannelError::SizeMismatch)
        ));
        assert_eq!(writer.sequence(), 0, "rejected publishes must not count");
    }

    #[test]
    fn destroy_removes_region_so_new_writer_can_claim_the_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("region");

        let writer = FrameChannelWriter::create(&path, SHAPE).unwrap();
        writer.destroy();
        assert!(!path.exists());

        // Name is free again.
        let _writer = FrameChannelWriter::create(&path, SHAPE).unwrap();
    }

    #[test]
    fn drop_also_unlinks_the_region() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("region");

        {
            let _writer = FrameChannelWriter::create(&path, SHAPE).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists(), "abnormal exit paths rely on Drop cleanup");
    }
}
