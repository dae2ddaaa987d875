use crate::shape::FrameShape;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("channel region already exists at {0} (another writer holds it)")]
    AlreadyExists(String),

    #[error("channel region not found at {0} (no writer has created it)")]
    NotFound(String),

    #[error("frame shape mismatch: expected {expected:?}, region holds {found:?}")]
    ShapeMismatch {
        expected: FrameShape,
        found: FrameShape,
    },

    #[error("buffer size mismatch")]
    SizeMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formatting() {
        let err = ChannelError::NotFound("/dev/shm/x".to_string());
        assert!(err.to_string().contains("not found"));

        let err = ChannelError::AlreadyExists("/dev/shm/x".to_string());
        assert!(err.to_string().contains("already exists"));

        let err = ChannelError::ShapeMismatch {
            expected: FrameShape::new(480, 640, 3),
            found: FrameShape::new(240, 320, 3),
        };
        assert!(err.to_string().contains("shape mismatch"));
    }

    #[test]
    fn io_error_converts_with_question_mark() {
        fn attach_like() -> Result<(), ChannelError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))?;
            Ok(())
        }

        match attach_like().unwrap_err() {
            ChannelError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("expected Io variant, got {other:?}"),
        }
    }
}
