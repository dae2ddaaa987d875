pub mod errors;
pub mod header;
pub mod paths;
pub mod reader;
pub mod shape;
pub mod writer;

pub use errors::ChannelError;
pub use reader::FrameChannelReader;
pub use shape::FrameShape;
pub use writer::FrameChannelWriter;
pub use paths::{DEFAULT_FRAME_SHAPE, FRAME_CHANNEL_PATH};
