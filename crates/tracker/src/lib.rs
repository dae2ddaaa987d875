pub mod detect;
pub mod point;
pub mod wand;

pub use detect::{BrightBlobDetector, PointDetector};
pub use point::Point;
pub use wand::{TrackerConfig, WandTracker};
