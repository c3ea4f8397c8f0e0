pub mod landmark;
pub mod source;

pub use landmark::{FrameError, Joints, Landmark, LandmarkFrame, LandmarkIndex, Side};
pub use source::{FrameReader, FrameRecord, RecordError};
