pub mod frame_data;
pub mod video;

#[cfg(test)]
pub mod synthetic;

pub use frame_data::FrameData;
pub use video::{OpenCvSource, VideoMetadata, VideoSource};
