use std::time::Duration;

/// A decoded RGB24 frame and its place in the stream.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameData {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Zero-based position in the full decoded stream.
    pub index: u64,
    pub timestamp: Duration,
}

impl FrameData {
    pub fn new(buffer: Vec<u8>, width: u32, height: u32, index: u64, fps: f64) -> Self {
        let timestamp = Duration::try_from_secs_f64(index as f64 / fps).unwrap_or_default();
        Self { buffer, width, height, index, timestamp }
    }

    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    pub fn same_shape(&self, other: &FrameData) -> bool {
        self.width == other.width && self.height == other.height && self.buffer.len() == other.buffer.len()
    }
}
