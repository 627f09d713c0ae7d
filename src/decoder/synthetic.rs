use super::frame_data::FrameData;
use super::video::{VideoMetadata, VideoSource};

/// In-memory stream whose frame `i` is filled with `shade(i)`.
pub struct SyntheticSource {
    metadata: VideoMetadata,
    shade: Box<dyn Fn(u64) -> u8>,
    position: u64,
    /// Indices handed out by `read_next`, in order.
    pub decoded: Vec<u64>,
    pub grabs: u64,
    /// Reads at or after this index fail like a corrupt packet.
    pub fail_from: Option<u64>,
    /// Every seek is refused.
    pub fail_seek: bool,
}

impl SyntheticSource {
    pub fn new(fps: f64, total_frames: u64, width: u32, height: u32) -> Self {
        Self::with_shade(fps, total_frames, width, height, |i| (i % 256) as u8)
    }

    pub fn with_shade(
        fps: f64,
        total_frames: u64,
        width: u32,
        height: u32,
        shade: impl Fn(u64) -> u8 + 'static,
    ) -> Self {
        Self {
            metadata: VideoMetadata { fps, total_frames, width, height },
            shade: Box::new(shade),
            position: 0,
            decoded: Vec::new(),
            grabs: 0,
            fail_from: None,
            fail_seek: false,
        }
    }
}

impl VideoSource for SyntheticSource {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn seek_to_frame(&mut self, index: u64) -> bool {
        if self.fail_seek || index > self.metadata.total_frames {
            return false;
        }
        self.position = index;
        true
    }

    fn read_next(&mut self) -> Option<FrameData> {
        if self.position >= self.metadata.total_frames {
            return None;
        }
        if matches!(self.fail_from, Some(limit) if self.position >= limit) {
            return None;
        }
        let value = (self.shade)(self.position);
        let len = FrameData::expected_len(self.metadata.width, self.metadata.height);
        let frame = FrameData::new(
            vec![value; len],
            self.metadata.width,
            self.metadata.height,
            self.position,
            self.metadata.fps,
        );
        self.decoded.push(self.position);
        self.position += 1;
        Some(frame)
    }

    fn grab(&mut self) -> bool {
        if self.position >= self.metadata.total_frames {
            return false;
        }
        self.position += 1;
        self.grabs += 1;
        true
    }
}
