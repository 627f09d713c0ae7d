use opencv::{
    prelude::*,
    videoio,
    imgproc,
};
#[cfg(target_os = "macos")]
use opencv::core;
use std::path::{Path, PathBuf};
use super::frame_data::FrameData;
use crate::core::error::OpenError;
use crate::utils::logger;

/// Stream properties read once at open time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoMetadata {
    pub fps: f64,
    pub total_frames: u64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    pub fn duration(&self) -> f64 {
        self.total_frames as f64 / self.fps
    }
}

/// Sequential decoder with random access by frame index.
///
/// Decode failures on an open source surface as end-of-stream (`None`/`false`).
pub trait VideoSource {
    fn metadata(&self) -> VideoMetadata;

    fn seek_to_frame(&mut self, index: u64) -> bool;

    fn seek_to_time(&mut self, seconds: f64) -> bool {
        let fps = self.metadata().fps;
        let index = (seconds.max(0.0) * fps).floor() as u64;
        self.seek_to_frame(index)
    }

    /// Decodes the frame under the read head and advances it by one.
    fn read_next(&mut self) -> Option<FrameData>;

    /// Advances the read head by one frame without producing pixels.
    fn grab(&mut self) -> bool;
}

pub struct OpenCvSource {
    capture: videoio::VideoCapture,
    path: PathBuf,
    metadata: VideoMetadata,
    position: u64,
}

impl OpenCvSource {
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        let path_str = path.to_str().ok_or_else(|| OpenError::Unopenable {
            path: path.to_path_buf(),
            reason: "path is not valid UTF-8".to_string(),
        })?;

        if !path.is_file() {
            return Err(OpenError::Unopenable {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }

        logger::debug(&format!("Opening video with OpenCV: {}", path_str));

        // CAP_ANY allows OpenCV to choose the best backend
        let mut capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)?;

        // Try to enforce HW acceleration
        // Note: This might not work on all backends/platforms
        let _ = capture.set(videoio::CAP_PROP_HW_ACCELERATION, videoio::VIDEO_ACCELERATION_ANY as f64);

        if !capture.is_opened()? {
            let err = OpenError::Unopenable {
                path: path.to_path_buf(),
                reason: "no backend could open the file".to_string(),
            };
            logger::error(&err.to_string());
            return Err(err);
        }

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        if !(fps.is_finite() && fps > 0.0) {
            let err = OpenError::InvalidFrameRate { path: path.to_path_buf(), fps };
            logger::error(&err.to_string());
            return Err(err);
        }

        let total_frames = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)?.max(0.0) as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?.max(0.0) as u32;

        let metadata = VideoMetadata { fps, total_frames, width, height };

        logger::info(&format!(
            "OpenCV VideoCapture opened: {} ({}x{}, {:.3} fps, {} frames, {:.2} s)",
            path_str,
            width,
            height,
            fps,
            total_frames,
            metadata.duration()
        ));

        Ok(Self {
            capture,
            path: path.to_path_buf(),
            metadata,
            position: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode_current(&mut self) -> opencv::Result<Option<FrameData>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? {
            return Ok(None);
        }
        if frame.empty() {
            return Ok(None);
        }

        let mut rgb = Mat::default();
        #[cfg(target_os = "macos")]
        imgproc::cvt_color(&frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0, core::AlgorithmHint::ALGO_HINT_DEFAULT)?;

        #[cfg(not(target_os = "macos"))]
        imgproc::cvt_color(&frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        // Row padding would break the packed RGB24 layout
        let rgb = if rgb.is_continuous() { rgb } else { rgb.try_clone()? };

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let buffer = rgb.data_bytes()?.to_vec();

        Ok(Some(FrameData::new(buffer, width, height, self.position, self.metadata.fps)))
    }
}

impl VideoSource for OpenCvSource {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn seek_to_frame(&mut self, index: u64) -> bool {
        match self.capture.set(videoio::CAP_PROP_POS_FRAMES, index as f64) {
            Ok(true) => {
                self.position = index;
                true
            }
            Ok(false) => {
                logger::error(&format!("Backend refused seek to frame {}", index));
                false
            }
            Err(e) => {
                logger::error(&format!("Seek to frame {} failed: {}", index, e));
                false
            }
        }
    }

    fn read_next(&mut self) -> Option<FrameData> {
        match self.decode_current() {
            Ok(Some(frame)) => {
                self.position += 1;
                Some(frame)
            }
            Ok(None) => {
                logger::debug(&format!("Decoder EOF at frame {}", self.position));
                None
            }
            Err(e) => {
                logger::error(&format!("Decoding error at frame {}: {}", self.position, e));
                None
            }
        }
    }

    fn grab(&mut self) -> bool {
        match self.capture.grab() {
            Ok(true) => {
                self.position += 1;
                true
            }
            Ok(false) => false,
            Err(e) => {
                logger::error(&format!("Grab error at frame {}: {}", self.position, e));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_metadata() {
        let meta = VideoMetadata { fps: 30.0, total_frames: 300, width: 64, height: 48 };
        assert_eq!(meta.duration(), 10.0);
    }

    #[test]
    fn test_seek_to_time_lands_on_floor_frame() {
        let mut source = crate::decoder::synthetic::SyntheticSource::new(30.0, 300, 2, 2);
        assert!(source.seek_to_time(1.51));
        assert_eq!(source.read_next().map(|f| f.index), Some(45));
        assert!(!source.seek_to_time(20.0));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let path = std::env::temp_dir().join("framecut_definitely_missing.mp4");
        let _ = std::fs::remove_file(&path);
        match OpenCvSource::open(&path) {
            Err(OpenError::Unopenable { path: p, .. }) => assert_eq!(p, path),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("opening a missing file must fail"),
        }
    }
}
