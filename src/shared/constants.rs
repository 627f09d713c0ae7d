pub const APP_NAME: &str = "framecut";

pub const ERROR_LOG_FILE: &str = "framecut-error.log";
pub const DEBUG_LOG_FILE: &str = "framecut-debug.log";

pub const DEFAULT_OUTPUT_DIR: &str = "frames";

/// Output file names are `frame_000042.jpg`; the padding keeps
/// lexicographic and numeric order identical.
pub const FRAME_FILE_PREFIX: &str = "frame_";
pub const FRAME_NUMBER_WIDTH: usize = 6;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// In-flight units allowed per worker before `submit` blocks the scan.
pub const QUEUE_DEPTH_PER_WORKER: usize = 2;

pub const OVERLAY_MARGIN_PX: i32 = 10;
pub const OVERLAY_FONT_SCALE: f64 = 1.0;
pub const OVERLAY_THICKNESS: i32 = 2;
pub const OVERLAY_OUTLINE_THICKNESS: i32 = 5;

/// Exit status for a run that finished but lost some frames.
pub const EXIT_PARTIAL_FAILURE: i32 = 2;
