use std::fs;
use std::path::{Path, PathBuf};

use super::ImageFormat;
use crate::core::error::{ExtractError, UnitError};
use crate::shared::constants;
use crate::utils::file_utils;

/// Names and writes encoded frames into one directory.
#[derive(Clone, Debug)]
pub struct OutputWriter {
    directory: PathBuf,
    format: ImageFormat,
}

impl OutputWriter {
    pub fn new(directory: impl Into<PathBuf>, format: ImageFormat) -> Self {
        Self { directory: directory.into(), format }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Creates the output directory. Safe to call when it already exists.
    pub fn prepare(&self) -> Result<(), ExtractError> {
        file_utils::ensure_dir(&self.directory).map_err(|source| ExtractError::OutputDir {
            path: self.directory.clone(),
            source,
        })
    }

    pub fn file_name(&self, sequence: u64) -> String {
        format!(
            "{}{:0width$}.{}",
            constants::FRAME_FILE_PREFIX,
            sequence,
            self.format.extension(),
            width = constants::FRAME_NUMBER_WIDTH
        )
    }

    pub fn path_for(&self, sequence: u64) -> PathBuf {
        self.directory.join(self.file_name(sequence))
    }

    pub fn write(&self, bytes: &[u8], sequence: u64) -> Result<PathBuf, UnitError> {
        let path = self.path_for(sequence);
        fs::write(&path, bytes).map_err(|source| UnitError::Write {
            sequence,
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
