pub mod overlay;
pub mod transform;
pub mod writer;

pub use transform::{FrameTransform, TransformOptions};
pub use writer::OutputWriter;

use fast_image_resize as fr;

use crate::utils::logger;

/// Resampling filter used when scaling frames.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
    Cubic,
    Area,
}

impl Interpolation {
    /// Unknown names fall back to the default with a warning.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "nearest" => Interpolation::Nearest,
            "linear" | "bilinear" => Interpolation::Linear,
            "cubic" | "bicubic" => Interpolation::Cubic,
            "area" | "box" => Interpolation::Area,
            other => {
                let fallback = Interpolation::default();
                logger::warn(&format!(
                    "Unknown interpolation '{}', falling back to {:?}",
                    other, fallback
                ));
                fallback
            }
        }
    }

    pub fn resize_alg(self) -> fr::ResizeAlg {
        match self {
            Interpolation::Nearest => fr::ResizeAlg::Nearest,
            Interpolation::Linear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            Interpolation::Cubic => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            Interpolation::Area => fr::ResizeAlg::Convolution(fr::FilterType::Box),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageFormat {
    #[default]
    Jpg,
    Png,
    Bmp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
        }
    }
}
