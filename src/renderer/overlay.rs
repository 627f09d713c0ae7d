use opencv::{
    prelude::*,
    imgproc,
    core::{Mat, Point, Scalar, CV_8UC3},
};

use crate::shared::constants;

const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

/// Font scale for a frame of the given height; 1.0 at 720p.
fn font_scale(height: u32) -> f64 {
    constants::OVERLAY_FONT_SCALE * (height as f64 / 720.0).max(0.35)
}

/// Draws `label` in the top-left corner of a packed RGB24 buffer, white on a black outline.
pub fn burn_label(buffer: &mut [u8], width: u32, height: u32, label: &str) -> opencv::Result<()> {
    let mut mat = Mat::new_rows_cols_with_default(
        height as i32,
        width as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(buffer);

    let scale = font_scale(height);
    let mut baseline = 0;
    let text_size = imgproc::get_text_size(
        label,
        FONT,
        scale,
        constants::OVERLAY_THICKNESS,
        &mut baseline,
    )?;
    let origin = Point::new(
        constants::OVERLAY_MARGIN_PX,
        constants::OVERLAY_MARGIN_PX + text_size.height,
    );

    imgproc::put_text(
        &mut mat,
        label,
        origin,
        FONT,
        scale,
        Scalar::all(0.0),
        constants::OVERLAY_OUTLINE_THICKNESS,
        imgproc::LINE_AA,
        false,
    )?;
    imgproc::put_text(
        &mut mat,
        label,
        origin,
        FONT,
        scale,
        Scalar::all(255.0),
        constants::OVERLAY_THICKNESS,
        imgproc::LINE_AA,
        false,
    )?;

    buffer.copy_from_slice(mat.data_bytes()?);
    Ok(())
}
