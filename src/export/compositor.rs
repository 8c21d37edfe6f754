// Canvas compositing - fit a foreground onto an exact-size transparent canvas

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Fit `foreground` onto a transparent canvas of exactly
/// `target_width` x `target_height` pixels.
///
/// The foreground is scaled by `min(tw/fw, th/fh, 1.0)`, so it is shrunk to
/// fit but never enlarged, aspect ratio preserved, then pasted centered
/// with floored offsets (an odd leftover pixel lands top-left). Pixels are
/// copied as-is, alpha included. Pure and deterministic.
pub fn composite(foreground: &RgbaImage, target_width: u32, target_height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(target_width, target_height);

    let (fg_width, fg_height) = foreground.dimensions();
    if fg_width == 0 || fg_height == 0 || target_width == 0 || target_height == 0 {
        return canvas;
    }

    let scale = f64::min(
        1.0,
        f64::min(
            target_width as f64 / fg_width as f64,
            target_height as f64 / fg_height as f64,
        ),
    );

    let scaled;
    let fitted = if scale < 1.0 {
        let width = ((fg_width as f64 * scale).round() as u32).clamp(1, target_width);
        let height = ((fg_height as f64 * scale).round() as u32).clamp(1, target_height);
        scaled = imageops::resize(foreground, width, height, FilterType::Lanczos3);
        &scaled
    } else {
        foreground
    };

    let offset_x = (target_width - fitted.width()) / 2;
    let offset_y = (target_height - fitted.height()) / 2;
    imageops::replace(&mut canvas, fitted, i64::from(offset_x), i64::from(offset_y));
    canvas
}
