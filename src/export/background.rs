// Background removal - white keying with a bounding-box crop

use crate::error::Result;
use image::{imageops, Rgba, RgbaImage};
use std::collections::VecDeque;

/// Foreground extraction seam.
///
/// Implementations must preserve the foreground, give background pixels
/// alpha 0, and return an image whose bounding box is identical to or
/// smaller than the input's.
pub trait BackgroundRemover: Send + Sync {
    fn remove(&self, image: &RgbaImage) -> Result<RgbaImage>;
}

/// Built-in remover for the near-white backdrops the composed prompts ask for.
///
/// Flood-fills from the image borders across near-white pixels, clearing
/// their alpha, then crops to the remaining opaque bounding box. White
/// regions enclosed by the foreground are not reachable from the borders and
/// survive.
pub struct WhiteKeyRemover {
    threshold: u8,
}

impl WhiteKeyRemover {
    pub fn new() -> Self {
        Self::with_threshold(235)
    }

    /// `threshold` is the minimum channel value a pixel needs on all three
    /// color channels to count as background
    pub fn with_threshold(threshold: u8) -> Self {
        Self { threshold }
    }

    fn is_background(&self, pixel: &Rgba<u8>) -> bool {
        let [r, g, b, a] = pixel.0;
        a == 0 || (r >= self.threshold && g >= self.threshold && b >= self.threshold)
    }
}

impl Default for WhiteKeyRemover {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundRemover for WhiteKeyRemover {
    fn remove(&self, image: &RgbaImage) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(image.clone());
        }

        let mut output = image.clone();
        let mut visited = vec![false; (width as usize) * (height as usize)];
        let mut queue: VecDeque<(u32, u32)> = VecDeque::new();

        let enqueue = |x: u32, y: u32, queue: &mut VecDeque<(u32, u32)>, visited: &mut Vec<bool>| {
            let idx = (y as usize) * (width as usize) + x as usize;
            if !visited[idx] && self.is_background(image.get_pixel(x, y)) {
                visited[idx] = true;
                queue.push_back((x, y));
            }
        };

        for x in 0..width {
            enqueue(x, 0, &mut queue, &mut visited);
            enqueue(x, height - 1, &mut queue, &mut visited);
        }
        for y in 0..height {
            enqueue(0, y, &mut queue, &mut visited);
            enqueue(width - 1, y, &mut queue, &mut visited);
        }

        while let Some((x, y)) = queue.pop_front() {
            output.get_pixel_mut(x, y).0[3] = 0;

            let neighbors = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbors {
                if nx >= width || ny >= height {
                    continue;
                }
                let idx = (ny as usize) * (width as usize) + nx as usize;
                if !visited[idx] && self.is_background(image.get_pixel(nx, ny)) {
                    visited[idx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        Ok(crop_to_content(&output))
    }
}

/// Crop to the bounding box of pixels with non-zero alpha.
/// A fully transparent image is returned unchanged.
fn crop_to_content(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (u32::MAX, u32::MAX, 0, 0);

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] > 0 {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x == u32::MAX {
        return image.clone();
    }
    if (min_x, min_y, max_x, max_y) == (0, 0, width - 1, height - 1) {
        return image.clone();
    }

    imageops::crop_imm(image, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([200, 30, 30, 255]);

    #[test]
    fn test_border_connected_white_is_cleared_and_cropped() {
        let mut image = RgbaImage::from_pixel(10, 10, WHITE);
        for y in 4..7 {
            for x in 4..7 {
                image.put_pixel(x, y, RED);
            }
        }

        let result = WhiteKeyRemover::new().remove(&image).unwrap();

        assert_eq!(result.dimensions(), (3, 3));
        assert!(result.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_enclosed_white_survives() {
        // Red ring with one white pixel inside it
        let mut image = RgbaImage::from_pixel(8, 8, WHITE);
        for y in 2..6 {
            for x in 2..6 {
                image.put_pixel(x, y, RED);
            }
        }
        image.put_pixel(4, 4, WHITE);

        let result = WhiteKeyRemover::new().remove(&image).unwrap();

        assert_eq!(result.dimensions(), (4, 4));
        // Interior white pixel keeps its alpha
        assert_eq!(result.get_pixel(2, 2), &WHITE);
        assert_eq!(result.get_pixel(0, 0), &RED);
    }

    #[test]
    fn test_off_white_is_keyed_by_threshold() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([240, 240, 240, 255]));
        image.put_pixel(1, 1, RED);
        image.put_pixel(2, 2, RED);

        let result = WhiteKeyRemover::new().remove(&image).unwrap();
        assert_eq!(result.dimensions(), (2, 2));

        let strict = WhiteKeyRemover::with_threshold(250).remove(&image).unwrap();
        assert_eq!(strict.dimensions(), (4, 4));
    }

    #[test]
    fn test_foreground_without_background_is_untouched() {
        let image = RgbaImage::from_pixel(5, 5, RED);
        let result = WhiteKeyRemover::new().remove(&image).unwrap();
        assert_eq!(result, image);
    }
}
