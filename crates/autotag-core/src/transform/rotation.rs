//! Source rotation ahead of cropping.
//!
//! The crop model carries a rotation angle. The editor never changes it, so
//! the compositor almost always sees 0 and takes the fast path. Any other
//! angle rotates the source around its centre into a canvas that fits the
//! whole rotated image, with uncovered corners left black; crop percentages
//! are then relative to that expanded canvas.
//!
//! Quarter turns are exact pixel permutations. Other angles use inverse
//! mapping with bilinear sampling:
//! ```text
//! src_x = (dst_x - dst_cx) * cos(-θ) - (dst_y - dst_cy) * sin(-θ) + src_cx
//! src_y = (dst_x - dst_cx) * sin(-θ) + (dst_y - dst_cy) * cos(-θ) + src_cy
//! ```

use image::{imageops, Rgb};

use crate::composite::black_buffer;
use crate::decode::DecodedImage;
use crate::error::CropError;

/// Angles closer than this to a quarter turn are treated as exact.
const ANGLE_EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuarterTurn {
    None,
    Cw90,
    Half,
    Cw270,
}

/// Classify `angle_degrees` (positive = clockwise, y-down) as a quarter turn.
fn quarter_turn(angle_degrees: f64) -> Option<QuarterTurn> {
    let normalized = angle_degrees.rem_euclid(360.0);
    [
        (0.0, QuarterTurn::None),
        (90.0, QuarterTurn::Cw90),
        (180.0, QuarterTurn::Half),
        (270.0, QuarterTurn::Cw270),
        (360.0, QuarterTurn::None),
    ]
    .into_iter()
    .find(|(angle, _)| (normalized - angle).abs() < ANGLE_EPSILON)
    .map(|(_, turn)| turn)
}

/// True when `angle_degrees` leaves the image untouched.
pub fn is_identity(angle_degrees: f64) -> bool {
    quarter_turn(angle_degrees) == Some(QuarterTurn::None)
}

/// Bounding box of a `width` x `height` rectangle rotated by `angle_degrees`.
///
/// ```text
/// new_w = |w*cos| + |h*sin|
/// new_h = |w*sin| + |h*cos|
/// ```
pub fn rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turn(angle_degrees) {
        Some(QuarterTurn::None | QuarterTurn::Half) => return (width, height),
        Some(QuarterTurn::Cw90 | QuarterTurn::Cw270) => return (height, width),
        None => {}
    }

    let rad = angle_degrees.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
    let (w, h) = (width as f64, height as f64);

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Rotate `image` clockwise by `angle_degrees` into its expanded bounds.
///
/// # Errors
///
/// `CropError::RasterContextUnavailable` when the expanded bounds exceed the
/// compositor's canvas limit or cannot be allocated.
pub fn rotate(image: &DecodedImage, angle_degrees: f64) -> Result<DecodedImage, CropError> {
    if let Some(turn) = quarter_turn(angle_degrees) {
        return Ok(rotate_quarter(image, turn));
    }

    let (dst_w, dst_h) = rotated_bounds(image.width, image.height, angle_degrees);
    let rad = -angle_degrees.to_radians();
    let (sin, cos) = (rad.sin(), rad.cos());

    // Pixel centres sit at +0.5
    let src_cx = image.width as f64 / 2.0;
    let src_cy = image.height as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut rotated = black_buffer(dst_w, dst_h)?;
    for (x, y, out) in rotated.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - dst_cx;
        let dy = y as f64 + 0.5 - dst_cy;

        let src_x = dx * cos - dy * sin + src_cx - 0.5;
        let src_y = dx * sin + dy * cos + src_cy - 0.5;

        if let Some(rgb) = sample_bilinear(image, src_x, src_y) {
            *out = Rgb(rgb);
        }
    }

    Ok(DecodedImage::from_rgb_image(rotated))
}

fn rotate_quarter(image: &DecodedImage, turn: QuarterTurn) -> DecodedImage {
    if turn == QuarterTurn::None {
        return image.clone();
    }
    let Some(rgb) = image.clone().into_rgb_image() else {
        return image.clone();
    };
    let rotated = match turn {
        QuarterTurn::Cw90 => imageops::rotate90(&rgb),
        QuarterTurn::Half => imageops::rotate180(&rgb),
        QuarterTurn::Cw270 => imageops::rotate270(&rgb),
        QuarterTurn::None => rgb,
    };
    DecodedImage::from_rgb_image(rotated)
}

/// Bilinear sample at a fractional pixel-centre position; `None` outside the
/// source.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> Option<[u8; 3]> {
    let max_x = image.width.checked_sub(1)? as f64;
    let max_y = image.height.checked_sub(1)? as f64;
    if x < -0.5 || y < -0.5 || x > max_x + 0.5 || y > max_y + 0.5 {
        return None;
    }

    // Clamp so the half-pixel border replicates the edge
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width - 1);
    let y1 = (y0 + 1).min(image.height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = image.pixel(x0, y0);
    let p10 = image.pixel(x1, y0);
    let p01 = image.pixel(x0, y1);
    let p11 = image.pixel(x1, y1);

    let mut rgb = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        rgb[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(rgb)
}
