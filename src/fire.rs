//! Flame-colored region detection on raw frame pixels.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use nalgebra as na;

use crate::config::FireConfig;
use crate::math;

/// Minimum saturation and value for a pixel to count as flame colored.
const MIN_SATURATION: u8 = 100;
const MIN_VALUE: u8 = 100;

/// Hue is on the 0..180 scale. Red wraps around both ends; the low red band
/// (0..=10) runs straight into orange (10..=25).
const ORANGE_MAX_HUE: u8 = 25;
const RED_HIGH_MIN_HUE: u8 = 160;

#[derive(Debug, Clone, PartialEq)]
pub struct FireSighting {
    pub location: na::Point2<i32>,
    pub lit_pixels: u32,
    pub ratio: f32,
}

/// 8-bit HSV with hue halved into 0..180 and saturation/value in 0..=255.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = if v == 0 {
        0
    } else {
        ((255 * diff) as f32 / v as f32 + 0.5).floor() as i32
    };

    let h = if diff == 0 {
        0
    } else {
        let deg = if v == r {
            60.0 * (g - b) as f32 / diff as f32
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / diff as f32
        } else {
            240.0 + 60.0 * (r - g) as f32 / diff as f32
        };

        let h = (deg / 2.0 + 0.5).floor() as i32;
        if h < 0 {
            h + 180
        } else {
            h
        }
    };

    (h.clamp(0, 180) as u8, s.clamp(0, 255) as u8, v as u8)
}

#[inline]
fn is_flame_colored(h: u8, s: u8, v: u8) -> bool {
    if s < MIN_SATURATION || v < MIN_VALUE {
        return false;
    }

    h <= ORANGE_MAX_HUE || h >= RED_HIGH_MIN_HUE
}

/// Binary mask (255 = flame colored) and the number of lit pixels.
pub fn flame_mask(image: &RgbImage) -> (GrayImage, u32) {
    let (w, h) = image.dimensions();
    let mut mask = GrayImage::new(w, h);
    let mut lit = 0;

    for (x, y, px) in image.enumerate_pixels() {
        let [r, g, b] = px.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);

        if is_flame_colored(h, s, v) {
            mask.put_pixel(x, y, Luma([255]));
            lit += 1;
        }
    }

    (mask, lit)
}

/// Surrounds the mask with one pixel of background so regions touching the
/// frame edge still get an outer border.
fn pad_mask(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut padded = GrayImage::new(w + 2, h + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);
    padded
}

/// Moments of a contour found on the padded mask, in frame coordinates.
fn contour_moments(contour: &Contour<i32>) -> (f64, f64, f64) {
    let poly: Vec<_> = contour
        .points
        .iter()
        .map(|p| na::Point2::new((p.x - 1) as f64, (p.y - 1) as f64))
        .collect();

    math::polygon_moments(&poly)
}

/// Finds a flame-colored region large enough to report.
///
/// The location is the area centroid of the largest external contour of the
/// mask, or the frame center when that contour encloses no area. Once the
/// thresholds hold a sighting is always reported.
pub fn detect(image: &RgbImage, config: &FireConfig) -> Option<FireSighting> {
    let (w, h) = image.dimensions();
    let total = w as u64 * h as u64;
    if total == 0 {
        return None;
    }

    let (mask, lit) = flame_mask(image);
    let ratio = lit as f32 / total as f32;

    if lit <= config.min_pixels || ratio <= config.min_ratio {
        return None;
    }

    let contours = find_contours::<i32>(&pad_mask(&mask));

    // first contour wins on equal area
    let largest = contours
        .iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(contour_moments)
        .fold(None, |best: Option<(f64, f64, f64)>, item| match best {
            Some(b) if b.0 >= item.0 => Some(b),
            _ => Some(item),
        });

    let location = match largest {
        Some((m00, m10, m01)) if m00 != 0.0 => {
            na::Point2::new((m10 / m00) as i32, (m01 / m00) as i32)
        }
        _ => na::Point2::new((w / 2) as i32, (h / 2) as i32),
    };

    Some(FireSighting {
        location,
        lit_pixels: lit,
        ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn paint(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: [u8; 3]) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }

    #[test]
    fn hsv_matches_8bit_convention() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255));
        assert_eq!(rgb_to_hsv(0, 255, 0), (60, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 255), (120, 255, 255));
        assert_eq!(rgb_to_hsv(255, 165, 0), (19, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 0), (0, 0, 0));
        assert_eq!(rgb_to_hsv(128, 128, 128), (0, 0, 128));

        // magenta-ish red sits at the top of the hue circle
        let (h, _, _) = rgb_to_hsv(255, 0, 40);
        assert!(h >= 170);
    }

    #[test]
    fn mask_selects_red_and_orange_only() {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(0, 0, Rgb([220, 30, 20]));
        img.put_pixel(1, 0, Rgb([255, 140, 0]));
        img.put_pixel(2, 0, Rgb([20, 200, 40]));
        img.put_pixel(3, 0, Rgb([90, 10, 10]));

        let (mask, lit) = flame_mask(&img);
        assert_eq!(lit, 2);
        assert_eq!(mask.get_pixel(0, 0).0, [255]);
        assert_eq!(mask.get_pixel(1, 0).0, [255]);
        assert_eq!(mask.get_pixel(2, 0).0, [0]);
        assert_eq!(mask.get_pixel(3, 0).0, [0]);
    }

    #[test]
    fn black_frame_has_no_fire() {
        let img = RgbImage::new(640, 480);
        assert_eq!(detect(&img, &FireConfig::default()), None);
    }

    #[test]
    fn red_blob_is_located_inside_its_bounds() {
        let mut img = RgbImage::new(640, 480);
        paint(&mut img, 200, 100, 80, 60, [240, 20, 10]);

        let sighting = detect(&img, &FireConfig::default()).unwrap();
        assert_eq!(sighting.lit_pixels, 80 * 60);
        assert!((200..280).contains(&sighting.location.x));
        assert!((100..160).contains(&sighting.location.y));
    }

    #[test]
    fn largest_blob_wins() {
        let mut img = RgbImage::new(640, 480);
        paint(&mut img, 10, 10, 50, 50, [240, 20, 10]);
        paint(&mut img, 400, 300, 100, 90, [255, 120, 0]);

        let sighting = detect(&img, &FireConfig::default()).unwrap();
        assert!((400..500).contains(&sighting.location.x));
        assert!((300..390).contains(&sighting.location.y));
    }

    #[test]
    fn small_blob_is_ignored() {
        let mut img = RgbImage::new(640, 480);
        paint(&mut img, 10, 10, 40, 40, [240, 20, 10]);

        // 1600 lit pixels, under the pixel count
        assert_eq!(detect(&img, &FireConfig::default()), None);
    }

    #[test]
    fn ratio_threshold_applies_on_large_frames() {
        let mut img = RgbImage::new(1000, 1000);
        paint(&mut img, 0, 0, 50, 50, [240, 20, 10]);

        // 2500 pixels is only 0.25% of the frame
        assert_eq!(detect(&img, &FireConfig::default()), None);
    }

    #[test]
    fn thin_lines_fall_back_to_frame_center() {
        let mut img = RgbImage::new(200, 100);
        paint(&mut img, 0, 10, 200, 1, [240, 20, 10]);

        let config = FireConfig {
            min_pixels: 100,
            min_ratio: 0.005,
        };

        let sighting = detect(&img, &config).unwrap();
        assert_eq!(sighting.location, na::Point2::new(100, 50));
    }

    #[test]
    fn blob_on_left_edge_is_found() {
        let mut img = RgbImage::new(640, 480);
        paint(&mut img, 0, 200, 100, 100, [240, 20, 10]);

        let sighting = detect(&img, &FireConfig::default()).unwrap();
        assert_eq!(sighting.lit_pixels, 100 * 100);
        assert!((0..100).contains(&sighting.location.x));
        assert!((200..300).contains(&sighting.location.y));
    }

    #[test]
    fn blob_on_top_edge_is_found() {
        let mut img = RgbImage::new(640, 480);
        paint(&mut img, 300, 0, 100, 100, [255, 120, 0]);

        let sighting = detect(&img, &FireConfig::default()).unwrap();
        assert!((300..400).contains(&sighting.location.x));
        assert!((0..100).contains(&sighting.location.y));
    }

    #[test]
    fn fully_lit_frame_is_found() {
        let img = RgbImage::from_pixel(640, 480, Rgb([240, 20, 10]));

        let sighting = detect(&img, &FireConfig::default()).unwrap();
        assert_eq!(sighting.lit_pixels, 640 * 480);
        assert!((0..640).contains(&sighting.location.x));
        assert!((0..480).contains(&sighting.location.y));
    }

    #[test]
    fn contours_are_reported_in_frame_coordinates() {
        let mut img = RgbImage::new(640, 480);
        paint(&mut img, 1, 200, 100, 100, [240, 20, 10]);
        let inner = detect(&img, &FireConfig::default()).unwrap();

        let mut img = RgbImage::new(640, 480);
        paint(&mut img, 0, 200, 100, 100, [240, 20, 10]);
        let edge = detect(&img, &FireConfig::default()).unwrap();

        assert_eq!(inner.location.x - edge.location.x, 1);
        assert_eq!(inner.location.y, edge.location.y);
    }
}
