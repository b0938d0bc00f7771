// Median-cut color reduction. The hardware wants 4, 16 or 256 color
// palettes; source art usually has more. Exact palette choice only affects
// visual fidelity, not the packed-format contracts, but it must be
// deterministic so re-running a build reproduces the same bytes.

use itertools::Itertools;
use log::info;

use crate::common::{ColorIdx, Rgb, Rgba, ALPHA_CUTOFF};
use crate::image::{IndexedImage, RgbaImage};

/// Reduce `pixels` to at most `max_colors` representative colors.
///
/// If the input already has few enough distinct colors they are returned
/// unchanged (in first-encounter order), so low-color art survives exactly.
/// Otherwise boxes of samples are split at the median of their widest
/// channel until enough boxes exist, and each box averages to one color.
pub fn median_cut(pixels: &[Rgb], max_colors: usize) -> Vec<Rgb> {
    assert!(max_colors >= 1);
    let distinct: Vec<Rgb> = pixels.iter().copied().unique().collect();
    if distinct.len() <= max_colors {
        return distinct;
    }

    let mut boxes: Vec<Vec<Rgb>> = vec![pixels.to_vec()];
    while boxes.len() < max_colors {
        let Some((box_idx, channel)) = widest_box(&boxes) else {
            break; // every box is a single color
        };
        let mut b = std::mem::take(&mut boxes[box_idx]);
        b.sort_by_key(|c| c[channel]);
        let upper = b.split_off(b.len() / 2);
        boxes[box_idx] = b;
        boxes.push(upper);
    }

    boxes.iter().map(|b| average(b)).collect()
}

// Locate the (box, channel) with the greatest value range, or None if all
// boxes are uniform.
fn widest_box(boxes: &[Vec<Rgb>]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut best_range = 0u8;
    for (i, b) in boxes.iter().enumerate() {
        for channel in 0..3 {
            let Some((lo, hi)) = b.iter().map(|c| c[channel]).minmax().into_option() else {
                continue;
            };
            let range = hi - lo;
            if range > best_range {
                best_range = range;
                best = Some((i, channel));
            }
        }
    }
    best
}

fn average(pixels: &[Rgb]) -> Rgb {
    let n = pixels.len() as u32;
    let mut sum = [0u32; 3];
    for c in pixels {
        for i in 0..3 {
            sum[i] += c[i] as u32;
        }
    }
    [
        (sum[0] / n) as u8,
        (sum[1] / n) as u8,
        (sum[2] / n) as u8,
    ]
}

/// Index of the palette entry closest to `color` (squared RGB distance,
/// first entry wins ties).
pub fn nearest(palette: &[Rgb], color: Rgb) -> usize {
    assert!(!palette.is_empty());
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, &p)| {
            (0..3)
                .map(|i| {
                    let d = p[i] as i32 - color[i] as i32;
                    d * d
                })
                .sum::<i32>()
        })
        .map(|(i, _)| i)
        .unwrap()
}

/// Rewrite an RGBA block through a reduced palette: each pixel becomes its
/// nearest palette color, fully opaque. Used by the background encoder on
/// cells with more than 4 colors.
pub fn remap_rgba(block: &[Rgba], palette: &[Rgb]) -> Vec<Rgba> {
    block
        .iter()
        .map(|&p| {
            let c = palette[nearest(palette, [p[0], p[1], p[2]])];
            [c[0], c[1], c[2], 255]
        })
        .collect()
}

/// Convert a truecolor image to an indexed one with at most `ncol` colors
/// (4, 16 or 256).
///
/// If any pixel is translucent (alpha at or below the cutoff), the top
/// palette index `ncol - 1` is reserved for transparency: those pixels map
/// to it and the remaining pixels quantize to `ncol - 1` colors. Fully
/// opaque images use all `ncol` slots and declare no transparent index.
pub fn palettize(im: &RgbaImage, ncol: usize) -> IndexedImage {
    assert!(matches!(ncol, 4 | 16 | 256));

    let translucent = |p: &Rgba| p[3] <= ALPHA_CUTOFF;
    let has_transparency = im.pixels().iter().any(translucent);

    let opaque_rgb: Vec<Rgb> = im
        .pixels()
        .iter()
        .filter(|p| !translucent(p))
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let color_slots = if has_transparency { ncol - 1 } else { ncol };
    let mut palette = median_cut(&opaque_rgb, color_slots);
    info!(
        "Palettized {}x{} image to {} colors ({})",
        im.width(),
        im.height(),
        palette.len(),
        if has_transparency {
            "with transparency"
        } else {
            "opaque"
        }
    );
    palette.resize(ncol, [0, 0, 0]);

    let transparent_idx = (ncol - 1) as ColorIdx;
    let pixels: Vec<ColorIdx> = im
        .pixels()
        .iter()
        .map(|p| {
            if has_transparency && translucent(p) {
                transparent_idx
            } else {
                nearest(&palette[..color_slots], [p[0], p[1], p[2]]) as ColorIdx
            }
        })
        .collect();

    IndexedImage::new(
        im.width(),
        im.height(),
        pixels,
        palette,
        has_transparency.then_some(transparent_idx),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn low_color_input_survives_exactly() {
        let pixels = [[10, 20, 30], [200, 0, 0], [10, 20, 30], [0, 0, 200]];
        let pal = median_cut(&pixels, 4);
        assert_eq!(pal, vec![[10, 20, 30], [200, 0, 0], [0, 0, 200]]);
    }

    #[test]
    fn median_cut_respects_color_budget() {
        // 8 well-separated colors shrink to 4 without panicking or
        // exceeding the budget.
        let pixels: Vec<Rgb> = (0..8u8).map(|i| [i * 32, 255 - i * 32, i]).collect();
        let pal = median_cut(&pixels, 4);
        assert_eq!(pal.len(), 4);
    }

    #[test]
    fn median_cut_is_deterministic() {
        let pixels: Vec<Rgb> = (0..64u8).map(|i| [i * 4, i.wrapping_mul(37), 255 - i]).collect();
        assert_eq!(median_cut(&pixels, 16), median_cut(&pixels, 16));
    }

    #[test]
    fn nearest_prefers_exact_match() {
        let pal = [[0, 0, 0], [255, 0, 0], [254, 1, 0]];
        assert_eq!(nearest(&pal, [255, 0, 0]), 1);
        assert_eq!(nearest(&pal, [10, 10, 10]), 0);
    }

    #[test]
    fn palettize_reserves_transparent_index() {
        init_logging();
        let mut pixels = vec![[255, 0, 0, 255]; 15];
        pixels.push([0, 0, 0, 0]); // one transparent pixel
        let im = RgbaImage::new(4, 4, pixels).unwrap();
        let indexed = palettize(&im, 4);
        assert_eq!(indexed.transparency, Some(3));
        assert_eq!(indexed.get(3, 3), 3);
        assert_eq!(indexed.get(0, 0), 0);
        assert_eq!(indexed.palette.len(), 4);
        assert_eq!(indexed.palette[0], [255, 0, 0]);
    }

    #[test]
    fn palettize_opaque_uses_all_slots() {
        init_logging();
        let pixels: Vec<Rgba> = (0..16u8).map(|i| [i * 16, 0, 0, 255]).collect();
        let im = RgbaImage::new(4, 4, pixels).unwrap();
        let indexed = palettize(&im, 4);
        assert_eq!(indexed.transparency, None);
        assert!(indexed.max_index() < 4);
    }
}
