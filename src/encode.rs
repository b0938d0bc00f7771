// Background/character encoder: converts an RGBA image into the picture
// map, glyph table and per-glyph palettes the hardware's character plane
// consumes.

use hashbrown::{hash_map::Entry, HashMap};
use itertools::Itertools;
use log::info;
use thiserror::Error;

use crate::color::rgba1555;
use crate::common::{GlyphIdx, Rgba};
use crate::image::RgbaImage;
use crate::quantize::{median_cut, remap_rgba};

// The hardware's character RAM holds 256 glyph slots.
pub const MAX_GLYPHS: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("background requires more than {MAX_GLYPHS} unique glyphs")]
    GlyphTableOverflow,
    #[error("image dimensions {0}x{1} are not multiples of 8")]
    BadDimensions(u32, u32),
}

/// Encoded background image, ready to copy into picture, character and
/// palette RAM.
#[derive(Debug)]
pub struct Encoded {
    /// One glyph index per 8x8 cell, row-major.
    pub picture: Vec<GlyphIdx>,
    /// Per glyph: 64 pixels packed 2bpp, 4 pixels per byte, first pixel in
    /// the top bits.
    pub glyphs: Vec<[u8; 16]>,
    /// Per glyph: 4 RGBA1555 palette entries.
    pub palettes: Vec<[u16; 4]>,
}

/// Encode `im` as a character background.
///
/// Cells with more than 4 distinct colors are first reduced by median cut
/// (in RGB space, alpha forced opaque); identical cells after reduction
/// share a glyph. Fails if the image needs a 257th glyph or its dimensions
/// are not multiples of 8, producing no partial output either way.
pub fn encode(im: &RgbaImage) -> Result<Encoded, EncodeError> {
    if im.width() % 8 != 0 || im.height() % 8 != 0 {
        return Err(EncodeError::BadDimensions(im.width(), im.height()));
    }

    // Maps a resolved cell's raw bytes to its glyph index; `cells` keeps
    // the resolved pixel blocks in assignment order for the palette pass.
    let mut glyph_map: HashMap<Vec<u8>, GlyphIdx> = HashMap::new();
    let mut cells: Vec<Vec<Rgba>> = vec![];
    let mut picture: Vec<GlyphIdx> = vec![];
    let mut quantized_cells = 0usize;

    for y in (0..im.height()).step_by(8) {
        for x in (0..im.width()).step_by(8) {
            let mut block = im.block(x, y, 8, 8);
            let distinct = block.iter().copied().unique().count();
            if distinct > 4 {
                let rgb: Vec<_> = block.iter().map(|p| [p[0], p[1], p[2]]).collect();
                block = remap_rgba(&block, &median_cut(&rgb, 4));
                quantized_cells += 1;
            }

            let key: Vec<u8> = block.iter().flatten().copied().collect();
            let idx = match glyph_map.entry(key) {
                Entry::Occupied(occupied) => *occupied.get(),
                Entry::Vacant(vacant) => {
                    if cells.len() == MAX_GLYPHS {
                        return Err(EncodeError::GlyphTableOverflow);
                    }
                    let idx = cells.len() as GlyphIdx;
                    cells.push(block);
                    *vacant.insert(idx)
                }
            };
            picture.push(idx);
        }
    }

    let mut glyphs: Vec<[u8; 16]> = Vec::with_capacity(cells.len());
    let mut palettes: Vec<[u16; 4]> = Vec::with_capacity(cells.len());
    for cell in &cells {
        let (pixels, palette) = encode_cell(cell);
        glyphs.push(pixels);
        palettes.push(palette);
    }

    info!(
        "Encoded {}x{} background: {} cells ({} quantized), {} glyphs",
        im.width(),
        im.height(),
        picture.len(),
        quantized_cells,
        glyphs.len()
    );
    Ok(Encoded {
        picture,
        glyphs,
        palettes,
    })
}

// Pack one resolved 8x8 cell (at most 4 distinct colors) into 2bpp pixel
// data and a padded 4-entry palette.
fn encode_cell(block: &[Rgba]) -> ([u8; 16], [u16; 4]) {
    assert!(block.len() == 64);
    // Palette slots in first-encounter order; unused slots stay opaque
    // black.
    let colors: Vec<Rgba> = block.iter().copied().unique().collect();
    assert!(colors.len() <= 4);

    let mut pixels = [0u8; 16];
    for (i, p) in block.iter().enumerate() {
        let idx = colors.iter().position(|c| c == p).unwrap() as u8;
        pixels[i / 4] |= idx << (6 - 2 * (i % 4));
    }

    let mut palette = [rgba1555([0, 0, 0, 255]); 4];
    for (i, &c) in colors.iter().enumerate() {
        palette[i] = rgba1555(c);
    }
    (pixels, palette)
}
