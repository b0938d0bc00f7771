// Sprite sheet extraction: tiles a palettized sheet into frames, splits
// each frame into 16x16 sub-tiles, packs the non-blank ones into sprite
// image RAM and records where each landed so a caller can emit draw calls.

use log::info;

use crate::common::{ColorIdx, PageIdx};
use crate::image::IndexedImage;
use crate::imageram::{ColorDepth, ImageRam, SpriteRamOverflow};

/// One of the hardware's eight sprite palettes. The palette select field
/// of a draw call combines which palette to use with which bit-plane group
/// of the page holds the frame's pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PaletteSet {
    Palette256A,
    Palette256B,
    Palette256C,
    Palette256D,
    Palette16A,
    Palette16B,
    Palette4A,
    Palette4B,
}

impl PaletteSet {
    pub fn depth(self) -> ColorDepth {
        match self {
            PaletteSet::Palette256A
            | PaletteSet::Palette256B
            | PaletteSet::Palette256C
            | PaletteSet::Palette256D => ColorDepth::Colors256,
            PaletteSet::Palette16A | PaletteSet::Palette16B => ColorDepth::Colors16,
            PaletteSet::Palette4A | PaletteSet::Palette4B => ColorDepth::Colors4,
        }
    }

    /// Map an allocator palette select to the hardware palette-select
    /// field: 0-3 name the four 256-color palettes, 0x4-0x7 a 16-color
    /// palette plus bit group, 0x8-0xF a 4-color palette plus bit group.
    pub fn select(self, pal: u8) -> u8 {
        match self {
            PaletteSet::Palette256A => 0,
            PaletteSet::Palette256B => 1,
            PaletteSet::Palette256C => 2,
            PaletteSet::Palette256D => 3,
            PaletteSet::Palette16A => 0x4 + (pal << 1),
            PaletteSet::Palette16B => 0x4 + (pal << 1) + 1,
            PaletteSet::Palette4A => 0x8 + (pal << 1),
            PaletteSet::Palette4B => 0x8 + (pal << 1) + 1,
        }
    }
}

/// One sub-tile placement within a frame: pixel offset relative to the
/// frame's center, the image RAM page holding the data, and the resolved
/// hardware palette-select field.
#[derive(Debug, PartialEq, Eq)]
pub struct SpriteLoad {
    pub x: i32,
    pub y: i32,
    pub page: PageIdx,
    pub palette: u8,
}

/// Placements for one sprite frame. Empty if every sub-tile was blank.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub loads: Vec<SpriteLoad>,
}

/// Extract every `frame_size` frame from `sheet` (row-major) and pack
/// their contents into `ram` at the palette set's depth.
///
/// Frames are split into 16x16 sub-tiles, ceiling-divided when the frame
/// size is not a multiple of 16. Sub-tiles consisting entirely of the
/// sheet's transparent index are skipped: they consume no RAM and emit no
/// load. `center` shifts the recorded offsets so the caller can rotate or
/// position sprites about a chosen pixel.
pub fn add_sprites(
    ram: &mut ImageRam,
    sheet: &IndexedImage,
    frame_size: (u32, u32),
    palette_set: PaletteSet,
    center: (i32, i32),
) -> Result<Vec<Frame>, SpriteRamOverflow> {
    let (fw, fh) = frame_size;
    assert!(fw > 0 && fh > 0, "frame size must be non-zero");
    let depth = palette_set.depth();
    assert!(
        (sheet.max_index() as u16) < depth.colors(),
        "sheet uses palette index {} but the palette set has {} colors",
        sheet.max_index(),
        depth.colors()
    );

    let mut frames: Vec<Frame> = vec![];
    let mut blank_tiles = 0usize;
    for fy in (0..sheet.height()).step_by(fh as usize) {
        for fx in (0..sheet.width()).step_by(fw as usize) {
            let mut frame = Frame::default();
            for ty in 0..fh.div_ceil(16) {
                for tx in 0..fw.div_ceil(16) {
                    let block = subtile(sheet, fx + tx * 16, fy + ty * 16);
                    if is_blank(sheet, &block) {
                        blank_tiles += 1;
                        continue;
                    }
                    let (page, pal) = ram.add(&block, depth)?;
                    frame.loads.push(SpriteLoad {
                        x: (tx * 16) as i32 - center.0,
                        y: (ty * 16) as i32 - center.1,
                        page,
                        palette: palette_set.select(pal),
                    });
                }
            }
            frames.push(frame);
        }
    }

    info!(
        "Added {} sprite frames from {}x{} sheet ({} blank sub-tiles skipped)",
        frames.len(),
        sheet.width(),
        sheet.height(),
        blank_tiles
    );
    Ok(frames)
}

// Read a 16x16 block with its top-left corner at (x, y); pixels past the
// sheet's edge take the padding value from `IndexedImage::get`.
fn subtile(sheet: &IndexedImage, x: u32, y: u32) -> [ColorIdx; 256] {
    let mut block = [0; 256];
    for py in 0..16 {
        for px in 0..16 {
            block[(py * 16 + px) as usize] = sheet.get(x + px, y + py);
        }
    }
    block
}

// A sub-tile is blank only when the sheet declares a transparent index and
// every pixel carries it. Sheets without transparency never skip.
fn is_blank(sheet: &IndexedImage, block: &[ColorIdx; 256]) -> bool {
    match sheet.transparency {
        Some(t) => block.iter().all(|&p| p == t),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sheet(
        width: u32,
        height: u32,
        pixels: Vec<ColorIdx>,
        transparency: Option<ColorIdx>,
    ) -> Result<IndexedImage> {
        IndexedImage::new(width, height, pixels, vec![[0, 0, 0]; 4], transparency)
    }

    #[test]
    fn palette_select_field_values() {
        assert_eq!(PaletteSet::Palette256A.select(0), 0);
        assert_eq!(PaletteSet::Palette256C.select(0), 2);
        assert_eq!(PaletteSet::Palette16A.select(0), 0x4);
        assert_eq!(PaletteSet::Palette16A.select(1), 0x6);
        assert_eq!(PaletteSet::Palette16B.select(1), 0x7);
        assert_eq!(PaletteSet::Palette4A.select(2), 0xC);
        assert_eq!(PaletteSet::Palette4B.select(3), 0xF);
    }

    #[test]
    fn blank_frames_consume_nothing() -> Result<()> {
        init_logging();
        let mut ram = ImageRam::new();
        let sheet = sheet(16, 16, vec![3; 256], Some(3))?;
        let frames = add_sprites(&mut ram, &sheet, (16, 16), PaletteSet::Palette4A, (0, 0))?;
        assert_eq!(frames, vec![Frame::default()]);
        assert!(ram.used().is_empty());
        Ok(())
    }

    #[test]
    fn without_transparency_nothing_is_blank() -> Result<()> {
        let mut ram = ImageRam::new();
        let sheet = sheet(16, 16, vec![0; 256], None)?;
        let frames = add_sprites(&mut ram, &sheet, (16, 16), PaletteSet::Palette4A, (0, 0))?;
        assert_eq!(frames[0].loads.len(), 1);
        Ok(())
    }

    #[test]
    fn frames_walk_row_major() -> Result<()> {
        init_logging();
        let mut ram = ImageRam::new();
        // Four 16x16 frames in a 32x32 sheet; the second frame (top right)
        // is blank.
        let mut pixels = vec![1u8; 32 * 32];
        for y in 0..16 {
            for x in 16..32 {
                pixels[y * 32 + x] = 3;
            }
        }
        let sheet = sheet(32, 32, pixels, Some(3))?;
        let frames = add_sprites(&mut ram, &sheet, (16, 16), PaletteSet::Palette4A, (8, 8))?;
        assert_eq!(frames.len(), 4);
        assert_eq!(
            frames[0].loads,
            vec![SpriteLoad {
                x: -8,
                y: -8,
                page: 0,
                palette: PaletteSet::Palette4A.select(0),
            }]
        );
        assert!(frames[1].loads.is_empty());
        // Frames 3 and 4 stack into further bit-planes of page 0.
        assert_eq!(frames[2].loads[0].palette, PaletteSet::Palette4A.select(1));
        assert_eq!(frames[3].loads[0].palette, PaletteSet::Palette4A.select(2));
        Ok(())
    }

    #[test]
    fn odd_sized_frames_pad_with_transparency() -> Result<()> {
        let mut ram = ImageRam::new();
        // A single 24x24 frame: 2x2 sub-tiles, the outer ones padded.
        let sheet = sheet(24, 24, vec![1; 24 * 24], Some(3))?;
        let frames = add_sprites(&mut ram, &sheet, (24, 24), PaletteSet::Palette4A, (0, 0))?;
        assert_eq!(frames[0].loads.len(), 4);
        assert_eq!(frames[0].loads[3], SpriteLoad {
            x: 16,
            y: 16,
            page: 0,
            palette: PaletteSet::Palette4A.select(3),
        });
        // The bottom-right sub-tile holds 8x8 real pixels, padding
        // elsewhere. Check one padded byte and one real byte of its
        // bit-plane (bits 7:6 of page 0).
        let used = ram.used();
        assert_eq!(used[0] >> 6, 1); // sub-tile 3 starts at sheet (16,16)
        assert_eq!(used[15] >> 6, 3); // sheet (31,16) is past the edge
        Ok(())
    }

    #[test]
    fn pixel_payload_lands_in_page() -> Result<()> {
        let mut ram = ImageRam::new();
        let pixels: Vec<ColorIdx> = (0..256).map(|i| (i % 4) as ColorIdx).collect();
        let sheet = sheet(16, 16, pixels.clone(), None)?;
        add_sprites(&mut ram, &sheet, (16, 16), PaletteSet::Palette4A, (0, 0))?;
        let used = ram.used();
        for (i, &p) in pixels.iter().enumerate() {
            assert_eq!(used[i], p);
        }
        Ok(())
    }

    #[test]
    fn overflow_propagates() -> Result<()> {
        let mut ram = ImageRam::new();
        // 65 opaque 16x16 frames at 256-color depth cannot fit.
        let sheet = sheet(16 * 65, 16, vec![1; 16 * 65 * 16], None)?;
        let err = add_sprites(&mut ram, &sheet, (16, 16), PaletteSet::Palette256A, (0, 0));
        assert_eq!(err, Err(SpriteRamOverflow));
        Ok(())
    }
}
