// In-memory raster types. Decoding image files into these is the caller's
// job; this crate only transforms pixels that are already in memory.

use anyhow::{ensure, Result};

use crate::color::rgb555;
use crate::common::{ColorIdx, Rgb, Rgba};

/// A row-major truecolor image, the input to background encoding.
#[derive(Clone)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba>) -> Result<Self> {
        ensure!(
            pixels.len() == (width * height) as usize,
            "pixel count {} does not match {}x{}",
            pixels.len(),
            width,
            height
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Rgba {
        assert!(x < self.width && y < self.height);
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Extract a `w`x`h` block with its top-left corner at (x, y). The block
    /// must lie entirely within the image.
    pub fn block(&self, x: u32, y: u32, w: u32, h: u32) -> Vec<Rgba> {
        assert!(x + w <= self.width && y + h <= self.height);
        let mut out = Vec::with_capacity((w * h) as usize);
        for by in y..y + h {
            let row_start = (by * self.width + x) as usize;
            out.extend_from_slice(&self.pixels[row_start..row_start + w as usize]);
        }
        out
    }
}

/// A palettized image, the input to sprite packing. `transparency`, when
/// set, names the palette index treated as see-through by the blank-tile
/// check and by `hardware_palette`.
#[derive(Clone)]
pub struct IndexedImage {
    width: u32,
    height: u32,
    pixels: Vec<ColorIdx>,
    pub palette: Vec<Rgb>,
    pub transparency: Option<ColorIdx>,
}

impl IndexedImage {
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<ColorIdx>,
        palette: Vec<Rgb>,
        transparency: Option<ColorIdx>,
    ) -> Result<Self> {
        ensure!(
            pixels.len() == (width * height) as usize,
            "pixel count {} does not match {}x{}",
            pixels.len(),
            width,
            height
        );
        Ok(Self {
            width,
            height,
            pixels,
            palette,
            transparency,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y); coordinates past the edges read as the transparent
    /// index when one is declared, else 0. Sprite frames are ceiling-divided
    /// into 16x16 sub-tiles, so the last sub-tile of an odd-sized frame pads
    /// with this fill value.
    pub fn get(&self, x: u32, y: u32) -> ColorIdx {
        if x >= self.width || y >= self.height {
            return self.transparency.unwrap_or(0);
        }
        self.pixels[(y * self.width + x) as usize]
    }

    /// Highest palette index actually used by any pixel.
    pub fn max_index(&self) -> ColorIdx {
        self.pixels.iter().copied().max().unwrap_or(0)
    }

    /// Serialize the palette as hardware RGB555 entries. The transparent
    /// slot, if any, is forced to 0x8000 (transparency bit set, black).
    pub fn hardware_palette(&self) -> Vec<u16> {
        let mut out: Vec<u16> = self.palette.iter().map(|&c| rgb555(c)).collect();
        if let Some(t) = self.transparency {
            out[t as usize] = 0x8000;
        }
        out
    }
}
