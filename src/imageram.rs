// Sprite image RAM allocator. The hardware reads 8-bit-wide pages, but a
// 4- or 16-color sprite frame only needs 2 or 4 of those bits, so frames
// of different depths can stack in the same page as separate bit-planes.
// This is a plain bump allocator over a bit cursor: append-only, no reuse.

use thiserror::Error;

use crate::common::{ColorIdx, PageIdx, PalSel};

pub const PAGE_SIZE: usize = 256;
pub const NUM_PAGES: usize = 64;
pub const RAM_SIZE: usize = PAGE_SIZE * NUM_PAGES;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("sprite image RAM is full ({NUM_PAGES} pages)")]
pub struct SpriteRamOverflow;

/// Color depth of one sprite frame, fixing how many bits of each page byte
/// the frame occupies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorDepth {
    Colors4,
    Colors16,
    Colors256,
}

impl ColorDepth {
    pub fn bits(self) -> u8 {
        match self {
            ColorDepth::Colors4 => 2,
            ColorDepth::Colors16 => 4,
            ColorDepth::Colors256 => 8,
        }
    }

    pub fn colors(self) -> u16 {
        match self {
            ColorDepth::Colors4 => 4,
            ColorDepth::Colors16 => 16,
            ColorDepth::Colors256 => 256,
        }
    }
}

/// The 16K sprite image RAM being filled. The cursor (`next_page`,
/// `next_bit`) marks the next free bit-plane slot; already-written
/// allocations are never moved.
pub struct ImageRam {
    data: Vec<u8>,
    next_page: usize, // next available page
    next_bit: u8,     // next available bit within that page, 0-7
}

impl Default for ImageRam {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageRam {
    pub fn new() -> Self {
        Self {
            data: vec![0; RAM_SIZE],
            next_page: 0,
            next_bit: 0,
        }
    }

    fn bump(&mut self, bits: u8) {
        self.next_bit += bits;
        if self.next_bit == 8 {
            self.next_bit = 0;
            self.next_page += 1;
        }
    }

    /// Append one 256-pixel block (a 16x16 frame, row-major) at the given
    /// depth.
    ///
    /// The cursor first advances to the next bit offset aligned to the
    /// depth's width, so no allocation straddles a byte boundary. Returns
    /// the page holding the data and the palette select identifying its
    /// bit-plane group within the page: 0-3 for 4-color, 0-1 for 16-color,
    /// always 0 for 256-color.
    ///
    /// Fails once the RAM's 64 pages are exhausted; data already added
    /// stays valid.
    pub fn add(
        &mut self,
        block: &[ColorIdx; 256],
        depth: ColorDepth,
    ) -> Result<(PageIdx, PalSel), SpriteRamOverflow> {
        let colors = depth.colors();
        assert!(
            block.iter().all(|&p| (p as u16) < colors),
            "{} colors allowed, but block contains {}",
            colors,
            block.iter().max().unwrap()
        );

        let bits = depth.bits();
        while self.next_bit % bits != 0 {
            self.bump(2);
        }
        if self.next_page == NUM_PAGES {
            return Err(SpriteRamOverflow);
        }

        let pal = match depth {
            ColorDepth::Colors4 => self.next_bit / 2,
            ColorDepth::Colors16 => self.next_bit / 4,
            ColorDepth::Colors256 => 0,
        };
        let page = self.next_page;
        for (i, &p) in block.iter().enumerate() {
            self.data[PAGE_SIZE * page + i] |= p << self.next_bit;
        }
        self.bump(bits);
        Ok((page as PageIdx, pal))
    }

    /// The written prefix of the RAM: every page touched so far, including
    /// a partially-filled final page.
    pub fn used(&self) -> &[u8] {
        let pages = self.next_page + (self.next_bit != 0) as usize;
        &self.data[..PAGE_SIZE * pages]
    }
}
