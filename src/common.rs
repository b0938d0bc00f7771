pub type ColorIdx = u8; // Index into a sprite or glyph palette
pub type GlyphIdx = u8; // Index into the background glyph table (0-255)
pub type PageIdx = u8; // 256-byte page of sprite image RAM (0-63)
pub type PalSel = u8; // Bit-plane palette select within a page

pub type Rgb = [u8; 3];
pub type Rgba = [u8; 4];

// Alpha at or below this level counts as transparent, matching the
// hardware's single transparency bit.
pub const ALPHA_CUTOFF: u8 = 128;
