//! Asset preparation for the Gameduino graphics shield.
//!
//! Converts truecolor raster images into the packed formats the hardware
//! consumes: character backgrounds (picture map + glyph table + per-glyph
//! palettes) and sprite image RAM (bit-plane packed 16x16 frames). Image
//! decoding and output file generation are left to the caller; everything
//! here works on in-memory buffers.

pub mod color;
pub mod common;
pub mod encode;
pub mod image;
pub mod imageram;
pub mod quantize;
pub mod sprites;

pub use encode::{encode, Encoded, EncodeError};
pub use image::{IndexedImage, RgbaImage};
pub use imageram::{ColorDepth, ImageRam, SpriteRamOverflow};
pub use sprites::{add_sprites, Frame, PaletteSet, SpriteLoad};
