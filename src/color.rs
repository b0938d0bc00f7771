// Color serialization for the hardware's 15-bit palette entries.

use crate::common::{Rgb, Rgba, ALPHA_CUTOFF};

/// Pack an 8-bit RGB triple into the hardware's RGB555 layout:
/// bits 14-10 red, 9-5 green, 4-0 blue. Channels truncate to their top
/// 5 bits.
pub fn rgb555(c: Rgb) -> u16 {
    ((c[0] as u16 >> 3) << 10) | ((c[1] as u16 >> 3) << 5) | (c[2] as u16 >> 3)
}

/// RGB555 with the transparency flag in bit 15, set for alpha below the
/// cutoff.
pub fn rgba1555(c: Rgba) -> u16 {
    let t = (c[3] < ALPHA_CUTOFF) as u16;
    (t << 15) | rgb555([c[0], c[1], c[2]])
}
