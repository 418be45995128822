//! Embedded 5-row bitmap font for image labels.
//!
//! Each row is a bitmask where bit 0 is the leftmost pixel. `width` is the
//! pen advance and includes the spacing after the glyph.

/// A single character of the bitmap font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub width: u32,
    pub rows: [u8; 5],
}

const fn glyph(width: u32, rows: [u8; 5]) -> Glyph {
    Glyph { width, rows }
}

/// Drawn in place of any character the font does not cover
pub const FALLBACK: Glyph = glyph(5, [0b01110, 0b01000, 0b00100, 0b00000, 0b00100]);

static GLYPHS: &[(char, Glyph)] = &[
    (' ', glyph(5, [0b00000, 0b00000, 0b00000, 0b00000, 0b00000])),
    ('A', glyph(6, [0b01110, 0b10001, 0b11111, 0b10001, 0b10001])),
    ('B', glyph(6, [0b01111, 0b10001, 0b01111, 0b10001, 0b11111])),
    ('C', glyph(6, [0b11110, 0b00001, 0b00001, 0b00001, 0b11110])),
    ('D', glyph(6, [0b01111, 0b10001, 0b10001, 0b10001, 0b01111])),
    ('E', glyph(6, [0b11111, 0b00001, 0b00111, 0b00001, 0b11111])),
    ('F', glyph(6, [0b11111, 0b00001, 0b00111, 0b00001, 0b00001])),
    ('G', glyph(6, [0b11110, 0b00001, 0b11101, 0b10001, 0b11110])),
    ('H', glyph(6, [0b10001, 0b10001, 0b11111, 0b10001, 0b10001])),
    ('I', glyph(4, [0b00111, 0b00010, 0b00010, 0b00010, 0b00111])),
    ('J', glyph(6, [0b11100, 0b01000, 0b01000, 0b01001, 0b01111])),
    ('K', glyph(6, [0b10001, 0b01001, 0b00111, 0b01001, 0b10001])),
    ('L', glyph(6, [0b00001, 0b00001, 0b00001, 0b00001, 0b11111])),
    ('M', glyph(6, [0b01011, 0b10101, 0b10101, 0b10101, 0b10101])),
    ('N', glyph(6, [0b10001, 0b10011, 0b10101, 0b11001, 0b10001])),
    ('O', glyph(6, [0b01110, 0b10001, 0b10001, 0b10001, 0b01110])),
    ('P', glyph(6, [0b01111, 0b10001, 0b01111, 0b00001, 0b00001])),
    ('Q', glyph(6, [0b01110, 0b10001, 0b10001, 0b10101, 0b01110])),
    ('R', glyph(6, [0b01111, 0b10001, 0b11111, 0b01001, 0b10001])),
    ('S', glyph(6, [0b11110, 0b00001, 0b01110, 0b10000, 0b01111])),
    ('T', glyph(6, [0b11111, 0b00100, 0b00100, 0b00100, 0b00100])),
    ('U', glyph(6, [0b10001, 0b10001, 0b10001, 0b10001, 0b01110])),
    ('V', glyph(6, [0b10001, 0b10001, 0b01010, 0b01010, 0b00100])),
    ('W', glyph(6, [0b10101, 0b10101, 0b10101, 0b10101, 0b01010])),
    ('X', glyph(6, [0b10001, 0b01010, 0b00100, 0b01010, 0b10001])),
    ('Y', glyph(6, [0b10001, 0b01010, 0b00100, 0b00100, 0b00100])),
    ('Z', glyph(6, [0b11111, 0b01000, 0b00100, 0b00010, 0b11111])),
    ('0', glyph(6, [0b01110, 0b11001, 0b10101, 0b10011, 0b01110])),
    ('1', glyph(4, [0b00010, 0b00011, 0b00010, 0b00010, 0b00111])),
    ('2', glyph(6, [0b01111, 0b10000, 0b01110, 0b00001, 0b11111])),
    ('3', glyph(6, [0b11111, 0b10000, 0b11100, 0b10000, 0b11111])),
    ('4', glyph(6, [0b10001, 0b10001, 0b11111, 0b10000, 0b10000])),
    ('5', glyph(6, [0b11111, 0b00001, 0b11111, 0b10000, 0b11111])),
    ('6', glyph(6, [0b11111, 0b00001, 0b11111, 0b10001, 0b11111])),
    ('7', glyph(6, [0b11111, 0b10000, 0b10000, 0b10000, 0b10000])),
    ('8', glyph(6, [0b11111, 0b10001, 0b11111, 0b10001, 0b11111])),
    ('9', glyph(6, [0b11111, 0b10001, 0b11111, 0b10000, 0b10000])),
    ('.', glyph(3, [0b00000, 0b00000, 0b00000, 0b00011, 0b00011])),
    (':', glyph(5, [0b00000, 0b00110, 0b00000, 0b00110, 0b00000])),
    ('-', glyph(5, [0b00000, 0b00000, 0b01111, 0b00000, 0b00000])),
    ('/', glyph(6, [0b10000, 0b01000, 0b00100, 0b00010, 0b00001])),
    ('\\', glyph(6, [0b00001, 0b00010, 0b00100, 0b01000, 0b10000])),
    ('?', FALLBACK),
];

/// Look up a glyph, falling back to `?`
pub fn glyph_for(c: char) -> Glyph {
    GLYPHS
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, g)| *g)
        .unwrap_or(FALLBACK)
}

/// Pixel width of a string in this font
pub fn string_width(text: &str) -> u32 {
    text.chars().map(|c| glyph_for(c).width).sum()
}
