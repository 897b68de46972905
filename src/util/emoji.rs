// Unicode 6.0 pictograph ranges (Miscellaneous Symbols and Pictographs block).
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1f300, 0x1f320),
    (0x1f330, 0x1f335),
    (0x1f337, 0x1f37c),
    (0x1f380, 0x1f393),
    (0x1f3a0, 0x1f3c4),
    (0x1f3c6, 0x1f3ca),
    (0x1f3e0, 0x1f3f0),
    (0x1f400, 0x1f43e),
    (0x1f440, 0x1f440),
    (0x1f442, 0x1f4f7),
    (0x1f4f9, 0x1f4fc),
    (0x1f500, 0x1f53c),
    (0x1f540, 0x1f543),
    (0x1f550, 0x1f567),
    (0x1f5fb, 0x1f5ff),
];

/// A random pictograph, used as the title of blocks created without one.
pub(crate) fn random_emoji() -> String {
    let mut buf = [0u8; 4];
    let r = match getrandom::getrandom(&mut buf) {
        Ok(()) => u32::from_le_bytes(buf),
        Err(e) => {
            log::warn!("getrandom unavailable ({e}); using clock for emoji choice");
            super::now_ms() as u32
        }
    };
    emoji_at(r).to_string()
}

/// Maps `r` onto the ranges, weighted by range size, then rounds the code
/// point down to an even value.
fn emoji_at(r: u32) -> char {
    let total: u32 = EMOJI_RANGES.iter().map(|(s, e)| e - s + 1).sum();
    let mut point = r % total;

    for (start, end) in EMOJI_RANGES {
        let width = end - start + 1;
        if point < width {
            let cp = ((start + point) / 2) * 2;
            // Even rounding may step below a range that starts on an odd code point.
            let cp = cp.max(*start);
            return char::from_u32(cp).unwrap_or('\u{1f300}');
        }
        point -= width;
    }

    '\u{1f300}'
}
