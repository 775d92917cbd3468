/// Encode a code point with the UTF-8 bit layout.
///
/// Unlike [`char::encode_utf8`], this accepts any `u32`: surrogates are encoded
/// as three bytes and values above U+10FFFF keep their low 21 bits in a four byte
/// sequence, since `\U` escapes may name them.
pub fn encode(codepoint: u32, out: &mut Vec<u8>) {
    if codepoint <= 0x7f {
        out.push(codepoint as u8);
    } else if codepoint <= 0x7ff {
        out.push(0xc0 | ((codepoint >> 6) & 0x1f) as u8);
        out.push(0x80 | (codepoint & 0x3f) as u8);
    } else if codepoint <= 0xffff {
        out.push(0xe0 | ((codepoint >> 12) & 0x0f) as u8);
        out.push(0x80 | ((codepoint >> 6) & 0x3f) as u8);
        out.push(0x80 | (codepoint & 0x3f) as u8);
    } else {
        out.push(0xf0 | ((codepoint >> 18) & 0x07) as u8);
        out.push(0x80 | ((codepoint >> 12) & 0x3f) as u8);
        out.push(0x80 | ((codepoint >> 6) & 0x3f) as u8);
        out.push(0x80 | (codepoint & 0x3f) as u8);
    }
}
