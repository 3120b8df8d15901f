//! The byte-to-unicode table used by byte-level BPE.
//!
//! Printable Latin-1 bytes map to themselves; every other byte maps, in
//! order, to code points starting at U+0100. This keeps every byte visible
//! and whitespace-free, so byte sequences can be stored as vocab strings.

use ahash::AHashMap;
use std::sync::OnceLock;

fn is_printable(byte: u8) -> bool {
    matches!(byte, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF)
}

fn build_byte_encoder() -> [char; 256] {
    let mut table = ['\0'; 256];
    let mut next = 256u32;
    for byte in 0..=255u8 {
        let code = if is_printable(byte) {
            u32::from(byte)
        } else {
            next += 1;
            next - 1
        };
        // All codes are below U+0144, far from the surrogate range.
        table[usize::from(byte)] = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
    }
    table
}

/// Byte -> visible char.
pub fn byte_encoder() -> &'static [char; 256] {
    static TABLE: OnceLock<[char; 256]> = OnceLock::new();
    TABLE.get_or_init(build_byte_encoder)
}

/// Visible char -> byte.
pub fn byte_decoder() -> &'static AHashMap<char, u8> {
    static TABLE: OnceLock<AHashMap<char, u8>> = OnceLock::new();
    TABLE.get_or_init(|| {
        byte_encoder()
            .iter()
            .enumerate()
            .map(|(byte, &c)| (c, byte as u8))
            .collect()
    })
}

/// Map visible chars back to bytes. Chars outside the table are kept as UTF-8.
pub fn decode_chars(text: &str) -> Vec<u8> {
    let table = byte_decoder();
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match table.get(&c) {
            Some(&b) => bytes.push(b),
            None => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    bytes
}
