//! UTF-16 ⇄ UTF-8 offset translation
//!
//! The core works in byte offsets into `&str`. JavaScript hosts (editors,
//! DOM ranges) count UTF-16 code units. `Utf16Map` converts between the two
//! for one text. It records only the non-ASCII characters, so mostly-ASCII
//! notes stay cheap, and lookups are a binary search over them.

/// A character wider than one byte
#[derive(Debug, Clone, Copy)]
struct Wide {
    byte: usize,
    unit: usize,
    byte_len: u8,
    unit_len: u8,
}

impl Wide {
    fn byte_end(&self) -> usize {
        self.byte + self.byte_len as usize
    }

    fn unit_end(&self) -> usize {
        self.unit + self.unit_len as usize
    }
}

/// Offset translation table for one text
#[derive(Debug, Clone, Default)]
pub struct Utf16Map {
    byte_len: usize,
    utf16_len: usize,
    /// Non-ASCII characters in text order
    wide: Vec<Wide>,
}

impl Utf16Map {
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self {
                byte_len: text.len(),
                utf16_len: text.len(),
                wide: Vec::new(),
            };
        }

        let mut wide = Vec::new();
        let mut unit = 0;
        for (byte, ch) in text.char_indices() {
            if !ch.is_ascii() {
                wide.push(Wide {
                    byte,
                    unit,
                    byte_len: ch.len_utf8() as u8,
                    unit_len: ch.len_utf16() as u8,
                });
            }
            unit += ch.len_utf16();
        }

        Self {
            byte_len: text.len(),
            utf16_len: unit,
            wide,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn utf16_len(&self) -> usize {
        self.utf16_len
    }

    /// Number of non-ASCII characters recorded
    pub fn wide_chars(&self) -> usize {
        self.wide.len()
    }

    /// UTF-16 offset of a byte offset. Bytes inside a character map to the
    /// character's start; offsets past the end clamp to the end.
    pub fn to_utf16(&self, byte: usize) -> usize {
        let byte = byte.min(self.byte_len);
        let i = self.wide.partition_point(|w| w.byte <= byte);
        let Some(w) = i.checked_sub(1).map(|i| self.wide[i]) else {
            return byte;
        };
        if byte < w.byte_end() {
            w.unit
        } else {
            w.unit_end() + (byte - w.byte_end())
        }
    }

    /// Byte offset of a UTF-16 offset. A unit inside a surrogate pair maps
    /// to the character's start; offsets past the end clamp to the end.
    pub fn to_byte(&self, unit: usize) -> usize {
        let unit = unit.min(self.utf16_len);
        let i = self.wide.partition_point(|w| w.unit <= unit);
        let Some(w) = i.checked_sub(1).map(|i| self.wide[i]) else {
            return unit;
        };
        if unit < w.unit_end() {
            w.byte
        } else {
            w.byte_end() + (unit - w.unit_end())
        }
    }
}
