//! Character classification used by the tokenizer.
//!
//! The first 128 code points are classified through a lookup table of
//! bitmasks. Outside of ASCII only a curated set of blank and quote
//! characters is recognised, everything else counts as part of a word.

pub const WORD: u8 = 1;
pub const OPERATOR: u8 = 2;
pub const BLANK: u8 = 4;
pub const QUOTE: u8 = 8;
pub const INLINE_BLANK: u8 = 16;
pub const NUMBER: u8 = 32;
pub const ELLIPSIS: u8 = 64;
pub const SIGN: u8 = 128;

static TYPES: [u8; 128] = build_table();

const fn build_table() -> [u8; 128] {
    let mut t = [0u8; 128];

    t[b'\t' as usize] = BLANK | INLINE_BLANK;
    t[b' ' as usize] = BLANK | INLINE_BLANK;
    t[b'\r' as usize] = BLANK | INLINE_BLANK;
    t[b'\n' as usize] = BLANK;
    t[0x0b] = BLANK;
    t[0x0c] = BLANK;

    t[b'"' as usize] = QUOTE;
    t[b'\'' as usize] = QUOTE;

    t[b'!' as usize] = OPERATOR;
    t[b'<' as usize] = OPERATOR;
    t[b'=' as usize] = OPERATOR;
    t[b'>' as usize] = OPERATOR;

    t[b'.' as usize] = ELLIPSIS;
    t[b'-' as usize] = WORD | SIGN;
    t[b'_' as usize] = WORD;

    let mut c = b'0';
    while c <= b'9' {
        t[c as usize] = WORD | NUMBER;
        c += 1;
    }
    let mut c = b'a';
    while c <= b'z' {
        t[c as usize] = WORD;
        t[(c - b'a' + b'A') as usize] = WORD;
        c += 1;
    }
    t
}

/// Returns the bitmask classification of `c`.
#[inline]
pub fn class(c: char) -> u8 {
    match c as u32 {
        n if n < 128 => TYPES[n as usize],
        0xa0 | 0x1680 | 0x180e | 0x2000..=0x200a | 0x2028 | 0x2029 | 0x202f | 0x205f | 0x3000 => {
            BLANK
        }
        0x201c | 0x201d => QUOTE,
        _ => 0,
    }
}

#[inline]
pub fn is(c: Option<char>, mask: u8) -> bool {
    c.map_or(false, |c| class(c) & mask != 0)
}

/// Whether `c` can appear in an identifier.
#[inline]
pub fn is_word(c: char) -> bool {
    if c.is_ascii() {
        return class(c) & WORD != 0;
    }
    is_word_unicode(c)
}

#[cfg(feature = "unicode")]
fn is_word_unicode(c: char) -> bool {
    class(c) == 0 && unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
fn is_word_unicode(c: char) -> bool {
    class(c) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_ascii() {
        assert_eq!(class(' '), BLANK | INLINE_BLANK);
        assert_eq!(class('\n'), BLANK);
        assert_eq!(class('7'), WORD | NUMBER);
        assert_eq!(class('-'), WORD | SIGN);
        assert_eq!(class('\''), QUOTE);
        assert_eq!(class('='), OPERATOR);
        assert_eq!(class('.'), ELLIPSIS);
        assert_eq!(class('|'), 0);
    }

    #[test]
    fn class_unicode() {
        assert_eq!(class('\u{3000}'), BLANK);
        assert_eq!(class('\u{201c}'), QUOTE);
        assert!(is_word('é'));
        assert!(!is_word('\u{a0}'));
    }
}
