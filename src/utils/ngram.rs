use crate::index::types::{NGRAM_SIZE, Ngram};

/// ASCII lower-casing of raw bytes.
///
/// Length preserving, so byte offsets computed on the lowered text are valid
/// for the original text too.
pub fn to_lower(bytes: &[u8]) -> Vec<u8> {
    bytes.to_ascii_lowercase()
}

/// Bitset of upper-case ASCII positions, one bit per input byte (LSB first).
pub fn case_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = vec![0u8; bytes.len().div_ceil(8)];
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_uppercase() {
            bits[i / 8] |= 1 << (i % 8);
        }
    }
    bits
}

/// Every ngram of `text` with its start position, in order.
///
/// Positions are relative to `text`; duplicates are kept.
pub fn ngrams_with_positions(text: &[u8]) -> impl Iterator<Item = (Ngram, usize)> + '_ {
    text.windows(NGRAM_SIZE)
        .enumerate()
        .map(|(pos, w)| (Ngram::from_bytes(w), pos))
}

/// Check if content is likely binary
pub fn is_binary(content: &[u8]) -> bool {
    let sample_size = content.len().min(8192);
    let sample = &content[..sample_size];

    let null_count = sample.iter().filter(|&&b| b == 0).count();
    if null_count > sample_size / 10 {
        return true;
    }

    let non_text_count = sample
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\n' && b != b'\r' && b != b'\t')
        .count();

    non_text_count > sample_size / 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_lower_preserves_length() {
        let input = "Fn Main() { ÄÖ }".as_bytes();
        let lowered = to_lower(input);
        assert_eq!(lowered.len(), input.len());
        assert!(lowered.starts_with(b"fn main()"));
    }

    #[test]
    fn test_case_bits() {
        let bits = case_bits(b"aBcDeFgHiJ");
        assert_eq!(bits.len(), 2);
        assert_eq!(bits[0], 0b1010_1010);
        assert_eq!(bits[1], 0b0000_0010);
        assert!(case_bits(b"").is_empty());
    }

    #[test]
    fn test_ngrams_with_positions() {
        let grams: Vec<_> = ngrams_with_positions(b"hello").collect();
        assert_eq!(grams.len(), 3);
        assert_eq!(grams[0], (Ngram::from_bytes(b"hel"), 0));
        assert_eq!(grams[2], (Ngram::from_bytes(b"llo"), 2));
        assert_eq!(ngrams_with_positions(b"ab").count(), 0);
    }

    #[test]
    fn test_is_binary() {
        assert!(!is_binary(b"hello world\n"));
        assert!(is_binary(b"\x00\x00\x00\x00\x00\x00\x00\x00"));
    }
}
