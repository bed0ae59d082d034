/// Encode a u32 as a variable-length integer
pub fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a variable-length integer from a slice
/// Returns (value, bytes_consumed)
pub fn decode_varint(buf: &[u8]) -> Option<(u32, usize)> {
    let mut result: u32 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 32 {
            return None; // Overflow
        }

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
    }

    None // Incomplete
}

/// Delta-encode an ascending list of offsets.
///
/// The first gap is measured from zero.
pub fn delta_encode(values: &[u32], buf: &mut Vec<u8>) {
    let mut prev = 0u32;
    for &value in values {
        debug_assert!(value >= prev, "posting offsets must be ascending");
        encode_varint(value - prev, buf);
        prev = value;
    }
}

/// Decode a delta-compressed posting list into absolute offsets.
///
/// The blob is trusted to be well formed. A truncated trailing varint ends
/// the list instead of producing a partial value.
pub fn delta_decode(buf: &[u8]) -> Vec<u32> {
    // Every encoded delta takes at least one byte.
    let mut result = Vec::with_capacity(buf.len());
    let mut prev = 0u32;
    let mut pos = 0;

    while pos < buf.len() {
        if let Some((delta, consumed)) = decode_varint(&buf[pos..]) {
            prev = prev.saturating_add(delta);
            result.push(prev);
            pos += consumed;
        } else {
            break;
        }
    }

    result
}
