/// Compare two byte slices in time independent of their contents.
///
/// Every byte pair is visited even after a difference is found, so the
/// position of the first mismatch cannot be recovered by timing the call.
/// Slice lengths are not treated as secret: digests and MAC tags compared
/// here have fixed, public lengths.
///
/// # Arguments
/// * `a` - First byte slice
/// * `b` - Second byte slice
///
/// # Returns
/// True if both slices have equal length and identical contents
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    // Keep the accumulator opaque so the loop is not turned into an early exit.
    std::hint::black_box(diff) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_slices() {
        assert!(constant_time_eq(b"signature", b"signature"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_different_contents() {
        assert!(!constant_time_eq(b"signature", b"signaturf"));
        assert!(!constant_time_eq(b"xignature", b"signature"));
    }

    #[test]
    fn test_different_lengths() {
        assert!(!constant_time_eq(b"short", b"longer"));
        assert!(!constant_time_eq(b"", b"x"));
    }
}
