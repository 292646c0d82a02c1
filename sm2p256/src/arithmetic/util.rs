//! Helper functions for 64-bit limb arithmetic.

// Limbs are widened to u128 and split back into words.
#![allow(clippy::cast_lossless, clippy::cast_possible_truncation)]

use subtle::Choice;

/// Computes `a + b + carry`, returning the result along with the new carry.
#[inline(always)]
pub(crate) const fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let ret = (a as u128) + (b as u128) + (carry as u128);
    (ret as u64, (ret >> 64) as u64)
}

/// Computes `a - (b + borrow)`, returning the result along with the new borrow.
///
/// The borrow is a mask: `0` or `u64::MAX`.
#[inline(always)]
pub(crate) const fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let ret = (a as u128).wrapping_sub((b as u128) + ((borrow >> 63) as u128));
    (ret as u64, (ret >> 64) as u64)
}

/// Computes `a + (b * c) + carry`, returning the result along with the new carry.
#[inline(always)]
pub(crate) const fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let ret = (a as u128) + ((b as u128) * (c as u128)) + (carry as u128);
    (ret as u64, (ret >> 64) as u64)
}

/// Returns a truthy [`Choice`] if `a < b`, comparing little-endian words in constant time.
#[inline]
pub(crate) fn words_lt(a: &[u64; 4], b: &[u64; 4]) -> Choice {
    let (_, borrow) = sbb(a[0], b[0], 0);
    let (_, borrow) = sbb(a[1], b[1], borrow);
    let (_, borrow) = sbb(a[2], b[2], borrow);
    let (_, borrow) = sbb(a[3], b[3], borrow);
    Choice::from((borrow & 1) as u8)
}

/// Converts big-endian bytes into a [`BigUint`] for reference arithmetic in tests.
#[cfg(test)]
pub(crate) fn bytes_to_biguint(bytes: &[u8; 32]) -> num_bigint::BigUint {
    num_bigint::BigUint::from_bytes_be(bytes)
}

/// Converts a [`BigUint`] below `2^256` into big-endian bytes.
#[cfg(test)]
pub(crate) fn biguint_to_bytes(x: &num_bigint::BigUint) -> [u8; 32] {
    let be = x.to_bytes_be();
    let mut bytes = [0u8; 32];
    bytes[32 - be.len()..].copy_from_slice(&be);
    bytes
}

/// Decodes big-endian bytes into little-endian 64-bit words.
#[inline]
pub(crate) fn words_from_be_bytes(bytes: &[u8; 32]) -> [u64; 4] {
    let mut words = [0u64; 4];
    for (i, chunk) in bytes.chunks_exact(8).enumerate() {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        words[3 - i] = u64::from_be_bytes(word);
    }
    words
}

/// Encodes little-endian 64-bit words as big-endian bytes.
#[inline]
pub(crate) fn words_to_be_bytes(words: &[u64; 4]) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (i, chunk) in bytes.chunks_exact_mut(8).enumerate() {
        chunk.copy_from_slice(&words[3 - i].to_be_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carry_and_borrow() {
        assert_eq!(adc(u64::MAX, 1, 0), (0, 1));
        assert_eq!(adc(u64::MAX, u64::MAX, 1), (u64::MAX, 1));
        assert_eq!(sbb(0, 1, 0), (u64::MAX, u64::MAX));
        assert_eq!(sbb(5, 3, u64::MAX), (1, 0));
        assert_eq!(mac(1, u64::MAX, u64::MAX, 1), (3, u64::MAX - 1));
    }

    #[test]
    fn word_comparison() {
        let small = [u64::MAX, u64::MAX, u64::MAX, 0];
        let large = [0, 0, 0, 1];
        assert!(bool::from(words_lt(&small, &large)));
        assert!(!bool::from(words_lt(&large, &small)));
        assert!(!bool::from(words_lt(&large, &large)));
    }

    #[test]
    fn byte_order() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        bytes[0] = 0x80;
        let words = words_from_be_bytes(&bytes);
        assert_eq!(words, [1, 0, 0, 0x8000_0000_0000_0000]);
        assert_eq!(words_to_be_bytes(&words), bytes);
    }
}
