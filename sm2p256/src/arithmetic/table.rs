//! Precomputed comb tables for constant-time fixed-point multiplication.
//!
//! A table for a point `B` holds 37 levels of 64 affine points, with
//! `entry[i][j - 1] = j · 2^(7i) · B`. A scalar is split into 37 signed 7-bit
//! booth digits; each digit picks one entry (or its negation) from its level
//! and the picks are summed with mixed additions. No doublings are needed at
//! multiplication time.

#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::needless_range_loop
)]

use super::{AffinePoint, ProjectivePoint, Scalar};
use core::fmt;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// Window width in bits.
pub const WINDOW_BITS: usize = 7;

/// Number of levels, one per booth window.
pub const LEVELS: usize = 37;

/// Number of non-zero multiples held per level.
pub const ENTRIES_PER_LEVEL: usize = 1 << (WINDOW_BITS - 1);

/// Recodes an 8-bit window (7 bits plus the carry bit below it) into a signed
/// digit `±d` with `0 <= d <= 64`.
///
/// Returns the magnitude together with the sign (set when negative).
#[inline]
pub fn booth_recode(window: u64) -> (u64, Choice) {
    let sign = !((window >> WINDOW_BITS).wrapping_sub(1));
    let mut digit = (1u64 << (WINDOW_BITS + 1)) - window - 1;
    digit = (digit & sign) | (window & !sign);
    digit = (digit >> 1) + (digit & 1);

    (digit, Choice::from((sign & 1) as u8))
}

/// Reads the 8-bit window starting at bit `index` of a little-endian scalar.
///
/// The read is widened over two adjacent words so windows straddling a word
/// boundary need no special case; bits above 255 read as zero.
#[inline]
fn window_at(words: &[u64; 4], index: usize) -> u64 {
    let word = index / 64;
    let shift = index % 64;

    let lo = words[word] as u128;
    let hi = if word + 1 < words.len() {
        words[word + 1] as u128
    } else {
        0
    };

    ((((hi << 64) | lo) >> shift) as u64) & 0xff
}

/// Returns the booth window for `level`.
#[inline]
fn level_window(words: &[u64; 4], level: usize) -> u64 {
    if level == 0 {
        // implicit zero carry below bit 0
        (words[0] << 1) & 0xff
    } else {
        window_at(words, WINDOW_BITS * level - 1)
    }
}

/// Comb table of affine multiples of a fixed point.
///
/// Immutable once built and shared between threads behind an `Arc`.
#[derive(Clone, PartialEq, Eq)]
pub struct PrecomputedTable {
    levels: Vec<[AffinePoint; ENTRIES_PER_LEVEL]>,
}

impl PrecomputedTable {
    /// Size of the table's point data in bytes: two 32-byte coordinates per
    /// entry.
    pub const BYTE_SIZE: usize = LEVELS * ENTRIES_PER_LEVEL * 64;

    /// Builds the table for `base`.
    ///
    /// Each level is accumulated in Jacobian form and normalized with a single
    /// inversion before the level base is doubled `WINDOW_BITS` times.
    pub fn new(base: &AffinePoint) -> Self {
        let mut level_base = ProjectivePoint::from(base);
        let mut levels = Vec::with_capacity(LEVELS);
        let mut row = [ProjectivePoint::IDENTITY; ENTRIES_PER_LEVEL];

        for _ in 0..LEVELS {
            row[0] = level_base;
            for j in 1..ENTRIES_PER_LEVEL {
                row[j] = row[j - 1].add(&level_base);
            }

            let mut affine = [AffinePoint::IDENTITY; ENTRIES_PER_LEVEL];
            ProjectivePoint::batch_normalize(&row, &mut affine);
            levels.push(affine);

            for _ in 0..WINDOW_BITS {
                level_base = level_base.double();
            }
        }

        Self { levels }
    }

    /// Returns `digit · 2^(7·level) · B`, or the identity for digit zero.
    ///
    /// Scans every entry of the level so the memory access pattern does not
    /// depend on `digit`.
    pub fn select(&self, level: usize, digit: u64) -> AffinePoint {
        let mut point = AffinePoint::IDENTITY;

        for (j, entry) in self.levels[level].iter().enumerate() {
            point.conditional_assign(entry, digit.ct_eq(&(j as u64 + 1)));
        }

        point
    }

    /// Returns `[k] B` in constant time.
    pub fn mul(&self, k: &Scalar) -> ProjectivePoint {
        let words = k.to_words();
        let mut acc = ProjectivePoint::IDENTITY;

        for level in 0..LEVELS {
            let (digit, sign) = booth_recode(level_window(&words, level));
            let point = self.select(level, digit);
            acc = acc.add_mixed(&point, sign);
        }

        acc
    }
}

impl fmt::Debug for PrecomputedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrecomputedTable")
            .field("base", &self.levels[0][0])
            .field("levels", &self.levels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn booth_digits() {
        let cases: [(u64, u64, u8); 8] = [
            (0, 0, 0),
            (1, 1, 0),
            (2, 1, 0),
            (3, 2, 0),
            (127, 64, 0),
            (128, 64, 1),
            (254, 1, 1),
            (255, 0, 1),
        ];

        for (window, digit, sign) in cases {
            let (d, s) = booth_recode(window);
            assert_eq!((d, s.unwrap_u8()), (digit, sign), "window {window}");
        }
    }

    #[test]
    fn windows_straddle_words() {
        let words = [0x8000_0000_0000_0000, 0x7f, 0, 0xffff_ffff_ffff_ffff];
        assert_eq!(window_at(&words, 63), 0xff);
        assert_eq!(window_at(&words, 251), 0x1f);
        assert_eq!(level_window(&words, 0), 0);
    }

    #[test]
    fn generator_table_layout() {
        let table = PrecomputedTable::new(&AffinePoint::GENERATOR);
        let g = ProjectivePoint::GENERATOR;

        assert_eq!(table.select(0, 0), AffinePoint::IDENTITY);
        assert_eq!(table.select(0, 1), AffinePoint::GENERATOR);
        assert_eq!(table.select(0, 3), (g * &Scalar::from_u64(3)).to_affine());
        assert_eq!(table.select(1, 1), (g * &Scalar::from_u64(128)).to_affine());
        assert_eq!(
            table.select(2, 64),
            (g * &Scalar::from_u64(64 << 14)).to_affine()
        );
    }

    proptest! {
        #[test]
        fn booth_digits_reconstruct_scalar(bytes in any::<[u8; 32]>()) {
            let k = Scalar::reduce_bytes(&bytes);
            let words = k.to_words();

            let radix = Scalar::from_u64(1 << WINDOW_BITS);
            let mut weight = Scalar::ONE;
            let mut sum = Scalar::ZERO;

            for level in 0..LEVELS {
                let (digit, sign) = booth_recode(level_window(&words, level));
                let mut term = Scalar::from_u64(digit) * &weight;
                term.conditional_assign(&-term, sign);
                sum += term;
                weight *= radix;
            }

            prop_assert_eq!(sum, k);
        }
    }
}
