//! Field arithmetic modulo p = 2^{256} − 2^{224} − 2^{96} + 2^{64} − 1

#![allow(clippy::op_ref)]

use super::monty::{MontyElement, MontyParams};
use subtle::CtOption;

/// Montgomery parameters of the SM2 base field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldParams;

impl MontyParams for FieldParams {
    const NAME: &'static str = "FieldElement";

    /// p = FFFFFFFE FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFF 00000000 FFFFFFFF FFFFFFFF
    const MODULUS: [u64; 4] = [
        0xffff_ffff_ffff_ffff,
        0xffff_ffff_0000_0000,
        0xffff_ffff_ffff_ffff,
        0xffff_fffe_ffff_ffff,
    ];

    /// R^2 = 2^512 mod p
    const R2: [u64; 4] = [
        0x0000_0002_0000_0003,
        0x0000_0002_ffff_ffff,
        0x0000_0001_0000_0001,
        0x0000_0004_0000_0002,
    ];

    /// The low word of p is all ones, so -p^-1 mod 2^64 = 1.
    const MOD_NEG_INV: u64 = 1;
}

/// An element in the finite field modulo p.
///
/// The internal representation is in little-endian order. Elements are always in
/// Montgomery form; i.e., FieldElement(a) = aR mod p, with R = 2^256.
pub type FieldElement = MontyElement<FieldParams>;

impl MontyElement<FieldParams> {
    /// Returns the multiplicative inverse of self, if self is non-zero.
    pub fn invert(&self) -> CtOption<Self> {
        CtOption::new(self.invert_unchecked(), !self.is_zero())
    }

    /// Returns the multiplicative inverse of self.
    ///
    /// Does not check that self is non-zero: zero maps to zero.
    pub const fn invert_unchecked(&self) -> Self {
        // Fermat: a^(p-2) * a ≡ 1 mod p. The chain below builds runs of ones
        // (x_k = a^(2^k - 1)) and stitches them together following the bit
        // pattern of p - 2.
        let x2 = self.square().multiply(self);
        let x3 = x2.square().multiply(self);
        let x4 = x2.sqn(2).multiply(&x2);
        let x7 = x4.sqn(3).multiply(&x3);
        let x8 = x4.sqn(4).multiply(&x4);
        let x15 = x8.sqn(7).multiply(&x7);
        let x16 = x8.sqn(8).multiply(&x8);
        let x31 = x16.sqn(15).multiply(&x15);
        let x32 = x16.sqn(16).multiply(&x16);

        x31.sqn(33)
            .multiply(&x32)
            .sqn(32)
            .multiply(&x32)
            .sqn(32)
            .multiply(&x32)
            .sqn(32)
            .multiply(&x32)
            .sqn(64)
            .multiply(&x32)
            .sqn(16)
            .multiply(&x16)
            .sqn(8)
            .multiply(&x8)
            .sqn(4)
            .multiply(&x4)
            .sqn(2)
            .multiply(&x2)
            .sqn(2)
            .multiply(self)
    }
}
