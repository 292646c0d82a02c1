//! Scalar field arithmetic modulo n = FFFFFFFE FFFFFFFF FFFFFFFF FFFFFFFF 7203DF6B 21C6052B 53BBF409 39D54123

use super::{
    monty::{MontyElement, MontyParams},
    util::{words_from_be_bytes, words_lt},
};
use rand_core::CryptoRngCore;
use subtle::{ConstantTimeEq, CtOption};

/// Montgomery parameters of the SM2 group order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderParams;

impl MontyParams for OrderParams {
    const NAME: &'static str = "Scalar";

    const MODULUS: [u64; 4] = [
        0x53bb_f409_39d5_4123,
        0x7203_df6b_21c6_052b,
        0xffff_ffff_ffff_ffff,
        0xffff_fffe_ffff_ffff,
    ];

    /// R^2 = 2^512 mod n
    const R2: [u64; 4] = [
        0x9011_92af_7c11_4f20,
        0x3464_504a_de6f_a2fa,
        0x620f_c84c_3aff_e0d4,
        0x1eb5_e412_a22b_3d3b,
    ];

    /// -n^-1 mod 2^64
    const MOD_NEG_INV: u64 = 0x327f_9e88_7235_0975;
}

/// `n - 2`, the inversion exponent.
const ORDER_MINUS_TWO: [u64; 4] = [
    0x53bb_f409_39d5_4121,
    0x7203_df6b_21c6_052b,
    0xffff_ffff_ffff_ffff,
    0xffff_fffe_ffff_ffff,
];

/// `n - 1`, the exclusive upper bound of private scalars.
pub(crate) const ORDER_MINUS_ONE: [u64; 4] = [
    0x53bb_f409_39d5_4122,
    0x7203_df6b_21c6_052b,
    0xffff_ffff_ffff_ffff,
    0xffff_fffe_ffff_ffff,
];

/// Scalars are elements in the finite field modulo n.
///
/// Like [`FieldElement`](super::FieldElement) they are kept in Montgomery form,
/// but the modulus is part of the type so the two cannot be mixed by accident.
pub type Scalar = MontyElement<OrderParams>;

impl MontyElement<OrderParams> {
    /// Returns the multiplicative inverse of self, if self is non-zero.
    pub fn invert(&self) -> CtOption<Self> {
        CtOption::new(self.invert_unchecked(), !self.is_zero())
    }

    /// Returns the multiplicative inverse of self.
    ///
    /// Does not check that self is non-zero: zero maps to zero. The exponent
    /// is the public constant `n - 2`, so the operation sequence is fixed.
    pub const fn invert_unchecked(&self) -> Self {
        self.pow_vartime(&ORDER_MINUS_TWO)
    }

    /// Samples a uniform scalar in `[1, upper - 1]` by rejection sampling
    /// big-endian 256-bit candidates.
    ///
    /// `upper` must not exceed the order. Only the number of rejected draws
    /// is observable, and it is independent of the accepted value.
    pub fn try_from_rng_below(
        rng: &mut impl CryptoRngCore,
        upper: &[u64; 4],
    ) -> Result<Self, rand_core::Error> {
        let mut bytes = [0u8; 32];
        loop {
            rng.try_fill_bytes(&mut bytes)?;
            let words = words_from_be_bytes(&bytes);
            let is_zero = words.iter().fold(0u64, |acc, w| acc | w).ct_eq(&0);

            if bool::from(words_lt(&words, upper) & !is_zero) {
                return Ok(Self::from_words(words));
            }
        }
    }

    /// Samples a uniform non-zero scalar.
    pub fn try_from_rng_nonzero(rng: &mut impl CryptoRngCore) -> Result<Self, rand_core::Error> {
        Self::try_from_rng_below(rng, &OrderParams::MODULUS)
    }
}
