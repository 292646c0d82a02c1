//! Elements of a 256-bit prime field which use an internal Montgomery form
//! representation.
//!
//! The modulus is carried as a type parameter: values modulo `p` and values
//! modulo `n` are distinct types, and moving a value between them requires an
//! explicit trip through its canonical encoding.

use super::util::{adc, mac, sbb, words_from_be_bytes, words_lt, words_to_be_bytes};
use core::{
    fmt,
    marker::PhantomData,
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};
use zeroize::DefaultIsZeroes;

/// Montgomery parameters of a 256-bit odd modulus `m` with `R = 2^256`.
pub trait MontyParams: Copy + Clone + fmt::Debug + Default + Eq + Send + Sync + 'static {
    /// Name used when formatting elements.
    const NAME: &'static str;

    /// The modulus `m` as little-endian words.
    const MODULUS: [u64; 4];

    /// `R^2 mod m`.
    const R2: [u64; 4];

    /// `-m^-1 mod 2^64`.
    const MOD_NEG_INV: u64;
}

/// An element modulo `P::MODULUS`, stored as `aR mod m`.
///
/// All arithmetic is constant-time: execution time and memory access depend
/// only on the (fixed) width of the operands.
pub struct MontyElement<P: MontyParams> {
    words: [u64; 4],
    params: PhantomData<P>,
}

impl<P: MontyParams> MontyElement<P> {
    /// Zero element (additive identity).
    pub const ZERO: Self = Self::from_montgomery_words([0; 4]);

    /// Multiplicative identity.
    pub const ONE: Self = Self::from_words([1, 0, 0, 0]);

    /// Wraps words which are already in Montgomery form.
    pub(crate) const fn from_montgomery_words(words: [u64; 4]) -> Self {
        Self {
            words,
            params: PhantomData,
        }
    }

    /// Converts canonical little-endian words into Montgomery form.
    ///
    /// Inputs greater than or equal to the modulus are reduced.
    pub const fn from_words(words: [u64; 4]) -> Self {
        Self::from_montgomery_words(montgomery_mul(
            &words,
            &P::R2,
            &P::MODULUS,
            P::MOD_NEG_INV,
        ))
    }

    /// Converts a small integer into Montgomery form.
    pub const fn from_u64(w: u64) -> Self {
        Self::from_words([w, 0, 0, 0])
    }

    /// Decodes a canonical big-endian encoding.
    ///
    /// Returns none if the encoded integer is not less than the modulus.
    pub fn from_bytes(bytes: &[u8; 32]) -> CtOption<Self> {
        let words = words_from_be_bytes(bytes);
        CtOption::new(Self::from_words(words), words_lt(&words, &P::MODULUS))
    }

    /// Decodes a big-endian integer, reducing it modulo `m`.
    pub fn reduce_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_words(words_from_be_bytes(bytes))
    }

    /// Returns the canonical value as little-endian words (leaves Montgomery form).
    pub const fn to_words(&self) -> [u64; 4] {
        montgomery_mul(&self.words, &[1, 0, 0, 0], &P::MODULUS, P::MOD_NEG_INV)
    }

    /// Returns the canonical big-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        words_to_be_bytes(&self.to_words())
    }

    /// Borrow the internal Montgomery-form words.
    #[cfg(test)]
    pub(crate) const fn as_montgomery_words(&self) -> &[u64; 4] {
        &self.words
    }

    /// Determine if this element is zero.
    pub fn is_zero(&self) -> Choice {
        self.ct_eq(&Self::ZERO)
    }

    /// Returns `self + rhs mod m`.
    pub const fn add(&self, rhs: &Self) -> Self {
        let a = &self.words;
        let b = &rhs.words;

        // Both moduli have bit 255 set, so the sum can spill into a fifth word.
        let (w0, carry) = adc(a[0], b[0], 0);
        let (w1, carry) = adc(a[1], b[1], carry);
        let (w2, carry) = adc(a[2], b[2], carry);
        let (w3, w4) = adc(a[3], b[3], carry);

        Self::from_montgomery_words(sub_modulus([w0, w1, w2, w3, w4], &P::MODULUS))
    }

    /// Returns `2 * self mod m`.
    pub const fn double(&self) -> Self {
        self.add(self)
    }

    /// Returns `self - rhs mod m`.
    pub const fn sub(&self, rhs: &Self) -> Self {
        let a = &self.words;
        let b = &rhs.words;
        let m = &P::MODULUS;

        let (w0, borrow) = sbb(a[0], b[0], 0);
        let (w1, borrow) = sbb(a[1], b[1], borrow);
        let (w2, borrow) = sbb(a[2], b[2], borrow);
        let (w3, borrow) = sbb(a[3], b[3], borrow);

        // On underflow `borrow` is all ones and the modulus is added back.
        let (w0, carry) = adc(w0, m[0] & borrow, 0);
        let (w1, carry) = adc(w1, m[1] & borrow, carry);
        let (w2, carry) = adc(w2, m[2] & borrow, carry);
        let (w3, _) = adc(w3, m[3] & borrow, carry);

        Self::from_montgomery_words([w0, w1, w2, w3])
    }

    /// Returns `-self mod m`.
    pub const fn neg(&self) -> Self {
        Self::sub(&Self::ZERO, self)
    }

    /// Returns `self * rhs mod m`.
    pub const fn multiply(&self, rhs: &Self) -> Self {
        Self::from_montgomery_words(montgomery_mul(
            &self.words,
            &rhs.words,
            &P::MODULUS,
            P::MOD_NEG_INV,
        ))
    }

    /// Returns `self * self mod m`.
    pub const fn square(&self) -> Self {
        self.multiply(self)
    }

    /// Returns `self^(2^n) mod m`.
    pub const fn sqn(&self, n: usize) -> Self {
        let mut x = *self;
        let mut i = 0;
        while i < n {
            x = x.square();
            i += 1;
        }
        x
    }

    /// Exponentiates `self` by `exp`, where `exp` is a little-endian order
    /// integer exponent.
    ///
    /// Variable-time with respect to `exp` only: the sequence of squarings
    /// and multiplications does not depend on `self`.
    pub const fn pow_vartime(&self, exp: &[u64; 4]) -> Self {
        let mut res = Self::ONE;

        let mut i = exp.len();
        while i > 0 {
            i -= 1;

            let mut j = 64;
            while j > 0 {
                j -= 1;
                res = res.square();

                if ((exp[i] >> j) & 1) == 1 {
                    res = res.multiply(self);
                }
            }
        }

        res
    }
}

/// Montgomery multiplication: returns `a * b * R^-1 mod m`.
///
/// Coarsely integrated operand scanning with fixed loop bounds. The operands
/// only need to satisfy `a * b < m * R`, so `b = R^2 mod m` converts any
/// 256-bit `a` into Montgomery form.
///
/// References:
/// - Handbook of Applied Cryptography, Chapter 14, Algorithm 14.36
///   http://cacr.uwaterloo.ca/hac/about/chap14.pdf
const fn montgomery_mul(a: &[u64; 4], b: &[u64; 4], m: &[u64; 4], m_neg_inv: u64) -> [u64; 4] {
    let mut t = [0u64; 6];

    let mut i = 0;
    while i < 4 {
        // t += a * b[i]
        let mut carry = 0;
        let mut j = 0;
        while j < 4 {
            let (w, c) = mac(t[j], a[j], b[i], carry);
            t[j] = w;
            carry = c;
            j += 1;
        }
        let (w, c) = adc(t[4], carry, 0);
        t[4] = w;
        t[5] = c;

        // t = (t + k * m) / 2^64, where k makes the lowest word vanish
        let k = t[0].wrapping_mul(m_neg_inv);
        let (_, mut carry) = mac(t[0], k, m[0], 0);
        let mut j = 1;
        while j < 4 {
            let (w, c) = mac(t[j], k, m[j], carry);
            t[j - 1] = w;
            carry = c;
            j += 1;
        }
        let (w, c) = adc(t[4], carry, 0);
        t[3] = w;
        t[4] = t[5] + c;

        i += 1;
    }

    // Result is within one modulus of the correct value
    sub_modulus([t[0], t[1], t[2], t[3], t[4]], m)
}

/// Subtracts the modulus from a five-word value `l < 2m`, adding it back in
/// constant time on underflow.
#[inline]
const fn sub_modulus(l: [u64; 5], m: &[u64; 4]) -> [u64; 4] {
    let (w0, borrow) = sbb(l[0], m[0], 0);
    let (w1, borrow) = sbb(l[1], m[1], borrow);
    let (w2, borrow) = sbb(l[2], m[2], borrow);
    let (w3, borrow) = sbb(l[3], m[3], borrow);
    let (_, borrow) = sbb(l[4], 0, borrow);

    // If underflow occurred on the final limb, borrow = 0xfff...fff, otherwise
    // borrow = 0x000...000. Thus, we use it as a mask to conditionally add the
    // modulus.
    let (w0, carry) = adc(w0, m[0] & borrow, 0);
    let (w1, carry) = adc(w1, m[1] & borrow, carry);
    let (w2, carry) = adc(w2, m[2] & borrow, carry);
    let (w3, _) = adc(w3, m[3] & borrow, carry);

    [w0, w1, w2, w3]
}

impl<P: MontyParams> Clone for MontyElement<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: MontyParams> Copy for MontyElement<P> {}

impl<P: MontyParams> Default for MontyElement<P> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<P: MontyParams> DefaultIsZeroes for MontyElement<P> {}

impl<P: MontyParams> ConditionallySelectable for MontyElement<P> {
    #[inline]
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self::from_montgomery_words([
            u64::conditional_select(&a.words[0], &b.words[0], choice),
            u64::conditional_select(&a.words[1], &b.words[1], choice),
            u64::conditional_select(&a.words[2], &b.words[2], choice),
            u64::conditional_select(&a.words[3], &b.words[3], choice),
        ])
    }
}

impl<P: MontyParams> ConstantTimeEq for MontyElement<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.words[0].ct_eq(&other.words[0])
            & self.words[1].ct_eq(&other.words[1])
            & self.words[2].ct_eq(&other.words[2])
            & self.words[3].ct_eq(&other.words[3])
    }
}

impl<P: MontyParams> PartialEq for MontyElement<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl<P: MontyParams> Eq for MontyElement<P> {}

impl<P: MontyParams> fmt::Debug for MontyElement<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x", P::NAME)?;
        for byte in self.to_bytes() {
            write!(f, "{:02X}", byte)?;
        }
        write!(f, ")")
    }
}

macro_rules! impl_binop {
    ($op:ident, $op_fn:ident, $assign:ident, $assign_fn:ident, $inner:ident) => {
        impl<P: MontyParams> $op for MontyElement<P> {
            type Output = Self;

            #[inline]
            fn $op_fn(self, rhs: Self) -> Self {
                MontyElement::$inner(&self, &rhs)
            }
        }

        impl<P: MontyParams> $op<&MontyElement<P>> for MontyElement<P> {
            type Output = Self;

            #[inline]
            fn $op_fn(self, rhs: &Self) -> Self {
                MontyElement::$inner(&self, rhs)
            }
        }

        impl<P: MontyParams> $op<&MontyElement<P>> for &MontyElement<P> {
            type Output = MontyElement<P>;

            #[inline]
            fn $op_fn(self, rhs: &MontyElement<P>) -> MontyElement<P> {
                MontyElement::$inner(self, rhs)
            }
        }

        impl<P: MontyParams> $assign for MontyElement<P> {
            #[inline]
            fn $assign_fn(&mut self, rhs: Self) {
                *self = MontyElement::$inner(self, &rhs);
            }
        }

        impl<P: MontyParams> $assign<&MontyElement<P>> for MontyElement<P> {
            #[inline]
            fn $assign_fn(&mut self, rhs: &Self) {
                *self = MontyElement::$inner(self, rhs);
            }
        }
    };
}

impl_binop!(Add, add, AddAssign, add_assign, add);
impl_binop!(Sub, sub, SubAssign, sub_assign, sub);
impl_binop!(Mul, mul, MulAssign, mul_assign, multiply);

impl<P: MontyParams> Neg for MontyElement<P> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        MontyElement::neg(&self)
    }
}

impl<P: MontyParams> Neg for &MontyElement<P> {
    type Output = MontyElement<P>;

    #[inline]
    fn neg(self) -> MontyElement<P> {
        MontyElement::neg(self)
    }
}
