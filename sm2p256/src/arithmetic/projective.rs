//! Projective curve points.
//!
//! Points are held in Jacobian coordinates `(X, Y, Z)` representing the affine
//! point `(X / Z², Y / Z³)`; any point with `Z = 0` is the identity. The
//! formulas are specialized for `a = -3`.

#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::needless_range_loop,
    clippy::op_ref
)]

use super::{AffinePoint, CurveParams, FieldElement, Scalar, Sm2};
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use subtle::{Choice, ConditionallyNegatable, ConditionallySelectable, ConstantTimeEq};
use zeroize::DefaultIsZeroes;

/// Point on the SM2 curve in Jacobian projective coordinates.
#[derive(Clone, Copy, Debug)]
pub struct ProjectivePoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
}

impl ProjectivePoint {
    /// Additive identity of the group a.k.a. the point at infinity.
    ///
    /// `(1, 1, 0)` is a fixed point of [`ProjectivePoint::double`].
    pub const IDENTITY: Self = Self {
        x: FieldElement::ONE,
        y: FieldElement::ONE,
        z: FieldElement::ZERO,
    };

    /// Base point of the curve.
    pub const GENERATOR: Self = Self {
        x: Sm2::GENERATOR.0,
        y: Sm2::GENERATOR.1,
        z: FieldElement::ONE,
    };

    /// Is this point the identity?
    pub fn is_identity(&self) -> Choice {
        self.z.is_zero()
    }

    /// Returns the affine representation of this point.
    ///
    /// Uses a single field inversion; the identity maps to
    /// [`AffinePoint::IDENTITY`].
    pub fn to_affine(&self) -> AffinePoint {
        let zinv = self.z.invert_unchecked();
        let zinv2 = zinv.square();
        let affine = AffinePoint {
            x: self.x * &zinv2,
            y: self.y * &zinv2 * &zinv,
            infinity: 0,
        };

        AffinePoint::conditional_select(&affine, &AffinePoint::IDENTITY, self.is_identity())
    }

    /// Converts a batch of points to affine form with one shared inversion.
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length.
    pub fn batch_normalize(points: &[Self], affine: &mut [AffinePoint]) {
        assert_eq!(points.len(), affine.len());

        // prefix[i] = z_0 * ... * z_{i-1}, with identities counted as one
        let mut prefix = vec![FieldElement::ONE; points.len()];
        let mut acc = FieldElement::ONE;
        for (point, slot) in points.iter().zip(prefix.iter_mut()) {
            *slot = acc;
            acc *= FieldElement::conditional_select(
                &point.z,
                &FieldElement::ONE,
                point.is_identity(),
            );
        }

        let mut inv = acc.invert_unchecked();
        for i in (0..points.len()).rev() {
            let point = &points[i];
            let is_identity = point.is_identity();

            let zinv = inv * &prefix[i];
            inv *= FieldElement::conditional_select(&point.z, &FieldElement::ONE, is_identity);

            let zinv2 = zinv.square();
            let normalized = AffinePoint {
                x: point.x * &zinv2,
                y: point.y * &zinv2 * &zinv,
                infinity: 0,
            };
            affine[i] =
                AffinePoint::conditional_select(&normalized, &AffinePoint::IDENTITY, is_identity);
        }
    }

    /// Returns `-self`.
    pub fn neg(&self) -> Self {
        Self {
            x: self.x,
            y: -self.y,
            z: self.z,
        }
    }

    /// Returns `2 * self`.
    ///
    /// "dbl-2001-b" doubling formula for `a = -3`. The identity doubles to
    /// itself.
    pub fn double(&self) -> Self {
        let delta = self.z.square();
        let gamma = self.y.square();
        let beta = self.x * &gamma;

        let alpha = (self.x - &delta) * &(self.x + &delta);
        let alpha = alpha.double() + &alpha;

        let beta4 = beta.double().double();
        let x3 = alpha.square() - &beta4.double();
        let z3 = (self.y + &self.z).square() - &gamma - &delta;

        let gamma2 = gamma.square();
        let y3 = alpha * &(beta4 - &x3) - &gamma2.double().double().double();

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// General Jacobian addition ("add-2007-bl").
    ///
    /// Returns the sum together with a flag which is set when both inputs
    /// represent the same point, in which case the sum is meaningless and the
    /// caller must use [`ProjectivePoint::double`] instead. Identity inputs are
    /// not handled either.
    pub fn add_and_check_equal(&self, other: &Self) -> (Self, Choice) {
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();

        let u1 = self.x * &z2z2;
        let u2 = other.x * &z1z1;
        let s1 = self.y * &other.z * &z2z2;
        let s2 = other.y * &self.z * &z1z1;

        let h = u2 - &u1;
        let r = (s2 - &s1).double();
        let equal = h.is_zero() & r.is_zero();

        let i = h.double().square();
        let j = h * &i;
        let v = u1 * &i;

        let x3 = r.square() - &j - &v.double();
        let y3 = r * &(v - &x3) - &(s1 * &j).double();
        let z3 = ((self.z + &other.z).square() - &z1z1 - &z2z2) * &h;

        (
            Self {
                x: x3,
                y: y3,
                z: z3,
            },
            equal,
        )
    }

    /// Returns `self + other`.
    ///
    /// Complete for all inputs: selects the doubling on equal points and the
    /// other operand when one side is the identity, in constant time.
    pub fn add(&self, other: &Self) -> Self {
        let (sum, equal) = self.add_and_check_equal(other);
        let doubled = self.double();

        let mut ret = Self::conditional_select(&sum, &doubled, equal);
        ret.conditional_assign(other, self.is_identity());
        ret.conditional_assign(self, other.is_identity());
        ret
    }

    /// Returns `self + other` (or `self - other` when `negate` is set) for an
    /// affine right-hand side ("madd-2007-bl").
    ///
    /// Complete: identity flags on both sides and equal inputs are handled in
    /// constant time.
    pub fn add_mixed(&self, other: &AffinePoint, negate: Choice) -> Self {
        let mut y2 = other.y;
        y2.conditional_negate(negate);

        let z1z1 = self.z.square();
        let u2 = other.x * &z1z1;
        let s2 = y2 * &self.z * &z1z1;

        let h = u2 - &self.x;
        let r = (s2 - &self.y).double();
        let equal = h.is_zero() & r.is_zero();

        let hh = h.square();
        let i = hh.double().double();
        let j = h * &i;
        let v = self.x * &i;

        let x3 = r.square() - &j - &v.double();
        let y3 = r * &(v - &x3) - &(self.y * &j).double();
        let z3 = (self.z + &h).square() - &z1z1 - &hh;

        let mut ret = Self {
            x: x3,
            y: y3,
            z: z3,
        };

        ret.conditional_assign(&self.double(), equal);

        let rhs = Self {
            x: other.x,
            y: y2,
            z: FieldElement::ONE,
        };
        ret.conditional_assign(&rhs, self.is_identity());
        ret.conditional_assign(self, other.is_identity());
        ret
    }

    /// Returns `self - other`.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Returns `[k] self` using a fixed 4-bit window.
    ///
    /// Each window selects its multiple of `self` with a full constant-time
    /// scan. This path needs no precomputed table and is used for one-off
    /// multiplications.
    pub fn mul(&self, k: &Scalar) -> Self {
        let mut k_le = k.to_bytes();
        k_le.reverse();

        let mut pc = [Self::IDENTITY; 16];
        pc[1] = *self;

        for i in 2..16 {
            pc[i] = if i % 2 == 0 {
                pc[i / 2].double()
            } else {
                pc[i - 1].add(self)
            };
        }

        let mut q = Self::IDENTITY;
        let mut pos = 256 - 4;

        loop {
            let slot = (k_le[pos >> 3] >> (pos & 7)) & 0xf;

            let mut t = Self::IDENTITY;

            for i in 1..16 {
                t.conditional_assign(
                    &pc[i],
                    Choice::from(((slot as usize ^ i).wrapping_sub(1) >> 8) as u8 & 1),
                );
            }

            q = q.add(&t);

            if pos == 0 {
                break;
            }

            q = q.double().double().double().double();
            pos -= 4;
        }

        q
    }
}

impl ConditionallySelectable for ProjectivePoint {
    #[inline(always)]
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
        }
    }
}

impl ConstantTimeEq for ProjectivePoint {
    fn ct_eq(&self, other: &Self) -> Choice {
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();

        let x_eq = (self.x * &z2z2).ct_eq(&(other.x * &z1z1));
        let y_eq = (self.y * &z2z2 * &other.z).ct_eq(&(other.y * &z1z1 * &self.z));

        let lhs_identity = self.is_identity();
        let rhs_identity = other.is_identity();

        (lhs_identity & rhs_identity) | (!lhs_identity & !rhs_identity & x_eq & y_eq)
    }
}

impl Default for ProjectivePoint {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DefaultIsZeroes for ProjectivePoint {}

impl Eq for ProjectivePoint {}

impl PartialEq for ProjectivePoint {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl From<AffinePoint> for ProjectivePoint {
    fn from(p: AffinePoint) -> Self {
        let projective = ProjectivePoint {
            x: p.x,
            y: p.y,
            z: FieldElement::ONE,
        };
        Self::conditional_select(&projective, &Self::IDENTITY, p.is_identity())
    }
}

impl From<&AffinePoint> for ProjectivePoint {
    fn from(p: &AffinePoint) -> Self {
        Self::from(*p)
    }
}

impl Add<ProjectivePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn add(self, other: ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::add(&self, &other)
    }
}

impl Add<&ProjectivePoint> for &ProjectivePoint {
    type Output = ProjectivePoint;

    fn add(self, other: &ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::add(self, other)
    }
}

impl Add<&ProjectivePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn add(self, other: &ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::add(&self, other)
    }
}

impl AddAssign<ProjectivePoint> for ProjectivePoint {
    fn add_assign(&mut self, rhs: ProjectivePoint) {
        *self = ProjectivePoint::add(self, &rhs);
    }
}

impl AddAssign<&ProjectivePoint> for ProjectivePoint {
    fn add_assign(&mut self, rhs: &ProjectivePoint) {
        *self = ProjectivePoint::add(self, rhs);
    }
}

impl Add<&AffinePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn add(self, other: &AffinePoint) -> ProjectivePoint {
        ProjectivePoint::add_mixed(&self, other, Choice::from(0))
    }
}

impl Sub<ProjectivePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn sub(self, other: ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::sub(&self, &other)
    }
}

impl Sub<&ProjectivePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn sub(self, other: &ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::sub(&self, other)
    }
}

impl Sub<&ProjectivePoint> for &ProjectivePoint {
    type Output = ProjectivePoint;

    fn sub(self, other: &ProjectivePoint) -> ProjectivePoint {
        ProjectivePoint::sub(self, other)
    }
}

impl SubAssign<&ProjectivePoint> for ProjectivePoint {
    fn sub_assign(&mut self, rhs: &ProjectivePoint) {
        *self = ProjectivePoint::sub(self, rhs);
    }
}

impl Sub<&AffinePoint> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn sub(self, other: &AffinePoint) -> ProjectivePoint {
        ProjectivePoint::add_mixed(&self, other, Choice::from(1))
    }
}

impl Mul<&Scalar> for &ProjectivePoint {
    type Output = ProjectivePoint;

    fn mul(self, scalar: &Scalar) -> ProjectivePoint {
        ProjectivePoint::mul(self, scalar)
    }
}

impl Mul<&Scalar> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn mul(self, scalar: &Scalar) -> ProjectivePoint {
        ProjectivePoint::mul(&self, scalar)
    }
}

impl Mul<Scalar> for ProjectivePoint {
    type Output = ProjectivePoint;

    fn mul(self, scalar: Scalar) -> ProjectivePoint {
        ProjectivePoint::mul(&self, &scalar)
    }
}

impl Neg for ProjectivePoint {
    type Output = ProjectivePoint;

    fn neg(self) -> ProjectivePoint {
        ProjectivePoint::neg(&self)
    }
}

impl<'a> Neg for &'a ProjectivePoint {
    type Output = ProjectivePoint;

    fn neg(self) -> ProjectivePoint {
        ProjectivePoint::neg(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{AffinePoint, ProjectivePoint};
    use crate::arithmetic::{util::words_to_be_bytes, Scalar};
    use crate::arithmetic::scalar::ORDER_MINUS_ONE;
    use hex_literal::hex;
    use subtle::Choice;

    const DOUBLE_G: [u8; 64] = hex!(
        "56cefd60d7c87c000d58ef57fa73ba4d9c0dfa08c08a7331495c2e1da3f2bd52"
        "31b7e7e6cc8189f668535ce0f8eaf1bd6de84c182f6c8e716f780d3a970a23c3"
    );

    const TRIPLE_G: [u8; 64] = hex!(
        "a97f7cd4b3c993b4be2daa8cdb41e24ca13f6bd945302244e26918f1d0509ebf"
        "530b5dd88c688ef5ccc5cec08a72150f7c400ee5cd045292aaacdd037458f6e6"
    );

    #[test]
    fn affine_to_projective() {
        let basepoint_affine = AffinePoint::GENERATOR;
        let basepoint_projective = ProjectivePoint::GENERATOR;

        assert_eq!(
            ProjectivePoint::from(basepoint_affine),
            basepoint_projective,
        );
        assert_eq!(basepoint_projective.to_affine(), basepoint_affine);
        assert!(!bool::from(basepoint_projective.to_affine().is_identity()));

        assert!(bool::from(
            ProjectivePoint::IDENTITY.to_affine().is_identity()
        ));
        assert_eq!(
            ProjectivePoint::from(AffinePoint::IDENTITY),
            ProjectivePoint::IDENTITY
        );
    }

    #[test]
    fn projective_identity_addition() {
        let identity = ProjectivePoint::IDENTITY;
        let generator = ProjectivePoint::GENERATOR;

        assert_eq!(identity + &generator, generator);
        assert_eq!(generator + &identity, generator);
        assert_eq!(identity + &identity, identity);
        assert_eq!(identity.double(), identity);
    }

    #[test]
    fn double_and_add() {
        let g = ProjectivePoint::GENERATOR;
        let two_g = g.double();
        assert_eq!(two_g.to_affine().to_bytes(), DOUBLE_G);
        assert_eq!((g + &g).to_affine().to_bytes(), DOUBLE_G);
        assert_eq!((two_g + &g).to_affine().to_bytes(), TRIPLE_G);
    }

    #[test]
    fn add_and_check_equal_flags_equal_inputs() {
        let g = ProjectivePoint::GENERATOR;
        let (_, equal) = g.add_and_check_equal(&g);
        assert!(bool::from(equal));

        let (sum, equal) = g.add_and_check_equal(&g.double());
        assert!(!bool::from(equal));
        assert_eq!(sum.to_affine().to_bytes(), TRIPLE_G);
    }

    #[test]
    fn projective_add_vs_double() {
        let generator = ProjectivePoint::GENERATOR;
        let r1 = generator + &generator;
        let r2 = generator.double();
        assert_eq!(r1, r2);

        let r1 = (generator + &generator) + &(generator + &generator);
        let r2 = generator.double().double();
        assert_eq!(r1, r2);
    }

    #[test]
    fn mixed_addition() {
        let g = ProjectivePoint::GENERATOR;
        let g_affine = AffinePoint::GENERATOR;
        let two_g = g.double();

        assert_eq!(two_g + &g_affine, two_g + &g);
        assert_eq!(g + &g_affine, two_g);
        assert_eq!(two_g - &g_affine, g);
        assert_eq!(ProjectivePoint::IDENTITY + &g_affine, g);
        assert_eq!(g + &AffinePoint::IDENTITY, g);
        assert!(bool::from((g - &g_affine).is_identity()));
        assert_eq!(
            ProjectivePoint::IDENTITY.add_mixed(&g_affine, Choice::from(1)),
            -g
        );
    }

    #[test]
    fn inverse_sums_to_identity() {
        let g = ProjectivePoint::GENERATOR;
        assert!(bool::from((g + &(-g)).is_identity()));
        assert_eq!(g - &g, ProjectivePoint::IDENTITY);
        assert_ne!(g, ProjectivePoint::IDENTITY);
    }

    #[test]
    fn scalar_multiplication() {
        let g = ProjectivePoint::GENERATOR;
        assert_eq!((g * &Scalar::from_u64(3)).to_affine().to_bytes(), TRIPLE_G);
        assert!(bool::from((g * &Scalar::ZERO).is_identity()));
        assert_eq!(g * &Scalar::ONE, g);

        let n_minus_one = Scalar::from_bytes(&words_to_be_bytes(&ORDER_MINUS_ONE)).unwrap();
        let p = (g * &n_minus_one).to_affine();
        assert_eq!(
            p.to_bytes(),
            hex!(
                "32c4ae2c1f1981195f9904466a39c9948fe30bbff2660be1715a4589334c74c7"
                "43c8c95c0b098863a642311c9496deac2f56788239d5b8c0fd20cd1adec60f5f"
            )
        );
        assert!(bool::from((g * &n_minus_one + &g).is_identity()));
    }

    #[test]
    fn batch_normalize_matches_to_affine() {
        let g = ProjectivePoint::GENERATOR;
        let points = [g, ProjectivePoint::IDENTITY, g.double(), g.double() + &g];
        let mut affine = [AffinePoint::IDENTITY; 4];
        ProjectivePoint::batch_normalize(&points, &mut affine);

        for (point, normalized) in points.iter().zip(affine.iter()) {
            assert_eq!(&point.to_affine(), normalized);
        }
    }
}
