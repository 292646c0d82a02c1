//! Pure Rust implementation of group operations on the SM2 curve.

pub(crate) mod affine;
pub(crate) mod field;
pub(crate) mod monty;
pub(crate) mod projective;
pub(crate) mod scalar;
pub(crate) mod table;
pub(crate) mod util;

pub use self::{
    affine::AffinePoint,
    field::{FieldElement, FieldParams},
    monty::{MontyElement, MontyParams},
    projective::ProjectivePoint,
    scalar::{OrderParams, Scalar},
    table::{booth_recode, PrecomputedTable},
};

/// SM2 elliptic curve: the 256-bit curve recommended by GB/T 32918.
///
/// Its equation is `y² = x³ - 3x + b` over a 256-bit prime field.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct Sm2;

/// Domain parameters of a short Weierstrass curve of prime order.
pub trait CurveParams {
    /// Bit length of field elements.
    const FIELD_BITS: usize;

    /// Field modulus `p` as little-endian words.
    const MODULUS: [u64; 4];

    /// Group order `n` as little-endian words.
    const ORDER: [u64; 4];

    /// Coefficient `a` in the curve equation.
    const EQUATION_A: FieldElement;

    /// Coefficient `b` in the curve equation.
    const EQUATION_B: FieldElement;

    /// Generator point's affine coordinates: (x, y).
    const GENERATOR: (FieldElement, FieldElement);
}

impl CurveParams for Sm2 {
    const FIELD_BITS: usize = 256;
    const MODULUS: [u64; 4] = FieldParams::MODULUS;
    const ORDER: [u64; 4] = OrderParams::MODULUS;

    /// a = -3 (0xFFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF00000000FFFFFFFFFFFFFFFC)
    const EQUATION_A: FieldElement = FieldElement::neg(&FieldElement::from_u64(3));

    /// b = 0x28E9FA9E9D9F5E344D5A9E4BCF6509A7F39789F515AB8F92DDBCBD414D940E93
    const EQUATION_B: FieldElement = FieldElement::from_words([
        0xddbc_bd41_4d94_0e93,
        0xf397_89f5_15ab_8f92,
        0x4d5a_9e4b_cf65_09a7,
        0x28e9_fa9e_9d9f_5e34,
    ]);

    /// Base point of SM2.
    ///
    /// ```text
    /// Gₓ = 32c4ae2c 1f198119 5f990446 6a39c994 8fe30bbf f2660be1 715a4589 334c74c7
    /// Gᵧ = bc3736a2 f4f6779c 59bdcee3 6b692153 d0a9877c c62a4740 02df32e5 2139f0a0
    /// ```
    const GENERATOR: (FieldElement, FieldElement) = (
        FieldElement::from_words([
            0x715a_4589_334c_74c7,
            0x8fe3_0bbf_f266_0be1,
            0x5f99_0446_6a39_c994,
            0x32c4_ae2c_1f19_8119,
        ]),
        FieldElement::from_words([
            0x02df_32e5_2139_f0a0,
            0xd0a9_877c_c62a_4740,
            0x59bd_cee3_6b69_2153,
            0xbc37_36a2_f4f6_779c,
        ]),
    );
}

/// Table-driven multiplication for curves which provide comb tables.
///
/// Callers which need `k·G`, `k·Q` for a long-lived `Q`, or the verification
/// sum `k1·G + k2·Q` go through this trait.
pub trait PrecomputedArithmetic {
    /// Scalar type.
    type Scalar;

    /// Affine point type, the input to table construction.
    type AffinePoint;

    /// Projective point type, the result of multiplication.
    type ProjectivePoint;

    /// Table of precomputed multiples of a fixed point.
    type Table;

    /// Builds the table of multiples of `base`.
    fn build_table(base: &Self::AffinePoint) -> Self::Table;

    /// Computes `[k] B` where `table` holds multiples of `B`.
    fn mul_fixed(table: &Self::Table, k: &Self::Scalar) -> Self::ProjectivePoint;

    /// Computes `[k1] G + [k2] Q` from the generator's and `Q`'s tables.
    fn mul_combined(
        generator_table: &Self::Table,
        k1: &Self::Scalar,
        point_table: &Self::Table,
        k2: &Self::Scalar,
    ) -> Self::ProjectivePoint;
}

impl PrecomputedArithmetic for Sm2 {
    type Scalar = Scalar;
    type AffinePoint = AffinePoint;
    type ProjectivePoint = ProjectivePoint;
    type Table = PrecomputedTable;

    fn build_table(base: &AffinePoint) -> PrecomputedTable {
        PrecomputedTable::new(base)
    }

    fn mul_fixed(table: &PrecomputedTable, k: &Scalar) -> ProjectivePoint {
        table.mul(k)
    }

    fn mul_combined(
        generator_table: &PrecomputedTable,
        k1: &Scalar,
        point_table: &PrecomputedTable,
        k2: &Scalar,
    ) -> ProjectivePoint {
        use subtle::ConditionallySelectable;

        let r1 = generator_table.mul(k1);
        let r2 = point_table.mul(k2);

        let (sum, equal) = r1.add_and_check_equal(&r2);
        let mut ret = ProjectivePoint::conditional_select(&sum, &r1.double(), equal);
        ret.conditional_assign(&r1, r2.is_identity());
        ret.conditional_assign(&r2, r1.is_identity());
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AffinePoint, CurveParams, FieldElement, PrecomputedArithmetic, ProjectivePoint, Scalar, Sm2,
    };
    use hex_literal::hex;

    #[test]
    fn equation_coefficients() {
        assert_eq!(
            Sm2::EQUATION_A.to_bytes(),
            hex!("fffffffeffffffffffffffffffffffffffffffff00000000fffffffffffffffc")
        );
        assert_eq!(
            Sm2::EQUATION_B.to_bytes(),
            hex!("28e9fa9e9d9f5e344d5a9e4bcf6509a7f39789f515ab8f92ddbcbd414d940e93")
        );
        assert_eq!(Sm2::EQUATION_A + &FieldElement::from_u64(3), FieldElement::ZERO);
    }

    #[test]
    fn combined_multiplication() {
        let g = Sm2::build_table(&AffinePoint::GENERATOR);
        let q_point = ProjectivePoint::GENERATOR.double();
        let q = Sm2::build_table(&q_point.to_affine());

        let k1 = Scalar::from_u64(5);
        let k2 = Scalar::from_u64(7);
        let expected = ProjectivePoint::GENERATOR * &Scalar::from_u64(19);
        assert_eq!(Sm2::mul_combined(&g, &k1, &q, &k2), expected);

        // equal halves take the doubling path
        let k1 = Scalar::from_u64(4);
        let k2 = Scalar::from_u64(2);
        let expected = ProjectivePoint::GENERATOR * &Scalar::from_u64(8);
        assert_eq!(Sm2::mul_combined(&g, &k1, &q, &k2), expected);

        // opposite halves cancel
        let k2 = -Scalar::from_u64(2);
        assert!(bool::from(Sm2::mul_combined(&g, &k1, &q, &k2).is_identity()));

        // identity halves
        assert_eq!(
            Sm2::mul_combined(&g, &Scalar::ZERO, &q, &Scalar::ONE),
            q_point
        );
        assert_eq!(
            Sm2::mul_combined(&g, &Scalar::ONE, &q, &Scalar::ZERO),
            ProjectivePoint::GENERATOR
        );
    }
}
