//! Key pairs and raw key import/export.

use crate::{
    arithmetic::{scalar::ORDER_MINUS_ONE, AffinePoint, PrecomputedTable, ProjectivePoint, Scalar},
    cache::Fingerprint,
    Engine, Error, Result,
};
use rand_core::CryptoRngCore;
use std::{
    fmt,
    sync::{Arc, OnceLock},
};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// Tag byte of the uncompressed SEC1 point encoding.
const UNCOMPRESSED_TAG: u8 = 0x04;

/// SM2 public key: a non-identity curve point.
///
/// A key may carry its own comb table. Once attached the table is never
/// replaced, and table cache eviction does not affect it.
#[derive(Clone)]
pub struct PublicKey {
    point: AffinePoint,
    table: OnceLock<Arc<PrecomputedTable>>,
}

impl PublicKey {
    /// Wrap an affine point, rejecting the identity.
    pub fn from_affine(point: AffinePoint) -> Result<Self> {
        if bool::from(point.is_identity()) {
            return Err(Error::InvalidInput("public key is the point at infinity"));
        }

        Ok(Self {
            point,
            table: OnceLock::new(),
        })
    }

    /// Parse a raw public key: 64 bytes of `X || Y`, or 65 bytes with a
    /// leading `0x04` tag.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let coordinates = match bytes.len() {
            0 => return Err(Error::InvalidInput("empty public key")),
            64 => bytes,
            65 if bytes[0] == UNCOMPRESSED_TAG => &bytes[1..],
            65 => return Err(Error::InvalidInput("unsupported public key encoding")),
            _ => return Err(Error::InvalidInput("public key must be 64 or 65 bytes")),
        };

        let mut buf = [0u8; 64];
        buf.copy_from_slice(coordinates);

        let point = Option::<AffinePoint>::from(AffinePoint::from_bytes(&buf))
            .ok_or(Error::InvalidInput("public key is not a valid curve point"))?;

        Self::from_affine(point)
    }

    /// Serialize as 64 bytes of big-endian `X || Y`.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.point.to_bytes()
    }

    /// Serialize with the leading `0x04` tag.
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0] = UNCOMPRESSED_TAG;
        bytes[1..].copy_from_slice(&self.point.to_bytes());
        bytes
    }

    /// Key used by the table cache.
    pub fn fingerprint(&self) -> Fingerprint {
        self.to_bytes()
    }

    /// Borrow the inner [`AffinePoint`].
    pub fn as_affine(&self) -> &AffinePoint {
        &self.point
    }

    /// Convert to a [`ProjectivePoint`].
    pub fn to_projective(&self) -> ProjectivePoint {
        self.point.into()
    }

    /// The comb table attached to this key, if any.
    pub fn attached_table(&self) -> Option<&Arc<PrecomputedTable>> {
        self.table.get()
    }

    /// Attach `table` unless a table is already attached; returns the
    /// attached table.
    pub(crate) fn attach_table(&self, table: Arc<PrecomputedTable>) -> &Arc<PrecomputedTable> {
        self.table.get_or_init(|| table)
    }
}

impl AsRef<AffinePoint> for PublicKey {
    fn as_ref(&self) -> &AffinePoint {
        self.as_affine()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("point", &self.point)
            .field("has_table", &self.table.get().is_some())
            .finish()
    }
}

impl Eq for PublicKey {}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point
    }
}

/// SM2 private key.
///
/// Holds the secret scalar `d ∈ [1, n-2]`, the signing constant
/// `(1 + d)^-1 mod n` and the public key `d·G`. Secret scalars are zeroized
/// on drop.
#[derive(Clone)]
pub struct PrivateKey {
    d: Scalar,
    d_inv: Scalar,
    public_key: PublicKey,
}

impl PrivateKey {
    /// Serialize the secret scalar as 32 big-endian bytes.
    ///
    /// # ⚠️ Warning
    ///
    /// This value is key material.
    ///
    /// Please treat it with the care it deserves!
    pub fn to_bytes(&self) -> [u8; 32] {
        self.d.to_bytes()
    }

    /// Borrow the secret scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.d
    }

    /// Get the corresponding [`PublicKey`].
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// `(1 + d)^-1 mod n`.
    pub(crate) fn d_inv(&self) -> &Scalar {
        &self.d_inv
    }
}

impl ConstantTimeEq for PrivateKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.d.ct_eq(&other.d)
    }
}

/// Constant-time comparison
impl Eq for PrivateKey {}
impl PartialEq for PrivateKey {
    fn eq(&self, other: &PrivateKey) -> bool {
        self.ct_eq(other).into()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.d.zeroize();
        self.d_inv.zeroize();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Generate a key pair with `d` drawn uniformly from `[1, n-2]`.
    ///
    /// Fails only if `rng` fails.
    pub fn generate_key(&self, rng: &mut impl CryptoRngCore) -> Result<PrivateKey> {
        let d = Scalar::try_from_rng_below(rng, &ORDER_MINUS_ONE)?;
        self.private_key_from_scalar(d)
    }

    /// Generate a key pair using the operating system's RNG.
    #[cfg(feature = "getrandom")]
    pub fn generate_key_os(&self) -> Result<PrivateKey> {
        self.generate_key(&mut rand_core::OsRng)
    }

    /// Import a private key from its 32-byte big-endian scalar.
    pub fn import_private_key(&self, bytes: &[u8]) -> Result<PrivateKey> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("empty private key"));
        }

        let bytes: &[u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidInput("private key must be 32 bytes"))?;

        let d = Option::<Scalar>::from(Scalar::from_bytes(bytes))
            .ok_or(Error::InvalidInput("private key out of range"))?;

        self.private_key_from_scalar(d)
    }

    /// Derive the key pair for the secret scalar `d`.
    ///
    /// `d` must lie in `[1, n-2]` so that `1 + d` is invertible.
    pub fn private_key_from_scalar(&self, d: Scalar) -> Result<PrivateKey> {
        let d_plus_one = d + &Scalar::ONE;
        if bool::from(d.is_zero() | d_plus_one.is_zero()) {
            return Err(Error::InvalidInput("private key out of range"));
        }

        let point = self.mul_base(&d).to_affine();
        let public_key = PublicKey::from_affine(point)?;

        if self.config().cache_generated_keys {
            let table = self.build_public_key_table(&public_key);
            public_key.attach_table(table);
        }

        Ok(PrivateKey {
            d,
            d_inv: d_plus_one.invert_unchecked(),
            public_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PublicKey;
    use crate::{arithmetic::AffinePoint, Engine, EngineConfig, Error};
    use hex_literal::hex;

    const G_BYTES: [u8; 64] = hex!(
        "32c4ae2c1f1981195f9904466a39c9948fe30bbff2660be1715a4589334c74c7"
        "bc3736a2f4f6779c59bdcee36b692153d0a9877cc62a474002df32e52139f0a0"
    );

    #[test]
    fn public_key_encodings() {
        let pk = PublicKey::from_bytes(&G_BYTES).unwrap();
        assert_eq!(pk.as_affine(), &AffinePoint::GENERATOR);
        assert_eq!(pk.to_bytes(), G_BYTES);

        let uncompressed = pk.to_uncompressed();
        assert_eq!(uncompressed[0], 0x04);
        assert_eq!(PublicKey::from_bytes(&uncompressed).unwrap(), pk);
    }

    #[test]
    fn public_key_rejects_malformed() {
        assert_eq!(
            PublicKey::from_bytes(&[]).unwrap_err(),
            Error::InvalidInput("empty public key")
        );
        assert!(PublicKey::from_bytes(&G_BYTES[..63]).is_err());

        let mut compressed = [0u8; 65];
        compressed[0] = 0x02;
        compressed[1..].copy_from_slice(&G_BYTES);
        assert!(PublicKey::from_bytes(&compressed).is_err());

        let mut off_curve = G_BYTES;
        off_curve[40] ^= 0x10;
        assert!(PublicKey::from_bytes(&off_curve).is_err());

        assert!(PublicKey::from_affine(AffinePoint::IDENTITY).is_err());
    }

    #[test]
    fn private_key_import() {
        let engine = Engine::new(EngineConfig::default().with_cache_generated_keys(false));

        let mut one = [0u8; 32];
        one[31] = 1;
        let key = engine.import_private_key(&one).unwrap();
        assert_eq!(key.public_key().to_bytes(), G_BYTES);
        assert_eq!(key.to_bytes(), one);
        assert!(key.public_key().attached_table().is_none());

        assert!(engine.import_private_key(&[]).is_err());
        assert!(engine.import_private_key(&one[1..]).is_err());
        assert!(engine.import_private_key(&[0u8; 32]).is_err());

        // n - 1 has no (1 + d) inverse, n is not canonical
        let n_minus_one = hex!("fffffffeffffffffffffffffffffffff7203df6b21c6052b53bbf40939d54122");
        let n = hex!("fffffffeffffffffffffffffffffffff7203df6b21c6052b53bbf40939d54123");
        assert!(engine.import_private_key(&n_minus_one).is_err());
        assert!(engine.import_private_key(&n).is_err());
    }

    #[test]
    fn generated_keys_carry_tables() {
        let engine = Engine::default();
        let key = engine.generate_key(&mut rand_core::OsRng).unwrap();

        assert!(key.public_key().attached_table().is_some());
        assert!(engine.cache().contains(&key.public_key().fingerprint()));
    }
}
