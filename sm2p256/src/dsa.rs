//! SM2 Digital Signature Algorithm (SM2DSA) as defined in [draft-shen-sm2-ecdsa § 5].
//!
//! The protocol lives on [`Engine`]: [`Engine::sign`] and [`Engine::verify`]
//! take raw keys and an optional distinguishing identifier. [`SigningKey`]
//! and [`VerifyingKey`] bind a key to an identifier and an engine and expose
//! the [`signature`] crate traits.
//!
//! ## Usage
//!
#![cfg_attr(feature = "getrandom", doc = "```")]
#![cfg_attr(not(feature = "getrandom"), doc = "```ignore")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use sm2p256::{
//!     dsa::{signature::{Signer, Verifier}, Signature, SigningKey, VerifyingKey},
//!     Engine,
//! };
//! use std::sync::Arc;
//!
//! let engine = Arc::new(Engine::default());
//! let distid = b"example@rustcrypto.org"; // distinguishing identifier
//!
//! // Signing
//! let private_key = engine.generate_key_os()?;
//! let signing_key = SigningKey::new(Arc::clone(&engine), distid, private_key)?;
//! let verifying_key_bytes = signing_key.verifying_key().public_key().to_bytes();
//! let message = b"test message";
//! let signature: Signature = signing_key.sign(message);
//!
//! // Verifying
//! let verifying_key = VerifyingKey::from_bytes(engine, distid, &verifying_key_bytes)?;
//! verifying_key.verify(message, &signature)?;
//! # Ok(())
//! # }
//! ```
//!
//! [draft-shen-sm2-ecdsa § 5]: https://datatracker.ietf.org/doc/html/draft-shen-sm2-ecdsa-02#section-5

mod signing;
mod verifying;

pub use signature;

pub use self::{signing::SigningKey, verifying::VerifyingKey};

use crate::{
    arithmetic::{PrecomputedArithmetic, Scalar, Sm2},
    distid, Engine, Error, PrivateKey, PublicKey, Result,
};
use core::fmt::{self, Debug};
use rand_core::CryptoRngCore;
use signature::SignatureEncoding;

/// SM2DSA signature serialized as bytes.
pub type SignatureBytes = [u8; Signature::BYTE_SIZE];

/// SM2DSA signature: the big-endian `r` and `s` values.
///
/// Parsing does not range-check the components; out-of-range values simply
/// fail verification.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    /// Size of an encoded SM2DSA signature in bytes.
    pub const BYTE_SIZE: usize = 64;

    /// Parse an SM2DSA signature from a byte array.
    pub fn from_bytes(bytes: &SignatureBytes) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self { r, s }
    }

    /// Parse an SM2DSA signature from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes = SignatureBytes::try_from(bytes)
            .map_err(|_| Error::InvalidInput("signature must be 64 bytes"))?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Create a [`Signature`] from the serialized `r` and `s` values.
    pub fn from_components(r: [u8; 32], s: [u8; 32]) -> Self {
        Self { r, s }
    }

    fn from_scalars(r: &Scalar, s: &Scalar) -> Self {
        Self {
            r: r.to_bytes(),
            s: s.to_bytes(),
        }
    }

    /// Serialize this signature as bytes.
    pub fn to_bytes(&self) -> SignatureBytes {
        let mut ret = [0; Self::BYTE_SIZE];
        let (r_bytes, s_bytes) = ret.split_at_mut(Self::BYTE_SIZE / 2);
        r_bytes.copy_from_slice(&self.r);
        s_bytes.copy_from_slice(&self.s);
        ret
    }

    /// Bytes for the `r` component of a signature.
    pub fn r_bytes(&self) -> [u8; 32] {
        self.r
    }

    /// Bytes for the `s` component of a signature.
    pub fn s_bytes(&self) -> [u8; 32] {
        self.s
    }

    /// Decode `r` and `s`, returning `None` unless both lie in `[1, n-1]`.
    pub fn split_scalars(&self) -> Option<(Scalar, Scalar)> {
        let r = Option::<Scalar>::from(Scalar::from_bytes(&self.r))?;
        let s = Option::<Scalar>::from(Scalar::from_bytes(&self.s))?;

        if bool::from(r.is_zero() | s.is_zero()) {
            return None;
        }

        Some((r, s))
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sm2p256::dsa::Signature(")?;

        for byte in self.to_bytes() {
            write!(f, "{:02X}", byte)?;
        }

        write!(f, ")")
    }
}

impl From<Signature> for SignatureBytes {
    fn from(signature: Signature) -> SignatureBytes {
        signature.to_bytes()
    }
}

impl From<&Signature> for SignatureBytes {
    fn from(signature: &Signature) -> SignatureBytes {
        signature.to_bytes()
    }
}

impl From<SignatureBytes> for Signature {
    fn from(bytes: SignatureBytes) -> Signature {
        Signature::from_bytes(&bytes)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = signature::Error;

    fn try_from(bytes: &[u8]) -> signature::Result<Signature> {
        Ok(Signature::from_slice(bytes)?)
    }
}

impl SignatureEncoding for Signature {
    type Repr = SignatureBytes;

    fn to_bytes(&self) -> Self::Repr {
        self.into()
    }

    fn encoded_len(&self) -> usize {
        Self::BYTE_SIZE
    }
}

/// Decode a 32-byte digest `e` as a scalar.
fn prehash_scalar(prehash: &[u8]) -> Result<Scalar> {
    let prehash: &[u8; 32] = prehash
        .try_into()
        .map_err(|_| Error::InvalidInput("prehash must be 32 bytes"))?;

    Ok(Scalar::reduce_bytes(prehash))
}

impl Engine {
    /// Sign `msg` on behalf of `key`.
    ///
    /// `distid` defaults to [`DEFAULT_DISTID`](crate::DEFAULT_DISTID) when
    /// absent or empty; verifiers must use the same identifier.
    ///
    /// ```text
    /// A1: set M~=ZA || M
    /// A2: calculate e=Hv(M~)
    /// ```
    pub fn sign(
        &self,
        key: &PrivateKey,
        msg: &[u8],
        distid: Option<&[u8]>,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Signature> {
        let e = distid::message_digest(key.public_key(), msg, distid)?;
        self.sign_prehash(key, &e, rng)
    }

    /// Sign a precomputed 32-byte digest `e = H256(Z || M)`.
    ///
    /// ```text
    /// A3: pick a random number k in [1, n-1] via a random number generator
    /// A4: calculate the elliptic curve point (x1, y1)=[k]G
    /// A5: calculate r=(e+x1) modn, return to A3 if r=0 or r+k=n
    /// A6: calculate s=((1+dA)^(-1)*(k-r*dA)) modn, return to A3 if s=0
    /// A7: the digital signature of M is (r, s)
    /// ```
    pub fn sign_prehash(
        &self,
        key: &PrivateKey,
        prehash: &[u8],
        rng: &mut impl CryptoRngCore,
    ) -> Result<Signature> {
        let e = prehash_scalar(prehash)?;

        loop {
            // A3
            let k = Scalar::try_from_rng_nonzero(rng)?;

            // A4
            let x1 = self.mul_base(&k).to_affine().x();

            // A5
            let r = e + &Scalar::reduce_bytes(&x1.to_bytes());
            if bool::from(r.is_zero() | (r + &k).is_zero()) {
                tracing::trace!("degenerate r, drawing a new nonce");
                continue;
            }

            // A6
            let s = *key.d_inv() * &(k - &(r * key.as_scalar()));
            if bool::from(s.is_zero()) {
                tracing::trace!("degenerate s, drawing a new nonce");
                continue;
            }

            // A7
            return Ok(Signature::from_scalars(&r, &s));
        }
    }

    /// Verify `signature` over `msg` against `public_key`.
    ///
    /// Returns `Ok(false)` for any signature which does not verify, including
    /// out-of-range components. Errors are reserved for malformed inputs such
    /// as an over-long identifier.
    ///
    /// ```text
    /// B3: set M'~=ZA || M'
    /// B4: calculate e'=Hv(M'~)
    /// ```
    pub fn verify(
        &self,
        public_key: &PublicKey,
        msg: &[u8],
        distid: Option<&[u8]>,
        signature: &Signature,
    ) -> Result<bool> {
        let e = distid::message_digest(public_key, msg, distid)?;
        self.verify_prehash(public_key, &e, signature)
    }

    /// Verify `signature` over a precomputed 32-byte digest.
    ///
    /// ```text
    /// B1: verify whether r' in [1,n-1], verification failed if not
    /// B2: verify whether s' in [1,n-1], verification failed if not
    /// B5: calculate t = (r' + s') modn, verification failed if t=0
    /// B6: calculate the point (x1', y1')=[s']G + [t]PA
    /// B7: calculate R=(e'+x1') modn, verification pass if yes, otherwise failed
    /// ```
    pub fn verify_prehash(
        &self,
        public_key: &PublicKey,
        prehash: &[u8],
        signature: &Signature,
    ) -> Result<bool> {
        let e = prehash_scalar(prehash)?;

        // B1, B2
        let Some((r, s)) = signature.split_scalars() else {
            tracing::debug!("signature component out of range");
            return Ok(false);
        };

        // B5
        let t = r + &s;
        if bool::from(t.is_zero()) {
            tracing::debug!("signature rejected: r + s = 0");
            return Ok(false);
        }

        // B6
        let table = self.public_key_table(public_key)?;
        let point = Sm2::mul_combined(self.generator_table(), &s, &table, &t);
        if bool::from(point.is_identity()) {
            tracing::debug!("signature rejected: combined point is the identity");
            return Ok(false);
        }

        // B7
        let x1 = point.to_affine().x();
        Ok(e + &Scalar::reduce_bytes(&x1.to_bytes()) == r)
    }
}

#[cfg(test)]
mod tests {
    use super::Signature;
    use hex_literal::hex;

    #[test]
    fn signature_ranges() {
        let n = hex!("fffffffeffffffffffffffffffffffff7203df6b21c6052b53bbf40939d54123");
        let mut one = [0u8; 32];
        one[31] = 1;

        assert!(Signature::from_components(one, one).split_scalars().is_some());
        assert!(Signature::from_components([0; 32], one).split_scalars().is_none());
        assert!(Signature::from_components(one, [0; 32]).split_scalars().is_none());
        assert!(Signature::from_components(n, one).split_scalars().is_none());
        assert!(Signature::from_components(one, n).split_scalars().is_none());
    }

    #[test]
    fn byte_layout() {
        let bytes: [u8; 64] = core::array::from_fn(|i| i as u8);
        let sig = Signature::from_bytes(&bytes);
        assert_eq!(sig.r_bytes()[0], 0);
        assert_eq!(sig.s_bytes()[0], 32);
        assert_eq!(sig.to_bytes(), bytes);
        assert_eq!(Signature::from_slice(&bytes).unwrap(), sig);
        assert!(Signature::from_slice(&bytes[1..]).is_err());
    }
}
