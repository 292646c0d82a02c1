//! Support for SM2DSA signing.

use super::{Signature, VerifyingKey};
use crate::{Engine, PrivateKey};
use core::fmt::{self, Debug};
use signature::{
    hazmat::RandomizedPrehashSigner, rand_core::CryptoRngCore, KeypairRef, RandomizedSigner,
    Result,
};
use std::sync::Arc;
use subtle::{Choice, ConstantTimeEq};

#[cfg(feature = "getrandom")]
use signature::{hazmat::PrehashSigner, Signer};

/// SM2DSA secret key used for signing messages and producing signatures.
///
/// ## Usage
///
/// The [`signature`] crate defines the following traits which are the
/// primary API for signing:
///
/// - [`RandomizedSigner`]: sign a message with a caller-provided RNG
/// - `Signer`: sign a message with the OS RNG (`getrandom` feature)
/// - `PrehashSigner`: sign the low-level raw output bytes of a message digest
#[derive(Clone)]
pub struct SigningKey {
    /// Secret key.
    private_key: PrivateKey,

    /// Verifying key for this signing key.
    verifying_key: VerifyingKey,
}

impl SigningKey {
    /// Create signing key from a signer's distinguishing identifier and
    /// private key.
    pub fn new(engine: Arc<Engine>, distid: &[u8], private_key: PrivateKey) -> crate::Result<Self> {
        let verifying_key = VerifyingKey::new(engine, distid, private_key.public_key().clone())?;
        Ok(Self {
            private_key,
            verifying_key,
        })
    }

    /// Parse signing key from a big endian-encoded 32-byte secret scalar.
    pub fn from_bytes(engine: Arc<Engine>, distid: &[u8], bytes: &[u8]) -> crate::Result<Self> {
        let private_key = engine.import_private_key(bytes)?;
        Self::new(engine, distid, private_key)
    }

    /// Generate a random signing key.
    pub fn random(
        engine: Arc<Engine>,
        distid: &[u8],
        rng: &mut impl CryptoRngCore,
    ) -> crate::Result<Self> {
        let private_key = engine.generate_key(rng)?;
        Self::new(engine, distid, private_key)
    }

    /// Serialize as bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.private_key.to_bytes()
    }

    /// Borrow the [`PrivateKey`].
    ///
    /// # ⚠️ Warning
    ///
    /// This value is key material.
    ///
    /// Please treat it with the care it deserves!
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Get the [`VerifyingKey`] which corresponds to this [`SigningKey`].
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Get the distinguishing identifier for this key.
    pub fn distid(&self) -> &[u8] {
        self.verifying_key.distid()
    }
}

//
// `*Signer` trait impls
//

impl RandomizedPrehashSigner<Signature> for SigningKey {
    fn sign_prehash_with_rng(
        &self,
        rng: &mut impl CryptoRngCore,
        prehash: &[u8],
    ) -> Result<Signature> {
        Ok(self
            .verifying_key
            .engine()
            .sign_prehash(&self.private_key, prehash, rng)?)
    }
}

impl RandomizedSigner<Signature> for SigningKey {
    fn try_sign_with_rng(&self, rng: &mut impl CryptoRngCore, msg: &[u8]) -> Result<Signature> {
        // A1: set M~=ZA || M
        let hash = self.verifying_key.hash_msg(msg);
        self.sign_prehash_with_rng(rng, &hash)
    }
}

#[cfg(feature = "getrandom")]
impl PrehashSigner<Signature> for SigningKey {
    fn sign_prehash(&self, prehash: &[u8]) -> Result<Signature> {
        self.sign_prehash_with_rng(&mut rand_core::OsRng, prehash)
    }
}

#[cfg(feature = "getrandom")]
impl Signer<Signature> for SigningKey {
    fn try_sign(&self, msg: &[u8]) -> Result<Signature> {
        self.try_sign_with_rng(&mut rand_core::OsRng, msg)
    }
}

//
// Other trait impls
//

impl AsRef<VerifyingKey> for SigningKey {
    fn as_ref(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

impl ConstantTimeEq for SigningKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.private_key.ct_eq(&other.private_key)
    }
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("verifying_key", &self.verifying_key)
            .finish_non_exhaustive()
    }
}

/// Constant-time comparison
impl Eq for SigningKey {}
impl PartialEq for SigningKey {
    fn eq(&self, other: &SigningKey) -> bool {
        self.ct_eq(other).into()
    }
}

impl KeypairRef for SigningKey {
    type VerifyingKey = VerifyingKey;
}
