//! Support for verifying SM2DSA signatures.

use super::Signature;
use crate::{
    arithmetic::AffinePoint,
    distid::{self, Hash},
    Engine, PublicKey,
};
use signature::{hazmat::PrehashVerifier, Error, Result, Verifier};
use std::sync::Arc;

/// SM2DSA public key used for verifying signatures are valid for a given
/// message.
///
/// Binds the key to the signer's distinguishing identifier (and the identity
/// hash `Z` derived from it) and to the [`Engine`] whose tables serve the
/// verification.
///
/// ## Usage
///
/// The [`signature`] crate defines the following traits which are the
/// primary API for verifying:
///
/// - [`Verifier`]: verify a message against a provided key and signature
/// - [`PrehashVerifier`]: verify the low-level raw output bytes of a message digest
#[derive(Clone, Debug)]
pub struct VerifyingKey {
    engine: Arc<Engine>,

    /// Signer's public key.
    public_key: PublicKey,

    /// Signer's user information hash `Z`.
    identity_hash: Hash,

    /// Distinguishing identifier used to compute `Z`.
    distid: Vec<u8>,
}

impl VerifyingKey {
    /// Initialize [`VerifyingKey`] from a signer's distinguishing identifier
    /// and public key. An empty identifier selects the default one.
    pub fn new(engine: Arc<Engine>, distid: &[u8], public_key: PublicKey) -> crate::Result<Self> {
        let identity_hash = distid::identity_digest(&public_key, Some(distid))?;

        Ok(Self {
            engine,
            public_key,
            identity_hash,
            distid: distid::resolve(Some(distid)).to_vec(),
        })
    }

    /// Initialize [`VerifyingKey`] from a raw 64- or 65-byte public key.
    pub fn from_bytes(engine: Arc<Engine>, distid: &[u8], bytes: &[u8]) -> crate::Result<Self> {
        Self::new(engine, distid, PublicKey::from_bytes(bytes)?)
    }

    /// Borrow the inner [`AffinePoint`] for this public key.
    pub fn as_affine(&self) -> &AffinePoint {
        self.public_key.as_affine()
    }

    /// Borrow the [`PublicKey`].
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Get the distinguishing identifier for this key.
    pub fn distid(&self) -> &[u8] {
        &self.distid
    }

    /// The user information hash `Z`.
    pub fn identity_hash(&self) -> &Hash {
        &self.identity_hash
    }

    /// Borrow the engine serving this key.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Compute message hash `e` according to [draft-shen-sm2-ecdsa § 5.2.1]
    ///
    /// [draft-shen-sm2-ecdsa § 5.2.1]: https://datatracker.ietf.org/doc/html/draft-shen-sm2-ecdsa-02#section-5.2.1
    pub(crate) fn hash_msg(&self, msg: &[u8]) -> Hash {
        distid::digest_with_identity(&self.identity_hash, msg)
    }
}

//
// `*Verifier` trait impls
//

impl PrehashVerifier<Signature> for VerifyingKey {
    fn verify_prehash(&self, prehash: &[u8], signature: &Signature) -> Result<()> {
        if self
            .engine
            .verify_prehash(&self.public_key, prehash, signature)?
        {
            Ok(())
        } else {
            Err(Error::new())
        }
    }
}

impl Verifier<Signature> for VerifyingKey {
    fn verify(&self, msg: &[u8], signature: &Signature) -> Result<()> {
        let hash = self.hash_msg(msg);
        self.verify_prehash(&hash, signature)
    }
}

//
// Other trait impls
//

impl AsRef<AffinePoint> for VerifyingKey {
    fn as_ref(&self) -> &AffinePoint {
        self.as_affine()
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(verifying_key: VerifyingKey) -> PublicKey {
        verifying_key.public_key
    }
}

impl From<&VerifyingKey> for PublicKey {
    fn from(verifying_key: &VerifyingKey) -> PublicKey {
        verifying_key.public_key.clone()
    }
}

impl Eq for VerifyingKey {}

impl PartialEq for VerifyingKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key && self.distid == other.distid
    }
}
