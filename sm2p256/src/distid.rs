//! Distinguishing identifier support.

use crate::{
    arithmetic::{CurveParams, Sm2},
    Error, PublicKey, Result,
};
use sm3::{Digest, Sm3};

/// SM3 digest output.
pub type Hash = [u8; 32];

/// Identifier used when the caller supplies none (or an empty one).
pub const DEFAULT_DISTID: &[u8] = b"1234567812345678";

/// Longest identifier whose bit length fits the 16-bit `ENTL` field.
pub const MAX_DISTID_LEN: usize = 8191;

/// Resolve the identifier actually hashed: absent or empty means the default.
pub(crate) fn resolve(distid: Option<&[u8]>) -> &[u8] {
    match distid {
        Some(id) if !id.is_empty() => id,
        _ => DEFAULT_DISTID,
    }
}

/// Compute user information hash `Z` according to [draft-shen-sm2-ecdsa § 5.1.4.4].
///
/// ```text
/// ZA=H256(ENTLA || IDA || a || b || xG || yG || xA || yA)
/// ```
///
/// [draft-shen-sm2-ecdsa § 5.1.4.4]: https://datatracker.ietf.org/doc/html/draft-shen-sm2-ecdsa-02#section-5.1.4.4
pub fn identity_digest(public_key: &PublicKey, distid: Option<&[u8]>) -> Result<Hash> {
    let distid = resolve(distid);

    let entla: u16 = distid
        .len()
        .checked_mul(8)
        .and_then(|l| l.try_into().ok())
        .ok_or(Error::InvalidInput("distinguishing identifier too long"))?;

    let mut sm3 = Sm3::new();
    sm3.update(entla.to_be_bytes());
    sm3.update(distid);
    sm3.update(Sm2::EQUATION_A.to_bytes());
    sm3.update(Sm2::EQUATION_B.to_bytes());
    sm3.update(Sm2::GENERATOR.0.to_bytes());
    sm3.update(Sm2::GENERATOR.1.to_bytes());
    sm3.update(public_key.to_bytes());

    Ok(to_hash(sm3))
}

/// Compute message hash `e = H256(Z || M)` according to [draft-shen-sm2-ecdsa § 5.2.1].
///
/// [draft-shen-sm2-ecdsa § 5.2.1]: https://datatracker.ietf.org/doc/html/draft-shen-sm2-ecdsa-02#section-5.2.1
pub fn message_digest(public_key: &PublicKey, msg: &[u8], distid: Option<&[u8]>) -> Result<Hash> {
    let z = identity_digest(public_key, distid)?;
    Ok(digest_with_identity(&z, msg))
}

/// Compute `e = H256(Z || M)` for a precomputed `Z`.
pub(crate) fn digest_with_identity(z: &Hash, msg: &[u8]) -> Hash {
    to_hash(Sm3::new_with_prefix(z).chain_update(msg))
}

fn to_hash(sm3: Sm3) -> Hash {
    let mut hash = Hash::default();
    hash.copy_from_slice(&sm3.finalize());
    hash
}
