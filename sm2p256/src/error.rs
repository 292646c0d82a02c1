//! Error types.

use core::fmt::{self, Display};

/// Engine errors.
///
/// Verification failure is not an error: [`Engine::verify`](crate::Engine::verify)
/// reports it as `Ok(false)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Malformed or out-of-range input: key bytes of the wrong length, points
    /// off the curve, scalars outside their range, over-long identifiers.
    InvalidInput(&'static str),

    /// The random number generator failed.
    Randomness,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(reason) => write!(f, "invalid input: {reason}"),
            Error::Randomness => f.write_str("random number generator failure"),
        }
    }
}

impl std::error::Error for Error {}

impl From<rand_core::Error> for Error {
    fn from(_: rand_core::Error) -> Error {
        Error::Randomness
    }
}

impl From<Error> for signature::Error {
    fn from(err: Error) -> signature::Error {
        signature::Error::from_source(err)
    }
}

/// Result type with the `sm2p256` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
