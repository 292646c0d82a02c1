#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::checked_conversions,
    clippy::implicit_saturating_sub,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! ## Layout
//!
//! - [`arithmetic`]: Montgomery field and scalar arithmetic, Jacobian point
//!   operations and the 7-bit comb tables behind fixed-base, fixed-point and
//!   combined multiplication.
//! - [`Engine`]: owns the generator table and the [`cache::TableCache`] of
//!   public-key tables; all protocol operations hang off it.
//! - [`dsa`]: SM2DSA signing and verification plus [`signature`] trait
//!   integration.

pub mod arithmetic;
pub mod cache;
pub mod distid;
pub mod dsa;

mod config;
mod engine;
mod error;
mod keys;

pub use crate::{
    arithmetic::{AffinePoint, FieldElement, ProjectivePoint, Scalar, Sm2},
    config::{EngineConfig, DEFAULT_TABLE_CACHE_CAPACITY},
    distid::{identity_digest, message_digest, Hash, DEFAULT_DISTID},
    engine::Engine,
    error::{Error, Result},
    keys::{PrivateKey, PublicKey},
};

pub use {rand_core, signature, subtle};

/// Order of SM2's elliptic curve group (i.e. scalar modulus) serialized as
/// hexadecimal.
///
/// ```text
/// n = FFFFFFFE FFFFFFFF FFFFFFFF FFFFFFFF 7203DF6B 21C6052B 53BBF409 39D54123
/// ```
pub const ORDER_HEX: &str = "fffffffeffffffffffffffffffffffff7203df6b21c6052b53bbf40939d54123";
