//! `groundwork-jwt`: bearer token signing and verification.
//!
//! A [`TokenManager`] binds one [`SigningAlgorithm`] to one key pair and
//! mints/verifies compact JWTs carrying [`Claims`]. Signing, verification and
//! PEM parsing are delegated to `jsonwebtoken`; this crate only picks the key
//! parser for the algorithm family and maps failures onto [`TokenError`].
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod algorithm;
pub mod claims;
pub mod config;
pub mod error;
mod keys;
pub mod manager;

pub use algorithm::{AlgorithmFamily, SigningAlgorithm};
pub use claims::{Claims, now_seconds};
pub use config::{KeyConfig, MAX_LEEWAY_SECS, ValidationConfig};
pub use error::{KeyHalf, TokenError, TokenResult};
pub use manager::{TokenManager, UnsignedToken, VerifiedToken};
