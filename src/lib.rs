//! `waters-abe` is a rust library implementing the Waters08 Ciphertext-Policy
//! Attribute Based Encryption scheme over linear secret sharing matrices.
//!
//! * Developped by Brent Waters, see [`schemes::waters08`]
//! * Pairings: BN254 via [`rabe_bn`], `e: G1 × G2 → Gt`
//!
//! Policies are monotone AND/OR trees ([`utils::policy::AccessPolicy`] over
//! attribute names or [`utils::policy::msp::AccessTree`] over attribute ids)
//! compiled into [`utils::policy::msp::ShareGeneratingMatrix`] values.
//!
//! The library does not install a `tracing` subscriber.
pub mod error;
pub mod schemes;
pub mod utils;

pub use error::{AbeError, Result};
