//! Building blocks shared by the schemes
//!
//! Currently those are:
//! aes
//! file
//! hash
//! policy
//! random
//! secret
//! secretsharing
//! tools
//!
pub mod aes;
pub mod file;
pub mod hash;
pub mod policy;
pub mod random;
pub mod secret;
pub mod secretsharing;
pub mod tools;
