//! This is the documentation for all schemes
//!
//! Currently those are:
//! * Waters08 CP-ABE
//!
pub mod waters08;
