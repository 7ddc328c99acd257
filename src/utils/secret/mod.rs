//! Scoped holders for secret group elements and scalars.
//!
//! The pairing library's element types are plain `Copy` values without a
//! `Zeroize` implementation. [`Ephemeral`] owns such a value and overwrites it
//! with a neutral element when dropped, which covers early returns through `?`
//! as well as regular scope exits.
use std::fmt;
use std::ptr;
use std::sync::atomic::{compiler_fence, Ordering};
use rabe_bn::{Fr, Group, Gt, G1, G2};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A value that can be overwritten with a public, neutral element.
pub trait Wipe: Copy {
    fn neutral() -> Self;
}

impl Wipe for Fr {
    fn neutral() -> Self {
        Fr::zero()
    }
}

impl Wipe for G1 {
    fn neutral() -> Self {
        G1::zero()
    }
}

impl Wipe for G2 {
    fn neutral() -> Self {
        G2::zero()
    }
}

impl Wipe for Gt {
    fn neutral() -> Self {
        Gt::one()
    }
}

/// Owns a secret value and wipes it on drop.
pub struct Ephemeral<T: Wipe>(T);

impl<T: Wipe> Ephemeral<T> {
    pub fn new(value: T) -> Self {
        Ephemeral(value)
    }

    /// Borrows the secret. Copies taken from the reference are not tracked.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Wipe> Zeroize for Ephemeral<T> {
    fn zeroize(&mut self) {
        // SAFETY: `self.0` is a valid, aligned and initialized `T`; `T: Copy`
        // so overwriting it without dropping the old value leaks nothing.
        unsafe { ptr::write_volatile(&mut self.0, T::neutral()) };
        compiler_fence(Ordering::SeqCst);
    }
}

impl<T: Wipe> Drop for Ephemeral<T> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<T: Wipe> ZeroizeOnDrop for Ephemeral<T> {}

impl<T: Wipe> fmt::Debug for Ephemeral<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ephemeral(<redacted>)")
    }
}

/// The element masking a plaintext, `e(g1, g2)^(alpha * s)`.
pub type Multiplier = Ephemeral<Gt>;
