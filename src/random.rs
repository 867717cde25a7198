//! Access to the process-wide randomness source.
//!
//! Every component of this crate obtains fresh randomness exclusively
//! through this module, so that the choice of generator is made in exactly
//! one place. The generator is the operating system RNG, which is safe
//! under concurrent draws; there is no per-instance counter anywhere in the
//! crate, so reordering concurrent draws is benign.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

/// Return `len` uniformly random bytes.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    fill_random(&mut bytes);
    bytes
}

/// Fill `buf` with uniformly random bytes.
pub fn fill_random(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

/// Overwrite `buf` with zeros.
///
/// The write is guaranteed not to be elided by the optimizer, so this is
/// suitable for wiping buffers that held secret material.
pub fn secure_zero(buf: &mut [u8]) {
    buf.zeroize();
}
