//! Scoped containers for secret key material.
//!
//! A [`Key`] owns exactly `N` secret bytes for the time between their
//! creation and their consumption by a primitive constructor. The container
//! enforces the ownership rules that make accidental key duplication
//! impossible to write:
//!
//! * a `Key` can be moved, but neither copied nor cloned;
//! * constructing a `Key` from a buffer *takes* the bytes and wipes the
//!   source, so the caller is not left holding a second copy;
//! * the contents can only be revealed once, to a primitive inside this
//!   crate, by consuming the `Key`;
//! * on every exit path the contents are zeroed before the memory is
//!   released.

use std::fmt::{self, Debug};

use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::random;

/// An owner of exactly `N` secret bytes, wiped on release.
pub struct Key<const N: usize> {
    // `None` only after the key has been consumed by a primitive.
    bytes: Option<Zeroizing<[u8; N]>>,
}

impl<const N: usize> Key<N> {
    /// Number of bytes held by this key type.
    pub const SIZE: usize = N;

    /// Create a key filled with fresh randomness.
    pub fn random() -> Self {
        let mut bytes = Zeroizing::new([0u8; N]);
        random::fill_random(bytes.as_mut());
        Self { bytes: Some(bytes) }
    }

    /// Take ownership of the bytes in `source`.
    ///
    /// On success `source` is zeroed: the secret has been *transferred*,
    /// not copied. Fails with [`Error::InvalidLength`] if `source` is not
    /// exactly `N` bytes long, in which case `source` is left untouched.
    pub fn from_slice(source: &mut [u8]) -> Result<Self> {
        if source.len() != N {
            return Err(Error::InvalidLength);
        }
        let mut bytes = Zeroizing::new([0u8; N]);
        bytes.copy_from_slice(source);
        random::secure_zero(source);
        Ok(Self { bytes: Some(bytes) })
    }

    /// Reveal the key bytes, consuming the key.
    ///
    /// This is the single-use handover to a primitive constructor; it is
    /// deliberately not part of the public API.
    pub(crate) fn expose(mut self) -> Zeroizing<[u8; N]> {
        self.bytes.take().expect("a live key always holds its bytes")
    }
}

impl<const N: usize> Debug for Key<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        write!(f, "Key<{}>(..)", N)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_slice_wipes_the_source() {
        let mut source = [0xA5u8; 32];
        let _key = Key::<32>::from_slice(&mut source).unwrap();
        assert_eq!(source, [0u8; 32]);
    }

    #[test]
    fn from_slice_rejects_wrong_lengths() {
        let mut short = [0xA5u8; 31];
        assert!(matches!(
            Key::<32>::from_slice(&mut short),
            Err(Error::InvalidLength)
        ));
        // A failed transfer leaves the source alone.
        assert_eq!(short, [0xA5u8; 31]);

        let mut long = [0xA5u8; 33];
        assert!(matches!(
            Key::<32>::from_slice(&mut long),
            Err(Error::InvalidLength)
        ));
    }

    #[test]
    fn expose_returns_the_transferred_bytes() {
        let mut source = [0x42u8; 16];
        let key = Key::<16>::from_slice(&mut source).unwrap();
        assert_eq!(*key.expose(), [0x42u8; 16]);
    }

    #[test]
    fn random_keys_differ() {
        assert_ne!(*Key::<32>::random().expose(), *Key::<32>::random().expose());
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = Key::<32>::random();
        assert_eq!(format!("{key:?}"), "Key<32>(..)");
    }
}
