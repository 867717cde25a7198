//! Cryptographic building blocks for searchable-encryption protocols.
//!
//! # ⚠️ Warning: Cryptographic Hazmat ☣️
//!
//! This crate provides low-level primitives meant to be composed by a
//! higher-level protocol. It has *not* been audited, it is *not* battle
//! tested, and *nobody* claims it to be secure.
//!
//! Use it at **your own risk** and if you know what you are doing!
//!
//! # Introduction
//!
//! Searchable-encryption schemes are assembled from a small set of
//! primitives with unusually precise contracts: a stateless authenticated
//! cipher whose nonce is wide enough to be drawn at random, a keyed
//! pseudorandom function whose output length is fixed per instance, and a
//! trapdoor permutation that can be inverted several steps at a time. This
//! crate implements exactly that set, with secret material handled through
//! move-only [`Key`] containers that are wiped on every exit path.
//!
//! # Crate Structure
//!
//! The [`cipher`] module provides [`Cipher`], ChaCha20-Poly1305 behind a
//! 128-bit random nonce (the extra nonce width comes from a nonce-derived
//! sub-key). The [`prf`] module provides [`Prf`], a variable-output PRF
//! over HMAC-SHA-512. The [`tdp`] module provides the RSA trapdoor
//! permutation: [`Tdp`] for the forward direction, [`TdpInverse`] for the
//! trapdoor (including multi-step inversion), and [`TdpMultPool`] for a
//! family of public keys with exponents e, e², …, eˢ.
//!
//! Secret bytes enter through [`Key`] and are consumed exactly once by a
//! primitive constructor; the [`random`] module is the single source of
//! fresh randomness for the whole crate. Errors are reported through the
//! stable [`Error`] kinds and never retried or logged.
//!
//! Every primitive evaluates through `&self` with per-call scratch, so
//! instances can be shared across threads without locks.
//!
//! ```
//! use ssecrypt::{Cipher, Key};
//!
//! let cipher = Cipher::new(Key::random());
//! let ciphertext = cipher.encrypt(b"rendezvous at dawn")?;
//! assert_eq!(cipher.decrypt(&ciphertext)?, b"rendezvous at dawn");
//! # Ok::<(), ssecrypt::Error>(())
//! ```
pub mod cipher;
pub mod error;
pub mod key;
pub mod prf;
pub mod random;
pub mod tdp;

pub use cipher::Cipher;
pub use error::{Error, Result};
pub use key::Key;
pub use prf::Prf;
pub use tdp::{Tdp, TdpInverse, TdpMultPool};

/// A trait to provide byte-level access to objects.
pub trait ByteAccess {
    /// Provides access to the bytes.
    ///
    /// Unlike [`AsRef`], there are no statements made about the performance
    /// of this operation. This operation will allocate a fresh vector, and
    /// the byte representation may or may not have to be computed first.
    /// Types holding secret material expose their *public* representation
    /// here, never the secret itself.
    fn bytes(&self) -> Vec<u8>;

    /// Provide a short fingerprint of the bytes.
    ///
    /// This can be used to "summarize" long keys when displaying them, to
    /// still provide distinguishing features but to not print out the
    /// whole key.
    ///
    /// By default, this method uses the first 16 bytes of the
    /// [`ByteAccess::bytes`] representation, and formats them as a hex
    /// string.
    fn fingerprint(&self) -> String {
        hex::encode(&self.bytes()[..16])
    }
}
