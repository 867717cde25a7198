//! Authenticated encryption with a 128-bit random nonce.
//!
//! The underlying AEAD is ChaCha20-Poly1305, which natively takes a 96-bit
//! nonce. Drawing 96-bit nonces at random is not comfortable for a
//! primitive that must stay stateless, so [`Cipher`] widens the nonce to
//! 128 bits with a nonce-derived key: each encryption samples a fresh
//! 16-byte nonce, derives a one-shot sub-key and sub-nonce from it with
//! HMAC-SHA-512, and runs the AEAD under those. An attacker would have to
//! collide the full 128-bit nonce to see a (key, nonce) pair reused, so
//! nonces can be random and the object keeps no state between calls.
//!
//! The ciphertext layout is normative and must not change:
//!
//! ```text
//! [ nonce: 16 bytes ][ ciphertext: |plaintext| bytes ][ tag: 16 bytes ]
//! ```

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::key::Key;
use crate::random;

type HmacSha512 = Hmac<Sha512>;

/// Size of the wide nonce prepended to every ciphertext.
const NONCE_SIZE: usize = 16;

/// Size of the Poly1305 authentication tag.
const TAG_SIZE: usize = 16;

/// Size of the AEAD sub-nonce derived for each encryption.
const SUBNONCE_SIZE: usize = 12;

/// Label prepended to the nonce before HMAC, so the sub-key derivation is
/// disjoint from any plain PRF evaluation under the same key material.
const SUBKEY_LABEL: u8 = 0x01;

/// Stateless authenticated encryption under a long-lived 32-byte key.
///
/// A `Cipher` owns its key for its whole lifetime and wipes it on drop.
/// Encryption and decryption take `&self` and keep every derived secret on
/// the call stack, so one instance can be shared across threads without
/// synchronization.
pub struct Cipher {
    key: Zeroizing<[u8; 32]>,
}

impl Cipher {
    /// Key size in bytes.
    pub const KEY_SIZE: usize = 32;

    /// Number of bytes a ciphertext is longer than its plaintext
    /// (the nonce plus the tag).
    pub const CIPHERTEXT_EXPANSION: usize = NONCE_SIZE + TAG_SIZE;

    /// Create a cipher from a 32-byte key. The key is consumed and cannot
    /// be reused by the caller.
    pub fn new(key: Key<32>) -> Self {
        Self { key: key.expose() }
    }

    /// Create a cipher with a freshly drawn random key.
    pub fn random() -> Self {
        Self::new(Key::random())
    }

    /// Length of the ciphertext produced for a `plaintext_len`-byte input.
    pub const fn ciphertext_length(plaintext_len: usize) -> usize {
        plaintext_len + Self::CIPHERTEXT_EXPANSION
    }

    /// Length of the plaintext recovered from a `ciphertext_len`-byte
    /// input when decryption succeeds (0 if the ciphertext is too short to
    /// be valid).
    pub const fn plaintext_length(ciphertext_len: usize) -> usize {
        ciphertext_len.saturating_sub(Self::CIPHERTEXT_EXPANSION)
    }

    /// Encrypt `plaintext`.
    ///
    /// A fresh 16-byte nonce is sampled, and the one-shot AEAD key and
    /// nonce are derived as `HMAC-SHA-512(key, 0x01 ∥ nonce)`: the sub-key
    /// is bytes 0..32 of the MAC and the sub-nonce is bytes 32..44. Callers
    /// interoperating with this implementation must use the same mapping.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `plaintext` is empty.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Err(Error::InvalidArgument("plaintexts must be non-empty"));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        random::fill_random(&mut nonce);
        let (sub_key, sub_nonce) = self.derive_subkey(&nonce);

        let aead = ChaCha20Poly1305::new((&*sub_key).into());
        let Ok(sealed) = aead.encrypt(
            Nonce::from_slice(&sub_nonce),
            Payload { msg: plaintext, aad: &[] },
        ) else {
            unreachable!("ChaCha20-Poly1305 encryption cannot fail with valid inputs");
        };

        let mut ciphertext = Vec::with_capacity(Self::ciphertext_length(plaintext.len()));
        ciphertext.extend_from_slice(&nonce);
        ciphertext.extend_from_slice(&sealed);
        Ok(ciphertext)
    }

    /// Decrypt `ciphertext`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `ciphertext` is shorter than the
    /// smallest valid ciphertext (33 bytes, since plaintexts are
    /// non-empty); [`Error::AuthenticationFailed`] if the tag does not
    /// match, in which case no plaintext byte is produced.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() <= Self::CIPHERTEXT_EXPANSION {
            return Err(Error::InvalidArgument(
                "ciphertexts are at least nonce + tag + one byte long",
            ));
        }

        let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
        let mut nonce_array = [0u8; NONCE_SIZE];
        nonce_array.copy_from_slice(nonce);
        let (sub_key, sub_nonce) = self.derive_subkey(&nonce_array);

        let aead = ChaCha20Poly1305::new((&*sub_key).into());
        aead.decrypt(
            Nonce::from_slice(&sub_nonce),
            Payload { msg: sealed, aad: &[] },
        )
        .map_err(|_| Error::AuthenticationFailed)
    }

    /// Derive the one-shot AEAD key and nonce for a wide nonce.
    fn derive_subkey(&self, nonce: &[u8; NONCE_SIZE]) -> (Zeroizing<[u8; 32]>, [u8; SUBNONCE_SIZE]) {
        let Ok(mut mac) = <HmacSha512 as Mac>::new_from_slice(self.key.as_slice()) else {
            unreachable!("HMAC-SHA-512 accepts keys of any length");
        };
        mac.update(&[SUBKEY_LABEL]);
        mac.update(nonce);
        let mut digest = Zeroizing::new([0u8; 64]);
        digest.copy_from_slice(mac.finalize().into_bytes().as_slice());

        let mut sub_key = Zeroizing::new([0u8; 32]);
        sub_key.copy_from_slice(&digest[..32]);
        let mut sub_nonce = [0u8; SUBNONCE_SIZE];
        sub_nonce.copy_from_slice(&digest[32..32 + SUBNONCE_SIZE]);
        (sub_key, sub_nonce)
    }
}
