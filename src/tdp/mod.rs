//! Trapdoor permutation over an RSA group.
//!
//! The permutation is the textbook RSA map `x ↦ x^e mod N` with `e = 65537`
//! over a 2048-bit modulus. Holders of the public key can evaluate it
//! forward ([`Tdp`]); holders of the private key can additionally invert it
//! ([`TdpInverse`]), including `k` inversions in one shot; and a
//! [`TdpMultPool`] precomputes the related public keys whose exponents are
//! the successive powers e², e³, … of the base exponent.
//!
//! # Message handling
//!
//! Group elements cross the API as raw big-endian unsigned integers of
//! exactly [`MESSAGE_SIZE`] bytes (the [`Message`] alias). Inputs to the
//! forward direction may encode integers at or above the modulus; they are
//! reduced before exponentiation, so `eval` is total over all
//! `MESSAGE_SIZE`-byte strings. Inputs to the inverse direction must encode
//! integers in `[0, N)`.
//!
//! Sampling and seed-derived generation both draw [`RSA_PRF_SIZE`] bytes —
//! [`STATISTICAL_SECURITY`] bits more than a group element needs — and
//! reduce them, which keeps the bias of the result below
//! 2^-[`STATISTICAL_SECURITY`].
//!
//! # Key serialization
//!
//! Public keys travel as PEM-encoded SubjectPublicKeyInfo and private keys
//! as PEM-encoded PKCS#1, so any standards-conformant RSA library can
//! produce or consume them.

use std::fmt::{self, Debug};

use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};
use crate::key::Key;
use crate::prf::Prf;
use crate::random;
use crate::ByteAccess;

mod inverse;
mod pool;

pub use self::inverse::TdpInverse;
pub use self::pool::TdpMultPool;

/// Byte length of a serialized group element (2048-bit modulus).
pub const MESSAGE_SIZE: usize = 256;

/// Modulus size, in bits, of every RSA key this module accepts.
pub const MODULUS_BITS: usize = 8 * MESSAGE_SIZE;

/// Statistical distance, in bits, between sampled elements and uniform.
pub const STATISTICAL_SECURITY: usize = 128;

/// Number of random bytes reduced mod N when sampling a group element.
pub const RSA_PRF_SIZE: usize = MESSAGE_SIZE + STATISTICAL_SECURITY / 8;

/// The base public exponent.
pub const BASE_EXPONENT: u64 = 65537;

/// A serialized group element: a big-endian unsigned integer.
pub type Message = [u8; MESSAGE_SIZE];

/// Serialize a reduced group element to fixed-width big-endian bytes.
fn encode_message(x: &BigUint) -> Message {
    let mut out = [0u8; MESSAGE_SIZE];
    let bytes = Zeroizing::new(x.to_bytes_be());
    out[MESSAGE_SIZE - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// The forward direction of the trapdoor permutation.
///
/// A `Tdp` holds a public key only. Evaluation, sampling and generation
/// take `&self` and allocate per-call scratch, so one instance can be
/// shared across threads without synchronization.
#[derive(Clone)]
pub struct Tdp {
    key: RsaPublicKey,
}

impl Tdp {
    /// Parse a PEM-encoded SubjectPublicKeyInfo public key.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`] if the PEM cannot be parsed, the key fails
    /// its consistency check, or the modulus is not [`MESSAGE_SIZE`] bytes.
    pub fn from_public_key(pem: &str) -> Result<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem).map_err(|_| Error::InvalidKey)?;
        Self::from_rsa_key(key)
    }

    pub(crate) fn from_rsa_key(key: RsaPublicKey) -> Result<Self> {
        if key.size() != MESSAGE_SIZE {
            return Err(Error::InvalidKey);
        }
        Ok(Self { key })
    }

    pub(crate) fn rsa_key(&self) -> &RsaPublicKey {
        &self.key
    }

    /// Serialize the public key as SubjectPublicKeyInfo PEM.
    pub fn public_key(&self) -> Result<String> {
        self.key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::InternalCryptoError(e.to_string()))
    }

    /// Evaluate the permutation: `input^e mod N`.
    ///
    /// The input is interpreted as a big-endian integer and reduced mod N
    /// first, so every [`MESSAGE_SIZE`]-byte string is a valid input.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLength`] unless `input` is exactly
    /// [`MESSAGE_SIZE`] bytes.
    pub fn eval(&self, input: &[u8]) -> Result<Message> {
        if input.len() != MESSAGE_SIZE {
            return Err(Error::InvalidLength);
        }
        let mut x = BigUint::from_bytes_be(input) % self.key.n();
        let y = x.modpow(self.key.e(), self.key.n());
        x.zeroize();
        Ok(encode_message(&y))
    }

    /// Draw a fresh uniform group element.
    pub fn sample(&self) -> Message {
        let raw = Zeroizing::new(random::random_bytes(RSA_PRF_SIZE));
        self.reduce(&raw)
    }

    /// Derive a group element deterministically from `seed`.
    ///
    /// Identical to [`Tdp::sample`], except that the randomness is
    /// `prg.prf(seed)`: the result is a pure function of the PRF key and
    /// the seed, stable across calls and machines.
    pub fn generate(&self, prg: &Prf<{ RSA_PRF_SIZE }>, seed: &[u8]) -> Message {
        let raw = Zeroizing::new(prg.prf(seed));
        self.reduce(raw.as_slice())
    }

    /// Convenience form of [`Tdp::generate`] that consumes a PRF key.
    pub fn generate_from_key(&self, key: Key<32>, seed: &[u8]) -> Message {
        self.generate(&Prf::new(key), seed)
    }

    /// Reduce oversampled randomness into the group.
    fn reduce(&self, raw: &[u8]) -> Message {
        let mut x = BigUint::from_bytes_be(raw) % self.key.n();
        let out = encode_message(&x);
        x.zeroize();
        out
    }
}

impl ByteAccess for Tdp {
    fn bytes(&self) -> Vec<u8> {
        self.key
            .to_public_key_der()
            .expect("DER encoding of a checked RSA key cannot fail")
            .as_bytes()
            .to_vec()
    }
}

impl Debug for Tdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tdp").field(&self.fingerprint()).finish()
    }
}
