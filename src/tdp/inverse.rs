//! The private direction of the trapdoor permutation.

use std::fmt::{self, Debug};

use num_bigint_dig::{BigInt, ModInverse, Sign};
use rand::rngs::OsRng;
use rsa::hazmat::rsa_decrypt;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use zeroize::{Zeroize, Zeroizing};

use super::{encode_message, Message, Tdp, MESSAGE_SIZE, MODULUS_BITS};
use crate::error::{Error, Result};
use crate::ByteAccess;

/// `base^exponent mod modulus` by plain square-and-multiply.
///
/// Unlike a Montgomery-ladder modexp this accepts even moduli, which is
/// what the adjusted-exponent computation needs: it reduces modulo p−1 and
/// q−1, and both are even. The running time depends on the exponent, so
/// callers must only pass public exponents here.
fn mod_exp_any_modulus(base: &BigUint, exponent: u32, modulus: &BigUint) -> BigUint {
    let mut result = BigUint::from(1u8);
    let mut base = base % modulus;
    let mut exponent = exponent;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = &result * &base % modulus;
        }
        exponent >>= 1;
        base = &base * &base % modulus;
    }
    result
}

/// The trapdoor: an RSA private key in CRT form.
///
/// Besides the key itself, the values p−1, q−1, φ(N) and the CRT pieces
/// dP, dQ and qInv are derived once at construction and wiped on drop.
/// All operations take `&self` with per-call scratch, so an instance can
/// be shared across threads without synchronization.
pub struct TdpInverse {
    key: RsaPrivateKey,
    p_minus_one: BigUint,
    q_minus_one: BigUint,
    phi: BigUint,
    d_p: BigUint,
    d_q: BigUint,
    q_inv: BigUint,
}

impl TdpInverse {
    /// Generate a fresh 2048-bit keypair with public exponent 65537.
    ///
    /// # Errors
    ///
    /// [`Error::InternalCryptoError`] if the backend's key generator
    /// fails; this is unreachable in normal operation.
    pub fn new() -> Result<Self> {
        let key = RsaPrivateKey::new(&mut OsRng, MODULUS_BITS)
            .map_err(|e| Error::InternalCryptoError(e.to_string()))?;
        Self::from_rsa_key(key)
    }

    /// Parse a PEM-encoded PKCS#1 private key.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`] if the PEM cannot be parsed, the key fails
    /// validation, or the modulus is not [`MESSAGE_SIZE`] bytes.
    pub fn from_private_key(pem: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs1_pem(pem).map_err(|_| Error::InvalidKey)?;
        Self::from_rsa_key(key)
    }

    fn from_rsa_key(key: RsaPrivateKey) -> Result<Self> {
        key.validate().map_err(|_| Error::InvalidKey)?;
        if key.size() != MESSAGE_SIZE {
            return Err(Error::InvalidKey);
        }
        let [p, q] = key.primes() else {
            return Err(Error::InvalidKey);
        };

        let one = BigUint::from(1u8);
        let p_minus_one = p - &one;
        let q_minus_one = q - &one;
        let phi = &p_minus_one * &q_minus_one;
        let d_p = key.d() % &p_minus_one;
        let d_q = key.d() % &q_minus_one;
        // mod_inverse hands back a signed representative.
        let mut q_inv = q.mod_inverse(p).ok_or(Error::InvalidKey)?;
        if q_inv.sign() == Sign::Minus {
            q_inv += BigInt::from(p.clone());
        }
        let q_inv = q_inv.to_biguint().ok_or(Error::InvalidKey)?;

        Ok(Self {
            key,
            p_minus_one,
            q_minus_one,
            phi,
            d_p,
            d_q,
            q_inv,
        })
    }

    /// The forward half of this permutation.
    pub fn to_public(&self) -> Tdp {
        let public = self.key.to_public_key();
        Tdp::from_rsa_key(public).expect("the public half of a validated key is valid")
    }

    /// Serialize the public key as SubjectPublicKeyInfo PEM.
    pub fn public_key(&self) -> Result<String> {
        self.key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::InternalCryptoError(e.to_string()))
    }

    /// Serialize the private key as PKCS#1 PEM.
    ///
    /// The returned buffer wipes itself when dropped.
    pub fn private_key(&self) -> Result<Zeroizing<String>> {
        self.key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| Error::InternalCryptoError(e.to_string()))
    }

    /// Invert the permutation once: `input^d mod N`.
    ///
    /// Runs the backend's blinded CRT private-key primitive. The input
    /// must encode an integer in `[0, N)`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLength`] unless `input` is exactly
    /// [`MESSAGE_SIZE`] bytes; [`Error::InternalCryptoError`] if the
    /// backend rejects the operation.
    pub fn invert(&self, input: &[u8]) -> Result<Message> {
        if input.len() != MESSAGE_SIZE {
            return Err(Error::InvalidLength);
        }
        let mut y = BigUint::from_bytes_be(input);
        let mut x = rsa_decrypt(Some(&mut OsRng), &self.key, &y)
            .map_err(|e| Error::InternalCryptoError(e.to_string()))?;
        let out = encode_message(&x);
        x.zeroize();
        y.zeroize();
        Ok(out)
    }

    /// Invert the permutation `order` times in a single exponentiation.
    ///
    /// Returns `x` with `x^(e^order) = input mod N`; `order == 0` returns
    /// the input unchanged. Internally the CRT exponents are raised to the
    /// `order`-th power modulo p−1 and q−1 (both even, hence the dedicated
    /// square-and-multiply), then a single CRT recombination produces the
    /// result.
    ///
    /// This routine is not constant-time in `order` and must only be used
    /// with public orders.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLength`] unless `input` is exactly
    /// [`MESSAGE_SIZE`] bytes.
    pub fn invert_mult(&self, input: &[u8], order: u32) -> Result<Message> {
        if input.len() != MESSAGE_SIZE {
            return Err(Error::InvalidLength);
        }
        if order == 0 {
            let mut out = [0u8; MESSAGE_SIZE];
            out.copy_from_slice(input);
            return Ok(out);
        }

        let [p, q] = self.key.primes() else {
            unreachable!("construction only accepts two-prime keys");
        };
        let y = BigUint::from_bytes_be(input);

        let mut d_p_adjusted = mod_exp_any_modulus(&self.d_p, order, &self.p_minus_one);
        let mut d_q_adjusted = mod_exp_any_modulus(&self.d_q, order, &self.q_minus_one);

        let mut y_p = y.modpow(&d_p_adjusted, p);
        let mut y_q = y.modpow(&d_q_adjusted, q);

        // CRT recombination: h = (y_p - y_q) * qInv mod p, x = y_q + h * q.
        let mut h = (&y_p + p - &y_q % p) % p * &self.q_inv % p;
        let mut x = &y_q + &h * q;
        let out = encode_message(&x);

        d_p_adjusted.zeroize();
        d_q_adjusted.zeroize();
        y_p.zeroize();
        y_q.zeroize();
        h.zeroize();
        x.zeroize();
        Ok(out)
    }
}

impl Drop for TdpInverse {
    fn drop(&mut self) {
        // The RSA key wipes itself; the derived values are ours to wipe.
        self.p_minus_one.zeroize();
        self.q_minus_one.zeroize();
        self.phi.zeroize();
        self.d_p.zeroize();
        self.d_q.zeroize();
        self.q_inv.zeroize();
    }
}

impl ByteAccess for TdpInverse {
    /// Byte representation of the *public* half; private material never
    /// leaves through this trait.
    fn bytes(&self) -> Vec<u8> {
        self.to_public().bytes()
    }
}

impl Debug for TdpInverse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TdpInverse")
            .field(&self.fingerprint())
            .finish()
    }
}
