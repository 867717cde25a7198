//! Variable-output pseudorandom function over HMAC-SHA-512.
//!
//! [`Prf`] is a keyed map from arbitrary byte sequences to `L` bytes of
//! pseudorandom output. The output length is part of the type: a
//! `Prf<16>` and a `Prf<64>` are different types, and a single instance
//! always answers with the same length. This keeps domain separation
//! explicit, because outputs of different lengths would otherwise be
//! prefix-related.
//!
//! For `L` up to the 64 bytes that SHA-512 produces natively, the output
//! is the truncated MAC of the input. Longer outputs are produced in
//! counter mode: block `i` is the MAC of the input followed by the
//! big-endian 32-bit counter `i`, and the concatenated blocks are
//! truncated to `L`. The same key and input therefore yield identical
//! output on every call, every instance and every machine.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::key::Key;

type HmacSha512 = Hmac<Sha512>;

/// Output size of a single HMAC-SHA-512 invocation.
const HMAC_OUTPUT_SIZE: usize = 64;

/// A pseudorandom function with `L`-byte outputs.
///
/// The 32-byte key is handed over at construction through a [`Key`] and
/// wiped when the `Prf` is dropped. Evaluation takes `&self` and keeps all
/// MAC state on the call stack, so one instance can be shared across
/// threads without synchronization.
pub struct Prf<const L: usize> {
    key: Zeroizing<[u8; 32]>,
}

impl<const L: usize> Prf<L> {
    /// Key size (in bytes) of every `Prf`, regardless of output length.
    pub const KEY_SIZE: usize = 32;

    /// Number of output bytes produced by [`Prf::prf`].
    pub const OUTPUT_SIZE: usize = L;

    /// Create a PRF from a 32-byte key. The key is consumed.
    pub fn new(key: Key<32>) -> Self {
        Self { key: key.expose() }
    }

    /// Create a PRF with a freshly drawn random key.
    pub fn random() -> Self {
        Self::new(Key::random())
    }

    /// Evaluate the PRF on `input`.
    pub fn prf(&self, input: &[u8]) -> [u8; L] {
        let mut output = [0u8; L];
        if L <= HMAC_OUTPUT_SIZE {
            let digest = self.mac_block(input, None);
            output.copy_from_slice(&digest[..L]);
        } else {
            for (index, chunk) in output.chunks_mut(HMAC_OUTPUT_SIZE).enumerate() {
                let digest = self.mac_block(input, Some(index as u32));
                chunk.copy_from_slice(&digest[..chunk.len()]);
            }
        }
        output
    }

    /// One HMAC-SHA-512 pass over `input`, with an optional big-endian
    /// counter suffix.
    fn mac_block(&self, input: &[u8], counter: Option<u32>) -> Zeroizing<[u8; HMAC_OUTPUT_SIZE]> {
        let Ok(mut mac) = HmacSha512::new_from_slice(self.key.as_slice()) else {
            unreachable!("HMAC-SHA-512 accepts keys of any length");
        };
        mac.update(input);
        if let Some(counter) = counter {
            mac.update(&counter.to_be_bytes());
        }
        let mut digest = Zeroizing::new([0u8; HMAC_OUTPUT_SIZE]);
        digest.copy_from_slice(mac.finalize().into_bytes().as_slice());
        digest
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Keys shorter than 32 bytes are extended with zeros; HMAC pads keys
    // with zeros up to the block size anyway, so the MAC is unchanged.
    fn prf_64(key_bytes: &[u8]) -> Prf<64> {
        let mut padded = [0u8; 32];
        padded[..key_bytes.len()].copy_from_slice(key_bytes);
        Prf::new(Key::from_slice(&mut padded).unwrap())
    }

    #[test]
    fn rfc4231_case_1() {
        let prf = prf_64(&[0x0b; 20]);
        assert_eq!(
            hex::encode(prf.prf(b"Hi There")),
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cde\
             daa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854"
        );
    }

    #[test]
    fn rfc4231_case_2() {
        let prf = prf_64(b"Jefe");
        assert_eq!(
            hex::encode(prf.prf(b"what do ya want for nothing?")),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn rfc4231_case_3() {
        let prf = prf_64(&[0xaa; 20]);
        assert_eq!(
            hex::encode(prf.prf(&[0xdd; 50])),
            "fa73b0089d56a284efb0f0756c890be9b1b5dbdd8ee81a3655f83e33b2279d39\
             bf3e848279a722c806b485a47e67c807b946a337bee8942674278859e13292fb"
        );
    }

    #[test]
    fn rfc4231_case_4() {
        let key: Vec<u8> = (0x01..=0x19).collect();
        let prf = prf_64(&key);
        assert_eq!(
            hex::encode(prf.prf(&[0xcd; 50])),
            "b0ba465637458c6990e5a8c5f61d4af7e576d97ff94b872de76f8050361ee3db\
             a91ca5c11aa25eb4d679275cc5788063a5f19741120c4f2de2adebeb10a298dd"
        );
    }

    #[test]
    fn short_outputs_truncate_the_mac() {
        let long = prf_64(&[0x0b; 20]).prf(b"Hi There");

        let mut key_bytes = [0u8; 32];
        key_bytes[..20].fill(0x0b);
        let short = Prf::<16>::new(Key::from_slice(&mut key_bytes).unwrap()).prf(b"Hi There");

        assert_eq!(&short[..], &long[..16]);
    }

    #[test]
    fn counter_expansion_matches_direct_hmac() {
        let mut key_bytes = [0x17u8; 32];
        let key_copy = key_bytes;
        let prf = Prf::<100>::new(Key::from_slice(&mut key_bytes).unwrap());
        let output = prf.prf(b"expand me");

        let mut expected = Vec::new();
        for counter in 0u32..2 {
            let mut mac = HmacSha512::new_from_slice(&key_copy).unwrap();
            mac.update(b"expand me");
            mac.update(&counter.to_be_bytes());
            expected.extend_from_slice(mac.finalize().into_bytes().as_slice());
        }
        assert_eq!(output.as_slice(), &expected[..100]);
    }

    #[test]
    fn same_key_means_same_output() {
        let mut a = [0x5cu8; 32];
        let mut b = [0x5cu8; 32];
        let first = Prf::<96>::new(Key::from_slice(&mut a).unwrap());
        let second = Prf::<96>::new(Key::from_slice(&mut b).unwrap());
        assert_eq!(first.prf(b"input"), second.prf(b"input"));
        assert_eq!(first.prf(b"input"), first.prf(b"input"));
    }

    #[test]
    fn different_inputs_diverge() {
        let prf = Prf::<64>::random();
        assert_ne!(prf.prf(b"a"), prf.prf(b"b"));
    }
}
