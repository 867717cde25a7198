//! Pools of related trapdoor permutations.

use std::fmt::{self, Debug};

use rsa::traits::PublicKeyParts;
use rsa::BigUint;

use super::{encode_message, Message, Tdp, BASE_EXPONENT, MESSAGE_SIZE};
use crate::error::{Error, Result};
use crate::ByteAccess;

/// A family of public keys sharing one modulus, with exponents
/// e, e², …, e^s.
///
/// Evaluating the base permutation `o` times costs `o` exponentiations;
/// a pool answers the same query with a single exponentiation under the
/// precomputed exponent e^o. Pools hold public material only.
#[derive(Clone)]
pub struct TdpMultPool {
    base: Tdp,
    // Exponents e^2 .. e^s; the order-o key lives at index o - 2.
    power_exponents: Vec<BigUint>,
}

impl TdpMultPool {
    /// Largest supported pool size.
    pub const MAX_POOL_SIZE: u8 = u8::MAX;

    /// Build a pool of `size` keys from a PEM-encoded SubjectPublicKeyInfo
    /// public key.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `size` is 0; [`Error::InvalidKey`] if
    /// the key does not parse or a derived key fails its consistency
    /// check.
    pub fn new(public_key_pem: &str, size: u8) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidArgument("pool sizes must be at least 1"));
        }
        let base = Tdp::from_public_key(public_key_pem)?;

        let step = BigUint::from(BASE_EXPONENT);
        let mut power_exponents = Vec::with_capacity(usize::from(size) - 1);
        let mut exponent = base.rsa_key().e().clone();
        for _ in 1..size {
            exponent *= &step;
            check_exponent(&exponent)?;
            power_exponents.push(exponent.clone());
        }

        Ok(Self {
            base,
            power_exponents,
        })
    }

    /// The order-1 permutation underlying this pool.
    pub fn base(&self) -> &Tdp {
        &self.base
    }

    /// The largest order this pool can evaluate, i.e. its size.
    pub fn maximum_order(&self) -> u8 {
        self.power_exponents.len() as u8 + 1
    }

    /// Evaluate the permutation `order` times in one exponentiation:
    /// `input^(e^order) mod N`.
    ///
    /// The input is reduced mod N first, as in [`Tdp::eval`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `order` is 0 or exceeds
    /// [`TdpMultPool::maximum_order`]; [`Error::InvalidLength`] unless
    /// `input` is exactly [`MESSAGE_SIZE`] bytes.
    pub fn eval_pool(&self, input: &[u8], order: u8) -> Result<Message> {
        let exponent = match usize::from(order) {
            0 => {
                return Err(Error::InvalidArgument(
                    "pool orders are strictly positive",
                ))
            }
            1 => self.base.rsa_key().e(),
            o if o <= self.power_exponents.len() + 1 => &self.power_exponents[o - 2],
            _ => {
                return Err(Error::InvalidArgument(
                    "the order exceeds the pool's maximum order",
                ))
            }
        };
        if input.len() != MESSAGE_SIZE {
            return Err(Error::InvalidLength);
        }

        let n = self.base.rsa_key().n();
        let x = BigUint::from_bytes_be(input) % n;
        Ok(encode_message(&x.modpow(exponent, n)))
    }
}

/// The consistency check every derived key must pass: a usable RSA
/// exponent is odd and larger than 1.
fn check_exponent(exponent: &BigUint) -> Result<()> {
    if exponent.bits() < 2 || exponent % BigUint::from(2u8) == BigUint::from(0u8) {
        return Err(Error::InvalidKey);
    }
    Ok(())
}

impl ByteAccess for TdpMultPool {
    fn bytes(&self) -> Vec<u8> {
        self.base.bytes()
    }
}

impl Debug for TdpMultPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TdpMultPool")
            .field("key", &self.base.fingerprint())
            .field("maximum_order", &self.maximum_order())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::super::testing::shared_inverse;
    use super::*;

    fn shared_pool(size: u8) -> TdpMultPool {
        let pem = shared_inverse().public_key().unwrap();
        TdpMultPool::new(&pem, size).unwrap()
    }

    #[test]
    fn order_three_matches_triple_eval() {
        let pool = shared_pool(4);
        let x = pool.base().sample();

        let mut expected = x;
        for _ in 0..3 {
            expected = pool.base().eval(&expected).unwrap();
        }
        assert_eq!(pool.eval_pool(&x, 3).unwrap(), expected);
    }

    #[test]
    fn every_order_matches_repeated_eval() {
        let pool = shared_pool(5);
        let x = pool.base().sample();

        let mut expected = x;
        for order in 1..=pool.maximum_order() {
            expected = pool.base().eval(&expected).unwrap();
            assert_eq!(
                pool.eval_pool(&x, order).unwrap(),
                expected,
                "pool dispatch diverged at order {order}"
            );
        }
    }

    #[test]
    fn order_one_matches_the_base_permutation() {
        let pool = shared_pool(2);
        let x = pool.base().sample();
        assert_eq!(pool.eval_pool(&x, 1).unwrap(), pool.base().eval(&x).unwrap());
    }

    #[test]
    fn pool_inverts_through_invert_mult() {
        let inverse = shared_inverse();
        let pool = shared_pool(4);
        let x = pool.base().sample();
        let preimage = inverse.invert_mult(&x, 3).unwrap();
        assert_eq!(pool.eval_pool(&preimage, 3).unwrap(), x);
    }

    #[test]
    fn out_of_range_orders_are_rejected() {
        let pool = shared_pool(3);
        let x = pool.base().sample();
        assert!(matches!(
            pool.eval_pool(&x, 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            pool.eval_pool(&x, 4),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn zero_sized_pools_are_rejected() {
        let pem = shared_inverse().public_key().unwrap();
        assert!(matches!(
            TdpMultPool::new(&pem, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn wrong_input_sizes_are_rejected() {
        let pool = shared_pool(2);
        assert!(matches!(
            pool.eval_pool(&[0u8; 255], 1),
            Err(Error::InvalidLength)
        ));
    }

    #[test]
    fn maximum_order_is_the_size() {
        assert_eq!(shared_pool(1).maximum_order(), 1);
        assert_eq!(shared_pool(7).maximum_order(), 7);
    }

    #[test]
    fn clones_are_deep_and_equivalent() {
        let pool = shared_pool(3);
        let copy = pool.clone();
        let x = pool.base().sample();
        assert_eq!(pool.eval_pool(&x, 3).unwrap(), copy.eval_pool(&x, 3).unwrap());
    }
}
