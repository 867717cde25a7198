use thiserror::Error;

/// Errors reported by the primitives in this crate.
///
/// The variants are part of the stable API: higher-level protocols are
/// expected to match on them. Nothing in this crate retries or logs; every
/// failure is reported to the caller exactly once, and no partial output is
/// produced on a failing path.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied buffer does not have the required length.
    #[error("The supplied buffer has the wrong length")]
    InvalidLength,
    /// An argument was out of range or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A key could not be parsed, or failed its consistency check.
    #[error("The supplied key is invalid")]
    InvalidKey,
    /// The authentication tag did not match during decryption.
    #[error("Ciphertext authentication failed")]
    AuthenticationFailed,
    /// An underlying big-integer or AEAD primitive reported an error.
    ///
    /// Unreachable in normal operation; the backend's message is carried
    /// for debugging.
    #[error("Cryptographic backend error: {0}")]
    InternalCryptoError(String),
}

pub type Result<V, E = Error> = std::result::Result<V, E>;
