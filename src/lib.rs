//! OpenPGP packet stream processing.
//!
//! This crate implements the stateful pipeline that sits between a
//! packet parser and the cryptographic primitives: it consumes a
//! sequence of typed OpenPGP packets, reassembles related packets into
//! logical groups (a key certificate followed by its user IDs and
//! their signatures, or a run of one-pass signatures bracketing
//! literal data), recovers session keys, drives decryption and
//! decompression, recomputes message digests over the plaintext, and
//! verifies signatures against those digests.
//!
//! The packet wire format, the cryptographic primitives, the key
//! database, and all user interaction are deliberately out of scope.
//! They are reached through the [`PacketSource`] and
//! [`ProcessingHelper`] traits, so the pipeline can be exercised
//! against real crypto backends as well as test doubles.
//!
//!   [`PacketSource`]: stream/trait.PacketSource.html
//!   [`ProcessingHelper`]: stream/trait.ProcessingHelper.html
//!
//! # Example
//!
//! ```no_run
//! use procmsg::stream::{Options, Processor, ProcessingHelper, PacketSource};
//! # fn process<S, H>(source: S, helper: H) -> procmsg::Result<()>
//! # where S: PacketSource, H: ProcessingHelper {
//! let mut p = Processor::new(helper, Options::default(), std::io::stdout());
//! p.process(source)?;
//! # Ok(()) }
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod types;
use types::{
    HashAlgorithm,
    PublicKeyAlgorithm,
    SignatureType,
    SymmetricAlgorithm,
};

mod keyid;
pub use keyid::KeyID;
mod fingerprint;
pub use fingerprint::Fingerprint;

pub mod packet;
pub use packet::Packet;

pub mod crypto;
pub mod status;
pub mod stream;

/// Crate result specialization.
pub type Result<T> = ::std::result::Result<T, anyhow::Error>;

/// Errors returned by this crate.
///
/// Note: This enum cannot be exhaustively matched to allow future
/// extensions.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// A malformed packet.
    ///
    /// The packet is dropped and stream processing continues.
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// The packet stream is corrupted beyond recovery.
    ///
    /// This is the only parse-level condition that aborts the whole
    /// stream.
    #[error("Corrupted packet stream: {0}")]
    CorruptedStream(String),

    /// Unsupported public key algorithm.
    #[error("Unsupported public key algorithm: {0}")]
    UnsupportedPublicKeyAlgorithm(PublicKeyAlgorithm),

    /// Unsupported hash algorithm.
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(HashAlgorithm),

    /// Unsupported symmetric algorithm.
    #[error("Unsupported symmetric algorithm: {0}")]
    UnsupportedSymmetricAlgorithm(SymmetricAlgorithm),

    /// A signature class that cannot be verified in its context.
    #[error("Unsupported signature type: {0}")]
    UnsupportedSignatureType(SignatureType),

    /// No secret key material is available to recover a session key.
    #[error("No secret key")]
    NoSecretKey,

    /// The signature does not match the computed digest.
    #[error("Bad signature: {0}")]
    BadSignature(String),

    /// The key that made the signature is not available.
    #[error("No public key: {0}")]
    NoPublicKey(KeyID),

    /// A decryption or verification primitive failed.
    #[error("Cryptographic operation failed: {0}")]
    CryptoFailure(String),

    /// The operation was intentionally cancelled by the user.
    ///
    /// Unlike a genuine failure, this is handled silently.
    #[error("Operation cancelled")]
    OperationCancelled,

    /// Invalid operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}
