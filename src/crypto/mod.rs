//! Cryptographic machinery.
//!
//! The asymmetric and symmetric primitives themselves live behind the
//! [`ProcessingHelper`] trait; this module provides the key-material
//! and digest types threaded through the pipeline.
//!
//!   [`ProcessingHelper`]: ../stream/trait.ProcessingHelper.html

use std::fmt;
use std::ops::{Deref, DerefMut};

pub mod hash;
pub mod mem;
mod backend;

use crate::types::SymmetricAlgorithm;

/// Holds a session key.
///
/// The session key is cleared when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey(mem::Protected);

impl Deref for SessionKey {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for SessionKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl DerefMut for SessionKey {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl From<mem::Protected> for SessionKey {
    fn from(v: mem::Protected) -> Self {
        SessionKey(v)
    }
}

impl From<Vec<u8>> for SessionKey {
    fn from(v: Vec<u8>) -> Self {
        SessionKey(v.into())
    }
}

impl From<&[u8]> for SessionKey {
    fn from(v: &[u8]) -> Self {
        Vec::from(v).into()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SessionKey ({:?})", self.0)
    }
}

/// A decrypted encryption key.
///
/// Produced either by the public-key decryption of a session-key
/// packet, or by deriving a key from a passphrase.  It lives from its
/// creation until it is consumed by exactly one encrypted data
/// packet, or until it is discarded; the key material is securely
/// erased either way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dek {
    /// The symmetric algorithm the key is for.
    pub algo: SymmetricAlgorithm,
    /// The key material.
    pub key: SessionKey,
}

impl Dek {
    /// Creates a DEK from an algorithm and raw key material.
    pub fn new<K: Into<SessionKey>>(algo: SymmetricAlgorithm, key: K) -> Self {
        Dek { algo, key: key.into() }
    }
}
