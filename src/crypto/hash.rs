//! Cryptographic hash functions.
//!
//! This module provides [`Context`] representing a single hash
//! function context independent of the cryptographic backend, and
//! [`DigestSet`], a bundle of concurrently maintained contexts that
//! mirrors how OpenPGP messages are hashed: which digest algorithms a
//! signature requires is often only known after the data has been
//! seen, so several candidate digests are computed side by side.
//!
//!   [`Context`]: struct.Context.html
//!   [`DigestSet`]: struct.DigestSet.html

use std::fmt;
use std::io;

use dyn_clone::DynClone;

use crate::Error;
use crate::Result;
use crate::types::HashAlgorithm;

/// Hasher capable of calculating a digest for the input byte stream.
pub(crate) trait Digest: DynClone {
    /// Size of the digest in bytes.
    fn digest_size(&self) -> usize;

    /// Writes data into the hash function.
    fn update(&mut self, data: &[u8]);

    /// Finalizes the hash function and writes the digest into the
    /// provided slice.
    ///
    /// Resets the hash function contexts.
    ///
    /// `digest` must be at least `self.digest_size()` bytes large,
    /// otherwise the digest will be truncated.
    fn digest(&mut self, digest: &mut [u8]);
}

dyn_clone::clone_trait_object!(Digest);

/// State of a hash function.
///
/// `Context`s are created using [`HashAlgorithm::context`].  Cloning
/// a context produces an independent copy of the running state.
///
///   [`HashAlgorithm::context`]: ../../types/enum.HashAlgorithm.html#method.context
#[derive(Clone)]
pub struct Context {
    algo: HashAlgorithm,
    ctx: Box<dyn Digest>,
}

impl Context {
    /// Returns the algorithm.
    pub fn algo(&self) -> HashAlgorithm {
        self.algo
    }

    /// Size of the digest in bytes.
    pub fn digest_size(&self) -> usize {
        self.ctx.digest_size()
    }

    /// Writes data into the hash function.
    pub fn update<D: AsRef<[u8]>>(&mut self, data: D) {
        self.ctx.update(data.as_ref());
    }

    /// Finalizes the hash function and returns the digest.
    pub fn into_digest(mut self) -> Vec<u8> {
        let mut digest = vec![0u8; self.ctx.digest_size()];
        self.ctx.digest(&mut digest);
        digest
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("algo", &self.algo)
            .finish()
    }
}

impl io::Write for Context {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl HashAlgorithm {
    /// Creates a new hash context for this algorithm.
    ///
    /// # Errors
    ///
    /// Fails with `Error::UnsupportedHashAlgorithm` if we do not
    /// support this algorithm.  See [`HashAlgorithm::is_supported`].
    ///
    ///   [`HashAlgorithm::is_supported`]: ../../types/enum.HashAlgorithm.html#method.is_supported
    pub fn context(self) -> Result<Context> {
        self.new_hasher()
            .map(|hasher| Context {
                algo: self,
                ctx: hasher,
            })
    }
}

/// A set of concurrently maintained hash contexts.
///
/// Algorithms may be enabled lazily, but only for as long as no data
/// has been written: a digest over a partial stream would verify
/// nothing.  Cloning the set yields independent copies of every
/// running state, so several signatures over the same data can each
/// finalize from the same point.
#[derive(Clone, Debug, Default)]
pub struct DigestSet {
    hashes: Vec<Context>,
    written: u64,
}

impl DigestSet {
    /// Returns an empty set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns a set with the given algorithm enabled.
    pub fn with(algo: HashAlgorithm) -> Result<Self> {
        let mut set = Self::new();
        set.enable(algo)?;
        Ok(set)
    }

    /// Enables an additional algorithm.
    ///
    /// Enabling an algorithm twice is a no-op.
    ///
    /// # Errors
    ///
    /// Fails with `Error::InvalidOperation` once data has been
    /// written, and with `Error::UnsupportedHashAlgorithm` if the
    /// algorithm has no backing implementation.
    pub fn enable(&mut self, algo: HashAlgorithm) -> Result<()> {
        if self.contains(algo) {
            return Ok(());
        }
        if self.written > 0 {
            return Err(Error::InvalidOperation(
                format!("cannot enable {} after hashing started", algo))
                       .into());
        }
        self.hashes.push(algo.context()?);
        Ok(())
    }

    /// Returns whether the algorithm is enabled.
    pub fn contains(&self, algo: HashAlgorithm) -> bool {
        self.hashes.iter().any(|c| c.algo() == algo)
    }

    /// Returns the enabled algorithms.
    pub fn algos(&self) -> impl Iterator<Item = HashAlgorithm> + '_ {
        self.hashes.iter().map(|c| c.algo())
    }

    /// Returns the number of bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Writes data into every enabled hash function.
    pub fn update<D: AsRef<[u8]>>(&mut self, data: D) {
        let data = data.as_ref();
        for ctx in self.hashes.iter_mut() {
            ctx.update(data);
        }
        self.written += data.len() as u64;
    }

    /// Finalizes an independent copy of the given algorithm's state
    /// and returns the digest.
    ///
    /// The running state is unaffected.
    ///
    /// # Errors
    ///
    /// Fails with `Error::InvalidOperation` if the algorithm is not
    /// enabled in this set.
    pub fn digest(&self, algo: HashAlgorithm) -> Result<Vec<u8>> {
        let ctx = self.hashes.iter()
            .find(|c| c.algo() == algo)
            .ok_or_else(|| Error::InvalidOperation(
                format!("{} is not enabled in this set", algo)))?;
        Ok(ctx.clone().into_digest())
    }
}

impl io::Write for DigestSet {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
