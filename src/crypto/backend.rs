//! Hash function implementations based on the RustCrypto crates.

use std::cmp;

use crate::Error;
use crate::Result;
use crate::crypto::hash::Digest;
use crate::types::HashAlgorithm;

impl<T: digest::Digest + Clone> Digest for T {
    fn digest_size(&self) -> usize {
        T::output_size()
    }

    fn update(&mut self, data: &[u8]) {
        digest::Digest::update(self, data)
    }

    fn digest(&mut self, digest: &mut [u8]) {
        let result = self.finalize_reset();
        let n = cmp::min(digest.len(), result.len());
        digest[..n].copy_from_slice(&result[..n]);
    }
}

impl HashAlgorithm {
    /// Whether this algorithm is supported.
    pub fn is_supported(self) -> bool {
        match self {
            HashAlgorithm::SHA1 => true,
            HashAlgorithm::SHA224 => true,
            HashAlgorithm::SHA256 => true,
            HashAlgorithm::SHA384 => true,
            HashAlgorithm::SHA512 => true,
            HashAlgorithm::RipeMD => true,
            HashAlgorithm::MD5 => true,
            HashAlgorithm::Private(_) => false,
            HashAlgorithm::Unknown(_) => false,
        }
    }

    /// Creates a new hasher for this algorithm.
    pub(crate) fn new_hasher(self) -> Result<Box<dyn Digest>> {
        use digest::Digest as _;
        use md5::Md5;
        use ripemd160::Ripemd160;
        use sha1::Sha1;
        use sha2::{Sha224, Sha256, Sha384, Sha512};

        match self {
            HashAlgorithm::SHA1 => Ok(Box::new(Sha1::new())),
            HashAlgorithm::SHA224 => Ok(Box::new(Sha224::new())),
            HashAlgorithm::SHA256 => Ok(Box::new(Sha256::new())),
            HashAlgorithm::SHA384 => Ok(Box::new(Sha384::new())),
            HashAlgorithm::SHA512 => Ok(Box::new(Sha512::new())),
            HashAlgorithm::MD5 => Ok(Box::new(Md5::new())),
            HashAlgorithm::RipeMD => Ok(Box::new(Ripemd160::new())),
            HashAlgorithm::Private(_) | HashAlgorithm::Unknown(_) =>
                Err(Error::UnsupportedHashAlgorithm(self).into()),
        }
    }
}
