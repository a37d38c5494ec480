use std::fmt;

use crate::Error;
use crate::KeyID;
use crate::Result;
use crate::types::{HashAlgorithm, PublicKeyAlgorithm, SignatureType};

/// Holds the algorithm-specific part of a signature packet.
///
/// The digest algorithm lives inside the algorithm-specific
/// sub-structure, so resolving it requires knowing the public key
/// algorithm family first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SignatureMaterial {
    /// RSA signature material, a single MPI.
    Rsa {
        /// The digest algorithm the signature was made over.
        digest_algo: HashAlgorithm,
        /// m^d mod n.
        s: Vec<u8>,
    },
    /// ElGamal signature material.
    ElGamal {
        /// The digest algorithm the signature was made over.
        digest_algo: HashAlgorithm,
        /// First half of the signature.
        r: Vec<u8>,
        /// Second half of the signature.
        s: Vec<u8>,
    },
    /// Material for an algorithm we do not understand, kept as an
    /// opaque blob.
    Unknown {
        /// The raw material.
        body: Vec<u8>,
    },
}

impl SignatureMaterial {
    /// Returns the declared digest algorithm, if the algorithm
    /// family is understood.
    pub fn digest_algo(&self) -> Option<HashAlgorithm> {
        match self {
            SignatureMaterial::Rsa { digest_algo, .. } => Some(*digest_algo),
            SignatureMaterial::ElGamal { digest_algo, .. } => Some(*digest_algo),
            SignatureMaterial::Unknown { .. } => None,
        }
    }
}

/// Holds a signature packet.
///
/// See [Section 5.2 of RFC 4880] for details.
///
///   [Section 5.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.2
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    sigtype: SignatureType,
    pk_algo: PublicKeyAlgorithm,
    issuer: KeyID,
    creation_time: u32,
    material: SignatureMaterial,
}

impl Signature {
    /// Returns a new `Signature` packet.
    pub fn new(sigtype: SignatureType, pk_algo: PublicKeyAlgorithm,
               issuer: KeyID, creation_time: u32,
               material: SignatureMaterial)
               -> Self
    {
        Signature {
            sigtype,
            pk_algo,
            issuer,
            creation_time,
            material,
        }
    }

    /// Returns the type of the signature.
    pub fn typ(&self) -> SignatureType {
        self.sigtype
    }

    /// Returns the public key algorithm.
    pub fn pk_algo(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    /// Returns the key ID of the signing key.
    pub fn issuer(&self) -> &KeyID {
        &self.issuer
    }

    /// Returns the signature's creation time in seconds since the
    /// epoch.
    pub fn creation_time(&self) -> u32 {
        self.creation_time
    }

    /// Returns the algorithm-specific signature material.
    pub fn material(&self) -> &SignatureMaterial {
        &self.material
    }

    /// Resolves the digest algorithm from the algorithm-specific
    /// material.
    ///
    /// # Errors
    ///
    /// Fails with `Error::UnsupportedPublicKeyAlgorithm` if the
    /// material belongs to an algorithm family we do not understand,
    /// and with `Error::UnsupportedHashAlgorithm` if the declared
    /// digest has no backing implementation.
    pub fn digest_algo(&self) -> Result<HashAlgorithm> {
        let algo = self.material.digest_algo()
            .ok_or(Error::UnsupportedPublicKeyAlgorithm(self.pk_algo))?;
        if ! algo.is_supported() {
            return Err(Error::UnsupportedHashAlgorithm(algo).into());
        }
        Ok(algo)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Signature")
            .field("typ", &self.sigtype)
            .field("pk_algo", &self.pk_algo)
            .field("issuer", &self.issuer)
            .field("creation_time", &self.creation_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(pk_algo: PublicKeyAlgorithm, material: SignatureMaterial)
           -> Signature
    {
        Signature::new(SignatureType::Binary, pk_algo,
                       KeyID::new(0xAABBCCDD11223344), 0, material)
    }

    #[test]
    fn digest_algo_rsa() {
        let s = sig(PublicKeyAlgorithm::RSAEncryptSign,
                    SignatureMaterial::Rsa {
                        digest_algo: HashAlgorithm::SHA256,
                        s: vec![1, 2, 3],
                    });
        assert_eq!(s.digest_algo().unwrap(), HashAlgorithm::SHA256);
    }

    #[test]
    fn digest_algo_unknown_family() {
        let s = sig(PublicKeyAlgorithm::Unknown(99),
                    SignatureMaterial::Unknown { body: vec![] });
        let err = s.digest_algo().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedPublicKeyAlgorithm(_))));
    }

    #[test]
    fn digest_algo_unsupported_hash() {
        let s = sig(PublicKeyAlgorithm::RSAEncryptSign,
                    SignatureMaterial::Rsa {
                        digest_algo: HashAlgorithm::Unknown(42),
                        s: vec![],
                    });
        let err = s.digest_algo().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedHashAlgorithm(_))));
    }
}
