//! Packet-related types.
//!
//! The packet wire format is parsed elsewhere; this module defines
//! the decoded records handed to the stream processor, one struct per
//! packet type, and the [`Packet`] enum tying them together.
//!
//!   [`Packet`]: enum.Packet.html

use std::fmt;

use crate::Fingerprint;
use crate::KeyID;
use crate::crypto::hash::DigestSet;
use crate::types::{
    CompressionAlgorithm,
    HashAlgorithm,
    PublicKeyAlgorithm,
    SignatureType,
};

mod signature;
pub use signature::{Signature, SignatureMaterial};

/// The OpenPGP packet tags as defined in [Section 4.3 of RFC 4880].
///
///   [Section 4.3 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-4.3
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    /// Public-Key Encrypted Session Key Packet.
    PKESK,
    /// Signature Packet.
    Signature,
    /// One-Pass Signature Packet.
    OnePassSig,
    /// Secret-Key Packet.
    SecretKey,
    /// Public-Key Packet.
    PublicKey,
    /// Compressed Data Packet.
    CompressedData,
    /// Symmetrically Encrypted Data Packet.
    Encrypted,
    /// Literal Data Packet.
    Literal,
    /// User ID Packet.
    UserID,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Tag::PKESK => f.write_str("PKESK"),
            Tag::Signature => f.write_str("Signature"),
            Tag::OnePassSig => f.write_str("OnePassSig"),
            Tag::SecretKey => f.write_str("SecretKey"),
            Tag::PublicKey => f.write_str("PublicKey"),
            Tag::CompressedData => f.write_str("CompressedData"),
            Tag::Encrypted => f.write_str("Encrypted"),
            Tag::Literal => f.write_str("Literal"),
            Tag::UserID => f.write_str("UserID"),
        }
    }
}

/// The OpenPGP packets the stream processor understands.
///
/// The different OpenPGP packets are detailed in [Section 5 of RFC
/// 4880].  Packets with tags outside this set never reach the
/// processor; the packet source drops them as recoverable parse
/// errors.
///
///   [Section 5 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5
#[derive(Clone, Debug)]
pub enum Packet {
    /// Public key packet.
    PublicKey(Key),
    /// Secret key packet.
    SecretKey(Key),
    /// User ID packet.
    UserID(UserID),
    /// Signature packet.
    Signature(Signature),
    /// One pass signature packet.
    OnePassSig(OnePassSig),
    /// Public key encrypted session key packet.
    PKESK(PKESK),
    /// Symmetrically encrypted data packet.
    Encrypted(Encrypted),
    /// Compressed data packet.
    CompressedData(CompressedData),
    /// Literal data packet.
    Literal(Literal),
}

impl Packet {
    /// Returns the `Packet's` corresponding OpenPGP tag.
    pub fn tag(&self) -> Tag {
        match self {
            Packet::PublicKey(_) => Tag::PublicKey,
            Packet::SecretKey(_) => Tag::SecretKey,
            Packet::UserID(_) => Tag::UserID,
            Packet::Signature(_) => Tag::Signature,
            Packet::OnePassSig(_) => Tag::OnePassSig,
            Packet::PKESK(_) => Tag::PKESK,
            Packet::Encrypted(_) => Tag::Encrypted,
            Packet::CompressedData(_) => Tag::CompressedData,
            Packet::Literal(_) => Tag::Literal,
        }
    }
}

/// Holds a public or secret key packet.
///
/// See [Section 5.5 of RFC 4880] for details.
///
///   [Section 5.5 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.5
#[derive(Clone, Debug)]
pub struct Key {
    version: u8,
    creation_time: u32,
    pk_algo: PublicKeyAlgorithm,
    bits: usize,
    keyid: KeyID,
    fingerprint: Fingerprint,
    /// The digest state over the serialized key packet, accumulated
    /// by the parser.  Certification signatures finalize copies of
    /// it.
    hash: Option<DigestSet>,
}

impl Key {
    /// Returns a new `Key` packet.
    pub fn new(pk_algo: PublicKeyAlgorithm, bits: usize,
               creation_time: u32, fingerprint: Fingerprint)
               -> Self
    {
        let keyid = fingerprint.to_keyid();
        Key {
            version: 4,
            creation_time,
            pk_algo,
            bits,
            keyid,
            fingerprint,
            hash: None,
        }
    }

    /// Returns the packet version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the key's creation time in seconds since the epoch.
    pub fn creation_time(&self) -> u32 {
        self.creation_time
    }

    /// Returns the public key algorithm.
    pub fn pk_algo(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    /// Returns the size of the public key in bits.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Returns the key ID.
    pub fn keyid(&self) -> &KeyID {
        &self.keyid
    }

    /// Returns the fingerprint.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Returns the digest state accumulated over the key packet, if
    /// the parser provided one.
    pub fn hash(&self) -> Option<&DigestSet> {
        self.hash.as_ref()
    }

    /// Sets the digest state accumulated over the key packet.
    pub fn set_hash(&mut self, hash: DigestSet) -> Option<DigestSet> {
        self.hash.replace(hash)
    }
}

/// Holds a UserID packet.
///
/// See [Section 5.11 of RFC 4880] for details.
///
///   [Section 5.11 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.11
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct UserID {
    /// The user id.
    ///
    /// According to [RFC 4880], the text is by convention UTF-8
    /// encoded and in "mail name-addr" form.  There is no guarantee,
    /// though, so we keep the raw bytes.
    ///
    ///   [RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.11
    value: Vec<u8>,
}

impl UserID {
    /// Returns a new `UserID` packet.
    pub fn new<V: Into<Vec<u8>>>(value: V) -> Self {
        UserID { value: value.into() }
    }

    /// Returns the raw user id.
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl fmt::Debug for UserID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("UserID")
            .field(&String::from_utf8_lossy(&self.value))
            .finish()
    }
}

impl fmt::Display for UserID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.value))
    }
}

/// Holds a one-pass signature packet.
///
/// See [Section 5.4 of RFC 4880] for details.
///
///   [Section 5.4 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.4
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OnePassSig {
    version: u8,
    sigtype: SignatureType,
    hash_algo: HashAlgorithm,
    pk_algo: PublicKeyAlgorithm,
    issuer: KeyID,
    last: bool,
}

impl OnePassSig {
    /// Returns a new `OnePassSig` packet.
    pub fn new(sigtype: SignatureType, hash_algo: HashAlgorithm,
               pk_algo: PublicKeyAlgorithm, issuer: KeyID)
               -> Self
    {
        OnePassSig {
            version: 3,
            sigtype,
            hash_algo,
            pk_algo,
            issuer,
            last: true,
        }
    }

    /// Returns the type of the signature.
    pub fn typ(&self) -> SignatureType {
        self.sigtype
    }

    /// Returns the hash algorithm used to compute the signature.
    pub fn hash_algo(&self) -> HashAlgorithm {
        self.hash_algo
    }

    /// Returns the public key algorithm of the signature.
    pub fn pk_algo(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    /// Returns the key ID of the signing key.
    pub fn issuer(&self) -> &KeyID {
        &self.issuer
    }

    /// Returns whether this is the last one-pass signature before
    /// the data.
    pub fn last(&self) -> bool {
        self.last
    }
}

/// Holds a public-key encrypted session key packet.
///
/// See [Section 5.1 of RFC 4880] for details.
///
///   [Section 5.1 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.1
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PKESK {
    version: u8,
    recipient: KeyID,
    pk_algo: PublicKeyAlgorithm,
    /// The encrypted session key material.
    esk: Vec<u8>,
}

impl PKESK {
    /// Returns a new `PKESK` packet.
    pub fn new<E: Into<Vec<u8>>>(recipient: KeyID,
                                 pk_algo: PublicKeyAlgorithm, esk: E)
                                 -> Self
    {
        PKESK {
            version: 3,
            recipient,
            pk_algo,
            esk: esk.into(),
        }
    }

    /// Returns the key ID of the intended recipient.
    pub fn recipient(&self) -> &KeyID {
        &self.recipient
    }

    /// Returns the public key algorithm.
    pub fn pk_algo(&self) -> PublicKeyAlgorithm {
        self.pk_algo
    }

    /// Returns the encrypted session key material.
    pub fn esk(&self) -> &[u8] {
        &self.esk
    }
}

/// Holds a symmetrically encrypted data packet.
///
/// An encrypted data packet is a container; its decrypted content is
/// fed back through the packet source.  See [Section 5.7 of RFC 4880]
/// for details.
///
///   [Section 5.7 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.7
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Encrypted {
    version: u8,
}

impl Encrypted {
    /// Returns a new `Encrypted` packet.
    pub fn new() -> Self {
        Encrypted { version: 1 }
    }

    /// Returns the packet version.
    pub fn version(&self) -> u8 {
        self.version
    }
}

/// Holds a compressed data packet.
///
/// A compressed data packet is a container; its decompressed content
/// is fed back through the packet source.  See [Section 5.6 of RFC
/// 4880] for details.
///
///   [Section 5.6 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.6
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompressedData {
    algo: CompressionAlgorithm,
}

impl CompressedData {
    /// Returns a new `CompressedData` packet.
    pub fn new(algo: CompressionAlgorithm) -> Self {
        CompressedData { algo }
    }

    /// Returns the compression algorithm.
    pub fn algo(&self) -> CompressionAlgorithm {
        self.algo
    }
}

/// Holds a literal data packet.
///
/// A literal packet contains unstructured data; this is the plaintext
/// that digests are computed over.  See [Section 5.9 of RFC 4880] for
/// details.
///
///   [Section 5.9 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-5.9
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    /// A one-octet field that describes how the data is formatted,
    /// 'b', 't', or 'u'.
    format: u8,
    /// The embedded original filename, raw bytes.
    filename: Option<Vec<u8>>,
    /// A four-octet number that indicates a date associated with the
    /// literal data.
    date: u32,
    /// The literal data.
    body: Vec<u8>,
}

impl Literal {
    /// Returns a new `Literal` packet.
    pub fn new<B: Into<Vec<u8>>>(format: u8, body: B) -> Self {
        Literal {
            format,
            filename: None,
            date: 0,
            body: body.into(),
        }
    }

    /// Returns the format octet.
    pub fn format(&self) -> u8 {
        self.format
    }

    /// Returns the embedded original filename.
    pub fn filename(&self) -> Option<&[u8]> {
        self.filename.as_deref()
    }

    /// Sets the embedded original filename.
    pub fn set_filename<F: Into<Vec<u8>>>(&mut self, filename: F)
                                          -> Option<Vec<u8>>
    {
        self.filename.replace(filename.into())
    }

    /// Returns the date associated with the data.
    pub fn date(&self) -> u32 {
        self.date
    }

    /// Returns the literal data.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let filename = self.filename.as_ref()
            .map(|f| String::from_utf8_lossy(f));

        let threshold = 36;
        let prefix = &self.body[..::std::cmp::min(threshold, self.body.len())];
        let mut prefix_fmt = String::from_utf8_lossy(prefix).into_owned();
        if self.body.len() > threshold {
            prefix_fmt.push_str("...");
        }
        prefix_fmt.push_str(&format!(" ({} bytes)", self.body.len())[..]);

        f.debug_struct("Literal")
            .field("format", &(self.format as char))
            .field("filename", &filename)
            .field("date", &self.date)
            .field("body", &prefix_fmt)
            .finish()
    }
}
