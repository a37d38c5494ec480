use std::fmt;

use crate::KeyID;

/// Holds a fingerprint.
///
/// A fingerprint uniquely identifies a public key.  For more details
/// about how a fingerprint is generated, see [Section 12.2 of RFC
/// 4880].
///
///   [Section 12.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-12.2
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum Fingerprint {
    /// 20 byte SHA-1 hash.
    V4([u8; 20]),
    /// Used for holding fingerprints that we don't understand.  For
    /// instance, we don't grok v3 fingerprints.
    Invalid(Box<[u8]>),
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.convert_to_string(true))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Fingerprint")
            .field(&self.convert_to_string(false))
            .finish()
    }
}

impl Fingerprint {
    /// Reads a binary fingerprint.
    pub fn from_bytes(raw: &[u8]) -> Fingerprint {
        if raw.len() == 20 {
            let mut fp: [u8; 20] = Default::default();
            fp.copy_from_slice(raw);
            Fingerprint::V4(fp)
        } else {
            Fingerprint::Invalid(raw.to_vec().into_boxed_slice())
        }
    }

    /// Returns a reference to the raw fingerprint.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Fingerprint::V4(ref fp) => fp,
            Fingerprint::Invalid(ref fp) => fp,
        }
    }

    /// Converts the fingerprint to a key ID.
    pub fn to_keyid(&self) -> KeyID {
        match self {
            Fingerprint::V4(fp) =>
                KeyID::from_bytes(&fp[fp.len() - 8..]),
            Fingerprint::Invalid(fp) if fp.len() >= 8 =>
                KeyID::from_bytes(&fp[fp.len() - 8..]),
            Fingerprint::Invalid(fp) =>
                KeyID::Invalid(fp.clone()),
        }
    }

    /// Converts the fingerprint to a hexadecimal number.
    pub fn to_hex(&self) -> String {
        self.convert_to_string(false)
    }

    // 20 byte fingerprints are rendered in 2-byte groups with a gap
    // in the middle, anything else byte-wise in 8-byte groups.
    fn convert_to_string(&self, pretty: bool) -> String {
        use std::fmt::Write;

        let raw = self.as_slice();
        let mut s = String::with_capacity(raw.len() * 3);
        if pretty && raw.len() == 20 {
            for (i, pair) in raw.chunks(2).enumerate() {
                if i > 0 {
                    s.push(' ');
                }
                if i == 5 {
                    s.push(' ');
                }
                write!(s, "{:02X}{:02X}", pair[0], pair[1]).unwrap();
            }
        } else {
            for (i, b) in raw.iter().enumerate() {
                if pretty && i > 0 && i % 8 == 0 {
                    s.push(' ');
                }
                write!(s, "{:02X}", b).unwrap();
            }
        }
        s
    }
}
