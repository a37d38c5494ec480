use std::fmt;

/// Holds a KeyID.
///
/// A KeyID is a fingerprint fragment.  It identifies a public key,
/// but is easy to forge.  For more details about how a KeyID is
/// generated, see [Section 12.2 of RFC 4880].
///
///   [Section 12.2 of RFC 4880]: https://tools.ietf.org/html/rfc4880#section-12.2
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum KeyID {
    /// Lower 8 bytes of a 20 byte fingerprint.
    V4([u8; 8]),
    /// Used for holding key IDs that we don't understand.
    Invalid(Box<[u8]>),
}

impl fmt::Display for KeyID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.convert_to_string(false))
    }
}

impl fmt::Debug for KeyID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("KeyID")
            .field(&self.convert_to_string(false))
            .finish()
    }
}

impl From<u64> for KeyID {
    fn from(data: u64) -> Self {
        KeyID::new(data)
    }
}

impl KeyID {
    /// Converts a u64 to a KeyID.
    pub fn new(data: u64) -> KeyID {
        KeyID::V4(data.to_be_bytes())
    }

    /// Reads a binary key ID.
    pub fn from_bytes(raw: &[u8]) -> KeyID {
        if raw.len() == 8 {
            let mut keyid: [u8; 8] = Default::default();
            keyid.copy_from_slice(raw);
            KeyID::V4(keyid)
        } else {
            KeyID::Invalid(raw.to_vec().into_boxed_slice())
        }
    }

    /// Returns a reference to the raw KeyID.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            KeyID::V4(ref id) => id,
            KeyID::Invalid(ref id) => id,
        }
    }

    /// Returns the short, 4-byte form used in key listings.
    pub fn short(&self) -> String {
        let s = self.convert_to_string(false);
        if s.len() > 8 {
            s[s.len() - 8..].into()
        } else {
            s
        }
    }

    fn convert_to_string(&self, pretty: bool) -> String {
        use std::fmt::Write;

        let raw = self.as_slice();
        let mut s = String::with_capacity(raw.len() * 2 + raw.len() / 2);
        for (i, b) in raw.iter().enumerate() {
            if pretty && i > 0 && i % 2 == 0 {
                s.push(' ');
            }
            write!(s, "{:02X}", b).unwrap();
        }
        s
    }
}
