//! Machine-readable status events.
//!
//! Outer tooling driving the processor often wants to know the
//! outcome of every signature check without scraping the log.  The
//! processor reports each verified signature as a [`Status`] event
//! through [`ProcessingHelper::emit`].
//!
//!   [`Status`]: enum.Status.html
//!   [`ProcessingHelper::emit`]: ../stream/trait.ProcessingHelper.html#tymethod.emit

use std::fmt;

use crate::KeyID;

/// The outcome of checking one signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// The signature verified against the computed digest.
    GoodSig {
        /// The key that made the signature.
        issuer: KeyID,
    },

    /// The signature did not match the computed digest.
    BadSig {
        /// The key that made the signature.
        issuer: KeyID,
    },

    /// The signature could not be checked at all.
    ErrSig {
        /// The key that made the signature.
        issuer: KeyID,
        /// Why the check was impossible.
        reason: String,
    },
}

impl Status {
    /// Returns the key ID the event refers to.
    pub fn issuer(&self) -> &KeyID {
        match self {
            Status::GoodSig { issuer } => issuer,
            Status::BadSig { issuer } => issuer,
            Status::ErrSig { issuer, .. } => issuer,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::GoodSig { issuer } =>
                write!(f, "GOODSIG {}", issuer),
            Status::BadSig { issuer } =>
                write!(f, "BADSIG {}", issuer),
            Status::ErrSig { issuer, reason } =>
                write!(f, "ERRSIG {} {}", issuer, reason),
        }
    }
}
