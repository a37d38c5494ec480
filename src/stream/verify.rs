//! Finalizing groups and checking their signatures.

use std::io;

use crate::Error;
use crate::Packet;
use crate::Result;
use crate::crypto::hash::DigestSet;
use crate::packet::Tag;
use crate::status::Status;

use super::{Mode, ProcessingHelper, Processor, TRACE};
use super::tree::{NodeHandle, Tree};

impl<'a, H: ProcessingHelper> Processor<'a, H> {
    /// Processes a completed group.
    pub(super) fn proc_tree(&mut self, tree: &Tree) -> Result<()> {
        tracer!(TRACE, "Processor::proc_tree");
        let root = tree.root();

        match tree.packet(root) {
            Packet::PublicKey(_) | Packet::SecretKey(_) =>
                self.list_node(tree, root)?,

            Packet::OnePassSig(_) => {
                if self.opt.mode == Mode::List {
                    let mut h = root;
                    while let Some(n) = tree.find_next(h, Tag::Signature) {
                        self.list_node(tree, n)?;
                        h = n;
                    }
                    return Ok(());
                }

                if !self.have_data {
                    // The signatures are detached; hash the data file
                    // with every algorithm a trailing signature asks
                    // for.
                    self.hashes = None;
                    let mut hashes = DigestSet::new();
                    let mut h = root;
                    while let Some(n) = tree.find_next(h, Tag::Signature) {
                        if let Packet::Signature(sig) = tree.packet(n) {
                            match sig.digest_algo() {
                                Ok(algo) =>
                                    if let Err(e) = hashes.enable(algo) {
                                        log::error!(
                                            "cannot hash with {}: {}",
                                            algo, e);
                                    },
                                Err(e) => log::error!(
                                    "cannot check signature: {}", e),
                            }
                        }
                        h = n;
                    }

                    if let Err(e) = self.hash_detached(&mut hashes) {
                        log::error!("can't hash datafile: {}", e);
                        return Ok(());
                    }
                    self.hashes = Some(hashes);
                }

                let mut h = root;
                while let Some(n) = tree.find_next(h, Tag::Signature) {
                    self.check_sig_and_print(tree, n)?;
                    h = n;
                }
            }

            Packet::Signature(sig) => {
                if self.opt.mode == Mode::List {
                    return self.list_node(tree, root);
                }

                if !self.have_data && sig.typ().is_certification() {
                    log::info!("old style signature");
                    // Detached, with the digest algorithm taken from
                    // the signature itself.
                    self.hashes = None;
                    let mut hashes =
                        match sig.digest_algo().and_then(DigestSet::with) {
                            Ok(h) => h,
                            Err(e) => {
                                log::error!("cannot check signature: {}", e);
                                return Ok(());
                            }
                        };
                    if let Err(e) = self.hash_detached(&mut hashes) {
                        log::error!("can't hash datafile: {}", e);
                        return Ok(());
                    }
                    self.hashes = Some(hashes);
                }

                self.check_sig_and_print(tree, root)?;
            }

            other => log::error!("invalid root packet of type {}",
                                 other.tag()),
        }
        Ok(())
    }

    /// Computes the digest a signature was made over and asks the
    /// helper to check it.
    ///
    /// Document signatures finalize a copy of the digests accumulated
    /// over the plaintext; certification signatures finalize the
    /// certified key's digest state extended by the user id being
    /// certified.
    pub(super) fn check_signature(&mut self, tree: &Tree, node: NodeHandle)
                                  -> Result<()>
    {
        tracer!(TRACE, "Processor::check_signature");
        let sig = match tree.packet(node) {
            Packet::Signature(sig) => sig,
            _ => return Err(Error::InvalidOperation(
                "node is not a signature".into()).into()),
        };
        let algo = sig.digest_algo()?;
        t!("checking class {} with {}", sig.typ(), algo);

        let digest = if sig.typ().is_document() {
            // Class 0x01 is hashed exactly like class 0x00; we rely
            // on the source to canonicalize text input.
            let hashes = self.hashes.as_ref()
                .ok_or_else(|| Error::InvalidOperation(
                    "no plaintext has been hashed".into()))?;
            hashes.digest(algo)?
        } else if sig.typ().is_certification() {
            let key = match tree.packet(tree.root()) {
                Packet::PublicKey(key) => key,
                _ => {
                    log::error!("certification signature in the \
                                 wrong context");
                    return Err(Error::UnsupportedSignatureType(
                        sig.typ()).into());
                }
            };
            let uid = match tree.find_prev(node, Tag::UserID)
                .map(|h| tree.packet(h))
            {
                Some(Packet::UserID(uid)) => uid,
                _ => {
                    log::error!("certification signature without \
                                 a user id");
                    return Err(Error::UnsupportedSignatureType(
                        sig.typ()).into());
                }
            };
            let base = key.hash()
                .ok_or_else(|| Error::InvalidOperation(
                    "key packet carries no digest state".into()))?;
            let mut hashes = base.clone();
            hashes.update(uid.value());
            hashes.digest(algo)?
        } else {
            return Err(Error::UnsupportedSignatureType(sig.typ()).into());
        };

        self.helper.verify_signature(sig, &digest)
    }

    /// Checks one signature and reports the outcome.
    ///
    /// In batch mode a bad signature is fatal and propagates as an
    /// error; every other outcome is reported and processing goes on.
    pub(super) fn check_sig_and_print(&mut self, tree: &Tree,
                                      node: NodeHandle)
                                      -> Result<()>
    {
        let issuer = match tree.packet(node) {
            Packet::Signature(sig) => sig.issuer().clone(),
            _ => return Ok(()),
        };

        match self.check_signature(tree, node) {
            Ok(()) => {
                let signer = self.helper.user_id(&issuer)
                    .unwrap_or_else(|| "[User ID not found]".into());
                log::info!("Good signature from \"{}\"", signer);
                self.helper.emit(Status::GoodSig { issuer });
            }
            Err(e) => {
                if matches!(e.downcast_ref::<Error>(),
                            Some(Error::BadSignature(_)))
                {
                    let signer = self.helper.user_id(&issuer)
                        .unwrap_or_else(|| "[User ID not found]".into());
                    log::error!("BAD signature from \"{}\"", signer);
                    self.helper.emit(Status::BadSig { issuer });
                    if self.opt.batch {
                        return Err(e);
                    }
                } else {
                    log::error!("can't check signature made by {}: {}",
                                issuer, e);
                    self.helper.emit(Status::ErrSig {
                        issuer,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Hashes the data file a detached signature was made over.
    fn hash_detached(&mut self, hashes: &mut DigestSet) -> Result<()> {
        let name = self.source_name.clone();
        let mut data = self.helper.detached_data(name.as_deref())?;
        io::copy(&mut data, hashes)?;
        Ok(())
    }
}
