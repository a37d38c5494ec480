//! Packet stream processing.
//!
//! This module drives the pipeline: packets are pulled one at a time
//! from a [`PacketSource`], grouped into logical units (a key
//! certificate with its user IDs and signatures, a run of one-pass
//! signatures bracketing literal data, or a bare leading signature),
//! and processed.  Session keys are recovered from encrypted
//! session-key packets, plaintext is hashed as it is written out, and
//! once a group is complete its signatures are checked against the
//! accumulated digests.
//!
//! The cryptographic primitives, the key database, and all user
//! interaction live behind the [`ProcessingHelper`] trait; the
//! processor itself only sequences them.
//!
//!   [`PacketSource`]: trait.PacketSource.html
//!   [`ProcessingHelper`]: trait.ProcessingHelper.html
//!
//! # Example
//!
//! ```no_run
//! use procmsg::stream::{Options, Processor};
//! # use procmsg::stream::{PacketSource, ProcessingHelper};
//! # fn run<S: PacketSource, H: ProcessingHelper>(source: S, helper: H)
//! #     -> procmsg::Result<()> {
//! let mut p = Processor::new(helper, Options::default(), std::io::stdout());
//! p.process(source)?;
//! # Ok(()) }
//! ```

use std::io;
use std::io::Read;

use crate::Error;
use crate::Packet;
use crate::Result;
use crate::crypto::Dek;
use crate::crypto::hash::DigestSet;
use crate::packet::{CompressedData, Encrypted, Literal, PKESK, Tag};
use crate::packet::Signature;
use crate::status::Status;
use crate::types::{HashAlgorithm, SymmetricAlgorithm};

mod tree;
use tree::Tree;
mod verify;
mod list;

const TRACE: bool = false;

/// Yields the packets of one message.
///
/// The source owns the parser and, crucially, the filter stack:
/// when the processor asks the helper to decrypt or decompress a
/// container packet, the decoded content is fed back through the same
/// source, so the packets inside the container simply appear as the
/// next packets of the stream.
pub trait PacketSource {
    /// Returns the next packet.
    ///
    /// Returns `None` at the end of the stream.  A returned
    /// [`Error::CorruptedStream`] aborts processing; any other error
    /// drops the offending packet and the stream continues.
    ///
    ///   [`Error::CorruptedStream`]: ../enum.Error.html#variant.CorruptedStream
    fn next_packet(&mut self) -> Option<Result<Packet>>;

    /// Returns the name of the file the stream is read from, if any.
    ///
    /// Used to locate the data file belonging to a detached
    /// signature.
    fn filename(&self) -> Option<&str> {
        None
    }
}

/// Any iterator over parse results is a packet source.
impl<I> PacketSource for I
where
    I: Iterator<Item = Result<Packet>>,
{
    fn next_packet(&mut self) -> Option<Result<Packet>> {
        self.next()
    }
}

/// The processor's interface to the outside world.
///
/// All cryptography, key lookup, and user interaction happens here.
/// The processor tells the helper *what* to do and *when*; the helper
/// decides *how*.
pub trait ProcessingHelper {
    /// Recovers the session key from an encrypted session-key packet.
    ///
    /// Returning [`Error::OperationCancelled`] is handled silently;
    /// any other error is logged and the processor carries on without
    /// a session key.
    ///
    ///   [`Error::OperationCancelled`]: ../enum.Error.html#variant.OperationCancelled
    fn decrypt_session_key(&mut self, pkesk: &PKESK) -> Result<Dek>;

    /// Derives a session key from a passphrase.
    ///
    /// Called when an encrypted data packet is not preceded by any
    /// session-key packet, i.e. for conventionally encrypted
    /// messages.
    fn passphrase_dek(&mut self, algo: SymmetricAlgorithm) -> Result<Dek>;

    /// Decrypts an encrypted data packet with the given key.
    ///
    /// The decrypted content must be pushed back into the packet
    /// source, so that the contained packets appear as the next
    /// packets of the stream.
    fn decrypt_data(&mut self, encrypted: &Encrypted, dek: &Dek)
                    -> Result<()>;

    /// Decompresses a compressed data packet.
    ///
    /// Like [`decrypt_data`], the content is pushed back into the
    /// packet source.
    ///
    ///   [`decrypt_data`]: #tymethod.decrypt_data
    fn decompress(&mut self, compressed: &CompressedData) -> Result<()>;

    /// Checks a signature against the given digest.
    ///
    /// Returns `Ok(())` if the signature is valid.  Expected errors
    /// are [`Error::BadSignature`] if the digest does not match, and
    /// [`Error::NoPublicKey`] if the signing key cannot be found.
    ///
    ///   [`Error::BadSignature`]: ../enum.Error.html#variant.BadSignature
    ///   [`Error::NoPublicKey`]: ../enum.Error.html#variant.NoPublicKey
    fn verify_signature(&mut self, sig: &Signature, digest: &[u8])
                        -> Result<()>;

    /// Resolves a key ID to a displayable user ID.
    fn user_id(&mut self, issuer: &crate::KeyID) -> Option<String>;

    /// Opens the data file a detached signature was made over.
    ///
    /// `filename` is the name of the signature file, if known; the
    /// helper may derive the data file's name from it or ask the
    /// user.
    fn detached_data(&mut self, filename: Option<&str>)
                     -> Result<Box<dyn Read>>;

    /// Reports the outcome of one signature check.
    fn emit(&mut self, status: Status);
}

/// How the processor treats the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Decrypt, hash, and verify.
    Normal,
    /// Only group packets and render the groups; payload packets are
    /// classified but neither decrypted nor hashed.
    List,
}

/// Runtime options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Processing mode.
    pub mode: Mode,
    /// Diagnostic verbosity; some messages only appear above 1.
    pub verbose: u8,
    /// Print key fingerprints in listings.
    pub fingerprint: bool,
    /// Check signatures while listing.
    pub check_sigs: bool,
    /// Include certification signatures in listings.
    pub list_sigs: bool,
    /// Unattended operation; the first bad signature aborts.
    pub batch: bool,
    /// Cipher assumed for conventionally encrypted messages.
    pub def_cipher_algo: SymmetricAlgorithm,
    /// Digest computed over every literal packet.
    pub def_digest_algo: HashAlgorithm,
    /// Second digest computed alongside the default.
    pub secondary_digest_algo: HashAlgorithm,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            mode: Mode::Normal,
            verbose: 0,
            fingerprint: false,
            check_sigs: false,
            list_sigs: false,
            batch: false,
            def_cipher_algo: SymmetricAlgorithm::Blowfish,
            def_digest_algo: HashAlgorithm::RipeMD,
            secondary_digest_algo: HashAlgorithm::MD5,
        }
    }
}

/// Processes one packet stream.
///
/// See the [module documentation] for an overview.
///
///   [module documentation]: index.html
pub struct Processor<'a, H: ProcessingHelper> {
    helper: H,
    opt: Options,
    output: Box<dyn io::Write + 'a>,

    // The group currently being assembled.
    list: Option<Tree>,
    // A recovered session key waiting for its encrypted data packet.
    dek: Option<Dek>,
    // Whether the previous packet was an encrypted session key.
    last_was_pkesk: bool,
    // Whether plaintext has been seen, i.e. whether trailing
    // signatures have something to verify against.
    have_data: bool,
    // Digests accumulated over the plaintext.
    hashes: Option<DigestSet>,
    // Name of the input file, for locating detached data.
    source_name: Option<String>,
}

impl<'a, H: ProcessingHelper> Processor<'a, H> {
    /// Creates a processor writing recovered plaintext to `output`.
    pub fn new<W: io::Write + 'a>(helper: H, opt: Options, output: W)
                                  -> Self
    {
        Processor {
            helper,
            opt,
            output: Box::new(output),
            list: None,
            dek: None,
            last_was_pkesk: false,
            have_data: false,
            hashes: None,
            source_name: None,
        }
    }

    /// Returns a reference to the helper.
    pub fn helper_ref(&self) -> &H {
        &self.helper
    }

    /// Returns a mutable reference to the helper.
    pub fn helper_mut(&mut self) -> &mut H {
        &mut self.helper
    }

    /// Recovers the helper.
    pub fn into_helper(self) -> H {
        self.helper
    }

    /// Processes the stream to its end.
    ///
    /// Returns an error if the stream is corrupted beyond recovery,
    /// or, in batch mode, as soon as a signature turns out bad.
    pub fn process<S: PacketSource>(&mut self, mut source: S)
                                    -> Result<()>
    {
        tracer!(TRACE, "Processor::process");
        self.source_name = source.filename().map(|f| f.to_string());

        let mut fatal = None;
        while let Some(item) = source.next_packet() {
            let packet = match item {
                Ok(p) => p,
                Err(e) => {
                    if let Some(Error::CorruptedStream(_)) =
                        e.downcast_ref::<Error>()
                    {
                        fatal = Some(e);
                        break;
                    }
                    log::warn!("dropping malformed packet: {}", e);
                    continue;
                }
            };

            if self.dek.is_some() && packet.tag() != Tag::Encrypted {
                // A session key must be followed directly by the data
                // it decrypts.  Destroy the stray key.
                log::error!("oops: valid session key packet not followed \
                             by encrypted data");
                self.dek = None;
            }

            t!("dispatching {:?}", packet);
            self.dispatch(packet)?;
        }

        let flushed = self.release_list();
        self.dek = None;
        self.hashes = None;
        self.last_was_pkesk = false;
        self.have_data = false;

        if let Some(e) = fatal {
            return Err(e);
        }
        flushed
    }

    fn dispatch(&mut self, packet: Packet) -> Result<()> {
        tracer!(TRACE, "Processor::dispatch");
        let tag = packet.tag();

        match packet {
            Packet::PublicKey(_) | Packet::SecretKey(_) =>
                self.add_key(packet)?,
            Packet::UserID(_) => self.add_user_id(packet),
            Packet::Signature(_) => self.add_signature(packet),
            Packet::OnePassSig(_) => self.add_onepass_sig(packet)?,

            // The payload packets are not grouped; they are handled
            // on the spot, or merely classified in listing mode.
            Packet::PKESK(p) => if self.opt.mode == Mode::Normal {
                self.proc_pkesk(p);
            } else {
                t!("skipping {} in listing mode", tag);
            },
            Packet::Encrypted(p) => if self.opt.mode == Mode::Normal {
                self.proc_encrypted(p);
            } else {
                t!("skipping {} in listing mode", tag);
            },
            Packet::CompressedData(p) => if self.opt.mode == Mode::Normal {
                self.proc_compressed(p);
            } else {
                t!("skipping {} in listing mode", tag);
            },
            Packet::Literal(p) => if self.opt.mode == Mode::Normal {
                self.proc_literal(p);
            } else {
                t!("skipping {} in listing mode", tag);
            },
        }

        if tag != Tag::Signature {
            self.have_data = tag == Tag::Literal;
        }
        Ok(())
    }

    fn add_key(&mut self, packet: Packet) -> Result<()> {
        self.release_list()?;
        self.list = Some(Tree::new(packet));
        Ok(())
    }

    fn add_user_id(&mut self, packet: Packet) {
        match self.list.as_mut() {
            Some(tree) => {
                tree.append(packet);
            }
            None => log::error!("orphaned user id"),
        }
    }

    fn add_signature(&mut self, packet: Packet) {
        if let Some(tree) = self.list.as_mut() {
            tree.append(packet);
        } else {
            // A leading signature without a one-pass packet, the old
            // style.
            self.list = Some(Tree::new(packet));
        }
    }

    fn add_onepass_sig(&mut self, packet: Packet) -> Result<()> {
        if let Some(tree) = self.list.as_ref() {
            if tree.packet(tree.root()).tag() == Tag::OnePassSig {
                // Another one-pass signature over the same data.
                if let Some(tree) = self.list.as_mut() {
                    tree.append(packet);
                }
                return Ok(());
            }
            log::error!("one-pass signature with another packet in between");
        }
        self.release_list()?;
        self.list = Some(Tree::new(packet));
        Ok(())
    }

    fn proc_pkesk(&mut self, pkesk: PKESK) {
        tracer!(TRACE, "Processor::proc_pkesk");
        self.last_was_pkesk = true;

        if pkesk.pk_algo().is_supported() {
            self.dek = None;
            match self.helper.decrypt_session_key(&pkesk) {
                Ok(dek) => {
                    if self.opt.verbose > 1 {
                        log::info!("public key encrypted data: good DEK");
                    }
                    self.dek = Some(dek);
                }
                Err(e) => match e.downcast_ref::<Error>() {
                    Some(Error::OperationCancelled) => t!("cancelled"),
                    _ => log::error!("public key decryption failed: {}", e),
                },
            }
        } else {
            log::error!("unsupported public key algorithm: {}",
                        pkesk.pk_algo());
        }
    }

    fn proc_encrypted(&mut self, encrypted: Encrypted) {
        tracer!(TRACE, "Processor::proc_encrypted");

        let mut result = Ok(());
        if self.dek.is_none() && !self.last_was_pkesk {
            // No session-key packet preceded us, so the message must
            // be conventionally encrypted.
            match self.helper.passphrase_dek(self.opt.def_cipher_algo) {
                Ok(dek) => self.dek = Some(dek),
                Err(e) => result = Err(e),
            }
        } else if self.dek.is_none() {
            result = Err(Error::NoSecretKey.into());
        }

        if result.is_ok() {
            if let Some(dek) = self.dek.as_ref() {
                result = self.helper.decrypt_data(&encrypted, dek);
            }
        }
        // Consumed or not, the key's lifetime ends here.
        self.dek = None;

        match result {
            Ok(()) => if self.opt.verbose > 1 {
                log::info!("decryption okay");
            },
            Err(e) => match e.downcast_ref::<Error>() {
                Some(Error::OperationCancelled) => t!("cancelled"),
                _ => log::error!("decryption failed: {}", e),
            },
        }
        self.last_was_pkesk = false;
    }

    fn proc_compressed(&mut self, compressed: CompressedData) {
        if let Err(e) = self.helper.decompress(&compressed) {
            log::error!("uncompressing failed: {}", e);
        }
        self.last_was_pkesk = false;
    }

    fn proc_literal(&mut self, literal: Literal) {
        tracer!(TRACE, "Processor::proc_literal");
        if self.opt.verbose > 0 {
            if let Some(name) = literal.filename() {
                log::info!("original file name='{}'",
                           String::from_utf8_lossy(name));
            }
        }

        self.hashes = None;
        // TODO: take the digest algorithms from the one-pass
        // signature packets of the open group instead of always
        // hashing the default pair.
        let mut hashes = DigestSet::new();
        for algo in [self.opt.def_digest_algo,
                     self.opt.secondary_digest_algo] {
            if let Err(e) = hashes.enable(algo) {
                log::error!("cannot hash with {}: {}", algo, e);
            }
        }

        hashes.update(literal.body());
        if let Err(e) = self.output.write_all(literal.body()) {
            log::error!("writing plaintext failed: {}", e);
        }

        self.hashes = Some(hashes);
        self.last_was_pkesk = false;
    }

    /// Finalizes and releases the current group, if any.
    fn release_list(&mut self) -> Result<()> {
        match self.list.take() {
            Some(tree) => self.proc_tree(&tree),
            None => Ok(()),
        }
    }
}
