//! End-to-end tests driving the processor over scripted packet
//! streams.

use std::io;
use std::io::Read;

use procmsg::Error;
use procmsg::Fingerprint;
use procmsg::KeyID;
use procmsg::Packet;
use procmsg::Result;
use procmsg::crypto::Dek;
use procmsg::crypto::hash::DigestSet;
use procmsg::packet::{
    CompressedData,
    Encrypted,
    Key,
    Literal,
    OnePassSig,
    PKESK,
    Signature,
    SignatureMaterial,
    UserID,
};
use procmsg::status::Status;
use procmsg::stream::{Mode, Options, ProcessingHelper, Processor};
use procmsg::types::{
    HashAlgorithm,
    PublicKeyAlgorithm,
    SignatureType,
    SymmetricAlgorithm,
};

/// Issuer whose signatures verify, with a known user id.
const GOOD: u64 = 0x1111111111111111;
/// Issuer whose signatures never match the digest.
const BAD: u64 = 0x2222222222222222;
/// Issuer whose key cannot be found.
const MISSING: u64 = 0x3333333333333333;

#[derive(Default)]
struct Helper {
    /// Data returned for detached-signature verification.
    detached: Option<Vec<u8>>,
    /// Every (issuer, digest) pair submitted for verification.
    verified: Vec<(KeyID, Vec<u8>)>,
    statuses: Vec<Status>,
    decryptions: usize,
    decompressions: usize,
}

impl ProcessingHelper for Helper {
    fn decrypt_session_key(&mut self, _: &PKESK) -> Result<Dek> {
        Ok(Dek::new(SymmetricAlgorithm::AES128, vec![0u8; 16]))
    }

    fn passphrase_dek(&mut self, algo: SymmetricAlgorithm) -> Result<Dek> {
        Ok(Dek::new(algo, vec![0u8; 16]))
    }

    fn decrypt_data(&mut self, _: &Encrypted, _: &Dek) -> Result<()> {
        self.decryptions += 1;
        Ok(())
    }

    fn decompress(&mut self, _: &CompressedData) -> Result<()> {
        self.decompressions += 1;
        Ok(())
    }

    fn verify_signature(&mut self, sig: &Signature, digest: &[u8])
                        -> Result<()> {
        self.verified.push((sig.issuer().clone(), digest.to_vec()));
        if sig.issuer() == &KeyID::new(BAD) {
            Err(Error::BadSignature("digest mismatch".into()).into())
        } else if sig.issuer() == &KeyID::new(MISSING) {
            Err(Error::NoPublicKey(sig.issuer().clone()).into())
        } else {
            Ok(())
        }
    }

    fn user_id(&mut self, issuer: &KeyID) -> Option<String> {
        if issuer == &KeyID::new(GOOD) {
            Some("Alice Example <alice@example.org>".into())
        } else {
            None
        }
    }

    fn detached_data(&mut self, _: Option<&str>) -> Result<Box<dyn Read>> {
        match &self.detached {
            Some(data) => Ok(Box::new(io::Cursor::new(data.clone()))),
            None => Err(Error::OperationCancelled.into()),
        }
    }

    fn emit(&mut self, status: Status) {
        self.statuses.push(status);
    }
}

fn run(helper: Helper, opt: Options, packets: Vec<Packet>)
       -> (Result<()>, Helper, String)
{
    let _ = env_logger::builder().is_test(true).try_init();
    let mut out = Vec::new();
    let (result, helper) = {
        let mut p = Processor::new(helper, opt, &mut out);
        let result = p.process(packets.into_iter().map(Ok));
        (result, p.into_helper())
    };
    (result, helper, String::from_utf8_lossy(&out).into_owned())
}

fn onepass(issuer: u64, algo: HashAlgorithm) -> Packet {
    Packet::OnePassSig(OnePassSig::new(
        SignatureType::Binary, algo,
        PublicKeyAlgorithm::RSAEncryptSign, KeyID::new(issuer)))
}

fn sig(issuer: u64, class: SignatureType, algo: HashAlgorithm) -> Packet {
    Packet::Signature(Signature::new(
        class, PublicKeyAlgorithm::RSAEncryptSign,
        KeyID::new(issuer), 1_000_000_000,
        SignatureMaterial::Rsa { digest_algo: algo, s: vec![1] }))
}

fn literal(body: &[u8]) -> Packet {
    Packet::Literal(Literal::new(b'b', body))
}

/// A public key whose packet bytes have been hashed into a digest
/// state, as the parser would do.
fn pubkey(packet_body: &[u8]) -> Packet {
    let mut key = Key::new(PublicKeyAlgorithm::RSAEncryptSign, 1024,
                           946_684_800, Fingerprint::from_bytes(&[7; 20]));
    let mut hash = DigestSet::with(HashAlgorithm::RipeMD).unwrap();
    hash.update(packet_body);
    key.set_hash(hash);
    Packet::PublicKey(key)
}

fn digest_of(algo: HashAlgorithm, chunks: &[&[u8]]) -> Vec<u8> {
    let mut ctx = algo.context().unwrap();
    for chunk in chunks {
        ctx.update(chunk);
    }
    ctx.into_digest()
}

#[test]
fn one_pass_signature_verifies_against_the_plaintext() {
    let (result, helper, out) = run(
        Helper::default(), Options::default(),
        vec![
            onepass(GOOD, HashAlgorithm::RipeMD),
            literal(b"the quick brown fox"),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::RipeMD),
        ]);
    result.unwrap();

    // The plaintext reached the output.
    assert_eq!(out, "the quick brown fox");

    // The digest handed to the verifier matches an independent
    // computation over the same plaintext.
    assert_eq!(helper.verified.len(), 1);
    assert_eq!(helper.verified[0].1,
               digest_of(HashAlgorithm::RipeMD,
                         &[b"the quick brown fox"]));
    assert_eq!(helper.statuses,
               vec![Status::GoodSig { issuer: KeyID::new(GOOD) }]);
}

#[test]
fn text_signature_is_hashed_like_binary() {
    // Class 0x01 is treated exactly like class 0x00; the source is
    // responsible for canonicalizing text input.
    let (result, helper, _) = run(
        Helper::default(), Options::default(),
        vec![
            onepass(GOOD, HashAlgorithm::RipeMD),
            literal(b"line one\r\nline two\r\n"),
            sig(GOOD, SignatureType::Text, HashAlgorithm::RipeMD),
        ]);
    result.unwrap();

    assert_eq!(helper.verified[0].1,
               digest_of(HashAlgorithm::RipeMD,
                         &[b"line one\r\nline two\r\n"]));
}

#[test]
fn detached_signature_hashes_the_data_file() {
    let helper = Helper {
        detached: Some(b"detached payload".to_vec()),
        ..Helper::default()
    };
    let (result, helper, out) = run(
        helper, Options::default(),
        vec![
            onepass(GOOD, HashAlgorithm::SHA256),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::SHA256),
        ]);
    result.unwrap();

    // No literal packet, so nothing is written out.
    assert_eq!(out, "");
    // The digest algorithm comes from the signature, not from the
    // defaults.
    assert_eq!(helper.verified[0].1,
               digest_of(HashAlgorithm::SHA256, &[b"detached payload"]));
    assert_eq!(helper.statuses,
               vec![Status::GoodSig { issuer: KeyID::new(GOOD) }]);
}

#[test]
fn detached_signatures_with_different_digests_both_verify() {
    let helper = Helper {
        detached: Some(b"shared data".to_vec()),
        ..Helper::default()
    };
    let (result, helper, _) = run(
        helper, Options::default(),
        vec![
            onepass(GOOD, HashAlgorithm::SHA256),
            onepass(GOOD, HashAlgorithm::RipeMD),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::RipeMD),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::SHA256),
        ]);
    result.unwrap();

    assert_eq!(helper.verified.len(), 2);
    assert_eq!(helper.verified[0].1,
               digest_of(HashAlgorithm::RipeMD, &[b"shared data"]));
    assert_eq!(helper.verified[1].1,
               digest_of(HashAlgorithm::SHA256, &[b"shared data"]));
}

#[test]
fn certification_covers_key_and_user_id() {
    let (result, helper, out) = run(
        Helper::default(),
        Options {
            list_sigs: true,
            check_sigs: true,
            ..Options::default()
        },
        vec![
            pubkey(b"key packet body"),
            Packet::UserID(UserID::new("alice")),
            sig(GOOD, SignatureType::GenericCertification,
                HashAlgorithm::RipeMD),
        ]);
    result.unwrap();

    // The certification digest covers the key packet followed by the
    // certified user id.
    assert_eq!(helper.verified[0].1,
               digest_of(HashAlgorithm::RipeMD,
                         &[b"key packet body", b"alice"]));
    // The certificate was rendered.
    assert!(out.contains("pub"));
    assert!(out.contains("alice"));
}

#[test]
fn certification_uses_the_nearest_preceding_user_id() {
    let (result, helper, _) = run(
        Helper::default(),
        Options {
            list_sigs: true,
            check_sigs: true,
            ..Options::default()
        },
        vec![
            pubkey(b"key packet body"),
            Packet::UserID(UserID::new("alice")),
            sig(GOOD, SignatureType::GenericCertification,
                HashAlgorithm::RipeMD),
            Packet::UserID(UserID::new("bob")),
            sig(GOOD, SignatureType::PositiveCertification,
                HashAlgorithm::RipeMD),
        ]);
    result.unwrap();

    assert_eq!(helper.verified.len(), 2);
    assert_eq!(helper.verified[0].1,
               digest_of(HashAlgorithm::RipeMD,
                         &[b"key packet body", b"alice"]));
    assert_eq!(helper.verified[1].1,
               digest_of(HashAlgorithm::RipeMD,
                         &[b"key packet body", b"bob"]));
}

#[test]
fn a_new_root_flushes_the_previous_group() {
    let (result, _, out) = run(
        Helper::default(), Options::default(),
        vec![
            pubkey(b"first key"),
            Packet::UserID(UserID::new("alice")),
            pubkey(b"second key"),
            Packet::UserID(UserID::new("bob")),
        ]);
    result.unwrap();

    let pubs = out.matches("pub").count();
    assert_eq!(pubs, 2);
    let alice = out.find("alice").unwrap();
    let bob = out.find("bob").unwrap();
    assert!(alice < bob);
}

#[test]
fn certificate_without_user_id_is_flagged() {
    let (result, _, out) = run(
        Helper::default(), Options::default(),
        vec![pubkey(b"lonely key")]);
    result.unwrap();

    assert!(out.contains("ERROR: no user id!"));
}

#[test]
fn bad_signature_in_batch_mode_aborts() {
    let (result, helper, _) = run(
        Helper::default(),
        Options { batch: true, ..Options::default() },
        vec![
            onepass(BAD, HashAlgorithm::RipeMD),
            literal(b"tampered"),
            sig(BAD, SignatureType::Binary, HashAlgorithm::RipeMD),
        ]);

    let err = result.unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(),
                     Some(Error::BadSignature(_))));
    // The outcome is still reported before the abort.
    assert_eq!(helper.statuses,
               vec![Status::BadSig { issuer: KeyID::new(BAD) }]);
}

#[test]
fn bad_signature_without_batch_continues() {
    let (result, helper, _) = run(
        Helper::default(), Options::default(),
        vec![
            onepass(BAD, HashAlgorithm::RipeMD),
            onepass(GOOD, HashAlgorithm::RipeMD),
            literal(b"data"),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::RipeMD),
            sig(BAD, SignatureType::Binary, HashAlgorithm::RipeMD),
        ]);
    result.unwrap();

    assert_eq!(helper.statuses, vec![
        Status::GoodSig { issuer: KeyID::new(GOOD) },
        Status::BadSig { issuer: KeyID::new(BAD) },
    ]);
}

#[test]
fn unknown_issuer_reports_an_error_status() {
    let (result, helper, _) = run(
        Helper::default(), Options::default(),
        vec![
            onepass(MISSING, HashAlgorithm::RipeMD),
            literal(b"data"),
            sig(MISSING, SignatureType::Binary, HashAlgorithm::RipeMD),
        ]);
    result.unwrap();

    assert!(matches!(helper.statuses[0],
                     Status::ErrSig { ref issuer, .. }
                     if issuer == &KeyID::new(MISSING)));
}

#[test]
fn unsupported_digest_reports_an_error_status() {
    let (result, helper, _) = run(
        Helper::default(), Options::default(),
        vec![
            onepass(GOOD, HashAlgorithm::RipeMD),
            literal(b"data"),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::Unknown(42)),
        ]);
    result.unwrap();

    // Verification was never attempted.
    assert!(helper.verified.is_empty());
    assert!(matches!(helper.statuses[0], Status::ErrSig { .. }));
}

#[test]
fn encrypted_then_compressed_then_literal() {
    let (result, helper, out) = run(
        Helper::default(), Options::default(),
        vec![
            Packet::PKESK(PKESK::new(KeyID::new(GOOD),
                                     PublicKeyAlgorithm::RSAEncryptSign,
                                     vec![0xAA; 64])),
            Packet::Encrypted(Encrypted::new()),
            // What the helper's filters would reveal.
            Packet::CompressedData(CompressedData::new(1.into())),
            onepass(GOOD, HashAlgorithm::RipeMD),
            literal(b"secret message"),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::RipeMD),
        ]);
    result.unwrap();

    assert_eq!(helper.decryptions, 1);
    assert_eq!(helper.decompressions, 1);
    assert_eq!(out, "secret message");
    assert_eq!(helper.statuses,
               vec![Status::GoodSig { issuer: KeyID::new(GOOD) }]);
}

#[test]
fn listing_mode_renders_without_processing() {
    let (result, helper, out) = run(
        Helper::default(),
        Options {
            mode: Mode::List,
            fingerprint: true,
            ..Options::default()
        },
        vec![
            pubkey(b"key packet body"),
            Packet::UserID(UserID::new("alice")),
            sig(GOOD, SignatureType::GenericCertification,
                HashAlgorithm::RipeMD),
            Packet::PKESK(PKESK::new(KeyID::new(GOOD),
                                     PublicKeyAlgorithm::RSAEncryptSign,
                                     vec![1, 2, 3])),
            Packet::Encrypted(Encrypted::new()),
            literal(b"must not appear"),
        ]);
    result.unwrap();

    // Nothing was decrypted, hashed, or copied out.
    assert_eq!(helper.decryptions, 0);
    assert!(helper.verified.is_empty());
    assert!(!out.contains("must not appear"));

    assert!(out.contains("pub"));
    assert!(out.contains("alice"));
    assert!(out.contains("Key fingerprint ="));
}

#[test]
fn listing_marks_signature_outcomes() {
    let (result, _, out) = run(
        Helper::default(),
        Options {
            mode: Mode::List,
            list_sigs: true,
            check_sigs: true,
            ..Options::default()
        },
        vec![
            pubkey(b"key packet body"),
            Packet::UserID(UserID::new("alice")),
            sig(GOOD, SignatureType::GenericCertification,
                HashAlgorithm::RipeMD),
            sig(BAD, SignatureType::GenericCertification,
                HashAlgorithm::RipeMD),
            sig(MISSING, SignatureType::GenericCertification,
                HashAlgorithm::RipeMD),
            sig(GOOD, SignatureType::GenericCertification,
                HashAlgorithm::Unknown(42)),
        ]);
    result.unwrap();

    assert!(out.contains("sig!"));
    assert!(out.contains("sig-"));
    assert!(out.contains("sig?"));
    assert!(out.contains("sig%"));
    // The good signature names its maker.
    assert!(out.contains("Alice Example"));
}

#[test]
fn secret_key_lists_with_a_sec_header() {
    let mut key = Key::new(PublicKeyAlgorithm::DSA, 1024, 946_684_800,
                           Fingerprint::from_bytes(&[9; 20]));
    let mut hash = DigestSet::with(HashAlgorithm::RipeMD).unwrap();
    hash.update(b"secret key body");
    key.set_hash(hash);

    let (result, _, out) = run(
        Helper::default(), Options::default(),
        vec![
            Packet::SecretKey(key),
            Packet::UserID(UserID::new("carol")),
        ]);
    result.unwrap();

    assert!(out.starts_with("sec"));
    assert!(out.contains("carol"));
    // DSA keys carry the 'D' algorithm letter.
    assert!(out.contains("D/"));
}

#[test]
fn orphaned_user_id_is_dropped() {
    let (result, helper, out) = run(
        Helper::default(), Options::default(),
        vec![
            Packet::UserID(UserID::new("nobody")),
            onepass(GOOD, HashAlgorithm::RipeMD),
            literal(b"data"),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::RipeMD),
        ]);
    result.unwrap();

    // The stray user id neither opened a group nor joined the one
    // that follows; the message after it verifies normally.
    assert_eq!(out, "data");
    assert!(!out.contains("nobody"));
    assert_eq!(helper.statuses,
               vec![Status::GoodSig { issuer: KeyID::new(GOOD) }]);
}

#[test]
fn reprocessing_the_same_stream_gives_identical_results() {
    let packets = vec![
        onepass(GOOD, HashAlgorithm::RipeMD),
        onepass(BAD, HashAlgorithm::RipeMD),
        literal(b"stable input"),
        sig(BAD, SignatureType::Binary, HashAlgorithm::RipeMD),
        sig(GOOD, SignatureType::Binary, HashAlgorithm::RipeMD),
    ];
    let (r1, h1, o1) = run(Helper::default(), Options::default(),
                           packets.clone());
    let (r2, h2, o2) = run(Helper::default(), Options::default(),
                           packets);
    r1.unwrap();
    r2.unwrap();

    // Processing leaves no state behind that a second, fresh run
    // would see.
    assert_eq!(h1.verified, h2.verified);
    assert_eq!(h1.statuses, h2.statuses);
    assert_eq!(o1, o2);
}

#[test]
fn secret_key_user_ids_are_not_indented() {
    let key = Key::new(PublicKeyAlgorithm::RSAEncryptSign, 2048,
                       946_684_800, Fingerprint::from_bytes(&[3; 20]));
    let (result, _, out) = run(
        Helper::default(), Options::default(),
        vec![
            Packet::SecretKey(key),
            Packet::UserID(UserID::new("erin")),
            Packet::UserID(UserID::new("frank")),
        ]);
    result.unwrap();

    // The first user id shares the header line; follow-up ones start
    // at column zero, unlike in the public listing.
    assert!(out.starts_with("sec"));
    assert!(out.lines().any(|l| l == "frank"));
}

#[test]
fn old_style_leading_signature_cannot_be_checked() {
    let helper = Helper {
        detached: Some(b"certified file".to_vec()),
        ..Helper::default()
    };
    let (result, helper, _) = run(
        helper, Options::default(),
        vec![
            sig(GOOD, SignatureType::GenericCertification,
                HashAlgorithm::SHA1),
        ]);
    result.unwrap();

    // The data file is hashed, but a certification class has no
    // meaning outside a certificate, so the check ends in an error
    // status rather than a verdict.
    assert!(helper.verified.is_empty());
    assert!(matches!(helper.statuses[0], Status::ErrSig { .. }));
}

#[test]
fn one_pass_group_interrupted_by_a_foreign_packet() {
    // A key certificate appearing while a one-pass group is open
    // flushes the group.
    let (result, helper, out) = run(
        Helper::default(), Options::default(),
        vec![
            onepass(GOOD, HashAlgorithm::RipeMD),
            literal(b"signed"),
            sig(GOOD, SignatureType::Binary, HashAlgorithm::RipeMD),
            pubkey(b"next key"),
            Packet::UserID(UserID::new("dave")),
        ]);
    result.unwrap();

    assert_eq!(helper.statuses,
               vec![Status::GoodSig { issuer: KeyID::new(GOOD) }]);
    assert!(out.contains("dave"));
}
