//! Rendering groups as a key listing.
//!
//! The format follows the classic four-column listing: a `pub` or
//! `sec` header carrying size, algorithm letter, short key ID and
//! creation date, the user IDs indented underneath, and, on request,
//! one `sig` line per certification.  When signatures are checked
//! while listing, the character after `sig` encodes the outcome:
//! `!` good, `-` bad, `?` no public key, `%` other error.

use std::io::Write;

use chrono::NaiveDateTime;

use crate::Error;
use crate::Packet;
use crate::Result;
use crate::packet::{Key, Tag};

use super::{ProcessingHelper, Processor};
use super::tree::{NodeHandle, Tree};

fn datestr(timestamp: u32) -> String {
    NaiveDateTime::from_timestamp_opt(timestamp as i64, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "????-??-??".into())
}

impl<'a, H: ProcessingHelper> Processor<'a, H> {
    /// Renders one node of a group.
    pub(super) fn list_node(&mut self, tree: &Tree, node: NodeHandle)
                            -> Result<()>
    {
        match tree.packet(node) {
            Packet::PublicKey(key) => self.list_key(tree, node, key, false),
            Packet::SecretKey(key) => self.list_key(tree, node, key, true),
            Packet::Signature(_) => self.list_sig(tree, node),
            other => {
                log::error!("invalid node with packet of type {}",
                            other.tag());
                Ok(())
            }
        }
    }

    fn list_key(&mut self, tree: &Tree, node: NodeHandle, key: &Key,
                secret: bool)
                -> Result<()>
    {
        write!(self.output, "{}  {:4}{}/{} {} ",
               if secret { "sec" } else { "pub" },
               key.bits(),
               key.pk_algo().letter(),
               key.keyid().short(),
               datestr(key.creation_time()))?;

        let mut any = false;
        let mut cursor = tree.find_next(node, Tag::UserID);
        while let Some(uid_h) = cursor {
            if let Packet::UserID(uid) = tree.packet(uid_h) {
                if any && !secret {
                    // Align follow-up user ids under the first one.
                    // The secret listing prints them flush left.
                    write!(self.output, "{:31}", "")?;
                }
                writeln!(self.output, "{}", uid)?;
                if !any && self.opt.fingerprint {
                    self.print_fingerprint(key)?;
                }

                if !secret {
                    // The certifications over this user id.
                    let mut n = tree.next(uid_h);
                    while let Some(h) = n {
                        match tree.packet(h).tag() {
                            Tag::UserID => break,
                            Tag::Signature => self.list_sig(tree, h)?,
                            _ => {}
                        }
                        n = tree.next(h);
                    }
                }
                any = true;
            }
            cursor = tree.find_next(uid_h, Tag::UserID);
        }

        if !any {
            writeln!(self.output, "ERROR: no user id!")?;
        }
        Ok(())
    }

    fn list_sig(&mut self, tree: &Tree, node: NodeHandle) -> Result<()> {
        let standalone = node == tree.root();
        if !standalone && !self.opt.list_sigs {
            return Ok(());
        }

        let mut sigrc = ' ';
        let mut error_text = None;
        if self.opt.check_sigs {
            sigrc = match self.check_signature(tree, node) {
                Ok(()) => '!',
                Err(e) => match e.downcast_ref::<Error>() {
                    Some(Error::BadSignature(_)) => '-',
                    Some(Error::NoPublicKey(_)) => '?',
                    _ => {
                        error_text = Some(e.to_string());
                        '%'
                    }
                },
            };
        }

        let sig = match tree.packet(node) {
            Packet::Signature(sig) => sig,
            _ => return Ok(()),
        };
        write!(self.output, "sig{}       {} {}   ",
               sigrc, sig.issuer().short(), datestr(sig.creation_time()))?;

        if sigrc == '%' {
            writeln!(self.output, "[{}]", error_text.unwrap_or_default())?;
        } else if sigrc == '?' {
            // Without the key there is nobody to name.
            writeln!(self.output)?;
        } else {
            let signer = self.helper.user_id(sig.issuer())
                .unwrap_or_else(|| "[User ID not found]".into());
            writeln!(self.output, "{}", signer)?;
        }
        Ok(())
    }

    fn print_fingerprint(&mut self, key: &Key) -> Result<()> {
        writeln!(self.output, "     Key fingerprint = {}",
                 key.fingerprint())?;
        Ok(())
    }
}
