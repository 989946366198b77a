//! Module dedicated to IMAP email envelopes.
//!
//! This module contains envelope-related mapping functions from the
//! [imap] crate types.

use std::str;

use imap::types::Fetch;

use crate::envelope::{Address, Envelope};

/// The fallback text used when a header value cannot be rendered as
/// text.
const FALLBACK: &str = "...";

impl Envelope {
    /// Builds an envelope from an IMAP fetch response.
    ///
    /// Returns `None` when the response carries no UID or no ENVELOPE
    /// item. Labels are not part of the ENVELOPE item: they come from
    /// a separate `X-GM-LABELS` fetch and start out empty here.
    pub fn from_imap_fetch(fetch: &Fetch) -> Option<Self> {
        let uid = fetch.uid?;
        let envelope = fetch.envelope()?;

        let addresses = |addrs: &Option<Vec<imap_proto::types::Address>>| match addrs {
            Some(addrs) => addrs
                .iter()
                .filter_map(|addr| {
                    let email = match (addr.mailbox.as_ref(), addr.host.as_ref()) {
                        (Some(mailbox), Some(host)) => {
                            match (str::from_utf8(mailbox), str::from_utf8(host)) {
                                (Ok(mailbox), Ok(host)) => format!("{mailbox}@{host}"),
                                _ => FALLBACK.to_string(),
                            }
                        }
                        // group syntax markers carry no mailbox/host
                        _ => return None,
                    };

                    let name = addr
                        .name
                        .as_ref()
                        .map(|name| text_or_fallback(name));

                    Some(Address::new(name, email))
                })
                .collect(),
            None => Vec::new(),
        };

        Some(Envelope {
            uid,
            subject: envelope
                .subject
                .as_ref()
                .map(|subject| text_or_fallback(subject))
                .unwrap_or_default(),
            from: addresses(&envelope.from),
            reply_to: addresses(&envelope.reply_to),
            to: addresses(&envelope.to),
            cc: addresses(&envelope.cc),
            message_id: envelope
                .message_id
                .as_ref()
                .map(|id| text_or_fallback(id)),
            labels: Vec::new(),
        })
    }
}

fn text_or_fallback(bytes: &[u8]) -> String {
    match str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => FALLBACK.to_string(),
    }
}
