//! Outgoing mail and the delivery seam.
//!
//! Delivery goes through a [`Mailer`]. The real transport is an external
//! mailer binary (see [`provider`]); [`LogMailer`] only records what would
//! have been sent.

pub mod message;
pub mod protocol;
pub mod provider;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::SlotLinkResult;

pub use provider::MailProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub name: String,
    pub email: String,
}

impl Mailbox {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Mailbox {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "<{}>", self.email)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: String,
}

impl Attachment {
    pub fn calendar_invite(ics: String) -> Self {
        Attachment {
            filename: "invite.ics".into(),
            content_type: "text/calendar; method=REQUEST; charset=UTF-8".into(),
            content: ics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub to: Mailbox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Anything that can deliver an [`OutgoingMail`].
pub trait Mailer: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> impl Future<Output = SlotLinkResult<()>> + Send;
}

/// Logs each message instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> SlotLinkResult<()> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            attachments = mail.attachments.len(),
            "Mail not delivered (no mail provider configured)"
        );
        Ok(())
    }
}

/// The transport chosen by configuration.
#[derive(Debug, Clone)]
pub enum MailTransport {
    Provider(MailProvider),
    Log(LogMailer),
}

impl Mailer for MailTransport {
    async fn send(&self, mail: &OutgoingMail) -> SlotLinkResult<()> {
        match self {
            MailTransport::Provider(provider) => provider.send(mail).await,
            MailTransport::Log(log) => log.send(mail).await,
        }
    }
}
