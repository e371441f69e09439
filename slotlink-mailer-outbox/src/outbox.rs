//! On-disk outbox.
//!
//! Each message gets its own directory:
//!   {outbox}/{timestamp}-{id}/message.json
//!   {outbox}/{timestamp}-{id}/body.txt
//!   {outbox}/{timestamp}-{id}/{attachment filename}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use slotlink_core::mail::OutgoingMail;

const OUTBOX_ENV: &str = "SLOTLINK_OUTBOX";

pub struct Outbox {
    root: PathBuf,
}

impl Outbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Outbox { root: root.into() }
    }

    /// `$SLOTLINK_OUTBOX`, else `{data dir}/slotlink/outbox`.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = std::env::var_os(OUTBOX_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        let data_dir = dirs::data_dir().context("Could not determine data directory")?;
        Ok(Self::new(data_dir.join("slotlink").join("outbox")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a message and return its id.
    pub fn deliver(&self, mail: &OutgoingMail) -> Result<String> {
        let id = format!(
            "{}-{}",
            Utc::now().format("%Y%m%dT%H%M%SZ"),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        let dir = self.root.join(&id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let json = serde_json::to_string_pretty(mail)?;
        fs::write(dir.join("message.json"), json)?;
        fs::write(dir.join("body.txt"), &mail.body)?;

        for attachment in &mail.attachments {
            let name = safe_filename(&attachment.filename);
            fs::write(dir.join(name), &attachment.content)
                .with_context(|| format!("Failed to write attachment {}", attachment.filename))?;
        }

        Ok(id)
    }
}

/// Attachment names come from the sender; keep them inside the message dir.
fn safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() || cleaned == "message.json" || cleaned == "body.txt" {
        format!("attachment-{cleaned}")
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotlink_core::mail::{Attachment, Mailbox};

    fn mail() -> OutgoingMail {
        OutgoingMail {
            to: Mailbox::new("James Chen", "james@x.com"),
            reply_to: Some(Mailbox::new("Jane Smith", "jane@company.com")),
            subject: "Confirmed: Intro call".into(),
            body: "Hi James,\n".into(),
            attachments: vec![Attachment::calendar_invite("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".into())],
        }
    }

    #[test]
    fn deliver_writes_message_body_and_attachments() {
        let tmp = tempfile::tempdir().unwrap();
        let outbox = Outbox::new(tmp.path());

        let id = outbox.deliver(&mail()).unwrap();
        let dir = tmp.path().join(&id);

        let stored: OutgoingMail =
            serde_json::from_str(&fs::read_to_string(dir.join("message.json")).unwrap()).unwrap();
        assert_eq!(stored, mail());
        assert_eq!(fs::read_to_string(dir.join("body.txt")).unwrap(), "Hi James,\n");
        assert!(
            fs::read_to_string(dir.join("invite.ics"))
                .unwrap()
                .starts_with("BEGIN:VCALENDAR")
        );
    }

    #[test]
    fn each_delivery_gets_its_own_id() {
        let tmp = tempfile::tempdir().unwrap();
        let outbox = Outbox::new(tmp.path());
        assert_ne!(outbox.deliver(&mail()).unwrap(), outbox.deliver(&mail()).unwrap());
    }

    #[test]
    fn attachment_names_cannot_escape() {
        assert_eq!(safe_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(safe_filename("body.txt"), "attachment-body.txt");
        assert_eq!(safe_filename(""), "attachment-");
    }
}
