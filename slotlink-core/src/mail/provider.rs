//! Mail delivery through an external mailer binary.
//!
//! A mailer named `outbox` is the executable `slotlink-mailer-outbox` found
//! in `PATH`. It receives one [`Request`] on stdin and answers with one
//! [`Response`] on stdout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::protocol::{Command as MailCommand, Request, Response};
use super::{Mailer, OutgoingMail};
use crate::error::{SlotLinkError, SlotLinkResult};

pub const DEFAULT_MAILER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct MailProvider {
    name: String,
    timeout: Duration,
}

impl MailProvider {
    pub fn from_name(name: &str) -> Self {
        MailProvider {
            name: name.to_string(),
            timeout: DEFAULT_MAILER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary_name(&self) -> String {
        format!("slotlink-mailer-{}", self.name)
    }

    fn binary_path(&self) -> SlotLinkResult<PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| {
            SlotLinkError::MailerNotInstalled(format!(
                "{binary_name} (install it with: cargo install {binary_name})"
            ))
        })
    }

    pub async fn call_with_timeout<R: DeserializeOwned>(
        &self,
        command: MailCommand,
        params: serde_json::Value,
    ) -> SlotLinkResult<R> {
        timeout(self.timeout, self.call(command, params))
            .await
            .map_err(|_| SlotLinkError::MailerTimeout(self.timeout.as_secs()))?
    }

    pub async fn call<R: DeserializeOwned>(
        &self,
        command: MailCommand,
        params: serde_json::Value,
    ) -> SlotLinkResult<R> {
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| SlotLinkError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;

        let mut child = Command::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SlotLinkError::DeliveryFailure(format!(
                    "failed to spawn {}: {e}",
                    binary_path.display()
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SlotLinkError::DeliveryFailure("mailer stdin unavailable".into()))?;
        stdin.write_all(format!("{request_json}\n").as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(SlotLinkError::DeliveryFailure(format!(
                "{} exited with status {}",
                self.binary_name(),
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(SlotLinkError::DeliveryFailure(
                "mailer returned no response".into(),
            ));
        }

        let response: Response<R> = serde_json::from_str(response_str.trim()).map_err(|e| {
            SlotLinkError::DeliveryFailure(format!("unreadable mailer response: {e}"))
        })?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(SlotLinkError::DeliveryFailure(error)),
        }
    }
}

impl Mailer for MailProvider {
    async fn send(&self, mail: &OutgoingMail) -> SlotLinkResult<()> {
        let params = serde_json::to_value(mail)
            .map_err(|e| SlotLinkError::Serialization(e.to_string()))?;
        let message_id: String = self.call_with_timeout(MailCommand::Send, params).await?;
        tracing::debug!(mailer = %self.name, %message_id, to = %mail.to, "Mail handed to mailer");
        Ok(())
    }
}
