//! slotlink-mailer-outbox - file-based mailer for slotlink
//!
//! Speaks the slotlink mailer protocol over stdin/stdout. Instead of
//! delivering mail it writes each message to an outbox directory, which
//! suits local development and hosts that relay mail with another tool:
//!   $SLOTLINK_OUTBOX, or ~/.local/share/slotlink/outbox

mod outbox;

use anyhow::Result;
use slotlink_core::mail::OutgoingMail;
use slotlink_core::mail::protocol::{Command, Request, Response};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::outbox::Outbox;

#[tokio::main]
async fn main() -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request),
            Err(e) => Response::error(&format!("Failed to parse request: {}", e))?,
        };

        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

fn handle_request(request: Request) -> String {
    let result = match request.command {
        Command::Send => handle_send(request.params),
    };
    match result {
        Ok(line) => line,
        // Serialising a plain string error cannot fail in practice.
        Err(e) => Response::error(&format!("{:#}", e)).unwrap_or_default(),
    }
}

fn handle_send(params: serde_json::Value) -> Result<String> {
    let mail: OutgoingMail = match serde_json::from_value(params) {
        Ok(m) => m,
        Err(e) => return Ok(Response::error(&format!("Invalid params: {}", e))?),
    };

    let outbox = Outbox::from_env()?;
    let id = outbox.deliver(&mail)?;
    eprintln!(
        "slotlink-mailer-outbox: {} -> {}",
        mail.to,
        outbox.root().join(&id).display()
    );

    Ok(Response::success(id)?)
}
