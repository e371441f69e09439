//! Mailer protocol types.
//!
//! One JSON request line on the mailer's stdin, one JSON response on its
//! stdout. Any executable that speaks this can deliver slotlink mail.

use serde::{Deserialize, Serialize};

use crate::error::{SlotLinkError, SlotLinkResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Send,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> SlotLinkResult<String> {
        to_line(&Response::Success { data })
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> SlotLinkResult<String> {
        to_line(&Response::<()>::Error {
            error: msg.to_string(),
        })
    }
}

fn to_line<T: Serialize>(value: &T) -> SlotLinkResult<String> {
    serde_json::to_string(value).map_err(|e| SlotLinkError::Serialization(e.to_string()))
}
