//! HTTP client for slotlink-server

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use slotlink_core::codec::WirePayload;
use slotlink_core::presenter::BookingSubmission;

pub const NETWORK_ERROR: &str = "Network error — please check your connection and try again.";

pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<FieldMessage>,
}

#[derive(Debug, Deserialize)]
pub struct FieldMessage {
    pub field: String,
    pub message: String,
}

/// Links handed back by POST /create. Stored schedules also carry their id
/// and edit token.
#[derive(Debug, Deserialize)]
pub struct CreatedLinks {
    pub booking_url: String,
    pub edit_url: String,
    #[serde(default)]
    pub book_id: Option<String>,
    #[serde(default)]
    pub edit_token: Option<String>,
}

/// Body of POST /email-edit: a stored edit token or a link token.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct EditMailRequest<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_data: Option<&'a str>,
}

impl<'a> EditMailRequest<'a> {
    /// Prefer the stored schedule's edit token; fall back to the link token.
    pub fn new(email: &'a str, created: Option<&'a CreatedLinks>, token: &'a str) -> Self {
        match created.and_then(|c| c.edit_token.as_deref()) {
            Some(edit_token) => EditMailRequest {
                email,
                edit_token: Some(edit_token),
                booking_data: None,
            },
            None => EditMailRequest {
                email,
                edit_token: None,
                booking_data: Some(token),
            },
        }
    }
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        Client {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// POST /book. Validation and link problems come back as `Ok` with
    /// `success: false`.
    pub async fn book(&self, submission: &BookingSubmission) -> Result<MessageResponse> {
        let resp = self
            .send(self.http.post(self.url("/book")).json(submission), "Booking")
            .await?;

        resp.json()
            .await
            .context("Unexpected response from the booking service")
    }

    /// POST /create
    pub async fn create(&self, form: &WirePayload) -> Result<CreatedLinks> {
        let resp = self
            .send(self.http.post(self.url("/create")).json(form), "Create")
            .await?;

        if !resp.status().is_success() {
            let err: MessageResponse = resp.json().await?;
            let fields: Vec<String> = err
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            if fields.is_empty() {
                anyhow::bail!("{}", err.message);
            }
            anyhow::bail!("{} ({})", err.message, fields.join("; "));
        }

        resp.json()
            .await
            .context("Unexpected response from the booking service")
    }

    /// POST /email-edit. Like `book`, refusals come back as `Ok` with
    /// `success: false`.
    pub async fn email_edit(&self, request: &EditMailRequest<'_>) -> Result<MessageResponse> {
        let resp = self
            .send(self.http.post(self.url("/email-edit")).json(request), "Edit link mail")
            .await?;

        resp.json()
            .await
            .context("Unexpected response from the booking service")
    }

    /// GET /schedule/{book_id}
    pub async fn schedule(&self, book_id: &str) -> Result<WirePayload> {
        let resp = self
            .send(self.http.get(self.url(&format!("/schedule/{book_id}"))), "Schedule")
            .await?;

        if !resp.status().is_success() {
            let err: MessageResponse = resp.json().await?;
            anyhow::bail!("{}", err.message);
        }

        Ok(resp.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Transport failures all surface as the same network message.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "{what} request failed");
            anyhow::anyhow!(NETWORK_ERROR)
        })
    }
}
