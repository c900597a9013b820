//! Inbound messaging webhooks
//!
//! Twilio posts every WhatsApp message to `POST /webhook/twilio` as a form.
//! The reply is sent back through the Twilio API rather than in the HTTP
//! response, so the endpoint always acknowledges with `200 OK`.

use axum::{extract::State, http::StatusCode, routing::get, Form, Router};
use relayctl_core::mask_address;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::state::AppState;

/// Reply sent when the command reply itself could not be delivered
const FALLBACK_REPLY: &str = "An error occurred. Please try again later.";

/// Create webhook router
pub fn routes() -> Router<AppState> {
    Router::new().route("/twilio", get(verify).post(twilio_webhook))
}

/// Twilio incoming message form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TwilioWebhook {
    pub message_sid: Option<String>,
    pub account_sid: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub body: Option<String>,
}

/// Verification endpoint
async fn verify() -> &'static str {
    "Webhook is active"
}

/// Handle an incoming WhatsApp message
#[instrument(skip_all)]
async fn twilio_webhook(
    State(state): State<AppState>,
    Form(req): Form<TwilioWebhook>,
) -> StatusCode {
    let Some(from) = req.from.as_deref().filter(|f| !f.trim().is_empty()) else {
        warn!("Webhook request without sender; ignoring");
        return StatusCode::OK;
    };

    info!(
        from = %mask_address(from),
        message_sid = ?req.message_sid,
        "Received WhatsApp message"
    );
    debug!(
        account_sid = ?req.account_sid,
        to = ?req.to.as_deref().map(mask_address),
        body = ?req.body,
        "Message details"
    );

    if !state.config.is_allowed(from) {
        warn!(from = %mask_address(from), "Unauthorized access attempt");
        return StatusCode::OK;
    }

    let command = req.body.as_deref().unwrap_or("help");
    let reply = state.commands.handle(command).await;

    if let Err(e) = state.sender.send(from, &reply).await {
        error!(error = %e, backend = state.sender.name(), "Failed to send reply");

        if let Err(e) = state.sender.send(from, FALLBACK_REPLY).await {
            error!(error = %e, "Failed to send fallback reply");
        }
    }

    StatusCode::OK
}
