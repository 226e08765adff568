use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::models::InboundMessage;
use crate::services::conversation;
use crate::state::AppState;

const WEBHOOK_PATH: &str = "/webhook/whatsapp";

/// Twilio's request signature: base64 HMAC-SHA1 over the URL followed by
/// every posted parameter, sorted by name.
pub fn compute_twilio_signature(auth_token: &str, url: &str, params: &BTreeMap<String, String>) -> Option<String> {
    let mut data = url.to_string();
    for (key, value) in params {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac = Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()).ok()?;
    mac.update(data.as_bytes());
    Some(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

fn validate_twilio_signature(
    auth_token: &str,
    signature: &str,
    url: &str,
    params: &BTreeMap<String, String>,
) -> bool {
    compute_twilio_signature(auth_token, url, params).is_some_and(|expected| expected == signature)
}

fn strip_whatsapp(address: &str) -> &str {
    let address = address.trim();
    address.strip_prefix("whatsapp:").unwrap_or(address)
}

/// The inbound message carried by a Twilio webhook form.
pub fn inbound_from_form(params: &BTreeMap<String, String>) -> Option<InboundMessage> {
    let from = strip_whatsapp(params.get("From")?);
    if from.is_empty() {
        return None;
    }

    let num_media: u32 = params
        .get("NumMedia")
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0);
    let media_url = if num_media > 0 {
        params.get("MediaUrl0").filter(|url| !url.is_empty()).cloned()
    } else {
        None
    };

    Some(InboundMessage {
        from: from.to_string(),
        body: params.get("Body").map(|b| b.trim().to_string()).unwrap_or_default(),
        media_url,
        message_sid: params.get("MessageSid").cloned(),
    })
}

pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<BTreeMap<String, String>>,
) -> Response {
    // Skip signature validation when no auth token is configured (dev mode)
    if !state.config.twilio_auth_token.is_empty() {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Twilio-Signature header");
            return (StatusCode::FORBIDDEN, "Missing signature").into_response();
        }

        // Reconstruct webhook URL, honouring X-Forwarded-Proto/Host behind a proxy
        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("https");
        let host = headers
            .get("x-forwarded-host")
            .or_else(|| headers.get("host"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let url = format!("{proto}://{host}{WEBHOOK_PATH}");

        if !validate_twilio_signature(&state.config.twilio_auth_token, signature, &url, &params) {
            tracing::warn!("invalid Twilio signature");
            return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
        }
    }

    let Some(inbound) = inbound_from_form(&params) else {
        tracing::warn!("webhook without a sender, ignoring");
        return twiml_response();
    };

    let message_sid = inbound
        .message_sid
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    tracing::info!(
        from = %inbound.from,
        sid = %message_sid,
        has_media = inbound.media_url.is_some(),
        "incoming WhatsApp message"
    );

    let reply = match conversation::process_message(&state, &inbound).await {
        Ok(reply) => reply,
        Err(e) => {
            // Nothing was committed; a 5xx makes Twilio redeliver.
            tracing::error!(error = %e, from = %inbound.from, sid = %message_sid, "conversation processing failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "processing failed").into_response();
        }
    };

    if let Err(e) = state.messaging.send(&inbound.from, &reply).await {
        tracing::error!(error = %e, to = %inbound.from, sid = %message_sid, "failed to send reply");
    }

    twiml_response()
}

fn twiml_response() -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        "<Response></Response>",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_signature_round_trip() {
        let form = params(&[("From", "whatsapp:+255700000001"), ("Body", "book")]);
        let url = "https://example.com/webhook/whatsapp";
        let signature = compute_twilio_signature("secret", url, &form).unwrap();

        assert!(validate_twilio_signature("secret", &signature, url, &form));
        assert!(!validate_twilio_signature("other", &signature, url, &form));

        let tampered = params(&[("From", "whatsapp:+255700000001"), ("Body", "cancel")]);
        assert!(!validate_twilio_signature("secret", &signature, url, &tampered));
    }

    #[test]
    fn test_inbound_strips_prefix_and_reads_media() {
        let form = params(&[
            ("From", "whatsapp:+255700000001"),
            ("Body", "  receipt  "),
            ("NumMedia", "1"),
            ("MediaUrl0", "https://api.twilio.com/media/ME1"),
            ("MessageSid", "SM1"),
        ]);
        let inbound = inbound_from_form(&form).unwrap();
        assert_eq!(inbound.from, "+255700000001");
        assert_eq!(inbound.body, "receipt");
        assert_eq!(inbound.media_url.as_deref(), Some("https://api.twilio.com/media/ME1"));
        assert_eq!(inbound.message_sid.as_deref(), Some("SM1"));
    }

    #[test]
    fn test_media_ignored_without_count() {
        let form = params(&[("From", "+255700000001"), ("MediaUrl0", "https://x/ME1")]);
        let inbound = inbound_from_form(&form).unwrap();
        assert!(inbound.media_url.is_none());
        assert!(inbound_from_form(&params(&[("Body", "hi")])).is_none());
    }
}
