use async_trait::async_trait;
use serde::Deserialize;

use super::{DeliveryResult, DeliveryStatus, NotificationGateway};
use crate::errors::DeliveryError;

const WHATSAPP_PREFIX: &str = "whatsapp:";

pub struct TwilioWhatsAppGateway {
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct MessageResponse {
    sid: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

impl TwilioWhatsAppGateway {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        Self {
            account_sid,
            auth_token,
            from_number,
            base_url: "https://api.twilio.com".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the gateway at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// `+2557...` → `whatsapp:+2557...`; already-prefixed numbers pass through.
pub fn whatsapp_address(number: &str) -> String {
    if number.starts_with(WHATSAPP_PREFIX) {
        number.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{number}")
    }
}

#[async_trait]
impl NotificationGateway for TwilioWhatsAppGateway {
    async fn send(&self, to: &str, text: &str) -> Result<DeliveryResult, DeliveryError> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Err(DeliveryError::MissingCredentials);
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        );
        let to = whatsapp_address(to);
        let from = whatsapp_address(&self.from_number);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to.as_str()), ("From", from.as_str()), ("Body", text)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessageResponse = response.json().await?;
        let sid = body
            .sid
            .ok_or_else(|| DeliveryError::MalformedResponse("sid".to_string()))?;
        let status = body
            .status
            .as_deref()
            .map(DeliveryStatus::parse)
            .unwrap_or(DeliveryStatus::Unknown);

        tracing::info!(to = %to, sid = %sid, status = ?status, "whatsapp message sent");
        Ok(DeliveryResult { sid, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_address() {
        assert_eq!(whatsapp_address("+255700000001"), "whatsapp:+255700000001");
        assert_eq!(whatsapp_address("whatsapp:+255700000001"), "whatsapp:+255700000001");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let gateway = TwilioWhatsAppGateway::new(
            "AC123".to_string(),
            "token".to_string(),
            "+14155238886".to_string(),
        )
        .with_base_url("http://127.0.0.1:9");

        let err = gateway.send("+255700000001", "hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let gateway = TwilioWhatsAppGateway::new(String::new(), String::new(), "+14155238886".to_string());
        let err = gateway.send("+255700000001", "hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::MissingCredentials));
    }
}
