//! Stripe API client and webhook signature verification.
//!
//! Only the payment-intent slice of the API is used. Requests are
//! form-encoded per Stripe's convention; webhook payloads are authenticated
//! with the `Stripe-Signature` scheme (HMAC-SHA256 over `"{t}.{payload}"`).

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use orchard_core::UserId;

/// Default API endpoint; overridable for tests and mock servers.
const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Accepted clock skew between a webhook's signed timestamp and now.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Errors from the Stripe API client.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Webhook signature rejection reasons.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Header is missing the timestamp or v1 signature fields.
    #[error("malformed signature header")]
    Malformed,

    /// Timestamp is outside the accepted tolerance window.
    #[error("signature timestamp outside tolerance")]
    Stale,

    /// No v1 signature matched the expected digest.
    #[error("signature mismatch")]
    Mismatch,
}

/// A created payment intent, as returned by Stripe.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the frontend to confirm the payment.
    pub client_secret: String,
    /// Amount in minor units (cents).
    pub amount: i64,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// A webhook event, reduced to the fields the order flow needs.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: WebhookEventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventObject {
    /// The payment intent ID for payment events.
    pub id: String,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: SecretString,
    api_base: String,
}

impl StripeClient {
    /// Create a client against the live API.
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self::with_api_base(secret_key, DEFAULT_API_BASE.to_owned())
    }

    /// Create a client against a custom endpoint.
    #[must_use]
    pub fn with_api_base(secret_key: SecretString, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            api_base,
        }
    }

    /// Create a payment intent for the given amount in minor units.
    ///
    /// The user ID rides along as metadata so charges can be traced back to
    /// accounts from the Stripe dashboard.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Http` if the request fails to send.
    /// Returns `StripeError::Api` if Stripe rejects the request.
    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        user_id: UserId,
    ) -> Result<PaymentIntent, StripeError> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_owned()),
            ("metadata[user_id]", user_id.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_owned()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map_or_else(|_| "unknown error".to_owned(), |b| b.error.message);
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent = response.json::<PaymentIntent>().await?;
        Ok(intent)
    }
}

/// Verify a `Stripe-Signature` header and parse the event payload.
///
/// # Errors
///
/// Returns `SignatureError` if the header is malformed, stale, or doesn't
/// match the payload. Returns `None` from the parse when the event body
/// isn't a recognized shape.
pub fn verify_and_parse_event(
    payload: &[u8],
    signature_header: &str,
    webhook_secret: &SecretString,
) -> Result<Option<WebhookEvent>, SignatureError> {
    verify_signature_at(
        payload,
        signature_header,
        webhook_secret,
        chrono::Utc::now().timestamp(),
    )?;

    Ok(serde_json::from_slice(payload).ok())
}

/// Signature check with an injected clock.
fn verify_signature_at(
    payload: &[u8],
    signature_header: &str,
    webhook_secret: &SecretString,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::Stale);
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(webhook_secret.expose_secret().as_bytes())
    else {
        return Err(SignatureError::Malformed);
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if candidates.iter().any(|c| *c == expected) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &[u8], timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn secret() -> SecretString {
        SecretString::from(SECRET)
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign(payload, 1_700_000_000);
        assert_eq!(
            verify_signature_at(payload, &header, &secret(), 1_700_000_000),
            Ok(())
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign(br#"{"amount":100}"#, 1_700_000_000);
        assert_eq!(
            verify_signature_at(br#"{"amount":999}"#, &header, &secret(), 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let header = sign(payload, 1_700_000_000);
        assert_eq!(
            verify_signature_at(payload, &header, &secret(), 1_700_000_000 + 301),
            Err(SignatureError::Stale)
        );
    }

    #[test]
    fn test_timestamp_within_tolerance_accepted() {
        let payload = b"{}";
        let header = sign(payload, 1_700_000_000);
        assert_eq!(
            verify_signature_at(payload, &header, &secret(), 1_700_000_000 + 299),
            Ok(())
        );
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert_eq!(
            verify_signature_at(b"{}", "t=1700000000", &secret(), 1_700_000_000),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature_at(b"{}", "v1=deadbeef", &secret(), 1_700_000_000),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_any_matching_v1_accepted() {
        // Stripe sends multiple v1 entries during secret rotation.
        let payload = b"{}";
        let good = sign(payload, 1_700_000_000);
        let header = format!("t=1700000000,v1=deadbeef,{}", &good[good.find("v1=").unwrap()..]);
        assert_eq!(
            verify_signature_at(payload, &header, &secret(), 1_700_000_000),
            Ok(())
        );
    }

    #[test]
    fn test_event_parse() {
        let payload = br#"{
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": "pi_123", "amount": 1998 } }
        }"#;
        let event: WebhookEvent = serde_json::from_slice(payload).unwrap();
        assert_eq!(event.kind, "payment_intent.succeeded");
        assert_eq!(event.data.object.id, "pi_123");
    }
}
