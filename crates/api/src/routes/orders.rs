//! Checkout and order route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::order::{Order, ShippingAddress};
use crate::services::checkout::CheckoutService;
use crate::services::stripe;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderPayload {
    pub payment_intent_id: String,
    pub shipping_address: ShippingAddress,
}

fn validate_address(address: &ShippingAddress) -> Result<()> {
    let fields = [
        ("street", &address.street),
        ("city", &address.city),
        ("state", &address.state),
        ("zip_code", &address.zip_code),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Shipping address {name} is required"
            )));
        }
    }
    Ok(())
}

/// POST /orders/create-payment-intent - Price the cart and open a payment
/// intent. Nothing is reserved; the cart and stock are untouched.
///
/// `amount` is the cart total in dollars; the processor's minor-unit figure
/// is not exposed.
#[instrument(skip(state))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let quote = CheckoutService::new(state.pool(), state.stripe())
        .quote(user.id)
        .await?;

    Ok(Json(json!({
        "payment_intent_id": quote.intent.id,
        "client_secret": quote.intent.client_secret,
        "amount": quote.total,
    })))
}

/// POST /orders - Convert the cart into a pending order.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse> {
    if payload.payment_intent_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "payment_intent_id is required".to_owned(),
        ));
    }
    validate_address(&payload.shipping_address)?;

    let order = CheckoutService::new(state.pool(), state.stripe())
        .finalize(user.id, &payload.shipping_address, &payload.payment_intent_id)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders - The user's orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// POST /orders/stripe-webhook - Signed payment events from Stripe.
///
/// The raw body is needed for signature verification, so this handler takes
/// `Bytes` rather than `Json`.
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    let event = stripe::verify_and_parse_event(
        &body,
        signature,
        &state.config().stripe.webhook_secret,
    )
    .map_err(|_| AppError::InvalidSignature)?
    .ok_or_else(|| AppError::BadRequest("Unrecognized event payload".to_owned()))?;

    CheckoutService::new(state.pool(), state.stripe())
        .apply_payment_event(&event)
        .await?;

    Ok(Json(json!({ "received": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Main St".to_owned(),
            city: "Springfield".to_owned(),
            state: "IL".to_owned(),
            zip_code: "62701".to_owned(),
        }
    }

    #[test]
    fn test_valid_address_accepted() {
        assert!(validate_address(&address()).is_ok());
    }

    #[test]
    fn test_blank_field_rejected() {
        let mut addr = address();
        addr.city = "   ".to_owned();
        assert!(validate_address(&addr).is_err());
    }
}
