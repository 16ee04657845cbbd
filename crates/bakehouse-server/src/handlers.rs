//! HTTP Handlers

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use bakehouse_payments::{
    parse_event, verify_signature, OrderSessionRequest, PaymentError, SessionLineItem,
    UpstreamErrorClass, WebhookEvent,
};
use bakehouse_slots::{fetch_slots, FulfillmentSlot};

use crate::sink::SinkAck;
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub sink_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub order: Vec<SessionOrderLine>,
    pub fulfillment: SessionFulfillment,
    pub customer: SessionCustomer,
}

#[derive(Debug, Deserialize)]
pub struct SessionOrderLine {
    pub product: String,
    #[serde(default)]
    pub price_id: Option<String>,
    pub qty: u32,
}

#[derive(Debug, Deserialize)]
pub struct SessionFulfillment {
    #[serde(rename = "type")]
    pub fulfillment_type: String,
    #[serde(default)]
    pub slot: Option<SessionSlot>,
    #[serde(default)]
    pub address: Option<SessionAddress>,
}

#[derive(Debug, Deserialize)]
pub struct SessionSlot {
    pub id: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub slots: Vec<FulfillmentSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeParams {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.stripe.is_some(),
        sink_configured: state.sink.is_some(),
    })
}

/// Create a hosted payment session for an order
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    require_allowed_origin(&state, &headers)?;

    let stripe = state.stripe.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(
                "PAYMENTS_DISABLED",
                "Payments not configured",
            )),
        )
    })?;

    if payload.order.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("INVALID_CART", "Cart is empty")),
        ));
    }

    let mut line_items = Vec::with_capacity(payload.order.len());
    for line in &payload.order {
        let Some(price_ref) = line.price_id.clone() else {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "INVALID_CART",
                    format!("No price reference for {}", line.product),
                )),
            ));
        };
        line_items.push(SessionLineItem {
            price_ref,
            quantity: line.qty,
        });
    }

    let request = OrderSessionRequest {
        line_items,
        customer_email: payload.customer.email.clone(),
        success_url: state.config.success_url.clone(),
        cancel_url: state.config.cancel_url.clone(),
        metadata: order_metadata(&payload),
    };

    let session = stripe.create_order_session(request).await.map_err(|e| {
        tracing::error!(error = %e, "Session creation failed");
        session_error_response(&e)
    })?;

    Ok(Json(SessionResponse { url: session.url }))
}

/// Payment-provider webhook intake
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, ApiError> {
    let stripe = state.stripe.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(
                "PAYMENTS_DISABLED",
                "Payments not configured",
            )),
        )
    })?;

    let bad_signature = || {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("INVALID_SIGNATURE", "Invalid signature")),
        )
    };

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(bad_signature)?;

    verify_signature(body.as_bytes(), signature, stripe.webhook_secret()).map_err(|e| {
        tracing::warn!(error = %e, "Webhook signature failed");
        bad_signature()
    })?;

    // Signature passed: the provider always gets a 200 from here on, no
    // matter what happens downstream. Its own redelivery is the recovery
    // mechanism.
    match parse_event(body.as_bytes()) {
        Ok(WebhookEvent::CheckoutCompleted(order)) => {
            tracing::info!(order_id = %order.id, "Checkout completed");
            match &state.sink {
                Some(sink) => {
                    if let Err(e) = sink.forward_order(&order).await {
                        tracing::error!(order_id = %order.id, error = %e, "Sink forward failed");
                    }
                }
                None => tracing::warn!(order_id = %order.id, "No sink configured, order dropped"),
            }
        }
        Ok(WebhookEvent::Other { event_type }) => {
            tracing::debug!(event_type = %event_type, "Unhandled webhook event");
        }
        Err(e) => {
            tracing::error!(error = %e, "Signed webhook body failed to parse");
        }
    }

    Ok(StatusCode::OK)
}

/// Upcoming fulfillment slots, proxied from the calendar feed with HTTP
/// cache headers (the parser itself never caches).
pub async fn list_slots(State(state): State<AppState>) -> Response {
    let Some(feed_url) = &state.config.slots_feed_url else {
        return Json(SlotsResponse {
            slots: Vec::new(),
            error: None,
        })
        .into_response();
    };

    match fetch_slots(&state.http, feed_url, &state.config.slots_title_prefix).await {
        Ok(slots) => (
            [(
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.config.slots_cache_secs),
            )],
            Json(SlotsResponse { slots, error: None }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Calendar feed fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(SlotsResponse {
                    slots: Vec::new(),
                    error: Some("Calendar feed unavailable".into()),
                }),
            )
                .into_response()
        }
    }
}

/// One-click unsubscribe link target
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(params): Query<UnsubscribeParams>,
) -> (StatusCode, Html<String>) {
    let Some(tokens) = &state.tokens else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Html("<h1>Unsubscribe is not available right now.</h1>".into()),
        );
    };

    if !tokens.verify(&params.email, &params.token) {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h1>Invalid unsubscribe link</h1><p>This link is not valid for that address.</p>".into()),
        );
    }

    if let Some(sink) = &state.sink {
        if let Err(e) = sink.unsubscribe(&params.email, &params.token).await {
            tracing::error!(error = %e, "Unsubscribe forward failed");
        }
    }

    (
        StatusCode::OK,
        Html(format!(
            "<h1>You're unsubscribed</h1><p>{} will no longer receive bakehouse emails.</p>",
            params.email
        )),
    )
}

/// Newsletter signup
pub async fn newsletter_signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SinkAck>, ApiError> {
    require_allowed_origin(&state, &headers)?;

    let sink = state.sink.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("SINK_DISABLED", "Signups not configured")),
        )
    })?;

    let ack = sink
        .signup(&payload.email, payload.first_name.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Signup forward failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(
                    "SINK_ERROR",
                    "Signup failed. Please try again.",
                )),
            )
        })?;

    Ok(Json(ack))
}

// ============================================================================
// Helpers
// ============================================================================

/// Map a session-creation failure onto the intake response contract:
/// rejected line items -> 400 INVALID_CART, inventory -> 409 SOLD_OUT,
/// anything else -> 500 SERVER_ERROR.
fn session_error_response(error: &PaymentError) -> ApiError {
    let (status, code) = match error.classify() {
        UpstreamErrorClass::InvalidCart => (StatusCode::BAD_REQUEST, "INVALID_CART"),
        UpstreamErrorClass::SoldOut => (StatusCode::CONFLICT, "SOLD_OUT"),
        UpstreamErrorClass::Upstream => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
    };
    (status, Json(ErrorResponse::new(code, error.user_message())))
}

/// Reject state-changing requests from origins outside the allow-list.
fn require_allowed_origin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let allowed = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|origin| state.config.origin_allowed(origin));

    if allowed {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Forbidden", "Origin not allowed")),
        ))
    }
}

/// Flatten fulfillment and customer details into the provider's string-only
/// metadata fields, for the completed-order webhook to carry back.
fn order_metadata(payload: &SessionRequest) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert(
        "fulfillment_type".to_string(),
        payload.fulfillment.fulfillment_type.clone(),
    );

    if let Some(slot) = &payload.fulfillment.slot {
        let mut value = slot.title.clone().unwrap_or_else(|| slot.id.clone());
        if let Some(start) = &slot.start {
            value.push_str(" @ ");
            value.push_str(start);
        }
        metadata.insert("fulfillment_slot".to_string(), value);
    }
    if let Some(address) = &payload.fulfillment.address {
        metadata.insert(
            "delivery_address".to_string(),
            format!(
                "{}, {}, {} {}",
                address.street, address.city, address.state, address.zip
            ),
        );
    }

    metadata.insert(
        "customer_name".to_string(),
        format!(
            "{} {}",
            payload.customer.first_name, payload.customer.last_name
        ),
    );
    metadata.insert("customer_phone".to_string(), payload.customer.phone.clone());
    metadata
}
