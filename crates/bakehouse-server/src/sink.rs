//! Spreadsheet Sink Client
//!
//! Thin client for the opaque spreadsheet/email backend. Every call here is
//! best-effort: the sink has no atomicity contract and the callers decide
//! whether a failure matters (webhook forwarding logs and moves on; signup
//! surfaces the sink's own response).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bakehouse_payments::CompletedOrder;

/// Sink client
pub struct SinkClient {
    http: reqwest::Client,
    url: String,
}

/// The record appended for a completed order.
#[derive(Debug, Serialize)]
struct OrderRecord<'a> {
    id: &'a str,
    amount_total: Decimal,
    customer_email: &'a str,
    metadata: &'a std::collections::HashMap<String, String>,
    status: &'a str,
    created: String,
}

/// Sink acknowledgement, passed through to signup callers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SinkAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resubscribed: Option<bool>,
}

#[derive(Serialize)]
struct SignupRecord<'a> {
    action: &'static str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
}

#[derive(Serialize)]
struct UnsubscribeRecord<'a> {
    action: &'static str,
    email: &'a str,
    token: &'a str,
}

impl SinkClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Append a completed order. Failures are the caller's to log; there is
    /// no retry here - the payment provider's webhook redelivery is the only
    /// recovery mechanism.
    pub async fn forward_order(&self, order: &CompletedOrder) -> Result<(), reqwest::Error> {
        let record = OrderRecord {
            id: &order.id,
            amount_total: order.amount_dollars,
            customer_email: &order.customer_email,
            metadata: &order.metadata,
            status: &order.payment_status,
            created: order.created.to_rfc3339(),
        };

        self.http
            .post(&self.url)
            .json(&record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Forward a newsletter signup and pass the sink's verdict through.
    pub async fn signup(
        &self,
        email: &str,
        first_name: Option<&str>,
    ) -> Result<SinkAck, reqwest::Error> {
        let response = self
            .http
            .post(&self.url)
            .json(&SignupRecord {
                action: "subscribe",
                email,
                first_name,
            })
            .send()
            .await?;

        let ok = response.status().is_success();
        Ok(response.json().await.unwrap_or(SinkAck {
            success: ok,
            ..SinkAck::default()
        }))
    }

    /// Forward an unsubscribe. The sink re-verifies the token on its side
    /// with the same shared secret.
    pub async fn unsubscribe(&self, email: &str, token: &str) -> Result<(), reqwest::Error> {
        self.http
            .post(&self.url)
            .json(&UnsubscribeRecord {
                action: "unsubscribe",
                email,
                token,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
