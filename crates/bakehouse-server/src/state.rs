//! Application State

use std::sync::Arc;

use bakehouse_core::UnsubscribeTokens;
use bakehouse_payments::StripeGateway;

use crate::config::ServerConfig;
use crate::sink::SinkClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Payment gateway (optional - None if not configured)
    pub stripe: Option<Arc<StripeGateway>>,

    /// Spreadsheet sink client (optional - None if not configured)
    pub sink: Option<Arc<SinkClient>>,

    /// Unsubscribe token service (optional - None if not configured)
    pub tokens: Option<Arc<UnsubscribeTokens>>,

    /// Shared HTTP client for the calendar feed
    pub http: reqwest::Client,
}
