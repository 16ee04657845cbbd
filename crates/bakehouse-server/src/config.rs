//! Server Configuration
//!
//! Built once from the environment at startup and passed around explicitly.
//! All collaborator addresses and secrets live here; the core logic crates
//! never read the environment themselves.

use std::env;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Origins allowed verbatim (full origin strings)
    pub allowed_origins: Vec<String>,

    /// Domains whose subdomains are trusted (bare hostnames)
    pub trusted_domains: Vec<String>,

    /// Redirect target after a completed payment
    pub success_url: String,

    /// Redirect target for an abandoned payment
    pub cancel_url: String,

    /// Spreadsheet sink endpoint
    pub sink_url: Option<String>,

    /// Shared secret for unsubscribe tokens
    pub unsubscribe_secret: Option<String>,

    /// Calendar feed endpoint; `None` disables the slots route
    pub slots_feed_url: Option<String>,

    /// Event title prefix marking drop windows
    pub slots_title_prefix: String,

    /// Cache-Control max-age for the slots response
    pub slots_cache_secs: u64,
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            allowed_origins: env_list("ALLOWED_ORIGINS"),
            trusted_domains: env_list("TRUSTED_DOMAINS"),
            success_url: env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "https://bakehouse.example/thanks".into()),
            cancel_url: env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "https://bakehouse.example/cart".into()),
            sink_url: env::var("SINK_URL").ok(),
            unsubscribe_secret: env::var("UNSUBSCRIBE_SECRET").ok(),
            slots_feed_url: env::var("SLOTS_FEED_URL").ok(),
            slots_title_prefix: env::var("SLOTS_TITLE_PREFIX")
                .unwrap_or_else(|_| "Bread Drop".into()),
            slots_cache_secs: env::var("SLOTS_CACHE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Whether an Origin header value may hit state-changing routes: either
    /// an exact allow-list match, or a host equal to (or a subdomain of) a
    /// trusted domain.
    pub fn origin_allowed(&self, origin: &str) -> bool {
        if self.allowed_origins.iter().any(|o| o == origin) {
            return true;
        }
        let Some(host) = origin_host(origin) else {
            return false;
        };
        self.trusted_domains
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
    }
}

/// Extract the host from an origin string ("https://shop.example.com:8443"
/// -> "shop.example.com").
fn origin_host(origin: &str) -> Option<&str> {
    let rest = origin.split_once("://").map_or(origin, |(_, rest)| rest);
    let host = rest.split(['/', ':']).next()?;
    (!host.is_empty()).then_some(host)
}

fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind_addr: String::new(),
            allowed_origins: vec!["https://staging.bakehouse.dev".into()],
            trusted_domains: vec!["bakehouse.example".into()],
            success_url: String::new(),
            cancel_url: String::new(),
            sink_url: None,
            unsubscribe_secret: None,
            slots_feed_url: None,
            slots_title_prefix: "Bread Drop".into(),
            slots_cache_secs: 300,
        }
    }

    #[test]
    fn test_exact_allow_list_match() {
        assert!(config().origin_allowed("https://staging.bakehouse.dev"));
        assert!(!config().origin_allowed("https://staging.bakehouse.dev.evil.com"));
    }

    #[test]
    fn test_trusted_domain_and_subdomains() {
        let config = config();
        assert!(config.origin_allowed("https://bakehouse.example"));
        assert!(config.origin_allowed("https://www.bakehouse.example"));
        assert!(config.origin_allowed("https://shop.bakehouse.example:8443"));
        assert!(!config.origin_allowed("https://notbakehouse.example"));
        assert!(!config.origin_allowed("https://bakehouse.example.evil.com"));
    }

    #[test]
    fn test_strangers_rejected() {
        assert!(!config().origin_allowed("https://evil.com"));
        assert!(!config().origin_allowed(""));
        assert!(!config().origin_allowed("null"));
    }
}
