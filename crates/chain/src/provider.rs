//! RPC endpoint management.
//!
//! Three endpoints are kept apart: `read` for source and trove state, `hint`
//! for the sorted-list search (often a faster remote node) and `send` for
//! signed submissions. Providers are built on demand over HTTP.

use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::http::reqwest::Url;
use anyhow::{Context, Result};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ProviderManager {
    read_url: String,
    hint_url: String,
    send_url: String,
}

impl ProviderManager {
    /// Endpoints are only validated, not contacted. Use [`Self::health_check`]
    /// to verify connectivity.
    pub fn new(read_url: &str, hint_url: &str, send_url: &str) -> Result<Self> {
        for (name, url) in [("read", read_url), ("hint", hint_url), ("send", send_url)] {
            url.parse::<Url>()
                .with_context(|| format!("invalid {name} RPC URL: {url}"))?;
        }

        info!(
            read = read_url,
            hint = hint_url,
            send = send_url,
            "Initializing provider manager"
        );

        Ok(Self {
            read_url: read_url.to_string(),
            hint_url: hint_url.to_string(),
            send_url: send_url.to_string(),
        })
    }

    /// Endpoint for signed submissions.
    pub fn send_url(&self) -> &str {
        &self.send_url
    }

    /// Provider for position and trove reads.
    pub fn read_provider(&self) -> Result<impl Provider + Clone + 'static> {
        Ok(ProviderBuilder::new().on_http(self.read_url.parse()?))
    }

    /// Provider for the insertion-hint search.
    pub fn hint_provider(&self) -> Result<impl Provider + Clone + 'static> {
        Ok(ProviderBuilder::new().on_http(self.hint_url.parse()?))
    }

    /// Contact the read and hint endpoints and confirm they serve `expected_chain_id`.
    pub async fn health_check(&self, expected_chain_id: u64) -> Result<bool> {
        let read = self.read_provider()?;
        let hint = self.hint_provider()?;
        let (block, read_chain, hint_chain) = tokio::try_join!(
            read.get_block_number(),
            read.get_chain_id(),
            hint.get_chain_id()
        )?;

        debug!(
            block = block,
            read_chain = read_chain,
            hint_chain = hint_chain,
            "Provider health check"
        );
        Ok(block > 0 && read_chain == expected_chain_id && hint_chain == expected_chain_id)
    }
}
