//! HTTP client for the investment backend.

use crate::core::investment::{InvestmentGateway, InvestmentReceipt, InvestmentRequest};
use crate::providers::util::http_client;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

pub struct HttpInvestmentGateway {
    base_url: String,
    token: Option<String>,
}

impl HttpInvestmentGateway {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        HttpInvestmentGateway {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    detail: Option<String>,
    message: Option<String>,
}

/// Best human-readable message from an error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            detail: Some(detail),
            ..
        }) => detail,
        Ok(ApiError {
            message: Some(message),
            ..
        }) => message,
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl InvestmentGateway for HttpInvestmentGateway {
    #[instrument(name = "InvestmentBuy", skip(self, request), fields(asset = %request.asset_id))]
    async fn buy(&self, request: &InvestmentRequest) -> Result<InvestmentReceipt> {
        let url = format!("{}/api/investments/buy", self.base_url);
        debug!("Posting investment to {}", url);

        let client = http_client()?;
        let mut builder = client.post(&url).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        // Purchases are not idempotent; a transport failure is reported, not retried.
        let response = builder
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for investment in {}", e, request.asset_id))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = error_message(&text);
            if message.is_empty() {
                bail!("Investment failed: HTTP {}", status);
            }
            bail!("Investment failed: {}", message);
        }

        let receipt: InvestmentReceipt = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for investment: {}", e))?;
        Ok(receipt)
    }
}
