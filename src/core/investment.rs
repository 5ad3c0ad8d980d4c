//! Downstream purchase call. No order book or ledger lives here; the backend
//! owns both.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRequest {
    pub asset_id: String,
    pub amount: f64,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentReceipt {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait InvestmentGateway: Send + Sync {
    async fn buy(&self, request: &InvestmentRequest) -> Result<InvestmentReceipt>;
}
