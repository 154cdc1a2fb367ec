//! Record-keeper write-through.
//!
//! After a confirmed investment, the campaign-metadata service is told
//! which wallet backed which campaign. The on-chain result is already final
//! by the time this runs, so a failed notification is logged and dropped,
//! never propagated back into the workflow.

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::abi::Address;

#[derive(Debug, Serialize)]
struct InvestmentNotice {
    wallet_address: String,
    contract_address: String,
}

/// Client for the external campaign-metadata service.
#[derive(Debug, Clone)]
pub struct RecordKeeper {
    client: Client,
    base_url: String,
}

impl RecordKeeper {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        RecordKeeper { client, base_url }
    }

    /// Associate `wallet` with `campaign` after a confirmed investment.
    pub async fn record_investment(&self, wallet: Address, campaign: Address) {
        let url = format!("{}/project/invested", self.base_url);
        let notice = InvestmentNotice {
            wallet_address: wallet.to_string(),
            contract_address: campaign.to_string(),
        };
        match self.client.post(&url).json(&notice).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!("investment by {wallet} recorded");
            }
            Ok(resp) => warn!(
                "record keeper rejected investment notice: HTTP {}",
                resp.status()
            ),
            Err(e) => warn!("record keeper unreachable: {e}"),
        }
    }
}
