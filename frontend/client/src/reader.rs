//! On-chain campaign state reads.
//!
//! The fixed getter surface of the campaign contract is fetched in one pass
//! and decoded into a [`CampaignSnapshot`]. The read is all-or-nothing: if
//! any getter fails, no snapshot is produced, and a partially populated
//! snapshot is never observable.

use serde_json::json;
use tracing::debug;

use crate::abi::{self, AbiValue, Address};
use crate::amount::TokenAmount;
use crate::campaign::CampaignSnapshot;
use crate::errors::{ClientError, Result};
use crate::provider::Provider;

/// Reads campaign contract state through an injected [`Provider`].
pub struct ChainStateReader<P> {
    provider: P,
    campaign: Address,
}

impl<P: Provider> ChainStateReader<P> {
    pub fn new(provider: P, campaign: Address) -> Self {
        ChainStateReader { provider, campaign }
    }

    /// Fetch one complete snapshot of the campaign contract.
    ///
    /// 1e18-scaled words are converted exactly; `currentVotingSession` is
    /// reported 1e18-scaled by the contract, so only its whole units count.
    pub async fn read_snapshot(&self) -> Result<CampaignSnapshot> {
        let total_investment = self.read_amount("investmentPool()").await?;
        let is_voting_open = self.read_bool("isVotingOpen()").await?;
        let current_voting_session = self.read_session("currentVotingSession()").await?;
        let project_team_withdrawal_pool = self.read_amount("projectTeamWithdrawalPool()").await?;
        let is_initial_disbursement_complete = self
            .read_bool("isInitialDisbursementToProjectTeamComplete()")
            .await?;
        let is_link_funded = self.read_bool("isLinkFunded()").await?;
        let minimum_reached = self.read_bool("minimumReached()").await?;
        let is_successful_fundraise_notification_sent = self
            .read_bool("isSuccessfulFundraiseNotificationSent()")
            .await?;
        let start_date = self.read_u64("startDate()").await?;
        let end_date = self.read_u64("endDate()").await?;

        let snapshot = CampaignSnapshot {
            total_investment,
            is_voting_open,
            current_voting_session,
            project_team_withdrawal_pool,
            is_initial_disbursement_complete,
            is_link_funded,
            minimum_reached,
            is_successful_fundraise_notification_sent,
            start_date,
            end_date,
        };
        debug!(?snapshot, "campaign snapshot read");
        Ok(snapshot)
    }

    /// ERC-20 allowance granted by `owner` to `spender` on `token`.
    pub async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<TokenAmount> {
        let data = abi::encode_call(
            "allowance(address,address)",
            &[AbiValue::Address(owner), AbiValue::Address(spender)],
        );
        abi::decode_amount(&self.call(token, data).await?)
    }

    async fn call(&self, to: Address, data: String) -> Result<String> {
        let params = json!([{ "to": to.to_string(), "data": data }, "latest"]);
        let value = self.provider.request("eth_call", params).await?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| {
                ClientError::ContractUnreachable("eth_call result is not a string".to_string())
            })
    }

    async fn getter(&self, signature: &str) -> Result<String> {
        let data = abi::encode_call(signature, &[]);
        self.call(self.campaign, data).await
    }

    async fn read_amount(&self, signature: &str) -> Result<TokenAmount> {
        abi::decode_amount(&self.getter(signature).await?)
    }

    async fn read_bool(&self, signature: &str) -> Result<bool> {
        abi::decode_bool(&self.getter(signature).await?)
    }

    async fn read_u64(&self, signature: &str) -> Result<u64> {
        abi::decode_u64(&self.getter(signature).await?)
    }

    async fn read_session(&self, signature: &str) -> Result<u64> {
        let scaled = self.read_amount(signature).await?;
        u64::try_from(scaled.whole_units()).map_err(|_| {
            ClientError::ContractUnreachable("voting session counter out of range".to_string())
        })
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
