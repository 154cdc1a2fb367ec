//! Campaign configuration and on-chain snapshot value types.
//!
//! ## Config / Snapshot split
//!
//! A campaign is handled as two separate values:
//!
//! - [`CampaignConfig`] — written once when the project team creates the
//!   campaign; never mutated by this core.
//! - [`CampaignSnapshot`] — one complete read of the contract's state,
//!   replaced wholesale on every refresh. Fields from two different reads
//!   are never merged, so a snapshot is always internally consistent for
//!   the block it was taken at (and possibly stale the moment it lands).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::abi::Address;
use crate::amount::TokenAmount;

/// Immutable campaign parameters, set at creation by the project team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub name: String,
    /// Fundraising target that must be reached before disbursement starts.
    pub min_investment: TokenAmount,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Vote-participation threshold for a milestone vote to be binding,
    /// as an integer percentage.
    pub quorum_percent: u32,
    pub owners: Vec<Address>,
}

/// One complete read of the campaign contract's public state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub total_investment: TokenAmount,
    pub is_voting_open: bool,
    /// Number of voting sessions held so far.
    pub current_voting_session: u64,
    pub project_team_withdrawal_pool: TokenAmount,
    pub is_initial_disbursement_complete: bool,
    /// Whether the automation-fee token has been funded.
    pub is_link_funded: bool,
    pub minimum_reached: bool,
    pub is_successful_fundraise_notification_sent: bool,
    /// Fundraise window start, unix seconds as reported on-chain.
    pub start_date: u64,
    /// Fundraise window end, unix seconds as reported on-chain.
    pub end_date: u64,
}

impl CampaignSnapshot {
    pub fn start_date_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.start_date as i64, 0).single()
    }

    pub fn end_date_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.end_date as i64, 0).single()
    }
}
