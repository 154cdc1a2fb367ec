//! Campaign status inspector — entry point.
//!
//! Reads one campaign contract over JSON-RPC and prints the projected
//! lifecycle for the chosen audience. Read-only: nothing is signed or
//! broadcast from here.

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use client::campaign::CampaignConfig;
use client::config::Config;
use client::lifecycle::{self, StageStatus};
use client::provider::HttpProvider;
use client::reader::ChainStateReader;
use client::TokenAmount;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let provider = HttpProvider::new(&config.rpc_url)?;
    let reader = ChainStateReader::new(provider, config.campaign_address);

    info!("Reading campaign {}", config.campaign_address);
    let snapshot = reader.read_snapshot().await?;

    // The metadata service owns the full campaign record; for a read-only
    // inspection the on-chain dates are enough to drive the projection.
    let campaign = CampaignConfig {
        name: config.campaign_address.to_string(),
        min_investment: TokenAmount::ZERO,
        start_date: snapshot
            .start_date_utc()
            .ok_or_else(|| anyhow::anyhow!("on-chain start date out of range"))?,
        end_date: snapshot
            .end_date_utc()
            .ok_or_else(|| anyhow::anyhow!("on-chain end date out of range"))?,
        quorum_percent: 0,
        owners: Vec::new(),
    };

    let stages = lifecycle::project(&snapshot, &campaign, config.audience, Utc::now());

    println!("Campaign {}", config.campaign_address);
    println!("  total investment:     {}", snapshot.total_investment);
    println!(
        "  withdrawal pool:      {}",
        snapshot.project_team_withdrawal_pool
    );
    println!("  minimum reached:      {}", snapshot.minimum_reached);
    println!("  voting open:          {}", snapshot.is_voting_open);
    println!("  voting sessions held: {}", snapshot.current_voting_session);
    println!();

    for stage in &stages {
        let marker = match stage.status {
            StageStatus::Completed => "x",
            StageStatus::InProgress => ">",
            StageStatus::FutureEvent => " ",
        };
        println!("  [{marker}] {}", stage.description);
    }

    Ok(())
}
