//! Guarded transaction workflow engine.
//!
//! Every user-triggered action is an ordered plan of [`WorkflowStep`]s:
//! sign and broadcast a transaction, wait for its inclusion, check the
//! step's post-condition, then move on. Investing and fee-token funding are
//! two-step plans (approve the exact allowance, then spend it); voting,
//! milestone updates, withdrawals and automation registration are single
//! submit-and-confirm steps. A successful plan ends with a snapshot
//! refresh.
//!
//! ## Guarding
//!
//! One invocation may be in flight across the whole engine. A second
//! invocation while the first is `Submitting` or `AwaitingConfirmation` is
//! rejected with [`ClientError::WorkflowBusy`] (never queued) and emits no
//! status event. Per invocation the state machine is
//!
//! ```text
//! Idle ──► Submitting ──► AwaitingConfirmation ──► Succeeded
//!              │                    │
//!              └────────────────────┴────────────► Failed
//! ```
//!
//! (two-step plans pass through Submitting/AwaitingConfirmation once per
//! step).
//!
//! ## Events
//!
//! Each invocation emits exactly one `Info` event when it starts submitting
//! and exactly one terminal event: `Success` with the final transaction
//! hash, or `Danger` with the error detail from the step that failed.
//! Validation failures (bad amount, no wallet account) are rejected before
//! any network traffic and never reach the log.
//!
//! ## Residual allowance
//!
//! When the approve step confirms but the following spend fails, the
//! granted allowance stays in place. Revoking it would be another signed
//! transaction with its own failure modes, so the condition is surfaced to
//! the caller instead of silently corrected.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::abi::{self, AbiValue, Address};
use crate::amount::TokenAmount;
use crate::campaign::{CampaignConfig, CampaignSnapshot};
use crate::errors::{ClientError, Result};
use crate::events::{ActionKind, StatusClass, StatusEvent, StatusEventSink};
use crate::lifecycle::{self, Audience, LifecycleStage};
use crate::notify::RecordKeeper;
use crate::provider::Provider;
use crate::reader::ChainStateReader;

/// Where the engine's current (or last) invocation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    /// A transaction is being signed and broadcast.
    Submitting,
    /// Broadcast done; waiting for the transaction to be included.
    AwaitingConfirmation,
    Succeeded,
    Failed,
}

/// A transaction for the wallet to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    /// 0x-prefixed calldata.
    pub data: String,
}

/// Injected wallet capability. Account discovery and key handling live in
/// the wallet; this seam only asks it to sign and broadcast.
pub trait Signer {
    /// The connected account, if any.
    fn account(&self) -> Option<Address>;

    /// Sign and broadcast `tx`, returning the transaction hash. A declined
    /// prompt surfaces as [`ClientError::UserRejectedSignature`].
    fn send_transaction(&self, tx: &TxRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Timing of the bounded confirmation wait.
///
/// Inclusion waits poll the receipt, which is a read; the bounded retry
/// here never re-broadcasts the submission itself.
#[derive(Debug, Clone)]
pub struct WorkflowTiming {
    /// Delay between receipt polls.
    pub poll_interval: Duration,
    /// Receipt polls per transaction before giving up with a timeout.
    pub max_polls: u32,
}

impl Default for WorkflowTiming {
    fn default() -> Self {
        WorkflowTiming {
            poll_interval: Duration::from_secs(3),
            max_polls: 40,
        }
    }
}

/// Parameters for enrolling the campaign with the external keeper service,
/// so its time-based logic runs without manual calls.
#[derive(Debug, Clone)]
pub struct AutomationRegistration {
    pub name: String,
    pub gas_limit: u64,
    pub funding_amount: TokenAmount,
    pub owner: Address,
}

/// Post-condition checked after a step's transaction is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PostCondition {
    None,
    /// The on-chain allowance for `spender` must cover `amount` before the
    /// next step is allowed to spend it.
    AllowanceAtLeast {
        token: Address,
        spender: Address,
        amount: TokenAmount,
    },
}

/// One ordered sub-step of an action.
#[derive(Debug, Clone)]
struct WorkflowStep {
    description: &'static str,
    tx: TxRequest,
    post: PostCondition,
}

// ─────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────

/// Sequences the signed transactions behind each user action.
///
/// Owns its busy flag, event log and last-known-good snapshot explicitly;
/// nothing here is tied to a rendering lifetime.
pub struct WorkflowEngine<P, S> {
    provider: P,
    signer: S,
    config: CampaignConfig,
    campaign: Address,
    payment_token: Address,
    fee_token: Address,
    record_keeper: Option<RecordKeeper>,
    timing: WorkflowTiming,
    events: StatusEventSink,
    busy: AtomicBool,
    state: Mutex<WorkflowState>,
    snapshot: Mutex<Option<CampaignSnapshot>>,
}

impl<P: Provider, S: Signer> WorkflowEngine<P, S> {
    pub fn new(
        provider: P,
        signer: S,
        config: CampaignConfig,
        campaign: Address,
        payment_token: Address,
        fee_token: Address,
    ) -> Self {
        WorkflowEngine {
            provider,
            signer,
            config,
            campaign,
            payment_token,
            fee_token,
            record_keeper: None,
            timing: WorkflowTiming::default(),
            events: StatusEventSink::new(),
            busy: AtomicBool::new(false),
            state: Mutex::new(WorkflowState::Idle),
            snapshot: Mutex::new(None),
        }
    }

    /// Enable the record-keeper write-through after investments.
    pub fn with_record_keeper(mut self, record_keeper: RecordKeeper) -> Self {
        self.record_keeper = Some(record_keeper);
        self
    }

    pub fn with_timing(mut self, timing: WorkflowTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn events(&self) -> &StatusEventSink {
        &self.events
    }

    pub fn state(&self) -> WorkflowState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// The last snapshot read, if any. Replaced wholesale by
    /// [`WorkflowEngine::refresh`]; kept as-is when anything fails.
    pub fn snapshot(&self) -> Option<CampaignSnapshot> {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Project the last snapshot for `audience`. `None` until a snapshot
    /// has been read.
    pub fn lifecycle(&self, audience: Audience, now: DateTime<Utc>) -> Option<Vec<LifecycleStage>> {
        let snapshot = self.snapshot()?;
        Some(lifecycle::project(&snapshot, &self.config, audience, now))
    }

    /// Re-read the campaign snapshot.
    pub async fn refresh(&self) -> Result<()> {
        let snapshot = self.reader().read_snapshot().await?;
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot);
        Ok(())
    }

    // ── Actions ──────────────────────────────────────────

    /// Invest `amount` (a user-entered decimal string) into the campaign.
    ///
    /// Approves the exact amount on the payment token, verifies the granted
    /// allowance, then calls `invest`. If the spend fails after the
    /// approval confirmed, the allowance stays granted (see module docs).
    pub async fn invest(&self, amount: &str) -> Result<String> {
        let amount = TokenAmount::parse(amount)?;
        let from = self.require_account()?;
        let plan = self.approve_then_spend_plan(
            from,
            self.payment_token,
            amount,
            "invest(uint256)",
            "invest",
        );

        let hash = self
            .run(
                ActionKind::Invest,
                plan,
                format!("Approving {amount} for investment."),
                format!("Successfully invested {amount}."),
            )
            .await?;

        if let Some(record_keeper) = &self.record_keeper {
            record_keeper.record_investment(from, self.campaign).await;
        }
        Ok(hash)
    }

    /// Fund the campaign's automation-fee token balance.
    pub async fn fund_fee_token(&self, amount: &str) -> Result<String> {
        let amount = TokenAmount::parse(amount)?;
        let from = self.require_account()?;
        let plan = self.approve_then_spend_plan(
            from,
            self.fee_token,
            amount,
            "fundLink(uint256)",
            "fund fee token",
        );

        self.run(
            ActionKind::FundFeeToken,
            plan,
            format!("Approving {amount} LINK for the automation fee."),
            format!("Successfully funded {amount} LINK."),
        )
        .await
    }

    /// Cast a vote in the open session.
    pub async fn vote(&self, approve: bool) -> Result<String> {
        let from = self.require_account()?;
        let plan = vec![WorkflowStep {
            description: "vote",
            tx: TxRequest {
                from,
                to: self.campaign,
                data: abi::encode_call("vote(bool)", &[AbiValue::Bool(approve)]),
            },
            post: PostCondition::None,
        }];

        self.run(
            ActionKind::Vote,
            plan,
            "Submitting your vote.".to_string(),
            "Your vote was submitted successfully.".to_string(),
        )
        .await
    }

    /// Withdraw `amount` from the project-team withdrawal pool.
    pub async fn withdraw_funds(&self, amount: &str) -> Result<String> {
        let amount = TokenAmount::parse(amount)?;
        let from = self.require_account()?;
        let plan = vec![WorkflowStep {
            description: "withdraw from pool",
            tx: TxRequest {
                from,
                to: self.campaign,
                data: abi::encode_call(
                    "withdrawFromProjectTeamWithdrawalPool(uint256)",
                    &[AbiValue::Amount(amount)],
                ),
            },
            post: PostCondition::None,
        }];

        self.run(
            ActionKind::WithdrawFunds,
            plan,
            format!("Sending request to withdraw {amount}."),
            format!("Successfully withdrew {amount}. The funds are available in your wallet."),
        )
        .await
    }

    /// Publish a milestone update to the backers.
    pub async fn publish_milestone(&self) -> Result<String> {
        let from = self.require_account()?;
        let plan = vec![WorkflowStep {
            description: "publish milestone update",
            tx: TxRequest {
                from,
                to: self.campaign,
                data: abi::encode_call("projectTeamMilestoneUpdate()", &[]),
            },
            post: PostCondition::None,
        }];

        self.run(
            ActionKind::PublishMilestone,
            plan,
            "Publishing the milestone update.".to_string(),
            "Milestone update published.".to_string(),
        )
        .await
    }

    /// Register the campaign with the external keeper service.
    pub async fn register_automation(
        &self,
        registration: AutomationRegistration,
    ) -> Result<String> {
        let from = self.require_account()?;
        let plan = vec![WorkflowStep {
            description: "register automation",
            tx: TxRequest {
                from,
                to: self.campaign,
                data: abi::encode_call(
                    "registerAndPredictID(string,uint256,uint256,address)",
                    &[
                        AbiValue::Str(registration.name),
                        AbiValue::Uint(registration.gas_limit as u128),
                        AbiValue::Amount(registration.funding_amount),
                        AbiValue::Address(registration.owner),
                    ],
                ),
            },
            post: PostCondition::None,
        }];

        self.run(
            ActionKind::RegisterAutomation,
            plan,
            "Registering the campaign for automation.".to_string(),
            "Automation registration submitted.".to_string(),
        )
        .await
    }

    // ── Plan execution ───────────────────────────────────

    fn approve_then_spend_plan(
        &self,
        from: Address,
        token: Address,
        amount: TokenAmount,
        spend_signature: &'static str,
        spend_description: &'static str,
    ) -> Vec<WorkflowStep> {
        vec![
            WorkflowStep {
                description: "approve allowance",
                tx: TxRequest {
                    from,
                    to: token,
                    data: abi::encode_call(
                        "approve(address,uint256)",
                        &[AbiValue::Address(self.campaign), AbiValue::Amount(amount)],
                    ),
                },
                post: PostCondition::AllowanceAtLeast {
                    token,
                    spender: self.campaign,
                    amount,
                },
            },
            WorkflowStep {
                description: spend_description,
                tx: TxRequest {
                    from,
                    to: self.campaign,
                    data: abi::encode_call(spend_signature, &[AbiValue::Amount(amount)]),
                },
                post: PostCondition::None,
            },
        ]
    }

    async fn run(
        &self,
        action: ActionKind,
        plan: Vec<WorkflowStep>,
        submit_message: String,
        success_message: String,
    ) -> Result<String> {
        let _guard = self.acquire()?;

        self.set_state(WorkflowState::Submitting);
        self.events.emit(StatusEvent {
            action,
            class: StatusClass::Info,
            message: submit_message,
            tx_hash: None,
        });

        let mut last_hash = String::new();
        for step in &plan {
            match self.execute_step(step).await {
                Ok(hash) => last_hash = hash,
                Err(err) => {
                    warn!(
                        "{} failed at step {:?}: {err}",
                        action.describe(),
                        step.description
                    );
                    self.events.emit(StatusEvent {
                        action,
                        class: StatusClass::Danger,
                        message: format!("Error during {}: {err}", step.description),
                        tx_hash: None,
                    });
                    self.set_state(WorkflowState::Failed);
                    return Err(err);
                }
            }
        }

        self.events.emit(StatusEvent {
            action,
            class: StatusClass::Success,
            message: success_message,
            tx_hash: Some(last_hash.clone()),
        });
        self.set_state(WorkflowState::Succeeded);

        // The action already landed on-chain. A failed refresh keeps the
        // previous snapshot and is reported out of band.
        if let Err(err) = self.refresh().await {
            warn!("snapshot refresh after {} failed: {err}", action.describe());
        }

        Ok(last_hash)
    }

    async fn execute_step(&self, step: &WorkflowStep) -> Result<String> {
        self.set_state(WorkflowState::Submitting);
        debug!("submitting step {:?}", step.description);
        let hash = self.signer.send_transaction(&step.tx).await?;

        self.set_state(WorkflowState::AwaitingConfirmation);
        self.wait_for_inclusion(&hash).await?;
        self.check_post_condition(&step.post).await?;
        Ok(hash)
    }

    /// Poll for the transaction receipt until it appears or the bounded
    /// wait runs out. Once broadcast, the transaction itself cannot be
    /// cancelled or re-sent from here.
    async fn wait_for_inclusion(&self, hash: &str) -> Result<()> {
        for _ in 0..self.timing.max_polls {
            let receipt = self
                .provider
                .request("eth_getTransactionReceipt", json!([hash]))
                .await?;
            if !receipt.is_null() {
                let status = receipt
                    .get("status")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("0x1");
                if status == "0x0" {
                    return Err(ClientError::ContractCallReverted(format!(
                        "transaction {hash} reverted"
                    )));
                }
                debug!("transaction {hash} confirmed");
                return Ok(());
            }
            tokio::time::sleep(self.timing.poll_interval).await;
        }
        Err(ClientError::NetworkTimeout(format!(
            "inclusion of transaction {hash}"
        )))
    }

    async fn check_post_condition(&self, post: &PostCondition) -> Result<()> {
        match post {
            PostCondition::None => Ok(()),
            PostCondition::AllowanceAtLeast {
                token,
                spender,
                amount,
            } => {
                let owner = self.require_account()?;
                let granted = self.reader().allowance(*token, owner, *spender).await?;
                if granted < *amount {
                    return Err(ClientError::InsufficientAllowance {
                        granted,
                        requested: *amount,
                    });
                }
                Ok(())
            }
        }
    }

    // ── Internals ────────────────────────────────────────

    fn reader(&self) -> ChainStateReader<&P> {
        ChainStateReader::new(&self.provider, self.campaign)
    }

    fn require_account(&self) -> Result<Address> {
        self.signer.account().ok_or(ClientError::WalletUnavailable)
    }

    fn acquire(&self) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(ClientError::WorkflowBusy);
        }
        Ok(BusyGuard { flag: &self.busy })
    }

    fn set_state(&self, state: WorkflowState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

/// Releases the engine's busy flag when the invocation ends, on success and
/// on every early return alike.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::testutil::{word_hex, MockProvider, MockSigner, CAMPAIGN, FEE_TOKEN, PAYMENT_TOKEN};

    const BACKER: Address = Address::new([0xb0; 20]);

    fn test_config() -> CampaignConfig {
        CampaignConfig {
            name: "Test campaign".to_string(),
            min_investment: TokenAmount::from_whole(100),
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap(),
            quorum_percent: 51,
            owners: vec![Address::new([0xaa; 20])],
        }
    }

    fn engine(
        provider: MockProvider,
        signer: MockSigner,
    ) -> WorkflowEngine<MockProvider, MockSigner> {
        WorkflowEngine::new(
            provider,
            signer,
            test_config(),
            CAMPAIGN,
            PAYMENT_TOKEN,
            FEE_TOKEN,
        )
        .with_timing(WorkflowTiming {
            poll_interval: Duration::from_millis(1),
            max_polls: 20,
        })
    }

    fn stub_snapshot_getters(provider: &MockProvider) {
        for signature in [
            "investmentPool()",
            "isVotingOpen()",
            "currentVotingSession()",
            "projectTeamWithdrawalPool()",
            "isInitialDisbursementToProjectTeamComplete()",
            "isLinkFunded()",
            "minimumReached()",
            "isSuccessfulFundraiseNotificationSent()",
            "startDate()",
            "endDate()",
        ] {
            provider.stub_getter(signature, &word_hex(TokenAmount::ZERO));
        }
    }

    fn stub_allowance(provider: &MockProvider, owner: Address, granted: TokenAmount) {
        let data = abi::encode_call(
            "allowance(address,address)",
            &[AbiValue::Address(owner), AbiValue::Address(CAMPAIGN)],
        );
        provider.stub_call(&data, &word_hex(granted));
    }

    #[tokio::test]
    async fn invest_success_emits_info_then_success_and_refreshes() {
        let provider = MockProvider::default();
        stub_snapshot_getters(&provider);
        stub_allowance(&provider, BACKER, TokenAmount::from_whole(10));
        provider.stub_receipt("0xapprove", "0x1");
        provider.stub_receipt("0xinvest", "0x1");

        let signer = MockSigner::new(BACKER);
        signer.queue_hash("0xapprove");
        signer.queue_hash("0xinvest");

        let engine = engine(provider, signer);
        let hash = engine.invest("10").await.expect("invest should succeed");
        assert_eq!(hash, "0xinvest");

        let log = engine.events().events_for(ActionKind::Invest);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].class, StatusClass::Info);
        assert_eq!(log[1].class, StatusClass::Success);
        assert_eq!(log[1].tx_hash.as_deref(), Some("0xinvest"));

        assert_eq!(engine.state(), WorkflowState::Succeeded);
        assert!(engine.snapshot().is_some(), "success must trigger a refresh");

        let sent = engine.signer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, PAYMENT_TOKEN);
        assert!(sent[0]
            .data
            .starts_with(&format!("0x{}", hex::encode(abi::selector("approve(address,uint256)")))));
        assert_eq!(sent[1].to, CAMPAIGN);
    }

    #[tokio::test]
    async fn invest_spend_failure_keeps_allowance_and_skips_refresh() {
        let provider = MockProvider::default();
        stub_snapshot_getters(&provider);
        stub_allowance(&provider, BACKER, TokenAmount::from_whole(10));
        provider.stub_receipt("0xapprove", "0x1");
        provider.stub_receipt("0xinvest", "0x0"); // spend reverts

        let signer = MockSigner::new(BACKER);
        signer.queue_hash("0xapprove");
        signer.queue_hash("0xinvest");

        let engine = engine(provider, signer);
        let result = engine.invest("10").await;
        assert!(matches!(result, Err(ClientError::ContractCallReverted(_))));

        let log = engine.events().events_for(ActionKind::Invest);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].class, StatusClass::Info);
        assert_eq!(log[1].class, StatusClass::Danger);

        assert_eq!(engine.state(), WorkflowState::Failed);
        assert!(engine.snapshot().is_none(), "no refresh after a failure");

        // the approval stays in place: both transactions were sent and
        // nothing was submitted to revoke the allowance afterwards
        assert_eq!(engine.signer.sent().len(), 2);
    }

    #[tokio::test]
    async fn insufficient_allowance_stops_before_the_spend() {
        let provider = MockProvider::default();
        stub_snapshot_getters(&provider);
        stub_allowance(&provider, BACKER, TokenAmount::from_whole(5)); // below 10
        provider.stub_receipt("0xapprove", "0x1");

        let signer = MockSigner::new(BACKER);
        signer.queue_hash("0xapprove");

        let engine = engine(provider, signer);
        let result = engine.invest("10").await;
        assert!(matches!(
            result,
            Err(ClientError::InsufficientAllowance { .. })
        ));
        // only the approve was ever broadcast
        assert_eq!(engine.signer.sent().len(), 1);
        assert_eq!(engine.state(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn invalid_amounts_fail_fast_without_events() {
        let provider = MockProvider::default();
        let signer = MockSigner::new(BACKER);
        let engine = engine(provider, signer);

        for bad in ["abc", "-5", "0", ""] {
            let result = engine.invest(bad).await;
            assert!(matches!(result, Err(ClientError::InvalidAmount(_))));
        }
        assert!(engine.events().is_empty());
        assert!(engine.signer.sent().is_empty());
        assert_eq!(engine.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn missing_wallet_account_fails_fast_without_events() {
        let provider = MockProvider::default();
        let engine = engine(provider, MockSigner::disconnected());

        let result = engine.invest("10").await;
        assert!(matches!(result, Err(ClientError::WalletUnavailable)));
        assert!(engine.events().is_empty());
        assert_eq!(engine.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn declined_signature_is_a_distinct_failure() {
        let provider = MockProvider::default();
        let signer = MockSigner::new(BACKER);
        signer.queue_rejection();

        let engine = engine(provider, signer);
        let result = engine.vote(true).await;
        assert!(matches!(result, Err(ClientError::UserRejectedSignature)));

        let log = engine.events().events_for(ActionKind::Vote);
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].class, StatusClass::Danger);
        assert_eq!(engine.state(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn second_action_rejected_while_busy() {
        let provider = MockProvider::default();
        // the receipt never appears, so the first action stays in flight
        // until its bounded wait times out
        let signer = MockSigner::new(BACKER);
        signer.queue_hash("0xpending");

        let engine = engine(provider, signer);
        let (first, second) = tokio::join!(engine.invest("10"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            engine.vote(true).await
        });

        assert!(matches!(second, Err(ClientError::WorkflowBusy)));
        assert!(
            engine.events().events_for(ActionKind::Vote).is_empty(),
            "a rejected invocation emits nothing"
        );
        assert!(matches!(first, Err(ClientError::NetworkTimeout(_))));
    }

    #[tokio::test]
    async fn engine_is_reusable_after_a_failure() {
        let provider = MockProvider::default();
        stub_snapshot_getters(&provider);
        provider.stub_receipt("0xvote", "0x1");

        let signer = MockSigner::new(BACKER);
        signer.queue_rejection();
        signer.queue_hash("0xvote");

        let engine = engine(provider, signer);
        assert!(engine.vote(true).await.is_err());
        // the busy flag was released; an explicit retry goes through
        let hash = engine.vote(false).await.expect("retry should succeed");
        assert_eq!(hash, "0xvote");
        assert_eq!(engine.state(), WorkflowState::Succeeded);
    }

    #[tokio::test]
    async fn single_step_actions_target_the_campaign() {
        let provider = MockProvider::default();
        stub_snapshot_getters(&provider);
        provider.stub_receipt("0xtx", "0x1");

        let signer = MockSigner::new(BACKER);
        signer.queue_hash("0xtx");

        let engine = engine(provider, signer);
        engine.vote(true).await.unwrap();

        let sent = engine.signer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, CAMPAIGN);
        assert_eq!(sent[0].from, BACKER);
        assert!(sent[0]
            .data
            .starts_with(&format!("0x{}", hex::encode(abi::selector("vote(bool)")))));
    }

    #[tokio::test]
    async fn fee_token_funding_approves_on_the_fee_token() {
        let provider = MockProvider::default();
        stub_snapshot_getters(&provider);
        stub_allowance(&provider, BACKER, TokenAmount::from_whole(3));
        provider.stub_receipt("0xapprove", "0x1");
        provider.stub_receipt("0xfund", "0x1");

        let signer = MockSigner::new(BACKER);
        signer.queue_hash("0xapprove");
        signer.queue_hash("0xfund");

        let engine = engine(provider, signer);
        engine.fund_fee_token("3").await.unwrap();

        let sent = engine.signer.sent();
        assert_eq!(sent[0].to, FEE_TOKEN);
        assert_eq!(sent[1].to, CAMPAIGN);
        assert!(sent[1]
            .data
            .starts_with(&format!("0x{}", hex::encode(abi::selector("fundLink(uint256)")))));
    }

    #[tokio::test]
    async fn lifecycle_projects_the_refreshed_snapshot() {
        let provider = MockProvider::default();
        stub_snapshot_getters(&provider);
        // overwrite one getter so the refreshed snapshot is distinguishable
        provider.stub_getter("minimumReached()", &word_hex(TokenAmount::from_base_units(1)));
        provider.stub_receipt("0xvote", "0x1");

        let signer = MockSigner::new(BACKER);
        signer.queue_hash("0xvote");

        let engine = engine(provider, signer);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(engine.lifecycle(Audience::Backer, now).is_none());

        engine.vote(true).await.unwrap();
        let stages = engine.lifecycle(Audience::Backer, now).unwrap();
        assert_eq!(stages[1].status, crate::lifecycle::StageStatus::Completed);
    }
}
