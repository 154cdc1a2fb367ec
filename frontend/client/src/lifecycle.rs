//! Campaign lifecycle projection.
//!
//! One rule engine turns a [`CampaignSnapshot`] into the ordered stage list
//! an audience sees. The stage *tables* differ per audience (backers see 7
//! stages, the project team 9, the legacy view 6) but the status
//! assignment is a single shared function: rules address semantic
//! [`StageRole`]s, and an audience that does not display a role simply
//! skips the rules targeting it.
//!
//! ## Evaluation model
//!
//! Every call starts from a fresh copy of the audience's default statuses
//! (first stage completed, second in progress, the rest future events) and
//! applies the rules below in order. A rule only ever *promotes* a stage
//! (`future_event → in_progress → completed`), so a later rule wins where
//! two rules touch the same stage and no stage can regress within one
//! evaluation. The previous output is never an input: identical
//! `(snapshot, config, now)` always produce an identical list.
//!
//! | # | Condition                                   | Effect                                        |
//! |---|---------------------------------------------|-----------------------------------------------|
//! | 1 | always                                      | creation completed                            |
//! | 2 | fee token funded                            | fee-funding completed                         |
//! | 3 | minimum reached                             | raising completed, disbursement in progress   |
//! | 4 | initial disbursement complete               | disbursement completed, milestone in progress |
//! | 5 | voting open                                 | milestone completed, voting in progress       |
//! | 6 | voting closed after ≥1 session              | voting completed, payout stage in progress    |
//! | 7 | ≥1 session and pool drained                 | refund and delivered completed                |
//! | 8 | minimum missed and the window has closed    | refund in progress                            |

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::campaign::{CampaignConfig, CampaignSnapshot};
use crate::errors::ClientError;

/// Rendering status of one lifecycle stage.
///
/// Ordered so that a later status never moves backwards: promotion is the
/// only status change the rule engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    FutureEvent,
    InProgress,
    Completed,
}

/// Semantic position of a stage within the campaign lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    Creation,
    /// Funding of the automation-fee token (tracked for the team view).
    FeeFunding,
    Raising,
    InitialDisbursement,
    MilestoneUpdate,
    Voting,
    Refund,
    FinalWithdrawal,
    Delivered,
}

/// The fixed description of one stage as shown to an audience.
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub role: StageRole,
    pub description: &'static str,
    pub call_to_action: Option<&'static str>,
}

/// One projected stage with its computed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleStage {
    pub description: &'static str,
    pub status: StageStatus,
    pub call_to_action: Option<&'static str>,
}

// ─────────────────────────────────────────────────────────
// Audience stage tables
// ─────────────────────────────────────────────────────────

/// Which view of the campaign lifecycle is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Backer,
    ProjectTeam,
    /// The original single-page workflow view, kept for existing screens.
    Legacy,
}

const fn stage(role: StageRole, description: &'static str) -> StageSpec {
    StageSpec {
        role,
        description,
        call_to_action: None,
    }
}

const fn stage_with_action(
    role: StageRole,
    description: &'static str,
    call_to_action: &'static str,
) -> StageSpec {
    StageSpec {
        role,
        description,
        call_to_action: Some(call_to_action),
    }
}

const BACKER_STAGES: &[StageSpec] = &[
    stage(StageRole::Creation, "Invest in project"),
    stage(StageRole::Raising, "Raising funds"),
    stage(
        StageRole::InitialDisbursement,
        "Project started - initial funds sent to project team",
    ),
    stage(StageRole::MilestoneUpdate, "Milestone update by project team"),
    stage_with_action(StageRole::Voting, "Voting in progress", "Vote now"),
    stage_with_action(StageRole::Refund, "Refund initiated", "Claim refund"),
    stage(StageRole::Delivered, "Project delivered"),
];

const PROJECT_TEAM_STAGES: &[StageSpec] = &[
    stage(StageRole::Creation, "Contract creation"),
    stage_with_action(
        StageRole::FeeFunding,
        "Automation fee token funded",
        "Fund LINK",
    ),
    stage(StageRole::Raising, "Fund raising"),
    stage(
        StageRole::InitialDisbursement,
        "Initial disbursement to project team",
    ),
    stage_with_action(StageRole::MilestoneUpdate, "Milestone update", "Send update"),
    stage(StageRole::Voting, "Voting"),
    stage_with_action(StageRole::FinalWithdrawal, "Withdraw funds", "Withdraw"),
    stage(StageRole::Refund, "Refund initiated"),
    stage(StageRole::Delivered, "Complete"),
];

const LEGACY_STAGES: &[StageSpec] = &[
    stage(StageRole::Creation, "Contract creation"),
    stage(StageRole::Raising, "Fund raising"),
    stage_with_action(StageRole::MilestoneUpdate, "Milestone update", "Update sent"),
    stage(StageRole::Voting, "Voting"),
    stage_with_action(StageRole::FinalWithdrawal, "Withdraw funds", "Withdraw"),
    stage(StageRole::Delivered, "Complete"),
];

impl Audience {
    /// The fixed, ordered stage table for this audience.
    pub fn stages(self) -> &'static [StageSpec] {
        match self {
            Audience::Backer => BACKER_STAGES,
            Audience::ProjectTeam => PROJECT_TEAM_STAGES,
            Audience::Legacy => LEGACY_STAGES,
        }
    }
}

impl FromStr for Audience {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, ClientError> {
        match s.to_ascii_lowercase().as_str() {
            "backer" => Ok(Audience::Backer),
            "team" | "project-team" => Ok(Audience::ProjectTeam),
            "legacy" => Ok(Audience::Legacy),
            other => Err(ClientError::Config(format!("unknown audience: {other}"))),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Projection
// ─────────────────────────────────────────────────────────

fn default_status(index: usize) -> StageStatus {
    match index {
        0 => StageStatus::Completed,
        1 => StageStatus::InProgress,
        _ => StageStatus::FutureEvent,
    }
}

/// Project one snapshot into the audience's ordered stage list.
///
/// Pure and history-independent; `now` is explicit so the time-dependent
/// failure-path rule is deterministic under test.
pub fn project(
    snapshot: &CampaignSnapshot,
    config: &CampaignConfig,
    audience: Audience,
    now: DateTime<Utc>,
) -> Vec<LifecycleStage> {
    use StageRole::*;
    use StageStatus::{Completed, InProgress};

    let specs = audience.stages();
    let mut stages: Vec<LifecycleStage> = specs
        .iter()
        .enumerate()
        .map(|(index, spec)| LifecycleStage {
            description: spec.description,
            status: default_status(index),
            call_to_action: spec.call_to_action,
        })
        .collect();

    let has_role = |role: StageRole| specs.iter().any(|s| s.role == role);
    let mut promote = |role: StageRole, status: StageStatus| {
        if let Some(position) = specs.iter().position(|s| s.role == role) {
            if status > stages[position].status {
                stages[position].status = status;
            }
        }
    };

    // 1. A campaign that can be read at all has been created.
    promote(Creation, Completed);

    // 2. Automation fee token funded.
    if snapshot.is_link_funded {
        promote(FeeFunding, Completed);
    }

    // 3. Minimum reached: fundraising is done, disbursement starts.
    if snapshot.minimum_reached {
        promote(Raising, Completed);
        promote(InitialDisbursement, InProgress);
    }

    // 4. Initial funds were sent; the milestone phase is entered.
    if snapshot.is_initial_disbursement_complete {
        promote(InitialDisbursement, Completed);
        promote(MilestoneUpdate, InProgress);
    }

    // 5. A vote is running.
    if snapshot.is_voting_open {
        promote(MilestoneUpdate, Completed);
        promote(Voting, InProgress);
    }

    // 6. At least one session was held and none is open: the payout path
    //    is next. Final withdrawal where the audience has that stage,
    //    refund otherwise.
    if !snapshot.is_voting_open && snapshot.current_voting_session > 0 {
        promote(Voting, Completed);
        if has_role(FinalWithdrawal) {
            promote(FinalWithdrawal, InProgress);
        } else {
            promote(Refund, InProgress);
        }
    }

    // 7. Refund path exhausted: the pool is drained after at least one
    //    session, so the campaign has run its course.
    if snapshot.current_voting_session > 0 && snapshot.total_investment.is_zero() {
        promote(Refund, Completed);
        promote(Delivered, Completed);
    }

    // 8. Failure path: the window closed without reaching the minimum.
    //    Independent of rules 3–7; promotion keeps it from demoting a
    //    refund stage that rule 7 already completed.
    if !snapshot.minimum_reached && now >= config.end_date {
        promote(Refund, InProgress);
    }

    stages
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
