//! Status events emitted by the transaction workflow.
//!
//! Each user-triggered action gets its own append-only log. The UI renders
//! at most the latest event per action; the full sequence stays available
//! until the action's log is explicitly dismissed.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// User-triggered actions the workflow engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Invest,
    FundFeeToken,
    Vote,
    WithdrawFunds,
    PublishMilestone,
    RegisterAutomation,
}

impl ActionKind {
    /// Human-readable description shown next to the action's log entries.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Invest => "Invest in project",
            Self::FundFeeToken => "Fund automation fee token",
            Self::Vote => "Submit vote",
            Self::WithdrawFunds => "Withdraw funds",
            Self::PublishMilestone => "Publish milestone update",
            Self::RegisterAutomation => "Register automation",
        }
    }
}

/// Severity class of a status event, matching the UI's alert levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Info,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub action: ActionKind,
    pub class: StatusClass,
    pub message: String,
    pub tx_hash: Option<String>,
}

/// Append-only per-action log of workflow status events.
///
/// Owned by the engine instance, not by any rendering lifetime; consumers
/// observe it through a shared reference.
#[derive(Debug, Default)]
pub struct StatusEventSink {
    events: Mutex<Vec<StatusEvent>>,
}

impl StatusEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&self, event: StatusEvent) {
        self.lock().push(event);
    }

    /// The latest event recorded for `action`, if any.
    pub fn latest_for(&self, action: ActionKind) -> Option<StatusEvent> {
        self.lock()
            .iter()
            .rev()
            .find(|e| e.action == action)
            .cloned()
    }

    /// Every event recorded for `action`, oldest first.
    pub fn events_for(&self, action: ActionKind) -> Vec<StatusEvent> {
        self.lock()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    /// Every recorded event, oldest first.
    pub fn all(&self) -> Vec<StatusEvent> {
        self.lock().clone()
    }

    /// Drop the log for one action. Called only on an explicit dismissal;
    /// other actions' logs are untouched.
    pub fn dismiss(&self, action: ActionKind) {
        self.lock().retain(|e| e.action != action);
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StatusEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
