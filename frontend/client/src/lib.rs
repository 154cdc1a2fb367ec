//! # DeFi crowdfunding campaign client
//!
//! Client-side core for milestone-based crowdfunding campaigns whose money
//! handling lives in an on-chain contract. The contract is the oracle of
//! truth; this crate only *projects* its state into human-meaningful
//! lifecycle stages and *orchestrates* the signed calls against it:
//!
//! | Concern                      | Module        |
//! |------------------------------|---------------|
//! | Chain access capability      | [`provider`]  |
//! | Snapshot reads               | [`reader`]    |
//! | Campaign value types         | [`campaign`]  |
//! | Lifecycle projection         | [`lifecycle`] |
//! | Guarded transaction workflow | [`workflow`]  |
//! | Status event log             | [`events`]    |
//! | Fixed-point amounts          | [`amount`]    |
//! | ABI codec                    | [`abi`]       |
//! | Record-keeper write-through  | [`notify`]    |
//!
//! Data flow: a UI action enters the [`workflow::WorkflowEngine`] (guarded
//! by its busy flag), one or more chain calls run in strict sequence, and
//! on success the engine re-reads the [`campaign::CampaignSnapshot`] so the
//! next [`lifecycle::project`] call reflects the new state.
//!
//! Wallets and transports are injected capabilities
//! ([`provider::Provider`], [`workflow::Signer`]), so every async path in
//! this crate is testable against scripted doubles.

pub mod abi;
pub mod amount;
pub mod campaign;
pub mod config;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod notify;
pub mod provider;
pub mod reader;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testutil;

pub use abi::Address;
pub use amount::TokenAmount;
pub use campaign::{CampaignConfig, CampaignSnapshot};
pub use errors::{ClientError, Result};
pub use events::{ActionKind, StatusClass, StatusEvent, StatusEventSink};
pub use lifecycle::{project, Audience, LifecycleStage, StageStatus};
pub use notify::RecordKeeper;
pub use provider::{HttpProvider, Provider};
pub use reader::ChainStateReader;
pub use workflow::{
    AutomationRegistration, Signer, TxRequest, WorkflowEngine, WorkflowState, WorkflowTiming,
};
