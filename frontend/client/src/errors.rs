//! Application-wide error types.
//!
//! Every failure in this crate is local to one action or read: nothing here
//! is fatal to the process, and a failed action leaves the engine ready for
//! an explicit retry.

use thiserror::Error;

use crate::amount::TokenAmount;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No signer account is connected. Raised before any network call.
    #[error("No wallet account is available")]
    WalletUnavailable,

    /// The wallet's signature prompt was declined before broadcast.
    #[error("Signature request was rejected in the wallet")]
    UserRejectedSignature,

    /// User-supplied amount is not a positive decimal number.
    #[error("Invalid amount {0:?}: expected a positive decimal number")]
    InvalidAmount(String),

    /// The confirmed allowance does not cover the requested spend.
    #[error("Granted allowance {granted} is below the requested amount {requested}")]
    InsufficientAllowance {
        granted: TokenAmount,
        requested: TokenAmount,
    },

    /// A contract call or transaction reverted on-chain.
    #[error("Contract call reverted: {0}")]
    ContractCallReverted(String),

    /// The read provider could not be reached, or returned unusable data.
    #[error("Contract unreachable: {0}")]
    ContractUnreachable(String),

    /// Another action is already in flight; new invocations are rejected,
    /// not queued.
    #[error("Another action is still being processed")]
    WorkflowBusy,

    /// A suspend point exceeded its bounded wait.
    #[error("Timed out waiting for {0}")]
    NetworkTimeout(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
