//! # Chainpay Subscriptions Client SDK
//!
//! Drives on-chain subscription lifecycle actions (activate, pause, unpause,
//! cancel, change allowance) through a user's connected wallet while keeping
//! a remote subscription-management API eventually consistent with on-chain
//! state.
//!
//! The SDK owns two pieces of coordination logic:
//!
//! - [`OperationLock`] — a single-flight guard ensuring only one
//!   wallet-affecting operation runs at a time. Wallet signature prompts must
//!   never stack, so overlapping calls are rejected immediately rather than
//!   queued.
//! - [`Reconciler`] — a bounded polling loop that bridges a confirmed
//!   on-chain transaction to the remote API's view of subscription status and
//!   allowance, emitting progress events along the way.
//!
//! Wallet connectivity and chain access are consumed through the
//! [`WalletProvider`] and [`ChainFacade`] capability traits; the remote API
//! through [`SubscriptionApi`]. The SDK never holds keys and never signs —
//! it orchestrates.

pub mod amount;
pub mod api;
pub mod chain;
pub mod config;
pub mod discovery;
pub mod events;
pub mod lock;
pub mod operations;
pub mod reconcile;
pub mod subscription;
pub mod token;
pub mod wallet;

pub use amount::Amount;
pub use api::{HintAck, HintUpdate, HttpSubscriptionApi, SubscriptionApi, SubscriptionStatusInfo};
pub use chain::{ApproveSpend, ChainFacade};
pub use config::SdkConfig;
pub use discovery::ApiDiscovery;
pub use events::{EventBus, ReconcileOutcome, SdkEvent, TxKind};
pub use lock::OperationLock;
pub use operations::{ActionOptions, ActionOutcome, SubscriptionOperations};
pub use reconcile::{ReconcileRequest, ReconcileTarget, Reconciler};
pub use subscription::{is_ending_subscription, Subscription, SubscriptionStatus};
pub use token::{AssetRegistry, TokenDescriptor};
pub use wallet::{WalletEvent, WalletProvider};

/// Common result alias for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Stable error taxonomy surfaced to SDK callers.
///
/// Precondition violations that mean "already in the desired state" are not
/// errors — those paths return [`operations::ActionOutcome::Skipped`]. The
/// variants here are real failures, except [`SdkError::OperationBusy`] which
/// is a retry signal: another guarded operation is in flight and the caller
/// should try again once it finishes.
#[derive(thiserror::Error, Debug)]
pub enum SdkError {
    /// Another lock-guarded operation is currently executing.
    #[error("operation rejected: '{active}' is already in flight")]
    OperationBusy { active: String },

    /// Payer balance does not cover the subscription amount (absolute units).
    #[error("insufficient funds: need {required} {currency}, have {available} {currency}")]
    InsufficientFunds {
        required: String,
        available: String,
        currency: String,
    },

    /// The subscription's currency code is not in the asset registry.
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    /// No connected wallet to sign with.
    #[error("no active wallet connection")]
    NoActiveWallet,

    /// A wallet/chain call failed; the underlying error is kept as context
    /// rather than surfaced raw.
    #[error("wallet operation failed during {action}")]
    WalletOperationFailed {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The remote API received the transaction hint but did not accept it.
    #[error("subscription api rejected the transaction notification")]
    ApiNotificationRejected,

    /// No candidate API base URL responded during discovery.
    #[error("no subscription api endpoint reachable")]
    ApiUnreachable,

    /// The remote API returned an error; carries the server's `message`
    /// field when present, else the HTTP status text.
    #[error("subscription api error: {0}")]
    Api(String),

    /// A quantity string could not be parsed as `"<value> <CURRENCY>"`.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
