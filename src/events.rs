//! Typed SDK events
//!
//! Every observable side effect of the SDK is published as an [`SdkEvent`]
//! variant with a strongly-typed payload. UI layers subscribe through
//! [`EventBus::subscribe`]; publishing never blocks and events are dropped
//! when nobody is listening.

use std::fmt;
use tokio::sync::broadcast;

/// Kind of wallet-signed transaction announced after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    TokenApprove,
    SubscriptionPause,
    SubscriptionUnpause,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TokenApprove => "token-approve-tx",
            Self::SubscriptionPause => "subscription-pause-tx",
            Self::SubscriptionUnpause => "subscription-unpause-tx",
        };
        write!(f, "{}", name)
    }
}

/// Terminal state of a reconciliation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The expected on-chain condition was observed.
    Resolved,
    /// The deadline passed without observing the condition. Not an error —
    /// tracking simply stops; callers re-query if they still care.
    TimedOut,
}

/// All events emitted by the SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    /// A lock-guarded operation began executing.
    OperationLocked { name: String },
    /// A lock-guarded operation finished (success or failure).
    OperationUnlocked { name: String },
    /// A wallet-signed transaction was confirmed on-chain.
    BlockchainTransaction { kind: TxKind, tx_hash: String },
    /// Reconciliation tracking started (`starting == true`, no outcome) or
    /// stopped (`starting == false`, with the terminal outcome).
    SubscriptionUpdating {
        contract_address: String,
        plan_id: String,
        starting: bool,
        outcome: Option<ReconcileOutcome>,
    },
    /// Reconciliation for the contract finished; the subscription should be
    /// re-fetched by anyone displaying it.
    SubscriptionUpdated {
        contract_address: String,
        plan_id: String,
    },
}

/// Broadcast registry for [`SdkEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SdkEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. A send error only means there are no subscribers.
    pub fn publish(&self, event: SdkEvent) {
        tracing::trace!(?event, "publishing sdk event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
