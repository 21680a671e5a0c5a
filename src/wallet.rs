//! Wallet capability interface
//!
//! The SDK never implements wallet connectivity itself. Concrete adapters
//! (one per wallet vendor) implement [`WalletProvider`]; the SDK depends
//! only on this trait. Provider errors flow through `anyhow` and get wrapped
//! into the SDK's stable taxonomy at the orchestration layer.

use async_trait::async_trait;
use tokio::sync::broadcast;

/// Connection-state change pushed by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The active account changed; `None` means no account selected.
    AccountChanged(Option<String>),
    /// The wallet switched to a different network.
    NetworkChanged(String),
    Disconnected,
}

/// Capability set of a connected crypto wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Vendor name, for logs and event payloads.
    fn name(&self) -> &str;

    async fn connect(&self) -> anyhow::Result<()>;

    async fn disconnect(&self) -> anyhow::Result<()>;

    async fn is_connected(&self) -> bool;

    /// Address of the active account.
    async fn address(&self) -> anyhow::Result<String>;

    /// Network identifier the wallet is currently on.
    async fn network(&self) -> anyhow::Result<String>;

    /// Watch for account/network changes and disconnects.
    fn watch(&self) -> broadcast::Receiver<WalletEvent>;
}
