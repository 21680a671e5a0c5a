//! Chain access facade
//!
//! Token/contract interaction is consumed through [`ChainFacade`]; the SDK
//! contains no ABI encoding and no RPC client. All raw quantities crossing
//! this boundary are in absolute form (the token's smallest integer unit) as
//! exact `Decimal`s.

use crate::{TokenDescriptor, WalletProvider};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Spend limit requested from an ERC-20 style `approve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveSpend {
    /// Approve exactly this many smallest units.
    Exact(Decimal),
    /// Approve the maximum representable allowance.
    Unlimited,
}

impl ApproveSpend {
    /// Revoke the allowance entirely.
    pub fn revoke() -> Self {
        Self::Exact(Decimal::ZERO)
    }
}

/// Read and write access to the payment token and subscription contracts.
///
/// Implementations submit wallet-signed transactions and return only once
/// the transaction is confirmed; the returned string is the confirmed
/// transaction hash.
#[async_trait]
pub trait ChainFacade: Send + Sync {
    /// Token balance of `address`, in absolute form.
    async fn balance(&self, token: &TokenDescriptor, address: &str) -> anyhow::Result<Decimal>;

    /// Allowance granted by `owner` to `spender`, in absolute form.
    async fn allowance(
        &self,
        token: &TokenDescriptor,
        owner: &str,
        spender: &str,
    ) -> anyhow::Result<Decimal>;

    /// Submit a wallet-signed approval of `spend` for `spender`.
    async fn approve(
        &self,
        wallet: &dyn WalletProvider,
        token: &TokenDescriptor,
        spender: &str,
        spend: ApproveSpend,
    ) -> anyhow::Result<String>;

    /// Call the subscription contract's `freeze` method (pause charging).
    async fn freeze(
        &self,
        wallet: &dyn WalletProvider,
        contract_address: &str,
    ) -> anyhow::Result<String>;

    /// Call the subscription contract's `unfreeze` method (resume charging).
    async fn unfreeze(
        &self,
        wallet: &dyn WalletProvider,
        contract_address: &str,
    ) -> anyhow::Result<String>;

    /// Switch the wallet to the token's network.
    async fn switch_network(
        &self,
        wallet: &dyn WalletProvider,
        token: &TokenDescriptor,
    ) -> anyhow::Result<()>;
}
