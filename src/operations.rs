//! Subscription lifecycle orchestration
//!
//! [`SubscriptionOperations`] ties the pieces together: every action runs
//! under the single-flight [`OperationLock`], re-resolves the subscription
//! through a caller-supplied async getter, checks preconditions against that
//! fresh snapshot, drives the wallet through [`ChainFacade`], hints the
//! remote API, and hands the contract to the [`Reconciler`].
//!
//! Preconditions that mean "already there" are not failures. Pausing an
//! already-paused subscription returns [`ActionOutcome::Skipped`] without
//! touching the wallet, so actions are safe to retry blindly.

use crate::api::{HintUpdate, SubscriptionApi};
use crate::chain::{ApproveSpend, ChainFacade};
use crate::config::SdkConfig;
use crate::events::{EventBus, SdkEvent, TxKind};
use crate::lock::OperationLock;
use crate::reconcile::{ReconcileRequest, ReconcileTarget, Reconciler};
use crate::subscription::{Subscription, SubscriptionStatus};
use crate::token::{AssetRegistry, TokenDescriptor};
use crate::wallet::WalletProvider;
use crate::{Amount, Result, SdkError};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

/// What a lifecycle action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A transaction was signed, confirmed, and hinted to the API.
    Submitted { tx_hash: String },
    /// The subscription was missing or already in the desired state; nothing
    /// was signed and nothing was notified.
    Skipped,
}

/// Per-call knobs for lifecycle actions.
#[derive(Debug, Clone, Default)]
pub struct ActionOptions {
    /// Allowance to approve instead of the unlimited default, for actions
    /// that issue a token approval.
    pub approve_amount: Option<Amount>,
    /// Submit and hint, but do not start a reconciliation loop.
    pub skip_reconcile: bool,
}

/// Orchestrates subscription lifecycle actions through a connected wallet.
pub struct SubscriptionOperations {
    chain: Arc<dyn ChainFacade>,
    wallet: Arc<dyn WalletProvider>,
    api: Arc<dyn SubscriptionApi>,
    assets: AssetRegistry,
    lock: OperationLock,
    reconciler: Reconciler,
    events: EventBus,
    config: SdkConfig,
}

impl SubscriptionOperations {
    pub fn new(
        chain: Arc<dyn ChainFacade>,
        wallet: Arc<dyn WalletProvider>,
        api: Arc<dyn SubscriptionApi>,
        config: SdkConfig,
    ) -> Self {
        let events = EventBus::default();
        let lock = OperationLock::new(events.clone());
        let reconciler = Reconciler::new(api.clone(), events.clone(), &config);
        Self {
            chain,
            wallet,
            api,
            assets: AssetRegistry::default(),
            lock,
            reconciler,
            events,
            config,
        }
    }

    /// Replace the asset registry.
    pub fn with_assets(mut self, assets: AssetRegistry) -> Self {
        self.assets = assets;
        self
    }

    /// Subscribe to all SDK events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Name of the lifecycle action currently holding the operation lock.
    pub fn active_operation(&self) -> Option<String> {
        self.lock.active()
    }

    /// True while a reconciliation loop for this contract is running.
    pub fn is_reconciling(&self, contract_address: &str) -> bool {
        self.reconciler.is_tracking(contract_address)
    }

    /// Activate a draft subscription: approve the charge contract to spend
    /// the payment token, after verifying the payer can cover the first
    /// charge. Approves unlimited allowance unless
    /// [`ActionOptions::approve_amount`] caps it.
    pub async fn activate<F, Fut>(&self, supplier: F, options: ActionOptions) -> Result<ActionOutcome>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<Subscription>> + Send,
    {
        self.lock
            .run("activate", async move {
                let Some(sub) = supplier().await else {
                    return Ok(ActionOutcome::Skipped);
                };
                if sub.status != SubscriptionStatus::Draft {
                    tracing::debug!(
                        contract = %sub.contract_address,
                        status = %sub.status,
                        "not a draft, skipping activation"
                    );
                    return Ok(ActionOutcome::Skipped);
                }
                let token = self.assets.lookup(&sub.asset)?.clone();
                self.ensure_wallet().await?;
                self.switch_network(&token).await?;

                let (required, available) = self.payer_balance(&sub, &token).await?;
                if available < required {
                    return Err(SdkError::InsufficientFunds {
                        required: required.to_string(),
                        available: available.to_string(),
                        currency: token.symbol.clone(),
                    });
                }

                let spend = approve_spend(&options, &token);
                let tx_hash = self
                    .chain
                    .approve(self.wallet.as_ref(), &token, &sub.contract_address, spend)
                    .await
                    .map_err(wallet_err("token-approve"))?;
                self.announce(TxKind::TokenApprove, &tx_hash);
                self.notify_api(&sub, &tx_hash).await?;

                self.start_reconcile(
                    &options,
                    &sub,
                    &token,
                    ReconcileTarget::Status {
                        initial: sub.status,
                        expected: Some(SubscriptionStatus::Active),
                    },
                );
                Ok(ActionOutcome::Submitted { tx_hash })
            })
            .await
    }

    /// Pause charging on an active subscription.
    pub async fn pause<F, Fut>(&self, supplier: F, options: ActionOptions) -> Result<ActionOutcome>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<Subscription>> + Send,
    {
        self.lock
            .run("pause", async move {
                let Some(sub) = supplier().await else {
                    return Ok(ActionOutcome::Skipped);
                };
                if sub.status != SubscriptionStatus::Active {
                    return Ok(ActionOutcome::Skipped);
                }
                let token = self.assets.lookup(&sub.asset)?.clone();
                self.ensure_wallet().await?;
                self.switch_network(&token).await?;

                let tx_hash = self
                    .chain
                    .freeze(self.wallet.as_ref(), &sub.contract_address)
                    .await
                    .map_err(wallet_err("subscription-pause"))?;
                self.announce(TxKind::SubscriptionPause, &tx_hash);
                self.notify_api(&sub, &tx_hash).await?;

                self.start_reconcile(
                    &options,
                    &sub,
                    &token,
                    ReconcileTarget::Status {
                        initial: sub.status,
                        expected: Some(SubscriptionStatus::Paused),
                    },
                );
                Ok(ActionOutcome::Submitted { tx_hash })
            })
            .await
    }

    /// Resume charging on a paused subscription.
    pub async fn unpause<F, Fut>(&self, supplier: F, options: ActionOptions) -> Result<ActionOutcome>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<Subscription>> + Send,
    {
        self.lock
            .run("unpause", async move {
                let Some(sub) = supplier().await else {
                    return Ok(ActionOutcome::Skipped);
                };
                if sub.status != SubscriptionStatus::Paused {
                    return Ok(ActionOutcome::Skipped);
                }
                let token = self.assets.lookup(&sub.asset)?.clone();
                self.ensure_wallet().await?;
                self.switch_network(&token).await?;

                let tx_hash = self
                    .chain
                    .unfreeze(self.wallet.as_ref(), &sub.contract_address)
                    .await
                    .map_err(wallet_err("subscription-unpause"))?;
                self.announce(TxKind::SubscriptionUnpause, &tx_hash);
                self.notify_api(&sub, &tx_hash).await?;

                self.start_reconcile(
                    &options,
                    &sub,
                    &token,
                    ReconcileTarget::Status {
                        initial: sub.status,
                        expected: Some(SubscriptionStatus::Active),
                    },
                );
                Ok(ActionOutcome::Submitted { tx_hash })
            })
            .await
    }

    /// Cancel a subscription by revoking the charge contract's allowance.
    /// The contract can no longer pull funds once the revocation confirms;
    /// the API flips the status when it observes the drained allowance.
    pub async fn cancel<F, Fut>(&self, supplier: F, options: ActionOptions) -> Result<ActionOutcome>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<Subscription>> + Send,
    {
        self.lock
            .run("cancel", async move {
                let Some(sub) = supplier().await else {
                    return Ok(ActionOutcome::Skipped);
                };
                let token = self.assets.lookup(&sub.asset)?.clone();
                self.ensure_wallet().await?;
                self.switch_network(&token).await?;

                let tx_hash = self
                    .chain
                    .approve(
                        self.wallet.as_ref(),
                        &token,
                        &sub.contract_address,
                        ApproveSpend::revoke(),
                    )
                    .await
                    .map_err(wallet_err("token-approve"))?;
                self.announce(TxKind::TokenApprove, &tx_hash);
                self.notify_api(&sub, &tx_hash).await?;

                self.start_reconcile(
                    &options,
                    &sub,
                    &token,
                    ReconcileTarget::AllowanceBelow {
                        amount_to_pay: sub.amount.to_absolute(token.decimals),
                    },
                );
                Ok(ActionOutcome::Submitted { tx_hash })
            })
            .await
    }

    /// Re-approve the charge contract with a new allowance, unlimited unless
    /// [`ActionOptions::approve_amount`] caps it.
    pub async fn change_allowance<F, Fut>(
        &self,
        supplier: F,
        options: ActionOptions,
    ) -> Result<ActionOutcome>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<Subscription>> + Send,
    {
        self.lock
            .run("change-allowance", async move {
                let Some(sub) = supplier().await else {
                    return Ok(ActionOutcome::Skipped);
                };
                let token = self.assets.lookup(&sub.asset)?.clone();
                self.ensure_wallet().await?;
                self.switch_network(&token).await?;

                let spend = approve_spend(&options, &token);
                let tx_hash = self
                    .chain
                    .approve(self.wallet.as_ref(), &token, &sub.contract_address, spend)
                    .await
                    .map_err(wallet_err("token-approve"))?;
                self.announce(TxKind::TokenApprove, &tx_hash);
                self.notify_api(&sub, &tx_hash).await?;

                self.start_reconcile(
                    &options,
                    &sub,
                    &token,
                    // Captured before the approval was submitted
                    ReconcileTarget::AllowanceChangedFrom {
                        allowance: sub.allowance.to_absolute(token.decimals),
                    },
                );
                Ok(ActionOutcome::Submitted { tx_hash })
            })
            .await
    }

    /// Whether the payer's token balance covers one charge of `sub`.
    pub async fn has_sufficient_balance(&self, sub: &Subscription) -> Result<bool> {
        let token = self.assets.lookup(&sub.asset)?.clone();
        self.ensure_wallet().await?;
        self.switch_network(&token).await?;
        let (required, available) = self.payer_balance(sub, &token).await?;
        Ok(available >= required)
    }

    async fn ensure_wallet(&self) -> Result<()> {
        if self.wallet.is_connected().await {
            Ok(())
        } else {
            Err(SdkError::NoActiveWallet)
        }
    }

    async fn switch_network(&self, token: &TokenDescriptor) -> Result<()> {
        self.chain
            .switch_network(self.wallet.as_ref(), token)
            .await
            .map_err(wallet_err("switch-network"))
    }

    /// Required and available amounts for one charge, in absolute form.
    async fn payer_balance(
        &self,
        sub: &Subscription,
        token: &TokenDescriptor,
    ) -> Result<(Decimal, Decimal)> {
        let payer = self
            .wallet
            .address()
            .await
            .map_err(wallet_err("wallet-address"))?;
        let available = self
            .chain
            .balance(token, &payer)
            .await
            .map_err(wallet_err("balance-read"))?;
        Ok((sub.amount.to_absolute(token.decimals), available))
    }

    fn announce(&self, kind: TxKind, tx_hash: &str) {
        tracing::info!(%kind, tx = tx_hash, "transaction confirmed");
        self.events.publish(SdkEvent::BlockchainTransaction {
            kind,
            tx_hash: tx_hash.to_string(),
        });
    }

    async fn notify_api(&self, sub: &Subscription, tx_hash: &str) -> Result<()> {
        let ack = self
            .api
            .post_hint(
                &sub.contract_address,
                &HintUpdate {
                    hash: tx_hash.to_string(),
                    blockchain: sub.blockchain.clone(),
                },
            )
            .await?;
        if !ack.is_accepted {
            return Err(SdkError::ApiNotificationRejected);
        }
        Ok(())
    }

    fn start_reconcile(
        &self,
        options: &ActionOptions,
        sub: &Subscription,
        token: &TokenDescriptor,
        target: ReconcileTarget,
    ) {
        if options.skip_reconcile {
            return;
        }
        self.reconciler.start(ReconcileRequest {
            contract_address: sub.contract_address.clone(),
            plan_id: sub.plan_id.clone(),
            token: token.clone(),
            target,
        });
    }
}

fn approve_spend(options: &ActionOptions, token: &TokenDescriptor) -> ApproveSpend {
    match &options.approve_amount {
        Some(amount) => ApproveSpend::Exact(amount.to_absolute(token.decimals)),
        None => ApproveSpend::Unlimited,
    }
}

fn wallet_err(action: &'static str) -> impl FnOnce(anyhow::Error) -> SdkError {
    move |source| SdkError::WalletOperationFailed { action, source }
}
