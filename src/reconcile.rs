//! Reconciliation between on-chain state and the remote API
//!
//! After a wallet transaction confirms and the API is hinted, the remote
//! view catches up asynchronously. The reconciler polls the status endpoint
//! on a fixed cadence until the expected condition shows up or a bounded
//! deadline passes, emitting progress events so UIs can show "updating"
//! badges without polling themselves.
//!
//! Loops are detached tasks: they run outside the operation lock, one per
//! contract address, and multiple addresses reconcile concurrently. A poll
//! failure is logged and skipped — a transient network blip must not lose
//! tracking. Timing out is a normal terminal state, not an error.

use crate::api::SubscriptionApi;
use crate::config::SdkConfig;
use crate::events::{EventBus, ReconcileOutcome, SdkEvent};
use crate::{Result, SubscriptionStatus, TokenDescriptor};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Condition a reconciliation loop waits for.
///
/// Status-changing actions key on status; allowance-only actions key on the
/// allowance figure, compared in absolute form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileTarget {
    /// Resolve when the reported status leaves `initial` and either matches
    /// `expected`, or no explicit expectation was set, or the subscription
    /// entered `Error` (unrecoverable, so tracking stops either way).
    Status {
        initial: SubscriptionStatus,
        expected: Option<SubscriptionStatus>,
    },
    /// Resolve when the reported allowance (absolute form) has dropped to or
    /// below the pending charge.
    AllowanceBelow { amount_to_pay: Decimal },
    /// Resolve when the reported allowance (absolute form) differs from the
    /// one captured when the operation started.
    AllowanceChangedFrom { allowance: Decimal },
}

/// One request to track a contract until its target condition is met.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub contract_address: String,
    pub plan_id: String,
    /// Token of the subscription, for absolute-form allowance conversion.
    pub token: TokenDescriptor,
    pub target: ReconcileTarget,
}

/// Book-keeping for a contract currently being tracked.
#[derive(Debug, Clone)]
struct PendingReconciliation {
    started_at: DateTime<Utc>,
}

/// Runs bounded polling loops, at most one per contract address.
#[derive(Clone)]
pub struct Reconciler {
    api: Arc<dyn SubscriptionApi>,
    events: EventBus,
    pending: Arc<Mutex<HashMap<String, PendingReconciliation>>>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl Reconciler {
    pub fn new(api: Arc<dyn SubscriptionApi>, events: EventBus, config: &SdkConfig) -> Self {
        Self {
            api,
            events,
            pending: Arc::new(Mutex::new(HashMap::new())),
            poll_interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
        }
    }

    /// True while a loop for this contract is running.
    pub fn is_tracking(&self, contract_address: &str) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(contract_address)
    }

    /// Start tracking a contract, detached from the caller.
    ///
    /// If the contract is already being tracked the request is silently
    /// dropped — no duplicate loop, no duplicate events. The membership
    /// check and insertion happen under one mutex acquisition so two
    /// concurrent starts cannot both pass.
    pub fn start(&self, request: ReconcileRequest) {
        let deadline = Instant::now() + self.poll_interval * self.max_attempts;
        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if pending.contains_key(&request.contract_address) {
                tracing::debug!(
                    contract = %request.contract_address,
                    "already reconciling, dropping request"
                );
                return;
            }
            pending.insert(
                request.contract_address.clone(),
                PendingReconciliation {
                    started_at: Utc::now(),
                },
            );
        }

        self.events.publish(SdkEvent::SubscriptionUpdating {
            contract_address: request.contract_address.clone(),
            plan_id: request.plan_id.clone(),
            starting: true,
            outcome: None,
        });

        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.run_loop(&request, deadline).await;
            this.finish(&request, outcome);
        });
    }

    async fn run_loop(&self, request: &ReconcileRequest, deadline: Instant) -> ReconcileOutcome {
        while Instant::now() < deadline {
            tokio::time::sleep(self.poll_interval).await;
            match self.poll_once(request).await {
                Ok(true) => return ReconcileOutcome::Resolved,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        contract = %request.contract_address,
                        error = %e,
                        "status poll failed, keeping the loop alive"
                    );
                }
            }
        }
        tracing::debug!(
            contract = %request.contract_address,
            "reconciliation deadline passed"
        );
        ReconcileOutcome::TimedOut
    }

    async fn poll_once(&self, request: &ReconcileRequest) -> Result<bool> {
        let info = self.api.get_status(&request.contract_address).await?;
        Ok(target_met(
            &request.target,
            info.status,
            info.allowance.to_absolute(request.token.decimals),
        ))
    }

    fn finish(&self, request: &ReconcileRequest, outcome: ReconcileOutcome) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&request.contract_address);

        self.events.publish(SdkEvent::SubscriptionUpdating {
            contract_address: request.contract_address.clone(),
            plan_id: request.plan_id.clone(),
            starting: false,
            outcome: Some(outcome),
        });
        self.events.publish(SdkEvent::SubscriptionUpdated {
            contract_address: request.contract_address.clone(),
            plan_id: request.plan_id.clone(),
        });
    }

    /// Timestamp a contract's tracking started, for diagnostics.
    pub fn tracking_since(&self, contract_address: &str) -> Option<DateTime<Utc>> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(contract_address)
            .map(|p| p.started_at)
    }
}

fn target_met(target: &ReconcileTarget, status: SubscriptionStatus, allowance: Decimal) -> bool {
    match target {
        ReconcileTarget::Status { initial, expected } => {
            status != *initial
                && (status == SubscriptionStatus::Error
                    || expected.is_none()
                    || Some(status) == *expected)
        }
        ReconcileTarget::AllowanceBelow { amount_to_pay } => *amount_to_pay >= allowance,
        ReconcileTarget::AllowanceChangedFrom {
            allowance: captured,
        } => allowance != *captured,
    }
}
