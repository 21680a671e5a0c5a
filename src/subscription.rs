//! Subscription snapshot types
//!
//! Subscriptions are owned by the remote API; the SDK only observes them.
//! Status transitions are driven by the chain and the API backend — never by
//! this crate.

use crate::{Amount, AssetRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a subscription, as reported by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Draft,
    Active,
    Paused,
    Cancelled,
    Error,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft => "Draft",
            Self::Active => "Active",
            Self::Paused => "Paused",
            Self::Cancelled => "Cancelled",
            Self::Error => "Error",
        };
        write!(f, "{}", name)
    }
}

/// A point-in-time snapshot of a subscription.
///
/// Operations take an async supplier for this type and re-resolve it after
/// acquiring the operation lock, so decisions are always made against the
/// latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub plan_id: String,
    /// Address of the subscription charge contract.
    pub contract_address: String,
    /// Network the contract is deployed on.
    pub blockchain: String,
    pub status: SubscriptionStatus,
    /// Amount charged per period, e.g. `"10 USDC"`.
    pub amount: Amount,
    /// Remaining spender allowance, e.g. `"50 USDC"`.
    pub allowance: Amount,
    /// Address of the paying wallet.
    pub payer: String,
    /// Currency code of the payment token.
    pub asset: String,
}

/// True when an active subscription's remaining allowance no longer covers
/// the next charge, i.e. it will lapse unless the payer tops up.
///
/// Returns `false` for non-active subscriptions and unknown assets — a
/// subscription that cannot be charged is not "ending", it is already
/// stopped.
pub fn is_ending_subscription(subscription: &Subscription, assets: &AssetRegistry) -> bool {
    if subscription.status != SubscriptionStatus::Active {
        return false;
    }
    let Some(token) = assets.get(&subscription.asset) else {
        return false;
    };
    let amount_to_pay = subscription.amount.to_absolute(token.decimals);
    let allowance = subscription.allowance.to_absolute(token.decimals);
    amount_to_pay > allowance
}
