//! End-to-end lifecycle flows through `SubscriptionOperations`
//!
//! Exercises the full path: lock, precondition check, wallet calls, API
//! hint, reconciliation loop, and the event stream a UI would consume.

#[cfg(test)]
mod operations_flow {
    use async_trait::async_trait;
    use chainpay_subscriptions::{
        ActionOptions, ActionOutcome, ApproveSpend, ChainFacade, HintAck, HintUpdate,
        ReconcileOutcome, Result, SdkConfig, SdkError, SdkEvent, Subscription, SubscriptionApi,
        SubscriptionOperations, SubscriptionStatus, SubscriptionStatusInfo, TokenDescriptor,
        WalletEvent, WalletProvider,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use tokio::sync::broadcast;

    struct TestWallet;

    #[async_trait]
    impl WalletProvider for TestWallet {
        fn name(&self) -> &str {
            "test-wallet"
        }

        async fn connect(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn disconnect(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn is_connected(&self) -> bool {
            true
        }

        async fn address(&self) -> anyhow::Result<String> {
            Ok("0xpayer".to_string())
        }

        async fn network(&self) -> anyhow::Result<String> {
            Ok("polygon-mainnet".to_string())
        }

        fn watch(&self) -> broadcast::Receiver<WalletEvent> {
            let (_tx, rx) = broadcast::channel(4);
            rx
        }
    }

    #[derive(Default)]
    struct TestChain {
        tx_count: AtomicUsize,
    }

    impl TestChain {
        fn transactions(&self) -> usize {
            self.tx_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChainFacade for TestChain {
        async fn balance(
            &self,
            _token: &TokenDescriptor,
            _address: &str,
        ) -> anyhow::Result<Decimal> {
            Ok(dec!(1_000_000_000))
        }

        async fn allowance(
            &self,
            _token: &TokenDescriptor,
            _owner: &str,
            _spender: &str,
        ) -> anyhow::Result<Decimal> {
            Ok(Decimal::ZERO)
        }

        async fn approve(
            &self,
            _wallet: &dyn WalletProvider,
            _token: &TokenDescriptor,
            _spender: &str,
            _spend: ApproveSpend,
        ) -> anyhow::Result<String> {
            self.tx_count.fetch_add(1, Ordering::SeqCst);
            Ok("0xapprove".to_string())
        }

        async fn freeze(
            &self,
            _wallet: &dyn WalletProvider,
            _contract: &str,
        ) -> anyhow::Result<String> {
            self.tx_count.fetch_add(1, Ordering::SeqCst);
            Ok("0xfreeze".to_string())
        }

        async fn unfreeze(
            &self,
            _wallet: &dyn WalletProvider,
            _contract: &str,
        ) -> anyhow::Result<String> {
            self.tx_count.fetch_add(1, Ordering::SeqCst);
            Ok("0xunfreeze".to_string())
        }

        async fn switch_network(
            &self,
            _wallet: &dyn WalletProvider,
            _token: &TokenDescriptor,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Remote view that can be flipped by a test mid-flight.
    struct TestApi {
        status: Mutex<SubscriptionStatus>,
        polls: AtomicUsize,
    }

    impl TestApi {
        fn reporting(status: SubscriptionStatus) -> Self {
            Self {
                status: Mutex::new(status),
                polls: AtomicUsize::new(0),
            }
        }

        fn set_status(&self, status: SubscriptionStatus) {
            *self.status.lock().unwrap() = status;
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SubscriptionApi for TestApi {
        async fn get_status(&self, _contract: &str) -> Result<SubscriptionStatusInfo> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(SubscriptionStatusInfo {
                status: *self.status.lock().unwrap(),
                allowance: "0 USDC".parse().unwrap(),
            })
        }

        async fn post_hint(&self, _contract: &str, _hint: &HintUpdate) -> Result<HintAck> {
            Ok(HintAck { is_accepted: true })
        }
    }

    fn subscription(status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: "sub_1".to_string(),
            plan_id: "plan_1".to_string(),
            contract_address: "0xc0ffee".to_string(),
            blockchain: "polygon-mainnet".to_string(),
            status,
            amount: "10 USDC".parse().unwrap(),
            allowance: "50 USDC".parse().unwrap(),
            payer: "0xpayer".to_string(),
            asset: "USDC".to_string(),
        }
    }

    fn fast_config() -> SdkConfig {
        SdkConfig::new()
            .with_poll_interval(Duration::from_millis(100))
            .with_max_poll_attempts(2)
    }

    #[tokio::test]
    async fn test_pause_reconciles_once_remote_catches_up() {
        let chain = Arc::new(TestChain::default());
        let api = Arc::new(TestApi::reporting(SubscriptionStatus::Active));
        let ops = SubscriptionOperations::new(
            chain,
            Arc::new(TestWallet),
            api.clone(),
            fast_config(),
        );
        let mut rx = ops.subscribe();

        let outcome = ops
            .pause(
                || async { Some(subscription(SubscriptionStatus::Active)) },
                ActionOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Submitted {
                tx_hash: "0xfreeze".to_string()
            }
        );
        assert!(ops.is_reconciling("0xc0ffee"));

        // The remote view catches up before the first poll fires
        api.set_status(SubscriptionStatus::Paused);

        let mut outcome_seen = None;
        loop {
            match rx.recv().await.unwrap() {
                SdkEvent::SubscriptionUpdating {
                    starting: false,
                    outcome,
                    ..
                } => outcome_seen = outcome,
                SdkEvent::SubscriptionUpdated { .. } => break,
                _ => {}
            }
        }
        assert_eq!(outcome_seen, Some(ReconcileOutcome::Resolved));
        assert!(!ops.is_reconciling("0xc0ffee"));
    }

    #[tokio::test]
    async fn test_reconciliation_times_out_when_remote_never_updates() {
        let chain = Arc::new(TestChain::default());
        // Remote stays on Draft forever
        let api = Arc::new(TestApi::reporting(SubscriptionStatus::Draft));
        let ops = SubscriptionOperations::new(
            chain,
            Arc::new(TestWallet),
            api.clone(),
            fast_config(),
        );
        let mut rx = ops.subscribe();

        let started = Instant::now();
        ops.activate(
            || async { Some(subscription(SubscriptionStatus::Draft)) },
            ActionOptions::default(),
        )
        .await
        .unwrap();

        let mut finishes = Vec::new();
        loop {
            match rx.recv().await.unwrap() {
                SdkEvent::SubscriptionUpdating {
                    starting: false,
                    outcome,
                    ..
                } => finishes.push(outcome),
                SdkEvent::SubscriptionUpdated { .. } => break,
                _ => {}
            }
        }

        // Exactly one terminal event, and it's a timeout, not an error
        assert_eq!(finishes, vec![Some(ReconcileOutcome::TimedOut)]);
        assert_eq!(api.polls(), 2, "two attempts at 100ms each");
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_millis(200) && elapsed < Duration::from_millis(400),
            "deadline is poll_interval * max_attempts, got {elapsed:?}"
        );
        assert!(!ops.is_reconciling("0xc0ffee"));
    }

    #[tokio::test]
    async fn test_overlapping_action_is_rejected_without_side_effects() {
        let chain = Arc::new(TestChain::default());
        let api = Arc::new(TestApi::reporting(SubscriptionStatus::Active));
        let ops = Arc::new(SubscriptionOperations::new(
            chain.clone(),
            Arc::new(TestWallet),
            api,
            fast_config(),
        ));

        let slow = {
            let ops = Arc::clone(&ops);
            tokio::spawn(async move {
                ops.pause(
                    || async {
                        // Still resolving the subscription when the second
                        // action arrives
                        tokio::time::sleep(Duration::from_millis(150)).await;
                        Some(subscription(SubscriptionStatus::Active))
                    },
                    ActionOptions {
                        approve_amount: None,
                        skip_reconcile: true,
                    },
                )
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ops.active_operation().as_deref(), Some("pause"));

        let err = ops
            .cancel(
                || async { Some(subscription(SubscriptionStatus::Active)) },
                ActionOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::OperationBusy { active } if active == "pause"));
        // The rejected cancel signed nothing
        assert_eq!(chain.transactions(), 0);

        let outcome = slow.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Submitted {
                tx_hash: "0xfreeze".to_string()
            }
        );
        assert_eq!(chain.transactions(), 1);
        assert_eq!(ops.active_operation(), None);
    }

    #[tokio::test]
    async fn test_cancel_then_retry_is_idempotent_on_missing_subscription() {
        let chain = Arc::new(TestChain::default());
        let api = Arc::new(TestApi::reporting(SubscriptionStatus::Cancelled));
        let ops = SubscriptionOperations::new(
            chain.clone(),
            Arc::new(TestWallet),
            api,
            fast_config(),
        );

        let outcome = ops
            .cancel(
                || async { Some(subscription(SubscriptionStatus::Active)) },
                ActionOptions {
                    approve_amount: None,
                    skip_reconcile: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Submitted {
                tx_hash: "0xapprove".to_string()
            }
        );

        // A retry whose getter no longer finds the subscription is a no-op
        let outcome = ops
            .cancel(|| async { None }, ActionOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert_eq!(chain.transactions(), 1);
    }
}
