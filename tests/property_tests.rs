//! Property-based tests for amount handling
//!
//! These tests use proptest to verify invariants across a wide range of inputs.

#[cfg(test)]
mod amount_properties {
    use chainpay_subscriptions::Amount;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn arb_value() -> impl Strategy<Value = Decimal> {
        // Up to 12 integer digits and 6 fractional digits, the range real
        // subscription amounts live in
        (0i64..1_000_000_000_000i64, 0u32..=6u32)
            .prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
    }

    proptest! {
        /// Display and parse are inverses
        #[test]
        fn display_parse_round_trip(value in arb_value(), currency in "[A-Z]{3,5}") {
            let amount = Amount::new(value, currency.as_str());
            let parsed: Amount = amount.to_string().parse().unwrap();
            prop_assert_eq!(parsed, amount);
        }

        /// Absolute form is always a whole number of smallest units
        #[test]
        fn absolute_form_is_integral(value in arb_value(), decimals in 0u32..=18u32) {
            let amount = Amount::new(value, "USDC");
            let absolute = amount.to_absolute(decimals);
            prop_assert_eq!(absolute, absolute.trunc());
        }

        /// Whole-token values scale exactly by 10^decimals
        #[test]
        fn whole_tokens_scale_exactly(tokens in 0i64..1_000_000_000i64, decimals in 0u32..=12u32) {
            let amount = Amount::new(Decimal::new(tokens, 0), "USDC");
            let expected = Decimal::new(tokens, 0) * Decimal::new(10i64.pow(decimals), 0);
            prop_assert_eq!(amount.to_absolute(decimals), expected);
        }

        /// Larger values never produce smaller absolute forms
        #[test]
        fn to_absolute_is_monotonic(a in arb_value(), b in arb_value(), decimals in 0u32..=18u32) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo_abs = Amount::new(lo, "USDC").to_absolute(decimals);
            let hi_abs = Amount::new(hi, "USDC").to_absolute(decimals);
            prop_assert!(lo_abs <= hi_abs);
        }

        /// Serde travels through the same string form as Display
        #[test]
        fn serde_matches_display(value in arb_value(), currency in "[A-Z]{3,5}") {
            let amount = Amount::new(value, currency.as_str());
            let json = serde_json::to_string(&amount).unwrap();
            prop_assert_eq!(json, format!("\"{}\"", amount));
            let parsed: Amount = serde_json::from_str(&format!("\"{}\"", amount)).unwrap();
            prop_assert_eq!(parsed, amount);
        }
    }
}

#[cfg(test)]
mod ending_subscription_properties {
    use chainpay_subscriptions::{
        is_ending_subscription, Amount, AssetRegistry, Subscription, SubscriptionStatus,
    };
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn subscription(status: SubscriptionStatus, amount: Amount, allowance: Amount) -> Subscription {
        Subscription {
            id: "sub_1".to_string(),
            plan_id: "plan_1".to_string(),
            contract_address: "0xc0ffee".to_string(),
            blockchain: "polygon-mainnet".to_string(),
            status,
            amount,
            allowance,
            payer: "0xpayer".to_string(),
            asset: "USDC".to_string(),
        }
    }

    proptest! {
        /// An active subscription is ending exactly when the allowance no
        /// longer covers one charge
        #[test]
        fn ending_iff_allowance_below_charge(
            amount_units in 1i64..1_000_000_000i64,
            allowance_units in 0i64..1_000_000_000i64,
        ) {
            let assets = AssetRegistry::default();
            // 6-decimal token: construct both figures in display units
            let amount = Amount::new(Decimal::new(amount_units, 6), "USDC");
            let allowance = Amount::new(Decimal::new(allowance_units, 6), "USDC");
            let sub = subscription(SubscriptionStatus::Active, amount, allowance);

            prop_assert_eq!(
                is_ending_subscription(&sub, &assets),
                amount_units > allowance_units
            );
        }

        /// Non-active subscriptions are never "ending"
        #[test]
        fn only_active_subscriptions_end(
            amount_units in 1i64..1_000_000i64,
            allowance_units in 0i64..1_000_000i64,
        ) {
            let assets = AssetRegistry::default();
            let amount = Amount::new(Decimal::new(amount_units, 6), "USDC");
            let allowance = Amount::new(Decimal::new(allowance_units, 6), "USDC");
            for status in [
                SubscriptionStatus::Draft,
                SubscriptionStatus::Paused,
                SubscriptionStatus::Cancelled,
                SubscriptionStatus::Error,
            ] {
                let sub = subscription(status, amount.clone(), allowance.clone());
                prop_assert!(!is_ending_subscription(&sub, &assets));
            }
        }
    }
}
