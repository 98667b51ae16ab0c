//! Metering-bridge API tests.
//!
//! Run with: `cargo test --features bridge --test bridge_tests`

#![cfg(feature = "bridge")]

use chrono::NaiveDate;
use kilowatt::bridge::*;
use kilowatt::core::*;
use kilowatt::engine::BillingEngine;
use kilowatt::grid::{PriceGridBuilder, PriceLine};
use kilowatt::invoice::MemoryInvoiceStore;
use kilowatt::period::{Cadrans, NewPeriod, Provisions};
use kilowatt::subscription::{MemoryPartnerRegistry, SubscriptionBuilder};
use rust_decimal_macros::dec;

type Engine = BillingEngine<MemoryPartnerRegistry, MemoryInvoiceStore>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine() -> Engine {
    let mut engine = BillingEngine::new(
        BillingConfig::default(),
        ProductCatalog::standard(),
        MemoryPartnerRegistry::new().with("CUST-1", "Jeanne Martin"),
        MemoryInvoiceStore::new("INV-", 2024),
    )
    .unwrap();
    engine
        .grids_mut()
        .create(
            PriceGridBuilder::new("2024", date(2024, 1, 1))
                .current(true)
                .line(PriceLine::subscription_fee("SUBSCRIPTION", dec!(12.00)))
                .line(PriceLine::energy("ENERGY_BASE", dec!(0.2276)))
                .line(PriceLine::energy("ENERGY_HP", dec!(0.2700)))
                .line(PriceLine::energy("ENERGY_HC", dec!(0.2068))),
        )
        .unwrap();
    engine
}

fn register(engine: &mut Engine, builder: SubscriptionBuilder) -> SubscriptionId {
    engine.register_subscription(builder).unwrap()
}

fn kva(n: u8) -> PowerTier {
    PowerTier::new(n).unwrap()
}

#[test]
fn lookup_by_metering_point() {
    let mut engine = engine();
    register(
        &mut engine,
        SubscriptionBuilder::new(kva(6), TariffType::Base).metering_point("14500000000001"),
    );
    register(
        &mut engine,
        SubscriptionBuilder::new(kva(9), TariffType::HpHc)
            .customer("CUST-1")
            .metering_point("14500000000002")
            .dates(date(2024, 1, 1), Some(date(2025, 12, 31)))
            .smoothed_split(dec!(200), dec!(120))
            .solidarity()
            .payment_mode(PaymentMode::EnergyCheque),
    );
    register(&mut engine, SubscriptionBuilder::new(kva(3), TariffType::Base));

    let found = engine.get_subscriptions_by_metering_point(&["14500000000002", "00000000000000"]);
    assert_eq!(found.len(), 1);
    let summary = &found[0];
    assert_eq!(summary.reference, "SUB-00002");
    assert_eq!(summary.tariff, TariffType::HpHc);
    assert_eq!(summary.customer_ref.as_deref(), Some("CUST-1"));
    assert_eq!(summary.start_date, Some(date(2024, 1, 1)));
    assert_eq!(summary.end_date, Some(date(2025, 12, 31)));
    assert!(summary.smoothed);
    assert_eq!(summary.monthly_provision_kwh, None);
    assert_eq!(summary.provision_peak_kwh, Some(dec!(200)));
    assert_eq!(summary.provision_offpeak_kwh, Some(dec!(120)));
    assert!(summary.solidarity_tariff);
    assert_eq!(summary.payment_mode, Some(PaymentMode::EnergyCheque));

    let json = to_json(summary).unwrap();
    assert!(json.contains(r#""payment_mode":"energy_cheque""#));
    assert!(json.contains(r#""solidarity_tariff":true"#));

    let none: Vec<String> = Vec::new();
    assert!(engine.get_subscriptions_by_metering_point(&none).is_empty());
}

#[test]
fn periods_within_range() {
    let mut engine = engine();
    let sub = register(&mut engine, SubscriptionBuilder::new(kva(6), TariffType::Base));
    for month in 1..=4 {
        engine
            .create_period(
                sub,
                NewPeriod::monthly(date(2024, month, 1), date(2024, month + 1, 1)),
            )
            .unwrap();
    }

    let labels = |from, to| -> Vec<String> {
        engine
            .get_billing_periods("SUB-00001", from, to)
            .unwrap()
            .into_iter()
            .map(|p| p.label)
            .collect()
    };
    assert_eq!(
        labels(Some(date(2024, 2, 1)), Some(date(2024, 4, 1))),
        ["February 2024", "March 2024"]
    );
    assert_eq!(
        labels(Some(date(2024, 3, 1)), None),
        ["March 2024", "April 2024"]
    );
    assert_eq!(labels(None, Some(date(2024, 2, 1))), ["January 2024"]);
    assert_eq!(labels(None, None).len(), 4);

    assert!(matches!(
        engine.get_billing_periods("SUB-99999", None, None),
        Err(BillingError::UnknownReference(_))
    ));
}

#[test]
fn create_period_from_json() {
    let mut engine = engine();
    register(&mut engine, SubscriptionBuilder::new(kva(6), TariffType::Base).customer("CUST-1"));

    let request: BillingPeriodRequest = from_json(
        r#"{
            "subscription": "SUB-00001",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "kind": "monthly",
            "turpe_fixed": "8.50",
            "turpe_variable": "4.50",
            "cadrans": {
                "peak_high_season": "0",
                "peak_low_season": "0",
                "offpeak_high_season": "200",
                "offpeak_low_season": "80"
            }
        }"#,
    )
    .unwrap();
    let summary = engine.create_billing_period(request).unwrap();
    assert_eq!(summary.days, 30);
    assert_eq!(summary.turpe_fixed, dec!(8.50));
    assert_eq!(summary.cadrans.offpeak().unwrap(), dec!(280));
    assert_eq!(summary.invoice, None);

    let json = to_json(&summary).unwrap();
    assert!(json.contains(r#""label":"January 2024""#));
    assert!(json.contains(r#""subscription":"SUB-00001""#));
}

#[test]
fn unknown_reference_creates_nothing() {
    let mut engine = engine();
    let sub = register(&mut engine, SubscriptionBuilder::new(kva(6), TariffType::Base));
    let request = BillingPeriodRequest {
        subscription: "SUB-00042".into(),
        period: NewPeriod::monthly(date(2024, 1, 1), date(2024, 2, 1)),
    };
    assert!(engine.create_billing_period(request).is_err());
    assert!(engine.subscription(sub).unwrap().periods().is_empty());
}

#[test]
fn consumption_sets_provisions_for_non_smoothed() {
    let mut engine = engine();
    let sub = register(
        &mut engine,
        SubscriptionBuilder::new(kva(6), TariffType::HpHc).customer("CUST-1"),
    );
    let period = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 1, 1), date(2024, 1, 31)))
        .unwrap();

    let updates: Vec<ConsumptionUpdate> = from_json(
        r#"[{
            "period_id": 1,
            "cadrans": {
                "peak_high_season": "100",
                "peak_low_season": "20",
                "offpeak_high_season": "60",
                "offpeak_low_season": "40"
            },
            "turpe_fixed": "8.50",
            "turpe_variable": "4.50"
        }]"#,
    )
    .unwrap();
    assert_eq!(engine.update_consumption_data(updates).unwrap(), 1);

    let billed = engine.subscription(sub).unwrap().period(period).unwrap();
    assert_eq!(billed.provisions, Provisions::peak_offpeak(dec!(120), dec!(100)));
    assert_eq!(billed.turpe_variable, dec!(4.50));

    let draft = engine.preview_invoice(sub, period).unwrap();
    assert_eq!(draft.lines.len(), 7);
    // 24.00 + 120 × 0.27 + 100 × 0.2068
    assert_eq!(draft.net_total().unwrap(), dec!(77.08));
}

#[test]
fn consumption_keeps_smoothed_provisions() {
    let mut engine = engine();
    let sub = register(
        &mut engine,
        SubscriptionBuilder::new(kva(6), TariffType::Base).smoothed(dec!(280)),
    );
    let period = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 1, 1), date(2024, 1, 31)))
        .unwrap();

    engine
        .update_consumption_data(vec![
            ConsumptionUpdate::new(period).cadrans(Cadrans::new(dec!(0), dec!(0), dec!(310), dec!(0))),
        ])
        .unwrap();

    let p = engine.subscription(sub).unwrap().period(period).unwrap();
    assert_eq!(p.provisions.base_kwh, dec!(280));
    assert_eq!(p.energy_base().unwrap(), dec!(310));
}

#[test]
fn explicit_provisions_override() {
    let mut engine = engine();
    let sub = register(&mut engine, SubscriptionBuilder::new(kva(6), TariffType::Base));
    let period = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 1, 1), date(2024, 1, 31)))
        .unwrap();

    engine
        .update_consumption_data(vec![
            ConsumptionUpdate::new(period)
                .cadrans(Cadrans::new(dec!(0), dec!(0), dec!(310), dec!(0)))
                .provisions(Provisions::base(dec!(250))),
        ])
        .unwrap();

    let p = engine.subscription(sub).unwrap().period(period).unwrap();
    assert_eq!(p.provisions.base_kwh, dec!(250));
}

#[test]
fn batch_with_billed_period_is_rejected_whole() {
    let mut engine = engine();
    let sub = register(&mut engine, SubscriptionBuilder::new(kva(6), TariffType::Base).customer("CUST-1"));
    let january = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 1, 1), date(2024, 2, 1)))
        .unwrap();
    let february = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 2, 1), date(2024, 3, 1)))
        .unwrap();
    engine.bill_period(sub, january).unwrap();

    let err = engine
        .update_consumption_data(vec![
            ConsumptionUpdate::new(february).turpe(dec!(3), dec!(1)),
            ConsumptionUpdate::new(january).turpe(dec!(9), dec!(9)),
        ])
        .unwrap_err();
    assert!(matches!(err, BillingError::AlreadyBilled { .. }));

    let untouched = engine.subscription(sub).unwrap().period(february).unwrap();
    assert_eq!(untouched.turpe_fixed, dec!(0));
}

#[test]
fn unknown_period_and_negative_amounts() {
    let mut engine = engine();
    register(&mut engine, SubscriptionBuilder::new(kva(6), TariffType::Base));

    assert!(matches!(
        engine.update_consumption_data(vec![ConsumptionUpdate::new(PeriodId(77))]),
        Err(BillingError::UnknownPeriod(PeriodId(77)))
    ));
    assert!(matches!(
        engine.update_consumption_data(vec![
            ConsumptionUpdate::new(PeriodId(1)).turpe(dec!(-1), dec!(0))
        ]),
        Err(BillingError::Builder(_))
    ));
}

#[test]
fn oversized_readings_leave_batch_untouched() {
    let mut engine = engine();
    let sub = register(&mut engine, SubscriptionBuilder::new(kva(6), TariffType::Base));
    let january = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 1, 1), date(2024, 2, 1)))
        .unwrap();
    let february = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 2, 1), date(2024, 3, 1)))
        .unwrap();

    let updates: Vec<ConsumptionUpdate> = from_json(&format!(
        r#"[
            {{"period_id": {}, "turpe_fixed": "8.50",
              "cadrans": {{"peak_high_season": "10", "peak_low_season": "0",
                          "offpeak_high_season": "0", "offpeak_low_season": "0"}}}},
            {{"period_id": {},
              "cadrans": {{"peak_high_season": "79228162514264337593543950335",
                          "peak_low_season": "79228162514264337593543950335",
                          "offpeak_high_season": "0", "offpeak_low_season": "0"}}}}
        ]"#,
        january.0, february.0
    ))
    .unwrap();
    let err = engine.update_consumption_data(updates).unwrap_err();
    assert!(matches!(err, BillingError::Builder(_)));

    let sub = engine.subscription(sub).unwrap();
    for id in [january, february] {
        let p = sub.period(id).unwrap();
        assert_eq!(p.cadrans, Cadrans::default());
        assert_eq!(p.turpe_fixed, dec!(0));
        assert_eq!(p.provisions, Provisions::default());
    }
}

#[test]
fn oversized_snapshot_power_fails_billing() {
    let mut engine = engine();
    let sub = register(&mut engine, SubscriptionBuilder::new(kva(6), TariffType::Base).customer("CUST-1"));

    let request: BillingPeriodRequest = from_json(
        r#"{
            "subscription": "SUB-00001",
            "start_date": "2023-01-01",
            "end_date": "2023-02-01",
            "kind": "monthly",
            "snapshot": {
                "tariff_type": "Base",
                "power_tier": "79228162514264337593543950335 kVA",
                "solidarity": false,
                "smoothed": false
            }
        }"#,
    )
    .unwrap();
    let summary = engine.create_billing_period(request).unwrap();

    let err = engine.bill_period(sub, summary.id).unwrap_err();
    assert!(matches!(err.root(), BillingError::InvalidPowerFormat(_)));
    assert!(!engine.subscription(sub).unwrap().period(summary.id).unwrap().is_billed());
    assert!(engine.store().is_empty());
}

#[test]
fn config_from_json() {
    let config = BillingConfig::from_json(r#"{"peak_share": "0.65", "currency": "EUR"}"#).unwrap();
    assert_eq!(config.peak_share, dec!(0.65));
    assert_eq!(config.energy_section, "Energy");

    assert!(BillingConfig::from_json(r#"{"peak_share": "1.5"}"#).is_err());
}
