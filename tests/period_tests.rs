use chrono::NaiveDate;
use kilowatt::core::*;
use kilowatt::engine::BillingEngine;
use kilowatt::invoice::MemoryInvoiceStore;
use kilowatt::period::{Cadrans, NewPeriod, Provisions};
use kilowatt::subscription::{MemoryPartnerRegistry, SubscriptionBuilder};
use rust_decimal_macros::dec;

type Engine = BillingEngine<MemoryPartnerRegistry, MemoryInvoiceStore>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine_with(config: BillingConfig) -> Engine {
    BillingEngine::new(
        config,
        ProductCatalog::standard(),
        MemoryPartnerRegistry::new(),
        MemoryInvoiceStore::new("INV-", 2024),
    )
    .unwrap()
}

fn engine() -> Engine {
    engine_with(BillingConfig::default())
}

fn base(kva: u8) -> SubscriptionBuilder {
    SubscriptionBuilder::new(PowerTier::new(kva).unwrap(), TariffType::Base)
}

// --- Monthly sweep ---

#[test]
fn sweep_creates_last_month_for_active_subscriptions() {
    let mut engine = engine();
    let a = engine.register_subscription(base(6)).unwrap();
    let b = engine.register_subscription(base(9).inactive()).unwrap();

    let created = engine.generate_monthly_periods(date(2024, 3, 17)).unwrap();
    assert_eq!(created, 1);

    let periods = engine.subscription(a).unwrap().periods();
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].start_date(), date(2024, 2, 1));
    assert_eq!(periods[0].end_date(), date(2024, 3, 1));
    assert_eq!(periods[0].kind(), PeriodKind::Monthly);
    assert_eq!(periods[0].days(), 29);
    assert_eq!(periods[0].label(), "February 2024");
    assert!(engine.subscription(b).unwrap().periods().is_empty());
}

#[test]
fn sweep_is_idempotent() {
    let mut engine = engine();
    let sub = engine.register_subscription(base(6)).unwrap();

    assert_eq!(engine.generate_monthly_periods(date(2024, 3, 1)).unwrap(), 1);
    assert_eq!(engine.generate_monthly_periods(date(2024, 3, 31)).unwrap(), 0);
    assert_eq!(engine.subscription(sub).unwrap().periods().len(), 1);

    assert_eq!(engine.generate_monthly_periods(date(2024, 4, 2)).unwrap(), 1);
    assert_eq!(engine.subscription(sub).unwrap().periods().len(), 2);
}

#[test]
fn sweep_ignores_overlapping_but_different_intervals() {
    let mut engine = engine();
    let sub = engine.register_subscription(base(6)).unwrap();
    engine
        .create_period(
            sub,
            NewPeriod::new(date(2024, 2, 1), date(2024, 2, 15), PeriodKind::Adjustment),
        )
        .unwrap();

    assert_eq!(engine.generate_monthly_periods(date(2024, 3, 5)).unwrap(), 1);
    assert_eq!(engine.subscription(sub).unwrap().periods().len(), 2);
}

#[test]
fn sweep_across_year_boundary() {
    let mut engine = engine();
    let sub = engine.register_subscription(base(6)).unwrap();
    engine.generate_monthly_periods(date(2025, 1, 3)).unwrap();

    let period = &engine.subscription(sub).unwrap().periods()[0];
    assert_eq!(period.start_date(), date(2024, 12, 1));
    assert_eq!(period.end_date(), date(2025, 1, 1));
    assert_eq!(period.days(), 31);
}

// --- Creation ---

#[test]
fn end_must_follow_start() {
    let mut engine = engine();
    let sub = engine.register_subscription(base(6)).unwrap();
    let err = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 2, 1), date(2024, 2, 1)))
        .unwrap_err();
    assert!(matches!(err, BillingError::Builder(_)));
    assert!(engine.subscription(sub).unwrap().periods().is_empty());
}

#[test]
fn unknown_subscription() {
    let mut engine = engine();
    assert!(matches!(
        engine.create_period(SubscriptionId(42), NewPeriod::monthly(date(2024, 1, 1), date(2024, 2, 1))),
        Err(BillingError::UnknownSubscription(SubscriptionId(42)))
    ));
}

#[test]
fn smoothed_split_uses_configured_share() {
    let config = BillingConfigBuilder::new()
        .peak_share(dec!(0.60))
        .build()
        .unwrap();
    let mut engine = engine_with(config);
    let sub = engine
        .register_subscription(
            SubscriptionBuilder::new(PowerTier::new(6).unwrap(), TariffType::HpHc).smoothed(dec!(200)),
        )
        .unwrap();
    engine.generate_monthly_periods(date(2024, 5, 10)).unwrap();

    let period = &engine.subscription(sub).unwrap().periods()[0];
    assert_eq!(period.provisions, Provisions::peak_offpeak(dec!(120), dec!(80)));
}

#[test]
fn non_smoothed_period_starts_with_zero_provisions() {
    let mut engine = engine();
    let sub = engine.register_subscription(base(6)).unwrap();
    let cadrans = Cadrans::new(dec!(80), dec!(20), dec!(150), dec!(50));
    let id = engine
        .create_period(
            sub,
            NewPeriod::monthly(date(2024, 1, 1), date(2024, 2, 1)).with_cadrans(cadrans),
        )
        .unwrap();

    let period = engine.subscription(sub).unwrap().period(id).unwrap();
    assert_eq!(period.provisions, Provisions::default());
    assert_eq!(period.energy_peak().unwrap(), dec!(100));
    assert_eq!(period.energy_offpeak().unwrap(), dec!(200));
    assert_eq!(period.energy_base().unwrap(), dec!(300));
}

#[test]
fn explicit_provisions_win() {
    let mut engine = engine();
    let sub = engine.register_subscription(base(6).smoothed(dec!(280))).unwrap();
    let id = engine
        .create_period(
            sub,
            NewPeriod::new(date(2024, 1, 1), date(2024, 7, 1), PeriodKind::Regularization)
                .with_provisions(Provisions::base(dec!(-140))),
        )
        .unwrap();

    let period = engine.subscription(sub).unwrap().period(id).unwrap();
    assert_eq!(period.provisions.base_kwh, dec!(-140));
    assert_eq!(period.kind(), PeriodKind::Regularization);
}

// --- Snapshot ---

#[test]
fn snapshot_survives_contract_changes() {
    let mut engine = engine();
    let sub = engine
        .register_subscription(base(6).smoothed(dec!(280)).pro_surcharge(dec!(10)))
        .unwrap();
    let id = engine
        .create_period(sub, NewPeriod::monthly(date(2024, 1, 1), date(2024, 2, 1)))
        .unwrap();

    {
        let live = engine.subscription_mut(sub).unwrap();
        live.power = PowerTier::new(36).unwrap();
        live.tariff = TariffType::HpHc;
        live.solidarity_tariff = true;
        live.pro_surcharge_percent = dec!(0);
        live.smoothed = false;
    }

    let snapshot = engine.subscription(sub).unwrap().period(id).unwrap().snapshot();
    assert_eq!(snapshot.power_tier(), Some("6 kVA"));
    assert_eq!(snapshot.tariff_type(), Some("Base"));
    assert!(!snapshot.solidarity());
    assert!(snapshot.smoothed());
    assert_eq!(snapshot.monthly_provision_kwh(), Some(dec!(280)));
    assert_eq!(snapshot.pro_surcharge_percent(), Some(dec!(10)));
}

#[test]
fn references_are_sequential() {
    let mut engine = engine();
    let first = engine.register_subscription(base(6)).unwrap();
    let second = engine.register_subscription(base(6)).unwrap();
    assert_eq!(engine.subscription(first).unwrap().reference(), "SUB-00001");
    assert_eq!(engine.subscription(second).unwrap().reference(), "SUB-00002");
    assert!(engine.find_by_reference("SUB-00002").is_some());
}

#[test]
fn rejected_subscription_consumes_no_reference() {
    let mut engine = engine();
    assert!(engine
        .register_subscription(base(6).pro_surcharge(dec!(-5)))
        .is_err());
    let sub = engine.register_subscription(base(6)).unwrap();
    assert_eq!(engine.subscription(sub).unwrap().reference(), "SUB-00001");
}
