use kilowatt::bridge::*;
use kilowatt::core::*;
use kilowatt::engine::BillingEngine;
use kilowatt::invoice::MemoryInvoiceStore;
use kilowatt::subscription::{MemoryPartnerRegistry, SubscriptionBuilder};

fn main() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let mut engine = BillingEngine::new(
        BillingConfig::from_json(r#"{"peak_share": "0.65"}"#).unwrap(),
        ProductCatalog::standard(),
        MemoryPartnerRegistry::new(),
        MemoryInvoiceStore::new("INV-", 2024),
    )
    .unwrap();
    engine
        .register_subscription(
            SubscriptionBuilder::new(PowerTier::new(9).unwrap(), TariffType::HpHc)
                .metering_point("14500000000001"),
        )
        .unwrap();

    // ── 1. Lookup by metering point ───────────────────────────────────
    let found = engine.get_subscriptions_by_metering_point(&["14500000000001"]);
    println!("{}", to_json(&found).unwrap());

    // ── 2. Ad-hoc period ──────────────────────────────────────────────
    let request: BillingPeriodRequest = from_json(
        r#"{"subscription": "SUB-00001", "start_date": "2024-01-01",
            "end_date": "2024-02-01", "kind": "monthly"}"#,
    )
    .unwrap();
    let period = engine.create_billing_period(request).unwrap();
    println!("Created period {} ({} days)", period.label, period.days);

    // ── 3. Readings ───────────────────────────────────────────────────
    let updates: Vec<ConsumptionUpdate> = from_json(&format!(
        r#"[{{"period_id": {}, "cadrans": {{"peak_high_season": "140",
            "peak_low_season": "35", "offpeak_high_season": "90",
            "offpeak_low_season": "25"}}, "turpe_fixed": "9.80",
            "turpe_variable": "6.15"}}]"#,
        period.id.0
    ))
    .unwrap();
    match engine.update_consumption_data(updates) {
        Ok(n) => println!("Updated {n} period(s)"),
        Err(e) => println!("Rejected: {e}"),
    }

    let periods = engine
        .get_billing_periods("SUB-00001", Some(period.start_date), Some(period.end_date))
        .unwrap();
    println!("{}", to_json(&periods).unwrap());
}
