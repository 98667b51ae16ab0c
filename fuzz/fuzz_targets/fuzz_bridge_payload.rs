#![no_main]

use kilowatt::bridge::{BillingPeriodRequest, ConsumptionUpdate, from_json};
use kilowatt::core::*;
use kilowatt::engine::BillingEngine;
use kilowatt::invoice::MemoryInvoiceStore;
use kilowatt::subscription::{MemoryPartnerRegistry, SubscriptionBuilder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut engine) = BillingEngine::new(
        BillingConfig::default(),
        ProductCatalog::standard(),
        MemoryPartnerRegistry::new(),
        MemoryInvoiceStore::new("INV-", 2024),
    ) else {
        return;
    };
    let Ok(power) = PowerTier::new(6) else {
        return;
    };
    let _ = engine.register_subscription(SubscriptionBuilder::new(power, TariffType::HpHc));

    // Decode, apply, re-read: no step may panic.
    if let Ok(request) = from_json::<BillingPeriodRequest>(s) {
        let _ = engine.create_billing_period(request);
    }
    if let Ok(updates) = from_json::<Vec<ConsumptionUpdate>>(s) {
        let _ = engine.update_consumption_data(updates);
    }
    for sub in engine.subscriptions().map(|s| s.id()).collect::<Vec<_>>() {
        if let Ok(sub) = engine.subscription(sub) {
            for period in sub.periods() {
                let _ = engine.preview_invoice(sub.id(), period.id());
            }
        }
    }
});
