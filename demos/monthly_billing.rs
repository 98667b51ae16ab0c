use chrono::NaiveDate;
use kilowatt::core::*;
use kilowatt::engine::BillingEngine;
use kilowatt::grid::{PriceGridBuilder, PriceLine};
use kilowatt::invoice::{InvoiceLine, InvoiceStore, MemoryInvoiceStore};
use kilowatt::subscription::{MemoryPartnerRegistry, SubscriptionBuilder};
use rust_decimal_macros::dec;

fn main() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let config = BillingConfigBuilder::new()
        .invoice_prefix("FAC-")
        .build()
        .unwrap();
    let store = MemoryInvoiceStore::from_config(&config, 2024);
    let mut engine = BillingEngine::new(
        config,
        ProductCatalog::standard(),
        MemoryPartnerRegistry::new()
            .with("CUST-1", "Jeanne Martin")
            .with("CUST-2", "Boulangerie du Port"),
        store,
    )
    .unwrap();

    // ── 1. Tariffs ────────────────────────────────────────────────────
    engine
        .grids_mut()
        .create(
            PriceGridBuilder::new("Tariffs 2024", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
                .current(true)
                .line(PriceLine::subscription_fee("SUBSCRIPTION", dec!(12.00)))
                .line(PriceLine::subscription_fee("SUBSCRIPTION_SOLIDARITY", dec!(8.00)))
                .line(PriceLine::energy("ENERGY_BASE", dec!(0.2276)))
                .line(PriceLine::energy("ENERGY_HP", dec!(0.2700)))
                .line(PriceLine::energy("ENERGY_HC", dec!(0.2068))),
        )
        .unwrap();

    // ── 2. Subscriptions ──────────────────────────────────────────────
    engine
        .register_subscription(
            SubscriptionBuilder::new(PowerTier::new(6).unwrap(), TariffType::Base)
                .customer("CUST-1")
                .smoothed(dec!(280))
                .payment_mode(PaymentMode::DirectDebit),
        )
        .unwrap();
    engine
        .register_subscription(
            SubscriptionBuilder::new(PowerTier::new(12).unwrap(), TariffType::HpHc)
                .customer("CUST-2")
                .smoothed(dec!(600))
                .pro_surcharge(dec!(15)),
        )
        .unwrap();

    // ── 3. Monthly run ────────────────────────────────────────────────
    let today = NaiveDate::from_ymd_opt(2024, 2, 3).unwrap();
    let created = engine.generate_monthly_periods(today).unwrap();
    println!("Created {created} billing periods");

    let report = engine.generate_all_invoices();
    for (subscription, error) in report.failures() {
        println!("  {subscription}: {error}");
    }

    // ── 4. Invoices ───────────────────────────────────────────────────
    for id in report.invoices() {
        let invoice = engine.store().get_invoice(id).unwrap();
        println!("\n{} ({})", invoice.number, invoice.report_filename());
        for line in &invoice.lines {
            match line {
                InvoiceLine::Section { label } => println!("  [{label}]"),
                InvoiceLine::Note { text } => println!("    {text}"),
                InvoiceLine::Product {
                    description,
                    quantity,
                    unit_price,
                    ..
                } => println!(
                    "    {description:<40} {:>8} x {:>10} = {:>8} {}",
                    quantity.to_string(),
                    unit_price.round_dp(4).to_string(),
                    line.amount().unwrap().to_string(),
                    invoice.currency
                ),
            }
        }
        println!("  Total: {} {}", invoice.totals.net_total, invoice.currency);
    }
}
