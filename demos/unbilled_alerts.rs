//! Flags customers billed below the core floor for the month and writes
//! the alert list as CSV to stdout.
//!
//! ```sh
//! cargo run --example unbilled_alerts
//! ```

use anyhow::Result;
use chrono::NaiveDate;
use sales_report_engine::{
    detect_unbilled, Customer, Invoice, LineItem, RuleSet, SalesSnapshot,
};

fn invoice(id: &str, date: &str, customer: (&str, &str), items: Vec<LineItem>) -> Invoice {
    let total_liters = items.iter().map(|i| i.liters).sum();
    let total_amount = items.iter().map(|i| i.price).sum();
    Invoice {
        id: id.to_string(),
        invoice_no: format!("INV-24-{}", id),
        date: date.to_string(),
        customer_id: customer.0.to_string(),
        customer_name: customer.1.to_string(),
        sales_executive: "RAHUL VERMA".to_string(),
        items,
        total_liters,
        total_amount,
    }
}

fn oil(name: &str, brand: &str, liters: f64) -> LineItem {
    LineItem {
        item_name: name.to_string(),
        brand: brand.to_string(),
        quantity: 1,
        liters,
        price: 420.0 * liters,
    }
}

fn sample() -> SalesSnapshot {
    let customers = vec![
        ("c1", "Auto Spares Hub", "Mumbai Central"),
        ("c2", "Speed Motors", "Andheri"),
        ("c3", "Highway Garage", "Thane"),
    ]
    .into_iter()
    .map(|(id, name, location)| Customer {
        id: id.to_string(),
        name: name.to_string(),
        location: location.to_string(),
        phone: "9876543200".to_string(),
        sales_executive: Some("RAHUL VERMA".to_string()),
    })
    .collect();

    let invoices = vec![
        invoice(
            "201",
            "2024-06-05",
            ("c1", "Auto Spares Hub"),
            vec![oil("CASTROL ACTIV 4T 20W-40 1L", "CASTROL ACTIV", 12.0)],
        ),
        // Below the floor: 4 L of core volume.
        invoice(
            "202",
            "2024-06-12",
            ("c2", "Speed Motors"),
            vec![oil("CASTROL MAGNATEC 5W-30 1L", "CASTROL MAGNATEC", 4.0)],
        ),
        // c3 has no June billing at all.
    ];

    SalesSnapshot {
        invoices,
        customers,
    }
}

fn main() -> Result<()> {
    let reference = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let snapshot = sample();
    let mut rules = RuleSet::standard();
    rules.validate()?;

    let flagged = detect_unbilled(&snapshot.customers, &snapshot.invoices, reference, &rules);

    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["customer_id", "name", "location", "core_liters", "floor"])?;
    for alert in &flagged {
        let core = format!("{:.2}", alert.core_liters);
        let floor = format!("{:.2}", rules.core_threshold_liters);
        writer.write_record([
            alert.customer.id.as_str(),
            alert.customer.name.as_str(),
            alert.customer.location.as_str(),
            core.as_str(),
            floor.as_str(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}
