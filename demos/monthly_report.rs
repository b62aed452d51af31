//! Runs the full suite of monthly reports over a small hand-written
//! snapshot and prints them to stdout.
//!
//! ```sh
//! cargo run --example monthly_report
//! ```

use anyhow::Result;
use chrono::NaiveDate;
use sales_report_engine::{
    build_snapshot, CustomerRow, ReportEngine, ReportKind, RowValue, RuleSet, SalesRow, Viewer,
    NO_DATA_MESSAGE,
};

fn row(
    invoice_no: &str,
    date: &str,
    customer: (&str, &str),
    rep: &str,
    item: (&str, &str),
    liters: f64,
    price: f64,
    declared: (f64, f64),
) -> SalesRow {
    SalesRow {
        invoice_no: invoice_no.to_string(),
        date: date.to_string(),
        customer_id: customer.0.to_string(),
        customer_name: customer.1.to_string(),
        sales_executive: rep.to_string(),
        item_name: item.0.to_string(),
        brand: item.1.to_string(),
        quantity: 1,
        liters,
        price,
        declared_total_liters: declared.0,
        declared_total_amount: declared.1,
    }
}

fn sample_rows() -> Vec<SalesRow> {
    vec![
        row(
            "INV-24-101",
            "2024-06-04",
            ("c1", "Auto Spares Hub"),
            "RAHUL VERMA",
            ("CASTROL ACTIV 4T 20W-40 1L", "CASTROL ACTIV"),
            10.0,
            4200.0,
            (10.0, 4200.0),
        ),
        row(
            "INV-24-102",
            "2024-06-11",
            ("c2", "Speed Motors"),
            "PRIYA NAIR",
            ("CASTROL MAGNATEC 5W-30 1L", "CASTROL MAGNATEC"),
            4.0,
            2600.0,
            (4.0, 2600.0),
        ),
        row(
            "INV-24-103",
            "2024-06-19",
            ("c3", "Highway Garage"),
            "PRIYA NAIR",
            ("CASTROL CRB TURBOMAX 15W-40 9L", "CASTROL CRB TURBOMAX"),
            9.0,
            3700.0,
            (9.0, 3700.0),
        ),
        row(
            "INV-24-104",
            "2024-06-26",
            ("c1", "Auto Spares Hub"),
            "RAHUL VERMA",
            ("AUTO CARE GLASS CLEANER", "AUTO CARE MAINTENANCE"),
            6.0,
            1400.0,
            (6.0, 1400.0),
        ),
    ]
}

fn sample_customers() -> Vec<CustomerRow> {
    ["Auto Spares Hub", "Speed Motors", "Highway Garage"]
        .iter()
        .enumerate()
        .map(|(i, name)| CustomerRow {
            id: format!("c{}", i + 1),
            name: name.to_string(),
            location: "Mumbai Central".to_string(),
            phone: format!("98765432{:02}", i),
            sales_executive: None,
        })
        .collect()
}

fn print_report(engine: &ReportEngine, kind: &ReportKind, reference: NaiveDate) -> Result<()> {
    let report = engine.run(kind, reference, &Viewer::admin("ops"))?;
    println!("\n== {} ==", report.title);
    if report.is_empty() {
        println!("{}", NO_DATA_MESSAGE);
        return Ok(());
    }
    for r in &report.rows {
        match &r.value {
            RowValue::Number(n) if r.is_value => println!("{:<24} {:>10.2} L", r.label, n),
            RowValue::Number(n) => println!("{:<24} {:>10}", r.label, *n as u64),
            RowValue::Text(t) => println!("{:<24} {:>10}", r.label, t),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let reference = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let ingested = build_snapshot(&sample_rows(), &sample_customers())?;
    let engine = ReportEngine::new(ingested.snapshot, RuleSet::standard())?;

    let summary = engine.monthly_summary(reference, 60.0);
    println!("June 2024 summary");
    println!("  total volume      {:.2} L", summary.total_liters);
    println!("  total revenue     {:.2}", summary.total_amount);
    println!("  billed customers  {}", summary.billed_customers);
    println!("  unbilled          {}", summary.unbilled_customers);
    println!("  target progress   {}%", summary.target_progress_percent);

    for kind in [
        ReportKind::VolumeByRepresentative,
        ReportKind::WeeklyVolume,
        ReportKind::FamilyQualification("Activ".to_string()),
        ReportKind::FamilyQualification("Magnatec".to_string()),
        ReportKind::FamilyQualification("CRB".to_string()),
        ReportKind::HighVolumeQualification,
        ReportKind::AutocareQualification,
        ReportKind::VolumeByBrand,
        ReportKind::TopCustomersByRevenue,
    ] {
        print_report(&engine, &kind, reference)?;
    }

    Ok(())
}
