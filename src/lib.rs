//! # Sales Report Engine
//!
//! A deterministic reporting layer for a lubricant distribution business.
//! It classifies invoice line items into product families by rule,
//! aggregates volume and revenue across dimensions (representative, week,
//! brand, customer), evaluates incentive-scheme thresholds, and flags
//! customers billed below the core floor for the month.
//!
//! All computations are pure functions over an immutable [`SalesSnapshot`]
//! and an injected, versioned [`RuleSet`]; the reference date is always an
//! explicit parameter. Running the same report twice over the same inputs
//! yields identical output.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use sales_report_engine::{
//!     ReportEngine, ReportKind, RuleSet, SalesSnapshot, Viewer,
//! };
//!
//! let snapshot = SalesSnapshot {
//!     invoices: vec![],
//!     customers: vec![],
//! };
//! let engine = ReportEngine::new(snapshot, RuleSet::standard()).unwrap();
//!
//! let reference = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let report = engine
//!     .run(&ReportKind::VolumeByRepresentative, reference, &Viewer::admin("ops"))
//!     .unwrap();
//! assert!(report.is_empty());
//! ```

pub mod aggregate;
pub mod dispatch;
pub mod error;
pub mod ingestion;
pub mod qualify;
pub mod rules;
pub mod schema;
pub mod search;
pub mod unbilled;
pub mod window;

pub use dispatch::{
    format_revenue, run_report, Report, ReportKind, ReportRow, RowValue, Viewer, NO_DATA_MESSAGE,
};
pub use error::{ReportError, Result};
pub use ingestion::{
    build_snapshot, snapshot_from_json, CustomerRow, Ingested, RepId, Representative,
    RepresentativeRegistry, SalesRow,
};
pub use rules::{BrandRule, MatchMode, RuleSet};
pub use schema::{Customer, Invoice, LineItem, SalesSnapshot};
pub use search::{search_customer_or_product, search_invoice_no, SearchHit};
pub use unbilled::{detect_unbilled, CustomerCoreVolume};

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

/// Headline figures for one reporting month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub total_liters: f64,
    pub total_amount: f64,
    /// Distinct customers with at least one invoice in the month.
    pub billed_customers: usize,
    /// Customers whose core volume sits strictly below the floor.
    pub unbilled_customers: usize,
    /// Progress toward the monthly volume target, clamped to 100.
    pub target_progress_percent: u8,
}

/// Progress percent toward a volume target, rounded and clamped to 100.
/// A zero or negative target reports zero progress.
pub fn target_progress(volume: f64, target_liters: f64) -> u8 {
    if target_liters <= 0.0 {
        return 0;
    }
    let percent = (100.0 * volume / target_liters).round();
    percent.min(100.0).max(0.0) as u8
}

/// Snapshot, rules, and registry bundled behind one entry point. The
/// engine validates the rule set once at construction and builds the
/// representative registry from the snapshot.
#[derive(Debug, Clone)]
pub struct ReportEngine {
    snapshot: SalesSnapshot,
    rules: RuleSet,
    registry: RepresentativeRegistry,
}

impl ReportEngine {
    pub fn new(snapshot: SalesSnapshot, mut rules: RuleSet) -> Result<Self> {
        rules.validate()?;
        let registry = RepresentativeRegistry::build(&snapshot.invoices, &snapshot.customers);
        info!(
            "Report engine ready: {} invoices, {} customers, {} representatives, rule set v{}",
            snapshot.invoices.len(),
            snapshot.customers.len(),
            registry.len(),
            rules.version
        );
        Ok(Self {
            snapshot,
            rules,
            registry,
        })
    }

    pub fn snapshot(&self) -> &SalesSnapshot {
        &self.snapshot
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn registry(&self) -> &RepresentativeRegistry {
        &self.registry
    }

    /// Runs one report for the month containing `reference`.
    pub fn run(&self, kind: &ReportKind, reference: NaiveDate, viewer: &Viewer) -> Result<Report> {
        dispatch::run_report(kind, &self.snapshot.invoices, reference, &self.rules, viewer)
    }

    /// Customers billed strictly below the core floor this month.
    pub fn unbilled(&self, reference: NaiveDate) -> Vec<CustomerCoreVolume> {
        unbilled::detect_unbilled(
            &self.snapshot.customers,
            &self.snapshot.invoices,
            reference,
            &self.rules,
        )
    }

    /// In-month invoices dated within the last `days` days up to and
    /// including the reference date.
    pub fn recent_billing(&self, reference: NaiveDate, days: u64) -> Vec<&Invoice> {
        window::recent_invoices(&self.snapshot.invoices, reference, days)
    }

    /// Headline KPI figures for the month.
    pub fn monthly_summary(&self, reference: NaiveDate, target_liters: f64) -> MonthlySummary {
        let month = window::filter_to_month(&self.snapshot.invoices, reference);
        let total_liters: f64 = month.iter().map(|inv| inv.total_liters).sum();
        let total_amount: f64 = month.iter().map(|inv| inv.total_amount).sum();

        let mut customer_ids: Vec<&str> =
            month.iter().map(|inv| inv.customer_id.as_str()).collect();
        customer_ids.sort();
        customer_ids.dedup();

        MonthlySummary {
            total_liters: aggregate::round2(total_liters),
            total_amount: aggregate::round2(total_amount),
            billed_customers: customer_ids.len(),
            unbilled_customers: self.unbilled(reference).len(),
            target_progress_percent: target_progress(total_liters, target_liters),
        }
    }
}
