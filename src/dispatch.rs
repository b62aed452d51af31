use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate_by, aggregate_by_label_order, round2};
use crate::error::{ReportError, Result};
use crate::qualify::{count_autocare, count_by_family, count_high_volume};
use crate::rules::RuleSet;
use crate::schema::Invoice;
use crate::window::{filter_to_month, week_label};

/// Shown by consumers whenever a report comes back with no rows.
pub const NO_DATA_MESSAGE: &str = "No data found matching criteria for this month.";

/// How many rows the revenue leaderboard keeps after sorting.
const TOP_CUSTOMER_LIMIT: usize = 10;

/// The closed set of reports the engine can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "family")]
pub enum ReportKind {
    /// Monthly liters per representative, autocare invoices removed.
    VolumeByRepresentative,
    /// Monthly liters per week bucket, autocare invoices removed.
    WeeklyVolume,
    /// Customers-over-threshold counts per representative for one family.
    FamilyQualification(String),
    /// Customers at or above the core floor, counted per representative.
    HighVolumeQualification,
    /// Qualification counts for the autocare family.
    AutocareQualification,
    /// Monthly liters per raw brand string, all invoices.
    VolumeByBrand,
    /// Revenue leaderboard, truncated to the top ten customers.
    TopCustomersByRevenue,
}

impl ReportKind {
    pub fn title(&self) -> String {
        match self {
            Self::VolumeByRepresentative => "Volume by Representative".to_string(),
            Self::WeeklyVolume => "Weekly Sales Volume".to_string(),
            Self::FamilyQualification(family) => format!("{} Qualification", family),
            Self::HighVolumeQualification => "High Volume Customers".to_string(),
            Self::AutocareQualification => "Autocare Qualification".to_string(),
            Self::VolumeByBrand => "Volume by Brand".to_string(),
            Self::TopCustomersByRevenue => "Top Customers by Revenue".to_string(),
        }
    }
}

/// The caller on whose behalf a report runs. Revenue figures are only
/// released when `can_view_revenue` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewer {
    pub name: String,
    pub can_view_revenue: bool,
}

impl Viewer {
    pub fn admin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            can_view_revenue: true,
        }
    }

    pub fn representative(name: &str) -> Self {
        Self {
            name: name.to_string(),
            can_view_revenue: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    Number(f64),
    Text(String),
}

/// One output row. `is_value` marks rows measured in liters so consumers
/// know to append the unit; counts and currency rows leave it unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub value: RowValue,
    pub is_value: bool,
}

impl ReportRow {
    fn liters(label: String, liters: f64) -> Self {
        Self {
            label,
            value: RowValue::Number(round2(liters)),
            is_value: true,
        }
    }

    fn count(label: String, count: u64) -> Self {
        Self {
            label,
            value: RowValue::Number(count as f64),
            is_value: false,
        }
    }

    fn text(label: String, text: String) -> Self {
        Self {
            label,
            value: RowValue::Text(text),
            is_value: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renders a rupee amount the way the leaderboard displays it, in
/// thousands with one decimal.
pub fn format_revenue(amount: f64) -> String {
    format!("\u{20b9}{:.1}k", amount / 1000.0)
}

/// Drops every invoice carrying at least one autocare line. The exclusion
/// is invoice-level: a single autocare item removes the whole invoice.
fn without_autocare<'a>(invoices: &[&'a Invoice], rules: &RuleSet) -> Vec<&'a Invoice> {
    invoices
        .iter()
        .filter(|inv| !inv.items.iter().any(|item| rules.is_autocare(item)))
        .copied()
        .collect()
}

/// Runs one report over the reference month.
pub fn run_report(
    kind: &ReportKind,
    invoices: &[Invoice],
    reference: NaiveDate,
    rules: &RuleSet,
    viewer: &Viewer,
) -> Result<Report> {
    let month = filter_to_month(invoices, reference);
    debug!(
        "Running {:?} for {} over {} in-month invoices",
        kind,
        reference.format("%Y-%m"),
        month.len()
    );

    let rows = match kind {
        ReportKind::VolumeByRepresentative => {
            let scoped = without_autocare(&month, rules);
            aggregate_by(
                &scoped,
                |inv| Some(inv.sales_executive.clone()),
                |inv| inv.total_liters,
            )
            .into_iter()
            .map(|(label, liters)| ReportRow::liters(label, liters))
            .collect()
        }
        ReportKind::WeeklyVolume => {
            let scoped = without_autocare(&month, rules);
            aggregate_by_label_order(
                &scoped,
                |inv| inv.parsed_date().map(week_label),
                |inv| inv.total_liters,
            )
            .into_iter()
            .map(|(label, liters)| ReportRow::liters(label, liters))
            .collect()
        }
        ReportKind::FamilyQualification(family) => count_by_family(&month, rules, family)?
            .into_iter()
            .map(|(label, n)| ReportRow::count(label, n))
            .collect(),
        ReportKind::HighVolumeQualification => count_high_volume(&month, rules)
            .into_iter()
            .map(|(label, n)| ReportRow::count(label, n))
            .collect(),
        ReportKind::AutocareQualification => count_autocare(&month, rules)?
            .into_iter()
            .map(|(label, n)| ReportRow::count(label, n))
            .collect(),
        ReportKind::VolumeByBrand => {
            let items: Vec<(String, f64)> = month
                .iter()
                .flat_map(|inv| inv.items.iter())
                .map(|item| (item.brand.clone(), item.liters))
                .collect();
            aggregate_by(&items, |(brand, _)| Some(brand.clone()), |(_, liters)| *liters)
                .into_iter()
                .map(|(label, liters)| ReportRow::liters(label, liters))
                .collect()
        }
        ReportKind::TopCustomersByRevenue => {
            if !viewer.can_view_revenue {
                return Err(ReportError::RevenueNotPermitted);
            }
            let mut rows: Vec<ReportRow> = aggregate_by(
                &month,
                |inv| Some(inv.customer_name.clone()),
                |inv| inv.total_amount,
            )
            .into_iter()
            .map(|(label, amount)| ReportRow::text(label, format_revenue(amount)))
            .collect();
            rows.truncate(TOP_CUSTOMER_LIMIT);
            rows
        }
    };

    Ok(Report {
        title: kind.title(),
        kind: kind.clone(),
        rows,
    })
}
