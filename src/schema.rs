use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Tolerance used when checking declared invoice totals against line items.
pub const TOTALS_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LineItem {
    #[schemars(description = "Product name as printed on the invoice (e.g., 'CASTROL ACTIV 4T 20W-40 1L')")]
    pub item_name: String,

    #[schemars(description = "Brand string used for family classification (e.g., 'CASTROL ACTIV')")]
    pub brand: String,

    #[schemars(description = "Number of units billed")]
    pub quantity: u32,

    #[schemars(description = "Total liters for this line (units x pack size)")]
    pub liters: f64,

    #[schemars(description = "Line amount in the invoice currency")]
    pub price: f64,
}

/// A read-only invoice snapshot. The engine never mutates invoices; they are
/// constructed once per reporting cycle from the external data source.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Invoice {
    pub id: String,

    #[schemars(description = "Human-facing invoice number (e.g., 'INV-24-10045')")]
    pub invoice_no: String,

    #[schemars(
        description = "Invoice date in YYYY-MM-DD format, kept as received. Records with unparsable dates are excluded from month-scoped reports rather than rejected."
    )]
    pub date: String,

    pub customer_id: String,
    pub customer_name: String,

    #[schemars(description = "Sales executive name exactly as it appears in the source reports")]
    pub sales_executive: String,

    pub items: Vec<LineItem>,

    #[schemars(description = "Declared sum of item liters; must equal the computed sum")]
    pub total_liters: f64,

    #[schemars(description = "Declared sum of item prices; must equal the computed sum")]
    pub total_amount: f64,
}

impl Invoice {
    /// Parses the invoice date. `None` means a malformed or missing date; such
    /// invoices cannot belong to any calendar month.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    pub fn computed_liters(&self) -> f64 {
        self.items.iter().map(|i| i.liters).sum()
    }

    pub fn computed_amount(&self) -> f64 {
        self.items.iter().map(|i| i.price).sum()
    }

    /// Checks the totals invariants: `total_liters == sum(item.liters)` and
    /// `total_amount == sum(item.price)` within [`TOTALS_TOLERANCE`].
    pub fn validate_totals(&self) -> Result<()> {
        let liters = self.computed_liters();
        if (liters - self.total_liters).abs() > TOTALS_TOLERANCE {
            return Err(ReportError::TotalsMismatch {
                invoice_no: self.invoice_no.clone(),
                declared: self.total_liters,
                computed: liters,
            });
        }

        let amount = self.computed_amount();
        if (amount - self.total_amount).abs() > TOTALS_TOLERANCE {
            return Err(ReportError::TotalsMismatch {
                invoice_no: self.invoice_no.clone(),
                declared: self.total_amount,
                computed: amount,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Customer {
    pub id: String,
    pub name: String,

    #[schemars(description = "Town or area used for route planning")]
    pub location: String,

    pub phone: String,

    #[schemars(description = "Assigned sales executive name, joined against invoice records")]
    #[serde(default)]
    pub sales_executive: Option<String>,
}

/// The immutable input snapshot handed to the engine by the surrounding
/// infrastructure for one reporting cycle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SalesSnapshot {
    pub invoices: Vec<Invoice>,
    pub customers: Vec<Customer>,
}

impl SalesSnapshot {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SalesSnapshot)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}
