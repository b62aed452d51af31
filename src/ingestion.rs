use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{Customer, Invoice, LineItem, SalesSnapshot};

/// One row of a flat billing export. Spreadsheet exports repeat the invoice
/// header columns on every line-item row; declared totals are carried along
/// so ingestion can cross-check them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRow {
    pub invoice_no: String,
    pub date: String,
    pub customer_id: String,
    pub customer_name: String,
    pub sales_executive: String,
    pub item_name: String,
    pub brand: String,
    pub quantity: u32,
    pub liters: f64,
    pub price: f64,
    pub declared_total_liters: f64,
    pub declared_total_amount: f64,
}

/// One row of the customer master export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub location: String,
    pub phone: String,
    pub sales_executive: Option<String>,
}

/// Stable identifier assigned to a representative at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Representative {
    pub id: RepId,
    pub name: String,
}

/// Canonical name join for representatives, built once per snapshot.
/// Aggregations resolve ids through this registry instead of re-matching
/// raw strings with ad-hoc casing and whitespace.
#[derive(Debug, Clone, Default)]
pub struct RepresentativeRegistry {
    by_name: BTreeMap<String, RepId>,
    representatives: Vec<Representative>,
}

impl RepresentativeRegistry {
    /// Trims and uppercases a raw representative name.
    pub fn canonical(name: &str) -> String {
        name.trim().to_uppercase()
    }

    /// Collects every distinct representative named on invoices or assigned
    /// to customers. Ids are dense and assigned in sorted-name order so the
    /// same snapshot always yields the same ids.
    pub fn build(invoices: &[Invoice], customers: &[Customer]) -> Self {
        let mut names: Vec<String> = invoices
            .iter()
            .map(|inv| Self::canonical(&inv.sales_executive))
            .chain(
                customers
                    .iter()
                    .filter_map(|c| c.sales_executive.as_deref())
                    .map(Self::canonical),
            )
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();

        let mut registry = Self::default();
        for (index, name) in names.into_iter().enumerate() {
            let id = RepId(index as u32);
            registry.by_name.insert(name.clone(), id);
            registry.representatives.push(Representative { id, name });
        }
        registry
    }

    pub fn resolve(&self, name: &str) -> Option<RepId> {
        self.by_name.get(&Self::canonical(name)).copied()
    }

    pub fn name_of(&self, id: RepId) -> Option<&str> {
        self.representatives
            .get(id.0 as usize)
            .map(|rep| rep.name.as_str())
    }

    pub fn representatives(&self) -> &[Representative] {
        &self.representatives
    }

    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }
}

/// A validated snapshot plus the registry derived from it.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub snapshot: SalesSnapshot,
    pub registry: RepresentativeRegistry,
}

/// Groups flat export rows into invoices, canonicalizes representative
/// names, cross-checks declared invoice totals against the summed line
/// items, and builds the representative registry.
///
/// Rows belonging to the same invoice number are merged in first-seen
/// order. A declared total that disagrees with the computed one beyond the
/// schema tolerance aborts ingestion with `TotalsMismatch`.
pub fn build_snapshot(rows: &[SalesRow], customer_rows: &[CustomerRow]) -> Result<Ingested> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Vec<&SalesRow>> = BTreeMap::new();
    for row in rows {
        let entry = grouped.entry(row.invoice_no.clone()).or_default();
        if entry.is_empty() {
            order.push(row.invoice_no.clone());
        }
        entry.push(row);
    }

    let mut invoices = Vec::with_capacity(order.len());
    for (index, invoice_no) in order.iter().enumerate() {
        let group = &grouped[invoice_no];
        let head = group[0];

        let items: Vec<LineItem> = group
            .iter()
            .map(|row| LineItem {
                item_name: row.item_name.trim().to_string(),
                brand: row.brand.trim().to_string(),
                quantity: row.quantity,
                liters: row.liters,
                price: row.price,
            })
            .collect();

        let invoice = Invoice {
            id: format!("inv-{}", index + 1),
            invoice_no: invoice_no.clone(),
            date: head.date.trim().to_string(),
            customer_id: head.customer_id.trim().to_string(),
            customer_name: head.customer_name.trim().to_string(),
            sales_executive: RepresentativeRegistry::canonical(&head.sales_executive),
            items,
            total_liters: head.declared_total_liters,
            total_amount: head.declared_total_amount,
        };

        if invoice.parsed_date().is_none() {
            warn!(
                "Invoice {} has an unparsable date '{}'; it will be excluded from month windows",
                invoice.invoice_no, invoice.date
            );
        }
        invoice.validate_totals()?;
        invoices.push(invoice);
    }

    let customers: Vec<Customer> = customer_rows
        .iter()
        .map(|row| Customer {
            id: row.id.trim().to_string(),
            name: row.name.trim().to_string(),
            location: row.location.trim().to_string(),
            phone: row.phone.trim().to_string(),
            sales_executive: row
                .sales_executive
                .as_deref()
                .map(RepresentativeRegistry::canonical)
                .filter(|name| !name.is_empty()),
        })
        .collect();

    let registry = RepresentativeRegistry::build(&invoices, &customers);
    info!(
        "Ingested {} invoices, {} customers, {} representatives",
        invoices.len(),
        customers.len(),
        registry.len()
    );

    Ok(Ingested {
        snapshot: SalesSnapshot {
            invoices,
            customers,
        },
        registry,
    })
}

/// Loads a snapshot that was previously serialized as JSON.
pub fn snapshot_from_json(json: &str) -> Result<SalesSnapshot> {
    let snapshot: SalesSnapshot = serde_json::from_str(json)?;
    for invoice in &snapshot.invoices {
        invoice.validate_totals()?;
    }
    Ok(snapshot)
}
