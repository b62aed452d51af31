use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::rules::RuleSet;
use crate::schema::{Customer, Invoice};
use crate::window::filter_to_month;

/// A customer together with their accumulated core volume for the reporting
/// month. Core volume counts only line items passing the shared core
/// predicate (no excluded products, no autocare).
#[derive(Debug, Clone)]
pub struct CustomerCoreVolume {
    pub customer: Customer,
    pub core_liters: f64,
}

/// Sums core liters per customer id for the reference month.
pub fn core_volume_by_customer(
    invoices: &[Invoice],
    reference: NaiveDate,
    rules: &RuleSet,
) -> BTreeMap<String, f64> {
    let mut volumes: BTreeMap<String, f64> = BTreeMap::new();
    for invoice in filter_to_month(invoices, reference) {
        let core: f64 = invoice
            .items
            .iter()
            .filter(|item| rules.is_core_item(item))
            .map(|item| item.liters)
            .sum();
        if core > 0.0 {
            *volumes.entry(invoice.customer_id.clone()).or_default() += core;
        }
    }
    volumes
}

/// Attaches the month's core volume to every customer in the set, zero when
/// the customer has no qualifying billing at all. Order follows the input
/// customer order; no sort is applied.
pub fn attach_core_volumes(
    customers: &[Customer],
    invoices: &[Invoice],
    reference: NaiveDate,
    rules: &RuleSet,
) -> Vec<CustomerCoreVolume> {
    let volumes = core_volume_by_customer(invoices, reference, rules);
    customers
        .iter()
        .map(|c| CustomerCoreVolume {
            customer: c.clone(),
            core_liters: volumes.get(&c.id).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Flags customers whose core volume is strictly below the configured floor.
/// Unlike qualification thresholds, the floor comparison is exclusive: a
/// customer sitting exactly on the floor is not flagged.
pub fn detect_unbilled(
    customers: &[Customer],
    invoices: &[Invoice],
    reference: NaiveDate,
    rules: &RuleSet,
) -> Vec<CustomerCoreVolume> {
    attach_core_volumes(customers, invoices, reference, rules)
        .into_iter()
        .filter(|c| c.core_liters < rules.core_threshold_liters)
        .collect()
}
