use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{ReportError, Result};
use crate::rules::RuleSet;
use crate::schema::{Invoice, LineItem};

/// Per-customer accumulator for one qualification run. The unit of
/// qualification is the customer: volumes from every matching invoice in the
/// window are summed before the threshold comparison.
struct CustomerAccumulator {
    volume: f64,
    representative: String,
    attributed_date: Option<NaiveDate>,
}

/// Counts, per sales executive, the distinct customers whose accumulated
/// volume over `matches`-selected line items meets or exceeds `threshold`
/// (inclusive).
///
/// Representative attribution is per customer, not per line item: the
/// executive on the customer's latest-dated matching invoice wins, with
/// earlier-encountered invoices keeping the slot on equal dates. This replaces
/// the legacy first-in-iteration-order attribution, which was undefined when a
/// customer's invoices carried conflicting executive names.
pub fn count_qualifying(
    invoices: &[&Invoice],
    threshold: f64,
    matches: impl Fn(&LineItem) -> bool,
) -> Vec<(String, u64)> {
    let mut customers: BTreeMap<&str, CustomerAccumulator> = BTreeMap::new();

    for invoice in invoices {
        let matched_liters: f64 = invoice
            .items
            .iter()
            .filter(|item| matches(item))
            .map(|item| item.liters)
            .sum();
        if matched_liters == 0.0 {
            continue;
        }

        let date = invoice.parsed_date();
        let entry = customers
            .entry(invoice.customer_id.as_str())
            .or_insert_with(|| CustomerAccumulator {
                volume: 0.0,
                representative: invoice.sales_executive.clone(),
                attributed_date: date,
            });
        entry.volume += matched_liters;
        if date > entry.attributed_date {
            entry.representative = invoice.sales_executive.clone();
            entry.attributed_date = date;
        }
    }

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for acc in customers.values() {
        if acc.volume >= threshold {
            *counts.entry(acc.representative.clone()).or_default() += 1;
        }
    }

    let mut rows: Vec<(String, u64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows
}

/// Qualification counts for a named family, using the family's configured
/// threshold.
pub fn count_by_family(
    invoices: &[&Invoice],
    rules: &RuleSet,
    family: &str,
) -> Result<Vec<(String, u64)>> {
    let rule = rules
        .rule_for(family)
        .ok_or_else(|| ReportError::UnknownFamily(family.to_string()))?;
    Ok(count_qualifying(invoices, rule.threshold_liters, |item| {
        rule.matches(item)
    }))
}

/// High-volume ("core") qualification: a line item counts iff it passes the
/// shared core predicate, and the floor is the configured core threshold.
pub fn count_high_volume(invoices: &[&Invoice], rules: &RuleSet) -> Vec<(String, u64)> {
    count_qualifying(invoices, rules.core_threshold_liters, |item| {
        rules.is_core_item(item)
    })
}

/// Autocare qualification: the complement of the core exclusion, counted
/// against the autocare family's own threshold.
pub fn count_autocare(invoices: &[&Invoice], rules: &RuleSet) -> Result<Vec<(String, u64)>> {
    count_by_family(invoices, rules, &rules.autocare_family)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, brand: &str, liters: f64) -> LineItem {
        LineItem {
            item_name: name.to_string(),
            brand: brand.to_string(),
            quantity: 1,
            liters,
            price: 400.0 * liters,
        }
    }

    fn invoice(id: &str, date: &str, customer: &str, se: &str, items: Vec<LineItem>) -> Invoice {
        let total_liters = items.iter().map(|i| i.liters).sum();
        let total_amount = items.iter().map(|i| i.price).sum();
        Invoice {
            id: id.to_string(),
            invoice_no: format!("INV-24-{}", id),
            date: date.to_string(),
            customer_id: customer.to_string(),
            customer_name: format!("Customer {}", customer),
            sales_executive: se.to_string(),
            items,
            total_liters,
            total_amount,
        }
    }

    fn rules() -> RuleSet {
        let mut r = RuleSet::standard();
        r.validate().unwrap();
        r
    }

    #[test]
    fn test_accumulates_across_invoices_and_counts_once() {
        // 0.9 L + 0.1 L from two invoices of the same customer reach the
        // Activ threshold of 0.9 L exactly once.
        let invoices = vec![
            invoice(
                "1",
                "2024-06-03",
                "cA",
                "RAHUL VERMA",
                vec![item("CASTROL ACTIV 4T 900ML", "CASTROL ACTIV", 0.9)],
            ),
            invoice(
                "2",
                "2024-06-10",
                "cA",
                "RAHUL VERMA",
                vec![item("CASTROL ACTIV 4T 900ML", "CASTROL ACTIV", 0.1)],
            ),
        ];
        let refs: Vec<&Invoice> = invoices.iter().collect();

        let rows = count_by_family(&refs, &rules(), "Activ").unwrap();
        assert_eq!(rows, vec![("RAHUL VERMA".to_string(), 1)]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let make = |liters| {
            vec![invoice(
                "1",
                "2024-06-03",
                "cA",
                "AMIT SINGH",
                vec![item("CASTROL ACTIV 4T 900ML", "CASTROL ACTIV", liters)],
            )]
        };

        let at = make(0.9);
        let refs: Vec<&Invoice> = at.iter().collect();
        assert_eq!(count_by_family(&refs, &rules(), "Activ").unwrap().len(), 1);

        let below = make(0.8);
        let refs: Vec<&Invoice> = below.iter().collect();
        assert!(count_by_family(&refs, &rules(), "Activ").unwrap().is_empty());
    }

    #[test]
    fn test_attribution_latest_invoice_wins() {
        let invoices = vec![
            invoice(
                "1",
                "2024-06-03",
                "cA",
                "RAHUL VERMA",
                vec![item("CASTROL ACTIV 4T 900ML", "CASTROL ACTIV", 0.5)],
            ),
            invoice(
                "2",
                "2024-06-20",
                "cA",
                "AMIT SINGH",
                vec![item("CASTROL ACTIV 4T 900ML", "CASTROL ACTIV", 0.5)],
            ),
        ];
        let refs: Vec<&Invoice> = invoices.iter().collect();

        let rows = count_by_family(&refs, &rules(), "Activ").unwrap();
        assert_eq!(rows, vec![("AMIT SINGH".to_string(), 1)]);
    }

    #[test]
    fn test_non_matching_items_do_not_accumulate() {
        let invoices = vec![invoice(
            "1",
            "2024-06-03",
            "cA",
            "RAHUL VERMA",
            vec![
                item("CASTROL ACTIV 4T 900ML", "CASTROL ACTIV", 0.5),
                item("CASTROL CRB TURBOMAX 7.5L", "CASTROL CRB TURBOMAX", 7.5),
            ],
        )];
        let refs: Vec<&Invoice> = invoices.iter().collect();

        // Only 0.5 L of Activ, below the 0.9 L threshold despite the invoice
        // carrying 8 L in total.
        assert!(count_by_family(&refs, &rules(), "Activ").unwrap().is_empty());
        // The CRB line alone clears the CRB threshold of 1 L.
        assert_eq!(count_by_family(&refs, &rules(), "CRB").unwrap().len(), 1);
    }

    #[test]
    fn test_high_volume_excludes_accessories_and_autocare() {
        let invoices = vec![invoice(
            "1",
            "2024-06-03",
            "cA",
            "SURESH PATEL",
            vec![
                item("CASTROL ACTIV 4T 1L", "CASTROL ACTIV", 6.0),
                item("CASTROL CRB TURBOMAX 7.5L", "CASTROL CRB TURBOMAX", 3.0),
                item("CASTROL FUNNEL", "ACCESSORIES", 50.0),
                item("AUTO CARE SHAMPOO", "AUTO CARE MAINTENANCE", 50.0),
            ],
        )];
        let refs: Vec<&Invoice> = invoices.iter().collect();

        // 6 + 3 = 9 L of core volume meets the 9 L floor; the 100 excluded
        // liters contribute nothing.
        let rows = count_high_volume(&refs, &rules());
        assert_eq!(rows, vec![("SURESH PATEL".to_string(), 1)]);
    }

    #[test]
    fn test_autocare_variant() {
        let invoices = vec![invoice(
            "1",
            "2024-06-03",
            "cA",
            "VIKRAM RATHORE",
            vec![item("AUTO CARE SHAMPOO", "AUTO CARE MAINTENANCE", 5.0)],
        )];
        let refs: Vec<&Invoice> = invoices.iter().collect();

        let rows = count_autocare(&refs, &rules()).unwrap();
        assert_eq!(rows, vec![("VIKRAM RATHORE".to_string(), 1)]);
    }

    #[test]
    fn test_unknown_family_is_an_error() {
        let invoices: Vec<Invoice> = vec![];
        let refs: Vec<&Invoice> = invoices.iter().collect();
        assert!(matches!(
            count_by_family(&refs, &rules(), "Nonexistent"),
            Err(ReportError::UnknownFamily(_))
        ));
    }

    #[test]
    fn test_sorted_descending_by_count() {
        let mut invoices = Vec::new();
        for (i, customer) in ["c1", "c2", "c3"].iter().enumerate() {
            invoices.push(invoice(
                &format!("a{}", i),
                "2024-06-03",
                customer,
                "AMIT SINGH",
                vec![item("CASTROL ACTIV 4T 1L", "CASTROL ACTIV", 1.0)],
            ));
        }
        invoices.push(invoice(
            "b1",
            "2024-06-03",
            "c4",
            "RAHUL VERMA",
            vec![item("CASTROL ACTIV 4T 1L", "CASTROL ACTIV", 1.0)],
        ));
        let refs: Vec<&Invoice> = invoices.iter().collect();

        let rows = count_by_family(&refs, &rules(), "Activ").unwrap();
        assert_eq!(
            rows,
            vec![
                ("AMIT SINGH".to_string(), 3),
                ("RAHUL VERMA".to_string(), 1)
            ]
        );
    }
}
