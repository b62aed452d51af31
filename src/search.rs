use serde::{Deserialize, Serialize};

use crate::dispatch::Viewer;
use crate::schema::Invoice;

/// A single search hit, flattened for display. The amount is withheld when
/// the viewer is not permitted to see revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub invoice_no: String,
    pub date: String,
    pub customer_name: String,
    pub total_liters: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl SearchHit {
    fn from_invoice(invoice: &Invoice, viewer: &Viewer) -> Self {
        Self {
            invoice_no: invoice.invoice_no.clone(),
            date: invoice.date.clone(),
            customer_name: invoice.customer_name.clone(),
            total_liters: invoice.total_liters,
            amount: viewer.can_view_revenue.then_some(invoice.total_amount),
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_uppercase().contains(needle)
}

/// Case-insensitive substring search over invoice numbers. A blank query
/// matches nothing.
pub fn search_invoice_no(invoices: &[Invoice], query: &str, viewer: &Viewer) -> Vec<SearchHit> {
    let needle = query.trim().to_uppercase();
    if needle.is_empty() {
        return Vec::new();
    }
    invoices
        .iter()
        .filter(|inv| contains_ci(&inv.invoice_no, &needle))
        .map(|inv| SearchHit::from_invoice(inv, viewer))
        .collect()
}

/// Combined search: matches when the query appears in the customer name or
/// in any line item's product name.
pub fn search_customer_or_product(
    invoices: &[Invoice],
    query: &str,
    viewer: &Viewer,
) -> Vec<SearchHit> {
    let needle = query.trim().to_uppercase();
    if needle.is_empty() {
        return Vec::new();
    }
    invoices
        .iter()
        .filter(|inv| {
            contains_ci(&inv.customer_name, &needle)
                || inv
                    .items
                    .iter()
                    .any(|item| contains_ci(&item.item_name, &needle))
        })
        .map(|inv| SearchHit::from_invoice(inv, viewer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LineItem;

    fn invoice(invoice_no: &str, customer: &str, item_name: &str) -> Invoice {
        Invoice {
            id: invoice_no.to_string(),
            invoice_no: invoice_no.to_string(),
            date: "2024-06-05".to_string(),
            customer_id: "c1".to_string(),
            customer_name: customer.to_string(),
            sales_executive: "RAHUL VERMA".to_string(),
            items: vec![LineItem {
                item_name: item_name.to_string(),
                brand: "CASTROL ACTIV".to_string(),
                quantity: 1,
                liters: 1.0,
                price: 400.0,
            }],
            total_liters: 1.0,
            total_amount: 400.0,
        }
    }

    #[test]
    fn test_invoice_no_search_is_case_insensitive() {
        let invoices = vec![
            invoice("INV-24-001", "Auto Spares Hub", "CASTROL ACTIV 4T 1L"),
            invoice("INV-24-014", "Speed Motors", "CASTROL MAGNATEC 1L"),
        ];

        let hits = search_invoice_no(&invoices, "inv-24-0 ", &Viewer::admin("ops"));
        assert_eq!(hits.len(), 2);
        let hits = search_invoice_no(&invoices, "014", &Viewer::admin("ops"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].invoice_no, "INV-24-014");
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let invoices = vec![invoice("INV-24-001", "Auto Spares Hub", "CASTROL ACTIV 4T 1L")];
        assert!(search_invoice_no(&invoices, "   ", &Viewer::admin("ops")).is_empty());
        assert!(search_customer_or_product(&invoices, "", &Viewer::admin("ops")).is_empty());
    }

    #[test]
    fn test_combined_search_covers_products() {
        let invoices = vec![
            invoice("INV-24-001", "Auto Spares Hub", "CASTROL ACTIV 4T 1L"),
            invoice("INV-24-002", "Speed Motors", "CASTROL MAGNATEC 1L"),
        ];

        let by_customer = search_customer_or_product(&invoices, "speed", &Viewer::admin("ops"));
        assert_eq!(by_customer.len(), 1);
        assert_eq!(by_customer[0].invoice_no, "INV-24-002");

        let by_product = search_customer_or_product(&invoices, "activ", &Viewer::admin("ops"));
        assert_eq!(by_product.len(), 1);
        assert_eq!(by_product[0].invoice_no, "INV-24-001");
    }

    #[test]
    fn test_amount_hidden_without_permission() {
        let invoices = vec![invoice("INV-24-001", "Auto Spares Hub", "CASTROL ACTIV 4T 1L")];

        let admin_hits = search_invoice_no(&invoices, "001", &Viewer::admin("ops"));
        assert_eq!(admin_hits[0].amount, Some(400.0));

        let rep_hits = search_invoice_no(&invoices, "001", &Viewer::representative("RAHUL VERMA"));
        assert_eq!(rep_hits[0].amount, None);
    }
}
