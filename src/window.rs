use chrono::{Datelike, Days, NaiveDate};

use crate::schema::Invoice;

/// Keeps the invoices whose date falls in the same calendar month and year as
/// `reference`. The reference is always an explicit parameter so reports are
/// reproducible; the engine never reads the system clock. Invoices with
/// unparsable dates belong to no month and are dropped.
pub fn filter_to_month<'a>(invoices: &'a [Invoice], reference: NaiveDate) -> Vec<&'a Invoice> {
    invoices
        .iter()
        .filter(|inv| match inv.parsed_date() {
            Some(d) => d.month() == reference.month() && d.year() == reference.year(),
            None => false,
        })
        .collect()
}

/// Week bucket within the month: `ceil(day / 7)`. Days 1-7 map to 1, 8-14 to
/// 2, and so on; day 29 onward lands in bucket 5. This is the legacy
/// approximation, not a Monday-Sunday calendar week, and downstream consumers
/// depend on these bucket numbers, so it is kept as is.
pub fn week_bucket(date: NaiveDate) -> u32 {
    date.day().div_ceil(7)
}

pub fn week_label(date: NaiveDate) -> String {
    format!("Week {}", week_bucket(date))
}

/// The recent-billing feed: in-month invoices dated within the last `days`
/// days up to and including the reference date.
pub fn recent_invoices<'a>(
    invoices: &'a [Invoice],
    reference: NaiveDate,
    days: u64,
) -> Vec<&'a Invoice> {
    let floor = reference.checked_sub_days(Days::new(days)).unwrap_or(reference);
    filter_to_month(invoices, reference)
        .into_iter()
        .filter(|inv| match inv.parsed_date() {
            Some(d) => d >= floor && d <= reference,
            None => false,
        })
        .collect()
}
