//! Plain-text rendering of a ledger for an external advice service.

use std::fmt::Write;

use crate::ledger::Ledger;
use crate::transaction::format_amount;

/// Render the ledger as:
///
/// ```text
/// Categories: Groceries, Utilities
/// Expenses:
/// 2024-01-01 - milk - 5.0 - groceries
/// ```
pub fn render_advice_prompt(ledger: &Ledger) -> String {
    let mut out = format!("Categories: {}\nExpenses:\n", ledger.categories().join(", "));
    for e in ledger.expenses() {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{} - {} - {} - {}",
            e.date(),
            e.description(),
            format_amount(e.amount()),
            e.category()
        );
    }
    out
}
