/// Amounts are integer minor units (cents). Credits are positive, debit markers negative.
pub type Cents = i64;

/// Format cents as a decimal string, e.g. 7000 -> "70.00", -150 -> "-1.50".
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
