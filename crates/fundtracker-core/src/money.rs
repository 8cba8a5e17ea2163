//! Cent arithmetic and display formatting for monetary amounts.
//!
//! Amounts cross the public API as `f64` in currency units but are held as
//! whole cents, so a total is always an exact sum of the rounded entries.

/// Whole cents. Never negative inside the ledger.
pub type Cents = i64;

/// Round `amount` to the nearest cent, half away from zero.
///
/// Returns `None` for non-finite input or values outside the representable range.
pub fn to_cents(amount: f64) -> Option<Cents> {
    if !amount.is_finite() {
        return None;
    }
    let scaled = (amount * 100.0).round();
    if scaled.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(scaled as Cents)
}

pub fn from_cents(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Round to 2 decimals, half away from zero.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Format an amount with grouped thousands, 0-2 fraction digits and a
/// trailing currency symbol separated by a non-breaking space.
///
/// ```
/// use fundtracker_core::money::format_money;
/// assert_eq!(format_money(185380.0, "€"), "185,380\u{a0}€");
/// assert_eq!(format_money(12.5, "€"), "12.5\u{a0}€");
/// ```
pub fn format_money(amount: f64, symbol: &str) -> String {
    let cents = to_cents(amount).unwrap_or(0);
    let negative = cents < 0;
    let cents = cents.unsigned_abs();
    let whole = cents / 100;
    let frac = cents % 100;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if frac != 0 {
        let digits = format!("{frac:02}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    if !symbol.is_empty() {
        out.push('\u{a0}');
        out.push_str(symbol);
    }
    out
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(",")
}
