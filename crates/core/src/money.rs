//! Money helpers.
//!
//! All monetary values are stored and computed as integer euro cents.
//! Floating point appears only at the edges: fractional-kg quantities and
//! the webhook's decimal euro amounts.

/// Formats a cent amount as a decimal euro string, e.g. `1300` -> `"13.00"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Line total for a fractional quantity, rounded to the nearest cent.
pub fn line_total_cents(price_cents: i64, quantity: f64) -> i64 {
    (price_cents as f64 * quantity).round() as i64
}

/// Converts a decimal euro amount (e.g. from the payment webhook) to cents.
pub fn euros_to_cents(euros: f64) -> i64 {
    (euros * 100.0).round() as i64
}

/// Formats a fractional quantity without a trailing `.0` for whole values.
pub fn format_quantity(quantity: f64) -> String {
    if (quantity - quantity.round()).abs() < 1e-9 {
        format!("{}", quantity.round() as i64)
    } else {
        format!("{:.2}", quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_cents() {
        assert_eq!(format_cents(1300), "13.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-250), "-2.50");
    }

    #[test]
    fn line_totals_round_to_cents() {
        assert_eq!(line_total_cents(500, 2.0), 1000);
        assert_eq!(line_total_cents(333, 0.5), 167);
        assert_eq!(line_total_cents(999, 1.5), 1499);
    }

    #[test]
    fn euros_convert_to_cents() {
        assert_eq!(euros_to_cents(13.0), 1300);
        assert_eq!(euros_to_cents(0.1), 10);
        assert_eq!(euros_to_cents(19.99), 1999);
    }

    #[test]
    fn quantities_format_compactly() {
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(0.5), "0.50");
    }
}
