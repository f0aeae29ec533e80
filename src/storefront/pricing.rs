//! Order arithmetic and the shop's display formats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TAX_RATE: f64 = 0.1;
pub const FREE_SHIPPING_THRESHOLD: f64 = 100.0;
pub const FLAT_SHIPPING: f64 = 10.0;

/// Sum of price × quantity
pub fn subtotal<I>(lines: I) -> f64
where
    I: IntoIterator<Item = (f64, u32)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| price * f64::from(quantity))
        .sum()
}

pub fn tax(subtotal: f64) -> f64 {
    subtotal * TAX_RATE
}

/// Free strictly above the threshold
pub fn shipping(subtotal: f64) -> f64 {
    if subtotal > FREE_SHIPPING_THRESHOLD {
        0.0
    } else {
        FLAT_SHIPPING
    }
}

/// What the shopper pays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
}

impl OrderTotals {
    pub fn from_subtotal(subtotal: f64) -> Self {
        let shipping = shipping(subtotal);
        let tax = tax(subtotal);
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// `FREE` or the formatted amount
    pub fn shipping_label(&self) -> String {
        if self.shipping == 0.0 {
            "FREE".to_string()
        } else {
            format_currency(self.shipping)
        }
    }
}

/// US dollars: `$1,234.56`, negatives as `-$5.00`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Long US date: `October 18, 2026`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_totals_with_flat_shipping() {
        let totals = OrderTotals::from_subtotal(89.99);
        assert_eq!(totals.shipping, 10.0);
        assert!((totals.tax - 8.999).abs() < 1e-9);
        assert!((totals.total - 108.989).abs() < 1e-9);
        assert_eq!(totals.shipping_label(), "$10.00");
    }

    #[test]
    fn test_free_shipping_is_strictly_above_threshold() {
        assert_eq!(shipping(100.0), 10.0);
        assert_eq!(shipping(100.01), 0.0);
        assert_eq!(OrderTotals::from_subtotal(129.99).shipping_label(), "FREE");
    }

    #[test]
    fn test_subtotal() {
        assert!((subtotal([(89.99, 2), (79.99, 1)]) - 259.97).abs() < 1e-9);
        assert_eq!(subtotal(Vec::<(f64, u32)>::new()), 0.0);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(89.99), "$89.99");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-5.0), "-$5.00");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        assert_eq!(format_date(&date), "October 18, 2026");

        let date = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(format_date(&date), "March 5, 2026");
    }
}
