use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Display currency. Selecting one changes symbols and digit grouping only; amounts are
/// never converted.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[serde(alias = "usd")]
    Usd,
    #[serde(alias = "eur")]
    Eur,
    #[default]
    #[serde(alias = "inr")]
    Inr,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Grouping {
    Thousands,
    /// Last three digits, then pairs (12,34,567).
    Indian,
}

#[derive(Copy, Clone, Debug)]
struct LocaleStyle {
    group_separator: char,
    decimal_separator: char,
    grouping: Grouping,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Inr => "₹",
        }
    }

    pub fn locale(self) -> &'static str {
        match self {
            Currency::Usd => "en-US",
            Currency::Eur => "de-DE",
            Currency::Inr => "en-IN",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }

    fn style(self) -> LocaleStyle {
        match self {
            Currency::Usd => LocaleStyle {
                group_separator: ',',
                decimal_separator: '.',
                grouping: Grouping::Thousands,
            },
            Currency::Eur => LocaleStyle {
                group_separator: '.',
                decimal_separator: ',',
                grouping: Grouping::Thousands,
            },
            Currency::Inr => LocaleStyle {
                group_separator: ',',
                decimal_separator: '.',
                grouping: Grouping::Indian,
            },
        }
    }
}

/// Symbol plus the locale-grouped amount with exactly two decimals.
pub fn format_currency(value: f64, currency: Currency) -> String {
    format!(
        "{}{}",
        currency.symbol(),
        format_grouped(value, currency.style(), 2, 2)
    )
}

/// Locale-grouped number with up to two decimals, trailing zeros dropped.
pub fn format_number(value: f64, currency: Currency) -> String {
    format_grouped(value, currency.style(), 0, 2)
}

fn format_grouped(
    value: f64,
    style: LocaleStyle,
    min_decimals: usize,
    max_decimals: usize,
) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", max_decimals, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut frac = frac_part.to_string();
    while frac.len() > min_decimals && frac.ends_with('0') {
        frac.pop();
    }

    // "-0.00" is printed without a sign.
    let negative = value < 0.0
        && (int_part.bytes().any(|b| b != b'0') || frac.bytes().any(|b| b != b'0'));
    let mut out = String::with_capacity(fixed.len() + fixed.len() / 2 + 2);
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, style));
    if !frac.is_empty() {
        out.push(style.decimal_separator);
        out.push_str(&frac);
    }
    out
}

fn group_digits(digits: &str, style: LocaleStyle) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(len - 3);
    let group = match style.grouping {
        Grouping::Thousands => 3,
        Grouping::Indian => 2,
    };

    let mut chunks = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group);
        chunks.push(&head[start..end]);
        end = start;
    }
    chunks.reverse();
    chunks.push(tail);

    let separator = style.group_separator.to_string();
    chunks.join(&separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_locale_with_two_decimals() {
        assert_eq!(format_currency(1_234_567.5, Currency::Usd), "$1,234,567.50");
        assert_eq!(format_currency(1_234_567.5, Currency::Eur), "€1.234.567,50");
        assert_eq!(format_currency(1_234_567.5, Currency::Inr), "₹12,34,567.50");
    }

    #[test]
    fn indian_grouping_uses_pairs_above_thousands() {
        assert_eq!(format_currency(10_000_000.0, Currency::Inr), "₹1,00,00,000.00");
        assert_eq!(format_currency(999.0, Currency::Inr), "₹999.00");
        assert_eq!(format_currency(1_000.0, Currency::Inr), "₹1,000.00");
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(format_currency(925_925.925_925, Currency::Usd), "$925,925.93");
        assert_eq!(format_currency(0.0, Currency::Eur), "€0,00");
    }

    #[test]
    fn negative_amounts_keep_sign_after_symbol() {
        assert_eq!(format_currency(-1_500.25, Currency::Usd), "$-1,500.25");
        assert_eq!(format_currency(-0.001, Currency::Usd), "$0.00");
    }

    #[test]
    fn format_number_drops_trailing_zeros() {
        assert_eq!(format_number(1_234.5, Currency::Usd), "1,234.5");
        assert_eq!(format_number(1_234.0, Currency::Eur), "1.234");
        assert_eq!(format_number(123_456.789, Currency::Inr), "1,23,456.79");
    }

    #[test]
    fn currency_codes_round_trip_through_serde() {
        let parsed: Currency = serde_json::from_str("\"eur\"").expect("lowercase alias");
        assert_eq!(parsed, Currency::Eur);
        assert_eq!(
            serde_json::to_string(&Currency::Inr).expect("serialize"),
            "\"INR\""
        );
        assert_eq!(Currency::Usd.code(), "USD");
        assert_eq!(Currency::Eur.locale(), "de-DE");
    }
}
