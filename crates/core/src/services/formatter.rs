use serde::{Deserialize, Serialize};

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;
const THOUSAND: f64 = 1_000.0;

/// How the integer part of an amount is split into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitGrouping {
    /// en-IN: last three digits, then groups of two (1,00,00,000)
    #[default]
    Indian,
    /// Groups of three (10,000,000)
    Western,
}

/// Locale currency rendering: symbol prefix plus digit grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub grouping: DigitGrouping,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::inr()
    }
}

impl CurrencyFormat {
    /// Indian rupee, en-IN grouping.
    pub fn inr() -> Self {
        Self {
            symbol: "₹".to_string(),
            grouping: DigitGrouping::Indian,
        }
    }

    /// US dollar, en-US grouping.
    pub fn usd() -> Self {
        Self {
            symbol: "$".to_string(),
            grouping: DigitGrouping::Western,
        }
    }

    /// Render `amount` with exactly two fractional digits.
    ///
    /// Never panics: zero, negative and non-finite inputs all produce a string.
    /// Exact ties round away from zero (see [`to_fixed_2`]).
    pub fn format(&self, amount: f64) -> String {
        if amount.is_nan() {
            return format!("{}NaN", self.symbol);
        }
        if amount.is_infinite() {
            let sign = if amount < 0.0 { "-" } else { "" };
            return format!("{sign}{}∞", self.symbol);
        }

        let fixed = to_fixed_2(amount.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let grouped = group_digits(int_part, self.grouping);

        // -0.004 rounds to zero and renders unsigned
        let negative = amount < 0.0 && fixed != "0.00";
        let sign = if negative { "-" } else { "" };
        format!("{sign}{}{grouped}.{frac_part}", self.symbol)
    }

    /// Like [`format`](Self::format) but always signed: `+₹12.00`, `-₹3.00`.
    pub fn format_signed(&self, amount: f64) -> String {
        if amount >= 0.0 {
            format!("+{}", self.format(amount))
        } else {
            self.format(amount)
        }
    }
}

fn group_digits(digits: &str, grouping: DigitGrouping) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let head_group = match grouping {
        DigitGrouping::Indian => 2,
        DigitGrouping::Western => 3,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(head_group);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    groups.push(tail);
    groups.join(",")
}

/// Currency string in the default (en-IN, INR) locale.
pub fn format_price(amount: f64) -> String {
    CurrencyFormat::default().format(amount)
}

/// Two decimals, rounding exact ties away from zero the way JavaScript's
/// `Number.prototype.toFixed(2)` does.
///
/// `{:.2}` already rounds on the exact binary value; it only differs for
/// values lying exactly halfway between two hundredths, where it picks the
/// even neighbour (`0.125 → "0.12"` instead of `"0.13"`).
pub fn to_fixed_2(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value:.2}");
    }
    let magnitude = value.abs();
    let doubled = magnitude * 200.0;
    // zero residual: `doubled` is the exact product, not a rounded one
    let exact = magnitude.mul_add(200.0, -doubled) == 0.0;
    if exact && doubled.fract() == 0.0 && doubled % 2.0 == 1.0 {
        let hundredths = (doubled + 1.0) / 2.0;
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{sign}{:.2}", hundredths / 100.0);
    }
    format!("{value:.2}")
}

/// Abbreviate with the crore / lakh / thousand ladder, two decimals.
///
/// Thresholds are checked top-down, so exactly 10,000,000 is `"1.00Cr"`.
/// Values below 1,000 (including negatives) are rendered as-is.
pub fn format_magnitude(value: f64) -> String {
    if value >= CRORE {
        format!("{}Cr", to_fixed_2(value / CRORE))
    } else if value >= LAKH {
        format!("{}L", to_fixed_2(value / LAKH))
    } else if value >= THOUSAND {
        format!("{}K", to_fixed_2(value / THOUSAND))
    } else {
        to_fixed_2(value)
    }
}

/// Signed percentage with two decimals: `+1.25%`, `-0.40%`.
pub fn format_change_pct(pct: f64) -> String {
    if pct >= 0.0 {
        format!("+{}%", to_fixed_2(pct))
    } else {
        format!("{}%", to_fixed_2(pct))
    }
}

/// Symbol without its exchange suffix (`RELIANCE.NS` → `RELIANCE`).
pub fn display_symbol(symbol: &str) -> &str {
    symbol
        .strip_suffix(".NS")
        .or_else(|| symbol.strip_suffix(".BO"))
        .unwrap_or(symbol)
}

/// Exchange name implied by the symbol suffix, if recognised.
pub fn exchange_label(symbol: &str) -> Option<&'static str> {
    if symbol.ends_with(".NS") {
        Some("NSE")
    } else if symbol.ends_with(".BO") {
        Some("BSE")
    } else {
        None
    }
}

