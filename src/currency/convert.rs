/// Trims and uppercases a currency code, e.g. " usd " -> "USD".
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn is_valid_code(code: &str) -> bool {
    code.chars().count() == 3
}

/// Rounds to 2 decimal places, half away from zero.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The converted amount shown to clients is currency-formatted; the rate
/// itself is always passed through at full stored precision.
pub fn convert_amount(amount: f64, rate: f64) -> f64 {
    round_to_cents(amount * rate)
}
