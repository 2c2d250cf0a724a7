use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceError {
    #[error("price text is empty")]
    Empty,
    #[error("price text {0:?} is not a number")]
    NotANumber(String),
    #[error("price {0} is negative or not finite")]
    OutOfRange(f64),
}

/// Parse a currency-prefixed price such as `£51.77` into a finite, non-negative value.
///
/// Everything before the first digit, sign or decimal point is treated as the
/// currency prefix. Thousands separators are ignored.
pub fn parse_price(raw: &str) -> Result<f64, PriceError> {
    let trimmed = raw.trim();
    let numeric = trimmed
        .trim_start_matches(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
        .trim();
    if numeric.is_empty() {
        return Err(PriceError::Empty);
    }

    let cleaned: String = numeric.chars().filter(|c| *c != ',').collect();
    let value: f64 = cleaned
        .parse()
        .map_err(|_| PriceError::NotANumber(trimmed.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(PriceError::OutOfRange(value));
    }
    Ok(value)
}
