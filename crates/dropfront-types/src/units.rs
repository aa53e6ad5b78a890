//! Lenient integer parsing and decimal formatting for on-chain amounts.

use alloy_primitives::U256;

/// Largest decimal count whose scale factor fits in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

/// Errors from amount parsing/formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    Empty,
    Invalid(String),
    TooManyDecimals(u8),
    Overflow,
}

impl std::fmt::Display for UnitsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty amount"),
            Self::Invalid(raw) => write!(f, "invalid amount: {raw}"),
            Self::TooManyDecimals(d) => write!(f, "too many decimals: {d}"),
            Self::Overflow => write!(f, "amount overflows 256 bits"),
        }
    }
}

impl std::error::Error for UnitsError {}

/// Parse an unsigned on-chain integer, decimal or `0x`-prefixed hex.
pub fn parse_u256(raw: &str) -> Result<U256, UnitsError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix as u32)) {
        return Err(UnitsError::Invalid(s.to_string()));
    }
    U256::from_str_radix(digits, radix).map_err(|_| UnitsError::Invalid(s.to_string()))
}

/// `10^decimals`.
pub fn scale(decimals: u8) -> Result<U256, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::TooManyDecimals(decimals));
    }
    let ten = U256::from(10u64);
    let mut out = U256::from(1u64);
    for _ in 0..decimals {
        out = out.checked_mul(ten).ok_or(UnitsError::Overflow)?;
    }
    Ok(out)
}

/// Render a base-unit amount as a decimal string.
///
/// Trailing fractional zeros are trimmed but one fractional digit is always
/// kept (`1000000000000000000` at 18 decimals is `"1.0"`). Zero decimals
/// renders the bare integer.
pub fn format_units(value: U256, decimals: u8) -> Result<String, UnitsError> {
    if decimals == 0 {
        return Ok(value.to_string());
    }
    let factor = scale(decimals)?;
    let whole = value / factor;
    let fraction = (value % factor).to_string();
    let padded = format!("{fraction:0>width$}", width = decimals as usize);
    let trimmed = padded.trim_end_matches('0');
    let fraction = if trimmed.is_empty() { "0" } else { trimmed };
    Ok(format!("{whole}.{fraction}"))
}

/// Parse a decimal amount (`"0.101"`) into base units.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let s = amount.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals(decimals));
    }
    let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(UnitsError::Invalid(s.to_string()));
    }

    let factor = scale(decimals)?;
    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| UnitsError::Invalid(s.to_string()))?
    };
    let padded = format!("{fraction:0<width$}", width = decimals as usize);
    let fraction = if padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&padded, 10).map_err(|_| UnitsError::Invalid(s.to_string()))?
    };

    whole
        .checked_mul(factor)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(UnitsError::Overflow)
}

/// Parse an ether-denominated amount into wei.
pub fn parse_ether(amount: &str) -> Result<U256, UnitsError> {
    parse_units(amount, 18)
}
