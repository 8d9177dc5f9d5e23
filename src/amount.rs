//! Token Amount Formatting Utilities
//!
//! Conversions between raw on-chain integer amounts and the decimal strings
//! shown to users.

use std::str::FromStr;

use cosmwasm_std::Uint256;

use crate::error::Error;

/// Decimals used by ETH and the reward token
pub const DEFAULT_DECIMALS: u32 = 18;

/// Fraction digits shown for token amounts
pub const DISPLAY_FRACTION_DIGITS: usize = 2;

/// Render a raw amount as an exact decimal string, e.g. `1500000000000000000` → `1.5`
pub fn format_units(amount: Uint256, decimals: u32) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// Parse a decimal string into a raw amount with the given decimals
pub fn parse_units(value: &str, decimals: u32) -> Result<Uint256, Error> {
    let value = value.trim();
    let (int_part, frac_part) = match value.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (value, ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return Err(Error::Other(format!("Invalid amount: {}", value)));
    }
    if frac_part.len() > decimals as usize {
        return Err(Error::Other(format!(
            "Amount {} has more than {} fraction digits",
            value, decimals
        )));
    }

    let combined = format!(
        "{}{}{}",
        int_part,
        frac_part,
        "0".repeat(decimals as usize - frac_part.len())
    );
    let combined = combined.trim_start_matches('0');
    if combined.is_empty() {
        return Ok(Uint256::zero());
    }

    Uint256::from_str(combined)
        .map_err(|e| Error::Other(format!("Invalid amount {}: {}", value, e)))
}

/// Lossy conversion of a raw amount to a float, for rate arithmetic
pub fn to_f64(amount: Uint256, decimals: u32) -> f64 {
    format_units(amount, decimals).parse().unwrap_or(0.0)
}

/// Format a float the way a browser's `toLocaleString` does for en-US:
/// thousands separators and at most `max_fraction_digits` digits after the point.
///
/// Rounding works on the shortest decimal form of `value`, half away from
/// zero, so `0.125` shows as `0.13`.
pub fn format_decimal(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let (int_part, frac_part) = round_half_up(&value.abs().to_string(), max_fraction_digits);
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

/// Round a plain decimal string to `fraction_digits`, returning the integer
/// and fraction digits separately
fn round_half_up(digits: &str, fraction_digits: usize) -> (String, String) {
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if frac_part.len() <= fraction_digits {
        return (int_part.to_string(), frac_part.to_string());
    }

    let round_up = frac_part.as_bytes()[fraction_digits] >= b'5';
    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part[..fraction_digits].bytes())
        .collect();

    if round_up {
        let mut carry = true;
        for digit in kept.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let split = kept.len() - fraction_digits;
    let kept: String = kept.into_iter().map(char::from).collect();
    (kept[..split].to_string(), kept[split..].to_string())
}

/// Format a raw token amount for display, e.g. `1234567800000000000000` → `1,234.57`
pub fn format_big_number(amount: Uint256, decimals: u32) -> String {
    format_decimal(to_f64(amount, decimals), DISPLAY_FRACTION_DIGITS)
}

/// Placeholder shown while data is loading
pub fn loading_text(label: &str) -> String {
    format!("{}...", label)
}
