//! Polling interval parsing.
//!
//! Intervals are written as one or more `<number><unit>` groups, e.g.
//! `30s`, `1m`, `1h30m` or `1.5h`. Units: `ns`, `us` (or `µs`), `ms`, `s`,
//! `m`, `h`.

use std::time::Duration;

use crate::{GatorError, Result};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Parse a polling interval. Zero, negative and malformed values are rejected.
pub fn parse_interval(input: &str) -> Result<Duration> {
    let invalid = |reason: &str| GatorError::InvalidInterval {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid("interval is empty"));
    }

    if let Some(stripped) = rest.strip_prefix('-') {
        if stripped.is_empty() {
            return Err(invalid("missing number"));
        }
        return Err(invalid("must be positive"));
    }
    rest = rest.strip_prefix('+').unwrap_or(rest);

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, fraction, after_number) = split_number(rest);
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("missing number"));
        }

        let unit_len = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let unit = &after_number[..unit_len];
        rest = &after_number[unit_len..];

        let scale = match unit {
            "" => return Err(invalid("missing unit")),
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3600 * NANOS_PER_SECOND,
            other => return Err(invalid(&format!("unknown unit {other:?}"))),
        };

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("number too large"))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("interval too large"))?;

        if !fraction.is_empty() {
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| invalid("invalid fraction"))?;
            let denominator = 10u128.pow(digits.len() as u32);
            nanos = nanos
                .checked_add(numerator * scale / denominator)
                .ok_or_else(|| invalid("interval too large"))?;
        }

        total = total
            .checked_add(nanos)
            .ok_or_else(|| invalid("interval too large"))?;
    }

    if total == 0 {
        return Err(invalid("must be positive"));
    }
    if total > u64::MAX as u128 {
        return Err(invalid("interval too large"));
    }

    Ok(Duration::from_nanos(total as u64))
}

/// Split a leading `digits[.digits]` off `s`.
fn split_number(s: &str) -> (&str, &str, &str) {
    let whole_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (whole, rest) = s.split_at(whole_len);

    match rest.strip_prefix('.') {
        Some(after_dot) => {
            let frac_len = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            let (fraction, rest) = after_dot.split_at(frac_len);
            (whole, fraction, rest)
        }
        None => (whole, "", rest),
    }
}
