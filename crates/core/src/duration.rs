//! Duration text in the form the MySQL driver DSN expects (`10s`, `500ms`,
//! `1h30m`, `1.5s`).

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration {input:?}: {reason}")]
pub struct DurationError {
    pub input: String,
    pub reason: &'static str,
}

impl DurationError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(NANOS_PER_MIN),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parse a non-negative duration such as `30s`, `250ms` or `1h15m`.
///
/// A bare `0` is accepted; every other value needs a unit suffix.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::new(input, "empty"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.starts_with('-') {
        return Err(DurationError::new(input, "negative"));
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationError::new(input, "expected a number"));
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];
        if unit.is_empty() {
            return Err(DurationError::new(input, "missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::new(input, "unknown unit"))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| DurationError::new(input, "overflow"))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| DurationError::new(input, "overflow"))?;

        // Fractional digits beyond nanosecond precision are dropped.
        let mut place = scale;
        for digit in frac_part.bytes() {
            place /= 10;
            if place == 0 {
                break;
            }
            nanos = nanos
                .checked_add(u128::from(digit - b'0') * place)
                .ok_or_else(|| DurationError::new(input, "overflow"))?;
        }

        total = total
            .checked_add(nanos)
            .ok_or_else(|| DurationError::new(input, "overflow"))?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| DurationError::new(input, "overflow"))?;
    // Remainder is always below one second.
    let subsec = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, subsec))
}

fn with_fraction(whole: u128, frac: u128, digits: usize) -> String {
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0digits$}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Render a duration the way the driver prints one: `0s`, `750ms`, `10s`,
/// `1h0m0s`.
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!(
            "{}µs",
            with_fraction(nanos / NANOS_PER_MICRO, nanos % NANOS_PER_MICRO, 3)
        );
    }
    if nanos < NANOS_PER_SEC {
        return format!(
            "{}ms",
            with_fraction(nanos / NANOS_PER_MILLI, nanos % NANOS_PER_MILLI, 6)
        );
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let secs = with_fraction(
        (nanos % NANOS_PER_MIN) / NANOS_PER_SEC,
        nanos % NANOS_PER_SEC,
        9,
    );
    if hours > 0 {
        format!("{hours}h{minutes}m{secs}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs}s")
    } else {
        format!("{secs}s")
    }
}
