// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `xs:duration` subset used by WS-Eventing `Expires`.
//!
//! Accepts `PnDTnHnMnS` with optional fractional seconds. Year and month
//! components have no fixed length and are rejected, as is a leading `-`.

use std::time::Duration;

/// Parse an `xs:duration`. Returns `None` for anything outside the subset.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let rest = text.trim().strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => {
            if t.is_empty() {
                return None;
            }
            (d, Some(t))
        }
        None => (rest, None),
    };

    let mut total = Duration::ZERO;

    if !date_part.is_empty() {
        let days = date_part.strip_suffix('D')?;
        let days: u64 = parse_digits(days)?;
        total += Duration::from_secs(days.checked_mul(86_400)?);
    }

    if let Some(mut t) = time_part {
        let mut last_rank = 0u8;
        while !t.is_empty() {
            let idx = t.find(|c: char| c.is_ascii_alphabetic())?;
            let (number, unit) = t.split_at(idx);
            let rank = match &unit[..1] {
                "H" => 1,
                "M" => 2,
                "S" => 3,
                _ => return None,
            };
            if rank <= last_rank {
                return None;
            }
            last_rank = rank;
            let component = match rank {
                1 => Duration::from_secs(parse_digits(number)?.checked_mul(3_600)?),
                2 => Duration::from_secs(parse_digits(number)?.checked_mul(60)?),
                _ => parse_seconds(number)?,
            };
            total = total.checked_add(component)?;
            t = &unit[1..];
        }
    }

    Some(total)
}

/// Format a duration as `PT<seconds>S` (fractions kept to milliseconds).
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.subsec_millis();
    if millis == 0 {
        format!("PT{}S", duration.as_secs())
    } else {
        format!("PT{}.{:03}S", duration.as_secs(), millis)
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_seconds(s: &str) -> Option<Duration> {
    match s.split_once('.') {
        Some((whole, frac)) => {
            let secs = parse_digits(whole)?;
            if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let mut nanos: u32 = 0;
            for (i, b) in frac.bytes().take(9).enumerate() {
                nanos += u32::from(b - b'0') * 10u32.pow(8 - i as u32);
            }
            Some(Duration::new(secs, nanos))
        }
        None => Some(Duration::from_secs(parse_digits(s)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_forms() {
        assert_eq!(parse_duration("PT60S"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration("PT1H"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("PT1H30M"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("P1D"), Some(Duration::from_secs(86_400)));
        assert_eq!(
            parse_duration("P1DT2H3M4.5S"),
            Some(Duration::from_millis(93_784_500))
        );
        assert_eq!(parse_duration(" PT0S "), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_rejects_unsupported() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("P"), None);
        assert_eq!(parse_duration("PT"), None);
        assert_eq!(parse_duration("-PT5S"), None);
        assert_eq!(parse_duration("P1Y"), None);
        assert_eq!(parse_duration("PT5M1H"), None);
        assert_eq!(parse_duration("PTS"), None);
        assert_eq!(parse_duration("2026-10-19T10:00:00Z"), None);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_duration(Duration::from_secs(3600)), "PT3600S");
        assert_eq!(format_duration(Duration::from_millis(1500)), "PT1.500S");
    }
}
