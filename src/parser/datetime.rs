//! Republic-era dates and free-text civic time ranges
//!
//! Upstream notices write dates in the ROC calendar (`1090101` = 2020-01-01)
//! and times as day-part-qualified hours (`下午5時30分`). The patterns here
//! are compiled once into process-wide statics.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::error::ParseError;

static ROC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3})(\d{2})(\d{2})$").unwrap());

/// Day-part qualifier, hour, optional minute, separator, second triple.
/// Searched (not anchored): the first start/end pair anywhere in the text
/// wins, because water and road notices bury the range inside a sentence.
static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "(上午|下午|中午|傍晚|晚上|晚間|凌晨|翌日)?(\\d+時?)(\\d+分?)?(?:至|-).*?(上午|下午|中午|傍晚|晚上|晚間|凌晨|翌日)?(\\d+時?)(\\d+分?)?",
    )
    .unwrap()
});

/// Convert a 7-digit ROC date token (`YYYMMDD`) to a Gregorian date.
///
/// # Errors
///
/// Returns `ParseError::InvalidRocDate` when the token is not exactly seven
/// digits, and `ParseError::DateOutOfRange` when the digits do not form a
/// calendar date.
pub fn roc_to_date(token: &str) -> Result<NaiveDate, ParseError> {
    let caps = ROC_DATE
        .captures(token)
        .ok_or_else(|| ParseError::InvalidRocDate(token.to_string()))?;

    // Captures are all-digit by construction
    let year: i32 = caps[1].parse::<i32>().unwrap() + 1911;
    let month: u32 = caps[2].parse().unwrap();
    let day: u32 = caps[3].parse().unwrap();

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(ParseError::DateOutOfRange { year, month, day })
}

/// Extract a (start, end) time pair from free text.
///
/// Returns `(None, None)` when no range is found; a degraded notice keeps
/// flowing through the pipeline without its times.
pub fn parse_time_range(text: &str) -> (Option<NaiveTime>, Option<NaiveTime>) {
    if text.is_empty() {
        return (None, None);
    }

    // Notices occasionally write `10:30` instead of `10時30分`.
    let normalized = text.replace(':', "時");

    match TIME_RANGE.captures(&normalized) {
        Some(caps) => {
            let start = compose_time(
                caps.get(1).map(|m| m.as_str()),
                caps.get(2).map(|m| m.as_str()).unwrap_or(""),
                caps.get(3).map(|m| m.as_str()),
            );
            let end = compose_time(
                caps.get(4).map(|m| m.as_str()),
                caps.get(5).map(|m| m.as_str()).unwrap_or(""),
                caps.get(6).map(|m| m.as_str()),
            );
            (start, end)
        }
        None => (None, None),
    }
}

/// Build a time of day from a day-part qualifier and hour/minute tokens.
///
/// Afternoon-class qualifiers (下午, 傍晚, 晚上, 晚間) shift the stated hour
/// into the second half of the day, with two boundary exceptions carried over
/// from how civic notices mix 12-hour and 24-hour phrasing:
/// a stated hour of 0 means noon-side 12 and is not shifted again, and
/// 下午12 stays 12 rather than becoming 24. A resulting hour of exactly 24
/// wraps to 0.
pub(crate) fn compose_time(
    prefix: Option<&str>,
    hour: &str,
    minute: Option<&str>,
) -> Option<NaiveTime> {
    let mut h: u32 = hour.trim_end_matches('時').parse().ok()?;
    let m: u32 = match minute {
        Some(tok) if !tok.is_empty() => tok.trim_end_matches('分').parse().ok()?,
        _ => 0,
    };

    if matches!(prefix, Some("下午" | "傍晚" | "晚上" | "晚間")) {
        if h == 0 {
            h = 12;
        } else {
            if prefix == Some("下午") && h == 12 {
                h = 0;
            }
            h += 12;
        }
    }
    if h == 24 {
        h = 0;
    }

    NaiveTime::from_hms_opt(h, m, 0)
}

/// Parse the power archive's `date start~end` working-period triple.
///
/// Exactly three tokens are required; anything else yields `None` so a
/// malformed period degrades instead of aborting the record.
pub fn parse_power_period(text: &str) -> Option<(NaiveDate, NaiveTime, NaiveTime)> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == '~')
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != 3 {
        return None;
    }

    let date = NaiveDate::parse_from_str(&tokens[0].replace('/', "-"), "%Y-%m-%d").ok()?;
    let start = NaiveTime::parse_from_str(&format!("{}:00", tokens[1]), "%H:%M:%S").ok()?;
    let end = NaiveTime::parse_from_str(&format!("{}:00", tokens[2]), "%H:%M:%S").ok()?;
    Some((date, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_roc_to_date() {
        assert_eq!(
            roc_to_date("1090101").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert_eq!(
            roc_to_date("0991231").unwrap(),
            NaiveDate::from_ymd_opt(2010, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_roc_to_date_rejects_malformed_tokens() {
        assert!(matches!(
            roc_to_date("abcdefg"),
            Err(ParseError::InvalidRocDate(_))
        ));
        assert!(roc_to_date("10901011").is_err()); // 8 digits
        assert!(roc_to_date("109011").is_err()); // 6 digits
        assert!(matches!(
            roc_to_date("1091341"),
            Err(ParseError::DateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_time_range_basic() {
        let (s, e) = parse_time_range("上午10時至下午5時30分");
        assert_eq!(s, Some(t(10, 0)));
        assert_eq!(e, Some(t(17, 30)));
    }

    #[test]
    fn test_parse_time_range_embedded_in_sentence() {
        let (s, e) = parse_time_range("自上午9時至下午6時30分，辦理送水管汰換工程，停水區域如下");
        assert_eq!(s, Some(t(9, 0)));
        assert_eq!(e, Some(t(18, 30)));
    }

    #[test]
    fn test_parse_time_range_colon_form() {
        let (s, e) = parse_time_range("10:30-12:00");
        assert_eq!(s, Some(t(10, 30)));
        assert_eq!(e, Some(t(12, 0)));
    }

    #[test]
    fn test_parse_time_range_no_match() {
        assert_eq!(parse_time_range("全日施工"), (None, None));
        assert_eq!(parse_time_range(""), (None, None));
    }

    #[test]
    fn test_afternoon_boundary_law() {
        // h=0 and h=12 are both fixed points mapping to 12.
        let (s, _) = parse_time_range("下午0時至下午3時");
        assert_eq!(s, Some(t(12, 0)));

        let (s, e) = parse_time_range("下午12時至下午5時");
        assert_eq!(s, Some(t(12, 0)));
        assert_eq!(e, Some(t(17, 0)));

        // All afternoon-class hours in 1..=11 land in 13..=23.
        for h in 1u32..=11 {
            let got = compose_time(Some("晚上"), &format!("{h}時"), None).unwrap();
            assert_eq!(got, t(h + 12, 0));
        }
    }

    #[test]
    fn test_evening_twelve_wraps_to_midnight() {
        // 晚上12 is not the 下午 exception: 12 + 12 = 24 wraps to 0.
        let (s, e) = parse_time_range("晚上12時至凌晨2時");
        assert_eq!(s, Some(t(0, 0)));
        assert_eq!(e, Some(t(2, 0)));
    }

    #[test]
    fn test_morning_hours_unshifted() {
        let (s, e) = parse_time_range("凌晨3時至上午11時45分");
        assert_eq!(s, Some(t(3, 0)));
        assert_eq!(e, Some(t(11, 45)));
    }

    #[test]
    fn test_parse_power_period() {
        let (d, s, e) = parse_power_period("2020/03/15 08:30~17:00").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2020, 3, 15).unwrap());
        assert_eq!(s, t(8, 30));
        assert_eq!(e, t(17, 0));
    }

    #[test]
    fn test_parse_power_period_wrong_arity() {
        assert!(parse_power_period("2020/03/15 08:30").is_none());
        assert!(parse_power_period("無").is_none());
        assert!(parse_power_period("").is_none());
    }
}
