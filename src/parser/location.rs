//! Free-text address decomposition
//!
//! Geocoder output and power-notice addresses arrive as one string
//! (`台北市大安區羅斯福路四段1號`). A single ordered-capture pattern splits
//! it into city / district / road-section / detail; text the pattern cannot
//! place at all yields the [`AddressParts::unknown`] sentinel so callers keep
//! running with "location unknown" instead of failing.

use std::sync::LazyLock;

use regex::Regex;

/// Sentinel stored when the address pattern finds nothing. Distinguishable
/// from a genuine empty capture (an address with no district parses to "").
pub const UNKNOWN: &str = "null";

/// Optional house-number digits and 台灣 prefix, then `…市`, optional `…區`,
/// optional road/street/avenue/bridge token with an optional Arabic-or-CJK
/// numbered `段`, then everything remaining.
static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "(?:\\d*)?(?:台灣)?(.*?市)((?:.*?區)?)((?:.*?(?:路|街|大道|橋)(?:[一二三四五六七八九十\\d]*?段)?)?)(.*)",
    )
    .unwrap()
});

/// Cause clause of a water notice: the segment between the time-range clause
/// and the next full-width comma.
static OUTAGE_CAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?:.*時|.*分)(?:，)(.*)(?:，)").unwrap());

/// Decomposed address fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParts {
    pub city: String,
    pub district: String,
    pub road: String,
    pub detail: String,
}

impl AddressParts {
    /// The "location unknown" sentinel
    pub fn unknown() -> Self {
        Self {
            city: UNKNOWN.to_string(),
            district: UNKNOWN.to_string(),
            road: UNKNOWN.to_string(),
            detail: UNKNOWN.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.city == UNKNOWN
    }
}

/// Split a free-text address into {city, district, road/section, detail}.
///
/// Never fails: text without a recognizable `…市` anchor returns the
/// sentinel, which callers must treat as unusable rather than as a value.
pub fn parse_address(text: &str) -> AddressParts {
    match ADDRESS.captures(text) {
        Some(caps) => AddressParts {
            city: caps[1].to_string(),
            district: caps[2].to_string(),
            road: caps[3].to_string(),
            detail: caps[4].to_string(),
        },
        None => AddressParts::unknown(),
    }
}

/// Extract the human-readable cause from a water-outage description.
///
/// The upstream feed embeds the cause in the same sentence as the time range
/// (`…上午9時至下午6時，辦理送水管汰換工程，停水區域…`); this picks out the
/// clause after the times.
pub fn parse_outage_cause(text: &str) -> Option<String> {
    OUTAGE_CAUSE
        .captures(text)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_address() {
        let parts = parse_address("台北市大安區羅斯福路四段1號");
        assert_eq!(parts.city, "台北市");
        assert_eq!(parts.district, "大安區");
        assert_eq!(parts.road, "羅斯福路四段");
        assert_eq!(parts.detail, "1號");
    }

    #[test]
    fn test_country_prefix_and_house_number_stripped() {
        let parts = parse_address("106台灣台北市大安區和平東路二段96巷");
        assert_eq!(parts.city, "台北市");
        assert_eq!(parts.district, "大安區");
        assert_eq!(parts.road, "和平東路二段");
        assert_eq!(parts.detail, "96巷");
    }

    #[test]
    fn test_street_and_avenue_tokens() {
        let parts = parse_address("台北市萬華區艋舺大道120號");
        assert_eq!(parts.road, "艋舺大道");

        let parts = parse_address("台北市中山區林森北路");
        assert_eq!(parts.district, "中山區");
        assert_eq!(parts.road, "林森北路");
        assert_eq!(parts.detail, "");
    }

    #[test]
    fn test_missing_district_is_empty_not_sentinel() {
        let parts = parse_address("台北市羅斯福路四段1號");
        assert_eq!(parts.city, "台北市");
        assert_eq!(parts.district, "");
        assert_eq!(parts.road, "羅斯福路四段");
        assert!(!parts.is_unknown());
    }

    #[test]
    fn test_unmatched_text_returns_sentinel() {
        let parts = parse_address("somewhere else entirely");
        assert_eq!(parts, AddressParts::unknown());
        assert!(parts.is_unknown());

        assert!(parse_address("").is_unknown());
    }

    #[test]
    fn test_outage_cause_extraction() {
        let text = "自上午9時至下午6時，辦理送水管汰換工程，停水區域如下";
        assert_eq!(
            parse_outage_cause(text).as_deref(),
            Some("辦理送水管汰換工程")
        );
    }

    #[test]
    fn test_outage_cause_absent() {
        assert_eq!(parse_outage_cause("全區正常供水"), None);
        assert_eq!(parse_outage_cause(""), None);
    }
}
