//! Free-text field parsers: course length, placings, event header and date.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use super::patterns::HEADINGS;
use crate::document::{normalize_ws, HtmlDocument, QueryableDocument};
use crate::types::facts::{EventInfo, PositionFacts};

/// Event name used when the page title does not carry one.
pub const UNKNOWN_EVENT: &str = "Okänd tävling";

/// Inline span the site renders the organizing club in.
pub const ORGANIZER_SELECTOR: &str = "span.organiser, span.organizer";

const MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "mars",
    "april",
    "maj",
    "juni",
    "juli",
    "augusti",
    "september",
    "oktober",
    "november",
    "december",
];

static RE_KM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*km\b").unwrap());
static RE_METERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3}(?:[ \u{a0}]\d{3})+|\d+)\s*m\b").unwrap());
static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").unwrap());

static RE_POS_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\.?\s*\(\s*av\s+(\d+)\s*\)").unwrap());
static RE_POS_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").unwrap());
static RE_POS_AV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\.?\s+av\s+(\d+)").unwrap());
static RE_POS_BARE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.?$").unwrap());

static RE_TITLE_EVENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bför\s+(.+)$").unwrap());
static RE_ORGANIZER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Arrangör(?:sorganisation)?:|Arrangerad av)\s*(?:</?[a-z][^>]*>\s*)*([^<\n]+)")
        .unwrap()
});

static RE_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
static RE_LOCAL_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(\d{{1,2}})\s+({})\s+(\d{{4}})\b", MONTHS.join("|"))).unwrap()
});

/// Parse a course length in meters from free text.
///
/// Tried in order: "4.5 km" / "4,5 km", "4 500 m", then a bare number where
/// values below 100 are taken as kilometers. Returns 0 when nothing parses.
pub fn extract_course_length(text: &str) -> u32 {
    if let Some(km) = RE_KM.captures(text).and_then(|c| parse_decimal(&c[1])) {
        return to_meters(km * 1000.0);
    }

    if let Some(cap) = RE_METERS.captures(text) {
        let digits: String = cap[1].chars().filter(|c| c.is_ascii_digit()).collect();
        if let Ok(meters) = digits.parse::<u32>() {
            return meters;
        }
    }

    if let Some(value) = RE_NUMBER.captures(text).and_then(|c| parse_decimal(&c[1])) {
        return if value < 100.0 {
            to_meters(value * 1000.0)
        } else {
            to_meters(value)
        };
    }

    0
}

/// Parse a placing: "3 (av 25)", "3/25", "3 av 25" or a bare "3".
///
/// For a bare placing the field size is approximated from the result table:
/// `table_rows` minus one header row. Unparsable text yields `{0, 0}`.
pub fn extract_position_facts(text: &str, table_rows: Option<usize>) -> PositionFacts {
    let text = normalize_ws(text);

    for re in [&*RE_POS_PAREN, &*RE_POS_SLASH, &*RE_POS_AV] {
        if let Some(cap) = re.captures(&text) {
            let position = cap[1].parse().unwrap_or(0);
            let total = cap[2].parse().unwrap_or(0);
            return PositionFacts::new(position, total);
        }
    }

    if let Some(cap) = RE_POS_BARE.captures(&text) {
        let position = cap[1].parse().unwrap_or(0);
        let total = table_rows
            .map(|rows| rows.saturating_sub(1))
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        return PositionFacts::new(position, total);
    }

    PositionFacts::default()
}

/// Event name and organizer from the page header.
pub fn extract_event_info(html: &str) -> EventInfo {
    event_info_in(&HtmlDocument::parse(html))
}

/// [`extract_event_info`] over an already parsed document.
pub fn event_info_in<D: QueryableDocument>(document: &D) -> EventInfo {
    let event_name = document
        .select("title")
        .into_iter()
        .next()
        .map(|t| document.text(t))
        .and_then(|title| {
            RE_TITLE_EVENT
                .captures(&title)
                .map(|c| c[1].trim().to_string())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_EVENT.to_string());

    let organizer = document
        .select(ORGANIZER_SELECTOR)
        .into_iter()
        .map(|span| document.text(span))
        .find(|text| !text.is_empty())
        .or_else(|| {
            RE_ORGANIZER
                .captures(document.source())
                .map(|c| normalize_ws(&c[1]))
                .filter(|text| !text.is_empty())
        });

    EventInfo {
        event_name,
        organizer,
    }
}

/// Competition date as `YYYY-MM-DD`, or an empty string.
pub fn extract_date(html: &str) -> String {
    date_in(&HtmlDocument::parse(html))
}

/// [`extract_date`] over an already parsed document.
pub fn date_in<D: QueryableDocument>(document: &D) -> String {
    if let Some(date) = find_date(document.source()) {
        return date;
    }

    // Heading text survives entity and tag splitting that defeats the raw scan.
    document
        .select(HEADINGS)
        .into_iter()
        .find_map(|h| find_date(&document.text(h)))
        .unwrap_or_default()
}

fn find_date(text: &str) -> Option<String> {
    let iso = RE_ISO_DATE.captures_iter(text).find_map(|c| {
        let year = c[1].parse().ok()?;
        let month = c[2].parse().ok()?;
        let day = c[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    });

    let date = iso.or_else(|| {
        RE_LOCAL_DATE.captures_iter(text).find_map(|c| {
            let day = c[1].parse().ok()?;
            let month_name = c[2].to_lowercase();
            let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
            let year = c[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
    })?;

    Some(date.format("%Y-%m-%d").to_string())
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

fn to_meters(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_length() {
        assert_eq!(extract_course_length("4.5 km"), 4500);
        assert_eq!(extract_course_length("4,5 km"), 4500);
        assert_eq!(extract_course_length("4 500 m"), 4500);
        assert_eq!(extract_course_length("3200m"), 3200);
        assert_eq!(extract_course_length("42"), 42000);
        assert_eq!(extract_course_length("2,35"), 2350);
        assert_eq!(extract_course_length("4160"), 4160);
        assert_eq!(extract_course_length("okänd"), 0);
        assert_eq!(extract_course_length(""), 0);
    }

    #[test]
    fn test_position_patterns() {
        assert_eq!(extract_position_facts("3 (av 25)", None), PositionFacts::new(3, 25));
        assert_eq!(extract_position_facts("3/25", None), PositionFacts::new(3, 25));
        assert_eq!(extract_position_facts("3 av 25", None), PositionFacts::new(3, 25));
        assert_eq!(extract_position_facts("3.", None), PositionFacts::new(3, 0));
    }

    #[test]
    fn test_bare_position_uses_table_rows() {
        assert_eq!(extract_position_facts("7", Some(31)), PositionFacts::new(7, 30));
        assert_eq!(extract_position_facts("1", Some(0)), PositionFacts::new(1, 0));
    }

    #[test]
    fn test_unparsable_position() {
        assert_eq!(extract_position_facts("Ej start", Some(10)), PositionFacts::default());
        assert_eq!(extract_position_facts("", None), PositionFacts::default());
    }

    #[test]
    fn test_event_info_from_title_and_span() {
        let html = r#"<html><head><title>Resultat för Höstkavlen 2023</title></head>
            <body><span class="organiser">OK Linné</span></body></html>"#;
        let info = extract_event_info(html);
        assert_eq!(info.event_name, "Höstkavlen 2023");
        assert_eq!(info.organizer.as_deref(), Some("OK Linné"));
    }

    #[test]
    fn test_event_info_fallbacks() {
        let html = "<html><head><title>Eventor</title></head>\
                    <body><p><b>Arrangörsorganisation:</b> IFK Göteborg Orientering\n</p></body></html>";
        let info = extract_event_info(html);
        assert_eq!(info.event_name, UNKNOWN_EVENT);
        assert_eq!(info.organizer.as_deref(), Some("IFK Göteborg Orientering"));

        let html = "<p>Arrangerad av Järla Orientering</p>";
        assert_eq!(
            extract_event_info(html).organizer.as_deref(),
            Some("Järla Orientering")
        );

        assert_eq!(extract_event_info("<p>x</p>").organizer, None);
    }

    #[test]
    fn test_date_iso_first() {
        let html = "<h1>12 maj 2023</h1><p>Datum: 2023-05-13</p>";
        assert_eq!(extract_date(html), "2023-05-13");
    }

    #[test]
    fn test_date_localized() {
        assert_eq!(extract_date("<p>Söndag 3 September 2023</p>"), "2023-09-03");
        assert_eq!(extract_date("<p>31 februari 2023</p>"), "");
    }

    #[test]
    fn test_date_in_heading_text() {
        let html = "<h2>Tävlingsdag <b>5</b>&nbsp;maj 2024</h2>";
        assert_eq!(extract_date(html), "2024-05-05");
    }

    #[test]
    fn test_no_date() {
        assert_eq!(extract_date("<p>Inga datum här</p>"), "");
    }
}
