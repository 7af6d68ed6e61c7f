//! Input rows and their enriched counterparts.

use serde::{Deserialize, Deserializer, Serialize};

/// One spreadsheet record: a single athlete's result in one event class.
///
/// Produced by the input collaborator and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRow {
    /// Competition id on the results site. Spreadsheets hand this over as
    /// either a number or a string.
    #[serde(deserialize_with = "string_or_number")]
    pub event_id: String,

    #[serde(rename = "class", default)]
    pub class_name: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub organizer: String,

    #[serde(default)]
    pub position: u32,

    /// Running time, "MM:SS" or "HH:MM:SS"
    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub time_after_winner: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<bool>,
}

impl SourceRow {
    /// Create a row with the required event id and class.
    pub fn new(event_id: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }
}

/// A [`SourceRow`] plus the facts derived from the results page.
///
/// `length` and `total_participants` use 0 for "not determined", never for a
/// parsed zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedResult {
    pub event_id: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub name: String,
    pub date: String,
    pub organizer: String,
    pub event_name: String,
    pub position: u32,
    pub time: String,
    pub time_after_winner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<bool>,

    /// Course length in meters, 0 = unknown
    pub length: u32,
    /// Starters in the class, 0 = unknown
    pub total_participants: u32,
    pub time_in_seconds: u32,
}

impl EnrichedResult {
    /// Normalize a source row: derive `time_in_seconds`, trim text fields and
    /// zero the enrichment.
    pub fn from_row(row: &SourceRow) -> Self {
        Self {
            event_id: row.event_id.trim().to_string(),
            class_name: row.class_name.trim().to_string(),
            name: row.name.trim().to_string(),
            date: row.date.trim().to_string(),
            organizer: row.organizer.trim().to_string(),
            event_name: String::new(),
            position: row.position,
            time: row.time.trim().to_string(),
            time_after_winner: row.time_after_winner.trim().to_string(),
            event_type: row.event_type.clone(),
            person_id: row.person_id.clone(),
            birth_year: row.birth_year,
            started: row.started,
            length: 0,
            total_participants: 0,
            time_in_seconds: time_to_seconds(&row.time),
        }
    }

    /// Whether both course length and starter count were determined.
    pub fn is_fully_enriched(&self) -> bool {
        self.length > 0 && self.total_participants > 0
    }
}

/// Convert "MM:SS" or "HH:MM:SS" to seconds. Anything else yields 0.
pub fn time_to_seconds(time: &str) -> u32 {
    let parts: Option<Vec<u32>> = time
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u32>().ok())
        .collect();

    match parts.as_deref() {
        Some([h, m, s]) => h
            .saturating_mul(3600)
            .saturating_add(m.saturating_mul(60))
            .saturating_add(*s),
        Some([m, s]) => m.saturating_mul(60).saturating_add(*s),
        _ => 0,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) if f.fract() == 0.0 => format!("{}", f as i64),
        Raw::Float(f) => f.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_to_seconds() {
        assert_eq!(time_to_seconds("05:30"), 330);
        assert_eq!(time_to_seconds("1:05:30"), 3930);
        assert_eq!(time_to_seconds(""), 0);
        assert_eq!(time_to_seconds("abc"), 0);
        assert_eq!(time_to_seconds("12"), 0);
        assert_eq!(time_to_seconds("1:2:3:4"), 0);
    }

    #[test]
    fn test_event_id_accepts_numbers() {
        let row: SourceRow =
            serde_json::from_str(r#"{"eventId": 41234, "class": "H21"}"#).unwrap();
        assert_eq!(row.event_id, "41234");
        assert_eq!(row.class_name, "H21");

        let row: SourceRow = serde_json::from_str(r#"{"eventId": "987"}"#).unwrap();
        assert_eq!(row.event_id, "987");
        assert_eq!(row.class_name, "");
    }

    #[test]
    fn test_missing_event_id_is_rejected() {
        let parsed: std::result::Result<SourceRow, _> =
            serde_json::from_str(r#"{"class": "H21"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_from_row_normalizes() {
        let row = SourceRow::new(" 100 ", "D16 ")
            .with_name("Anna Andersson")
            .with_time("45:10");
        let enriched = EnrichedResult::from_row(&row);

        assert_eq!(enriched.event_id, "100");
        assert_eq!(enriched.class_name, "D16");
        assert_eq!(enriched.time_in_seconds, 2710);
        assert_eq!(enriched.length, 0);
        assert_eq!(enriched.total_participants, 0);
        assert!(!enriched.is_fully_enriched());
    }
}
