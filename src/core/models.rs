// src/core/models.rs

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// --- Sections ---

/// The categories a scan reports on, in the order they appear in results and reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    AsRefStr, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    Headers,
    SqlInjection,
    Xss,
    Directories,
    Ports,
    Subdomains,
    Geoip,
}

impl Section {
    /// Report heading: underscores become spaces, each word is capitalized.
    pub fn heading(&self) -> String {
        title_case(self.as_ref())
    }
}

/// `sql_injection` -> `Sql Injection`.
pub fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// --- Header Scanner Models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

/// Outcome of grading one response's security headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderFinding {
    pub status: &'static str,
    /// Canonical header name to observed value, in the fixed header order.
    pub found_headers: Map<String, Value>,
    pub missing_headers: Vec<String>,
    pub server_info: String,
    pub powered_by: String,
    pub security_grade: Grade,
    pub score: u8,
    pub grade_explanation: String,
    pub recommendations: Vec<String>,
}

/// The error record that stands in for a section whose check could not run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionFailure {
    pub status: String,
    pub message: String,
}

impl SectionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: "error".to_string(), message: message.into() }
    }
}

/// A finding provider's output. Always carries `status`; everything else is
/// provider-specific and passed through as-is.
pub type FindingRecord = Value;

// --- Main Report ---

/// The aggregate of one scan: sections in fixed order plus when it ran.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub target: String,
    sections: Vec<(Section, Value)>,
    pub timestamp: String,
}

impl ScanResult {
    /// Sorts `sections` into the fixed section order; a repeated section keeps
    /// its first value.
    pub fn new(target: impl Into<String>, mut sections: Vec<(Section, Value)>, timestamp: impl Into<String>) -> Self {
        sections.sort_by_key(|(section, _)| *section);
        sections.dedup_by_key(|(section, _)| *section);
        Self { target: target.into(), sections, timestamp: timestamp.into() }
    }

    pub fn sections(&self) -> impl Iterator<Item = (Section, &Value)> {
        self.sections.iter().map(|(s, v)| (*s, v))
    }

    pub fn section(&self, section: Section) -> Option<&Value> {
        self.sections.iter().find(|(s, _)| *s == section).map(|(_, v)| v)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 1))?;
        for (section, value) in &self.sections {
            map.serialize_entry(section.as_ref(), value)?;
        }
        map.serialize_entry("timestamp", &self.timestamp)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn section_keys_and_headings() {
        let keys: Vec<String> = Section::iter().map(|s| s.to_string()).collect();
        assert_eq!(keys, ["headers", "sql_injection", "xss", "directories", "ports", "subdomains", "geoip"]);
        assert_eq!(Section::SqlInjection.heading(), "Sql Injection");
        assert_eq!(Section::Geoip.heading(), "Geoip");
        assert_eq!("ports".parse::<Section>().unwrap(), Section::Ports);
    }

    #[test]
    fn title_case_lowercases_the_tail() {
        assert_eq!(title_case("found_HEADERS"), "Found Headers");
        assert_eq!(title_case("__a__b"), "A B");
    }

    #[test]
    fn scan_result_orders_sections_and_appends_timestamp() {
        let result = ScanResult::new(
            "https://example.com",
            vec![
                (Section::Geoip, json!({"status": "secure"})),
                (Section::Headers, json!({"status": "success"})),
                (Section::Xss, json!({"status": "secure"})),
            ],
            "2024-01-01 00:00:00",
        );

        let serialized = serde_json::to_value(&result).unwrap();
        let keys: Vec<&String> = serialized.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["headers", "xss", "geoip", "timestamp"]);
        assert_eq!(result.section(Section::Xss), Some(&json!({"status": "secure"})));
        assert_eq!(result.section(Section::Ports), None);
    }

    #[test]
    fn section_failure_shape() {
        let value = serde_json::to_value(SectionFailure::new("timed out")).unwrap();
        assert_eq!(value, json!({"status": "error", "message": "timed out"}));
    }
}
