// src/core/report/mod.rs

//! Turns a `ScanResult` into a paginated document.
//!
//! Layout happens here, independent of any output format: pages are A4,
//! positions are millimetres from the top edge, and a line that would cross
//! the bottom margin starts a new page. `pdf` serializes the laid-out
//! document and `store` persists it.

pub mod pdf;
pub mod store;

use chrono::Local;
use serde_json::Value;

use crate::core::models::ScanResult;
use crate::core::scanner::TIMESTAMP_FORMAT;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const BOTTOM_MARGIN_MM: f32 = 15.0;
pub const ITEM_INDENT_MM: f32 = 5.0;

/// Text shown centered at the top of every page.
pub const REPORT_TITLE: &str = "PandaScanPro Security Report";

/// Characters per body line before wrapping.
const WRAP_COLUMNS: usize = 90;

const PAGE_HEADER_HEIGHT: f32 = 10.0;
const PAGE_HEADER_GAP: f32 = 5.0;
const TITLE_HEIGHT: f32 = 15.0;
const HEADING_HEIGHT: f32 = 10.0;
const BODY_HEIGHT: f32 = 8.0;
const SECTION_GAP: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    PageHeader,
    PageFooter,
    Title,
    Heading,
    Body,
    Item,
}

impl LineStyle {
    /// Font size in points.
    pub fn font_size(&self) -> f32 {
        match self {
            LineStyle::PageHeader => 18.0,
            LineStyle::PageFooter => 8.0,
            LineStyle::Title => 24.0,
            LineStyle::Heading => 16.0,
            LineStyle::Body | LineStyle::Item => 12.0,
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, LineStyle::PageHeader | LineStyle::Title | LineStyle::Heading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub style: LineStyle,
    pub align: Align,
    pub indent_mm: f32,
    /// Top of the line's cell, from the top edge of the page.
    pub y_mm: f32,
    pub height_mm: f32,
    /// Set on the wrapped tail of a longer entry.
    pub continuation: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub header: Line,
    pub footer: Line,
    pub lines: Vec<Line>,
}

impl Page {
    fn new(number: usize) -> Self {
        Self {
            number,
            header: Line {
                text: REPORT_TITLE.to_string(),
                style: LineStyle::PageHeader,
                align: Align::Center,
                indent_mm: 0.0,
                y_mm: MARGIN_MM,
                height_mm: PAGE_HEADER_HEIGHT,
                continuation: false,
            },
            footer: Line {
                text: format!("Page {number}"),
                style: LineStyle::PageFooter,
                align: Align::Center,
                indent_mm: 0.0,
                y_mm: PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM,
                height_mm: PAGE_HEADER_HEIGHT,
                continuation: false,
            },
            lines: Vec::new(),
        }
    }
}

/// A laid-out report, ready to be serialized. Immutable once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub target_url: String,
    pub generated_at: String,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    /// Every body line, across pages, in order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.pages.iter().flat_map(|p| p.lines.iter())
    }

    pub fn headings(&self) -> Vec<&str> {
        self.lines().filter(|l| l.style == LineStyle::Heading).map(|l| l.text.as_str()).collect()
    }
}

/// Tracks the write position and breaks pages.
struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        let mut cursor = Self { pages: Vec::new(), y: 0.0 };
        cursor.add_page();
        cursor
    }

    fn add_page(&mut self) {
        self.pages.push(Page::new(self.pages.len() + 1));
        self.y = MARGIN_MM + PAGE_HEADER_HEIGHT + PAGE_HEADER_GAP;
    }

    fn push(&mut self, text: String, style: LineStyle, align: Align, indent_mm: f32, height_mm: f32, continuation: bool) {
        if self.y + height_mm > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            self.add_page();
        }
        let y_mm = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(Line { text, style, align, indent_mm, y_mm, height_mm, continuation });
        }
        self.y += height_mm;
    }

    /// Wraps `text` and writes each piece; pieces after the first are continuations.
    fn push_wrapped(&mut self, text: &str, style: LineStyle, indent_mm: f32) {
        for (i, piece) in wrap(text, WRAP_COLUMNS).into_iter().enumerate() {
            self.push(piece, style, Align::Left, indent_mm, BODY_HEIGHT, i > 0);
        }
    }

    fn gap(&mut self, height_mm: f32) {
        self.y += height_mm;
    }
}

/// Lays out `result` with the current local time as the generation stamp.
pub fn assemble(result: &ScanResult, target_url: &str) -> ReportDocument {
    assemble_at(result, target_url, &Local::now().format(TIMESTAMP_FORMAT).to_string())
}

/// Lays out `result`. Sections render by the shape of their value: objects
/// as `- key: value` lines, arrays as `- item` lines, anything else as a
/// wrapped block.
pub fn assemble_at(result: &ScanResult, target_url: &str, generated_at: &str) -> ReportDocument {
    let mut cursor = Cursor::new();

    cursor.push(format!("Security Report for {target_url}"), LineStyle::Title, Align::Center, 0.0, TITLE_HEIGHT, false);
    cursor.push_wrapped(&format!("Report generated on {generated_at}"), LineStyle::Body, 0.0);
    cursor.gap(BODY_HEIGHT);

    for (section, value) in result.sections() {
        cursor.push(section.heading(), LineStyle::Heading, Align::Left, 0.0, HEADING_HEIGHT, false);
        match value {
            Value::Object(map) => {
                for (key, v) in map {
                    cursor.push_wrapped(&format!("- {}: {}", key, display_value(v)), LineStyle::Item, ITEM_INDENT_MM);
                }
            }
            Value::Array(items) => {
                for item in items {
                    cursor.push_wrapped(&format!("- {}", display_value(item)), LineStyle::Item, ITEM_INDENT_MM);
                }
            }
            scalar => cursor.push_wrapped(&display_value(scalar), LineStyle::Body, 0.0),
        }
        cursor.gap(SECTION_GAP);
    }

    ReportDocument {
        target_url: target_url.to_string(),
        generated_at: generated_at.to_string(),
        pages: cursor.pages,
    }
}

/// Strings print bare; everything else prints as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Wraps at whitespace when a break falls in the second half of the line,
/// otherwise splits hard at `width`, so long JSON values fill their lines.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let mut rest: Vec<char> = raw_line.trim_end().chars().collect();
        loop {
            if rest.len() <= width {
                lines.push(rest.iter().collect());
                break;
            }
            let cut = rest[..=width]
                .iter()
                .rposition(|c| c.is_whitespace())
                .filter(|i| *i >= width / 2);
            let (head_end, tail_start) = match cut {
                Some(i) => (i, i + 1),
                None => (width, width),
            };
            let head: String = rest[..head_end].iter().collect();
            lines.push(head.trim_end().to_string());
            rest = rest[tail_start..].iter().copied().skip_while(|c| c.is_whitespace()).collect();
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Section;
    use crate::core::scanner::headers_scanner::grade_pairs;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn headers_only() -> ScanResult {
        let finding = grade_pairs([("Strict-Transport-Security", "max-age=31536000")]);
        ScanResult::new(
            "https://example.com",
            vec![(Section::Headers, serde_json::to_value(finding).unwrap())],
            "2024-05-01 12:00:00",
        )
    }

    #[test]
    fn headers_only_report_has_title_timestamp_and_one_section() {
        let doc = assemble_at(&headers_only(), "https://example.com", "2024-05-01 12:00:01");

        assert_eq!(doc.pages.len(), 1);
        let page = &doc.pages[0];
        assert_eq!(page.header.text, REPORT_TITLE);
        assert_eq!(page.footer.text, "Page 1");
        assert_eq!(page.lines[0].text, "Security Report for https://example.com");
        assert_eq!(page.lines[0].style, LineStyle::Title);
        assert_eq!(page.lines[1].text, "Report generated on 2024-05-01 12:00:01");
        assert_eq!(doc.headings(), ["Headers"]);
    }

    #[test]
    fn mapping_sections_render_one_entry_per_key() {
        let doc = assemble_at(&headers_only(), "https://example.com", "now");
        let entries: Vec<&str> = doc
            .lines()
            .filter(|l| l.style == LineStyle::Item && !l.continuation)
            .map(|l| l.text.as_str())
            .collect();

        assert_eq!(entries.len(), 9);
        assert_eq!(entries[0], "- status: success");
        assert_eq!(entries[1], r#"- found_headers: {"Strict-Transport-Security":"max-age=31536000"}"#);
        assert!(entries[2].starts_with(r#"- missing_headers: ["Content-Security-Policy","#));
        assert_eq!(entries[5], "- security_grade: C");
        assert!(doc.lines().filter(|l| l.style == LineStyle::Item).all(|l| l.indent_mm == ITEM_INDENT_MM));
    }

    #[test]
    fn arrays_and_scalars_follow_their_own_rules() {
        let result = ScanResult::new(
            "https://example.com",
            vec![
                (Section::Subdomains, json!(["api.example.com", "mail.example.com"])),
                (Section::Geoip, json!("unresolved")),
            ],
            "t",
        );
        let doc = assemble_at(&result, "https://example.com", "t");
        let texts: Vec<&str> = doc.lines().map(|l| l.text.as_str()).collect();

        assert_eq!(
            &texts[2..],
            ["Subdomains", "- api.example.com", "- mail.example.com", "Geoip", "unresolved"]
        );
        assert_eq!(doc.headings(), ["Subdomains", "Geoip"]);
    }

    #[test]
    fn timestamp_is_not_a_section() {
        let doc = assemble_at(&headers_only(), "https://example.com", "t");
        assert!(!doc.headings().iter().any(|h| h.eq_ignore_ascii_case("timestamp")));
    }

    #[test]
    fn long_content_breaks_pages_above_the_bottom_margin() {
        let many: Vec<String> = (0..80).map(|i| format!("host{i}.example.com")).collect();
        let result = ScanResult::new("https://example.com", vec![(Section::Subdomains, json!(many))], "t");
        let doc = assemble_at(&result, "https://example.com", "t");

        assert!(doc.pages.len() >= 3);
        for (i, page) in doc.pages.iter().enumerate() {
            assert_eq!(page.number, i + 1);
            assert_eq!(page.footer.text, format!("Page {}", i + 1));
            assert_eq!(page.header.text, REPORT_TITLE);
            for line in &page.lines {
                assert!(line.y_mm + line.height_mm <= PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM);
            }
        }
        let items = doc.lines().filter(|l| l.style == LineStyle::Item).count();
        assert_eq!(items, 80);
    }

    #[test]
    fn long_values_wrap_into_continuations() {
        let csp = "default-src 'self'; ".repeat(12);
        let result = ScanResult::new("u", vec![(Section::Headers, json!({ "csp": csp }))], "t");
        let doc = assemble_at(&result, "u", "t");
        let items: Vec<&Line> = doc.lines().filter(|l| l.style == LineStyle::Item).collect();

        assert!(items.len() > 1);
        assert!(!items[0].continuation);
        assert!(items[1..].iter().all(|l| l.continuation));
        assert!(items.iter().all(|l| l.text.chars().count() <= WRAP_COLUMNS));
    }

    #[test]
    fn wrap_splits_oversized_words() {
        let word = "x".repeat(25);
        assert_eq!(wrap(&word, 10), ["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
        assert_eq!(wrap("", 10), [""]);
        assert_eq!(wrap("a b c", 3), ["a b", "c"]);
    }
}
