use chrono::NaiveDate;
use regex::Regex;

/// Placeholder for identifier-like segments.
pub const ID_PLACEHOLDER: &str = ":id";
/// Placeholder for calendar-date segments.
pub const DATE_PLACEHOLDER: &str = ":date";

/// Maps literal request paths to route templates.
///
/// Segments are tested against the matchers in a fixed order and the first
/// hit decides the placeholder:
///
/// 1. all digits → `:id`
/// 2. canonical UUID → `:id`
/// 3. hex string (≥ 6 chars, at least one a–f letter) → `:id`
/// 4. valid calendar date `YYYY-MM-DD` → `:date`
/// 5. reference code such as `ORD-2023-001` → `:id`
///
/// Query strings are dropped and empty segments are kept, so
/// `//a/1?x=y` becomes `//a/:id`.
pub struct RouteNormalizer {
    uuid: Regex,
    hex_id: Regex,
    date: Regex,
    reference_code: Regex,
}

impl RouteNormalizer {
    pub fn new() -> Self {
        Self {
            uuid: compile(
                r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            ),
            hex_id: compile(r"^[0-9a-fA-F]{6,}$"),
            date: compile(r"^\d{4}-\d{2}-\d{2}$"),
            reference_code: compile(r"^[A-Z]{3,}-[A-Z0-9]+-[0-9]+$|^[A-Z]{3,}-[0-9]+$"),
        }
    }

    /// Normalize a request path into its route template.
    pub fn normalize(&self, path: &str) -> String {
        let path = path.split_once('?').map_or(path, |(before, _)| before);

        path.split('/')
            .map(|segment| self.placeholder_for(segment).unwrap_or(segment))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Placeholder for a single segment, `None` when it stays verbatim.
    pub fn placeholder_for(&self, segment: &str) -> Option<&'static str> {
        if segment.is_empty() {
            return None;
        }
        if is_numeric_id(segment) || self.is_uuid(segment) || self.is_hex_id(segment) {
            return Some(ID_PLACEHOLDER);
        }
        if self.is_date(segment) {
            return Some(DATE_PLACEHOLDER);
        }
        if self.is_reference_code(segment) {
            return Some(ID_PLACEHOLDER);
        }
        None
    }

    fn is_uuid(&self, segment: &str) -> bool {
        self.uuid.is_match(segment)
    }

    // Pure digit strings are left to `is_numeric_id`.
    fn is_hex_id(&self, segment: &str) -> bool {
        segment.len() >= 6
            && segment.bytes().any(|b| matches!(b, b'a'..=b'f' | b'A'..=b'F'))
            && self.hex_id.is_match(segment)
    }

    fn is_date(&self, segment: &str) -> bool {
        self.date.is_match(segment) && NaiveDate::parse_from_str(segment, "%Y-%m-%d").is_ok()
    }

    fn is_reference_code(&self, segment: &str) -> bool {
        self.reference_code.is_match(segment)
    }
}

impl Default for RouteNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_numeric_id(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in segment pattern must compile")
}
