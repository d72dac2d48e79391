use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::University;

/// Inclusive span of days a crime log covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Document-wide facts about one crime log.
///
/// Lives for the whole parse of a document, unlike `Crime` which is replaced
/// after every incident.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub university: Option<University>,
    /// Name of the file or feed the tokens came from
    pub source: Option<String>,
    pub parsed_on: Option<NaiveDateTime>,
    pub parse_success: bool,
    range: Option<DateRange>,
    /// Page footers seen so far
    pub pages: u32,
    pub crimes_count: u32,
}

impl Report {
    pub fn new(university: Option<University>, source: Option<String>) -> Self {
        Self {
            university,
            source,
            ..Self::default()
        }
    }

    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    /// Record the covered date range. The first range written wins; later
    /// calls leave it untouched and return false.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) -> bool {
        if self.range.is_some() {
            return false;
        }
        self.range = Some(DateRange { start, end });
        true
    }
}
