//! Drexel University crime log extractor.
//!
//! The log is a paginated table flattened to one field per cell. Every page
//! starts with a header (date range plus three lines of noise) and ends with a
//! footer (page number plus five lines of noise). In between, each incident
//! reads:
//!
//! ```text
//! Date Reported:  <noise> <noise>  <reported> <location> <report id> <incident>
//! Incident(s):  <occurred from - to>
//! Date and Time Occurred From - Occurred To:  <noise>  <synopsis lines...>
//! Disposition:  <disposition>
//! ```
//!
//! The last page closes with `Incident(s) Listed.` and the incident total.

use chrono::Duration;

use super::date::{check_occurred_range, format_range, LogPatterns, RangeCheck};
use super::error::UnitError;
use super::traits::{FieldConsumer, Step};
use crate::config::{ConfigError, ParserConfig, UnknownTokenPolicy};
use crate::models::enums::CorrectionKind;
use crate::models::{CorrectionNote, Crime, Report};
use crate::pipeline::geo::GeoCache;

pub const DREXEL_EXTRACTOR_NAME: &str = "DrexelExtractor";

const LABEL_REPORTED: &str = "Date Reported:";
const LABEL_INCIDENTS: &str = "Incident(s):";
const LABEL_OCCURRED: &str = "Date and Time Occurred From - Occurred To:";
const LABEL_DISPOSITION: &str = "Disposition:";
const LABEL_LISTED: &str = "Incident(s) Listed.";

/// Fields of the group that follows "Date Reported:", in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glob1Field {
    Reported,
    Location,
    ReportId,
    Incident,
}

/// What the extractor expects the next unclaimed field to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Between groups: only labels are meaningful.
    Label,
    Glob1(Glob1Field),
    DateOccurred,
    /// Free text until "Disposition:".
    Synopsis,
    Disposition,
    ListedCount,
}

/// Finite state extractor for Drexel crime logs.
pub struct DrexelExtractor<'r> {
    config: ParserConfig,
    patterns: LogPatterns,
    locations: GeoCache<'r>,
    window: Duration,
    /// Noise fields left to skip after a header, footer or label
    skip: usize,
    expect: Expect,
    range_parsed: bool,
    /// Records closed since the last reset
    closed: usize,
}

impl DrexelExtractor<'static> {
    /// Extractor with deterministic location identifiers.
    pub fn new(config: ParserConfig) -> Result<Self, ConfigError> {
        DrexelExtractor::with_locations(config, GeoCache::deterministic())
    }
}

impl<'r> DrexelExtractor<'r> {
    pub fn with_locations(
        config: ParserConfig,
        locations: GeoCache<'r>,
    ) -> Result<Self, ConfigError> {
        let window = config.correction_window()?;
        Ok(Self {
            config,
            patterns: LogPatterns::new(),
            locations,
            window,
            skip: 0,
            expect: Expect::Label,
            range_parsed: false,
            closed: 0,
        })
    }

    /// Records closed since the last reset.
    pub fn closed(&self) -> usize {
        self.closed
    }

    pub fn locations(&self) -> &GeoCache<'r> {
        &self.locations
    }

    fn consume_glob1(
        &mut self,
        which: Glob1Field,
        field: &str,
        report: &Report,
        crime: &mut Crime,
    ) -> Result<Step, UnitError> {
        let next = match which {
            Glob1Field::Reported => {
                crime.page = report.pages + 1;
                crime.date_reported =
                    Some(self.patterns.parse_timestamp("date_reported", field)?);
                Expect::Glob1(Glob1Field::Location)
            }
            Glob1Field::Location => {
                crime.geo_loc_id = Some(self.locations.resolve(field)?);
                crime.location = field.to_string();
                Expect::Glob1(Glob1Field::ReportId)
            }
            Glob1Field::ReportId => {
                let (super_id, sub_id) = parse_report_id(field)?;
                crime.report_super_id = super_id;
                crime.report_sub_id = sub_id;
                Expect::Glob1(Glob1Field::Incident)
            }
            Glob1Field::Incident => {
                crime.incidents = vec![field.to_string()];
                Expect::Label
            }
        };
        self.expect = next;
        Ok(Step::Consumed(1))
    }

    fn consume_occurred(&mut self, field: &str, crime: &mut Crime) -> Result<Step, UnitError> {
        let (start_text, end_text) = self.patterns.split_occurred(field)?;
        let start = self.patterns.parse_timestamp("date_occurred", start_text)?;
        let mut end = self.patterns.parse_timestamp("date_occurred", end_text)?;

        match check_occurred_range(start, end, self.window) {
            RangeCheck::Ordered => {}
            RangeCheck::Corrected(fixed) => {
                let note = CorrectionNote::new(
                    "date_occurred",
                    field,
                    format_range(start, fixed),
                    CorrectionKind::BadRangeEnd,
                );
                tracing::info!(
                    original = field,
                    corrected = %note.corrected,
                    "Corrected inverted occurred range"
                );
                crime.corrections.push(note);
                end = fixed;
            }
            RangeCheck::Inverted => return Err(UnitError::OccurredInverted(field.to_string())),
        }

        crime.date_occurred_start = Some(start);
        crime.date_occurred_end = Some(end);
        self.expect = Expect::Label;
        Ok(Step::Consumed(1))
    }

    fn check_listed_count(&mut self, field: &str) -> Result<Step, UnitError> {
        let listed = field
            .trim()
            .parse::<usize>()
            .map_err(|_| UnitError::BadCount(field.to_string()))?;
        if listed != self.closed {
            return Err(UnitError::CountMismatch {
                listed,
                parsed: self.closed,
            });
        }
        self.expect = Expect::Label;
        Ok(Step::Consumed(1))
    }

    /// Page header or footer at `field`, if it is one.
    fn consume_page_marker(
        &mut self,
        index: usize,
        field: &str,
        report: &mut Report,
    ) -> Option<Result<Step, UnitError>> {
        if let Some(parsed) = self.patterns.parse_header_range(field) {
            if !self.range_parsed {
                let (start, end) = match parsed {
                    Ok(range) => range,
                    Err(e) => return Some(Err(e)),
                };
                if !report.set_range(start, end) {
                    tracing::debug!(index, "Report range already set, keeping it");
                }
                self.range_parsed = true;
            }
            self.skip = self.config.header_trailing_tokens;
            return Some(Ok(Step::Consumed(1)));
        }

        if self.patterns.is_page_number(field) {
            report.pages += 1;
            self.skip = self.config.footer_trailing_tokens;
            return Some(Ok(Step::Consumed(1)));
        }

        None
    }

    /// Start a new state from a label, or deal with an unknown field.
    fn consume_label(&mut self, index: usize, field: &str, crime: &mut Crime) -> Step {
        match field {
            LABEL_REPORTED => {
                self.skip = self.config.reported_label_skip;
                self.expect = Expect::Glob1(Glob1Field::Reported);
            }
            LABEL_INCIDENTS => self.expect = Expect::DateOccurred,
            LABEL_OCCURRED => {
                self.skip = self.config.occurred_label_skip;
                self.expect = Expect::Synopsis;
                crime.descriptions.clear();
            }
            LABEL_LISTED => self.expect = Expect::ListedCount,
            _ => {
                return match self.config.unknown_tokens {
                    UnknownTokenPolicy::Strict => Step::NoMatch,
                    UnknownTokenPolicy::Lenient => {
                        tracing::warn!(index, field, "Ignoring unknown field");
                        Step::Consumed(1)
                    }
                };
            }
        }
        Step::Consumed(1)
    }
}

impl FieldConsumer for DrexelExtractor<'_> {
    fn name(&self) -> &str {
        DREXEL_EXTRACTOR_NAME
    }

    fn try_consume(
        &mut self,
        index: usize,
        fields: &[String],
        report: &mut Report,
        crime: &mut Crime,
    ) -> Result<Step, UnitError> {
        let Some(field) = fields.get(index) else {
            return Ok(Step::NoMatch);
        };

        if self.skip > 0 {
            self.skip -= 1;
            return Ok(Step::Consumed(1));
        }

        // The total directly follows its label, even when it reads like a page
        // number.
        if self.expect != Expect::ListedCount {
            if let Some(step) = self.consume_page_marker(index, field, report) {
                return step;
            }
        }

        match self.expect {
            Expect::Glob1(which) => self.consume_glob1(which, field, report, crime),
            Expect::DateOccurred => self.consume_occurred(field, crime),
            Expect::Synopsis => {
                if field == LABEL_DISPOSITION {
                    self.expect = Expect::Disposition;
                } else {
                    crime.descriptions.push(field.clone());
                }
                Ok(Step::Consumed(1))
            }
            Expect::Disposition => {
                crime.remediation = field.clone();
                if crime.date_occurred_start.is_none() {
                    tracing::warn!(
                        index,
                        report_number = %crime.report_number(),
                        "Closing crime without an occurred range"
                    );
                }
                self.closed += 1;
                self.expect = Expect::Label;
                Ok(Step::RecordComplete(1))
            }
            Expect::ListedCount => self.check_listed_count(field),
            Expect::Label => Ok(self.consume_label(index, field, crime)),
        }
    }

    fn finish(&self) -> Result<(), UnitError> {
        if self.expect == Expect::ListedCount {
            return Err(UnitError::MissingCount);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.skip = 0;
        self.expect = Expect::Label;
        self.range_parsed = false;
        self.closed = 0;
    }
}

/// Split a `<super>-<sub>` report number into its two parts.
fn parse_report_id(field: &str) -> Result<(u64, u64), UnitError> {
    let parts: Vec<&str> = field.split('-').collect();
    let [super_part, sub_part] = parts.as_slice() else {
        return Err(UnitError::ReportIdParts {
            value: field.to_string(),
            parts: parts.len(),
        });
    };
    let number = |part: &str| {
        part.trim()
            .parse::<u64>()
            .map_err(|_| UnitError::ReportIdNumber {
                value: field.to_string(),
                part: part.to_string(),
            })
    };
    Ok((number(*super_part)?, number(*sub_part)?))
}
