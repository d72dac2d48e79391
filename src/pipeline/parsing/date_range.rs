//! Header-only consumer: reads the date range a crime log covers and nothing
//! else. Paired with `OnceRunner` when only the range is wanted.

use super::date::LogPatterns;
use super::error::UnitError;
use super::traits::{FieldConsumer, Step};
use crate::config::ParserConfig;
use crate::models::{Crime, Report};

pub const DATE_RANGE_CONSUMER_NAME: &str = "DateRangeConsumer";

#[derive(Debug, Clone)]
pub struct DateRangeConsumer {
    patterns: LogPatterns,
    trailing: usize,
}

impl DateRangeConsumer {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            patterns: LogPatterns::new(),
            trailing: config.header_trailing_tokens,
        }
    }
}

impl Default for DateRangeConsumer {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl FieldConsumer for DateRangeConsumer {
    fn name(&self) -> &str {
        DATE_RANGE_CONSUMER_NAME
    }

    /// Claims the header field and its trailing noise, clamped to the end of
    /// `fields`. An already set range is left alone.
    fn try_consume(
        &mut self,
        index: usize,
        fields: &[String],
        report: &mut Report,
        _crime: &mut Crime,
    ) -> Result<Step, UnitError> {
        let Some(field) = fields.get(index) else {
            return Ok(Step::NoMatch);
        };
        let Some(parsed) = self.patterns.parse_header_range(field) else {
            return Ok(Step::NoMatch);
        };

        let (start, end) = parsed?;
        report.set_range(start, end);

        let claimed = (1 + self.trailing).min(fields.len() - index);
        Ok(Step::Consumed(claimed))
    }
}
