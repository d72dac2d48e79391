//! Drives an ordered list of field consumers over a whole crime log.
//!
//! The runner owns the cursor and the crime being built. At each position the
//! consumers are tried in insertion order and the first to claim fields wins.
//! A field nobody claims stops the parse.

use std::mem;

use super::drexel::DrexelExtractor;
use super::error::ParseError;
use super::traits::{FieldConsumer, Step};
use crate::config::{ConfigError, ParserConfig};
use crate::models::{Crime, Report};
use crate::pipeline::geo::GeoCache;

/// Result of a successful parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    /// Closed crimes, in document order
    pub crimes: Vec<Crime>,
    /// Crime still open when the fields ran out, if anything was written to it
    pub unfinished: Option<Crime>,
}

#[derive(Default)]
pub struct ParserRunner<'a> {
    consumers: Vec<Box<dyn FieldConsumer + 'a>>,
}

impl<'a> ParserRunner<'a> {
    pub fn new() -> Self {
        Self {
            consumers: Vec::new(),
        }
    }

    /// Runner for Drexel University crime logs.
    pub fn drexel(config: ParserConfig, locations: GeoCache<'a>) -> Result<Self, ConfigError> {
        let mut runner = Self::new();
        runner.add(DrexelExtractor::with_locations(config, locations)?);
        Ok(runner)
    }

    /// Append a consumer. Earlier consumers take precedence.
    pub fn add(&mut self, consumer: impl FieldConsumer + 'a) -> &mut Self {
        self.consumers.push(Box::new(consumer));
        self
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Parse `fields` from start to end, then give every consumer the chance
    /// to object to where the document stopped.
    ///
    /// Consumers are reset first, so a runner can be reused across documents.
    pub fn parse(&mut self, report: &mut Report, fields: &[String]) -> Result<ParseOutput, ParseError> {
        if self.consumers.is_empty() && !fields.is_empty() {
            return Err(ParseError::NoConsumers);
        }
        for consumer in &mut self.consumers {
            consumer.reset();
        }

        let mut crimes = Vec::new();
        let mut crime = Crime::default();
        let mut index = 0;

        'fields: while index < fields.len() {
            for consumer in &mut self.consumers {
                let step = consumer
                    .try_consume(index, fields, report, &mut crime)
                    .map_err(|source| ParseError::Unit {
                        unit: consumer.name().to_string(),
                        index,
                        source,
                    })?;

                if !step.is_match() {
                    continue;
                }

                let count = step.count();
                if count == 0 || count > fields.len() - index {
                    return Err(ParseError::InvalidStep {
                        unit: consumer.name().to_string(),
                        index,
                        count,
                        len: fields.len(),
                    });
                }

                if let Step::RecordComplete(_) = step {
                    let closed = mem::take(&mut crime);
                    tracing::debug!(
                        index,
                        unit = consumer.name(),
                        report_number = %closed.report_number(),
                        "Closed crime"
                    );
                    crimes.push(closed);
                }

                index += count;
                continue 'fields;
            }

            return Err(ParseError::FieldNotInterpretable {
                index,
                token: fields[index].clone(),
            });
        }

        for consumer in &self.consumers {
            consumer.finish().map_err(|source| ParseError::Unit {
                unit: consumer.name().to_string(),
                index: fields.len(),
                source,
            })?;
        }

        let unfinished = if crime.is_empty() {
            None
        } else {
            tracing::warn!(crime = %crime, "Fields ended with an unfinished crime");
            Some(crime)
        };

        report.crimes_count = crime_count(crimes.len())?;
        Ok(ParseOutput { crimes, unfinished })
    }
}

fn crime_count(count: usize) -> Result<u32, ParseError> {
    u32::try_from(count).map_err(|_| ParseError::TooManyCrimes { count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parsing::error::UnitError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn make_fields(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const SAMPLE_ID_A: u64 = 5;
    const SAMPLE_ID_B: u64 = 11;

    /// Claims fields equal to `token`, tags the crime with `id` and closes it.
    struct SampleConsumer {
        name: &'static str,
        token: &'static str,
        id: u64,
    }

    fn sample_a() -> SampleConsumer {
        SampleConsumer {
            name: "SampleConsumerA",
            token: "A",
            id: SAMPLE_ID_A,
        }
    }

    fn sample_b() -> SampleConsumer {
        SampleConsumer {
            name: "SampleConsumerB",
            token: "B",
            id: SAMPLE_ID_B,
        }
    }

    impl FieldConsumer for SampleConsumer {
        fn name(&self) -> &str {
            self.name
        }

        fn try_consume(
            &mut self,
            index: usize,
            fields: &[String],
            _report: &mut Report,
            crime: &mut Crime,
        ) -> Result<Step, UnitError> {
            if fields[index] == self.token {
                crime.report_super_id = self.id;
                return Ok(Step::RecordComplete(1));
            }
            Ok(Step::NoMatch)
        }
    }

    struct SampleErrConsumer;

    impl FieldConsumer for SampleErrConsumer {
        fn name(&self) -> &str {
            "SampleErrConsumer"
        }

        fn try_consume(
            &mut self,
            _index: usize,
            _fields: &[String],
            _report: &mut Report,
            _crime: &mut Crime,
        ) -> Result<Step, UnitError> {
            Err(UnitError::BadCount("sample".into()))
        }
    }

    /// Claims any field but never closes a record.
    struct DescribeConsumer;

    impl FieldConsumer for DescribeConsumer {
        fn name(&self) -> &str {
            "DescribeConsumer"
        }

        fn try_consume(
            &mut self,
            index: usize,
            fields: &[String],
            _report: &mut Report,
            crime: &mut Crime,
        ) -> Result<Step, UnitError> {
            crime.descriptions.push(fields[index].clone());
            Ok(Step::Consumed(1))
        }
    }

    /// Claims everything and objects when the fields run out.
    struct NeedsMore;

    impl FieldConsumer for NeedsMore {
        fn name(&self) -> &str {
            "NeedsMore"
        }

        fn try_consume(
            &mut self,
            _index: usize,
            _fields: &[String],
            _report: &mut Report,
            _crime: &mut Crime,
        ) -> Result<Step, UnitError> {
            Ok(Step::RecordComplete(1))
        }

        fn finish(&self) -> Result<(), UnitError> {
            Err(UnitError::MissingCount)
        }
    }

    /// Reports a fixed step regardless of input.
    struct FixedStep(Step);

    impl FieldConsumer for FixedStep {
        fn name(&self) -> &str {
            "FixedStep"
        }

        fn try_consume(
            &mut self,
            _index: usize,
            _fields: &[String],
            _report: &mut Report,
            _crime: &mut Crime,
        ) -> Result<Step, UnitError> {
            Ok(self.0)
        }
    }

    /// Wraps a consumer and records where it claimed fields and when it
    /// closed records.
    struct Recording<C> {
        inner: C,
        claimed_at: Rc<RefCell<Vec<usize>>>,
        completions: Rc<RefCell<usize>>,
    }

    impl<C: FieldConsumer> FieldConsumer for Recording<C> {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn try_consume(
            &mut self,
            index: usize,
            fields: &[String],
            report: &mut Report,
            crime: &mut Crime,
        ) -> Result<Step, UnitError> {
            let step = self.inner.try_consume(index, fields, report, crime)?;
            if step.is_match() {
                self.claimed_at.borrow_mut().push(index);
            }
            if let Step::RecordComplete(_) = step {
                *self.completions.borrow_mut() += 1;
            }
            Ok(step)
        }

        fn finish(&self) -> Result<(), UnitError> {
            self.inner.finish()
        }

        fn reset(&mut self) {
            self.inner.reset();
        }
    }

    fn make_drexel_log() -> Vec<String> {
        let mut fields = make_fields(&[
            "From Jan 13, 2016 to Jan 13, 2017.",
            "Drexel University",
            "Daily Crime Log",
            "Public Safety",
        ]);
        for id in ["2017-001", "2017-002", "2017-003"] {
            fields.extend(make_fields(&[
                "Date Reported:",
                "Report #:",
                "Location:",
                "10/14/17 - FRI at 09:00",
                "3141 Chestnut St",
                id,
                "BURGLARY",
                "Incident(s):",
                "10/14/17 - FRI at 10:00 - 10/14/17 - FRI at 02:00",
                "Date and Time Occurred From - Occurred To:",
                "Synopsis:",
                "Door forced.",
                "Disposition:",
                "Pending",
            ]));
        }
        fields.extend(make_fields(&["Incident(s) Listed.", " 3"]));
        fields.extend(make_fields(&["1", "of", "1", "Printed", "on", "Jan 14, 2017"]));
        fields
    }

    #[test]
    fn add_and_parse() {
        let mut runner = ParserRunner::new();
        runner.add(sample_a()).add(sample_b());
        assert_eq!(runner.len(), 2);

        let mut report = Report::default();
        let output = runner
            .parse(&mut report, &make_fields(&["B", "A", "B", "B", "A"]))
            .unwrap();

        let ids: Vec<u64> = output.crimes.iter().map(|c| c.report_super_id).collect();
        assert_eq!(
            ids,
            vec![SAMPLE_ID_B, SAMPLE_ID_A, SAMPLE_ID_B, SAMPLE_ID_B, SAMPLE_ID_A]
        );
        assert!(output.unfinished.is_none());
        assert_eq!(report.crimes_count, 5);
    }

    #[test]
    fn unclaimed_field_is_an_error() {
        let mut runner = ParserRunner::new();
        runner.add(sample_a()).add(sample_b());

        let err = runner
            .parse(&mut Report::default(), &make_fields(&["C", "A"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "field not parsed, index: 0, field: \"C\"");
    }

    #[test]
    fn unit_error_aborts() {
        let mut runner = ParserRunner::new();
        runner.add(sample_a()).add(SampleErrConsumer);

        let err = runner
            .parse(&mut Report::default(), &make_fields(&["C", "A"]))
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("error running SampleErrConsumer against field with index 0"));
    }

    #[test]
    fn earlier_consumer_wins() {
        let mut runner = ParserRunner::new();
        runner.add(sample_a()).add(DescribeConsumer);

        let output = runner
            .parse(&mut Report::default(), &make_fields(&["x", "A", "y"]))
            .unwrap();
        assert_eq!(output.crimes.len(), 1);
        assert_eq!(output.crimes[0].descriptions, vec!["x".to_string()]);
        assert_eq!(output.crimes[0].report_super_id, SAMPLE_ID_A);

        let unfinished = output.unfinished.unwrap();
        assert_eq!(unfinished.descriptions, vec!["y".to_string()]);
        assert_eq!(unfinished.report_super_id, 0);
    }

    #[test]
    fn no_consumers_is_an_error() {
        let mut runner = ParserRunner::new();
        assert!(runner.is_empty());
        assert!(matches!(
            runner.parse(&mut Report::default(), &make_fields(&["A"])),
            Err(ParseError::NoConsumers)
        ));
    }

    #[test]
    fn empty_fields_parse_to_nothing() {
        let mut runner = ParserRunner::new();
        let output = runner.parse(&mut Report::default(), &[]).unwrap();
        assert_eq!(output, ParseOutput::default());
    }

    #[test]
    fn zero_count_step_is_rejected() {
        let mut runner = ParserRunner::new();
        runner.add(FixedStep(Step::Consumed(0)));
        let err = runner
            .parse(&mut Report::default(), &make_fields(&["A"]))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidStep { count: 0, .. }));
    }

    #[test]
    fn overrunning_step_is_rejected() {
        let mut runner = ParserRunner::new();
        runner.add(FixedStep(Step::Consumed(3)));
        let err = runner
            .parse(&mut Report::default(), &make_fields(&["A", "B"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidStep {
                index: 0,
                count: 3,
                len: 2,
                ..
            }
        ));
    }

    #[test]
    fn drexel_runner_parses_full_log() {
        let mut runner = ParserRunner::drexel(ParserConfig::default(), GeoCache::deterministic()).unwrap();
        let mut report = Report::default();
        let output = runner.parse(&mut report, &make_drexel_log()).unwrap();

        assert_eq!(output.crimes.len(), 3);
        assert!(output.unfinished.is_none());
        assert_eq!(report.pages, 1);
        assert_eq!(report.crimes_count, 3);
        assert!(report.range().is_some());
        for crime in &output.crimes {
            assert_eq!(crime.corrections.len(), 1);
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let fields = make_drexel_log();

        let mut first_report = Report::default();
        let first = ParserRunner::drexel(ParserConfig::default(), GeoCache::deterministic()).unwrap()
            .parse(&mut first_report, &fields)
            .unwrap();

        // A reused runner must give the same answer as a fresh one.
        let mut runner = ParserRunner::drexel(ParserConfig::default(), GeoCache::deterministic()).unwrap();
        for _ in 0..2 {
            let mut report = Report::default();
            let again = runner.parse(&mut report, &fields).unwrap();
            assert_eq!(again, first);
            assert_eq!(report, first_report);
        }
    }

    #[test]
    fn cursor_strictly_increases_to_end() {
        let fields = make_drexel_log();
        let claimed_at = Rc::new(RefCell::new(Vec::new()));
        let completions = Rc::new(RefCell::new(0));

        let mut runner = ParserRunner::new();
        runner.add(Recording {
            inner: DrexelExtractor::new(ParserConfig::default()).unwrap(),
            claimed_at: Rc::clone(&claimed_at),
            completions: Rc::clone(&completions),
        });
        let output = runner.parse(&mut Report::default(), &fields).unwrap();

        let positions = claimed_at.borrow();
        assert_eq!(positions.first(), Some(&0));
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        // Every step of the extractor claims exactly one field.
        assert_eq!(*positions.last().unwrap(), fields.len() - 1);
        assert_eq!(positions.len(), fields.len());

        assert_eq!(*completions.borrow(), output.crimes.len());
    }

    #[test]
    fn finish_error_is_reported_at_end() {
        let mut runner = ParserRunner::new();
        runner.add(NeedsMore);
        let mut report = Report::default();
        let err = runner
            .parse(&mut report, &make_fields(&["A", "B"]))
            .unwrap_err();
        match err {
            ParseError::Unit { unit, index, source } => {
                assert_eq!(unit, "NeedsMore");
                assert_eq!(index, 2);
                assert!(matches!(source, UnitError::MissingCount));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(report.crimes_count, 0);
    }

    #[test]
    fn drexel_runner_rejects_bad_window() {
        let config = ParserConfig {
            correction_window_hours: -3,
            ..ParserConfig::default()
        };
        assert!(matches!(
            ParserRunner::drexel(config, GeoCache::deterministic()),
            Err(ConfigError::CorrectionWindow(-3))
        ));
    }

    #[test]
    fn crime_count_fits_u32() {
        assert_eq!(crime_count(7).unwrap(), 7);
        assert_eq!(crime_count(u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn crime_count_overflow_is_an_error() {
        let count = u32::MAX as usize + 1;
        assert!(matches!(
            crime_count(count),
            Err(ParseError::TooManyCrimes { count: c }) if c == count
        ));
    }
}
