//! Runs a single consumer until it first makes progress.
//!
//! Used for metadata-only passes, e.g. finding a log's date range without
//! extracting every incident. Completed records are not collected; the crime
//! handed to the consumer is scratch space.

use super::error::ParseError;
use super::traits::FieldConsumer;
use crate::models::{Crime, Report};

pub struct OnceRunner<C: FieldConsumer> {
    consumer: C,
}

impl<C: FieldConsumer> OnceRunner<C> {
    pub fn new(consumer: C) -> Self {
        Self { consumer }
    }

    /// Offer every field from index 0 until the consumer claims one. Returns
    /// the index it claimed.
    pub fn run(&mut self, report: &mut Report, fields: &[String]) -> Result<usize, ParseError> {
        self.consumer.reset();
        let mut scratch = Crime::default();

        for index in 0..fields.len() {
            let step = self
                .consumer
                .try_consume(index, fields, report, &mut scratch)
                .map_err(|source| ParseError::Unit {
                    unit: self.consumer.name().to_string(),
                    index,
                    source,
                })?;

            if step.count() > 0 {
                tracing::debug!(unit = self.consumer.name(), index, "Single pass matched");
                return Ok(index);
            }
        }

        Err(ParseError::NothingParsed {
            unit: self.consumer.name().to_string(),
        })
    }

    pub fn into_inner(self) -> C {
        self.consumer
    }
}
