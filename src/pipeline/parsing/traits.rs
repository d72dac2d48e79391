//! The field consumer capability.
//!
//! A crime log arrives as a flat list of text fields. Each `FieldConsumer`
//! knows how to read one layout (or one piece of a layout) and is offered the
//! field at the runner's cursor. It answers with a `Step` saying how many
//! fields it claimed, or an error if the data is broken beyond repair.

use super::error::UnitError;
use crate::models::{Crime, Report};

/// Outcome of offering a field to a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The consumer does not handle this field; try the next one.
    NoMatch,
    /// The consumer claimed this many fields, starting at the cursor.
    Consumed(usize),
    /// As `Consumed`, and the crime being built is finished.
    RecordComplete(usize),
}

impl Step {
    /// Fields claimed by this step. Always 0 for `NoMatch`.
    pub fn count(&self) -> usize {
        match self {
            Self::NoMatch => 0,
            Self::Consumed(n) | Self::RecordComplete(n) => *n,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, Self::NoMatch)
    }
}

/// Reads fields of a crime log into a `Report` and the `Crime` being built.
///
/// Consumers may keep private state between calls, e.g. to remember that the
/// next three fields belong to a group started by a label. That state is
/// cleared by `reset` before each new document.
pub trait FieldConsumer {
    /// Stable name used in errors and logs.
    fn name(&self) -> &str;

    /// Offer the field at `index` of `fields`.
    ///
    /// Implementations must return `NoMatch` without touching `report` or
    /// `crime` when they decline a field.
    fn try_consume(
        &mut self,
        index: usize,
        fields: &[String],
        report: &mut Report,
        crime: &mut Crime,
    ) -> Result<Step, UnitError>;

    /// Called once the fields run out. Fails if the consumer still needs a
    /// field the document never supplied.
    fn finish(&self) -> Result<(), UnitError> {
        Ok(())
    }

    /// Forget all per-document state.
    fn reset(&mut self) {}
}
