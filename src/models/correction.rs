use serde::{Deserialize, Serialize};

use super::enums::CorrectionKind;

/// Audit trail entry for data the parser repaired on its own.
///
/// Kept alongside the crime it belongs to so a wrong guess can be traced
/// back to the text that was printed in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionNote {
    /// Name of the crime field which was corrected
    pub field: String,
    /// Field text exactly as it appeared in the document
    pub original: String,
    /// Human readable form of the corrected value
    pub corrected: String,
    pub kind: CorrectionKind,
}

impl CorrectionNote {
    pub fn new(
        field: impl Into<String>,
        original: impl Into<String>,
        corrected: impl Into<String>,
        kind: CorrectionKind,
    ) -> Self {
        Self {
            field: field.into(),
            original: original.into(),
            corrected: corrected.into(),
            kind,
        }
    }
}

impl std::fmt::Display for CorrectionNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): \"{}\" -> \"{}\"",
            self.field, self.kind, self.original, self.corrected
        )
    }
}
