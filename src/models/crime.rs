use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::correction::CorrectionNote;

/// One incident listed in a crime log.
///
/// Built up field by field while the parser walks the document, then closed
/// and handed back to the caller. A fresh value is used for every incident.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Crime {
    /// 1-based page the incident's "Date Reported:" group started on
    pub page: u32,
    /// When the activity was disclosed to the police
    pub date_reported: Option<NaiveDateTime>,
    pub date_occurred_start: Option<NaiveDateTime>,
    pub date_occurred_end: Option<NaiveDateTime>,
    /// First half of the police report number, `<super>-<sub>`
    pub report_super_id: u64,
    pub report_sub_id: u64,
    /// Location text exactly as printed
    pub location: String,
    /// Resolved location identifier, see `pipeline::geo`
    pub geo_loc_id: Option<Uuid>,
    /// Official classifications of the activity
    pub incidents: Vec<String>,
    /// Synopsis lines
    pub descriptions: Vec<String>,
    /// Disposition text
    pub remediation: String,
    pub corrections: Vec<CorrectionNote>,
}

impl Crime {
    /// True when no field has been written yet.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Report number in the form printed by the document.
    pub fn report_number(&self) -> String {
        format!("{}-{}", self.report_super_id, self.report_sub_id)
    }
}

impl std::fmt::Display for Crime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} reported {} at \"{}\": {}",
            self.report_number(),
            self.date_reported
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".into()),
            self.location,
            self.incidents.join(", "),
        )
    }
}
