use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A location as printed in a crime log. Geocoding fills in the
/// coordinates later, outside of the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLoc {
    pub id: Uuid,
    pub raw: String,
    pub located: bool,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub postal_addr: Option<String>,
}

impl GeoLoc {
    /// Unlocated entry holding only the raw text.
    pub fn unlocated(id: Uuid, raw: impl Into<String>) -> Self {
        Self {
            id,
            raw: raw.into(),
            located: false,
            lat: None,
            long: None,
            postal_addr: None,
        }
    }
}
