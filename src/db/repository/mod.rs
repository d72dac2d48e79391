//! Repository layer: entity-scoped database operations.
//!
//! Every insert is "insert if absent": re-ingesting the same crime log finds
//! the existing rows and returns their ids instead of duplicating them.

mod correction;
mod crime;
mod geo_loc;
mod report;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::DatabaseError;

pub use correction::*;
pub use crime::*;
pub use geo_loc::*;
pub use report::*;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_id(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn datetime_to_sql(datetime: Option<NaiveDateTime>) -> Option<String> {
    datetime.map(|d| d.format(DATETIME_FORMAT).to_string())
}

fn date_from_sql(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok())
}

fn datetime_from_sql(value: Option<String>) -> Option<NaiveDateTime> {
    value.and_then(|d| NaiveDateTime::parse_from_str(&d, DATETIME_FORMAT).ok())
}

/// SQLite integers are signed; report numbers are not.
fn u64_to_sql(value: u64, field: &str) -> Result<i64, DatabaseError> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::ConstraintViolation(format!("{field} out of range: {value}")))
}

fn u64_from_sql(value: i64, field: &str) -> Result<u64, DatabaseError> {
    u64::try_from(value)
        .map_err(|_| DatabaseError::ConstraintViolation(format!("{field} is negative: {value}")))
}
