use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{datetime_from_sql, datetime_to_sql, get_corrections_for_crime, parse_id, u64_from_sql, u64_to_sql};
use crate::db::DatabaseError;
use crate::models::Crime;

/// Id of a crime under `report_id` with identical content on the same page.
pub fn find_crime(
    conn: &Connection,
    report_id: &Uuid,
    crime: &Crime,
) -> Result<Option<Uuid>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id FROM crimes
         WHERE report_id = ?1 AND date_reported IS ?2 AND date_occurred_start IS ?3
         AND date_occurred_end IS ?4 AND report_super_id = ?5 AND report_sub_id = ?6
         AND location = ?7 AND geo_loc_id IS ?8 AND incidents = ?9 AND descriptions = ?10
         AND remediation = ?11 AND page = ?12",
        params![
            report_id.to_string(),
            datetime_to_sql(crime.date_reported),
            datetime_to_sql(crime.date_occurred_start),
            datetime_to_sql(crime.date_occurred_end),
            u64_to_sql(crime.report_super_id, "report_super_id")?,
            u64_to_sql(crime.report_sub_id, "report_sub_id")?,
            crime.location,
            crime.geo_loc_id.map(|id| id.to_string()),
            serde_json::to_string(&crime.incidents)?,
            serde_json::to_string(&crime.descriptions)?,
            crime.remediation,
            crime.page,
        ],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(id) => Ok(Some(parse_id(&id)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_crime(conn: &Connection, report_id: &Uuid, crime: &Crime) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO crimes (id, report_id, page, date_reported, date_occurred_start,
         date_occurred_end, report_super_id, report_sub_id, location, geo_loc_id,
         incidents, descriptions, remediation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            id.to_string(),
            report_id.to_string(),
            crime.page,
            datetime_to_sql(crime.date_reported),
            datetime_to_sql(crime.date_occurred_start),
            datetime_to_sql(crime.date_occurred_end),
            u64_to_sql(crime.report_super_id, "report_super_id")?,
            u64_to_sql(crime.report_sub_id, "report_sub_id")?,
            crime.location,
            crime.geo_loc_id.map(|id| id.to_string()),
            serde_json::to_string(&crime.incidents)?,
            serde_json::to_string(&crime.descriptions)?,
            crime.remediation,
        ],
    )?;
    Ok(id)
}

/// Store `crime` under `report_id` unless an identical one is there already.
/// Correction notes are not written here, see `insert_correction_if_new`.
pub fn insert_crime_if_new(
    conn: &Connection,
    report_id: &Uuid,
    crime: &Crime,
) -> Result<Uuid, DatabaseError> {
    if let Some(id) = find_crime(conn, report_id, crime)? {
        return Ok(id);
    }
    insert_crime(conn, report_id, crime)
}

/// Crimes of one report in document order, with their correction notes.
pub fn get_crimes_for_report(
    conn: &Connection,
    report_id: &Uuid,
) -> Result<Vec<(Uuid, Crime)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, page, date_reported, date_occurred_start, date_occurred_end,
         report_super_id, report_sub_id, location, geo_loc_id, incidents, descriptions,
         remediation
         FROM crimes WHERE report_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt.query_map(params![report_id.to_string()], |row| {
        Ok(CrimeRow {
            id: row.get::<_, String>(0)?,
            page: row.get::<_, u32>(1)?,
            date_reported: row.get::<_, Option<String>>(2)?,
            date_occurred_start: row.get::<_, Option<String>>(3)?,
            date_occurred_end: row.get::<_, Option<String>>(4)?,
            report_super_id: row.get::<_, i64>(5)?,
            report_sub_id: row.get::<_, i64>(6)?,
            location: row.get::<_, String>(7)?,
            geo_loc_id: row.get::<_, Option<String>>(8)?,
            incidents: row.get::<_, String>(9)?,
            descriptions: row.get::<_, String>(10)?,
            remediation: row.get::<_, String>(11)?,
        })
    })?;

    let mut crimes = Vec::new();
    for row in rows {
        let (id, mut crime) = crime_from_row(row?)?;
        crime.corrections = get_corrections_for_crime(conn, &id)?;
        crimes.push((id, crime));
    }
    Ok(crimes)
}

struct CrimeRow {
    id: String,
    page: u32,
    date_reported: Option<String>,
    date_occurred_start: Option<String>,
    date_occurred_end: Option<String>,
    report_super_id: i64,
    report_sub_id: i64,
    location: String,
    geo_loc_id: Option<String>,
    incidents: String,
    descriptions: String,
    remediation: String,
}

fn crime_from_row(row: CrimeRow) -> Result<(Uuid, Crime), DatabaseError> {
    let crime = Crime {
        page: row.page,
        date_reported: datetime_from_sql(row.date_reported),
        date_occurred_start: datetime_from_sql(row.date_occurred_start),
        date_occurred_end: datetime_from_sql(row.date_occurred_end),
        report_super_id: u64_from_sql(row.report_super_id, "report_super_id")?,
        report_sub_id: u64_from_sql(row.report_sub_id, "report_sub_id")?,
        location: row.location,
        geo_loc_id: row.geo_loc_id.as_deref().map(parse_id).transpose()?,
        incidents: serde_json::from_str(&row.incidents)?,
        descriptions: serde_json::from_str(&row.descriptions)?,
        remediation: row.remediation,
        corrections: Vec::new(),
    };
    Ok((parse_id(&row.id)?, crime))
}
