use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{date_from_sql, date_to_sql, datetime_from_sql, datetime_to_sql, parse_id};
use crate::db::DatabaseError;
use crate::models::enums::University;
use crate::models::Report;

/// Id of a stored report with the same university, range and page count.
pub fn find_report(conn: &Connection, report: &Report) -> Result<Option<Uuid>, DatabaseError> {
    let range = report.range();
    let result = conn.query_row(
        "SELECT id FROM reports
         WHERE university IS ?1 AND range_start IS ?2 AND range_end IS ?3 AND pages = ?4",
        params![
            report.university.map(|u| u.as_str()),
            date_to_sql(range.map(|r| r.start)),
            date_to_sql(range.map(|r| r.end)),
            report.pages,
        ],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(id) => Ok(Some(parse_id(&id)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_report(conn: &Connection, report: &Report) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    let range = report.range();
    conn.execute(
        "INSERT INTO reports (id, university, source, parsed_on, parse_success,
         range_start, range_end, pages, crimes_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id.to_string(),
            report.university.map(|u| u.as_str()),
            report.source,
            datetime_to_sql(report.parsed_on),
            report.parse_success as i32,
            date_to_sql(range.map(|r| r.start)),
            date_to_sql(range.map(|r| r.end)),
            report.pages,
            report.crimes_count,
        ],
    )?;
    Ok(id)
}

/// Store `report` unless an equivalent one exists; either way return its id.
pub fn insert_report_if_new(conn: &Connection, report: &Report) -> Result<Uuid, DatabaseError> {
    if let Some(id) = find_report(conn, report)? {
        tracing::debug!(report_id = %id, "Report already stored");
        return Ok(id);
    }
    insert_report(conn, report)
}

/// Write the fields only known once every crime has been extracted.
pub fn update_post_parse_fields(
    conn: &Connection,
    id: &Uuid,
    report: &Report,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE reports SET parse_success = ?2, crimes_count = ?3, parsed_on = ?4 WHERE id = ?1",
        params![
            id.to_string(),
            report.parse_success as i32,
            report.crimes_count,
            datetime_to_sql(report.parsed_on),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<Report>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, university, source, parsed_on, parse_success, range_start, range_end,
         pages, crimes_count
         FROM reports WHERE id = ?1",
        params![id.to_string()],
        read_report_row,
    );

    match result {
        Ok(row) => Ok(Some(report_from_row(row)?.1)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All stored reports, newest range first.
pub fn list_reports(conn: &Connection) -> Result<Vec<(Uuid, Report)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, university, source, parsed_on, parse_success, range_start, range_end,
         pages, crimes_count
         FROM reports ORDER BY range_start DESC",
    )?;
    let rows = stmt.query_map([], read_report_row)?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row?)?);
    }
    Ok(reports)
}

struct ReportRow {
    id: String,
    university: Option<String>,
    source: Option<String>,
    parsed_on: Option<String>,
    parse_success: i32,
    range_start: Option<String>,
    range_end: Option<String>,
    pages: u32,
    crimes_count: u32,
}

fn read_report_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get::<_, String>(0)?,
        university: row.get::<_, Option<String>>(1)?,
        source: row.get::<_, Option<String>>(2)?,
        parsed_on: row.get::<_, Option<String>>(3)?,
        parse_success: row.get::<_, i32>(4)?,
        range_start: row.get::<_, Option<String>>(5)?,
        range_end: row.get::<_, Option<String>>(6)?,
        pages: row.get::<_, u32>(7)?,
        crimes_count: row.get::<_, u32>(8)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<(Uuid, Report), DatabaseError> {
    let university = row
        .university
        .as_deref()
        .map(University::from_str)
        .transpose()?;

    let mut report = Report::new(university, row.source);
    report.parsed_on = datetime_from_sql(row.parsed_on);
    report.parse_success = row.parse_success != 0;
    report.pages = row.pages;
    report.crimes_count = row.crimes_count;
    if let (Some(start), Some(end)) = (date_from_sql(row.range_start), date_from_sql(row.range_end)) {
        report.set_range(start, end);
    }

    Ok((parse_id(&row.id)?, report))
}
