use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;
use crate::models::enums::CorrectionKind;
use crate::models::CorrectionNote;

/// Store `note` against `crime_id` unless the same note is already there.
pub fn insert_correction_if_new(
    conn: &Connection,
    crime_id: &Uuid,
    note: &CorrectionNote,
) -> Result<Uuid, DatabaseError> {
    let existing = conn.query_row(
        "SELECT id FROM corrections
         WHERE crime_id = ?1 AND field = ?2 AND original = ?3 AND corrected = ?4 AND kind = ?5",
        params![
            crime_id.to_string(),
            note.field,
            note.original,
            note.corrected,
            note.kind.as_str(),
        ],
        |row| row.get::<_, String>(0),
    );
    match existing {
        Ok(id) => return parse_id(&id),
        Err(rusqlite::Error::QueryReturnedNoRows) => {}
        Err(e) => return Err(e.into()),
    }

    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO corrections (id, crime_id, field, original, corrected, kind)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id.to_string(),
            crime_id.to_string(),
            note.field,
            note.original,
            note.corrected,
            note.kind.as_str(),
        ],
    )?;
    Ok(id)
}

pub fn get_corrections_for_crime(
    conn: &Connection,
    crime_id: &Uuid,
) -> Result<Vec<CorrectionNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT field, original, corrected, kind FROM corrections
         WHERE crime_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt.query_map(params![crime_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut notes = Vec::new();
    for row in rows {
        let (field, original, corrected, kind) = row?;
        notes.push(CorrectionNote::new(
            field,
            original,
            corrected,
            CorrectionKind::from_str(&kind)?,
        ));
    }
    Ok(notes)
}
