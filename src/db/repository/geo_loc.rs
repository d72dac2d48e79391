use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;
use crate::models::GeoLoc;

/// Id of the `geo_locs` row for `raw`, inserting an unlocated row first if
/// there is none.
pub fn insert_geo_loc_if_new(conn: &Connection, raw: &str) -> Result<Uuid, DatabaseError> {
    let existing = conn.query_row(
        "SELECT id FROM geo_locs WHERE raw = ?1",
        params![raw],
        |row| row.get::<_, String>(0),
    );
    match existing {
        Ok(id) => return parse_id(&id),
        Err(rusqlite::Error::QueryReturnedNoRows) => {}
        Err(e) => return Err(e.into()),
    }

    let loc = GeoLoc::unlocated(Uuid::new_v4(), raw);
    conn.execute(
        "INSERT INTO geo_locs (id, raw, located) VALUES (?1, ?2, ?3)",
        params![loc.id.to_string(), loc.raw, loc.located as i32],
    )?;
    tracing::debug!(geo_loc_id = %loc.id, "Inserted unlocated location");
    Ok(loc.id)
}

pub fn get_geo_loc(conn: &Connection, id: &Uuid) -> Result<Option<GeoLoc>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, raw, located, lat, long, postal_addr FROM geo_locs WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(GeoLocRow {
                id: row.get::<_, String>(0)?,
                raw: row.get::<_, String>(1)?,
                located: row.get::<_, i32>(2)?,
                lat: row.get::<_, Option<f64>>(3)?,
                long: row.get::<_, Option<f64>>(4)?,
                postal_addr: row.get::<_, Option<String>>(5)?,
            })
        },
    );

    match result {
        Ok(row) => Ok(Some(geo_loc_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Locations still waiting for geocoding, oldest text first.
pub fn list_unlocated_geo_locs(conn: &Connection) -> Result<Vec<GeoLoc>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, raw, located, lat, long, postal_addr
         FROM geo_locs WHERE located = 0 ORDER BY rowid",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(GeoLocRow {
            id: row.get::<_, String>(0)?,
            raw: row.get::<_, String>(1)?,
            located: row.get::<_, i32>(2)?,
            lat: row.get::<_, Option<f64>>(3)?,
            long: row.get::<_, Option<f64>>(4)?,
            postal_addr: row.get::<_, Option<String>>(5)?,
        })
    })?;

    let mut locs = Vec::new();
    for row in rows {
        locs.push(geo_loc_from_row(row?)?);
    }
    Ok(locs)
}

struct GeoLocRow {
    id: String,
    raw: String,
    located: i32,
    lat: Option<f64>,
    long: Option<f64>,
    postal_addr: Option<String>,
}

fn geo_loc_from_row(row: GeoLocRow) -> Result<GeoLoc, DatabaseError> {
    Ok(GeoLoc {
        id: parse_id(&row.id)?,
        raw: row.raw,
        located: row.located != 0,
        lat: row.lat,
        long: row.long,
        postal_addr: row.postal_addr,
    })
}
