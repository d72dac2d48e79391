//! Location identifiers for raw location text.
//!
//! The parser never geocodes. It only needs a stable identifier per distinct
//! location string so each crime can point at a location row; coordinates are
//! filled in by a later stage. `GeoCache` memoises lookups for one parse run
//! so a resolver sees every distinct string once.

use std::collections::HashMap;

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::insert_geo_loc_if_new;
use crate::db::DatabaseError;

/// Namespace for deterministic location identifiers.
const LOCATION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d0e_8a4b_4f7e_9c35_b1a0_d2e4_7c19);

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Location text is empty")]
    Empty,
}

/// Maps raw location text to an identifier usable as a foreign key.
pub trait LocationResolver {
    fn resolve(&mut self, raw: &str) -> Result<Uuid, LocationError>;
}

/// Derives the identifier from the text itself (UUIDv5). No I/O, so it is
/// the default for parsing without a store.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicLocationResolver;

impl LocationResolver for DeterministicLocationResolver {
    fn resolve(&mut self, raw: &str) -> Result<Uuid, LocationError> {
        Ok(Uuid::new_v5(&LOCATION_NAMESPACE, raw.as_bytes()))
    }
}

/// Inserts an unlocated `geo_locs` row for new text, or returns the id of
/// the existing one.
pub struct SqliteLocationResolver<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteLocationResolver<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl LocationResolver for SqliteLocationResolver<'_> {
    fn resolve(&mut self, raw: &str) -> Result<Uuid, LocationError> {
        Ok(insert_geo_loc_if_new(self.conn, raw)?)
    }
}

/// Memoising front for a `LocationResolver`.
pub struct GeoCache<'r> {
    resolver: Box<dyn LocationResolver + 'r>,
    ids: HashMap<String, Uuid>,
}

impl<'r> GeoCache<'r> {
    pub fn new(resolver: Box<dyn LocationResolver + 'r>) -> Self {
        Self {
            resolver,
            ids: HashMap::new(),
        }
    }

    /// Cache backed by `DeterministicLocationResolver`.
    pub fn deterministic() -> GeoCache<'static> {
        GeoCache::new(Box::new(DeterministicLocationResolver))
    }

    /// Identifier for `raw`, asking the resolver only on first sight.
    pub fn resolve(&mut self, raw: &str) -> Result<Uuid, LocationError> {
        if raw.trim().is_empty() {
            return Err(LocationError::Empty);
        }
        if let Some(id) = self.ids.get(raw) {
            return Ok(*id);
        }
        let id = self.resolver.resolve(raw)?;
        tracing::debug!(location = raw, id = %id, "Resolved new location");
        self.ids.insert(raw.to_string(), id);
        Ok(id)
    }

    /// Distinct locations seen so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl std::fmt::Debug for GeoCache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoCache")
            .field("cached", &self.ids.len())
            .finish()
    }
}
