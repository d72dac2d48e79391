//! Turns a crime log's tokens into stored reports and crimes.
//!
//! Token extraction from the source document is someone else's job; a
//! `TokenSource` hands over the tokens in reading order. The reader works out
//! which university published the log, runs the matching extractor and, for
//! `ReportReader::ingest`, writes everything in one transaction.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{ConfigError, ParserConfig};
use crate::db::{
    insert_correction_if_new, insert_crime_if_new, insert_report_if_new,
    update_post_parse_fields, DatabaseError,
};
use crate::models::enums::University;
use crate::models::{Crime, DateRange, Report};
use crate::pipeline::geo::{GeoCache, SqliteLocationResolver};
use crate::pipeline::parsing::{
    DateRangeConsumer, OnceRunner, ParseError, ParserRunner, DATE_RANGE_CONSUMER_NAME,
};

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parser configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("No known university is named in {0}")]
    UnknownUniversity(String),
}

impl From<rusqlite::Error> for ReaderError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::from(err))
    }
}

// ═══════════════════════════════════════════
// Token sources
// ═══════════════════════════════════════════

/// Supplies the tokens of one document in reading order.
pub trait TokenSource {
    /// Identifier stored as the report's source.
    fn name(&self) -> String;

    fn tokens(&self) -> Result<Vec<String>, ReaderError>;
}

/// A token dump on disk, one token per line. Blank lines are dropped; other
/// lines are kept exactly, including leading spaces.
#[derive(Debug, Clone)]
pub struct LineTokenSource {
    path: PathBuf,
}

impl LineTokenSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenSource for LineTokenSource {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn tokens(&self) -> Result<Vec<String>, ReaderError> {
        let text = std::fs::read_to_string(&self.path)?;
        let tokens: Vec<String> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        tracing::debug!(path = %self.path.display(), count = tokens.len(), "Read token dump");
        Ok(tokens)
    }
}

/// Tokens already in memory.
#[derive(Debug, Clone)]
pub struct MemoryTokenSource {
    name: String,
    tokens: Vec<String>,
}

impl MemoryTokenSource {
    pub fn new(name: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tokens,
        }
    }
}

impl TokenSource for MemoryTokenSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn tokens(&self) -> Result<Vec<String>, ReaderError> {
        Ok(self.tokens.clone())
    }
}

// ═══════════════════════════════════════════
// Parsing
// ═══════════════════════════════════════════

/// Report metadata plus the crimes extracted from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub report: Report,
    pub crimes: Vec<Crime>,
}

/// First known university whose name appears in any token.
pub fn determine_university(source: &str, fields: &[String]) -> Result<University, ReaderError> {
    fields
        .iter()
        .find_map(|field| {
            University::all()
                .iter()
                .copied()
                .find(|u| field.contains(u.as_str()))
        })
        .ok_or_else(|| ReaderError::UnknownUniversity(source.to_string()))
}

/// Date range the document covers, read from the first page header without
/// extracting any crimes.
pub fn report_range(config: &ParserConfig, fields: &[String]) -> Result<DateRange, ReaderError> {
    let mut report = Report::default();
    OnceRunner::new(DateRangeConsumer::new(config)).run(&mut report, fields)?;
    report.range().ok_or_else(|| {
        ReaderError::Parse(ParseError::NothingParsed {
            unit: DATE_RANGE_CONSUMER_NAME.to_string(),
        })
    })
}

/// Parse a whole document with the extractor for its university.
pub fn parse_document(
    config: &ParserConfig,
    source: &str,
    fields: &[String],
    locations: GeoCache<'_>,
) -> Result<ParsedDocument, ReaderError> {
    let university = determine_university(source, fields)?;
    let range = report_range(config, fields)?;

    let mut report = Report::new(Some(university), Some(source.to_string()));
    report.set_range(range.start, range.end);

    let mut runner = match university {
        University::Drexel => ParserRunner::drexel(config.clone(), locations)?,
    };
    let output = runner.parse(&mut report, fields)?;

    report.parse_success = true;
    report.parsed_on = Some(Local::now().naive_local());
    tracing::info!(
        source,
        university = %university,
        crimes = output.crimes.len(),
        pages = report.pages,
        "Parsed crime log"
    );

    Ok(ParsedDocument {
        report,
        crimes: output.crimes,
    })
}

// ═══════════════════════════════════════════
// Ingest
// ═══════════════════════════════════════════

/// What `ReportReader::ingest` stored.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSummary {
    pub report_id: Uuid,
    /// In document order
    pub crime_ids: Vec<Uuid>,
    pub corrections: usize,
    /// Distinct locations referenced by the crimes
    pub locations: usize,
}

/// Parses documents and persists the results.
pub struct ReportReader<'c> {
    conn: &'c Connection,
    config: ParserConfig,
}

impl<'c> ReportReader<'c> {
    pub fn new(conn: &'c Connection, config: ParserConfig) -> Self {
        Self { conn, config }
    }

    /// Date range of a document, without parsing its crimes.
    pub fn range(&self, source: &dyn TokenSource) -> Result<DateRange, ReaderError> {
        report_range(&self.config, &source.tokens()?)
    }

    /// Parse `source` and store its report, crimes and correction notes.
    /// Rows that already exist are reused, so ingesting the same document
    /// twice stores it once. Nothing is written if parsing fails.
    pub fn ingest(&self, source: &dyn TokenSource) -> Result<IngestSummary, ReaderError> {
        let name = source.name();
        let fields = source.tokens()?;

        let tx = self.conn.unchecked_transaction()?;
        let locations = GeoCache::new(Box::new(SqliteLocationResolver::new(&tx)));
        let parsed = parse_document(&self.config, &name, &fields, locations)?;

        let report_id = insert_report_if_new(&tx, &parsed.report)?;
        let mut crime_ids = Vec::with_capacity(parsed.crimes.len());
        let mut corrections = 0;
        for crime in &parsed.crimes {
            let crime_id = insert_crime_if_new(&tx, &report_id, crime)?;
            for note in &crime.corrections {
                insert_correction_if_new(&tx, &crime_id, note)?;
                corrections += 1;
            }
            crime_ids.push(crime_id);
        }
        update_post_parse_fields(&tx, &report_id, &parsed.report)?;
        tx.commit()?;

        let locations: HashSet<Uuid> = parsed.crimes.iter().filter_map(|c| c.geo_loc_id).collect();
        tracing::info!(
            source = %name,
            report_id = %report_id,
            crimes = crime_ids.len(),
            corrections,
            "Ingested crime log"
        );

        Ok(IngestSummary {
            report_id,
            crime_ids,
            corrections,
            locations: locations.len(),
        })
    }
}
