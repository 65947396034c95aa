//! Lemma/word tables to nested lemma documents.
//!
//! Documents are buffered and handed to a [`DocumentSink`] one batch at a
//! time. A rejected batch is retried whole and surfaced as
//! [`Error::BatchRejected`] once the attempts run out.

use std::io::Write;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{util, Error, Result};

const KEY_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Width of generated document identifiers.
pub const ID_WIDTH: usize = 6;

pub const DEFAULT_BATCH_SIZE: usize = 50_000;

const EXPORT_QUERY: &str = "SELECT w.value, w.lemma, w.pos, w.count, w.arf, \
     m.count, m.arf, m.is_pname \
     FROM word AS w JOIN lemma AS m ON m.value = w.lemma AND m.pos = w.pos \
     ORDER BY w.lemma, w.pos, w.value";

/// Fixed-width base-62 rendering of a sequence number. Only the lowest
/// [`ID_WIDTH`] digits are kept.
pub fn mk_id(mut seq: u64) -> String {
    let mut id = [KEY_ALPHABET[0]; ID_WIDTH];
    for slot in id.iter_mut().rev() {
        *slot = KEY_ALPHABET[(seq % KEY_ALPHABET.len() as u64) as usize];
        seq /= KEY_ALPHABET.len() as u64;
    }
    id.iter().map(|&b| b as char).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub word: String,
    pub count: i64,
    pub arf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemmaDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub lemma: String,
    pub pos: String,
    pub count: i64,
    pub arf: f64,
    #[serde(rename = "is_pname")]
    pub is_proper_name: bool,
    pub forms: Vec<Form>,
}

/// Bulk-write collaborator receiving whole batches of documents.
pub trait DocumentSink {
    fn write_batch(&mut self, docs: &[LemmaDocument]) -> Result<()>;
}

/// Writes each batch as one `{"docs": [...]}` line, the body of a CouchDB
/// `_bulk_docs` request.
#[derive(Debug)]
pub struct BulkDocsWriter<W> {
    writer: W,
}

#[derive(Serialize)]
struct BulkDocs<'a> {
    docs: &'a [LemmaDocument],
}

impl<W: Write> BulkDocsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for BulkDocsWriter<W> {
    fn write_batch(&mut self, docs: &[LemmaDocument]) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &BulkDocs { docs })?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub batch_size: usize,
    /// Attempts per batch before giving up.
    pub max_attempts: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub rows: u64,
    pub documents: u64,
    pub batches: u64,
    /// Lemma+pos pairs left out because of disallowed characters.
    pub skipped: u64,
}

struct ExportRow {
    word: String,
    lemma: String,
    pos: String,
    count: i64,
    arf: f64,
    lemma_count: i64,
    lemma_arf: f64,
    is_proper_name: bool,
}

impl ExportRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            word: row.get(0)?,
            lemma: row.get(1)?,
            pos: row.get(2)?,
            count: row.get(3)?,
            arf: row.get(4)?,
            lemma_count: row.get(5)?,
            lemma_arf: row.get(6)?,
            is_proper_name: row.get(7)?,
        })
    }
}

pub fn export_documents<S: DocumentSink>(
    conn: &Connection,
    sink: &mut S,
    options: ExportOptions,
) -> Result<ExportReport> {
    let batch_size = options.batch_size.max(1);
    let mut report = ExportReport::default();
    let mut buffer = Vec::with_capacity(batch_size.min(DEFAULT_BATCH_SIZE));
    let mut open: Option<LemmaDocument> = None;
    let mut last_skipped: Option<(String, String)> = None;

    let mut statement = conn.prepare(EXPORT_QUERY)?;
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let row = ExportRow::read(row)?;
        report.rows += 1;
        if report.rows % 100_000 == 0 {
            info!("processed {} records", report.rows);
        }

        if !util::is_exportable_lemma(&row.lemma) {
            let key = (row.lemma, row.pos);
            if last_skipped.as_ref() != Some(&key) {
                report.skipped += 1;
                last_skipped = Some(key);
            }
            continue;
        }

        let form = Form {
            word: row.word,
            count: row.count,
            arf: row.arf,
        };
        let continues_open = open
            .as_ref()
            .map(|doc| doc.lemma == row.lemma && doc.pos == row.pos)
            .unwrap_or_default();
        if continues_open {
            if let Some(doc) = open.as_mut() {
                doc.forms.push(form);
            }
            continue;
        }

        let doc = LemmaDocument {
            id: mk_id(report.documents),
            lemma: row.lemma,
            pos: row.pos,
            count: row.lemma_count,
            arf: row.lemma_arf,
            is_proper_name: row.is_proper_name,
            forms: vec![form],
        };
        report.documents += 1;
        if let Some(done) = open.replace(doc) {
            buffer.push(done);
            if buffer.len() >= batch_size {
                write_with_retry(sink, &buffer, options.max_attempts)?;
                report.batches += 1;
                buffer.clear();
            }
        }
    }

    buffer.extend(open.take());
    if !buffer.is_empty() {
        write_with_retry(sink, &buffer, options.max_attempts)?;
        report.batches += 1;
    }
    if report.skipped > 0 {
        warn!("skipped {} lemma(s) with disallowed characters", report.skipped);
    }
    info!(
        "exported {} documents in {} batch(es)",
        report.documents, report.batches
    );
    Ok(report)
}

fn write_with_retry<S: DocumentSink>(
    sink: &mut S,
    docs: &[LemmaDocument],
    max_attempts: usize,
) -> Result<()> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match sink.write_batch(docs) {
            Ok(()) => return Ok(()),
            Err(err) if attempt < max_attempts => {
                warn!("bulk write of {} documents failed, retrying: {}", docs.len(), err);
            }
            Err(err) => {
                return Err(Error::BatchRejected {
                    attempts: attempt,
                    source: Box::new(err),
                })
            }
        }
    }
}
