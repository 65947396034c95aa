//! Persistence of aggregated groups with additive conflict resolution.
//!
//! A key that is already stored is not an error: the incoming counts are
//! added to the stored ones. Within a group the lemma is written first, then
//! its sublemmas, then its words, so foreign keys always resolve.

use rusqlite::{ffi, params, Connection};
use tracing::debug;

use crate::{
    record::{Group, LemmaRecord, SublemmaRecord, WordRecord},
    source::Variant,
    Result,
};

/// Outcome of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Upsert {
    Inserted,
    /// The key existed; holds the stored totals after the merge.
    Merged { count: i64, arf: Option<f64> },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub inserted: u64,
    pub merged: u64,
}

impl Tally {
    fn record(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Inserted => self.inserted += 1,
            Upsert::Merged { .. } => self.merged += 1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub lemmas: Tally,
    pub sublemmas: Tally,
    pub words: Tally,
}

impl MergeStats {
    pub fn collisions(&self) -> u64 {
        self.lemmas.merged + self.sublemmas.merged + self.words.merged
    }
}

/// Creates the target tables. With `drop_existing` any previous tables are
/// removed first, otherwise existing ones are kept and merged into.
pub fn create_tables(conn: &Connection, variant: Variant, drop_existing: bool) -> Result<()> {
    if drop_existing {
        conn.execute_batch(
            "DROP TABLE IF EXISTS word;
             DROP TABLE IF EXISTS sublemma;
             DROP TABLE IF EXISTS lemma;",
        )?;
    }
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS lemma (
             value TEXT, pos TEXT, count INTEGER, arf REAL, is_pname INTEGER,
             PRIMARY KEY (value, pos)
         );",
    )?;
    match variant {
        Variant::Basic => conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS word (
                 value TEXT, lemma TEXT, pos TEXT, count INTEGER, arf REAL,
                 PRIMARY KEY (value, lemma, pos),
                 FOREIGN KEY (lemma, pos) REFERENCES lemma (value, pos)
             );",
        )?,
        Variant::Sublemmas => conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sublemma (
                 value TEXT, lemma TEXT, pos TEXT, count INTEGER,
                 PRIMARY KEY (value, lemma, pos),
                 FOREIGN KEY (lemma, pos) REFERENCES lemma (value, pos)
             );
             CREATE TABLE IF NOT EXISTS word (
                 value TEXT, lemma TEXT, sublemma TEXT, pos TEXT, count INTEGER, arf REAL,
                 PRIMARY KEY (value, lemma, sublemma, pos),
                 FOREIGN KEY (lemma, pos) REFERENCES lemma (value, pos),
                 FOREIGN KEY (sublemma, lemma, pos) REFERENCES sublemma (value, lemma, pos)
             );
             CREATE UNIQUE INDEX IF NOT EXISTS word_natural_key
                 ON word (value, lemma, IFNULL(sublemma, ''), pos);",
        )?,
    }
    Ok(())
}

pub struct FreqStore<'conn> {
    conn: &'conn Connection,
    variant: Variant,
    stats: MergeStats,
}

impl<'conn> FreqStore<'conn> {
    pub fn new(conn: &'conn Connection, variant: Variant) -> Self {
        Self {
            conn,
            variant,
            stats: MergeStats::default(),
        }
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// Writes a group's lemma, then its sublemmas, then its words.
    pub fn write_group(&mut self, group: &Group) -> Result<()> {
        let outcome = self.upsert_lemma(&group.lemma)?;
        if let Upsert::Merged { count, .. } = outcome {
            debug!(
                lemma = %group.lemma.value,
                pos = %group.lemma.pos,
                count,
                "duplicate lemma record merged"
            );
        }
        self.stats.lemmas.record(outcome);

        for sublemma in &group.sublemmas {
            let outcome = self.upsert_sublemma(sublemma)?;
            if let Upsert::Merged { count, .. } = outcome {
                debug!(
                    sublemma = %sublemma.value,
                    lemma = %sublemma.lemma,
                    pos = %sublemma.pos,
                    count,
                    "duplicate sublemma record merged"
                );
            }
            self.stats.sublemmas.record(outcome);
        }

        for word in &group.words {
            let outcome = self.upsert_word(word)?;
            if let Upsert::Merged { count, .. } = outcome {
                debug!(
                    word = %word.value,
                    lemma = %word.lemma,
                    pos = %word.pos,
                    count,
                    "duplicate word record merged"
                );
            }
            self.stats.words.record(outcome);
        }
        Ok(())
    }

    pub fn upsert_lemma(&self, record: &LemmaRecord) -> Result<Upsert> {
        let inserted = self
            .conn
            .prepare_cached(
                "INSERT INTO lemma (value, pos, count, arf, is_pname) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                record.value,
                record.pos,
                record.count,
                record.arf,
                record.is_proper_name
            ]);
        if !is_key_collision(inserted)? {
            return Ok(Upsert::Inserted);
        }
        self.conn
            .prepare_cached(
                "UPDATE lemma SET count = count + ?1, arf = arf + ?2 WHERE value = ?3 AND pos = ?4",
            )?
            .execute(params![record.count, record.arf, record.value, record.pos])?;
        let (count, arf) = self
            .conn
            .prepare_cached("SELECT count, arf FROM lemma WHERE value = ?1 AND pos = ?2")?
            .query_row(params![record.value, record.pos], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
        Ok(Upsert::Merged {
            count,
            arf: Some(arf),
        })
    }

    pub fn upsert_sublemma(&self, record: &SublemmaRecord) -> Result<Upsert> {
        let inserted = self
            .conn
            .prepare_cached(
                "INSERT INTO sublemma (value, lemma, pos, count) VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![record.value, record.lemma, record.pos, record.count]);
        if !is_key_collision(inserted)? {
            return Ok(Upsert::Inserted);
        }
        self.conn
            .prepare_cached(
                "UPDATE sublemma SET count = count + ?1 WHERE value = ?2 AND lemma = ?3 AND pos = ?4",
            )?
            .execute(params![record.count, record.value, record.lemma, record.pos])?;
        let count = self
            .conn
            .prepare_cached(
                "SELECT count FROM sublemma WHERE value = ?1 AND lemma = ?2 AND pos = ?3",
            )?
            .query_row(params![record.value, record.lemma, record.pos], |row| {
                row.get(0)
            })?;
        Ok(Upsert::Merged { count, arf: None })
    }

    pub fn upsert_word(&self, record: &WordRecord) -> Result<Upsert> {
        let inserted = match self.variant {
            Variant::Basic => self
                .conn
                .prepare_cached(
                    "INSERT INTO word (value, lemma, pos, count, arf) VALUES (?1, ?2, ?3, ?4, ?5)",
                )?
                .execute(params![
                    record.value,
                    record.lemma,
                    record.pos,
                    record.count,
                    record.arf
                ]),
            Variant::Sublemmas => self
                .conn
                .prepare_cached(
                    "INSERT INTO word (value, lemma, sublemma, pos, count, arf) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?
                .execute(params![
                    record.value,
                    record.lemma,
                    record.sublemma,
                    record.pos,
                    record.count,
                    record.arf
                ]),
        };
        if !is_key_collision(inserted)? {
            return Ok(Upsert::Inserted);
        }

        let merged = match self.variant {
            Variant::Basic => {
                self.conn
                    .prepare_cached(
                        "UPDATE word SET count = count + ?1, arf = arf + ?2 \
                         WHERE value = ?3 AND lemma = ?4 AND pos = ?5",
                    )?
                    .execute(params![
                        record.count,
                        record.arf,
                        record.value,
                        record.lemma,
                        record.pos
                    ])?;
                self.conn
                    .prepare_cached(
                        "SELECT count, arf FROM word WHERE value = ?1 AND lemma = ?2 AND pos = ?3",
                    )?
                    .query_row(params![record.value, record.lemma, record.pos], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })?
            }
            Variant::Sublemmas => {
                self.conn
                    .prepare_cached(
                        "UPDATE word SET count = count + ?1, arf = arf + ?2 \
                         WHERE value = ?3 AND lemma = ?4 AND IFNULL(sublemma, '') = IFNULL(?5, '') AND pos = ?6",
                    )?
                    .execute(params![
                        record.count,
                        record.arf,
                        record.value,
                        record.lemma,
                        record.sublemma,
                        record.pos
                    ])?;
                self.conn
                    .prepare_cached(
                        "SELECT count, arf FROM word \
                         WHERE value = ?1 AND lemma = ?2 AND IFNULL(sublemma, '') = IFNULL(?3, '') AND pos = ?4",
                    )?
                    .query_row(
                        params![record.value, record.lemma, record.sublemma, record.pos],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )?
            }
        };
        let (count, arf) = merged;
        Ok(Upsert::Merged {
            count,
            arf: Some(arf),
        })
    }
}

/// `Ok(true)` when the insert hit an existing natural key, `Ok(false)` when
/// it went through. Any other failure, foreign keys included, is passed on.
///
/// A NULL sublemma never collides on the word primary key, so that key is
/// also covered by the `word_natural_key` unique index.
fn is_key_collision(inserted: rusqlite::Result<usize>) -> Result<bool> {
    match inserted {
        Ok(_) => Ok(false),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(true)
        }
        Err(err) => Err(err.into()),
    }
}
