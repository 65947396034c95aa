//! Fills the raw count table from tab-separated dumps.
//!
//! Each line holds `form, lemma, [sublemma,] tag, count, arf`; the sublemma
//! field is present only for [`Variant::Sublemmas`] and may be empty.

use std::{
    io::BufRead,
    path::{Path, PathBuf},
    thread,
};

use crossbeam_channel::{bounded, Receiver};
use parking_lot::Mutex;
use rayon::prelude::*;
use rusqlite::{params, Connection};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::{
    record::RawCountRow,
    source::{Columns, Variant, RAW_TABLE},
    util, Error, Result,
};

/// Parsed files waiting for insertion; bounds memory to a few files.
const PARSED_FILES_IN_FLIGHT: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub variant: Variant,
    /// Keep rows already in the raw table.
    pub append: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub files: usize,
    pub rows: u64,
}

/// A single file, or every `.tsv`/`.tsv.bz2` file below a directory.
pub fn gather_files(input: impl AsRef<Path>) -> Vec<PathBuf> {
    let input = input.as_ref();
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let mut files = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.file_type().is_file() && (name.ends_with(".tsv") || name.ends_with(".tsv.bz2"))
        })
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    files.sort();
    files
}

pub fn load_raw_counts(
    conn: &mut Connection,
    input: impl AsRef<Path>,
    options: LoadOptions,
) -> Result<LoadReport> {
    let input = input.as_ref();
    let files = gather_files(input);
    let file_count = files.len();
    if files.is_empty() {
        warn!("no count files found at {}", input.display());
    }
    let processed_count = Mutex::new(0_usize);

    let tx = conn.transaction()?;
    create_raw_table(&tx, !options.append)?;
    let (sender, receiver) = bounded(PARSED_FILES_IN_FLIGHT);
    let rows = thread::scope(|scope| {
        scope.spawn(|| {
            files.par_iter().for_each_with(sender, |sender, file| {
                let parsed = parse_file(file, options.variant);
                if let Ok(rows) = &parsed {
                    let processed_count = {
                        let mut processed_count = processed_count.lock();
                        *processed_count += 1;
                        *processed_count
                    };
                    info!(
                        "parsed {} ({} rows) {}/{}",
                        file.display(),
                        rows.len(),
                        processed_count,
                        file_count
                    );
                }
                // The receiver is gone once an insert failed; nothing left to do.
                let _ = sender.send(parsed);
            });
        });
        insert_parsed(&tx, options.variant, receiver)
    })?;
    tx.commit()?;

    let report = LoadReport {
        files: file_count,
        rows,
    };
    info!("loaded {} rows from {} file(s)", report.rows, report.files);
    Ok(report)
}

/// Inserts parsed files as they arrive. Returning drops `receiver`, which
/// stops the parsers early on error.
fn insert_parsed(
    conn: &Connection,
    variant: Variant,
    receiver: Receiver<Result<Vec<RawCountRow>>>,
) -> Result<u64> {
    let mut insert = conn.prepare(&insert_query(variant))?;
    let mut inserted = 0;
    for parsed in receiver {
        for row in parsed? {
            match variant {
                Variant::Basic => {
                    insert.execute(params![row.form, row.lemma, row.tag, row.count, row.arf])?
                }
                Variant::Sublemmas => insert.execute(params![
                    row.form,
                    row.lemma,
                    row.sublemma,
                    row.tag,
                    row.count,
                    row.arf
                ])?,
            };
            inserted += 1;
        }
    }
    Ok(inserted)
}

pub fn create_raw_table(conn: &Connection, drop_existing: bool) -> Result<()> {
    if drop_existing {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {RAW_TABLE};"))?;
    }
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {RAW_TABLE} (
             col0 TEXT, col1 TEXT, col2 TEXT, col3 TEXT, col4 TEXT,
             `count` INTEGER, arf REAL
         );"
    ))?;
    Ok(())
}

fn insert_query(variant: Variant) -> String {
    let Columns {
        form,
        lemma,
        sublemma,
        tag,
    } = variant.columns();
    match sublemma {
        None => format!(
            "INSERT INTO {RAW_TABLE} ({form}, {lemma}, {tag}, `count`, arf) VALUES (?1, ?2, ?3, ?4, ?5)"
        ),
        Some(sublemma) => format!(
            "INSERT INTO {RAW_TABLE} ({form}, {lemma}, {sublemma}, {tag}, `count`, arf) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ),
    }
}

fn parse_file(path: &Path, variant: Variant) -> Result<Vec<RawCountRow>> {
    let reader = util::open_input(path)?;
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_line(&line, variant).map_err(|reason| Error::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn parse_line(line: &str, variant: Variant) -> Result<RawCountRow, String> {
    let fields = line.split('\t').collect::<Vec<_>>();
    let (form, lemma, sublemma, tag, count, arf) = match (variant, fields.as_slice()) {
        (Variant::Basic, &[form, lemma, tag, count, arf]) => (form, lemma, None, tag, count, arf),
        (Variant::Sublemmas, &[form, lemma, sublemma, tag, count, arf]) => {
            let sublemma = Some(sublemma).filter(|s| !s.is_empty());
            (form, lemma, sublemma, tag, count, arf)
        }
        (_, fields) => return Err(format!("unexpected number of fields: {}", fields.len())),
    };
    let count = count
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid count '{count}': {e}"))?;
    let arf = arf
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid arf '{arf}': {e}"))?;
    if count < 0 {
        return Err(format!("negative count {count}"));
    }
    if !arf.is_finite() || arf < 0.0 {
        return Err(format!("arf must be a finite non-negative number, got {arf}"));
    }
    Ok(RawCountRow {
        form: form.to_string(),
        lemma: lemma.to_string(),
        sublemma: sublemma.map(str::to_string),
        tag: tag.to_string(),
        count,
        arf,
    })
}
