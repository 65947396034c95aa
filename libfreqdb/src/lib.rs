//! Word, lemma and sublemma frequency tables built from raw corpus counts.
//!
//! [`compile_frequency_db`] scans the raw count table in lemma order, drops
//! stop units, groups consecutive rows and merges every group into the
//! target tables inside a single transaction. [`export::export_documents`]
//! turns the result into nested lemma documents.

use std::time::Instant;

use tracing::info;

pub mod aggregator;
mod error;
pub mod export;
pub mod loader;
pub mod record;
pub mod source;
pub mod store;
pub mod tagset;
pub mod util;

pub use aggregator::{Aggregator, AggregatorOptions};
pub use error::{Error, Result};
pub use export::{export_documents, BulkDocsWriter, DocumentSink, ExportOptions, ExportReport};
pub use loader::{load_raw_counts, LoadOptions, LoadReport};
pub use rusqlite::Connection;
pub use source::{RowSource, Variant};
pub use store::{FreqStore, MergeStats, Upsert};
pub use tagset::Tagset;

#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    pub aggregator: AggregatorOptions,
    /// Drop existing target tables first. Without it a run merges into
    /// whatever previous runs stored.
    pub drop_existing: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            aggregator: AggregatorOptions::default(),
            drop_existing: true,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompileReport {
    pub rows: u64,
    pub stop_rows: u64,
    pub groups: u64,
    pub merges: MergeStats,
}

/// Builds the lemma (and sublemma) and word tables from the raw count table.
///
/// Everything happens in one transaction: on error nothing is committed.
pub fn compile_frequency_db(conn: &mut Connection, options: CompileOptions) -> Result<CompileReport> {
    let t0 = Instant::now();
    let variant = options.aggregator.variant;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update_and_check(None, "journal_mode", "MEMORY", |row| row.get::<_, String>(0))?;

    let tx = conn.transaction()?;
    store::create_tables(&tx, variant, options.drop_existing)?;
    let report = {
        let mut source = RowSource::prepare(&tx, variant)?;
        let mut aggregator = Aggregator::new(source.rows()?, options.aggregator);
        let mut store = FreqStore::new(&tx, variant);
        let mut groups = 0_u64;
        for group in aggregator.by_ref() {
            store.write_group(&group?)?;
            groups += 1;
            if groups % 100_000 == 0 {
                info!("stored {} lemma groups", groups);
            }
        }
        CompileReport {
            rows: aggregator.num_rows(),
            stop_rows: aggregator.num_stop(),
            groups,
            merges: store.stats(),
        }
    };
    tx.commit()?;

    info!("num stop words: {}", report.stop_rows);
    info!(
        "{} rows, {} groups, {} duplicate keys merged",
        report.rows,
        report.groups,
        report.merges.collisions()
    );
    info!("done in {:.2}s", t0.elapsed().as_secs_f64());
    Ok(report)
}
