use rusqlite::{Connection, Row, Statement};

use crate::{record::RawCountRow, Error, Result};

/// Table holding the raw per-form counts.
pub const RAW_TABLE: &str = "colcounts";

/// Which flavour of frequency database is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Variant {
    /// Lemma and word tables, grouped by lemma and part of speech.
    #[default]
    Basic,
    /// Lemma, sublemma and word tables, grouped by lemma and raw tag.
    Sublemmas,
}

/// Raw table columns holding each attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub form: &'static str,
    pub lemma: &'static str,
    pub sublemma: Option<&'static str>,
    pub tag: &'static str,
}

impl Variant {
    pub fn columns(self) -> Columns {
        match self {
            Variant::Basic => Columns {
                form: "col0",
                lemma: "col1",
                sublemma: None,
                tag: "col2",
            },
            Variant::Sublemmas => Columns {
                form: "col0",
                lemma: "col2",
                sublemma: Some("col3"),
                tag: "col4",
            },
        }
    }

    fn scan_query(self) -> String {
        let Columns {
            form,
            lemma,
            sublemma,
            tag,
        } = self.columns();
        match sublemma {
            None => format!(
                "SELECT {form}, {lemma}, NULL, {tag}, `count`, arf FROM {RAW_TABLE} \
                 ORDER BY {lemma}, {tag}, {form}"
            ),
            Some(sublemma) => format!(
                "SELECT {form}, {lemma}, {sublemma}, {tag}, `count`, arf FROM {RAW_TABLE} \
                 ORDER BY {lemma}, {sublemma}, {tag}, {form}"
            ),
        }
    }
}

/// Ordered range scan over the raw count table.
pub struct RowSource<'conn> {
    statement: Statement<'conn>,
}

impl<'conn> RowSource<'conn> {
    pub fn prepare(conn: &'conn Connection, variant: Variant) -> Result<Self> {
        let statement = conn.prepare(&variant.scan_query())?;
        Ok(Self { statement })
    }

    /// Rows sorted by lemma, (sublemma), tag and form.
    pub fn rows(&mut self) -> Result<impl Iterator<Item = Result<RawCountRow>> + '_> {
        let rows = self.statement.query_map([], read_row)?;
        Ok(rows.map(|row| row.map_err(Error::from)))
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawCountRow> {
    Ok(RawCountRow {
        form: row.get(0)?,
        lemma: row.get(1)?,
        sublemma: row.get(2)?,
        tag: row.get(3)?,
        count: row.get(4)?,
        arf: row.get(5)?,
    })
}
