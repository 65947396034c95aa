#![allow(dead_code)]

use libfreqdb::{loader, Connection};

/// `(form, lemma, sublemma, tag, count, arf)`
pub type Raw<'a> = (&'a str, &'a str, Option<&'a str>, &'a str, i64, f64);

pub fn raw_db(rows: &[Raw<'_>], sublemmas: bool) -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory db");
    loader::create_raw_table(&conn, true).expect("raw table");
    for &(form, lemma, sublemma, tag, count, arf) in rows {
        if sublemmas {
            conn.execute(
                "INSERT INTO colcounts (col0, col2, col3, col4, `count`, arf) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![form, lemma, sublemma, tag, count, arf],
            )
            .expect("insert raw row");
        } else {
            conn.execute(
                "INSERT INTO colcounts (col0, col1, col2, `count`, arf) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![form, lemma, tag, count, arf],
            )
            .expect("insert raw row");
        }
    }
    conn
}

pub fn lemmas(conn: &Connection) -> Vec<(String, String, i64, f64, bool)> {
    let mut stmt = conn
        .prepare("SELECT value, pos, count, arf, is_pname FROM lemma ORDER BY value, pos")
        .expect("lemma query");
    let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)))
        .expect("lemma rows");
    rows.collect::<Result<_, _>>().expect("lemma values")
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .expect("count rows")
}
