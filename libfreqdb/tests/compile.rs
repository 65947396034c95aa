mod common;

use common::{count_rows, lemmas, raw_db, Raw};
use libfreqdb::{
    compile_frequency_db, AggregatorOptions, CompileOptions, Connection, Tagset, Variant,
};

fn options(variant: Variant, tagset: Tagset) -> CompileOptions {
    CompileOptions {
        aggregator: AggregatorOptions {
            variant,
            tagset,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn corpus() -> Vec<Raw<'static>> {
    vec![
        ("can", "can", None, "MD", 40, 12.5),
        ("can", "can", None, "NN", 5, 1.25),
        ("cans", "can", None, "NNS", 2, 0.5),
        ("can", "can", None, "VB", 3, 0.75),
        ("sheep", "sheep", None, "NN", 7, 2.0),
        ("sheep", "sheep", None, "NNS", 4, 1.0),
        ("Prague", "Prague", None, "NNP", 9, 3.5),
        ("1999", "1999", None, "CD", 11, 4.0),
        ("ran", "run", None, "VBD", 6, 2.25),
        ("runs", "run", None, "VBZ", 8, 3.0),
    ]
}

#[test]
fn last_row_contributes_to_a_group() {
    let mut conn = raw_db(&[("x", "x", None, "NN", 3, 1.0)], false);
    let report = compile_frequency_db(&mut conn, options(Variant::Basic, Tagset::Penn)).unwrap();
    assert_eq!(report.groups, 1);
    assert_eq!(lemmas(&conn), vec![("x".into(), "N".into(), 3, 1.0, false)]);
    assert_eq!(count_rows(&conn, "word"), 1);
}

#[test]
fn lemma_totals_equal_word_sums() {
    let mut conn = raw_db(&corpus(), false);
    compile_frequency_db(&mut conn, options(Variant::Basic, Tagset::Penn)).unwrap();

    let mut stmt = conn
        .prepare(
            "SELECT m.value, m.pos, m.count, m.arf, SUM(w.count), SUM(w.arf) \
             FROM lemma AS m JOIN word AS w ON w.lemma = m.value AND w.pos = m.pos \
             GROUP BY m.value, m.pos",
        )
        .unwrap();
    let totals = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(2)?,
                r.get::<_, f64>(3)?,
                r.get::<_, i64>(4)?,
                r.get::<_, f64>(5)?,
            ))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(totals.len() as i64, count_rows(&conn, "lemma"));
    for (lemma, count, arf, word_count, word_arf) in totals {
        assert_eq!(count, word_count, "count of {lemma}");
        assert!((arf - word_arf).abs() < 1e-9, "arf of {lemma}");
    }
}

#[test]
fn scattered_groups_and_duplicate_words_are_merged() {
    let mut conn = raw_db(&corpus(), false);
    let report = compile_frequency_db(&mut conn, options(Variant::Basic, Tagset::Penn)).unwrap();

    // MD, NN/NNS and VB arrive as three groups; the two verb groups collide.
    assert_eq!(report.merges.lemmas.merged, 1);
    // "can"/V twice and "sheep"/N twice
    assert_eq!(report.merges.words.merged, 2);
    assert_eq!(
        lemmas(&conn),
        vec![
            ("Prague".into(), "N".into(), 9, 3.5, true),
            ("can".into(), "N".into(), 7, 1.75, false),
            ("can".into(), "V".into(), 43, 13.25, false),
            ("run".into(), "V".into(), 14, 5.25, false),
            ("sheep".into(), "N".into(), 11, 3.0, false),
        ]
    );
}

#[test]
fn rerun_without_drop_doubles_everything() {
    let mut conn = raw_db(&corpus(), false);
    compile_frequency_db(&mut conn, options(Variant::Basic, Tagset::Penn)).unwrap();
    let once = lemmas(&conn);

    let rerun = CompileOptions {
        drop_existing: false,
        ..options(Variant::Basic, Tagset::Penn)
    };
    compile_frequency_db(&mut conn, rerun).unwrap();
    let twice = lemmas(&conn);

    assert_eq!(once.len(), twice.len());
    for (a, b) in once.iter().zip(&twice) {
        assert_eq!((&a.0, &a.1), (&b.0, &b.1));
        assert_eq!(b.2, a.2 * 2);
        assert!((b.3 - a.3 * 2.0).abs() < 1e-9);
        assert_eq!(a.4, b.4);
    }

    let word_total: i64 = conn
        .query_row("SELECT SUM(count) FROM word", [], |r| r.get(0))
        .unwrap();
    let raw_total: i64 = conn
        .query_row("SELECT SUM(`count`) FROM colcounts WHERE col1 != '1999'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(word_total, raw_total * 2);
}

#[test]
fn rerun_with_drop_starts_over() {
    let mut conn = raw_db(&corpus(), false);
    compile_frequency_db(&mut conn, options(Variant::Basic, Tagset::Penn)).unwrap();
    let once = lemmas(&conn);
    compile_frequency_db(&mut conn, options(Variant::Basic, Tagset::Penn)).unwrap();
    assert_eq!(lemmas(&conn), once);
}

#[test]
fn stop_units_leave_no_records() {
    let rows = [
        ("123", "123", None, "CD", 5, 1.0),
        ("123.", "123", None, "CD", 1, 1.0),
        ("...", "...", None, ":", 9, 1.0),
        ("pes", "pes", None, "NN", 2, 1.0),
    ];
    let mut conn = raw_db(&rows, false);
    let report = compile_frequency_db(&mut conn, options(Variant::Basic, Tagset::Identity)).unwrap();
    assert_eq!(report.rows, 4);
    assert_eq!(report.stop_rows, 3);
    assert_eq!(lemmas(&conn), vec![("pes".into(), "NN".into(), 2, 1.0, false)]);
    assert_eq!(count_rows(&conn, "word"), 1);
}

#[test]
fn only_stop_units_yield_empty_tables() {
    let rows = [("12", "12", None, "CD", 5, 1.0), ("%", "%", None, "SYM", 1, 1.0)];
    let mut conn = raw_db(&rows, false);
    let report = compile_frequency_db(&mut conn, options(Variant::Basic, Tagset::Penn)).unwrap();
    assert_eq!(report.stop_rows, 2);
    assert_eq!(report.groups, 0);
    assert_eq!(count_rows(&conn, "lemma"), 0);
    assert_eq!(count_rows(&conn, "word"), 0);
}

#[test]
fn sublemma_variant_groups_by_raw_tag() {
    let rows = [
        ("cat", "cat", Some("cat"), "NN", 2, 1.0),
        ("cats", "cat", Some("cat"), "NNS", 3, 1.5),
    ];
    let mut conn = raw_db(&rows, true);
    let report =
        compile_frequency_db(&mut conn, options(Variant::Sublemmas, Tagset::Penn)).unwrap();

    assert_eq!(report.groups, 2);
    assert_eq!(report.merges.lemmas.merged, 1);
    assert_eq!(report.merges.sublemmas.merged, 1);
    assert_eq!(lemmas(&conn), vec![("cat".into(), "N".into(), 5, 2.5, false)]);
    let tally: i64 = conn
        .query_row(
            "SELECT count FROM sublemma WHERE value = 'cat' AND lemma = 'cat' AND pos = 'N'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(tally, 2);
    assert_eq!(count_rows(&conn, "word"), 2);
}

#[test]
fn sublemma_tallies_count_rows_not_corpus_hits() {
    let rows = [
        ("bejt", "být", Some("bejt"), "V", 7, 0.5),
        ("je", "být", Some("být"), "V", 500, 90.0),
        ("jsou", "být", Some("být"), "V", 200, 40.0),
        ("bý", "být", None, "V", 1, 0.1),
    ];
    let mut conn = raw_db(&rows, true);
    compile_frequency_db(&mut conn, options(Variant::Sublemmas, Tagset::Identity)).unwrap();

    let mut stmt = conn
        .prepare("SELECT value, count FROM sublemma ORDER BY value")
        .unwrap();
    let tallies = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(tallies, vec![("bejt".into(), 1), ("být".into(), 2)]);

    let (count, arf): (i64, f64) = conn
        .query_row("SELECT count, arf FROM lemma WHERE value = 'být'", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(count, 708);
    assert!((arf - 130.6).abs() < 1e-9);

    let orphan: Option<String> = conn
        .query_row("SELECT sublemma FROM word WHERE value = 'bý'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(orphan, None);
}

fn word_rows(conn: &Connection) -> Vec<(String, Option<String>, i64, f64)> {
    let mut stmt = conn
        .prepare("SELECT value, sublemma, count, arf FROM word ORDER BY value")
        .unwrap();
    let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
        .unwrap();
    rows.collect::<Result<_, _>>().unwrap()
}

#[test]
fn sublemma_variant_merges_words_without_sublemma() {
    let rows = [
        ("bý", "být", None, "V", 1, 0.1),
        ("bý", "být", None, "V", 2, 0.2),
        ("je", "být", Some("být"), "V", 500, 90.0),
    ];
    let mut conn = raw_db(&rows, true);
    let report =
        compile_frequency_db(&mut conn, options(Variant::Sublemmas, Tagset::Identity)).unwrap();
    assert_eq!(report.merges.words.inserted, 2);
    assert_eq!(report.merges.words.merged, 1);

    let once = word_rows(&conn);
    assert_eq!(once.len(), 2);
    assert_eq!((once[0].0.as_str(), once[0].1.as_deref(), once[0].2), ("bý", None, 3));
    assert!((once[0].3 - 0.3).abs() < 1e-9);

    let rerun = CompileOptions {
        drop_existing: false,
        ..options(Variant::Sublemmas, Tagset::Identity)
    };
    compile_frequency_db(&mut conn, rerun).unwrap();
    let twice = word_rows(&conn);

    assert_eq!(twice.len(), once.len());
    for (a, b) in once.iter().zip(&twice) {
        assert_eq!((&a.0, &a.1), (&b.0, &b.1));
        assert_eq!(b.2, a.2 * 2);
        assert!((b.3 - a.3 * 2.0).abs() < 1e-9);
    }
    let lemma = lemmas(&conn);
    assert_eq!(lemma.len(), 1);
    assert_eq!(lemma[0].2, 1006);
    assert!((lemma[0].3 - 180.6).abs() < 1e-9);
}

#[test]
fn failed_run_commits_nothing() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert!(compile_frequency_db(&mut conn, CompileOptions::default()).is_err());
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('lemma', 'word')",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}
