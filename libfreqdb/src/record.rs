use serde::{Deserialize, Serialize};

/// One row of the raw count table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCountRow {
    pub form: String,
    pub lemma: String,
    pub sublemma: Option<String>,
    pub tag: String,
    pub count: i64,
    pub arf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemmaRecord {
    pub value: String,
    pub pos: String,
    pub count: i64,
    pub arf: f64,
    pub is_proper_name: bool,
}

/// Occurrence tally of a sublemma within its lemma group. Unlike the other
/// records, `count` is the number of raw rows seen, not a summed corpus count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SublemmaRecord {
    pub value: String,
    pub lemma: String,
    pub pos: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub value: String,
    pub lemma: String,
    pub sublemma: Option<String>,
    pub pos: String,
    pub count: i64,
    pub arf: f64,
}

/// A completed lemma group as emitted by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub lemma: LemmaRecord,
    pub sublemmas: Vec<SublemmaRecord>,
    pub words: Vec<WordRecord>,
}
