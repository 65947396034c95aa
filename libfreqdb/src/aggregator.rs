//! Streaming group-by over rows sorted by lemma.
//!
//! [`Aggregator`] keeps exactly one open group. A group is closed when a row
//! with a different grouping key arrives, and once more after the input is
//! exhausted, so the last group is never lost.

use std::collections::BTreeMap;

use crate::{
    record::{Group, LemmaRecord, RawCountRow, SublemmaRecord, WordRecord},
    source::Variant,
    tagset::Tagset,
    util, Result,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregatorOptions {
    pub variant: Variant,
    pub tagset: Tagset,
    /// Reduce lemmas to their base form before grouping.
    pub strip_lemma_suffix: bool,
}

/// Lemma plus either the part of speech (basic variant) or the raw source
/// tag (sublemma variant). Tags normalizing to the same code stay separate
/// in the latter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupKey {
    lemma: String,
    class: String,
}

#[derive(Debug)]
struct Accumulator {
    key: GroupKey,
    pos: String,
    words: Vec<WordRecord>,
    sublemmas: BTreeMap<String, i64>,
}

pub struct Aggregator<I> {
    rows: I,
    options: AggregatorOptions,
    open: Option<Accumulator>,
    num_rows: u64,
    num_stop: u64,
    finished: bool,
}

impl<I> Aggregator<I>
where
    I: Iterator<Item = Result<RawCountRow>>,
{
    pub fn new(rows: I, options: AggregatorOptions) -> Self {
        Self {
            rows,
            options,
            open: None,
            num_rows: 0,
            num_stop: 0,
            finished: false,
        }
    }

    /// Rows discarded as stop units so far.
    pub fn num_stop(&self) -> u64 {
        self.num_stop
    }

    /// Rows read from the source so far, stop units included.
    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }
}

impl<I> Iterator for Aggregator<I>
where
    I: Iterator<Item = Result<RawCountRow>>,
{
    type Item = Result<Group>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        for row in self.rows.by_ref() {
            let mut row = match row {
                Ok(row) => row,
                Err(err) => {
                    self.finished = true;
                    self.open = None;
                    return Some(Err(err));
                }
            };
            self.num_rows += 1;
            if self.options.strip_lemma_suffix {
                row.lemma = util::base_form(&row.lemma).to_string();
            }
            if util::is_stop_unit(&row.lemma) {
                self.num_stop += 1;
                continue;
            }

            let key = self.options.group_key(&row);
            match self.open.take() {
                Some(mut acc) if acc.key == key => {
                    acc.push(row, self.options.tagset);
                    self.open = Some(acc);
                }
                previous => {
                    let pos = self.options.tagset.normalize(&row.tag).to_string();
                    let mut acc = Accumulator::new(key, pos);
                    acc.push(row, self.options.tagset);
                    self.open = Some(acc);
                    if let Some(done) = previous {
                        return Some(Ok(done.finish()));
                    }
                }
            }
        }

        // Tail flush
        self.finished = true;
        self.open.take().map(|acc| Ok(acc.finish()))
    }
}

impl AggregatorOptions {
    fn group_key(&self, row: &RawCountRow) -> GroupKey {
        let class = match self.variant {
            Variant::Basic => self.tagset.normalize(&row.tag),
            Variant::Sublemmas => row.tag.as_str(),
        };
        GroupKey {
            lemma: row.lemma.clone(),
            class: class.to_string(),
        }
    }
}

impl Accumulator {
    fn new(key: GroupKey, pos: String) -> Self {
        Self {
            key,
            pos,
            words: Vec::new(),
            sublemmas: BTreeMap::new(),
        }
    }

    fn push(&mut self, row: RawCountRow, tagset: Tagset) {
        if let Some(sublemma) = &row.sublemma {
            *self.sublemmas.entry(sublemma.clone()).or_default() += 1;
        }
        self.words.push(WordRecord {
            pos: tagset.normalize(&row.tag).to_string(),
            value: row.form,
            lemma: row.lemma,
            sublemma: row.sublemma,
            count: row.count,
            arf: row.arf,
        });
    }

    fn finish(self) -> Group {
        let Accumulator {
            key,
            pos,
            words,
            sublemmas,
        } = self;
        let lemma = LemmaRecord {
            is_proper_name: util::is_proper_name(&key.lemma),
            count: words.iter().map(|w| w.count).sum(),
            arf: words.iter().map(|w| w.arf).sum(),
            value: key.lemma,
            pos,
        };
        let sublemmas = sublemmas
            .into_iter()
            .map(|(value, count)| SublemmaRecord {
                value,
                lemma: lemma.value.clone(),
                pos: lemma.pos.clone(),
                count,
            })
            .collect();
        Group {
            lemma,
            sublemmas,
            words,
        }
    }
}
