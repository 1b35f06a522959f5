//! Word trends: how often chosen words are used over time, per group of speakers
//!
//! The documents of a vectorized corpus are filtered on their metadata, then summed per period
//! (year, lustrum or decade) and per combination of pivot keys such as `party_id`. The rows of
//! the result can be normalized to relative frequencies and smoothed over neighbouring periods.
//!
//! Only raw term frequency is computed here. Other keyness metrics belong to the analytics
//! library behind `TrendsCompute`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use ndarray::prelude::*;
use errors::*;
use codecs::PersonCodecs;
use corpus::VectorizedCorpus;
use table::DocumentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeynessMetric {
    TF,
    TFIDF,
    PPMI,
    LLR,
    DICE,
}

impl FromStr for KeynessMetric {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tf" => Ok(KeynessMetric::TF),
            "tf_idf" | "tfidf" => Ok(KeynessMetric::TFIDF),
            "ppmi" => Ok(KeynessMetric::PPMI),
            "llr" => Ok(KeynessMetric::LLR),
            "dice" => Ok(KeynessMetric::DICE),
            _ => Err(Error::InvalidArgument(format!("unknown keyness metric '{}'", s))),
        }
    }
}

/// How years are bucketed into periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKey {
    Year,
    Lustrum,
    Decade,
}

impl TemporalKey {
    pub fn name(&self) -> &'static str {
        match *self {
            TemporalKey::Year => "year",
            TemporalKey::Lustrum => "lustrum",
            TemporalKey::Decade => "decade",
        }
    }

    pub fn step(&self) -> i32 {
        match *self {
            TemporalKey::Year => 1,
            TemporalKey::Lustrum => 5,
            TemporalKey::Decade => 10,
        }
    }

    /// First year of the period holding `year`
    pub fn period(&self, year: i32) -> i32 {
        year - year.rem_euclid(self.step())
    }
}

impl FromStr for TemporalKey {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "year" => Ok(TemporalKey::Year),
            "lustrum" => Ok(TemporalKey::Lustrum),
            "decade" => Ok(TemporalKey::Decade),
            _ => Err(Error::InvalidArgument(format!("unknown temporal key '{}'", s))),
        }
    }
}

/// Accepted values per document property. A document must match every property named.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    accepted: BTreeMap<String, BTreeSet<String>>,
}

impl PropertyFilter {
    pub fn new() -> Self {
        PropertyFilter::default()
    }

    /// Also accept `value` for `key`
    pub fn with<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.accepted.entry(key.into()).or_insert_with(BTreeSet::new).insert(value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn accepts(&self, doc: &DocumentRecord) -> bool {
        self.accepted.iter().all(|(key, values)| {
            doc.property(key).map_or(false, |value| values.contains(&value))
        })
    }
}

/// What to compute
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeOpts {
    /// Add zero rows for periods without documents
    pub fill_gaps: bool,
    pub keyness: KeynessMetric,
    /// Relative instead of absolute frequencies
    pub normalize: bool,
    pub pivot_keys_id_names: Vec<String>,
    pub filter_opts: PropertyFilter,
    /// Three period moving average
    pub smooth: bool,
    pub temporal_key: TemporalKey,
    /// Most words `find_word_indices` returns
    pub top_count: usize,
    /// One row per period, with pivot values moved into the column names
    pub unstack_tabular: bool,
    /// Words or `|regex|` patterns
    pub words: Vec<String>,
}

impl Default for ComputeOpts {
    fn default() -> Self {
        ComputeOpts {
            fill_gaps: false,
            keyness: KeynessMetric::TF,
            normalize: false,
            pivot_keys_id_names: vec![],
            filter_opts: PropertyFilter::new(),
            smooth: false,
            temporal_key: TemporalKey::Year,
            top_count: 100,
            unstack_tabular: false,
            words: vec![],
        }
    }
}

/// The result of a trends computation: some key columns, then one value column per word
#[derive(Debug, Clone, PartialEq)]
pub struct TrendsTable {
    key_columns: Vec<String>,
    keys: Vec<Vec<String>>,
    value_columns: Vec<String>,
    values: Array2<f64>,
}

impl TrendsTable {
    pub fn new(key_columns: Vec<String>, keys: Vec<Vec<String>>, value_columns: Vec<String>,
        values: Array2<f64>) -> Result<TrendsTable> {
        if keys.len() != values.nrows()
            || keys.iter().any(|row| row.len() != key_columns.len())
            || value_columns.len() != values.ncols() {
            return Err(Error::InvalidDimensions(format!(
                "{} key columns and {} value columns don't fit {} key rows and a {}x{} matrix",
                key_columns.len(), value_columns.len(), keys.len(), values.nrows(), values.ncols())));
        }
        Ok(TrendsTable { key_columns, keys, value_columns, values })
    }

    pub fn columns(&self) -> Vec<&str> {
        self.key_columns.iter().chain(self.value_columns.iter()).map(|c| c.as_str()).collect()
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    pub fn keys(&self) -> &[Vec<String>] {
        &self.keys
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.key_columns.iter().position(|c| c == column)?;
        self.keys.get(row).map(|keys| keys[col].as_str())
    }

    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let col = self.value_columns.iter().position(|c| c == column)?;
        self.values.get((row, col)).cloned()
    }

    /// The first `n` rows
    pub fn head(&self, n: usize) -> TrendsTable {
        let n = ::std::cmp::min(n, self.len());
        TrendsTable {
            key_columns: self.key_columns.clone(),
            keys: self.keys[..n].to_vec(),
            value_columns: self.value_columns.clone(),
            values: self.values.slice(s![..n, ..]).to_owned(),
        }
    }

    /// Same values under different keys, which must have as many rows
    pub fn with_keys(&self, key_columns: Vec<String>, keys: Vec<Vec<String>>) -> Result<TrendsTable> {
        TrendsTable::new(key_columns, keys, self.value_columns.clone(), self.values.clone())
    }
}

impl fmt::Display for TrendsTable {
    /// Tab separated, header first
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.columns().join("\t"))?;
        for (keys, values) in self.keys.iter().zip(self.values.outer_iter()) {
            let cells: Vec<String> = keys.iter().cloned()
                .chain(values.iter().map(|v| v.to_string()))
                .collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}

/// The interface to whatever computes trends
pub trait TrendsCompute {
    /// Filter, group, and optionally fill, normalize and smooth the corpus
    fn transform(&mut self, opts: &ComputeOpts) -> Result<()>;
    /// The corpus as of the last `transform`
    fn transformed_corpus(&self) -> Option<&VectorizedCorpus>;
    /// Columns of the transformed corpus for the words in `opts`
    fn find_word_indices(&self, opts: &ComputeOpts) -> Result<Vec<usize>>;
    /// A table of the transformed corpus restricted to the given columns
    fn extract(&self, indices: &[usize]) -> Result<TrendsTable>;
}

/// Grouping key of a transformed row. Pivot values first so that each pivot combination's
/// periods are adjacent and in order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TrendsKey {
    pivot: Vec<String>,
    period: i32,
}

struct Transformed {
    corpus: VectorizedCorpus,
    opts: ComputeOpts,
}

/// Term frequency trends over a vectorized corpus
pub struct TrendsData<C: PersonCodecs> {
    corpus: VectorizedCorpus,
    pub person_codecs: C,
    n_top: usize,
    transformed: Option<Transformed>,
}

fn pivot_values(doc: &DocumentRecord, keys: &[String]) -> Vec<String> {
    keys.iter().map(|key| doc.property(key).unwrap_or_default()).collect()
}

/// Runs of adjacent rows sharing pivot values
fn pivot_runs(index: &[DocumentRecord], keys: &[String]) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = vec![];
    for ix in 0..index.len() {
        let starts_run = ix == 0 || pivot_values(&index[ix - 1], keys) != pivot_values(&index[ix], keys);
        if starts_run {
            runs.push(ix..ix + 1);
        } else if let Some(run) = runs.last_mut() {
            run.end = ix + 1;
        }
    }
    runs
}

fn describe_group(key: &TrendsKey, n_documents: usize, opts: &ComputeOpts) -> DocumentRecord {
    let mut name = vec![key.period.to_string()];
    name.extend(key.pivot.iter().cloned());
    let mut doc = DocumentRecord::new(name.join("_"), key.period)
        .with_property("n_documents", n_documents.to_string());
    if opts.temporal_key != TemporalKey::Year {
        doc = doc.with_property(opts.temporal_key.name(), key.period.to_string());
    }
    for (pivot_key, value) in opts.pivot_keys_id_names.iter().zip(key.pivot.iter()) {
        doc = doc.with_property(pivot_key.as_str(), value.as_str());
    }
    doc
}

fn fill_gaps(corpus: &VectorizedCorpus, opts: &ComputeOpts) -> Result<VectorizedCorpus> {
    let step = opts.temporal_key.step();
    let index = corpus.document_index();
    let mut rows: Vec<ArrayView1<f64>> = vec![];
    let mut records: Vec<DocumentRecord> = vec![];
    let zeros = Array1::<f64>::zeros(corpus.n_terms());
    for run in pivot_runs(index, &opts.pivot_keys_id_names) {
        let mut next = index[run.start].year;
        for ix in run {
            while next < index[ix].year {
                let key = TrendsKey { pivot: pivot_values(&index[ix], &opts.pivot_keys_id_names), period: next };
                records.push(describe_group(&key, 0, opts));
                rows.push(zeros.view());
                next += step;
            }
            records.push(index[ix].clone());
            rows.push(corpus.data().row(ix));
            next = index[ix].year + step;
        }
    }
    if records.len() > index.len() {
        debug!("Filled {} empty periods", records.len() - index.len());
    }
    let data = if rows.is_empty() {
        Array2::zeros((0, corpus.n_terms()))
    } else {
        ::ndarray::stack(Axis(0), &rows)?
    };
    VectorizedCorpus::new(data, corpus.vocabulary().clone(), records)
}

/// Centered three period moving average within each pivot combination
fn smooth(corpus: &VectorizedCorpus, opts: &ComputeOpts) -> Result<VectorizedCorpus> {
    let source = corpus.data();
    let mut data = source.clone();
    for run in pivot_runs(corpus.document_index(), &opts.pivot_keys_id_names) {
        for ix in run.clone() {
            let lo = ::std::cmp::max(run.start, ix.saturating_sub(1));
            let hi = ::std::cmp::min(run.end, ix + 2);
            let window = source.slice(s![lo..hi, ..]);
            data.row_mut(ix).assign(&(window.sum_axis(Axis(0)) / (hi - lo) as f64));
        }
    }
    VectorizedCorpus::new(data, corpus.vocabulary().clone(), corpus.document_index().to_vec())
}

impl<C: PersonCodecs> TrendsData<C> {
    /// `n_top` limits word lookups to the most frequent words of the corpus
    pub fn new(corpus: VectorizedCorpus, person_codecs: C, n_top: usize) -> Self {
        TrendsData { corpus, person_codecs, n_top, transformed: None }
    }

    pub fn corpus(&self) -> &VectorizedCorpus {
        &self.corpus
    }

    fn transformed(&self) -> Result<&Transformed> {
        self.transformed.as_ref()
            .ok_or_else(|| Error::Other("The trends data has not been transformed yet".to_string()))
    }
}

impl<C: PersonCodecs> TrendsCompute for TrendsData<C> {
    fn transform(&mut self, opts: &ComputeOpts) -> Result<()> {
        if opts.keyness != KeynessMetric::TF {
            return Err(Error::Unsupported(format!(
                "{:?} keyness; only raw term frequencies are computed locally", opts.keyness)));
        }
        let filtered = if opts.filter_opts.is_empty() {
            self.corpus.filter(|_| true)
        } else {
            self.corpus.filter(|doc| opts.filter_opts.accepts(doc))
        };
        info!("{} of {} documents pass the filter", filtered.n_docs(), self.corpus.n_docs());

        let temporal_key = opts.temporal_key;
        let pivot_keys = &opts.pivot_keys_id_names;
        let mut corpus = filtered.group_by(
            |doc| TrendsKey { pivot: pivot_values(doc, pivot_keys), period: temporal_key.period(doc.year) },
            |key, n| describe_group(key, n, opts));
        if opts.fill_gaps {
            corpus = fill_gaps(&corpus, opts)?;
        }
        if opts.normalize {
            corpus = corpus.normalize();
        }
        if opts.smooth {
            corpus = smooth(&corpus, opts)?;
        }
        self.transformed = Some(Transformed { corpus, opts: opts.clone() });
        Ok(())
    }

    fn transformed_corpus(&self) -> Option<&VectorizedCorpus> {
        self.transformed.as_ref().map(|t| &t.corpus)
    }

    fn find_word_indices(&self, opts: &ComputeOpts) -> Result<Vec<usize>> {
        let transformed = self.transformed()?;
        let vocabulary = transformed.corpus.vocabulary();
        let counts = self.corpus.word_counts();
        let counts = counts.as_slice().unwrap_or(&[]);
        let top: BTreeSet<usize> = vocabulary.rank(0..vocabulary.len(), counts, self.n_top, true)?
            .into_iter()
            .collect();
        let candidates: Vec<usize> = vocabulary.matching_ids(&opts.words)?
            .into_iter()
            .filter(|id| top.contains(id))
            .collect();
        vocabulary.rank(candidates, counts, opts.top_count, true)
    }

    fn extract(&self, indices: &[usize]) -> Result<TrendsTable> {
        let transformed = self.transformed()?;
        let corpus = &transformed.corpus;
        let opts = &transformed.opts;
        if let Some(&bad) = indices.iter().find(|&&ix| ix >= corpus.n_terms()) {
            return Err(Error::InvalidDimensions(format!(
                "column {} is outside a vocabulary of {} tokens", bad, corpus.n_terms())));
        }
        let words: Vec<String> = indices.iter()
            .map(|&ix| corpus.vocabulary().token(ix).unwrap_or_default().to_string())
            .collect();
        let values = corpus.data().select(Axis(1), indices);
        let temporal = opts.temporal_key.name().to_string();
        let periods: Vec<i32> = corpus.document_index().iter().map(|doc| doc.year).collect();

        if !opts.unstack_tabular || opts.pivot_keys_id_names.is_empty() {
            let mut key_columns = vec![temporal];
            key_columns.extend(opts.pivot_keys_id_names.iter().cloned());
            let keys = corpus.document_index().iter().zip(periods.iter())
                .map(|(doc, period)| {
                    let mut row = vec![period.to_string()];
                    row.extend(pivot_values(doc, &opts.pivot_keys_id_names));
                    row
                })
                .collect();
            return TrendsTable::new(key_columns, keys, words, values);
        }

        // Unstacked: one row per period, one column per pivot combination and word
        let distinct_periods: Vec<i32> = periods.iter().cloned().collect::<BTreeSet<i32>>()
            .into_iter().collect();
        let combos: Vec<Vec<String>> = corpus.document_index().iter()
            .map(|doc| pivot_values(doc, &opts.pivot_keys_id_names))
            .collect::<BTreeSet<Vec<String>>>()
            .into_iter().collect();
        let mut columns = vec![];
        for combo in combos.iter() {
            let label: Vec<String> = opts.pivot_keys_id_names.iter().zip(combo.iter())
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            for word in words.iter() {
                columns.push(format!("{} {}", word, label.join(" ")));
            }
        }
        let mut unstacked = Array2::<f64>::zeros((distinct_periods.len(), columns.len()));
        for (row, doc) in corpus.document_index().iter().enumerate() {
            let combo = pivot_values(doc, &opts.pivot_keys_id_names);
            let period_ix = distinct_periods.binary_search(&doc.year).unwrap_or(0);
            let combo_ix = combos.binary_search(&combo).unwrap_or(0);
            for word_ix in 0..words.len() {
                unstacked[[period_ix, combo_ix * words.len() + word_ix]] = values[[row, word_ix]];
            }
        }
        let keys = distinct_periods.iter().map(|period| vec![period.to_string()]).collect();
        TrendsTable::new(vec![temporal], keys, columns, unstacked)
    }
}
