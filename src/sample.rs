//! Draw a fixed number of protocols per year from the corpus metadata
//!
//! The metadata table has one row per protocol. Rows are grouped by year, and each year in the
//! requested range contributes exactly `n` draws: without replacement when the year has at least
//! `n` protocols, with replacement (so possibly repeating a protocol) when it has fewer. A year
//! with no protocols at all contributes nothing and is only mentioned in the log.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use rand::Rng;
use rand::seq::index;
use errors::*;
use table::{Table, parse_optional_year};

/// Where the metadata lives on the project's data server
pub const DEFAULT_METADATA: &'static str = "/data/riksdagen_corpus_data/metadata/v0.10.0/protocols.csv.gz";
/// Protocols are stored as ParlaClarin XML, one file per document name
pub const FILE_SUFFIX: &'static str = ".xml";

/// The two metadata columns the sampler needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolRow {
    pub document_name: String,
    pub year: i32,
}

impl ProtocolRow {
    pub fn new<S: Into<String>>(document_name: S, year: i32) -> Self {
        ProtocolRow { document_name: document_name.into(), year: year }
    }

    /// Name of the file holding this protocol
    pub fn file_name(&self) -> String {
        format!("{}{}", self.document_name, FILE_SUFFIX)
    }
}

/// Everything `create_sample_n_titles` needs besides a source of randomness
#[derive(Debug, Clone)]
pub struct SampleOpts {
    pub years: Vec<i32>,
    pub n_samples_per_year: usize,
    pub metadata: PathBuf,
    pub output: PathBuf,
}

impl Default for SampleOpts {
    fn default() -> Self {
        SampleOpts {
            years: (1960..2021).collect(),
            n_samples_per_year: 3,
            metadata: PathBuf::from(DEFAULT_METADATA),
            output: PathBuf::from("protocols.txt"),
        }
    }
}

/// Read `document_name` and `year` from a tab separated (usually gzipped) metadata table
pub fn read_protocols<P: AsRef<Path>>(path: P) -> Result<Vec<ProtocolRow>> {
    let mut table = Table::open(path, b'\t')?;
    let name_col = table.column("document_name")?;
    let year_col = table.column("year")?;
    let path = table.path().to_path_buf();
    let mut rows = vec![];
    let mut undated = 0;
    for record in table.records() {
        let record = record?;
        match parse_optional_year(&record, year_col, &path)? {
            Some(year) => rows.push(ProtocolRow {
                document_name: record.get(name_col).unwrap_or("").to_string(),
                year: year,
            }),
            None => undated += 1,
        }
    }
    if undated > 0 {
        warn!("Skipped {} protocols without a year in {}", undated, path.display());
    }
    info!("Read {} protocols from {}", rows.len(), path.display());
    Ok(rows)
}

/// Sample `n` rows for every requested year, in ascending year order
pub fn sample_per_year<I, R>(rows: &[ProtocolRow], years: I, n: usize, rng: &mut R)
    -> Result<Vec<ProtocolRow>>
    where I: IntoIterator<Item=i32>, R: Rng + ?Sized {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "the number of samples per year must be at least one".to_string()));
    }
    let wanted: BTreeSet<i32> = years.into_iter().collect();
    let mut groups: BTreeMap<i32, Vec<&ProtocolRow>> = BTreeMap::new();
    for row in rows.iter().filter(|row| wanted.contains(&row.year)) {
        groups.entry(row.year).or_insert_with(Vec::new).push(row);
    }
    for year in wanted.iter().filter(|year| !groups.contains_key(*year)) {
        warn!("No protocols for {}, skipping it", year);
    }

    let mut sample = Vec::with_capacity(n * groups.len());
    for (year, group) in groups.iter() {
        let picks: Vec<usize> = if group.len() < n {
            debug!("Only {} protocols for {}, sampling {} with replacement", group.len(), year, n);
            (0..n).map(|_| rng.gen_range(0..group.len())).collect()
        } else {
            index::sample(rng, group.len(), n).into_vec()
        };
        sample.extend(picks.into_iter().map(|ix| group[ix].clone()));
    }
    Ok(sample)
}

/// File names for the sampled rows, in the same order
pub fn sample_file_names(rows: &[ProtocolRow]) -> Vec<String> {
    rows.iter().map(ProtocolRow::file_name).collect()
}

/// Write one name per line, replacing whatever was at `path`
pub fn write_sample<P: AsRef<Path>>(path: P, names: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for name in names {
        writeln!(writer, "{}", name)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the metadata, sample it and write the file names. Returns how many lines were written.
pub fn create_sample_n_titles<R: Rng + ?Sized>(opts: &SampleOpts, rng: &mut R) -> Result<usize> {
    let rows = read_protocols(&opts.metadata)?;
    let sample = sample_per_year(&rows, opts.years.iter().cloned(), opts.n_samples_per_year, rng)?;
    let names = sample_file_names(&sample);
    write_sample(&opts.output, &names)?;
    info!("Wrote {} protocol names to {}", names.len(), opts.output.display());
    Ok(names.len())
}
