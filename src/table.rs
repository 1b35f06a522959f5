//! Delimited tables on disk, gzipped or not
//!
//! The corpus metadata ships as pandas-written CSV files, usually gzip-compressed. Compression is
//! detected from the first two bytes of the file rather than from its name, so `protocols.csv`
//! and `protocols.csv.gz` both open the same way. The speech index is the exception: it ships as
//! a feather (Arrow IPC) file and has its own reader.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int32Type, Schema};
use arrow::ipc::reader::FileReader;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use csv::{ReaderBuilder, Reader, StringRecord, StringRecordsIter};
use flate2::read::MultiGzDecoder;
use errors::*;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open a file for reading, decompressing it on the fly if it is gzipped
pub fn open_table<P: AsRef<Path>>(path: P) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .map_err(|err| Error::MissingFile(path.to_path_buf(), err))?;
    let mut magic = Vec::with_capacity(2);
    (&mut file).take(2).read_to_end(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;
    let reader = BufReader::new(file);
    if magic[..] == GZIP_MAGIC[..] {
        debug!("Reading {} as gzip", path.display());
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// A delimited table with a header row
pub struct Table {
    path: PathBuf,
    headers: StringRecord,
    reader: Reader<Box<dyn Read>>,
}

impl Table {
    pub fn open<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Table> {
        let path = path.as_ref().to_path_buf();
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(open_table(&path)?);
        let headers = reader.headers()?.clone();
        Ok(Table { path, headers, reader })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Position of a named column, or a complaint naming the file
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers.iter()
            .position(|header| header == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string(), self.path.clone()))
    }

    pub fn records(&mut self) -> StringRecordsIter<Box<dyn Read>> {
        self.reader.records()
    }
}

/// Parse the year field of a record, saying where it went wrong if it isn't one
pub fn parse_year(record: &StringRecord, column: usize, path: &Path) -> Result<i32> {
    parse_optional_year(record, column, path)?.ok_or_else(|| {
        Error::BadField(format!("{} line {}: year is empty", path.display(), line_of(record)))
    })
}

/// Like `parse_year`, but an empty field is `None` rather than an error
pub fn parse_optional_year(record: &StringRecord, column: usize, path: &Path) -> Result<Option<i32>> {
    let field = record.get(column).unwrap_or("");
    if field.trim().is_empty() {
        return Ok(None);
    }
    field.trim().parse::<i32>().map(Some).map_err(|err| {
        Error::BadField(format!("{} line {}: year '{}' is not an integer ({})",
            path.display(), line_of(record), field, err))
    })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|pos| pos.line()).unwrap_or(0)
}

/// One row of a document index
///
/// Everything besides the name and the year is kept as an uninterpreted string property, in
/// column order, so that filters and pivots can refer to any column of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub document_name: String,
    pub year: i32,
    pub properties: BTreeMap<String, String>,
}

impl DocumentRecord {
    pub fn new<S: Into<String>>(document_name: S, year: i32) -> Self {
        DocumentRecord {
            document_name: document_name.into(),
            year: year,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up any column by name, including `document_name` and `year`
    pub fn property(&self, key: &str) -> Option<String> {
        match key {
            "document_name" => Some(self.document_name.clone()),
            "year" => Some(self.year.to_string()),
            _ => self.properties.get(key).cloned(),
        }
    }
}

/// Read a document index: `document_name`, `year`, and any number of other columns
///
/// Unnamed columns (pandas writes its row index that way) are dropped.
pub fn read_document_index<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<DocumentRecord>> {
    let mut table = Table::open(path, delimiter)?;
    let name_col = table.column("document_name")?;
    let year_col = table.column("year")?;
    let extra: Vec<(usize, String)> = table.headers().iter()
        .enumerate()
        .filter(|&(ix, name)| ix != name_col && ix != year_col && !name.trim().is_empty())
        .map(|(ix, name)| (ix, name.to_string()))
        .collect();
    let path = table.path().to_path_buf();

    let mut index = vec![];
    for record in table.records() {
        let record = record?;
        let mut doc = DocumentRecord::new(
            record.get(name_col).unwrap_or(""),
            parse_year(&record, year_col, &path)?);
        for &(ix, ref name) in extra.iter() {
            doc.properties.insert(name.clone(), record.get(ix).unwrap_or("").to_string());
        }
        index.push(doc);
    }
    info!("Read {} documents from {}", index.len(), path.display());
    Ok(index)
}

fn feather_column(schema: &Schema, name: &str, path: &Path) -> Result<usize> {
    schema.index_of(name).map_err(|_| Error::MissingColumn(name.to_string(), path.to_path_buf()))
}

/// Read a speech index stored as feather (Arrow IPC file format)
///
/// The records come out like those of `read_document_index`: every column besides `document_name`
/// and `year` is rendered as a string property, nulls as empty strings. Index columns pandas may
/// have stored are dropped.
pub fn read_speech_index<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| Error::MissingFile(path.to_path_buf(), err))?;
    let reader = FileReader::try_new(BufReader::new(file), None)?;
    let schema = reader.schema();
    let name_col = feather_column(&schema, "document_name", path)?;
    let year_col = feather_column(&schema, "year", path)?;
    let extra: Vec<(usize, String)> = schema.fields().iter()
        .enumerate()
        .filter(|&(ix, field)| ix != name_col && ix != year_col
            && !field.name().trim().is_empty() && !field.name().starts_with("__index_level_"))
        .map(|(ix, field)| (ix, field.name().clone()))
        .collect();

    let options = FormatOptions::default();
    let mut index = vec![];
    for batch in reader {
        let batch = batch?;
        let years = cast(batch.column(year_col), &DataType::Int32)?;
        let years = years.as_primitive::<Int32Type>();
        let names = ArrayFormatter::try_new(batch.column(name_col).as_ref(), &options)?;
        let mut properties = Vec::with_capacity(extra.len());
        for &(ix, _) in extra.iter() {
            properties.push(ArrayFormatter::try_new(batch.column(ix).as_ref(), &options)?);
        }
        for row in 0..batch.num_rows() {
            if years.is_null(row) {
                return Err(Error::BadField(format!("{} row {}: year is missing or not an integer",
                    path.display(), index.len())));
            }
            let mut doc = DocumentRecord::new(names.value(row).to_string(), years.value(row));
            for (&(_, ref name), formatter) in extra.iter().zip(properties.iter()) {
                doc.properties.insert(name.clone(), formatter.value(row).to_string());
            }
            index.push(doc);
        }
    }
    info!("Read {} speeches from {}", index.len(), path.display());
    Ok(index)
}
