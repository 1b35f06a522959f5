extern crate arrow;
extern crate flate2;
extern crate riksprot;
extern crate tempfile;

use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use arrow::array::{ArrayRef, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use riksprot::table::{read_document_index, read_speech_index};

/// Needs the 1867-2020 release checked out under `data/`; only used for development & debugging
#[test]
#[ignore]
fn release_indices_load() {
    let speeches = read_speech_index("data/1867-2020/v1.1.0/speech-index.feather").unwrap();
    assert!(speeches.len() > 0);

    let index = read_document_index("data/1867-2020/v1.1.0/dtm/lemma/lemma_document_index.csv.gz", b';')
        .unwrap();
    assert!(index.len() > 0);
}

#[test]
fn speech_index_reads_back_from_feather() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("speech-index.feather");
    let schema = Arc::new(Schema::new(vec![
        Field::new("speech_id", DataType::Utf8, false),
        Field::new("document_name", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("party_id", DataType::Int32, true),
        Field::new("n_tokens", DataType::Int64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["i-1", "i-2", "i-3"])),
        Arc::new(StringArray::from(vec!["prot-1970--ak--1_001", "prot-1970--ak--1_002", "prot-1971--ak--3_001"])),
        Arc::new(Int64Array::from(vec![1970i64, 1970, 1971])),
        Arc::new(Int32Array::from(vec![Some(3), None, Some(4)])),
        Arc::new(Int64Array::from(vec![120i64, 87, 45])),
    ];
    // two batches, like a file written in chunks
    let mut writer = FileWriter::try_new(File::create(&path).unwrap(), &schema).unwrap();
    writer.write(&RecordBatch::try_new(schema.clone(), columns.clone()).unwrap().slice(0, 2)).unwrap();
    writer.write(&RecordBatch::try_new(schema.clone(), columns).unwrap().slice(2, 1)).unwrap();
    writer.finish().unwrap();

    let index = read_speech_index(&path).unwrap();

    assert_eq!(index.len(), 3);
    assert_eq!(index[0].document_name, "prot-1970--ak--1_001");
    assert_eq!(index[2].year, 1971);
    assert_eq!(index[0].property("speech_id"), Some("i-1".to_string()));
    assert_eq!(index[1].property("party_id"), Some("".to_string()));
    assert_eq!(index[2].property("party_id"), Some("4".to_string()));
    assert_eq!(index[2].property("n_tokens"), Some("45".to_string()));
    assert_eq!(index[0].properties.len(), 3);
}

#[test]
fn document_index_keeps_speaker_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lemma_document_index.csv.gz");
    let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    write!(enc, "{}", concat!(
        ";document_name;year;document_id;who;person_id;party_id;gender_id;n_tokens\n",
        "0;prot-1970--ak--1_001;1970;0;i-1;5;3;1;120\n",
        "1;prot-1970--ak--1_002;1970;1;i-2;8;4;2;87\n",
        "2;prot-1971--ak--3_001;1971;2;i-1;5;3;1;45\n",
    )).unwrap();
    enc.finish().unwrap();

    let index = read_document_index(&path, b';').unwrap();

    assert_eq!(index.len(), 3);
    assert_eq!(index[1].document_name, "prot-1970--ak--1_002");
    assert_eq!(index[2].year, 1971);
    assert_eq!(index[1].property("gender_id"), Some("2".to_string()));
    assert_eq!(index[0].property("who"), Some("i-1".to_string()));
    assert_eq!(index[0].properties.len(), 6);
}
