//! Load a corpus from disk and compute trends the way the notebooks do
#[macro_use] extern crate ndarray;
extern crate riksprot;
extern crate tempfile;

use tempfile::TempDir;

use riksprot::codecs::PersonCodecs;
use riksprot::corpus::VectorizedCorpus;
use riksprot::table::DocumentRecord;
use riksprot::trends::{ComputeOpts, KeynessMetric, PropertyFilter, TemporalKey, TrendsCompute, TrendsData};
use riksprot::vocab::Vocabulary;

/// Stands in for the metadata database
struct Codecs;

impl PersonCodecs for Codecs {
    fn decode_value(&self, column: &str, value: &str) -> Option<(String, String)> {
        let decoded = match (column, value) {
            ("party_id", "3") => "S",
            ("party_id", "4") => "M",
            ("gender_id", "1") => "man",
            ("gender_id", "2") => "woman",
            _ => return None,
        };
        Some((column.trim_end_matches("_id").to_string(), decoded.to_string()))
    }
}

fn save_corpus(dir: &TempDir) {
    let vocab = Vocabulary::from_tokens(vec!["sverige", "jag", "och", "riksdagen"]).unwrap();
    let doc = |name: &str, year: i32, party: &str, gender: &str| {
        DocumentRecord::new(name, year)
            .with_property("party_id", party)
            .with_property("gender_id", gender)
    };
    let index = vec![
        doc("prot-1970--ak--1_001", 1970, "3", "1"),
        doc("prot-1970--ak--1_002", 1970, "3", "2"),
        doc("prot-1970--ak--1_003", 1970, "4", "2"),
        doc("prot-1971--ak--2_001", 1971, "4", "2"),
        doc("prot-1973--ak--5_001", 1973, "3", "2"),
        doc("prot-1992--ak--3_001", 1992, "4", "1"),
    ];
    let data = array![
        [2.0, 1.0, 9.0, 1.0],
        [1.0, 2.0, 8.0, 0.0],
        [3.0, 0.0, 7.0, 2.0],
        [0.0, 4.0, 6.0, 1.0],
        [5.0, 1.0, 5.0, 0.0],
        [1.0, 1.0, 2.0, 2.0],
    ];
    VectorizedCorpus::new(data, vocab, index).unwrap().save(dir.path(), "lemma").unwrap();
}

#[test]
fn trends_by_party_for_women() {
    let dir = TempDir::new().unwrap();
    save_corpus(&dir);
    let corpus = VectorizedCorpus::load(dir.path(), "lemma").unwrap();
    let mut trends_data = TrendsData::new(corpus, Codecs, 100000);

    let opts = ComputeOpts {
        fill_gaps: false,
        keyness: KeynessMetric::TF,
        normalize: false,
        pivot_keys_id_names: vec!["party_id".to_string()],
        filter_opts: PropertyFilter::new().with("gender_id", 2),
        smooth: false,
        temporal_key: TemporalKey::Year,
        top_count: 100,
        unstack_tabular: false,
        words: vec!["sverige".to_string(), "jag".to_string()],
    };
    trends_data.transform(&opts).unwrap();

    let picked = trends_data.find_word_indices(&opts).unwrap();
    // sverige (12) is used more than jag (9)
    assert_eq!(picked, vec![0, 1]);

    let trends = trends_data.extract(&picked).unwrap();
    println!("{}", trends.head(5));
    assert_eq!(trends.columns(), vec!["year", "party_id", "sverige", "jag"]);
    assert_eq!(trends.len(), 4);

    let decoded = trends_data.person_codecs.decode(&trends, true).unwrap();
    println!("{}", decoded.head(5));
    assert_eq!(decoded.columns(), vec!["year", "party", "sverige", "jag"]);
    // S 1970, S 1973, M 1970, M 1971
    assert_eq!(decoded.key(0, "party"), Some("S"));
    assert_eq!(decoded.value(1, "sverige"), Some(5.0));
    assert_eq!(decoded.key(2, "party"), Some("M"));
    assert_eq!(decoded.value(3, "jag"), Some(4.0));

    let transformed = trends_data.transformed_corpus().unwrap();
    let ascending = transformed.find_matching_words_indices(&["sverige", "jag"], 100, false).unwrap();
    assert_eq!(ascending, vec![1, 0]);
}

#[test]
fn decade_shares_with_gaps_and_smoothing() {
    let dir = TempDir::new().unwrap();
    save_corpus(&dir);
    let corpus = VectorizedCorpus::load(dir.path(), "lemma").unwrap();
    let mut trends_data = TrendsData::new(corpus, Codecs, 100000);

    let opts = ComputeOpts {
        fill_gaps: true,
        normalize: true,
        smooth: true,
        temporal_key: TemporalKey::Decade,
        words: vec!["|sverige|riksdagen|".to_string()],
        ..ComputeOpts::default()
    };
    trends_data.transform(&opts).unwrap();
    let picked = trends_data.find_word_indices(&opts).unwrap();
    assert_eq!(picked, vec![0, 3]);
    let trends = trends_data.extract(&picked).unwrap();
    println!("{}", trends);

    // the 1970s and the 1990s, with the empty 1980s filled in
    assert_eq!(trends.columns(), vec!["decade", "sverige", "riksdagen"]);
    assert_eq!(trends.len(), 3);
    assert_eq!(trends.key(0, "decade"), Some("1970"));
    assert_eq!(trends.key(1, "decade"), Some("1980"));
    assert_eq!(trends.key(2, "decade"), Some("1990"));

    // shares before smoothing: 1970s 11/58 and 4/58, 1980s nothing, 1990s 1/6 and 2/6
    let close = |a: Option<f64>, b: f64| (a.unwrap() - b).abs() < 1e-12;
    assert!(close(trends.value(0, "sverige"), 11.0 / 58.0 / 2.0));
    assert!(close(trends.value(1, "sverige"), (11.0 / 58.0 + 1.0 / 6.0) / 3.0));
    assert!(close(trends.value(2, "riksdagen"), 2.0 / 6.0 / 2.0));
    for row in trends.values().outer_iter() {
        assert!(row.iter().all(|share| *share >= 0.0 && *share <= 1.0));
    }
}
