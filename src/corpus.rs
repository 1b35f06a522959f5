//! A precomputed document-term matrix together with what its rows and columns mean
//!
//! On disk a corpus is three files sharing a tag:
//!
//! - `<tag>_vector_data.npy`: the matrix, one row per document, one column per token
//! - `<tag>_vocabulary.txt`: the tokens, one per line, in column order
//! - `<tag>_document_index.csv.gz`: `;` separated, one row per matrix row, with at least
//!   `document_name` and `year`
//!
//! Building these from text is the vectorizer's business, not ours.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use ndarray::prelude::*;
use csv::WriterBuilder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rayon::prelude::*;
use errors::*;
use numpy;
use table::{DocumentRecord, read_document_index};
use vocab::Vocabulary;

pub struct VectorizedCorpus {
    data: Array2<f64>,
    vocabulary: Vocabulary,
    document_index: Vec<DocumentRecord>,
}

fn corpus_file(folder: &Path, tag: &str, suffix: &str) -> PathBuf {
    folder.join(format!("{}_{}", tag, suffix))
}

impl VectorizedCorpus {
    pub fn new(data: Array2<f64>, vocabulary: Vocabulary, document_index: Vec<DocumentRecord>)
        -> Result<VectorizedCorpus> {
        if data.nrows() != document_index.len() {
            return Err(Error::InvalidDimensions(format!(
                "{} matrix rows but {} documents in the index", data.nrows(), document_index.len())));
        }
        if data.ncols() != vocabulary.len() {
            return Err(Error::InvalidDimensions(format!(
                "{} matrix columns but {} tokens in the vocabulary", data.ncols(), vocabulary.len())));
        }
        Ok(VectorizedCorpus { data, vocabulary, document_index })
    }

    pub fn load<P: AsRef<Path>>(folder: P, tag: &str) -> Result<VectorizedCorpus> {
        let folder = folder.as_ref();
        let data = numpy::read_matrix(corpus_file(folder, tag, "vector_data.npy"))?;
        let vocabulary = Vocabulary::load(corpus_file(folder, tag, "vocabulary.txt"))?;
        let index = read_document_index(corpus_file(folder, tag, "document_index.csv.gz"), b';')?;
        info!("Loaded corpus '{}' from {}: {} documents, {} tokens",
            tag, folder.display(), data.nrows(), data.ncols());
        VectorizedCorpus::new(data, vocabulary, index)
    }

    /// Write the three corpus files, replacing any with the same tag
    pub fn save<P: AsRef<Path>>(&self, folder: P, tag: &str) -> Result<()> {
        let folder = folder.as_ref();
        numpy::write_matrix(corpus_file(folder, tag, "vector_data.npy"), &self.data)?;
        {
            use std::io::Write;
            let mut out = File::create(corpus_file(folder, tag, "vocabulary.txt"))?;
            for token in self.vocabulary.tokens() {
                writeln!(out, "{}", token)?;
            }
        }

        let keys: BTreeSet<&String> = self.document_index.iter()
            .flat_map(|doc| doc.properties.keys())
            .collect();
        let gz = GzEncoder::new(File::create(corpus_file(folder, tag, "document_index.csv.gz"))?,
            Compression::default());
        let mut writer = WriterBuilder::new().delimiter(b';').from_writer(gz);
        let mut header = vec!["document_name", "year"];
        header.extend(keys.iter().map(|key| key.as_str()));
        writer.write_record(&header)?;
        for doc in self.document_index.iter() {
            let mut record = vec![doc.document_name.clone(), doc.year.to_string()];
            record.extend(keys.iter()
                .map(|key| doc.properties.get(*key).cloned().unwrap_or_default()));
            writer.write_record(&record)?;
        }
        let gz = writer.into_inner().map_err(|err| Error::IOError(err.into_error()))?;
        gz.finish()?;
        Ok(())
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn document_index(&self) -> &[DocumentRecord] {
        &self.document_index
    }

    pub fn n_docs(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_terms(&self) -> usize {
        self.data.ncols()
    }

    /// Total count of every token over all documents
    pub fn word_counts(&self) -> Array1<f64> {
        self.data.sum_axis(Axis(0))
    }

    /// Keep only the documents `keep` accepts
    pub fn filter<F: Fn(&DocumentRecord) -> bool>(&self, keep: F) -> VectorizedCorpus {
        let rows: Vec<usize> = self.document_index.iter()
            .enumerate()
            .filter(|&(_, doc)| keep(doc))
            .map(|(ix, _)| ix)
            .collect();
        VectorizedCorpus {
            data: self.data.select(Axis(0), &rows),
            vocabulary: self.vocabulary.clone(),
            document_index: rows.iter().map(|&ix| self.document_index[ix].clone()).collect(),
        }
    }

    /// Sum the rows of documents sharing a key
    ///
    /// Groups come out in key order, and `describe` gets each key and how many documents it
    /// covers to make the index record of the group.
    pub fn group_by<K, F, D>(&self, key: F, describe: D) -> VectorizedCorpus
        where K: Ord, F: Fn(&DocumentRecord) -> K, D: Fn(&K, usize) -> DocumentRecord {
        let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
        for (ix, doc) in self.document_index.iter().enumerate() {
            groups.entry(key(doc)).or_insert_with(Vec::new).push(ix);
        }

        let n_terms = self.n_terms();
        let members: Vec<&Vec<usize>> = groups.values().collect();
        let sums: Vec<Array1<f64>> = members.par_iter()
            .map(|rows| rows.iter().fold(Array1::zeros(n_terms), |acc, &ix| acc + &self.data.row(ix)))
            .collect();
        let mut data: Array2<f64> = Array2::zeros((sums.len(), n_terms));
        for (mut row, sum) in data.outer_iter_mut().zip(sums.iter()) {
            row.assign(sum);
        }

        let document_index = groups.iter().map(|(k, rows)| describe(k, rows.len())).collect();
        debug!("Grouped {} documents into {} groups", self.n_docs(), data.nrows());
        VectorizedCorpus { data, vocabulary: self.vocabulary.clone(), document_index }
    }

    /// Divide every row by its total. Rows without any counts stay zero.
    pub fn normalize(&self) -> VectorizedCorpus {
        let mut data = self.data.clone();
        for mut row in data.outer_iter_mut() {
            let total = row.sum();
            if total != 0.0 { row.mapv_inplace(|x| x / total); }
        }
        VectorizedCorpus {
            data,
            vocabulary: self.vocabulary.clone(),
            document_index: self.document_index.clone(),
        }
    }

    /// Columns of tokens matching `words`, by total frequency, at most `n_max_count` of them
    pub fn find_matching_words_indices<S: AsRef<str>>(&self, words: &[S], n_max_count: usize,
        descending: bool) -> Result<Vec<usize>> {
        let counts = self.word_counts();
        self.vocabulary.find_matching_words_indices(words, counts.as_slice().unwrap_or(&[]),
            n_max_count, descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus() -> VectorizedCorpus {
        let vocab = Vocabulary::from_tokens(vec!["sverige", "jag", "riksdag"]).unwrap();
        let index = vec![
            DocumentRecord::new("d0", 1970).with_property("party_id", "1"),
            DocumentRecord::new("d1", 1970).with_property("party_id", "2"),
            DocumentRecord::new("d2", 1971).with_property("party_id", "1"),
        ];
        let data = array![[1.0, 2.0, 0.0], [3.0, 0.0, 1.0], [0.0, 4.0, 4.0]];
        VectorizedCorpus::new(data, vocab, index).unwrap()
    }

    #[test]
    fn shape_must_agree_with_index_and_vocabulary() {
        let vocab = Vocabulary::from_tokens(vec!["a"]).unwrap();
        let index = vec![DocumentRecord::new("d0", 1970)];
        assert!(VectorizedCorpus::new(Array2::zeros((2, 1)), vocab.clone(), index.clone()).is_err());
        assert!(VectorizedCorpus::new(Array2::zeros((1, 2)), vocab.clone(), index.clone()).is_err());
        assert!(VectorizedCorpus::new(Array2::zeros((1, 1)), vocab, index).is_ok());
    }

    #[test]
    fn saved_corpus_loads_back() {
        let dir = TempDir::new().unwrap();
        let c = corpus();
        c.save(dir.path(), "lemma").unwrap();
        let loaded = VectorizedCorpus::load(dir.path(), "lemma").unwrap();
        assert_eq!(loaded.data(), c.data());
        assert_eq!(loaded.document_index(), c.document_index());
        assert_eq!(loaded.vocabulary().tokens(), c.vocabulary().tokens());
    }

    #[test]
    fn filter_keeps_rows_and_index_together() {
        let c = corpus().filter(|doc| doc.property("party_id") == Some("1".to_string()));
        assert_eq!(c.n_docs(), 2);
        assert_eq!(c.data(), &array![[1.0, 2.0, 0.0], [0.0, 4.0, 4.0]]);
        assert_eq!(c.document_index()[1].document_name, "d2");
    }

    #[test]
    fn group_by_year_sums_rows() {
        let g = corpus().group_by(|doc| doc.year, |year, n| {
            DocumentRecord::new(year.to_string(), *year).with_property("n_documents", n.to_string())
        });
        assert_eq!(g.data(), &array![[4.0, 2.0, 1.0], [0.0, 4.0, 4.0]]);
        assert_eq!(g.document_index()[0].property("n_documents"), Some("2".to_string()));
        assert_eq!(g.document_index()[1].year, 1971);
    }

    #[test]
    fn normalized_rows_sum_to_one() {
        let n = corpus().normalize();
        for row in n.data().outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn words_found_by_frequency() {
        let c = corpus();
        assert_eq!(c.word_counts(), array![4.0, 6.0, 5.0]);
        assert_eq!(c.find_matching_words_indices(&["sverige", "jag", "riksdag"], 2, true).unwrap(), vec![1, 2]);
    }
}
