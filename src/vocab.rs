//! Vocabulary of a document-term matrix
//!
//! Column `i` of a matrix counts token `i` of its vocabulary. Token lookups go through a farmhash
//! map, which is faster than the default hasher and good enough for tokens from our own corpus.

use farmhash;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasherDefault, Hasher};
use std::io::{BufRead, BufReader};
use std::path::Path;
use regex::Regex;
use errors::*;
use table::open_table;

/// Act like a streaming farmhash
///
/// farmhash isn't a streaming hash, so every write rehashes its bytes seeded with the hash so
/// far. A `str` is written as its bytes followed by a terminator, and both must count.
#[derive(Default)]
pub struct FarmHashChain(u64);

impl Hasher for FarmHashChain {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = farmhash::hash64_with_seed(bytes, self.0);
    }
}

pub type Farm = BuildHasherDefault<FarmHashChain>;
pub type FarmMap<X, Y> = HashMap<X, Y, Farm>;

/// Tokens in column order
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<String>,
    ids: FarmMap<String, usize>,
}

impl Vocabulary {
    pub fn from_tokens<I, S>(tokens: I) -> Result<Vocabulary>
        where I: IntoIterator<Item=S>, S: Into<String> {
        let mut vocab = Vocabulary::default();
        for token in tokens {
            let token = token.into();
            if vocab.ids.contains_key(&token) {
                return Err(Error::BadField(format!("'{}' occurs twice in the vocabulary", token)));
            }
            vocab.ids.insert(token.clone(), vocab.tokens.len());
            vocab.tokens.push(token);
        }
        Ok(vocab)
    }

    /// One token per line; the line number (from 0) is the column. May be gzipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vocabulary> {
        let reader = BufReader::new(open_table(path.as_ref())?);
        let tokens = reader.lines()
            .map(|line| line.map(|l| l.trim_end_matches('\r').to_string()))
            .collect::<::std::io::Result<Vec<String>>>()?;
        debug!("Read {} tokens from {}", tokens.len(), path.as_ref().display());
        Vocabulary::from_tokens(tokens)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.ids.get(token).cloned()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(|t| t.as_str())
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Ids of every token matching any of `words`
    ///
    /// A word written as `|pattern|` is a regular expression that must match the whole token.
    /// Anything else must equal the token. Unknown words match nothing.
    pub fn matching_ids<S: AsRef<str>>(&self, words: &[S]) -> Result<BTreeSet<usize>> {
        let mut ids = BTreeSet::new();
        for word in words {
            let word = word.as_ref();
            if word.len() > 2 && word.starts_with('|') && word.ends_with('|') {
                let pattern = Regex::new(&format!("^(?:{})$", &word[1..word.len() - 1]))?;
                ids.extend(self.tokens.iter()
                    .enumerate()
                    .filter(|&(_, token)| pattern.is_match(token))
                    .map(|(id, _)| id));
            } else if let Some(id) = self.id(word) {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    /// Order ids by frequency and keep at most `n_max_count` of them. Ties go to the lower id.
    pub fn rank<I>(&self, ids: I, frequencies: &[f64], n_max_count: usize, descending: bool)
        -> Result<Vec<usize>>
        where I: IntoIterator<Item=usize> {
        if frequencies.len() != self.len() {
            return Err(Error::InvalidDimensions(format!(
                "{} frequencies for a vocabulary of {} tokens", frequencies.len(), self.len())));
        }
        let mut ids: Vec<usize> = ids.into_iter().collect();
        ids.sort_by(|&a, &b| {
            let by_freq = frequencies[a].partial_cmp(&frequencies[b])
                .unwrap_or(::std::cmp::Ordering::Equal);
            let by_freq = if descending { by_freq.reverse() } else { by_freq };
            by_freq.then(a.cmp(&b))
        });
        ids.truncate(n_max_count);
        Ok(ids)
    }

    pub fn find_matching_words_indices<S: AsRef<str>>(&self, words: &[S], frequencies: &[f64],
        n_max_count: usize, descending: bool) -> Result<Vec<usize>> {
        let ids = self.matching_ids(words)?;
        self.rank(ids, frequencies, n_max_count, descending)
    }
}
