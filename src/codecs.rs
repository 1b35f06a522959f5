//! Decoding of compact ids in result tables
//!
//! Speaker metadata (persons, parties, genders, offices) is encoded as small integer ids in the
//! document index. The mapping back to names belongs to the metadata database and whatever
//! library reads it; this is only the seam it plugs into.

use errors::*;
use trends::TrendsTable;

pub trait PersonCodecs {
    /// Name of the decoded column and the decoded value, if `column` is something this codec knows
    fn decode_value(&self, column: &str, value: &str) -> Option<(String, String)>;

    /// Decode every key column of `table` that this codec knows
    ///
    /// With `drop` the encoded column is replaced, otherwise the decoded column is inserted right
    /// after it. Values the codec can't decode are kept as they are.
    fn decode(&self, table: &TrendsTable, drop: bool) -> Result<TrendsTable> {
        let mut columns: Vec<String> = vec![];
        let mut keys: Vec<Vec<String>> = vec![vec![]; table.len()];
        for (col, name) in table.key_columns().iter().enumerate() {
            let decoded_name = table.keys().iter()
                .filter_map(|row| self.decode_value(name, &row[col]))
                .map(|(decoded_name, _)| decoded_name)
                .next();
            match decoded_name {
                None => {
                    columns.push(name.clone());
                    for (out, row) in keys.iter_mut().zip(table.keys()) {
                        out.push(row[col].clone());
                    }
                }
                Some(decoded_name) => {
                    if !drop {
                        columns.push(name.clone());
                    }
                    columns.push(decoded_name);
                    for (out, row) in keys.iter_mut().zip(table.keys()) {
                        let encoded = &row[col];
                        if !drop {
                            out.push(encoded.clone());
                        }
                        out.push(self.decode_value(name, encoded)
                            .map(|(_, value)| value)
                            .unwrap_or_else(|| encoded.clone()));
                    }
                }
            }
        }
        table.with_keys(columns, keys)
    }
}

/// Codecs that know nothing, so decoding leaves tables alone
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodecs;

impl PersonCodecs for IdentityCodecs {
    fn decode_value(&self, _column: &str, _value: &str) -> Option<(String, String)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parties;
    impl PersonCodecs for Parties {
        fn decode_value(&self, column: &str, value: &str) -> Option<(String, String)> {
            match (column, value) {
                ("party_id", "1") => Some(("party".to_string(), "S".to_string())),
                ("party_id", "2") => Some(("party".to_string(), "M".to_string())),
                _ => None,
            }
        }
    }

    fn table() -> TrendsTable {
        TrendsTable::new(
            vec!["year".to_string(), "party_id".to_string()],
            vec![vec!["1970".to_string(), "1".to_string()],
                 vec!["1970".to_string(), "9".to_string()]],
            vec!["sverige".to_string()],
            array![[1.0], [2.0]],
        ).unwrap()
    }

    #[test]
    fn identity_changes_nothing() {
        assert_eq!(IdentityCodecs.decode(&table(), true).unwrap(), table());
    }

    #[test]
    fn decoded_column_replaces_the_encoded_one() {
        let decoded = Parties.decode(&table(), true).unwrap();
        assert_eq!(decoded.key_columns(), &["year".to_string(), "party".to_string()][..]);
        assert_eq!(decoded.key(0, "party"), Some("S"));
        // unknown ids pass through
        assert_eq!(decoded.key(1, "party"), Some("9"));
        assert_eq!(decoded.value(1, "sverige"), Some(2.0));
    }

    #[test]
    fn decoded_column_can_sit_next_to_the_encoded_one() {
        let decoded = Parties.decode(&table(), false).unwrap();
        assert_eq!(decoded.columns(), vec!["year", "party_id", "party", "sverige"]);
        assert_eq!(decoded.key(0, "party_id"), Some("1"));
        assert_eq!(decoded.key(0, "party"), Some("S"));
    }
}
