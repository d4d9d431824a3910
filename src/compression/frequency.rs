use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Occurrence count of every distinct symbol in one input.
///
/// Backed by an ordered map, so iteration is in ascending code point order.
/// Huffman tree construction relies on that order for its tie-break, and the
/// JSON form is stable for identical inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable(BTreeMap<char, u64>);

impl FrequencyTable {
    /// Counts every character of `text`.
    pub fn from_text(text: &str) -> Self {
        let mut freq = BTreeMap::new();
        for ch in text.chars() {
            *freq.entry(ch).or_insert(0) += 1;
        }
        FrequencyTable(freq)
    }

    /// Builds a table from explicit counts, rejecting zero entries.
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (char, u64)>,
    {
        let table = FrequencyTable(counts.into_iter().collect());
        table.validate()?;
        Ok(table)
    }

    /// Checks that no symbol has a zero count and that the counts sum to a `u64`.
    pub fn validate(&self) -> Result<()> {
        if let Some((ch, _)) = self.0.iter().find(|(_, count)| **count == 0) {
            return Err(Error::malformed(
                format!("frequency table has zero count for {:?}", ch),
                None,
            ));
        }
        if self.total().is_none() {
            return Err(Error::malformed("frequency counts overflow a u64 total", None));
        }
        Ok(())
    }

    pub fn get(&self, symbol: char) -> Option<u64> {
        self.0.get(&symbol).copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts, i.e. the length of the input in symbols.
    ///
    /// `None` if the counts overflow, which only a crafted table can do.
    pub fn total(&self) -> Option<u64> {
        self.0
            .values()
            .try_fold(0u64, |acc, &count| acc.checked_add(count))
    }

    pub fn iter(&self) -> btree_map::Iter<'_, char, u64> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a FrequencyTable {
    type Item = (&'a char, &'a u64);
    type IntoIter = btree_map::Iter<'a, char, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_table() {
        let freq = FrequencyTable::from_text("aabccc");
        assert_eq!(freq.get('a'), Some(2));
        assert_eq!(freq.get('b'), Some(1));
        assert_eq!(freq.get('c'), Some(3));
        assert_eq!(freq.get('d'), None);
        assert_eq!(freq.total(), Some(6));
        assert_eq!(freq.len(), 3);
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        let freq = FrequencyTable::from_text("");
        assert!(freq.is_empty());
        assert_eq!(freq.total(), Some(0));
    }

    #[test]
    fn test_counts_unicode_scalars_not_bytes() {
        let freq = FrequencyTable::from_text("héé🦀");
        assert_eq!(freq.get('é'), Some(2));
        assert_eq!(freq.get('🦀'), Some(1));
        assert_eq!(freq.total(), Some(4));
    }

    #[test]
    fn test_iteration_is_code_point_ordered() {
        let freq = FrequencyTable::from_text("zyxabc");
        let order: String = freq.iter().map(|(ch, _)| *ch).collect();
        assert_eq!(order, "abcxyz");
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = FrequencyTable::from_counts([('a', 3), ('b', 0)]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedMetadata);
    }

    #[test]
    fn test_overflowing_counts_rejected() {
        let freq: FrequencyTable =
            serde_json::from_str(r#"{"a":18446744073709551615,"b":1}"#).unwrap();
        assert_eq!(freq.total(), None);
        let err = freq.validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedMetadata);

        let err = FrequencyTable::from_counts([('a', u64::MAX), ('b', 1)]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedMetadata);
    }

    #[test]
    fn test_json_shape() {
        let freq = FrequencyTable::from_text("abba");
        let json = serde_json::to_string(&freq).unwrap();
        assert_eq!(json, r#"{"a":2,"b":2}"#);
        let back: FrequencyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, freq);
    }
}
