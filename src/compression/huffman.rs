//! Huffman prefix coding over Unicode text.
//!
//! The tree is rebuilt from the stored frequency table on decode, so
//! construction must be fully deterministic. Nodes live in an arena and are
//! ordered in the priority queue by `(frequency, NodeId)`. Leaves are pushed in
//! ascending code point order and internal nodes take the next id as they are
//! created, so equal frequencies always resolve the same way.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt;

use bitvec::prelude::*;
use log::debug;
use serde::Serialize;

use crate::compression::frequency::FrequencyTable;
use crate::compression::{Compressed, Compression, Decompressed};
use crate::container::huffman::{HuffmanContainer, HuffmanMetadata, MAGIC};
use crate::error::{Error, Result};
use crate::integrity::{self, Verification};

/// Registry name of the Huffman codec.
pub const HUFFMAN: &str = "huffman";

/// Index of a node in a [`HuffmanTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Represents a node in the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    /// A leaf node contains a symbol and its frequency.
    Leaf { symbol: char, freq: u64 },
    /// An internal node with its children and combined frequency.
    ///
    /// `right` is only absent for the root synthesized over a lone leaf.
    Internal {
        freq: u64,
        left: NodeId,
        right: Option<NodeId>,
    },
}

impl HuffmanNode {
    /// Returns the frequency of the node.
    pub fn freq(&self) -> u64 {
        match self {
            HuffmanNode::Leaf { freq, .. } => *freq,
            HuffmanNode::Internal { freq, .. } => *freq,
        }
    }
}

/// A Huffman tree stored as an arena of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
    root: NodeId,
}

impl HuffmanTree {
    /// Builds the tree for a frequency table.
    ///
    /// The two lowest nodes are merged repeatedly, the first one popped
    /// becoming the left child. A table with a single symbol yields an
    /// internal root whose left child is that symbol, so its code is `0`.
    pub fn build(freq_table: &FrequencyTable) -> Result<Self> {
        if freq_table.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut nodes = Vec::with_capacity(freq_table.len() * 2);
        let mut heap = BinaryHeap::with_capacity(freq_table.len());
        for (&symbol, &freq) in freq_table {
            let id = NodeId(nodes.len());
            nodes.push(HuffmanNode::Leaf { symbol, freq });
            heap.push(Reverse((freq, id)));
        }

        let root = loop {
            let Reverse((left_freq, left)) = heap.pop().ok_or(Error::EmptyInput)?;
            match heap.pop() {
                None => break left,
                Some(Reverse((right_freq, right))) => {
                    let id = NodeId(nodes.len());
                    let freq = left_freq.checked_add(right_freq).ok_or_else(|| {
                        Error::malformed("frequency counts overflow a u64 total", None)
                    })?;
                    nodes.push(HuffmanNode::Internal {
                        freq,
                        left,
                        right: Some(right),
                    });
                    heap.push(Reverse((freq, id)));
                }
            }
        };

        let root = match nodes[root.0] {
            HuffmanNode::Leaf { freq, .. } => {
                let id = NodeId(nodes.len());
                nodes.push(HuffmanNode::Internal {
                    freq,
                    left: root,
                    right: None,
                });
                id
            }
            HuffmanNode::Internal { .. } => root,
        };

        debug!(
            "built huffman tree: {} symbols, {} nodes",
            freq_table.len(),
            nodes.len()
        );
        Ok(Self { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &HuffmanNode {
        &self.nodes[id.0]
    }

    /// Number of nodes, leaves and internal.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Derives the code of every leaf by depth-first traversal.
    pub fn code_table(&self) -> CodeTable {
        let mut table = BTreeMap::new();
        self.code_table_helper(self.root, BitVec::new(), &mut table);
        CodeTable(table)
    }

    fn code_table_helper(&self, id: NodeId, prefix: Code, table: &mut BTreeMap<char, Code>) {
        match self.node(id) {
            HuffmanNode::Leaf { symbol, .. } => {
                table.insert(*symbol, prefix);
            }
            HuffmanNode::Internal { left, right, .. } => {
                let mut left_prefix = prefix.clone();
                left_prefix.push(false);
                self.code_table_helper(*left, left_prefix, table);
                if let Some(right) = right {
                    let mut right_prefix = prefix;
                    right_prefix.push(true);
                    self.code_table_helper(*right, right_prefix, table);
                }
            }
        }
    }
}

/// The bits of one code, first bit first.
pub type Code = BitVec<u8, Msb0>;

/// Mapping from symbol to its prefix code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable(BTreeMap<char, Code>);

/// One line of a code table report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeTableRow {
    pub symbol: char,
    pub code_point: u32,
    pub frequency: u64,
    pub code: String,
}

impl CodeTable {
    pub fn get(&self, symbol: char) -> Option<&BitSlice<u8, Msb0>> {
        self.0.get(&symbol).map(|code| code.as_bitslice())
    }

    /// The code of `symbol` as a string of `0` and `1`.
    pub fn bit_string(&self, symbol: char) -> Option<String> {
        self.get(symbol).map(bits_to_string)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &BitSlice<u8, Msb0>)> {
        self.0.iter().map(|(ch, code)| (*ch, code.as_bitslice()))
    }

    /// Symbols with their codes as strings, in code point order.
    pub fn to_strings(&self) -> BTreeMap<char, String> {
        self.iter().map(|(ch, code)| (ch, bits_to_string(code))).collect()
    }

    /// Rows for display, most frequent symbol first.
    pub fn rows(&self, frequencies: &FrequencyTable) -> Vec<CodeTableRow> {
        let mut rows: Vec<CodeTableRow> = self
            .iter()
            .map(|(symbol, code)| CodeTableRow {
                symbol,
                code_point: symbol as u32,
                frequency: frequencies.get(symbol).unwrap_or(0),
                code: bits_to_string(code),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then(a.code_point.cmp(&b.code_point))
        });
        rows
    }

    /// True when no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let codes: Vec<&Code> = self.0.values().collect();
        codes.iter().enumerate().all(|(i, a)| {
            codes
                .iter()
                .enumerate()
                .all(|(j, b)| i == j || !b.starts_with(a.as_bitslice()))
        })
    }

    /// Total encoded length in bits for the given frequencies.
    pub fn encoded_bits(&self, frequencies: &FrequencyTable) -> usize {
        frequencies
            .iter()
            .map(|(ch, &count)| self.0.get(ch).map_or(0, |code| code.len() * count as usize))
            .sum()
    }
}

impl fmt::Display for CodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, code) in self.iter() {
            writeln!(f, "{:?}\t{}", symbol, bits_to_string(code))?;
        }
        Ok(())
    }
}

fn bits_to_string(bits: &BitSlice<u8, Msb0>) -> String {
    bits.iter().map(|bit| if *bit { '1' } else { '0' }).collect()
}

/// Output of [`encode`].
#[derive(Debug, Clone)]
pub struct HuffmanEncoded {
    pub frequencies: FrequencyTable,
    pub code_table: CodeTable,
    /// Packed bits, MSB first, last byte zero padded.
    pub payload: Vec<u8>,
    /// Number of meaningful bits in `payload`.
    pub bit_length: usize,
}

/// Encodes `text`, packing the codes MSB first into bytes.
pub fn encode(text: &str) -> Result<HuffmanEncoded> {
    if text.is_empty() {
        return Err(Error::EmptyInput);
    }
    let frequencies = FrequencyTable::from_text(text);
    let tree = HuffmanTree::build(&frequencies)?;
    let code_table = tree.code_table();

    let mut bits: Code = BitVec::with_capacity(code_table.encoded_bits(&frequencies));
    for ch in text.chars() {
        let code = code_table.get(ch).ok_or(Error::Encoding { symbol: ch })?;
        bits.extend_from_bitslice(code);
    }

    let bit_length = bits.len();
    bits.resize(bit_length.div_ceil(8) * 8, false);
    let payload = bits.into_vec();
    debug!(
        "huffman encoded {} symbols into {} bits ({} bytes)",
        text.chars().count(),
        bit_length,
        payload.len()
    );

    Ok(HuffmanEncoded {
        frequencies,
        code_table,
        payload,
        bit_length,
    })
}

/// Decodes `bit_length` bits of `payload` using the tree rebuilt from `frequencies`.
///
/// Bits past `bit_length` are padding and ignored. An empty table decodes to
/// the empty string when no bits are declared.
pub fn decode(payload: &[u8], frequencies: &FrequencyTable, bit_length: usize) -> Result<String> {
    if frequencies.is_empty() {
        if bit_length == 0 {
            return Ok(String::new());
        }
        return Err(Error::corrupt(
            "empty frequency table with a non-empty bit stream",
            0,
        ));
    }
    let tree = HuffmanTree::build(frequencies)?;
    decode_with_tree(payload, &tree, bit_length)
}

/// Walks the packed bits from the root, emitting a symbol at every leaf.
///
/// A payload shorter than `bit_length` is `TruncatedFile` with the offset set
/// to the payload length, i.e. the first missing byte relative to the payload.
pub fn decode_with_tree(payload: &[u8], tree: &HuffmanTree, bit_length: usize) -> Result<String> {
    let bits = payload.view_bits::<Msb0>();
    if bits.len() < bit_length {
        return Err(Error::TruncatedFile {
            offset: payload.len(),
            needed: bit_length.div_ceil(8),
            available: payload.len(),
        });
    }

    let mut result = String::new();
    let mut current = tree.root();
    for (position, bit) in bits[..bit_length].iter().by_vals().enumerate() {
        let next = match tree.node(current) {
            HuffmanNode::Internal { left, right, .. } => {
                if bit {
                    *right
                } else {
                    Some(*left)
                }
            }
            HuffmanNode::Leaf { .. } => None,
        };
        let next = next.ok_or_else(|| Error::corrupt("bit leads to a missing branch", position))?;

        if let HuffmanNode::Leaf { symbol, .. } = tree.node(next) {
            result.push(*symbol);
            current = tree.root();
        } else {
            current = next;
        }
    }

    if current != tree.root() {
        return Err(Error::corrupt(
            "bit stream ended inside a code",
            bit_length,
        ));
    }
    Ok(result)
}

/// Huffman codec writing the binary `HUFF` container.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanCoding;

impl HuffmanCoding {
    pub fn new() -> Self {
        Self
    }
}

impl Compression for HuffmanCoding {
    fn name(&self) -> &str {
        HUFFMAN
    }

    fn extension(&self) -> &str {
        ".huff"
    }

    fn detect(&self, data: &[u8]) -> bool {
        data.starts_with(&MAGIC)
    }

    fn compress(&self, text: &str) -> Result<Compressed> {
        let encoded = encode(text)?;
        let checksum = integrity::checksum(&encoded.payload);
        let fingerprint = integrity::fingerprint(text);
        let symbol_count = text.chars().count() as u64;

        let container = HuffmanContainer {
            metadata: HuffmanMetadata {
                algorithm: HUFFMAN.to_string(),
                original_size: text.len() as u64,
                bit_length: encoded.bit_length as u64,
                symbol_count,
                checksum,
                fingerprint: fingerprint.clone(),
            },
            frequencies: encoded.frequencies,
            payload: encoded.payload,
        };
        let bytes = container.to_bytes()?;

        Ok(Compressed {
            bytes,
            checksum,
            fingerprint,
            symbol_count,
            code_table: Some(encoded.code_table),
            frequencies: Some(container.frequencies),
        })
    }

    fn decompress(&self, data: &[u8]) -> Result<Decompressed> {
        let container = HuffmanContainer::parse(data)?;
        let meta = &container.metadata;
        let bit_length = usize::try_from(meta.bit_length)
            .map_err(|_| Error::malformed("bit length does not fit in memory", None))?;

        let text = decode(&container.payload, &container.frequencies, bit_length)?;
        if text.chars().count() as u64 != meta.symbol_count {
            debug!(
                "decoded {} symbols, metadata declares {}",
                text.chars().count(),
                meta.symbol_count
            );
        }

        let verification =
            Verification::run(meta.checksum, &container.payload, &meta.fingerprint, &text);
        Ok(Decompressed { text, verification })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &str) -> String {
        let encoded = encode(input).unwrap();
        decode(&encoded.payload, &encoded.frequencies, encoded.bit_length).unwrap()
    }

    #[test]
    fn test_huffman_tree_and_code_table() {
        let input = "this is an example for huffman encoding";
        let freq = FrequencyTable::from_text(input);
        let tree = HuffmanTree::build(&freq).unwrap();
        let code_table = tree.code_table();
        for ch in input.chars() {
            assert!(code_table.get(ch).is_some(), "Missing code for '{}'", ch);
        }
        assert_eq!(code_table.len(), freq.len());
        // k leaves and k - 1 internal nodes
        assert_eq!(tree.len(), 2 * freq.len() - 1);
        assert_eq!(tree.node(tree.root()).freq(), input.chars().count() as u64);
    }

    #[test]
    fn test_encode_decode() {
        let input = "huffman coding in rust is fun!";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_unicode_round_trip() {
        let input = "naïve café ☕ 日本語テキスト 🦀🦀\n\ttabs";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_single_character() {
        let input = "aaaa";
        let encoded = encode(input).unwrap();
        assert_eq!(encoded.code_table.bit_string('a').as_deref(), Some("0"));
        assert_eq!(encoded.bit_length, 4);
        assert_eq!(encoded.payload, vec![0u8]);
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_single_symbol_tree_shape() {
        let freq = FrequencyTable::from_text("zzz");
        let tree = HuffmanTree::build(&freq).unwrap();
        assert_eq!(tree.len(), 2);
        match tree.node(tree.root()) {
            HuffmanNode::Internal { right, freq, .. } => {
                assert!(right.is_none());
                assert_eq!(*freq, 3);
            }
            other => panic!("root should be internal, got {:?}", other),
        }
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        // All frequencies equal: ordering falls back to code point and creation order.
        let freq = FrequencyTable::from_text("dcba");
        let first = HuffmanTree::build(&freq).unwrap();
        let second = HuffmanTree::build(&freq).unwrap();
        assert_eq!(first, second);

        let codes = first.code_table().to_strings();
        assert_eq!(codes[&'a'], "00");
        assert_eq!(codes[&'b'], "01");
        assert_eq!(codes[&'c'], "10");
        assert_eq!(codes[&'d'], "11");
    }

    #[test]
    fn test_known_codes() {
        // a:5 b:2 c:1 -> c+b merge to 3, which is popped before a.
        let codes = encode("aaaaabbc").unwrap().code_table.to_strings();
        assert_eq!(codes[&'c'], "00");
        assert_eq!(codes[&'b'], "01");
        assert_eq!(codes[&'a'], "1");
    }

    #[test]
    fn test_prefix_free() {
        let input = "the quick brown fox jumps over the lazy dog 0123456789";
        let table = encode(input).unwrap().code_table;
        assert!(table.is_prefix_free());
    }

    #[test]
    fn test_payload_is_msb_first_and_zero_padded() {
        // a=1 b=01 c=00: 11111 0101 00 + 5 padding bits
        let encoded = encode("aaaaabbc").unwrap();
        assert_eq!(encoded.bit_length, 11);
        assert_eq!(encoded.payload, vec![0b1111_1010, 0b1000_0000]);
        let bits = encoded.payload.view_bits::<Msb0>();
        assert!(bits[encoded.bit_length..].not_any());
        assert_eq!(encoded.payload.len(), encoded.bit_length.div_ceil(8));
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = encode("").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::EmptyInput);
        let err = HuffmanTree::build(&FrequencyTable::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::EmptyInput);
    }

    #[test]
    fn test_empty_table_decodes_to_empty_text() {
        assert_eq!(decode(&[], &FrequencyTable::default(), 0).unwrap(), "");
        let err = decode(&[0xFF], &FrequencyTable::default(), 3).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CorruptStream);
    }

    #[test]
    fn test_stream_ending_mid_code() {
        let encoded = encode("aaaaabbc").unwrap();
        // The last symbol 'c' is "00"; cut its final bit.
        let err = decode(
            &encoded.payload,
            &encoded.frequencies,
            encoded.bit_length - 1,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CorruptStream);
        assert_eq!(err.offset(), Some(encoded.bit_length - 1));
    }

    #[test]
    fn test_missing_branch_in_single_symbol_tree() {
        let freq = FrequencyTable::from_text("aaa");
        let err = decode(&[0b0100_0000], &freq, 3).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CorruptStream);
        assert_eq!(err.offset(), Some(1));
    }

    #[test]
    fn test_declared_bits_beyond_payload() {
        let encoded = encode("hello world").unwrap();
        let err = decode(
            &encoded.payload,
            &encoded.frequencies,
            encoded.payload.len() * 8 + 1,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TruncatedFile);
        assert_eq!(err.offset(), Some(encoded.payload.len()));
    }

    #[test]
    fn test_merge_overflow_is_an_error() {
        let freq: FrequencyTable =
            serde_json::from_str(r#"{"a":18446744073709551615,"b":1}"#).unwrap();
        let err = HuffmanTree::build(&freq).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedMetadata);
    }

    #[test]
    fn test_rows_sorted_by_frequency() {
        let encoded = encode("aaabbc").unwrap();
        let rows = encoded.code_table.rows(&encoded.frequencies);
        let order: Vec<char> = rows.iter().map(|r| r.symbol).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
        assert_eq!(rows[0].frequency, 3);
        assert_eq!(rows[0].code_point, 'a' as u32);
    }

    #[test]
    fn test_codec_round_trip_and_determinism() {
        let codec = HuffmanCoding::new();
        let text = "abracadabra, abracadabra!";
        let first = codec.compress(text).unwrap();
        let second = codec.compress(text).unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert!(codec.detect(&first.bytes));

        let out = codec.decompress(&first.bytes).unwrap();
        assert_eq!(out.text, text);
        assert!(out.verification.verified());
    }
}
