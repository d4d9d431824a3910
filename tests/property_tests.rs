use proptest::prelude::*;
use textpack::compression::{huffman, rle, Compression, HuffmanCoding, RunLengthEncoding};
use textpack::FrequencyTable;

proptest! {
    #[test]
    fn test_huffman_roundtrip(input in "\\PC{1,300}") {
        let codec = HuffmanCoding::new();
        let packed = codec.compress(&input).unwrap();
        let unpacked = codec.decompress(&packed.bytes).unwrap();
        prop_assert_eq!(&unpacked.text, &input);
        prop_assert!(unpacked.verification.verified());
    }

    #[test]
    fn test_rle_roundtrip(input in "[ab0-9\n ]{1,300}|(x{1,20}y{900,1100})") {
        let codec = RunLengthEncoding::new();
        let packed = codec.compress(&input).unwrap();
        let unpacked = codec.decompress(&packed.bytes).unwrap();
        prop_assert_eq!(&unpacked.text, &input);
        prop_assert!(unpacked.verification.verified());
    }

    #[test]
    fn test_code_table_is_prefix_free(input in "\\PC{1,200}") {
        let encoded = huffman::encode(&input).unwrap();
        prop_assert!(encoded.code_table.is_prefix_free());
        prop_assert_eq!(encoded.code_table.len(), encoded.frequencies.len());
        prop_assert_eq!(
            encoded.bit_length,
            encoded.code_table.encoded_bits(&encoded.frequencies)
        );
        prop_assert_eq!(encoded.payload.len(), encoded.bit_length.div_ceil(8));
    }

    #[test]
    fn test_huffman_is_deterministic(input in "[a-e]{1,100}") {
        let first = HuffmanCoding::new().compress(&input).unwrap();
        let second = HuffmanCoding::new().compress(&input).unwrap();
        prop_assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_frequencies_sum_to_length(input in "\\PC{0,200}") {
        let freq = FrequencyTable::from_text(&input);
        prop_assert_eq!(freq.total(), Some(input.chars().count() as u64));
    }

    #[test]
    fn test_runs_respect_limit(len in 1usize..5000) {
        let input = "z".repeat(len);
        let runs = rle::encode(&input);
        prop_assert!(runs.iter().all(|run| run.count >= 1 && run.count <= rle::MAX_RUN_LENGTH));
        prop_assert_eq!(runs.len(), len.div_ceil(rle::MAX_RUN_LENGTH as usize));
        prop_assert_eq!(rle::decode(&runs), input);
    }
}
