use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use textpack::compression::{huffman, rle, Compression, HuffmanCoding, RunLengthEncoding};

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn prose(len: usize) -> String {
    let mut rng = StdRng::seed_from_u64(42);
    let alphabet: Vec<char> = "etaoin shrdlu cmfwyp vbgkqjxz ETAOIN,.\né".chars().collect();
    (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect()
}

fn runs(len: usize) -> String {
    let mut rng = StdRng::seed_from_u64(7);
    let mut text = String::with_capacity(len);
    while text.len() < len {
        let symbol = *['a', 'b', ' ', '\n'].choose(&mut rng).unwrap_or(&'a');
        for _ in 0..rng.gen_range(1..1500) {
            text.push(symbol);
        }
    }
    text.truncate(len);
    text
}

fn bench_huffman(c: &mut Criterion) {
    let mut group = c.benchmark_group("huffman");
    let codec = HuffmanCoding::new();

    for size in SIZES {
        let text = prose(size);
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &text, |b, text| {
            b.iter(|| huffman::encode(black_box(text)).unwrap())
        });

        let packed = codec.compress(&text).unwrap();
        group.bench_with_input(BenchmarkId::new("decompress", size), &packed.bytes, |b, bytes| {
            b.iter(|| codec.decompress(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

fn bench_rle(c: &mut Criterion) {
    let mut group = c.benchmark_group("rle");
    let codec = RunLengthEncoding::new();

    for size in SIZES {
        let text = runs(size);
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &text, |b, text| {
            b.iter(|| rle::format_runs(&rle::encode(black_box(text))))
        });

        let packed = codec.compress(&text).unwrap();
        group.bench_with_input(BenchmarkId::new("decompress", size), &packed.bytes, |b, bytes| {
            b.iter(|| codec.decompress(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_huffman, bench_rle);
criterion_main!(benches);
