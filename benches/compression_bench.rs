use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sqsh::codec::{get_codec, CodecId};

fn bench_compression(c: &mut Criterion) {
    let zero_data = vec![0u8; 1024 * 1024];
    let text_data = "the quick brown fox jumps over the lazy dog. "
        .repeat(1024 * 20)
        .into_bytes();

    let rle = get_codec(CodecId::Rle);
    c.bench_function("rle_encode_1mb_zeros", |b| {
        b.iter(|| rle.encode(black_box(&zero_data)).unwrap())
    });

    let lzss = get_codec(CodecId::Lzss);
    c.bench_function("lzss_encode_text", |b| {
        b.iter(|| lzss.encode(black_box(&text_data)).unwrap())
    });

    let huffman = get_codec(CodecId::Huffman);
    c.bench_function("huffman_encode_text", |b| {
        b.iter(|| huffman.encode(black_box(&text_data)).unwrap())
    });

    let bwt = get_codec(CodecId::Bwt);
    let bwt_sample = &text_data[..64 * 1024];
    c.bench_function("bwt_encode_64kb", |b| {
        b.iter(|| bwt.encode(black_box(bwt_sample)).unwrap())
    });
}

criterion_group!(benches, bench_compression);
criterion_main!(benches);
