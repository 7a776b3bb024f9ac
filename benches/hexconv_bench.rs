use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bitsy::BitString;

fn input() -> String {
    "0123456789ABCDEF".repeat(64)
}

fn from_hex_bench(c: &mut Criterion) {
    let hex = input();
    c.bench_function("bitstring_from_hex", |b| {
        b.iter(|| black_box(BitString::from_hex(&hex).unwrap()))
    });
}

fn to_hex_bench(c: &mut Criterion) {
    let bits = BitString::from_hex(input()).unwrap();
    c.bench_function("bitstring_to_hex", |b| b.iter(|| black_box(bits.to_hex())));
}

criterion_group! {
    name = hexconv_benches;
    config = Criterion::default();
    targets = from_hex_bench, to_hex_bench
}

criterion_main!(hexconv_benches);
