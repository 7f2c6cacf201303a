//! Criterion benchmarks for the hot paths: copybook parsing and record
//! decoding.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use mfd::cobol::copybook::parse_copybook;
use mfd::cobol::decode::{decode_record, DecodeOptions};
use mfd::cobol::encode::{encode_packed, encode_zoned};

fn copybook_source() -> String {
    "\
01 ACCOUNT-REC.
   05 ACCT-NO      PIC 9(10).
   05 BRANCH-CD    PIC X(4).
   05 OPEN-DT      PIC X(8).
   05 BALANCE      PIC S9(11)V99 COMP-3.
   05 RATE         COMP-2.
   05 TXN-COUNT    PIC S9(9) COMP.
   05 MONTH-BAL    PIC S9(9)V99 COMP-3 OCCURS 12.
   05 FILLER       PIC X(10)."
        .lines()
        .map(|l| format!("       {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn sample_record(record_length: usize) -> Vec<u8> {
    let mut data = encode_zoned(9_876_543_210, 10, false).unwrap();
    data.extend([0xC2, 0xD9, 0xF0, 0xF1]); // "BR01"
    data.extend([0xF2, 0xF0, 0xF2, 0xF4, 0xF0, 0xF1, 0xF3, 0xF1]); // "20240131"
    data.extend(encode_packed(1_234_567_890_123, 13, true).unwrap());
    data.extend(3.25f64.to_be_bytes());
    data.extend([0x00, 0x00, 0x12, 0x34]);
    for month in 0..12i128 {
        data.extend(encode_packed(month * 1000, 11, true).unwrap());
    }
    data.resize(record_length, 0x40);
    data
}

fn bench_parse_copybook(c: &mut Criterion) {
    let source = copybook_source();
    c.bench_function("parse_copybook", |b| {
        b.iter(|| parse_copybook(black_box(&source)).unwrap())
    });
}

fn bench_decode_record(c: &mut Criterion) {
    let layout = parse_copybook(&copybook_source()).unwrap();
    let data = sample_record(layout.record_length);
    let options = DecodeOptions::default();
    c.bench_function("decode_record", |b| {
        b.iter(|| decode_record(black_box(&layout), black_box(&data), &options).unwrap())
    });
}

criterion_group!(benches, bench_parse_copybook, bench_decode_record);
criterion_main!(benches);
