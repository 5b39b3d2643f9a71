use criterion::{criterion_group, criterion_main, Criterion};
use lingo_bridge::protocol::{decode_payload, encode_payload};
use lingo_bridge::Envelope;
use std::hint::black_box;
use uuid::Uuid;

fn bench_envelope_encode(c: &mut Criterion) {
    let id = Uuid::new_v4();
    let payload = vec![b'x'; 256];

    c.bench_function("envelope_encode_256B", |b| {
        b.iter(|| {
            let msg = Envelope::request(black_box("GET_NODES"), black_box(id), black_box(payload.clone()));
            black_box(msg.encode().unwrap());
        })
    });
}

fn bench_envelope_decode(c: &mut Criterion) {
    let encoded = Envelope::response("GET_NODES", Uuid::new_v4(), vec![b'x'; 256])
        .encode()
        .unwrap();

    c.bench_function("envelope_decode_256B", |b| {
        b.iter(|| {
            black_box(Envelope::decode(black_box(&encoded)).unwrap());
        })
    });
}

fn bench_payload_json(c: &mut Criterion) {
    let keys: Vec<String> = (0..100).map(|i| format!("screen.section.key_{i}")).collect();
    let encoded = encode_payload(&keys).unwrap();

    c.bench_function("payload_encode_100_keys", |b| {
        b.iter(|| black_box(encode_payload(black_box(&keys)).unwrap()))
    });
    c.bench_function("payload_decode_100_keys", |b| {
        b.iter(|| black_box(decode_payload::<Vec<String>>(black_box(&encoded)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_envelope_encode,
    bench_envelope_decode,
    bench_payload_json,
);
criterion_main!(benches);
