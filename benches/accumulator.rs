use criterion::{black_box, criterion_group, criterion_main, Criterion};
use unique_device_id::{
    hal::{NoDelay, NoIndicator, Ports, SimulatedAdc},
    Diagnostics, EntropyAccumulator,
};

fn bench_next_byte(c: &mut Criterion) {
    let mut ports = Ports::new(SimulatedAdc::from_seed(0), NoIndicator, NoDelay::new());
    let mut acc = EntropyAccumulator::new(256, Diagnostics::disabled());
    acc.prime(&mut ports);

    c.bench_function("next_byte_256_rounds", |b| {
        b.iter(|| black_box(acc.next_byte(&mut ports)))
    });
}

fn bench_identifier(c: &mut Criterion) {
    let mut ports = Ports::new(SimulatedAdc::from_seed(1), NoIndicator, NoDelay::new());
    let mut acc = EntropyAccumulator::new(256, Diagnostics::disabled());
    acc.prime(&mut ports);

    c.bench_function("identifier_16_bytes", |b| {
        b.iter(|| {
            let mut out = [0u8; 16];
            acc.fill_bytes(&mut ports, &mut out);
            black_box(out)
        })
    });
}

criterion_group!(benches, bench_next_byte, bench_identifier);
criterion_main!(benches);
