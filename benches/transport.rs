//! Throughput benchmark for the packet transport kernel.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use novamc_rs::macroatom::MacroAtomData;
use novamc_rs::model::{LineInteractionMode, ModelSnapshot};
use novamc_rs::packet::PacketPopulation;
use novamc_rs::transport::driver::{run_transport, TransportConfig};
use novamc_rs::DAY_TO_SECONDS;

fn forest_model(n_lines: usize) -> ModelSnapshot {
    let nu_blue = 1.0e15;
    let nu_red = 2.0e14;
    let ratio = (nu_red / nu_blue).powf(1.0 / (n_lines - 1) as f64);
    let line_list_nu: Vec<f64> = (0..n_lines)
        .map(|i| nu_blue * ratio.powi(i as i32))
        .collect();

    ModelSnapshot::homologous(
        20,
        1.1e9,
        2.0e9,
        13.0 * DAY_TO_SECONDS,
        1.0e8,
        line_list_nu,
        0.4,
        LineInteractionMode::Scatter,
        MacroAtomData::empty(),
    )
}

fn bench_transport(c: &mut Criterion) {
    let model = forest_model(500);
    let packets = PacketPopulation::photospheric(2000, 2.5e14, 9.0e14, 1.0, 42);
    let config = TransportConfig::default();

    c.bench_function("transport_2000_packets_500_lines", |b| {
        b.iter(|| {
            let result = run_transport(black_box(&model), black_box(&packets), &config).unwrap();
            black_box(result.stats.escaped)
        })
    });
}

criterion_group!(benches, bench_transport);
criterion_main!(benches);
