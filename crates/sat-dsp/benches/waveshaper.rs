//! Waveshaper bank benchmarks

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sat_dsp::waveshaper::{Waveshape, WaveshaperBank};

fn bench_all_shapes(c: &mut Criterion) {
    let input: Vec<f64> = (0..1024).map(|i| 2.0 * (i as f64 * 0.013).sin()).collect();
    let mut output = vec![0.0; 1024];
    let mut bank = WaveshaperBank::new();

    let mut group = c.benchmark_group("waveshaper_1024");
    for shape in Waveshape::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(shape.name()), &shape, |b, shape| {
            b.iter(|| {
                for (y, &x) in output.iter_mut().zip(&input) {
                    *y = bank.process(black_box(x), shape.index(), 0.5);
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_all_shapes);
criterion_main!(benches);
