use active_subspaces::{ActiveVariableDomain, BoundedDomain, ConstrainedSampler, Subspace};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nalgebra::{DMatrix, DVector};

fn subspace(m: usize, n: usize) -> Subspace {
    let mut rng = fastrand::Rng::with_seed(42);
    let a = DMatrix::from_fn(m, m, |_, _| rng.f64() * 2.0 - 1.0);
    Subspace::from_eigenvectors(&a.qr().q(), n).unwrap()
}

fn bench_constrained_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("constrained_chain");
    let sampler = ConstrainedSampler::with_seed(1);

    for m in [5, 20, 50] {
        let sub = subspace(m, 2);
        let y = DVector::from_row_slice(&[0.1, -0.1]);
        group.bench_with_input(BenchmarkId::new("m", m), &sub, |b, sub| {
            b.iter(|| sampler.sample_z(sub, &y, 500).unwrap());
        });
    }
    group.finish();
}

fn bench_maximin_design(c: &mut Criterion) {
    let mut group = c.benchmark_group("maximin_design");
    let domain = BoundedDomain::builder()
        .seed(5)
        .n_candidates(1_000)
        .build(&subspace(10, 2))
        .unwrap();

    for n in [10, 50] {
        group.bench_with_input(BenchmarkId::new("points", n), &n, |b, &n| {
            b.iter(|| domain.design(n).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_constrained_chain, bench_maximin_design);
criterion_main!(benches);
