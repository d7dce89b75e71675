use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use seismo_grid::algs::sampling::ReceiverSampler;
use seismo_grid::config::SeismoMode;
use seismo_grid::data::arena::Array3;
use seismo_grid::data::bounds::Bounds;
use seismo_grid::data::receivers::ReceiverSet;
use seismo_grid::data::wavefield::{LocalState, StressDiagonal, Velocity};
use seismo_grid::topology::partition::{GlobalCoord, GridDecomposition};

// Sweep a halo-padded cube through the three access paths.
fn bench_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_access");
    for &n in &[32isize, 64, 128] {
        let bounds = Bounds::new([-1; 3], [n + 2; 3]).unwrap();
        let mut field = Array3::<f32>::new(bounds).unwrap();
        for (k, v) in field.as_mut_slice().iter_mut().enumerate() {
            *v = (k % 17) as f32;
        }

        group.bench_with_input(BenchmarkId::new("checked_get", n), &n, |b, &n| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for j in 1..=n {
                    for i in 1..=n {
                        for k in 1..=n {
                            acc += field.get([i, j, k]).copied().unwrap_or(0.0);
                        }
                    }
                }
                black_box(acc)
            })
        });
        group.bench_with_input(BenchmarkId::new("index", n), &n, |b, &n| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for j in 1..=n {
                    for i in 1..=n {
                        for k in 1..=n {
                            acc += field[[i, j, k]];
                        }
                    }
                }
                black_box(acc)
            })
        });
        group.bench_with_input(BenchmarkId::new("unchecked", n), &n, |b, &n| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for j in 1..=n {
                    for i in 1..=n {
                        for k in 1..=n {
                            // SAFETY: 1..=n lies inside [-1, n + 2] on every axis.
                            acc += unsafe { *field.get_unchecked([i, j, k]) };
                        }
                    }
                }
                black_box(acc)
            })
        });
    }
    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let decomp = GridDecomposition::new([64, 64, 64], [1, 1, 1]).unwrap();
    let partition = decomp.partition(0).unwrap();
    let coords: Vec<GlobalCoord> = (1..=64)
        .flat_map(|x| [GlobalCoord([x, 32, 1]), GlobalCoord([x, 1, 32])])
        .collect();
    let receivers = ReceiverSet::new(&partition, &coords).unwrap();
    let bounds = partition.field_bounds(1);
    let velocity = Velocity::zeros(bounds).unwrap();
    let stress = StressDiagonal::zeros(bounds).unwrap();
    let mut pi = Array3::<f32>::new(bounds).unwrap();
    pi.fill(2.0);
    let mut u = Array3::<f32>::new(bounds).unwrap();
    u.fill(1.0);
    let state = LocalState::new(&velocity)
        .with_stress(&stress)
        .with_pi(&pi)
        .with_u(&u);

    let ns = 100;
    let mut sampler =
        ReceiverSampler::new(SeismoMode::All, [10.0; 3], receivers.ntr_local(), ns).unwrap();
    c.bench_function("sample_all_128_receivers", |b| {
        let mut step = 0;
        b.iter(|| {
            step = step % ns + 1;
            sampler.sample(step, &receivers, &state).unwrap();
        })
    });
}

criterion_group!(benches, bench_access, bench_sampling);
criterion_main!(benches);
