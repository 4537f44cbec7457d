use criterion::measurement::Measurement;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion};
use rand::distr::{Bernoulli, Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use single_mca::indicator::NormalizedTable;
use single_mca::{CategorySchema, MCABuilder, Observation};
use std::time::Duration;

#[derive(Clone)]
pub struct CategoricalTableConfig {
    seed: u64,
    table_sizes: Vec<(usize, usize)>,
    max_categories: usize,
    missing_rate: f64,
    measurement_time: u64,
    sample_size: usize,
}

impl Default for CategoricalTableConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            table_sizes: vec![(50, 5), (200, 10), (1000, 20), (2000, 40)],
            max_categories: 5,
            missing_rate: 0.05,
            measurement_time: 10,
            sample_size: 10,
        }
    }
}

fn create_test_table(
    rows: usize,
    variables: usize,
    config: &CategoricalTableConfig,
    seed: u64,
) -> (Vec<Observation>, CategorySchema) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let width_dist = Uniform::new_inclusive(2, config.max_categories).unwrap();
    let missing_dist = Bernoulli::new(config.missing_rate).unwrap();

    let widths: Vec<usize> = (0..variables).map(|_| width_dist.sample(&mut rng)).collect();
    let mut schema = CategorySchema::new();
    for (v, &w) in widths.iter().enumerate() {
        schema.insert(format!("var{}", v), (0..w as i64).collect::<Vec<_>>());
    }

    let observations = (0..rows)
        .map(|_| {
            let mut obs = Observation::new();
            for (v, &w) in widths.iter().enumerate() {
                if !missing_dist.sample(&mut rng) {
                    let value = Uniform::try_from(0..w as i64).unwrap().sample(&mut rng);
                    obs.set(format!("var{}", v), value);
                }
            }
            obs
        })
        .collect();

    (observations, schema)
}

fn configure_group<'a, M: Measurement>(
    c: &'a mut Criterion<M>,
    name: &str,
    config: &CategoricalTableConfig,
) -> BenchmarkGroup<'a, M> {
    let mut group = c.benchmark_group(name);
    group.measurement_time(Duration::from_secs(config.measurement_time));
    group.sample_size(config.sample_size);
    group
}

pub fn bench_normalization(c: &mut Criterion) {
    let config = CategoricalTableConfig::default();
    let mut group = configure_group(c, "MCA_Normalization", &config);

    for &(rows, variables) in config.table_sizes.iter() {
        let seed = config.seed + (rows * variables) as u64;
        let (observations, schema) = create_test_table(rows, variables, &config, seed);

        group.bench_with_input(
            BenchmarkId::new("residual", format!("{}x{}", rows, variables)),
            &(rows, variables),
            |b, _| {
                b.iter(|| NormalizedTable::build(&observations, &schema).unwrap());
            },
        );
    }

    group.finish();
}

pub fn bench_fit(c: &mut Criterion) {
    let config = CategoricalTableConfig::default();
    let mut group = configure_group(c, "MCA_Fit", &config);

    for &(rows, variables) in config.table_sizes.iter() {
        let seed = config.seed + (rows * variables) as u64;
        let (observations, schema) = create_test_table(rows, variables, &config, seed);

        let corrected = MCABuilder::new().build();
        group.bench_with_input(
            BenchmarkId::new("corrected", format!("{}x{}", rows, variables)),
            &(rows, variables),
            |b, _| {
                b.iter(|| corrected.fit(&observations, &schema).unwrap());
            },
        );

        let checked = MCABuilder::new().svd_tolerance(1e-6).build();
        group.bench_with_input(
            BenchmarkId::new("checked", format!("{}x{}", rows, variables)),
            &(rows, variables),
            |b, _| {
                b.iter(|| checked.fit(&observations, &schema).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_normalization, bench_fit);
criterion_main!(benches);
