use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use liga_scout::by_position::cluster_group;
use liga_scout::clustering::bandwidth_sweep;
use liga_scout::config::{AnalysisConfig, MeanShiftParams, default_bandwidth_grid};
use liga_scout::features::matrix_from_features;
use liga_scout::player::{Feature, PlayerRecord};
use liga_scout::positions::PositionGroup;
use liga_scout::preprocess::preprocess;
use liga_scout::recommend::{RecommendRequest, rank_cluster_mates};

const POSITIONS: [&str; 6] = ["ST", "LW", "RW", "ST, LW", "RW/ST", "LW"];
const NATIONALITIES: [&str; 4] = ["Indonesia", "Brazil", "Japan", "Indonesia"];

fn synthetic_forwards(count: usize, seed: u64) -> Vec<PlayerRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let features = PositionGroup::Forward.default_features();
    (0..count)
        .map(|idx| {
            // Three loose archetypes so the sweep finds real structure.
            let archetype = (idx % 3) as f64;
            let base = PlayerRecord::new(format!("Forward {idx}"))
                .with_position(POSITIONS[idx % POSITIONS.len()])
                .with_nationality(NATIONALITIES[idx % NATIONALITIES.len()])
                .with_team("Bench FC")
                .with_stat(Feature::Age, rng.gen_range(18.0..35.0))
                .with_stat(Feature::Appearance, rng.gen_range(5.0..34.0));
            features.iter().enumerate().fold(base, |p, (col, f)| {
                let centre = archetype * (1.0 + col as f64 * 0.2);
                p.with_stat(*f, centre + rng.gen_range(-0.4..0.4))
            })
        })
        .collect()
}

fn bench_bandwidth_sweep(c: &mut Criterion) {
    let rows = synthetic_forwards(120, 7);
    let matrix = matrix_from_features(&rows, PositionGroup::Forward.default_features())
        .expect("forward features resolve");
    let (standardized, _) = preprocess(&matrix).expect("matrix is large enough");
    let grid = default_bandwidth_grid();
    let params = MeanShiftParams::default();

    c.bench_function("bandwidth_sweep_120_forwards", |b| {
        b.iter(|| {
            let runs = bandwidth_sweep(black_box(&standardized), &grid, &params).unwrap();
            black_box(runs.len());
        })
    });
}

fn bench_rank_cluster_mates(c: &mut Criterion) {
    let rows = synthetic_forwards(240, 11);
    let cfg = AnalysisConfig::default();
    let result = cluster_group(&rows, PositionGroup::Forward, &cfg)
        .expect("clustering succeeds")
        .expect("group is large enough");
    let mut request = RecommendRequest::new("bench", "ST", "Forward 0", 10);
    request.match_position = true;

    c.bench_function("rank_cluster_mates_240_forwards", |b| {
        b.iter(|| {
            let out = rank_cluster_mates(black_box(&result), &request, "Indonesia");
            black_box(out.len());
        })
    });
}

criterion_group!(benches, bench_bandwidth_sweep, bench_rank_cluster_mates);
criterion_main!(benches);
