use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use damper_config::artifact::{
    ForestArtifact, ForestTask, LinearArtifact, ModelArtifact, NodeArtifact, TreeArtifact,
};
use damper_core::{FeatureNormalizer, NormalizationProfile, WindowBuffer, oracle_from_artifact};
use std::sync::Arc;

const W: usize = 50;

// Vibration-like trace: two tones plus xorshift noise
fn synth_trace(n: usize, seed: u32) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut noise = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        (f64::from(x) / (f64::from(u32::MAX) + 1.0)) * 2.0 - 1.0
    };
    (0..n)
        .map(|i| {
            let t = i as f64 / 100.0;
            1.0 + 0.05 * (2.0 * std::f64::consts::PI * 12.0 * t).sin()
                + 0.02 * (2.0 * std::f64::consts::PI * 31.0 * t).sin()
                + 0.01 * noise()
        })
        .collect()
}

// Complete trees of the given depth over window positions
fn forest(trees: usize, depth: u32) -> ModelArtifact {
    let mut out = Vec::with_capacity(trees);
    for t in 0..trees {
        let internal = (1usize << depth) - 1;
        let total = (1usize << (depth + 1)) - 1;
        let nodes = (0..total)
            .map(|i| {
                if i < internal {
                    NodeArtifact::Split {
                        feature: (i * 7 + t * 3) % W,
                        threshold: 0.0,
                        left: 2 * i + 1,
                        right: 2 * i + 2,
                    }
                } else {
                    NodeArtifact::Leaf {
                        value: (i % 3) as f64,
                    }
                }
            })
            .collect();
        out.push(TreeArtifact { nodes });
    }
    ModelArtifact::Forest(ForestArtifact {
        task: ForestTask::Classification,
        n_features: W,
        trees: out,
    })
}

pub fn bench_inference(c: &mut Criterion) {
    let mut g = c.benchmark_group("inference");
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p damper_core --bench inference
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let trace = synth_trace(W, 0xC0FFEE);
    let mut window = WindowBuffer::new(W);
    for v in &trace {
        window.insert(*v);
    }
    let profile = Arc::new(NormalizationProfile::new(vec![1.0; W], vec![0.05; W]).unwrap());
    let normalizer = FeatureNormalizer::new(profile, W).unwrap();

    let linear = oracle_from_artifact(&ModelArtifact::Linear(LinearArtifact {
        weights: trace.iter().map(|v| v * 0.01).collect(),
        bias: 0.0,
        classes: None,
    }))
    .unwrap();

    let mut snap = Vec::with_capacity(W);
    let mut feats = Vec::with_capacity(W);
    g.bench_function("normalize_linear", |b| {
        b.iter(|| {
            window.snapshot_into(&mut snap);
            normalizer.normalize_into(black_box(&snap), &mut feats);
            black_box(linear.predict(&feats));
        })
    });

    for &(trees, depth) in &[(10usize, 6u32), (100, 8)] {
        let oracle = oracle_from_artifact(&forest(trees, depth)).unwrap();
        g.bench_function(format!("forest_{trees}x{depth}"), |b| {
            b.iter_batched(
                || normalizer.normalize(&trace),
                |f| black_box(oracle.predict(black_box(&f))),
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(inference, bench_inference);
criterion_main!(inference);
