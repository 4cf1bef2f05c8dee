use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridsweeper::{
    clip,
    generators::{checkerboard, slanted_checkerboard, slanties, to_segments},
    snap::SnapRounder,
    sweep::{build_edges, sweep},
    BinaryOp, ClipConfig, WindingRule,
};

fn just_the_rounding(c: &mut Criterion) {
    let segs = to_segments(slanted_checkerboard(10));
    c.bench_function("snap rounding", |b| {
        let mut rounder = SnapRounder::default();
        b.iter(|| rounder.process(black_box(&segs)))
    });
}

fn just_the_sweep(c: &mut Criterion) {
    let segs = to_segments(checkerboard(10));
    let mut rounder = SnapRounder::default();
    if rounder.process(&segs).is_err() {
        return;
    }
    let edges = build_edges(rounder.rounded(), 2, |idx| segs.data(idx).set);

    c.bench_function("just the sweep", |b| {
        b.iter(|| {
            let mut count = 0;
            sweep(&edges, 2, |_, _, _, _| count += 1);
            black_box(count)
        })
    });
}

fn xor(c: &mut Criterion) {
    let config = ClipConfig {
        rules: [WindingRule::EvenOdd; 2],
        op: BinaryOp::Exclusion,
        ..ClipConfig::default()
    };

    let segs = to_segments(checkerboard(10));
    c.bench_function("xor", |b| b.iter(|| black_box(clip(&segs, &config))));

    let segs = to_segments(slanties(10));
    c.bench_function("xor slanties", |b| {
        b.iter(|| black_box(clip(&segs, &config)))
    });
}

fn triangulate(c: &mut Criterion) {
    let segs = to_segments(checkerboard(10));
    let Ok(mesh) = clip(&segs, &ClipConfig::default()) else {
        return;
    };
    c.bench_function("triangulate", |b| {
        b.iter(|| {
            let mut mesh = mesh.clone();
            black_box(mesh.triangulate(true))
        })
    });
}

criterion_group!(benches, just_the_rounding, just_the_sweep, xor, triangulate);
criterion_main!(benches);
