//! Benchmark for end-to-end meshing of synthetic grain volumes.
//!
//! Run with: cargo bench --package grainmesh --bench mesh_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grainmesh::{AnomalyNeighborhood, MeshOptions, SurfaceMesher};
use grainmesh_core::{LabelVolume, MemorySink, MeshResult, MeshSink, SliceBatch};

/// Sink that only counts, so the benchmark measures meshing.
#[derive(Default)]
struct CountingSink {
    triangles: usize,
}

impl MeshSink for CountingSink {
    fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()> {
        self.triangles += batch.triangles.len();
        Ok(())
    }
}

/// Voronoi-like grains: each voxel takes the label of the nearest of a fixed
/// set of seeds on a coarse lattice, jittered deterministically.
fn grain_volume(size: usize, grain: usize) -> LabelVolume {
    let cells = size.div_ceil(grain);
    let seed = |i: usize, j: usize, k: usize| {
        let h = (i * 73_856_093) ^ (j * 19_349_663) ^ (k * 83_492_791);
        [
            (i * grain + h % grain) as f64,
            (j * grain + (h / 7) % grain) as f64,
            (k * grain + (h / 49) % grain) as f64,
        ]
    };
    LabelVolume::from_fn([size, size, size], |x, y, z| {
        let (ci, cj, ck) = (x / grain, y / grain, z / grain);
        let mut best = (f64::MAX, 0);
        for k in ck.saturating_sub(1)..(ck + 2).min(cells) {
            for j in cj.saturating_sub(1)..(cj + 2).min(cells) {
                for i in ci.saturating_sub(1)..(ci + 2).min(cells) {
                    let s = seed(i, j, k);
                    let d = (s[0] - x as f64).powi(2)
                        + (s[1] - y as f64).powi(2)
                        + (s[2] - z as f64).powi(2);
                    if d < best.0 {
                        best = (d, 1 + (k * cells + j) * cells + i);
                    }
                }
            }
        }
        best.1 as i32
    })
}

fn benchmark_single_block(c: &mut Criterion) {
    let volume = LabelVolume::from_fn([32, 32, 32], |_, _, _| 1);

    c.bench_function("single_label_32", |b| {
        b.iter(|| {
            let mut sink = CountingSink::default();
            SurfaceMesher::new(volume.clone(), MeshOptions::default())
                .run(&mut sink)
                .unwrap();
            black_box(sink.triangles)
        });
    });
}

fn benchmark_grains(c: &mut Criterion) {
    let mut group = c.benchmark_group("grain_volume");
    group.sample_size(10);

    for size in [16usize, 32, 48] {
        let volume = grain_volume(size, 8);
        group.throughput(Throughput::Elements((size * size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &volume, |b, volume| {
            b.iter(|| {
                let mut sink = CountingSink::default();
                SurfaceMesher::new(volume.clone(), MeshOptions::default())
                    .run(&mut sink)
                    .unwrap();
                black_box(sink.triangles)
            });
        });
    }

    group.finish();
}

fn benchmark_anomaly_scoring(c: &mut Criterion) {
    // Alternating columns force checkerboard squares on every xy face.
    let volume = LabelVolume::from_fn([24, 24, 8], |x, y, _| 1 + ((x + y) % 2) as i32);

    let mut group = c.benchmark_group("checkerboard");
    group.sample_size(10);
    for hood in [AnomalyNeighborhood::Full, AnomalyNeighborhood::InPlane] {
        let options = MeshOptions {
            anomaly_neighborhood: hood,
        };
        group.bench_function(format!("{hood:?}"), |b| {
            b.iter(|| {
                let mut sink = MemorySink::new();
                SurfaceMesher::new(volume.clone(), options)
                    .run(&mut sink)
                    .unwrap();
                black_box(sink.batches.len())
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_block,
    benchmark_grains,
    benchmark_anomaly_scoring
);
criterion_main!(benches);
