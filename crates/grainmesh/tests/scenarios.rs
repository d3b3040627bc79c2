//! End-to-end meshing scenarios.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use grainmesh::{
    AnomalyNeighborhood, MeshError, MeshOptions, MeshReport, MeshResult, MeshSink, MesherConfig,
    PipelinedSink, SurfaceMesher,
};
use grainmesh_core::{LabelVolume, MemorySink, NodeRecord, SliceBatch, TriangleRecord};
use grainmesh_io::{write_label_volume, Encoding};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn temp_path(tag: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("grainmesh_{tag}_{id}"))
}

fn mesh(volume: &LabelVolume, options: MeshOptions) -> (Vec<NodeRecord>, Vec<TriangleRecord>) {
    let mut sink = MemorySink::new();
    SurfaceMesher::new(volume.clone(), options)
        .run(&mut sink)
        .unwrap();
    (
        sink.nodes().copied().collect(),
        sink.triangles().copied().collect(),
    )
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Undirected edge -> number of triangles using it.
fn edge_use(triangles: &[TriangleRecord]) -> BTreeMap<(i32, i32), usize> {
    let mut edges = BTreeMap::new();
    for tri in triangles {
        let [a, b, c] = tri.nodes;
        for (u, v) in [(a, b), (b, c), (c, a)] {
            *edges.entry((u.min(v), u.max(v))).or_default() += 1;
        }
    }
    edges
}

/// Fails on any edge used by fewer than two triangles.
fn assert_watertight(triangles: &[TriangleRecord], context: &str) {
    assert!(!triangles.is_empty(), "{context}: empty mesh");
    let open: Vec<(i32, i32)> = edge_use(triangles)
        .into_iter()
        .filter(|&(_, uses)| uses < 2)
        .map(|(edge, _)| edge)
        .collect();
    assert!(open.is_empty(), "{context}: open edges {open:?}");
}

const HOODS: [AnomalyNeighborhood; 2] = [AnomalyNeighborhood::Full, AnomalyNeighborhood::InPlane];

/// A 4x4x4 block of one material
#[test]
fn test_single_label_block_is_closed_oriented_manifold() {
    let volume = LabelVolume::from_fn([4, 4, 4], |_, _, _| 1);
    let (nodes, triangles) = mesh(&volume, MeshOptions::default());

    assert!(!triangles.is_empty());
    assert!(nodes.iter().all(|n| n.kind == 2));

    // Every node lies half a voxel outside the block.
    for node in &nodes {
        assert!(
            node.position.iter().any(|&c| c == -0.5 || c == 3.5),
            "node {} at {:?}",
            node.id,
            node.position
        );
    }

    let edges = edge_use(&triangles);
    assert!(edges.values().all(|&uses| uses == 2));

    let referenced: HashSet<i32> = triangles.iter().flat_map(|t| t.nodes).collect();
    assert_eq!(referenced.len(), nodes.len());
    let euler = nodes.len() as i64 - edges.len() as i64 + triangles.len() as i64;
    assert_eq!(euler, 2);

    let center = [1.5, 1.5, 1.5];
    for tri in &triangles {
        let mut labels = tri.labels;
        labels.sort_unstable();
        assert_eq!(labels, [-3, 1]);

        let [p0, p1, p2] = tri.nodes.map(|id| nodes[id as usize].position);
        let normal = cross(sub(p1, p0), sub(p2, p0));
        let centroid = [
            (p0[0] + p1[0] + p2[0]) / 3.0,
            (p0[1] + p1[1] + p2[1]) / 3.0,
            (p0[2] + p1[2] + p2[2]) / 3.0,
        ];
        let outward = dot(normal, sub(centroid, center)) > 0.0;
        assert_eq!(outward, tri.labels[0] == 1, "triangle {}", tri.index);
    }
}

/// Four materials meeting along every face of the central cell
#[test]
fn test_four_labels_meet_at_quadruple_point() {
    let volume = LabelVolume::from_fn([2, 2, 2], |x, y, z| {
        let code = (x + 2 * y) as i32;
        if z == 0 {
            1 + code
        } else {
            4 - code
        }
    });
    let (nodes, triangles) = mesh(&volume, MeshOptions::default());

    let kinds: BTreeSet<i32> = nodes.iter().map(|n| n.kind).collect();
    assert!(kinds.contains(&4), "kinds {kinds:?}");
    assert!(kinds.contains(&14), "kinds {kinds:?}");

    let pairs: BTreeSet<(i32, i32)> = triangles
        .iter()
        .map(|t| (t.labels[0].min(t.labels[1]), t.labels[0].max(t.labels[1])))
        .collect();
    assert!(pairs.len() >= 4, "pairs {pairs:?}");

    let report = MeshReport::from_records(&nodes, &triangles);
    assert!(report.is_consistent(), "{report}");
    assert_eq!(report.materials(), vec![1, 2, 3, 4]);
}

#[test]
fn test_missing_spacing_fails_before_output() {
    let input = temp_path("nospacing.vtk");
    std::fs::write(
        &input,
        "# vtk DataFile Version 2.0\nbroken\nASCII\nDATASET STRUCTURED_POINTS\n\
         DIMENSIONS 2 2 2\nPOINT_DATA 8\nSCALARS g int 1\nLOOKUP_TABLE default\n\
         1 1 1 1 1 1 1 1\n",
    )
    .unwrap();
    let nodes = temp_path("nospacing.nodes");
    let triangles = temp_path("nospacing.tris");
    let config = MesherConfig::new(&input, &nodes, &triangles);

    let result = grainmesh::run(&config);
    assert!(matches!(result, Err(MeshError::Parse(_))));
    assert!(!nodes.exists());
    assert!(!triangles.exists());
    std::fs::remove_file(&input).ok();
}

/// Nested grains with a checkerboard layer in the middle.
fn mixed_volume() -> LabelVolume {
    LabelVolume::from_fn([6, 5, 4], |x, y, z| match z {
        0 => 1 + (x / 3) as i32,
        1 => 1 + ((x + y) % 2) as i32,
        2 => {
            if y < 2 {
                3
            } else {
                1 + (x / 2) as i32
            }
        }
        _ => 0,
    })
}

#[test]
fn test_repeated_runs_are_identical() {
    let volume = mixed_volume();
    let first = mesh(&volume, MeshOptions::default());
    let second = mesh(&volume, MeshOptions::default());
    assert_eq!(first, second);
}

#[test]
fn test_record_files_are_byte_identical_across_runs() {
    let input = temp_path("det.vtk");
    write_label_volume(&input, &mixed_volume(), Encoding::Ascii).unwrap();

    let mut outputs = Vec::new();
    for pipelined in [true, false] {
        let nodes = temp_path("det.nodes");
        let triangles = temp_path("det.tris");
        let mut config = MesherConfig::new(&input, &nodes, &triangles);
        config.pipelined = pipelined;
        let stats = grainmesh::run(&config).unwrap();
        let node_bytes = std::fs::read(&nodes).unwrap();
        let tri_bytes = std::fs::read(&triangles).unwrap();
        assert_eq!(node_bytes.len(), stats.nodes * 32);
        assert_eq!(tri_bytes.len(), stats.triangles * 24);
        assert!(MeshReport::from_files(&nodes, &triangles)
            .unwrap()
            .is_consistent());
        outputs.push((node_bytes, tri_bytes));
        std::fs::remove_file(&nodes).ok();
        std::fs::remove_file(&triangles).ok();
    }
    assert_eq!(outputs[0], outputs[1]);
    std::fs::remove_file(&input).ok();
}

#[test]
fn test_label_pairs_and_node_reuse() {
    let volume = mixed_volume();
    for hood in [AnomalyNeighborhood::Full, AnomalyNeighborhood::InPlane] {
        let options = MeshOptions {
            anomaly_neighborhood: hood,
        };
        let (nodes, triangles) = mesh(&volume, options);
        let report = MeshReport::from_records(&nodes, &triangles);
        assert!(report.is_consistent(), "{hood:?}: {report}");
        assert_eq!(report.materials(), vec![1, 2, 3]);

        // Every label pair present in the volume, and only those.
        for tri in &triangles {
            assert!(tri.labels.iter().all(|&l| l == -3 || (1..=3).contains(&l)));
        }
    }
}

#[test]
fn test_pipelined_sink_matches_direct() {
    let volume = mixed_volume();
    let direct = mesh(&volume, MeshOptions::default());

    struct Forward(Arc<std::sync::Mutex<Vec<SliceBatch>>>);
    impl MeshSink for Forward {
        fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()> {
            self.0.lock().unwrap().push(batch);
            Ok(())
        }
    }

    let batches = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut sink = PipelinedSink::spawn(Box::new(Forward(Arc::clone(&batches))), 1).unwrap();
    SurfaceMesher::new(volume, MeshOptions::default())
        .run(&mut sink)
        .unwrap();

    let batches = batches.lock().unwrap();
    let nodes: Vec<NodeRecord> = batches.iter().flat_map(|b| b.nodes.clone()).collect();
    let triangles: Vec<TriangleRecord> = batches.iter().flat_map(|b| b.triangles.clone()).collect();
    assert_eq!((nodes, triangles), direct);
}

#[test]
fn test_cancellation_stops_between_slices() {
    struct CancelAfter {
        flag: Arc<AtomicBool>,
        slices: usize,
    }
    impl MeshSink for CancelAfter {
        fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()> {
            self.slices += 1;
            if batch.slice == 1 {
                self.flag.store(true, Ordering::Relaxed);
            }
            Ok(())
        }
    }

    let flag = Arc::new(AtomicBool::new(false));
    let volume = LabelVolume::from_fn([3, 3, 5], |_, _, _| 2);
    let mut mesher =
        SurfaceMesher::new(volume, MeshOptions::default()).with_cancel_flag(Arc::clone(&flag));
    let mut sink = CancelAfter {
        flag,
        slices: 0,
    };
    let err = mesher.run(&mut sink).unwrap_err();
    assert!(matches!(err, MeshError::Cancelled { slice: 2 }));
    assert_eq!(sink.slices, 2);
}

/// Checkerboard planes separated by uniform layers.
#[test]
fn test_checkerboard_layers_are_watertight() {
    let volume = LabelVolume::from_fn([4, 4, 5], |x, y, z| match z {
        0 => 1 + ((x + y) % 2) as i32,
        2 => 2 + ((x + y) % 2) as i32,
        4 => 1 + 2 * ((x + y) % 2) as i32,
        _ => 1,
    });
    for hood in HOODS {
        let options = MeshOptions {
            anomaly_neighborhood: hood,
        };
        let (_, triangles) = mesh(&volume, options);
        assert_watertight(&triangles, &format!("{hood:?}"));
    }
    for hood in HOODS {
        let options = MeshOptions {
            anomaly_neighborhood: hood,
        };
        let (_, triangles) = mesh(&mixed_volume(), options);
        assert_watertight(&triangles, &format!("mixed {hood:?}"));
    }
}

/// Seeded random three-label volumes.
#[test]
fn test_random_grain_volumes_are_watertight() {
    for seed in 0..200u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let volume = LabelVolume::from_fn([3, 3, 3], |_, _, _| rng.gen_range(1..=3));
        for hood in HOODS {
            let options = MeshOptions {
                anomaly_neighborhood: hood,
            };
            let (_, triangles) = mesh(&volume, options);
            assert_watertight(&triangles, &format!("seed {seed} {hood:?}"));
        }
    }
}
