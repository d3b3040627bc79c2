//! File-level tests for the VTK reader and the record files.

use std::path::PathBuf;

use grainmesh_core::{
    LabelSource, LabelVolume, MeshError, MeshOptions, MeshSink, SliceMesher,
};
use grainmesh_io::{read_nodes, read_triangles, write_label_volume, Encoding, RecordFileSink, VtkLabelReader};

fn temp_path(tag: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("grainmesh_io_{tag}_{id}"))
}

fn sample_volume() -> LabelVolume {
    LabelVolume::from_fn([3, 4, 2], |x, y, z| (x + 3 * y + 12 * z) as i32 - 5)
        .with_frame([0.5, 1.0, 2.0], [10.0, -1.0, 0.25])
}

fn read_back(path: &PathBuf) -> (grainmesh_core::VolumeHeader, Vec<i32>) {
    let mut reader = VtkLabelReader::open(path).unwrap();
    let header = *reader.header();
    let mut labels = Vec::new();
    let mut plane = vec![0; header.plane_len()];
    for z in 0..header.dims[2] {
        reader.read_plane(z, &mut plane).unwrap();
        labels.extend_from_slice(&plane);
    }
    (header, labels)
}

#[test]
fn test_written_volume_reads_back_in_both_encodings() {
    let volume = sample_volume();
    for encoding in [Encoding::Ascii, Encoding::Binary] {
        let path = temp_path("volume");
        write_label_volume(&path, &volume, encoding).unwrap();
        let (header, labels) = read_back(&path);
        assert_eq!(&header, volume.header());
        assert_eq!(labels, volume.labels());
        std::fs::remove_file(&path).ok();
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let result = VtkLabelReader::open(temp_path("absent"));
    assert!(matches!(result, Err(MeshError::Io { .. })));
}

#[test]
fn test_mesh_into_record_files() {
    let path = temp_path("mesh.vtk");
    let volume = LabelVolume::from_fn([2, 2, 2], |x, _, _| 1 + x as i32);
    write_label_volume(&path, &volume, Encoding::Binary).unwrap();

    let mut reader = VtkLabelReader::open(&path).unwrap();
    let header = *reader.header();
    let mut mesher = SliceMesher::new(&header, MeshOptions::default()).unwrap();
    let nodes_path = temp_path("mesh.nodes");
    let tris_path = temp_path("mesh.tris");
    let mut sink = RecordFileSink::new(&nodes_path, &tris_path);

    let mut plane = vec![0; header.plane_len()];
    let mut expected_nodes = Vec::new();
    let mut expected_tris = Vec::new();
    while !mesher.is_finished() {
        let input = if mesher.needs_plane() {
            reader.read_plane(mesher.next_slice(), &mut plane).unwrap();
            Some(plane.as_slice())
        } else {
            None
        };
        let (batch, _) = mesher.mesh_slice(input).unwrap();
        expected_nodes.extend_from_slice(&batch.nodes);
        expected_tris.extend_from_slice(&batch.triangles);
        sink.write_slice(batch).unwrap();
    }
    sink.finish().unwrap();

    assert!(!expected_tris.is_empty());
    assert_eq!(read_nodes(&nodes_path).unwrap(), expected_nodes);
    assert_eq!(read_triangles(&tris_path).unwrap(), expected_tris);

    for p in [&path, &nodes_path, &tris_path] {
        std::fs::remove_file(p).ok();
    }
}
