//! End-to-end tests of the centroid-size batch driver

use approx::assert_relative_eq;
use morphocrate_algorithms::EmptyMeshPolicy;
use morphocrate_cli::{run_batch, BatchConfig};
use morphocrate_core::{Error, Point3d, TriangleMesh};
use morphocrate_io::{IoRegistry, MeshWriter, PlyWriter, VtkWriter};
use std::fs;
use std::path::Path;

fn write_vtk(dir: &Path, name: &str, points: &[(f64, f64, f64)]) {
    let mesh = TriangleMesh::from_vertices_and_faces(
        points.iter().map(|&(x, y, z)| Point3d::new(x, y, z)).collect(),
        Vec::new(),
    );
    VtkWriter::default().write_mesh(&mesh, &dir.join(name)).unwrap();
}

/// Meshes A (two points 2 apart), B (three coincident points), C (no points)
fn scenario(dir: &Path) {
    write_vtk(dir, "A.vtk", &[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0)]);
    write_vtk(dir, "B.vtk", &[(5.0, 5.0, 5.0), (5.0, 5.0, 5.0), (5.0, 5.0, 5.0)]);
    write_vtk(dir, "C.vtk", &[]);
}

#[test]
fn test_scenario_skip_policy() {
    let meshes = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    scenario(meshes.path());

    let dest = out.path().join("Mesh_centroid_sizes.csv");
    let config = BatchConfig::new(meshes.path(), &dest);
    let report = run_batch(&config, &IoRegistry::with_defaults()).unwrap();

    assert_eq!(report.records.len(), 2);
    assert_relative_eq!(report.records[0].centroid_size, 2.0_f64.sqrt(), epsilon = 1e-12);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].identifier, "C.vtk");
    assert_eq!(
        fs::read_to_string(&dest).unwrap(),
        "Mesh File,Centroid Size\nA.vtk,1.414214\nB.vtk,0.000000\n"
    );
}

#[test]
fn test_fail_policy_writes_nothing() {
    let meshes = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    scenario(meshes.path());

    let dest = out.path().join("sizes.csv");
    let config = BatchConfig::new(meshes.path(), &dest).with_policy(EmptyMeshPolicy::Fail);
    let err = run_batch(&config, &IoRegistry::with_defaults()).unwrap_err();

    match &err {
        Error::Mesh { identifier, .. } => assert_eq!(identifier, "C.vtk"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_empty_input());
    assert!(!dest.exists());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_unreadable_mesh_follows_policy() {
    let meshes = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_vtk(meshes.path(), "good.vtk", &[(0.0, 0.0, 0.0), (0.0, 3.0, 4.0)]);
    fs::write(
        meshes.path().join("bad.vtk"),
        "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 2 float\n0 0\n",
    )
    .unwrap();

    let dest = out.path().join("sizes.csv");
    let config = BatchConfig::new(meshes.path(), &dest);
    let report = run_batch(&config, &IoRegistry::with_defaults()).unwrap();
    assert_eq!(report.skipped[0].identifier, "bad.vtk");
    assert_eq!(
        fs::read_to_string(&dest).unwrap(),
        "Mesh File,Centroid Size\ngood.vtk,3.535534\n"
    );

    let config = config.with_policy(EmptyMeshPolicy::Fail);
    assert!(run_batch(&config, &IoRegistry::with_defaults()).is_err());
}

#[test]
fn test_corrupt_headers_are_skipped_not_fatal() {
    let corrupt = [
        "POINTS 9223372036854775807 float\n0 0 0\n",
        "POINTS 3 float\n0 0 0 1 0 0 0 1 0\nPOLYGONS 4611686018427387904 4\n3 0 1 2\n",
        "POINTS 3 float\n0 0 0 1 0 0 0 1 0\nPOLYGONS 1 4\n18446744073709551615 0 1 2\n",
    ];
    for body in corrupt {
        let meshes = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_vtk(meshes.path(), "a.vtk", &[(0.0, 0.0, 0.0), (0.0, 3.0, 4.0)]);
        fs::write(
            meshes.path().join("b.vtk"),
            format!("# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\n{}", body),
        )
        .unwrap();

        let dest = out.path().join("sizes.csv");
        let config = BatchConfig::new(meshes.path(), &dest);
        let report = run_batch(&config, &IoRegistry::with_defaults()).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].identifier, "b.vtk");
        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "Mesh File,Centroid Size\na.vtk,3.535534\n"
        );

        let config = config.with_policy(EmptyMeshPolicy::Fail);
        match run_batch(&config, &IoRegistry::with_defaults()) {
            Err(Error::Mesh { identifier, .. }) => assert_eq!(identifier, "b.vtk"),
            other => panic!("expected a mesh error, got {:?}", other.map(|r| r.records.len())),
        }
    }
}

#[test]
fn test_output_is_sorted_and_byte_identical() {
    let meshes = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    for (i, name) in ["zeta.vtk", "alpha.vtk", "Mid.vtk", "beta.vtk"].iter().enumerate() {
        let d = (i + 1) as f64;
        write_vtk(meshes.path(), name, &[(0.0, 0.0, 0.0), (d, d, 0.0), (0.0, d, d)]);
    }

    let first = out.path().join("first.csv");
    let second = out.path().join("second.csv");
    let registry = IoRegistry::with_defaults();
    run_batch(&BatchConfig::new(meshes.path(), &first), &registry).unwrap();
    run_batch(&BatchConfig::new(meshes.path(), &second), &registry).unwrap();

    let a = fs::read(&first).unwrap();
    assert_eq!(a, fs::read(&second).unwrap());

    let text = String::from_utf8(a).unwrap();
    let ids: Vec<&str> = text
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["Mid.vtk", "alpha.vtk", "beta.vtk", "zeta.vtk"]);
}

#[test]
fn test_ply_sources_and_precision() {
    let meshes = tempfile::tempdir().unwrap();
    let mesh = TriangleMesh::from_vertices_and_faces(
        vec![Point3d::new(-1.0, 0.0, 0.0), Point3d::new(1.0, 0.0, 0.0)],
        Vec::new(),
    );
    PlyWriter::default().write_mesh(&mesh, &meshes.path().join("pair.ply")).unwrap();
    write_vtk(meshes.path(), "ignored.vtk", &[(0.0, 0.0, 0.0)]);

    let dest = meshes.path().join("sizes.csv");
    let config = BatchConfig::new(meshes.path(), &dest)
        .with_extension_filter(".PLY")
        .with_precision(2);
    run_batch(&config, &IoRegistry::with_defaults()).unwrap();
    assert_eq!(fs::read_to_string(&dest).unwrap(), "Mesh File,Centroid Size\npair.ply,1.41\n");
}

#[test]
fn test_empty_directory_gives_header_only() {
    let meshes = tempfile::tempdir().unwrap();
    let dest = meshes.path().join("sizes.csv");
    let report = run_batch(&BatchConfig::new(meshes.path(), &dest), &IoRegistry::with_defaults()).unwrap();
    assert_eq!(report.processed(), 0);
    assert_eq!(fs::read_to_string(&dest).unwrap(), "Mesh File,Centroid Size\n");
}

#[test]
fn test_invalid_config_is_rejected_before_io() {
    let out = tempfile::tempdir().unwrap();
    let dest = out.path().join("sizes.csv");
    let config = BatchConfig::new(out.path().join("missing"), &dest);
    assert!(matches!(
        run_batch(&config, &IoRegistry::with_defaults()),
        Err(Error::Config(_))
    ));
    assert!(!dest.exists());
}
