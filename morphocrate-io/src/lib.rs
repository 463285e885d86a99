//! I/O operations for meshes and shape statistics
//! 
//! This crate reads and writes the mesh formats used in the morphometrics
//! workflow (PLY and legacy VTK), discovers mesh files in a directory, and
//! writes the result tables, subject manifests and control-point files.

pub mod registry;
pub mod discovery;
pub mod ply;
pub mod vtk;
pub mod table;
pub mod manifest;
pub mod points_txt;
pub mod convert;

pub use registry::{detect_format_by_header, IoRegistry, MeshReader, MeshWriter};
pub use discovery::{discover_mesh_files, mesh_identifier};
pub use ply::{PlyReader, PlyWriter, PlyWriteOptions, PlyFormat};
pub use vtk::{VtkReader, VtkWriter, VtkEncoding};
pub use table::{CentroidSizeTableWriter, Delimiter, TableWriteOptions, write_filename_table};
pub use manifest::{render_manifest, write_manifest, read_manifest_filenames, manifest_for_directory, DEFAULT_OBJECT_ID};
pub use points_txt::{read_control_points, write_points_txt};
pub use convert::{convert_directory, ConversionTarget};

use morphocrate_core::{PointSet, Result, TriangleMesh};
use std::io::Write;
use std::path::Path;

/// Read a mesh, selecting the format from the file header or extension
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    IoRegistry::with_defaults().read_mesh(path.as_ref())
}

/// Read only the vertex positions of a mesh
pub fn read_point_set<P: AsRef<Path>>(path: P) -> Result<PointSet> {
    IoRegistry::with_defaults().read_point_set(path.as_ref())
}

/// Write a mesh in the format named by the file extension
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    IoRegistry::with_defaults().write_mesh(mesh, path.as_ref(), None)
}

/// Write `contents` to `path` all-or-nothing.
///
/// The bytes go to a temporary file next to the destination, which is then
/// renamed over it. A failed write leaves no file at `path`.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphocrate_core::Point3d;

    #[test]
    fn test_write_atomically_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old").unwrap();

        write_atomically(&path, b"new contents").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new contents");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomically_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(write_atomically(&path, b"x").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_top_level_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );

        for name in ["tri.ply", "tri.vtk"] {
            let path = dir.path().join(name);
            write_mesh(&mesh, &path).unwrap();
            let loaded = read_mesh(&path).unwrap();
            assert_eq!(loaded.faces, mesh.faces);
            assert_eq!(read_point_set(&path).unwrap().len(), 3);
        }
    }
}
