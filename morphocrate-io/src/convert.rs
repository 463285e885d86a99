//! Batch conversion of PLY meshes

use crate::discovery::{discover_mesh_files, mesh_identifier};
use crate::ply::{PlyReader, PlyWriteOptions, PlyWriter};
use crate::registry::{MeshReader, MeshWriter};
use crate::vtk::VtkWriter;
use log::{debug, info};
use morphocrate_core::Result;
use std::path::{Path, PathBuf};

/// Output format of [`convert_directory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionTarget {
    /// Legacy VTK POLYDATA, written with a `.vtk` extension
    Vtk,
    /// ASCII PLY under the same file name
    AsciiPly,
}

impl ConversionTarget {
    fn output_name(self, input: &Path) -> PathBuf {
        match self {
            ConversionTarget::Vtk => PathBuf::from(input.file_name().unwrap_or_default()).with_extension("vtk"),
            ConversionTarget::AsciiPly => PathBuf::from(input.file_name().unwrap_or_default()),
        }
    }

    fn writer(self) -> Box<dyn MeshWriter> {
        match self {
            ConversionTarget::Vtk => Box::new(VtkWriter::default()),
            ConversionTarget::AsciiPly => Box::new(PlyWriter::new(PlyWriteOptions::ascii())),
        }
    }
}

/// Convert every `.ply` file directly inside `input_dir` into `output_dir`.
///
/// Files are processed in sorted order and the written paths are returned in
/// that order. The output directory is created when missing. The first file
/// that cannot be read or written stops the conversion.
pub fn convert_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    input_dir: P,
    output_dir: Q,
    target: ConversionTarget,
) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)?;

    let writer = target.writer();
    let mut written = Vec::new();
    for input in discover_mesh_files(input_dir.as_ref(), "ply")? {
        let identifier = mesh_identifier(&input);
        let output = output_dir.join(target.output_name(&input));

        let mesh = PlyReader
            .read_mesh(&input)
            .map_err(|err| err.for_mesh(identifier.clone()))?;
        writer
            .write_mesh(&mesh, &output)
            .map_err(|err| err.for_mesh(identifier.clone()))?;

        debug!("Converted {} to {}", input.display(), output.display());
        written.push(output);
    }

    info!(
        "Converted {} PLY files into {}",
        written.len(),
        output_dir.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vtk::VtkReader;
    use morphocrate_core::{Error, Point3d, TriangleMesh};
    use std::fs;

    fn write_binary_ply(path: &Path, offset: f64) {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3d::new(offset, 0.0, 0.0),
                Point3d::new(offset + 1.0, 0.0, 0.0),
                Point3d::new(offset, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        PlyWriter::default().write_mesh(&mesh, path).unwrap();
    }

    #[test]
    fn test_ply_to_vtk() {
        let input = tempfile::tempdir().unwrap();
        write_binary_ply(&input.path().join("b.ply"), 2.0);
        write_binary_ply(&input.path().join("a.ply"), 0.0);
        fs::write(input.path().join("notes.txt"), "x").unwrap();

        let output = input.path().join("VTK Files");
        let written = convert_directory(input.path(), &output, ConversionTarget::Vtk).unwrap();
        assert_eq!(written, vec![output.join("a.vtk"), output.join("b.vtk")]);

        let mesh = VtkReader.read_mesh(&written[1]).unwrap();
        assert_eq!(mesh.vertices[0], Point3d::new(2.0, 0.0, 0.0));
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_binary_to_ascii_ply() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_binary_ply(&input.path().join("m.ply"), 0.5);

        let written = convert_directory(input.path(), output.path(), ConversionTarget::AsciiPly).unwrap();
        assert_eq!(written, vec![output.path().join("m.ply")]);

        let text = fs::read_to_string(&written[0]).unwrap();
        assert!(text.starts_with("ply\nformat ascii 1.0\n"));
        assert_eq!(PlyReader.read_point_set(&written[0]).unwrap()[1], Point3d::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn test_failure_names_file() {
        let input = tempfile::tempdir().unwrap();
        fs::write(input.path().join("broken.ply"), "ply\nformat ascii 1.0\nelement vertex 2\n").unwrap();

        let err = convert_directory(input.path(), input.path().join("out"), ConversionTarget::Vtk).unwrap_err();
        match err {
            Error::Mesh { identifier, .. } => assert_eq!(identifier, "broken.ply"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
