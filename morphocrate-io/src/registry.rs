//! Unified IO registry for format-agnostic reading and writing
//!
//! Downstream code (the batch driver in particular) reads meshes through the
//! registry without knowing which format a file is in. The format is taken
//! from the file header when it is recognizable and from the extension
//! otherwise.

use crate::ply::{PlyReader, PlyWriter};
use crate::vtk::{VtkReader, VtkWriter};
use log::debug;
use morphocrate_core::{Error, PointSet, Result, TriangleMesh};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader: Send + Sync {
    /// Read a mesh from the given path
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh>;

    /// Read only the vertex positions
    fn read_point_set(&self, path: &Path) -> Result<PointSet> {
        Ok(self.read_mesh(path)?.into_point_set())
    }

    /// Check if this reader can handle the given file by examining its header
    fn can_read(&self, path: &Path) -> bool;

    /// Get the format name this reader handles
    fn format_name(&self) -> &'static str;
}

/// Trait for writing meshes to files
pub trait MeshWriter: Send + Sync {
    /// Write a mesh to the given path
    fn write_mesh(&self, mesh: &TriangleMesh, path: &Path) -> Result<()>;

    /// Get the format name this writer handles
    fn format_name(&self) -> &'static str;
}

/// IO registry that manages format handlers and provides unified access
pub struct IoRegistry {
    mesh_readers: HashMap<String, Box<dyn MeshReader>>,
    mesh_writers: HashMap<String, Box<dyn MeshWriter>>,
}

impl IoRegistry {
    /// Create a new empty IO registry
    pub fn new() -> Self {
        Self {
            mesh_readers: HashMap::new(),
            mesh_writers: HashMap::new(),
        }
    }

    /// Create a registry with the PLY and VTK handlers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_mesh_reader("ply", Box::new(PlyReader));
        registry.register_mesh_writer("ply", Box::new(PlyWriter::default()));
        registry.register_mesh_reader("vtk", Box::new(VtkReader));
        registry.register_mesh_writer("vtk", Box::new(VtkWriter::default()));
        registry
    }

    /// Register a mesh reader for a specific format
    pub fn register_mesh_reader(&mut self, format: &str, reader: Box<dyn MeshReader>) {
        self.mesh_readers.insert(format.to_lowercase(), reader);
    }

    /// Register a mesh writer for a specific format
    pub fn register_mesh_writer(&mut self, format: &str, writer: Box<dyn MeshWriter>) {
        self.mesh_writers.insert(format.to_lowercase(), writer);
    }

    /// Sorted names of the formats that can be read
    pub fn readable_formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.mesh_readers.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }

    /// Read a mesh, detecting the format from its header, then its extension
    pub fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        self.reader_for(path)?.read_mesh(path)
    }

    /// Read the vertex positions of a mesh, detecting the format
    pub fn read_point_set(&self, path: &Path) -> Result<PointSet> {
        self.reader_for(path)?.read_point_set(path)
    }

    /// Write a mesh; the format is `format_hint` or else the file extension
    pub fn write_mesh(&self, mesh: &TriangleMesh, path: &Path, format_hint: Option<&str>) -> Result<()> {
        let format = match format_hint {
            Some(hint) => hint.to_lowercase(),
            None => extension_of(path).ok_or_else(|| {
                Error::UnsupportedFormat(format!("Cannot infer mesh format of {}", path.display()))
            })?,
        };

        match self.mesh_writers.get(&format) {
            Some(writer) => writer.write_mesh(mesh, path),
            None => Err(Error::UnsupportedFormat(
                format!("No mesh writer found for format: {}", format)
            )),
        }
    }

    fn reader_for(&self, path: &Path) -> Result<&dyn MeshReader> {
        if let Some(detected) = detect_format_by_header(path) {
            if let Some(reader) = self.mesh_readers.get(detected) {
                debug!("{}: detected {} from header", path.display(), detected);
                return Ok(reader.as_ref());
            }
        }

        // Fall back to extension-based detection
        if let Some(ext) = extension_of(path) {
            if let Some(reader) = self.mesh_readers.get(&ext) {
                return Ok(reader.as_ref());
            }
        }

        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        Err(Error::UnsupportedFormat(
            format!("No mesh reader found for {}", path.display())
        ))
    }
}

impl Default for IoRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

/// Detect file format by examining the header/magic bytes
pub fn detect_format_by_header(path: &Path) -> Option<&'static str> {
    let mut file = File::open(path).ok()?;
    let mut header = [0u8; 32];
    let bytes_read = file.read(&mut header).ok()?;
    let header = &header[..bytes_read];

    if header.starts_with(b"ply\n") || header.starts_with(b"ply\r\n") {
        Some("ply")
    } else if header.starts_with(b"# vtk DataFile") {
        Some("vtk")
    } else {
        None
    }
}
