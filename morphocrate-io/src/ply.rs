//! PLY format support

use crate::registry::{detect_format_by_header, MeshReader, MeshWriter};
use crate::write_atomically;
use morphocrate_core::{Error, Point3d, Result, TriangleMesh, Vector3d};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use ply_rs::{
    parser::Parser,
    writer::Writer,
    ply::{Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType, ScalarType},
};

/// Binary or ASCII encoding of a written PLY file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlyFormat {
    Ascii,
    #[default]
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl From<PlyFormat> for Encoding {
    fn from(format: PlyFormat) -> Self {
        match format {
            PlyFormat::Ascii => Encoding::Ascii,
            PlyFormat::BinaryLittleEndian => Encoding::BinaryLittleEndian,
            PlyFormat::BinaryBigEndian => Encoding::BinaryBigEndian,
        }
    }
}

/// PLY writer configuration options
#[derive(Debug, Clone, Default)]
pub struct PlyWriteOptions {
    /// Output encoding
    pub format: PlyFormat,
    /// Header comments, one per line
    pub comments: Vec<String>,
    /// Store coordinates as `double` instead of `float`
    pub double_precision: bool,
}

impl PlyWriteOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// ASCII output
    pub fn ascii() -> Self {
        Self {
            format: PlyFormat::Ascii,
            ..Self::default()
        }
    }

    /// Set the output encoding
    pub fn with_format(mut self, format: PlyFormat) -> Self {
        self.format = format;
        self
    }

    /// Add a header comment
    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Store coordinates as `double`
    pub fn with_double_precision(mut self, double_precision: bool) -> Self {
        self.double_precision = double_precision;
        self
    }
}

/// Reads PLY meshes, ASCII or binary
pub struct PlyReader;

/// Writes PLY meshes with the configured [`PlyWriteOptions`]
#[derive(Debug, Clone, Default)]
pub struct PlyWriter {
    pub options: PlyWriteOptions,
}

impl PlyWriter {
    pub fn new(options: PlyWriteOptions) -> Self {
        Self { options }
    }

    /// Serialize a mesh into PLY bytes
    pub fn to_bytes(&self, mesh: &TriangleMesh) -> Result<Vec<u8>> {
        let scalar = if self.options.double_precision {
            ScalarType::Double
        } else {
            ScalarType::Float
        };
        let value = |v: f64| {
            if self.options.double_precision {
                Property::Double(v)
            } else {
                Property::Float(v as f32)
            }
        };

        let mut ply = Ply::<DefaultElement>::new();
        ply.header.encoding = self.options.format.into();
        ply.header.comments.extend(self.options.comments.iter().cloned());

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertices.len();
        let mut names = vec!["x", "y", "z"];
        if mesh.normals.is_some() {
            names.extend(["nx", "ny", "nz"]);
        }
        for name in &names {
            vertex_element
                .properties
                .add(PropertyDef::new(name.to_string(), PropertyType::Scalar(scalar.clone())));
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        let mut vertices = Vec::with_capacity(mesh.vertices.len());
        for (i, vertex) in mesh.vertices.iter().enumerate() {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), value(vertex.x));
            element.insert("y".to_string(), value(vertex.y));
            element.insert("z".to_string(), value(vertex.z));
            if let Some(normal) = mesh.normals.as_ref().and_then(|n| n.get(i)) {
                element.insert("nx".to_string(), value(normal.x));
                element.insert("ny".to_string(), value(normal.y));
                element.insert("nz".to_string(), value(normal.z));
            }
            vertices.push(element);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        let mut faces = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let indices = face
                .iter()
                .map(|&i| {
                    i32::try_from(i).map_err(|_| {
                        Error::InvalidData(format!("vertex index {} does not fit a PLY int", i))
                    })
                })
                .collect::<Result<Vec<i32>>>()?;
            let mut element = DefaultElement::new();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        let mut buffer = Vec::new();
        Writer::new().write_ply(&mut buffer, &mut ply)?;
        Ok(buffer)
    }
}

impl MeshReader for PlyReader {
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let vertex_elements = ply.payload.get("vertex").map(Vec::as_slice).unwrap_or(&[]);
        let vertices = vertex_elements
            .iter()
            .map(|v| {
                Ok(Point3d::new(
                    scalar_property(v, "x")?,
                    scalar_property(v, "y")?,
                    scalar_property(v, "z")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, Vec::new());
        if let Some(face_elements) = ply.payload.get("face") {
            for face in face_elements {
                mesh.add_polygon(&face_indices(face)?);
            }
        }
        if !mesh.faces_in_bounds() {
            return Err(Error::InvalidData(format!(
                "{}: face references a vertex beyond the {} declared",
                path.display(),
                mesh.vertex_count()
            )));
        }

        let normals: Option<Vec<Vector3d>> = vertex_elements
            .iter()
            .map(|v| {
                Some(Vector3d::new(
                    scalar_property(v, "nx").ok()?,
                    scalar_property(v, "ny").ok()?,
                    scalar_property(v, "nz").ok()?,
                ))
            })
            .collect();
        if let Some(normals) = normals.filter(|n| !n.is_empty()) {
            mesh.set_normals(normals);
        }

        Ok(mesh)
    }

    fn can_read(&self, path: &Path) -> bool {
        detect_format_by_header(path) == Some("ply")
    }

    fn format_name(&self) -> &'static str {
        "ply"
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh(&self, mesh: &TriangleMesh, path: &Path) -> Result<()> {
        let bytes = self.to_bytes(mesh)?;
        write_atomically(path, &bytes)
    }

    fn format_name(&self) -> &'static str {
        "ply"
    }
}

/// Extract a numeric scalar property as f64
fn scalar_property(element: &DefaultElement, name: &str) -> Result<f64> {
    match element.get(name) {
        Some(Property::Char(v)) => Ok(*v as f64),
        Some(Property::UChar(v)) => Ok(*v as f64),
        Some(Property::Short(v)) => Ok(*v as f64),
        Some(Property::UShort(v)) => Ok(*v as f64),
        Some(Property::Int(v)) => Ok(*v as f64),
        Some(Property::UInt(v)) => Ok(*v as f64),
        Some(Property::Float(v)) => Ok(*v as f64),
        Some(Property::Double(v)) => Ok(*v),
        _ => Err(Error::InvalidData(
            format!("Property '{}' not found or invalid type", name)
        )),
    }
}

/// Extract face indices from a PLY face element
fn face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    fn to_index<T: TryInto<usize> + Copy + std::fmt::Display>(values: &[T]) -> Result<Vec<usize>> {
        values
            .iter()
            .map(|&v| {
                v.try_into()
                    .map_err(|_| Error::InvalidData(format!("invalid vertex index {}", v)))
            })
            .collect()
    }

    match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListChar(v)) => to_index(v),
        Some(Property::ListUChar(v)) => to_index(v),
        Some(Property::ListShort(v)) => to_index(v),
        Some(Property::ListUShort(v)) => to_index(v),
        Some(Property::ListInt(v)) => to_index(v),
        Some(Property::ListUInt(v)) => to_index(v),
        _ => Err(Error::InvalidData(
            "Face indices not found".to_string()
        )),
    }
}
