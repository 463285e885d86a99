//! Legacy VTK POLYDATA support
//!
//! Reads ASCII and BINARY (big-endian) legacy files. Polygon cells may use
//! the classic `POLYGONS n size` list or, from file version 5 on, the
//! `OFFSETS`/`CONNECTIVITY` pair. Only points, polygons and point normals
//! are kept; other cell kinds are read past and discarded.

use crate::registry::{detect_format_by_header, MeshReader, MeshWriter};
use crate::write_atomically;
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::debug;
use morphocrate_core::{Error, Point3d, Result, TriangleMesh, Vector3d};
use std::io::Write;
use std::path::Path;

/// Data encoding of a legacy VTK file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VtkEncoding {
    #[default]
    Ascii,
    Binary,
}

/// Reads legacy VTK POLYDATA meshes
pub struct VtkReader;

/// Writes legacy VTK POLYDATA, file version 4.2, with double precision points
#[derive(Debug, Clone, Copy, Default)]
pub struct VtkWriter {
    pub encoding: VtkEncoding,
}

impl VtkWriter {
    pub fn new(encoding: VtkEncoding) -> Self {
        Self { encoding }
    }

    /// Serialize a mesh into legacy VTK bytes
    pub fn to_bytes(&self, mesh: &TriangleMesh) -> Result<Vec<u8>> {
        let mut header = String::new();
        header.push_str("# vtk DataFile Version 4.2\n");
        header.push_str("vtk output\n");
        header.push_str(match self.encoding {
            VtkEncoding::Ascii => "ASCII\n",
            VtkEncoding::Binary => "BINARY\n",
        });
        header.push_str("DATASET POLYDATA\n");

        let mut out = header.into_bytes();
        out.extend_from_slice(format!("POINTS {} double\n", mesh.vertices.len()).as_bytes());
        self.write_triples(&mut out, mesh.vertices.iter().map(|p| [p.x, p.y, p.z]))?;

        if !mesh.faces.is_empty() {
            out.extend_from_slice(
                format!("POLYGONS {} {}\n", mesh.faces.len(), mesh.faces.len() * 4).as_bytes(),
            );
            match self.encoding {
                VtkEncoding::Ascii => {
                    for face in &mesh.faces {
                        writeln!(out, "3 {} {} {}", face[0], face[1], face[2])?;
                    }
                }
                VtkEncoding::Binary => {
                    for face in &mesh.faces {
                        out.write_i32::<BigEndian>(3)?;
                        for &index in face {
                            let index = i32::try_from(index).map_err(|_| {
                                Error::InvalidData(format!("vertex index {} does not fit a VTK int", index))
                            })?;
                            out.write_i32::<BigEndian>(index)?;
                        }
                    }
                    out.push(b'\n');
                }
            }
        }

        if let Some(normals) = &mesh.normals {
            out.extend_from_slice(format!("POINT_DATA {}\n", normals.len()).as_bytes());
            out.extend_from_slice(b"NORMALS Normals double\n");
            self.write_triples(&mut out, normals.iter().map(|n| [n.x, n.y, n.z]))?;
        }

        Ok(out)
    }

    fn write_triples<I>(&self, out: &mut Vec<u8>, triples: I) -> Result<()>
    where
        I: Iterator<Item = [f64; 3]>,
    {
        match self.encoding {
            VtkEncoding::Ascii => {
                for [x, y, z] in triples {
                    writeln!(out, "{} {} {}", x, y, z)?;
                }
            }
            VtkEncoding::Binary => {
                for triple in triples {
                    for value in triple {
                        out.write_f64::<BigEndian>(value)?;
                    }
                }
                out.push(b'\n');
            }
        }
        Ok(())
    }
}

impl MeshReader for VtkReader {
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        let bytes = std::fs::read(path)?;
        parse_polydata(&bytes).map_err(|err| match err {
            Error::InvalidData(msg) => Error::InvalidData(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    fn can_read(&self, path: &Path) -> bool {
        detect_format_by_header(path) == Some("vtk")
    }

    fn format_name(&self) -> &'static str {
        "vtk"
    }
}

impl MeshWriter for VtkWriter {
    fn write_mesh(&self, mesh: &TriangleMesh, path: &Path) -> Result<()> {
        let bytes = self.to_bytes(mesh)?;
        write_atomically(path, &bytes)
    }

    fn format_name(&self) -> &'static str {
        "vtk"
    }
}

/// Element type named in a section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
}

impl DataType {
    fn parse(name: &str) -> Result<Self> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "char" => DataType::Char,
            "unsigned_char" => DataType::UChar,
            "short" => DataType::Short,
            "unsigned_short" => DataType::UShort,
            "int" | "vtktypeint32" => DataType::Int,
            "unsigned_int" | "vtktypeuint32" => DataType::UInt,
            "long" | "vtktypeint64" | "vtkidtype" => DataType::Long,
            "unsigned_long" | "vtktypeuint64" => DataType::ULong,
            "float" => DataType::Float,
            "double" => DataType::Double,
            other => return Err(Error::InvalidData(format!("unknown data type '{}'", other))),
        })
    }

    fn size(self) -> usize {
        match self {
            DataType::Char | DataType::UChar => 1,
            DataType::Short | DataType::UShort => 2,
            DataType::Int | DataType::UInt | DataType::Float => 4,
            DataType::Long | DataType::ULong | DataType::Double => 8,
        }
    }

    fn decode(self, b: &[u8]) -> f64 {
        match self {
            DataType::Char => b[0] as i8 as f64,
            DataType::UChar => b[0] as f64,
            DataType::Short => BigEndian::read_i16(b) as f64,
            DataType::UShort => BigEndian::read_u16(b) as f64,
            DataType::Int => BigEndian::read_i32(b) as f64,
            DataType::UInt => BigEndian::read_u32(b) as f64,
            DataType::Long => BigEndian::read_i64(b) as f64,
            DataType::ULong => BigEndian::read_u64(b) as f64,
            DataType::Float => BigEndian::read_f32(b) as f64,
            DataType::Double => BigEndian::read_f64(b),
        }
    }
}

/// Byte cursor over a whole legacy file
struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    encoding: VtkEncoding,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            encoding: VtkEncoding::Ascii,
        }
    }

    /// Next line without its terminator; `None` at end of input.
    /// Whatever is left of a line after its values comes back as a blank line.
    fn line(&mut self) -> Option<&'a str> {
        if self.pos >= self.data.len() {
            return None;
        }
        let data = self.data;
        let rest = &data[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        let line = &rest[..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some(std::str::from_utf8(line).unwrap_or(""))
    }

    /// Next line with content, trimmed
    fn keyword_line(&mut self) -> Option<&'a str> {
        while let Some(line) = self.line() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
        None
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn token(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let data = self.data;
        let start = self.pos;
        while self.pos < self.data.len() && !self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            None
        } else {
            std::str::from_utf8(&data[start..self.pos]).ok()
        }
    }

    /// Read `count` values of type `ty` in the file's encoding
    fn values(&mut self, ty: DataType, count: usize, what: &str) -> Result<Vec<f64>> {
        let truncated = || Error::InvalidData(format!("truncated {} block", what));
        match self.encoding {
            VtkEncoding::Ascii => (0..count)
                .map(|_| {
                    let token = self.token().ok_or_else(truncated)?;
                    token.parse::<f64>().map_err(|_| {
                        Error::InvalidData(format!("invalid number '{}' in {} block", token, what))
                    })
                })
                .collect(),
            VtkEncoding::Binary => {
                let size = ty.size();
                let len = count.checked_mul(size).ok_or_else(truncated)?;
                let end = self.pos.checked_add(len).ok_or_else(truncated)?;
                let data = self.data;
                let block = data.get(self.pos..end).ok_or_else(truncated)?;
                self.pos = end;
                Ok(block.chunks_exact(size).map(|b| ty.decode(b)).collect())
            }
        }
    }

    fn indices(&mut self, ty: DataType, count: usize, what: &str) -> Result<Vec<usize>> {
        self.values(ty, count, what)?
            .into_iter()
            .map(|v| {
                if v >= 0.0 && v.fract() == 0.0 {
                    Ok(v as usize)
                } else {
                    Err(Error::InvalidData(format!("invalid index {} in {} block", v, what)))
                }
            })
            .collect()
    }

    fn skip_metadata(&mut self) {
        while let Some(line) = self.line() {
            if line.trim().is_empty() {
                break;
            }
        }
    }
}

fn parse_count(token: Option<&str>, what: &str) -> Result<usize> {
    token
        .and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| Error::InvalidData(format!("missing or invalid count in {} header", what)))
}

/// Number of scalars in `n` three-component tuples
fn component_count(n: usize, what: &str) -> Result<usize> {
    n.checked_mul(3)
        .ok_or_else(|| Error::InvalidData(format!("{} count {} is too large", what, n)))
}

/// Split a classic `n size` cell list into polygons
fn classic_cells(list: &[usize], cells: usize, what: &str) -> Result<Vec<Vec<usize>>> {
    let truncated = || Error::InvalidData(format!("truncated {} block", what));
    let mut polygons = Vec::with_capacity(cells.min(list.len()));
    let mut i = 0;
    for _ in 0..cells {
        let n = *list.get(i).ok_or_else(truncated)?;
        let end = n
            .checked_add(i + 1)
            .ok_or_else(|| Error::InvalidData(format!("cell size {} in {} block is too large", n, what)))?;
        let cell = list.get(i + 1..end).ok_or_else(truncated)?;
        polygons.push(cell.to_vec());
        i = end;
    }
    Ok(polygons)
}

/// Split an `OFFSETS`/`CONNECTIVITY` pair into polygons
fn offset_cells(offsets: &[usize], connectivity: &[usize], what: &str) -> Result<Vec<Vec<usize>>> {
    offsets
        .windows(2)
        .map(|w| {
            connectivity
                .get(w[0]..w[1])
                .map(<[usize]>::to_vec)
                .ok_or_else(|| Error::InvalidData(format!("inconsistent offsets in {} block", what)))
        })
        .collect()
}

fn read_cells(
    scanner: &mut Scanner<'_>,
    version_major: u32,
    first: usize,
    second: usize,
    what: &str,
) -> Result<Vec<Vec<usize>>> {
    if version_major >= 5 {
        let offsets = read_array_section(scanner, "OFFSETS", first, what)?;
        let connectivity = read_array_section(scanner, "CONNECTIVITY", second, what)?;
        offset_cells(&offsets, &connectivity, what)
    } else {
        let list = scanner.indices(DataType::Int, second, what)?;
        classic_cells(&list, first, what)
    }
}

fn read_array_section(scanner: &mut Scanner<'_>, name: &str, count: usize, what: &str) -> Result<Vec<usize>> {
    let line = scanner
        .keyword_line()
        .ok_or_else(|| Error::InvalidData(format!("missing {} in {} block", name, what)))?;
    let mut parts = line.split_whitespace();
    if !parts.next().is_some_and(|k| k.eq_ignore_ascii_case(name)) {
        return Err(Error::InvalidData(format!("expected {} in {} block, found '{}'", name, what, line)));
    }
    let ty = DataType::parse(parts.next().unwrap_or("vtktypeint64"))?;
    let values = scanner.indices(ty, count, what)?;
    Ok(values)
}

/// Parse a legacy POLYDATA file held in memory
pub(crate) fn parse_polydata(data: &[u8]) -> Result<TriangleMesh> {
    let mut scanner = Scanner::new(data);

    let signature = scanner
        .line()
        .ok_or_else(|| Error::InvalidData("empty file".to_string()))?;
    let version = signature
        .trim()
        .strip_prefix("# vtk DataFile Version")
        .ok_or_else(|| Error::InvalidData("missing '# vtk DataFile' signature".to_string()))?
        .trim();
    let version_major: u32 = version
        .split('.')
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::InvalidData(format!("invalid file version '{}'", version)))?;

    // Title line, free text
    let _ = scanner.line();

    let encoding = scanner
        .keyword_line()
        .ok_or_else(|| Error::InvalidData("missing encoding line".to_string()))?;
    scanner.encoding = match encoding.to_ascii_uppercase().as_str() {
        "ASCII" => VtkEncoding::Ascii,
        "BINARY" => VtkEncoding::Binary,
        other => return Err(Error::InvalidData(format!("unknown encoding '{}'", other))),
    };

    let dataset = scanner
        .keyword_line()
        .ok_or_else(|| Error::InvalidData("missing DATASET line".to_string()))?;
    let mut parts = dataset.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(k), Some(kind)) if k.eq_ignore_ascii_case("DATASET") => {
            if !kind.eq_ignore_ascii_case("POLYDATA") {
                return Err(Error::UnsupportedFormat(format!(
                    "VTK dataset type {} is not supported, expected POLYDATA",
                    kind
                )));
            }
        }
        _ => return Err(Error::InvalidData(format!("expected DATASET, found '{}'", dataset))),
    }

    let mut mesh = TriangleMesh::new();
    while let Some(line) = scanner.keyword_line() {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or("").to_ascii_uppercase();
        match keyword.as_str() {
            "POINTS" => {
                let n = parse_count(parts.next(), "POINTS")?;
                let ty = DataType::parse(parts.next().unwrap_or("float"))?;
                let coords = scanner.values(ty, component_count(n, "POINTS")?, "POINTS")?;
                mesh.vertices = coords
                    .chunks_exact(3)
                    .map(|c| Point3d::new(c[0], c[1], c[2]))
                    .collect();
            }
            "POLYGONS" | "VERTICES" | "LINES" | "TRIANGLE_STRIPS" => {
                let first = parse_count(parts.next(), &keyword)?;
                let second = parse_count(parts.next(), &keyword)?;
                let cells = read_cells(&mut scanner, version_major, first, second, &keyword)?;
                if keyword == "POLYGONS" {
                    for cell in &cells {
                        mesh.add_polygon(cell);
                    }
                }
            }
            "METADATA" => scanner.skip_metadata(),
            "POINT_DATA" => {
                let n = parse_count(parts.next(), "POINT_DATA")?;
                if let Some(normals) = read_point_normals(&mut scanner, n)? {
                    mesh.set_normals(normals);
                }
                break;
            }
            "CELL_DATA" | "FIELD" => break,
            other => {
                return Err(Error::InvalidData(format!("unexpected section '{}'", other)));
            }
        }
    }

    if !mesh.faces_in_bounds() {
        return Err(Error::InvalidData(format!(
            "polygon references a vertex beyond the {} declared",
            mesh.vertex_count()
        )));
    }

    debug!(
        "Parsed VTK POLYDATA v{}: {} points, {} triangles",
        version,
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

/// Read a `NORMALS` array if it is the first attribute after `POINT_DATA`
fn read_point_normals(scanner: &mut Scanner<'_>, n: usize) -> Result<Option<Vec<Vector3d>>> {
    let Some(line) = scanner.keyword_line() else {
        return Ok(None);
    };
    let mut parts = line.split_whitespace();
    if !parts.next().is_some_and(|k| k.eq_ignore_ascii_case("NORMALS")) {
        return Ok(None);
    }
    let _name = parts.next();
    let ty = DataType::parse(parts.next().unwrap_or("float"))?;
    let values = scanner.values(ty, component_count(n, "NORMALS")?, "NORMALS")?;
    Ok(Some(
        values
            .chunks_exact(3)
            .map(|c| Vector3d::new(c[0], c[1], c[2]))
            .collect(),
    ))
}
