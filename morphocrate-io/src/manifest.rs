//! Subject manifest (`data_set.xml`) for the shape-modelling tool
//!
//! One `<subject>` per mesh file, each holding a single visit whose
//! `<filename>` names the file:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <data-set>
//!     <subject id="a.vtk">
//!         <visit id="cranium">
//!             <filename object_id="cranium">a.vtk</filename>
//!         </visit>
//!     </subject>
//! </data-set>
//! ```

use crate::discovery::{discover_mesh_files, mesh_identifier};
use crate::write_atomically;
use log::info;
use morphocrate_core::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

/// Object id used for visits and filenames unless another is given
pub const DEFAULT_OBJECT_ID: &str = "cranium";

fn xml_err<E: std::fmt::Display>(err: E) -> Error {
    Error::InvalidData(format!("XML error: {}", err))
}

/// Render the manifest; subjects are sorted by file name
pub fn render_manifest(files: &[String], object_id: &str) -> Result<String> {
    let mut sorted: Vec<&String> = files.iter().collect();
    sorted.sort();

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("data-set")))
        .map_err(xml_err)?;

    for file in sorted {
        let mut subject = BytesStart::new("subject");
        subject.push_attribute(("id", file.as_str()));
        writer.write_event(Event::Start(subject)).map_err(xml_err)?;

        let mut visit = BytesStart::new("visit");
        visit.push_attribute(("id", object_id));
        writer.write_event(Event::Start(visit)).map_err(xml_err)?;

        let mut filename = BytesStart::new("filename");
        filename.push_attribute(("object_id", object_id));
        writer.write_event(Event::Start(filename)).map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::new(file)))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("filename")))
            .map_err(xml_err)?;

        writer
            .write_event(Event::End(BytesEnd::new("visit")))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("subject")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("data-set")))
        .map_err(xml_err)?;

    let mut xml = String::from_utf8(writer.into_inner()).map_err(xml_err)?;
    xml.push('\n');
    Ok(xml)
}

/// Write the manifest for `files` to `path`
pub fn write_manifest<P: AsRef<Path>>(files: &[String], path: P, object_id: &str) -> Result<()> {
    let xml = render_manifest(files, object_id)?;
    write_atomically(path.as_ref(), xml.as_bytes())
}

/// Write a manifest listing every file in `dir` with the given extension.
///
/// Returns the listed file names in manifest order.
pub fn manifest_for_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    dir: P,
    extension: &str,
    path: Q,
    object_id: &str,
) -> Result<Vec<String>> {
    let names: Vec<String> = discover_mesh_files(dir.as_ref(), extension)?
        .iter()
        .map(|p| mesh_identifier(p))
        .collect();
    write_manifest(&names, path.as_ref(), object_id)?;
    info!(
        "Wrote manifest of {} subjects to {}",
        names.len(),
        path.as_ref().display()
    );
    Ok(names)
}

/// Every `<filename>` text of a manifest, in document order
pub fn read_manifest_filenames<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_manifest_filenames(&text)
}

fn parse_manifest_filenames(text: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut names = Vec::new();
    let mut in_filename = false;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"filename" => in_filename = true,
            Event::End(e) if e.name().as_ref() == b"filename" => in_filename = false,
            Event::Text(t) if in_filename => {
                names.push(t.unescape().map_err(xml_err)?.into_owned());
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}
