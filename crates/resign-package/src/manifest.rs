//! `extractNativeLibs` from a package manifest

use std::fs::File;
use std::io::Read;
use std::path::Path;

use axmldecoder::{Element, Node};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::error::ManifestParseError;

pub const MANIFEST_ENTRY: &str = "AndroidManifest.xml";
pub const RESOURCES_ENTRY: &str = "resources.arsc";

/// Chunk type of a compiled resource table
const RES_TABLE_TYPE: u16 = 0x0002;
/// Header size of a compiled resource table
const RES_TABLE_HEADER_SIZE: u16 = 12;

/// Reads the `extractNativeLibs` flag of an APK
pub trait ManifestReader: Send + Sync {
    /// `application@extractNativeLibs`, `false` when absent
    fn extract_native_libs(&self, path: &Path) -> Result<bool, ManifestParseError>;
}

/// [`ManifestReader`] for APK files on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct ApkManifestReader;

impl ApkManifestReader {
    pub fn new() -> Self {
        Self
    }

    /// The manifest of `path`, decoded to text XML
    pub fn manifest_xml(&self, path: &Path) -> Result<String, ManifestParseError> {
        let file = File::open(path).map_err(|e| ManifestParseError::Archive(e.to_string()))?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| ManifestParseError::Archive(e.to_string()))?;

        if archive.index_for_name(RESOURCES_ENTRY).is_some() {
            let mut entry = archive
                .by_name(RESOURCES_ENTRY)
                .map_err(|e| ManifestParseError::Resources(e.to_string()))?;
            let size = entry.size();
            let mut header = [0u8; 8];
            entry
                .read_exact(&mut header)
                .map_err(|e| ManifestParseError::Resources(format!("{RESOURCES_ENTRY}: {e}")))?;
            check_resource_table(&header, size)?;
        }

        let mut bytes = Vec::new();
        archive
            .by_name(MANIFEST_ENTRY)
            .map_err(|e| ManifestParseError::Archive(format!("{MANIFEST_ENTRY}: {e}")))?
            .read_to_end(&mut bytes)
            .map_err(|e| ManifestParseError::Archive(e.to_string()))?;

        decode_manifest(&bytes)
    }
}

/// Validate the chunk header of `resources.arsc` against the entry size
fn check_resource_table(header: &[u8; 8], entry_size: u64) -> Result<(), ManifestParseError> {
    let chunk_type = u16::from_le_bytes([header[0], header[1]]);
    let header_size = u16::from_le_bytes([header[2], header[3]]);
    let chunk_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    if chunk_type != RES_TABLE_TYPE || header_size != RES_TABLE_HEADER_SIZE {
        return Err(ManifestParseError::Resources(format!(
            "{RESOURCES_ENTRY} is not a resource table"
        )));
    }
    if u64::from(chunk_size) != entry_size {
        return Err(ManifestParseError::Resources(format!(
            "{RESOURCES_ENTRY} declares {chunk_size} bytes but holds {entry_size}"
        )));
    }
    Ok(())
}

/// Decode a compiled manifest and write it back out as text XML
pub fn decode_manifest(bytes: &[u8]) -> Result<String, ManifestParseError> {
    let document =
        axmldecoder::parse(bytes).map_err(|e| ManifestParseError::Manifest(format!("{e:?}")))?;
    let root = document
        .get_root()
        .as_ref()
        .ok_or_else(|| ManifestParseError::Manifest("document has no root element".to_string()))?;

    let mut writer = Writer::new(Vec::new());
    write_node(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(|e| ManifestParseError::Manifest(e.to_string()))
}

fn write_error(e: quick_xml::Error) -> ManifestParseError {
    ManifestParseError::Manifest(e.to_string())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), ManifestParseError> {
    match node {
        Node::Element(element) => write_element(writer, element),
        Node::Cdata(cdata) => writer
            .write_event(Event::Text(BytesText::new(cdata.get_data())))
            .map_err(write_error),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), ManifestParseError> {
    let tag = element.get_tag();
    let mut start = BytesStart::new(tag);
    for (key, value) in element.get_attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in element.get_children() {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag))).map_err(write_error)
}

impl ManifestReader for ApkManifestReader {
    fn extract_native_libs(&self, path: &Path) -> Result<bool, ManifestParseError> {
        let xml = self.manifest_xml(path)?;
        let value = extract_native_libs_from_xml(&xml)?;
        debug!(artifact = %path.display(), extract_native_libs = value, "read manifest");
        Ok(value)
    }
}

/// Read `extractNativeLibs` from the `<application>` element directly under
/// `<manifest>`. Namespace prefixes are ignored.
pub fn extract_native_libs_from_xml(xml: &str) -> Result<bool, ManifestParseError> {
    let parse_error = |e: &dyn std::fmt::Display| ManifestParseError::Manifest(e.to_string());

    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    loop {
        let event = reader.read_event().map_err(|e| parse_error(&e))?;
        let (element, is_empty) = match &event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => {
                path.pop();
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let name = String::from_utf8_lossy(element.local_name().as_ref()).to_string();
        if name == "application" && path.len() == 1 && path[0] == "manifest" {
            for attribute in element.attributes() {
                let attribute = attribute.map_err(|e| parse_error(&e))?;
                if attribute.key.local_name().as_ref() != b"extractNativeLibs" {
                    continue;
                }
                let value = attribute.unescape_value().map_err(|e| parse_error(&e))?;
                return parse_boolean(value.trim());
            }
            return Ok(false);
        }
        if !is_empty {
            path.push(name);
        }
    }

    if path.is_empty() {
        Ok(false)
    } else {
        Err(ManifestParseError::Manifest("unexpected end of manifest".to_string()))
    }
}

/// Manifest booleans are written as words or as typed integers, where any
/// non-zero value is true
fn parse_boolean(value: &str) -> Result<bool, ManifestParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => other
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| ManifestParseError::Manifest(format!("extractNativeLibs is not a boolean: {other}"))),
    }
}
