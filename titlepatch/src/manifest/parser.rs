//! Update manifest XML parser.
//!
//! The endpoint serves documents of this shape:
//!
//! ```xml
//! <titlepatch status="alive" titleid="BLUS30443">
//!   <tag name="BLUS30443_T7" popup="true" signoff="true">
//!     <package version="01.01" size="8388608" sha1sum="..." url="http://.../A0101.pkg" ps3_system_ver="03.0000"/>
//!     <package version="01.02" size="9437184" sha1sum="..." url="http://.../A0102.pkg" ps3_system_ver="03.4100">
//!       <paramsfo>
//!         <TITLE>Demon's Souls</TITLE>
//!       </paramsfo>
//!     </package>
//!   </tag>
//! </titlepatch>
//! ```
//!
//! Usually only the newest package carries a `paramsfo` title. The title is
//! shared across the whole manifest: the last non-empty one found becomes the
//! display title of every record, including packages listed before it.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use xml::attribute::OwnedAttribute;
use xml::name::OwnedName;
use xml::reader::{EventReader, XmlEvent};

use super::record::UpdateRecord;
use crate::error::{UpdateError, UpdateResult};
use crate::identifier::TitleId;

type Reader<'a> = EventReader<&'a [u8]>;

/// A `<package>` element before the manifest-wide title is applied.
struct RawPackage {
    version: String,
    size: u64,
    system_version: String,
    url: String,
    title: Option<String>,
}

/// A parsed update manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Title id declared by the document.
    pub title_id: String,
    /// `status` attribute of the root element, when present.
    pub status: Option<String>,
    /// Packages in document order.
    pub records: Vec<UpdateRecord>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all package sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }
}

/// Replace line breaks in a title with spaces.
fn normalize_title(raw: &str) -> String {
    raw.trim().replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Parse manifest text fetched for `requested`.
///
/// # Errors
///
/// `UpdateError::Parse` if the text is not well-formed XML, the root is not
/// `<titlepatch>` or lacks a `titleid`, or a package lacks `version`, `size`
/// or `url` (or has a non-numeric size).
pub fn parse_manifest(requested: &TitleId, text: &str) -> UpdateResult<Manifest> {
    let (title_id, status, packages) =
        read_document(text).map_err(|reason| UpdateError::Parse {
            title_id: requested.to_string(),
            reason,
        })?;

    if !title_id.eq_ignore_ascii_case(requested.as_str()) {
        warn!(
            requested = %requested,
            declared = %title_id,
            "manifest declares a different title id"
        );
    }

    // First pass: the last non-empty title wins for the whole manifest.
    let title = packages
        .iter()
        .filter_map(|pkg| pkg.title.clone())
        .last()
        .unwrap_or_default();

    // Second pass: build records with the resolved title.
    let records = packages
        .into_iter()
        .map(|pkg| {
            UpdateRecord::new(
                title_id.clone(),
                pkg.version,
                pkg.size,
                pkg.system_version,
                pkg.url,
                title.clone(),
            )
        })
        .collect::<Vec<_>>();

    debug!(title_id = %title_id, records = records.len(), "parsed manifest");

    Ok(Manifest {
        title_id,
        status,
        records,
    })
}

fn read_document(text: &str) -> Result<(String, Option<String>, Vec<RawPackage>), String> {
    let mut reader = EventReader::new(text.as_bytes());

    let root_attributes = loop {
        match next_event(&mut reader)? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                if name.local_name != "titlepatch" {
                    return Err(format!(
                        "expected root element <titlepatch>, found <{}>",
                        name
                    ));
                }
                break attributes;
            }
            XmlEvent::EndElement { .. } => {
                return Err("expected root element, found the end of an element".to_string())
            }
            _ => {}
        }
    };

    let mut attributes = attribute_map(root_attributes)?;
    let title_id = attributes
        .remove("titleid")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| "<titlepatch> has no titleid".to_string())?;
    let status = attributes.remove("status");

    let mut packages = Vec::new();
    loop {
        match next_event(&mut reader)? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                if name.local_name == "tag" {
                    read_tag(attributes, &mut reader, &mut packages)?;
                } else {
                    skip_element(name, &mut reader)?;
                }
            }
            XmlEvent::EndElement { .. } => break,
            _ => {}
        }
    }

    // Only whitespace, comments or processing instructions may follow the root.
    loop {
        match reader.next().map_err(|e| e.to_string())? {
            XmlEvent::EndDocument => break,
            XmlEvent::StartElement { name, .. } => {
                return Err(format!("unexpected element <{}> after </titlepatch>", name))
            }
            _ => {}
        }
    }

    Ok((title_id, status, packages))
}

/// Next event, treating an early end of document as an error.
fn next_event(reader: &mut Reader<'_>) -> Result<XmlEvent, String> {
    match reader.next().map_err(|e| e.to_string())? {
        XmlEvent::EndDocument => Err("unexpected end of document".to_string()),
        event => Ok(event),
    }
}

fn attribute_map(attributes: Vec<OwnedAttribute>) -> Result<BTreeMap<String, String>, String> {
    let mut map = BTreeMap::new();
    for attr in attributes {
        let name = attr.name.local_name;
        if map.insert(name.clone(), attr.value).is_some() {
            return Err(format!("duplicate \"{}\" attribute", name));
        }
    }
    Ok(map)
}

fn skip_element(skipped: OwnedName, reader: &mut Reader<'_>) -> Result<(), String> {
    debug!(element = %skipped, "skipping manifest element");
    loop {
        match next_event(reader)? {
            XmlEvent::StartElement { name, .. } => skip_element(name, reader)?,
            XmlEvent::EndElement { .. } => return Ok(()),
            _ => {}
        }
    }
}

fn read_tag(
    attributes: Vec<OwnedAttribute>,
    reader: &mut Reader<'_>,
    packages: &mut Vec<RawPackage>,
) -> Result<(), String> {
    let tag_name = attribute_map(attributes)?.remove("name");
    let before = packages.len();

    loop {
        match next_event(reader)? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                if name.local_name == "package" {
                    packages.push(read_package(attributes, reader)?);
                } else {
                    skip_element(name, reader)?;
                }
            }
            XmlEvent::EndElement { .. } => break,
            _ => {}
        }
    }

    debug!(tag = ?tag_name, packages = packages.len() - before, "manifest tag");
    Ok(())
}

fn read_package(
    attributes: Vec<OwnedAttribute>,
    reader: &mut Reader<'_>,
) -> Result<RawPackage, String> {
    let mut attributes = attribute_map(attributes)?;
    let mut required = |key: &str| {
        attributes
            .remove(key)
            .map(|v| v.trim().to_string())
            .ok_or_else(|| format!("<package> is missing the {} attribute", key))
    };

    let version = required("version")?;
    let size_text = required("size")?;
    let url = required("url")?;
    let size = size_text
        .parse::<u64>()
        .map_err(|_| format!("package {} has an invalid size \"{}\"", version, size_text))?;
    let system_version = attributes
        .remove("ps3_system_ver")
        .map(|v| v.trim().to_string())
        .unwrap_or_default();

    let mut title = None;
    loop {
        match next_event(reader)? {
            XmlEvent::StartElement { name, .. } => {
                if name.local_name == "paramsfo" {
                    if let Some(found) = read_paramsfo(reader)? {
                        title = Some(found);
                    }
                } else {
                    skip_element(name, reader)?;
                }
            }
            XmlEvent::EndElement { .. } => break,
            _ => {}
        }
    }

    Ok(RawPackage {
        version,
        size,
        system_version,
        url,
        title,
    })
}

/// Read a `<paramsfo>` block and return its non-empty `TITLE`.
fn read_paramsfo(reader: &mut Reader<'_>) -> Result<Option<String>, String> {
    let mut title = None;
    loop {
        match next_event(reader)? {
            XmlEvent::StartElement { name, .. } => {
                if name.local_name == "TITLE" {
                    let text = normalize_title(&read_text(reader)?);
                    if !text.is_empty() {
                        title = Some(text);
                    }
                } else {
                    skip_element(name, reader)?;
                }
            }
            XmlEvent::EndElement { .. } => return Ok(title),
            _ => {}
        }
    }
}

/// Collect the text content of the current element.
fn read_text(reader: &mut Reader<'_>) -> Result<String, String> {
    let mut text = String::new();
    loop {
        match next_event(reader)? {
            XmlEvent::Characters(chunk) | XmlEvent::CData(chunk) | XmlEvent::Whitespace(chunk) => {
                text.push_str(&chunk)
            }
            XmlEvent::StartElement { name, .. } => skip_element(name, reader)?,
            XmlEvent::EndElement { .. } => return Ok(text),
            _ => {}
        }
    }
}
