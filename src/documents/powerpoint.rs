//! PowerPoint (.pptx) loader
//!
//! Reads the OOXML package directly: slide order comes from
//! `ppt/presentation.xml` and its relationships, falling back to the slide
//! part numbers. Text is taken from the top-level text-bearing shapes of each
//! slide, one line per paragraph, in shape order.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use super::{split_unit, Chunk, Chunker, LoadAndSplit, PageRef};
use crate::error::{LoaderError, Result};

const FORMAT: &str = "PowerPoint";
const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub struct PowerPointLoader {
    bytes: Vec<u8>,
    filename: String,
}

impl PowerPointLoader {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    /// Text of every slide, in presentation order
    pub fn extract_slides(&self) -> Result<Vec<String>> {
        let mut archive =
            ZipArchive::new(Cursor::new(self.bytes.as_slice())).map_err(|e| LoaderError::parse(FORMAT, e))?;

        let parts = match slide_parts_from_presentation(&mut archive)? {
            Some(parts) if !parts.is_empty() => parts,
            _ => slide_parts_by_number(&archive),
        };

        let mut slides = Vec::with_capacity(parts.len());
        for part in &parts {
            let xml = read_part(&mut archive, part)?
                .ok_or_else(|| LoaderError::parse(FORMAT, format!("missing slide part {}", part)))?;
            slides.push(slide_text(&xml)?);
        }

        tracing::debug!(
            "[PowerPointLoader] {} slides from {}",
            slides.len(),
            self.filename
        );
        Ok(slides)
    }
}

impl LoadAndSplit for PowerPointLoader {
    fn load_and_split(&self, chunker: Option<&dyn Chunker>) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for (index, text) in self.extract_slides()?.into_iter().enumerate() {
            let page = PageRef::Number(index as u32 + 1);
            chunks.extend(split_unit(text, &self.filename, Some(page), chunker));
        }
        Ok(chunks)
    }
}

fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(LoaderError::parse(FORMAT, e)),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| LoaderError::parse(FORMAT, format!("{}: {}", name, e)))?;
    Ok(Some(xml))
}

/// Slide part names listed by `p:sldIdLst`, resolved through the
/// presentation relationships. `None` when either part is missing.
fn slide_parts_from_presentation(archive: &mut Archive<'_>) -> Result<Option<Vec<String>>> {
    let Some(presentation) = read_part(archive, PRESENTATION_PART)? else {
        return Ok(None);
    };
    let Some(rels) = read_part(archive, PRESENTATION_RELS_PART)? else {
        return Ok(None);
    };

    let targets = relationship_targets(&rels)?;
    let mut parts = Vec::new();
    let mut reader = XmlReader::from_str(&presentation);
    loop {
        match reader.read_event().map_err(|e| LoaderError::parse(FORMAT, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(target) = relationship_id(&e)?.and_then(|id| targets.get(&id)) {
                    parts.push(resolve_target(target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(Some(parts))
}

/// `ppt/slides/slideN.xml` parts sorted by N
fn slide_parts_by_number(archive: &Archive<'_>) -> Vec<String> {
    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?;
            number.parse().ok().map(|n| (n, name.to_string()))
        })
        .collect();
    numbered.sort();
    numbered.into_iter().map(|(_, name)| name).collect()
}

/// `Id -> Target` of a relationships part
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut targets = HashMap::new();
    let mut reader = XmlReader::from_str(xml);
    loop {
        match reader.read_event().map_err(|e| LoaderError::parse(FORMAT, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| LoaderError::parse(FORMAT, e))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| LoaderError::parse(FORMAT, e))?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value),
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// The namespaced `r:id` attribute, as opposed to the plain numeric `id`
fn relationship_id(element: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| LoaderError::parse(FORMAT, e))?;
        if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
            let value = attr
                .unescape_value()
                .map_err(|e| LoaderError::parse(FORMAT, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Targets are relative to `ppt/`, or absolute within the package
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target),
    }
}

/// Paragraph texts of the slide's top-level text shapes, newline-joined.
///
/// Only `p:sp` elements directly under `p:spTree` count; grouped shapes,
/// pictures and graphic frames have no text frame of their own.
fn slide_text(xml: &str) -> Result<String> {
    let mut reader = XmlReader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();

    let mut depth = 0usize;
    let mut tree_depth: Option<usize> = None;
    let mut shape_depth: Option<usize> = None;
    let mut in_text_body = false;
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| LoaderError::parse(FORMAT, e))? {
            Event::Start(e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"spTree" if tree_depth.is_none() => tree_depth = Some(depth),
                    b"sp" if shape_depth.is_none() && tree_depth == Some(depth - 1) => {
                        shape_depth = Some(depth)
                    }
                    b"txBody" if shape_depth.is_some() => in_text_body = true,
                    b"p" if in_text_body => paragraph = Some(String::new()),
                    b"t" if paragraph.is_some() => in_text = true,
                    _ => {}
                }
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" if in_text_body => paragraphs.push(String::new()),
                b"br" => {
                    if let Some(text) = paragraph.as_mut() {
                        text.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(text) = paragraph.as_mut() {
                    let unescaped = t.unescape().map_err(|e| LoaderError::parse(FORMAT, e))?;
                    text.push_str(&unescaped);
                }
            }
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"p" if in_text_body => {
                        if let Some(text) = paragraph.take() {
                            paragraphs.push(text);
                        }
                    }
                    b"txBody" => in_text_body = false,
                    b"sp" if shape_depth == Some(depth) => {
                        shape_depth = None;
                        in_text_body = false;
                    }
                    b"spTree" if tree_depth == Some(depth) => tree_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
