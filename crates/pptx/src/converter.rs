//! PPTX container conversion.
//!
//! The archive is copied entry by entry into a new archive. Slide parts (and
//! notes parts, when asked for) go through [`rewrite_part`]; every other
//! entry is raw-copied without recompression.

use crate::runs::rewrite_part;
use crate::xml::{attribute, local_name, xml_error};
use bamini_core::{ConversionReport, Error, PartKind, PartReport, Result, Transliterator};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek, Write};
use std::sync::LazyLock;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Trailing number of an id or part name such as `rId12` or `slide3.xml`.
static TRAILING_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.xml)?(?:\.rels)?$").unwrap());

/// A part of the package that will be rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TargetPart {
    kind: PartKind,
    number: usize,
    path: String,
}

/// A relationship read from a `.rels` part.
#[derive(Debug, Clone, Default)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// Converts the Bamini text of a PPTX package to Unicode Tamil.
#[derive(Debug, Clone, Copy)]
pub struct PptxConverter<'t> {
    transliterator: Transliterator<'t>,
    include_notes: bool,
}

impl<'t> PptxConverter<'t> {
    /// Create a converter that rewrites slides only.
    pub fn new(transliterator: Transliterator<'t>) -> Self {
        Self {
            transliterator,
            include_notes: false,
        }
    }

    /// Set whether speaker notes are converted too.
    pub fn with_notes(mut self, include_notes: bool) -> Self {
        self.include_notes = include_notes;
        self
    }

    /// Convert a PPTX package read from `reader`, writing the new package to
    /// `writer`.
    ///
    /// Nothing is written until every targeted part has been read, so a
    /// caller that passes an in-memory buffer never sees half a package.
    pub fn convert<R, W>(
        &self,
        reader: R,
        writer: &mut W,
        filename: &str,
    ) -> Result<ConversionReport>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| zip_error("Failed to open ZIP", e))?;

        let targets = self.collect_targets(&mut archive)?;
        let by_path: HashMap<&str, &TargetPart> =
            targets.iter().map(|t| (t.path.as_str(), t)).collect();

        let names = (0..archive.len())
            .map(|index| archive.by_index_raw(index).map(|file| file.name().to_string()))
            .collect::<std::result::Result<Vec<String>, ZipError>>()
            .map_err(|e| zip_error("Failed to read entry", e))?;

        let mut report = ConversionReport::new(filename);
        let mut rewritten: HashMap<usize, Vec<u8>> = HashMap::new();

        for (index, name) in names.iter().enumerate() {
            let Some(target) = by_path.get(name.as_str()) else {
                continue;
            };

            match target.kind {
                PartKind::Slide => log::info!("Processing slide {}...", target.number),
                PartKind::Notes => log::info!("Processing notes for slide {}...", target.number),
            }

            let mut content = String::new();
            archive
                .by_index(index)
                .map_err(|e| zip_error("Failed to read entry", e))?
                .read_to_string(&mut content)
                .map_err(|e| Error::CorruptedFile(format!("Failed to read '{}': {}", name, e)))?;

            let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
            let part = rewrite_part(content, name, &self.transliterator)?;

            let mut part_report = PartReport::new(target.kind, target.number, name.as_str());
            part_report.runs = part.runs;
            if part_report.changed_runs() > 0 {
                rewritten.insert(index, part.xml);
            }
            report.add_part(part_report);
        }

        let seen: HashSet<&str> = report.parts.iter().map(|p| p.path.as_str()).collect();
        for target in targets.iter().filter(|t| !seen.contains(t.path.as_str())) {
            log::warn!("Skipping {}: referenced but not present in the package", target.path);
        }

        let mut zip = ZipWriter::new(writer);
        for (index, name) in names.iter().enumerate() {
            match rewritten.remove(&index) {
                Some(xml) => {
                    let file = archive
                        .by_index_raw(index)
                        .map_err(|e| zip_error("Failed to read entry", e))?;
                    let mut options = FileOptions::default()
                        .compression_method(file.compression())
                        .last_modified_time(file.last_modified());
                    if let Some(mode) = file.unix_mode() {
                        options = options.unix_permissions(mode);
                    }
                    drop(file);

                    zip.start_file(name.as_str(), options)
                        .map_err(|e| zip_error(&format!("Failed to write '{}'", name), e))?;
                    zip.write_all(&xml)?;
                }
                None => {
                    let file = archive
                        .by_index_raw(index)
                        .map_err(|e| zip_error("Failed to read entry", e))?;
                    zip.raw_copy_file(file)
                        .map_err(|e| zip_error("Failed to copy entry", e))?;
                }
            }
        }
        zip.finish().map_err(|e| zip_error("Failed to finish ZIP", e))?;

        report.sort_parts();
        Ok(report)
    }

    /// Find the slide parts (and notes parts, if enabled) to rewrite.
    fn collect_targets<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<Vec<TargetPart>> {
        let slides = self.get_slide_order(archive)?;
        if slides.is_empty() {
            log::warn!("Presentation has no slides");
        }

        let mut targets: Vec<TargetPart> = slides
            .iter()
            .enumerate()
            .map(|(idx, path)| TargetPart {
                kind: PartKind::Slide,
                number: idx + 1,
                path: path.clone(),
            })
            .collect();

        if self.include_notes {
            for (idx, slide_path) in slides.iter().enumerate() {
                if let Some(path) = self.get_notes_path(archive, slide_path)? {
                    targets.push(TargetPart {
                        kind: PartKind::Notes,
                        number: idx + 1,
                        path,
                    });
                }
            }
        }

        Ok(targets)
    }

    /// Get the ordered list of slide paths.
    ///
    /// The order is the `p:sldIdLst` of presentation.xml resolved through its
    /// relationships. If the list is missing, slide relationships are sorted
    /// by their number instead.
    fn get_slide_order<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<Vec<String>> {
        let rels_content = self
            .read_file_from_archive(archive, PRESENTATION_RELS_PATH)
            .map_err(|_| Error::MissingPart(PRESENTATION_RELS_PATH.to_string()))?;
        let slide_rels: Vec<Relationship> =
            parse_relationships(&rels_content, PRESENTATION_RELS_PATH)?
                .into_iter()
                .filter(|rel| rel.rel_type.ends_with("/slide"))
                .collect();

        let listed = match self.read_file_from_archive(archive, PRESENTATION_PATH) {
            Ok(content) => parse_slide_id_list(&content)?,
            Err(e) => {
                log::warn!("Could not read {}: {}", PRESENTATION_PATH, e);
                Vec::new()
            }
        };

        if !listed.is_empty() {
            let targets: HashMap<&str, &str> = slide_rels
                .iter()
                .map(|rel| (rel.id.as_str(), rel.target.as_str()))
                .collect();

            let mut slides = Vec::with_capacity(listed.len());
            for id in &listed {
                match targets.get(id.as_str()) {
                    Some(target) => slides.push(resolve_target("ppt", target)),
                    None => log::warn!("Slide list refers to unknown relationship {}", id),
                }
            }
            return Ok(slides);
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .iter()
            .map(|rel| {
                let order_num =
                    extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.target));
                (resolve_target("ppt", &rel.target), order_num)
            })
            .collect();

        // Sort slides by their number
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Find the notes part of a slide through the slide's relationships.
    fn get_notes_path<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>> {
        let (dir, file) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
        let rels_path = format!("{}/_rels/{}.rels", dir, file);

        let content = match self.read_file_from_archive(archive, &rels_path) {
            Ok(content) => content,
            Err(_) => return Ok(None),
        };

        Ok(parse_relationships(&content, &rels_path)?
            .into_iter()
            .find(|rel| rel.rel_type.ends_with("/notesSlide"))
            .map(|rel| resolve_target(dir, &rel.target)))
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

/// Parse the `Relationship` elements of a `.rels` part.
fn parse_relationships(content: &str, path: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                relationships.push(Relationship {
                    id: attribute(e, b"Id").unwrap_or_default(),
                    rel_type: attribute(e, b"Type").unwrap_or_default(),
                    target: attribute(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, reader.buffer_position(), e)),
            _ => {}
        }
    }

    Ok(relationships)
}

/// Read the relationship ids of `p:sldIdLst/p:sldId`, in order.
fn parse_slide_id_list(content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut ids = Vec::new();
    let mut in_list = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldIdLst" => in_list = true,
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"sldIdLst" => in_list = false,
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if in_list && local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = attribute(e, b"r:id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(PRESENTATION_PATH, reader.buffer_position(), e)),
            _ => {}
        }
    }

    Ok(ids)
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    TRAILING_NUMBER_REGEX
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn zip_error(context: &str, err: ZipError) -> Error {
    Error::ZipError(format!("{}: {}", context, err))
}
