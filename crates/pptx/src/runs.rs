//! Run-level rewriting of slide XML.
//!
//! A slide part is streamed event by event and copied to the output
//! unchanged, except for the text inside `a:r/a:t`. That text is collected
//! in full (so an escaped `&amp;` or a CDATA section cannot split a Bamini
//! sequence), converted, and written back escaped.
//!
//! Run properties (`a:rPr`) are copied verbatim, so font family, size,
//! weight, slant, underline and color survive conversion exactly. They are
//! also parsed into a [`RunFormat`] for the conversion report.

use crate::xml::{attribute, drawing_name, xml_error};
use bamini_core::{Result, RunColor, RunFormat, RunLocation, RunRecord, Transliterator};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A part after its runs were rewritten.
#[derive(Debug)]
pub struct RewrittenPart {
    /// The new part content.
    pub xml: Vec<u8>,

    /// Every non-empty run, in document order.
    pub runs: Vec<RunRecord>,
}

/// Convert the text of every run in a slide (or notes) part.
pub fn rewrite_part(
    xml: &str,
    path: &str,
    transliterator: &Transliterator<'_>,
) -> Result<RewrittenPart> {
    walk_runs(xml, path, |text| transliterator.convert(text))
}

/// Read every non-empty run of a part without changing it.
pub fn read_runs(xml: &str, path: &str) -> Result<Vec<RunRecord>> {
    walk_runs(xml, path, str::to_owned).map(|part| part.runs)
}

/// State of the run currently open, if any.
#[derive(Debug)]
struct OpenRun {
    location: RunLocation,
    format: RunFormat,

    /// Whether we are inside this run's `a:rPr`.
    in_properties: bool,

    /// Local names of the open elements below `a:rPr`.
    property_path: Vec<Vec<u8>>,

    /// Text collected from `a:t`, while inside it.
    text: Option<String>,
}

impl OpenRun {
    fn new(location: RunLocation) -> Self {
        Self {
            location,
            format: RunFormat::default(),
            in_properties: false,
            property_path: Vec::new(),
            text: None,
        }
    }
}

fn walk_runs<F>(xml: &str, path: &str, mut convert: F) -> Result<RewrittenPart>
where
    F: FnMut(&str) -> String,
{
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + xml.len() / 4));

    let mut runs = Vec::new();
    let mut run: Option<OpenRun> = None;
    let mut table_depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error(path, reader.buffer_position(), e))?;

        match &event {
            Event::Start(e) => {
                let name = e.name();
                match (drawing_name(name.as_ref()), run.as_mut()) {
                    (Some(b"tbl"), _) => table_depth += 1,
                    (Some(b"r"), None) => {
                        let location = if table_depth > 0 {
                            RunLocation::TableCell
                        } else {
                            RunLocation::TextFrame
                        };
                        run = Some(OpenRun::new(location));
                    }
                    (Some(b"rPr"), Some(open)) if !open.in_properties => {
                        read_run_attributes(e, &mut open.format);
                        open.in_properties = true;
                        open.property_path.clear();
                    }
                    (Some(local), Some(open)) if open.in_properties => {
                        read_property_child(&open.property_path, local, e, &mut open.format);
                        open.property_path.push(local.to_vec());
                    }
                    (Some(b"t"), Some(open)) => open.text = Some(String::new()),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                match (drawing_name(name.as_ref()), run.as_mut()) {
                    (Some(b"rPr"), Some(open)) if !open.in_properties => {
                        read_run_attributes(e, &mut open.format);
                    }
                    (Some(local), Some(open)) if open.in_properties => {
                        read_property_child(&open.property_path, local, e, &mut open.format);
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if let Some(text) = run.as_mut().and_then(|open| open.text.as_mut()) {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| xml_error(path, reader.buffer_position(), err))?;
                    text.push_str(&unescaped);
                    continue;
                }
            }
            Event::CData(e) => {
                if let Some(text) = run.as_mut().and_then(|open| open.text.as_mut()) {
                    text.push_str(&String::from_utf8_lossy(e));
                    continue;
                }
            }
            Event::End(e) => {
                let name = e.name();
                match (drawing_name(name.as_ref()), run.as_mut()) {
                    (Some(b"tbl"), _) => table_depth = table_depth.saturating_sub(1),
                    (Some(b"rPr"), Some(open)) if open.property_path.is_empty() => {
                        open.in_properties = false;
                    }
                    (Some(_), Some(open)) if open.in_properties => {
                        open.property_path.pop();
                    }
                    (Some(b"t"), Some(open)) => {
                        if let Some(original) = open.text.take() {
                            let converted = if original.is_empty() {
                                original.clone()
                            } else {
                                convert(&original)
                            };
                            writer
                                .write_event(Event::Text(BytesText::from_escaped(partial_escape(
                                    &converted,
                                ))))
                                .map_err(|e| xml_error(path, reader.buffer_position(), e))?;

                            if !original.is_empty() {
                                log::debug!(
                                    "{}: {:?} -> {:?} ({:?})",
                                    path,
                                    original,
                                    converted,
                                    open.format
                                );
                                runs.push(RunRecord {
                                    location: open.location,
                                    format: open.format.clone(),
                                    original,
                                    converted,
                                });
                            }
                        }
                    }
                    (Some(b"r"), Some(_)) => run = None,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }

        writer
            .write_event(event)
            .map_err(|e| xml_error(path, reader.buffer_position(), e))?;
    }

    Ok(RewrittenPart {
        xml: writer.into_inner(),
        runs,
    })
}

/// Read the attributes of `a:rPr` itself.
fn read_run_attributes(element: &BytesStart<'_>, format: &mut RunFormat) {
    format.bold = attribute(element, b"b").and_then(|v| parse_flag(&v));
    format.italic = attribute(element, b"i").and_then(|v| parse_flag(&v));
    format.underline = attribute(element, b"u");
    format.size = attribute(element, b"sz").and_then(|v| match v.parse::<u32>() {
        Ok(size) => Some(size),
        Err(_) => {
            log::debug!("Ignoring unreadable font size {:?}", v);
            None
        }
    });
}

/// Read a descendant of `a:rPr`. `parents` holds the local names between
/// `a:rPr` and this element.
///
/// Colors are best-effort: anything other than a well-formed RGB value or a
/// named theme color is skipped, never an error.
fn read_property_child(
    parents: &[Vec<u8>],
    local: &[u8],
    element: &BytesStart<'_>,
    format: &mut RunFormat,
) {
    let under_fill = matches!(parents, [fill] if fill.as_slice() == b"solidFill");

    match local {
        b"latin" if parents.is_empty() => {
            format.font = attribute(element, b"typeface").filter(|v| !v.is_empty());
        }
        b"srgbClr" if under_fill => {
            format.color = attribute(element, b"val")
                .and_then(|v| parse_rgb(&v))
                .map(RunColor::Rgb);
            if format.color.is_none() {
                log::debug!("Skipping unresolvable RGB run color");
            }
        }
        b"schemeClr" if under_fill => {
            format.color = attribute(element, b"val")
                .filter(|v| !v.is_empty())
                .map(RunColor::Theme);
            if format.color.is_none() {
                log::debug!("Skipping theme run color without a name");
            }
        }
        _ if under_fill => {
            log::debug!(
                "Skipping run color given as {}",
                String::from_utf8_lossy(local)
            );
        }
        _ => {}
    }
}

/// Parse an OOXML boolean attribute.
fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Validate a six-digit hex color, returning it uppercased.
fn parse_rgb(value: &str) -> Option<String> {
    if value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(value.to_ascii_uppercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>"#;
    const SLIDE_TAIL: &str = "</p:spTree></p:cSld></p:sld>";

    fn slide(body: &str) -> String {
        format!("{}{}{}", SLIDE_HEAD, body, SLIDE_TAIL)
    }

    fn shape(runs: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/></p:nvSpPr><p:txBody><a:bodyPr/><a:p>{}</a:p></p:txBody></p:sp>"#,
            runs
        )
    }

    fn rewrite(xml: &str) -> (String, Vec<RunRecord>) {
        let engine = Transliterator::bamini();
        let part = rewrite_part(xml, "ppt/slides/slide1.xml", &engine).unwrap();
        (String::from_utf8(part.xml).unwrap(), part.runs)
    }

    #[test]
    fn test_run_text_is_converted() {
        let xml = slide(&shape("<a:r><a:t>mfhuk;</a:t></a:r>"));
        let (out, runs) = rewrite(&xml);

        assert!(out.contains("<a:t>அகாரம்</a:t>"));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].original, "mfhuk;");
        assert_eq!(runs[0].converted, "அகாரம்");
        assert_eq!(runs[0].location, RunLocation::TextFrame);
    }

    #[test]
    fn test_everything_else_is_copied_verbatim() {
        let xml = slide(&shape(
            r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>jkpo;</a:t></a:r><a:endParaRPr lang="en-US"/>"#,
        ));
        let (out, _) = rewrite(&xml);

        assert_eq!(out, xml.replace("jkpo;", "தமிழ்"));
    }

    #[test]
    fn test_formatting_is_preserved() {
        let runs = r#"<a:r><a:rPr lang="en-US" sz="2400" b="1" i="0" u="sng"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:latin typeface="Bamini"/></a:rPr><a:t>tzf;fk;</a:t></a:r>"#;
        let xml = slide(&shape(runs));
        let before = read_runs(&xml, "slide").unwrap();
        let (out, converted) = rewrite(&xml);
        let after = read_runs(&out, "slide").unwrap();

        let expected = RunFormat {
            font: Some("Bamini".to_string()),
            size: Some(2400),
            bold: Some(true),
            italic: Some(false),
            underline: Some("sng".to_string()),
            color: Some(RunColor::Rgb("FF0000".to_string())),
        };
        assert_eq!(before[0].format, expected);
        assert_eq!(converted[0].format, expected);
        assert_eq!(after[0].format, expected);
        assert_eq!(after[0].original, "வணக்கம்");
        assert_eq!(before[0].format.size_pt(), Some(24.0));
    }

    #[test]
    fn test_theme_color() {
        let runs = r#"<a:r><a:rPr><a:solidFill><a:schemeClr val="accent1"><a:lumMod val="75000"/></a:schemeClr></a:solidFill></a:rPr><a:t>f</a:t></a:r>"#;
        let (_, records) = rewrite(&slide(&shape(runs)));

        assert_eq!(records[0].format.color, Some(RunColor::Theme("accent1".to_string())));
    }

    #[test]
    fn test_unresolvable_color_is_skipped() {
        let runs = r#"<a:r><a:rPr><a:solidFill><a:srgbClr val="red"/></a:solidFill></a:rPr><a:t>f</a:t></a:r><a:r><a:rPr><a:solidFill><a:sysClr val="windowText" lastClr="000000"/></a:solidFill></a:rPr><a:t>q</a:t></a:r>"#;
        let (out, records) = rewrite(&slide(&shape(runs)));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].format.color, None);
        assert_eq!(records[1].format.color, None);
        assert!(out.contains(r#"<a:srgbClr val="red"/>"#));
        assert!(out.contains("<a:t>க</a:t>"));
        assert!(out.contains("<a:t>ங</a:t>"));
    }

    #[test]
    fn test_outline_and_highlight_colors_are_not_run_color() {
        let runs = r#"<a:r><a:rPr><a:ln><a:solidFill><a:srgbClr val="00FF00"/></a:solidFill></a:ln><a:highlight><a:srgbClr val="FFFF00"/></a:highlight></a:rPr><a:t>f</a:t></a:r>"#;
        let (_, records) = rewrite(&slide(&shape(runs)));

        assert_eq!(records[0].format.color, None);
    }

    #[test]
    fn test_table_cells_are_converted() {
        let table = r#"<p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tr h="370840"><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:rPr b="1"/><a:t>kiy</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;
        let xml = slide(&format!("{}{}", table, shape("<a:r><a:t>m</a:t></a:r>")));
        let (out, records) = rewrite(&xml);

        assert!(out.contains("<a:t>மலை</a:t>"));
        assert_eq!(records[0].location, RunLocation::TableCell);
        assert_eq!(records[0].format.bold, Some(true));
        assert_eq!(records[1].location, RunLocation::TextFrame);
    }

    #[test]
    fn test_escaped_text_is_converted_whole() {
        // `&amp;` is the Bamini key for ரூ.
        let xml = slide(&shape("<a:r><a:t>&amp; &lt;</a:t></a:r>"));
        let (out, records) = rewrite(&xml);

        assert_eq!(records[0].original, "& <");
        assert_eq!(records[0].converted, "ரூ ஈ");
        assert!(out.contains("<a:t>ரூ ஈ</a:t>"));
    }

    #[test]
    fn test_quotes_stay_unescaped() {
        let xml = slide(&shape(r#"<a:r><a:t>"f" &gt; 1</a:t></a:r>"#));
        let (out, _) = rewrite(&xml);

        assert!(out.contains(r#"<a:t>"க" , 1</a:t>"#));
    }

    #[test]
    fn test_fields_and_empty_runs_are_left_alone() {
        let runs = r#"<a:fld id="{B6F15528}" type="slidenum"><a:t>f</a:t></a:fld><a:r><a:t></a:t></a:r><a:r><a:t/></a:r>"#;
        let xml = slide(&shape(runs));
        let (out, records) = rewrite(&xml);

        assert!(records.is_empty());
        assert_eq!(out, xml);
    }

    #[test]
    fn test_math_runs_are_left_alone() {
        let runs = r#"<a14:m xmlns:a14="http://schemas.microsoft.com/office/drawing/2010/main"><m:oMath xmlns:m="http://schemas.openxmlformats.org/officeDocument/2006/math"><m:r><m:t>f</m:t></m:r></m:oMath></a14:m>"#;
        let xml = slide(&shape(runs));
        let (out, records) = rewrite(&xml);

        assert!(records.is_empty());
        assert_eq!(out, xml);
    }

    #[test]
    fn test_whitespace_only_run_is_recorded_but_unchanged() {
        let xml = slide(&shape(r#"<a:r><a:t xml:space="preserve">   </a:t></a:r>"#));
        let (out, records) = rewrite(&xml);

        assert_eq!(out, xml);
        assert_eq!(records.len(), 1);
        assert!(!records[0].has_visible_text());
        assert!(!records[0].changed());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let engine = Transliterator::bamini();
        let result = rewrite_part("<p:sld><a:r></p:sld>", "ppt/slides/slide9.xml", &engine);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("ppt/slides/slide9.xml"), "{}", err);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_rgb("ff00aa"), Some("FF00AA".to_string()));
        assert_eq!(parse_rgb("FF00A"), None);
        assert_eq!(parse_rgb("GG0000"), None);
    }
}
