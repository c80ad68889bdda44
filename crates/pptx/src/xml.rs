//! Small helpers shared by the OOXML readers.

use bamini_core::Error;
use quick_xml::events::BytesStart;

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// The local name of a DrawingML element (`a:` prefix), or `None` for any
/// other namespace.
///
/// Slides also embed Office Math (`m:r`, `m:t`), which must not be mistaken
/// for text runs.
pub(crate) fn drawing_name(name: &[u8]) -> Option<&[u8]> {
    match name.iter().position(|&b| b == b':') {
        Some(pos) if &name[..pos] == b"a" => Some(&name[pos + 1..]),
        Some(_) => None,
        None => Some(name),
    }
}

/// Read an attribute by its qualified name, unescaped.
pub(crate) fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Wrap a quick-xml error with the part it came from.
pub(crate) fn xml_error(path: &str, position: usize, err: quick_xml::Error) -> Error {
    Error::XmlError(format!("{} at byte {}: {}", path, position, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_drawing_name() {
        assert_eq!(drawing_name(b"a:r"), Some(&b"r"[..]));
        assert_eq!(drawing_name(b"r"), Some(&b"r"[..]));
        assert_eq!(drawing_name(b"m:r"), None);
        assert_eq!(drawing_name(b"p:txBody"), None);
    }

    #[test]
    fn test_attribute_unescapes() {
        let element = BytesStart::from_content(r#"a:latin typeface="Bamini &amp; Co""#, 7);
        assert_eq!(attribute(&element, b"typeface").as_deref(), Some("Bamini & Co"));
        assert_eq!(attribute(&element, b"panose"), None);
    }
}
