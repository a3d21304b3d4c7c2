//! Namespace and fragment helpers.
//!
//! Extension elements are filtered by the `(local name, namespace URI)`
//! identity of their root tag, so the cursor and the element model both need
//! to resolve qualified names against the namespace declarations in scope.
//! Resolution is deliberately literal: URIs are compared as strings, and an
//! unbound prefix resolves to the empty namespace.

use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Namespace bound to the reserved `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Split a qualified tag name into its prefix and local parts.
#[inline]
pub(crate) fn split_qname(name: &[u8]) -> (Option<&[u8]>, &[u8]) {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Collect the namespace declarations carried by a start tag.
///
/// Returns `(prefix, uri)` pairs; the default `xmlns` declaration is
/// recorded under the empty prefix.
pub(crate) fn ns_declarations(start: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut declarations = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        let prefix = if key == b"xmlns" {
            String::new()
        } else if let Some(rest) = key.strip_prefix(b"xmlns:") {
            String::from_utf8_lossy(rest).into_owned()
        } else {
            continue;
        };
        let uri = attr
            .unescape_value()
            .map_err(|e| Error::Xml(e.to_string()))?
            .into_owned();
        declarations.push((prefix, uri));
    }
    Ok(declarations)
}

/// Resolve a tag prefix against the element's own declarations, then the
/// outer scope. Unbound prefixes resolve to the empty namespace.
pub(crate) fn resolve_prefix(
    prefix: Option<&str>,
    own: &[(String, String)],
    outer: &[(String, String)],
) -> String {
    if prefix == Some("xml") {
        return XML_NAMESPACE.to_string();
    }
    let key = prefix.unwrap_or("");
    for (declared, uri) in own.iter().rev() {
        if declared == key {
            return uri.clone();
        }
    }
    for (declared, uri) in outer.iter().rev() {
        if declared == key {
            return uri.clone();
        }
    }
    String::new()
}

/// Resolve the `(local name, namespace URI)` identity of a start tag.
pub(crate) fn start_identity(
    start: &BytesStart,
    outer_scope: &[(String, String)],
) -> Result<(String, String)> {
    let name = start.name();
    let (prefix, local) = split_qname(name.as_ref());
    let own = ns_declarations(start)?;
    let prefix = prefix.map(|p| String::from_utf8_lossy(p).into_owned());
    let namespace = resolve_prefix(prefix.as_deref(), &own, outer_scope);
    Ok((String::from_utf8_lossy(local).into_owned(), namespace))
}

/// Resolve the root identity of a standalone fragment.
///
/// Leading declarations, comments, processing instructions, and whitespace
/// are skipped; anything else before the first element is rejected.
pub(crate) fn fragment_identity(xml: &[u8]) -> Result<(String, String)> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => return start_identity(e, &[]),
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {},
            Event::Text(ref t) if is_whitespace_only(t.as_ref()) => {},
            Event::Eof => {
                return Err(Error::InvalidArgument(
                    "extension fragment contains no element".to_string(),
                ));
            },
            _ => {
                return Err(Error::InvalidArgument(
                    "extension fragment does not start with an element".to_string(),
                ));
            },
        }
        buf.clear();
    }
}

/// Check if a byte slice contains only whitespace characters
#[inline]
pub(crate) fn is_whitespace_only(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(xml: &str) -> (String, String) {
        fragment_identity(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname(b"creator"), (None, &b"creator"[..]));
        assert_eq!(
            split_qname(b"dc:creator"),
            (Some(&b"dc"[..]), &b"creator"[..])
        );
    }

    #[test]
    fn test_identity_without_namespace() {
        assert_eq!(identity("<a>1</a>"), ("a".to_string(), String::new()));
    }

    #[test]
    fn test_identity_with_default_namespace() {
        assert_eq!(
            identity(r#"<a xmlns="ns1">1</a>"#),
            ("a".to_string(), "ns1".to_string())
        );
    }

    #[test]
    fn test_identity_with_prefix() {
        assert_eq!(
            identity(r#"<dc:creator xmlns:dc="http://purl.org/dc/elements/1.1/">x</dc:creator>"#),
            (
                "creator".to_string(),
                "http://purl.org/dc/elements/1.1/".to_string()
            )
        );
    }

    #[test]
    fn test_unbound_prefix_resolves_to_empty() {
        assert_eq!(identity("<p:a>1</p:a>"), ("a".to_string(), String::new()));
    }

    #[test]
    fn test_identity_skips_prolog() {
        assert_eq!(
            identity("<?xml version=\"1.0\"?><!-- note --> <a/>"),
            ("a".to_string(), String::new())
        );
    }

    #[test]
    fn test_fragment_without_element_is_rejected() {
        assert!(fragment_identity(b"   ").is_err());
        assert!(fragment_identity(b"just text").is_err());
    }

    #[test]
    fn test_outer_scope_resolution() {
        let outer = vec![("media".to_string(), "urn:example:media".to_string())];
        assert_eq!(
            resolve_prefix(Some("media"), &[], &outer),
            "urn:example:media"
        );
        // the element's own declaration shadows the outer scope
        let own = vec![("media".to_string(), "urn:other".to_string())];
        assert_eq!(resolve_prefix(Some("media"), &own, &outer), "urn:other");
    }
}
