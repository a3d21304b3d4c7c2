//! Read cursor over one closed buffer section.
//!
//! A cursor owns a cheap clone of the section bytes plus an event reader, so
//! it is a plain value with no lifetime ties to the buffer that produced it.
//! Raw element extraction is position-based slicing of the immutable section,
//! which is what keeps the cached write path byte-faithful: the bytes handed
//! out are the bytes that were captured, never a re-serialization.

use crate::common::xml::{is_whitespace_only, ns_declarations, start_identity};
use crate::common::{Error, Result};
use bytes::Bytes;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io;

/// Read cursor over one XML section.
///
/// The cursor walks the section at the wrapper level: [`XmlCursor::read_start`]
/// consumes the wrapper start tag, after which [`XmlCursor::is_start`],
/// [`XmlCursor::peek_identity`] and [`XmlCursor::next_element_raw`] iterate
/// the top-level children. Dropping the cursor at any point releases it; no
/// explicit teardown is needed.
pub struct XmlCursor {
    section: Bytes,
    reader: Reader<io::Cursor<Bytes>>,
    buf: Vec<u8>,
    /// One-event lookahead: (byte offset of the event, the event itself)
    peeked: Option<(usize, Event<'static>)>,
    /// Namespace declarations carried by the wrapper element
    outer_scope: Vec<(String, String)>,
    /// Set once the wrapper's end has been consumed (or the wrapper was
    /// self-closing)
    wrapper_done: bool,
}

impl XmlCursor {
    pub(crate) fn new(section: Bytes) -> Self {
        let reader = Reader::from_reader(io::Cursor::new(section.clone()));
        Self {
            section,
            reader,
            buf: Vec::new(),
            peeked: None,
            outer_scope: Vec::new(),
            wrapper_done: false,
        }
    }

    /// Byte offset of the next unconsumed event.
    fn position(&self) -> usize {
        match &self.peeked {
            Some((pos, _)) => *pos,
            None => self.reader.buffer_position() as usize,
        }
    }

    fn read_event(&mut self) -> Result<(usize, Event<'static>)> {
        if let Some(entry) = self.peeked.take() {
            return Ok(entry);
        }
        let start = self.reader.buffer_position() as usize;
        self.buf.clear();
        let event = self.reader.read_event_into(&mut self.buf)?.into_owned();
        Ok((start, event))
    }

    fn fill_lookahead(&mut self) -> Result<()> {
        if self.peeked.is_none() {
            let entry = self.read_event()?;
            self.peeked = Some(entry);
        }
        Ok(())
    }

    /// Consume the wrapper start tag, recording its namespace declarations
    /// as the outer scope for identity resolution.
    ///
    /// A self-closing wrapper is accepted and leaves the cursor at the end
    /// of an empty collection. Prolog nodes before the wrapper are skipped.
    pub fn read_start(&mut self) -> Result<()> {
        loop {
            let (_, event) = self.read_event()?;
            match event {
                Event::Start(e) => {
                    self.outer_scope = ns_declarations(&e)?;
                    return Ok(());
                },
                Event::Empty(e) => {
                    self.outer_scope = ns_declarations(&e)?;
                    self.wrapper_done = true;
                    return Ok(());
                },
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {},
                Event::Text(ref t) if is_whitespace_only(t.as_ref()) => {},
                Event::Eof => {
                    return Err(Error::Xml(
                        "section is empty, expected a wrapper element".to_string(),
                    ));
                },
                _ => {
                    return Err(Error::Xml(
                        "expected a wrapper start element".to_string(),
                    ));
                },
            }
        }
    }

    /// True iff the next content node is an element start.
    ///
    /// Whitespace-only text, comments, and processing instructions are
    /// consumed on the way; a non-whitespace text node or the wrapper end
    /// stops the walk.
    pub fn is_start(&mut self) -> Result<bool> {
        if self.wrapper_done {
            return Ok(false);
        }
        loop {
            self.fill_lookahead()?;
            match &self.peeked {
                Some((_, Event::Start(_))) | Some((_, Event::Empty(_))) => return Ok(true),
                Some((_, Event::Comment(_)))
                | Some((_, Event::Decl(_)))
                | Some((_, Event::PI(_)))
                | Some((_, Event::DocType(_))) => {
                    self.peeked = None;
                },
                Some((_, Event::Text(t))) if is_whitespace_only(t.as_ref()) => {
                    self.peeked = None;
                },
                _ => return Ok(false),
            }
        }
    }

    /// `(local name, namespace URI)` of the next element, without consuming
    /// it. `None` when the next content node is not an element.
    pub fn peek_identity(&mut self) -> Result<Option<(String, String)>> {
        if !self.is_start()? {
            return Ok(None);
        }
        match &self.peeked {
            Some((_, Event::Start(e))) | Some((_, Event::Empty(e))) => {
                Ok(Some(start_identity(e, &self.outer_scope)?))
            },
            // is_start left an element start in the lookahead
            _ => Ok(None),
        }
    }

    /// Consume the next top-level element entirely and return its verbatim
    /// bytes. `None` when no element remains.
    pub fn next_element_raw(&mut self) -> Result<Option<Bytes>> {
        if !self.is_start()? {
            return Ok(None);
        }
        let (start, event) = self.read_event()?;
        match event {
            Event::Empty(_) => {
                let end = self.reader.buffer_position() as usize;
                Ok(Some(self.section.slice(start..end)))
            },
            Event::Start(e) => {
                self.buf.clear();
                self.reader.read_to_end_into(e.name(), &mut self.buf)?;
                let end = self.reader.buffer_position() as usize;
                Ok(Some(self.section.slice(start..end)))
            },
            _ => Err(Error::Xml("expected an element".to_string())),
        }
    }

    /// Consume the next top-level element without returning its bytes.
    pub fn skip_element(&mut self) -> Result<()> {
        match self.next_element_raw()? {
            Some(_) => Ok(()),
            None => Err(Error::Xml("expected an element to skip".to_string())),
        }
    }

    /// Verbatim bytes from the current position up to (not including) the
    /// wrapper end tag, consuming the wrapper.
    ///
    /// Call directly after [`XmlCursor::read_start`] to copy the wrapper's
    /// entire content byte-for-byte, inter-element whitespace included.
    pub fn rest_of_element_raw(&mut self) -> Result<Bytes> {
        if self.wrapper_done {
            return Ok(Bytes::new());
        }
        let start = self.position();
        let mut depth = 0usize;
        loop {
            let (pos, event) = self.read_event()?;
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    if depth == 0 {
                        self.wrapper_done = true;
                        return Ok(self.section.slice(start..pos));
                    }
                    depth -= 1;
                },
                Event::Eof => {
                    return Err(Error::Xml(
                        "section ended inside the wrapper element".to_string(),
                    ));
                },
                _ => {},
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(xml: &str) -> XmlCursor {
        XmlCursor::new(Bytes::from(xml.as_bytes().to_vec()))
    }

    #[test]
    fn test_walk_two_children() {
        let mut cur = cursor(r#"<w><a xmlns="ns1">1</a><b xmlns="ns2">2</b></w>"#);
        cur.read_start().unwrap();
        assert_eq!(
            cur.peek_identity().unwrap(),
            Some(("a".to_string(), "ns1".to_string()))
        );
        assert_eq!(
            cur.next_element_raw().unwrap().as_deref(),
            Some(&br#"<a xmlns="ns1">1</a>"#[..])
        );
        assert_eq!(
            cur.peek_identity().unwrap(),
            Some(("b".to_string(), "ns2".to_string()))
        );
        cur.skip_element().unwrap();
        assert!(!cur.is_start().unwrap());
    }

    #[test]
    fn test_self_closing_wrapper_is_empty() {
        let mut cur = cursor("<w/>");
        cur.read_start().unwrap();
        assert!(!cur.is_start().unwrap());
        assert_eq!(cur.rest_of_element_raw().unwrap().as_ref(), b"");
    }

    #[test]
    fn test_whitespace_and_comments_between_children_are_skipped() {
        let mut cur = cursor("<w>\n  <a/> <!-- note -->\n  <b/>\n</w>");
        cur.read_start().unwrap();
        assert_eq!(cur.next_element_raw().unwrap().as_deref(), Some(&b"<a/>"[..]));
        assert_eq!(cur.next_element_raw().unwrap().as_deref(), Some(&b"<b/>"[..]));
        assert_eq!(cur.next_element_raw().unwrap(), None);
    }

    #[test]
    fn test_rest_of_element_raw_is_verbatim() {
        let mut cur = cursor("<w>\n  <a>1</a> <b/>\n</w>");
        cur.read_start().unwrap();
        assert_eq!(
            cur.rest_of_element_raw().unwrap().as_ref(),
            b"\n  <a>1</a> <b/>\n"
        );
    }

    #[test]
    fn test_nested_children_are_consumed_whole() {
        let mut cur = cursor("<w><outer><inner>x</inner></outer></w>");
        cur.read_start().unwrap();
        assert_eq!(
            cur.next_element_raw().unwrap().as_deref(),
            Some(&b"<outer><inner>x</inner></outer>"[..])
        );
        assert!(!cur.is_start().unwrap());
    }

    #[test]
    fn test_wrapper_scope_resolves_child_prefixes() {
        let mut cur = cursor(r#"<w xmlns:m="urn:m"><m:a/></w>"#);
        cur.read_start().unwrap();
        assert_eq!(
            cur.peek_identity().unwrap(),
            Some(("a".to_string(), "urn:m".to_string()))
        );
    }

    #[test]
    fn test_prolog_before_wrapper_is_skipped() {
        let mut cur = cursor("<?xml version=\"1.0\"?>\n<w><a/></w>");
        cur.read_start().unwrap();
        assert!(cur.is_start().unwrap());
    }

    #[test]
    fn test_missing_wrapper_is_an_error() {
        let mut cur = cursor("   ");
        assert!(cur.read_start().is_err());
    }
}
