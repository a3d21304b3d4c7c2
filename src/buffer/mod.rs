//! Append-once, multi-section XML byte store.
//!
//! This module provides `XmlBuffer`, a sealed store of XML sections captured
//! once and read many times. Each section is written exactly once through a
//! streaming [`SectionWriter`] and held in a reference-counted [`Bytes`]
//! region, so read cursors and lazy extension references share the bytes
//! without copying.
//!
//! # Performance
//!
//! - Cloning a buffer or opening a cursor is O(1): only refcounts move
//! - Raw element extraction is a range slice of the section, never a parse
//!
//! # Example
//!
//! ```
//! use syndext::XmlBuffer;
//!
//! # fn main() -> syndext::Result<()> {
//! let mut builder = XmlBuffer::builder();
//! let mut section = builder.open_section();
//! section.start_element("wrapper")?;
//! section.raw(b"<a>1</a><b>2</b>");
//! section.end_element("wrapper")?;
//! section.close();
//! let buffer = builder.finish();
//!
//! let mut cursor = buffer.reader(0)?;
//! cursor.read_start()?;
//! assert_eq!(cursor.next_element_raw()?.as_deref(), Some(&b"<a>1</a>"[..]));
//! # Ok(())
//! # }
//! ```

use crate::common::{Error, Result};
use bytes::Bytes;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use smallvec::SmallVec;

pub mod cursor;

pub use cursor::XmlCursor;

/// An immutable store of one or more write-once XML sections.
///
/// A buffer is produced either by sealing an [`XmlBufferBuilder`] or from a
/// pre-captured fragment via [`XmlBuffer::from_fragment`]. Once built it is
/// never modified; any number of independent read cursors may walk the same
/// section concurrently.
#[derive(Debug, Clone)]
pub struct XmlBuffer {
    /// Closed sections; nearly every buffer has exactly one
    sections: SmallVec<[Bytes; 1]>,
}

impl XmlBuffer {
    /// Start building a new buffer.
    #[inline]
    pub fn builder() -> XmlBufferBuilder {
        XmlBufferBuilder::new()
    }

    /// Build a single-section buffer over an already-captured fragment.
    ///
    /// The caller asserts the fragment is well-formed XML; nothing is parsed
    /// here.
    pub fn from_fragment(fragment: impl Into<Bytes>) -> Self {
        let mut sections = SmallVec::new();
        sections.push(fragment.into());
        Self { sections }
    }

    /// Number of closed sections in this buffer.
    #[inline]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Raw bytes of a closed section.
    pub fn section(&self, index: usize) -> Result<&Bytes> {
        self.sections
            .get(index)
            .ok_or(Error::SectionOutOfRange(index))
    }

    /// Open an independent read cursor positioned at the start of a section.
    pub fn reader(&self, section: usize) -> Result<XmlCursor> {
        Ok(XmlCursor::new(self.section(section)?.clone()))
    }
}

/// Builder producing an [`XmlBuffer`].
///
/// Sections are appended one at a time: [`XmlBufferBuilder::open_section`]
/// hands out a streaming writer whose `&mut` borrow of the builder makes a
/// second concurrently open section impossible; closing the writer appends
/// the finished bytes. `finish` seals the buffer.
#[derive(Debug, Default)]
pub struct XmlBufferBuilder {
    sections: SmallVec<[Bytes; 1]>,
}

impl XmlBufferBuilder {
    /// Create an empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the next write-once section.
    pub fn open_section(&mut self) -> SectionWriter<'_> {
        SectionWriter {
            builder: self,
            writer: Writer::new(Vec::new()),
        }
    }

    /// Seal the buffer. No further sections can be added.
    #[inline]
    pub fn finish(self) -> XmlBuffer {
        XmlBuffer {
            sections: self.sections,
        }
    }
}

/// Streaming writer over one in-progress section.
///
/// Dropping the writer without calling [`SectionWriter::close`] abandons the
/// section; nothing is appended to the buffer.
pub struct SectionWriter<'a> {
    builder: &'a mut XmlBufferBuilder,
    writer: Writer<Vec<u8>>,
}

impl SectionWriter<'_> {
    /// Write a start tag.
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    /// Write an end tag.
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Write an already-serialized fragment verbatim.
    #[inline]
    pub fn raw(&mut self, fragment: &[u8]) {
        self.writer.get_mut().extend_from_slice(fragment);
    }

    /// Close the section, appending it to the buffer. Returns the section
    /// index.
    pub fn close(self) -> usize {
        let bytes = self.writer.into_inner();
        self.builder.sections.push(Bytes::from(bytes));
        self.builder.sections.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_section_round_trip() {
        let mut builder = XmlBuffer::builder();
        let mut section = builder.open_section();
        section.start_element("wrapper").unwrap();
        section.raw(b"<a>1</a>");
        section.end_element("wrapper").unwrap();
        assert_eq!(section.close(), 0);
        let buffer = builder.finish();

        assert_eq!(buffer.section_count(), 1);
        assert_eq!(
            buffer.section(0).unwrap().as_ref(),
            b"<wrapper><a>1</a></wrapper>"
        );
    }

    #[test]
    fn test_sections_are_indexed_in_write_order() {
        let mut builder = XmlBuffer::builder();
        let mut first = builder.open_section();
        first.raw(b"<first/>");
        assert_eq!(first.close(), 0);
        let mut second = builder.open_section();
        second.raw(b"<second/>");
        assert_eq!(second.close(), 1);
        let buffer = builder.finish();

        assert_eq!(buffer.section(0).unwrap().as_ref(), b"<first/>");
        assert_eq!(buffer.section(1).unwrap().as_ref(), b"<second/>");
    }

    #[test]
    fn test_abandoned_section_is_not_appended() {
        let mut builder = XmlBuffer::builder();
        {
            let mut section = builder.open_section();
            section.raw(b"<dropped/>");
            // dropped without close()
        }
        assert_eq!(builder.finish().section_count(), 0);
    }

    #[test]
    fn test_section_out_of_range() {
        let buffer = XmlBuffer::from_fragment(&b"<w/>"[..]);
        assert!(buffer.section(0).is_ok());
        assert!(matches!(
            buffer.reader(1),
            Err(Error::SectionOutOfRange(1))
        ));
    }

    #[test]
    fn test_concurrent_cursors_over_one_section() {
        let buffer = XmlBuffer::from_fragment(&b"<w><a>1</a></w>"[..]);
        let mut first = buffer.reader(0).unwrap();
        let mut second = buffer.reader(0).unwrap();
        first.read_start().unwrap();
        second.read_start().unwrap();
        assert_eq!(
            first.next_element_raw().unwrap().as_deref(),
            Some(&b"<a>1</a>"[..])
        );
        assert_eq!(
            second.next_element_raw().unwrap().as_deref(),
            Some(&b"<a>1</a>"[..])
        );
    }
}
