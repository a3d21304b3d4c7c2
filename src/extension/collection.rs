//! Ordered collection of extension elements with a cached raw-bytes view.
//!
//! The collection reconciles two worlds: extensions captured once as raw XML
//! at parse time, and typed values added or removed programmatically later.
//! An optional cached [`XmlBuffer`] holds the serialization of the whole
//! sequence wrapped in one root element. While the cache is present, writing
//! the collection is a verbatim byte copy of the captured input; any
//! structural mutation discards the cache, and the next write re-serializes
//! each element individually.
//!
//! Construction is two-phase: the constructors populate the element vector
//! and install the inherited cache directly, and only the sealed public
//! mutation surface invalidates. There is no "initialized" flag to check
//! inside every operation.

use crate::buffer::{XmlBuffer, XmlCursor};
use crate::common::{Error, Result};
use crate::extension::element::ElementExtension;
use crate::extension::EXTENSION_WRAPPER_TAG;
use crate::serializer::{ContractSerializer, ExtensionSerializer, SchemaSerializer};
use bytes::Bytes;
use quick_xml::Writer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::sync::Arc;

/// Ordered, index-addressable collection of [`ElementExtension`] values.
///
/// Insertion order is significant: write-back and filtered reads both follow
/// it. Cloning a collection duplicates the element sequence by reference and
/// shares the cache with the source until either side mutates.
///
/// # Example
///
/// ```
/// use syndext::ElementExtensionCollection;
///
/// # fn main() -> syndext::Result<()> {
/// let mut extensions = ElementExtensionCollection::new();
/// extensions.push_contract("rating", "urn:example:media", 5i32)?;
///
/// let ratings: Vec<i32> = extensions.read_extensions("rating", Some("urn:example:media"))?;
/// assert_eq!(ratings, [5]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElementExtensionCollection {
    items: Vec<ElementExtension>,
    /// Serialization of the current sequence wrapped in one root element;
    /// `None` until built, discarded on every structural mutation
    buffer: Option<Arc<XmlBuffer>>,
}

impl ElementExtensionCollection {
    /// Create an empty collection with no cache.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection over a pre-existing buffer.
    ///
    /// Section 0 must hold a single wrapper root. Every top-level child is
    /// eagerly indexed as a lazy buffered element: its identity is resolved
    /// now, its content stays unparsed until first access. The buffer itself
    /// becomes the cache, so an unmutated collection writes back the exact
    /// bytes it was built from.
    pub fn from_buffer(buffer: Arc<XmlBuffer>) -> Result<Self> {
        let mut items = Vec::new();
        let mut cursor = buffer.reader(0)?;
        cursor.read_start()?;
        let mut index = 0;
        while cursor.is_start()? {
            let Some((outer_name, outer_namespace)) = cursor.peek_identity()? else {
                break;
            };
            items.push(ElementExtension::buffered(
                Arc::clone(&buffer),
                index,
                outer_name,
                outer_namespace,
            ));
            cursor.skip_element()?;
            index += 1;
        }
        Ok(Self {
            items,
            buffer: Some(buffer),
        })
    }

    /// Number of extensions in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the collection holds no extensions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Extension at the given index, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ElementExtension> {
        self.items.get(index)
    }

    /// Iterate the extensions in insertion order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ElementExtension> {
        self.items.iter()
    }

    /// Append an already-constructed extension.
    pub fn push(&mut self, extension: ElementExtension) {
        self.items.push(extension);
        self.buffer = None;
    }

    /// Append a typed value under an explicit outer identity with the
    /// default contract capability.
    pub fn push_contract<T>(
        &mut self,
        outer_name: &str,
        outer_namespace: &str,
        value: T,
    ) -> Result<()>
    where
        T: Serialize + 'static,
    {
        self.push_contract_with(outer_name, outer_namespace, value, ContractSerializer::new())
    }

    /// Append a typed value under an explicit outer identity with an
    /// explicit contract capability.
    pub fn push_contract_with<T>(
        &mut self,
        outer_name: &str,
        outer_namespace: &str,
        value: T,
        serializer: ContractSerializer,
    ) -> Result<()>
    where
        T: Serialize + 'static,
    {
        let extension =
            ElementExtension::contract_with(outer_name, outer_namespace, value, serializer)?;
        self.push(extension);
        Ok(())
    }

    /// Append a typed value with a schema mapping derived from its type.
    pub fn push_schema<T>(&mut self, value: T) -> Result<()>
    where
        T: Serialize + 'static,
    {
        self.push_schema_with(value, SchemaSerializer::of::<T>())
    }

    /// Append a typed value with an explicit schema mapping; the outer
    /// identity comes from the mapping itself.
    pub fn push_schema_with<T>(&mut self, value: T, mapping: SchemaSerializer) -> Result<()>
    where
        T: Serialize + 'static,
    {
        let extension = ElementExtension::schema_with(value, mapping)?;
        self.push(extension);
        Ok(())
    }

    /// Append a fragment read from an external raw source.
    pub fn push_raw(&mut self, xml: impl Into<Bytes>) -> Result<()> {
        let extension = ElementExtension::raw(xml)?;
        self.push(extension);
        Ok(())
    }

    /// Insert an extension at the given index (`0..=len`).
    pub fn insert(&mut self, index: usize, extension: ElementExtension) -> Result<()> {
        if index > self.items.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.items.insert(index, extension);
        self.buffer = None;
        Ok(())
    }

    /// Replace the extension at the given index (`0..len`).
    pub fn replace(&mut self, index: usize, extension: ElementExtension) -> Result<()> {
        if index >= self.items.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.items[index] = extension;
        self.buffer = None;
        Ok(())
    }

    /// Remove and return the extension at the given index (`0..len`).
    pub fn remove(&mut self, index: usize) -> Result<ElementExtension> {
        if index >= self.items.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let removed = self.items.remove(index);
        self.buffer = None;
        Ok(removed)
    }

    /// Remove every extension.
    pub fn clear(&mut self) {
        self.items.clear();
        self.buffer = None;
    }

    /// Decode every extension matching the given outer identity.
    ///
    /// Uses the default contract capability; see
    /// [`ElementExtensionCollection::read_extensions_with`] for the full
    /// contract.
    pub fn read_extensions<T: DeserializeOwned>(
        &self,
        outer_name: &str,
        outer_namespace: Option<&str>,
    ) -> Result<Vec<T>> {
        self.read_extensions_with(outer_name, outer_namespace, &ExtensionSerializer::default())
    }

    /// Decode every extension matching the given outer identity through the
    /// supplied capability.
    ///
    /// Matching is exact, case-sensitive string equality on both the local
    /// name and the namespace URI; a `None` namespace filter behaves like
    /// the empty string. Results follow collection order, non-matching
    /// elements are skipped, and the first decode failure fails the whole
    /// call rather than returning a partial list.
    pub fn read_extensions_with<T: DeserializeOwned>(
        &self,
        outer_name: &str,
        outer_namespace: Option<&str>,
        serializer: &ExtensionSerializer,
    ) -> Result<Vec<T>> {
        if outer_name.is_empty() {
            return Err(Error::MissingArgument("extension name"));
        }
        let outer_namespace = outer_namespace.unwrap_or("");
        let mut results = Vec::new();
        for item in &self.items {
            if item.outer_name() != outer_name || item.outer_namespace() != outer_namespace {
                continue;
            }
            results.push(item.deserialize(serializer)?);
        }
        Ok(results)
    }

    /// Serialization of the whole collection wrapped in one root element,
    /// building and caching it on first use.
    ///
    /// Repeated calls between mutations return the identical buffer; any
    /// mutation forces a rebuild on the next call. Installing the cache here
    /// is the canonical fill path and does not count as a mutation.
    pub fn buffer_over_extensions(&mut self) -> Result<Arc<XmlBuffer>> {
        if let Some(buffer) = &self.buffer {
            return Ok(Arc::clone(buffer));
        }
        let mut builder = XmlBuffer::builder();
        let mut section = builder.open_section();
        section.start_element(EXTENSION_WRAPPER_TAG)?;
        for item in &self.items {
            item.write_into_section(&mut section)?;
        }
        section.end_element(EXTENSION_WRAPPER_TAG)?;
        section.close();
        let buffer = Arc::new(builder.finish());
        self.buffer = Some(Arc::clone(&buffer));
        Ok(buffer)
    }

    /// Read cursor positioned just inside the wrapper of the (possibly newly
    /// built) cached buffer, with the wrapper start tag already consumed.
    pub fn reader_at_extensions(&mut self) -> Result<XmlCursor> {
        let buffer = self.buffer_over_extensions()?;
        let mut cursor = buffer.reader(0)?;
        cursor.read_start()?;
        Ok(cursor)
    }

    /// Write every extension to the destination writer.
    ///
    /// With a cache present this is a verbatim byte copy of the wrapper's
    /// content; no capability is invoked and whitespace between elements is
    /// preserved exactly. Without one, each element writes its own
    /// representation in order.
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        if let Some(buffer) = &self.buffer {
            let mut cursor = buffer.reader(0)?;
            cursor.read_start()?;
            let content = cursor.rest_of_element_raw()?;
            writer.get_mut().write_all(&content)?;
        } else {
            for item in &self.items {
                item.write_to(writer)?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn cached_buffer(&self) -> Option<&Arc<XmlBuffer>> {
        self.buffer.as_ref()
    }
}

impl<'a> IntoIterator for &'a ElementExtensionCollection {
    type Item = &'a ElementExtension;
    type IntoIter = std::slice::Iter<'a, ElementExtension>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
