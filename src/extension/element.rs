//! A single extension element: one XML fragment of unknown schema.

use crate::buffer::{SectionWriter, XmlBuffer, XmlCursor};
use crate::common::xml::fragment_identity;
use crate::common::{Error, Result};
use crate::serializer::{
    ContractSerializer, ErasedValue, ExtensionSerializer, SchemaSerializer, TypedValue,
};
use bytes::Bytes;
use quick_xml::Writer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// One extension fragment attached to a feed or item.
///
/// An extension is either a lazy reference into a shared [`XmlBuffer`]
/// section, a typed value paired with the serializer capability chosen when
/// it was added, or an independently captured raw fragment. Whatever the
/// representation, every extension exposes a stable
/// `(outer name, outer namespace)` identity resolved eagerly at construction;
/// filtering never has to materialize content.
///
/// Extensions are cheap to clone: buffered and raw content is refcounted,
/// and typed values are shared behind an `Arc`.
#[derive(Clone)]
pub struct ElementExtension {
    outer_name: String,
    outer_namespace: String,
    data: ExtensionData,
}

#[derive(Clone)]
enum ExtensionData {
    /// Reference to the index-th child of the wrapper in section 0 of a
    /// shared buffer; content is re-read from the buffer on demand
    Buffered { buffer: Arc<XmlBuffer>, index: usize },
    /// Typed value plus the capability chosen at the add site; re-encoded
    /// on demand
    Materialized { value: Arc<dyn ErasedValue> },
    /// Independently captured fragment, not backed by the shared buffer
    Raw { xml: Bytes },
}

impl ElementExtension {
    /// Lazy reference into a shared buffer; used when a collection indexes
    /// an inherited section.
    pub(crate) fn buffered(
        buffer: Arc<XmlBuffer>,
        index: usize,
        outer_name: String,
        outer_namespace: String,
    ) -> Self {
        Self {
            outer_name,
            outer_namespace,
            data: ExtensionData::Buffered { buffer, index },
        }
    }

    /// Capture a fragment from an external raw source.
    ///
    /// The fragment's root tag is parsed eagerly to resolve the extension's
    /// identity; an empty or element-less source is rejected with
    /// [`Error::InvalidArgument`].
    pub fn raw(xml: impl Into<Bytes>) -> Result<Self> {
        let xml = xml.into();
        if xml.is_empty() {
            return Err(Error::InvalidArgument(
                "extension fragment must not be empty".to_string(),
            ));
        }
        let (outer_name, outer_namespace) = fragment_identity(&xml)?;
        Ok(Self {
            outer_name,
            outer_namespace,
            data: ExtensionData::Raw { xml },
        })
    }

    /// Wrap a typed value with the default contract capability under an
    /// explicit outer identity.
    pub fn contract<T>(outer_name: &str, outer_namespace: &str, value: T) -> Result<Self>
    where
        T: Serialize + 'static,
    {
        Self::contract_with(outer_name, outer_namespace, value, ContractSerializer::new())
    }

    /// Wrap a typed value with an explicit contract capability under an
    /// explicit outer identity.
    pub fn contract_with<T>(
        outer_name: &str,
        outer_namespace: &str,
        value: T,
        serializer: ContractSerializer,
    ) -> Result<Self>
    where
        T: Serialize + 'static,
    {
        if outer_name.is_empty() {
            return Err(Error::InvalidArgument(
                "extension outer name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            outer_name: outer_name.to_string(),
            outer_namespace: outer_namespace.to_string(),
            data: ExtensionData::Materialized {
                value: Arc::new(TypedValue {
                    value,
                    serializer: ExtensionSerializer::Contract(serializer),
                }),
            },
        })
    }

    /// Wrap a typed value with a schema mapping derived from its type.
    pub fn schema<T>(value: T) -> Result<Self>
    where
        T: Serialize + 'static,
    {
        Self::schema_with(value, SchemaSerializer::of::<T>())
    }

    /// Wrap a typed value with an explicit schema mapping; the outer
    /// identity comes from the mapping, never the caller.
    pub fn schema_with<T>(value: T, mapping: SchemaSerializer) -> Result<Self>
    where
        T: Serialize + 'static,
    {
        if mapping.outer_name().is_empty() {
            return Err(Error::InvalidArgument(
                "schema mapping outer name must not be empty".to_string(),
            ));
        }
        let outer_name = mapping.outer_name().to_string();
        let outer_namespace = mapping.outer_namespace().to_string();
        Ok(Self {
            outer_name,
            outer_namespace,
            data: ExtensionData::Materialized {
                value: Arc::new(TypedValue {
                    value,
                    serializer: ExtensionSerializer::Schema(mapping),
                }),
            },
        })
    }

    /// Local name of the extension's root tag.
    #[inline]
    pub fn outer_name(&self) -> &str {
        &self.outer_name
    }

    /// Namespace URI of the extension's root tag; empty when unqualified.
    #[inline]
    pub fn outer_namespace(&self) -> &str {
        &self.outer_namespace
    }

    /// The extension's XML fragment.
    ///
    /// Buffered content is the verbatim captured bytes; materialized values
    /// are re-encoded through their own capability.
    pub fn raw_xml(&self) -> Result<Bytes> {
        match &self.data {
            ExtensionData::Raw { xml } => Ok(xml.clone()),
            ExtensionData::Materialized { value } => {
                let encoded = value.encode(&self.outer_name, &self.outer_namespace)?;
                Ok(Bytes::from(encoded))
            },
            ExtensionData::Buffered { buffer, index } => {
                let mut cursor = buffer.reader(0)?;
                cursor.read_start()?;
                for _ in 0..*index {
                    cursor.skip_element()?;
                }
                match cursor.next_element_raw()? {
                    Some(bytes) => Ok(bytes),
                    None => Err(Error::Xml(format!(
                        "buffer holds no extension at index {index}"
                    ))),
                }
            },
        }
    }

    /// Read cursor over this extension's fragment alone.
    pub fn reader(&self) -> Result<XmlCursor> {
        Ok(XmlCursor::new(self.raw_xml()?))
    }

    /// Decode the fragment through the supplied capability.
    pub fn deserialize<T: DeserializeOwned>(
        &self,
        serializer: &ExtensionSerializer,
    ) -> Result<T> {
        let raw = self.raw_xml()?;
        let xml = std::str::from_utf8(&raw)
            .map_err(|_| Error::Xml("extension fragment is not valid UTF-8".to_string()))?;
        serializer.decode(xml)
    }

    /// Decode the fragment through the default contract capability.
    pub fn deserialize_contract<T: DeserializeOwned>(&self) -> Result<T> {
        self.deserialize(&ExtensionSerializer::default())
    }

    /// Write the fragment to a destination writer.
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let raw = self.raw_xml()?;
        writer.get_mut().write_all(&raw)?;
        Ok(())
    }

    /// Stream the fragment into an in-progress buffer section.
    pub(crate) fn write_into_section(&self, section: &mut SectionWriter<'_>) -> Result<()> {
        section.raw(&self.raw_xml()?);
        Ok(())
    }
}

impl fmt::Debug for ElementExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.data {
            ExtensionData::Buffered { index, .. } => format!("buffered[{index}]"),
            ExtensionData::Materialized { .. } => "materialized".to_string(),
            ExtensionData::Raw { .. } => "raw".to_string(),
        };
        f.debug_struct("ElementExtension")
            .field("outer_name", &self.outer_name)
            .field("outer_namespace", &self.outer_namespace)
            .field("kind", &kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Credit {
        role: String,
    }

    #[test]
    fn test_raw_identity_is_resolved_eagerly() {
        let ext = ElementExtension::raw(&br#"<m:credit xmlns:m="urn:m">x</m:credit>"#[..]).unwrap();
        assert_eq!(ext.outer_name(), "credit");
        assert_eq!(ext.outer_namespace(), "urn:m");
    }

    #[test]
    fn test_empty_raw_source_is_rejected() {
        assert!(matches!(
            ElementExtension::raw(&b""[..]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_contract_extension_encodes_on_demand() {
        let ext = ElementExtension::contract(
            "credit",
            "urn:m",
            Credit {
                role: "producer".to_string(),
            },
        )
        .unwrap();
        assert_eq!(ext.outer_name(), "credit");
        assert_eq!(ext.outer_namespace(), "urn:m");
        assert_eq!(
            ext.raw_xml().unwrap().as_ref(),
            br#"<credit xmlns="urn:m"><role>producer</role></credit>"#
        );
    }

    #[test]
    fn test_contract_extension_requires_a_name() {
        assert!(matches!(
            ElementExtension::contract("", "", 1i32),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_schema_extension_takes_identity_from_mapping() {
        let ext = ElementExtension::schema_with(
            Credit {
                role: "editor".to_string(),
            },
            SchemaSerializer::new("credit", "urn:m"),
        )
        .unwrap();
        assert_eq!(ext.outer_name(), "credit");
        assert_eq!(ext.outer_namespace(), "urn:m");
    }

    #[test]
    fn test_schema_extension_default_mapping_uses_type_name() {
        let ext = ElementExtension::schema(Credit {
            role: "editor".to_string(),
        })
        .unwrap();
        assert_eq!(ext.outer_name(), "Credit");
        assert_eq!(ext.outer_namespace(), "");
    }

    #[test]
    fn test_materialized_decodes_through_a_different_capability() {
        // encoded through its own schema mapping, decoded through the
        // caller's contract capability
        let ext = ElementExtension::schema_with(
            Credit {
                role: "grip".to_string(),
            },
            SchemaSerializer::new("credit", ""),
        )
        .unwrap();
        let back: Credit = ext.deserialize_contract().unwrap();
        assert_eq!(back.role, "grip");
    }

    #[test]
    fn test_write_to_streams_the_fragment() {
        let ext = ElementExtension::raw(&b"<a>1</a>"[..]).unwrap();
        let mut writer = Writer::new(Vec::new());
        ext.write_to(&mut writer).unwrap();
        assert_eq!(writer.into_inner(), b"<a>1</a>");
    }

    #[test]
    fn test_reader_walks_the_fragment() {
        let ext = ElementExtension::raw(&b"<a><inner>1</inner></a>"[..]).unwrap();
        let mut cursor = ext.reader().unwrap();
        assert!(cursor.is_start().unwrap());
        assert_eq!(
            cursor.next_element_raw().unwrap().as_deref(),
            Some(&b"<a><inner>1</inner></a>"[..])
        );
    }
}
