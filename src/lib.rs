//! Syndext - buffered, lazily-materialized XML element extensions for
//! syndication feeds and items
//!
//! RSS and Atom entities routinely carry vendor extension elements whose
//! schema is not known in advance. This library provides the data structure
//! that reconciles "raw XML captured once at parse time" with "typed objects
//! added and removed programmatically": an ordered extension collection
//! backed by an immutable byte buffer, guaranteeing that serialized output is
//! byte-faithful to the original when nothing has been mutated, and falling
//! back to per-element re-serialization otherwise.
//!
//! # Features
//!
//! - **Lazy extraction**: extensions parsed from a feed stay as unparsed
//!   bytes until a consumer asks for them
//! - **Round-trip fidelity**: an unmutated collection writes back the exact
//!   bytes it was built from
//! - **Two serializer strategies**: contract-based (the type's serde
//!   implementation is the contract) or schema-based (an explicit mapping
//!   owns the element identity), never mixed for one element
//! - **Zero-copy reads**: any number of cursors walk the same captured
//!   buffer concurrently
//!
//! # Example - Reading extensions captured from a feed
//!
//! ```
//! use std::sync::Arc;
//! use syndext::{ElementExtensionCollection, XmlBuffer};
//!
//! # fn main() -> syndext::Result<()> {
//! // Captured at parse time: two extension elements inside the wrapper
//! let buffer = Arc::new(XmlBuffer::from_fragment(
//!     r#"<extensionWrapper><dc:creator xmlns:dc="http://purl.org/dc/elements/1.1/">Ana</dc:creator><ttl>60</ttl></extensionWrapper>"#,
//! ));
//! let extensions = ElementExtensionCollection::from_buffer(buffer)?;
//!
//! // Filtered, typed extraction
//! let creators: Vec<String> =
//!     extensions.read_extensions("creator", Some("http://purl.org/dc/elements/1.1/"))?;
//! assert_eq!(creators, ["Ana"]);
//!
//! let ttls: Vec<u32> = extensions.read_extensions("ttl", None)?;
//! assert_eq!(ttls, [60]);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Attaching typed extensions
//!
//! ```
//! use syndext::ElementExtensionCollection;
//!
//! #[derive(serde::Serialize)]
//! struct Rating {
//!     value: u32,
//! }
//!
//! # fn main() -> syndext::Result<()> {
//! let mut extensions = ElementExtensionCollection::new();
//! extensions.push_contract("rating", "urn:example:media", Rating { value: 5 })?;
//!
//! let mut writer = quick_xml::Writer::new(Vec::new());
//! extensions.write_to(&mut writer)?;
//! let xml = String::from_utf8(writer.into_inner()).unwrap();
//! assert_eq!(
//!     xml,
//!     r#"<rating xmlns="urn:example:media"><value>5</value></rating>"#
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Streaming raw access
//!
//! ```
//! use syndext::ElementExtensionCollection;
//!
//! # fn main() -> syndext::Result<()> {
//! let mut extensions = ElementExtensionCollection::new();
//! extensions.push_raw(r#"<a>1</a>"#)?;
//! extensions.push_raw(r#"<b>2</b>"#)?;
//!
//! // Walk every extension as raw XML without decoding any of them
//! let mut cursor = extensions.reader_at_extensions()?;
//! while let Some(fragment) = cursor.next_element_raw()? {
//!     println!("extension: {}", String::from_utf8_lossy(&fragment));
//! }
//! # Ok(())
//! # }
//! ```

/// Append-once, multi-section XML byte store and its read cursor
///
/// This module provides the immutable buffer that captured extension bytes
/// live in, the builder that writes its sections exactly once, and the
/// cursor used to walk a section.
pub mod buffer;

/// Common types and utilities shared across modules
pub mod common;

/// Extension elements and the extension collection
///
/// This module provides the core data model: one extension fragment, and the
/// ordered collection with its cached raw-bytes view.
pub mod extension;

/// Serializer capabilities for typed extension payloads
pub mod serializer;

// Re-export commonly used types for convenience
pub use buffer::{SectionWriter, XmlBuffer, XmlBufferBuilder, XmlCursor};
pub use common::{Error, Result};
pub use extension::{EXTENSION_WRAPPER_TAG, ElementExtension, ElementExtensionCollection};
pub use serializer::{ContractSerializer, ExtensionSerializer, SchemaSerializer};
