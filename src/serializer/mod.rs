//! Serializer capabilities for typed extension payloads.
//!
//! Two mutually exclusive strategies convert between an in-memory value and
//! its XML fragment:
//!
//! - [`ContractSerializer`] is type-driven: the value's serde implementation
//!   is the contract, and the caller names the outer element at the add site.
//! - [`SchemaSerializer`] is mapping-driven: the mapping itself owns the
//!   outer element name and namespace; callers never supply them.
//!
//! Exactly one strategy is associated with a given extension element. The
//! [`ExtensionSerializer`] tagged variant carries the active strategy's
//! state, never both, so selection happens at the API boundary rather than
//! by runtime type inspection.

use crate::common::{Error, Result};
use quick_xml::escape::escape;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Type-driven capability: the value's serde implementation is the contract.
///
/// Encoding wraps the value in a caller-named root element; a non-empty
/// namespace is emitted as a default `xmlns` declaration on that root.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractSerializer;

impl ContractSerializer {
    /// Create the default contract capability.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Encode a value as an XML fragment rooted at the given outer identity.
    pub fn encode<T: Serialize>(
        &self,
        value: &T,
        outer_name: &str,
        outer_namespace: &str,
    ) -> Result<String> {
        encode_with_root(value, outer_name, outer_namespace)
    }

    /// Decode a fragment into a value of the requested type.
    pub fn decode<T: DeserializeOwned>(&self, xml: &str) -> Result<T> {
        Ok(quick_xml::de::from_str(xml)?)
    }
}

/// Mapping-driven capability: the mapping owns the outer element identity.
#[derive(Debug, Clone)]
pub struct SchemaSerializer {
    outer_name: String,
    outer_namespace: String,
}

impl SchemaSerializer {
    /// Build an explicit mapping for the given outer identity.
    pub fn new(outer_name: impl Into<String>, outer_namespace: impl Into<String>) -> Self {
        Self {
            outer_name: outer_name.into(),
            outer_namespace: outer_namespace.into(),
        }
    }

    /// Derive a mapping from the type's short name, with an empty namespace.
    ///
    /// Intended for plain named types; generic types carry their type
    /// arguments in the derived name and need an explicit mapping instead.
    pub fn of<T>() -> Self {
        Self::new(short_type_name::<T>(), "")
    }

    /// Outer element name the mapping serializes under.
    #[inline]
    pub fn outer_name(&self) -> &str {
        &self.outer_name
    }

    /// Outer namespace URI the mapping serializes under.
    #[inline]
    pub fn outer_namespace(&self) -> &str {
        &self.outer_namespace
    }

    /// Encode a value as an XML fragment rooted at the mapping's identity.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<String> {
        encode_with_root(value, &self.outer_name, &self.outer_namespace)
    }

    /// Decode a fragment into a value of the requested type.
    pub fn decode<T: DeserializeOwned>(&self, xml: &str) -> Result<T> {
        Ok(quick_xml::de::from_str(xml)?)
    }
}

/// The one capability associated with an extension element or a filtered
/// read: contract-based or schema-based, never both.
#[derive(Debug, Clone)]
pub enum ExtensionSerializer {
    /// Type-driven strategy
    Contract(ContractSerializer),
    /// Mapping-driven strategy
    Schema(SchemaSerializer),
}

impl ExtensionSerializer {
    /// Decode a fragment through the active strategy.
    pub fn decode<T: DeserializeOwned>(&self, xml: &str) -> Result<T> {
        match self {
            ExtensionSerializer::Contract(contract) => contract.decode(xml),
            ExtensionSerializer::Schema(schema) => schema.decode(xml),
        }
    }

    /// Encode a value through the active strategy.
    ///
    /// The contract strategy roots the fragment at the supplied identity;
    /// the schema strategy always uses its own mapping.
    pub(crate) fn encode<T: Serialize>(
        &self,
        value: &T,
        outer_name: &str,
        outer_namespace: &str,
    ) -> Result<String> {
        match self {
            ExtensionSerializer::Contract(contract) => {
                contract.encode(value, outer_name, outer_namespace)
            },
            ExtensionSerializer::Schema(schema) => schema.encode(value),
        }
    }
}

impl Default for ExtensionSerializer {
    fn default() -> Self {
        ExtensionSerializer::Contract(ContractSerializer::new())
    }
}

impl From<ContractSerializer> for ExtensionSerializer {
    fn from(serializer: ContractSerializer) -> Self {
        ExtensionSerializer::Contract(serializer)
    }
}

impl From<SchemaSerializer> for ExtensionSerializer {
    fn from(mapping: SchemaSerializer) -> Self {
        ExtensionSerializer::Schema(mapping)
    }
}

/// Object-safe view of a typed payload, so a collection can hold values of
/// arbitrary types and re-encode them on demand.
pub(crate) trait ErasedValue {
    fn encode(&self, outer_name: &str, outer_namespace: &str) -> Result<String>;
}

/// A typed payload paired with the capability chosen at the add site.
pub(crate) struct TypedValue<T> {
    pub(crate) value: T,
    pub(crate) serializer: ExtensionSerializer,
}

impl<T: Serialize> ErasedValue for TypedValue<T> {
    fn encode(&self, outer_name: &str, outer_namespace: &str) -> Result<String> {
        self.serializer.encode(&self.value, outer_name, outer_namespace)
    }
}

fn encode_with_root<T: Serialize>(value: &T, root: &str, namespace: &str) -> Result<String> {
    if root.is_empty() {
        return Err(Error::InvalidArgument(
            "extension outer name must not be empty".to_string(),
        ));
    }
    let mut out = String::new();
    let serializer = quick_xml::se::Serializer::with_root(&mut out, Some(root))?;
    value.serialize(serializer)?;
    if namespace.is_empty() {
        return Ok(out);
    }
    // quick-xml's serde layer is namespace-agnostic, so the declaration is
    // spliced onto the root tag: `<root ...` -> `<root xmlns="..." ...`
    let declaration = format!(" xmlns=\"{}\"", escape(namespace));
    out.insert_str(1 + root.len(), &declaration);
    Ok(out)
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
