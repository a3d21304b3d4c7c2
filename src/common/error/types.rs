//! Unified error types for the syndext library.
//!
//! This module provides a unified error type that encompasses failures from
//! buffer walking, serializer capabilities, and the extension collection
//! itself, presenting a consistent API to users.
use thiserror::Error;

/// Main error type for syndext operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while writing to a destination sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An add/insert/replace call received an unusable required value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A filtered read was invoked without a required argument
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// A structural operation addressed an index outside the collection
    #[error("Index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A read cursor was requested for a section the buffer does not have
    #[error("Section {0} out of range")]
    SectionOutOfRange(usize),

    /// XML parsing or writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// A capability could not convert an object into its XML representation
    #[error("Encode failure: {0}")]
    EncodeFailure(String),

    /// A capability could not convert a matched element into the requested type
    #[error("Decode failure: {0}")]
    DecodeFailure(String),
}

/// Result type for syndext operations.
pub type Result<T> = std::result::Result<T, Error>;
