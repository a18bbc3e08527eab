//! Bundle file formats.
//!
//! Only the `key=value` properties layout is supported. [`escape`] holds the
//! escape rules shared by its reader and writer.

pub mod escape;
pub mod properties;

pub use properties::{FormatOptions, GENERATED_BY, PropertiesFormat};

/// File extension of bundle files.
pub const PROPERTIES_EXTENSION: &str = "properties";
