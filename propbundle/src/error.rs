//! All error types for the propbundle crate.
//!
//! Parsing bundle text never fails; these are returned from I/O, configuration,
//! export, and structural operations that are rejected before touching any locale.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("cannot serialize configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid key `{0}`")]
    InvalidKey(String),

    #[error("key `{0}` already exists")]
    KeyConflict(String),

    #[error("unknown locale `{0}`")]
    UnknownLocale(String),

    #[error("invalid locale `{0}`")]
    InvalidLocale(String),

    #[error("unknown session {0}")]
    UnknownSession(usize),
}

impl Error {
    /// Creates an invalid key error for the given key.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Error::InvalidKey(key.into())
    }

    /// Creates a key conflict error for the given key.
    pub fn key_conflict(key: impl Into<String>) -> Self {
        Error::KeyConflict(key.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = Error::Io(io_error);
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_config_parse_error() {
        let toml_error = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let error = Error::from(toml_error);
        assert!(error.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn test_invalid_key_error() {
        let error = Error::invalid_key("  ");
        assert_eq!(error.to_string(), "invalid key `  `");
    }

    #[test]
    fn test_key_conflict_error() {
        let error = Error::key_conflict("app.title");
        assert_eq!(error.to_string(), "key `app.title` already exists");
    }

    #[test]
    fn test_locale_errors() {
        assert_eq!(
            Error::UnknownLocale("de".to_string()).to_string(),
            "unknown locale `de`"
        );
        assert_eq!(
            Error::InvalidLocale("x!".to_string()).to_string(),
            "invalid locale `x!`"
        );
    }

    #[test]
    fn test_error_debug() {
        let error = Error::UnknownSession(3);
        let debug = format!("{:?}", error);
        assert!(debug.contains("UnknownSession"));
        assert!(debug.contains('3'));
    }
}
