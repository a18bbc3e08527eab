//! Traits for reading and writing bundles independently of the file layout.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::{bundle::Bundle, error::Error};

/// A text format for one bundle file.
///
/// # Example
///
/// ```rust,no_run
/// use propbundle::{formats::PropertiesFormat, traits::BundleFormat};
/// let format = PropertiesFormat::default();
/// let bundle = format.read_from("messages_fr.properties")?;
/// format.write_to(&bundle, "messages_fr_copy.properties")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait BundleFormat {
    /// Builds a bundle from decoded text. Parsing never fails: lines that are
    /// not understood are treated as blank.
    fn parse(&self, text: &str) -> Bundle;

    /// Renders a bundle so that [`BundleFormat::parse`] restores its keys,
    /// values, comments, and commented flags.
    fn generate(&self, bundle: &Bundle) -> String;

    /// Parse from any reader, detecting the text encoding.
    fn from_reader<R: Read>(&self, reader: R) -> Result<Bundle, Error> {
        let text = read_text(reader)?;
        Ok(self.parse(&text))
    }

    /// Parse from file path.
    fn read_from<P: AsRef<Path>>(&self, path: P) -> Result<Bundle, Error> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "reading bundle");
        self.from_reader(file)
    }

    /// Write to any writer (file, memory, etc.) as UTF-8.
    fn to_writer<W: Write>(&self, bundle: &Bundle, mut writer: W) -> Result<(), Error> {
        writer.write_all(self.generate(bundle).as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Write to file path.
    fn write_to<P: AsRef<Path>>(&self, bundle: &Bundle, path: P) -> Result<(), Error> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "writing bundle");
        self.to_writer(bundle, BufWriter::new(file))
    }
}

/// Reads all of `reader` as text.
///
/// UTF-8 and UTF-16 byte order marks are honored. Without a BOM the bytes are
/// taken as UTF-8, falling back to Windows-1252 (a superset of ISO-8859-1) when
/// they are not valid UTF-8.
pub fn read_text<R: Read>(reader: R) -> Result<String, Error> {
    let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
        .bom_override(true)
        .build(reader);
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            debug!("input is not UTF-8, decoding as Windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(err.as_bytes());
            Ok(text.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_text_utf8() {
        let text = read_text(Cursor::new("clé=valeur".as_bytes())).unwrap();
        assert_eq!(text, "clé=valeur");
    }

    #[test]
    fn test_read_text_strips_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"a=1");
        assert_eq!(read_text(Cursor::new(bytes)).unwrap(), "a=1");
    }

    #[test]
    fn test_read_text_utf16le_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "k=é".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(read_text(Cursor::new(bytes)).unwrap(), "k=é");
    }

    #[test]
    fn test_read_text_latin1_fallback() {
        let bytes = vec![b'k', b'=', 0xE9];
        assert_eq!(read_text(Cursor::new(bytes)).unwrap(), "k=é");
    }
}
