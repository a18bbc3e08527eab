//! Where bundle text comes from and goes to.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use crate::{
    error::Error,
    formats::PROPERTIES_EXTENSION,
    locale::{Locale, bundle_file_name, locale_from_file_name},
    traits::read_text,
};

/// Provider of raw per-locale bundle text, such as a directory or an editor.
pub trait BundleSource {
    /// Locales available from this source, sorted.
    fn locales(&self) -> Result<Vec<Locale>, Error>;

    /// Text of the bundle for `locale`, or `None` when there is none.
    fn read(&self, locale: &Locale) -> Result<Option<String>, Error>;

    /// Stores the text of the bundle for `locale`, creating it if needed.
    fn write(&mut self, locale: &Locale, text: &str) -> Result<(), Error>;
}

/// A bundle family stored as `base[_locale].extension` files in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    dir: PathBuf,
    base_name: String,
    extension: String,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_name: base_name.into(),
            extension: PROPERTIES_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Source for the family that `file` belongs to.
    ///
    /// The base name is the longest prefix of the file stem followed by a
    /// valid locale suffix, preferring one for which a root file exists.
    /// `messages_fr_CA.properties` belongs to `messages`, and
    /// `my_app.properties` is the root file of `my_app`.
    pub fn for_file(file: impl AsRef<Path>) -> Result<Self, Error> {
        let file = file.as_ref();
        let invalid = || {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a bundle file: {}", file.display()),
            ))
        };
        let file_name = file.file_name().and_then(|name| name.to_str()).ok_or_else(invalid)?;
        let (stem, extension) = file_name.rsplit_once('.').ok_or_else(invalid)?;
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut candidates: Vec<&str> = stem
            .match_indices('_')
            .map(|(index, _)| &stem[..index])
            .filter(|base| !base.is_empty())
            .filter(|base| locale_from_file_name(file_name, base, extension).is_some())
            .collect();
        candidates.reverse();

        let root_exists =
            |base: &str| dir.join(bundle_file_name(base, &Locale::root(), extension)).is_file();
        let base_name = if root_exists(stem) {
            stem
        } else {
            candidates
                .iter()
                .copied()
                .find(|base| root_exists(base))
                .or_else(|| candidates.first().copied())
                .unwrap_or(stem)
        };
        trace!(file = %file.display(), base_name, "bundle family detected");
        Ok(Self::new(dir, base_name).with_extension(extension))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file holding `locale`, whether or not it exists.
    pub fn path(&self, locale: &Locale) -> PathBuf {
        self.dir
            .join(bundle_file_name(&self.base_name, locale, &self.extension))
    }
}

impl BundleSource for DirectorySource {
    fn locales(&self) -> Result<Vec<Locale>, Error> {
        let mut locales = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            let file_name = dir_entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(locale) = locale_from_file_name(file_name, &self.base_name, &self.extension) {
                locales.push(locale);
            }
        }
        locales.sort();
        debug!(
            dir = %self.dir.display(),
            base_name = %self.base_name,
            count = locales.len(),
            "locales discovered"
        );
        Ok(locales)
    }

    fn read(&self, locale: &Locale) -> Result<Option<String>, Error> {
        let path = self.path(locale);
        if !path.is_file() {
            return Ok(None);
        }
        let text = read_text(File::open(&path)?)?;
        Ok(Some(text))
    }

    fn write(&mut self, locale: &Locale, text: &str) -> Result<(), Error> {
        let path = self.path(locale);
        debug!(path = %path.display(), "writing bundle");
        fs::write(path, text)?;
        Ok(())
    }
}

/// In-memory source, for editors holding unsaved text and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    files: BTreeMap<Locale, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locale: Locale, text: impl Into<String>) -> Self {
        self.files.insert(locale, text.into());
        self
    }

    pub fn text(&self, locale: &Locale) -> Option<&str> {
        self.files.get(locale).map(String::as_str)
    }
}

impl BundleSource for MemorySource {
    fn locales(&self) -> Result<Vec<Locale>, Error> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, locale: &Locale) -> Result<Option<String>, Error> {
        Ok(self.files.get(locale).cloned())
    }

    fn write(&mut self, locale: &Locale, text: &str) -> Result<(), Error> {
        self.files.insert(locale.clone(), text.to_string());
        Ok(())
    }
}
