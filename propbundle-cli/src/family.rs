use propbundle::{BundleSession, DirectorySource, Preferences};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::validation::validate_file_path;

/// Name of the configuration file looked up next to the bundle files.
pub const CONFIG_FILE_NAME: &str = "propbundle.toml";

/// Preferences from `config`, else from a `propbundle.toml` in `bundle_dir`,
/// else the defaults.
pub fn load_preferences(config: Option<&Path>, bundle_dir: &Path) -> Result<Preferences, String> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = bundle_dir.join(CONFIG_FILE_NAME);
            if !candidate.is_file() {
                return Ok(Preferences::default());
            }
            candidate
        }
    };
    debug!(path = %path.display(), "loading preferences");
    Preferences::load(&path).map_err(|e| format!("Error reading {}: {}", path.display(), e))
}

/// A bundle family opened from disk.
pub struct Family {
    pub source: DirectorySource,
    pub session: BundleSession,
}

impl Family {
    /// Opens the family that `input` (any of its files) belongs to.
    pub fn open(input: &str, config: Option<&Path>) -> Result<Self, String> {
        validate_file_path(input)?;
        let source = DirectorySource::for_file(input)
            .map_err(|e| format!("Error reading {}: {}", input, e))?;
        Self::from_source(source, config)
    }

    pub fn from_source(source: DirectorySource, config: Option<&Path>) -> Result<Self, String> {
        Self::from_source_with(source, config, |_| {})
    }

    /// Like [`Family::from_source`], letting `adjust` override loaded preferences.
    pub fn from_source_with(
        source: DirectorySource,
        config: Option<&Path>,
        adjust: impl FnOnce(&mut Preferences),
    ) -> Result<Self, String> {
        let mut preferences = load_preferences(config, source.dir())?;
        adjust(&mut preferences);
        let session = BundleSession::load(&source, preferences)
            .map_err(|e| format!("Error reading {}: {}", Self::describe(&source), e))?;
        Ok(Self { source, session })
    }

    /// Writes every locale back to its file.
    pub fn save(&mut self) -> Result<(), String> {
        self.session
            .save(&mut self.source)
            .map_err(|e| format!("Error writing {}: {}", self.name(), e))
    }

    /// `dir/base` label used in messages.
    pub fn name(&self) -> String {
        Self::describe(&self.source)
    }

    fn describe(source: &DirectorySource) -> String {
        source.dir().join(source.base_name()).display().to_string()
    }
}

/// Expand possible glob patterns in a list of input strings into concrete file paths.
/// Inputs without glob meta-characters are kept as given.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>, String> {
    fn has_glob_meta(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut paths = Vec::new();
    for input in inputs {
        if !has_glob_meta(input) {
            paths.push(PathBuf::from(input));
            continue;
        }
        let matches = glob::glob(input)
            .map_err(|e| format!("Invalid glob pattern '{}': {}", input, e))?;
        let before = paths.len();
        for entry in matches {
            let path = entry.map_err(|e| format!("Cannot read {}: {}", input, e))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        if paths.len() == before {
            return Err(format!("No files match pattern: {}", input));
        }
    }
    Ok(paths)
}

/// One source per distinct family among `paths`, in first-seen order.
pub fn family_sources(paths: &[PathBuf]) -> Result<Vec<DirectorySource>, String> {
    let mut seen = BTreeSet::new();
    let mut sources = Vec::new();
    for path in paths {
        let display = path.display().to_string();
        validate_file_path(&display)?;
        let source = DirectorySource::for_file(path)
            .map_err(|e| format!("Error reading {}: {}", display, e))?;
        let id = (
            source.dir().to_path_buf(),
            source.base_name().to_string(),
            source.extension().to_string(),
        );
        if seen.insert(id) {
            sources.push(source);
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_family_sources_deduplicates_locales() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["app.properties", "app_fr.properties", "other.properties"] {
            fs::write(dir.path().join(name), "k=v\n").unwrap();
        }
        let pattern = format!("{}/*.properties", dir.path().display());
        let paths = expand_inputs(&[pattern]).unwrap();
        assert_eq!(paths.len(), 3);

        let sources = family_sources(&paths).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.base_name()).collect();
        assert_eq!(names, vec!["app", "other"]);
    }

    #[test]
    fn test_unmatched_pattern_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.properties", dir.path().display());
        assert!(expand_inputs(&[pattern]).is_err());
    }

    #[test]
    fn test_config_next_to_bundles() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_preferences(None, dir.path()).unwrap(), Preferences::default());

        fs::write(dir.path().join(CONFIG_FILE_NAME), "wrap_column = 60\n").unwrap();
        assert_eq!(load_preferences(None, dir.path()).unwrap().wrap_column, 60);

        fs::write(dir.path().join("broken.toml"), "wrap_column = [").unwrap();
        assert!(load_preferences(Some(&dir.path().join("broken.toml")), dir.path()).is_err());
    }
}
