use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::SnapverifyError;
use crate::hash::fingerprint_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureFile {
    pub path: PathBuf,
    pub raw_text: String,
    pub fingerprint: String,
}

impl FixtureFile {
    pub fn read(path: &Path) -> Result<Self, SnapverifyError> {
        let raw_text = fs::read_to_string(path).map_err(|error| SnapverifyError::io(path, error))?;
        Ok(Self::from_text(path.to_path_buf(), raw_text))
    }

    pub fn from_text(path: PathBuf, raw_text: String) -> Self {
        let fingerprint = fingerprint_text(&raw_text);
        Self {
            path,
            raw_text,
            fingerprint,
        }
    }
}

/// Lists the files directly inside `dir` whose name matches `pattern`, sorted
/// by path. Finding none is an error.
pub fn discover_fixtures(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, SnapverifyError> {
    let compiled = Pattern::new(pattern).map_err(|error| SnapverifyError::InvalidFixturePattern {
        pattern: pattern.to_string(),
        message: error.msg.to_string(),
    })?;

    let entries = fs::read_dir(dir).map_err(|error| SnapverifyError::io(dir, error))?;
    let mut fixtures = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| SnapverifyError::io(dir, error))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| compiled.matches(name));
        if matches {
            fixtures.push(path);
        }
    }

    if fixtures.is_empty() {
        return Err(SnapverifyError::NoFixtures {
            dir: dir.display().to_string(),
            pattern: pattern.to_string(),
        });
    }

    fixtures.sort();
    tracing::debug!(count = fixtures.len(), dir = %dir.display(), "discovered fixture files");
    Ok(fixtures)
}
