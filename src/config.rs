use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;

use crate::css::DuplicateSelectorPolicy;
use crate::error::SnapverifyError;
use crate::extract::{DEFAULT_LOOKAHEAD_WINDOW, DEFAULT_PROXIMITY_WINDOW, ExtractOptions};

pub const DEFAULT_CONFIG_FILE: &str = "snapverify.toml";
pub const DEFAULT_FIXTURE_DIR: &str = "fixtures";
pub const DEFAULT_FIXTURE_GLOB: &str = "*.test.ts";
pub const DEFAULT_FAILURE_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Contents of `snapverify.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub fixture_dir: Option<PathBuf>,
    pub fixture_glob: Option<String>,
    pub proximity_window: Option<usize>,
    pub lookahead_window: Option<usize>,
    pub failure_limit: Option<usize>,
    pub duplicate_selectors: Option<DuplicateSelectorPolicy>,
    pub compiler: Option<CompilerCommand>,
}

impl ConfigFile {
    pub fn parse(path: &Path, text: &str) -> Result<Self, SnapverifyError> {
        let mut config: Self =
            toml::from_str(text).map_err(|error| SnapverifyError::InvalidConfig {
                path: path.display().to_string(),
                message: error.to_string(),
            })?;

        // Relative fixture directories are relative to the config file.
        if let (Some(dir), Some(base)) = (config.fixture_dir.as_mut(), path.parent()) {
            *dir = base.join(&*dir);
        }

        Ok(config)
    }

    /// Loads `explicit` when given, otherwise `./snapverify.toml` if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SnapverifyError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default_path.is_file() {
                    return Ok(Self::default());
                }
                default_path
            }
        };

        tracing::debug!(path = %path.display(), "loading config file");
        let text = fs::read_to_string(&path).map_err(|error| SnapverifyError::io(&path, error))?;
        Self::parse(&path, &text)
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub fixture_dir: Option<PathBuf>,
    pub fixture_glob: Option<String>,
    pub group_filter: Option<String>,
    pub proximity_window: Option<usize>,
    pub lookahead_window: Option<usize>,
    pub failure_limit: Option<usize>,
    pub duplicate_selectors: Option<DuplicateSelectorPolicy>,
    pub compiler: Option<CompilerCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub fixture_dir: PathBuf,
    pub fixture_glob: String,
    pub group_filter: Option<String>,
    pub extract: ExtractOptions,
    pub failure_limit: usize,
    pub duplicate_selectors: DuplicateSelectorPolicy,
    pub compiler: Option<CompilerCommand>,
}

impl Settings {
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Self {
        Self {
            fixture_dir: overrides
                .fixture_dir
                .or(file.fixture_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_DIR)),
            fixture_glob: overrides
                .fixture_glob
                .or(file.fixture_glob)
                .unwrap_or_else(|| DEFAULT_FIXTURE_GLOB.to_string()),
            group_filter: overrides.group_filter,
            extract: ExtractOptions {
                proximity_window: overrides
                    .proximity_window
                    .or(file.proximity_window)
                    .unwrap_or(DEFAULT_PROXIMITY_WINDOW),
                lookahead_window: overrides
                    .lookahead_window
                    .or(file.lookahead_window)
                    .unwrap_or(DEFAULT_LOOKAHEAD_WINDOW),
            },
            failure_limit: overrides
                .failure_limit
                .or(file.failure_limit)
                .unwrap_or(DEFAULT_FAILURE_LIMIT),
            duplicate_selectors: overrides
                .duplicate_selectors
                .or(file.duplicate_selectors)
                .unwrap_or_default(),
            compiler: overrides.compiler.or(file.compiler),
        }
    }

    pub fn group_pattern(&self) -> Result<Option<Pattern>, SnapverifyError> {
        self.group_filter
            .as_deref()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|error| SnapverifyError::InvalidFilterPattern {
                    pattern: pattern.to_string(),
                    message: error.msg.to_string(),
                })
            })
            .transpose()
    }
}
