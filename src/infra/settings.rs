use crate::domain::errors::CombinerError;
use crate::domain::models::{CombineOptions, ReadPolicy, ScanRules};
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const SETTINGS_FILE_NAME: &str = ".codecombiner.toml";

/// Optional per-workspace overrides. Keys left out keep their defaults.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub extensions: Option<Vec<String>>,
    pub excluded_files: Option<Vec<String>>,
    pub excluded_dirs: Option<Vec<String>>,
    pub header_prefix: Option<String>,
    pub skip_duplicate_header: Option<bool>,
    pub policy: Option<ReadPolicy>,
}

impl Settings {
    pub fn parse(path: &Path, text: &str) -> Result<Self, CombinerError> {
        toml::from_str(text).map_err(|e| CombinerError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reads `explicit` if given, otherwise the settings file at the workspace
    /// root when one exists.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, CombinerError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let implicit = root.join(SETTINGS_FILE_NAME);
                if !implicit.is_file() {
                    debug!("No settings file at {}", implicit.display());
                    return Ok(Self::default());
                }
                implicit
            }
        };

        let text = fs::read_to_string(&path).map_err(|e| CombinerError::Settings {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let settings = Self::parse(&path, &text)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn apply(self, rules: &mut ScanRules, options: &mut CombineOptions) {
        if let Some(extensions) = self.extensions {
            rules.extensions = extensions;
        }
        if let Some(excluded_files) = self.excluded_files {
            rules.excluded_files = excluded_files;
        }
        if let Some(excluded_dirs) = self.excluded_dirs {
            rules.excluded_dirs = excluded_dirs;
        }
        if let Some(prefix) = self.header_prefix {
            options.header_prefix = prefix;
        }
        if let Some(skip) = self.skip_duplicate_header {
            options.skip_duplicate_header = skip;
        }
        if let Some(policy) = self.policy {
            options.policy = policy;
        }
    }
}
