use crate::domain::errors::CombinerError;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

pub const DEFAULT_EXTENSIONS: &[&str] = &[".py"];
pub const DEFAULT_EXCLUDED_FILES: &[&str] =
    &["__init__.py", "Codehelp.py", "analysis_depend.py"];
pub const DEFAULT_EXCLUDED_DIRS: &[&str] =
    &["__pycache__", ".git", ".venv", "venv", ".idea", ".vscode"];
pub const DEFAULT_HEADER_PREFIX: &str = "# ";

/// Filters applied while walking the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRules {
    pub extensions: Vec<String>,
    pub excluded_files: Vec<String>,
    pub excluded_dirs: Vec<String>,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            extensions: to_owned_list(DEFAULT_EXTENSIONS),
            excluded_files: to_owned_list(DEFAULT_EXCLUDED_FILES),
            excluded_dirs: to_owned_list(DEFAULT_EXCLUDED_DIRS),
        }
    }
}

impl ScanRules {
    pub fn matches_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                self.extensions
                    .iter()
                    .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(e))
            })
            .unwrap_or(false)
    }

    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.excluded_files.iter().any(|excluded| excluded == name)
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|excluded| excluded == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPolicy {
    /// Skip unreadable files and record a warning.
    #[default]
    Lenient,
    /// Abort the whole combine on the first unreadable file.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineOptions {
    pub header_prefix: String,
    pub skip_duplicate_header: bool,
    pub policy: ReadPolicy,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
            skip_duplicate_header: true,
            policy: ReadPolicy::Lenient,
        }
    }
}

impl CombineOptions {
    pub fn header_for(&self, path: &Path) -> String {
        format!("{}{}", self.header_prefix, display_path(path))
    }
}

#[derive(Debug)]
pub struct CombineWarning {
    pub path: PathBuf,
    pub error: CombinerError,
}

#[derive(Debug, Default)]
pub struct Combined {
    pub text: String,
    pub file_count: usize,
    pub line_count: usize,
    pub warnings: Vec<CombineWarning>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub dropped_from_selection: Vec<PathBuf>,
}

impl RefreshReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Renders a workspace-relative path with `/` separators regardless of platform.
pub fn display_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
