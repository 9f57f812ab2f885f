use crate::core::combiner::{combine, paths_text, with_header};
use crate::core::history::VersionHistory;
use crate::core::selection::Selection;
use crate::domain::errors::CombinerError;
use crate::domain::models::{Candidate, CombineOptions, Combined, RefreshReport, ScanRules};
use crate::infra::file_system::{
    create_empty_file, read_file_bytes, read_file_text, remove_file, rename_file,
    resolve_in_workspace, scan_candidates, validate_root, write_file,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Everything the tool knows about one workspace: where it is, what can be
/// picked from it, what has been picked, and what was overwritten.
///
/// State only changes after the corresponding filesystem call succeeded.
#[derive(Debug)]
pub struct Session {
    root: PathBuf,
    rules: ScanRules,
    options: CombineOptions,
    candidates: Vec<Candidate>,
    selection: Selection,
    history: VersionHistory,
    deleted: Vec<PathBuf>,
}

impl Session {
    pub fn open(
        root: &Path,
        rules: ScanRules,
        options: CombineOptions,
    ) -> Result<Self, CombinerError> {
        let root = validate_root(root)?;
        info!("Opening workspace {}", root.display());
        let candidates = scan_candidates(&root, &rules)?;

        Ok(Self {
            root,
            rules,
            options,
            candidates,
            selection: Selection::new(),
            history: VersionHistory::new(),
            deleted: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_candidate(&self, path: &Path) -> bool {
        self.candidates.iter().any(|c| c.path == path)
    }

    pub fn resolve(&self, path: &Path) -> Result<PathBuf, CombinerError> {
        resolve_in_workspace(&self.root, path)
    }

    /// Rescans the workspace. On failure the previous candidates stay in place.
    pub fn refresh(&mut self) -> Result<RefreshReport, CombinerError> {
        let fresh = scan_candidates(&self.root, &self.rules)?;

        let previous: HashMap<&Path, &Candidate> = self
            .candidates
            .iter()
            .map(|c| (c.path.as_path(), c))
            .collect();
        let mut report = RefreshReport::default();
        for candidate in &fresh {
            match previous.get(candidate.path.as_path()) {
                None => report.added.push(candidate.path.clone()),
                Some(old) if old.modified != candidate.modified => {
                    report.modified.push(candidate.path.clone())
                }
                Some(_) => {}
            }
        }
        report.removed = self
            .candidates
            .iter()
            .filter(|old| !fresh.iter().any(|c| c.path == old.path))
            .map(|old| old.path.clone())
            .collect();

        report.dropped_from_selection = self
            .selection
            .retain(|path| fresh.iter().any(|c| c.path == path));
        for dropped in &report.dropped_from_selection {
            debug!("Dropped vanished file from selection: {}", dropped.display());
        }

        self.candidates = fresh;
        info!(
            "Refreshed: {} added, {} removed, {} modified",
            report.added.len(),
            report.removed.len(),
            report.modified.len()
        );
        Ok(report)
    }

    pub fn select(&mut self, path: &Path) -> Result<bool, CombinerError> {
        let relative = self.resolve(path)?;
        if !self.is_candidate(&relative) {
            return Err(CombinerError::NotACandidate(relative));
        }
        Ok(self.selection.add(&relative))
    }

    pub fn deselect(&mut self, path: &Path) -> bool {
        match self.resolve(path) {
            Ok(relative) => self.selection.remove(&relative),
            Err(_) => false,
        }
    }

    pub fn toggle(&mut self, path: &Path) -> Result<bool, CombinerError> {
        let relative = self.resolve(path)?;
        if self.selection.contains(&relative) {
            self.deselect(&relative);
            return Ok(false);
        }
        self.select(&relative)
    }

    pub fn select_all(&mut self) -> usize {
        self.selection.select_all(&self.candidates)
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    pub fn move_to_front(&mut self, path: &Path) -> bool {
        match self.resolve(path) {
            Ok(relative) => self.selection.move_to_front(&relative),
            Err(_) => false,
        }
    }

    /// Reads every selected file fresh from disk.
    pub fn combine(&self) -> Result<Combined, CombinerError> {
        combine(
            &self.root,
            self.selection.as_slice(),
            &self.options,
            read_file_text,
        )
    }

    pub fn selected_paths_text(&self) -> String {
        paths_text(self.selection.iter())
    }

    /// One file with its header line, whether or not it is selected.
    pub fn file_with_header(&self, path: &Path) -> Result<String, CombinerError> {
        let relative = self.resolve(path)?;
        let content = read_file_text(&self.root.join(&relative))?;
        Ok(with_header(&self.options, &relative, &content))
    }

    pub fn create_file(&mut self, path: &Path) -> Result<PathBuf, CombinerError> {
        let relative = self.resolve(path)?;
        create_empty_file(&self.root.join(&relative))?;
        self.refresh_after_mutation();
        Ok(relative)
    }

    pub fn move_file(&mut self, from: &Path, to: &Path) -> Result<PathBuf, CombinerError> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        rename_file(&self.root.join(&from), &self.root.join(&to))?;

        self.selection.rename(&from, &to);
        self.history.rename(&from, &to);
        self.deleted.retain(|path| path != &to);
        self.refresh_after_mutation();
        Ok(to)
    }

    pub fn delete_file(&mut self, path: &Path) -> Result<PathBuf, CombinerError> {
        let relative = self.resolve(path)?;
        let absolute = self.root.join(&relative);
        let content = read_file_bytes(&absolute)?;
        remove_file(&absolute)?;

        self.history.record(&relative, content);
        self.deleted.retain(|path| path != &relative);
        self.deleted.push(relative.clone());
        self.refresh_after_mutation();
        Ok(relative)
    }

    /// Writes `text` into the file, prefixed with its header line unless the
    /// text already starts with it.
    pub fn paste_into(&mut self, path: &Path, text: &str) -> Result<PathBuf, CombinerError> {
        if text.trim().is_empty() {
            return Err(CombinerError::EmptyClipboard);
        }
        let relative = self.resolve(path)?;
        let absolute = self.root.join(&relative);

        let previous = match read_file_bytes(&absolute) {
            Ok(content) => Some(content),
            Err(CombinerError::FileMissing(_)) => None,
            Err(e) => return Err(e),
        };

        let content = with_header(&self.options, &relative, text);
        write_file(&absolute, content.as_bytes())?;

        if let Some(previous) = previous {
            self.history.record(&relative, previous);
        }
        self.refresh_after_mutation();
        Ok(relative)
    }

    /// Puts back the newest saved version, recreating the file if it was deleted.
    pub fn restore_file(&mut self, path: &Path) -> Result<PathBuf, CombinerError> {
        let relative = self.resolve(path)?;
        let previous = self
            .history
            .latest(&relative)
            .ok_or_else(|| CombinerError::NoPreviousVersion(relative.clone()))?;
        write_file(&self.root.join(&relative), previous)?;

        self.history.pop(&relative);
        self.deleted.retain(|path| path != &relative);
        self.refresh_after_mutation();
        Ok(relative)
    }

    /// The most recently deleted file that has not been brought back yet.
    pub fn last_deleted(&self) -> Option<&Path> {
        self.deleted.last().map(PathBuf::as_path)
    }

    /// Recreates the most recently deleted file from its saved contents.
    pub fn restore_last_deleted(&mut self) -> Result<PathBuf, CombinerError> {
        let path = self
            .last_deleted()
            .map(Path::to_path_buf)
            .ok_or(CombinerError::NothingToRestore)?;
        self.restore_file(&path)
    }

    pub fn history_depth(&self, path: &Path) -> usize {
        self.resolve(path)
            .map(|relative| self.history.depth(&relative))
            .unwrap_or(0)
    }

    fn refresh_after_mutation(&mut self) {
        if let Err(e) = self.refresh() {
            warn!("Rescan after file change failed: {}", e);
        }
    }
}
