use crate::domain::models::Candidate;
use std::path::{Path, PathBuf};

/// Ordered set of selected workspace-relative paths. Insertion order is the
/// order files appear in combined output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    paths: Vec<PathBuf>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &Path) -> bool {
        if self.contains(path) {
            return false;
        }
        self.paths.push(path.to_path_buf());
        true
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        match self.position(path) {
            Some(idx) => {
                self.paths.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Returns whether the path is selected after the call.
    pub fn toggle(&mut self, path: &Path) -> bool {
        if self.remove(path) {
            false
        } else {
            self.add(path)
        }
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn select_all(&mut self, candidates: &[Candidate]) -> usize {
        candidates
            .iter()
            .filter(|candidate| self.add(&candidate.path))
            .count()
    }

    pub fn deselect_all(&mut self) {
        self.clear();
    }

    pub fn move_to_front(&mut self, path: &Path) -> bool {
        match self.position(path) {
            Some(idx) => {
                let entry = self.paths.remove(idx);
                self.paths.insert(0, entry);
                true
            }
            None => false,
        }
    }

    pub fn rename(&mut self, from: &Path, to: &Path) -> bool {
        if self.contains(to) {
            return self.remove(from);
        }
        match self.position(from) {
            Some(idx) => {
                self.paths[idx] = to.to_path_buf();
                true
            }
            None => false,
        }
    }

    /// Keeps only entries for which `keep` returns true and hands back the rest.
    pub fn retain(&mut self, mut keep: impl FnMut(&Path) -> bool) -> Vec<PathBuf> {
        let (kept, dropped): (Vec<_>, Vec<_>) =
            self.paths.drain(..).partition(|path| keep(path));
        self.paths = kept;
        dropped
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.position(path).is_some()
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.paths.iter().position(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }
}
