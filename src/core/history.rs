use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

pub const MAX_VERSIONS_PER_FILE: usize = 5;

/// Previous contents of files, captured byte for byte before paste or delete
/// overwrote them.
#[derive(Debug, Default)]
pub struct VersionHistory {
    versions: HashMap<PathBuf, VecDeque<Vec<u8>>>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: &Path, content: Vec<u8>) {
        let stack = self.versions.entry(path.to_path_buf()).or_default();
        stack.push_back(content);
        while stack.len() > MAX_VERSIONS_PER_FILE {
            stack.pop_front();
        }
    }

    pub fn latest(&self, path: &Path) -> Option<&[u8]> {
        self.versions
            .get(path)
            .and_then(|stack| stack.back())
            .map(Vec::as_slice)
    }

    pub fn pop(&mut self, path: &Path) -> Option<Vec<u8>> {
        let stack = self.versions.get_mut(path)?;
        let content = stack.pop_back();
        if stack.is_empty() {
            self.versions.remove(path);
        }
        content
    }

    pub fn depth(&self, path: &Path) -> usize {
        self.versions.get(path).map_or(0, VecDeque::len)
    }

    pub fn rename(&mut self, from: &Path, to: &Path) {
        if let Some(stack) = self.versions.remove(from) {
            self.versions.insert(to.to_path_buf(), stack);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_returns_newest_first() {
        let mut history = VersionHistory::new();
        let path = Path::new("a.py");
        history.record(path, b"v1".to_vec());
        history.record(path, b"v2".to_vec());

        assert_eq!(history.latest(path), Some(&b"v2"[..]));
        assert_eq!(history.pop(path).as_deref(), Some(&b"v2"[..]));
        assert_eq!(history.pop(path).as_deref(), Some(&b"v1"[..]));
        assert_eq!(history.pop(path), None);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = VersionHistory::new();
        let path = Path::new("a.py");
        for i in 0..8 {
            history.record(path, format!("v{i}").into_bytes());
        }

        assert_eq!(history.depth(path), MAX_VERSIONS_PER_FILE);
        let mut popped = Vec::new();
        while let Some(v) = history.pop(path) {
            popped.push(String::from_utf8(v).unwrap());
        }
        assert_eq!(popped, vec!["v7", "v6", "v5", "v4", "v3"]);
    }

    #[test]
    fn test_rename_moves_versions() {
        let mut history = VersionHistory::new();
        history.record(Path::new("old.py"), b"content".to_vec());
        history.rename(Path::new("old.py"), Path::new("new.py"));

        assert_eq!(history.depth(Path::new("old.py")), 0);
        assert_eq!(history.latest(Path::new("new.py")), Some(&b"content"[..]));
    }
}
