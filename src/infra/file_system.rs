use crate::domain::errors::CombinerError;
use crate::domain::models::{Candidate, ScanRules, display_path};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, BufRead};
use std::path::{Component, Path, PathBuf};

pub fn validate_root(root: &Path) -> Result<PathBuf, CombinerError> {
    let unreadable = |reason: String| CombinerError::DirectoryUnreadable {
        path: root.to_path_buf(),
        reason,
    };

    let canonical = fs::canonicalize(root).map_err(|e| unreadable(e.to_string()))?;
    if !canonical.is_dir() {
        return Err(unreadable("not a directory".to_string()));
    }
    fs::read_dir(&canonical).map_err(|e| unreadable(e.to_string()))?;
    Ok(canonical)
}

pub fn scan_candidates(root: &Path, rules: &ScanRules) -> Result<Vec<Candidate>, CombinerError> {
    info!("Scanning for candidate files in: {}", root.display());
    debug!("Extensions: {:?}", rules.extensions);
    debug!("Excluded files: {:?}", rules.excluded_files);
    debug!("Excluded dirs: {:?}", rules.excluded_dirs);

    let root = validate_root(root)?;
    let mut result = Vec::new();

    let walker = walkdir::WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let pruned = rules.is_excluded_dir(&e.file_name().to_string_lossy());
            if pruned {
                debug!("Pruning excluded directory: {}", e.path().display());
            }
            !pruned
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(CombinerError::DirectoryUnreadable {
                    path: root.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if !rules.matches_extension(path) || rules.is_excluded_file(&name) {
            continue;
        }

        let Ok(relative) = path.strip_prefix(&root) else {
            continue;
        };
        debug!("Found candidate file: {}", relative.display());
        let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
        result.push(Candidate {
            path: relative.to_path_buf(),
            modified,
        });
    }

    result.sort_by_cached_key(|c| display_path(&c.path));
    info!("Found {} candidate files", result.len());
    Ok(result)
}

pub fn read_file_text(path: &Path) -> Result<String, CombinerError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CombinerError::FileMissing(path.to_path_buf()));
        }
        Err(e) => {
            return Err(CombinerError::FileUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };
    if !metadata.is_file() {
        return Err(CombinerError::FileUnreadable {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    debug!("Reading file contents: {}", path.display());
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CombinerError::FileMissing(path.to_path_buf()),
        _ => CombinerError::FileUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;
    let contents = String::from_utf8(bytes).map_err(|_| CombinerError::FileUnreadable {
        path: path.to_path_buf(),
        reason: "not valid UTF-8 text".to_string(),
    })?;
    debug!("Read {} bytes from file", contents.len());
    Ok(contents)
}

/// Raw contents, for snapshots that must survive any encoding.
pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>, CombinerError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CombinerError::FileMissing(path.to_path_buf()),
        _ => CombinerError::io(path, e),
    })
}

pub fn count_lines(path: &Path) -> Result<usize, CombinerError> {
    let file = fs::File::open(path).map_err(|e| CombinerError::io(path, e))?;
    let mut count = 0;
    for line in io::BufReader::new(file).lines() {
        line.map_err(|e| CombinerError::FileUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        count += 1;
    }
    Ok(count)
}

/// Maps a user-supplied path onto a normalized path relative to `root`,
/// rejecting anything that would land outside of it.
pub fn resolve_in_workspace(root: &Path, path: &Path) -> Result<PathBuf, CombinerError> {
    let outside = || CombinerError::PathOutsideWorkspace(path.to_path_buf());

    let relative = if path.is_absolute() {
        path.strip_prefix(root).map_err(|_| outside())?
    } else {
        path
    };

    let mut normalized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(outside());
                }
            }
            Component::Normal(part) => normalized.push(part),
            Component::RootDir | Component::Prefix(_) => return Err(outside()),
        }
    }
    if normalized.as_os_str().is_empty() {
        return Err(outside());
    }

    // Every existing link along the way must resolve inside the root.
    // A dangling link counts as outside, since writing through it creates its target.
    let canonical_root = fs::canonicalize(root).map_err(|e| CombinerError::io(root, e))?;
    let mut current = root.to_path_buf();
    for part in normalized.components() {
        current.push(part);
        let Ok(metadata) = fs::symlink_metadata(&current) else {
            break;
        };
        if metadata.file_type().is_symlink() {
            match fs::canonicalize(&current) {
                Ok(target) if target.starts_with(&canonical_root) => {}
                _ => return Err(outside()),
            }
        }
    }

    Ok(normalized)
}

pub fn create_empty_file(path: &Path) -> Result<(), CombinerError> {
    ensure_parent(path)?;
    match fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => {
            info!("Created file: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(CombinerError::AlreadyExists(path.to_path_buf()))
        }
        Err(e) => Err(CombinerError::io(path, e)),
    }
}

pub fn rename_file(from: &Path, to: &Path) -> Result<(), CombinerError> {
    if !from.is_file() {
        return Err(CombinerError::FileMissing(from.to_path_buf()));
    }
    if to.exists() {
        return Err(CombinerError::AlreadyExists(to.to_path_buf()));
    }
    ensure_parent(to)?;
    fs::rename(from, to).map_err(|e| CombinerError::io(from, e))?;
    info!("Moved {} to {}", from.display(), to.display());
    Ok(())
}

pub fn remove_file(path: &Path) -> Result<(), CombinerError> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("Deleted file: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(CombinerError::FileMissing(path.to_path_buf()))
        }
        Err(e) => Err(CombinerError::io(path, e)),
    }
}

pub fn write_file(path: &Path, content: &[u8]) -> Result<(), CombinerError> {
    ensure_parent(path)?;
    fs::write(path, content).map_err(|e| CombinerError::io(path, e))?;
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), CombinerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| CombinerError::io(parent, e))?;
        }
    }
    Ok(())
}
