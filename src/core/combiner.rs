use crate::domain::errors::CombinerError;
use crate::domain::models::{CombineOptions, CombineWarning, Combined, ReadPolicy, display_path};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

pub fn combine(
    root: &Path,
    selection: &[PathBuf],
    options: &CombineOptions,
    file_reader: impl Fn(&Path) -> Result<String, CombinerError>,
) -> Result<Combined, CombinerError> {
    debug!("Combining {} selected files", selection.len());
    let mut combined = Combined::default();

    for path in selection {
        let content = match file_reader(&root.join(path)) {
            Ok(content) => content,
            Err(e) if options.policy == ReadPolicy::Lenient => {
                warn!("Skipping {}: {}", display_path(path), e);
                combined.warnings.push(CombineWarning {
                    path: path.clone(),
                    error: e,
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        let block = format_block(options, path, &content);
        debug!("Adding {} ({} bytes)", display_path(path), content.len());
        combined.text.push_str(&block);
        combined.file_count += 1;
    }

    combined.line_count = combined.text.lines().count();
    info!(
        "Combined {} files ({} lines), {} skipped",
        combined.file_count,
        combined.line_count,
        combined.warnings.len()
    );
    Ok(combined)
}

/// One header line, the verbatim content, then a blank separator line.
pub fn format_block(options: &CombineOptions, path: &Path, content: &str) -> String {
    let header = options.header_for(path);
    let mut block = String::with_capacity(header.len() + content.len() + 3);

    let already_headed = options.skip_duplicate_header && starts_with_header(&header, content);
    if !already_headed {
        block.push_str(&header);
        block.push('\n');
    }

    block.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        block.push('\n');
    }
    block.push('\n');
    block
}

/// The file as it would be pasted elsewhere: the header line first, added only
/// when the content does not already open with it.
pub fn with_header(options: &CombineOptions, path: &Path, content: &str) -> String {
    let header = options.header_for(path);
    if starts_with_header(&header, content) {
        content.to_string()
    } else {
        format!("{header}\n{content}")
    }
}

fn starts_with_header(header: &str, content: &str) -> bool {
    content
        .lines()
        .next()
        .is_some_and(|first| first.trim() == header.trim())
}

pub fn paths_text<'a>(selection: impl IntoIterator<Item = &'a Path>) -> String {
    selection
        .into_iter()
        .map(display_path)
        .collect::<Vec<_>>()
        .join("\n")
}
