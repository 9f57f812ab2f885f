use crate::domain::models::CombineWarning;
use crate::infra::clipboard::{Clipboard, SystemClipboard};
use crossterm::{
    ExecutableCommand,
    style::{Color, ResetColor, SetForegroundColor},
};
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

const PREVIEW_LENGTH: usize = 200;

pub trait OutputWriter {
    fn write(&mut self, content: &str) -> anyhow::Result<()>;
}

pub struct FileWriter {
    path: PathBuf,
}

impl FileWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl OutputWriter for FileWriter {
    fn write(&mut self, content: &str) -> anyhow::Result<()> {
        debug!("Writing output to file: {}", self.path.display());
        fs::write(&self.path, content)?;
        info!("Output written to file: {}", self.path.display());
        Ok(())
    }
}

pub struct ConsoleWriter;

impl OutputWriter for ConsoleWriter {
    fn write(&mut self, content: &str) -> anyhow::Result<()> {
        debug!("Writing output to console");
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

pub struct ClipboardWriter<C: Clipboard> {
    clipboard: C,
}

impl<C: Clipboard> ClipboardWriter<C> {
    pub fn new(clipboard: C) -> Self {
        Self { clipboard }
    }
}

impl<C: Clipboard> OutputWriter for ClipboardWriter<C> {
    fn write(&mut self, content: &str) -> anyhow::Result<()> {
        debug!("Writing output to clipboard");
        self.clipboard.write_text(content)?;

        let mut stdout = io::stdout();
        stdout.execute(SetForegroundColor(Color::Green))?;
        writeln!(stdout, "📋 Copied to clipboard ({} bytes)", content.len())?;
        stdout.execute(ResetColor)?;
        writeln!(stdout, "\nPreview of copied content:\n")?;
        writeln!(stdout, "{}", preview(content, PREVIEW_LENGTH))?;
        Ok(())
    }
}

pub fn create_writer(output_path: Option<PathBuf>, to_stdout: bool) -> Box<dyn OutputWriter> {
    if to_stdout {
        return Box::new(ConsoleWriter);
    }

    match output_path {
        Some(path) => Box::new(FileWriter::new(path)),
        None => Box::new(ClipboardWriter::new(SystemClipboard)),
    }
}

/// Cuts at a character boundary so multi-byte text stays intact.
pub fn preview(content: &str, length: usize) -> String {
    if content.chars().count() > length {
        let safe_substring: String = content.chars().take(length).collect();
        format!("{}...", safe_substring)
    } else {
        content.to_string()
    }
}

pub fn report_warnings(warnings: &[CombineWarning]) -> io::Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }

    let mut stderr = io::stderr();
    stderr.execute(SetForegroundColor(Color::Yellow))?;
    for warning in warnings {
        writeln!(stderr, "⚠ Skipped {}: {}", warning.path.display(), warning.error)?;
    }
    writeln!(stderr, "⚠ {} file(s) skipped", warnings.len())?;
    stderr.execute(ResetColor)?;
    Ok(())
}
