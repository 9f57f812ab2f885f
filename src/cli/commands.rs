use crate::core::file_selector::browse;
use crate::core::session::Session;
use crate::domain::models::{CombineOptions, ReadPolicy, ScanRules, display_path};
use crate::infra::clipboard::{Clipboard, SystemClipboard};
use crate::infra::file_system::count_lines;
use crate::infra::logger::setup_logger;
use crate::infra::output::{create_writer, report_warnings};
use crate::infra::settings::Settings;
use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "code-combiner")]
#[command(about = "Combine selected source files with path headers for pasting into an LLM chat", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Workspace root
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Comma-separated file extensions, e.g. ".py,.pyi"
    #[arg(long)]
    pub ext: Option<String>,

    /// Comma-separated file names never listed
    #[arg(long)]
    pub exclude_files: Option<String>,

    /// Comma-separated directory names never descended into
    #[arg(long)]
    pub exclude_dirs: Option<String>,

    /// Settings file (defaults to .codecombiner.toml in the workspace root)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    /// Files to include in output order, relative to the workspace root
    pub files: Vec<PathBuf>,

    /// Include every candidate file
    #[arg(long, conflicts_with = "files")]
    pub all: bool,

    /// Write to this file instead of the clipboard
    #[arg(long, conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Print to stdout instead of the clipboard
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List candidate files
    List {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show the line count of each file
        #[arg(long)]
        lines: bool,
    },
    /// Combine files with path headers and copy the result
    Combine {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        select: SelectArgs,

        /// Fail on the first unreadable file instead of skipping it
        #[arg(long)]
        strict: bool,
    },
    /// Copy the selected relative paths, one per line
    Paths {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        select: SelectArgs,
    },
    /// Copy one file with its header line
    Copy {
        #[command(flatten)]
        scan: ScanArgs,

        file: PathBuf,

        /// Write to this file instead of the clipboard
        #[arg(long, conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Print to stdout instead of the clipboard
        #[arg(long)]
        stdout: bool,
    },
    /// Pick, combine and edit files interactively
    Browse {
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Create an empty file in the workspace
    New {
        #[command(flatten)]
        scan: ScanArgs,

        file: PathBuf,
    },
    /// Move a file within the workspace
    Mv {
        #[command(flatten)]
        scan: ScanArgs,

        from: PathBuf,
        to: PathBuf,
    },
    /// Delete a file from the workspace
    Rm {
        #[command(flatten)]
        scan: ScanArgs,

        file: PathBuf,
    },
    /// Write the clipboard text into a file, adding its header line
    Paste {
        #[command(flatten)]
        scan: ScanArgs,

        file: PathBuf,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logger(cli.verbose)?;

    match cli.command {
        Commands::List { scan, lines } => {
            info!("Starting list command");
            let session = open_session(&scan, None)?;
            list_candidates(&session, lines)
        }
        Commands::Combine {
            scan,
            select,
            strict,
        } => {
            info!("Starting combine command");
            let policy = strict.then_some(ReadPolicy::Strict);
            let mut session = open_session(&scan, policy)?;
            apply_selection(&mut session, &select)?;
            let combined = session.combine()?;
            report_warnings(&combined.warnings)?;

            if combined.file_count == 0 {
                bail!("No readable files to combine");
            }
            create_writer(select.output, select.stdout).write(&combined.text)
        }
        Commands::Paths { scan, select } => {
            info!("Starting paths command");
            let mut session = open_session(&scan, None)?;
            apply_selection(&mut session, &select)?;
            create_writer(select.output, select.stdout).write(&session.selected_paths_text())
        }
        Commands::Copy {
            scan,
            file,
            output,
            stdout,
        } => {
            info!("Starting copy command");
            let session = open_session(&scan, None)?;
            let text = session.file_with_header(&file)?;
            create_writer(output, stdout).write(&text)
        }
        Commands::Browse { scan } => {
            info!("Starting browse command");
            let mut session = open_session(&scan, None)?;
            browse(&mut session, &mut SystemClipboard)
        }
        Commands::New { scan, file } => {
            let mut session = open_session(&scan, None)?;
            let created = session.create_file(&file)?;
            println!("Created {}", display_path(&created));
            Ok(())
        }
        Commands::Mv { scan, from, to } => {
            let mut session = open_session(&scan, None)?;
            let moved = session.move_file(&from, &to)?;
            println!("Moved {} to {}", from.display(), display_path(&moved));
            Ok(())
        }
        Commands::Rm { scan, file } => {
            let mut session = open_session(&scan, None)?;
            let deleted = session.delete_file(&file)?;
            println!("Deleted {}", display_path(&deleted));
            Ok(())
        }
        Commands::Paste { scan, file } => {
            let mut session = open_session(&scan, None)?;
            paste_from_clipboard(&mut session, &mut SystemClipboard, &file)
        }
    }
}

/// Defaults, then the settings file, then command-line flags.
pub fn build_config(
    scan: &ScanArgs,
    root: &Path,
    policy: Option<ReadPolicy>,
) -> anyhow::Result<(ScanRules, CombineOptions)> {
    let mut rules = ScanRules::default();
    let mut options = CombineOptions::default();
    Settings::load(root, scan.config.as_deref())?.apply(&mut rules, &mut options);

    if let Some(ext) = &scan.ext {
        rules.extensions = split_list(ext);
    }
    if let Some(files) = &scan.exclude_files {
        rules.excluded_files = split_list(files);
    }
    if let Some(dirs) = &scan.exclude_dirs {
        rules.excluded_dirs = split_list(dirs);
    }
    if let Some(policy) = policy {
        options.policy = policy;
    }
    debug!("Scan rules: {:?}", rules);
    debug!("Combine options: {:?}", options);
    Ok((rules, options))
}

fn open_session(scan: &ScanArgs, policy: Option<ReadPolicy>) -> anyhow::Result<Session> {
    let root = std::path::absolute(&scan.path)
        .with_context(|| format!("Invalid workspace path {}", scan.path.display()))?;
    let (rules, options) = build_config(scan, &root, policy)?;
    Ok(Session::open(&root, rules, options)?)
}

fn apply_selection(session: &mut Session, select: &SelectArgs) -> anyhow::Result<()> {
    if select.all {
        let added = session.select_all();
        info!("Selected all {} candidate files", added);
        return Ok(());
    }
    if select.files.is_empty() {
        bail!("Name the files to include, or pass --all");
    }
    for file in &select.files {
        match session.select(file) {
            Ok(true) => debug!("Selected {}", file.display()),
            Ok(false) => warn!("{} listed more than once", file.display()),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn list_candidates(session: &Session, lines: bool) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    for candidate in session.candidates() {
        let shown = display_path(&candidate.path);
        if lines {
            match count_lines(&session.root().join(&candidate.path)) {
                Ok(count) => writeln!(stdout, "{} ({} lines)", shown, count)?,
                Err(_) => writeln!(stdout, "{} (N/A lines)", shown)?,
            }
        } else {
            writeln!(stdout, "{}", shown)?;
        }
    }
    info!("Listed {} files", session.candidates().len());
    Ok(())
}

fn paste_from_clipboard(
    session: &mut Session,
    clipboard: &mut dyn Clipboard,
    file: &Path,
) -> anyhow::Result<()> {
    let text = clipboard.read_text()?;
    let written = session.paste_into(file, &text)?;
    println!("Pasted content to {}", display_path(&written));
    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::clipboard::testing::MemoryClipboard;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "code-combiner",
            "combine",
            "--path",
            "./src",
            "--ext",
            ".py",
            "--exclude-dirs",
            ".git",
            "--strict",
            "utils.py",
            "models.py",
        ])
        .unwrap();

        match cli.command {
            Commands::Combine {
                scan,
                select,
                strict,
            } => {
                assert_eq!(scan.path, PathBuf::from("./src"));
                assert_eq!(scan.ext.as_deref(), Some(".py"));
                assert_eq!(scan.exclude_dirs.as_deref(), Some(".git"));
                assert!(strict);
                assert_eq!(
                    select.files,
                    vec![PathBuf::from("utils.py"), PathBuf::from("models.py")]
                );
                assert!(!select.all);
            }
            _ => panic!("expected combine"),
        }
    }

    #[test]
    fn test_cli_rejects_all_with_files() {
        let result = Cli::try_parse_from(["code-combiner", "combine", "--all", "a.py"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_output_with_stdout() {
        let result =
            Cli::try_parse_from(["code-combiner", "paths", "--all", "--stdout", "--output", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_is_global() {
        let cli = Cli::try_parse_from(["code-combiner", "list", "-vv", "--lines"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_mv() {
        let cli = Cli::try_parse_from(["code-combiner", "mv", "a.py", "pkg/a.py"]).unwrap();
        match cli.command {
            Commands::Mv { scan, from, to } => {
                assert_eq!(scan.path, PathBuf::from("."));
                assert_eq!(from, PathBuf::from("a.py"));
                assert_eq!(to, PathBuf::from("pkg/a.py"));
            }
            _ => panic!("expected mv"),
        }
    }

    #[test]
    fn test_cli_copy_single_file() {
        let cli = Cli::try_parse_from(["code-combiner", "copy", "pkg/a.py", "--stdout"]).unwrap();
        match cli.command {
            Commands::Copy {
                file,
                output,
                stdout,
                ..
            } => {
                assert_eq!(file, PathBuf::from("pkg/a.py"));
                assert!(output.is_none());
                assert!(stdout);
            }
            _ => panic!("expected copy"),
        }
        assert!(Cli::try_parse_from(["code-combiner", "copy"]).is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" .py, .pyi ,,"), vec![".py", ".pyi"]);
        assert!(split_list("").is_empty());
    }

    fn scan_args(root: &Path) -> ScanArgs {
        ScanArgs {
            path: root.to_path_buf(),
            ext: None,
            exclude_files: None,
            exclude_dirs: None,
            config: None,
        }
    }

    #[test]
    fn test_flags_override_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".codecombiner.toml"),
            "extensions = [\".rs\"]\nexcluded_dirs = [\"target\"]\npolicy = \"strict\"\n",
        )
        .unwrap();
        let mut scan = scan_args(temp_dir.path());
        scan.ext = Some(".py,.pyi".to_string());

        let (rules, options) = build_config(&scan, temp_dir.path(), None).unwrap();

        assert_eq!(rules.extensions, vec![".py", ".pyi"]);
        assert_eq!(rules.excluded_dirs, vec!["target"]);
        assert_eq!(options.policy, ReadPolicy::Strict);
    }

    #[test]
    fn test_apply_selection_keeps_argument_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.py"), "").unwrap();
        fs::write(temp_dir.path().join("b.py"), "").unwrap();
        let mut session = open_session(&scan_args(temp_dir.path()), None).unwrap();
        let select = SelectArgs {
            files: vec![PathBuf::from("b.py"), PathBuf::from("a.py")],
            all: false,
            output: None,
            stdout: true,
        };

        apply_selection(&mut session, &select).unwrap();

        assert_eq!(session.selected_paths_text(), "b.py\na.py");
    }

    #[test]
    fn test_apply_selection_requires_files_or_all() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = open_session(&scan_args(temp_dir.path()), None).unwrap();
        let select = SelectArgs {
            files: Vec::new(),
            all: false,
            output: None,
            stdout: false,
        };

        assert!(apply_selection(&mut session, &select).is_err());
    }

    #[test]
    fn test_paste_from_clipboard() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = open_session(&scan_args(temp_dir.path()), None).unwrap();
        let mut clipboard = MemoryClipboard::with_text("print('hi')\n");

        paste_from_clipboard(&mut session, &mut clipboard, Path::new("hello.py")).unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("hello.py")).unwrap(),
            "# hello.py\nprint('hi')\n"
        );
    }

    #[test]
    fn test_paste_from_unavailable_clipboard_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = open_session(&scan_args(temp_dir.path()), None).unwrap();
        let mut clipboard = MemoryClipboard::broken();

        assert!(paste_from_clipboard(&mut session, &mut clipboard, Path::new("x.py")).is_err());
        assert!(!temp_dir.path().join("x.py").exists());
    }
}
