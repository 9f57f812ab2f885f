use crate::core::session::Session;
use crate::domain::errors::CombinerError;
use crate::domain::models::display_path;
use crate::infra::clipboard::Clipboard;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
    time::Duration,
};

// Tree node representation to store directory structure
enum TreeNode {
    Directory {
        name: String,
        path: PathBuf,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: PathBuf,
    },
}

impl TreeNode {
    fn new_directory(name: String, path: PathBuf) -> Self {
        TreeNode::Directory {
            name,
            path,
            children: Vec::new(),
        }
    }

    fn from_paths<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Self {
        let mut root = TreeNode::new_directory(String::new(), PathBuf::new());
        for path in paths {
            root.insert(path);
        }
        root
    }

    fn insert(&mut self, path: &Path) {
        let components: Vec<String> = path
            .components()
            .map(|comp| comp.as_os_str().to_string_lossy().to_string())
            .collect();
        let Some((file_name, dirs)) = components.split_last() else {
            return;
        };

        let mut current = self;
        let mut dir_path = PathBuf::new();
        for dir_name in dirs {
            dir_path.push(dir_name);
            let TreeNode::Directory { children, .. } = current else {
                return;
            };
            let pos = children.iter().position(|child| {
                matches!(child, TreeNode::Directory { name, .. } if name == dir_name)
            });
            let pos = match pos {
                Some(pos) => pos,
                None => {
                    children.push(TreeNode::new_directory(dir_name.clone(), dir_path.clone()));
                    children.len() - 1
                }
            };
            current = &mut children[pos];
        }

        if let TreeNode::Directory { children, .. } = current {
            children.push(TreeNode::File {
                name: file_name.clone(),
                path: path.to_path_buf(),
            });
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Row {
    Directory {
        name: String,
        path: PathBuf,
        expanded: bool,
    },
    File {
        name: String,
        path: PathBuf,
    },
}

impl Row {
    fn path(&self) -> &Path {
        match self {
            Row::Directory { path, .. } | Row::File { path, .. } => path,
        }
    }
}

struct FlattenedTree {
    rows: Vec<(Row, usize)>,
    state: ListState,
}

impl FlattenedTree {
    fn from_tree(root: &TreeNode, collapsed: &HashSet<PathBuf>) -> Self {
        let mut flattened = FlattenedTree {
            rows: Vec::new(),
            state: ListState::default(),
        };
        if let TreeNode::Directory { children, .. } = root {
            for child in children {
                flattened.flatten_node(child, 0, collapsed);
            }
        }
        if !flattened.rows.is_empty() {
            flattened.state.select(Some(0));
        }
        flattened
    }

    fn flatten_node(&mut self, node: &TreeNode, depth: usize, collapsed: &HashSet<PathBuf>) {
        match node {
            TreeNode::Directory {
                name,
                path,
                children,
            } => {
                let expanded = !collapsed.contains(path);
                self.rows.push((
                    Row::Directory {
                        name: name.clone(),
                        path: path.clone(),
                        expanded,
                    },
                    depth,
                ));
                if expanded {
                    for child in children {
                        self.flatten_node(child, depth + 1, collapsed);
                    }
                }
            }
            TreeNode::File { name, path } => {
                self.rows.push((
                    Row::File {
                        name: name.clone(),
                        path: path.clone(),
                    },
                    depth,
                ));
            }
        }
    }

    fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn highlighted(&self) -> Option<&Row> {
        self.state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|(row, _)| row)
    }

    fn highlight_path(&mut self, path: &Path) -> bool {
        match self.rows.iter().position(|(row, _)| row.path() == path) {
            Some(i) => {
                self.state.select(Some(i));
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Success,
    Warning,
    Failure,
}

impl StatusKind {
    fn color(self) -> Color {
        match self {
            StatusKind::Info => Color::Gray,
            StatusKind::Success => Color::Green,
            StatusKind::Warning => Color::Yellow,
            StatusKind::Failure => Color::Red,
        }
    }
}

struct App<'a> {
    session: &'a mut Session,
    clipboard: &'a mut dyn Clipboard,
    flattened_tree: FlattenedTree,
    collapsed: HashSet<PathBuf>,
    status: (StatusKind, String),
    pending_delete: Option<PathBuf>,
    title: String,
    help_message: String,
}

impl<'a> App<'a> {
    fn new(session: &'a mut Session, clipboard: &'a mut dyn Clipboard) -> App<'a> {
        let title = format!("Workspace: {}", session.root().display());
        let collapsed = HashSet::new();
        let tree = TreeNode::from_paths(session.candidates().iter().map(|c| c.path.as_path()));
        let flattened_tree = FlattenedTree::from_tree(&tree, &collapsed);
        let status = (
            StatusKind::Info,
            format!("{} candidate files", session.candidates().len()),
        );

        App {
            session,
            clipboard,
            flattened_tree,
            collapsed,
            status,
            pending_delete: None,
            title,
            help_message: String::from(
                "↑/↓: Navigate | →/←: Expand/Collapse | Space: Toggle | a/n: All/None | t: To top | Enter: Copy combined | c: Copy paths | y: Copy file | p: Paste | u: Restore | dd: Delete | U: Undelete | r: Refresh | q: Quit",
            ),
        }
    }

    fn rebuild(&mut self) {
        let anchor = self.flattened_tree.highlighted().map(|row| row.path().to_path_buf());
        let previous_index = self.flattened_tree.state.selected();

        let tree =
            TreeNode::from_paths(self.session.candidates().iter().map(|c| c.path.as_path()));
        self.flattened_tree = FlattenedTree::from_tree(&tree, &self.collapsed);

        let restored = anchor
            .as_deref()
            .is_some_and(|path| self.flattened_tree.highlight_path(path));
        if !restored && !self.flattened_tree.rows.is_empty() {
            let idx = previous_index
                .unwrap_or(0)
                .min(self.flattened_tree.rows.len() - 1);
            self.flattened_tree.state.select(Some(idx));
        }
    }

    fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.status = (kind, message.into());
    }

    fn report_error(&mut self, error: CombinerError) {
        warn!("{}", error);
        self.set_status(StatusKind::Failure, error.to_string());
    }

    fn highlighted_file(&self) -> Option<PathBuf> {
        match self.flattened_tree.highlighted() {
            Some(Row::File { path, .. }) => Some(path.clone()),
            _ => None,
        }
    }

    fn highlighted_directory(&self) -> Option<(PathBuf, bool)> {
        match self.flattened_tree.highlighted() {
            Some(Row::Directory { path, expanded, .. }) => Some((path.clone(), *expanded)),
            _ => None,
        }
    }

    fn selected_files_count(&self) -> usize {
        self.session.selection().len()
    }

    /// Returns true when the browser should close.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let confirming_delete = key.code == KeyCode::Char('d');
        if !confirming_delete {
            self.pending_delete = None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down => self.flattened_tree.next(),
            KeyCode::Up => self.flattened_tree.previous(),
            KeyCode::Right => self.set_expanded(true),
            KeyCode::Left => self.set_expanded(false),
            KeyCode::Char(' ') => self.toggle_highlighted(),
            KeyCode::Char('a') => {
                let added = self.session.select_all();
                self.set_status(StatusKind::Info, format!("Selected all files ({added} added)"));
            }
            KeyCode::Char('n') => {
                self.session.deselect_all();
                self.set_status(StatusKind::Info, "Deselected all files");
            }
            KeyCode::Char('t') => self.move_highlighted_to_front(),
            KeyCode::Enter => self.copy_combined(),
            KeyCode::Char('c') => self.copy_paths(),
            KeyCode::Char('y') => self.copy_highlighted_file(),
            KeyCode::Char('p') => self.paste_into_highlighted(),
            KeyCode::Char('u') => self.restore_highlighted(),
            KeyCode::Char('U') => self.restore_last_deleted(),
            KeyCode::Char('d') => self.delete_highlighted(),
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
        false
    }

    fn set_expanded(&mut self, expand: bool) {
        let Some((path, expanded)) = self.highlighted_directory() else {
            return;
        };
        if expanded == expand {
            return;
        }
        if expand {
            self.collapsed.remove(&path);
        } else {
            self.collapsed.insert(path);
        }
        self.rebuild();
    }

    fn toggle_highlighted(&mut self) {
        let Some(path) = self.highlighted_file() else {
            return;
        };
        match self.session.toggle(&path) {
            Ok(true) => debug!("Selected {}", path.display()),
            Ok(false) => debug!("Deselected {}", path.display()),
            Err(e) => self.report_error(e),
        }
    }

    fn move_highlighted_to_front(&mut self) {
        let Some(path) = self.highlighted_file() else {
            return;
        };
        if self.session.move_to_front(&path) {
            self.set_status(
                StatusKind::Info,
                format!("Moved {} to the top of the selection", display_path(&path)),
            );
        } else {
            self.set_status(StatusKind::Warning, "Only selected files can be moved to the top");
        }
    }

    fn copy_combined(&mut self) {
        if self.session.selection().is_empty() {
            self.set_status(StatusKind::Warning, "No files selected to combine");
            return;
        }
        let combined = match self.session.combine() {
            Ok(combined) => combined,
            Err(e) => return self.report_error(e),
        };
        if let Err(e) = self.clipboard.write_text(&combined.text) {
            return self.report_error(e);
        }

        let summary = format!(
            "Copied combined code from {} files ({} lines) to clipboard",
            combined.file_count, combined.line_count
        );
        info!("{}", summary);
        match combined.warnings.first() {
            None => self.set_status(StatusKind::Success, summary),
            Some(first) => self.set_status(
                StatusKind::Warning,
                format!(
                    "{summary}; skipped {}: {}",
                    combined.warnings.len(),
                    first.error
                ),
            ),
        }
    }

    fn copy_paths(&mut self) {
        if self.session.selection().is_empty() {
            self.set_status(StatusKind::Warning, "No files selected to copy paths");
            return;
        }
        let text = self.session.selected_paths_text();
        match self.clipboard.write_text(&text) {
            Ok(()) => self.set_status(
                StatusKind::Success,
                format!("Copied {} file paths to clipboard", self.selected_files_count()),
            ),
            Err(e) => self.report_error(e),
        }
    }

    fn copy_highlighted_file(&mut self) {
        let Some(path) = self.highlighted_file() else {
            return;
        };
        let text = match self.session.file_with_header(&path) {
            Ok(text) => text,
            Err(e) => return self.report_error(e),
        };
        match self.clipboard.write_text(&text) {
            Ok(()) => self.set_status(
                StatusKind::Success,
                format!(
                    "Copied {} ({} lines) to clipboard",
                    display_path(&path),
                    text.lines().count()
                ),
            ),
            Err(e) => self.report_error(e),
        }
    }

    fn paste_into_highlighted(&mut self) {
        let Some(path) = self.highlighted_file() else {
            return;
        };
        let text = match self.clipboard.read_text() {
            Ok(text) => text,
            Err(e) => return self.report_error(e),
        };
        match self.session.paste_into(&path, &text) {
            Ok(path) => {
                self.rebuild();
                self.set_status(
                    StatusKind::Success,
                    format!("Pasted content to {}", display_path(&path)),
                );
            }
            Err(CombinerError::EmptyClipboard) => self.set_status(
                StatusKind::Warning,
                CombinerError::EmptyClipboard.to_string(),
            ),
            Err(e) => self.report_error(e),
        }
    }

    fn restore_highlighted(&mut self) {
        let Some(path) = self.highlighted_file() else {
            return;
        };
        match self.session.restore_file(&path) {
            Ok(path) => {
                self.rebuild();
                let left = self.session.history_depth(&path);
                self.set_status(
                    StatusKind::Success,
                    format!(
                        "Reverted {} to previous version ({} older left)",
                        display_path(&path),
                        left
                    ),
                );
            }
            Err(e @ CombinerError::NoPreviousVersion(_)) => {
                self.set_status(StatusKind::Warning, e.to_string())
            }
            Err(e) => self.report_error(e),
        }
    }

    fn restore_last_deleted(&mut self) {
        match self.session.restore_last_deleted() {
            Ok(path) => {
                self.rebuild();
                self.flattened_tree.highlight_path(&path);
                self.set_status(
                    StatusKind::Success,
                    format!("Restored deleted file {}", display_path(&path)),
                );
            }
            Err(e @ CombinerError::NothingToRestore) => {
                self.set_status(StatusKind::Warning, e.to_string())
            }
            Err(e) => self.report_error(e),
        }
    }

    fn delete_highlighted(&mut self) {
        let Some(path) = self.highlighted_file() else {
            self.pending_delete = None;
            return;
        };
        if self.pending_delete.as_deref() != Some(path.as_path()) {
            self.set_status(
                StatusKind::Warning,
                format!("Press d again to delete {}", display_path(&path)),
            );
            self.pending_delete = Some(path);
            return;
        }

        self.pending_delete = None;
        match self.session.delete_file(&path) {
            Ok(path) => {
                self.rebuild();
                self.set_status(
                    StatusKind::Success,
                    format!("Deleted {} (U restores it while this session lasts)", display_path(&path)),
                );
            }
            Err(e) => self.report_error(e),
        }
    }

    fn refresh(&mut self) {
        match self.session.refresh() {
            Ok(report) => {
                self.rebuild();
                let message = if report.is_unchanged() {
                    "Directory rescanned, nothing changed".to_string()
                } else {
                    format!(
                        "Directory rescanned: {} added, {} removed, {} modified",
                        report.added.len(),
                        report.removed.len(),
                        report.modified.len()
                    )
                };
                self.set_status(StatusKind::Info, message);
            }
            Err(e) => self.report_error(e),
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    // Title
    let title = Paragraph::new(Span::styled(
        app.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    f.render_widget(title, chunks[0]);

    // Files and directories tree
    let selected_style = Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let selection = app.session.selection();
    let items: Vec<ListItem> = app
        .flattened_tree
        .rows
        .iter()
        .map(|(row, depth)| {
            let indent = "  ".repeat(*depth);
            let (content, style) = match row {
                Row::Directory { name, expanded, .. } => {
                    let prefix = if *expanded { "▼ " } else { "► " };
                    (
                        format!("{}{}{}/", indent, prefix, name),
                        Style::default().fg(Color::Blue),
                    )
                }
                Row::File { name, path } => match selection.position(path) {
                    Some(order) => (
                        format!("{}[{}] {}", indent, order + 1, name),
                        Style::default().fg(Color::Green),
                    ),
                    None => (format!("{}[ ] {}", indent, name), Style::default()),
                },
            };
            ListItem::new(Span::styled(content, style))
        })
        .collect();

    let file_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Files ({} selected of {})",
            selection.len(),
            app.session.candidates().len()
        )))
        .highlight_style(selected_style);

    f.render_stateful_widget(file_list, chunks[1], &mut app.flattened_tree.state);

    let (kind, message) = &app.status;
    let status = Paragraph::new(Span::styled(
        message.clone(),
        Style::default().fg(kind.color()),
    ));
    f.render_widget(status, chunks[2]);

    // Controls help
    let controls = Paragraph::new(Span::styled(
        app.help_message.clone(),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(controls, chunks[3]);
}

pub fn browse(session: &mut Session, clipboard: &mut dyn Clipboard) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, clipboard);
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("Browser closed with {} files selected", app.selected_files_count());
    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if crossterm::event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CombineOptions, ScanRules};
    use crate::infra::clipboard::testing::MemoryClipboard;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(files: &[(&str, &str)]) -> (TempDir, Session) {
        let temp_dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = temp_dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let session = Session::open(
            temp_dir.path(),
            ScanRules::default(),
            CombineOptions::default(),
        )
        .unwrap();
        (temp_dir, session)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn goto(app: &mut App, path: &str) {
        assert!(app.flattened_tree.highlight_path(Path::new(path)), "{path} not shown");
    }

    #[test]
    fn test_tree_structure() {
        let files = vec![
            PathBuf::from("src/main.py"),
            PathBuf::from("src/lib.py"),
            PathBuf::from("src/utils/helper.py"),
        ];

        let tree = TreeNode::from_paths(files.iter().map(PathBuf::as_path));

        let TreeNode::Directory { children, .. } = &tree else {
            panic!("root must be a directory");
        };
        assert_eq!(children.len(), 1);
        let TreeNode::Directory { name, children, .. } = &children[0] else {
            panic!("src must be a directory");
        };
        assert_eq!(name, "src");
        assert_eq!(children.len(), 3);

        let utils_dir = children.iter().find_map(|node| match node {
            TreeNode::Directory { name, path, children } if name == "utils" => Some((path, children)),
            _ => None,
        });
        let (path, children) = utils_dir.expect("utils directory");
        assert_eq!(path, &PathBuf::from("src/utils"));
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn test_collapse_hides_children() {
        let (_dir, mut session) = workspace(&[("pkg/a.py", ""), ("pkg/b.py", ""), ("top.py", "")]);
        let mut clipboard = MemoryClipboard::default();
        let mut app = App::new(&mut session, &mut clipboard);
        assert_eq!(app.flattened_tree.rows.len(), 4);

        goto(&mut app, "pkg");
        press(&mut app, KeyCode::Left);
        assert_eq!(app.flattened_tree.rows.len(), 2);
        assert_eq!(app.flattened_tree.highlighted().unwrap().path(), Path::new("pkg"));

        press(&mut app, KeyCode::Right);
        assert_eq!(app.flattened_tree.rows.len(), 4);
    }

    #[test]
    fn test_navigation_wraps() {
        let (_dir, mut session) = workspace(&[("a.py", ""), ("b.py", "")]);
        let mut clipboard = MemoryClipboard::default();
        let mut app = App::new(&mut session, &mut clipboard);

        press(&mut app, KeyCode::Up);
        assert_eq!(app.flattened_tree.state.selected(), Some(1));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.flattened_tree.state.selected(), Some(0));
    }

    #[test]
    fn test_toggle_and_copy_combined() {
        let (_dir, mut session) = workspace(&[
            ("utils.py", "def add(x,y):\n    return x+y\n"),
            ("models.py", "class User:\n    pass\n"),
        ]);
        let mut clipboard = MemoryClipboard::default();
        {
            let mut app = App::new(&mut session, &mut clipboard);
            goto(&mut app, "utils.py");
            press(&mut app, KeyCode::Char(' '));
            goto(&mut app, "models.py");
            press(&mut app, KeyCode::Char(' '));
            press(&mut app, KeyCode::Enter);
            assert_eq!(app.status.0, StatusKind::Success);
        }

        assert_eq!(
            clipboard.contents.as_deref(),
            Some("# utils.py\ndef add(x,y):\n    return x+y\n\n# models.py\nclass User:\n    pass\n\n")
        );
    }

    #[test]
    fn test_copy_with_empty_selection_warns() {
        let (_dir, mut session) = workspace(&[("a.py", "")]);
        let mut clipboard = MemoryClipboard::default();
        let mut app = App::new(&mut session, &mut clipboard);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status.0, StatusKind::Warning);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.status.0, StatusKind::Warning);
        assert!(app.clipboard.read_text().unwrap().is_empty());
    }

    #[test]
    fn test_clipboard_failure_keeps_selection() {
        let (_dir, mut session) = workspace(&[("a.py", "x\n")]);
        let mut clipboard = MemoryClipboard::broken();
        let mut app = App::new(&mut session, &mut clipboard);

        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.status.0, StatusKind::Failure);
        assert_eq!(app.selected_files_count(), 1);
    }

    #[test]
    fn test_copy_paths_in_selection_order() {
        let (_dir, mut session) = workspace(&[("a.py", ""), ("pkg/b.py", "")]);
        let mut clipboard = MemoryClipboard::default();
        {
            let mut app = App::new(&mut session, &mut clipboard);
            press(&mut app, KeyCode::Char('a'));
            goto(&mut app, "pkg/b.py");
            press(&mut app, KeyCode::Char('t'));
            press(&mut app, KeyCode::Char('c'));
        }
        assert_eq!(clipboard.contents.as_deref(), Some("pkg/b.py\na.py"));
    }

    #[test]
    fn test_delete_needs_confirmation_and_can_be_restored() {
        let (dir, mut session) = workspace(&[("a.py", "keep\n"), ("b.py", "")]);
        let mut clipboard = MemoryClipboard::default();
        let mut app = App::new(&mut session, &mut clipboard);

        goto(&mut app, "a.py");
        press(&mut app, KeyCode::Char('d'));
        assert!(dir.path().join("a.py").exists());
        press(&mut app, KeyCode::Down);
        goto(&mut app, "a.py");
        press(&mut app, KeyCode::Char('d'));
        assert!(dir.path().join("a.py").exists());
        press(&mut app, KeyCode::Char('d'));
        assert!(!dir.path().join("a.py").exists());
        assert!(!app.flattened_tree.highlight_path(Path::new("a.py")));
        assert!(app.status.1.contains("U restores"));

        for _ in 0..app.flattened_tree.rows.len() {
            press(&mut app, KeyCode::Char('u'));
            press(&mut app, KeyCode::Down);
        }
        assert!(!dir.path().join("a.py").exists());

        press(&mut app, KeyCode::Char('U'));
        assert_eq!(app.status.0, StatusKind::Success);
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "keep\n");
        assert_eq!(app.flattened_tree.highlighted().unwrap().path(), Path::new("a.py"));

        press(&mut app, KeyCode::Char('U'));
        assert_eq!(app.status.0, StatusKind::Warning);
    }

    #[test]
    fn test_copy_single_file_with_header() {
        let (_dir, mut session) = workspace(&[("pkg/a.py", "x = 1\n"), ("b.py", "")]);
        let mut clipboard = MemoryClipboard::default();
        {
            let mut app = App::new(&mut session, &mut clipboard);
            goto(&mut app, "pkg/a.py");
            press(&mut app, KeyCode::Char('y'));
            assert_eq!(app.status.0, StatusKind::Success);
            assert!(app.session.selection().is_empty());
        }
        assert_eq!(clipboard.contents.as_deref(), Some("# pkg/a.py\nx = 1\n"));
    }

    #[test]
    fn test_paste_and_restore_highlighted() {
        let (dir, mut session) = workspace(&[("a.py", "old\n")]);
        let mut clipboard = MemoryClipboard::with_text("new = 1\n");
        let mut app = App::new(&mut session, &mut clipboard);

        goto(&mut app, "a.py");
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(
            fs::read_to_string(dir.path().join("a.py")).unwrap(),
            "# a.py\nnew = 1\n"
        );

        press(&mut app, KeyCode::Char('u'));
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "old\n");

        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.status.0, StatusKind::Warning);
    }

    #[test]
    fn test_refresh_picks_up_new_files() {
        let (dir, mut session) = workspace(&[("a.py", "")]);
        let mut clipboard = MemoryClipboard::default();
        let mut app = App::new(&mut session, &mut clipboard);

        fs::write(dir.path().join("b.py"), "").unwrap();
        press(&mut app, KeyCode::Char('r'));

        assert!(app.flattened_tree.highlight_path(Path::new("b.py")));
        assert!(app.status.1.contains("1 added"));
    }

    #[test]
    fn test_quit_keys() {
        let (_dir, mut session) = workspace(&[]);
        let mut clipboard = MemoryClipboard::default();
        let mut app = App::new(&mut session, &mut clipboard);

        assert!(!press(&mut app, KeyCode::Char('x')));
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }
}
