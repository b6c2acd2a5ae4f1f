use anyhow::Result;
use content_studio_config::Config;
use content_studio_engine::net::RetryPolicy;
use content_studio_engine::store::{FileCompositionStore, FileStylesheetStore};
use content_studio_engine::{
    BlockBody, Composer, ComposerError, CompositionStore, CompositionSummary, ContentBlock, EmailPlatform,
    NotificationLevel, Notifier, RenderMode,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env, fs,
    io::{Stdout, stdout},
    path::PathBuf,
    process, thread,
};

struct App {
    store: FileCompositionStore,
    stylesheets: FileStylesheetStore,
    export_dir: PathBuf,
    retry_policy: RetryPolicy,
    mode_override: Option<RenderMode>,
    email_platform: EmailPlatform,
    notifier: Notifier,
    summaries: Vec<CompositionSummary>,
    list_state: ListState,
    composer: Option<Composer>,
    show_html: bool,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let mut app = Self {
            store: FileCompositionStore::new(&config.compositions_path),
            stylesheets: FileStylesheetStore::new(config.stylesheets_dir()),
            export_dir: config.export_dir(),
            retry_policy: config.delete_retry_policy(),
            mode_override: config.default_mode,
            email_platform: config.email_platform,
            notifier: Notifier::new(),
            summaries: Vec::new(),
            list_state: ListState::default(),
            composer: None,
            show_html: false,
        };
        app.reload(None)?;
        Ok(app)
    }

    /// Re-read the listing, keeping `select` highlighted when present.
    fn reload(&mut self, select: Option<&str>) -> Result<()> {
        self.summaries = self.store.list()?;
        let index = select
            .and_then(|id| self.summaries.iter().position(|s| s.id.as_str() == id))
            .or(if self.summaries.is_empty() { None } else { Some(0) });
        self.list_state.select(index);
        self.open_selected();
        Ok(())
    }

    fn next_composition(&mut self) {
        if self.summaries.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % self.summaries.len(),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.open_selected();
    }

    fn previous_composition(&mut self) {
        if self.summaries.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.summaries.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
        self.open_selected();
    }

    fn open_selected(&mut self) {
        self.composer = None;
        let Some(summary) = self
            .list_state
            .selected()
            .and_then(|index| self.summaries.get(index))
        else {
            return;
        };
        if let Ok(mut composer) = Composer::load(&self.store, &summary.id, &self.notifier) {
            if let Some(mode) = self.mode_override {
                composer.set_preview_mode(mode);
            }
            composer.set_email_platform(self.email_platform);
            composer.load_stylesheet(&self.stylesheets);
            self.composer = Some(composer);
        }
    }

    fn cycle_mode(&mut self) {
        if let Some(composer) = &mut self.composer {
            let mode = composer.preview_mode().next();
            composer.set_preview_mode(mode);
            self.mode_override = Some(mode);
        }
    }

    fn cycle_platform(&mut self) {
        self.email_platform = self.email_platform.next();
        if let Some(composer) = &mut self.composer {
            composer.set_email_platform(self.email_platform);
        }
    }

    fn export(
        &mut self,
        extension: &str,
        contents: impl FnOnce(&Composer) -> Result<String, ComposerError>,
    ) {
        let Some(composer) = &self.composer else {
            return;
        };
        let stem = composer
            .composition_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let path = self.export_dir.join(format!("{stem}.{extension}"));
        let result = contents(composer).map_err(anyhow::Error::from).and_then(|text| {
            fs::create_dir_all(&self.export_dir)?;
            fs::write(&path, text)?;
            Ok(())
        });
        match result {
            Ok(()) => self
                .notifier
                .success(format!("Exported {}", path.display())),
            Err(e) => self
                .notifier
                .error(format!("Failed to export {}: {e}", path.display())),
        }
    }

    fn duplicate_selected(&mut self) -> Result<()> {
        let Some(composer) = &self.composer else {
            return Ok(());
        };
        let mut copy = composer.duplicate();
        let id = copy.save(&mut self.store)?;
        self.reload(Some(id.as_str()))
    }

    fn delete_selected(&mut self) -> Result<()> {
        let Some(composer) = &mut self.composer else {
            return Ok(());
        };
        composer.delete(&mut self.store, &self.retry_policy, thread::sleep)?;
        self.reload(None)
    }

    /// Handle one key press. Returns `false` when the user quits.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return false,
            KeyCode::Down | KeyCode::Char('j') => self.next_composition(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_composition(),
            KeyCode::Char('m') => self.cycle_mode(),
            KeyCode::Char('p') => self.cycle_platform(),
            KeyCode::Char('h') => self.show_html = !self.show_html,
            KeyCode::Char('w') => self.export("html", Composer::export_web_html),
            KeyCode::Char('e') => self.export("email.html", Composer::export_email_html),
            KeyCode::Char('x') => self.export("mdx", |composer| Ok(composer.export_mdx())),
            KeyCode::Char('d') => {
                if let Err(e) = self.duplicate_selected() {
                    self.notifier.error(format!("Failed to duplicate: {e}"));
                }
            }
            KeyCode::Char('D') => {
                if let Err(e) = self.delete_selected() {
                    self.notifier.error(format!("Failed to delete: {e}"));
                }
            }
            KeyCode::Char('r') => {
                if let Err(e) = self.reload(None) {
                    self.notifier.error(format!("Failed to reload: {e}"));
                }
            }
            _ => {}
        }
        true
    }

    fn status_line(&self) -> Option<(NotificationLevel, String)> {
        self.notifier
            .latest()
            .map(|notification| (notification.level, notification.message))
    }

    fn preview_lines(&mut self) -> Vec<Line<'static>> {
        let show_html = self.show_html;
        let Some(composer) = &mut self.composer else {
            return vec![Line::from("Select a composition to preview it")];
        };
        if show_html {
            return composer
                .preview()
                .html
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect();
        }
        let status = composer.preview().status;
        let mut lines = vec![
            Line::from(format!(
                "{} | {} | {:?}",
                composer.preview_mode(),
                composer.email_container().platform,
                status
            )),
            Line::from(String::new()),
        ];
        lines.extend(composer.blocks().iter().map(|block| Line::from(outline(block))));
        lines
    }
}

/// One-line outline of a block for the terminal preview.
fn outline(block: &ContentBlock) -> String {
    let summary = match &block.body {
        BlockBody::Text(text) => format!("{} {}", text.element.tag(), text.content),
        BlockBody::Image(image) if image.has_url() => format!("image {} ({})", image.url, image.alt),
        BlockBody::Image(_) => "image (none selected)".to_string(),
        BlockBody::Video(video) => format!("video {}", video.url),
        BlockBody::Divider(_) => "──────".to_string(),
        BlockBody::Button(button) => format!("[{}] -> {}", button.text, button.url),
        BlockBody::Spacer(spacer) => format!("spacer {}px", spacer.height),
        BlockBody::List(list) => format!("list: {}", list.items.join(" / ")),
        BlockBody::Html(html) => format!(
            "html {}",
            html.description.as_deref().unwrap_or("(raw markup)")
        ),
        BlockBody::Frontmatter(frontmatter) => format!("frontmatter \"{}\"", frontmatter.title),
        BlockBody::Unsupported { type_name, .. } => format!("unsupported '{type_name}'"),
    };
    format!("{:>3}  {summary}", block.order)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    // Determine compositions path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config;
    let from_config;

    if args.len() == 2 {
        // CLI argument provided - use it
        config = Config::new(&args[1]);
        from_config = false;
    } else if args.len() == 1 {
        // No CLI argument - try config file
        match Config::load() {
            Ok(Some(loaded)) => {
                config = loaded;
                from_config = true;
            }
            Ok(None) => {
                eprintln!("Error: No compositions path provided and no config file found");
                eprintln!("Usage: {} <compositions-folder-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <compositions-folder-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [compositions-folder-path]", args[0]);
        process::exit(1);
    };

    if !config.compositions_path.is_dir() {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Compositions path '{}'{} is not a directory",
            config.compositions_path.display(),
            source
        );
        process::exit(1);
    }
    log::info!("Opening compositions in {}", config.compositions_path.display());

    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && !app.handle_key(key.code)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    // Composition list panel
    let items: Vec<ListItem> = app
        .summaries
        .iter()
        .map(|summary| {
            let display_text = format!(
                "{} [{}] ({} blocks)",
                summary.name,
                format!("{:?}", summary.kind).to_lowercase(),
                summary.block_count
            );
            ListItem::new(vec![Line::from(vec![Span::raw(display_text)])])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Compositions"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(list, chunks[0], &mut app.list_state);

    // Preview panel
    let title = if app.show_html { "HTML" } else { "Preview" };
    let preview = Paragraph::new(app.preview_lines())
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(preview, chunks[1]);

    // Status and key help
    let status = match app.status_line() {
        Some((NotificationLevel::Error, message)) => {
            Span::styled(message, Style::default().fg(Color::Red))
        }
        Some((_, message)) => Span::styled(message, Style::default().fg(Color::Green)),
        None => Span::raw(""),
    };
    let help_text = Line::from(vec![
        Span::raw("q: Quit | j/k: Move | m: Mode | p: Platform | h: HTML | "),
        Span::raw("w/e/x: Export web/email/mdx | d: Duplicate | D: Delete | r: Reload"),
    ]);

    let help = Paragraph::new(vec![Line::from(status), help_text]).block(Block::default());
    f.render_widget(help, rows[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_studio_engine::ComposerKind;
    use tempfile::TempDir;

    fn app_with(dir: &TempDir, composer: &mut Composer) -> App {
        let config = Config::new(dir.path().join("compositions"));
        let mut store = FileCompositionStore::new(&config.compositions_path);
        composer.save(&mut store).unwrap();
        App::new(config).unwrap()
    }

    fn status(app: &App) -> (NotificationLevel, String) {
        app.status_line().unwrap()
    }

    #[test]
    fn failed_delete_shows_in_status_line() {
        let dir = TempDir::new().unwrap();
        let mut composer = Composer::new(ComposerKind::Block, "Gone");
        let mut app = app_with(&dir, &mut composer);
        let id = composer.composition_id().unwrap().to_string();
        fs::remove_file(dir.path().join("compositions").join(format!("{id}.json"))).unwrap();

        assert!(app.handle_key(KeyCode::Char('D')));

        let (level, message) = status(&app);
        assert_eq!(level, NotificationLevel::Error);
        assert!(message.starts_with("Failed to delete"), "{message}");
    }

    #[test]
    fn export_is_refused_while_stylesheet_is_missing() {
        let dir = TempDir::new().unwrap();
        let mut composer = Composer::new(ComposerKind::Block, "Styled");
        composer.select_stylesheet(Some("missing".into()));
        let mut app = app_with(&dir, &mut composer);

        app.handle_key(KeyCode::Char('w'));

        let (level, message) = status(&app);
        assert_eq!(level, NotificationLevel::Error);
        assert!(message.starts_with("Failed to export"), "{message}");
        assert!(!app.export_dir.exists());

        app.handle_key(KeyCode::Char('x'));
        assert_eq!(status(&app).0, NotificationLevel::Success);
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(Config::new(dir.path())).unwrap();
        assert!(!app.handle_key(KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('d')));
    }
}
