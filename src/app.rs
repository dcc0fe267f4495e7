use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::store::TodoStore;
use crate::theme::{self, Theme, ThemeMode};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{TodoListView, UserDetailView, UserListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};

/// How long a footer flash message stays up
const FLASH_TTL: Duration = Duration::from_millis(2500);

/// Tick rate for the event loop; also bounds how promptly query results
/// and the settled filter debounce are observed
const TICK_RATE: Duration = Duration::from_millis(100);

/// Main application: owns the view stack, the command palette and the
/// active theme. Views own their own data loading and input modes.
pub struct App {
  config: Config,
  store: TodoStore,
  theme: Theme,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  command: CommandInput,
  flash: Option<(String, Instant)>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, store: TodoStore, mode: ThemeMode) -> Self {
    let root = TodoListView::new(store.clone());

    Self {
      config,
      store,
      theme: Theme::new(mode),
      view_stack: vec![Box::new(root)],
      command: CommandInput::new(),
      flash: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      if let Some(event) = events.next().await {
        match event {
          Event::Key(key) => self.handle_key(key),
          Event::Tick => self.tick(),
        }
      }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn capturing_input(&self) -> bool {
    self
      .view_stack
      .last()
      .is_some_and(|view| view.capturing_input())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    // Ctrl-C quits from anywhere, input modes included
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The command palette runs above the views, but `:` only opens it
    // while the view isn't capturing text
    if self.command.is_active() || !self.capturing_input() {
      match self.command.handle_key(key) {
        KeyResult::Handled => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::NotHandled => {}
      }
    }

    if key.code == KeyCode::Char('T') && !self.capturing_input() {
      self.toggle_theme();
      return;
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key);
      self.apply_action(action);
    }
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Flash(message) => self.set_flash(message),
    }
  }

  fn execute_command(&mut self, input: &str) {
    let mut words = input.split_whitespace();
    let command = words.next().unwrap_or("");
    let argument = words.next().unwrap_or("");

    match command {
      "" => {}
      "todos" => {
        self.view_stack = vec![Box::new(TodoListView::new(self.store.clone()))];
      }
      "users" => {
        self.view_stack = vec![Box::new(UserListView::new(self.store.clone()))];
      }
      "user" => {
        let view: Box<dyn View> = match argument.parse::<u64>() {
          Ok(id) => Box::new(UserDetailView::new(self.store.clone(), id)),
          // A bad or missing id behaves like a remote miss
          Err(_) => Box::new(UserDetailView::invalid(argument)),
        };
        self.view_stack.push(view);
      }
      "theme" => self.toggle_theme(),
      "quit" => self.should_quit = true,
      other => self.set_flash(format!("Unknown command: {}", other)),
    }
  }

  fn toggle_theme(&mut self) {
    self.theme.toggle();
    theme::persist(self.theme.mode);
    self.set_flash(format!("Theme: {}", self.theme.mode.label()));
  }

  fn set_flash(&mut self, message: String) {
    self.flash = Some((message, Instant::now()));
  }

  fn tick(&mut self) {
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }

    if let Some((_, at)) = &self.flash {
      if at.elapsed() >= FLASH_TTL {
        self.flash = None;
      }
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Current view
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect();

    let (mut shortcuts, status) = match self.view_stack.last() {
      Some(view) => (view.shortcuts(), view.status_line()),
      None => (Vec::new(), String::new()),
    };
    shortcuts.push(ShortcutInfo::new("T", "theme").with_priority(85));

    draw_header(
      frame,
      chunks[0],
      &self.theme,
      &self.config.api.base_url,
      &shortcuts,
    );

    let theme = self.theme;
    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1], &theme);
    }

    self.command.render_overlay(frame, chunks[1], &self.theme);

    let flash = self.flash.as_ref().map(|(msg, _)| msg.as_str());
    draw_footer(frame, chunks[2], &self.theme, &breadcrumb, &status, flash);
  }
}
