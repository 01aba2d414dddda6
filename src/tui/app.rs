use crate::config::Config;
use crate::guard::{DeferredNavigation, DirtyFlag, GuardOptions, NavigationGuard, SaveOutcome};
use crate::modal::{ChainController, Dispatch, EntryKey, ModalAction, ModalRegistry};
use crate::router::{BlockerState, Location, NavigationOutcome, RouteBlocker, Router};
use crate::tui::{
    dialogs::{self, Dialog, ACTION_CANCEL, ACTION_DISCARD, ACTION_SAVE},
    events::{Event, EventNavigator},
    keys::KeyMap,
    pages::{
        home::HomePage,
        info::InfoPage,
        settings::{Profile, ProfileStore, SettingsPage},
        DemoDialog, PageAction, PageSet,
    },
    styles::Theme,
    Frame,
};
use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

const WHEEL_STEP: i32 = 3;

/// Main application state and controller
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// Current application dimensions
    pub size: Rect,

    /// Key mappings for the application
    pub key_map: KeyMap,

    /// Current theme for styling
    pub theme: Theme,

    /// Status message to display
    pub status_message: Option<String>,

    /// Show the help overlay
    pub show_help: bool,

    config: Config,
    pages: PageSet,
    router: Router,
    modals: ModalRegistry,
    chain: ChainController,
    guard: NavigationGuard,
    profile: ProfileStore,

    /// Registry entry of the open leave confirmation
    confirm: Option<EntryKey>,

    /// Location whose page last received `on_enter`
    active: Location,

    navigator: EventNavigator,
}

impl App {
    /// Create a new application instance
    pub async fn new(config: Config, event_sender: mpsc::UnboundedSender<Event>) -> Result<Self> {
        let dirty = DirtyFlag::new();
        let profile = ProfileStore::new(
            Profile {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            },
            dirty.clone(),
        );

        let mut pages = PageSet::new();
        pages.register(Box::new(HomePage::new()));
        pages.register(Box::new(SettingsPage::new(profile.clone())));
        pages.register(Box::new(InfoPage::billing()));
        pages.register(Box::new(InfoPage::reports()));

        let guard = NavigationGuard::new(GuardOptions {
            dirty,
            on_save: Arc::new(profile.clone()),
            base_path: config.guard.base_path.clone(),
        });

        let mut router = Router::new(Location::root());
        for route in pages.routes() {
            router.register(route);
        }
        router.set_predicate(guard.predicate());

        let mut app = Self {
            should_quit: false,
            size: Rect::default(),
            key_map: KeyMap::default(),
            theme: Theme::default(),
            status_message: None,
            show_help: config.ui.show_help,
            modals: ModalRegistry::from_config(&config.modal),
            config,
            pages,
            router,
            chain: ChainController::new(),
            guard,
            profile,
            confirm: None,
            active: Location::root(),
            navigator: EventNavigator::new(event_sender),
        };

        if let Some(page) = app.pages.get_mut(&app.active) {
            page.on_enter().await?;
        }

        Ok(app)
    }

    /// Handle incoming events
    pub async fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key_event) => {
                if self.key_map.should_quit(&key_event) {
                    self.should_quit = true;
                    return Ok(true);
                }

                if self.key_map.should_show_help(&key_event) {
                    self.show_help = !self.show_help;
                    return Ok(false);
                }

                match self.modals.handle_key(key_event) {
                    Dispatch::Ignored => self.handle_page_key(key_event).await?,
                    Dispatch::Action(action) => self.handle_modal_action(action).await,
                    Dispatch::Closed(id) => trace!(%id, "modal closed by key"),
                    Dispatch::Consumed => {}
                }
            }

            Event::Mouse(mouse_event) => {
                if self.config.ui.mouse_enabled {
                    match self.modals.handle_mouse(mouse_event) {
                        Dispatch::Ignored => self.handle_page_mouse(mouse_event).await?,
                        Dispatch::Action(action) => self.handle_modal_action(action).await,
                        Dispatch::Closed(id) => trace!(%id, "modal closed by click"),
                        Dispatch::Consumed => {}
                    }
                }
            }

            Event::Resize(width, height) => {
                self.size = Rect::new(0, 0, width, height);
            }

            Event::Tick => {
                self.modals.tick();
                if let Some(page) = self.pages.get_mut(&self.active) {
                    page.tick().await?;
                }
            }

            Event::Navigate(location) => {
                self.navigate(location);
            }

            Event::StatusMessage(message) => {
                self.status_message = Some(message);
            }

            Event::ClearStatus => {
                self.status_message = None;
            }
        }

        self.reconcile_guard();
        self.sync_page().await?;

        Ok(self.should_quit)
    }

    async fn handle_page_key(&mut self, key_event: KeyEvent) -> Result<()> {
        if let Some(location) = self.key_map.route_for(&key_event) {
            self.navigate(location.clone());
            return Ok(());
        }

        if self.key_map.should_go_back(&key_event) {
            let outcome = self.router.back();
            self.after_navigation(outcome);
            return Ok(());
        }

        if let Some(delta) = self.key_map.scroll_delta(&key_event) {
            self.scroll_page(delta);
            return Ok(());
        }

        let action = match self.pages.get_mut(&self.active) {
            Some(page) => page.handle_key_event(key_event).await?,
            None => None,
        };
        if let Some(action) = action {
            self.handle_page_action(action);
        }
        Ok(())
    }

    async fn handle_page_mouse(&mut self, mouse_event: MouseEvent) -> Result<()> {
        match mouse_event.kind {
            MouseEventKind::ScrollUp => self.scroll_page(-WHEEL_STEP),
            MouseEventKind::ScrollDown => self.scroll_page(WHEEL_STEP),
            _ => {
                let action = match self.pages.get_mut(&self.active) {
                    Some(page) => page.handle_mouse_event(mouse_event).await?,
                    None => None,
                };
                if let Some(action) = action {
                    self.handle_page_action(action);
                }
            }
        }
        Ok(())
    }

    fn scroll_page(&mut self, delta: i32) {
        if self.modals.scroll_locked() {
            trace!(delta, "page scroll suppressed by open modal");
            return;
        }
        if let Some(page) = self.pages.get_mut(&self.active) {
            page.scroll_by(delta);
        }
    }

    fn handle_page_action(&mut self, action: PageAction) {
        match action {
            PageAction::OpenDialog(DemoDialog::Info) => {
                self.open_dialog(dialogs::info(&self.config.modal));
            }
            PageAction::OpenDialog(DemoDialog::ScrollLocked) => {
                self.open_dialog(dialogs::scroll_locked());
            }
            PageAction::OpenDialog(DemoDialog::Pinned) => {
                self.open_dialog(dialogs::pinned());
            }
            PageAction::OpenDialog(DemoDialog::Stack) => {
                for dialog in dialogs::stack() {
                    self.open_dialog(dialog);
                }
            }
            PageAction::StartOnboarding => self.chain.start(&mut self.modals, dialogs::onboarding()),
            PageAction::Navigate(location) => self.navigate(location),
            PageAction::Status(message) => self.status_message = Some(message),
        }
    }

    fn open_dialog(&mut self, dialog: Dialog) -> EntryKey {
        self.modals.open(dialog.id, dialog.content, dialog.options)
    }

    async fn handle_modal_action(&mut self, action: ModalAction) {
        match action {
            ModalAction::ChainNext => self.chain.next(&mut self.modals),
            ModalAction::ChainPrevious => self.chain.previous(&mut self.modals),
            ModalAction::ChainClose => self.chain.close(&mut self.modals),
            ModalAction::Custom(name) => match name.as_str() {
                ACTION_DISCARD => self.discard_changes(),
                ACTION_SAVE => self.save_changes().await,
                ACTION_CANCEL => self.stay(),
                other => debug!(action = other, "unhandled modal action"),
            },
            // The registry closes the entry itself
            ModalAction::Close => {}
        }
    }

    /// Ask the router to move, opening the leave confirmation if it holds
    pub fn navigate(&mut self, to: Location) {
        let outcome = self.router.navigate(to);
        self.after_navigation(outcome);
    }

    fn after_navigation(&mut self, outcome: NavigationOutcome) {
        match outcome {
            NavigationOutcome::Blocked => {
                if self.router.state() == BlockerState::Blocked && !self.guard.show_modal() {
                    self.guard.on_blocked(&self.router);
                    self.open_confirm();
                }
            }
            NavigationOutcome::NotFound => {
                self.status_message = Some("No such page".to_string());
            }
            NavigationOutcome::Committed | NavigationOutcome::Unchanged => {}
        }
    }

    fn open_confirm(&mut self) {
        if let Some(destination) = self.guard.pending_location() {
            let dialog = dialogs::confirm_leave(destination);
            self.confirm = Some(self.open_dialog(dialog));
        }
    }

    fn discard_changes(&mut self) {
        let Some(key) = self.confirm.take() else {
            return;
        };
        let exit = self.modals.exit_signal(key);
        self.modals.close_entry(key);

        if let Some(deferred) = self.guard.discard(&mut self.router, exit) {
            self.spawn_deferred(deferred);
        }
    }

    async fn save_changes(&mut self) {
        let Some(key) = self.confirm else {
            return;
        };
        let modals = &mut self.modals;
        let outcome = self.guard.save(&mut self.router, move || modals.exit_signal(key)).await;

        match outcome {
            SaveOutcome::Saved(deferred) => {
                self.confirm = None;
                self.modals.close_entry(key);
                self.status_message = Some("Profile saved".to_string());
                self.spawn_deferred(deferred);
            }
            SaveOutcome::Failed(e) => {
                warn!(error = %e, "leave confirmation stays open");
                self.status_message = Some(e.to_string());
            }
            SaveOutcome::NothingPending => {}
        }
    }

    fn stay(&mut self) {
        if let Some(key) = self.confirm.take() {
            self.modals.close_entry(key);
        }
        self.guard.cancel(&mut self.router);
    }

    fn spawn_deferred(&self, deferred: DeferredNavigation) {
        tokio::spawn(deferred.run(self.navigator.clone()));
    }

    /// A confirmation dismissed by Escape counts as "stay"
    fn reconcile_guard(&mut self) {
        if !self.guard.show_modal() {
            return;
        }
        let still_open = self.confirm.is_some_and(|key| self.modals.contains_entry(key));
        if !still_open {
            debug!("leave confirmation dismissed");
            self.confirm = None;
            self.guard.cancel(&mut self.router);
        }
    }

    /// Run page lifecycle hooks after the router moved
    async fn sync_page(&mut self) -> Result<()> {
        if self.router.current() == &self.active {
            return Ok(());
        }

        if let Some(page) = self.pages.get_mut(&self.active) {
            page.on_exit().await?;
        }
        self.active = self.router.current().clone();
        info!(page = %self.active, "page changed");
        if let Some(page) = self.pages.get_mut(&self.active) {
            page.on_enter().await?;
        }
        Ok(())
    }

    pub fn current_location(&self) -> &Location {
        self.router.current()
    }

    pub fn modals(&self) -> &ModalRegistry {
        &self.modals
    }

    pub fn chain(&self) -> &ChainController {
        &self.chain
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        self.size = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Route tabs
                Constraint::Min(1),    // Page
                Constraint::Length(1), // Status bar
            ])
            .split(self.size);

        self.render_tabs(frame, chunks[0]);

        if let Some(page) = self.pages.get_mut(&self.active) {
            page.render(frame, chunks[1], &self.theme);
        } else {
            let empty = Paragraph::new("No page mounted here")
                .block(Block::default().borders(Borders::ALL).title("modalflow"))
                .style(self.theme.base_style());
            frame.render_widget(empty, chunks[1]);
        }

        self.render_status_bar(frame, chunks[2]);

        if self.show_help {
            self.render_help_overlay(frame);
        }

        // Modals always sit above everything else
        self.modals.render(frame, self.size, &self.theme);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for (binding, location) in &self.key_map.routes {
            let title = self.pages.title_of(location).unwrap_or(location.path());
            let style = if location == self.router.current() {
                self.theme.title_style()
            } else {
                self.theme.dim_text_style()
            };
            spans.push(Span::styled(format!(" {} {} ", binding.label(), title), style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)).style(self.theme.status_bar_style()), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status_text = match &self.status_message {
            Some(message) => message.clone(),
            None => format!(
                "{} | modals: {}{} | Ctrl+G help | Ctrl+C quit",
                self.router.current(),
                self.modals.len(),
                if self.modals.scroll_locked() { " (scroll locked)" } else { "" },
            ),
        };

        let style = if self.guard.dirty().is_dirty() {
            self.theme.status_bar_style().fg(self.theme.warning)
        } else {
            self.theme.status_bar_style()
        };
        frame.render_widget(Paragraph::new(status_text).style(style), area);
    }

    fn render_help_overlay(&self, frame: &mut Frame) {
        let help_area = centered_rect(60, 50, frame.size());

        let mut help_text = self.key_map.help_text();
        if let Some(page) = self.pages_help() {
            help_text.push_str("\n\n");
            help_text.push_str(&page);
        }

        let help_paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help").style(self.theme.help_style()))
            .style(self.theme.text_style());

        frame.render_widget(Clear, help_area);
        frame.render_widget(help_paragraph, help_area);
    }

    fn pages_help(&self) -> Option<String> {
        let title = self.pages.title_of(&self.active)?;
        Some(format!("{} page shortcuts are listed on the page itself", title))
    }
}

/// Create a centered rectangle with given percentage of the screen
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::events::EventHandler;
    use crossterm::event::{KeyCode, KeyModifiers, MouseEvent};
    use ratatui::{backend::TestBackend, Terminal};

    async fn app() -> (App, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut config = Config::default();
        config.modal.exit_transition_ticks = 1;
        let app = App::new(config, sender).await.unwrap();
        (app, receiver)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn wheel_down() -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        })
    }

    async fn dirty_profile(app: &mut App) {
        app.handle_event(Event::Navigate(Location::new("/settings/profile"))).await.unwrap();
        app.handle_event(key(KeyCode::Char('!'))).await.unwrap();
        assert!(app.guard().dirty().is_dirty());
    }

    #[tokio::test]
    async fn test_leaving_dirty_settings_asks_first() {
        let (mut app, _events) = app().await;
        dirty_profile(&mut app).await;

        app.handle_event(Event::Navigate(Location::new("/reports"))).await.unwrap();
        assert_eq!(app.current_location().path(), "/settings/profile");
        assert!(app.guard().show_modal());
        assert_eq!(app.modals().topmost().map(|e| e.id().as_str()), Some(dialogs::CONFIRM_LEAVE_ID));

        app.handle_event(key(KeyCode::Char('c'))).await.unwrap();
        assert!(!app.guard().show_modal());
        assert!(app.modals().is_empty());

        // Any change of path counts, even inside the settings subtree
        app.handle_event(Event::Navigate(Location::new("/settings/billing"))).await.unwrap();
        assert_eq!(app.current_location().path(), "/settings/profile");
        assert_eq!(app.guard().pending_location(), Some(&Location::new("/settings/billing")));
    }

    #[tokio::test]
    async fn test_discard_leaves_after_exit_transition() {
        let (mut app, mut events) = app().await;
        dirty_profile(&mut app).await;
        app.handle_event(Event::Navigate(Location::new("/reports"))).await.unwrap();

        app.handle_event(key(KeyCode::Char('d'))).await.unwrap();
        assert!(!app.guard().show_modal());
        assert!(app.modals().is_empty());
        assert!(!app.guard().dirty().is_dirty());
        assert_eq!(app.profile().draft(), app.profile().saved());

        // The deferred navigation only fires once the confirmation has faded
        tokio::task::yield_now().await;
        assert!(events.try_recv().is_err());

        app.handle_event(Event::Tick).await.unwrap();
        let navigate = tokio::time::timeout(std::time::Duration::from_secs(1), events.recv())
            .await
            .unwrap();
        match navigate {
            Some(Event::Navigate(location)) => {
                assert_eq!(location.path(), "/reports");
                app.handle_event(Event::Navigate(location)).await.unwrap();
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(app.current_location().path(), "/reports");
    }

    #[tokio::test]
    async fn test_discard_completes_while_mouse_keeps_moving() {
        let mut handler = EventHandler::new(std::time::Duration::from_millis(10));
        let mut config = Config::default();
        config.modal.exit_transition_ticks = 1;
        let mut app = App::new(config, handler.sender()).await.unwrap();

        dirty_profile(&mut app).await;
        app.handle_event(Event::Navigate(Location::new("/reports"))).await.unwrap();
        app.handle_event(key(KeyCode::Char('d'))).await.unwrap();
        assert!(app.modals().is_transitioning());

        let sender = handler.sender();
        let motion = tokio::spawn(async move {
            let moved = Event::Mouse(MouseEvent {
                kind: MouseEventKind::Moved,
                column: 2,
                row: 2,
                modifiers: KeyModifiers::NONE,
            });
            while sender.send(moved.clone()).is_ok() {
                tokio::task::yield_now().await;
            }
        });

        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                let Some(event) = handler.next().await else { break };
                let arrived = matches!(&event, Event::Navigate(location) if location.path() == "/reports");
                app.handle_event(event).await.unwrap();
                if arrived {
                    break;
                }
            }
        })
        .await
        .expect("deferred navigation stalled behind mouse motion");
        motion.abort();

        assert!(!app.modals().is_transitioning());
        assert_eq!(app.current_location().path(), "/reports");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_confirmation_open() {
        let (mut app, _events) = app().await;
        dirty_profile(&mut app).await;
        app.profile().edit(|p| p.email = "not-an-email".to_string());

        app.handle_event(Event::Navigate(Location::new("/"))).await.unwrap();
        app.handle_event(key(KeyCode::Char('s'))).await.unwrap();

        assert!(app.guard().show_modal());
        assert_eq!(app.guard().pending_location(), Some(&Location::root()));
        assert_eq!(app.modals().len(), 1);
        assert!(app.status_message.as_deref().unwrap_or_default().contains("not an email"));
        assert_eq!(app.current_location().path(), "/settings/profile");
    }

    #[tokio::test]
    async fn test_escape_on_confirmation_means_stay() {
        let (mut app, _events) = app().await;
        dirty_profile(&mut app).await;
        app.handle_event(Event::Navigate(Location::new("/reports"))).await.unwrap();

        app.handle_event(key(KeyCode::Esc)).await.unwrap();
        assert!(!app.guard().show_modal());
        assert!(app.guard().pending_location().is_none());
        assert_eq!(app.router.state(), BlockerState::Unblocked);
        assert!(app.guard().dirty().is_dirty());
    }

    #[tokio::test]
    async fn test_scroll_lock_blocks_wheel() {
        let (mut app, _events) = app().await;
        app.handle_event(Event::Navigate(Location::new("/reports"))).await.unwrap();

        app.handle_page_action(PageAction::OpenDialog(DemoDialog::ScrollLocked));
        assert!(app.modals().scroll_locked());
        app.handle_event(wheel_down()).await.unwrap();

        app.handle_event(key(KeyCode::Esc)).await.unwrap();
        assert!(!app.modals().scroll_locked());
        app.handle_event(wheel_down()).await.unwrap();

        // Only the unlocked wheel event moved the page
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let row: String = (0..60).map(|x| buffer.get(x, 1).symbol().to_string()).collect();
        assert!(row.contains("Reports (4/120)"), "{}", row);
    }

    #[tokio::test]
    async fn test_onboarding_chain_from_home() {
        let (mut app, _events) = app().await;
        app.handle_event(key(KeyCode::Char('o'))).await.unwrap();
        assert_eq!(app.chain().current_index(), Some(0));

        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        app.handle_event(key(KeyCode::Char('b'))).await.unwrap();
        assert_eq!(app.chain().current_index(), Some(0));

        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        assert!(app.chain().is_last());

        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        assert!(!app.chain().is_active());
        assert!(app.modals().is_empty());
    }

    #[tokio::test]
    async fn test_stack_closes_top_down() {
        let (mut app, _events) = app().await;
        app.handle_event(key(KeyCode::Char('s'))).await.unwrap();
        assert_eq!(app.modals().len(), 3);

        app.handle_event(key(KeyCode::Esc)).await.unwrap();
        let ids: Vec<&str> = app.modals().modals().iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["stack-a", "stack-b"]);
        assert!(app.modals().scroll_locked());
    }

    #[tokio::test]
    async fn test_home_opens_single_dialogs() {
        let (mut app, _events) = app().await;

        app.handle_event(key(KeyCode::Char('m'))).await.unwrap();
        assert_eq!(app.modals().topmost().map(|e| e.id().as_str()), Some("info"));
        app.handle_event(key(KeyCode::Esc)).await.unwrap();
        assert!(app.modals().is_empty());

        app.handle_event(key(KeyCode::Char('l'))).await.unwrap();
        assert!(app.modals().scroll_locked());
        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        assert!(!app.modals().scroll_locked());

        // Pinned ignores Esc and only closes from its own button
        app.handle_event(key(KeyCode::Char('p'))).await.unwrap();
        app.handle_event(key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.modals().topmost().map(|e| e.id().as_str()), Some("pinned"));
        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        assert!(app.modals().is_empty());
    }
}
