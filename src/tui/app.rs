use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::catalog::params::{ParamStore, ParamUpdate, QueryParams, QueryStore};
use crate::catalog::reconciler::Reconciler;
use crate::catalog::scroll::{ScrollSnapshot, ScrollTrigger};
use crate::config::AppConfig;

use super::events::{Action, AppEvent, Focus, Notification, NotificationLevel};
use super::layout::AppLayout;
use super::services::Services;
use super::theme::{Palette, ThemeMode, ThemePreference};
use super::views::catalog::{CatalogViewState, ListResult};
use super::views::detail;
use super::views::filters::{FilterBarState, FilterResult};

/// Central application state (Elm architecture).
pub struct AppState {
    /// Whether the app is still running.
    pub running: bool,
    /// Area with input focus.
    pub focus: Focus,
    /// Persisted query (session file or memory).
    params: ParamStore<Box<dyn QueryStore + Send>>,
    /// Query the reconciler is currently working towards.
    query: QueryParams,
    reconciler: Reconciler,
    scroll: ScrollTrigger,
    /// List view state.
    pub catalog: CatalogViewState,
    /// Filter bar state.
    pub filters: FilterBarState,
    categories: Vec<String>,
    /// Item shown in the detail modal.
    detail: Option<u64>,
    theme: ThemePreference,
    mode: ThemeMode,
    theme_path: PathBuf,
    /// Active notifications (max 3 visible).
    pub notifications: Vec<Notification>,
    /// Monotonic counter for notification IDs.
    notification_counter: u64,
    /// Whether the help modal is open.
    pub show_help: bool,
    /// Receiver for backend events.
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Backend services handle.
    services: Services,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        store: Box<dyn QueryStore + Send>,
        event_rx: mpsc::UnboundedReceiver<AppEvent>,
        services: Services,
    ) -> Self {
        let params = ParamStore::new(store);
        let query = params.read();
        let theme_path = config.theme_path();
        let theme = ThemePreference::load(&theme_path);
        let initial_page = u32::try_from(query.page).unwrap_or(1);

        let mut filters = FilterBarState::new(config.tui.search_debounce());
        filters.sync(&query);

        Self {
            running: true,
            focus: Focus::List,
            params,
            query,
            reconciler: Reconciler::new(),
            scroll: ScrollTrigger::new(
                Instant::now(),
                config.scroll.trigger_config(),
                initial_page,
            ),
            catalog: CatalogViewState::new(),
            filters,
            categories: Vec::new(),
            detail: None,
            theme,
            mode: theme.resolve(),
            theme_path,
            notifications: Vec::new(),
            notification_counter: 0,
            show_help: false,
            event_rx,
            services,
        }
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn theme(&self) -> ThemePreference {
        self.theme
    }

    fn palette(&self) -> &'static Palette {
        self.mode.palette()
    }

    /// Kick off the initial page load and the category list.
    pub fn start(&mut self) {
        log::info!("Starting with query '{}'", self.params.query_string());
        self.services.load_categories();
        self.start_fetch();
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        self.start();

        while self.running {
            // Render
            terminal.draw(|frame| self.render(frame))?;

            // Select next event
            tokio::select! {
                _ = tick_interval.tick() => {
                    self.on_tick();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    // ── Event handling ──────────────────────────────────────────────────

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => self.handle_input(crossterm_event),
            AppEvent::Action(action) => self.handle_action(action),
            AppEvent::Tick => self.on_tick(),
            AppEvent::PageLoaded(outcome) => {
                if self.reconciler.apply(outcome) {
                    self.catalog.clamp(self.reconciler.items().len());
                }
            }
            AppEvent::CaptureDone(outcome) => {
                self.reconciler.apply_capture(outcome);
            }
            AppEvent::CategoriesLoaded(categories) => {
                log::debug!("Loaded {} types", categories.len());
                self.categories = categories;
            }
            AppEvent::Notification(notification) => {
                self.push_notification(notification.message, notification.level);
            }
            AppEvent::Quit => {
                self.running = false;
            }
        }
    }

    fn handle_input(&mut self, event: Event) {
        if let Event::Mouse(mouse) = event {
            if self.focus == Focus::List && self.detail.is_none() {
                self.catalog.handle_mouse(&mouse, self.reconciler.items().len());
            }
            return;
        }

        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return;
        };

        // Priority 1: Ctrl+C always quits
        if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
            self.handle_action(Action::Quit);
            return;
        }

        // Priority 2: Help modal
        if self.show_help {
            if matches!(code, KeyCode::Esc | KeyCode::Char('?')) {
                self.handle_action(Action::CloseHelp);
            }
            return;
        }

        // Priority 3: Detail modal
        if let Some(id) = self.detail {
            match code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    self.handle_action(Action::CloseDetail)
                }
                KeyCode::Char('c') => {
                    if let Some(item) = self.reconciler.item(id) {
                        let action = Action::ToggleCapture {
                            id,
                            captured: !item.captured,
                        };
                        self.handle_action(action);
                    }
                }
                _ => {}
            }
            return;
        }

        // Priority 4: Focus cycling
        match code {
            KeyCode::Tab => return self.handle_action(Action::FocusNext),
            KeyCode::BackTab => return self.handle_action(Action::FocusPrev),
            _ => {}
        }

        // Priority 5: Focused area
        let now = Instant::now();
        match self.focus {
            Focus::Search => {
                let result = self.filters.handle_search_input(code, modifiers, now);
                self.on_filter_result(result);
                return;
            }
            Focus::Filters => {
                // Global keys stay reachable from the controls
                if !matches!(code, KeyCode::Char('q' | '?' | 't' | '/')) {
                    let result =
                        self.filters
                            .handle_control_input(code, &self.query, &self.categories);
                    self.on_filter_result(result);
                    return;
                }
            }
            Focus::List => {
                if let Some(result) = self.catalog.handle_input(code, modifiers, &self.reconciler) {
                    self.on_list_result(result);
                    return;
                }
            }
        }

        // Priority 6: Global keybindings
        if let Some(action) = map_global_key(code, modifiers) {
            self.handle_action(action);
        }
    }

    fn on_filter_result(&mut self, result: FilterResult) {
        match result {
            FilterResult::Consumed => {}
            FilterResult::Update(update) => self.handle_action(Action::UpdateQuery(update)),
            FilterResult::Leave => self.handle_action(Action::FocusList),
        }
    }

    fn on_list_result(&mut self, result: ListResult) {
        match result {
            ListResult::Consumed => {}
            ListResult::OpenDetail(id) => self.handle_action(Action::OpenDetail(id)),
            ListResult::ToggleCapture { id, captured } => {
                self.handle_action(Action::ToggleCapture { id, captured })
            }
            ListResult::BackToFirstPage => self.handle_action(Action::BackToFirstPage),
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::ShowHelp => self.show_help = true,
            Action::CloseHelp => self.show_help = false,
            Action::CycleTheme => self.cycle_theme(),
            Action::FocusList => self.focus = Focus::List,
            Action::FocusSearch => self.focus = Focus::Search,
            Action::FocusFilters => self.focus = Focus::Filters,
            Action::FocusNext => self.focus = self.focus.next(),
            Action::FocusPrev => self.focus = self.focus.prev(),
            Action::UpdateQuery(update) => self.apply_update(update, false),
            Action::BackToFirstPage => self.apply_update(ParamUpdate::page(1), true),
            Action::ToggleCapture { id, captured } => {
                if let Some(request) = self.reconciler.begin_capture(id, captured) {
                    self.services.spawn_capture(request);
                }
            }
            Action::OpenDetail(id) => self.detail = Some(id),
            Action::CloseDetail => self.detail = None,
        }
    }

    // ── Query flow ──────────────────────────────────────────────────────

    /// Write `update` to the param store and follow the resulting query.
    /// `force` refetches even if the query did not change (retry).
    fn apply_update(&mut self, update: ParamUpdate, force: bool) {
        let query = match self.params.update(update) {
            Ok(query) => query,
            Err(e) => {
                log::warn!("Failed to save session: {e}");
                self.push_notification(
                    "Could not save session".to_string(),
                    NotificationLevel::Warning,
                );
                self.params.read()
            }
        };

        if query == self.query && !force {
            return;
        }

        if query.filter_key() != self.query.filter_key() || query.page == 1 {
            self.catalog.reset();
        }
        self.scroll.on_page_changed(query.page);
        self.query = query;
        self.filters.sync(&self.query);
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        if let Some(plan) = self.reconciler.begin(&self.query) {
            self.services.spawn_fetch(plan);
        }
    }

    fn scroll_snapshot(&self) -> ScrollSnapshot {
        let metadata = self.reconciler.metadata();
        let visible = self.reconciler.error().is_none()
            && self.catalog.end_visible(self.reconciler.items().len());
        ScrollSnapshot {
            visible,
            fetching: self.reconciler.is_fetching(),
            has_next: metadata.is_some_and(|m| m.has_next),
            meta_page: metadata.map(|m| m.page).unwrap_or(0),
            current_page: u32::try_from(self.query.page).unwrap_or(0),
        }
    }

    fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.mode = self.theme.resolve();
        if let Err(e) = self.theme.save(&self.theme_path) {
            log::warn!("Failed to save theme preference: {e}");
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Push a notification (dedup by message, max 3).
    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }

        self.notification_counter += 1;
        self.notifications.push(Notification {
            id: self.notification_counter,
            message,
            level,
            ttl_ticks: 100,
        });

        while self.notifications.len() > 3 {
            self.notifications.remove(0);
        }
    }

    /// Tick: notification TTLs, search debounce, scroll trigger.
    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);

        let now = Instant::now();
        if let Some(update) = self.filters.poll(now) {
            self.apply_update(update, false);
        }

        let snapshot = self.scroll_snapshot();
        if let Some(page) = self.scroll.evaluate(now, &snapshot) {
            self.apply_update(ParamUpdate::page(i64::from(page)), false);
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let palette = self.palette();
        let layout = AppLayout::compute(area);

        if let Some(header) = layout.header {
            self.render_header(frame, header, palette);
        }

        self.filters.render(
            frame,
            layout.filters,
            &self.query,
            self.focus == Focus::Search,
            self.focus == Focus::Filters,
            palette,
        );
        self.catalog.render(
            frame,
            layout.main,
            &self.reconciler,
            self.focus == Focus::List,
            palette,
        );
        self.render_status_bar(frame, layout.status, palette);

        // Overlays
        self.render_notifications(frame, area, palette);

        if let Some(item) = self.detail.and_then(|id| self.reconciler.item(id)) {
            detail::render(
                frame,
                area,
                item,
                self.reconciler.is_updating(item.id),
                palette,
            );
        }

        if self.show_help {
            self.render_help_modal(frame, area, palette);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let line = Line::from(vec![
            Span::styled(" POKÉDEX ", palette.brand_badge()),
            Span::raw("  "),
            Span::styled("GENERATION I-IV", palette.muted()),
            Span::styled(" │ ", palette.dim()),
            Span::styled(
                format!("CAUGHT: {}", self.reconciler.captured_count()),
                Style::default()
                    .fg(palette.captured)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        let theme = Line::from(vec![
            Span::styled(self.theme.icon(), palette.highlight()),
            Span::styled(format!(" {} ", self.theme.as_str()), palette.muted()),
        ])
        .alignment(Alignment::Right);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(palette.border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(line), inner);
        frame.render_widget(Paragraph::new(theme), inner);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let query = self.params.query_string();
        let query = if query.is_empty() {
            "(defaults)".to_string()
        } else {
            format!("?{query}")
        };

        let status = Line::from(vec![
            Span::styled(" POKÉDEX ", palette.brand_badge()),
            Span::raw(" "),
            Span::styled(
                self.focus.label(),
                Style::default()
                    .fg(palette.primary_light)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" │ "),
            Span::styled(query, palette.muted()),
            Span::raw(" │ "),
            Span::styled("/", palette.key_hint()),
            Span::raw(":search "),
            Span::styled("Tab", palette.key_hint()),
            Span::raw(":focus "),
            Span::styled("t", palette.key_hint()),
            Span::raw(":theme "),
            Span::styled("?", palette.key_hint()),
            Span::raw(":help "),
            Span::styled("q", palette.key_hint()),
            Span::raw(":quit"),
        ]);

        frame.render_widget(Paragraph::new(status), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        if self.notifications.is_empty() {
            return;
        }

        let max_width = 50.min(area.width.saturating_sub(2));
        let height = self.notifications.len() as u16;
        let x = area.width.saturating_sub(max_width + 1);
        let y = 1;

        let notification_area = Rect::new(x, y, max_width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Info => ("ℹ", palette.info),
                    NotificationLevel::Success => ("✓", palette.success),
                    NotificationLevel::Warning => ("⚠", palette.warning),
                    NotificationLevel::Error => ("✗", palette.error),
                };
                Line::from(vec![
                    Span::styled(format!(" {prefix} "), Style::default().fg(color).bold()),
                    Span::raw(&n.message),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(Paragraph::new(lines), notification_area);
    }

    fn render_help_modal(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let modal = centered_rect(60, 80, area);

        let keybindings = vec![
            ("Global:", ""),
            ("q / Ctrl+C", "Quit"),
            ("?", "Toggle this help"),
            ("Tab / Shift+Tab", "Cycle focus: list, search, filters"),
            ("/", "Search"),
            ("f", "Filters"),
            ("t", "Cycle theme (light, dark, system)"),
            ("", ""),
            ("List:", ""),
            ("j/k", "Move selection"),
            ("g / G", "Top / bottom"),
            ("PgUp / PgDn", "Page up / down"),
            ("Enter", "Open details"),
            ("c", "Capture / release"),
            ("r", "Back to page 1 (after an error)"),
            ("", ""),
            ("Search:", ""),
            ("type", "Filter by name (applies after a pause)"),
            ("Ctrl+U", "Clear"),
            ("Esc / Enter", "Back to list"),
            ("", ""),
            ("Filters:", ""),
            ("h/l", "Select control"),
            ("Enter / j/k", "Change value"),
        ];

        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(" Keybindings", palette.title())),
            Line::raw(""),
        ];

        for (key, desc) in &keybindings {
            if key.is_empty() {
                lines.push(Line::raw(""));
            } else if desc.is_empty() {
                lines.push(Line::from(Span::styled(format!("  {key}"), palette.title())));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        format!("{:<18}", key),
                        Style::default().fg(palette.primary_light).bold(),
                    ),
                    Span::raw(*desc),
                ]));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  Press "),
            Span::styled("?", Style::default().fg(palette.primary_light).bold()),
            Span::raw(" or "),
            Span::styled("Esc", Style::default().fg(palette.primary_light).bold()),
            Span::raw(" to close"),
        ]));

        let block = Block::default()
            .title(" Help ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent));

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

fn map_global_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    match (modifiers, code) {
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('q')) => Some(Action::Quit),
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('?')) => Some(Action::ShowHelp),
        (KeyModifiers::NONE, KeyCode::Char('t')) => Some(Action::CycleTheme),
        (KeyModifiers::NONE, KeyCode::Char('/')) => Some(Action::FocusSearch),
        (KeyModifiers::NONE, KeyCode::Char('f')) => Some(Action::FocusFilters),
        (KeyModifiers::NONE, KeyCode::Esc) => Some(Action::FocusList),
        _ => None,
    }
}

/// Calculate a centered rect using percentage of parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::params::{MemoryQueryStore, PageLimit};
    use crate::catalog::testing::MockCatalog;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    /// App over a mock catalog with the scroll timers disabled.
    fn build_app(query: &str, catalog: Arc<MockCatalog>, dir: &TempDir) -> AppState {
        let mut config = AppConfig::default();
        config.data.data_dir = Some(dir.path().to_path_buf());
        config.scroll.warmup_ms = 0;
        config.scroll.debounce_ms = 0;

        let (tx, rx) = mpsc::unbounded_channel();
        let services = Services::new(catalog, tx);
        let store: Box<dyn QueryStore + Send> = Box::new(MemoryQueryStore::from_query(query));
        let app = AppState::new(&config, store, rx, services);
        app.catalog.set_viewport(100);
        app
    }

    /// Handle backend events until nothing is in flight.
    async fn settle(app: &mut AppState) {
        while app.reconciler.is_fetching() || app.reconciler.has_captures_in_flight() {
            let event = tokio::time::timeout(Duration::from_secs(5), app.event_rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("channel closed");
            app.handle_event(event);
        }
    }

    #[tokio::test]
    async fn test_initial_load_then_scroll_extends() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(3));
        let mut app = build_app("", catalog.clone(), &dir);

        app.start();
        settle(&mut app).await;
        assert_eq!(app.reconciler().items().len(), 10);

        // Arm, then fire
        app.on_tick();
        app.on_tick();
        assert_eq!(app.query().page, 2);
        settle(&mut app).await;
        assert_eq!(app.reconciler().items().len(), 20);
        assert!(app.params.query_string().contains("page=2"));
    }

    #[tokio::test]
    async fn test_scroll_stops_at_last_page() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(2));
        let mut app = build_app("page=2", catalog.clone(), &dir);

        app.start();
        settle(&mut app).await;
        assert_eq!(app.reconciler().items().len(), 20);
        let calls = catalog.call_count();

        for _ in 0..5 {
            app.on_tick();
        }
        assert_eq!(app.query().page, 2);
        assert_eq!(catalog.call_count(), calls);
    }

    #[tokio::test]
    async fn test_filter_change_goes_back_to_page_one() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(5));
        let mut app = build_app("page=3&limit=5", catalog, &dir);

        app.start();
        settle(&mut app).await;
        assert_eq!(app.reconciler().items().len(), 15);

        app.handle_event(AppEvent::Action(Action::UpdateQuery(ParamUpdate::category(
            Some("Fire".to_string()),
        ))));
        assert_eq!(app.query().page, 1);
        assert_eq!(app.query().limit, PageLimit::Five);
        settle(&mut app).await;

        let items = app.reconciler().items();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| i.type_one == "Fire"));
    }

    #[tokio::test]
    async fn test_back_to_first_page_after_rejected_page() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(5));
        let mut app = build_app("page=-2", catalog.clone(), &dir);

        app.start();
        assert!(app.reconciler().error().is_some());
        assert_eq!(catalog.call_count(), 0);

        app.handle_event(key(KeyCode::Char('r')));
        settle(&mut app).await;
        assert!(app.reconciler().error().is_none());
        assert_eq!(app.reconciler().items().len(), 10);
        assert_eq!(app.query().page, 1);
    }

    #[tokio::test]
    async fn test_capture_from_list() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(2));
        let mut app = build_app("", catalog.clone(), &dir);

        app.start();
        settle(&mut app).await;

        app.handle_event(key(KeyCode::Char('c')));
        assert!(app.reconciler().is_updating(1));
        settle(&mut app).await;

        assert!(app.reconciler().item(1).unwrap().captured);
        assert_eq!(app.reconciler().captured_count(), 1);
        assert_eq!(catalog.capture_count(), 1);
    }

    #[tokio::test]
    async fn test_search_is_debounced_through_ticks() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(2));
        let mut app = build_app("", catalog, &dir);
        app.start();
        settle(&mut app).await;

        app.handle_event(key(KeyCode::Char('/')));
        assert_eq!(app.focus, Focus::Search);
        for c in "bulb".chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
        app.on_tick();
        assert_eq!(app.query().search, "");

        tokio::time::sleep(Duration::from_millis(350)).await;
        app.on_tick();
        assert_eq!(app.query().search, "bulb");
    }

    #[tokio::test]
    async fn test_categories_failure_only_warns() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(2));
        catalog.fail_categories(true);
        let mut app = build_app("", catalog, &dir);

        app.start();
        settle(&mut app).await;
        while app.notifications.is_empty() {
            let event = tokio::time::timeout(Duration::from_secs(5), app.event_rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("channel closed");
            app.handle_event(event);
        }

        assert!(app.categories.is_empty());
        assert_eq!(app.reconciler().items().len(), 10);
        assert!(app.reconciler().error().is_none());
        assert_eq!(app.notifications.len(), 1);
        assert_eq!(app.notifications[0].level, NotificationLevel::Warning);
    }

    #[tokio::test]
    async fn test_filter_change_supersedes_slow_fetch() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(3));
        catalog.set_delay(50);
        let mut app = build_app("", catalog, &dir);

        app.start();
        app.handle_event(AppEvent::Action(Action::UpdateQuery(ParamUpdate::category(
            Some("Water".to_string()),
        ))));
        settle(&mut app).await;

        let items = app.reconciler().items();
        assert_eq!(items.len(), 10);
        assert!(items.iter().all(|i| i.type_one == "Water"));
    }

    #[tokio::test]
    async fn test_theme_cycle_persists() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MockCatalog::new(1));
        let mut app = build_app("", catalog.clone(), &dir);
        assert_eq!(app.theme(), ThemePreference::System);

        app.handle_event(key(KeyCode::Char('t')));
        assert_eq!(app.theme(), ThemePreference::Light);
        assert_eq!(
            ThemePreference::load(&dir.path().join("theme")),
            ThemePreference::Light
        );

        let reopened = build_app("", catalog, &dir);
        assert_eq!(reopened.theme(), ThemePreference::Light);
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(50, 50, area);
        assert!(centered.x > 0);
        assert!(centered.y > 0);
        assert!(centered.width > 0);
        assert!(centered.height > 0);
        assert!(centered.x + centered.width <= area.width);
        assert!(centered.y + centered.height <= area.height);
    }
}
