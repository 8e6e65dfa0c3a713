//! Main application state, event handling, and rendering.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, info};

use portfolio_dashboard::config::Config;
use portfolio_dashboard::list::{self, ApplyOutcome, ListController, ListState};
use portfolio_dashboard::modal::{DialogLayout, FocusId, KeyOutcome, ModalKey, ModalManager, UiHost};
use portfolio_dashboard::model::{self, Category, Record, StackCatalog};
use portfolio_dashboard::nav::{History, Location, Route};
use portfolio_dashboard::query::{self, Column, ListMode, OrderBy, QueryDescription};
use portfolio_dashboard::scrollspy::{self, ScrollSpy, YearGroup};
use portfolio_dashboard::store::RecordStore;

use crate::event::{Event, EventHandler};
use crate::theme::Theme;

/// Rows per timeline entry: title line plus meta line.
const TIMELINE_ROWS: u32 = 2;

/// Return value from event handling.
#[derive(Debug, PartialEq)]
pub enum Action {
    Continue,
    Quit,
    ForceRefresh,
}

/// Input mode for overlay states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Search,
    Help,
}

/// Every list the app can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListId {
    HomeProjects,
    WorksPreview,
    WorksAll,
    ProjectsAll,
    Timeline,
    StackCatalog,
}

/// Which half of the home screen has the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomePane {
    Projects,
    Works,
}

/// Core application state.
pub struct App {
    store: Arc<dyn RecordStore>,
    data_dir: PathBuf,
    pub config: Config,
    pub history: History,

    // Lists
    home_projects: ListController,
    works_preview: ListController,
    works_all: ListController,
    projects_all: ListController,
    timeline: ListController,
    stack_list: ListController,
    pub catalog: StackCatalog,
    year_groups: Vec<YearGroup>,
    pub spy: ScrollSpy,

    // UI state
    pub mode: InputMode,
    pub home_pane: HomePane,
    pub table_state: TableState,
    pub host: UiHost,
    pub modal: ModalManager,
    pub theme: Theme,

    // Status
    pub watcher_active: bool,
    pub last_refresh: Option<Instant>,
    pub error_message: Option<(String, Instant)>,
    pub clock: String,

    // Layout areas for mouse hit-testing
    pub list_area: Rect,
    pub index_area: Rect,
}

impl App {
    pub fn new(
        store: Arc<dyn RecordStore>,
        data_dir: PathBuf,
        config: Config,
        start: Location,
    ) -> Self {
        let host = UiHost::new();
        let spy = ScrollSpy::new(config.spy_offsets());
        let mut app = Self {
            store,
            data_dir,
            home_projects: ListController::fixed(home_projects_query()),
            works_preview: works_preview(&config),
            works_all: paged(model::Table::Works, &config),
            projects_all: paged(model::Table::Projects, &config),
            timeline: ListController::fixed(query::timeline_query(None)),
            stack_list: ListController::fixed(query::stack_catalog_query()),
            catalog: StackCatalog::new(),
            year_groups: Vec::new(),
            spy,
            history: History::new(start.clone()),
            config,
            mode: InputMode::Normal,
            home_pane: HomePane::Works,
            table_state: TableState::default(),
            modal: ModalManager::new(host.clone()),
            host,
            theme: Theme::portfolio(),
            watcher_active: false,
            last_refresh: None,
            error_message: None,
            clock: chrono::Local::now().format("%H:%M:%S").to_string(),
            list_area: Rect::default(),
            index_area: Rect::default(),
        };
        app.mount(&start);
        app
    }

    /// Main event loop.
    pub async fn run(&mut self, terminal: &mut ratatui::DefaultTerminal) -> color_eyre::Result<()> {
        let mut events = EventHandler::new(self.data_dir.clone(), self.config.watch);
        self.watcher_active = self.config.watch;
        let tx = events.sender();
        info!(location = %self.history.current(), "dashboard started");

        loop {
            self.dispatch_fetches(&tx);

            // RENDER
            terminal.draw(|frame| self.render(frame))?;

            // WAIT FOR EVENT
            let Some(event) = events.next().await else {
                break;
            };

            // UPDATE
            match self.handle_event(event) {
                Action::Quit => break,
                Action::ForceRefresh => self.refresh_all(),
                Action::Continue => {}
            }
        }

        self.modal.close();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Lists and fetching
    // ─────────────────────────────────────────────────────────

    fn list(&self, id: ListId) -> &ListController {
        match id {
            ListId::HomeProjects => &self.home_projects,
            ListId::WorksPreview => &self.works_preview,
            ListId::WorksAll => &self.works_all,
            ListId::ProjectsAll => &self.projects_all,
            ListId::Timeline => &self.timeline,
            ListId::StackCatalog => &self.stack_list,
        }
    }

    fn list_mut(&mut self, id: ListId) -> &mut ListController {
        match id {
            ListId::HomeProjects => &mut self.home_projects,
            ListId::WorksPreview => &mut self.works_preview,
            ListId::WorksAll => &mut self.works_all,
            ListId::ProjectsAll => &mut self.projects_all,
            ListId::Timeline => &mut self.timeline,
            ListId::StackCatalog => &mut self.stack_list,
        }
    }

    /// Lists the current route keeps loaded.
    pub fn mounted_lists(&self) -> Vec<ListId> {
        let mut ids = vec![ListId::HomeProjects];
        match self.route() {
            Route::Home => ids.extend([ListId::WorksPreview, ListId::StackCatalog]),
            Route::Works => ids.extend([ListId::WorksAll, ListId::StackCatalog]),
            Route::Projects => ids.push(ListId::ProjectsAll),
            Route::History => ids.push(ListId::Timeline),
            Route::ProjectDetail(_) => {}
        }
        ids
    }

    /// The card list that owns the selection.
    pub fn active_list(&self) -> Option<ListId> {
        match self.route() {
            Route::Home => Some(match self.home_pane {
                HomePane::Projects => ListId::HomeProjects,
                HomePane::Works => ListId::WorksPreview,
            }),
            Route::Works => Some(ListId::WorksAll),
            Route::Projects => Some(ListId::ProjectsAll),
            Route::History | Route::ProjectDetail(_) => None,
        }
    }

    /// The list the filter bar edits.
    pub fn filter_list(&self) -> Option<ListId> {
        match self.route() {
            Route::Home => Some(ListId::WorksPreview),
            Route::Works => Some(ListId::WorksAll),
            _ => None,
        }
    }

    fn dispatch_fetches(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        for id in self.mounted_lists() {
            let Some(ticket) = self.list_mut(id).poll_request() else {
                continue;
            };
            let store = Arc::clone(&self.store);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = list::execute(store.as_ref(), &ticket).await;
                let _ = tx.send(Event::Fetched {
                    list: id,
                    seq: ticket.seq,
                    result,
                });
            });
        }
    }

    fn refresh_all(&mut self) {
        for id in self.mounted_lists() {
            self.list_mut(id).refresh();
        }
    }

    fn on_fetched(&mut self, id: ListId, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Discarded => return,
            ApplyOutcome::Reclamped { page } => {
                debug!(?id, page, "page past the end, clamped");
                let mut location = self.history.current().clone();
                location.set_page(page);
                self.history.replace(location);
            }
            ApplyOutcome::Applied => {}
        }

        self.last_refresh = Some(Instant::now());
        let list = self.list(id);
        if list.state() == ListState::Failed {
            self.error_message = Some((
                format!("Could not load {}", list_label(id)),
                Instant::now(),
            ));
        }

        match id {
            ListId::StackCatalog => {
                self.catalog = StackCatalog::from_records(self.stack_list.records());
            }
            ListId::Timeline => {
                self.year_groups = scrollspy::group_by_year(self.timeline.records());
                let sections = scrollspy::layout_sections(&self.year_groups, TIMELINE_ROWS);
                self.spy.set_sections(sections);
            }
            _ => {}
        }

        if Some(id) == self.active_list() {
            self.clamp_selection();
            self.sync_card_focus();
        }
    }

    // ─────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────

    pub fn route(&self) -> Route {
        self.history.current().route
    }

    /// Create the lists a location needs. Filters start empty on mount.
    fn mount(&mut self, location: &Location) {
        match location.route {
            Route::Home => self.works_preview.remount(1),
            Route::Works => self.works_all.remount(location.page),
            Route::Projects => self.projects_all.remount(location.page),
            Route::History => {
                self.timeline.remount(1);
                self.year_groups.clear();
                self.spy.clear();
                self.spy.apply_hash(location.hash.as_deref());
            }
            Route::ProjectDetail(_) => {}
        }
        if matches!(location.route, Route::Home | Route::Works) {
            self.stack_list.refresh();
        }
        self.table_state.select(None);
        self.clamp_selection();
        self.sync_card_focus();
    }

    fn navigate(&mut self, location: Location) {
        if self.modal.is_open() {
            self.modal.close();
        }
        let previous = self.history.current().clone();
        self.history.push(location);
        self.follow_location(&previous);
    }

    fn go_back(&mut self) {
        let previous = self.history.current().clone();
        if self.history.back() {
            self.follow_location(&previous);
        }
    }

    /// Bring lists in line with the current location after it changed.
    fn follow_location(&mut self, previous: &Location) {
        let current = self.history.current().clone();
        if current.route != previous.route {
            debug!(from = %previous, to = %current, "route changed");
            self.mount(&current);
            return;
        }
        if current.page != previous.page {
            if let Some(id) = self.active_list() {
                self.list_mut(id).set_page(i64::from(current.page));
            }
        }
        if current.hash != previous.hash && current.route == Route::History {
            self.spy.apply_hash(current.hash.as_deref());
        }
    }

    fn go_to_page(&mut self, requested: i64) {
        let Some(id) = self.active_list() else {
            return;
        };
        let list = self.list_mut(id);
        if !list.is_paged() || !list.set_page(requested) {
            return;
        }
        let page = list.page();
        self.history.push_page(page);
        self.table_state.select(Some(0));
        self.sync_card_focus();
    }

    fn cycle_tab(&mut self, backwards: bool) {
        let tabs = Route::TABS;
        let pos = tabs.iter().position(|r| *r == self.route()).unwrap_or(0);
        let next = if backwards {
            (pos + tabs.len() - 1) % tabs.len()
        } else {
            (pos + 1) % tabs.len()
        };
        self.navigate(Location::new(tabs[next]));
    }

    // ─────────────────────────────────────────────────────────
    // Selection and focus
    // ─────────────────────────────────────────────────────────

    fn active_records(&self) -> &[Record] {
        self.active_list().map_or(&[], |id| self.list(id).records())
    }

    pub fn selected_record(&self) -> Option<&Record> {
        let idx = self.table_state.selected()?;
        self.active_records().get(idx)
    }

    fn clamp_selection(&mut self) {
        let len = self.active_records().len();
        let selected = match (self.table_state.selected(), len) {
            (_, 0) => None,
            (Some(i), n) => Some(i.min(n - 1)),
            (None, _) => Some(0),
        };
        self.table_state.select(selected);
    }

    fn select_offset(&mut self, delta: isize) {
        let len = self.active_records().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.table_state.select(Some(next));
        self.sync_card_focus();
    }

    /// Mount one focusable per visible card; focus follows the selection
    /// unless the dialog holds it.
    fn sync_card_focus(&mut self) {
        let focus = &self.host.focus;
        focus.unmount_prefix("card-");
        for record in self.active_records() {
            focus.mount(FocusId::card(record.id));
        }
        if self.modal.is_open() {
            return;
        }
        if let Some(record) = self.selected_record() {
            focus.focus(&FocusId::card(record.id));
        }
    }

    fn open_selected(&mut self) {
        if self.route() == Route::Home && self.home_pane == HomePane::Projects {
            if let Some(idx) = self.table_state.selected() {
                self.navigate(Location::new(Route::ProjectDetail(idx)));
            }
            return;
        }
        if let Some(record) = self.selected_record().cloned() {
            let layout = DialogLayout::for_record(&record);
            self.modal.open(record, layout);
        }
    }

    // ─────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────

    /// Handle a single event.
    pub fn handle_event(&mut self, event: Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            Event::Frame => {
                self.spy.on_frame();
                Action::Continue
            }
            Event::Tick => {
                self.clock = chrono::Local::now().format("%H:%M:%S").to_string();
                // Auto-dismiss errors after 10 seconds
                if let Some((_, when)) = &self.error_message {
                    if when.elapsed().as_secs() >= 10 {
                        self.error_message = None;
                    }
                }
                Action::Continue
            }
            Event::StoreChanged(paths) => {
                debug!(count = paths.len(), "data files changed");
                self.watcher_active = true;
                self.refresh_all();
                Action::Continue
            }
            Event::Fetched { list, seq, result } => {
                let outcome = self.list_mut(list).complete(seq, result);
                self.on_fetched(list, outcome);
                Action::Continue
            }
            Event::Resize(width, _) => {
                self.spy.set_viewport_width(width);
                Action::Continue
            }
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Action {
        // The dialog listener sees keys first
        if self.modal.is_open() {
            let modal_key = match key.code {
                KeyCode::Esc => ModalKey::Escape,
                KeyCode::BackTab => ModalKey::BackTab,
                KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => ModalKey::BackTab,
                KeyCode::Tab => ModalKey::Tab,
                KeyCode::Enter => ModalKey::Enter,
                _ => ModalKey::Other,
            };
            if let KeyOutcome::Closed = self.modal.handle_key(modal_key) {
                self.sync_card_focus();
            }
            return Action::Continue;
        }

        // Global keys
        match key.code {
            KeyCode::Char('q') if self.mode == InputMode::Normal => return Action::Quit,
            KeyCode::Char('?') if self.mode != InputMode::Search => {
                self.mode = if self.mode == InputMode::Help {
                    InputMode::Normal
                } else {
                    InputMode::Help
                };
                return Action::Continue;
            }
            KeyCode::Esc => {
                match self.mode {
                    InputMode::Search => {
                        self.mode = InputMode::Normal;
                        self.edit_filter(|list| list.set_search(""));
                    }
                    InputMode::Help => self.mode = InputMode::Normal,
                    InputMode::Normal => {}
                }
                return Action::Continue;
            }
            _ => {}
        }

        // Help mode: any key dismisses
        if self.mode == InputMode::Help {
            self.mode = InputMode::Normal;
            return Action::Continue;
        }

        // Search mode: capture all input
        if self.mode == InputMode::Search {
            match key.code {
                KeyCode::Char(c) => self.edit_filter(|list| {
                    let text = format!("{}{c}", list.filter().search_text);
                    list.set_search(text)
                }),
                KeyCode::Backspace => self.edit_filter(|list| {
                    let mut text = list.filter().search_text.clone();
                    text.pop();
                    list.set_search(text)
                }),
                KeyCode::Enter => self.mode = InputMode::Normal,
                _ => {}
            }
            return Action::Continue;
        }

        match self.route() {
            Route::History => self.handle_history_key(key),
            Route::ProjectDetail(_)
                if matches!(key.code, KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Enter) =>
            {
                self.go_back_or_home();
                return Action::Continue;
            }
            _ => {}
        }

        // Normal mode keys
        match key.code {
            KeyCode::Tab => self.cycle_tab(false),
            KeyCode::BackTab => self.cycle_tab(true),
            KeyCode::Char('b') | KeyCode::Backspace => self.go_back(),
            KeyCode::Down | KeyCode::Char('j') if self.route() != Route::History => {
                self.select_offset(1)
            }
            KeyCode::Up | KeyCode::Char('k') if self.route() != Route::History => {
                self.select_offset(-1)
            }
            KeyCode::Left | KeyCode::Char('h') if self.route() == Route::Home => {
                self.home_pane = HomePane::Projects;
                self.table_state.select(Some(0));
                self.clamp_selection();
                self.sync_card_focus();
            }
            KeyCode::Right | KeyCode::Char('l') if self.route() == Route::Home => {
                self.home_pane = HomePane::Works;
                self.table_state.select(Some(0));
                self.clamp_selection();
                self.sync_card_focus();
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('/') if self.filter_list().is_some() => self.mode = InputMode::Search,
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                if let Some(category) = Category::ALL.get(idx) {
                    let name = category.as_str();
                    self.edit_filter(|list| list.toggle_category(name));
                }
            }
            KeyCode::Char('0') => self.edit_filter(|list| list.set_categories(Default::default())),
            KeyCode::Char('x') => {
                let catalog = self.catalog.clone();
                self.edit_filter(|list| {
                    let next = catalog.cycle(list.filter().stack_token.as_deref());
                    list.set_stack_token(next.as_deref())
                });
            }
            KeyCode::Char('s') => self.edit_filter(|list| {
                let next = list.filter().sort.next();
                list.set_sort(next)
            }),
            KeyCode::Char('R') => self.edit_filter(ListController::reset_filters),
            KeyCode::Char('[') => self.page_step(-1),
            KeyCode::Char(']') => self.page_step(1),
            KeyCode::Char('{') => self.go_to_page(1),
            KeyCode::Char('}') => self.go_to_page(i64::MAX),
            KeyCode::Char('r') => return Action::ForceRefresh,
            KeyCode::Char('g') => self.navigate(Location::new(Route::Home)),
            KeyCode::Char('w') => self.navigate(Location::new(Route::Works)),
            KeyCode::Char('p') => self.navigate(Location::new(Route::Projects)),
            KeyCode::Char('y') => self.navigate(Location::new(Route::History)),
            _ => {}
        }

        Action::Continue
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.spy.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.spy.scroll_by(-1),
            KeyCode::PageDown => self.spy.scroll_by(10),
            KeyCode::PageUp => self.spy.scroll_by(-10),
            KeyCode::Char('n') => self.jump_section(1),
            KeyCode::Char('N') => self.jump_section(-1),
            _ => {}
        }
    }

    fn jump_section(&mut self, delta: isize) {
        let sections = self.spy.sections();
        if sections.is_empty() {
            return;
        }
        let current = self
            .spy
            .active_id()
            .and_then(|id| sections.iter().position(|s| s.id == id))
            .unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, sections.len() as isize - 1) as usize;
        let id = sections[next].id.clone();
        self.spy.click_anchor(&id, &mut self.history);
    }

    fn go_back_or_home(&mut self) {
        if self.history.len() > 1 {
            self.go_back();
        } else {
            self.navigate(Location::new(Route::Home));
        }
    }

    fn page_step(&mut self, delta: i64) {
        if let Some(id) = self.active_list() {
            let page = i64::from(self.list(id).page());
            self.go_to_page(page + delta);
        }
    }

    /// Apply a filter edit to the list the filter bar controls.
    fn edit_filter(&mut self, edit: impl FnOnce(&mut ListController) -> bool) {
        let Some(id) = self.filter_list() else {
            return;
        };
        if edit(self.list_mut(id)) {
            // filter changes land on page 1
            if id == ListId::WorksAll && self.history.current().page != 1 {
                let mut location = self.history.current().clone();
                location.set_page(1);
                self.history.replace(location);
            }
            if Some(id) == self.active_list() {
                self.table_state.select(Some(0));
            }
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Action {
        if self.modal.is_open() {
            return Action::Continue;
        }
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.route() == Route::History && self.index_area.contains(position) {
                    // border (1) then one row per year
                    let row = mouse.row.saturating_sub(self.index_area.y + 1) as usize;
                    if let Some(id) = self.spy.sections().get(row).map(|s| s.id.clone()) {
                        self.spy.click_anchor(&id, &mut self.history);
                    }
                } else if self.list_area.contains(position) {
                    // border (1), each card is 2 rows
                    let row = mouse.row.saturating_sub(self.list_area.y + 1);
                    let idx = (row / 2) as usize + self.table_state.offset();
                    if idx < self.active_records().len() {
                        self.table_state.select(Some(idx));
                        self.sync_card_focus();
                    }
                }
            }
            MouseEventKind::ScrollDown => {
                if self.route() == Route::History {
                    self.spy.scroll_by(3);
                } else if self.list_area.contains(position) {
                    self.select_offset(1);
                }
            }
            MouseEventKind::ScrollUp => {
                if self.route() == Route::History {
                    self.spy.scroll_by(-3);
                } else if self.list_area.contains(position) {
                    self.select_offset(-1);
                }
            }
            _ => {}
        }
        Action::Continue
    }

    // ─────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.spy.set_viewport_width(area.width);

        // Graceful degradation for tiny terminals
        if area.width < 40 || area.height < 12 {
            let msg = Paragraph::new("Terminal too small. Resize to at least 80x24.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.theme.error));
            frame.render_widget(msg, area);
            return;
        }

        let has_error = self.error_message.is_some();
        let mut constraints = vec![Constraint::Length(1)]; // title bar
        if has_error {
            constraints.push(Constraint::Length(1)); // error bar
        }
        constraints.push(Constraint::Fill(1)); // main content
        constraints.push(Constraint::Length(1)); // status bar

        let areas: Vec<Rect> = Layout::vertical(constraints).split(area).to_vec();
        let (title_area, main_area, status_area) = if has_error {
            (areas[0], areas[2], areas[3])
        } else {
            (areas[0], areas[1], areas[2])
        };

        self.render_title_bar(frame, title_area);
        if has_error {
            self.render_error_bar(frame, areas[1]);
        }
        self.render_status_bar(frame, status_area);

        self.list_area = Rect::default();
        self.index_area = Rect::default();
        match self.route() {
            Route::Home => self.render_home(frame, main_area),
            Route::Works => self.render_paged(frame, main_area, ListId::WorksAll),
            Route::Projects => self.render_paged(frame, main_area, ListId::ProjectsAll),
            Route::History => self.render_history(frame, main_area),
            Route::ProjectDetail(idx) => self.render_project_detail(frame, main_area, idx),
        }

        // Overlays
        if self.modal.is_open() {
            self.render_dialog(frame, area);
        }
        if self.mode == InputMode::Search {
            self.render_search_overlay(frame, area);
        }
        if self.mode == InputMode::Help {
            self.render_help_overlay(frame, area);
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let watcher_indicator = if !self.config.watch {
            Span::styled("○ STATIC", Style::default().fg(theme.text_secondary))
        } else if self.watcher_active {
            Span::styled("● WATCHING", Style::default().fg(theme.success))
        } else {
            Span::styled("● WATCHER ERROR", Style::default().fg(theme.error))
        };

        let mut spans = vec![Span::styled(
            " ◇ Portfolio  ",
            Style::default().add_modifier(Modifier::BOLD),
        )];
        let current = self.route();
        for tab in Route::TABS {
            let style = if tab == current {
                Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_on_bar)
            };
            spans.push(Span::styled(format!(" {} ", tab.label()), style));
        }
        let location = self.history.current().to_string();
        let used: usize = spans.iter().map(|s| s.width()).sum();
        let tail = location.len() + self.clock.len() + 16;
        let padding = (area.width as usize).saturating_sub(used + tail);
        spans.extend([
            Span::raw(" ".repeat(padding)),
            Span::styled(location, Style::default().fg(theme.text_secondary)),
            Span::raw("  "),
            Span::raw(self.clock.clone()),
            Span::raw("  "),
            watcher_indicator,
            Span::raw(" "),
        ]);

        frame.render_widget(
            Paragraph::new(Line::from(spans))
                .style(Style::default().bg(theme.bar_bg).fg(theme.text_on_bar)),
            area,
        );
    }

    fn render_error_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some((ref msg, _)) = self.error_message {
            let line = Line::from(Span::styled(
                format!(" ⚠ {msg}"),
                Style::default().fg(self.theme.bar_bg).bg(self.theme.warning),
            ));
            frame.render_widget(
                Paragraph::new(line).style(Style::default().bg(self.theme.warning)),
                area,
            );
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let keys: &[(&str, &str)] = match self.route() {
            _ if self.modal.is_open() => &[("Tab", "Next"), ("Esc", "Close")],
            Route::History => &[("↑↓", "Scroll"), ("n/N", "Next/prev year"), ("Click", "Jump to year")],
            Route::ProjectDetail(_) => &[("b", "Back to list")],
            Route::Projects => &[("↑↓", "Navigate"), ("Enter", "Open"), ("[ ]", "Page")],
            _ => &[
                ("↑↓", "Navigate"),
                ("Enter", "Open"),
                ("/", "Search"),
                ("1-6", "Category"),
                ("x", "Stack"),
                ("s", "Sort"),
                ("R", "Reset"),
            ],
        };

        let mut spans = Vec::new();
        for (key, label) in keys.iter().chain(&[("?", "Help"), ("q", "Quit")]) {
            spans.push(Span::styled(
                format!(" {key}"),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(" {label} ")));
        }
        if let Some(when) = self.last_refresh {
            spans.push(Span::styled(
                format!("  ⟳ {}s ago", when.elapsed().as_secs()),
                Style::default().fg(self.theme.text_secondary),
            ));
        }

        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(
                Style::default()
                    .bg(self.theme.bar_bg)
                    .fg(self.theme.text_on_bar),
            ),
            area,
        );
    }

    fn render_home(&mut self, frame: &mut Frame, area: Rect) {
        let [filter_area, body] =
            Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(area);
        self.render_filter_bar(frame, filter_area, ListId::WorksPreview);

        let [projects_area, works_area] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                .areas(body);

        let works_title = format!(" {} ", model::Table::Works.label());
        match self.home_pane {
            HomePane::Projects => {
                self.render_cards(frame, projects_area, ListId::HomeProjects, " Projects ", true);
                self.render_cards(frame, works_area, ListId::WorksPreview, &works_title, false);
            }
            HomePane::Works => {
                self.render_cards(frame, projects_area, ListId::HomeProjects, " Projects ", false);
                self.render_cards(frame, works_area, ListId::WorksPreview, &works_title, true);
            }
        }
    }

    fn render_paged(&mut self, frame: &mut Frame, area: Rect, id: ListId) {
        let mut constraints = vec![Constraint::Fill(1), Constraint::Length(1)];
        if id == ListId::WorksAll {
            constraints.insert(0, Constraint::Length(2));
        }
        let areas: Vec<Rect> = Layout::vertical(constraints).split(area).to_vec();
        let (cards_area, pager_area) = if id == ListId::WorksAll {
            self.render_filter_bar(frame, areas[0], id);
            (areas[1], areas[2])
        } else {
            (areas[0], areas[1])
        };

        let title = format!(" {} · {} ", list_label(id), self.list(id).total_count());
        self.render_cards(frame, cards_area, id, &title, true);
        self.render_pager(frame, pager_area, id);
    }

    fn render_filter_bar(&self, frame: &mut Frame, area: Rect, id: ListId) {
        let theme = self.theme;
        let filter = self.list(id).filter();
        let [search_area, chips_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

        let search = if filter.search_text.is_empty() {
            Span::styled(" / search title or description", Style::default().fg(theme.text_secondary))
        } else {
            Span::styled(format!(" / {}", filter.search_text), Style::default().fg(theme.text_primary))
        };
        let stack = match &filter.stack_token {
            Some(token) => Span::styled(
                format!("  Stack: {}", StackCatalog::label(token)),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ),
            None => Span::styled("  Stack: any", Style::default().fg(theme.text_secondary)),
        };
        let sort = Span::styled(
            format!("  Sort: {}", filter.sort.label()),
            Style::default().fg(theme.text_secondary),
        );
        frame.render_widget(Paragraph::new(Line::from(vec![search, stack, sort])), search_area);

        let mut chips = vec![Span::raw(" ")];
        for (i, category) in Category::ALL.iter().enumerate() {
            let active = filter.categories.contains(category.as_str());
            let style = if active {
                theme.category_badge(*category).add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(theme.category_color(*category))
            };
            chips.push(Span::styled(
                format!("{} {} {} ", i + 1, category.icon(), category.as_str()),
                style,
            ));
            chips.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(chips)), chips_area);
    }

    fn render_cards(&mut self, frame: &mut Frame, area: Rect, id: ListId, title: &str, active: bool) {
        let theme = self.theme;
        let block = Block::bordered()
            .border_style(Style::default().fg(if active { theme.accent } else { theme.border }))
            .title(title.to_string());

        let list = self.list(id);
        if let Some(message) = empty_message(list) {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new(message)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(theme.text_secondary)),
                inner,
            );
            if active {
                self.list_area = area;
            }
            return;
        }

        let rows: Vec<Row> = list
            .records()
            .iter()
            .map(|record| card_row(record, &theme))
            .collect();
        let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(10)])
            .block(block)
            .row_highlight_style(
                Style::default()
                    .bg(theme.accent)
                    .fg(theme.text_on_bar)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");

        if active {
            self.list_area = area;
            frame.render_stateful_widget(table, area, &mut self.table_state);
        } else {
            frame.render_stateful_widget(table, area, &mut TableState::default());
        }
    }

    fn render_pager(&self, frame: &mut Frame, area: Rect, id: ListId) {
        let theme = self.theme;
        let list = self.list(id);
        let pagination = list.pagination();
        let window = list.page_window(self.config.page_window);

        let enabled = |on: bool| {
            if on {
                Style::default().fg(theme.text_primary)
            } else {
                Style::default().fg(theme.border)
            }
        };
        let mut spans = vec![
            Span::styled(" « ", enabled(pagination.has_prev())),
            Span::styled("‹ ", enabled(pagination.has_prev())),
        ];
        if window.leading_ellipsis {
            spans.push(Span::styled("… ", Style::default().fg(theme.text_secondary)));
        }
        for page in window.pages() {
            let style = if page == pagination.page {
                Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(theme.text_secondary)
            };
            spans.push(Span::styled(format!(" {page} "), style));
        }
        if window.trailing_ellipsis {
            spans.push(Span::styled(" …", Style::default().fg(theme.text_secondary)));
        }
        spans.push(Span::styled(" ›", enabled(pagination.has_next())));
        spans.push(Span::styled(" »", enabled(pagination.has_next())));
        spans.push(Span::styled(
            format!("   page {} of {}", pagination.page, pagination.total_pages()),
            Style::default().fg(theme.text_secondary),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
    }

    fn render_history(&mut self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let [index_area, body_area] =
            Layout::horizontal([Constraint::Length(14), Constraint::Fill(1)]).areas(area);
        self.index_area = index_area;

        let index: Vec<Line> = self
            .spy
            .sections()
            .iter()
            .map(|s| {
                let label = s.id.trim_start_matches("year-").to_string();
                if self.spy.is_active(&s.id) {
                    Line::styled(
                        format!("▸ {label}"),
                        Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Line::styled(format!("  {label}"), Style::default().fg(theme.text_secondary))
                }
            })
            .collect();
        frame.render_widget(
            Paragraph::new(index).block(
                Block::bordered()
                    .border_style(Style::default().fg(theme.border))
                    .title(" Years "),
            ),
            index_area,
        );

        let block = Block::bordered()
            .border_style(Style::default().fg(theme.border))
            .title(" Work History ");
        let inner = block.inner(body_area);
        frame.render_widget(block, body_area);

        if let Some(message) = empty_message(&self.timeline) {
            frame.render_widget(
                Paragraph::new(message)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(theme.text_secondary)),
                inner,
            );
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        for group in &self.year_groups {
            lines.push(Line::styled(
                format!("━━ {} ━━  ({})", group.year, group.records.len()),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ));
            for record in &group.records {
                lines.extend(timeline_lines(record, &theme));
            }
            lines.push(Line::raw(""));
        }

        let scroll = u16::try_from(self.spy.scroll_y()).unwrap_or(u16::MAX);
        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
    }

    fn render_project_detail(&self, frame: &mut Frame, area: Rect, idx: usize) {
        let theme = self.theme;
        let block = Block::bordered()
            .border_style(Style::default().fg(theme.border))
            .title(" Project ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.home_projects.is_loading() && self.home_projects.records().is_empty() {
            frame.render_widget(
                Paragraph::new("Loading…").alignment(Alignment::Center),
                inner,
            );
            return;
        }

        let Some(project) = self.home_projects.records().get(idx) else {
            let lines = vec![
                Line::styled(
                    "Project not found",
                    Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
                ),
                Line::raw(""),
                Line::styled("← b  back to list", Style::default().fg(theme.accent)),
            ];
            frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
            return;
        };

        frame.render_widget(
            Paragraph::new(record_detail_lines(project, &theme)).wrap(Wrap { trim: false }),
            inner,
        );
    }

    fn render_dialog(&self, frame: &mut Frame, area: Rect) {
        let Some(record) = self.modal.record() else {
            return;
        };
        let theme = self.theme;
        let popup = centered_rect(70, 22.min(area.height.saturating_sub(2)), area);
        frame.render_widget(Clear, popup);

        let mut lines = record_detail_lines(record, &theme);
        lines.push(Line::raw(""));

        let mut buttons = Vec::new();
        if let Some(layout) = self.modal.layout() {
            for id in &layout.focusables {
                let label = id.as_str().trim_start_matches("dialog-");
                let style = if self.host.focus.is_focused(id) {
                    Style::default()
                        .fg(theme.text_on_bar)
                        .bg(theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else if self.host.focus.is_focusable(id) {
                    Style::default().fg(theme.accent)
                } else {
                    Style::default().fg(theme.border).add_modifier(Modifier::DIM)
                };
                buttons.push(Span::styled(format!("[ {label} ]"), style));
                buttons.push(Span::raw("  "));
            }
        }
        lines.push(Line::from(buttons));

        let category = record.category_kind();
        let dialog = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::bordered()
                .title(format!(" {} {} ", category.icon(), record.title))
                .border_style(Style::default().fg(theme.category_color(category)))
                .style(Style::default().bg(theme.surface)),
        );
        frame.render_widget(dialog, popup);
    }

    fn render_search_overlay(&self, frame: &mut Frame, area: Rect) {
        let search_area = Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width.saturating_sub(2),
            height: 1,
        };
        frame.render_widget(Clear, search_area);

        let text = self
            .filter_list()
            .map(|id| self.list(id).filter().search_text.clone())
            .unwrap_or_default();
        let search_line = Line::from(vec![
            Span::styled(
                " / ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(text),
            Span::styled("█", Style::default().fg(self.theme.accent)),
        ]);

        frame.render_widget(
            Paragraph::new(search_line).style(
                Style::default()
                    .bg(self.theme.surface)
                    .fg(self.theme.text_primary),
            ),
            search_area,
        );
    }

    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 24, area);
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::styled(
                "Keyboard Shortcuts",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Line::raw(""),
            Line::raw("  Tab/S-Tab  Next/previous tab"),
            Line::raw("  g w p y    Home / Works / Projects / History"),
            Line::raw("  b          Back"),
            Line::raw("  ↑/k ↓/j    Move selection (scroll in History)"),
            Line::raw("  ←/h →/l    Projects / works pane on Home"),
            Line::raw("  Enter      Open details"),
            Line::raw("  /          Search title and description"),
            Line::raw("  1-6 / 0    Toggle category / clear categories"),
            Line::raw("  x          Cycle stack filter"),
            Line::raw("  s          Toggle sort (Recent ↔ Title)"),
            Line::raw("  R          Reset filters"),
            Line::raw("  [ ] { }    Previous/next, first/last page"),
            Line::raw("  n/N        Next/previous year"),
            Line::raw("  r          Force refresh"),
            Line::raw("  ?          Toggle this help"),
            Line::raw("  q          Quit"),
            Line::raw(""),
            Line::styled(
                "Press any key to close",
                Style::default().fg(self.theme.text_secondary),
            ),
        ];

        let help = Paragraph::new(help_text).block(
            Block::bordered()
                .title(" Help ")
                .border_style(Style::default().fg(self.theme.accent))
                .style(Style::default().bg(self.theme.surface)),
        );

        frame.render_widget(help, popup_area);
    }
}

// ─────────────────────────────────────────────────────────
// Standalone helper functions
// ─────────────────────────────────────────────────────────

fn home_projects_query() -> QueryDescription {
    QueryDescription::new(model::Table::Projects).order_by(OrderBy::asc(Column::Id))
}

fn works_preview(config: &Config) -> ListController {
    ListController::new(
        model::Table::Works,
        ListMode::Preview {
            limit: config.preview_limit,
        },
    )
}

fn paged(table: model::Table, config: &Config) -> ListController {
    ListController::new(
        table,
        ListMode::Paged {
            page_size: config.page_size,
        },
    )
}

fn list_label(id: ListId) -> &'static str {
    match id {
        ListId::HomeProjects | ListId::ProjectsAll => "Projects",
        ListId::WorksPreview | ListId::WorksAll => "Works",
        ListId::Timeline => "Work History",
        ListId::StackCatalog => "Stack catalog",
    }
}

/// Placeholder text for a list with nothing to show yet.
fn empty_message(list: &ListController) -> Option<&'static str> {
    if !list.records().is_empty() {
        return None;
    }
    Some(match list.state() {
        ListState::Idle | ListState::Loading { .. } => "Loading…",
        ListState::Failed => "Could not load. Press r to retry.",
        ListState::Ready if list.filter().is_narrowed() => "No matches. Press R to reset filters.",
        ListState::Ready => "Nothing here yet.",
    })
}

fn card_row(record: &Record, theme: &Theme) -> Row<'static> {
    let category = record.category_kind();
    let title = Line::from(vec![
        Span::styled(
            format!("{} ", category.icon()),
            Style::default().fg(theme.category_color(category)),
        ),
        Span::styled(record.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ]);
    let stack = model::display_tokens(record.stack.as_deref().unwrap_or_default())
        .iter()
        .map(|t| StackCatalog::label(t))
        .collect::<Vec<_>>()
        .join(" · ");
    let subtitle = Line::from(vec![
        Span::styled(format!("{} ", category.style_key()), theme.category_badge(category)),
        Span::styled(stack, Style::default().fg(theme.text_secondary)),
    ]);

    let side = Text::from(vec![
        Line::styled(record.card_year(), Style::default().fg(theme.text_secondary)),
        Line::styled(
            format!("▲ {}", record.impact_label()),
            Style::default().fg(theme.success),
        ),
    ]);

    Row::new(vec![
        Cell::from(Text::from(vec![title, subtitle])),
        Cell::from(side),
    ])
    .height(2)
}

fn timeline_lines(record: &Record, theme: &Theme) -> [Line<'static>; 2] {
    let category = record.category_kind();
    let title = Line::from(vec![
        Span::styled(
            format!("  {} ", category.icon()),
            Style::default().fg(theme.category_color(category)),
        ),
        Span::styled(record.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {}", record.work_period.clone().unwrap_or_default()),
            Style::default().fg(theme.text_secondary),
        ),
    ]);
    let meta = [record.work_company.as_deref(), record.work_result.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" · ");
    [
        title,
        Line::styled(format!("     {meta}"), Style::default().fg(theme.text_secondary)),
    ]
}

fn record_detail_lines(record: &Record, theme: &Theme) -> Vec<Line<'static>> {
    let category = record.category_kind();
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} {}", category.icon(), category.as_str()),
                theme.category_badge(category),
            ),
            Span::styled(
                format!("  ·  {}  ·  impact {}", record.card_year(), record.impact_label()),
                Style::default().fg(theme.text_secondary),
            ),
        ]),
        Line::styled(
            record.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
    ];

    if let Some(description) = record.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.extend(description.lines().map(|l| Line::raw(l.to_string())));
        lines.push(Line::raw(""));
    }

    let tokens = model::display_tokens(record.stack.as_deref().unwrap_or_default());
    if !tokens.is_empty() {
        let stack = tokens
            .iter()
            .map(|t| StackCatalog::label(t))
            .collect::<Vec<_>>()
            .join(" · ");
        lines.push(labeled("Stack", stack, theme));
    }
    let fields = [
        ("Period", &record.work_period),
        ("Company", &record.work_company),
        ("Result", &record.work_result),
        ("Tools", &record.dev_tools),
        ("Repo", &record.repo),
        ("Demo", &record.demo),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            lines.push(labeled(label, value.to_string(), theme));
        }
    }
    lines
}

fn labeled(label: &str, value: String, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:>8}  "), Style::default().fg(theme.text_secondary)),
        Span::raw(value),
    ])
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}
