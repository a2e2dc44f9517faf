// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Terminal host for the clinic pages. Keys become clicks and inputs on the
//! page documents; what the documents show is drawn with ratatui.

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use time::Date;
use tracing::{debug, info, warn};
use vetdesk_app::{
    AppCommand, AppState, Appointment, Catalog, FormKind, NewAppointment, PageKind,
};
use vetdesk_dom::{Document, NodeId, Rect as DomRect};
use vetdesk_ui::actions::DISABLED_CLASS;
use vetdesk_ui::feedback::{INVALID_CLASS, VALID_CLASS};
use vetdesk_ui::markup::{FORM_ERROR_CLASS, SUBMIT_ATTRIBUTE};
use vetdesk_ui::pages::{agenda, inventory, services};
use vetdesk_ui::select::{self, LABEL_CLASS, OPEN_CLASS, OPTION_CLASS, SELECT_CLASS};
use vetdesk_ui::wheel::TRIGGER_CLASS as WHEEL_TRIGGER_CLASS;
use vetdesk_ui::{
    AgendaPage, DayRequest, InventoryPage, Page, PageEvent, ServicesPage, UiConfig, WheelMetrics,
};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const POLL_INTERVAL: Duration = Duration::from_millis(120);
const FILTER_BAR_HEIGHT: u16 = 3;
// border plus header row
const TABLE_CHROME_TOP: u16 = 2;

pub trait AppRuntime {
    fn load_catalog(&mut self) -> Result<Catalog>;
    fn fetch_day(&mut self, date: Date) -> Result<Vec<Appointment>>;
    fn create_appointment(&mut self, appointment: &NewAppointment) -> Result<()>;

    /// Fetches `request.date` and reports back on `tx`. Runs inline unless
    /// the runtime overrides it with a background worker.
    fn spawn_fetch_day(&mut self, request: DayRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self
            .fetch_day(request.date)
            .map_err(|error| error.to_string());
        tx.send(InternalEvent::DayLoaded {
            token: request.token,
            result,
        })
        .map_err(|_| anyhow!("agenda fetch receiver dropped"))?;
        Ok(())
    }

    /// Sends the booking and reports the outcome on `tx`. Runs inline unless
    /// the runtime overrides it with a background worker.
    fn spawn_create_appointment(
        &mut self,
        appointment: NewAppointment,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .create_appointment(&appointment)
            .map_err(|error| error.to_string());
        tx.send(InternalEvent::AppointmentSaved { result })
            .map_err(|_| anyhow!("appointment receiver dropped"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    DayLoaded {
        token: u64,
        result: std::result::Result<Vec<Appointment>, String>,
    },
    AppointmentSaved {
        result: std::result::Result<(), String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostConfig {
    pub ui: UiConfig,
    pub start_date: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Table,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormControl {
    Text(NodeId),
    ReadOnly(NodeId),
    Select(NodeId),
}

impl FormControl {
    const fn node(self) -> NodeId {
        match self {
            Self::Text(node) | Self::ReadOnly(node) | Self::Select(node) => node,
        }
    }
}

#[derive(Debug)]
struct ViewData {
    pages: Vec<Page>,
    cursors: [usize; 3],
    focus: Focus,
    menu_cursor: usize,
    select_cursor: usize,
    form_cursor: usize,
    status_token: u64,
    help_visible: bool,
    /// A booking is in flight; further submits are refused until it answers.
    saving: bool,
}

impl ViewData {
    fn new(catalog: &Catalog, config: HostConfig) -> Self {
        let mut ui = config.ui;
        ui.wheel.metrics = WheelMetrics::CELLS;
        let pages = PageKind::ALL
            .iter()
            .map(|kind| match kind {
                PageKind::Inventory => Page::Inventory(InventoryPage::new(catalog, ui)),
                PageKind::Agenda => {
                    Page::Agenda(AgendaPage::new(catalog, config.start_date, ui))
                }
                PageKind::Services => Page::Services(ServicesPage::new(catalog, ui)),
            })
            .collect();
        Self {
            pages,
            cursors: [0; 3],
            focus: Focus::Table,
            menu_cursor: 0,
            select_cursor: 0,
            form_cursor: 0,
            status_token: 0,
            help_visible: false,
            saving: false,
        }
    }

    fn page(&self, kind: PageKind) -> &Page {
        &self.pages[page_index(kind)]
    }

    fn page_mut(&mut self, kind: PageKind) -> &mut Page {
        &mut self.pages[page_index(kind)]
    }

    fn agenda_mut(&mut self) -> Option<&mut AgendaPage> {
        match self.page_mut(PageKind::Agenda) {
            Page::Agenda(page) => Some(page),
            _ => None,
        }
    }

    fn cursor(&self, kind: PageKind) -> usize {
        self.cursors[page_index(kind)]
    }

    fn set_cursor(&mut self, kind: PageKind, cursor: usize) {
        self.cursors[page_index(kind)] = cursor;
    }

    fn clamp_cursor(&mut self, kind: PageKind) {
        let rows = page_rows(self.page(kind)).len();
        let cursor = self.cursor(kind).min(rows.saturating_sub(1));
        self.set_cursor(kind, cursor);
    }
}

fn page_index(kind: PageKind) -> usize {
    PageKind::ALL
        .iter()
        .position(|candidate| *candidate == kind)
        .unwrap_or(0)
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    config: HostConfig,
) -> Result<()> {
    let catalog = runtime.load_catalog().context("load catalog")?;
    let mut view_data = ViewData::new(&catalog, config);
    let (internal_tx, internal_rx) = mpsc::channel();

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let size = terminal.size().context("read terminal size")?;
    resize_pages(&mut view_data, size.width, size.height, Instant::now());
    start_agenda(state, runtime, &mut view_data, &internal_tx);

    let result = (|| -> Result<()> {
        loop {
            process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);
            let now = Instant::now();
            for page in &mut view_data.pages {
                page.tick(now);
            }

            let size = terminal.size().context("read terminal size")?;
            layout_active_page(
                state,
                &mut view_data,
                Rect::new(0, 0, size.width, size.height),
            );
            terminal
                .draw(|frame| render(frame, state, &view_data))
                .context("draw frame")?;

            if !event::poll(POLL_INTERVAL).context("poll terminal events")? {
                continue;
            }

            match event::read().context("read terminal event")? {
                Event::Key(key) => {
                    if handle_key_event(
                        state,
                        runtime,
                        &mut view_data,
                        &internal_tx,
                        key,
                        Instant::now(),
                    ) {
                        break;
                    }
                }
                Event::Resize(width, height) => {
                    resize_pages(&mut view_data, width, height, Instant::now());
                }
                _ => {}
            }
        }
        Ok(())
    })();

    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), terminal::LeaveAlternateScreen)
        .context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;

    result
}

fn start_agenda<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(agenda) = view_data.agenda_mut() else {
        return;
    };
    let request = agenda.request_day();
    handle_page_events(state, runtime, view_data, internal_tx, vec![request]);
}

fn resize_pages(view_data: &mut ViewData, width: u16, height: u16, now: Instant) {
    let viewport = DomRect::new(0, 0, i32::from(width), i32::from(height));
    for page in &mut view_data.pages {
        page.resize(viewport, now);
    }
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    internal_rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = internal_rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } => {
                if token == view_data.status_token {
                    state.dispatch(AppCommand::ClearStatus);
                }
            }
            InternalEvent::DayLoaded { token, result } => {
                let Some(agenda) = view_data.agenda_mut() else {
                    continue;
                };
                let events = agenda.apply_day(token, result);
                handle_page_events(state, runtime, view_data, internal_tx, events);
            }
            InternalEvent::AppointmentSaved { result } => {
                view_data.saving = false;
                if let Err(error) = &result {
                    warn!(%error, "appointment rejected");
                }
                let Some(agenda) = view_data.agenda_mut() else {
                    continue;
                };
                let events = agenda.apply_created(result);
                handle_page_events(state, runtime, view_data, internal_tx, events);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let tx = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = tx.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.wrapping_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Runs the host side of page events. Day fetches and bookings go to the
/// runtime and come back as [`InternalEvent`]s.
fn handle_page_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<PageEvent>,
) {
    let mut queue: VecDeque<PageEvent> = events.into();
    while let Some(event) = queue.pop_front() {
        debug!(?event, "page event");
        match event {
            PageEvent::FilterApplied { .. } => {
                let kind = state.active_page;
                view_data.clamp_cursor(kind);
            }
            PageEvent::WheelOpened { .. } => view_data.menu_cursor = 0,
            PageEvent::WheelClosed | PageEvent::ModalClosed(_) => {}
            PageEvent::ModalOpened(_) => view_data.form_cursor = 0,
            PageEvent::DiscardRequested(_) => {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    "unsaved changes -- y discard, n keep editing",
                );
            }
            PageEvent::FormRejected { message, .. } => {
                emit_status(state, view_data, internal_tx, message);
            }
            PageEvent::ProductUpdated(id) => {
                emit_status(state, view_data, internal_tx, format!("saved product {id}"));
            }
            PageEvent::ProductRestocked { id, stock } => {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("restocked product {id}, now {stock}"),
                );
            }
            PageEvent::ProductRemoved(id) => {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("removed product {id}"),
                );
            }
            PageEvent::ServiceUpdated(id) => {
                emit_status(state, view_data, internal_tx, format!("saved service {id}"));
            }
            PageEvent::ServiceToggled { id, active } => {
                let label = if active { "activated" } else { "deactivated" };
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("{label} service {id}"),
                );
            }
            PageEvent::DayRequested(request) => {
                if let Err(error) = runtime.spawn_fetch_day(request, internal_tx.clone()) {
                    warn!(%error, "agenda fetch could not start");
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("agenda fetch failed: {error}"),
                    );
                }
            }
            PageEvent::DayLoaded { date, appointments } => {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("{appointments} appointments on {date}"),
                );
            }
            PageEvent::DayFailed { date, message } => {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("could not load {date}: {message}"),
                );
            }
            PageEvent::SubmitAppointment(appointment) => {
                if view_data.saving {
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        "still saving the last appointment",
                    );
                    continue;
                }
                view_data.saving = true;
                if let Err(error) =
                    runtime.spawn_create_appointment(appointment, internal_tx.clone())
                {
                    view_data.saving = false;
                    warn!(%error, "appointment save could not start");
                    if let Some(agenda) = view_data.agenda_mut() {
                        queue.extend(agenda.apply_created(Err(error.to_string())));
                    }
                }
            }
            PageEvent::AppointmentCreated => {
                info!("appointment created");
                emit_status(state, view_data, internal_tx, "appointment created");
            }
            PageEvent::ClientRegistered(client) => {
                info!(rut = %client.rut, "client registered");
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("registered {} ({})", client.name, client.rut),
                );
            }
        }
    }
}

fn dispatch_page<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    call: impl FnOnce(&mut Page) -> Vec<PageEvent>,
) {
    let kind = state.active_page;
    let events = call(view_data.page_mut(kind));
    handle_page_events(state, runtime, view_data, internal_tx, events);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    let kind = state.active_page;
    if view_data.page(kind).pending_confirmation().is_some() {
        match key.code {
            KeyCode::Char('y') => {
                dispatch_page(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    Page::confirm_discard,
                );
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                view_data.page_mut(kind).decline_discard();
                state.dispatch(AppCommand::ClearStatus);
            }
            _ => {}
        }
        return false;
    }

    if let Some(root) = open_select(view_data.page(kind).doc()) {
        handle_select_key(state, runtime, view_data, internal_tx, root, key, now);
        return false;
    }

    if let Some(menu) = view_data.page(kind).open_menu() {
        handle_menu_key(state, runtime, view_data, internal_tx, menu, key, now);
        return false;
    }

    if let Some(modal_id) = view_data.page(kind).open_modal() {
        handle_form_key(state, runtime, view_data, internal_tx, &modal_id, key, now);
        return false;
    }

    if view_data.focus == Focus::Search {
        handle_search_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    handle_table_key(state, runtime, view_data, internal_tx, key, now)
}

fn handle_select_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    root: NodeId,
    key: KeyEvent,
    now: Instant,
) {
    let options = view_data
        .page(state.active_page)
        .doc()
        .query_class(root, OPTION_CLASS);
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.select_cursor =
                (view_data.select_cursor + 1).min(options.len().saturating_sub(1));
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.select_cursor = view_data.select_cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            if let Some(option) = options.get(view_data.select_cursor).copied() {
                dispatch_page(state, runtime, view_data, internal_tx, |page| {
                    page.click(option, now)
                });
            }
        }
        KeyCode::Esc => {
            dispatch_page(state, runtime, view_data, internal_tx, |page| {
                page.escape(now)
            });
        }
        _ => {}
    }
}

fn handle_menu_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    menu: NodeId,
    key: KeyEvent,
    now: Instant,
) {
    let buttons = menu_buttons(view_data.page(state.active_page).doc(), menu);
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.menu_cursor =
                (view_data.menu_cursor + 1).min(buttons.len().saturating_sub(1));
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.menu_cursor = view_data.menu_cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            if let Some(button) = buttons.get(view_data.menu_cursor).copied() {
                dispatch_page(state, runtime, view_data, internal_tx, |page| {
                    page.click(button, now)
                });
            }
        }
        KeyCode::Esc => {
            dispatch_page(state, runtime, view_data, internal_tx, |page| {
                page.escape(now)
            });
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    modal_id: &str,
    key: KeyEvent,
    now: Instant,
) {
    let kind = state.active_page;
    let controls = {
        let doc = view_data.page(kind).doc();
        doc.element_by_id(modal_id)
            .map(|modal| form_controls(doc, modal))
            .unwrap_or_default()
    };
    let current = controls.get(view_data.form_cursor).copied();
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('s') if ctrl => {
            submit_form(
                state,
                runtime,
                view_data,
                internal_tx,
                modal_id,
                current,
                now,
            );
        }
        KeyCode::Tab | KeyCode::Down => {
            blur_control(state, runtime, view_data, internal_tx, current);
            if !controls.is_empty() {
                view_data.form_cursor = (view_data.form_cursor + 1) % controls.len();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            blur_control(state, runtime, view_data, internal_tx, current);
            if !controls.is_empty() {
                view_data.form_cursor =
                    (view_data.form_cursor + controls.len() - 1) % controls.len();
            }
        }
        KeyCode::Enter => match current {
            Some(FormControl::Select(root)) => {
                open_select_control(state, runtime, view_data, internal_tx, root, now);
            }
            _ => submit_form(
                state,
                runtime,
                view_data,
                internal_tx,
                modal_id,
                current,
                now,
            ),
        },
        KeyCode::Char(ch) if !ctrl => {
            if let Some(FormControl::Text(input)) = current {
                let page = view_data.page_mut(kind);
                let mut value = page.doc().value(input).to_owned();
                value.push(ch);
                page.doc_mut().set_value(input, &value);
                dispatch_page(state, runtime, view_data, internal_tx, |page| {
                    page.input(input)
                });
            }
        }
        KeyCode::Backspace => {
            if let Some(FormControl::Text(input)) = current {
                let page = view_data.page_mut(kind);
                let mut value = page.doc().value(input).to_owned();
                value.pop();
                page.doc_mut().set_value(input, &value);
                dispatch_page(state, runtime, view_data, internal_tx, |page| {
                    page.input(input)
                });
            }
        }
        KeyCode::Esc => {
            dispatch_page(state, runtime, view_data, internal_tx, |page| {
                page.escape(now)
            });
        }
        _ => {}
    }
}

fn blur_control<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    control: Option<FormControl>,
) {
    if let Some(FormControl::Text(input)) = control {
        dispatch_page(state, runtime, view_data, internal_tx, |page| {
            page.blur(input)
        });
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    modal_id: &str,
    current: Option<FormControl>,
    now: Instant,
) {
    blur_control(state, runtime, view_data, internal_tx, current);
    let submit = {
        let doc = view_data.page(state.active_page).doc();
        doc.element_by_id(modal_id)
            .and_then(|modal| doc.query_attribute(modal, SUBMIT_ATTRIBUTE).into_iter().next())
    };
    if let Some(button) = submit {
        dispatch_page(state, runtime, view_data, internal_tx, |page| {
            page.click(button, now)
        });
    }
}

fn open_select_control<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    root: NodeId,
    now: Instant,
) {
    let (trigger, selected) = {
        let doc = view_data.page(state.active_page).doc();
        let selected = select::options(doc, root)
            .iter()
            .position(|option| option.selected)
            .unwrap_or(0);
        (doc.first_with_class(root, select::TRIGGER_CLASS), selected)
    };
    let Some(trigger) = trigger else {
        return;
    };
    view_data.select_cursor = selected;
    dispatch_page(state, runtime, view_data, internal_tx, |page| {
        page.click(trigger, now)
    });
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let kind = state.active_page;
    let Some(search) = search_input(view_data.page(kind)) else {
        view_data.focus = Focus::Table;
        return;
    };
    let mut value = view_data.page(kind).doc().value(search).to_owned();
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            view_data.focus = Focus::Table;
            return;
        }
        KeyCode::Backspace => {
            value.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => value.push(ch),
        _ => return,
    }
    view_data.page_mut(kind).doc_mut().set_value(search, &value);
    dispatch_page(state, runtime, view_data, internal_tx, |page| {
        page.input(search)
    });
}

fn handle_table_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) -> bool {
    let kind = state.active_page;
    let rows = page_rows(view_data.page(kind));
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => {
            state.dispatch(AppCommand::NextPage);
            view_data.focus = Focus::Table;
        }
        KeyCode::BackTab => {
            state.dispatch(AppCommand::PrevPage);
            view_data.focus = Focus::Table;
        }
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Down | KeyCode::Char('j') => {
            let cursor = (view_data.cursor(kind) + 1).min(rows.len().saturating_sub(1));
            view_data.set_cursor(kind, cursor);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let cursor = view_data.cursor(kind).saturating_sub(1);
            view_data.set_cursor(kind, cursor);
        }
        KeyCode::Char('g') => view_data.set_cursor(kind, 0),
        KeyCode::Char('G') => view_data.set_cursor(kind, rows.len().saturating_sub(1)),
        KeyCode::Enter => {
            let Some(row) = rows.get(view_data.cursor(kind)).copied() else {
                return false;
            };
            let target = match kind {
                PageKind::Agenda => Some(row),
                PageKind::Inventory | PageKind::Services => view_data
                    .page(kind)
                    .doc()
                    .first_with_class(row, WHEEL_TRIGGER_CLASS),
            };
            if let Some(target) = target {
                dispatch_page(state, runtime, view_data, internal_tx, |page| {
                    page.click(target, now)
                });
            }
        }
        KeyCode::Esc => {
            dispatch_page(state, runtime, view_data, internal_tx, |page| {
                page.escape(now)
            });
        }
        KeyCode::Char('/') if search_input(view_data.page(kind)).is_some() => {
            view_data.focus = Focus::Search;
        }
        KeyCode::Char(digit @ '1'..='9') if kind != PageKind::Agenda => {
            let index = digit as usize - '1' as usize;
            let root = filter_selects(view_data.page(kind).doc())
                .get(index)
                .copied();
            if let Some(root) = root {
                open_select_control(state, runtime, view_data, internal_tx, root, now);
            }
        }
        KeyCode::Left | KeyCode::Char('h') if kind == PageKind::Agenda => {
            click_by_id(
                state,
                runtime,
                view_data,
                internal_tx,
                agenda::PREV_DAY_ID,
                now,
            );
        }
        KeyCode::Right | KeyCode::Char('l') if kind == PageKind::Agenda => {
            click_by_id(
                state,
                runtime,
                view_data,
                internal_tx,
                agenda::NEXT_DAY_ID,
                now,
            );
        }
        KeyCode::Char('t') if kind == PageKind::Agenda => {
            click_by_id(
                state,
                runtime,
                view_data,
                internal_tx,
                agenda::TODAY_ID,
                now,
            );
        }
        KeyCode::Char('c') if kind == PageKind::Agenda => {
            click_by_id(
                state,
                runtime,
                view_data,
                internal_tx,
                agenda::NEW_CLIENT_ID,
                now,
            );
        }
        _ => {}
    }
    false
}

fn click_by_id<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    id: &str,
    now: Instant,
) {
    let Some(target) = view_data.page(state.active_page).doc().element_by_id(id) else {
        return;
    };
    dispatch_page(state, runtime, view_data, internal_tx, |page| {
        page.click(target, now)
    });
}

fn page_rows(page: &Page) -> Vec<NodeId> {
    match page {
        Page::Inventory(page) => page.visible_rows(),
        Page::Services(page) => page.visible_rows(),
        Page::Agenda(page) => page.slots(),
    }
}

fn table_id(kind: PageKind) -> Option<&'static str> {
    match kind {
        PageKind::Inventory => Some(inventory::TABLE_ID),
        PageKind::Services => Some(services::TABLE_ID),
        PageKind::Agenda => None,
    }
}

fn search_input(page: &Page) -> Option<NodeId> {
    let id = match page.kind() {
        PageKind::Inventory => inventory::SEARCH_ID,
        PageKind::Services => services::SEARCH_ID,
        PageKind::Agenda => return None,
    };
    page.doc().element_by_id(id)
}

fn filter_selects(doc: &Document) -> Vec<NodeId> {
    doc.first_with_class(doc.body(), "filtros")
        .map(|filters| doc.query_class(filters, SELECT_CLASS))
        .unwrap_or_default()
}

fn open_select(doc: &Document) -> Option<NodeId> {
    doc.query_class(doc.body(), SELECT_CLASS)
        .into_iter()
        .find(|root| doc.has_class(*root, OPEN_CLASS))
}

fn menu_buttons(doc: &Document, menu: NodeId) -> Vec<NodeId> {
    doc.query_class(menu, "wheel-action")
}

/// Editable controls of a modal form in document order. Hidden inputs are
/// skipped, including the ones backing custom selects.
fn form_controls(doc: &Document, modal: NodeId) -> Vec<FormControl> {
    let Some(form) = doc.query_tag(modal, "form").into_iter().next() else {
        return Vec::new();
    };
    let mut controls = Vec::new();
    for node in doc.descendants(form) {
        if doc.has_class(node, SELECT_CLASS) {
            controls.push(FormControl::Select(node));
            continue;
        }
        if doc.tag(node) != Some("input") || doc.attribute(node, "type") == Some("hidden") {
            continue;
        }
        if doc.attribute(node, "readonly").is_some() {
            controls.push(FormControl::ReadOnly(node));
        } else {
            controls.push(FormControl::Text(node));
        }
    }
    controls
}

fn control_label(doc: &Document, control: FormControl) -> String {
    let node = control.node();
    doc.parent(node)
        .and_then(|group| doc.query_tag(group, "label").into_iter().next())
        .map(|label| doc.text_content(label))
        .or_else(|| doc.id(node).map(str::to_owned))
        .unwrap_or_default()
}

fn control_value(doc: &Document, control: FormControl) -> String {
    match control {
        FormControl::Text(node) | FormControl::ReadOnly(node) => doc.value(node).to_owned(),
        FormControl::Select(root) => doc
            .first_with_class(root, LABEL_CLASS)
            .map(|label| doc.text_content(label))
            .unwrap_or_default(),
    }
}

fn modal_form_kind(modal_id: &str) -> Option<FormKind> {
    match modal_id {
        inventory::EDIT_MODAL_ID => Some(FormKind::Product),
        inventory::RESTOCK_MODAL_ID => Some(FormKind::Restock),
        services::EDIT_MODAL_ID => Some(FormKind::Service),
        agenda::APPOINTMENT_MODAL_ID => Some(FormKind::Appointment),
        agenda::CLIENT_MODAL_ID => Some(FormKind::Client),
        _ => None,
    }
}

fn form_hint(kind: Option<FormKind>) -> &'static str {
    match kind {
        Some(FormKind::Product) => "price as $12.990 or 12990",
        Some(FormKind::Restock) => "units to add, at least 1",
        Some(FormKind::Service) => "duration in minutes, up to 480",
        Some(FormKind::Appointment) => "pick a pet and a type; duration up to 240",
        Some(FormKind::Client) => "RUT formats as you type; phone +56 9 XXXX XXXX",
        None => "",
    }
}

/// Scroll offset that keeps `cursor` inside a window of `height` rows.
fn scroll_offset(cursor: usize, height: usize) -> usize {
    if height == 0 {
        return cursor;
    }
    cursor.saturating_sub(height - 1)
}

fn body_chunks(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Splits the page body into the bar above the table and the table itself.
fn page_chunks(body: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(FILTER_BAR_HEIGHT), Constraint::Min(1)])
        .split(body);
    [chunks[0], chunks[1]]
}

fn visible_height(table: Rect) -> usize {
    usize::from(table.height.saturating_sub(TABLE_CHROME_TOP + 1))
}

/// Gives each visible row's wheel trigger its on-screen cell so the menu
/// opens next to it. Scrolled-out rows get an empty box.
fn layout_active_page(state: &AppState, view_data: &mut ViewData, area: Rect) {
    let kind = state.active_page;
    let [_, body, _] = body_chunks(area);
    let [_, table] = page_chunks(body);
    let height = visible_height(table);
    let offset = scroll_offset(view_data.cursor(kind), height);
    let page = view_data.page_mut(kind);
    let rows = page_rows(page);
    let doc = page.doc_mut();

    for (index, row) in rows.iter().enumerate() {
        let on_screen = index >= offset && index < offset + height;
        let rect = if on_screen {
            let y = table.y + TABLE_CHROME_TOP + (index - offset) as u16;
            DomRect::new(
                i32::from(table.x + 1),
                i32::from(y),
                i32::from(table.width.saturating_sub(2)),
                1,
            )
        } else {
            DomRect::default()
        };
        doc.set_rect(*row, rect);
        if let Some(trigger) = doc.first_with_class(*row, WHEEL_TRIGGER_CLASS) {
            let trigger_rect = if on_screen {
                DomRect::new(rect.right() - 2, rect.y, 1, 1)
            } else {
                DomRect::default()
            };
            doc.set_rect(trigger, trigger_rect);
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let [tabs_area, body, status_area] = body_chunks(frame.area());

    let titles: Vec<String> = PageKind::ALL
        .iter()
        .map(|kind| kind.label().to_owned())
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("vetdesk"))
        .select(page_index(state.active_page))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, tabs_area);

    let kind = state.active_page;
    let page = view_data.page(kind);
    let [bar, table] = page_chunks(body);
    let bar_text = match page {
        Page::Agenda(_) => agenda_header_text(page.doc()),
        _ => filter_bar_text(page, view_data.focus),
    };
    frame.render_widget(
        Paragraph::new(bar_text).block(Block::default().borders(Borders::ALL)),
        bar,
    );
    render_rows(frame, table, page, view_data.cursor(kind));

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, status_area);

    if let Some(modal_id) = page.open_modal() {
        render_modal(frame, page.doc(), &modal_id, view_data.form_cursor);
    }
    if let Some(menu) = page.open_menu() {
        render_menu(frame, page.doc(), menu, view_data.menu_cursor);
    }
    if let Some(root) = open_select(page.doc()) {
        render_select(frame, page.doc(), root, view_data.select_cursor);
    }
    if page.pending_confirmation().is_some() {
        let area = centered_rect(40, 20, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new("Hay cambios sin guardar.\n¿Descartar? (y/n)")
                .block(Block::default().borders(Borders::ALL).title("confirmar")),
            area,
        );
    }
    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(help_overlay_text())
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("help")),
            area,
        );
    }
}

fn render_rows(frame: &mut ratatui::Frame<'_>, area: Rect, page: &Page, cursor: usize) {
    let doc = page.doc();
    let (headers, rows) = table_text(page);
    let height = visible_height(area);
    let offset = scroll_offset(cursor, height);
    let widths = vec![Constraint::Fill(1); headers.len().max(1)];

    let header = Row::new(headers.into_iter().map(Cell::from)).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let node_rows = page_rows(page);
    let body_rows = rows
        .into_iter()
        .zip(node_rows)
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(index, (cells, node))| {
            let mut style = Style::default();
            if doc.has_class(node, agenda::BUSY_CLASS) || doc.has_class(node, "table-secondary") {
                style = style.fg(Color::DarkGray);
            }
            if index == cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Row::new(cells.into_iter().map(Cell::from)).style(style)
        });
    let title = match page {
        Page::Agenda(_) => "agenda",
        Page::Inventory(_) => "inventario",
        Page::Services(_) => "servicios",
    };
    let table = Table::new(body_rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

/// Header and cell text of what the page currently shows. The actions
/// column of data tables renders as the wheel glyph.
fn table_text(page: &Page) -> (Vec<String>, Vec<Vec<String>>) {
    let doc = page.doc();
    let rows = page_rows(page);
    let Some(table) = table_id(page.kind()).and_then(|id| doc.element_by_id(id)) else {
        let cells = rows
            .iter()
            .map(|slot| {
                doc.children(*slot)
                    .iter()
                    .map(|span| doc.text_content(*span))
                    .collect()
            })
            .collect();
        return (vec!["Hora".to_owned(), "Detalle".to_owned()], cells);
    };

    let headers = doc
        .query_tag(table, "th")
        .into_iter()
        .map(|th| doc.text_content(th))
        .collect();
    let cells = rows
        .iter()
        .map(|row| {
            doc.children(*row)
                .iter()
                .map(|td| {
                    if doc.first_with_class(*td, WHEEL_TRIGGER_CLASS).is_some() {
                        "⚙".to_owned()
                    } else {
                        doc.text_content(*td)
                    }
                })
                .collect()
        })
        .collect();
    (headers, cells)
}

fn filter_bar_text(page: &Page, focus: Focus) -> String {
    let doc = page.doc();
    let mut parts = Vec::new();
    if let Some(search) = search_input(page) {
        let cursor = if focus == Focus::Search { "_" } else { "" };
        parts.push(format!("/ buscar: {}{cursor}", doc.value(search)));
    }
    for (index, root) in filter_selects(doc).into_iter().enumerate() {
        let label = doc
            .first_with_class(root, LABEL_CLASS)
            .map(|label| doc.text_content(label))
            .unwrap_or_default();
        parts.push(format!("{} {label}", index + 1));
    }
    parts.join(" | ")
}

fn agenda_header_text(doc: &Document) -> String {
    let date = doc
        .element_by_id(agenda::DATE_HEADER_ID)
        .map(|header| doc.text_content(header))
        .unwrap_or_default();
    let loading = doc
        .element_by_id(agenda::SLOTS_ID)
        .is_some_and(|slots| doc.has_class(slots, "cargando"));
    if loading {
        format!("{date} (cargando...)")
    } else {
        date
    }
}

fn form_text(doc: &Document, modal_id: &str, cursor: usize) -> String {
    let Some(modal) = doc.element_by_id(modal_id) else {
        return String::new();
    };
    let mut lines = Vec::new();
    for (index, control) in form_controls(doc, modal).into_iter().enumerate() {
        let marker = if index == cursor { ">" } else { " " };
        let mut line = format!(
            "{marker} {}: {}",
            control_label(doc, control),
            control_value(doc, control)
        );
        let node = control.node();
        if matches!(control, FormControl::ReadOnly(_)) {
            line.push_str(" (fijo)");
        } else if doc.has_class(node, INVALID_CLASS) {
            let message = doc
                .next_sibling(node)
                .map(|feedback| doc.text_content(feedback))
                .unwrap_or_default();
            line.push_str(&format!(" ✗ {message}"));
        } else if doc.has_class(node, VALID_CLASS) {
            line.push_str(" ✓");
        }
        lines.push(line);
    }
    if let Some(banner) = doc.first_with_class(modal, FORM_ERROR_CLASS)
        && doc.is_displayed(banner)
    {
        lines.push(String::new());
        lines.push(format!("! {}", doc.text_content(banner)));
    }
    let hint = form_hint(modal_form_kind(modal_id));
    if !hint.is_empty() {
        lines.push(String::new());
        lines.push(hint.to_owned());
    }
    lines.join("\n")
}

fn render_modal(frame: &mut ratatui::Frame<'_>, doc: &Document, modal_id: &str, cursor: usize) {
    let title = doc
        .element_by_id(modal_id)
        .and_then(|modal| doc.first_with_class(modal, "modal-title"))
        .map(|title| doc.text_content(title))
        .unwrap_or_else(|| modal_id.to_owned());
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(form_text(doc, modal_id, cursor))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .title_bottom("tab field | enter pick/save | ctrl+s save | esc close"),
            ),
        area,
    );
}

fn menu_lines(doc: &Document, menu: NodeId, cursor: usize) -> Vec<String> {
    menu_buttons(doc, menu)
        .into_iter()
        .enumerate()
        .map(|(index, button)| {
            let marker = if index == cursor { ">" } else { " " };
            let mut line = format!("{marker} {}", doc.text_content(button));
            if doc.has_class(button, DISABLED_CLASS) {
                line.push_str(" (no disponible)");
            }
            line
        })
        .collect()
}

fn render_menu(frame: &mut ratatui::Frame<'_>, doc: &Document, menu: NodeId, cursor: usize) {
    let lines = menu_lines(doc, menu, cursor);
    let placed = doc.bounding_rect(menu);
    let screen = frame.area();
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as u16
        + 2;
    let height = lines.len() as u16 + 2;
    let x = u16::try_from(placed.x.max(0))
        .unwrap_or(0)
        .min(screen.width.saturating_sub(width));
    let y = u16::try_from(placed.y.max(0))
        .unwrap_or(0)
        .min(screen.height.saturating_sub(height));
    let area = Rect::new(x, y, width.min(screen.width), height.min(screen.height));
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines.join("\n")).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_select(frame: &mut ratatui::Frame<'_>, doc: &Document, root: NodeId, cursor: usize) {
    let lines: Vec<String> = select::options(doc, root)
        .into_iter()
        .enumerate()
        .map(|(index, option)| {
            let marker = if index == cursor { ">" } else { " " };
            let check = if option.selected { " ✓" } else { "" };
            format!("{marker} {}{check}", option.label)
        })
        .collect();
    let area = centered_rect(40, 50, frame.area());
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines.join("\n")).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let default = match state.active_page {
        PageKind::Agenda => {
            "j/k slot | enter book | h/l day | t today | c client | tab page | ? help | ctrl+q"
        }
        PageKind::Inventory | PageKind::Services => {
            "j/k row | enter manage | / search | 1-9 filter | tab page | ? help | ctrl+q"
        }
    };
    if view_data.focus == Focus::Search {
        return "type to filter | enter/esc done".to_owned();
    }
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default.to_owned(),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | tab/shift+tab page | ? help\n\
table: j/k move | g/G first/last | enter manage wheel | / search | 1-9 open filter | esc close menu\n\
agenda: j/k slot | enter book free slot | h/l prev/next day | t today | c new client\n\
menu/select: j/k move | enter choose | esc close\n\
form: tab/shift+tab field | enter open select or save | ctrl+s save | esc cancel\n\
confirm: y discard | n keep editing"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
