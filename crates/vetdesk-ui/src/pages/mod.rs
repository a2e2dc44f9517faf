// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Page controllers. Each page owns its document, its listeners and its
//! components; hosts feed it clicks, keystrokes and clock ticks and get
//! typed [`PageEvent`]s back.

/// Accessors every page implements the same way over its shell.
macro_rules! shell_accessors {
    () => {
        pub fn doc(&self) -> &vetdesk_dom::Document {
            &self.shell.doc
        }

        pub fn doc_mut(&mut self) -> &mut vetdesk_dom::Document {
            &mut self.shell.doc
        }

        pub fn listener_count(&self) -> usize {
            self.shell.listeners.listener_count()
        }

        pub fn pending_confirmation(&self) -> Option<&str> {
            self.shell.guard.pending_confirmation()
        }

        pub fn confirm_discard(&mut self) -> Vec<crate::pages::PageEvent> {
            self.shell.confirm_discard()
        }

        pub fn decline_discard(&mut self) {
            self.shell.decline_discard();
        }

        pub fn escape(&mut self, now: std::time::Instant) -> Vec<crate::pages::PageEvent> {
            self.shell.escape(now)
        }

        pub fn tick(&mut self, now: std::time::Instant) {
            self.shell.tick(now);
        }

        pub fn resize(&mut self, viewport: vetdesk_dom::Rect, now: std::time::Instant) {
            self.shell.resize(viewport, now);
        }

        pub fn open_modal(&self) -> Option<String> {
            self.shell.guard.top_open(&self.shell.doc)
        }

        pub fn open_menu(&self) -> Option<vetdesk_dom::NodeId> {
            self.shell.wheel.active_menu()
        }
    };
}

pub mod agenda;
pub mod inventory;
pub mod services;

use std::time::{Duration, Instant};

use time::Date;
use vetdesk_app::{NewAppointment, NewClient, PageKind, ProductId, ServiceId};
use vetdesk_dom::{Document, NodeId, Rect};

use crate::actions::{ActionRegistry, action_name};
use crate::guard::{CloseOutcome, ModalGuard, ModalGuardState};
use crate::listeners::{DocumentHandler, ListenerSet, Propagation};
use crate::markup::set_form_error;
use crate::select::{SelectGroup, SelectOutcome};
use crate::timers::Debounce;
use crate::wheel::{
    ACTIONS_CLASS, ManageWheel, TRIGGER_CLASS, WHEEL_CLASS, WheelOptions, WheelTransition,
};

use self::agenda::AgendaPage;
use self::inventory::InventoryPage;
use self::services::ServicesPage;

pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiConfig {
    pub wheel: WheelOptions,
    pub resize_debounce: Duration,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            wheel: WheelOptions::default(),
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
        }
    }
}

/// What a custom select asks for when its value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectCallback {
    Refilter,
}

/// One agenda fetch. Only the response to the newest token is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRequest {
    pub token: u64,
    pub date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    FilterApplied { visible: usize },
    WheelOpened { trigger: NodeId },
    WheelClosed,
    ModalOpened(String),
    ModalClosed(String),
    /// A close was vetoed; the host should ask before discarding.
    DiscardRequested(String),
    FormRejected { modal_id: String, message: String },
    ProductUpdated(ProductId),
    ProductRestocked { id: ProductId, stock: u32 },
    ProductRemoved(ProductId),
    ServiceUpdated(ServiceId),
    ServiceToggled { id: ServiceId, active: bool },
    DayRequested(DayRequest),
    DayLoaded { date: Date, appointments: usize },
    DayFailed { date: Date, message: String },
    SubmitAppointment(NewAppointment),
    AppointmentCreated,
    ClientRegistered(NewClient),
}

/// Outcome of the shared part of a click.
#[derive(Debug)]
pub(crate) struct ShellClick<A> {
    pub events: Vec<PageEvent>,
    pub actions: Vec<(A, Option<NodeId>)>,
    pub refilter: bool,
    /// A shared component handled the click; page handlers skip it.
    pub claimed: bool,
}

impl<A> Default for ShellClick<A> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            actions: Vec::new(),
            refilter: false,
            claimed: false,
        }
    }
}

/// The document and the components every page shares.
#[derive(Debug)]
pub(crate) struct PageShell<A> {
    pub doc: Document,
    pub listeners: ListenerSet,
    pub selects: SelectGroup<SelectCallback>,
    pub wheel: ManageWheel<A>,
    pub actions: ActionRegistry<A>,
    pub guard: ModalGuard,
    resize: Debounce,
}

impl<A: Copy> PageShell<A> {
    pub fn new(doc: Document, actions: ActionRegistry<A>, config: UiConfig) -> Self {
        Self {
            doc,
            listeners: ListenerSet::new(),
            selects: SelectGroup::new(),
            wheel: ManageWheel::new(config.wheel),
            actions,
            guard: ModalGuard::new(),
            resize: Debounce::new(config.resize_debounce),
        }
    }

    /// Binds every select on the page, disables unknown action buttons and
    /// registers the guarded modals.
    pub fn wire(
        &mut self,
        modal_ids: &[&str],
        callback_for: impl Fn(&Document, NodeId) -> Option<SelectCallback>,
    ) {
        let body = self.doc.body();
        self.selects
            .bind_all(&self.doc, &mut self.listeners, body, callback_for);
        self.actions.disable_unresolved(&mut self.doc, body);
        for modal_id in modal_ids {
            self.guard.guard(modal_id, ModalGuardState::default());
        }
    }

    pub fn click(&mut self, target: NodeId, now: Instant) -> ShellClick<A> {
        let mut out = ShellClick::default();
        if !self.doc.exists(target) {
            return out;
        }
        let document_listeners = self.listeners.snapshot();
        let mut propagation = Propagation::Continue;

        if self.wheel.menu_contains(&self.doc, target) {
            out.claimed = true;
            propagation = Propagation::Stop;
            if let Some(picked) =
                self.wheel
                    .click_menu(&mut self.doc, &mut self.listeners, target, now)
            {
                out.events.push(PageEvent::WheelClosed);
                out.actions.push(picked);
            }
        } else if let Some(trigger) = self.doc.closest_with_class(target, TRIGGER_CLASS) {
            out.claimed = true;
            let transition = self.wheel.toggle(
                &mut self.doc,
                &mut self.listeners,
                &self.actions,
                trigger,
                now,
            );
            match transition {
                WheelTransition::Opened => out.events.push(PageEvent::WheelOpened { trigger }),
                WheelTransition::Switched => {
                    out.events.push(PageEvent::WheelClosed);
                    out.events.push(PageEvent::WheelOpened { trigger });
                }
                WheelTransition::Closed => out.events.push(PageEvent::WheelClosed),
                WheelTransition::Unavailable => {}
            }
        } else if let Some(button) = self.template_button(target) {
            out.claimed = true;
            if let Some(action) = self.actions.resolve(&self.doc, button) {
                out.actions.push((action, self.doc.closest_tag(button, "tr")));
            }
        } else {
            let outcome = self.selects.click(&mut self.doc, target);
            propagation = outcome.propagation();
            out.claimed = propagation == Propagation::Stop;
            if let SelectOutcome::Changed(change) = outcome {
                self.guard.mark_changed_at(&self.doc, change.select);
                out.refilter = change.callback == Some(SelectCallback::Refilter);
            }
        }

        if !out.claimed
            && let Some(modal_id) = self.guard.close_intent(&self.doc, target)
        {
            out.claimed = true;
            out.events.extend(self.close_modal(&modal_id));
        }

        if propagation == Propagation::Continue {
            for (id, handler) in document_listeners {
                if !self.listeners.contains(id) {
                    continue;
                }
                match handler {
                    DocumentHandler::WheelOutsideClick => {
                        if self
                            .wheel
                            .outside_click(&mut self.doc, &mut self.listeners, target, now)
                        {
                            out.events.push(PageEvent::WheelClosed);
                        }
                    }
                    DocumentHandler::SelectSweep => self.selects.close_all(&mut self.doc),
                }
            }
        }
        out
    }

    /// An action button inside a row's hidden template, clicked directly.
    fn template_button(&self, target: NodeId) -> Option<NodeId> {
        let button = self
            .doc
            .closest(target, |doc, node| action_name(doc, node).is_some())?;
        let template = self.doc.closest_with_class(button, ACTIONS_CLASS)?;
        self.doc.closest_with_class(template, WHEEL_CLASS)?;
        Some(button)
    }

    /// Marks the guarded modal around `target` as edited.
    pub fn input(&mut self, target: NodeId) -> Option<String> {
        self.guard.mark_changed_at(&self.doc, target)
    }

    pub fn escape(&mut self, now: Instant) -> Vec<PageEvent> {
        if self.wheel.close(&mut self.doc, &mut self.listeners, now) {
            return vec![PageEvent::WheelClosed];
        }
        if self.selects.open_select(&self.doc).is_some() {
            self.selects.close_all(&mut self.doc);
            return Vec::new();
        }
        match self.guard.top_open(&self.doc) {
            Some(modal_id) => self.close_modal(&modal_id),
            None => Vec::new(),
        }
    }

    pub fn open_modal(&mut self, modal_id: &str) -> Vec<PageEvent> {
        set_form_error(&mut self.doc, modal_id, None);
        if self.guard.open(&mut self.doc, modal_id) {
            vec![PageEvent::ModalOpened(modal_id.to_owned())]
        } else {
            Vec::new()
        }
    }

    pub fn close_modal(&mut self, modal_id: &str) -> Vec<PageEvent> {
        match self.guard.request_close(&mut self.doc, modal_id) {
            CloseOutcome::Closed => vec![PageEvent::ModalClosed(modal_id.to_owned())],
            CloseOutcome::Vetoed => vec![PageEvent::DiscardRequested(modal_id.to_owned())],
            CloseOutcome::AlreadyClosed => Vec::new(),
        }
    }

    pub fn close_after_save(&mut self, modal_id: &str) -> Vec<PageEvent> {
        match self.guard.close_after_save(&mut self.doc, modal_id) {
            CloseOutcome::Closed => vec![PageEvent::ModalClosed(modal_id.to_owned())],
            _ => Vec::new(),
        }
    }

    pub fn reject(&mut self, modal_id: &str, message: impl Into<String>) -> Vec<PageEvent> {
        let message = message.into();
        set_form_error(&mut self.doc, modal_id, Some(&message));
        vec![PageEvent::FormRejected {
            modal_id: modal_id.to_owned(),
            message,
        }]
    }

    pub fn confirm_discard(&mut self) -> Vec<PageEvent> {
        let Some(modal_id) = self.guard.pending_confirmation().map(str::to_owned) else {
            return Vec::new();
        };
        match self.guard.confirm_discard(&mut self.doc, &modal_id) {
            CloseOutcome::Closed => vec![PageEvent::ModalClosed(modal_id)],
            _ => Vec::new(),
        }
    }

    pub fn decline_discard(&mut self) {
        if let Some(modal_id) = self.guard.pending_confirmation().map(str::to_owned) {
            self.guard.decline_discard(&modal_id);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.wheel.tick(&mut self.doc, now);
        if self.resize.fire(now) {
            self.wheel.reposition(&mut self.doc);
        }
    }

    pub fn resize(&mut self, viewport: Rect, now: Instant) {
        self.doc.set_viewport(viewport);
        self.resize.trigger(now);
    }
}

/// The page a host is showing.
#[derive(Debug)]
pub enum Page {
    Inventory(InventoryPage),
    Services(ServicesPage),
    Agenda(AgendaPage),
}

macro_rules! each_page {
    ($page:expr, $inner:ident => $body:expr) => {
        match $page {
            Page::Inventory($inner) => $body,
            Page::Services($inner) => $body,
            Page::Agenda($inner) => $body,
        }
    };
}

impl Page {
    pub const fn kind(&self) -> PageKind {
        match self {
            Self::Inventory(_) => PageKind::Inventory,
            Self::Services(_) => PageKind::Services,
            Self::Agenda(_) => PageKind::Agenda,
        }
    }

    pub fn doc(&self) -> &Document {
        each_page!(self, page => page.doc())
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        each_page!(self, page => page.doc_mut())
    }

    pub fn listener_count(&self) -> usize {
        each_page!(self, page => page.listener_count())
    }

    pub fn click(&mut self, target: NodeId, now: Instant) -> Vec<PageEvent> {
        each_page!(self, page => page.click(target, now))
    }

    /// The host already wrote the new value into `target`.
    pub fn input(&mut self, target: NodeId) -> Vec<PageEvent> {
        each_page!(self, page => page.input(target))
    }

    pub fn blur(&mut self, target: NodeId) -> Vec<PageEvent> {
        match self {
            Self::Agenda(page) => page.blur(target),
            Self::Inventory(_) | Self::Services(_) => Vec::new(),
        }
    }

    pub fn escape(&mut self, now: Instant) -> Vec<PageEvent> {
        each_page!(self, page => page.escape(now))
    }

    pub fn pending_confirmation(&self) -> Option<&str> {
        each_page!(self, page => page.pending_confirmation())
    }

    pub fn confirm_discard(&mut self) -> Vec<PageEvent> {
        each_page!(self, page => page.confirm_discard())
    }

    pub fn decline_discard(&mut self) {
        each_page!(self, page => page.decline_discard());
    }

    pub fn tick(&mut self, now: Instant) {
        each_page!(self, page => page.tick(now));
    }

    pub fn resize(&mut self, viewport: Rect, now: Instant) {
        each_page!(self, page => page.resize(viewport, now));
    }

    /// Id of the open modal, if any.
    pub fn open_modal(&self) -> Option<String> {
        each_page!(self, page => page.open_modal())
    }

    /// The open wheel menu, if any.
    pub fn open_menu(&self) -> Option<NodeId> {
        each_page!(self, page => page.open_menu())
    }
}
