// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Day view: a fixed grid of half-hour slots filled from the server, with
//! forms for booking a free slot and registering a client.

use std::convert::Infallible;
use std::time::Instant;

use time::{Date, Time};
use tracing::debug;
use vetdesk_app::validation::{format_date, format_time, parse_date, parse_quantity, parse_time};
use vetdesk_app::{Appointment, AppointmentFormInput, Catalog, ClientFormInput, PetId};
use vetdesk_dom::{Document, NodeId};

use super::{DayRequest, PageEvent, PageShell, UiConfig};
use crate::actions::ActionRegistry;
use crate::feedback::{FieldFeedback, FieldKind};
use crate::markup::{self, set_value_of, submit_target, value_of};

pub const DATE_HEADER_ID: &str = "fecha-actual";
pub const PREV_DAY_ID: &str = "dia-anterior";
pub const NEXT_DAY_ID: &str = "dia-siguiente";
pub const TODAY_ID: &str = "dia-hoy";
pub const SLOTS_ID: &str = "agenda-slots";
pub const NEW_CLIENT_ID: &str = "nuevo-cliente";
pub const APPOINTMENT_MODAL_ID: &str = "modalNuevaCita";
pub const CLIENT_MODAL_ID: &str = "modalNuevoCliente";

pub const SLOT_CLASS: &str = "slot";
pub const BUSY_CLASS: &str = "ocupado";
const LOADING_CLASS: &str = "cargando";
const FREE_TEXT: &str = "Disponible";

pub const DAY_START_MINUTES: u16 = 9 * 60;
pub const DAY_END_MINUTES: u16 = 18 * 60 + 30;
pub const SLOT_MINUTES: u16 = 30;
const DEFAULT_DURATION: &str = "30";

const WEEKDAYS: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

#[derive(Debug)]
pub struct AgendaPage {
    shell: PageShell<Infallible>,
    today: Date,
    date: Date,
    /// Day whose appointments the grid currently shows.
    shown: Option<Date>,
    last_token: u64,
    pending: Option<DayRequest>,
    client_fields: [FieldFeedback; 3],
}

impl AgendaPage {
    /// Renders the grid for `today`. The host loads it by sending the
    /// request returned from [`AgendaPage::request_day`].
    pub fn new(catalog: &Catalog, today: Date, config: UiConfig) -> Self {
        let mut doc = Document::new();
        render(&mut doc, catalog, today);
        let mut shell = PageShell::new(doc, ActionRegistry::new(), config);
        shell.wire(&[APPOINTMENT_MODAL_ID, CLIENT_MODAL_ID], |_, _| None);
        Self {
            shell,
            today,
            date: today,
            shown: None,
            last_token: 0,
            pending: None,
            client_fields: [
                FieldFeedback::new("cliente-rut", FieldKind::Rut, true),
                FieldFeedback::new("cliente-email", FieldKind::Email, false),
                FieldFeedback::new("cliente-telefono", FieldKind::Phone, false),
            ],
        }
    }

    shell_accessors!();

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn pending_request(&self) -> Option<DayRequest> {
        self.pending
    }

    pub fn slots(&self) -> Vec<NodeId> {
        self.shell
            .doc
            .element_by_id(SLOTS_ID)
            .map(|grid| self.shell.doc.query_class(grid, SLOT_CLASS))
            .unwrap_or_default()
    }

    pub fn slot_at(&self, time: Time) -> Option<NodeId> {
        self.slots()
            .into_iter()
            .find(|slot| slot_time(&self.shell.doc, *slot) == Some(time))
    }

    /// Starts loading the current date. Responses to earlier requests are
    /// dropped from now on.
    pub fn request_day(&mut self) -> PageEvent {
        self.last_token += 1;
        let request = DayRequest {
            token: self.last_token,
            date: self.date,
        };
        self.pending = Some(request);
        set_header(&mut self.shell.doc, self.date);
        if let Some(grid) = self.shell.doc.element_by_id(SLOTS_ID) {
            self.shell.doc.add_class(grid, LOADING_CLASS);
        }
        debug!(token = request.token, date = %format_date(request.date), "agenda day requested");
        PageEvent::DayRequested(request)
    }

    pub fn go_to(&mut self, date: Date) -> PageEvent {
        self.date = date;
        self.request_day()
    }

    /// Applies a day fetch. Anything but the latest request is ignored.
    pub fn apply_day(
        &mut self,
        token: u64,
        result: Result<Vec<Appointment>, String>,
    ) -> Vec<PageEvent> {
        let Some(request) = self.pending.filter(|pending| pending.token == token) else {
            debug!(
                token,
                latest = self.last_token,
                "dropping stale agenda response"
            );
            return Vec::new();
        };
        self.pending = None;
        let doc = &mut self.shell.doc;
        if let Some(grid) = doc.element_by_id(SLOTS_ID) {
            doc.remove_class(grid, LOADING_CLASS);
        }
        match result {
            Ok(appointments) => {
                fill_slots(doc, &appointments);
                self.shown = Some(request.date);
                vec![PageEvent::DayLoaded {
                    date: request.date,
                    appointments: appointments.len(),
                }]
            }
            Err(message) => {
                if let Some(shown) = self.shown {
                    self.date = shown;
                }
                set_header(doc, self.date);
                vec![PageEvent::DayFailed {
                    date: request.date,
                    message,
                }]
            }
        }
    }

    /// Outcome of the create request sent for [`PageEvent::SubmitAppointment`].
    pub fn apply_created(&mut self, result: Result<(), String>) -> Vec<PageEvent> {
        match result {
            Ok(()) => {
                let mut events = self.shell.close_after_save(APPOINTMENT_MODAL_ID);
                events.push(PageEvent::AppointmentCreated);
                events.push(self.request_day());
                events
            }
            Err(message) => self.shell.reject(
                APPOINTMENT_MODAL_ID,
                format!("Error al crear la cita: {message}"),
            ),
        }
    }

    pub fn click(&mut self, target: NodeId, now: Instant) -> Vec<PageEvent> {
        let click = self.shell.click(target, now);
        let mut events = click.events;
        if click.claimed {
            return events;
        }
        if let Some(modal_id) = submit_target(&self.shell.doc, target) {
            events.extend(self.submit(&modal_id));
            return events;
        }
        let doc = &self.shell.doc;
        let clicked_id = doc
            .closest(target, |doc, node| doc.id(node).is_some())
            .and_then(|node| doc.id(node))
            .map(str::to_owned);
        match clicked_id.as_deref() {
            Some(PREV_DAY_ID) => {
                if let Some(day) = self.date.previous_day() {
                    events.push(self.go_to(day));
                }
            }
            Some(NEXT_DAY_ID) => {
                if let Some(day) = self.date.next_day() {
                    events.push(self.go_to(day));
                }
            }
            Some(TODAY_ID) => events.push(self.go_to(self.today)),
            Some(NEW_CLIENT_ID) => events.extend(self.open_client_form()),
            _ => {
                if let Some(slot) = self.shell.doc.closest_with_class(target, SLOT_CLASS) {
                    events.extend(self.open_slot(slot));
                }
            }
        }
        events
    }

    pub fn input(&mut self, target: NodeId) -> Vec<PageEvent> {
        if let Some(field) = self.field_for(target) {
            field.on_input(&mut self.shell.doc);
        }
        self.shell.input(target);
        Vec::new()
    }

    pub fn blur(&mut self, target: NodeId) -> Vec<PageEvent> {
        if let Some(field) = self.field_for(target) {
            field.on_blur(&mut self.shell.doc);
        }
        Vec::new()
    }

    fn field_for(&self, target: NodeId) -> Option<FieldFeedback> {
        self.client_fields
            .iter()
            .find(|field| field.input(&self.shell.doc) == Some(target))
            .cloned()
    }

    /// Slots are only bookable once the grid shows the selected day.
    fn open_slot(&mut self, slot: NodeId) -> Vec<PageEvent> {
        if self.pending.is_some() || self.shown != Some(self.date) {
            debug!(date = %format_date(self.date), "ignoring slot click while the day loads");
            return Vec::new();
        }
        let doc = &mut self.shell.doc;
        if doc.has_class(slot, BUSY_CLASS) {
            return Vec::new();
        }
        let Some(time) = slot_time(doc, slot) else {
            return Vec::new();
        };
        set_value_of(doc, "cita-fecha", &format_date(self.date));
        set_value_of(doc, "cita-hora", &format_time(time));
        set_value_of(doc, "cita-duracion", DEFAULT_DURATION);
        set_value_of(doc, "cita-notas", "");
        for input_id in ["cita-mascota", "cita-tipo"] {
            if let Some(root) = doc
                .element_by_id(input_id)
                .and_then(|input| doc.parent(input))
            {
                self.shell.selects.reset(doc, root);
            }
        }
        self.shell.open_modal(APPOINTMENT_MODAL_ID)
    }

    fn open_client_form(&mut self) -> Vec<PageEvent> {
        for id in ["cliente-nombre", "cliente-rut", "cliente-email", "cliente-telefono"] {
            set_value_of(&mut self.shell.doc, id, "");
        }
        for field in &self.client_fields {
            field.clear(&mut self.shell.doc);
        }
        self.shell.open_modal(CLIENT_MODAL_ID)
    }

    fn submit(&mut self, modal_id: &str) -> Vec<PageEvent> {
        match modal_id {
            APPOINTMENT_MODAL_ID => self.submit_appointment(),
            CLIENT_MODAL_ID => self.submit_client(),
            _ => Vec::new(),
        }
    }

    fn submit_appointment(&mut self) -> Vec<PageEvent> {
        let input = match read_appointment_form(&self.shell.doc) {
            Ok(input) => input,
            Err(message) => return self.shell.reject(APPOINTMENT_MODAL_ID, message),
        };
        match input.into_new_appointment() {
            Ok(appointment) => {
                markup::set_form_error(&mut self.shell.doc, APPOINTMENT_MODAL_ID, None);
                vec![PageEvent::SubmitAppointment(appointment)]
            }
            Err(error) => self.shell.reject(APPOINTMENT_MODAL_ID, error.to_string()),
        }
    }

    fn submit_client(&mut self) -> Vec<PageEvent> {
        for field in self.client_fields.clone() {
            field.on_blur(&mut self.shell.doc);
        }
        let doc = &self.shell.doc;
        let input = ClientFormInput {
            name: value_of(doc, "cliente-nombre"),
            rut: value_of(doc, "cliente-rut"),
            email: value_of(doc, "cliente-email"),
            phone: value_of(doc, "cliente-telefono"),
        };
        match input.normalized() {
            Ok(client) => {
                let mut events = self.shell.close_after_save(CLIENT_MODAL_ID);
                events.push(PageEvent::ClientRegistered(client));
                events
            }
            Err(error) => self.shell.reject(CLIENT_MODAL_ID, error.to_string()),
        }
    }
}

fn read_appointment_form(doc: &Document) -> Result<AppointmentFormInput, String> {
    let field = |name: &str| value_of(doc, name);
    let date = parse_date(&field("cita-fecha")).map_err(|error| error.field_message().to_owned())?;
    let time = parse_time(&field("cita-hora")).map_err(|error| error.field_message().to_owned())?;
    let duration_minutes = parse_quantity(&field("cita-duracion"))
        .map_err(|error| format!("Duración: {}", error.field_message()))?;
    Ok(AppointmentFormInput {
        pet_id: PetId::parse(&field("cita-mascota")),
        kind: field("cita-tipo"),
        duration_minutes,
        notes: field("cita-notas"),
        date,
        time,
    })
}

fn slot_time(doc: &Document, slot: NodeId) -> Option<Time> {
    let hour = doc.data(slot, "hour")?.parse().ok()?;
    let minute = doc.data(slot, "minute")?.parse().ok()?;
    Time::from_hms(hour, minute, 0).ok()
}

/// Resets every slot, then marks the booked ones. Appointments outside the
/// grid are skipped.
fn fill_slots(doc: &mut Document, appointments: &[Appointment]) {
    let Some(grid) = doc.element_by_id(SLOTS_ID) else {
        return;
    };
    let slots = doc.query_class(grid, SLOT_CLASS);
    for &slot in &slots {
        doc.remove_class(slot, BUSY_CLASS);
        if let Some(detail) = doc.first_with_class(slot, "slot-detalle") {
            doc.set_text(detail, FREE_TEXT);
        }
    }
    for appointment in appointments {
        let Some(slot) = slots
            .iter()
            .copied()
            .find(|slot| slot_time(doc, *slot) == Some(appointment.time))
        else {
            debug!(time = %format_time(appointment.time), "appointment outside the slot grid");
            continue;
        };
        doc.add_class(slot, BUSY_CLASS);
        if let Some(detail) = doc.first_with_class(slot, "slot-detalle") {
            doc.set_text(
                detail,
                &format!("{} · {}", appointment.kind, appointment.pet),
            );
        }
    }
}

pub fn long_date(date: Date) -> String {
    let weekday = WEEKDAYS[usize::from(date.weekday().number_days_from_monday())];
    let month = MONTHS[usize::from(u8::from(date.month())) - 1];
    format!("{weekday} {} de {month} de {}", date.day(), date.year())
}

fn set_header(doc: &mut Document, date: Date) {
    if let Some(header) = doc.element_by_id(DATE_HEADER_ID) {
        doc.set_text(header, &long_date(date));
        doc.set_data(header, "date", &format_date(date));
    }
}

fn render(doc: &mut Document, catalog: &Catalog, today: Date) {
    let body = doc.body();
    let main = doc.build("main").class("container").append_to(body);
    doc.build("h1").text("Agenda").append_to(main);

    let nav = doc.build("div").class("agenda-nav").append_to(main);
    markup::button(doc, nav, PREV_DAY_ID, "btn btn-outline-secondary", "‹");
    doc.build("h2").id(DATE_HEADER_ID).append_to(nav);
    markup::button(doc, nav, NEXT_DAY_ID, "btn btn-outline-secondary", "›");
    markup::button(doc, nav, TODAY_ID, "btn btn-secondary", "Hoy");
    markup::button(doc, nav, NEW_CLIENT_ID, "btn btn-primary", "Nuevo cliente");
    set_header(doc, today);

    let grid = doc.build("div").id(SLOTS_ID).append_to(main);
    for minutes in (DAY_START_MINUTES..=DAY_END_MINUTES).step_by(usize::from(SLOT_MINUTES)) {
        let (hour, minute) = (minutes / 60, minutes % 60);
        let slot = doc
            .build("div")
            .class(SLOT_CLASS)
            .data("hour", &hour.to_string())
            .data("minute", &minute.to_string())
            .append_to(grid);
        doc.build("span")
            .class("slot-hora")
            .text(&format!("{hour:02}:{minute:02}"))
            .append_to(slot);
        doc.build("span")
            .class("slot-detalle")
            .text(FREE_TEXT)
            .append_to(slot);
    }

    let form = markup::modal(doc, body, APPOINTMENT_MODAL_ID, "Nueva cita");
    let fecha = markup::form_field(doc, form, "cita-fecha", "Fecha", "date");
    doc.set_attribute(fecha, "readonly", "readonly");
    let hora = markup::form_field(doc, form, "cita-hora", "Hora", "time");
    doc.set_attribute(hora, "readonly", "readonly");
    let pets: Vec<(String, String)> = catalog
        .pets
        .iter()
        .map(|pet| (pet.id.to_string(), format!("{} ({})", pet.name, pet.owner)))
        .collect();
    let pets: Vec<(&str, &str)> = pets
        .iter()
        .map(|(value, label)| (value.as_str(), label.as_str()))
        .collect();
    markup::select_field(
        doc,
        form,
        "cita-mascota",
        "Mascota",
        "Seleccione mascota",
        &pets,
    );
    let kinds: Vec<(&str, &str)> = catalog
        .appointment_kinds
        .iter()
        .map(|kind| (kind.as_str(), kind.as_str()))
        .collect();
    markup::select_field(doc, form, "cita-tipo", "Tipo", "Seleccione tipo", &kinds);
    markup::form_field(doc, form, "cita-duracion", "Duración (min)", "number");
    markup::form_field(doc, form, "cita-notas", "Notas", "text");

    let form = markup::modal(doc, body, CLIENT_MODAL_ID, "Nuevo cliente");
    markup::form_field(doc, form, "cliente-nombre", "Nombre", "text");
    markup::form_field(doc, form, "cliente-rut", "RUT", "text");
    markup::form_field(doc, form, "cliente-email", "Email", "email");
    markup::form_field(doc, form, "cliente-telefono", "Teléfono", "tel");
}
