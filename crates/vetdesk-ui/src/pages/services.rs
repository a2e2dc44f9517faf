// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Instant;

use vetdesk_app::validation::{format_clp, parse_clp, parse_quantity};
use vetdesk_app::{Catalog, ClinicService, ServiceCategory, ServiceFormInput, ServiceId};
use vetdesk_dom::{Document, NodeId};

use super::{PageEvent, PageShell, SelectCallback, UiConfig};
use crate::actions::ActionRegistry;
use crate::filter::TableFilter;
use crate::markup::{self, set_value_of, submit_target, value_of};

pub const TABLE_ID: &str = "tabla-servicios";
pub const SEARCH_ID: &str = "buscar-servicio";
pub const CATEGORY_FILTER_ID: &str = "filtro-categoria";
pub const STATUS_FILTER_ID: &str = "filtro-estado";
pub const EDIT_MODAL_ID: &str = "modalEditarServicio";

const ACTIVE: &str = "activo";
const INACTIVE: &str = "inactivo";

const HEADERS: [&str; 6] = [
    "Servicio",
    "Categoría",
    "Precio",
    "Duración",
    "Estado",
    "Acciones",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Edit,
    Toggle,
}

#[derive(Debug)]
pub struct ServicesPage {
    shell: PageShell<ServiceAction>,
    filter: TableFilter,
    editing: Option<NodeId>,
}

impl ServicesPage {
    pub fn new(catalog: &Catalog, config: UiConfig) -> Self {
        let mut doc = Document::new();
        render(&mut doc, catalog);
        let actions = ActionRegistry::new()
            .with("editar", ServiceAction::Edit)
            .with("alternar", ServiceAction::Toggle);
        let mut shell = PageShell::new(doc, actions, config);
        shell.wire(&[EDIT_MODAL_ID], |doc, root| {
            doc.closest_with_class(root, "filtros")
                .map(|_| SelectCallback::Refilter)
        });
        let filter = TableFilter::new(TABLE_ID)
            .with_search(SEARCH_ID)
            .bind("categoria", CATEGORY_FILTER_ID)
            .bind("estado", STATUS_FILTER_ID);
        Self {
            shell,
            filter,
            editing: None,
        }
    }

    shell_accessors!();

    pub fn filter(&self) -> &TableFilter {
        &self.filter
    }

    pub fn visible_rows(&self) -> Vec<NodeId> {
        self.filter.visible_rows(&self.shell.doc)
    }

    pub fn row_for(&self, id: ServiceId) -> Option<NodeId> {
        let raw = id.to_string();
        self.filter
            .data_rows(&self.shell.doc)
            .into_iter()
            .find(|row| self.shell.doc.data(*row, "id") == Some(raw.as_str()))
    }

    pub fn service(&self, row: NodeId) -> Option<ClinicService> {
        read_row(&self.shell.doc, row)
    }

    pub fn refilter(&mut self) -> PageEvent {
        let visible = self.filter.apply(&mut self.shell.doc);
        PageEvent::FilterApplied { visible }
    }

    pub fn click(&mut self, target: NodeId, now: Instant) -> Vec<PageEvent> {
        let click = self.shell.click(target, now);
        let mut events = click.events;
        if click.refilter {
            events.push(self.refilter());
        }
        for (action, row) in click.actions {
            events.extend(self.run_action(action, row));
        }
        if !click.claimed
            && submit_target(&self.shell.doc, target).as_deref() == Some(EDIT_MODAL_ID)
        {
            events.extend(self.save_service());
        }
        events
    }

    pub fn input(&mut self, target: NodeId) -> Vec<PageEvent> {
        if self.filter.is_control(&self.shell.doc, target) {
            return vec![self.refilter()];
        }
        self.shell.input(target);
        Vec::new()
    }

    fn run_action(&mut self, action: ServiceAction, row: Option<NodeId>) -> Vec<PageEvent> {
        let Some((row, mut service)) =
            row.and_then(|row| read_row(&self.shell.doc, row).map(|service| (row, service)))
        else {
            return Vec::new();
        };
        match action {
            ServiceAction::Edit => {
                let doc = &mut self.shell.doc;
                set_value_of(doc, "servicio-id", &service.id.to_string());
                set_value_of(doc, "servicio-nombre", &service.name);
                set_value_of(doc, "servicio-precio", &service.price_clp.to_string());
                set_value_of(
                    doc,
                    "servicio-duracion",
                    &service.duration_minutes.to_string(),
                );
                self.editing = Some(row);
                self.shell.open_modal(EDIT_MODAL_ID)
            }
            ServiceAction::Toggle => {
                service.active = !service.active;
                write_row(&mut self.shell.doc, row, &service);
                vec![
                    PageEvent::ServiceToggled {
                        id: service.id,
                        active: service.active,
                    },
                    self.refilter(),
                ]
            }
        }
    }

    fn save_service(&mut self) -> Vec<PageEvent> {
        let current = self
            .editing
            .and_then(|row| read_row(&self.shell.doc, row).map(|service| (row, service)));
        let Some((row, current)) = current else {
            return self.shell.reject(EDIT_MODAL_ID, "El servicio ya no existe");
        };
        let doc = &self.shell.doc;
        let price_clp = match parse_clp(&value_of(doc, "servicio-precio")) {
            Ok(price) => price,
            Err(error) => return self.shell.reject(EDIT_MODAL_ID, error.field_message()),
        };
        let duration_minutes = match parse_quantity(&value_of(doc, "servicio-duracion")) {
            Ok(minutes) => minutes,
            Err(error) => return self.shell.reject(EDIT_MODAL_ID, error.field_message()),
        };
        let input = ServiceFormInput {
            id: current.id,
            name: value_of(doc, "servicio-nombre"),
            price_clp,
            duration_minutes,
        };
        if let Err(error) = input.validate() {
            return self.shell.reject(EDIT_MODAL_ID, error.to_string());
        }
        let updated = ClinicService {
            name: input.name.trim().to_owned(),
            price_clp: input.price_clp,
            duration_minutes: input.duration_minutes,
            ..current
        };
        write_row(&mut self.shell.doc, row, &updated);
        self.editing = None;
        let mut events = self.shell.close_after_save(EDIT_MODAL_ID);
        events.push(PageEvent::ServiceUpdated(updated.id));
        events.push(self.refilter());
        events
    }
}

pub fn read_row(doc: &Document, row: NodeId) -> Option<ClinicService> {
    Some(ClinicService {
        id: ServiceId::parse(doc.data(row, "id")?)?,
        name: doc.data(row, "nombre")?.to_owned(),
        category: ServiceCategory::parse(doc.data(row, "categoria")?)?,
        price_clp: doc.data(row, "precio")?.parse().ok()?,
        duration_minutes: doc.data(row, "duracion")?.parse().ok()?,
        active: doc.data(row, "estado")? == ACTIVE,
    })
}

fn write_row(doc: &mut Document, row: NodeId, service: &ClinicService) {
    let status = if service.active { ACTIVE } else { INACTIVE };
    doc.set_data(row, "id", &service.id.to_string());
    doc.set_data(row, "nombre", &service.name);
    doc.set_data(row, "categoria", service.category.as_str());
    doc.set_data(row, "precio", &service.price_clp.to_string());
    doc.set_data(row, "duracion", &service.duration_minutes.to_string());
    doc.set_data(row, "estado", status);
    doc.toggle_class(row, "table-secondary", !service.active);

    let cells: Vec<NodeId> = doc.children(row).to_vec();
    let texts = [
        service.name.clone(),
        service.category.label().to_owned(),
        format_clp(service.price_clp),
        format!("{} min", service.duration_minutes),
        if service.active { "Activo" } else { "Inactivo" }.to_owned(),
    ];
    for (cell, text) in cells.iter().zip(texts.iter()) {
        doc.set_text(*cell, text);
    }
}

fn render(doc: &mut Document, catalog: &Catalog) {
    let body = doc.body();
    let main = doc.build("main").class("container").append_to(body);
    doc.build("h1").text("Servicios").append_to(main);

    let filters = doc.build("div").class("filtros row").append_to(main);
    markup::search_input(doc, filters, SEARCH_ID, "Buscar servicio...");
    let categories: Vec<(&str, &str)> = ServiceCategory::ALL
        .iter()
        .map(|category| (category.as_str(), category.label()))
        .collect();
    markup::custom_select(
        doc,
        filters,
        CATEGORY_FILTER_ID,
        "Todas las categorías",
        &categories,
    );
    markup::custom_select(
        doc,
        filters,
        STATUS_FILTER_ID,
        "Todos los estados",
        &[(ACTIVE, "Activo"), (INACTIVE, "Inactivo")],
    );

    let tbody = markup::data_table(doc, main, TABLE_ID, &HEADERS);
    for service in &catalog.services {
        let row = doc.build("tr").append_to(tbody);
        for _ in 0..HEADERS.len() - 1 {
            markup::cell(doc, row, "");
        }
        write_row(doc, row, service);
        let actions = doc.build("td").class("acciones").append_to(row);
        markup::manage_wheel(
            doc,
            actions,
            &[("editar", "Editar"), ("alternar", "Activar / desactivar")],
        );
    }
    markup::empty_results_row(doc, tbody, HEADERS.len(), "No se encontraron servicios");

    let form = markup::modal(doc, body, EDIT_MODAL_ID, "Editar servicio");
    markup::hidden_field(doc, form, "servicio-id");
    markup::form_field(doc, form, "servicio-nombre", "Nombre", "text");
    markup::form_field(doc, form, "servicio-precio", "Precio", "text");
    markup::form_field(doc, form, "servicio-duracion", "Duración (min)", "number");
}
