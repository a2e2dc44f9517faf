// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Instant;

use tracing::debug;
use vetdesk_app::validation::{format_clp, parse_clp, parse_quantity};
use vetdesk_app::{
    Catalog, InventoryItem, ProductFormInput, ProductId, RestockFormInput, Species, StockLevel,
};
use vetdesk_dom::{Document, NodeId};

use super::{PageEvent, PageShell, SelectCallback, UiConfig};
use crate::actions::ActionRegistry;
use crate::filter::TableFilter;
use crate::markup::{self, set_value_of, submit_target, value_of};

pub const TABLE_ID: &str = "tabla-inventario";
pub const SEARCH_ID: &str = "buscar-inventario";
pub const SPECIES_FILTER_ID: &str = "filtro-especie";
pub const STOCK_FILTER_ID: &str = "filtro-stock";
pub const PROVIDER_FILTER_ID: &str = "filtro-proveedor";
pub const EDIT_MODAL_ID: &str = "modalEditarProducto";
pub const RESTOCK_MODAL_ID: &str = "modalReponer";

const HEADERS: [&str; 7] = [
    "Producto",
    "Especie",
    "Stock",
    "Estado",
    "Proveedor",
    "Precio",
    "Acciones",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryAction {
    Edit,
    Restock,
    Remove,
}

fn registry() -> ActionRegistry<InventoryAction> {
    ActionRegistry::new()
        .with("editar", InventoryAction::Edit)
        .with("editarProducto", InventoryAction::Edit)
        .with("reponer", InventoryAction::Restock)
        .with("reponerStock", InventoryAction::Restock)
        .with("eliminar", InventoryAction::Remove)
        .with("eliminarProducto", InventoryAction::Remove)
}

#[derive(Debug)]
pub struct InventoryPage {
    shell: PageShell<InventoryAction>,
    filter: TableFilter,
    editing: Option<NodeId>,
    restocking: Option<NodeId>,
}

impl InventoryPage {
    pub fn new(catalog: &Catalog, config: UiConfig) -> Self {
        let mut doc = Document::new();
        render(&mut doc, catalog);
        let mut shell = PageShell::new(doc, registry(), config);
        shell.wire(&[EDIT_MODAL_ID, RESTOCK_MODAL_ID], |doc, root| {
            let in_filters = doc.closest_with_class(root, "filtros").is_some();
            in_filters.then_some(SelectCallback::Refilter)
        });
        let filter = TableFilter::new(TABLE_ID)
            .with_search(SEARCH_ID)
            .bind("especie", SPECIES_FILTER_ID)
            .bind("stock", STOCK_FILTER_ID)
            .bind("proveedor", PROVIDER_FILTER_ID);
        Self {
            shell,
            filter,
            editing: None,
            restocking: None,
        }
    }

    shell_accessors!();

    pub fn filter(&self) -> &TableFilter {
        &self.filter
    }

    pub fn visible_rows(&self) -> Vec<NodeId> {
        self.filter.visible_rows(&self.shell.doc)
    }

    pub fn row_for(&self, id: ProductId) -> Option<NodeId> {
        let raw = id.to_string();
        self.filter
            .data_rows(&self.shell.doc)
            .into_iter()
            .find(|row| self.shell.doc.data(*row, "id") == Some(raw.as_str()))
    }

    pub fn item(&self, row: NodeId) -> Option<InventoryItem> {
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
            && let Some(modal_id) = submit_target(&self.shell.doc, target)
        {
            events.extend(self.submit(&modal_id));
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

    fn run_action(&mut self, action: InventoryAction, row: Option<NodeId>) -> Vec<PageEvent> {
        let Some(row) = row else {
            return Vec::new();
        };
        let Some(item) = read_row(&self.shell.doc, row) else {
            debug!("inventory action on a row without product data");
            return Vec::new();
        };
        match action {
            InventoryAction::Edit => {
                let doc = &mut self.shell.doc;
                set_value_of(doc, "producto-id", &item.id.to_string());
                set_value_of(doc, "producto-nombre", &item.name);
                set_value_of(doc, "producto-stock", &item.stock.to_string());
                set_value_of(doc, "producto-minimo", &item.min_stock.to_string());
                set_value_of(doc, "producto-proveedor", &item.provider);
                set_value_of(doc, "producto-precio", &item.price_clp.to_string());
                self.editing = Some(row);
                self.shell.open_modal(EDIT_MODAL_ID)
            }
            InventoryAction::Restock => {
                let doc = &mut self.shell.doc;
                set_value_of(doc, "reponer-id", &item.id.to_string());
                set_value_of(doc, "reponer-cantidad", "");
                if let Some(label) = doc.element_by_id("reponer-producto") {
                    doc.set_text(
                        label,
                        &format!("{} (stock actual: {})", item.name, item.stock),
                    );
                }
                self.restocking = Some(row);
                self.shell.open_modal(RESTOCK_MODAL_ID)
            }
            InventoryAction::Remove => {
                self.shell.doc.destroy(row);
                vec![PageEvent::ProductRemoved(item.id), self.refilter()]
            }
        }
    }

    fn submit(&mut self, modal_id: &str) -> Vec<PageEvent> {
        match modal_id {
            EDIT_MODAL_ID => self.save_product(),
            RESTOCK_MODAL_ID => self.save_restock(),
            _ => Vec::new(),
        }
    }

    fn save_product(&mut self) -> Vec<PageEvent> {
        let Some(row) = self.editing.filter(|row| self.shell.doc.exists(*row)) else {
            return self.shell.reject(EDIT_MODAL_ID, "El producto ya no existe");
        };
        let Some(current) = read_row(&self.shell.doc, row) else {
            return self.shell.reject(EDIT_MODAL_ID, "El producto ya no existe");
        };
        let input = match read_product_form(&self.shell.doc, current.id) {
            Ok(input) => input,
            Err(message) => return self.shell.reject(EDIT_MODAL_ID, message),
        };
        if let Err(error) = input.validate() {
            return self.shell.reject(EDIT_MODAL_ID, error.to_string());
        }
        let updated = InventoryItem {
            id: current.id,
            name: input.name.trim().to_owned(),
            species: current.species,
            stock: input.stock,
            min_stock: input.min_stock,
            provider: input.provider.trim().to_owned(),
            price_clp: input.price_clp,
        };
        write_row(&mut self.shell.doc, row, &updated);
        self.editing = None;
        let mut events = self.shell.close_after_save(EDIT_MODAL_ID);
        events.push(PageEvent::ProductUpdated(updated.id));
        events.push(self.refilter());
        events
    }

    fn save_restock(&mut self) -> Vec<PageEvent> {
        let Some(row) = self.restocking.filter(|row| self.shell.doc.exists(*row)) else {
            return self.shell.reject(RESTOCK_MODAL_ID, "El producto ya no existe");
        };
        let Some(mut item) = read_row(&self.shell.doc, row) else {
            return self.shell.reject(RESTOCK_MODAL_ID, "El producto ya no existe");
        };
        let quantity = match parse_quantity(&value_of(&self.shell.doc, "reponer-cantidad")) {
            Ok(quantity) => quantity,
            Err(error) => return self.shell.reject(RESTOCK_MODAL_ID, error.field_message()),
        };
        let input = RestockFormInput {
            id: item.id,
            quantity,
        };
        if let Err(error) = input.validate() {
            return self.shell.reject(RESTOCK_MODAL_ID, error.to_string());
        }
        item.stock = item.stock.saturating_add(quantity);
        write_row(&mut self.shell.doc, row, &item);
        self.restocking = None;
        let mut events = self.shell.close_after_save(RESTOCK_MODAL_ID);
        events.push(PageEvent::ProductRestocked {
            id: item.id,
            stock: item.stock,
        });
        events.push(self.refilter());
        events
    }
}

fn read_product_form(doc: &Document, id: ProductId) -> Result<ProductFormInput, String> {
    let field = |name: &str| value_of(doc, name);
    let stock = parse_quantity(&field("producto-stock"))
        .map_err(|error| format!("Stock: {}", error.field_message()))?;
    let min_stock = parse_quantity(&field("producto-minimo"))
        .map_err(|error| format!("Stock mínimo: {}", error.field_message()))?;
    let price_clp = parse_clp(&field("producto-precio"))
        .map_err(|error| format!("Precio: {}", error.field_message()))?;
    Ok(ProductFormInput {
        id,
        name: field("producto-nombre"),
        stock,
        min_stock,
        provider: field("producto-proveedor"),
        price_clp,
    })
}

/// Product fields as stored on the row's `data-*` attributes.
pub fn read_row(doc: &Document, row: NodeId) -> Option<InventoryItem> {
    Some(InventoryItem {
        id: ProductId::parse(doc.data(row, "id")?)?,
        name: doc.data(row, "nombre")?.to_owned(),
        species: Species::parse(doc.data(row, "especie")?)?,
        stock: doc.data(row, "cantidad")?.parse().ok()?,
        min_stock: doc.data(row, "minimo")?.parse().ok()?,
        provider: doc.data(row, "proveedor")?.to_owned(),
        price_clp: doc.data(row, "precio")?.parse().ok()?,
    })
}

/// Writes `item` into the row's attributes and cells. The filter keys
/// (`especie`, `stock`, `proveedor`) are kept in sync.
fn write_row(doc: &mut Document, row: NodeId, item: &InventoryItem) {
    let level = item.stock_level();
    doc.set_data(row, "id", &item.id.to_string());
    doc.set_data(row, "nombre", &item.name);
    doc.set_data(row, "especie", item.species.as_str());
    doc.set_data(row, "stock", level.as_str());
    doc.set_data(row, "cantidad", &item.stock.to_string());
    doc.set_data(row, "minimo", &item.min_stock.to_string());
    doc.set_data(row, "proveedor", &item.provider);
    doc.set_data(row, "precio", &item.price_clp.to_string());

    let cells: Vec<NodeId> = doc.children(row).to_vec();
    let texts = [
        item.name.clone(),
        item.species.label().to_owned(),
        item.stock.to_string(),
        level.label().to_owned(),
        item.provider.clone(),
        format_clp(item.price_clp),
    ];
    for (cell, text) in cells.iter().zip(texts.iter()) {
        doc.set_text(*cell, text);
    }
    if let Some(badge) = cells.get(3) {
        for other in StockLevel::ALL {
            doc.remove_class(*badge, &format!("stock-{}", other.as_str()));
        }
        doc.add_class(*badge, &format!("stock-{}", level.as_str()));
    }
}

fn render(doc: &mut Document, catalog: &Catalog) {
    let body = doc.body();
    let main = doc.build("main").class("container").append_to(body);
    doc.build("h1").text("Inventario").append_to(main);

    let filters = doc.build("div").class("filtros row").append_to(main);
    markup::search_input(doc, filters, SEARCH_ID, "Buscar producto...");
    let species: Vec<(&str, &str)> = Species::ALL
        .iter()
        .map(|species| (species.as_str(), species.label()))
        .collect();
    markup::custom_select(
        doc,
        filters,
        SPECIES_FILTER_ID,
        "Todas las especies",
        &species,
    );
    let levels: Vec<(&str, &str)> = StockLevel::ALL
        .iter()
        .map(|level| (level.as_str(), level.label()))
        .collect();
    markup::custom_select(doc, filters, STOCK_FILTER_ID, "Todo el stock", &levels);
    let providers = catalog.providers();
    let providers: Vec<(&str, &str)> = providers
        .iter()
        .map(|provider| (provider.as_str(), provider.as_str()))
        .collect();
    markup::custom_select(
        doc,
        filters,
        PROVIDER_FILTER_ID,
        "Todos los proveedores",
        &providers,
    );

    let tbody = markup::data_table(doc, main, TABLE_ID, &HEADERS);
    for item in &catalog.products {
        let row = doc.build("tr").append_to(tbody);
        for _ in 0..HEADERS.len() - 1 {
            markup::cell(doc, row, "");
        }
        write_row(doc, row, item);
        let actions = doc.build("td").class("acciones").append_to(row);
        markup::legacy_manage_wheel(
            doc,
            actions,
            &[
                ("editarProducto", "Editar"),
                ("reponerStock", "Reponer stock"),
                ("eliminarProducto", "Eliminar"),
            ],
        );
    }
    markup::empty_results_row(doc, tbody, HEADERS.len(), "No se encontraron productos");

    let form = markup::modal(doc, body, EDIT_MODAL_ID, "Editar producto");
    markup::hidden_field(doc, form, "producto-id");
    markup::form_field(doc, form, "producto-nombre", "Nombre", "text");
    markup::form_field(doc, form, "producto-stock", "Stock", "number");
    markup::form_field(doc, form, "producto-minimo", "Stock mínimo", "number");
    markup::form_field(doc, form, "producto-proveedor", "Proveedor", "text");
    markup::form_field(doc, form, "producto-precio", "Precio", "text");

    let form = markup::modal(doc, body, RESTOCK_MODAL_ID, "Reponer stock");
    markup::hidden_field(doc, form, "reponer-id");
    doc.build("p").id("reponer-producto").append_to(form);
    markup::form_field(
        doc,
        form,
        "reponer-cantidad",
        "Cantidad a agregar",
        "number",
    );
}
