// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Builders for the markup the pages expect: tables, custom selects, manage
//! wheels, modals and form fields, with the class and `data-*` names the
//! components look for.

use vetdesk_dom::{Document, NodeId};

use crate::filter::EMPTY_ROW_CLASS;
use crate::select::{
    LABEL_CLASS, OPTION_CLASS, OPTIONS_CLASS, SELECT_CLASS, SELECTED_CLASS, TRIGGER_CLASS,
};
use crate::wheel::{ACTIONS_CLASS, TRIGGER_CLASS as WHEEL_TRIGGER_CLASS, WHEEL_CLASS};

pub const FORM_ERROR_CLASS: &str = "form-error";
pub const SUBMIT_ATTRIBUTE: &str = "data-submit";

/// A `.custom-select` whose hidden input carries `input_id`. The first option
/// is the empty-valued placeholder and starts selected.
pub fn custom_select(
    doc: &mut Document,
    parent: NodeId,
    input_id: &str,
    placeholder: &str,
    options: &[(&str, &str)],
) -> NodeId {
    let root = doc
        .build("div")
        .class(SELECT_CLASS)
        .data("name", input_id)
        .append_to(parent);
    let trigger = doc
        .build("button")
        .attr("type", "button")
        .class(TRIGGER_CLASS)
        .append_to(root);
    doc.build("span")
        .class(LABEL_CLASS)
        .text(placeholder)
        .append_to(trigger);
    let list = doc.build("ul").class(OPTIONS_CLASS).append_to(root);
    doc.build("li")
        .class(&format!("{OPTION_CLASS} {SELECTED_CLASS}"))
        .data("value", "")
        .text(placeholder)
        .append_to(list);
    for (value, label) in options {
        doc.build("li")
            .class(OPTION_CLASS)
            .data("value", value)
            .text(label)
            .append_to(list);
    }
    doc.build("input")
        .attr("type", "hidden")
        .id(input_id)
        .append_to(root);
    root
}

/// A `.manage-wheel` with its trigger and a hidden `data-action` template.
/// Returns the trigger.
pub fn manage_wheel(doc: &mut Document, cell: NodeId, actions: &[(&str, &str)]) -> NodeId {
    let (trigger, template) = wheel_shell(doc, cell);
    for (action, label) in actions {
        doc.build("button")
            .attr("type", "button")
            .class("wheel-action")
            .data("action", action)
            .text(label)
            .append_to(template);
    }
    trigger
}

/// Same as [`manage_wheel`] with `onclick="fn(this)"` buttons, the way older
/// templates wire them.
pub fn legacy_manage_wheel(
    doc: &mut Document,
    cell: NodeId,
    actions: &[(&str, &str)],
) -> NodeId {
    let (trigger, template) = wheel_shell(doc, cell);
    for (function, label) in actions {
        doc.build("button")
            .attr("type", "button")
            .class("wheel-action")
            .attr("onclick", &format!("{function}(this)"))
            .text(label)
            .append_to(template);
    }
    trigger
}

fn wheel_shell(doc: &mut Document, cell: NodeId) -> (NodeId, NodeId) {
    let container = doc.build("div").class(WHEEL_CLASS).append_to(cell);
    let trigger = doc
        .build("button")
        .attr("type", "button")
        .attr("aria-expanded", "false")
        .attr("title", "Gestionar")
        .class(&format!("btn btn-sm {WHEEL_TRIGGER_CLASS}"))
        .text("⚙")
        .append_to(container);
    let template = doc
        .build("div")
        .class(ACTIONS_CLASS)
        .style("display", "none")
        .append_to(container);
    (trigger, template)
}

/// `<table id=table_id>` with a header row; returns the `tbody`.
pub fn data_table(doc: &mut Document, parent: NodeId, table_id: &str, headers: &[&str]) -> NodeId {
    let table = doc
        .build("table")
        .id(table_id)
        .class("table table-hover")
        .append_to(parent);
    let head = doc.build("thead").append_to(table);
    let row = doc.build("tr").append_to(head);
    for header in headers {
        doc.build("th").text(header).append_to(row);
    }
    doc.build("tbody").append_to(table)
}

pub fn empty_results_row(doc: &mut Document, tbody: NodeId, columns: usize, text: &str) -> NodeId {
    let row = doc
        .build("tr")
        .class(EMPTY_ROW_CLASS)
        .style("display", "none")
        .append_to(tbody);
    doc.build("td")
        .attr("colspan", &columns.to_string())
        .class("text-center text-muted")
        .text(text)
        .append_to(row);
    row
}

pub fn cell(doc: &mut Document, row: NodeId, text: &str) -> NodeId {
    doc.build("td").text(text).append_to(row)
}

pub fn search_input(doc: &mut Document, parent: NodeId, id: &str, placeholder: &str) -> NodeId {
    doc.build("input")
        .attr("type", "search")
        .attr("placeholder", placeholder)
        .id(id)
        .class("form-control")
        .append_to(parent)
}

pub fn button(doc: &mut Document, parent: NodeId, id: &str, class: &str, text: &str) -> NodeId {
    doc.build("button")
        .attr("type", "button")
        .id(id)
        .class(class)
        .text(text)
        .append_to(parent)
}

/// Hidden `.modal` with header close button, a form body and a footer with
/// cancel and submit buttons. Returns the form.
pub fn modal(doc: &mut Document, parent: NodeId, id: &str, title: &str) -> NodeId {
    let root = doc
        .build("div")
        .id(id)
        .class("modal fade")
        .attr("tabindex", "-1")
        .attr("aria-hidden", "true")
        .style("display", "none")
        .append_to(parent);
    let dialog = doc.build("div").class("modal-dialog").append_to(root);
    let content = doc.build("div").class("modal-content").append_to(dialog);

    let header = doc.build("div").class("modal-header").append_to(content);
    doc.build("h5")
        .class("modal-title")
        .text(title)
        .append_to(header);
    doc.build("button")
        .attr("type", "button")
        .attr("aria-label", "Cerrar")
        .class("btn-close")
        .append_to(header);

    let body = doc.build("div").class("modal-body").append_to(content);
    let form = doc.build("form").append_to(body);
    doc.build("div")
        .class(&format!("alert alert-danger {FORM_ERROR_CLASS}"))
        .style("display", "none")
        .append_to(body);

    let footer = doc.build("div").class("modal-footer").append_to(content);
    doc.build("button")
        .attr("type", "button")
        .class("btn btn-secondary")
        .data("dismiss", "modal")
        .text("Cancelar")
        .append_to(footer);
    doc.build("button")
        .attr("type", "button")
        .attr(SUBMIT_ATTRIBUTE, id)
        .class("btn btn-primary")
        .text("Guardar")
        .append_to(footer);
    form
}

/// Labelled input with its `.invalid-feedback` sibling. Returns the input.
pub fn form_field(
    doc: &mut Document,
    form: NodeId,
    id: &str,
    label: &str,
    input_type: &str,
) -> NodeId {
    let group = doc.build("div").class("mb-3").append_to(form);
    doc.build("label")
        .attr("for", id)
        .class("form-label")
        .text(label)
        .append_to(group);
    let input = doc
        .build("input")
        .attr("type", input_type)
        .attr("name", id)
        .id(id)
        .class("form-control")
        .append_to(group);
    doc.build("div")
        .class("invalid-feedback")
        .style("display", "none")
        .append_to(group);
    input
}

pub fn hidden_field(doc: &mut Document, form: NodeId, id: &str) -> NodeId {
    doc.build("input")
        .attr("type", "hidden")
        .id(id)
        .append_to(form)
}

/// Labelled custom select inside a form. Returns the select root.
pub fn select_field(
    doc: &mut Document,
    form: NodeId,
    input_id: &str,
    label: &str,
    placeholder: &str,
    options: &[(&str, &str)],
) -> NodeId {
    let group = doc.build("div").class("mb-3").append_to(form);
    doc.build("label")
        .class("form-label")
        .text(label)
        .append_to(group);
    custom_select(doc, group, input_id, placeholder, options)
}

/// Modal's error banner, shown with `message` or hidden when `None`.
pub fn set_form_error(doc: &mut Document, modal_id: &str, message: Option<&str>) {
    let Some(modal) = doc.element_by_id(modal_id) else {
        return;
    };
    let Some(banner) = doc.first_with_class(modal, FORM_ERROR_CLASS) else {
        return;
    };
    doc.set_text(banner, message.unwrap_or_default());
    doc.set_displayed(banner, message.is_some());
}

/// The modal id a submit button saves, if `target` is inside one.
pub fn submit_target(doc: &Document, target: NodeId) -> Option<String> {
    doc.closest(
        target,
        |doc,
        node| doc.attribute(node, SUBMIT_ATTRIBUTE).is_some(),
    )
        .and_then(|button| doc.attribute(button, SUBMIT_ATTRIBUTE))
        .map(str::to_owned)
}

pub fn value_of(doc: &Document, id: &str) -> String {
    doc.element_by_id(id)
        .map(|node| doc.value(node).trim().to_owned())
        .unwrap_or_default()
}

pub fn set_value_of(doc: &mut Document, id: &str, value: &str) {
    if let Some(node) = doc.element_by_id(id) {
        doc.set_value(node, value);
    }
}
