// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use vetdesk_dom::{Document, NodeId};

/// Placeholder row shown when a filter pass leaves no data rows visible.
pub const EMPTY_ROW_CLASS: &str = "sin-resultados";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_text: String,
    /// `data-<key>` name to required value. Empty values do not constrain.
    pub selected_filters: BTreeMap<String, String>,
}

impl FilterState {
    pub fn search(text: &str) -> Self {
        Self {
            search_text: text.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, key: &str, value: &str) -> Self {
        self.selected_filters
            .insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search_text.is_empty() && self.selected_filters.values().all(String::is_empty)
    }
}

pub fn row_matches(doc: &Document, row: NodeId, state: &FilterState) -> bool {
    if !state.search_text.is_empty() {
        let needle = state.search_text.to_lowercase();
        if !doc.inner_text(row).to_lowercase().contains(&needle) {
            return false;
        }
    }
    state
        .selected_filters
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .all(|(key, value)| doc.data(row, key) == Some(value.as_str()))
}

/// Shows matching rows and hides the rest. Returns how many are visible.
pub fn filter_rows(doc: &mut Document, rows: &[NodeId], state: &FilterState) -> usize {
    let mut visible = 0;
    for &row in rows {
        if !doc.exists(row) {
            continue;
        }
        let show = row_matches(doc, row, state);
        doc.set_displayed(row, show);
        visible += usize::from(show);
    }
    visible
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBinding {
    pub key: String,
    pub control_id: String,
}

/// Filter controls bound to one table body by element id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFilter {
    body_id: String,
    search_id: Option<String>,
    bindings: Vec<FilterBinding>,
}

impl TableFilter {
    pub fn new(body_id: &str) -> Self {
        Self {
            body_id: body_id.to_owned(),
            search_id: None,
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_search(mut self, search_id: &str) -> Self {
        self.search_id = Some(search_id.to_owned());
        self
    }

    #[must_use]
    pub fn bind(mut self, key: &str, control_id: &str) -> Self {
        self.bindings.push(FilterBinding {
            key: key.to_owned(),
            control_id: control_id.to_owned(),
        });
        self
    }

    pub fn body_id(&self) -> &str {
        &self.body_id
    }

    pub fn search_id(&self) -> Option<&str> {
        self.search_id.as_deref()
    }

    /// True when `node` is the search box or one of the bound controls.
    pub fn is_control(&self, doc: &Document, node: NodeId) -> bool {
        let Some(id) = doc.id(node) else {
            return false;
        };
        self.search_id.as_deref() == Some(id)
            || self.bindings.iter().any(|binding| binding.control_id == id)
    }

    /// The bound element, or its first `tbody` when it is a whole table.
    pub fn body(&self, doc: &Document) -> Option<NodeId> {
        let node = doc.element_by_id(&self.body_id)?;
        if doc.tag(node) == Some("table") {
            return doc.query_tag(node, "tbody").into_iter().next();
        }
        Some(node)
    }

    pub fn data_rows(&self, doc: &Document) -> Vec<NodeId> {
        let Some(body) = self.body(doc) else {
            return Vec::new();
        };
        doc.children(body)
            .iter()
            .copied()
            .filter(|row| doc.tag(*row) == Some("tr") && !doc.has_class(*row, EMPTY_ROW_CLASS))
            .collect()
    }

    pub fn visible_rows(&self, doc: &Document) -> Vec<NodeId> {
        self.data_rows(doc)
            .into_iter()
            .filter(|row| doc.is_displayed(*row))
            .collect()
    }

    pub fn read_state(&self, doc: &Document) -> FilterState {
        let control_value = |id: &str| {
            doc.element_by_id(id)
                .map(|node| doc.value(node).to_owned())
                .unwrap_or_default()
        };
        FilterState {
            search_text: self
                .search_id
                .as_deref()
                .map(control_value)
                .unwrap_or_default(),
            selected_filters: self
                .bindings
                .iter()
                .map(|binding| (binding.key.clone(), control_value(&binding.control_id)))
                .collect(),
        }
    }

    /// Reads the live controls and filters the table in one pass.
    pub fn apply(&self, doc: &mut Document) -> usize {
        let Some(body) = self.body(doc) else {
            return 0;
        };
        let state = self.read_state(doc);
        let rows = self.data_rows(doc);
        let visible = filter_rows(doc, &rows, &state);
        if let Some(empty) = doc.first_with_class(body, EMPTY_ROW_CLASS) {
            doc.set_displayed(empty, visible == 0);
        }
        visible
    }
}
