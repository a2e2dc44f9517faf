// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use tracing::warn;
use vetdesk_dom::{Document, NodeId};

pub const DISABLED_CLASS: &str = "disabled";

/// Maps action names found in markup to a page's typed actions. The same
/// table serves the hidden template buttons and the transient wheel menu.
#[derive(Debug, Clone)]
pub struct ActionRegistry<A> {
    entries: BTreeMap<String, A>,
}

impl<A> Default for ActionRegistry<A> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<A: Copy> ActionRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, action: A) -> Self {
        self.register(name, action);
        self
    }

    pub fn register(&mut self, name: &str, action: A) {
        self.entries.insert(name.to_owned(), action);
    }

    pub fn lookup(&self, name: &str) -> Option<A> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, doc: &Document, node: NodeId) -> Option<A> {
        action_name(doc, node).and_then(|name| self.lookup(name))
    }

    /// Disables every action button under `scope` whose name has no handler.
    /// Returns how many were disabled.
    pub fn disable_unresolved(&self, doc: &mut Document, scope: NodeId) -> usize {
        let mut disabled = 0;
        for node in action_buttons(doc, scope) {
            if self.resolve(doc, node).is_some() {
                continue;
            }
            warn!(
                action = action_name(doc, node).unwrap_or("<none>"),
                "action button has no handler"
            );
            doc.add_class(node, DISABLED_CLASS);
            doc.set_attribute(node, "disabled", "");
            disabled += 1;
        }
        disabled
    }
}

/// Buttons under `scope` that carry an action, either `data-action` or a
/// legacy `onclick` call.
pub fn action_buttons(doc: &Document, scope: NodeId) -> Vec<NodeId> {
    doc.descendants(scope)
        .into_iter()
        .filter(|node| {
            doc.data(*node, "action").is_some() || doc.attribute(*node, "onclick").is_some()
        })
        .collect()
}

/// `data-action`, else the function name of an `onclick="fn(this)"` handler.
pub fn action_name(doc: &Document, node: NodeId) -> Option<&str> {
    if let Some(name) = doc.data(node, "action") {
        let name = name.trim();
        return (!name.is_empty()).then_some(name);
    }
    doc.attribute(node, "onclick").and_then(onclick_function)
}

pub fn onclick_function(source: &str) -> Option<&str> {
    let source = source.trim();
    let (name, _) = source.split_once('(')?;
    let name = name.trim();
    let name = name.strip_prefix("window.").unwrap_or(name);
    let valid = !name.is_empty()
        && !name.starts_with(|ch: char| ch.is_ascii_digit())
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$');
    valid.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::{ActionRegistry, DISABLED_CLASS, action_name, onclick_function};
    use vetdesk_dom::Document;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Action {
        Edit,
        Remove,
    }

    #[test]
    fn onclick_function_names() {
        assert_eq!(
            onclick_function("editarProducto(this)"),
            Some("editarProducto")
        );
        assert_eq!(onclick_function(" window.eliminar( 3 ) "), Some("eliminar"));
        assert_eq!(onclick_function("alert"), None);
        assert_eq!(onclick_function("1abc()"), None);
        assert_eq!(onclick_function("a.b()"), None);
    }

    #[test]
    fn data_action_wins_over_onclick() {
        let mut doc = Document::new();
        let button = doc
            .build("button")
            .data("action", "editar")
            .attr("onclick", "eliminarProducto(this)")
            .build();
        assert_eq!(action_name(&doc, button), Some("editar"));

        let legacy = doc
            .build("button")
            .attr("onclick", "eliminarProducto(this)")
            .build();
        let registry = ActionRegistry::new()
            .with("editar", Action::Edit)
            .with("eliminarProducto", Action::Remove);
        assert_eq!(registry.resolve(&doc, button), Some(Action::Edit));
        assert_eq!(registry.resolve(&doc, legacy), Some(Action::Remove));
    }

    #[test]
    fn unresolved_buttons_are_disabled() {
        let mut doc = Document::new();
        let body = doc.body();
        let list = doc.build("div").append_to(body);
        let known = doc.build("button").data("action", "editar").append_to(list);
        let unknown = doc
            .build("button")
            .data("action", "imprimir")
            .append_to(list);
        let registry = ActionRegistry::new().with("editar", Action::Edit);

        assert_eq!(registry.disable_unresolved(&mut doc, list), 1);
        assert!(doc.has_class(unknown, DISABLED_CLASS));
        assert!(!doc.has_class(known, DISABLED_CLASS));
    }
}
