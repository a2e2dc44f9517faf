// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use vetdesk_dom::{Document, NodeId};

use crate::listeners::{DocumentHandler, ListenerId, ListenerSet, Propagation};

pub const SELECT_CLASS: &str = "custom-select";
pub const TRIGGER_CLASS: &str = "select-trigger";
pub const LABEL_CLASS: &str = "select-label";
pub const OPTIONS_CLASS: &str = "select-options";
pub const OPTION_CLASS: &str = "select-option";
pub const OPEN_CLASS: &str = "open";
pub const SELECTED_CLASS: &str = "selected";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectChange<C> {
    pub select: NodeId,
    pub value: String,
    pub callback: Option<C>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome<C> {
    /// The click was not inside any bound select.
    Ignored,
    Opened(NodeId),
    Closed(NodeId),
    Changed(SelectChange<C>),
    /// Inside a select but on nothing actionable.
    Inside,
}

impl<C> SelectOutcome<C> {
    pub fn propagation(&self) -> Propagation {
        match self {
            Self::Ignored => Propagation::Continue,
            _ => Propagation::Stop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy)]
struct BoundSelect<C> {
    root: NodeId,
    callback: Option<C>,
}

/// Every custom select on a page. Opening one closes the rest, and one
/// document listener closes all of them on clicks that reach the document.
#[derive(Debug, Clone)]
pub struct SelectGroup<C> {
    selects: Vec<BoundSelect<C>>,
    sweep: Option<ListenerId>,
}

impl<C> Default for SelectGroup<C> {
    fn default() -> Self {
        Self {
            selects: Vec::new(),
            sweep: None,
        }
    }
}

impl<C: Copy> SelectGroup<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.selects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selects.is_empty()
    }

    pub fn bind(
        &mut self,
        doc: &Document,
        listeners: &mut ListenerSet,
        root: NodeId,
        callback: Option<C>,
    ) -> bool {
        if !doc.has_class(root, SELECT_CLASS) || self.selects.iter().any(|bound| bound.root == root)
        {
            return false;
        }
        self.selects.push(BoundSelect { root, callback });
        if self.sweep.is_none() {
            self.sweep = Some(listeners.add(DocumentHandler::SelectSweep));
        }
        true
    }

    /// Binds every `.custom-select` under `scope`, asking `callback_for`
    /// which callback each one reports on change.
    pub fn bind_all(
        &mut self,
        doc: &Document,
        listeners: &mut ListenerSet,
        scope: NodeId,
        callback_for: impl Fn(&Document, NodeId) -> Option<C>,
    ) -> usize {
        let mut bound = 0;
        for root in doc.query_class(scope, SELECT_CLASS) {
            if self.bind(doc, listeners, root, callback_for(doc, root)) {
                bound += 1;
            }
        }
        bound
    }

    pub fn click(&mut self, doc: &mut Document, target: NodeId) -> SelectOutcome<C> {
        let Some(bound) = self.owning(doc, target) else {
            return SelectOutcome::Ignored;
        };
        if let Some(option) = doc.closest_with_class(target, OPTION_CLASS)
            && doc.contains(bound.root, option)
        {
            let value = self.choose(doc, bound.root, option);
            return SelectOutcome::Changed(SelectChange {
                select: bound.root,
                value,
                callback: bound.callback,
            });
        }
        if let Some(trigger) = doc.closest_with_class(target, TRIGGER_CLASS)
            && doc.contains(bound.root, trigger)
        {
            if doc.has_class(bound.root, OPEN_CLASS) {
                doc.remove_class(bound.root, OPEN_CLASS);
                return SelectOutcome::Closed(bound.root);
            }
            self.close_all(doc);
            doc.add_class(bound.root, OPEN_CLASS);
            return SelectOutcome::Opened(bound.root);
        }
        SelectOutcome::Inside
    }

    fn owning(&self, doc: &Document, target: NodeId) -> Option<BoundSelect<C>> {
        let root = doc.closest_with_class(target, SELECT_CLASS)?;
        self.selects
            .iter()
            .copied()
            .find(|bound| bound.root == root)
    }

    fn choose(&self, doc: &mut Document, root: NodeId, option: NodeId) -> String {
        let value = doc.data(option, "value").unwrap_or_default().to_owned();
        mark_selected(doc, root, option, &value);
        doc.remove_class(root, OPEN_CLASS);
        value
    }

    pub fn close_all(&self, doc: &mut Document) {
        for bound in &self.selects {
            doc.remove_class(bound.root, OPEN_CLASS);
        }
    }

    pub fn open_select(&self, doc: &Document) -> Option<NodeId> {
        self.selects
            .iter()
            .map(|bound| bound.root)
            .find(|root| doc.has_class(*root, OPEN_CLASS))
    }

    /// Selects the option carrying `value` without reporting a change.
    pub fn set_value(&self, doc: &mut Document, root: NodeId, value: &str) -> bool {
        let Some(option) = doc
            .query_class(root, OPTION_CLASS)
            .into_iter()
            .find(|option| doc.data(*option, "value") == Some(value))
        else {
            return false;
        };
        mark_selected(doc, root, option, value);
        true
    }

    /// Back to the first option.
    pub fn reset(&self, doc: &mut Document, root: NodeId) {
        if let Some(first) = doc.first_with_class(root, OPTION_CLASS) {
            let value = doc.data(first, "value").unwrap_or_default().to_owned();
            mark_selected(doc, root, first, &value);
        }
    }
}

fn mark_selected(doc: &mut Document, root: NodeId, option: NodeId, value: &str) {
    for other in doc.query_class(root, OPTION_CLASS) {
        doc.remove_class(other, SELECTED_CLASS);
    }
    doc.add_class(option, SELECTED_CLASS);
    if let Some(input) = hidden_input(doc, root) {
        doc.set_value(input, value);
    }
    let label = doc.text_content(option);
    if let Some(label_node) = doc.first_with_class(root, LABEL_CLASS) {
        doc.set_text(label_node, &label);
    }
}

pub fn hidden_input(doc: &Document, root: NodeId) -> Option<NodeId> {
    doc.query_tag(root, "input").into_iter().next()
}

pub fn value(doc: &Document, root: NodeId) -> &str {
    hidden_input(doc, root).map_or("", |input| doc.value(input))
}

pub fn options(doc: &Document, root: NodeId) -> Vec<SelectOption> {
    doc.query_class(root, OPTION_CLASS)
        .into_iter()
        .map(|option| SelectOption {
            value: doc.data(option, "value").unwrap_or_default().to_owned(),
            label: doc.text_content(option),
            selected: doc.has_class(option, SELECTED_CLASS),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{OPEN_CLASS, SelectGroup, SelectOutcome, options, value};
    use crate::listeners::{DocumentHandler, ListenerSet, Propagation};
    use crate::markup;
    use vetdesk_dom::{Document, NodeId};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Callback {
        Refilter,
    }

    fn two_selects(doc: &mut Document) -> (NodeId, NodeId) {
        let body = doc.body();
        let first = markup::custom_select(
            doc,
            body,
            "filtro-especie",
            "Todas",
            &[("perro", "Perro"), ("gato", "Gato")],
        );
        let second = markup::custom_select(
            doc,
            body,
            "filtro-stock",
            "Todos",
            &[("low", "Stock bajo"), ("high", "Stock alto")],
        );
        (first, second)
    }

    fn trigger(doc: &Document, root: NodeId) -> NodeId {
        doc.first_with_class(root, super::TRIGGER_CLASS)
            .expect("trigger")
    }

    #[test]
    fn opening_one_select_closes_the_other() {
        let mut doc = Document::new();
        let mut listeners = ListenerSet::new();
        let (first, second) = two_selects(&mut doc);
        let mut group = SelectGroup::<Callback>::new();
        let scope = doc.body();
        assert_eq!(
            group.bind_all(&doc, &mut listeners, scope, |_, _| Some(Callback::Refilter)),
            2
        );
        assert_eq!(listeners.count_of(DocumentHandler::SelectSweep), 1);

        let first_trigger = trigger(&doc, first);
        assert_eq!(
            group.click(&mut doc, first_trigger),
            SelectOutcome::Opened(first)
        );
        let second_trigger = trigger(&doc, second);
        group.click(&mut doc, second_trigger);
        assert!(!doc.has_class(first, OPEN_CLASS));
        assert!(doc.has_class(second, OPEN_CLASS));
        assert_eq!(group.open_select(&doc), Some(second));

        assert_eq!(
            group.click(&mut doc, second_trigger),
            SelectOutcome::Closed(second)
        );
        assert_eq!(group.open_select(&doc), None);
    }

    #[test]
    fn choosing_an_option_updates_input_label_and_selection() {
        let mut doc = Document::new();
        let mut listeners = ListenerSet::new();
        let (first, _) = two_selects(&mut doc);
        let mut group = SelectGroup::new();
        group.bind(&doc, &mut listeners, first, Some(Callback::Refilter));

        let first_trigger = trigger(&doc, first);
        group.click(&mut doc, first_trigger);
        let gato = doc
            .query_class(first, super::OPTION_CLASS)
            .into_iter()
            .find(|option| doc.data(*option, "value") == Some("gato"))
            .expect("gato option");
        let outcome = group.click(&mut doc, gato);
        assert_eq!(outcome.propagation(), Propagation::Stop);
        let SelectOutcome::Changed(change) = outcome else {
            panic!("expected a change, got {outcome:?}");
        };
        assert_eq!(change.value, "gato");
        assert_eq!(change.callback, Some(Callback::Refilter));
        assert_eq!(value(&doc, first), "gato");
        assert!(!doc.has_class(first, OPEN_CLASS));

        let label = doc
            .first_with_class(first, super::LABEL_CLASS)
            .expect("label");
        assert_eq!(doc.text(label), "Gato");
        let selected: Vec<_> = options(&doc, first)
            .into_iter()
            .filter(|option| option.selected)
            .map(|option| option.value)
            .collect();
        assert_eq!(selected, vec!["gato".to_owned()]);
    }

    #[test]
    fn set_value_and_reset_are_silent() {
        let mut doc = Document::new();
        let mut listeners = ListenerSet::new();
        let (first, _) = two_selects(&mut doc);
        let mut group = SelectGroup::<Callback>::new();
        group.bind(&doc, &mut listeners, first, None);

        assert!(group.set_value(&mut doc, first, "perro"));
        assert_eq!(value(&doc, first), "perro");
        assert!(!group.set_value(&mut doc, first, "loro"));
        assert_eq!(value(&doc, first), "perro");

        group.reset(&mut doc, first);
        assert_eq!(value(&doc, first), "");
    }

    #[test]
    fn clicks_outside_selects_are_ignored() {
        let mut doc = Document::new();
        let mut listeners = ListenerSet::new();
        two_selects(&mut doc);
        let mut group = SelectGroup::<Callback>::new();
        let scope = doc.body();
        group.bind_all(&doc, &mut listeners, scope, |_, _| None);
        let body = doc.body();
        let elsewhere = doc.build("p").append_to(body);
        let outcome = group.click(&mut doc, elsewhere);
        assert_eq!(outcome, SelectOutcome::Ignored);
        assert_eq!(outcome.propagation(), Propagation::Continue);
    }
}
