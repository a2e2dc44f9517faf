// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Document, NodeId};

/// Chained element construction, detached until `append_to` or `build`
/// attaches it.
pub struct ElementBuilder<'a> {
    doc: &'a mut Document,
    node: NodeId,
}

impl Document {
    pub fn build(&mut self, tag: &str) -> ElementBuilder<'_> {
        let node = self.create_element(tag);
        ElementBuilder { doc: self, node }
    }
}

impl ElementBuilder<'_> {
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.doc.set_id(self.node, id);
        self
    }

    /// Accepts a space-separated class list.
    #[must_use]
    pub fn class(self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            self.doc.add_class(self.node, class);
        }
        self
    }

    #[must_use]
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.doc.set_attribute(self.node, name, value);
        self
    }

    #[must_use]
    pub fn data(self, key: &str, value: &str) -> Self {
        self.doc.set_data(self.node, key, value);
        self
    }

    #[must_use]
    pub fn style(self, property: &str, value: &str) -> Self {
        self.doc.set_style(self.node, property, value);
        self
    }

    #[must_use]
    pub fn text(self, text: &str) -> Self {
        self.doc.set_text(self.node, text);
        self
    }

    #[must_use]
    pub fn value(self, value: &str) -> Self {
        self.doc.set_value(self.node, value);
        self
    }

    pub fn append_to(self, parent: NodeId) -> NodeId {
        self.doc.append_child(parent, self.node);
        self.node
    }

    pub fn build(self) -> NodeId {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn builder_sets_everything_and_attaches() {
        let mut doc = Document::new();
        let body = doc.body();
        let button = doc
            .build("button")
            .id("guardar")
            .class("btn btn-primary")
            .data("action", "guardar")
            .text("Guardar")
            .append_to(body);

        assert_eq!(doc.element_by_id("guardar"), Some(button));
        assert!(doc.has_class(button, "btn"));
        assert!(doc.has_class(button, "btn-primary"));
        assert_eq!(doc.data(button, "action"), Some("guardar"));
        assert_eq!(doc.text(button), "Guardar");
    }

    #[test]
    fn build_leaves_node_detached() {
        let mut doc = Document::new();
        let input = doc.build("input").attr("type", "hidden").value("3").build();
        assert!(!doc.is_connected(input));
        assert_eq!(doc.value(input), "3");
        assert_eq!(doc.attribute(input, "type"), Some("hidden"));
    }
}
