// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, BTreeSet};

use crate::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    value: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    rect: Rect,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    body: NodeId,
    viewport: Rect,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            body: NodeId {
                index: 0,
                generation: 0,
            },
            viewport: Rect::new(0, 0, 1280, 800),
        };
        let root = doc.create_element("html");
        let body = doc.create_element("body");
        doc.root = root;
        doc.body = body;
        doc.append_child(root, body);
        doc
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    pub const fn body(&self) -> NodeId {
        self.body
    }

    pub const fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let node = Node {
            tag: tag.to_ascii_lowercase(),
            ..Node::default()
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn exists(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|node| node.tag.as_str())
    }

    // Tree structure.

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|child| *child == id)?;
        siblings.get(position + 1).copied()
    }

    /// Appends `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere. Refuses to create cycles.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.exists(parent) || !self.exists(child) || self.contains(child, parent) {
            return false;
        }
        self.remove(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Detaches `id` from its parent. The subtree stays alive.
    pub fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Detaches `id` and frees its whole subtree. Ids into it go stale.
    pub fn destroy(&mut self, id: NodeId) {
        if id == self.root || id == self.body || !self.exists(id) {
            return;
        }
        self.remove(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
        }
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Inclusive: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Pre-order descendants, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// Target first, then each ancestor up to the root.
    pub fn event_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.exists(target).then_some(target);
        while let Some(node) = current {
            path.push(node);
            current = self.parent(node);
        }
        path
    }

    pub fn closest(&self, id: NodeId, predicate: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        self.event_path(id)
            .into_iter()
            .find(|node| predicate(self, *node))
    }

    pub fn closest_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        self.closest(id, |doc, node| doc.has_class(node, class))
    }

    pub fn closest_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.closest(id, |doc, node| doc.tag(node) == Some(tag))
    }

    pub fn query_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| self.has_class(*node, class))
            .collect()
    }

    pub fn first_with_class(&self, root: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|node| self.has_class(*node, class))
    }

    pub fn query_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| self.tag(*node) == Some(tag))
            .collect()
    }

    pub fn query_attribute(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| self.attribute(*node, name).is_some())
            .collect()
    }

    /// Only nodes attached to the document are found.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if self.id(self.root) == Some(id) {
            return Some(self.root);
        }
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.id(*node) == Some(id))
    }

    /// Copies the subtree rooted at `id` into a detached tree. Element ids are
    /// not copied so the clone never shadows the original in id lookups.
    pub fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let source = self.node(id)?.clone();
        let copy = self.create_element(&source.tag);
        if let Some(node) = self.node_mut(copy) {
            node.classes = source.classes;
            node.attributes = source.attributes;
            node.style = source.style;
            node.text = source.text;
            node.value = source.value;
            node.rect = source.rect;
        }
        for child in source.children {
            if let Some(child_copy) = self.deep_clone(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    // Identity, classes and attributes.

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.node(node)?.id.as_deref()
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        if let Some(node) = self.node_mut(node) {
            node.id = Some(id.to_owned());
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node)
            .is_some_and(|node| node.classes.contains(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(node) = self.node_mut(node) {
            node.classes.insert(class.to_owned());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(node) = self.node_mut(node) {
            node.classes.remove(class);
        }
    }

    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    pub fn classes(&self, node: NodeId) -> Vec<&str> {
        self.node(node)
            .map(|node| node.classes.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(node) {
            node.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(node) = self.node_mut(node) {
            node.attributes.remove(name);
        }
    }

    /// `data-<key>` attribute, the `dataset[key]` of the browser.
    pub fn data(&self, node: NodeId, key: &str) -> Option<&str> {
        self.attribute(node, &format!("data-{key}"))
    }

    pub fn set_data(&mut self, node: NodeId, key: &str, value: &str) {
        self.set_attribute(node, &format!("data-{key}"), value);
    }

    // Inline style and visibility.

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node)?.style.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(node) {
            if value.is_empty() {
                node.style.remove(property);
            } else {
                node.style.insert(property.to_owned(), value.to_owned());
            }
        }
    }

    pub fn is_displayed(&self, node: NodeId) -> bool {
        self.exists(node) && self.style(node, "display") != Some("none")
    }

    /// Clears the inline `display` when shown, mirroring `style.display = ''`.
    pub fn set_displayed(&mut self, node: NodeId, shown: bool) {
        self.set_style(node, "display", if shown { "" } else { "none" });
    }

    /// Attached, and neither the node nor an ancestor is `display: none`.
    pub fn is_rendered(&self, node: NodeId) -> bool {
        self.is_connected(node)
            && self
                .event_path(node)
                .into_iter()
                .all(|ancestor| self.is_displayed(ancestor))
    }

    // Text and form values.

    pub fn text(&self, node: NodeId) -> &str {
        self.node(node).map_or("", |node| node.text.as_str())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(node) = self.node_mut(node) {
            node.text = text.to_owned();
        }
    }

    /// All text in the subtree, hidden parts included.
    pub fn text_content(&self, node: NodeId) -> String {
        self.collect_text(node, false)
    }

    /// Text of the subtree skipping `display: none` descendants. The node's
    /// own display is ignored so hidden rows can still be searched.
    pub fn inner_text(&self, node: NodeId) -> String {
        self.collect_text(node, true)
    }

    fn collect_text(&self, node: NodeId, visible_only: bool) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if visible_only && current != node && !self.is_displayed(current) {
                continue;
            }
            let text = self.text(current).trim();
            if !text.is_empty() {
                parts.push(text);
            }
            stack.extend(self.children(current).iter().rev());
        }
        parts.join(" ")
    }

    pub fn value(&self, node: NodeId) -> &str {
        self.node(node).map_or("", |node| node.value.as_str())
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(node) = self.node_mut(node) {
            node.value = value.to_owned();
        }
    }

    pub fn bounding_rect(&self, node: NodeId) -> Rect {
        self.node(node).map_or_else(Rect::default, |node| node.rect)
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(node) = self.node_mut(node) {
            node.rect = rect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::Rect;

    #[test]
    fn new_document_has_connected_body() {
        let doc = Document::new();
        assert!(doc.is_connected(doc.body()));
        assert_eq!(doc.tag(doc.body()), Some("body"));
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn element_by_id_ignores_detached_nodes() {
        let mut doc = Document::new();
        let table = doc.create_element("table");
        doc.set_id(table, "tabla");
        assert_eq!(doc.element_by_id("tabla"), None);

        doc.append_child(doc.body(), table);
        assert_eq!(doc.element_by_id("tabla"), Some(table));

        doc.remove(table);
        assert_eq!(doc.element_by_id("tabla"), None);
        assert!(doc.exists(table));
    }

    #[test]
    fn destroy_makes_ids_stale_even_after_slot_reuse() {
        let mut doc = Document::new();
        let menu = doc.create_element("div");
        let item = doc.create_element("button");
        doc.append_child(menu, item);
        doc.append_child(doc.body(), menu);

        doc.destroy(menu);
        assert!(!doc.exists(menu));
        assert!(!doc.exists(item));
        assert!(doc.children(doc.body()).is_empty());

        let reused = doc.create_element("span");
        assert_ne!(reused, menu);
        assert_ne!(reused, item);
        doc.add_class(menu, "ghost");
        assert!(!doc.has_class(reused, "ghost"));
        assert_eq!(doc.node_count(), 3);
    }

    #[test]
    fn append_child_refuses_cycles_and_moves_nodes() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        let other = doc.create_element("div");
        assert!(doc.append_child(outer, inner));
        assert!(!doc.append_child(inner, outer));

        assert!(doc.append_child(other, inner));
        assert!(doc.children(outer).is_empty());
        assert_eq!(doc.parent(inner), Some(other));
    }

    #[test]
    fn deep_clone_copies_structure_but_not_ids() {
        let mut doc = Document::new();
        let list = doc.create_element("div");
        doc.set_id(list, "acciones-1");
        doc.add_class(list, "wheel-actions");
        let button = doc.create_element("button");
        doc.set_data(button, "action", "editar");
        doc.set_text(button, "Editar");
        doc.append_child(list, button);
        doc.append_child(doc.body(), list);

        let copy = doc.deep_clone(list).expect("clone of live node");
        assert!(!doc.is_connected(copy));
        assert_eq!(doc.id(copy), None);
        assert!(doc.has_class(copy, "wheel-actions"));
        let copied_button = doc.children(copy)[0];
        assert_ne!(copied_button, button);
        assert_eq!(doc.data(copied_button, "action"), Some("editar"));
        assert_eq!(doc.text_content(copy), "Editar");
    }

    #[test]
    fn inner_text_skips_hidden_branches() {
        let mut doc = Document::new();
        let row = doc.create_element("tr");
        let name = doc.create_element("td");
        doc.set_text(name, " Vacuna triple ");
        let hidden = doc.create_element("div");
        doc.set_text(hidden, "Eliminar");
        doc.set_displayed(hidden, false);
        doc.append_child(row, name);
        doc.append_child(row, hidden);

        assert_eq!(doc.inner_text(row), "Vacuna triple");
        assert_eq!(doc.text_content(row), "Vacuna triple Eliminar");

        doc.set_displayed(row, false);
        assert_eq!(doc.inner_text(row), "Vacuna triple");
    }

    #[test]
    fn display_toggle_clears_inline_style() {
        let mut doc = Document::new();
        let row = doc.create_element("tr");
        doc.append_child(doc.body(), row);
        doc.set_displayed(row, false);
        assert_eq!(doc.style(row, "display"), Some("none"));
        assert!(!doc.is_rendered(row));
        doc.set_displayed(row, true);
        assert_eq!(doc.style(row, "display"), None);
        assert!(doc.is_rendered(row));
    }

    #[test]
    fn closest_and_event_path_walk_ancestors() {
        let mut doc = Document::new();
        let row = doc.create_element("tr");
        let cell = doc.create_element("td");
        let button = doc.create_element("button");
        doc.add_class(cell, "acciones");
        doc.append_child(doc.body(), row);
        doc.append_child(row, cell);
        doc.append_child(cell, button);

        assert_eq!(doc.closest_tag(button, "tr"), Some(row));
        assert_eq!(doc.closest_with_class(button, "acciones"), Some(cell));
        let path = doc.event_path(button);
        assert_eq!(path.first(), Some(&button));
        assert_eq!(path.last(), Some(&doc.root()));
    }

    #[test]
    fn stale_ids_read_as_empty() {
        let mut doc = Document::new();
        let node = doc.create_element("input");
        doc.set_value(node, "abc");
        doc.set_rect(node, Rect::new(1, 2, 3, 4));
        doc.destroy(node);
        assert_eq!(doc.value(node), "");
        assert_eq!(doc.bounding_rect(node), Rect::default());
        assert!(doc.children(node).is_empty());
        assert!(doc.event_path(node).is_empty());
    }
}
