// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Document-level click handlers. Each variant names the component that
/// reacts; the page controller routes to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentHandler {
    WheelOutsideClick,
    SelectSweep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

/// Listeners registered on the document, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ListenerSet {
    next_id: u64,
    entries: Vec<(ListenerId, DocumentHandler)>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handler: DocumentHandler) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, handler));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    pub fn listener_count(&self) -> usize {
        self.entries.len()
    }

    pub fn count_of(&self, handler: DocumentHandler) -> usize {
        self.entries
            .iter()
            .filter(|(_, entry)| *entry == handler)
            .count()
    }

    /// Listeners present when a click starts. Handlers added while the click
    /// is being dispatched do not see that click.
    pub fn snapshot(&self) -> Vec<(ListenerId, DocumentHandler)> {
        self.entries.clone()
    }
}
