// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;
use vetdesk_dom::{Document, NodeId};

pub const SHOW_CLASS: &str = "show";
pub const CLOSE_BUTTON_CLASS: &str = "btn-close";
pub const BODY_OPEN_CLASS: &str = "modal-open";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModalGuardState {
    pub form_changed: bool,
    pub allow_close: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// Unsaved changes; the host must ask before discarding.
    Vetoed,
    AlreadyClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GuardedModal {
    modal_id: String,
    state: ModalGuardState,
    awaiting_confirmation: bool,
}

/// Unsaved-changes gate over the page's modals.
#[derive(Debug, Clone, Default)]
pub struct ModalGuard {
    modals: Vec<GuardedModal>,
}

impl ModalGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guard(&mut self, modal_id: &str, state: ModalGuardState) {
        if let Some(existing) = self.entry_mut(modal_id) {
            existing.state = state;
            return;
        }
        self.modals.push(GuardedModal {
            modal_id: modal_id.to_owned(),
            state,
            awaiting_confirmation: false,
        });
    }

    pub fn is_guarded(&self, modal_id: &str) -> bool {
        self.entry(modal_id).is_some()
    }

    pub fn state(&self, modal_id: &str) -> Option<ModalGuardState> {
        self.entry(modal_id).map(|entry| entry.state)
    }

    fn entry(&self, modal_id: &str) -> Option<&GuardedModal> {
        self.modals.iter().find(|entry| entry.modal_id == modal_id)
    }

    fn entry_mut(&mut self, modal_id: &str) -> Option<&mut GuardedModal> {
        self.modals
            .iter_mut()
            .find(|entry| entry.modal_id == modal_id)
    }

    pub fn is_open(doc: &Document, modal_id: &str) -> bool {
        doc.element_by_id(modal_id)
            .is_some_and(|modal| doc.has_class(modal, SHOW_CLASS))
    }

    /// Shows the modal with a clean state.
    pub fn open(&mut self, doc: &mut Document, modal_id: &str) -> bool {
        let Some(modal) = doc.element_by_id(modal_id) else {
            return false;
        };
        if let Some(entry) = self.entry_mut(modal_id) {
            entry.state = ModalGuardState::default();
            entry.awaiting_confirmation = false;
        }
        doc.add_class(modal, SHOW_CLASS);
        doc.set_style(modal, "display", "block");
        doc.set_attribute(modal, "aria-hidden", "false");
        let body = doc.body();
        doc.add_class(body, BODY_OPEN_CLASS);
        debug!(modal = modal_id, "modal opened");
        true
    }

    pub fn mark_changed(&mut self, modal_id: &str) -> bool {
        let Some(entry) = self.entry_mut(modal_id) else {
            return false;
        };
        entry.state.form_changed = true;
        true
    }

    /// Marks the open guarded modal containing `target` as edited.
    pub fn mark_changed_at(&mut self, doc: &Document, target: NodeId) -> Option<String> {
        let modal_id = self.open_modal_containing(doc, target)?;
        self.mark_changed(&modal_id);
        Some(modal_id)
    }

    fn open_modal_containing(&self, doc: &Document, target: NodeId) -> Option<String> {
        self.modals
            .iter()
            .filter_map(|entry| {
                let modal = doc.element_by_id(&entry.modal_id)?;
                (doc.has_class(modal, SHOW_CLASS) && doc.contains(modal, target))
                    .then(|| entry.modal_id.clone())
            })
            .next()
    }

    /// The modal a click asks to close: its close button, a
    /// `data-dismiss="modal"` element, or the backdrop (the modal root).
    pub fn close_intent(&self, doc: &Document, target: NodeId) -> Option<String> {
        let modal_id = self.open_modal_containing(doc, target)?;
        let modal = doc.element_by_id(&modal_id)?;
        let dismiss = doc
            .closest(target, |doc, node| {
                doc.has_class(node, CLOSE_BUTTON_CLASS)
                    || doc.data(node, "dismiss") == Some("modal")
                    || doc.data(node, "bs-dismiss") == Some("modal")
            })
            .is_some_and(|node| doc.contains(modal, node));
        (target == modal || dismiss).then_some(modal_id)
    }

    /// Topmost open guarded modal, the one Escape addresses.
    pub fn top_open(&self, doc: &Document) -> Option<String> {
        self.modals
            .iter()
            .rev()
            .find(|entry| Self::is_open(doc, &entry.modal_id))
            .map(|entry| entry.modal_id.clone())
    }

    pub fn pending_confirmation(&self) -> Option<&str> {
        self.modals
            .iter()
            .find(|entry| entry.awaiting_confirmation)
            .map(|entry| entry.modal_id.as_str())
    }

    pub fn request_close(&mut self, doc: &mut Document, modal_id: &str) -> CloseOutcome {
        if !Self::is_open(doc, modal_id) {
            return CloseOutcome::AlreadyClosed;
        }
        if let Some(entry) = self.entry_mut(modal_id) {
            if entry.state.form_changed && !entry.state.allow_close {
                entry.awaiting_confirmation = true;
                debug!(modal = modal_id, "close vetoed, unsaved changes");
                return CloseOutcome::Vetoed;
            }
            entry.state.allow_close = false;
            entry.awaiting_confirmation = false;
        }
        hide(doc, modal_id);
        CloseOutcome::Closed
    }

    /// User agreed to discard: allow one close and issue it.
    pub fn confirm_discard(&mut self, doc: &mut Document, modal_id: &str) -> CloseOutcome {
        let Some(entry) = self.entry_mut(modal_id) else {
            return CloseOutcome::AlreadyClosed;
        };
        entry.state.allow_close = true;
        entry.state.form_changed = false;
        entry.awaiting_confirmation = false;
        self.request_close(doc, modal_id)
    }

    /// User kept editing; nothing changes.
    pub fn decline_discard(&mut self, modal_id: &str) {
        if let Some(entry) = self.entry_mut(modal_id) {
            entry.awaiting_confirmation = false;
        }
    }

    /// Closes after a successful submit without asking.
    pub fn close_after_save(&mut self, doc: &mut Document, modal_id: &str) -> CloseOutcome {
        if let Some(entry) = self.entry_mut(modal_id) {
            entry.state = ModalGuardState {
                form_changed: false,
                allow_close: true,
            };
        }
        self.request_close(doc, modal_id)
    }
}

fn hide(doc: &mut Document, modal_id: &str) {
    let Some(modal) = doc.element_by_id(modal_id) else {
        return;
    };
    doc.remove_class(modal, SHOW_CLASS);
    doc.set_style(modal, "display", "none");
    doc.set_attribute(modal, "aria-hidden", "true");
    let any_open = doc
        .query_class(doc.body(), "modal")
        .into_iter()
        .any(|other| doc.has_class(other, SHOW_CLASS));
    if !any_open {
        let body = doc.body();
        doc.remove_class(body, BODY_OPEN_CLASS);
    }
    debug!(modal = modal_id, "modal closed");
}

#[cfg(test)]
mod tests {
    use super::{BODY_OPEN_CLASS, CloseOutcome, ModalGuard, ModalGuardState};
    use crate::markup;
    use vetdesk_dom::{Document, NodeId};

    const MODAL: &str = "modalEditarProducto";

    fn page() -> (Document, ModalGuard, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let form = markup::modal(&mut doc, body, MODAL, "Editar producto");
        let mut guard = ModalGuard::new();
        guard.guard(MODAL, ModalGuardState::default());
        (doc, guard, form)
    }

    #[test]
    fn unchanged_modal_closes_immediately() {
        let (mut doc, mut guard, _) = page();
        assert!(guard.open(&mut doc, MODAL));
        assert!(ModalGuard::is_open(&doc, MODAL));
        assert_eq!(guard.request_close(&mut doc, MODAL), CloseOutcome::Closed);
        assert!(!ModalGuard::is_open(&doc, MODAL));
        assert!(!doc.has_class(doc.body(), BODY_OPEN_CLASS));
        assert_eq!(
            guard.request_close(&mut doc, MODAL),
            CloseOutcome::AlreadyClosed
        );
    }

    #[test]
    fn veto_then_confirm_closes_and_resets_state() {
        let (mut doc, mut guard, _) = page();
        guard.open(&mut doc, MODAL);
        guard.mark_changed(MODAL);
        assert_eq!(
            guard.state(MODAL),
            Some(ModalGuardState {
                form_changed: true,
                allow_close: false
            })
        );

        assert_eq!(guard.request_close(&mut doc, MODAL), CloseOutcome::Vetoed);
        assert!(ModalGuard::is_open(&doc, MODAL));
        assert_eq!(guard.pending_confirmation(), Some(MODAL));

        assert_eq!(guard.confirm_discard(&mut doc, MODAL), CloseOutcome::Closed);
        assert!(!ModalGuard::is_open(&doc, MODAL));
        assert_eq!(guard.state(MODAL), Some(ModalGuardState::default()));
        assert_eq!(guard.pending_confirmation(), None);
    }

    #[test]
    fn decline_keeps_modal_open_and_state_unchanged() {
        let (mut doc, mut guard, _) = page();
        guard.open(&mut doc, MODAL);
        guard.mark_changed(MODAL);
        guard.request_close(&mut doc, MODAL);
        let before = guard.state(MODAL);

        guard.decline_discard(MODAL);
        assert!(ModalGuard::is_open(&doc, MODAL));
        assert_eq!(guard.state(MODAL), before);
        assert_eq!(guard.request_close(&mut doc, MODAL), CloseOutcome::Vetoed);
    }

    #[test]
    fn reopening_resets_the_state() {
        let (mut doc, mut guard, _) = page();
        guard.open(&mut doc, MODAL);
        guard.mark_changed(MODAL);
        guard.close_after_save(&mut doc, MODAL);
        assert_eq!(guard.state(MODAL), Some(ModalGuardState::default()));

        guard.open(&mut doc, MODAL);
        guard.mark_changed(MODAL);
        guard.open(&mut doc, MODAL);
        assert_eq!(guard.state(MODAL), Some(ModalGuardState::default()));
    }

    #[test]
    fn close_intents_are_recognised() {
        let (mut doc, mut guard, form) = page();
        let modal = doc.element_by_id(MODAL).expect("modal");
        let field = doc.build("input").append_to(form);
        assert_eq!(guard.close_intent(&doc, modal), None);

        guard.open(&mut doc, MODAL);
        let close = doc
            .first_with_class(modal, super::CLOSE_BUTTON_CLASS)
            .expect("close button");
        let cancel = doc
            .query_attribute(modal, "data-dismiss")
            .into_iter()
            .next()
            .expect("cancel button");
        assert_eq!(guard.close_intent(&doc, close).as_deref(), Some(MODAL));
        assert_eq!(guard.close_intent(&doc, cancel).as_deref(), Some(MODAL));
        assert_eq!(guard.close_intent(&doc, modal).as_deref(), Some(MODAL));
        assert_eq!(guard.close_intent(&doc, field), None);

        assert_eq!(guard.mark_changed_at(&doc, field).as_deref(), Some(MODAL));
        assert_eq!(guard.top_open(&doc).as_deref(), Some(MODAL));
    }

    #[test]
    fn missing_modal_is_a_no_op() {
        let mut doc = Document::new();
        let mut guard = ModalGuard::new();
        guard.guard("modalFantasma", ModalGuardState::default());
        assert!(!guard.open(&mut doc, "modalFantasma"));
        assert_eq!(
            guard.request_close(&mut doc, "modalFantasma"),
            CloseOutcome::AlreadyClosed
        );
    }
}
