// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::PageKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_page: PageKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_page: PageKind::Inventory,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextPage,
    PrevPage,
    ShowPage(PageKind),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    PageChanged(PageKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextPage => self.rotate_page(1),
            AppCommand::PrevPage => self.rotate_page(-1),
            AppCommand::ShowPage(page) => {
                if self.active_page == page {
                    return Vec::new();
                }
                self.active_page = page;
                vec![AppEvent::PageChanged(page)]
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_page(&mut self, delta: isize) -> Vec<AppEvent> {
        let pages = PageKind::ALL;
        let current = pages
            .iter()
            .position(|page| *page == self.active_page)
            .unwrap_or(0) as isize;
        let len = pages.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_page = pages[next];
        vec![AppEvent::PageChanged(self.active_page)]
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState};
    use crate::PageKind;

    #[test]
    fn page_rotation_wraps() {
        let mut state = AppState {
            active_page: PageKind::Services,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextPage);
        assert_eq!(state.active_page, PageKind::Inventory);
        assert_eq!(events, vec![AppEvent::PageChanged(PageKind::Inventory)]);

        state.dispatch(AppCommand::PrevPage);
        assert_eq!(state.active_page, PageKind::Services);
    }

    #[test]
    fn show_page_is_silent_when_already_active() {
        let mut state = AppState::default();
        assert!(
            state
                .dispatch(AppCommand::ShowPage(PageKind::Inventory))
                .is_empty()
        );
        assert_eq!(
            state.dispatch(AppCommand::ShowPage(PageKind::Agenda)),
            vec![AppEvent::PageChanged(PageKind::Agenda)]
        );
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = AppState::default();

        let set = state.dispatch(AppCommand::SetStatus("cita creada".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("cita creada"));
        assert_eq!(set, vec![AppEvent::StatusUpdated("cita creada".to_owned())]);

        let cleared = state.dispatch(AppCommand::ClearStatus);
        assert!(state.status_line.is_none());
        assert_eq!(cleared, vec![AppEvent::StatusCleared]);
    }
}
