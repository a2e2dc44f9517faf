// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Interaction layer of the clinic pages: table filtering, custom selects,
//! the per-row manage wheel, guarded modals and inline field feedback, wired
//! together by one controller per page.

pub mod actions;
pub mod feedback;
pub mod filter;
pub mod guard;
pub mod listeners;
pub mod markup;
pub mod pages;
pub mod select;
pub mod timers;
pub mod wheel;

pub use actions::ActionRegistry;
pub use feedback::{FieldFeedback, FieldKind, Validity};
pub use filter::{FilterBinding, FilterState, TableFilter, filter_rows, row_matches};
pub use guard::{CloseOutcome, ModalGuard, ModalGuardState};
pub use listeners::{DocumentHandler, ListenerId, ListenerSet, Propagation};
pub use pages::{
    DayRequest, Page, PageEvent, SelectCallback, UiConfig, agenda::AgendaPage,
    inventory::InventoryPage, services::ServicesPage,
};
pub use select::{SelectChange, SelectGroup, SelectOption, SelectOutcome};
pub use timers::Debounce;
pub use wheel::{ManageWheel, WheelMetrics, WheelOptions, WheelTransition};
