// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Per-row "manage" menu.
//!
//! A trigger click clones the row's hidden `.wheel-actions` template into a
//! fixed-position menu on the body. Only one menu exists at a time and it
//! owns exactly one document listener, removed the moment the menu closes.
//! Menu buttons are resolved against the page's [`ActionRegistry`] when the
//! menu opens, so a click maps straight to a typed action.

use std::time::{Duration, Instant};

use tracing::{debug, warn};
use vetdesk_dom::{Document, NodeId, Rect};

use crate::actions::{ActionRegistry, DISABLED_CLASS, action_buttons, action_name};
use crate::listeners::{DocumentHandler, ListenerId, ListenerSet};

pub const WHEEL_CLASS: &str = "manage-wheel";
pub const TRIGGER_CLASS: &str = "wheel-trigger";
pub const ACTIONS_CLASS: &str = "wheel-actions";
pub const MENU_CLASS: &str = "wheel-menu";
pub const FADE_CLASS: &str = "fade-out";
pub const ACTIVE_CLASS: &str = "active";

/// Sizes used to estimate the menu box before it is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelMetrics {
    pub char_width: i32,
    pub item_height: i32,
    pub padding: i32,
    pub offset: i32,
}

impl WheelMetrics {
    /// One terminal cell per character and per item.
    pub const CELLS: Self = Self {
        char_width: 1,
        item_height: 1,
        padding: 1,
        offset: 0,
    };
}

impl Default for WheelMetrics {
    fn default() -> Self {
        Self {
            char_width: 8,
            item_height: 36,
            padding: 8,
            offset: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelOptions {
    pub metrics: WheelMetrics,
    pub fade: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelTransition {
    Opened,
    Closed,
    /// Another trigger's menu was closed and this one opened.
    Switched,
    /// The trigger has no action template.
    Unavailable,
}

#[derive(Debug, Clone)]
struct ActiveMenu<A> {
    trigger: NodeId,
    menu: NodeId,
    row: Option<NodeId>,
    buttons: Vec<(NodeId, A)>,
    listener: ListenerId,
}

#[derive(Debug, Clone)]
pub struct ManageWheel<A> {
    options: WheelOptions,
    active: Option<ActiveMenu<A>>,
    fading: Vec<(NodeId, Instant)>,
}

impl<A: Copy> ManageWheel<A> {
    pub fn new(options: WheelOptions) -> Self {
        Self {
            options,
            active: None,
            fading: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_trigger(&self) -> Option<NodeId> {
        self.active.as_ref().map(|active| active.trigger)
    }

    pub fn active_menu(&self) -> Option<NodeId> {
        self.active.as_ref().map(|active| active.menu)
    }

    pub fn active_row(&self) -> Option<NodeId> {
        self.active.as_ref().and_then(|active| active.row)
    }

    /// Menu buttons with their resolved actions, in menu order.
    pub fn bound_buttons(&self) -> &[(NodeId, A)] {
        self.active
            .as_ref()
            .map_or(&[], |active| active.buttons.as_slice())
    }

    /// Trigger click: opens, closes (same trigger) or switches menus.
    pub fn toggle(
        &mut self,
        doc: &mut Document,
        listeners: &mut ListenerSet,
        registry: &ActionRegistry<A>,
        trigger: NodeId,
        now: Instant,
    ) -> WheelTransition {
        let previous = self.active_trigger();
        if previous.is_some() {
            self.close(doc, listeners, now);
        }
        if previous == Some(trigger) {
            return WheelTransition::Closed;
        }
        if !self.open(doc, listeners, registry, trigger, now) {
            return WheelTransition::Unavailable;
        }
        if previous.is_some() {
            WheelTransition::Switched
        } else {
            WheelTransition::Opened
        }
    }

    /// Opens the menu for `trigger`, closing any open one first.
    pub fn open(
        &mut self,
        doc: &mut Document,
        listeners: &mut ListenerSet,
        registry: &ActionRegistry<A>,
        trigger: NodeId,
        now: Instant,
    ) -> bool {
        let Some(template) = find_template(doc, trigger) else {
            debug!("wheel trigger has no action template");
            return false;
        };
        if self.is_open() {
            self.close(doc, listeners, now);
        }
        let Some(menu) = doc.deep_clone(template) else {
            return false;
        };
        doc.remove_class(menu, ACTIONS_CLASS);
        doc.add_class(menu, MENU_CLASS);
        doc.set_displayed(menu, true);
        let body = doc.body();
        doc.append_child(body, menu);

        let mut buttons = Vec::new();
        for button in action_buttons(doc, menu) {
            match registry.resolve(doc, button) {
                Some(action) => buttons.push((button, action)),
                None => {
                    warn!(
                        action = action_name(doc, button).unwrap_or("<none>"),
                        "wheel action has no handler"
                    );
                    doc.add_class(button, DISABLED_CLASS);
                    doc.set_attribute(button, "disabled", "");
                }
            }
        }

        place(doc, self.options.metrics, trigger, menu);
        doc.add_class(trigger, ACTIVE_CLASS);
        doc.set_attribute(trigger, "aria-expanded", "true");
        let listener = listeners.add(DocumentHandler::WheelOutsideClick);
        let row = doc.closest_tag(trigger, "tr");
        debug!(actions = buttons.len(), "wheel menu opened");
        self.active = Some(ActiveMenu {
            trigger,
            menu,
            row,
            buttons,
            listener,
        });
        true
    }

    /// Closes the open menu. The listener goes away immediately; the menu
    /// node either goes too or fades until a later [`Self::tick`].
    pub fn close(&mut self, doc: &mut Document, listeners: &mut ListenerSet, now: Instant) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        listeners.remove(active.listener);
        doc.remove_class(active.trigger, ACTIVE_CLASS);
        doc.set_attribute(active.trigger, "aria-expanded", "false");
        match self.options.fade {
            Some(delay) if !delay.is_zero() => {
                doc.add_class(active.menu, FADE_CLASS);
                self.fading.push((active.menu, now + delay));
            }
            _ => doc.destroy(active.menu),
        }
        debug!("wheel menu closed");
        true
    }

    pub fn menu_contains(&self, doc: &Document, target: NodeId) -> bool {
        self.active_menu()
            .is_some_and(|menu| doc.contains(menu, target))
    }

    /// Click inside the open menu. A bound button closes the menu and yields
    /// its action with the owning row.
    pub fn click_menu(
        &mut self,
        doc: &mut Document,
        listeners: &mut ListenerSet,
        target: NodeId,
        now: Instant,
    ) -> Option<(A, Option<NodeId>)> {
        let active = self.active.as_ref()?;
        let (_, action) = active
            .buttons
            .iter()
            .find(|(button, _)| doc.contains(*button, target))
            .copied()?;
        let row = active.row;
        self.close(doc, listeners, now);
        Some((action, row))
    }

    /// Document listener body: closes on clicks outside the menu and outside
    /// every wheel trigger.
    pub fn outside_click(
        &mut self,
        doc: &mut Document,
        listeners: &mut ListenerSet,
        target: NodeId,
        now: Instant,
    ) -> bool {
        if !self.is_open()
            || self.menu_contains(doc, target)
            || doc.closest_with_class(target, TRIGGER_CLASS).is_some()
        {
            return false;
        }
        self.close(doc, listeners, now)
    }

    /// Destroys faded menus whose delay has passed.
    pub fn tick(&mut self, doc: &mut Document, now: Instant) -> usize {
        let (expired, pending): (Vec<_>, Vec<_>) = self
            .fading
            .drain(..)
            .partition(|(_, deadline)| now >= *deadline);
        self.fading = pending;
        for (menu, _) in &expired {
            doc.destroy(*menu);
        }
        expired.len()
    }

    /// Re-anchors the open menu, e.g. after the viewport changed.
    pub fn reposition(&self, doc: &mut Document) {
        if let Some(active) = &self.active {
            place(doc, self.options.metrics, active.trigger, active.menu);
        }
    }

    /// Menus on the page that are open and not fading out.
    pub fn open_menus(doc: &Document) -> usize {
        doc.query_class(doc.body(), MENU_CLASS)
            .into_iter()
            .filter(|menu| !doc.has_class(*menu, FADE_CLASS))
            .count()
    }
}

/// The trigger's `.manage-wheel` container template, else a template sibling.
fn find_template(doc: &Document, trigger: NodeId) -> Option<NodeId> {
    if let Some(container) = doc.closest_with_class(trigger, WHEEL_CLASS)
        && let Some(template) = doc.first_with_class(container, ACTIONS_CLASS)
    {
        return Some(template);
    }
    doc.next_sibling(trigger)
        .filter(|sibling| doc.has_class(*sibling, ACTIONS_CLASS))
}

fn menu_size(doc: &Document, metrics: WheelMetrics, menu: NodeId) -> (i32, i32) {
    let items = action_buttons(doc, menu);
    let widest = items
        .iter()
        .map(|item| doc.text_content(*item).chars().count())
        .max()
        .unwrap_or(0) as i32;
    let width = widest * metrics.char_width + 2 * metrics.padding;
    let height = items.len() as i32 * metrics.item_height + 2 * metrics.padding;
    (width, height)
}

/// Below the trigger and right-aligned with it; flipped above when the
/// bottom would overflow and there is room above; never past the left edge.
fn place(doc: &mut Document, metrics: WheelMetrics, trigger: NodeId, menu: NodeId) {
    let anchor = doc.bounding_rect(trigger);
    let viewport = doc.viewport();
    let (width, height) = menu_size(doc, metrics, menu);

    let mut top = anchor.bottom() + metrics.offset;
    if top + height > viewport.bottom() {
        let above = anchor.top() - metrics.offset - height;
        if above >= viewport.top() {
            top = above;
        }
    }
    let left = (anchor.right() - width).max(viewport.left());

    doc.set_style(menu, "position", "fixed");
    doc.set_style(menu, "top", &format!("{top}px"));
    doc.set_style(menu, "left", &format!("{left}px"));
    doc.set_style(menu, "z-index", "1050");
    doc.set_rect(menu, Rect::new(left, top, width, height));

    let inner_width = width - 2 * metrics.padding;
    for (index, item) in action_buttons(doc, menu).into_iter().enumerate() {
        let item_top = top + metrics.padding + index as i32 * metrics.item_height;
        doc.set_rect(
            item,
            Rect::new(
                left + metrics.padding,
                item_top,
                inner_width,
                metrics.item_height,
            ),
        );
    }
}
