// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};
use vetdesk_app::StockLevel;
use vetdesk_dom::{NodeId, Rect};
use vetdesk_testkit::{demo_appointments, demo_catalog, fixture_date};
use vetdesk_ui::pages::inventory::{EDIT_MODAL_ID, STOCK_FILTER_ID};
use vetdesk_ui::wheel::{FADE_CLASS, MENU_CLASS};
use vetdesk_ui::{
    AgendaPage, InventoryPage, ManageWheel, Page, PageEvent, UiConfig, WheelOptions,
};

fn inventory() -> InventoryPage {
    InventoryPage::new(&demo_catalog(), UiConfig::default())
}

fn triggers(page: &InventoryPage) -> Vec<NodeId> {
    page.visible_rows()
        .into_iter()
        .filter_map(|row| page.doc().first_with_class(row, "wheel-trigger"))
        .collect()
}

fn select_option(page: &mut InventoryPage, input_id: &str, value: &str) -> Vec<PageEvent> {
    let now = Instant::now();
    let root = page
        .doc()
        .element_by_id(input_id)
        .and_then(|input| page.doc().parent(input))
        .expect("select root");
    let trigger = page
        .doc()
        .first_with_class(root, "select-trigger")
        .expect("select trigger");
    page.click(trigger, now);
    let option = page
        .doc()
        .query_class(root, "select-option")
        .into_iter()
        .find(|option| page.doc().data(*option, "value") == Some(value))
        .expect("option");
    page.click(option, now)
}

#[test]
fn opening_a_second_wheel_leaves_one_menu() {
    let mut page = inventory();
    let baseline = page.listener_count();
    let triggers = triggers(&page);
    let now = Instant::now();

    page.click(triggers[0], now);
    page.click(triggers[1], now);
    assert_eq!(ManageWheel::<()>::open_menus(page.doc()), 1);
    assert_eq!(page.listener_count(), baseline + 1);

    page.escape(now);
    assert_eq!(ManageWheel::<()>::open_menus(page.doc()), 0);
    assert_eq!(page.listener_count(), baseline);
}

#[test]
fn later_outside_click_after_close_has_no_effect() {
    let mut page = inventory();
    let baseline = page.listener_count();
    let trigger = triggers(&page)[0];
    let now = Instant::now();

    page.click(trigger, now);
    let heading = page.doc().query_tag(page.doc().body(), "h1")[0];
    assert_eq!(page.click(heading, now), vec![PageEvent::WheelClosed]);
    assert_eq!(page.listener_count(), baseline);

    let nodes_before = page.doc().node_count();
    assert!(page.click(heading, now).is_empty());
    assert_eq!(page.doc().node_count(), nodes_before);
}

#[test]
fn faded_menus_are_removed_on_tick() {
    let config = UiConfig {
        wheel: WheelOptions {
            fade: Some(Duration::from_millis(200)),
            ..WheelOptions::default()
        },
        ..UiConfig::default()
    };
    let mut page = InventoryPage::new(&demo_catalog(), config);
    let trigger = triggers(&page)[0];
    let start = Instant::now();
    page.click(trigger, start);
    page.escape(start);

    let fading = page.doc().query_class(page.doc().body(), FADE_CLASS);
    assert_eq!(fading.len(), 1);
    assert!(page.doc().has_class(fading[0], MENU_CLASS));
    assert_eq!(ManageWheel::<()>::open_menus(page.doc()), 0);

    page.tick(start + Duration::from_millis(100));
    assert!(page.doc().exists(fading[0]));
    page.tick(start + Duration::from_millis(250));
    assert!(!page.doc().exists(fading[0]));
}

#[test]
fn low_stock_filter_shows_only_low_rows() {
    let mut page = inventory();
    let low = StockLevel::Low.as_str();
    let events = select_option(&mut page, STOCK_FILTER_ID, low);
    let [PageEvent::FilterApplied { visible }] = events.as_slice() else {
        panic!("expected a filter pass, got {events:?}");
    };
    assert!(*visible > 0);
    for row in page.visible_rows() {
        assert_eq!(page.doc().data(row, "stock"), Some(low));
    }

    let search = page
        .doc()
        .element_by_id(vetdesk_ui::pages::inventory::SEARCH_ID)
        .expect("search");
    page.doc_mut().set_value(search, "gato");
    page.input(search);
    for row in page.visible_rows() {
        assert_eq!(page.doc().data(row, "stock"), Some(low));
    }
}

#[test]
fn guarded_modal_veto_then_confirm_resets_state() {
    let mut page = inventory();
    let now = Instant::now();
    page.click(triggers(&page)[0], now);
    let menu = page.open_menu().expect("menu");
    let edit = page
        .doc()
        .query_class(menu, "wheel-action")
        .into_iter()
        .next()
        .expect("edit button");
    page.click(edit, now);
    assert_eq!(page.open_modal().as_deref(), Some(EDIT_MODAL_ID));

    let name = page
        .doc()
        .element_by_id("producto-nombre")
        .expect("name field");
    page.doc_mut().set_value(name, "Cambiado");
    page.input(name);

    let modal = page.doc().element_by_id(EDIT_MODAL_ID).expect("modal");
    let cancel = page
        .doc()
        .query_attribute(modal, "data-dismiss")
        .into_iter()
        .next()
        .expect("cancel");
    assert_eq!(
        page.click(cancel, now),
        vec![PageEvent::DiscardRequested(EDIT_MODAL_ID.to_owned())]
    );
    assert_eq!(page.open_modal().as_deref(), Some(EDIT_MODAL_ID));

    assert_eq!(
        page.confirm_discard(),
        vec![PageEvent::ModalClosed(EDIT_MODAL_ID.to_owned())]
    );
    assert_eq!(page.open_modal(), None);
    assert_eq!(page.pending_confirmation(), None);

    // reopening starts clean: an untouched form closes without asking
    page.click(triggers(&page)[0], now);
    let menu = page.open_menu().expect("menu");
    let edit = page.doc().query_class(menu, "wheel-action")[0];
    page.click(edit, now);
    assert_eq!(
        page.escape(now),
        vec![PageEvent::ModalClosed(EDIT_MODAL_ID.to_owned())]
    );
}

#[test]
fn resize_repositions_open_menu_after_debounce() {
    let mut page = inventory();
    let trigger = triggers(&page)[0];
    page.doc_mut()
        .set_rect(trigger, Rect::new(600, 200, 30, 30));
    let start = Instant::now();
    page.click(trigger, start);
    let menu = page.open_menu().expect("menu");
    let before = page.doc().bounding_rect(menu);
    assert_eq!(before.right(), 630);

    page.doc_mut()
        .set_rect(trigger, Rect::new(640, 200, 30, 30));
    page.resize(Rect::new(0, 0, 1024, 768), start);
    page.tick(start + Duration::from_millis(50));
    assert_eq!(page.doc().bounding_rect(menu), before);

    page.tick(start + Duration::from_millis(200));
    assert_eq!(page.doc().bounding_rect(menu).x, before.x + 40);
}

#[test]
fn agenda_page_dispatch_through_host_enum() {
    let catalog = demo_catalog();
    let date = fixture_date();
    let mut page = Page::Agenda(AgendaPage::new(&catalog, date, UiConfig::default()));
    let Page::Agenda(agenda) = &mut page else {
        unreachable!();
    };
    let PageEvent::DayRequested(request) = agenda.request_day() else {
        panic!("expected a day request");
    };
    let appointments = demo_appointments(&catalog, request.date);
    let expected = appointments.len();
    let events = agenda.apply_day(request.token, Ok(appointments));
    assert_eq!(
        events,
        vec![PageEvent::DayLoaded {
            date,
            appointments: expected
        }]
    );
    assert_eq!(page.kind(), vetdesk_app::PageKind::Agenda);
    assert_eq!(page.listener_count(), 1);
}
