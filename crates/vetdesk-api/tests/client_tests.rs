// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::thread;
use std::time::Duration;
use time::{Date, Month, Time};
use tiny_http::{Header, Method, Response, Server};
use vetdesk_api::Client;
use vetdesk_app::{NewAppointment, PetId};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn appointment() -> Result<NewAppointment> {
    Ok(NewAppointment {
        pet_id: PetId::new(4),
        kind: "Consulta".to_owned(),
        duration_minutes: 30,
        notes: "control anual".to_owned(),
        date: Date::from_calendar_date(2026, Month::March, 9)?,
        time: Time::from_hms(10, 30, 0)?,
    })
}

#[test]
fn unreachable_server_error_explains_the_fix() {
    let client =
        Client::new("http://127.0.0.1:1", Duration::from_millis(50)).expect("client should build");

    let error = client
        .ping()
        .expect_err("ping should fail for unreachable endpoint");
    assert!(error.to_string().contains("server.base_url"));
}

#[test]
fn day_fetch_hits_dated_path_and_parses_citas() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/agenda/citas-dia/2026-03-09/");
        let body = r#"{"citas":[
            {"hora":"09:00","tipo":"Consulta","mascota":"Luna"},
            {"hora":"15:30","tipo":"Vacunación","mascota":"Toby"}
        ]}"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let appointments =
        client.appointments_for_day(Date::from_calendar_date(2026, Month::March, 9)?)?;
    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[1].time, Time::from_hms(15, 30, 0)?);
    assert_eq!(appointments[1].kind, "Vacunación");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn day_fetch_rejects_malformed_times() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let body = r#"{"citas":[{"hora":"mediodía","tipo":"Consulta","mascota":"Luna"}]}"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .appointments_for_day(Date::from_calendar_date(2026, Month::March, 9)?)
        .expect_err("bad time should fail");
    assert!(error.to_string().contains("HH:MM"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn create_posts_server_field_names() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/agenda/crear/");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");
        let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["mascota_id"], 4);
        assert_eq!(json["tipo"], "Consulta");
        assert_eq!(json["duracion"], 30);
        assert_eq!(json["notas"], "control anual");
        assert_eq!(json["fecha"], "2026-03-09");
        assert_eq!(json["hora"], "10:30");
        request
            .respond(json_response(r#"{"success":true}"#, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    client.create_appointment(&appointment()?)?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn create_surfaces_rejection_message() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"success":false,"error":"Horario no disponible"}"#, 200))
            .expect("response should succeed");
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"success":false}"#, 200))
            .expect("response should succeed");
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"detail":"No autorizado"}"#, 403))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let appointment = appointment()?;

    let error = client
        .create_appointment(&appointment)
        .expect_err("rejected");
    assert_eq!(error.to_string(), "Horario no disponible");

    let error = client
        .create_appointment(&appointment)
        .expect_err("rejected");
    assert_eq!(error.to_string(), "server rejected the appointment");

    let error = client
        .create_appointment(&appointment)
        .expect_err("forbidden");
    assert_eq!(error.to_string(), "server error (403): No autorizado");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn ping_accepts_any_non_server_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/");
        request
            .respond(Response::from_string("not found").with_status_code(404))
            .expect("response should succeed");
        let request = server.recv().expect("request expected");
        request
            .respond(Response::from_string("boom").with_status_code(503))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    client.ping()?;
    let error = client.ping().expect_err("503 should fail");
    assert_eq!(error.to_string(), "server error (503): boom");

    handle.join().expect("server thread should join");
    Ok(())
}
