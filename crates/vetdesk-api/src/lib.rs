// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Blocking client for the clinic server's agenda endpoints.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::Date;
use tracing::debug;
use url::Url;
use vetdesk_app::validation::{format_date, format_time, parse_time};
use vetdesk_app::{Appointment, NewAppointment};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url).with_context(|| {
            format!("server.base_url {base_url:?} is not a URL -- use e.g. {DEFAULT_BASE_URL}")
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `GET /agenda/citas-dia/{date}/`
    pub fn appointments_for_day(&self, date: Date) -> Result<Vec<Appointment>> {
        let url = format!("{}/agenda/citas-dia/{}/", self.base_url, format_date(date));
        debug!(%url, "fetching agenda day");
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        let response = check_status(response)?;

        let parsed: DayResponse = response.json().context("decode agenda day")?;
        parsed
            .citas
            .into_iter()
            .map(DayRow::into_appointment)
            .collect()
    }

    /// `POST /agenda/crear/`. A `success: false` reply becomes an error
    /// carrying the server's message.
    pub fn create_appointment(&self, appointment: &NewAppointment) -> Result<()> {
        let url = format!("{}/agenda/crear/", self.base_url);
        let request = CreateRequest::from(appointment);
        debug!(%url, fecha = %request.fecha, hora = %request.hora, "creating appointment");
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        let response = check_status(response)?;

        let parsed: CreateResponse = response.json().context("decode create response")?;
        if parsed.success {
            return Ok(());
        }
        match parsed.error.filter(|error| !error.trim().is_empty()) {
            Some(error) => bail!("{error}"),
            None => bail!("server rejected the appointment"),
        }
    }

    /// Succeeds when the server answers at all, short of a server error.
    pub fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        let status = response.status();
        if status.is_server_error() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(clean_error_response(status, &body))
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check server.base_url in the config or start the clinic server ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.error.or(parsed.detail)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if body.len() < 100 && !body.contains('{') && !body.contains('<') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct DayResponse {
    #[serde(default)]
    citas: Vec<DayRow>,
}

#[derive(Debug, Deserialize)]
struct DayRow {
    hora: String,
    tipo: String,
    mascota: String,
}

impl DayRow {
    fn into_appointment(self) -> Result<Appointment> {
        let time = parse_time(&self.hora)
            .map_err(|_| anyhow!("appointment time {:?} is not HH:MM", self.hora))?;
        Ok(Appointment {
            time,
            kind: self.tipo,
            pet: self.mascota,
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    mascota_id: i64,
    tipo: &'a str,
    duracion: u32,
    notas: &'a str,
    fecha: String,
    hora: String,
}

impl<'a> From<&'a NewAppointment> for CreateRequest<'a> {
    fn from(appointment: &'a NewAppointment) -> Self {
        Self {
            mascota_id: appointment.pet_id.get(),
            tipo: &appointment.kind,
            duracion: appointment.duration_minutes,
            notas: &appointment.notes,
            fecha: format_date(appointment.date),
            hora: format_time(appointment.time),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    detail: Option<String>,
}
