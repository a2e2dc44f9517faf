// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use time::Date;
use tracing::{debug, warn};
use vetdesk_app::{Appointment, Catalog, NewAppointment};
use vetdesk_tui::{AppRuntime, InternalEvent};
use vetdesk_ui::DayRequest;

pub fn load_catalog_file(path: &Path) -> Result<Catalog> {
    let raw = fs::read_to_string(path).with_context(|| {
        format!(
            "read catalog {} -- check [catalog] path in the config",
            path.display()
        )
    })?;
    serde_json::from_str(&raw).with_context(|| format!("decode catalog {}", path.display()))
}

/// Talks to the clinic server; the catalog comes from a local JSON file.
pub struct HttpRuntime {
    client: vetdesk_api::Client,
    catalog_path: Option<PathBuf>,
}

impl HttpRuntime {
    pub fn new(client: vetdesk_api::Client, catalog_path: Option<PathBuf>) -> Self {
        Self {
            client,
            catalog_path,
        }
    }
}

impl AppRuntime for HttpRuntime {
    fn load_catalog(&mut self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => load_catalog_file(path),
            None => {
                warn!("no [catalog] path configured; starting with an empty catalog");
                Ok(Catalog::default())
            }
        }
    }

    fn fetch_day(&mut self, date: Date) -> Result<Vec<Appointment>> {
        self.client.appointments_for_day(date)
    }

    fn create_appointment(&mut self, appointment: &NewAppointment) -> Result<()> {
        self.client.create_appointment(appointment)
    }

    fn spawn_fetch_day(&mut self, request: DayRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("agenda-fetch".to_owned())
            .spawn(move || {
                let result = client
                    .appointments_for_day(request.date)
                    .map_err(|error| format!("{error:#}"));
                debug!(
                    token = request.token,
                    ok = result.is_ok(),
                    "agenda fetch finished"
                );
                let _ = tx.send(InternalEvent::DayLoaded {
                    token: request.token,
                    result,
                });
            })
            .context("spawn agenda fetch worker")?;
        Ok(())
    }

    fn spawn_create_appointment(
        &mut self,
        appointment: NewAppointment,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("appointment-save".to_owned())
            .spawn(move || {
                let result = client
                    .create_appointment(&appointment)
                    .map_err(|error| format!("{error:#}"));
                debug!(ok = result.is_ok(), "appointment save finished");
                let _ = tx.send(InternalEvent::AppointmentSaved { result });
            })
            .context("spawn appointment save worker")?;
        Ok(())
    }
}

/// In-process agenda over the seeded demo catalog.
pub struct DemoRuntime {
    catalog: Catalog,
    days: BTreeMap<Date, Vec<Appointment>>,
}

impl DemoRuntime {
    pub fn new() -> Self {
        Self {
            catalog: vetdesk_testkit::demo_catalog(),
            days: BTreeMap::new(),
        }
    }

    /// Seeds a day on first visit so later bookings stick.
    fn day(&mut self, date: Date) -> &mut Vec<Appointment> {
        let catalog = &self.catalog;
        self.days
            .entry(date)
            .or_insert_with(|| vetdesk_testkit::demo_appointments(catalog, date))
    }
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl AppRuntime for DemoRuntime {
    fn load_catalog(&mut self) -> Result<Catalog> {
        Ok(self.catalog.clone())
    }

    fn fetch_day(&mut self, date: Date) -> Result<Vec<Appointment>> {
        Ok(self.day(date).clone())
    }

    fn create_appointment(&mut self, appointment: &NewAppointment) -> Result<()> {
        let pet = self
            .catalog
            .pets
            .iter()
            .find(|pet| pet.id == appointment.pet_id)
            .map(|pet| pet.name.clone())
            .ok_or_else(|| anyhow!("pet {} is not in the catalog", appointment.pet_id))?;

        let day = self.day(appointment.date);
        if day.iter().any(|taken| taken.time == appointment.time) {
            bail!("Horario no disponible");
        }
        day.push(Appointment {
            time: appointment.time,
            kind: appointment.kind.clone(),
            pet,
        });
        day.sort_by_key(|taken| taken.time);
        Ok(())
    }
}
