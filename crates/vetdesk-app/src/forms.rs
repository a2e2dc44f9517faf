// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::{Date, Time};

use crate::validation::{
    format_rut, is_valid_chile_phone, is_valid_email, normalize_chile_phone, validate_rut,
};
use crate::{NewAppointment, NewClient, PetId, ProductId, ServiceId};

pub const MAX_APPOINTMENT_MINUTES: u32 = 240;
pub const MAX_SERVICE_MINUTES: u32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Product,
    Restock,
    Service,
    Appointment,
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFormInput {
    pub id: ProductId,
    pub name: String,
    pub stock: u32,
    pub min_stock: u32,
    pub provider: String,
    pub price_clp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestockFormInput {
    pub id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFormInput {
    pub id: ServiceId,
    pub name: String,
    pub price_clp: i64,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentFormInput {
    pub pet_id: Option<PetId>,
    pub kind: String,
    pub duration_minutes: u32,
    pub notes: String,
    pub date: Date,
    pub time: Time,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFormInput {
    pub name: String,
    pub rut: String,
    pub email: String,
    pub phone: String,
}

impl ProductFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("product name is required -- enter a name and retry");
        }
        if self.provider.trim().is_empty() {
            bail!("product provider is required -- choose a provider and retry");
        }
        if self.price_clp < 0 {
            bail!("product price cannot be negative");
        }
        Ok(())
    }
}

impl RestockFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            bail!("restock quantity must be at least 1");
        }
        Ok(())
    }
}

impl ServiceFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("service name is required -- enter a name and retry");
        }
        if self.price_clp < 0 {
            bail!("service price cannot be negative");
        }
        if self.duration_minutes == 0 || self.duration_minutes > MAX_SERVICE_MINUTES {
            bail!("service duration must be between 1 and {MAX_SERVICE_MINUTES} minutes");
        }
        Ok(())
    }
}

impl AppointmentFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.pet_id.is_none_or(|id| id.get() <= 0) {
            bail!("appointment pet is required -- choose a pet and retry");
        }
        if self.kind.trim().is_empty() {
            bail!("appointment type is required -- choose a type and retry");
        }
        if self.duration_minutes == 0 || self.duration_minutes > MAX_APPOINTMENT_MINUTES {
            bail!(
                "appointment duration must be between 1 and {MAX_APPOINTMENT_MINUTES} minutes"
            );
        }
        Ok(())
    }

    pub fn into_new_appointment(self) -> Result<NewAppointment> {
        self.validate()?;
        let Some(pet_id) = self.pet_id else {
            bail!("appointment pet is required -- choose a pet and retry");
        };
        Ok(NewAppointment {
            pet_id,
            kind: self.kind.trim().to_owned(),
            duration_minutes: self.duration_minutes,
            notes: self.notes.trim().to_owned(),
            date: self.date,
            time: self.time,
        })
    }
}

impl ClientFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("client name is required -- enter a name and retry");
        }
        if !validate_rut(&self.rut) {
            bail!("client RUT {:?} has an invalid check digit", self.rut);
        }
        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            bail!("client email {email:?} is not a valid address");
        }
        let phone = self.phone.trim();
        if !phone.is_empty() && !is_valid_chile_phone(&normalize_chile_phone(phone)) {
            bail!("client phone {phone:?} is not a Chilean mobile number (+56 9 XXXX XXXX)");
        }
        Ok(())
    }

    /// Validated client with canonical RUT and phone spellings.
    pub fn normalized(&self) -> Result<NewClient> {
        self.validate()?;
        let phone = self.phone.trim();
        Ok(NewClient {
            name: self.name.trim().to_owned(),
            rut: format_rut(&self.rut),
            email: self.email.trim().to_owned(),
            phone: if phone.is_empty() {
                String::new()
            } else {
                normalize_chile_phone(phone)
            },
        })
    }
}
