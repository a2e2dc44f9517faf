// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::macros::date;
use time::{Date, Time};
use vetdesk_app::validation::{format_rut, rut_check_digit};
use vetdesk_app::{
    Appointment, Catalog, ClientFormInput, ClinicService, InventoryItem, Pet, PetId, ProductId,
    ServiceCategory, ServiceId, Species,
};

/// Seed behind [`demo_catalog`].
pub const DEMO_SEED: u64 = 2026;

const PROVIDERS: [&str; 5] = [
    "Drag Pharma",
    "Veterquímica",
    "Royal Canin",
    "Bayer Animal",
    "Distribuidora Sur",
];

const PRODUCTS: [(&str, Species); 14] = [
    ("Alimento adulto 15 kg", Species::Dog),
    ("Alimento cachorro 3 kg", Species::Dog),
    ("Pipeta antipulgas", Species::Dog),
    ("Collar antiparasitario", Species::Dog),
    ("Shampoo dermatológico", Species::Dog),
    ("Alimento gato esterilizado", Species::Cat),
    ("Arena sanitaria 10 kg", Species::Cat),
    ("Snack dental felino", Species::Cat),
    ("Antiparasitario interno gato", Species::Cat),
    ("Malta para bolas de pelo", Species::Cat),
    ("Heno para conejo", Species::Exotic),
    ("Semillas para cacatúa", Species::Exotic),
    ("Vitaminas para reptiles", Species::Exotic),
    ("Sustrato para hámster", Species::Exotic),
];

const SERVICES: [(&str, ServiceCategory, u32); 10] = [
    ("Consulta general", ServiceCategory::Consultation, 30),
    ("Consulta de urgencia", ServiceCategory::Consultation, 45),
    ("Control post operatorio", ServiceCategory::Consultation, 20),
    ("Vacuna óctuple", ServiceCategory::Vaccination, 15),
    ("Vacuna antirrábica", ServiceCategory::Vaccination, 15),
    ("Vacuna triple felina", ServiceCategory::Vaccination, 15),
    ("Esterilización", ServiceCategory::Surgery, 120),
    ("Limpieza dental", ServiceCategory::Surgery, 90),
    ("Baño y corte", ServiceCategory::Grooming, 60),
    ("Corte de uñas", ServiceCategory::Grooming, 15),
];

const APPOINTMENT_KINDS: [&str; 5] = ["Consulta", "Vacunación", "Control", "Cirugía", "Peluquería"];

const PET_NAMES: [&str; 16] = [
    "Luna", "Toby", "Rocco", "Nala", "Simba", "Kira", "Max", "Olivia", "Coco", "Bruno", "Mía",
    "Thor", "Canela", "Pelusa", "Copito", "Manchas",
];

const FIRST_NAMES: [&str; 12] = [
    "Camila", "Matías", "Valentina", "Benjamín", "Antonia", "Joaquín", "Catalina", "Tomás",
    "Josefa", "Vicente", "Fernanda", "Ignacio",
];
const LAST_NAMES: [&str; 12] = [
    "González", "Muñoz", "Rojas", "Díaz", "Pérez", "Soto", "Contreras", "Silva", "Martínez",
    "Sepúlveda", "Morales", "Fuentes",
];

const EMAIL_DOMAINS: [&str; 4] = ["gmail.com", "hotmail.com", "vtr.net", "clinica.cl"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for clinic fixtures. The same seed always yields the
/// same catalog, clients and agenda.
#[derive(Debug, Clone)]
pub struct ClinicFaker {
    rng: DeterministicRng,
}

impl ClinicFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn catalog(&mut self) -> Catalog {
        let products = PRODUCTS
            .iter()
            .enumerate()
            .map(|(index, (name, species))| self.product(index as i64 + 1, name, *species))
            .collect();
        let services = SERVICES
            .iter()
            .enumerate()
            .map(|(index, (name, category, minutes))| ClinicService {
                id: ServiceId::new(index as i64 + 1),
                name: (*name).to_owned(),
                category: *category,
                price_clp: self.price(8_000, 180_000),
                duration_minutes: *minutes,
                active: self.int_n(5) != 0,
            })
            .collect();
        let pets = (0..PET_NAMES.len())
            .map(|index| self.pet(index as i64 + 1, PET_NAMES[index]))
            .collect();
        Catalog {
            products,
            services,
            pets,
            appointment_kinds: APPOINTMENT_KINDS
                .iter()
                .map(|kind| (*kind).to_owned())
                .collect(),
        }
    }

    /// The stock level cycles with `id`, so any three consecutive products
    /// cover every [`vetdesk_app::StockLevel`].
    pub fn product(&mut self, id: i64, name: &str, species: Species) -> InventoryItem {
        let min_stock = self.int_range_u32(3, 10);
        let stock = match id.rem_euclid(3) {
            0 => 0,
            1 => self.int_range_u32(1, min_stock),
            _ => self.int_range_u32(min_stock + 1, 80),
        };
        InventoryItem {
            id: ProductId::new(id),
            name: name.to_owned(),
            species,
            stock,
            min_stock,
            provider: (*self.pick(&PROVIDERS)).to_owned(),
            price_clp: self.price(1_990, 64_990),
        }
    }

    pub fn pet(&mut self, id: i64, name: &str) -> Pet {
        Pet {
            id: PetId::new(id),
            name: name.to_owned(),
            species: *self.pick(&Species::ALL),
            owner: self.full_name(),
        }
    }

    /// A client form that passes validation, with a real RUT check digit.
    pub fn client(&mut self) -> ClientFormInput {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let body = self.int_range_u32(5_000_000, 25_999_999).to_string();
        let check = rut_check_digit(&body).unwrap_or('0');
        let domain = self.pick(&EMAIL_DOMAINS);
        ClientFormInput {
            name: format!("{first} {last}"),
            rut: format_rut(&format!("{body}{check}")),
            email: format!(
                "{}.{}@{domain}",
                ascii_fold(first).to_ascii_lowercase(),
                ascii_fold(last).to_ascii_lowercase()
            ),
            phone: format!(
                "+56 9 {:04} {:04}",
                self.int_range_u32(1_000, 9_999),
                self.int_range_u32(0, 9_999)
            ),
        }
    }

    /// Appointments for one day, on the half-hour grid between 09:00 and
    /// 18:30, sorted by time without duplicates.
    pub fn appointments(&mut self, catalog: &Catalog) -> Vec<Appointment> {
        let count = self.int_n(7);
        let mut slots: Vec<u8> = Vec::with_capacity(count);
        while slots.len() < count {
            let slot = self.int_n(20) as u8;
            if !slots.contains(&slot) {
                slots.push(slot);
            }
        }
        slots.sort_unstable();
        slots
            .into_iter()
            .filter_map(|slot| {
                let minutes = 9 * 60 + u16::from(slot) * 30;
                let time = Time::from_hms((minutes / 60) as u8, (minutes % 60) as u8, 0).ok()?;
                let pet = if catalog.pets.is_empty() {
                    (*self.pick(&PET_NAMES)).to_owned()
                } else {
                    catalog.pets[self.int_n(catalog.pets.len())].name.clone()
                };
                Some(Appointment {
                    time,
                    kind: (*self.pick(&APPOINTMENT_KINDS)).to_owned(),
                    pet,
                })
            })
            .collect()
    }

    fn full_name(&mut self) -> String {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        format!("{first} {last}")
    }

    /// Peso price rounded to end in 990.
    fn price(&mut self, min: u32, max: u32) -> i64 {
        let raw = i64::from(self.int_range_u32(min, max));
        (raw / 1_000) * 1_000 + 990
    }

    fn int_range_u32(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as usize;
        min + self.int_n(span) as u32
    }

    fn pick<'a, T>(&mut self, values: &'a [T]) -> &'a T {
        &values[self.int_n(values.len())]
    }
}

/// Catalog used by `--demo` and the host tests.
pub fn demo_catalog() -> Catalog {
    ClinicFaker::new(DEMO_SEED).catalog()
}

/// Deterministic agenda for `date`: each day gets its own seed.
pub fn demo_appointments(catalog: &Catalog, date: Date) -> Vec<Appointment> {
    let seed = DEMO_SEED ^ u64::from(date.to_julian_day().unsigned_abs());
    ClinicFaker::new(seed).appointments(catalog)
}

pub fn fixture_date() -> Date {
    date!(2026 - 03 - 09)
}

pub fn temp_catalog_path(catalog: &Catalog) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("catalogo.json");
    let json = serde_json::to_string_pretty(catalog).context("encode catalog")?;
    std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}

fn ascii_fold(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        APPOINTMENT_KINDS, ClinicFaker, PET_NAMES, PROVIDERS, demo_appointments, demo_catalog,
        fixture_date, temp_catalog_path,
    };
    use std::collections::BTreeSet;
    use vetdesk_app::{Catalog, StockLevel};

    #[test]
    fn same_seed_same_catalog() {
        let left = ClinicFaker::new(42).catalog();
        let right = ClinicFaker::new(42).catalog();
        assert_eq!(left, right);
    }

    #[test]
    fn demo_catalog_covers_every_stock_level() {
        let catalog = demo_catalog();
        let levels: BTreeSet<&str> = catalog
            .products
            .iter()
            .map(|item| item.stock_level().as_str())
            .collect();
        for level in StockLevel::ALL {
            assert!(levels.contains(level.as_str()), "missing {level:?}");
        }
        assert!(catalog.providers().len() > 1);
        assert!(!catalog.appointment_kinds.is_empty());
    }

    #[test]
    fn picked_names_come_from_the_constant_tables() {
        let mut faker = ClinicFaker::new(11);
        let item = faker.product(1, "Pipeta antipulgas", vetdesk_app::Species::Dog);
        assert!(PROVIDERS.contains(&item.provider.as_str()));

        let appointments: Vec<_> = (0..20)
            .flat_map(|_| faker.appointments(&Catalog::default()))
            .collect();
        assert!(!appointments.is_empty());
        for appointment in &appointments {
            assert!(PET_NAMES.contains(&appointment.pet.as_str()));
            assert!(APPOINTMENT_KINDS.contains(&appointment.kind.as_str()));
        }
    }

    #[test]
    fn ids_are_unique() {
        let catalog = demo_catalog();
        let ids: BTreeSet<i64> = catalog.products.iter().map(|item| item.id.get()).collect();
        assert_eq!(ids.len(), catalog.products.len());
        let ids: BTreeSet<i64> = catalog.pets.iter().map(|pet| pet.id.get()).collect();
        assert_eq!(ids.len(), catalog.pets.len());
    }

    #[test]
    fn generated_clients_validate() {
        let mut faker = ClinicFaker::new(7);
        for _ in 0..50 {
            let client = faker.client();
            client.validate().expect("generated client is valid");
            assert!(client.email.is_ascii());
        }
    }

    #[test]
    fn appointments_sit_on_the_grid_without_duplicates() {
        let catalog = demo_catalog();
        let mut date = fixture_date();
        for _ in 0..30 {
            let appointments = demo_appointments(&catalog, date);
            let mut previous = None;
            for appointment in &appointments {
                assert!(appointment.time.minute() == 0 || appointment.time.minute() == 30);
                assert!((9..=18).contains(&appointment.time.hour()));
                assert!(previous < Some(appointment.time), "sorted and unique");
                previous = Some(appointment.time);
            }
            assert_eq!(appointments, demo_appointments(&catalog, date));
            date = date.next_day().expect("next day");
        }
    }

    #[test]
    fn catalog_file_round_trips() -> anyhow::Result<()> {
        let catalog = demo_catalog();
        let (_dir, path) = temp_catalog_path(&catalog)?;
        let loaded: Catalog = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        assert_eq!(loaded, catalog);
        Ok(())
    }
}
