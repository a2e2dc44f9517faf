// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, Time};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    #[serde(rename = "perro")]
    Dog,
    #[serde(rename = "gato")]
    Cat,
    #[serde(rename = "exotico")]
    Exotic,
}

impl Species {
    pub const ALL: [Self; 3] = [Self::Dog, Self::Cat, Self::Exotic];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dog => "perro",
            Self::Cat => "gato",
            Self::Exotic => "exotico",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dog => "Perro",
            Self::Cat => "Gato",
            Self::Exotic => "Exótico",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "perro" => Some(Self::Dog),
            "gato" => Some(Self::Cat),
            "exotico" => Some(Self::Exotic),
            _ => None,
        }
    }
}

/// Stock bucket rendered into `data-stock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockLevel {
    #[serde(rename = "out")]
    Out,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "high")]
    High,
}

impl StockLevel {
    pub const ALL: [Self; 3] = [Self::Out, Self::Low, Self::High];

    pub const fn classify(stock: u32, min_stock: u32) -> Self {
        if stock == 0 {
            Self::Out
        } else if stock <= min_stock {
            Self::Low
        } else {
            Self::High
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::Low => "low",
            Self::High => "high",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Out => "Agotado",
            Self::Low => "Stock bajo",
            Self::High => "Disponible",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "out" => Some(Self::Out),
            "low" => Some(Self::Low),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceCategory {
    #[serde(rename = "consulta")]
    Consultation,
    #[serde(rename = "vacunacion")]
    Vaccination,
    #[serde(rename = "cirugia")]
    Surgery,
    #[serde(rename = "peluqueria")]
    Grooming,
}

impl ServiceCategory {
    pub const ALL: [Self; 4] = [
        Self::Consultation,
        Self::Vaccination,
        Self::Surgery,
        Self::Grooming,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Consultation => "consulta",
            Self::Vaccination => "vacunacion",
            Self::Surgery => "cirugia",
            Self::Grooming => "peluqueria",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Consultation => "Consulta",
            Self::Vaccination => "Vacunación",
            Self::Surgery => "Cirugía",
            Self::Grooming => "Peluquería",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "consulta" => Some(Self::Consultation),
            "vacunacion" => Some(Self::Vaccination),
            "cirugia" => Some(Self::Surgery),
            "peluqueria" => Some(Self::Grooming),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Inventory,
    Agenda,
    Services,
}

impl PageKind {
    pub const ALL: [Self; 3] = [Self::Inventory, Self::Agenda, Self::Services];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Inventory => "inventario",
            Self::Agenda => "agenda",
            Self::Services => "servicios",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inventario" | "inventory" => Some(Self::Inventory),
            "agenda" => Some(Self::Agenda),
            "servicios" | "services" => Some(Self::Services),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ProductId,
    pub name: String,
    pub species: Species,
    pub stock: u32,
    pub min_stock: u32,
    pub provider: String,
    pub price_clp: i64,
}

impl InventoryItem {
    pub const fn stock_level(&self) -> StockLevel {
        StockLevel::classify(self.stock, self.min_stock)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicService {
    pub id: ServiceId,
    pub name: String,
    pub category: ServiceCategory,
    pub price_clp: i64,
    pub duration_minutes: u32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub species: Species,
    pub owner: String,
}

/// Everything the server-rendered templates would have embedded in the pages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<InventoryItem>,
    #[serde(default)]
    pub services: Vec<ClinicService>,
    #[serde(default)]
    pub pets: Vec<Pet>,
    #[serde(default)]
    pub appointment_kinds: Vec<String>,
}

impl Catalog {
    /// Distinct providers in first-seen order.
    pub fn providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = Vec::new();
        for product in &self.products {
            if !providers.iter().any(|known| known == &product.provider) {
                providers.push(product.provider.clone());
            }
        }
        providers
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub time: Time,
    pub kind: String,
    pub pet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub pet_id: PetId,
    pub kind: String,
    pub duration_minutes: u32,
    pub notes: String,
    pub date: Date,
    pub time: Time,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub rut: String,
    pub email: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::{Catalog, InventoryItem, PageKind, Species, StockLevel};
    use crate::ProductId;

    #[test]
    fn stock_level_buckets_by_minimum() {
        assert_eq!(StockLevel::classify(0, 5), StockLevel::Out);
        assert_eq!(StockLevel::classify(5, 5), StockLevel::Low);
        assert_eq!(StockLevel::classify(6, 5), StockLevel::High);
    }

    #[test]
    fn markup_values_round_trip_through_parse() {
        for species in Species::ALL {
            assert_eq!(Species::parse(species.as_str()), Some(species));
        }
        for level in StockLevel::ALL {
            assert_eq!(StockLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(PageKind::parse("Servicios"), Some(PageKind::Services));
        assert_eq!(PageKind::parse("caja"), None);
    }

    #[test]
    fn providers_are_distinct_in_first_seen_order() {
        let product = |id: i64, provider: &str| InventoryItem {
            id: ProductId::new(id),
            name: format!("item {id}"),
            species: Species::Dog,
            stock: 1,
            min_stock: 1,
            provider: provider.to_owned(),
            price_clp: 1000,
        };
        let catalog = Catalog {
            products: vec![
                product(1, "Vetpharma"),
                product(2, "Drag Pharma"),
                product(3, "Vetpharma"),
            ],
            ..Catalog::default()
        };
        assert_eq!(catalog.providers(), vec!["Vetpharma", "Drag Pharma"]);
    }

    #[test]
    fn catalog_decodes_markup_spellings() -> anyhow::Result<()> {
        let json = r#"{
            "products": [{"id": 3, "name": "Collar", "species": "gato", "stock": 0,
                          "min_stock": 2, "provider": "Petco", "price_clp": 4990}]
        }"#;
        let catalog: Catalog = serde_json::from_str(json)?;
        assert_eq!(catalog.products[0].id, ProductId::new(3));
        assert_eq!(catalog.products[0].species, Species::Cat);
        assert_eq!(catalog.products[0].stock_level(), StockLevel::Out);
        assert!(catalog.services.is_empty());
        Ok(())
    }
}
