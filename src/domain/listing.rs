use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A bookable service offered by a provider. The three rate columns feed the
/// quote: `total = price_base + miles * price_per_mile + minutes * price_per_minute`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub service_type: ServiceType,
    pub price_base: f64,
    pub price_per_mile: f64,
    pub price_per_minute: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub provider_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub service_type: ServiceType,
    pub price_base: f64,
    pub price_per_mile: f64,
    pub price_per_minute: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    FoodDelivery,
    Courier,
    AerialImaging,
    SiteMapping,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::FoodDelivery => "food_delivery",
            ServiceType::Courier => "courier",
            ServiceType::AerialImaging => "aerial_imaging",
            ServiceType::SiteMapping => "site_mapping",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "food_delivery" => Some(ServiceType::FoodDelivery),
            "courier" => Some(ServiceType::Courier),
            "aerial_imaging" => Some(ServiceType::AerialImaging),
            "site_mapping" => Some(ServiceType::SiteMapping),
            _ => None,
        }
    }
}
