//! Marketplace types: GeoPoint, Producer, NewOffer, SellerOffer, RankedOffer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NpkVector;

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A registered waste producer (seller).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Producer {
    pub producer_id: String,
    pub name: String,
    #[serde(default)]
    pub contact: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Producer {
    pub const fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// An offer as submitted to the ledger, before it is assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub producer_id: String,
    pub waste_type: String,
    pub quantity_kg: f64,
    pub cost_per_kg: f64,
    pub npk_score: NpkVector,
    pub producer_location: GeoPoint,
}

impl NewOffer {
    /// Every numeric field is finite. JSON cannot represent the others.
    pub fn is_finite(&self) -> bool {
        self.quantity_kg.is_finite()
            && self.cost_per_kg.is_finite()
            && self.npk_score.is_finite()
            && self.producer_location.latitude.is_finite()
            && self.producer_location.longitude.is_finite()
    }
}

/// A listed sell offer.
///
/// Offers are immutable once listed apart from `is_available`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SellerOffer {
    pub offer_id: String,
    /// Creation-order sequence number, also embedded in `offer_id`
    pub sequence: u64,
    pub producer_id: String,
    pub waste_type: String,
    pub quantity_kg: f64,
    pub cost_per_kg: f64,
    pub is_available: bool,
    pub listed_at: DateTime<Utc>,
    #[serde(rename = "N_score")]
    pub n_score: f64,
    #[serde(rename = "P_score")]
    pub p_score: f64,
    #[serde(rename = "K_score")]
    pub k_score: f64,
    pub producer_latitude: f64,
    pub producer_longitude: f64,
}

impl SellerOffer {
    pub const fn producer_location(&self) -> GeoPoint {
        GeoPoint::new(self.producer_latitude, self.producer_longitude)
    }

    pub const fn npk_score(&self) -> NpkVector {
        NpkVector::new(self.n_score, self.p_score, self.k_score)
    }
}

/// An offer ranked for one recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedOffer {
    #[serde(flatten)]
    pub offer: SellerOffer,
    /// Great-circle distance from the requesting farmer (km)
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}
