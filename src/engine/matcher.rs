//! Offer matching: filter listed offers for one farmer and rank the bargains.

use std::cmp::Ordering;

use crate::config::defaults::{MAX_RANKED_OFFERS, MAX_SEARCH_RADIUS_KM};
use crate::config::MatchingConfig;
use crate::types::{GeoPoint, RankedOffer, SellerOffer};

use super::geo::haversine_km;

/// Ranks available offers of one waste type near a farmer.
///
/// Ordering is cost per kg, then distance, then listing order. Offers beyond
/// `max_radius_km` or marked unavailable are never returned.
#[derive(Debug, Clone, Copy)]
pub struct OfferMatcher {
    max_radius_km: f64,
    max_results: usize,
}

impl OfferMatcher {
    pub const fn new(max_radius_km: f64, max_results: usize) -> Self {
        Self {
            max_radius_km,
            max_results,
        }
    }

    pub const fn from_config(config: &MatchingConfig) -> Self {
        Self::new(config.max_search_radius_km, config.max_results)
    }

    pub fn rank(
        &self,
        offers: &[SellerOffer],
        farmer: GeoPoint,
        required_waste_type: &str,
    ) -> Vec<RankedOffer> {
        let mut ranked: Vec<RankedOffer> = offers
            .iter()
            .filter(|o| o.is_available && o.waste_type == required_waste_type)
            .filter_map(|o| {
                let distance_km = haversine_km(farmer, o.producer_location());
                (distance_km <= self.max_radius_km).then(|| RankedOffer {
                    offer: o.clone(),
                    distance_km,
                    producer_name: None,
                    contact: None,
                })
            })
            .collect();

        ranked.sort_by(compare_ranked);
        ranked.truncate(self.max_results);
        ranked
    }
}

impl Default for OfferMatcher {
    fn default() -> Self {
        Self::new(MAX_SEARCH_RADIUS_KM, MAX_RANKED_OFFERS)
    }
}

fn compare_ranked(a: &RankedOffer, b: &RankedOffer) -> Ordering {
    a.offer
        .cost_per_kg
        .total_cmp(&b.offer.cost_per_kg)
        .then_with(|| a.distance_km.total_cmp(&b.distance_km))
        .then_with(|| a.offer.sequence.cmp(&b.offer.sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const FARMER: GeoPoint = GeoPoint::new(28.6, 77.2);

    fn offer(seq: u64, waste: &str, cost: f64, lat: f64, lon: f64) -> SellerOffer {
        SellerOffer {
            offer_id: format!("O-{seq:06}-TEST"),
            sequence: seq,
            producer_id: "P-001".to_string(),
            waste_type: waste.to_string(),
            quantity_kg: 10.0,
            cost_per_kg: cost,
            is_available: true,
            listed_at: Utc::now(),
            n_score: 1.0,
            p_score: 1.0,
            k_score: 1.0,
            producer_latitude: lat,
            producer_longitude: lon,
        }
    }

    fn ids(ranked: &[RankedOffer]) -> Vec<u64> {
        ranked.iter().map(|r| r.offer.sequence).collect()
    }

    #[test]
    fn test_filters_type_availability_and_radius() {
        let mut unavailable = offer(3, "Banana", 0.5, 28.6, 77.2);
        unavailable.is_available = false;
        let offers = vec![
            offer(1, "Banana", 2.0, 28.61, 77.21),
            offer(2, "Bone", 1.0, 28.61, 77.21),
            unavailable,
            offer(4, "Banana", 0.1, 28.9845, 77.7064),
        ];

        let ranked = OfferMatcher::default().rank(&offers, FARMER, "Banana");
        assert_eq!(ids(&ranked), vec![1]);
        assert!(ranked[0].distance_km < 2.0);
    }

    #[test]
    fn test_sorted_by_cost_then_distance() {
        let offers = vec![
            offer(1, "Banana", 3.0, 28.60, 77.20),
            offer(2, "Banana", 1.0, 28.80, 77.20),
            offer(3, "Banana", 1.0, 28.65, 77.20),
            offer(4, "Banana", 2.0, 28.60, 77.21),
        ];
        let ranked = OfferMatcher::default().rank(&offers, FARMER, "Banana");
        assert_eq!(ids(&ranked), vec![3, 2, 4, 1]);
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.offer.cost_per_kg < b.offer.cost_per_kg
                    || (a.offer.cost_per_kg == b.offer.cost_per_kg && a.distance_km <= b.distance_km)
            );
        }
    }

    #[test]
    fn test_full_ties_keep_listing_order() {
        let offers = vec![
            offer(7, "Banana", 1.0, 28.7, 77.2),
            offer(5, "Banana", 1.0, 28.7, 77.2),
        ];
        let ranked = OfferMatcher::default().rank(&offers, FARMER, "Banana");
        assert_eq!(ids(&ranked), vec![5, 7]);
    }

    #[test]
    fn test_at_most_five_results() {
        let offers: Vec<_> = (0..9)
            .map(|i| offer(i, "Banana", 10.0 - i as f64, 28.6, 77.2))
            .collect();
        let ranked = OfferMatcher::default().rank(&offers, FARMER, "Banana");
        assert_eq!(ranked.len(), 5);
        assert_eq!(ids(&ranked), vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let offers = vec![offer(1, "Bone", 1.0, 28.6, 77.2)];
        assert!(OfferMatcher::default().rank(&offers, FARMER, "Banana").is_empty());
        assert!(OfferMatcher::default().rank(&[], FARMER, "Banana").is_empty());
    }

    #[test]
    fn test_custom_radius() {
        let offers = vec![offer(1, "Banana", 1.0, 28.9845, 77.7064)];
        assert!(OfferMatcher::new(100.0, 5).rank(&offers, FARMER, "Banana").len() == 1);
    }
}
