//! Deterministic quote computation for booking intake.
//!
//! The quote must be exactly reproducible from its inputs: the webhook
//! reconciler and the receipt path both assume the persisted total is the
//! amount that was authorized.

use crate::domain::Listing;

/// Earth radius in miles, matching the rest of the distance handling.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Distance/duration inputs as resolved from a booking request. Either side
/// may be absent; missing terms contribute zero to the quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripInputs {
    pub distance_miles: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub pickup: Option<(f64, f64)>,
    pub dropoff: Option<(f64, f64)>,
}

impl TripInputs {
    /// Explicit distance wins; otherwise fall back to the great-circle
    /// distance when both coordinate pairs are present. No coordinates, no
    /// distance term.
    pub fn resolve_distance_miles(&self) -> f64 {
        if let Some(miles) = self.distance_miles {
            return miles;
        }
        match (self.pickup, self.dropoff) {
            (Some((plat, plng)), Some((dlat, dlng))) => haversine_miles(plat, plng, dlat, dlng),
            _ => 0.0,
        }
    }
}

/// Great-circle distance between two WGS84 points, in miles.
pub fn haversine_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Total in dollars: `max(0, round((base + miles*per_mile + minutes*per_minute) * 100) / 100)`.
pub fn compute_total(listing: &Listing, trip: &TripInputs) -> f64 {
    let distance_miles = trip.resolve_distance_miles();
    let duration_minutes = trip.duration_minutes.unwrap_or(0.0);
    let variable = distance_miles * listing.price_per_mile + duration_minutes * listing.price_per_minute;
    round_cents(listing.price_base + variable).max(0.0)
}

/// Round a dollar amount to cent precision.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Dollar total to smallest-currency-unit integer for the processor.
pub fn total_cents(total: f64) -> i64 {
    (total * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::ServiceType;

    fn listing(base: f64, per_mile: f64, per_minute: f64) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            title: "Courier run".to_string(),
            description: None,
            service_type: ServiceType::Courier,
            price_base: base,
            price_per_mile: per_mile,
            price_per_minute: per_minute,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn quote_is_deterministic() {
        let listing = listing(10.0, 2.0, 0.5);
        let trip = TripInputs {
            distance_miles: Some(3.0),
            duration_minutes: Some(10.0),
            ..Default::default()
        };
        assert_eq!(compute_total(&listing, &trip), 21.00);
        assert_eq!(total_cents(compute_total(&listing, &trip)), 2100);
    }

    #[test]
    fn haversine_fallback_for_detroit_points() {
        let trip = TripInputs {
            pickup: Some((42.3314, -83.0458)),
            dropoff: Some((42.3600, -83.0700)),
            ..Default::default()
        };
        let miles = trip.resolve_distance_miles();
        assert!(miles > 0.0, "distance must be positive, got {miles}");
        assert!((2.0..3.5).contains(&miles), "expected ~2.5-3 miles, got {miles}");
    }

    #[test]
    fn explicit_distance_beats_coordinates() {
        let trip = TripInputs {
            distance_miles: Some(12.0),
            pickup: Some((42.3314, -83.0458)),
            dropoff: Some((42.3600, -83.0700)),
            ..Default::default()
        };
        assert_eq!(trip.resolve_distance_miles(), 12.0);
    }

    #[test]
    fn missing_everything_quotes_base_only() {
        let listing = listing(25.0, 3.0, 1.0);
        let total = compute_total(&listing, &TripInputs::default());
        assert_eq!(total, 25.00);
    }

    #[test]
    fn total_is_floored_at_zero() {
        let listing = listing(-5.0, 0.0, 0.0);
        assert_eq!(compute_total(&listing, &TripInputs::default()), 0.0);
    }

    #[test]
    fn totals_are_rounded_to_cents() {
        let listing = listing(0.0, 0.0, 0.333);
        let trip = TripInputs { duration_minutes: Some(10.0), ..Default::default() };
        // 3.33 exactly, not 3.3299999...
        assert_eq!(compute_total(&listing, &trip), 3.33);
        assert_eq!(total_cents(3.33), 333);
    }
}
