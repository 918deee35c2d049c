use serde::Serialize;
use utoipa::ToSchema;

use crate::model::office_location::OfficeLocation;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// GPS fixes looser than this are flagged rather than trusted.
const MAX_ACCURACY_M: f64 = 50.0;

/// Outcome of a location check. `valid` is always true: location never
/// blocks an action, it only flags the attendance row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GeofenceCheck {
    pub valid: bool,
    pub flagged: bool,
    pub reason: Option<String>,
}

impl GeofenceCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            flagged: false,
            reason: None,
        }
    }

    fn flagged(reason: &str) -> Self {
        Self {
            valid: true,
            flagged: true,
            reason: Some(reason.to_string()),
        }
    }
}

pub fn evaluate(
    lat: f64,
    lng: f64,
    accuracy_meters: Option<f64>,
    offices: &[OfficeLocation],
) -> GeofenceCheck {
    if offices.is_empty() {
        return GeofenceCheck::flagged("No office locations configured");
    }

    if let Some(accuracy) = accuracy_meters {
        if accuracy > MAX_ACCURACY_M {
            return GeofenceCheck::flagged("GPS accuracy too low");
        }
    }

    let inside_any = offices.iter().any(|office| {
        haversine_distance_m(lat, lng, office.latitude, office.longitude) <= office.radius_meters
    });

    if inside_any {
        GeofenceCheck::ok()
    } else {
        GeofenceCheck::flagged("Outside office premises")
    }
}

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office(lat: f64, lng: f64, radius: f64) -> OfficeLocation {
        OfficeLocation {
            id: 1,
            name: "HQ".into(),
            latitude: lat,
            longitude: lng,
            radius_meters: radius,
            is_active: true,
        }
    }

    #[test]
    fn no_offices_configured_flags_but_admits() {
        let check = evaluate(12.9716, 77.5946, None, &[]);
        assert!(check.valid);
        assert!(check.flagged);
        assert_eq!(check.reason.as_deref(), Some("No office locations configured"));
    }

    #[test]
    fn poor_accuracy_flags_before_distance_is_considered() {
        let offices = [office(12.9716, 77.5946, 100.0)];
        let check = evaluate(12.9716, 77.5946, Some(51.0), &offices);
        assert!(check.valid);
        assert!(check.flagged);
        assert_eq!(check.reason.as_deref(), Some("GPS accuracy too low"));
    }

    #[test]
    fn inside_radius_passes_clean() {
        let offices = [office(12.9716, 77.5946, 100.0)];
        let check = evaluate(12.97165, 77.59462, Some(10.0), &offices);
        assert!(check.valid);
        assert!(!check.flagged);
        assert!(check.reason.is_none());
    }

    #[test]
    fn outside_every_office_is_flagged() {
        let offices = [office(12.9716, 77.5946, 100.0)];
        // A couple of kilometers away.
        let check = evaluate(12.99, 77.62, Some(10.0), &offices);
        assert!(check.valid);
        assert!(check.flagged);
        assert_eq!(check.reason.as_deref(), Some("Outside office premises"));
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Bangalore city center to the airport is roughly 31.8 km.
        let d = haversine_distance_m(12.9716, 77.5946, 13.1986, 77.7066);
        assert!((d - 28_500.0).abs() < 3_000.0, "got {d}");
    }
}
