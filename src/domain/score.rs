//! Pure scoring primitives shared by the detectors.
//!
//! Everything in this module is stateless arithmetic: great-circle distance
//! on a spherical earth, score clamping, and the two ways heuristic rules
//! combine into a running score (additive accumulation and floor overrides).

/// Mean Earth radius in kilometres, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two coordinate pairs.
///
/// Standard haversine formula on a spherical earth. Accurate to well under
/// a percent, which is far more precision than travel-speed classification
/// needs.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Clamp a raw rule total into the `[0, 100]` score range.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Apply a floor override to a running score.
///
/// Floor rules force the score *up* to at least `floor` without ever
/// lowering a higher additive total. This is the only way the two rule
/// families interact: overrides win over accumulation, never the reverse.
pub fn floor_override(current: i64, floor: i64) -> i64 {
    current.max(floor)
}
