//! Geographic primitives: points, great-circle distance and polyline encoding.
//!
//! Implements Google Polyline encoding for compact route transmission.
//! See: <https://developers.google.com/maps/documentation/utilities/polylinealgorithm>

use serde::{Deserialize, Serialize};

/// Earth radius in kilometers for haversine calculation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Serializes as a two-element `[latitude, longitude]` array, which is also
/// the on-disk format of the route cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(p: GeoPoint) -> Self {
        [p.lat, p.lng]
    }
}

/// Great-circle distance in kilometers using the haversine formula.
///
/// # Examples
///
/// ```
/// use city_graph::geometry::{haversine_km, GeoPoint};
///
/// let a = GeoPoint::new(0.0, 0.0);
/// let b = GeoPoint::new(0.0, 1.0);
///
/// // 1 degree of longitude at the equator is about 111 km
/// let dist = haversine_km(a, b);
/// assert!((dist - 111.19).abs() < 0.01);
/// assert_eq!(haversine_km(a, a), 0.0);
/// ```
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    if a.lat == b.lat && a.lng == b.lng {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Sum of haversine distances along a polyline, in kilometers.
///
/// This is the length of the fetched geometry, as opposed to the straight
/// line between its endpoints.
pub fn polyline_length_km(points: &[GeoPoint]) -> f64 {
    points.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

/// Encodes a sequence of points using the Google Polyline Algorithm.
///
/// Each coordinate is encoded as the difference from the previous point,
/// with 5 decimal places of precision.
///
/// # Examples
///
/// ```
/// use city_graph::geometry::{encode_polyline, GeoPoint};
///
/// let line = encode_polyline(&[GeoPoint::new(38.5, -120.2), GeoPoint::new(40.7, -120.95)]);
/// assert_eq!(line, "_p~iF~ps|U_ulLnnqC");
///
/// assert!(encode_polyline(&[]).is_empty());
/// ```
pub fn encode_polyline(points: &[GeoPoint]) -> String {
    let mut result = String::new();
    let mut prev_lat = 0i64;
    let mut prev_lng = 0i64;

    for p in points {
        let lat_e5 = (p.lat * 1e5).round() as i64;
        let lng_e5 = (p.lng * 1e5).round() as i64;

        encode_value(lat_e5 - prev_lat, &mut result);
        encode_value(lng_e5 - prev_lng, &mut result);

        prev_lat = lat_e5;
        prev_lng = lng_e5;
    }

    result
}

/// Encodes a single signed value using the polyline algorithm.
fn encode_value(value: i64, output: &mut String) {
    let mut encoded = if value < 0 { !(value << 1) } else { value << 1 };

    // 5-bit chunks, OR 0x20 while more chunks follow
    while encoded >= 0x20 {
        output.push((((encoded & 0x1f) | 0x20) as u8 + 63) as char);
        encoded >>= 5;
    }
    output.push((encoded as u8 + 63) as char);
}
