//! Spherical geometry for tour location queries.

use serde_json::Value;
use std::str::FromStr;

use crate::error::AppError;

/// Earth radius used for sphere-radius conversions, in miles.
pub const EARTH_RADIUS_MI: f64 = 3963.2;
/// Earth radius used for sphere-radius conversions, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6378.1;
/// Earth radius used for `geo_near` distances, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    /// Converts a distance in this unit to radians on the sphere.
    pub fn to_radians(self, distance: f64) -> f64 {
        match self {
            DistanceUnit::Miles => distance / EARTH_RADIUS_MI,
            DistanceUnit::Kilometers => distance / EARTH_RADIUS_KM,
        }
    }

    /// Factor that converts metres into this unit.
    pub fn meters_multiplier(self) -> f64 {
        match self {
            DistanceUnit::Miles => 0.000621371192,
            DistanceUnit::Kilometers => 0.001,
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mi" => Ok(DistanceUnit::Miles),
            "km" => Ok(DistanceUnit::Kilometers),
            other => Err(AppError::bad_request(
                format!("Unknown distance unit '{other}'. Use 'mi' or 'km'"),
                Value::Null,
            )),
        }
    }
}

/// A point on the sphere in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Parses a `"lat,lng"` path segment.
    pub fn parse_lat_lng(raw: &str) -> Result<Self, AppError> {
        let invalid = || {
            AppError::bad_request(
                "Please provide latitude and longitude in the format lat,lng",
                Value::Null,
            )
        };

        let (lat, lng) = raw.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(invalid());
        }

        Ok(Self { lng, lat })
    }

    /// Reads a GeoJSON point (`{"coordinates": [lng, lat]}`).
    pub fn from_geojson(value: &Value) -> Option<Self> {
        let coordinates = value.get("coordinates")?.as_array()?;
        match coordinates.as_slice() {
            [lng, lat] => Some(Self {
                lng: lng.as_f64()?,
                lat: lat.as_f64()?,
            }),
            _ => None,
        }
    }

    /// Great-circle distance to `other` in radians (haversine).
    pub fn angular_distance(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * h.sqrt().min(1.0).asin()
    }

    /// Great-circle distance to `other` in metres.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        self.angular_distance(other) * EARTH_RADIUS_M
    }
}
