use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const EARTH_RADIUS_KM: f64 = 6371.0088;
/// Below this planar distance the equirectangular approximation is returned as-is.
const PLANAR_THRESHOLD_KM: f64 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Distance in kilometres between two points given in degrees.
pub fn distance(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lon1 = a.lon.to_radians();
    let lat2 = b.lat.to_radians();
    let lon2 = b.lon.to_radians();

    let x = (lon2 - lon1) * ((lat1 + lat2) / 2.0).cos();
    let y = lat2 - lat1;
    let planar = (x * x + y * y).sqrt() * EARTH_RADIUS_KM;
    if planar < PLANAR_THRESHOLD_KM {
        return planar;
    }

    haversine(lat1, lon1, lat2, lon2)
}

fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TechProfile {
    pub radius_km: f64,
    pub data_rate_mbps: f64,
}

/// Coverage radius and device data rate per mobile network generation.
pub fn technology_params(tech: u8) -> Result<TechProfile> {
    let (radius_km, data_rate_mbps) = match tech {
        1 => (20.0, 0.0024),
        2 => (10.0, 0.064),
        3 => (5.0, 2.0),
        4 => (3.0, 100.0),
        5 => (0.6, 1000.0),
        6 => (0.32, 10000.0),
        _ => return Err(Error::UnknownTechnology(tech)),
    };
    Ok(TechProfile {
        radius_km,
        data_rate_mbps,
    })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Ascending,
    Descending,
}

/// Orders `indices` by `key` in `direction`. Equal keys keep ascending index
/// order regardless of direction, so runs over equal-cost entities are reproducible.
pub fn sort_indices<F>(indices: &mut [usize], direction: Direction, key: F)
where
    F: Fn(usize) -> f64,
{
    indices.sort_by(|&a, &b| {
        let ka = key(a);
        let kb = key(b);
        let by_key = match direction {
            Direction::Ascending => ka.partial_cmp(&kb),
            Direction::Descending => kb.partial_cmp(&ka),
        }
        .unwrap_or(Ordering::Equal);
        by_key.then_with(|| a.cmp(&b))
    });
}
