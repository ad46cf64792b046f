//! Geofence predicates over an activity's lat/long stream.
//!
//! A [`Waypoint`] is "touched" when at least one stream sample lies within
//! `radius` metres of it, measured by the haversine great-circle distance.
//!
//! Two interchangeable engines implement [`GeoEngine`]:
//! - [`HaversineGeo`]: plain scan, the reference behaviour.
//! - [`IndexedGeo`]: bulk-loads the stream into an R-tree and only runs the
//!   haversine test on samples inside a bounding box around each waypoint.
//!   It agrees with the reference on every input.

use rstar::{RTree, RTreeObject, AABB};
use serde::Deserialize;

use crate::{GpsPoint, Waypoint};

/// Earth radius (km) used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Haversine distance between two points in metres.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlng = (p2.longitude - p1.longitude).to_radians();
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c * 1000.0
}

/// True if any sample of `stream` is within the waypoint's radius.
/// Samples with invalid coordinates never touch.
pub fn point_touched(waypoint: &Waypoint, stream: &[GpsPoint]) -> bool {
    let centre = waypoint.point();
    stream
        .iter()
        .filter(|p| p.is_valid())
        .any(|p| haversine_distance(&centre, p) <= waypoint.radius)
}

/// Geofence capability the matching code is written against.
///
/// Implementations hold no per-activity state and can be shared across threads.
pub trait GeoEngine: Send + Sync {
    /// True if at least one of `points` is touched by `stream`.
    fn any_touched(&self, points: &[Waypoint], stream: &[GpsPoint]) -> bool;

    /// True if every one of `points` is touched by `stream`.
    fn all_touched(&self, points: &[Waypoint], stream: &[GpsPoint]) -> bool;
}

/// Reference engine: haversine against every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineGeo;

impl GeoEngine for HaversineGeo {
    fn any_touched(&self, points: &[Waypoint], stream: &[GpsPoint]) -> bool {
        points.iter().any(|w| point_touched(w, stream))
    }

    fn all_touched(&self, points: &[Waypoint], stream: &[GpsPoint]) -> bool {
        points.iter().all(|w| point_touched(w, stream))
    }
}

/// Accelerated engine: R-tree candidate lookup, haversine confirmation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedGeo;

/// A stream sample stored in the R-tree as `[lat, lng]`.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

fn build_rtree(stream: &[GpsPoint]) -> RTree<IndexedPoint> {
    let indexed: Vec<IndexedPoint> = stream
        .iter()
        .filter(|p| p.is_valid())
        .map(|p| IndexedPoint {
            lat: p.latitude,
            lng: p.longitude,
        })
        .collect();
    RTree::bulk_load(indexed)
}

/// Relative slack added to the search box so rounding never drops a
/// sample the haversine test would accept.
const ENVELOPE_SLACK: f64 = 1e-6;

/// Lat/lng box containing every point within `radius` metres of `waypoint`.
///
/// Latitude: the central angle bounds the latitude difference. Longitude: the
/// spherical bounding-box formula `asin(sin(r) / cos(lat))`, widened to the full
/// range when the box reaches a pole or crosses the antimeridian.
fn search_envelope(waypoint: &Waypoint) -> AABB<[f64; 2]> {
    let angular = (waypoint.radius.max(0.0) / (EARTH_RADIUS_KM * 1000.0)) * (1.0 + ENVELOPE_SLACK)
        + ENVELOPE_SLACK.powi(2);
    let lat = waypoint.latitude.to_radians();
    let min_lat = lat - angular;
    let max_lat = lat + angular;

    let half_pi = std::f64::consts::FRAC_PI_2;
    let (min_lng, max_lng) = if angular >= half_pi || min_lat <= -half_pi || max_lat >= half_pi {
        (-180.0, 180.0)
    } else {
        let ratio = (angular.sin() / lat.cos()).min(1.0);
        let dlng = ratio.asin().to_degrees() * (1.0 + ENVELOPE_SLACK) + ENVELOPE_SLACK;
        let lo = waypoint.longitude - dlng;
        let hi = waypoint.longitude + dlng;
        if lo < -180.0 || hi > 180.0 {
            (-180.0, 180.0)
        } else {
            (lo, hi)
        }
    };

    AABB::from_corners(
        [min_lat.to_degrees() - ENVELOPE_SLACK, min_lng],
        [max_lat.to_degrees() + ENVELOPE_SLACK, max_lng],
    )
}

fn indexed_point_touched(tree: &RTree<IndexedPoint>, waypoint: &Waypoint) -> bool {
    let centre = waypoint.point();
    tree.locate_in_envelope(&search_envelope(waypoint))
        .any(|p| haversine_distance(&centre, &GpsPoint::new(p.lat, p.lng)) <= waypoint.radius)
}

impl GeoEngine for IndexedGeo {
    fn any_touched(&self, points: &[Waypoint], stream: &[GpsPoint]) -> bool {
        if points.is_empty() || stream.is_empty() {
            return false;
        }
        let tree = build_rtree(stream);
        points.iter().any(|w| indexed_point_touched(&tree, w))
    }

    fn all_touched(&self, points: &[Waypoint], stream: &[GpsPoint]) -> bool {
        if points.is_empty() {
            return true;
        }
        if stream.is_empty() {
            return false;
        }
        let tree = build_rtree(stream);
        points.iter().all(|w| indexed_point_touched(&tree, w))
    }
}

/// Startup selection of the geofence engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoBackend {
    #[default]
    Reference,
    Indexed,
}

static HAVERSINE_GEO: HaversineGeo = HaversineGeo;
static INDEXED_GEO: IndexedGeo = IndexedGeo;

impl GeoBackend {
    pub fn engine(&self) -> &'static dyn GeoEngine {
        match self {
            GeoBackend::Reference => &HAVERSINE_GEO,
            GeoBackend::Indexed => &INDEXED_GEO,
        }
    }
}
