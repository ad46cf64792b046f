//! # Title Matcher
//!
//! Template matching and placeholder rendering for activity titles and descriptions.
//!
//! This library provides:
//! - Marker categories over distance, pace, times, start time, date, elevation and cadence
//! - Prioritized templates with restrictions and ordered fallbacks
//! - Route templates matched by geofenced waypoints (haversine or R-tree backed)
//! - Heart rate zone and weather text for the `{hr_zones}` / `{weather}` placeholders
//!
//! ## Features
//!
//! - **`parallel`** - Generate batches of activities in parallel with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use title_matcher::{generate_title_and_description, Activity, Config};
//!
//! let config = Config::from_json_str(r#"{
//!     "markers": {
//!         "distance": {"easy": [[0, 10, "Jog"], [10, null, "Long run"]]},
//!         "start_time": {"tod": [["0500", "1200", "Morning"], [null, null, "Day"]]}
//!     },
//!     "templates": [{"title": "{start_time.tod} {distance.easy}", "description": "", "priority": 1}]
//! }"#).unwrap();
//!
//! let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(7, 15, 0).unwrap();
//! let activity = Activity::new(1, 5.2, 1716, start);
//!
//! let text = generate_title_and_description(&activity, &config).unwrap();
//! assert_eq!(text.title, "Morning Jog");
//! assert_eq!(text.description, "");
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{ConfigError, GenerateError, ResolveError, Result};

// Typed configuration (markers, templates, route templates, HR zones)
pub mod config;
pub use config::{Config, Metric, RouteTemplate, Template};

// Geofencing: haversine reference and R-tree accelerated engines
pub mod geo;
pub use geo::{haversine_distance, GeoBackend, GeoEngine, HaversineGeo, IndexedGeo};

// Category intervals, clock windows and date specifiers
pub mod interval;

// Template and route template restrictions
pub mod restriction;

// Route template waypoint coverage
pub mod route;
pub use route::matching_route_template;

// Placeholder string lexing and rendering
pub mod placeholder;

// Placeholder token resolution
pub mod resolve;

// Heart rate zone distribution for {hr_zones}
pub mod zones;
pub use zones::{calculate_hr_zones, HRZoneDistribution};

// Weather text for {weather}
pub mod weather;
pub use weather::Weather;

// Top-level generation
pub mod generate;
#[cfg(feature = "parallel")]
pub use generate::generate_batch_parallel;
pub use generate::{generate_batch, generate_title_and_description, generate_with, GeneratedText};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use title_matcher::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A geofence: a point and a radius in metres.
///
/// Written as `[lat, long, radius]` in the config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, f64)", into = "(f64, f64, f64)")]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64, radius: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius,
        }
    }

    /// Centre of the geofence.
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

impl From<(f64, f64, f64)> for Waypoint {
    fn from((latitude, longitude, radius): (f64, f64, f64)) -> Self {
        Self::new(latitude, longitude, radius)
    }
}

impl From<Waypoint> for (f64, f64, f64) {
    fn from(waypoint: Waypoint) -> Self {
        (waypoint.latitude, waypoint.longitude, waypoint.radius)
    }
}

/// One heart rate reading, `time` in seconds from the activity start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub time: u32,
    pub bpm: u16,
}

impl HeartRateSample {
    pub fn new(time: u32, bpm: u16) -> Self {
        Self { time, bpm }
    }
}

/// Length of `YYYY-MM-DDTHH:MM:SS`, the local start time without its zone suffix.
const LOCAL_DATE_TIME_LENGTH: usize = 19;

/// The activity a title and description are generated for.
///
/// Read-only input to generation; nothing here is modified by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    /// km
    pub distance: f64,
    /// s/km, absent for a zero-distance activity
    pub pace: Option<f64>,
    /// s
    pub moving_time: u32,
    /// s
    pub elapsed_time: u32,
    /// Local wall-clock start, no time zone
    pub start_date_time: NaiveDateTime,
    /// Total elevation gain in m
    #[serde(default)]
    pub elevation: Option<f64>,
    /// m/km
    #[serde(default)]
    pub elevation_per_km: Option<f64>,
    /// Steps per minute, both feet
    #[serde(default)]
    pub cadence: Option<f64>,
    #[serde(default)]
    pub lat_long_stream: Option<Vec<GpsPoint>>,
    #[serde(default)]
    pub heart_rate_stream: Option<Vec<HeartRateSample>>,
    #[serde(default)]
    pub weather: Option<Weather>,
}

impl Activity {
    /// Minimal activity: distance in km and moving time in seconds.
    /// Elapsed time equals moving time.
    pub fn new(id: u64, distance: f64, moving_time: u32, start_date_time: NaiveDateTime) -> Self {
        Self {
            id,
            distance,
            pace: per_km(f64::from(moving_time), distance),
            moving_time,
            elapsed_time: moving_time,
            start_date_time,
            elevation: None,
            elevation_per_km: None,
            cadence: None,
            lat_long_stream: None,
            heart_rate_stream: None,
            weather: None,
        }
    }

    /// Build from an activity summary as the fitness platform reports it:
    /// distance in metres, total elevation gain in metres and single-foot cadence.
    pub fn from_summary(
        id: u64,
        distance_m: f64,
        moving_time: u32,
        elapsed_time: u32,
        start_date_time: NaiveDateTime,
        total_elevation_gain: Option<f64>,
        average_cadence: Option<f64>,
    ) -> Self {
        let distance = distance_m / 1000.0;
        Self {
            elapsed_time,
            elevation: total_elevation_gain,
            elevation_per_km: total_elevation_gain.and_then(|gain| per_km(gain, distance)),
            cadence: average_cadence.map(|steps| steps * 2.0),
            ..Self::new(id, distance, moving_time, start_date_time)
        }
    }

    pub fn with_lat_long_stream(mut self, stream: Vec<GpsPoint>) -> Self {
        self.lat_long_stream = Some(stream);
        self
    }

    pub fn with_heart_rate_stream(mut self, stream: Vec<HeartRateSample>) -> Self {
        self.heart_rate_stream = Some(stream);
        self
    }

    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = Some(weather);
        self
    }
}

fn per_km(value: f64, distance: f64) -> Option<f64> {
    (distance > 0.0).then(|| value / distance)
}

/// Parse a local start time such as `2024-06-01T07:15:00Z`, ignoring any zone suffix.
pub fn parse_local_start(text: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    let local = text.get(..LOCAL_DATE_TIME_LENGTH).unwrap_or(text);
    NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S")
}
