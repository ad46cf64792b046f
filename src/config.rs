//! Typed configuration: markers, templates and route templates.
//!
//! The JSON layout follows the config file the poller reads:
//!
//! ```json
//! {
//!   "markers": {
//!     "distance": { "easy": [[0, 10, "Jog"], [10, null, ["Long run", "Big one"]]] },
//!     "start_time": { "tod": [["0500", "1200", "Morning"], [null, null, "Day"]] },
//!     "date": { "xmas": [["*-12-25", "Christmas"]] }
//!   },
//!   "templates": [{ "title": "{start_time.tod} {distance.easy}", "description": "", "priority": 1 }],
//!   "route_templates": [],
//!   "hr_zones": { "1": 110, "2": 130, "3": 150, "4": 165, "5": 180 }
//! }
//! ```
//!
//! Shapes are normalized while deserializing (a title may be a string or a list,
//! a restriction range may be one pair or a list of pairs). Semantic validation
//! of bounds is the responsibility of whoever writes the file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::geo::GeoBackend;
use crate::{Activity, Waypoint};

// ============================================================================
// Metrics
// ============================================================================

/// Every metric a marker (and therefore a placeholder) can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Distance,
    MovingTime,
    ElapsedTime,
    Pace,
    StartTime,
    Date,
    Elevation,
    ElevationPerKm,
    Cadence,
}

/// How a metric's categories are matched.
#[derive(Debug, Clone, Copy)]
pub enum MetricKind {
    /// Half-open numeric interval over a scalar read from the activity.
    Numeric(fn(&Activity) -> Option<f64>),
    /// HHMM window over the local start time, may wrap past midnight.
    ClockTime,
    /// YYYY-MM-DD specifier with wildcards over the local start date.
    Date,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Distance,
        Metric::MovingTime,
        Metric::ElapsedTime,
        Metric::Pace,
        Metric::StartTime,
        Metric::Date,
        Metric::Elevation,
        Metric::ElevationPerKm,
        Metric::Cadence,
    ];

    /// Look up a metric by its placeholder/config name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|metric| metric.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Distance => "distance",
            Metric::MovingTime => "moving_time",
            Metric::ElapsedTime => "elapsed_time",
            Metric::Pace => "pace",
            Metric::StartTime => "start_time",
            Metric::Date => "date",
            Metric::Elevation => "elevation",
            Metric::ElevationPerKm => "elevation_per_km",
            Metric::Cadence => "cadence",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Distance => MetricKind::Numeric(|a| Some(a.distance)),
            Metric::MovingTime => MetricKind::Numeric(|a| Some(f64::from(a.moving_time))),
            Metric::ElapsedTime => MetricKind::Numeric(|a| Some(f64::from(a.elapsed_time))),
            Metric::Pace => MetricKind::Numeric(|a| a.pace),
            Metric::Elevation => MetricKind::Numeric(|a| a.elevation),
            Metric::ElevationPerKm => MetricKind::Numeric(|a| a.elevation_per_km),
            Metric::Cadence => MetricKind::Numeric(|a| a.cadence),
            Metric::StartTime => MetricKind::ClockTime,
            Metric::Date => MetricKind::Date,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Text options
// ============================================================================

/// A title or description as written in the config: one string or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextChoice {
    Single(String),
    Fallback(Vec<String>),
}

/// Ordered text candidates, normalized from an optional [`TextChoice`].
///
/// For categories the engine picks one at random; for templates the
/// candidates are tried in order until one renders.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Option<TextChoice>")]
pub struct TextOptions(Vec<String>);

impl TextOptions {
    pub fn new(options: Vec<String>) -> Self {
        Self(options)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Option<TextChoice>> for TextOptions {
    fn from(choice: Option<TextChoice>) -> Self {
        match choice {
            None => Self(Vec::new()),
            Some(TextChoice::Single(text)) => Self(vec![text]),
            Some(TextChoice::Fallback(options)) => Self(options),
        }
    }
}

impl From<&str> for TextOptions {
    fn from(text: &str) -> Self {
        Self(vec![text.to_string()])
    }
}

impl From<Vec<&str>> for TextOptions {
    fn from(options: Vec<&str>) -> Self {
        Self(options.into_iter().map(String::from).collect())
    }
}

// ============================================================================
// Categories
// ============================================================================

/// `[lower, upper, title, (description)]` over a numeric metric.
/// Both bounds `null` marks the else-category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawNumericCategory")]
pub struct NumericCategory {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub titles: TextOptions,
    pub descriptions: TextOptions,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumericCategory {
    WithDescription(Option<f64>, Option<f64>, TextOptions, TextOptions),
    TitleOnly(Option<f64>, Option<f64>, TextOptions),
}

impl From<RawNumericCategory> for NumericCategory {
    fn from(raw: RawNumericCategory) -> Self {
        let (lower, upper, titles, descriptions) = match raw {
            RawNumericCategory::WithDescription(l, u, t, d) => (l, u, t, d),
            RawNumericCategory::TitleOnly(l, u, t) => (l, u, t, TextOptions::default()),
        };
        Self {
            lower,
            upper,
            titles,
            descriptions,
        }
    }
}

/// `[lower, upper, title, (description)]` with HHMM string bounds.
/// `upper < lower` denotes a window spanning midnight.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawTimeCategory")]
pub struct TimeCategory {
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub titles: TextOptions,
    pub descriptions: TextOptions,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeCategory {
    WithDescription(Option<String>, Option<String>, TextOptions, TextOptions),
    TitleOnly(Option<String>, Option<String>, TextOptions),
}

impl From<RawTimeCategory> for TimeCategory {
    fn from(raw: RawTimeCategory) -> Self {
        let (lower, upper, titles, descriptions) = match raw {
            RawTimeCategory::WithDescription(l, u, t, d) => (l, u, t, d),
            RawTimeCategory::TitleOnly(l, u, t) => (l, u, t, TextOptions::default()),
        };
        Self {
            lower,
            upper,
            titles,
            descriptions,
        }
    }
}

/// `[date, title, (description)]` where date is `YYYY-MM-DD` and any
/// component may be `*`. A `null` date marks the else-category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawDateCategory")]
pub struct DateCategory {
    pub date: Option<String>,
    pub titles: TextOptions,
    pub descriptions: TextOptions,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDateCategory {
    WithDescription(Option<String>, TextOptions, TextOptions),
    TitleOnly(Option<String>, TextOptions),
}

impl From<RawDateCategory> for DateCategory {
    fn from(raw: RawDateCategory) -> Self {
        let (date, titles, descriptions) = match raw {
            RawDateCategory::WithDescription(d, t, desc) => (d, t, desc),
            RawDateCategory::TitleOnly(d, t) => (d, t, TextOptions::default()),
        };
        Self {
            date,
            titles,
            descriptions,
        }
    }
}

/// User-chosen key -> ordered category list.
pub type MarkerSet<C> = BTreeMap<String, Vec<C>>;

/// All markers, one set per metric.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub distance: MarkerSet<NumericCategory>,
    pub moving_time: MarkerSet<NumericCategory>,
    pub elapsed_time: MarkerSet<NumericCategory>,
    pub pace: MarkerSet<NumericCategory>,
    pub start_time: MarkerSet<TimeCategory>,
    pub date: MarkerSet<DateCategory>,
    pub elevation: MarkerSet<NumericCategory>,
    pub elevation_per_km: MarkerSet<NumericCategory>,
    pub cadence: MarkerSet<NumericCategory>,
}

impl Markers {
    /// Marker set of a numeric metric, `None` for start time and date.
    pub fn numeric(&self, metric: Metric) -> Option<&MarkerSet<NumericCategory>> {
        match metric {
            Metric::Distance => Some(&self.distance),
            Metric::MovingTime => Some(&self.moving_time),
            Metric::ElapsedTime => Some(&self.elapsed_time),
            Metric::Pace => Some(&self.pace),
            Metric::Elevation => Some(&self.elevation),
            Metric::ElevationPerKm => Some(&self.elevation_per_km),
            Metric::Cadence => Some(&self.cadence),
            Metric::StartTime | Metric::Date => None,
        }
    }
}

// ============================================================================
// Restrictions
// ============================================================================

/// One `[lower, upper]` pair or a list of them, matched with any-semantics.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawRanges<T>")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Ranges<T>(Vec<(T, T)>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRanges<T> {
    One((T, T)),
    Many(Vec<(T, T)>),
}

impl<T> From<RawRanges<T>> for Ranges<T> {
    fn from(raw: RawRanges<T>) -> Self {
        match raw {
            RawRanges::One(pair) => Self(vec![pair]),
            RawRanges::Many(pairs) => Self(pairs),
        }
    }
}

impl<T> Ranges<T> {
    pub fn new(pairs: Vec<(T, T)>) -> Self {
        Self(pairs)
    }

    pub fn pairs(&self) -> &[(T, T)] {
        &self.0
    }
}

/// Gate on distance, pace and start time. Absent fields impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Restriction {
    /// Closed distance intervals in km.
    pub distance: Option<Ranges<f64>>,
    /// Closed pace intervals in s/km.
    pub pace: Option<Ranges<f64>>,
    /// HHMM windows, may wrap past midnight.
    pub start_time: Option<Ranges<String>>,
}

/// A [`Restriction`] plus points the activity must stay away from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouteRestriction {
    #[serde(flatten)]
    pub restriction: Restriction,
    #[serde(default)]
    pub blacklist: Option<Vec<Waypoint>>,
}

// ============================================================================
// Templates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Template {
    pub title: TextOptions,
    pub description: TextOptions,
    /// Lower is tried first; `None` is tried after every prioritized template.
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub restriction: Option<Restriction>,
}

/// A template gated on the activity touching every one of `points`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteTemplate {
    pub title: TextOptions,
    pub description: TextOptions,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub restriction: Option<RouteRestriction>,
    pub points: Vec<Waypoint>,
}

// ============================================================================
// Heart rate zones
// ============================================================================

/// Lower thresholds (bpm) of HR zones 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, u16>")]
pub struct HeartRateZones {
    pub thresholds: [u16; 5],
}

impl HeartRateZones {
    pub fn new(thresholds: [u16; 5]) -> Self {
        Self { thresholds }
    }
}

impl TryFrom<BTreeMap<String, u16>> for HeartRateZones {
    type Error = ConfigError;

    fn try_from(zones: BTreeMap<String, u16>) -> Result<Self, Self::Error> {
        let mut thresholds = [0u16; 5];
        for (i, threshold) in thresholds.iter_mut().enumerate() {
            let zone = (i + 1).to_string();
            *threshold = *zones.get(&zone).ok_or_else(|| {
                ConfigError::InvalidHeartRateZones(format!("zone {} is missing", zone))
            })?;
        }
        if zones.len() != 5 {
            return Err(ConfigError::InvalidHeartRateZones(
                "only zones 1 to 5 may be given".to_string(),
            ));
        }
        Ok(Self { thresholds })
    }
}

// ============================================================================
// Config
// ============================================================================

/// Everything the engine reads during one generation call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub markers: Markers,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub route_templates: Vec<RouteTemplate>,
    #[serde(default, rename = "hr_zones")]
    pub heart_rate_zones: Option<HeartRateZones>,
    /// Which geofence implementation to use.
    #[serde(default)]
    pub geo_backend: GeoBackend,
}

impl Config {
    /// Parse a config from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        info!(
            "[Config] Loaded {} templates, {} route templates",
            config.templates.len(),
            config.route_templates.len()
        );
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
