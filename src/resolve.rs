//! Placeholder token resolution.
//!
//! A token is either one of the reserved bare words (`hr_zones`, `weather`) or
//! `metric.key`, naming a marker whose categories are matched against the
//! activity. Metric names map to a closed [`Metric`] enum; each metric knows how
//! its categories are matched through [`Metric::kind`].

use rand::Rng;

use crate::config::{Config, Metric, MetricKind};
use crate::error::ResolveError;
use crate::interval::{match_clock_time, match_date, match_numeric};
use crate::zones::calculate_hr_zones;
use crate::Activity;

pub const HEART_RATE_ZONES_TOKEN: &str = "hr_zones";
pub const WEATHER_TOKEN: &str = "weather";

/// A parsed placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder<'a> {
    HeartRateZones,
    Weather,
    Marker { metric: Metric, key: &'a str },
}

impl<'a> Placeholder<'a> {
    pub fn parse(token: &'a str) -> Result<Self, ResolveError> {
        match token {
            HEART_RATE_ZONES_TOKEN => return Ok(Placeholder::HeartRateZones),
            WEATHER_TOKEN => return Ok(Placeholder::Weather),
            _ => {}
        }
        token
            .split_once('.')
            .and_then(|(name, key)| {
                Some(Placeholder::Marker {
                    metric: Metric::from_name(name)?,
                    key,
                })
            })
            .ok_or_else(|| ResolveError::UnknownPlaceholder(token.to_string()))
    }
}

/// Resolve one placeholder token to text.
///
/// `description` selects description texts instead of titles from the
/// matching category.
pub fn resolve_placeholder<R: Rng + ?Sized>(
    token: &str,
    activity: &Activity,
    config: &Config,
    description: bool,
    rng: &mut R,
) -> Result<String, ResolveError> {
    match Placeholder::parse(token)? {
        Placeholder::HeartRateZones => heart_rate_zones_text(activity, config),
        Placeholder::Weather => activity
            .weather
            .as_ref()
            .map(|weather| weather.describe())
            .ok_or(ResolveError::MissingWeather),
        Placeholder::Marker { metric, key } => {
            resolve_marker(metric, key, activity, config, description, rng)
        }
    }
}

fn resolve_marker<R: Rng + ?Sized>(
    metric: Metric,
    key: &str,
    activity: &Activity,
    config: &Config,
    description: bool,
    rng: &mut R,
) -> Result<String, ResolveError> {
    let unknown_key = || ResolveError::UnknownKey {
        metric,
        key: key.to_string(),
    };
    let markers = &config.markers;

    let text = match metric.kind() {
        MetricKind::Numeric(value_of) => {
            let categories = markers
                .numeric(metric)
                .and_then(|set| set.get(key))
                .ok_or_else(unknown_key)?;
            match_numeric(categories, value_of(activity), description, rng)?
        }
        MetricKind::ClockTime => {
            let categories = markers.start_time.get(key).ok_or_else(unknown_key)?;
            match_clock_time(categories, activity.start_date_time.time(), description, rng)?
        }
        MetricKind::Date => {
            let categories = markers.date.get(key).ok_or_else(unknown_key)?;
            match_date(categories, activity.start_date_time.date(), description, rng)?
        }
    };

    text.ok_or_else(|| ResolveError::NoValue {
        metric,
        key: key.to_string(),
    })
}

fn heart_rate_zones_text(activity: &Activity, config: &Config) -> Result<String, ResolveError> {
    let samples = activity
        .heart_rate_stream
        .as_deref()
        .filter(|samples| samples.len() >= 2)
        .ok_or(ResolveError::MissingHeartRate)?;
    let zones = config
        .heart_rate_zones
        .as_ref()
        .ok_or(ResolveError::MissingHeartRateZones)?;
    Ok(calculate_hr_zones(samples, zones).describe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HeartRateSample, Weather};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> Config {
        Config::from_json_str(
            r#"{
                "markers": {
                    "distance": {"easy": [[0, 10, "Jog", "An easy one"], [10, null, "Long run"]]},
                    "pace": {"effort": [[0, 300, "Fast"], [300, 400, "Steady"]]},
                    "cadence": {"steps": [[170, null, "Quick feet"], [null, null, "Strides"]]},
                    "start_time": {"tod": [["0500", "1200", "Morning"], ["2300", "0100", "Midnight"]]},
                    "date": {"special": [["*-06-01", "June"], [null, "Someday"]]}
                },
                "hr_zones": {"1": 110, "2": 130, "3": 150, "4": 165, "5": 180}
            }"#,
        )
        .unwrap()
    }

    fn activity() -> Activity {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(7, 15, 0)
            .unwrap();
        Activity::new(1, 5.2, 1716, start)
    }

    fn resolve(token: &str, activity: &Activity, description: bool) -> Result<String, ResolveError> {
        let mut rng = StdRng::seed_from_u64(7);
        resolve_placeholder(token, activity, &config(), description, &mut rng)
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Placeholder::parse("hr_zones").unwrap(), Placeholder::HeartRateZones);
        assert_eq!(Placeholder::parse("weather").unwrap(), Placeholder::Weather);
        assert_eq!(
            Placeholder::parse("elevation_per_km.hilly").unwrap(),
            Placeholder::Marker {
                metric: Metric::ElevationPerKm,
                key: "hilly"
            }
        );
        for bad in ["speed.fast", "distance", "", "weather.today"] {
            assert!(
                matches!(Placeholder::parse(bad), Err(ResolveError::UnknownPlaceholder(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_numeric_markers() {
        let a = activity();
        assert_eq!(resolve("distance.easy", &a, false).unwrap(), "Jog");
        assert_eq!(resolve("distance.easy", &a, true).unwrap(), "An easy one");
        assert_eq!(resolve("pace.effort", &a, false).unwrap(), "Steady");
    }

    #[test]
    fn test_absent_value_uses_else_category() {
        let a = activity();
        assert!(a.cadence.is_none());
        assert_eq!(resolve("cadence.steps", &a, false).unwrap(), "Strides");

        let mut quick = activity();
        quick.cadence = Some(176.0);
        assert_eq!(resolve("cadence.steps", &quick, false).unwrap(), "Quick feet");
    }

    #[test]
    fn test_no_value_and_unknown_key() {
        let a = activity();
        // The long-run category has no description and there is no else-category.
        let mut long = activity();
        long.distance = 21.1;
        assert_eq!(
            resolve("distance.easy", &long, true),
            Err(ResolveError::NoValue {
                metric: Metric::Distance,
                key: "easy".to_string()
            })
        );
        assert_eq!(
            resolve("distance.bad", &a, false),
            Err(ResolveError::UnknownKey {
                metric: Metric::Distance,
                key: "bad".to_string()
            })
        );
        assert!(matches!(
            resolve("moving_time.any", &a, false),
            Err(ResolveError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_start_time_and_date() {
        let a = activity();
        assert_eq!(resolve("start_time.tod", &a, false).unwrap(), "Morning");
        assert_eq!(resolve("date.special", &a, false).unwrap(), "June");

        let mut late = activity();
        late.start_date_time = NaiveDate::from_ymd_opt(2024, 7, 4)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap();
        assert_eq!(resolve("start_time.tod", &late, false).unwrap(), "Midnight");
        assert_eq!(resolve("date.special", &late, false).unwrap(), "Someday");
    }

    #[test]
    fn test_heart_rate_zones() {
        let a = activity();
        assert_eq!(resolve("hr_zones", &a, false), Err(ResolveError::MissingHeartRate));

        let single = activity().with_heart_rate_stream(vec![HeartRateSample::new(0, 120)]);
        assert_eq!(resolve("hr_zones", &single, false), Err(ResolveError::MissingHeartRate));

        let hr = activity().with_heart_rate_stream(vec![
            HeartRateSample::new(0, 140),
            HeartRateSample::new(245, 140),
        ]);
        let text = resolve("hr_zones", &hr, true).unwrap();
        assert!(text.starts_with("Zone 1: 0:00 (0%) | Zone 2: 4:05 (100%)"));

        let mut rng = StdRng::seed_from_u64(7);
        let no_zones = Config::default();
        assert_eq!(
            resolve_placeholder("hr_zones", &hr, &no_zones, false, &mut rng),
            Err(ResolveError::MissingHeartRateZones)
        );
    }

    #[test]
    fn test_weather() {
        let a = activity();
        assert_eq!(resolve("weather", &a, false), Err(ResolveError::MissingWeather));

        let sunny = activity().with_weather(Weather::new("Sunny", 18.0));
        assert_eq!(resolve("weather", &sunny, false).unwrap(), "Sunny, 18°C");
    }
}
