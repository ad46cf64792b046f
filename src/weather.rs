//! Weather conditions attached to an activity and their `{weather}` text.

use serde::{Deserialize, Serialize};

/// Conditions at the activity's start, supplied by the weather lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Short summary, e.g. "Light rain"
    pub description: String,
    /// Air temperature in °C
    pub temperature: f64,
    /// Apparent temperature in °C
    #[serde(default)]
    pub feels_like: Option<f64>,
    /// Relative humidity in percent
    #[serde(default)]
    pub humidity: Option<u8>,
    /// Wind speed in km/h
    #[serde(default)]
    pub wind_speed: Option<f64>,
    /// Compass direction the wind blows from, e.g. "SW"
    #[serde(default)]
    pub wind_direction: Option<String>,
}

impl Weather {
    pub fn new(description: impl Into<String>, temperature: f64) -> Self {
        Self {
            description: description.into(),
            temperature,
            feels_like: None,
            humidity: None,
            wind_speed: None,
            wind_direction: None,
        }
    }

    /// `Light rain, 12°C (feels like 9°C), 80% humidity, wind 15 km/h SW`
    pub fn describe(&self) -> String {
        let mut temperature = format!("{:.0}°C", self.temperature);
        if let Some(feels_like) = self.feels_like {
            if feels_like.round() != self.temperature.round() {
                temperature.push_str(&format!(" (feels like {:.0}°C)", feels_like));
            }
        }

        let mut parts = Vec::with_capacity(4);
        if !self.description.trim().is_empty() {
            parts.push(self.description.trim().to_string());
        }
        parts.push(temperature);
        if let Some(humidity) = self.humidity {
            parts.push(format!("{}% humidity", humidity));
        }
        if let Some(speed) = self.wind_speed {
            let mut wind = format!("wind {:.0} km/h", speed);
            if let Some(direction) = &self.wind_direction {
                wind.push(' ');
                wind.push_str(direction);
            }
            parts.push(wind);
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_description() {
        let weather = Weather {
            description: "Light rain".to_string(),
            temperature: 12.2,
            feels_like: Some(9.4),
            humidity: Some(80),
            wind_speed: Some(15.0),
            wind_direction: Some("SW".to_string()),
        };
        assert_eq!(
            weather.describe(),
            "Light rain, 12°C (feels like 9°C), 80% humidity, wind 15 km/h SW"
        );
    }

    #[test]
    fn test_minimal_description() {
        assert_eq!(Weather::new("Sunny", 21.6).describe(), "Sunny, 22°C");
        assert_eq!(Weather::new("", -3.0).describe(), "-3°C");
    }

    #[test]
    fn test_feels_like_same_as_actual_is_omitted() {
        let mut weather = Weather::new("Cloudy", 10.1);
        weather.feels_like = Some(9.8);
        assert_eq!(weather.describe(), "Cloudy, 10°C");
    }
}
