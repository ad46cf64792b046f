//! Heart rate zone distribution for the `{hr_zones}` placeholder.
//!
//! Zones are given as five ascending lower thresholds in bpm. The time between
//! two consecutive samples is credited to the zone of the earlier sample;
//! anything below the zone 1 threshold counts as zone 1.
//!
//! ## Example
//! ```rust
//! use title_matcher::config::HeartRateZones;
//! use title_matcher::zones::calculate_hr_zones;
//! use title_matcher::HeartRateSample;
//!
//! let zones = HeartRateZones::new([110, 130, 150, 165, 180]);
//! let samples = vec![
//!     HeartRateSample::new(0, 120),
//!     HeartRateSample::new(60, 155),
//!     HeartRateSample::new(120, 155),
//! ];
//! let distribution = calculate_hr_zones(&samples, &zones);
//! assert_eq!(distribution.zone_seconds, [60, 0, 60, 0, 0]);
//! ```

use serde::Serialize;

use crate::config::HeartRateZones;
use crate::HeartRateSample;

pub const ZONE_COUNT: usize = 5;

impl HeartRateZones {
    /// Determine which zone a HR value falls into (1-5)
    pub fn get_zone(&self, bpm: u16) -> u8 {
        self.thresholds
            .iter()
            .rposition(|&threshold| bpm >= threshold)
            .map_or(1, |i| (i + 1) as u8)
    }
}

/// Time spent in each heart rate zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HRZoneDistribution {
    /// Seconds covered by the stream
    pub total_seconds: u32,
    /// Seconds in each zone (indexed 0-4 for zones 1-5)
    pub zone_seconds: [u32; ZONE_COUNT],
    /// Percentage of time in each zone
    pub zone_percentages: [f32; ZONE_COUNT],
}

impl HRZoneDistribution {
    /// Get percentage for a specific zone (1-5)
    pub fn get_zone_percent(&self, zone: u8) -> f32 {
        if (1..=ZONE_COUNT as u8).contains(&zone) {
            self.zone_percentages[(zone - 1) as usize]
        } else {
            0.0
        }
    }

    /// `Zone 1: 4:05 (12%) | Zone 2: ...`
    pub fn describe(&self) -> String {
        self.zone_seconds
            .iter()
            .zip(self.zone_percentages.iter())
            .enumerate()
            .map(|(i, (&seconds, &percent))| {
                format!("Zone {}: {} ({:.0}%)", i + 1, format_duration(seconds), percent)
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Calculate time in zone from a time-stamped HR stream.
pub fn calculate_hr_zones(samples: &[HeartRateSample], zones: &HeartRateZones) -> HRZoneDistribution {
    let mut zone_seconds = [0u32; ZONE_COUNT];

    for pair in samples.windows(2) {
        let elapsed = pair[1].time.saturating_sub(pair[0].time);
        let zone = zones.get_zone(pair[0].bpm);
        zone_seconds[(zone - 1) as usize] += elapsed;
    }

    let total: u32 = zone_seconds.iter().sum();
    let mut zone_percentages = [0.0f32; ZONE_COUNT];
    if total > 0 {
        for i in 0..ZONE_COUNT {
            zone_percentages[i] = (zone_seconds[i] as f32 / total as f32) * 100.0;
        }
    }

    HRZoneDistribution {
        total_seconds: total,
        zone_seconds,
        zone_percentages,
    }
}

/// `M:SS` below an hour, `H:MM:SS` otherwise.
pub fn format_duration(seconds: u32) -> String {
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
