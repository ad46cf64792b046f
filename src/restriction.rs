//! Restriction gates on templates and route templates.
//!
//! Distance and pace ranges are closed on both ends (`[5, 10]` accepts 5 and 10),
//! unlike category bucketing which is half-open. Start time windows use the same
//! half-open wraparound rule as start time categories. Each dimension passes if
//! any of its ranges contains the activity's value; the first failing dimension
//! ends the evaluation.

use crate::config::{Ranges, Restriction, RouteRestriction};
use crate::error::ResolveError;
use crate::geo::GeoEngine;
use crate::interval::{clock_in_range, minutes_since_midnight, parse_hhmm};
use crate::Activity;

fn in_any_closed(ranges: &Ranges<f64>, value: Option<f64>) -> bool {
    if ranges.pairs().is_empty() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    ranges
        .pairs()
        .iter()
        .any(|&(lower, upper)| lower <= value && value <= upper)
}

fn in_any_window(ranges: &Ranges<String>, minutes: u32) -> Result<bool, ResolveError> {
    if ranges.pairs().is_empty() {
        return Ok(true);
    }
    for (lower, upper) in ranges.pairs() {
        if clock_in_range(parse_hhmm(lower)?, parse_hhmm(upper)?, minutes) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// True if the activity passes every dimension the restriction constrains.
pub fn passes_restriction(
    activity: &Activity,
    restriction: &Restriction,
) -> Result<bool, ResolveError> {
    if let Some(distance) = &restriction.distance {
        if !in_any_closed(distance, Some(activity.distance)) {
            return Ok(false);
        }
    }
    if let Some(pace) = &restriction.pace {
        if !in_any_closed(pace, activity.pace) {
            return Ok(false);
        }
    }
    if let Some(start_time) = &restriction.start_time {
        let minutes = minutes_since_midnight(activity.start_date_time.time());
        if !in_any_window(start_time, minutes)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// [`passes_restriction`] plus the blacklist: touching any blacklisted point fails.
pub fn passes_route_restriction(
    activity: &Activity,
    restriction: &RouteRestriction,
    geo: &dyn GeoEngine,
) -> Result<bool, ResolveError> {
    if !passes_restriction(activity, &restriction.restriction)? {
        return Ok(false);
    }
    if let (Some(blacklist), Some(stream)) = (&restriction.blacklist, &activity.lat_long_stream) {
        if geo.any_touched(blacklist, stream) {
            return Ok(false);
        }
    }
    Ok(true)
}
