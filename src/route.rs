//! Route template matching: restriction gate plus waypoint coverage.

use crate::config::RouteTemplate;
use crate::error::ResolveError;
use crate::geo::GeoEngine;
use crate::restriction::passes_route_restriction;
use crate::Activity;

/// True if the route template's restriction passes and the activity's
/// lat/long stream touches every one of its points.
///
/// A template with no restriction and no points matches anything.
pub fn matching_route_template(
    activity: &Activity,
    route_template: &RouteTemplate,
    geo: &dyn GeoEngine,
) -> Result<bool, ResolveError> {
    if let Some(restriction) = &route_template.restriction {
        if !passes_route_restriction(activity, restriction, geo)? {
            return Ok(false);
        }
    }
    let stream = activity.lat_long_stream.as_deref().unwrap_or_default();
    Ok(geo.all_touched(&route_template.points, stream))
}
