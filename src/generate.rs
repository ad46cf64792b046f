//! Title and description generation: the top-level template selector.
//!
//! Route templates are considered first, only when the activity has a lat/long
//! stream; then ordinary templates. Both lists are tried in ascending priority
//! (templates without a priority last, ties in list order). The first template
//! whose gate passes and whose title and description both render wins.
//!
//! Each title/description is an ordered list of candidate strings. A candidate
//! that fails to resolve is skipped in favour of the next one; a template with
//! no renderable title (or description) is skipped in favour of the next
//! template. Malformed configuration aborts generation for the activity.

use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;

use crate::config::{Config, TextOptions};
use crate::error::{GenerateError, ResolveError, Result};
use crate::geo::GeoEngine;
use crate::placeholder::render;
use crate::resolve::resolve_placeholder;
use crate::restriction::passes_restriction;
use crate::route::matching_route_template;
use crate::Activity;

/// A generated title and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedText {
    pub title: String,
    pub description: String,
}

/// Order items by priority, `None` last. The sort is stable.
fn by_priority<T>(items: &[T], priority: impl Fn(&T) -> Option<i64>) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| {
        let priority = priority(item);
        (priority.is_none(), priority)
    });
    sorted
}

/// Render the first candidate string that resolves completely.
///
/// `Ok(None)` when every candidate failed (or there were none); only
/// configuration defects are returned as errors.
fn render_first<R: Rng + ?Sized>(
    candidates: &TextOptions,
    activity: &Activity,
    config: &Config,
    description: bool,
    rng: &mut R,
) -> std::result::Result<Option<String>, ResolveError> {
    for candidate in candidates.as_slice() {
        let rendered = render(candidate, |token| {
            resolve_placeholder(token, activity, config, description, rng)
        });
        match rendered {
            Ok(text) => return Ok(Some(text)),
            Err(err) if err.is_defect() => return Err(err),
            Err(err) => debug!(
                "[Generate] Activity {}: skipping candidate '{}': {}",
                activity.id, candidate, err
            ),
        }
    }
    Ok(None)
}

/// Render a title and description. A template without description
/// candidates gets an empty description.
fn render_pair<R: Rng + ?Sized>(
    title: &TextOptions,
    description: &TextOptions,
    activity: &Activity,
    config: &Config,
    rng: &mut R,
) -> std::result::Result<Option<GeneratedText>, ResolveError> {
    let Some(title) = render_first(title, activity, config, false, rng)? else {
        return Ok(None);
    };
    let description = if description.is_empty() {
        String::new()
    } else {
        match render_first(description, activity, config, true, rng)? {
            Some(text) => text,
            None => return Ok(None),
        }
    };
    Ok(Some(GeneratedText { title, description }))
}

/// Generate with an explicit geo engine and random source.
pub fn generate_with<R: Rng + ?Sized>(
    activity: &Activity,
    config: &Config,
    geo: &dyn GeoEngine,
    rng: &mut R,
) -> Result<GeneratedText> {
    let malformed = |source: ResolveError| GenerateError::MalformedConfig {
        activity_id: activity.id,
        source,
    };

    if activity.lat_long_stream.is_some() {
        for route_template in by_priority(&config.route_templates, |rt| rt.priority) {
            if !matching_route_template(activity, route_template, geo).map_err(malformed)? {
                debug!(
                    "[Generate] Activity {}: route template (priority {:?}) not matched",
                    activity.id, route_template.priority
                );
                continue;
            }
            let rendered = render_pair(
                &route_template.title,
                &route_template.description,
                activity,
                config,
                rng,
            )
            .map_err(malformed)?;
            match rendered {
                Some(text) => {
                    info!(
                        "[Generate] Activity {}: route template (priority {:?}) -> '{}'",
                        activity.id, route_template.priority, text.title
                    );
                    return Ok(text);
                }
                None => warn!(
                    "[Generate] Activity {}: route template (priority {:?}) matched but rendered no title/description",
                    activity.id, route_template.priority
                ),
            }
        }
    }

    for template in by_priority(&config.templates, |t| t.priority) {
        if let Some(restriction) = &template.restriction {
            if !passes_restriction(activity, restriction).map_err(malformed)? {
                debug!(
                    "[Generate] Activity {}: template (priority {:?}) restricted",
                    activity.id, template.priority
                );
                continue;
            }
        }
        let rendered = render_pair(&template.title, &template.description, activity, config, rng)
            .map_err(malformed)?;
        match rendered {
            Some(text) => {
                info!(
                    "[Generate] Activity {}: template (priority {:?}) -> '{}'",
                    activity.id, template.priority, text.title
                );
                return Ok(text);
            }
            None => debug!(
                "[Generate] Activity {}: template (priority {:?}) rendered nothing",
                activity.id, template.priority
            ),
        }
    }

    Err(GenerateError::NoApplicableTemplate {
        activity_id: activity.id,
    })
}

/// Generate a title and description using the configured geo backend and
/// thread-local randomness.
pub fn generate_title_and_description(
    activity: &Activity,
    config: &Config,
) -> Result<GeneratedText> {
    generate_with(
        activity,
        config,
        config.geo_backend.engine(),
        &mut rand::thread_rng(),
    )
}

/// Generate for each activity in turn. Results are in input order.
pub fn generate_batch(activities: &[Activity], config: &Config) -> Vec<Result<GeneratedText>> {
    activities
        .iter()
        .map(|activity| generate_title_and_description(activity, config))
        .collect()
}

/// Same as [`generate_batch`], spread across rayon's thread pool.
#[cfg(feature = "parallel")]
pub fn generate_batch_parallel(
    activities: &[Activity],
    config: &Config,
) -> Vec<Result<GeneratedText>> {
    use rayon::prelude::*;

    activities
        .par_iter()
        .map(|activity| generate_title_and_description(activity, config))
        .collect()
}
