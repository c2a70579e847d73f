//! Read views: JSON shapes served by the HTTP layer.
//!
//! Views denormalize for display (site names on dives, linked dive heads on
//! sites and trips) but never apply domain rules of their own — all
//! normalization happened at import time.

use serde::Serialize;

use crate::model::{Dive, DiveLog, DiveSite, DiveTrip};

/// Identifier and name of a site, for lists.
#[derive(Debug, Clone, Serialize)]
pub struct SiteHead {
    /// Site system identifier.
    pub id: u32,
    /// Site display name.
    pub name: String,
}

impl SiteHead {
    /// Build a head view for `site`.
    pub fn new(site: &DiveSite) -> Self {
        Self { id: site.id, name: site.name.clone() }
    }
}

/// A site with everything a detail page needs.
#[derive(Debug, Clone, Serialize)]
pub struct SiteFull {
    /// Site system identifier.
    pub id: u32,
    /// Site display name.
    pub name: String,
    /// Raw coordinates.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub coordinates: String,
    /// Formatted coordinates, when the raw string is well-formed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_coordinates: Option<String>,
    /// Visible description.
    pub description: String,
    /// Region classification.
    pub region: String,
    /// Geo labels in insertion order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub geo_labels: Vec<String>,
    /// Heads of the dives logged at this site, in encounter order.
    pub linked_dives: Vec<DiveHead>,
}

impl SiteFull {
    /// Build a full view for `site`, linking the dives logged there.
    pub fn new(site: &DiveSite, log: &DiveLog) -> Self {
        let linked_dives = log
            .dives()
            .iter()
            .filter(|d| d.dive_site_id == site.id)
            .map(|d| DiveHead::new(d, site))
            .collect();

        Self {
            id: site.id,
            name: site.name.clone(),
            coordinates: site.coordinates.clone(),
            formatted_coordinates: site.formatted_coordinates(),
            description: site.description.clone(),
            region: site.region.clone(),
            geo_labels: site.geo_labels.clone(),
            linked_dives,
        }
    }
}

/// Identifier, number, date and site of a dive, for lists.
#[derive(Debug, Clone, Serialize)]
pub struct DiveHead {
    /// Dive system identifier.
    pub id: u32,
    /// Dive number as recorded in the source.
    pub number: u32,
    /// Entry date (`YYYY-MM-DD`).
    pub date: String,
    /// Referenced site identifier.
    pub site_id: u32,
    /// Short name of the referenced site.
    pub site_name: String,
}

impl DiveHead {
    /// Build a head view for `dive` at `site`.
    pub fn new(dive: &Dive, site: &DiveSite) -> Self {
        Self {
            id: dive.id,
            number: dive.number,
            date: dive.timestamp.format("%Y-%m-%d").to_string(),
            site_id: site.id,
            site_name: site.short_name().to_string(),
        }
    }
}

/// A dive with everything a detail page needs.
#[derive(Debug, Clone, Serialize)]
pub struct DiveFull {
    /// The dive itself, flattened into the view.
    #[serde(flatten)]
    pub dive: Dive,
    /// Name of the referenced site.
    pub site_name: String,
    /// Elapsed time since the dive, e.g. `"2y 1m 5d ago"`.
    pub ago: String,
    /// Next dive identifier, `None` at the newest dive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_id: Option<u32>,
    /// Previous dive identifier, `None` at the oldest dive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_id: Option<u32>,
}

impl DiveFull {
    /// Build a full view for `dive` at `site`.
    ///
    /// The next/previous links are a display convenience and clamp to
    /// `None` at the collection ends.
    pub fn new(dive: &Dive, site: &DiveSite, highest_dive_id: u32) -> Self {
        Self {
            dive: dive.clone(),
            site_name: site.name.clone(),
            ago: dive.ago(),
            next_id: (dive.id < highest_dive_id).then(|| dive.id + 1),
            prev_id: dive.id.checked_sub(1).filter(|&p| p > 0),
        }
    }
}

/// A trip with the heads of its dives.
#[derive(Debug, Clone, Serialize)]
pub struct TripView {
    /// Trip system identifier.
    pub id: u32,
    /// Trip label.
    pub label: String,
    /// Heads of the dives in this trip.
    pub linked_dives: Vec<DiveHead>,
}

impl TripView {
    /// Build a view for `trip`, linking its dives in encounter order.
    pub fn new(trip: &DiveTrip, log: &DiveLog) -> Self {
        let linked_dives = log
            .dives()
            .iter()
            .filter(|d| d.dive_trip_id == trip.id)
            .filter_map(|d| log.site(d.dive_site_id).map(|s| DiveHead::new(d, s)))
            .collect();

        Self { id: trip.id, label: trip.label.clone(), linked_dives }
    }
}
