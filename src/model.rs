//! Entity model for an imported dive log.
//!
//! The model is built once per import by [`crate::builder::DiveLogBuilder`]
//! and is immutable afterwards. System identifiers are dense 1-based
//! integers assigned in encounter order; the highest valid identifier of
//! each collection equals its length.

use std::fmt;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;

use crate::mappings;
use crate::tags;

/// Producer metadata recorded from the export header.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    /// Name of the program that wrote the export.
    pub program: String,
    /// Version of the producing program.
    #[serde(rename = "program_version")]
    pub program_version: String,
    /// Path of the source file the model was imported from.
    pub source: String,
    /// Unit system of all scalar values. Fixed to `"metric"` on import.
    pub units: String,
}

/// A named, optionally geo-tagged location where dives occur.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiveSite {
    /// System identifier, dense and 1-based.
    pub id: u32,
    /// Display name as recorded in the export.
    pub name: String,
    /// Raw coordinate string, latitude then longitude.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub coordinates: String,
    /// Visible description, after directive extraction. Never empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Region classification from the description directive.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// Deduplicated geo labels in insertion order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub geo_labels: Vec<String>,
}

impl DiveSite {
    /// Text before the first comma of the display name, trimmed.
    pub fn short_name(&self) -> &str {
        self.name.split(',').next().unwrap_or(&self.name).trim()
    }

    /// Format the raw coordinate string as `lat = …, long = …`.
    ///
    /// Returns `None` when the raw string does not split into exactly two
    /// whitespace-separated tokens.
    pub fn formatted_coordinates(&self) -> Option<String> {
        let mut parts = self.coordinates.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(lat), Some(long), None) => Some(format!("lat = {lat}, long = {long}")),
            _ => None,
        }
    }
}

impl fmt::Display for DiveSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}:[{}]", self.id, self.name)
    }
}

/// A named grouping of dives, e.g. a multi-day outing.
///
/// Trips carry no back-references; dives point at trips.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiveTrip {
    /// System identifier, dense and 1-based.
    pub id: u32,
    /// Trip label as recorded in the export.
    pub label: String,
}

impl fmt::Display for DiveTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}:[{}]", self.id, self.label)
    }
}

/// A single logged dive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dive {
    /// System identifier, dense, 1-based, equal to encounter order.
    pub id: u32,
    /// Dive number as recorded in the source.
    pub number: u32,
    /// Referenced site system identifier.
    #[serde(rename = "dive_site_id")]
    pub dive_site_id: u32,
    /// Referenced trip system identifier.
    #[serde(rename = "dive_trip_id")]
    pub dive_trip_id: u32,

    /// Dive duration as recorded, e.g. `"45:30 min"`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub duration: String,
    /// Rating on a five-point scale, 0 when unrated.
    #[serde(rename = "rating5", skip_serializing_if = "is_zero")]
    pub rating5: u8,
    /// Visibility on a five-point scale, 0 when unrated.
    #[serde(rename = "visibility5", skip_serializing_if = "is_zero")]
    pub visibility5: u8,
    /// Regular (non-special) tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Salinity class after normalization: `"fresh water"`, `"salt water"`
    /// or blank.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub salinity: String,
    /// Entry timestamp in RFC 3339 form, e.g. `"2023-08-12T10:30:00Z"`.
    #[serde(rename = "date_time_in", skip_serializing_if = "String::is_empty")]
    pub date_time_in: String,
    /// Dive operator or divemaster.
    #[serde(rename = "operator_dm", skip_serializing_if = "String::is_empty")]
    pub operator_dm: String,
    /// Dive buddy.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub buddy: String,
    /// Free-text notes.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Exposure suit.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub suit: String,
    /// Cylinder size as recorded.
    #[serde(rename = "cyl_size", skip_serializing_if = "String::is_empty")]
    pub cyl_size: String,
    /// Cylinder type label after normalization.
    #[serde(rename = "cyl_type", skip_serializing_if = "String::is_empty")]
    pub cyl_type: String,
    /// Cylinder start pressure.
    #[serde(rename = "start_pressure", skip_serializing_if = "String::is_empty")]
    pub start_pressure: String,
    /// Cylinder end pressure.
    #[serde(rename = "end_pressure", skip_serializing_if = "String::is_empty")]
    pub end_pressure: String,
    /// Gas label after normalization: `"air"` or `"nitrox …"`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gas: String,
    /// Weights carried.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub weights: String,
    /// Weight system type.
    #[serde(rename = "weights_type", skip_serializing_if = "String::is_empty")]
    pub weights_type: String,
    /// Dive computer model.
    #[serde(rename = "dc_model", skip_serializing_if = "String::is_empty")]
    pub dc_model: String,
    /// Maximum depth reported by the computer.
    #[serde(rename = "depth_max", skip_serializing_if = "String::is_empty")]
    pub depth_max: String,
    /// Mean depth reported by the computer.
    #[serde(rename = "depth_mean", skip_serializing_if = "String::is_empty")]
    pub depth_mean: String,
    /// Minimum water temperature.
    #[serde(rename = "temp_water_min", skip_serializing_if = "String::is_empty")]
    pub temp_water_min: String,
    /// Air temperature.
    #[serde(rename = "temp_air", skip_serializing_if = "String::is_empty")]
    pub temp_air: String,
    /// Surface pressure.
    #[serde(rename = "surface_pressure", skip_serializing_if = "String::is_empty")]
    pub surface_pressure: String,
    /// Award label derived from an `_award_` special tag, if any.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub award: String,

    /// Parsed entry timestamp, kept for derived display values.
    #[serde(skip)]
    pub timestamp: NaiveDateTime,
}

fn is_zero(v: &u8) -> bool {
    *v == 0
}

impl Dive {
    /// Elapsed time since this dive as `"<y>y <m>m <d>d ago"`, using
    /// calendar-aware subtraction rather than day division.
    pub fn ago(&self) -> String {
        let (years, months, days) =
            tags::years_months_days(self.timestamp.date(), Utc::now().date_naive());
        format!("{years}y {months}m {days}d ago")
    }

    /// True when `tag` is among this dive's regular tags. The empty tag
    /// matches every dive, so an absent filter selects everything.
    pub fn is_tagged_with(&self, tag: &str) -> bool {
        tag.is_empty() || self.tags.iter().any(|t| t == tag)
    }

    /// Apply `_award_`/`_animal_` special tags to this dive.
    ///
    /// Unrecognized award codes and unmatched keys are ignored.
    pub fn apply_special_tags(&mut self, special_tags: &[String]) {
        for tag in special_tags {
            let (key, value) = tags::parse_special(tag);
            match key {
                "animal" => {
                    // Reserved: animal sightings are not modeled yet.
                }
                "award" => {
                    if let Some(label) = mappings::award_label(value) {
                        self.award = label.to_string();
                    }
                }
                _ => {}
            }
        }
    }

    /// Normalize the salinity, gas and cylinder-type fields in place.
    ///
    /// Idempotent: already-normalized values pass through unchanged.
    pub fn normalize(&mut self) {
        self.salinity = match self.salinity.as_str() {
            s @ ("fresh water" | "salt water") => s.to_string(),
            s if s.starts_with("1000") => "fresh water".to_string(),
            s if s.starts_with("1030") => "salt water".to_string(),
            _ => String::new(),
        };

        self.gas = match self.gas.as_str() {
            "" => "air".to_string(),
            s @ "air" => s.to_string(),
            s if s.starts_with("nitrox ") => s.to_string(),
            s => format!("nitrox {s}"),
        };

        self.cyl_type = match mappings::cylinder_type_label(&self.cyl_type) {
            Some(label) => label.to_string(),
            None if mappings::is_cylinder_label(&self.cyl_type) => self.cyl_type.clone(),
            None => mappings::UNRECOGNIZED_CYLINDER.to_string(),
        };
    }
}

impl fmt::Display for Dive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}:[{}]", self.id, self.timestamp.format("%Y-%m-%d"))
    }
}

/// A complete, immutable dive log: producer metadata plus the three entity
/// collections, addressable by dense 1-based system identifier.
#[derive(Debug, Clone, Default)]
pub struct DiveLog {
    metadata: Metadata,
    sites: Vec<DiveSite>,
    trips: Vec<DiveTrip>,
    dives: Vec<Dive>,
}

impl DiveLog {
    pub(crate) fn new(
        metadata: Metadata,
        sites: Vec<DiveSite>,
        trips: Vec<DiveTrip>,
        dives: Vec<Dive>,
    ) -> Self {
        Self { metadata, sites, trips, dives }
    }

    /// Producer metadata from the export header.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// All sites in encounter order.
    pub fn sites(&self) -> &[DiveSite] {
        &self.sites
    }

    /// All trips in encounter order.
    pub fn trips(&self) -> &[DiveTrip] {
        &self.trips
    }

    /// All dives in encounter order.
    pub fn dives(&self) -> &[Dive] {
        &self.dives
    }

    /// Look up a site by system identifier.
    pub fn site(&self, id: u32) -> Option<&DiveSite> {
        id.checked_sub(1).and_then(|i| self.sites.get(i as usize))
    }

    /// Look up a trip by system identifier.
    pub fn trip(&self, id: u32) -> Option<&DiveTrip> {
        id.checked_sub(1).and_then(|i| self.trips.get(i as usize))
    }

    /// Look up a dive by system identifier.
    pub fn dive(&self, id: u32) -> Option<&Dive> {
        id.checked_sub(1).and_then(|i| self.dives.get(i as usize))
    }

    /// Highest valid site identifier; 0 when there are no sites.
    pub fn highest_site_id(&self) -> u32 {
        self.sites.len() as u32
    }

    /// Highest valid trip identifier; 0 when there are no trips.
    pub fn highest_trip_id(&self) -> u32 {
        self.trips.len() as u32
    }

    /// Highest valid dive identifier; 0 when there are no dives.
    pub fn highest_dive_id(&self) -> u32 {
        self.dives.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name() {
        let site = DiveSite {
            name: "Blue Hole, Gozo, Malta".to_string(),
            ..Default::default()
        };
        assert_eq!(site.short_name(), "Blue Hole");

        let plain = DiveSite { name: "House Reef".to_string(), ..Default::default() };
        assert_eq!(plain.short_name(), "House Reef");
    }

    #[test]
    fn test_formatted_coordinates() {
        let site = DiveSite {
            coordinates: "36.0012 14.3258".to_string(),
            ..Default::default()
        };
        assert_eq!(
            site.formatted_coordinates().as_deref(),
            Some("lat = 36.0012, long = 14.3258")
        );

        let none = DiveSite { coordinates: "36.0012".to_string(), ..Default::default() };
        assert_eq!(none.formatted_coordinates(), None);

        let empty = DiveSite::default();
        assert_eq!(empty.formatted_coordinates(), None);
    }

    #[test]
    fn test_salinity_classification() {
        let mut dive = Dive { salinity: "1000.0".to_string(), ..Default::default() };
        dive.normalize();
        assert_eq!(dive.salinity, "fresh water");

        dive.salinity = "1030.5".to_string();
        dive.normalize();
        assert_eq!(dive.salinity, "salt water");

        dive.salinity = "1025".to_string();
        dive.normalize();
        assert_eq!(dive.salinity, "");
    }

    #[test]
    fn test_gas_labeling() {
        let mut dive = Dive::default();
        dive.normalize();
        assert_eq!(dive.gas, "air");

        let mut nitrox = Dive { gas: "32".to_string(), ..Default::default() };
        nitrox.normalize();
        assert_eq!(nitrox.gas, "nitrox 32");
    }

    #[test]
    fn test_cylinder_labeling() {
        let mut dive = Dive { cyl_type: "HP100".to_string(), ..Default::default() };
        dive.normalize();
        assert_eq!(dive.cyl_type, "steel");

        let mut odd = Dive { cyl_type: "LP85".to_string(), ..Default::default() };
        odd.normalize();
        assert_eq!(odd.cyl_type, "unrecognized");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut dive = Dive {
            salinity: "1030.2".to_string(),
            gas: "32".to_string(),
            cyl_type: "AL100".to_string(),
            ..Default::default()
        };
        dive.normalize();
        let once = dive.clone();
        dive.normalize();

        assert_eq!(dive.salinity, once.salinity);
        assert_eq!(dive.gas, once.gas);
        assert_eq!(dive.cyl_type, once.cyl_type);
    }

    #[test]
    fn test_award_tag() {
        let mut dive = Dive::default();
        dive.apply_special_tags(&["_award_100th-dive".to_string()]);
        assert_eq!(dive.award, "100th dive!");

        // Unknown codes leave the award unset.
        let mut other = Dive::default();
        other.apply_special_tags(&["_award_everest".to_string()]);
        assert_eq!(other.award, "");
    }

    #[test]
    fn test_tag_filter() {
        let dive = Dive {
            tags: vec!["wreck".to_string(), "night".to_string()],
            ..Default::default()
        };
        assert!(dive.is_tagged_with("wreck"));
        assert!(dive.is_tagged_with(""));
        assert!(!dive.is_tagged_with("cave"));
    }

    #[test]
    fn test_id_lookup_is_one_based() {
        let log = DiveLog::new(
            Metadata::default(),
            vec![DiveSite { id: 1, name: "A".to_string(), ..Default::default() }],
            Vec::new(),
            Vec::new(),
        );

        assert!(log.site(0).is_none());
        assert_eq!(log.site(1).map(|s| s.id), Some(1));
        assert!(log.site(2).is_none());
        assert_eq!(log.highest_site_id(), 1);
    }
}
