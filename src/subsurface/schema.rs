//! Wire-schema records for the Subsurface XML export.
//!
//! These are plain data holders describing the shape of the source format's
//! elements and attributes; all behavior lives in the decoder and the
//! builder. Scalar attributes stay raw strings — normalization is a domain
//! rule, not a wire concern.

use chrono::NaiveDateTime;

/// Attributes of a `<site>` element.
#[derive(Debug, Clone, Default)]
pub struct SiteRecord {
    /// Source identifier (UUID) used for cross-reference resolution.
    pub uuid: String,
    /// Display name.
    pub name: String,
    /// Raw coordinate string, latitude then longitude.
    pub gps: String,
    /// Raw description, possibly opening with a `tags:` directive.
    pub description: String,
}

/// Attributes of a `<geo>` child of a site.
#[derive(Debug, Clone, Default)]
pub struct GeoRecord {
    /// Numeric geo category code.
    pub category: i32,
    /// Label text.
    pub label: String,
}

/// Everything decoded from one `<dive>` subtree.
///
/// `site_ref` still carries the source UUID (sites are registered before
/// any dive that references them), while `trip_id` is already a system
/// identifier returned by the trip callback.
#[derive(Debug, Clone, Default)]
pub struct DiveRecord {
    /// Dive number as recorded in the source.
    pub number: u32,
    /// Rating on a five-point scale, 0 when absent.
    pub rating: u8,
    /// Visibility on a five-point scale, 0 when absent.
    pub visibility: u8,
    /// Surface air consumption as recorded.
    pub sac: String,
    /// Tag list, split and trimmed.
    pub tags: Vec<String>,
    /// Source identifier of the referenced site.
    pub site_ref: String,
    /// System identifier of the enclosing trip.
    pub trip_id: u32,
    /// Raw water salinity density value.
    pub water_salinity: String,
    /// Parsed entry timestamp.
    pub timestamp: NaiveDateTime,
    /// Duration as recorded, e.g. `"45:30 min"`.
    pub duration: String,

    /// `<divemaster>` element text.
    pub dive_master: String,
    /// `<buddy>` element text.
    pub buddy: String,
    /// `<notes>` element text.
    pub notes: String,
    /// `<suit>` element text.
    pub suit: String,

    /// `<cylinder>` attributes.
    pub cylinder: CylinderRecord,
    /// `<weightsystem>` attributes.
    pub weightsystem: WeightsystemRecord,
    /// `<divetemperature>` attributes (manually recorded).
    pub manual_temperature: ManualTemperatureRecord,
    /// `<divecomputer>` subtree.
    pub computer: ComputerRecord,
}

/// Attributes of a `<cylinder>` element.
#[derive(Debug, Clone, Default)]
pub struct CylinderRecord {
    /// Cylinder size.
    pub size: String,
    /// Working pressure.
    pub work_pressure: String,
    /// Cylinder type code, e.g. `"AL100"`.
    pub description: String,
    /// Start pressure.
    pub start: String,
    /// End pressure.
    pub end: String,
    /// Oxygen fraction of the gas mix; empty means air.
    pub o2: String,
}

/// Attributes of a `<weightsystem>` element.
#[derive(Debug, Clone, Default)]
pub struct WeightsystemRecord {
    /// Weight carried.
    pub weight: String,
    /// Weight system description.
    pub description: String,
}

/// Attributes of a `<divetemperature>` element.
#[derive(Debug, Clone, Default)]
pub struct ManualTemperatureRecord {
    /// Air temperature.
    pub air: String,
    /// Water temperature.
    pub water: String,
}

/// Data lifted from a `<divecomputer>` subtree.
#[derive(Debug, Clone, Default)]
pub struct ComputerRecord {
    /// Computer model name.
    pub model: String,
    /// Maximum depth (`<depth max=…>`).
    pub depth_max: String,
    /// Mean depth (`<depth mean=…>`).
    pub depth_mean: String,
    /// Minimum water temperature (`<temperature water=…>`).
    pub temperature_water_min: String,
    /// Surface pressure (`<surface pressure=…>`).
    pub surface_pressure: String,
}
