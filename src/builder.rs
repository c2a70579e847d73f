//! Relational builder: consumes decode events and grows the entity model.
//!
//! The builder owns the three entity collections and the source→system
//! identifier table for the duration of one import; nothing else may
//! mutate them. Identifiers are handed out densely in encounter order
//! starting at 1, and relational integrity is re-validated at every
//! insertion boundary and once more at the end of the document.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info, trace};

use crate::model::{Dive, DiveLog, DiveSite, DiveTrip, Metadata};
use crate::subsurface::{self, DecodeError, DecodeHandler, DiveRecord, GeoRecord, SiteRecord};
use crate::tags;

/// A relational-integrity violation.
///
/// These indicate the decoder and the builder disagree about protocol, or
/// the source data is internally inconsistent. They are defects, not
/// recoverable runtime conditions: the import that hits one is abandoned
/// whole. They are surfaced as values rather than panics so embedding
/// contexts (tests, the server's rebuild endpoint) decide how loudly to
/// fail.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// An event arrived in a state that does not accept it.
    #[error("{event} event arrived in state {state}")]
    State {
        /// Name of the offending event.
        event: &'static str,
        /// State the builder was in.
        state: &'static str,
    },

    /// A dive references a site UUID that was never registered.
    #[error("dive references unmapped site {uuid:?}")]
    UnmappedSiteRef {
        /// The unknown source identifier.
        uuid: String,
    },

    /// A geo label references a site identifier that does not exist.
    #[error("geo label references unknown site id {0}")]
    UnknownSite(u32),

    /// A dive references a trip identifier that does not exist.
    #[error("dive references unknown trip id {0}")]
    UnknownTrip(u32),

    /// A collection's identifiers are no longer dense.
    #[error("{kind} identifiers are not dense: expected {expected}, found {found}")]
    IdentifierGap {
        /// Entity kind, for diagnostics.
        kind: &'static str,
        /// Identifier the position requires.
        expected: u32,
        /// Identifier actually present.
        found: u32,
    },
}

/// Builder lifecycle. Events are only accepted while `Building`; the
/// finished model is only released from `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Uninitialized,
    Building,
    Finalizing,
    Built,
}

impl BuildState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Building => "building",
            Self::Finalizing => "finalizing",
            Self::Built => "built",
        }
    }
}

/// Consumes [`DecodeHandler`] events and assembles a [`DiveLog`].
#[derive(Debug)]
pub struct DiveLogBuilder {
    state: BuildState,
    metadata: Metadata,
    sites: Vec<DiveSite>,
    trips: Vec<DiveTrip>,
    dives: Vec<Dive>,
    /// Source UUID → system identifier; import-scoped working state,
    /// discarded once the model is built.
    source_ids: HashMap<String, u32>,
}

impl DiveLogBuilder {
    /// Create a builder for an import from `source` (recorded as metadata).
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            state: BuildState::Uninitialized,
            metadata: Metadata { source: source.into(), ..Default::default() },
            sites: Vec::new(),
            trips: Vec::new(),
            dives: Vec::new(),
            source_ids: HashMap::new(),
        }
    }

    /// Release the finished model. Errors unless the decode ran to
    /// completion (`end` seen and validated).
    pub fn finish(self) -> Result<DiveLog, IntegrityError> {
        if self.state != BuildState::Built {
            return Err(IntegrityError::State {
                event: "finish",
                state: self.state.as_str(),
            });
        }
        Ok(DiveLog::new(self.metadata, self.sites, self.trips, self.dives))
    }

    fn expect_building(&self, event: &'static str) -> Result<(), IntegrityError> {
        if self.state != BuildState::Building {
            return Err(IntegrityError::State { event, state: self.state.as_str() });
        }
        Ok(())
    }

    /// Centralized relational-integrity validation: identifiers of all
    /// three collections are dense and 1-based, and every dive's site and
    /// trip references name existing entities. Invoked at each insertion
    /// boundary and once at completion.
    fn validate(&self) -> Result<(), IntegrityError> {
        for (idx, site) in self.sites.iter().enumerate() {
            let expected = idx as u32 + 1;
            if site.id != expected {
                return Err(IntegrityError::IdentifierGap {
                    kind: "site",
                    expected,
                    found: site.id,
                });
            }
        }
        for (idx, trip) in self.trips.iter().enumerate() {
            let expected = idx as u32 + 1;
            if trip.id != expected {
                return Err(IntegrityError::IdentifierGap {
                    kind: "trip",
                    expected,
                    found: trip.id,
                });
            }
        }
        for (idx, dive) in self.dives.iter().enumerate() {
            let expected = idx as u32 + 1;
            if dive.id != expected {
                return Err(IntegrityError::IdentifierGap {
                    kind: "dive",
                    expected,
                    found: dive.id,
                });
            }
            if dive.dive_site_id == 0 || dive.dive_site_id > self.sites.len() as u32 {
                return Err(IntegrityError::UnknownSite(dive.dive_site_id));
            }
            if dive.dive_trip_id == 0 || dive.dive_trip_id > self.trips.len() as u32 {
                return Err(IntegrityError::UnknownTrip(dive.dive_trip_id));
            }
        }
        Ok(())
    }
}

impl DecodeHandler for DiveLogBuilder {
    type Error = IntegrityError;

    fn on_begin(&mut self) -> Result<(), IntegrityError> {
        if self.state != BuildState::Uninitialized {
            return Err(IntegrityError::State {
                event: "begin",
                state: self.state.as_str(),
            });
        }
        self.sites = Vec::with_capacity(100);
        self.trips = Vec::with_capacity(100);
        self.dives = Vec::with_capacity(100);
        self.source_ids = HashMap::new();
        self.state = BuildState::Building;
        Ok(())
    }

    fn on_header(&mut self, program: &str, version: &str) -> Result<(), IntegrityError> {
        self.expect_building("header")?;
        self.metadata.program = program.to_string();
        self.metadata.program_version = version.to_string();
        self.metadata.units = "metric".to_string();
        Ok(())
    }

    fn on_dive_site(&mut self, record: SiteRecord) -> Result<u32, IntegrityError> {
        self.expect_building("site")?;

        let (region, description) = tags::parse_description(&record.description);
        let id = self.sites.len() as u32 + 1;
        let site = DiveSite {
            id,
            name: record.name,
            coordinates: record.gps,
            description,
            region,
            geo_labels: Vec::new(),
        };
        debug!("built {site}");

        self.source_ids.insert(record.uuid.clone(), id);
        trace!("mapped source id {:?} -> {id}", record.uuid);

        self.sites.push(site);
        self.validate()?;
        Ok(id)
    }

    fn on_geo_label(&mut self, site_id: u32, record: GeoRecord) -> Result<(), IntegrityError> {
        self.expect_building("geo")?;

        let site = site_id
            .checked_sub(1)
            .and_then(|i| self.sites.get_mut(i as usize))
            .ok_or(IntegrityError::UnknownSite(site_id))?;

        // Set semantics: a label already present for this site is ignored.
        if !site.geo_labels.iter().any(|l| l == &record.label) {
            trace!("geo label for S{site_id}: cat={} {:?}", record.category, record.label);
            site.geo_labels.push(record.label);
        }
        Ok(())
    }

    fn on_dive_trip(&mut self, label: &str) -> Result<u32, IntegrityError> {
        self.expect_building("trip")?;

        let id = self.trips.len() as u32 + 1;
        let trip = DiveTrip { id, label: label.to_string() };
        debug!("built {trip}");

        self.trips.push(trip);
        self.validate()?;
        Ok(id)
    }

    fn on_dive(&mut self, record: DiveRecord) -> Result<u32, IntegrityError> {
        self.expect_building("dive")?;

        let (special_tags, regular_tags): (Vec<String>, Vec<String>) =
            record.tags.into_iter().partition(|t| tags::is_special(t));

        let site_id = *self
            .source_ids
            .get(&record.site_ref)
            .ok_or_else(|| IntegrityError::UnmappedSiteRef { uuid: record.site_ref.clone() })?;
        if record.trip_id == 0 || record.trip_id > self.trips.len() as u32 {
            return Err(IntegrityError::UnknownTrip(record.trip_id));
        }

        let id = self.dives.len() as u32 + 1;
        let mut dive = Dive {
            id,
            number: record.number,
            dive_site_id: site_id,
            dive_trip_id: record.trip_id,
            duration: record.duration,
            rating5: record.rating,
            visibility5: record.visibility,
            tags: regular_tags,
            salinity: record.water_salinity,
            // RFC 3339; entry times carry no zone and are treated as UTC.
            date_time_in: record.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            operator_dm: record.dive_master,
            buddy: record.buddy,
            notes: record.notes,
            suit: record.suit,
            cyl_size: record.cylinder.size,
            cyl_type: record.cylinder.description,
            start_pressure: record.cylinder.start,
            end_pressure: record.cylinder.end,
            gas: record.cylinder.o2,
            weights: record.weightsystem.weight,
            weights_type: record.weightsystem.description,
            dc_model: record.computer.model,
            depth_max: record.computer.depth_max,
            depth_mean: record.computer.depth_mean,
            temp_water_min: record.computer.temperature_water_min,
            temp_air: record.manual_temperature.air,
            surface_pressure: record.computer.surface_pressure,
            award: String::new(),
            timestamp: record.timestamp,
        };

        dive.apply_special_tags(&special_tags);
        dive.normalize();
        debug!("built {dive} -> S{site_id} T{}", dive.dive_trip_id);

        self.dives.push(dive);
        self.validate()?;
        Ok(id)
    }

    fn on_skip(&mut self, _element: &str) -> Result<(), IntegrityError> {
        // Diagnostics only; the decoder already logged it.
        Ok(())
    }

    fn on_end(&mut self) -> Result<(), IntegrityError> {
        self.expect_building("end")?;
        self.state = BuildState::Finalizing;
        self.validate()?;
        self.state = BuildState::Built;
        info!(
            "import complete: {} sites, {} trips, {} dives",
            self.sites.len(),
            self.trips.len(),
            self.dives.len()
        );
        Ok(())
    }
}

/// Decode the export at `path` and build the relational model in one pass.
///
/// Input errors and integrity violations both abort the import; no partial
/// model is ever returned.
pub fn import_file<P: AsRef<Path>>(path: P) -> Result<DiveLog, DecodeError<IntegrityError>> {
    let path = path.as_ref();
    let mut builder = DiveLogBuilder::new(path.display().to_string());
    subsurface::decode_file(path, &mut builder)?;
    builder.finish().map_err(DecodeError::Handler)
}
