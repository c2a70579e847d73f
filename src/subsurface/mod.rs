//! # Subsurface Export Parsing
//!
//! Streaming decode of the XML database exported by the Subsurface dive-log
//! application.
//!
//! ## Design Goals
//!
//! - **Streaming**: the document is never held as a parsed tree; structure
//!   is reported to a [`DecodeHandler`] in document order.
//! - **Forward compatible**: unknown elements become skip events, not
//!   errors.
//! - **Pre-resolved references**: entity-creating callbacks return system
//!   identifiers, so geo labels and dives arrive with their owning site or
//!   trip already resolved.
//!
//! ## Document Structure
//!
//! ```text
//! divelog (program, version)
//! ├── settings            (skipped)
//! ├── divesites
//! │   └── site* (uuid, name, gps, description)
//! │       └── geo* (cat, value)
//! └── dives
//!     └── trip* (location)
//!         └── dive* (number, rating, visibility, tags, divesiteid,
//!             │      watersalinity, date, time, duration)
//!             ├── divemaster / buddy / notes / suit   (text)
//!             ├── cylinder (size, workpressure, description, start, end, o2)
//!             ├── weightsystem (weight, description)
//!             ├── divetemperature (air, water)
//!             └── divecomputer (model)
//!                 ├── depth (max, mean)
//!                 ├── temperature (water)
//!                 ├── surface (pressure)
//!                 └── sample*                          (dropped)
//! ```

mod decoder;
mod schema;

pub use decoder::{decode_file, DecodeError, DecodeHandler, Decoder};
pub use schema::{
    ComputerRecord, CylinderRecord, DiveRecord, GeoRecord, ManualTemperatureRecord, SiteRecord,
    WeightsystemRecord,
};
