//! # divelog - Subsurface Import Pipeline and Read Model
//!
//! `divelog` ingests the XML database exported by the Subsurface dive-log
//! application and materializes it into an in-memory relational model of
//! dive sites, dive trips and dives, exposed read-only over a JSON API.
//!
//! ## Key Properties
//!
//! - **Streaming import**: the export is decoded in one pass with a pull
//!   parser; structure is reported as ordered callback events, never held
//!   as a document tree.
//! - **Dense system identifiers**: every entity gets a 1-based integer
//!   identifier in encounter order; source-format UUIDs are resolved
//!   during import and then discarded.
//! - **All-or-nothing**: an import either completes and validates fully or
//!   fails without publishing anything. Re-imports replace the published
//!   model atomically.
//! - **Forward compatible**: unknown elements and unknown domain codes
//!   never fail an import; they are skipped or mapped to defined defaults.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use divelog::builder;
//!
//! let log = builder::import_file("mydives.xml")?;
//!
//! for dive in log.dives() {
//!     let site = log.site(dive.dive_site_id).expect("validated on import");
//!     println!("#{} at {}", dive.number, site.short_name());
//! }
//! # Ok::<(), divelog::subsurface::DecodeError<divelog::builder::IntegrityError>>(())
//! ```
//!
//! ## Architecture
//!
//! Data flows in one direction:
//!
//! ```text
//! source bytes
//!   └─> subsurface::Decoder          (streaming pull parser)
//!         └─> ordered decode events
//!               └─> builder::DiveLogBuilder   (ids, cross-refs, invariants)
//!                     └─> model::DiveLog      (immutable)
//!                           └─> server        (read-only JSON views)
//! ```
//!
//! - [`subsurface`]: wire-schema records and the streaming decoder
//! - [`builder`]: the decode-event consumer that assembles the model
//! - [`model`]: entity records, normalization and derived display values
//! - [`tags`]: the `_key_value` special-tag micro-language
//! - [`mappings`]: closed code→label tables and fixed domain literals
//! - [`server`]: axum read layer with atomic model replacement
//! - [`config`]: CLI/file/environment configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod builder;
pub mod config;
pub mod mappings;
pub mod model;
pub mod server;
pub mod subsurface;
pub mod tags;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::builder::{import_file, DiveLogBuilder, IntegrityError};
    pub use crate::config::{Config, ConfigError};
    pub use crate::model::{Dive, DiveLog, DiveSite, DiveTrip, Metadata};
    pub use crate::server::{router, serve, AppState};
    pub use crate::subsurface::{
        decode_file, DecodeError, DecodeHandler, Decoder, DiveRecord, GeoRecord, SiteRecord,
    };
}
