//! Capability Specification Parsing Crate
//!
//! This crate turns raw vendor capability documents into the canonical typed
//! graph from `capbridge-core`, applying the bundled correction layers and
//! the translation fallback chain along the way.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `http` | ✅ | reqwest-based specification fetcher |
//!
//! ## Architecture
//!
//! - **SpecParser**: cache-first document → graph builder with retry and
//!   stale-cache fallback
//! - **OverlayStack**: the six correction layers (filter, add, modify,
//!   bool texts, local override, standard-library dictionaries)
//! - **TranslationTable / SpecStdLib**: per-instance and shared description
//!   sources
//! - **HttpFetcher**: `CapabilityFetcher` over the specification endpoints
//!
//! A raw document section looks like:
//!
//! ```json
//! {
//!   "iid": 2,
//!   "type": "urn:cap-spec-v2:service:air-conditioner:00007811:acme-mc5:1",
//!   "description": "Air Conditioner",
//!   "properties": [
//!     {
//!       "iid": 3,
//!       "type": "urn:cap-spec-v2:property:target-temperature:00000021:acme-mc5:1",
//!       "description": "Target Temperature",
//!       "format": "float",
//!       "access": ["read", "write", "notify"],
//!       "unit": "celsius",
//!       "value-range": [16, 31, 0.5]
//!     }
//!   ]
//! }
//! ```
//!
//! Parsed graphs are cached per language under the `spec_graphs` domain, so
//! a device keeps working through network outages once seen.

pub mod error;
pub mod overlay;
pub mod parser;
pub mod translation;

pub(crate) mod wire;

#[cfg(feature = "http")]
pub mod net;

pub use error::SpecError;
pub use overlay::{BoolTranslation, OverlayStack, SpecAdd, SpecFilter, SpecModify};
pub use parser::SpecParser;
pub use translation::{LocalOverride, SpecStdLib, TranslationTable};

#[cfg(feature = "http")]
pub use net::{HttpFetcher, HttpFetcherConfig};
