//! Description translation layers.
//!
//! Every node description goes through the same fallback chain, highest
//! priority first: packaged per-instance override, per-instance cloud
//! translation, standard-library dictionary by type prefix, the raw document
//! description, and finally the machine name. The chain never comes up
//! empty.

pub mod multi_lang;
pub mod std_lib;

pub use multi_lang::{LocalOverride, TranslationTable};
pub use std_lib::SpecStdLib;
