//! Core types and traits for CapBridge.
//!
//! This crate defines the capability graph model, the value coercion rules
//! and the collaborator traits shared by the parser, the mapping engine and
//! the storage backends.

pub mod cache;
pub mod coercion;
pub mod expr;
pub mod fetch;
pub mod node;
pub mod platform;
pub mod urn;
pub mod value;

// Graph exports
pub use node::{
    NodeHandle, NodeKind, SpecAccess, SpecAction, SpecEvent, SpecFormat, SpecInstance,
    SpecProperty, SpecService, SpecValueList, SpecValueListItem, SpecValueRange,
};
pub use value::SpecValue;

// Platform vocabulary exports
pub use platform::{DeviceClass, EntityPlatform, StateClass};

// Collaborator exports
pub use cache::{CacheError, MemoryCache, SpecCache};
pub use fetch::{CapabilityFetcher, FetchError, TemplateCategory, TemplateDictionary};

/// Re-exports commonly used types.
pub mod prelude {
    // Graph model
    pub use crate::node::{
        NodeHandle, NodeKind, SpecAccess, SpecAction, SpecEvent, SpecFormat, SpecInstance,
        SpecProperty, SpecService, SpecValueList, SpecValueListItem, SpecValueRange,
    };
    pub use crate::value::SpecValue;

    // Platform vocabulary
    pub use crate::platform::{DeviceClass, EntityPlatform, StateClass};

    // Collaborators
    pub use crate::cache::{CacheError, MemoryCache, SpecCache};
    pub use crate::fetch::{
        CapabilityFetcher, FetchError, TemplateCategory, TemplateDictionary,
    };

    // Expression evaluation
    pub use crate::expr::{ExprError, evaluate};

    // URN helpers
    pub use crate::urn::{is_proprietary, name, type_prefix, without_version};
}
