//! Entity Mapping Engine Crate
//!
//! Classifies canonical capability graphs onto the platform entity
//! vocabulary. Matching runs in three strictly ordered tiers over static
//! pattern tables:
//!
//! 1. device templates (whole device → one composite entity),
//! 2. service templates (one service → one entity),
//! 3. per-property fallback (override table, then a generic shape ladder).
//!
//! The output is an immutable [`EntityMap`] keyed by node handle; a handle
//! claimed by a higher tier is permanently out of reach for lower ones, so
//! no node ever carries more than one platform tag.

pub mod claim;
pub mod engine;
pub mod rules;

pub use claim::{Claim, EntityMap, MatchTier};
pub use engine::EntityMapper;
pub use rules::{DeviceTemplate, PropertyOverride, PropertyRule, ServiceRule, ServiceTemplate};
