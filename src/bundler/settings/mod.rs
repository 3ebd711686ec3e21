//! Configuration structures for bundling operations.
//!
//! [`Settings`] is the read-only configuration every bundle build consults:
//! feature toggles, per-component value overrides, and the node placement
//! policy for the system and accelerated tiers. It is assembled with
//! [`SettingsBuilder`], optionally seeded from a [`SettingsFile`].

mod builder;
mod core;
mod file;

pub use builder::SettingsBuilder;
pub use core::{Placement, Settings};
pub use file::{PlacementFile, SettingsFile, TierFile};
