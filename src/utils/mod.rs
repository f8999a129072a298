//! Utility functions and helpers

pub mod seed;

pub use seed::{RepetitionSeeds, resolve_base_seed};
